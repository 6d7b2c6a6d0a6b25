//! forgestate - declarative management of Git hosting resources
//!
//! Describes organizations, teams, repositories, deploy keys and team
//! access bindings as typed references plus declared infos, and drives
//! any provider toward that declared state with a Get / Create / Update
//! reconciliation loop.
//!
//! # Architecture
//!
//! - [`core`] - references, URL parsing, validation, errors, resource envelopes, config
//! - [`forge`] - provider client traits, client context, the in-memory mock provider
//! - [`engine`] - validated CRUD operations, pagination and reconciliation
//! - [`logging`] - `tracing` subscriber setup
//!
//! # Correctness Invariants
//!
//! 1. Nothing reaches an adapter without passing field validation
//! 2. A client never acts on a reference for a domain it does not serve
//! 3. Data returned by a backend is validated before callers see it
//! 4. Reconciling an already matching resource performs no writes

pub mod core;
pub mod engine;
pub mod forge;
pub mod logging;
