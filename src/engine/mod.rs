//! engine
//!
//! Drives provider clients toward a desired state.
//!
//! # Architecture
//!
//! The engine sits between callers and adapters:
//!
//! 1. **Validate**: references and infos are checked before any network call
//! 2. **Call**: the adapter performs exactly one backend operation
//! 3. **Check**: objects returned by the adapter pass server-side validation
//!
//! [`reconcile`] composes these into a Get / Create / Update state machine.
//!
//! # Invariants
//!
//! - No adapter call is made with a reference for a foreign domain
//! - Defaults are applied on create only
//! - Repository deletion requires destructive calls to be enabled
//! - Listings are complete or fail; partial results are never returned
//!
//! # Modules
//!
//! - [`operations`] - validated get/list/create/update/delete
//! - [`reconcile`] - the reconciliation state machine
//! - [`pagination`] - sequential cursor-driven page aggregation

pub mod operations;
pub mod pagination;
pub mod reconcile;

pub use operations::{children, create, delete, get, list, update, UpdateMode};
pub use pagination::{all_pages, Page};
pub use reconcile::{reconcile, Outcome, ReconcileState, Reconciled};
