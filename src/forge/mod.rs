//! forge
//!
//! Abstraction for remote Git hosting providers (GitHub, GitLab, etc.).
//!
//! # Architecture
//!
//! The client traits define what an adapter must provide per resource
//! kind. Callers go through the [`engine`](crate::engine), which validates
//! inputs and outputs around every adapter call; adapters themselves only
//! translate between the backend's wire format and [`Object`] envelopes.
//!
//! - Every adapter carries a [`ClientContext`] naming its provider and domain
//! - References for any other domain are rejected before reaching the adapter
//! - Adapters map their native errors onto the closed set of
//!   [`ErrorKind`](crate::core::errors::ErrorKind)s
//!
//! # Modules
//!
//! - `traits`: client traits and [`Provider`]
//! - `context`: provider identity, [`ClientContext`], provider detection
//! - [`mock`]: in-memory provider for deterministic testing
//!
//! [`Object`]: crate::core::resource::Object

mod context;
pub mod mock;
mod traits;

pub use context::{available_providers_string, detect_provider, ClientContext, ProviderId};
pub use traits::*;
