//! core
//!
//! Domain types shared by every provider.
//!
//! # Modules
//!
//! - [`reference`] - owner and repository references, URL parsing and rendering
//! - [`resource`] - the resource envelope and per-kind infos
//! - [`validation`] - accumulating field validator
//! - [`errors`] - semantic error kinds and multi-error aggregation
//! - [`config`] - configuration schema and loading
//!
//! # Design Principles
//!
//! - References are plain values; they never talk to a backend
//! - Validation accumulates every violation instead of stopping at the first
//! - Errors are inspected by kind, never by message

pub mod config;
pub mod errors;
pub mod reference;
pub mod resource;
pub mod validation;
