//! core::resource
//!
//! The resource envelope and the resource kinds built on it.
//!
//! # Envelope
//!
//! Every resource is an [`Object`] made of three parts:
//!
//! - **identity**: a [`ResourceKey`] naming the resource, immutable once
//!   created
//! - **info**: the caller-declared, comparable state (an [`Info`])
//! - **internal**: the backend-native payload as a `serde_json::Value`,
//!   opaque to the core and exposed only as an escape hatch
//!
//! Only the info takes part in equality. Two envelopes whose payloads
//! differ but whose infos agree are equal for reconciliation purposes.
//!
//! # Modules
//!
//! - [`organization`] - organizations (read-only)
//! - [`team`] - teams within an organization (read-only)
//! - [`repository`] - repositories
//! - [`deploy_key`] - deploy keys of a repository
//! - [`team_access`] - team permission bindings on a repository

pub mod deploy_key;
pub mod organization;
pub mod repository;
pub mod team;
pub mod team_access;

use std::fmt;
use std::hash::Hash;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::errors::{Error, Result};
use super::validation::{ValidateFields, Validator};

pub use deploy_key::{DeployKey, DeployKeyInfo, DeployKeyReference};
pub use organization::{Organization, OrganizationInfo};
pub use repository::{Repository, RepositoryInfo, RepositoryVisibility, DEFAULT_BRANCH};
pub use team::{Team, TeamInfo, TeamReference};
pub use team_access::{RepositoryPermission, TeamAccess, TeamAccessInfo, TeamAccessReference};

/// The kinds of resource the core models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceKind {
    /// An organization or sub-organization.
    Organization,
    /// A team inside an organization.
    Team,
    /// A repository.
    Repository,
    /// A deploy key on a repository.
    DeployKey,
    /// A team's permission on a repository.
    TeamAccess,
}

impl ResourceKind {
    /// Struct name used in validation messages.
    pub fn name(&self) -> &'static str {
        match self {
            ResourceKind::Organization => "Organization",
            ResourceKind::Team => "Team",
            ResourceKind::Repository => "Repository",
            ResourceKind::DeployKey => "DeployKey",
            ResourceKind::TeamAccess => "TeamAccess",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Identity of a resource.
pub trait ResourceKey:
    Clone + fmt::Debug + fmt::Display + Eq + Hash + Send + Sync + ValidateFields + 'static
{
    /// Host the resource lives on.
    fn domain(&self) -> &str;

    /// The innermost identifying name (repository name, key name, ...).
    fn identity(&self) -> &str;
}

/// The declared, comparable state of a resource.
pub trait Info: Clone + fmt::Debug + PartialEq + Send + Sync + ValidateFields + 'static {
    /// The identity type of resources carrying this info.
    type Key: ResourceKey;

    /// Which resource this info belongs to.
    const KIND: ResourceKind;

    /// Whether deleting such a resource needs destructive calls enabled.
    const DESTRUCTIVE_DELETE: bool = false;

    /// Fill unset optional fields with their documented defaults.
    ///
    /// Applying defaults twice is a no-op.
    fn apply_defaults(&mut self) {}

    /// Field-by-field comparison of declared fields.
    ///
    /// A field unset on either side is not compared.
    fn equals(&self, other: &Self) -> bool;

    /// Overlay the fields `desired` declares onto `self`.
    ///
    /// Fields `desired` leaves unset keep their current value, so a partial
    /// declaration never resets what it does not mention.
    fn merge_declared(&mut self, desired: &Self);

    /// Record violations where the info disagrees with the identity.
    ///
    /// Paths are recorded from the envelope root (e.g. `info.name`).
    fn validate_identity(&self, _key: &Self::Key, _v: &mut Validator) {}

    /// Record violations of fields a backend must always return.
    fn validate_server_fields(&self, _v: &mut Validator) {}
}

/// Compare two optional fields, treating an unset side as matching.
pub(crate) fn declared_eq<T: PartialEq>(a: &Option<T>, b: &Option<T>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a == b,
        _ => true,
    }
}

/// Replace `current` with `desired` if `desired` is set.
pub(crate) fn overlay<T: Clone>(current: &mut Option<T>, desired: &Option<T>) {
    if desired.is_some() {
        current.clone_from(desired);
    }
}

/// A resource envelope: identity, declared info and backend payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(
    serialize = "I: Serialize, I::Key: Serialize",
    deserialize = "I: Deserialize<'de>, I::Key: Deserialize<'de>"
))]
pub struct Object<I: Info> {
    key: I::Key,
    info: I,
    #[serde(default)]
    internal: Value,
}

impl<I: Info> Object<I> {
    /// Build an envelope from a caller's desired info.
    ///
    /// The payload is empty until the object is hydrated by a backend.
    pub fn new(key: I::Key, info: I) -> Self {
        Self {
            key,
            info,
            internal: Value::Null,
        }
    }

    /// Build an envelope from data returned by a backend.
    pub fn from_server(key: I::Key, info: I, internal: Value) -> Self {
        Self {
            key,
            info,
            internal,
        }
    }

    /// The identity of this resource.
    pub fn key(&self) -> &I::Key {
        &self.key
    }

    /// A copy of the declared info.
    pub fn get(&self) -> I {
        self.info.clone()
    }

    /// Borrow the declared info.
    pub fn info(&self) -> &I {
        &self.info
    }

    /// Replace the declared info after validating it.
    ///
    /// On error the envelope is left unchanged.
    ///
    /// # Errors
    ///
    /// Field violations of `info`, collected per [`Validator`].
    pub fn set(&mut self, info: I) -> Result<()> {
        Self::validate_parts(&self.key, &info)?;
        self.info = info;
        Ok(())
    }

    /// The backend-native payload.
    pub fn internal(&self) -> &Value {
        &self.internal
    }

    /// Replace the backend-native payload. Intended for adapters.
    pub fn set_internal(&mut self, internal: Value) {
        self.internal = internal;
    }

    /// Split into identity, info and payload.
    pub fn into_parts(self) -> (I::Key, I, Value) {
        (self.key, self.info, self.internal)
    }

    /// Fill unset optional info fields with defaults.
    pub fn apply_defaults(&mut self) {
        self.info.apply_defaults();
    }

    /// Whether the declared infos match. Payloads are ignored.
    pub fn equals(&self, other: &Object<I>) -> bool {
        self.info.equals(&other.info)
    }

    fn validate_parts(key: &I::Key, info: &I) -> Result<()> {
        let mut v = Validator::new(I::KIND.name());
        v.nested("reference", key);
        v.nested("info", info);
        info.validate_identity(key, &mut v);
        v.into_result()
    }

    /// Validate before creating this resource.
    pub fn validate_create(&self) -> Result<()> {
        Self::validate_parts(&self.key, &self.info)
    }

    /// Validate before updating this resource. Defaults are not applied.
    pub fn validate_update(&self) -> Result<()> {
        Self::validate_parts(&self.key, &self.info)
    }

    /// Validate before deleting this resource. Only the identity matters.
    pub fn validate_delete(&self) -> Result<()> {
        let mut v = Validator::new(I::KIND.name());
        v.nested("reference", &self.key);
        v.into_result()
    }

    /// Check data returned by a backend before handing it to callers.
    ///
    /// # Errors
    ///
    /// - `Invariant` if the identity is empty
    /// - `InvalidServerData` wrapping the field violations otherwise
    pub fn validate_server_data(&self) -> Result<()> {
        if self.key.identity().is_empty() {
            return Err(Error::Invariant(format!(
                "{} returned by the backend has no identifying name",
                I::KIND
            )));
        }

        let mut v = Validator::new(I::KIND.name());
        v.nested("reference", &self.key);
        self.info.validate_server_fields(&mut v);
        v.into_result().map_err(|source| Error::InvalidServerData {
            resource: format!("{} {}", I::KIND, self.key),
            source: Box::new(source),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declared_eq_skips_unset() {
        assert!(declared_eq(&Some(1), &Some(1)));
        assert!(!declared_eq(&Some(1), &Some(2)));
        assert!(declared_eq::<i32>(&None, &Some(2)));
        assert!(declared_eq::<i32>(&Some(1), &None));
        assert!(declared_eq::<i32>(&None, &None));
    }

    #[test]
    fn resource_kind_names() {
        assert_eq!(ResourceKind::DeployKey.to_string(), "DeployKey");
        assert_eq!(ResourceKind::TeamAccess.name(), "TeamAccess");
    }
}
