//! core::resource::organization
//!
//! Organizations are read-only: they can be fetched and listed but not
//! created or changed through the core.

use serde::{Deserialize, Serialize};

use super::{declared_eq, overlay, Info, Object, ResourceKey, ResourceKind};
use crate::core::reference::OrganizationReference;
use crate::core::validation::{ValidateFields, Validator};

/// An organization envelope.
pub type Organization = Object<OrganizationInfo>;

/// Declared fields of an organization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrganizationInfo {
    /// Display name. Adapters fall back to the login when the backend has none.
    pub name: Option<String>,
    /// Free-form description.
    pub description: Option<String>,
}

impl ValidateFields for OrganizationInfo {
    fn validate_fields(&self, _v: &mut Validator) {}
}

impl Info for OrganizationInfo {
    type Key = OrganizationReference;

    const KIND: ResourceKind = ResourceKind::Organization;

    fn equals(&self, other: &Self) -> bool {
        declared_eq(&self.name, &other.name) && declared_eq(&self.description, &other.description)
    }

    fn merge_declared(&mut self, desired: &Self) {
        overlay(&mut self.name, &desired.name);
        overlay(&mut self.description, &desired.description);
    }

    fn validate_server_fields(&self, v: &mut Validator) {
        match &self.name {
            None => v.required(&["info", "name"]),
            Some(name) if name.is_empty() => v.invalid(name, &["info", "name"]),
            Some(_) => {}
        }
    }
}

impl ResourceKey for OrganizationReference {
    fn domain(&self) -> &str {
        &self.domain
    }

    fn identity(&self) -> &str {
        OrganizationReference::identity(self)
    }
}
