//! core::resource::deploy_key
//!
//! Deploy keys grant a single SSH key access to one repository.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{declared_eq, overlay, Info, Object, ResourceKey, ResourceKind};
use crate::core::reference::RepositoryReference;
use crate::core::validation::{ValidateFields, Validator};

/// A deploy key envelope.
pub type DeployKey = Object<DeployKeyInfo>;

/// Identity of a deploy key: its repository and its name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DeployKeyReference {
    /// The repository the key is attached to.
    pub repository: RepositoryReference,
    /// Key name (title), unique per repository.
    pub name: String,
}

impl DeployKeyReference {
    /// Reference a deploy key.
    pub fn new(repository: RepositoryReference, name: impl Into<String>) -> Self {
        Self {
            repository,
            name: name.into(),
        }
    }
}

impl fmt::Display for DeployKeyReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/keys/{}", self.repository, self.name)
    }
}

impl ValidateFields for DeployKeyReference {
    fn validate_fields(&self, v: &mut Validator) {
        v.nested("repository", &self.repository);
        if self.name.is_empty() {
            v.required(&["name"]);
        }
    }
}

impl ResourceKey for DeployKeyReference {
    fn domain(&self) -> &str {
        self.repository.domain()
    }

    fn identity(&self) -> &str {
        &self.name
    }
}

/// Declared fields of a deploy key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeployKeyInfo {
    /// Key name (title).
    pub name: String,
    /// Public key material, e.g. `ssh-ed25519 AAAA...`.
    pub key: Vec<u8>,
    /// Whether the key may only read. Defaults to `true`.
    pub read_only: Option<bool>,
}

impl DeployKeyInfo {
    /// Declare a key with the given name and public key material.
    pub fn new(name: impl Into<String>, key: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            key: key.into(),
            read_only: None,
        }
    }

    /// Set the read-only flag.
    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = Some(read_only);
        self
    }
}

impl ValidateFields for DeployKeyInfo {
    fn validate_fields(&self, v: &mut Validator) {
        if self.name.is_empty() {
            v.required(&["name"]);
        }
        if self.key.is_empty() {
            v.required(&["key"]);
        } else if std::str::from_utf8(&self.key).is_err() {
            v.invalid(&self.key, &["key"]);
        }
    }
}

impl Info for DeployKeyInfo {
    type Key = DeployKeyReference;

    const KIND: ResourceKind = ResourceKind::DeployKey;

    fn apply_defaults(&mut self) {
        if self.read_only.is_none() {
            self.read_only = Some(true);
        }
    }

    fn equals(&self, other: &Self) -> bool {
        self.name == other.name
            && self.key == other.key
            && declared_eq(&self.read_only, &other.read_only)
    }

    fn merge_declared(&mut self, desired: &Self) {
        self.name.clone_from(&desired.name);
        self.key.clone_from(&desired.key);
        overlay(&mut self.read_only, &desired.read_only);
    }

    fn validate_identity(&self, key: &DeployKeyReference, v: &mut Validator) {
        if !self.name.is_empty() && self.name != key.name {
            v.invalid(&self.name, &["info", "name"]);
        }
    }
}
