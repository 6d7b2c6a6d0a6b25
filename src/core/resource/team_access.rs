//! core::resource::team_access
//!
//! A team's permission level on a repository.
//!
//! Several backends have no update verb for these bindings; adapters
//! advertise that through their capabilities and the engine updates by
//! deleting and recreating the binding.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{declared_eq, overlay, Info, Object, ResourceKey, ResourceKind};
use crate::core::errors::{Error, ErrorKind, Result};
use crate::core::reference::RepositoryReference;
use crate::core::validation::{ValidateFields, Validator};

/// A team access envelope.
pub type TeamAccess = Object<TeamAccessInfo>;

/// Permission levels, from least to most privileged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepositoryPermission {
    /// Read and clone.
    #[default]
    Pull,
    /// Read plus manage issues and pull requests.
    Triage,
    /// Read and write.
    Push,
    /// Write plus manage the repository without destructive access.
    Maintain,
    /// Full control.
    Admin,
}

impl RepositoryPermission {
    /// All permissions, least privileged first.
    pub fn all() -> &'static [RepositoryPermission] {
        &[
            RepositoryPermission::Pull,
            RepositoryPermission::Triage,
            RepositoryPermission::Push,
            RepositoryPermission::Maintain,
            RepositoryPermission::Admin,
        ]
    }

    /// Lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            RepositoryPermission::Pull => "pull",
            RepositoryPermission::Triage => "triage",
            RepositoryPermission::Push => "push",
            RepositoryPermission::Maintain => "maintain",
            RepositoryPermission::Admin => "admin",
        }
    }
}

impl fmt::Display for RepositoryPermission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RepositoryPermission {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::all()
            .iter()
            .copied()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| Error::Validation {
                kind: ErrorKind::FieldEnumInvalid,
                struct_name: ResourceKind::TeamAccess.name().to_string(),
                field: "info.permission".to_string(),
                value: Some(format!("{:?}", s)),
            })
    }
}

/// Identity of a team access binding: repository and team name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TeamAccessReference {
    /// The repository the team has access to.
    pub repository: RepositoryReference,
    /// Team name (slug).
    pub team: String,
}

impl TeamAccessReference {
    /// Reference a team's binding on a repository.
    pub fn new(repository: RepositoryReference, team: impl Into<String>) -> Self {
        Self {
            repository,
            team: team.into(),
        }
    }
}

impl fmt::Display for TeamAccessReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/teams/{}", self.repository, self.team)
    }
}

impl ValidateFields for TeamAccessReference {
    fn validate_fields(&self, v: &mut Validator) {
        v.nested("repository", &self.repository);
        if self.team.is_empty() {
            v.required(&["team"]);
        }
    }
}

impl ResourceKey for TeamAccessReference {
    fn domain(&self) -> &str {
        self.repository.domain()
    }

    fn identity(&self) -> &str {
        &self.team
    }
}

/// Declared fields of a team access binding.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TeamAccessInfo {
    /// Team name (slug).
    pub name: String,
    /// Permission level. Defaults to `pull`.
    pub permission: Option<RepositoryPermission>,
}

impl TeamAccessInfo {
    /// Declare access for the named team.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            permission: None,
        }
    }

    /// Set the permission level.
    pub fn with_permission(mut self, permission: RepositoryPermission) -> Self {
        self.permission = Some(permission);
        self
    }
}

impl ValidateFields for TeamAccessInfo {
    fn validate_fields(&self, v: &mut Validator) {
        if self.name.is_empty() {
            v.required(&["name"]);
        }
    }
}

impl Info for TeamAccessInfo {
    type Key = TeamAccessReference;

    const KIND: ResourceKind = ResourceKind::TeamAccess;

    fn apply_defaults(&mut self) {
        if self.permission.is_none() {
            self.permission = Some(RepositoryPermission::default());
        }
    }

    fn equals(&self, other: &Self) -> bool {
        self.name == other.name && declared_eq(&self.permission, &other.permission)
    }

    fn merge_declared(&mut self, desired: &Self) {
        self.name.clone_from(&desired.name);
        overlay(&mut self.permission, &desired.permission);
    }

    fn validate_identity(&self, key: &TeamAccessReference, v: &mut Validator) {
        if !self.name.is_empty() && self.name != key.team {
            v.invalid(&self.name, &["info", "name"]);
        }
    }
}
