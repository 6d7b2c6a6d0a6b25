//! core::resource::team
//!
//! Teams inside an organization. Read-only.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::{Info, Object, ResourceKey, ResourceKind};
use crate::core::reference::OrganizationReference;
use crate::core::validation::{ValidateFields, Validator};

/// A team envelope.
pub type Team = Object<TeamInfo>;

/// Identity of a team: its organization and its name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TeamReference {
    /// The organization the team belongs to.
    pub organization: OrganizationReference,
    /// Team name (slug).
    pub name: String,
}

impl TeamReference {
    /// Reference a team.
    pub fn new(organization: OrganizationReference, name: impl Into<String>) -> Self {
        Self {
            organization,
            name: name.into(),
        }
    }
}

impl fmt::Display for TeamReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/teams/{}", self.organization, self.name)
    }
}

impl ValidateFields for TeamReference {
    fn validate_fields(&self, v: &mut Validator) {
        v.nested("organization", &self.organization);
        if self.name.is_empty() {
            v.required(&["name"]);
        }
    }
}

impl ResourceKey for TeamReference {
    fn domain(&self) -> &str {
        &self.organization.domain
    }

    fn identity(&self) -> &str {
        &self.name
    }
}

/// Declared fields of a team.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TeamInfo {
    /// Team name (slug).
    pub name: String,
    /// Logins of the team's members.
    pub members: Vec<String>,
}

impl ValidateFields for TeamInfo {
    fn validate_fields(&self, v: &mut Validator) {
        if self.name.is_empty() {
            v.required(&["name"]);
        }
        for (i, member) in self.members.iter().enumerate() {
            if member.is_empty() {
                v.invalid(member, &["members", &i.to_string()]);
            }
        }
    }
}

impl Info for TeamInfo {
    type Key = TeamReference;

    const KIND: ResourceKind = ResourceKind::Team;

    /// Members compare as a set; order is not significant.
    fn equals(&self, other: &Self) -> bool {
        let ours: BTreeSet<&str> = self.members.iter().map(String::as_str).collect();
        let theirs: BTreeSet<&str> = other.members.iter().map(String::as_str).collect();
        self.name == other.name && ours == theirs
    }

    fn merge_declared(&mut self, desired: &Self) {
        self.name.clone_from(&desired.name);
        self.members.clone_from(&desired.members);
    }

    fn validate_identity(&self, key: &TeamReference, v: &mut Validator) {
        if !self.name.is_empty() && self.name != key.name {
            v.invalid(&self.name, &["info", "name"]);
        }
    }
}
