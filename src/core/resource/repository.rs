//! core::resource::repository
//!
//! Repositories owned by an organization or a user.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{declared_eq, overlay, Info, Object, ResourceKey, ResourceKind};
use crate::core::errors::{Error, ErrorKind, Result};
use crate::core::reference::RepositoryReference;
use crate::core::validation::{ValidateFields, Validator};

/// Default branch applied when creating a repository without one.
pub const DEFAULT_BRANCH: &str = "main";

/// A repository envelope.
pub type Repository = Object<RepositoryInfo>;

/// Who can see a repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepositoryVisibility {
    /// Visible to everyone.
    Public,
    /// Visible to members of the enterprise or instance.
    Internal,
    /// Visible to collaborators only.
    #[default]
    Private,
}

impl RepositoryVisibility {
    /// All visibilities, in order of increasing restriction.
    pub fn all() -> &'static [RepositoryVisibility] {
        &[
            RepositoryVisibility::Public,
            RepositoryVisibility::Internal,
            RepositoryVisibility::Private,
        ]
    }

    /// Lowercase name, as used on the wire by most backends.
    pub fn as_str(&self) -> &'static str {
        match self {
            RepositoryVisibility::Public => "public",
            RepositoryVisibility::Internal => "internal",
            RepositoryVisibility::Private => "private",
        }
    }
}

impl fmt::Display for RepositoryVisibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RepositoryVisibility {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::all()
            .iter()
            .copied()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| Error::Validation {
                kind: ErrorKind::FieldEnumInvalid,
                struct_name: ResourceKind::Repository.name().to_string(),
                field: "info.visibility".to_string(),
                value: Some(format!("{:?}", s)),
            })
    }
}

/// The declared state of a repository.
///
/// Every field is optional so a caller can declare only what they care
/// about; unset fields are ignored when comparing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositoryInfo {
    /// Free-form description.
    pub description: Option<String>,
    /// Name of the default branch.
    pub default_branch: Option<String>,
    /// Project homepage URL.
    pub homepage: Option<String>,
    /// Visibility.
    pub visibility: Option<RepositoryVisibility>,
}

impl RepositoryInfo {
    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the default branch.
    pub fn with_default_branch(mut self, branch: impl Into<String>) -> Self {
        self.default_branch = Some(branch.into());
        self
    }

    /// Set the homepage URL.
    pub fn with_homepage(mut self, homepage: impl Into<String>) -> Self {
        self.homepage = Some(homepage.into());
        self
    }

    /// Set the visibility.
    pub fn with_visibility(mut self, visibility: RepositoryVisibility) -> Self {
        self.visibility = Some(visibility);
        self
    }
}

impl ValidateFields for RepositoryInfo {
    fn validate_fields(&self, v: &mut Validator) {
        if let Some(branch) = &self.default_branch {
            if branch.is_empty() || branch.chars().any(char::is_whitespace) {
                v.invalid(branch, &["default_branch"]);
            }
        }
    }
}

impl Info for RepositoryInfo {
    type Key = RepositoryReference;

    const KIND: ResourceKind = ResourceKind::Repository;

    const DESTRUCTIVE_DELETE: bool = true;

    fn apply_defaults(&mut self) {
        if self.visibility.is_none() {
            self.visibility = Some(RepositoryVisibility::default());
        }
        if self.default_branch.is_none() {
            self.default_branch = Some(DEFAULT_BRANCH.to_string());
        }
    }

    fn equals(&self, other: &Self) -> bool {
        declared_eq(&self.description, &other.description)
            && declared_eq(&self.default_branch, &other.default_branch)
            && declared_eq(&self.homepage, &other.homepage)
            && declared_eq(&self.visibility, &other.visibility)
    }

    fn merge_declared(&mut self, desired: &Self) {
        overlay(&mut self.description, &desired.description);
        overlay(&mut self.default_branch, &desired.default_branch);
        overlay(&mut self.homepage, &desired.homepage);
        overlay(&mut self.visibility, &desired.visibility);
    }

    fn validate_server_fields(&self, v: &mut Validator) {
        if self.visibility.is_none() {
            v.required(&["info", "visibility"]);
        }
    }
}

impl ResourceKey for RepositoryReference {
    fn domain(&self) -> &str {
        RepositoryReference::domain(self)
    }

    fn identity(&self) -> &str {
        &self.repository_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::reference::parse_repository_url;
    use serde_json::json;

    fn reference() -> RepositoryReference {
        parse_repository_url("https://github.com/acme/widgets", true).unwrap()
    }

    #[test]
    fn defaults() {
        let mut info = RepositoryInfo::default();
        info.apply_defaults();
        assert_eq!(info.visibility, Some(RepositoryVisibility::Private));
        assert_eq!(info.default_branch.as_deref(), Some(DEFAULT_BRANCH));
        assert_eq!(info.description, None);
    }

    #[test]
    fn defaults_keep_declared_values() {
        let mut info = RepositoryInfo::default()
            .with_visibility(RepositoryVisibility::Public)
            .with_default_branch("trunk");
        info.apply_defaults();
        assert_eq!(info.visibility, Some(RepositoryVisibility::Public));
        assert_eq!(info.default_branch.as_deref(), Some("trunk"));
    }

    #[test]
    fn equality_ignores_unset_fields() {
        let desired = RepositoryInfo::default()
            .with_visibility(RepositoryVisibility::Private)
            .with_description("x");
        let actual = RepositoryInfo::default()
            .with_visibility(RepositoryVisibility::Private)
            .with_description("x")
            .with_default_branch("main");
        assert!(desired.equals(&actual));
        assert!(actual.equals(&desired));
    }

    #[test]
    fn equality_detects_differences() {
        let desired = RepositoryInfo::default().with_visibility(RepositoryVisibility::Public);
        let actual = RepositoryInfo::default().with_visibility(RepositoryVisibility::Private);
        assert!(!desired.equals(&actual));
    }

    #[test]
    fn merge_keeps_undeclared_fields() {
        let mut current = RepositoryInfo::default()
            .with_visibility(RepositoryVisibility::Public)
            .with_default_branch("trunk")
            .with_homepage("https://acme.example")
            .with_description("old");
        current.merge_declared(&RepositoryInfo::default().with_description("new"));

        assert_eq!(current.description.as_deref(), Some("new"));
        assert_eq!(current.default_branch.as_deref(), Some("trunk"));
        assert_eq!(current.homepage.as_deref(), Some("https://acme.example"));
        assert_eq!(current.visibility, Some(RepositoryVisibility::Public));
    }

    #[test]
    fn envelope_equality_ignores_internal() {
        let info = RepositoryInfo::default().with_description("x");
        let a = Repository::from_server(reference(), info.clone(), json!({"id": 1}));
        let b = Repository::from_server(reference(), info, json!({"id": 2, "stars": 10}));
        assert!(a.equals(&b));
    }

    #[test]
    fn visibility_parse() {
        assert_eq!(
            "internal".parse::<RepositoryVisibility>().unwrap(),
            RepositoryVisibility::Internal
        );
        let err = "secret".parse::<RepositoryVisibility>().unwrap_err();
        assert!(err.is(ErrorKind::FieldEnumInvalid));
    }

    #[test]
    fn invalid_default_branch() {
        let repo = Repository::new(reference(), RepositoryInfo::default().with_default_branch(""));
        let err = repo.validate_create().unwrap_err();
        assert!(err.is(ErrorKind::FieldInvalid));
        assert!(err.to_string().contains("Repository.info.default_branch"));
    }

    #[test]
    fn set_rejects_invalid_info_and_keeps_old() {
        let mut repo = Repository::new(reference(), RepositoryInfo::default().with_description("a"));
        let result = repo.set(RepositoryInfo::default().with_default_branch("has space"));
        assert!(result.is_err());
        assert_eq!(repo.info().description.as_deref(), Some("a"));
    }

    #[test]
    fn server_data_requires_visibility() {
        let repo = Repository::from_server(reference(), RepositoryInfo::default(), json!({}));
        let err = repo.validate_server_data().unwrap_err();
        assert!(err.is(ErrorKind::InvalidServerData));
        assert!(err.is(ErrorKind::FieldRequired));
    }

    #[test]
    fn server_data_without_name_is_invariant() {
        let mut key = reference();
        key.repository_name.clear();
        let repo = Repository::from_server(
            key,
            RepositoryInfo::default().with_visibility(RepositoryVisibility::Public),
            json!({}),
        );
        let err = repo.validate_server_data().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Invariant);
    }

    #[test]
    fn delete_validation_only_checks_reference() {
        let repo = Repository::new(reference(), RepositoryInfo::default().with_default_branch(""));
        assert!(repo.validate_delete().is_ok());
    }
}
