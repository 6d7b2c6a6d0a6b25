//! forge::context
//!
//! Provider identification and the per-client context every adapter
//! carries.
//!
//! # Design
//!
//! A [`ClientContext`] is an immutable value: the domain the client talks
//! to, which provider it is, and whether destructive calls are allowed.
//! Adapters consult it before any network effect; the engine consults it
//! before calling an adapter.
//!
//! # Example
//!
//! ```
//! use forgestate::forge::{ClientContext, ProviderId};
//!
//! let ctx = ClientContext::new(ProviderId::GitLab, "gitlab.example.com")
//!     .with_destructive_calls(true);
//!
//! assert!(ctx.check_domain("gitlab.example.com").is_ok());
//! assert!(ctx.check_domain("github.com").is_err());
//! assert!(ctx.check_destructive("delete repository").is_ok());
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::errors::{Error, Result};
use crate::core::reference::OrganizationReference;

/// Supported Git-hosting backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderId {
    /// GitHub and GitHub Enterprise.
    #[serde(rename = "github")]
    GitHub,
    /// GitLab and self-managed GitLab.
    #[serde(rename = "gitlab")]
    GitLab,
    /// Bitbucket Server (Stash).
    Stash,
    /// Gitea.
    Gitea,
    /// Azure DevOps.
    AzureDevOps,
}

impl ProviderId {
    /// All known providers.
    pub fn all() -> &'static [ProviderId] {
        &[
            ProviderId::GitHub,
            ProviderId::GitLab,
            ProviderId::Stash,
            ProviderId::Gitea,
            ProviderId::AzureDevOps,
        ]
    }

    /// The provider name as used in configuration files.
    pub fn name(&self) -> &'static str {
        match self {
            ProviderId::GitHub => "github",
            ProviderId::GitLab => "gitlab",
            ProviderId::Stash => "stash",
            ProviderId::Gitea => "gitea",
            ProviderId::AzureDevOps => "azure-devops",
        }
    }

    /// Parse a provider name, case-insensitively.
    ///
    /// # Example
    ///
    /// ```
    /// use forgestate::forge::ProviderId;
    ///
    /// assert_eq!(ProviderId::parse("GitLab"), Some(ProviderId::GitLab));
    /// assert_eq!(ProviderId::parse("unknown"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.to_lowercase();
        Self::all().iter().copied().find(|p| p.name() == s)
    }

    /// The public SaaS domain, for providers that have one.
    pub fn default_domain(&self) -> Option<&'static str> {
        match self {
            ProviderId::GitHub => Some("github.com"),
            ProviderId::GitLab => Some("gitlab.com"),
            ProviderId::AzureDevOps => Some("dev.azure.com"),
            ProviderId::Stash | ProviderId::Gitea => None,
        }
    }

    /// Whether organizations on this provider cannot be nested.
    pub fn flat_organizations(&self) -> bool {
        !matches!(self, ProviderId::GitLab)
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Detect the provider from a well-known public domain.
///
/// Self-hosted domains cannot be detected and return `None`.
pub fn detect_provider(domain: &str) -> Option<ProviderId> {
    let host = domain.split(':').next().unwrap_or(domain).to_lowercase();
    ProviderId::all()
        .iter()
        .copied()
        .find(|p| p.default_domain() == Some(host.as_str()))
}

/// Comma-separated list of provider names, for error messages.
pub fn available_providers_string() -> String {
    ProviderId::all()
        .iter()
        .map(|p| p.name())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Immutable settings shared by every client of one adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientContext {
    provider: ProviderId,
    domain: String,
    destructive_calls: bool,
}

impl ClientContext {
    /// A context for `provider` at `domain`, with destructive calls disabled.
    pub fn new(provider: ProviderId, domain: impl Into<String>) -> Self {
        Self {
            provider,
            domain: domain.into(),
            destructive_calls: false,
        }
    }

    /// A copy with destructive calls enabled or disabled.
    pub fn with_destructive_calls(mut self, enabled: bool) -> Self {
        self.destructive_calls = enabled;
        self
    }

    /// The provider this context belongs to.
    pub fn provider(&self) -> ProviderId {
        self.provider
    }

    /// The domain this client serves.
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Whether destructive calls (e.g. deleting repositories) are allowed.
    pub fn destructive_calls(&self) -> bool {
        self.destructive_calls
    }

    /// Fail with `DomainUnsupported` unless `domain` is the configured one.
    ///
    /// Domains compare case-insensitively.
    pub fn check_domain(&self, domain: &str) -> Result<()> {
        if domain.eq_ignore_ascii_case(&self.domain) {
            Ok(())
        } else {
            Err(Error::DomainUnsupported {
                expected: self.domain.clone(),
                actual: domain.to_string(),
            })
        }
    }

    /// Fail with `DestructiveCallDisallowed` unless destructive calls are on.
    pub fn check_destructive(&self, what: &str) -> Result<()> {
        if self.destructive_calls {
            Ok(())
        } else {
            Err(Error::DestructiveCallDisallowed(format!(
                "{} requires destructive calls to be enabled",
                what
            )))
        }
    }

    /// Fail with `ProviderNoSupport` if the provider is flat and the
    /// organization is nested.
    pub fn check_flat_organization(&self, org: &OrganizationReference) -> Result<()> {
        if self.provider.flat_organizations() && !org.is_top_level() {
            return Err(Error::ProviderNoSupport(format!(
                "{} does not support sub-organizations ({})",
                self.provider, org
            )));
        }
        Ok(())
    }

    /// Fail with `NotTopLevelOrganization` if the organization is nested.
    pub fn check_top_level(&self, org: &OrganizationReference) -> Result<()> {
        if org.is_top_level() {
            Ok(())
        } else {
            Err(Error::NotTopLevelOrganization(org.to_string()))
        }
    }
}
