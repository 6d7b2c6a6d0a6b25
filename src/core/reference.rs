//! core::reference
//!
//! Provider-agnostic references to organizations, users and repositories.
//!
//! # Types
//!
//! - [`OrganizationReference`] - domain, organization and sub-organization path
//! - [`UserReference`] - domain and user login
//! - [`OwnerReference`] - either of the above, owning a repository
//! - [`RepositoryReference`] - an owner plus a repository name
//!
//! # Parsing
//!
//! Only `https://` URLs are accepted. URLs carrying a query, a fragment or
//! embedded credentials are rejected. Trailing slashes are ignored and a
//! trailing `.git` is stripped from repository names.
//!
//! # Example
//!
//! ```
//! use forgestate::core::reference::{parse_organization_url, parse_repository_url, TransportKind};
//!
//! let org = parse_organization_url("https://gitlab.example/my-org/sub-org").unwrap();
//! assert_eq!(org.domain, "gitlab.example");
//! assert_eq!(org.organization, "my-org");
//! assert_eq!(org.sub_organizations, vec!["sub-org".to_string()]);
//!
//! let repo = parse_repository_url("https://github.com/acme/widgets.git", true).unwrap();
//! assert_eq!(repo.repository_name, "widgets");
//! assert_eq!(repo.to_string(), "https://github.com/acme/widgets");
//! assert_eq!(repo.clone_url(TransportKind::Git), "git@github.com:acme/widgets.git");
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::{Error, ErrorKind, Result};
use super::validation::{ValidateFields, Validator};

/// The only accepted URL scheme.
const HTTPS_SCHEME: &str = "https";

/// Suffix stripped from repository names.
const GIT_SUFFIX: &str = ".git";

/// What kind of identity owns a repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OwnerKind {
    /// A user account.
    User,
    /// A top-level organization.
    Organization,
    /// A nested organization (e.g. a GitLab subgroup).
    SubOrganization,
}

impl fmt::Display for OwnerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OwnerKind::User => write!(f, "user"),
            OwnerKind::Organization => write!(f, "organization"),
            OwnerKind::SubOrganization => write!(f, "sub-organization"),
        }
    }
}

/// How a repository is cloned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// `https://{domain}/{path}.git`
    Https,
    /// `git@{domain}:{path}.git`
    Git,
    /// `ssh://git@{domain}/{path}`
    Ssh,
}

impl TransportKind {
    /// Parse a transport name. Returns `None` for unknown names.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "https" => Some(TransportKind::Https),
            "git" => Some(TransportKind::Git),
            "ssh" => Some(TransportKind::Ssh),
            _ => None,
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportKind::Https => write!(f, "https"),
            TransportKind::Git => write!(f, "git"),
            TransportKind::Ssh => write!(f, "ssh"),
        }
    }
}

/// A reference to an organization, optionally nested.
///
/// Flat providers (GitHub, Gitea) only ever use an empty
/// `sub_organizations`; GitLab subgroups populate it in order, outermost
/// first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OrganizationReference {
    /// Host, optionally with a port (`host:port`).
    pub domain: String,
    /// Top-level organization name.
    pub organization: String,
    /// Nested organization path below `organization`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sub_organizations: Vec<String>,
}

impl OrganizationReference {
    /// Reference a top-level organization.
    pub fn new(domain: impl Into<String>, organization: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            organization: organization.into(),
            sub_organizations: Vec::new(),
        }
    }

    /// Append sub-organization segments.
    pub fn with_sub_organizations<I, S>(mut self, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sub_organizations
            .extend(segments.into_iter().map(Into::into));
        self
    }

    /// Top-level or nested.
    pub fn kind(&self) -> OwnerKind {
        if self.sub_organizations.is_empty() {
            OwnerKind::Organization
        } else {
            OwnerKind::SubOrganization
        }
    }

    /// Whether this names a top-level organization.
    pub fn is_top_level(&self) -> bool {
        self.sub_organizations.is_empty()
    }

    /// The innermost organization name.
    pub fn identity(&self) -> &str {
        self.sub_organizations
            .last()
            .map(String::as_str)
            .unwrap_or(&self.organization)
    }

    /// Slash-joined path below the domain.
    pub fn path(&self) -> String {
        std::iter::once(self.organization.as_str())
            .chain(self.sub_organizations.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Canonical `https://` URL.
    pub fn to_url(&self) -> String {
        format!("{}://{}/{}", HTTPS_SCHEME, self.domain, self.path())
    }

    /// The reference of the directly enclosing organization, if nested.
    pub fn parent(&self) -> Option<OrganizationReference> {
        if self.sub_organizations.is_empty() {
            return None;
        }
        let mut parent = self.clone();
        parent.sub_organizations.pop();
        Some(parent)
    }

    /// Reference a child organization one level below this one.
    pub fn child(&self, name: impl Into<String>) -> OrganizationReference {
        let mut child = self.clone();
        child.sub_organizations.push(name.into());
        child
    }
}

impl fmt::Display for OrganizationReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_url())
    }
}

impl ValidateFields for OrganizationReference {
    fn validate_fields(&self, v: &mut Validator) {
        if self.domain.is_empty() {
            v.required(&["domain"]);
        }
        if self.organization.is_empty() {
            v.required(&["organization"]);
        }
        for (i, segment) in self.sub_organizations.iter().enumerate() {
            if segment.is_empty() {
                v.invalid(segment, &["sub_organizations", &i.to_string()]);
            }
        }
    }
}

/// A reference to a user account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserReference {
    /// Host, optionally with a port.
    pub domain: String,
    /// The user's login name.
    pub user_login: String,
}

impl UserReference {
    /// Reference a user.
    pub fn new(domain: impl Into<String>, user_login: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            user_login: user_login.into(),
        }
    }

    /// Canonical `https://` URL.
    pub fn to_url(&self) -> String {
        format!("{}://{}/{}", HTTPS_SCHEME, self.domain, self.user_login)
    }
}

impl fmt::Display for UserReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_url())
    }
}

impl ValidateFields for UserReference {
    fn validate_fields(&self, v: &mut Validator) {
        if self.domain.is_empty() {
            v.required(&["domain"]);
        }
        if self.user_login.is_empty() {
            v.required(&["user_login"]);
        }
    }
}

/// The owner of a repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OwnerReference {
    /// Owned by an organization (possibly nested).
    Organization(OrganizationReference),
    /// Owned by a user.
    User(UserReference),
}

impl OwnerReference {
    /// Host of the owner.
    pub fn domain(&self) -> &str {
        match self {
            OwnerReference::Organization(o) => &o.domain,
            OwnerReference::User(u) => &u.domain,
        }
    }

    /// Owner kind tag.
    pub fn kind(&self) -> OwnerKind {
        match self {
            OwnerReference::Organization(o) => o.kind(),
            OwnerReference::User(_) => OwnerKind::User,
        }
    }

    /// Slash-joined path below the domain.
    pub fn path(&self) -> String {
        match self {
            OwnerReference::Organization(o) => o.path(),
            OwnerReference::User(u) => u.user_login.clone(),
        }
    }

    /// Canonical `https://` URL.
    pub fn to_url(&self) -> String {
        match self {
            OwnerReference::Organization(o) => o.to_url(),
            OwnerReference::User(u) => u.to_url(),
        }
    }

    /// The organization, if organization-owned.
    pub fn as_organization(&self) -> Option<&OrganizationReference> {
        match self {
            OwnerReference::Organization(o) => Some(o),
            OwnerReference::User(_) => None,
        }
    }
}

impl fmt::Display for OwnerReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_url())
    }
}

impl From<OrganizationReference> for OwnerReference {
    fn from(org: OrganizationReference) -> Self {
        OwnerReference::Organization(org)
    }
}

impl From<UserReference> for OwnerReference {
    fn from(user: UserReference) -> Self {
        OwnerReference::User(user)
    }
}

impl ValidateFields for OwnerReference {
    fn validate_fields(&self, v: &mut Validator) {
        match self {
            OwnerReference::Organization(o) => o.validate_fields(v),
            OwnerReference::User(u) => u.validate_fields(v),
        }
    }
}

/// A reference to a repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RepositoryReference {
    /// The owning organization or user.
    pub owner: OwnerReference,
    /// Repository name, without `.git`.
    pub repository_name: String,
}

impl RepositoryReference {
    /// Reference a repository under any owner.
    pub fn new(owner: impl Into<OwnerReference>, repository_name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repository_name: repository_name.into(),
        }
    }

    /// Host of the repository.
    pub fn domain(&self) -> &str {
        self.owner.domain()
    }

    /// Whether an organization owns this repository.
    pub fn is_organization_owned(&self) -> bool {
        matches!(self.owner, OwnerReference::Organization(_))
    }

    /// Slash-joined path below the domain, including the repository name.
    pub fn path(&self) -> String {
        format!("{}/{}", self.owner.path(), self.repository_name)
    }

    /// Canonical `https://` URL, without `.git`.
    pub fn to_url(&self) -> String {
        format!("{}/{}", self.owner.to_url(), self.repository_name)
    }

    /// Clone URL for the given transport.
    pub fn clone_url(&self, transport: TransportKind) -> String {
        match transport {
            TransportKind::Https => format!("{}{}", self.to_url(), GIT_SUFFIX),
            TransportKind::Git => format!("git@{}:{}{}", self.domain(), self.path(), GIT_SUFFIX),
            TransportKind::Ssh => format!("ssh://git@{}/{}", self.domain(), self.path()),
        }
    }

    /// Clone URL for a transport given by name.
    ///
    /// Returns an empty string for unknown transports; callers must check.
    pub fn clone_url_for(&self, transport: &str) -> String {
        TransportKind::parse(transport)
            .map(|t| self.clone_url(t))
            .unwrap_or_default()
    }
}

impl fmt::Display for RepositoryReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_url())
    }
}

impl FromStr for RepositoryReference {
    type Err = Error;

    /// Parses an organization-owned repository URL.
    fn from_str(s: &str) -> Result<Self> {
        parse_repository_url(s, true)
    }
}

impl ValidateFields for RepositoryReference {
    fn validate_fields(&self, v: &mut Validator) {
        v.nested("owner", &self.owner);
        if self.repository_name.is_empty() {
            v.required(&["repository_name"]);
        }
    }
}

/// Split an `https://` URL into its domain and non-empty path segments.
fn split_url(url: &str) -> Result<(String, Vec<String>)> {
    let (scheme, rest) = url
        .split_once("://")
        .ok_or_else(|| Error::url(ErrorKind::UrlInvalid, url))?;

    if scheme.is_empty() || rest.chars().any(char::is_whitespace) {
        return Err(Error::url(ErrorKind::UrlInvalid, url));
    }
    if !scheme.eq_ignore_ascii_case(HTTPS_SCHEME) {
        return Err(Error::url(ErrorKind::UrlUnsupportedScheme, url));
    }
    if rest.contains('?') || rest.contains('#') {
        return Err(Error::url(ErrorKind::UrlUnsupportedParts, url));
    }

    let (authority, path) = rest.split_once('/').unwrap_or((rest, ""));
    if authority.contains('@') {
        return Err(Error::url(ErrorKind::UrlUnsupportedParts, url));
    }
    if authority.is_empty() || authority.starts_with(':') || authority.ends_with(':') {
        return Err(Error::url(ErrorKind::UrlInvalid, url));
    }

    let path = path.trim_end_matches('/');
    if path.is_empty() {
        return Ok((authority.to_string(), Vec::new()));
    }

    let segments: Vec<String> = path.split('/').map(str::to_string).collect();
    if segments.iter().any(String::is_empty) {
        return Err(Error::url(ErrorKind::UrlInvalid, url));
    }

    Ok((authority.to_string(), segments))
}

/// Parse an organization URL such as `https://gitlab.com/group/subgroup`.
///
/// # Errors
///
/// - `UrlInvalid` if the URL is malformed or has no organization segment
/// - `UrlUnsupportedScheme` if the scheme is not `https`
/// - `UrlUnsupportedParts` if the URL has a query, fragment or credentials
pub fn parse_organization_url(url: &str) -> Result<OrganizationReference> {
    let (domain, mut segments) = split_url(url)?;
    if segments.is_empty() {
        return Err(Error::url(ErrorKind::UrlInvalid, url));
    }
    let organization = segments.remove(0);
    Ok(OrganizationReference {
        domain,
        organization,
        sub_organizations: segments,
    })
}

/// Parse a user URL such as `https://github.com/octocat`.
///
/// # Errors
///
/// As [`parse_organization_url`]; additionally `UrlInvalid` unless there is
/// exactly one path segment.
pub fn parse_user_url(url: &str) -> Result<UserReference> {
    let (domain, segments) = split_url(url)?;
    match segments.as_slice() {
        [login] => Ok(UserReference::new(domain, login.clone())),
        _ => Err(Error::url(ErrorKind::UrlInvalid, url)),
    }
}

/// Parse a repository URL.
///
/// With `is_organization_owned`, every segment before the last names the
/// organization path. Otherwise the URL must be exactly `user/repository`.
///
/// # Errors
///
/// As [`parse_organization_url`]; additionally `UrlMissingRepoName` if no
/// repository segment remains after the owner.
pub fn parse_repository_url(url: &str, is_organization_owned: bool) -> Result<RepositoryReference> {
    let (domain, mut segments) = split_url(url)?;
    if segments.is_empty() {
        return Err(Error::url(ErrorKind::UrlInvalid, url));
    }
    if segments.len() < 2 {
        return Err(Error::url(ErrorKind::UrlMissingRepoName, url));
    }

    let last = segments.pop().unwrap_or_default();
    let repository_name = last.strip_suffix(GIT_SUFFIX).unwrap_or(&last).to_string();
    if repository_name.is_empty() {
        return Err(Error::url(ErrorKind::UrlMissingRepoName, url));
    }

    let owner = if is_organization_owned {
        let organization = segments.remove(0);
        OwnerReference::Organization(OrganizationReference {
            domain,
            organization,
            sub_organizations: segments,
        })
    } else {
        if segments.len() != 1 {
            return Err(Error::url(ErrorKind::UrlUnsupportedParts, url));
        }
        OwnerReference::User(UserReference::new(domain, segments.remove(0)))
    };

    Ok(RepositoryReference {
        owner,
        repository_name,
    })
}

/// Parse a user-owned repository URL such as `https://github.com/octocat/hello`.
pub fn parse_user_repository_url(url: &str) -> Result<RepositoryReference> {
    parse_repository_url(url, false)
}
