//! core::errors
//!
//! The closed error taxonomy shared by the core and every provider adapter.
//!
//! # Design
//!
//! Every error carries exactly one [`ErrorKind`]. Callers never match on
//! message text; they ask [`Error::is`], which answers "is this error, or
//! does it wrap an error, of this kind". The check is recursive through
//! [`MultiError`] aggregates and through errors that carry a source (such
//! as [`Error::InvalidServerData`]).
//!
//! Adapters map their wire-level failures (HTTP status codes, SDK error
//! types) onto these variants. They must not invent new top-level kinds.
//!
//! # Example
//!
//! ```
//! use forgestate::core::errors::{Error, ErrorKind, MultiError};
//!
//! let err = Error::Multi(MultiError::new(vec![
//!     Error::field_required("Repository", "info.name"),
//!     Error::not_found("repository acme/widgets"),
//! ]));
//!
//! assert!(err.is(ErrorKind::Multi));
//! assert!(err.is(ErrorKind::FieldRequired));
//! assert!(err.is(ErrorKind::NotFound));
//! assert!(!err.is(ErrorKind::AlreadyExists));
//! ```

use std::fmt;

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// The semantic kind of an [`Error`].
///
/// This set is closed: adapters translate whatever their backend returns
/// into one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The requested resource does not exist.
    NotFound,
    /// A resource with the same identity already exists.
    AlreadyExists,
    /// A required field was not set.
    FieldRequired,
    /// A field was set to an invalid value.
    FieldInvalid,
    /// A field was set to a value outside its enumeration.
    FieldEnumInvalid,
    /// The client is configured for a different domain than the reference.
    DomainUnsupported,
    /// The backend does not support the requested operation.
    ProviderNoSupport,
    /// The operation needs a top-level organization.
    NotTopLevelOrganization,
    /// The backend returned data that failed server-side validation.
    InvalidServerData,
    /// A destructive call was attempted without opting in.
    DestructiveCallDisallowed,
    /// The backend rate limit was hit.
    RateLimited,
    /// The credentials were rejected or lack permissions.
    Unauthorized,
    /// The URL could not be parsed.
    UrlInvalid,
    /// The URL scheme is not `https`.
    UrlUnsupportedScheme,
    /// The URL carries a query, fragment or credentials.
    UrlUnsupportedParts,
    /// The URL has no repository segment.
    UrlMissingRepoName,
    /// An aggregate of several errors.
    Multi,
    /// A broken adapter invariant. Treated as a defect, not a normal outcome.
    Invariant,
}

impl ErrorKind {
    /// Human-readable description, embedded in error messages.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "the requested resource was not found",
            ErrorKind::AlreadyExists => "the resource already exists",
            ErrorKind::FieldRequired => "field is required",
            ErrorKind::FieldInvalid => "field is invalid",
            ErrorKind::FieldEnumInvalid => "field value isn't among acceptable enum values",
            ErrorKind::DomainUnsupported => "the client doesn't support handling requests for this domain",
            ErrorKind::ProviderNoSupport => "no provider support for this feature",
            ErrorKind::NotTopLevelOrganization => "expected top-level organization, received sub-organization",
            ErrorKind::InvalidServerData => "got invalid data from server, don't trust it",
            ErrorKind::DestructiveCallDisallowed => "destructive call was blocked, disallowed by client",
            ErrorKind::RateLimited => "rate limit exceeded",
            ErrorKind::Unauthorized => "unauthorized request for this resource",
            ErrorKind::UrlInvalid => "invalid organization, user or repository URL",
            ErrorKind::UrlUnsupportedScheme => "unsupported URL scheme, only HTTPS supported",
            ErrorKind::UrlUnsupportedParts => "URL cannot have fragments, query values nor user information",
            ErrorKind::UrlMissingRepoName => "missing repository name",
            ErrorKind::Multi => "multiple errors occurred",
            ErrorKind::Invariant => "adapter invariant violated",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Errors returned by the core, the engine and provider adapters.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// The requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// A resource with the same identity already exists.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// A field-level violation recorded by a [`Validator`].
    ///
    /// `kind` is usually one of the `Field*` kinds but any kind may be
    /// attached to a field path.
    ///
    /// [`Validator`]: crate::core::validation::Validator
    #[error("validation error for {struct_name}.{field}{}: {kind}", value_suffix(.value))]
    Validation {
        /// The kind of the violation.
        kind: ErrorKind,
        /// Top-level struct being validated.
        struct_name: String,
        /// Dot-joined field path inside the struct.
        field: String,
        /// The offending value, when one was recorded.
        value: Option<String>,
    },

    /// The reference targets a domain this client does not serve.
    #[error("domain {actual:?} is not supported by this client (configured for {expected:?})")]
    DomainUnsupported {
        /// Domain the client is configured for.
        expected: String,
        /// Domain the reference asked for.
        actual: String,
    },

    /// The backend does not support the requested operation.
    #[error("no provider support: {0}")]
    ProviderNoSupport(String),

    /// A sub-organization was given where a top-level organization is needed.
    #[error("not a top-level organization: {0}")]
    NotTopLevelOrganization(String),

    /// The backend returned data that failed server-side validation.
    #[error("invalid server data for {resource}: {source}")]
    InvalidServerData {
        /// Description of the resource being hydrated.
        resource: String,
        /// The underlying validation failure.
        source: Box<Error>,
    },

    /// A destructive call was attempted without opting in.
    #[error("destructive call disallowed: {0}")]
    DestructiveCallDisallowed(String),

    /// The backend rate limit was hit.
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// The credentials were rejected or lack permissions.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// A URL failed to parse.
    #[error("{kind}: {url:?}")]
    Url {
        /// One of the `Url*` kinds.
        kind: ErrorKind,
        /// The URL that failed to parse.
        url: String,
    },

    /// Several errors at once.
    #[error("{0}")]
    Multi(MultiError),

    /// A broken adapter invariant, such as a successful response with no
    /// identifying field. This is a defect, not part of the normal taxonomy.
    #[error("adapter invariant violated: {0}")]
    Invariant(String),
}

fn value_suffix(value: &Option<String>) -> String {
    match value {
        Some(v) => format!(" (got value {})", v),
        None => String::new(),
    }
}

impl Error {
    /// Shorthand for [`Error::NotFound`].
    pub fn not_found(what: impl Into<String>) -> Self {
        Error::NotFound(what.into())
    }

    /// Shorthand for [`Error::AlreadyExists`].
    pub fn already_exists(what: impl Into<String>) -> Self {
        Error::AlreadyExists(what.into())
    }

    /// A `FieldRequired` violation with no recorded value.
    pub fn field_required(struct_name: impl Into<String>, field: impl Into<String>) -> Self {
        Error::Validation {
            kind: ErrorKind::FieldRequired,
            struct_name: struct_name.into(),
            field: field.into(),
            value: None,
        }
    }

    /// A URL error of the given kind.
    pub(crate) fn url(kind: ErrorKind, url: &str) -> Self {
        Error::Url {
            kind,
            url: url.to_string(),
        }
    }

    /// The kind of this error (not of any wrapped error).
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::AlreadyExists(_) => ErrorKind::AlreadyExists,
            Error::Validation { kind, .. } => *kind,
            Error::DomainUnsupported { .. } => ErrorKind::DomainUnsupported,
            Error::ProviderNoSupport(_) => ErrorKind::ProviderNoSupport,
            Error::NotTopLevelOrganization(_) => ErrorKind::NotTopLevelOrganization,
            Error::InvalidServerData { .. } => ErrorKind::InvalidServerData,
            Error::DestructiveCallDisallowed(_) => ErrorKind::DestructiveCallDisallowed,
            Error::RateLimited(_) => ErrorKind::RateLimited,
            Error::Unauthorized(_) => ErrorKind::Unauthorized,
            Error::Url { kind, .. } => *kind,
            Error::Multi(_) => ErrorKind::Multi,
            Error::Invariant(_) => ErrorKind::Invariant,
        }
    }

    /// Whether this error is, or wraps, an error of `kind`.
    ///
    /// Aggregates match if any member matches, recursively.
    pub fn is(&self, kind: ErrorKind) -> bool {
        if self.kind() == kind {
            return true;
        }
        match self {
            Error::Multi(multi) => multi.iter().any(|e| e.is(kind)),
            Error::InvalidServerData { source, .. } => source.is(kind),
            _ => false,
        }
    }

    /// Whether this is a `NotFound` error (directly or wrapped).
    pub fn is_not_found(&self) -> bool {
        self.is(ErrorKind::NotFound)
    }

    /// Collapse a list of errors: `None` if empty, the error itself if
    /// there is exactly one, otherwise a [`MultiError`].
    pub fn from_errors(mut errors: Vec<Error>) -> Option<Error> {
        match errors.len() {
            0 => None,
            1 => errors.pop(),
            _ => Some(Error::Multi(MultiError::new(errors))),
        }
    }
}

/// An aggregate wrapping zero or more errors.
#[derive(Debug, Clone, Default)]
pub struct MultiError {
    errors: Vec<Error>,
}

impl MultiError {
    /// Wrap the given errors.
    pub fn new(errors: Vec<Error>) -> Self {
        Self { errors }
    }

    /// Iterate over the wrapped errors.
    pub fn iter(&self) -> impl Iterator<Item = &Error> {
        self.errors.iter()
    }

    /// Number of wrapped errors.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Whether the aggregate wraps nothing.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Unwrap into the list of errors.
    pub fn into_errors(self) -> Vec<Error> {
        self.errors
    }
}

impl fmt::Display for MultiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: [", ErrorKind::Multi)?;
        for (i, err) in self.errors.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}", err)?;
        }
        f.write_str("]")
    }
}

impl std::error::Error for MultiError {}
