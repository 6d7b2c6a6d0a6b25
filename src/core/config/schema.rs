//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Client Config
//!
//! Located at (in order of precedence):
//! 1. `$FORGESTATE_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/forgestate/config.toml`
//! 3. `~/.forgestate/config.toml` (canonical location)
//!
//! # Validation
//!
//! Values are validated after parsing: the provider must be known, the
//! domain must be a bare host, and at most one authentication mode may be
//! configured.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::forge::{available_providers_string, ProviderId};

/// Log levels accepted in `[logging] level`.
pub const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Client configuration.
///
/// # Example
///
/// ```toml
/// provider = "gitlab"
/// domain = "gitlab.example.com"
/// destructive_calls = false
///
/// [auth]
/// token = "glpat-..."
///
/// [logging]
/// level = "debug"
/// json = false
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    /// Provider name (e.g. "github"). Detected from the domain if unset.
    pub provider: Option<String>,

    /// Host the client talks to. Defaults to the provider's public host.
    pub domain: Option<String>,

    /// Allow destructive calls such as deleting repositories.
    pub destructive_calls: Option<bool>,

    /// Credentials
    pub auth: Option<AuthConfig>,

    /// Logging defaults
    pub logging: Option<LoggingConfig>,
}

impl ClientConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// - `ConfigError::InvalidValue` if any value is invalid
    /// - `ConfigError::Conflict` if more than one auth mode is set
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(provider) = &self.provider {
            if ProviderId::parse(provider).is_none() {
                return Err(ConfigError::InvalidValue(format!(
                    "invalid provider '{}', must be one of: {}",
                    provider,
                    available_providers_string()
                )));
            }
        }

        if let Some(domain) = &self.domain {
            validate_domain(domain)?;
        }

        if let Some(auth) = &self.auth {
            auth.validate()?;
        }

        if let Some(logging) = &self.logging {
            logging.validate()?;
        }

        Ok(())
    }
}

fn validate_domain(domain: &str) -> Result<(), ConfigError> {
    if domain.is_empty() {
        return Err(ConfigError::InvalidValue("domain cannot be empty".to_string()));
    }
    if domain.contains("://") || domain.contains('/') || domain.chars().any(char::is_whitespace) {
        return Err(ConfigError::InvalidValue(format!(
            "invalid domain '{}', expected a bare host such as 'github.com'",
            domain
        )));
    }
    Ok(())
}

/// How the client authenticates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    /// Personal access token.
    Token,
    /// OAuth2 bearer token.
    OAuth2,
    /// Username and password.
    Basic,
}

/// Credentials. At most one mode may be configured.
#[derive(Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct AuthConfig {
    /// Personal access token
    pub token: Option<String>,

    /// OAuth2 bearer token
    pub oauth2_token: Option<String>,

    /// Basic auth user
    pub username: Option<String>,

    /// Basic auth password
    pub password: Option<String>,
}

impl AuthConfig {
    /// The configured mode, if any. Call [`validate`](Self::validate) first.
    pub fn mode(&self) -> Option<AuthMode> {
        if self.token.is_some() {
            Some(AuthMode::Token)
        } else if self.oauth2_token.is_some() {
            Some(AuthMode::OAuth2)
        } else if self.username.is_some() {
            Some(AuthMode::Basic)
        } else {
            None
        }
    }

    /// Validate the credentials.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut modes = Vec::new();
        if self.token.is_some() {
            modes.push("token");
        }
        if self.oauth2_token.is_some() {
            modes.push("oauth2_token");
        }
        if self.username.is_some() || self.password.is_some() {
            modes.push("username/password");
        }
        if modes.len() > 1 {
            return Err(ConfigError::Conflict(format!(
                "only one auth mode may be set, found: {}",
                modes.join(", ")
            )));
        }

        if self.username.is_some() != self.password.is_some() {
            return Err(ConfigError::InvalidValue(
                "username and password must be set together".to_string(),
            ));
        }

        for (name, value) in [("token", &self.token), ("oauth2_token", &self.oauth2_token)] {
            if value.as_deref() == Some("") {
                return Err(ConfigError::InvalidValue(format!("{} cannot be empty", name)));
            }
        }

        Ok(())
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn redact(value: &Option<String>) -> Option<&'static str> {
            value.as_ref().map(|_| "[REDACTED]")
        }

        f.debug_struct("AuthConfig")
            .field("token", &redact(&self.token))
            .field("oauth2_token", &redact(&self.oauth2_token))
            .field("username", &self.username)
            .field("password", &redact(&self.password))
            .finish()
    }
}

/// Logging defaults. `RUST_LOG` still takes precedence.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Default filter level
    pub level: Option<String>,

    /// Emit JSON lines instead of human-readable output
    pub json: Option<bool>,
}

impl LoggingConfig {
    /// Validate the logging configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(level) = &self.level {
            if !VALID_LOG_LEVELS.contains(&level.to_ascii_lowercase().as_str()) {
                return Err(ConfigError::InvalidValue(format!(
                    "invalid log level '{}', must be one of: {}",
                    level,
                    VALID_LOG_LEVELS.join(", ")
                )));
            }
        }
        Ok(())
    }
}
