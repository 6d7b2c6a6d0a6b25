//! core::config
//!
//! Configuration schema and loading.
//!
//! # Overview
//!
//! A single user-level file configures which provider and domain a client
//! talks to, whether destructive calls are allowed, credentials, and
//! logging defaults. Everything is optional: with no file at all the
//! client targets github.com with destructive calls disabled.
//!
//! # Locations
//!
//! Searched in order:
//! 1. `$FORGESTATE_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/forgestate/config.toml`
//! 3. `~/.forgestate/config.toml` (canonical location)
//!
//! # Example
//!
//! ```no_run
//! use forgestate::core::config::Config;
//!
//! let config = Config::load().unwrap();
//! let context = config.context().unwrap();
//! println!("talking to {} at {}", context.provider(), context.domain());
//! ```

pub mod schema;

pub use schema::{AuthConfig, AuthMode, ClientConfig, LoggingConfig};

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::forge::{detect_provider, ClientContext, ProviderId};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "FORGESTATE_CONFIG";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid config value: {0}")]
    InvalidValue(String),

    #[error("conflicting config values: {0}")]
    Conflict(String),

    #[error("home directory not found")]
    NoHomeDir,
}

/// Loaded configuration with defaults applied by the accessors.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// The parsed file contents.
    pub client: ClientConfig,
    /// Path the configuration was loaded from, if any.
    loaded_from: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the default locations.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be read, parsed
    /// or validated. A missing file is not an error (defaults are used).
    pub fn load() -> Result<Self, ConfigError> {
        let candidates = Self::search_paths(
            std::env::var_os(CONFIG_ENV).map(PathBuf::from),
            std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from),
            dirs::home_dir(),
        );
        Self::load_first(&candidates)
    }

    /// Candidate files in precedence order.
    fn search_paths(
        explicit: Option<PathBuf>,
        xdg_home: Option<PathBuf>,
        home: Option<PathBuf>,
    ) -> Vec<PathBuf> {
        let mut paths = Vec::new();
        if let Some(path) = explicit {
            paths.push(path);
        }
        if let Some(xdg) = xdg_home {
            paths.push(xdg.join("forgestate/config.toml"));
        }
        if let Some(home) = home {
            paths.push(home.join(".forgestate/config.toml"));
        }
        paths
    }

    fn load_first(candidates: &[PathBuf]) -> Result<Self, ConfigError> {
        for path in candidates {
            if path.exists() {
                return Self::load_from(path);
            }
        }
        tracing::debug!("no config file found, using defaults");
        Ok(Self::default())
    }

    /// Load and validate a specific file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let client = Self::parse(&contents).map_err(|e| match e {
            ConfigError::ParseError { message, .. } => ConfigError::ParseError {
                path: path.to_path_buf(),
                message,
            },
            other => other,
        })?;

        tracing::debug!(path = %path.display(), "loaded config");
        Ok(Self {
            client,
            loaded_from: Some(path.to_path_buf()),
        })
    }

    /// Parse and validate TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            client: Self::parse(contents)?,
            loaded_from: None,
        })
    }

    fn parse(contents: &str) -> Result<ClientConfig, ConfigError> {
        let client: ClientConfig =
            toml::from_str(contents).map_err(|e| ConfigError::ParseError {
                path: PathBuf::new(),
                message: e.to_string(),
            })?;
        client.validate()?;
        Ok(client)
    }

    /// Get the canonical path for the config file.
    ///
    /// Returns `~/.forgestate/config.toml`.
    pub fn canonical_path() -> Result<PathBuf, ConfigError> {
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
        Ok(home.join(".forgestate/config.toml"))
    }

    // =========================================================================
    // Accessor methods with defaults
    // =========================================================================

    /// The provider, explicit or detected from the domain.
    ///
    /// Defaults to GitHub when neither is configured.
    pub fn provider(&self) -> Result<ProviderId, ConfigError> {
        if let Some(name) = &self.client.provider {
            return ProviderId::parse(name)
                .ok_or_else(|| ConfigError::InvalidValue(format!("invalid provider '{}'", name)));
        }
        match &self.client.domain {
            None => Ok(ProviderId::GitHub),
            Some(domain) => detect_provider(domain).ok_or_else(|| {
                ConfigError::InvalidValue(format!(
                    "cannot detect the provider for '{}', set `provider` explicitly",
                    domain
                ))
            }),
        }
    }

    /// The domain, explicit or the provider's public host.
    pub fn domain(&self) -> Result<String, ConfigError> {
        if let Some(domain) = &self.client.domain {
            return Ok(domain.clone());
        }
        let provider = self.provider()?;
        provider.default_domain().map(str::to_string).ok_or_else(|| {
            ConfigError::InvalidValue(format!(
                "{} has no public host, set `domain` explicitly",
                provider
            ))
        })
    }

    /// Whether destructive calls are enabled. Defaults to `false`.
    pub fn destructive_calls(&self) -> bool {
        self.client.destructive_calls.unwrap_or(false)
    }

    /// The configured authentication mode, if any.
    pub fn auth_mode(&self) -> Option<AuthMode> {
        self.client.auth.as_ref().and_then(AuthConfig::mode)
    }

    /// Default log level. Defaults to "info".
    pub fn log_level(&self) -> &str {
        self.client
            .logging
            .as_ref()
            .and_then(|l| l.level.as_deref())
            .unwrap_or("info")
    }

    /// Whether logs are emitted as JSON. Defaults to `false`.
    pub fn log_json(&self) -> bool {
        self.client
            .logging
            .as_ref()
            .and_then(|l| l.json)
            .unwrap_or(false)
    }

    /// Build the context shared by an adapter's clients.
    pub fn context(&self) -> Result<ClientContext, ConfigError> {
        Ok(ClientContext::new(self.provider()?, self.domain()?)
            .with_destructive_calls(self.destructive_calls()))
    }

    /// Get the path the configuration was loaded from.
    pub fn loaded_from(&self) -> Option<&Path> {
        self.loaded_from.as_deref()
    }
}
