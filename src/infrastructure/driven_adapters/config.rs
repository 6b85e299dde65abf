//! Gateway Configuration
//!
//! Loads connection and pool settings from an optional config file and the
//! `DB_*` environment variables (`DB_USER`, `DB_HOST`, `DB_NAME`,
//! `DB_PASSWORD`, `DB_PORT`, plus optional pool overrides). A `.env` file
//! in the working directory is read first.

use std::time::Duration;

use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use config::builder::DefaultState;
use serde::Deserialize;
use sqlx::postgres::PgConnectOptions;
use validator::Validate;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Maximum number of connections in the pool
pub const DEFAULT_MAX_CONNECTIONS: u32 = 20;
/// How long a connection may sit idle before it is closed
pub const DEFAULT_IDLE_TIMEOUT_MS: u64 = 30_000;
/// How long a caller waits for a lease before giving up
pub const DEFAULT_ACQUIRE_TIMEOUT_MS: u64 = 2_000;
pub const DEFAULT_PORT: u16 = 5432;

/// Database password, wiped from memory on drop and never printed
#[derive(Clone, Default, Deserialize, Zeroize, ZeroizeOnDrop)]
#[serde(transparent)]
pub struct Password(String);

impl Password {
    #[must_use]
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Password(**redacted**)")
    }
}

/// Connection and pool settings
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct GatewayConfig {
    #[validate(length(min = 1, message = "DB_HOST must not be empty"))]
    pub host: String,
    #[validate(range(min = 1, message = "DB_PORT must be a valid port"))]
    pub port: u16,
    #[validate(length(min = 1, message = "DB_USER must not be empty"))]
    pub user: String,
    #[serde(default)]
    pub password: Password,
    #[validate(length(min = 1, message = "DB_NAME must not be empty"))]
    pub name: String,
    #[validate(range(min = 1, message = "max_connections must be at least 1"))]
    pub max_connections: u32,
    pub idle_timeout_ms: u64,
    #[validate(range(min = 1, message = "acquire_timeout_ms must be at least 1"))]
    pub acquire_timeout_ms: u64,
}

impl GatewayConfig {
    /// Load configuration from `.env`, `config/gateway.*` and `DB_*` variables
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when a required setting is missing, malformed
    /// or fails validation.
    pub fn load() -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(path) => tracing::debug!(path = %path.display(), "Loaded environment file"),
            Err(e) if e.not_found() => {}
            Err(e) => tracing::warn!(error = %e, "Failed to load .env file"),
        }

        Self::from_builder(
            Self::defaults()?
                .add_source(File::with_name("config/gateway").required(false))
                .add_source(Self::environment()),
        )
    }

    /// Builder preloaded with the fixed pool defaults
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a default cannot be set.
    pub fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("port", i64::from(DEFAULT_PORT))?
            .set_default("max_connections", i64::from(DEFAULT_MAX_CONNECTIONS))?
            .set_default("idle_timeout_ms", DEFAULT_IDLE_TIMEOUT_MS)?
            .set_default("acquire_timeout_ms", DEFAULT_ACQUIRE_TIMEOUT_MS)
    }

    /// `DB_*` environment source (e.g. `DB_HOST`, `DB_MAX_CONNECTIONS`)
    #[must_use]
    pub fn environment() -> Environment {
        Environment::with_prefix("DB").try_parsing(true)
    }

    /// Deserialize and validate from an assembled builder
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` on missing keys, type mismatches or failed
    /// validation.
    pub fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        let config: Self = builder.build()?.try_deserialize()?;
        config
            .validate()
            .map_err(|e| ConfigError::Message(format!("invalid database configuration: {e}")))?;
        Ok(config)
    }

    #[must_use]
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }

    #[must_use]
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_millis(self.acquire_timeout_ms)
    }

    /// Driver connect options for this configuration
    #[must_use]
    pub fn connect_options(&self) -> PgConnectOptions {
        let options = PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .database(&self.name);

        if self.password.expose().is_empty() {
            options
        } else {
            options.password(self.password.expose())
        }
    }
}
