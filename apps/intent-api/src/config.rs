//! Intent API configuration module.
//!
//! Configuration is layered with the `config` crate:
//!
//! ```text
//! defaults (BridgeConfig::default)
//!    ▲ overridden by
//! tally.toml (optional, working directory)
//!    ▲ overridden by
//! TALLY_* environment variables (TALLY_HTTP_PORT, TALLY_DATABASE_URL, ...)
//! ```

use chrono::{FixedOffset, Offset, Utc};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Largest UTC offset accepted, in minutes (UTC+14).
const MAX_UTC_OFFSET_MINUTES: i32 = 14 * 60;

/// Where the bridge keeps its data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    #[default]
    Postgres,
    /// In-process store; data is lost on restart.
    Memory,
}

/// How sale and receipt numbers are allocated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SequenceStrategy {
    /// Atomic per-series counter row.
    #[default]
    Counter,
    /// Highest recent number plus one.
    MaxScan,
}

/// Intent API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Interface to bind
    pub bind_address: String,

    /// HTTP server port
    pub http_port: u16,

    /// Store backend
    pub store: StoreBackend,

    /// PostgreSQL connection string (required for the postgres backend)
    pub database_url: Option<String>,

    /// Pool size for the postgres backend
    pub db_max_connections: u32,

    /// Shared secret for end-user JWTs (HS256)
    pub jwt_secret: String,

    /// Argon2 hash of the internal service key. Service callers are
    /// rejected when unset.
    pub service_key_hash: Option<String>,

    /// Deadline for every store call, in milliseconds
    pub store_timeout_ms: u64,

    /// Document-number allocation strategy
    pub sequence_strategy: SequenceStrategy,

    /// Business-local offset from UTC, in minutes. Drives document-number
    /// years and summary periods.
    pub utc_offset_minutes: i32,

    /// Prefix for amounts in messages ("KES", "$")
    pub currency_symbol: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        BridgeConfig {
            bind_address: "0.0.0.0".to_string(),
            http_port: 8080,
            store: StoreBackend::Postgres,
            database_url: None,
            db_max_connections: 20,
            // Development only; production sets TALLY_JWT_SECRET
            jwt_secret: "tally-dev-secret-change-in-production".to_string(),
            service_key_hash: None,
            store_timeout_ms: 5_000,
            sequence_strategy: SequenceStrategy::Counter,
            utc_offset_minutes: 0,
            currency_symbol: "KES".to_string(),
        }
    }
}

impl BridgeConfig {
    /// Load configuration from `tally.toml` and `TALLY_*` variables.
    pub fn load() -> Result<Self, ConfigError> {
        let config: BridgeConfig = Config::builder()
            .add_source(File::with_name("tally").required(false))
            .add_source(Environment::with_prefix("TALLY").try_parsing(true))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.store == StoreBackend::Postgres
            && self.database_url.as_deref().map_or(true, |url| url.trim().is_empty())
        {
            return Err(ConfigError::MissingRequired("TALLY_DATABASE_URL".to_string()));
        }

        if self.jwt_secret.trim().is_empty() {
            return Err(ConfigError::MissingRequired("TALLY_JWT_SECRET".to_string()));
        }

        if self.store_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: "TALLY_STORE_TIMEOUT_MS".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }

        if self.utc_offset_minutes.abs() > MAX_UTC_OFFSET_MINUTES {
            return Err(ConfigError::InvalidValue {
                key: "TALLY_UTC_OFFSET_MINUTES".to_string(),
                reason: format!("must be within ±{MAX_UTC_OFFSET_MINUTES}"),
            });
        }

        Ok(())
    }

    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.bind_address, self.http_port)
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    /// Business-local offset. Out-of-range values fall back to UTC;
    /// [`BridgeConfig::validate`] rejects them at startup.
    pub fn utc_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_minutes * 60).unwrap_or_else(|| Utc.fix())
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_config() -> BridgeConfig {
        BridgeConfig {
            store: StoreBackend::Memory,
            ..BridgeConfig::default()
        }
    }

    #[test]
    fn test_defaults() {
        let config = BridgeConfig::default();
        assert_eq!(config.http_port, 8080);
        assert_eq!(config.sequence_strategy, SequenceStrategy::Counter);
        assert_eq!(config.store_timeout(), Duration::from_secs(5));
        assert_eq!(config.listen_address(), "0.0.0.0:8080");
    }

    #[test]
    fn test_postgres_requires_url() {
        let err = BridgeConfig::default().validate().unwrap_err();
        assert!(matches!(err, ConfigError::MissingRequired(ref key) if key == "TALLY_DATABASE_URL"));
        assert!(memory_config().validate().is_ok());
    }

    #[test]
    fn test_offset_bounds() {
        let mut config = memory_config();
        config.utc_offset_minutes = 180;
        assert!(config.validate().is_ok());
        assert_eq!(config.utc_offset().local_minus_utc(), 3 * 3600);

        config.utc_offset_minutes = 15 * 60;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_strategy_names() {
        let strategy: SequenceStrategy = serde_json::from_str("\"max_scan\"").unwrap();
        assert_eq!(strategy, SequenceStrategy::MaxScan);
    }
}
