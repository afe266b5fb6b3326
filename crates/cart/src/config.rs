//! Cart configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `GOMARKET_STORAGE_DIR` - Directory for file-backed storage (default: .gomarket)
//! - `GOMARKET_CART_KEY` - Storage key of the cart snapshot (default: @GoMarket)
//! - `GOMARKET_CURRENCY` - ISO 4217 code prices are shown in (default: BRL)
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::path::PathBuf;

use gomarket_core::CurrencyCode;
use thiserror::Error;

/// Default storage key, shared with carts persisted by earlier app versions.
pub const DEFAULT_STORAGE_KEY: &str = "@GoMarket";

/// Default storage directory for [`FileStorage`](crate::FileStorage).
pub const DEFAULT_STORAGE_DIR: &str = ".gomarket";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Cart configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartConfig {
    /// Directory the file backend writes into
    pub storage_dir: PathBuf,
    /// Key the cart snapshot is stored under
    pub storage_key: String,
    /// Currency for totals
    pub currency: CurrencyCode,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

impl Default for CartConfig {
    fn default() -> Self {
        Self {
            storage_dir: PathBuf::from(DEFAULT_STORAGE_DIR),
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            currency: CurrencyCode::default(),
            sentry_dsn: None,
        }
    }
}

impl CartConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from any variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an invalid value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let storage_dir = lookup("GOMARKET_STORAGE_DIR")
            .map_or_else(|| PathBuf::from(DEFAULT_STORAGE_DIR), PathBuf::from);

        let storage_key = lookup("GOMARKET_CART_KEY")
            .unwrap_or_else(|| DEFAULT_STORAGE_KEY.to_string());
        if storage_key.trim().is_empty() {
            return Err(ConfigError::InvalidEnvVar(
                "GOMARKET_CART_KEY".to_string(),
                "must not be empty".to_string(),
            ));
        }

        let currency = match lookup("GOMARKET_CURRENCY") {
            Some(code) => code.parse::<CurrencyCode>().map_err(|e| {
                ConfigError::InvalidEnvVar("GOMARKET_CURRENCY".to_string(), e.to_string())
            })?,
            None => CurrencyCode::default(),
        };

        let sentry_dsn = lookup("SENTRY_DSN").filter(|dsn| !dsn.is_empty());

        Ok(Self {
            storage_dir,
            storage_key,
            currency,
            sentry_dsn,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = CartConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, CartConfig::default());
        assert_eq!(config.storage_key, "@GoMarket");
        assert_eq!(config.currency, CurrencyCode::BRL);
    }

    #[test]
    fn test_overrides() {
        let config = CartConfig::from_lookup(lookup_from(&[
            ("GOMARKET_STORAGE_DIR", "/tmp/carts"),
            ("GOMARKET_CART_KEY", "cart-v2"),
            ("GOMARKET_CURRENCY", "usd"),
            ("SENTRY_DSN", "https://key@sentry.example/1"),
        ]))
        .unwrap();
        assert_eq!(config.storage_dir, PathBuf::from("/tmp/carts"));
        assert_eq!(config.storage_key, "cart-v2");
        assert_eq!(config.currency, CurrencyCode::USD);
        assert!(config.sentry_dsn.is_some());
    }

    #[test]
    fn test_invalid_currency() {
        let err = CartConfig::from_lookup(lookup_from(&[("GOMARKET_CURRENCY", "DOGE")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(name, _) if name == "GOMARKET_CURRENCY"));
    }

    #[test]
    fn test_empty_key_rejected() {
        let result = CartConfig::from_lookup(lookup_from(&[("GOMARKET_CART_KEY", "  ")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_sentry_dsn_is_none() {
        let config = CartConfig::from_lookup(lookup_from(&[("SENTRY_DSN", "")])).unwrap();
        assert_eq!(config.sentry_dsn, None);
    }
}
