//! Server configuration from environment variables.
//!
//! Variables:
//! - PORT: Listen port (default: 8000)
//! - STORE_BACKEND: `supabase` (default) or `memory`
//! - SUPABASE_URL / SUPABASE_KEY: Hosted project, required for `supabase`
//! - STATIC_DIR: Directory served for non-API paths (default: `.`)
//! - ADMIN_EMAIL / ADMIN_PASSWORD: Admin login; disabled unless both are set
//! - JWT_SECRET: Secret for admin tokens (default: development-secret)
//! - ADMIN_TOKEN_TTL_HOURS: Admin token lifetime (default: 12)
//! - MAX_BODY_BYTES: Request body limit (default: 65536)

use chrono::Duration;
use std::path::PathBuf;
use std::sync::Arc;

use crate::api::auth::{AdminCredentials, AuthSettings};
use crate::db::{MemoryStore, Store, StoreError, SupabaseStore};

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("invalid value {value:?} for {var}")]
    Invalid { var: &'static str, value: String },

    #[error("unknown store backend {0:?} (expected supabase or memory)")]
    UnknownBackend(String),
}

/// Which store backend to run against.
pub enum StoreBackend {
    Supabase { url: String, key: String },
    Memory,
}

impl StoreBackend {
    /// Build the configured store.
    pub fn connect(&self) -> Result<Arc<dyn Store>, StoreError> {
        match self {
            StoreBackend::Supabase { url, key } => Ok(Arc::new(SupabaseStore::new(url, key)?)),
            StoreBackend::Memory => Ok(Arc::new(MemoryStore::new())),
        }
    }
}

/// Fully resolved server configuration.
pub struct Config {
    pub port: u16,
    pub store: StoreBackend,
    pub static_dir: PathBuf,
    pub auth: AuthSettings,
    pub max_body_bytes: usize,
}

impl Config {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Read configuration through `lookup`. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let port = parse_or(&get, "PORT", 8000u16)?;
        let max_body_bytes = parse_or(&get, "MAX_BODY_BYTES", 64 * 1024usize)?;
        let ttl_hours = parse_or(&get, "ADMIN_TOKEN_TTL_HOURS", 12i64)?;
        let token_ttl = Duration::try_hours(ttl_hours)
            .filter(|ttl| *ttl > Duration::zero())
            .ok_or_else(|| ConfigError::Invalid {
                var: "ADMIN_TOKEN_TTL_HOURS",
                value: ttl_hours.to_string(),
            })?;

        let store = match get("STORE_BACKEND").as_deref().unwrap_or("supabase") {
            "supabase" => StoreBackend::Supabase {
                url: get("SUPABASE_URL").ok_or(ConfigError::Missing("SUPABASE_URL"))?,
                key: get("SUPABASE_KEY").ok_or(ConfigError::Missing("SUPABASE_KEY"))?,
            },
            "memory" => StoreBackend::Memory,
            other => return Err(ConfigError::UnknownBackend(other.to_string())),
        };

        let admin = match (get("ADMIN_EMAIL"), get("ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(AdminCredentials::new(email, password)),
            _ => None,
        };

        Ok(Self {
            port,
            store,
            static_dir: get("STATIC_DIR").map_or_else(|| PathBuf::from("."), PathBuf::from),
            auth: AuthSettings {
                admin,
                jwt_secret: get("JWT_SECRET").unwrap_or_else(|| "development-secret".into()),
                token_ttl,
            },
            max_body_bytes,
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    get: impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match get(var) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { var, value }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|var| map.get(var).cloned())
    }

    #[test]
    fn memory_backend_defaults() {
        let config = config(&[("STORE_BACKEND", "memory")]).unwrap();
        assert_eq!(config.port, 8000);
        assert_eq!(config.static_dir, PathBuf::from("."));
        assert_eq!(config.max_body_bytes, 65536);
        assert!(config.auth.admin.is_none());
        assert_eq!(config.auth.jwt_secret, "development-secret");
        assert_eq!(config.auth.token_ttl, Duration::hours(12));
        assert!(matches!(config.store, StoreBackend::Memory));
    }

    #[test]
    fn supabase_requires_credentials() {
        let err = config(&[("SUPABASE_URL", "https://x.supabase.co")]);
        assert!(matches!(err, Err(ConfigError::Missing("SUPABASE_KEY"))));

        let err = config(&[("SUPABASE_KEY", "key"), ("SUPABASE_URL", "  ")]);
        assert!(matches!(err, Err(ConfigError::Missing("SUPABASE_URL"))));
    }

    #[test]
    fn supabase_backend_is_default() {
        let config = config(&[
            ("SUPABASE_URL", "https://x.supabase.co"),
            ("SUPABASE_KEY", "key"),
            ("PORT", "9001"),
        ])
        .unwrap();
        assert_eq!(config.port, 9001);
        assert!(matches!(config.store, StoreBackend::Supabase { .. }));
    }

    #[test]
    fn admin_needs_both_fields() {
        let config = config(&[
            ("STORE_BACKEND", "memory"),
            ("ADMIN_EMAIL", "boss@example.com"),
        ])
        .unwrap();
        assert!(config.auth.admin.is_none());

        let config = config_with_admin();
        assert!(config
            .auth
            .admin
            .unwrap()
            .matches("boss@example.com", "s3cret"));
    }

    fn config_with_admin() -> Config {
        config(&[
            ("STORE_BACKEND", "memory"),
            ("ADMIN_EMAIL", "boss@example.com"),
            ("ADMIN_PASSWORD", "s3cret"),
        ])
        .unwrap()
    }

    #[test]
    fn invalid_values_are_errors() {
        assert!(matches!(
            config(&[("STORE_BACKEND", "memory"), ("PORT", "eighty")]),
            Err(ConfigError::Invalid { var: "PORT", .. })
        ));
        assert!(matches!(
            config(&[("STORE_BACKEND", "memory"), ("ADMIN_TOKEN_TTL_HOURS", "0")]),
            Err(ConfigError::Invalid {
                var: "ADMIN_TOKEN_TTL_HOURS",
                ..
            })
        ));
        assert!(matches!(
            config(&[("STORE_BACKEND", "sqlite")]),
            Err(ConfigError::UnknownBackend(_))
        ));
    }
}
