//! HTTP listen address and application keys.

use crate::env::{serialize_secrets, Environment};
use crate::Result;
use secrecy::SecretString;
use serde::Serialize;
use tracing::{debug, warn};
use validator::Validate;

/// Default listen host (all IPv4 interfaces).
pub const DEFAULT_HOST: &str = "0.0.0.0";
/// Default listen port.
pub const DEFAULT_PORT: u16 = 1337;

/// Application session keys.
#[derive(Debug, Default, Serialize)]
pub struct AppSettings {
    /// Keys used to sign session cookies
    #[serde(serialize_with = "serialize_secrets")]
    pub keys: Vec<SecretString>,
}

/// Server settings handed to the framework.
#[derive(Debug, Serialize, Validate)]
pub struct ServerConfig {
    /// Listen host
    #[validate(length(min = 1))]
    pub host: String,
    /// Listen port
    #[validate(range(min = 1))]
    pub port: u16,
    /// Application keys
    pub app: AppSettings,
}

impl ServerConfig {
    /// Load from `HOST`, `PORT` and `APP_KEYS`.
    ///
    /// # Errors
    ///
    /// Returns an error if `PORT` is not a valid, non-zero port number.
    pub fn from_env<E>(env: &E) -> Result<Self>
    where
        E: Environment,
    {
        let config = Self {
            host: normalize_host(&env.string_or("HOST", DEFAULT_HOST)),
            port: env.parse_or("PORT", DEFAULT_PORT)?,
            app: AppSettings {
                keys: env.list("APP_KEYS").into_iter().map(SecretString::from).collect(),
            },
        };
        config.validate()?;

        if config.app.keys.is_empty() {
            warn!("APP_KEYS is not set; sessions cannot be signed");
        }
        debug!(address = %config.bind_address(), "Loaded server settings");
        Ok(config)
    }

    /// `host:port` as handed to the listener.
    #[must_use]
    pub fn bind_address(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

/// Map the IPv6 wildcard `::` to `0.0.0.0`; other hosts pass through trimmed.
#[must_use]
pub fn normalize_host(host: &str) -> String {
    match host.trim() {
        "::" => DEFAULT_HOST.to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::MapEnv;
    use secrecy::ExposeSecret;
    use serde_json::json;
    use strapi_core::Error;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_env(&MapEnv::new()).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 1337);
        assert!(config.app.keys.is_empty());
        assert_eq!(config.bind_address(), "0.0.0.0:1337");
    }

    #[test]
    fn test_ipv6_wildcard_host() {
        let env = MapEnv::new().with("HOST", "::").with("PORT", "8080");
        let config = ServerConfig::from_env(&env).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);

        assert_eq!(normalize_host("::1"), "::1");
        let env = MapEnv::new().with("HOST", "::1");
        assert_eq!(ServerConfig::from_env(&env).unwrap().bind_address(), "[::1]:1337");
    }

    #[test]
    fn test_app_keys() {
        let env = MapEnv::new().with("APP_KEYS", "k1,k2, k3");
        let config = ServerConfig::from_env(&env).unwrap();
        let keys: Vec<_> = config.app.keys.iter().map(|k| k.expose_secret()).collect();
        assert_eq!(keys, ["k1", "k2", "k3"]);

        let value = serde_json::to_value(&config).unwrap();
        assert_eq!(value["app"], json!({ "keys": ["k1", "k2", "k3"] }));
        assert!(!format!("{config:?}").contains("k2"));
    }

    #[test]
    fn test_invalid_port() {
        let env = MapEnv::new().with("PORT", "70000");
        assert!(matches!(
            ServerConfig::from_env(&env),
            Err(Error::ConfigError(_))
        ));

        let env = MapEnv::new().with("PORT", "0");
        assert!(matches!(
            ServerConfig::from_env(&env),
            Err(Error::ValidationError(_))
        ));
    }
}
