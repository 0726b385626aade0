//! Configuration structures for Strapi clients.
//!
//! The base origin and the API route prefix are explicit values rather than process-wide
//! constants, so the same process can talk to several deployments.

use crate::Error;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;
use validator::Validate;

/// Default API route prefix used by the content REST API.
pub const DEFAULT_API_PREFIX: &str = "/api";

/// Default origin of a locally running CMS.
pub const DEFAULT_BASE_URL: &str = "http://localhost:1337";

/// Environment variable holding the CMS origin.
pub const ENV_BASE_URL: &str = "STRAPI_URL";
/// Environment variable overriding the API prefix.
pub const ENV_API_PREFIX: &str = "STRAPI_API_PREFIX";
/// Environment variable holding the API token.
pub const ENV_API_TOKEN: &str = "STRAPI_API_TOKEN";
/// Environment variable holding the request timeout in seconds.
pub const ENV_TIMEOUT_SECS: &str = "STRAPI_TIMEOUT_SECS";

/// Configuration for a Strapi client instance.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct StrapiConfig {
    /// Origin the API paths are resolved against (e.g. `https://cms.example.com`)
    #[validate(url)]
    pub base_url: String,

    /// Route prefix of the REST API
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,

    /// Optional API token sent as a bearer token
    #[serde(default, skip_serializing)]
    pub api_token: Option<SecretString>,

    /// Optional request timeout in seconds; requests never time out when unset
    #[validate(range(min = 1, max = 300))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,

    /// Whether to accept gzip-compressed responses
    #[serde(default = "default_compression")]
    pub compression: bool,
}

fn default_api_prefix() -> String {
    DEFAULT_API_PREFIX.to_string()
}

const fn default_compression() -> bool {
    true
}

impl StrapiConfig {
    /// Create a new client configuration for the given origin.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or validation fails.
    pub fn new(base_url: impl Into<String>) -> Result<Self, Error> {
        let config = Self {
            base_url: base_url.into(),
            api_prefix: default_api_prefix(),
            api_token: None,
            request_timeout_secs: None,
            compression: default_compression(),
        };

        config
            .validate()
            .map_err(|e| Error::ConfigError(format!("Invalid configuration: {e}")))?;

        Ok(config)
    }

    /// Build a configuration from `STRAPI_*` environment variables.
    ///
    /// `STRAPI_URL` falls back to [`DEFAULT_BASE_URL`] when unset.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable holds an invalid value.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable holds an invalid value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup(ENV_BASE_URL).unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let mut config = Self::new(base_url)?;

        if let Some(prefix) = lookup(ENV_API_PREFIX) {
            config = config.with_api_prefix(prefix);
        }
        if let Some(token) = lookup(ENV_API_TOKEN).filter(|t| !t.is_empty()) {
            config = config.with_api_token(token);
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            let secs = raw.trim().parse::<u64>().map_err(|e| {
                Error::ConfigError(format!("Invalid {ENV_TIMEOUT_SECS} `{raw}`: {e}"))
            })?;
            config = config.with_timeout(secs);
        }

        config.validate()?;
        Ok(config)
    }

    /// Set the API route prefix. A leading `/` is added and trailing ones removed.
    #[must_use]
    pub fn with_api_prefix(mut self, prefix: impl AsRef<str>) -> Self {
        let trimmed = prefix.as_ref().trim_matches('/');
        self.api_prefix = format!("/{trimmed}");
        self
    }

    /// Set the API token.
    #[must_use]
    pub fn with_api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(SecretString::from(token.into()));
        self
    }

    /// Set request timeout in seconds.
    #[must_use]
    pub const fn with_timeout(mut self, seconds: u64) -> Self {
        self.request_timeout_secs = Some(seconds);
        self
    }

    /// Enable or disable response compression.
    #[must_use]
    pub const fn with_compression(mut self, enabled: bool) -> Self {
        self.compression = enabled;
        self
    }

    /// Get the request timeout as a Duration, if set.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    /// Parse and validate the base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be parsed.
    pub fn parse_base_url(&self) -> Result<Url, Error> {
        Url::parse(&self.base_url)
            .map_err(|e| Error::ConfigError(format!("Invalid base URL: {e}")))
    }
}

impl Default for StrapiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_prefix: default_api_prefix(),
            api_token: None,
            request_timeout_secs: None,
            compression: default_compression(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::collections::HashMap;

    #[test]
    fn test_strapi_config_new() {
        let config = StrapiConfig::new("https://cms.example.com").unwrap();
        assert_eq!(config.base_url, "https://cms.example.com");
        assert_eq!(config.api_prefix, "/api");
        assert!(config.api_token.is_none());
        assert!(config.timeout().is_none());
        assert!(config.compression);
    }

    #[test]
    fn test_strapi_config_invalid_url() {
        assert!(StrapiConfig::new("not-a-url").is_err());
    }

    #[test]
    fn test_strapi_config_builder() {
        let config = StrapiConfig::new("https://cms.example.com")
            .unwrap()
            .with_api_prefix("content/")
            .with_api_token("secret-token")
            .with_timeout(45)
            .with_compression(false);

        assert_eq!(config.api_prefix, "/content");
        assert_eq!(
            config.api_token.as_ref().map(ExposeSecret::expose_secret),
            Some("secret-token")
        );
        assert!(!format!("{config:?}").contains("secret-token"));
        assert_eq!(config.timeout(), Some(Duration::from_secs(45)));
        assert!(!config.compression);
    }

    #[test]
    fn test_strapi_config_default() {
        let config = StrapiConfig::default();
        assert_eq!(config.base_url, "http://localhost:1337");
        assert_eq!(config.api_prefix, "/api");
    }

    #[test]
    fn test_parse_base_url() {
        let config = StrapiConfig::new("https://cms.example.com:8443").unwrap();
        let url = config.parse_base_url().unwrap();
        assert_eq!(url.scheme(), "https");
        assert_eq!(url.host_str(), Some("cms.example.com"));
        assert_eq!(url.port(), Some(8443));
    }

    #[test]
    fn test_from_lookup() {
        let vars: HashMap<&str, &str> = HashMap::from([
            (ENV_BASE_URL, "https://cms.example.com"),
            (ENV_API_TOKEN, "abc"),
            (ENV_TIMEOUT_SECS, "20"),
        ]);
        let config = StrapiConfig::from_lookup(|k| vars.get(k).map(ToString::to_string)).unwrap();

        assert_eq!(config.base_url, "https://cms.example.com");
        assert_eq!(config.api_prefix, "/api");
        assert_eq!(
            config.api_token.as_ref().map(ExposeSecret::expose_secret),
            Some("abc")
        );
        assert_eq!(config.request_timeout_secs, Some(20));
    }

    #[test]
    fn test_from_lookup_defaults_and_bad_timeout() {
        let config = StrapiConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);

        let err = StrapiConfig::from_lookup(|k| {
            (k == ENV_TIMEOUT_SECS).then(|| "soon".to_string())
        })
        .unwrap_err();
        assert!(matches!(err, Error::ConfigError(_)));

        let err = StrapiConfig::from_lookup(|k| {
            (k == ENV_TIMEOUT_SECS).then(|| "0".to_string())
        })
        .unwrap_err();
        assert!(matches!(err, Error::ValidationError(_)));
    }

    #[test]
    fn test_config_serialization_skips_token() {
        let config = StrapiConfig::new("https://cms.example.com")
            .unwrap()
            .with_api_token("secret-token");

        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("secret-token"));

        let deserialized: StrapiConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config.base_url, deserialized.base_url);
        assert_eq!(deserialized.api_prefix, "/api");
        assert!(deserialized.api_token.is_none());
    }

    #[test]
    fn test_config_validation_timeout_range() {
        let mut config = StrapiConfig::default();
        config.request_timeout_secs = Some(0);
        assert!(config.validate().is_err());

        config.request_timeout_secs = Some(301);
        assert!(config.validate().is_err());

        config.request_timeout_secs = Some(30);
        assert!(config.validate().is_ok());

        config.request_timeout_secs = None;
        assert!(config.validate().is_ok());
    }
}
