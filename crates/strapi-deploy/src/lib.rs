//! # strapi-deploy
//!
//! Deployment settings for a Strapi instance, loaded from environment variables and
//! serialized in the shape the framework's `config/*.js` files return.
//!
//! ## Modules
//!
//! - [`env`] - Variable sources
//! - [`database`] - Database connection
//! - [`storage`] - Object storage upload provider
//! - [`server`] - Listen address and application keys
//! - [`plugins`] - Upload and deep-populate plugins
//! - [`middleware`] - Middleware stack and content security policy

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod database;
pub mod env;
pub mod middleware;
pub mod plugins;
pub mod server;
pub mod storage;

use serde::Serialize;
use tracing::info;

pub use database::DatabaseConfig;
pub use env::{Environment, MapEnv, ProcessEnv};
pub use middleware::{middleware_stack, Middleware};
pub use plugins::PluginsConfig;
pub use server::ServerConfig;
pub use storage::StorageConfig;

/// Result type used across the deployment settings.
pub type Result<T> = strapi_core::Result<T>;

/// Every deployment setting of an instance.
#[derive(Debug, Serialize)]
pub struct DeployConfig {
    /// Listen address and keys
    pub server: ServerConfig,
    /// Database connection
    pub database: DatabaseConfig,
    /// Plugins
    pub plugins: PluginsConfig,
    /// Middleware stack
    pub middlewares: Vec<Middleware>,
}

impl DeployConfig {
    /// Load every setting from the given variables.
    ///
    /// Object storage is configured only when `R2_BUCKET_NAME` is set; uploads otherwise
    /// stay on the local provider.
    ///
    /// # Errors
    ///
    /// Returns the first configuration or validation error encountered.
    pub fn from_env<E>(env: &E) -> Result<Self>
    where
        E: Environment,
    {
        let server = ServerConfig::from_env(env)?;
        let database = DatabaseConfig::from_env(env)?;
        let storage = match env.get(storage::ENV_BUCKET_NAME) {
            Some(_) => Some(StorageConfig::from_env(env)?),
            None => None,
        };
        let public_origin = storage.as_ref().and_then(StorageConfig::public_origin);
        let middlewares = middleware_stack(public_origin.as_deref());
        let plugins = PluginsConfig::new(storage);

        info!(
            address = %server.bind_address(),
            database = %database.connection.host,
            object_storage = plugins.upload.is_some(),
            "Loaded deployment settings"
        );
        Ok(Self {
            server,
            database,
            plugins,
            middlewares,
        })
    }

    /// Load every setting from the process environment.
    ///
    /// # Errors
    ///
    /// See [`DeployConfig::from_env`].
    pub fn from_process_env() -> Result<Self> {
        Self::from_env(&ProcessEnv)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_deployment() {
        let config = DeployConfig::from_env(&MapEnv::new()).unwrap();

        assert!(config.plugins.upload.is_none());
        assert_eq!(config.middlewares.len(), 10);
        assert_eq!(config.server.port, 1337);
        assert_eq!(config.database.connection.database, "strapi");
    }

    #[test]
    fn test_object_storage_deployment() {
        let env = MapEnv::new()
            .with("DATABASE_URL", "postgresql://u:p@db.railway.internal:5432/railway")
            .with("HOST", "::")
            .with("R2_ENDPOINT", "https://acct.r2.cloudflarestorage.com/media")
            .with("R2_PUBLIC_URL", "https://pub-abc.r2.dev")
            .with("R2_ACCESS_KEY_ID", "id")
            .with("R2_SECRET_ACCESS_KEY", "secret")
            .with("R2_BUCKET_NAME", "media");
        let config = DeployConfig::from_env(&env).unwrap();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.database.connection.database, "railway");
        assert_eq!(
            config.plugins.storage().and_then(|s| s.endpoint.as_deref()),
            Some("https://acct.r2.cloudflarestorage.com")
        );

        let value = serde_json::to_value(&config).unwrap();
        let img_src = &value["middlewares"][2]["config"]["contentSecurityPolicy"]["directives"]["img-src"];
        assert!(img_src
            .as_array()
            .unwrap()
            .iter()
            .any(|source| source == "https://pub-abc.r2.dev"));
    }

    #[test]
    fn test_incomplete_storage_is_an_error() {
        let env = MapEnv::new().with("R2_BUCKET_NAME", "media");
        assert!(DeployConfig::from_env(&env).is_err());
    }
}
