//! HTTP fetch wrapper for the content REST API.
//!
//! [`ApiClient`] couples a [`UrlBuilder`] with a `reqwest` client. Each call is a single GET
//! with no retry, caching or request deduplication; callers decide the failure policy.

use crate::config::StrapiConfig;
use crate::error::{ApiErrorDetail, Error, Result};
use crate::query::{StrapiQuery, UrlBuilder};
use crate::types::HEALTH_PATH;
use reqwest::header::ACCEPT;
use reqwest::{Client, ClientBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;
use validator::Validate;

const USER_AGENT: &str = concat!("strapi-core/", env!("CARGO_PKG_VERSION"));

/// Builder for [`ApiClient`].
#[derive(Debug, Clone)]
pub struct ApiClientBuilder {
    config: StrapiConfig,
    user_agent: String,
}

impl ApiClientBuilder {
    /// Create a builder from a [`StrapiConfig`].
    #[must_use]
    pub fn new(config: StrapiConfig) -> Self {
        Self {
            config,
            user_agent: USER_AGENT.to_string(),
        }
    }

    /// Override the `User-Agent` header.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Configure an API token sent as `Authorization: Bearer`.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.config = self.config.with_api_token(token);
        self
    }

    /// Build the client.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the HTTP client cannot be built.
    pub fn build(self) -> Result<ApiClient> {
        self.config.validate()?;
        let urls = UrlBuilder::from_config(&self.config)?;

        let mut builder = ClientBuilder::new()
            .user_agent(&self.user_agent)
            .gzip(self.config.compression);
        if let Some(timeout) = self.config.timeout() {
            builder = builder.timeout(timeout);
        }

        let http = builder
            .build()
            .map_err(|err| Error::ConfigError(format!("Failed to build HTTP client: {err}")))?;

        Ok(ApiClient {
            http,
            urls,
            token: self.config.api_token,
        })
    }
}

/// Asynchronous client for the content REST API.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    urls: UrlBuilder,
    token: Option<SecretString>,
}

impl ApiClient {
    /// Construct a client directly from the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn from_config(config: &StrapiConfig) -> Result<Self> {
        ApiClientBuilder::new(config.clone()).build()
    }

    /// Construct a client for an origin with default settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::from_config(&StrapiConfig::new(base_url)?)
    }

    /// Start a builder pre-populated with the provided configuration.
    #[must_use]
    pub fn builder(config: StrapiConfig) -> ApiClientBuilder {
        ApiClientBuilder::new(config)
    }

    /// URL builder used by this client.
    #[must_use]
    pub const fn urls(&self) -> &UrlBuilder {
        &self.urls
    }

    /// Return the base URL.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        self.urls.base_url()
    }

    /// Build the URL a call to [`ApiClient::fetch`] would request.
    ///
    /// # Errors
    ///
    /// See [`UrlBuilder::build`].
    pub fn build_url(&self, endpoint: &str, query: Option<&StrapiQuery>) -> Result<String> {
        self.urls.build(endpoint, query)
    }

    /// GET an endpoint and decode the JSON body as `T`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ApiRequest`] for a non-success status, [`Error::Transport`] or
    /// [`Error::Timeout`] when no response arrives, [`Error::Decode`] when the body does not
    /// match `T`, and builder errors for an invalid endpoint or query.
    pub async fn fetch<T>(&self, endpoint: &str, query: Option<&StrapiQuery>) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let url = self.urls.url(endpoint, query)?;
        self.get_json(url).await
    }

    /// Probe the server health endpoint.
    ///
    /// Returns `Ok(false)` when the server answers with a non-success status.
    ///
    /// # Errors
    ///
    /// Returns a transport error if the server cannot be reached.
    pub async fn health(&self) -> Result<bool> {
        let url = self.urls.base_url().join(HEALTH_PATH)?;
        debug!(url = %url, "Checking Strapi health");
        let response = self.http.get(url).send().await?;
        let healthy = response.status().is_success();
        if !healthy {
            warn!(status = %response.status(), "Strapi health check failed");
        }
        Ok(healthy)
    }

    async fn get_json<T>(&self, url: Url) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let mut request = self
            .http
            .get(url.clone())
            .header(ACCEPT, "application/json");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token.expose_secret());
        }

        debug!(url = %url, "Sending Strapi request");
        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(url = %url, status = %status, "Strapi request failed");
            return Err(status_error(status, &body));
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|err| {
            Error::Decode(format!("Failed to parse response from `{url}`: {err}"))
        })
    }
}

fn status_error(status: StatusCode, body: &str) -> Error {
    Error::ApiRequest {
        status: status.as_u16(),
        status_text: status.canonical_reason().unwrap_or_default().to_string(),
        detail: ApiErrorDetail::from_body(body),
    }
}
