//! S3-compatible upload provider settings (Cloudflare R2).

use crate::env::Environment;
use crate::Result;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use strapi_core::Error;
use tracing::debug;
use url::Url;

/// Upload provider name.
pub const PROVIDER: &str = "aws-s3";
/// Default signing region.
pub const DEFAULT_REGION: &str = "us-east-1";
/// Socket cap of the provider's HTTPS agent.
pub const MAX_SOCKETS: u32 = 50;

/// Variable holding the S3 endpoint.
pub const ENV_ENDPOINT: &str = "R2_ENDPOINT";
/// Variable holding the public base URL of uploaded files.
pub const ENV_PUBLIC_URL: &str = "R2_PUBLIC_URL";
/// Variable holding the key prefix inside the bucket.
pub const ENV_ROOT_PATH: &str = "R2_ROOT_PATH";
/// Variable holding the access key id.
pub const ENV_ACCESS_KEY_ID: &str = "R2_ACCESS_KEY_ID";
/// Variable holding the secret access key.
pub const ENV_SECRET_ACCESS_KEY: &str = "R2_SECRET_ACCESS_KEY";
/// Variable holding the signing region.
pub const ENV_REGION: &str = "R2_REGION";
/// Variable holding the bucket name.
pub const ENV_BUCKET_NAME: &str = "R2_BUCKET_NAME";

/// Keep-alive HTTPS agent used by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpAgentSettings {
    /// Reuse connections
    pub keep_alive: bool,
    /// Concurrent socket cap
    pub max_sockets: u32,
    /// Verify the server certificate
    pub reject_unauthorized: bool,
}

impl Default for HttpAgentSettings {
    fn default() -> Self {
        Self {
            keep_alive: true,
            max_sockets: MAX_SOCKETS,
            reject_unauthorized: true,
        }
    }
}

/// Object storage settings for the upload provider.
#[derive(Debug)]
pub struct StorageConfig {
    /// Public base URL files are served from
    pub public_url: Option<Url>,
    /// Key prefix inside the bucket (may be empty)
    pub root_path: String,
    /// Access key id
    pub access_key_id: String,
    /// Secret access key
    pub secret_access_key: SecretString,
    /// Signing region
    pub region: String,
    /// Normalized S3 endpoint (scheme, host and port only)
    pub endpoint: Option<String>,
    /// Bucket name
    pub bucket: String,
    /// Path-style addressing, required by R2
    pub force_path_style: bool,
    /// Canned ACL; unset because R2 rejects ACL headers
    pub acl: Option<String>,
    /// HTTPS agent settings
    pub agent: HttpAgentSettings,
}

impl StorageConfig {
    /// Load from the `R2_*` variables.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if the bucket or credentials are missing, or the
    /// public URL does not parse.
    pub fn from_env<E>(env: &E) -> Result<Self>
    where
        E: Environment,
    {
        let public_url = env
            .get(ENV_PUBLIC_URL)
            .map(|raw| {
                Url::parse(&raw)
                    .map_err(|err| Error::ConfigError(format!("Invalid {ENV_PUBLIC_URL}: {err}")))
            })
            .transpose()?;

        let config = Self {
            public_url,
            root_path: env.string_or(ENV_ROOT_PATH, ""),
            access_key_id: env.required(ENV_ACCESS_KEY_ID)?,
            secret_access_key: SecretString::from(env.required(ENV_SECRET_ACCESS_KEY)?),
            region: env.string_or(ENV_REGION, DEFAULT_REGION),
            endpoint: env.get(ENV_ENDPOINT).map(|raw| normalize_endpoint(&raw)),
            bucket: env.required(ENV_BUCKET_NAME)?,
            force_path_style: true,
            acl: None,
            agent: HttpAgentSettings::default(),
        };

        debug!(
            bucket = %config.bucket,
            endpoint = ?config.endpoint,
            root_path = %config.root_path,
            "Loaded storage settings"
        );
        Ok(config)
    }

    /// Bucket key for an uploaded file: `<root_path>/<file_name>`.
    #[must_use]
    pub fn object_key(&self, file_name: &str) -> String {
        let root = self.root_path.trim_matches('/');
        let file_name = file_name.trim_start_matches('/');
        if root.is_empty() {
            file_name.to_string()
        } else {
            format!("{root}/{file_name}")
        }
    }

    /// Public URL of an uploaded file.
    #[must_use]
    pub fn public_file_url(&self, file_name: &str) -> Option<String> {
        self.public_url.as_ref().map(|base| {
            format!(
                "{}/{}",
                base.as_str().trim_end_matches('/'),
                self.object_key(file_name)
            )
        })
    }

    /// Origin of the public URL, for content security policy sources.
    #[must_use]
    pub fn public_origin(&self) -> Option<String> {
        self.public_url.as_ref().map(public_origin)
    }
}

/// Scheme, host and port of a URL.
#[must_use]
pub fn public_origin(url: &Url) -> String {
    url.origin().ascii_serialization()
}

/// Strip any path (typically a bucket name) and trailing slash from an S3 endpoint.
///
/// Unparseable input falls back to removing the last path segment textually.
#[must_use]
pub fn normalize_endpoint(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    match Url::parse(trimmed) {
        Ok(mut url) if !url.cannot_be_a_base() => {
            url.set_path("");
            url.set_query(None);
            url.set_fragment(None);
            url.as_str().trim_end_matches('/').to_string()
        }
        _ => match trimmed.rfind('/') {
            Some(index) if index + 1 < trimmed.len() => trimmed[..index].to_string(),
            _ => trimmed.to_string(),
        },
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Credentials<'a> {
    access_key_id: &'a str,
    secret_access_key: &'a str,
}

#[derive(Serialize)]
struct Params<'a> {
    #[serde(rename = "ACL")]
    acl: Option<&'a str>,
    #[serde(rename = "Bucket")]
    bucket: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct S3Options<'a> {
    credentials: Credentials<'a>,
    region: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    endpoint: Option<&'a str>,
    force_path_style: bool,
    request_handler: HttpAgentSettings,
    params: Params<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProviderOptions<'a> {
    base_url: Option<&'a str>,
    root_path: &'a str,
    s3_options: S3Options<'a>,
}

/// Serializes as the upload plugin's `config` object.
impl Serialize for StorageConfig {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;

        let provider_options = ProviderOptions {
            base_url: self.public_url.as_ref().map(|url| url.as_str().trim_end_matches('/')),
            root_path: &self.root_path,
            s3_options: S3Options {
                credentials: Credentials {
                    access_key_id: &self.access_key_id,
                    secret_access_key: self.secret_access_key.expose_secret(),
                },
                region: &self.region,
                endpoint: self.endpoint.as_deref(),
                force_path_style: self.force_path_style,
                request_handler: self.agent,
                params: Params {
                    acl: self.acl.as_deref(),
                    bucket: &self.bucket,
                },
            },
        };

        let mut state = serializer.serialize_struct("StorageConfig", 3)?;
        state.serialize_field("provider", PROVIDER)?;
        state.serialize_field("providerOptions", &provider_options)?;
        state.serialize_field(
            "actionOptions",
            &serde_json::json!({ "upload": {}, "uploadStream": {}, "delete": {} }),
        )?;
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::MapEnv;
    use serde_json::json;

    fn r2_env() -> MapEnv {
        MapEnv::new()
            .with(ENV_ENDPOINT, "https://acct123.r2.cloudflarestorage.com/media-bucket/")
            .with(ENV_PUBLIC_URL, "https://pub-abc.r2.dev/")
            .with(ENV_ACCESS_KEY_ID, "AKIA")
            .with(ENV_SECRET_ACCESS_KEY, "shh")
            .with(ENV_BUCKET_NAME, "media-bucket")
    }

    #[test]
    fn test_normalize_endpoint() {
        assert_eq!(
            normalize_endpoint("https://acct.r2.cloudflarestorage.com/bucket/"),
            "https://acct.r2.cloudflarestorage.com"
        );
        assert_eq!(
            normalize_endpoint("https://acct.r2.cloudflarestorage.com"),
            "https://acct.r2.cloudflarestorage.com"
        );
        assert_eq!(
            normalize_endpoint("http://localhost:9000/bucket"),
            "http://localhost:9000"
        );
        assert_eq!(normalize_endpoint("acct.example.com/bucket"), "acct.example.com");
    }

    #[test]
    fn test_from_env() {
        let config = StorageConfig::from_env(&r2_env()).unwrap();

        assert_eq!(
            config.endpoint.as_deref(),
            Some("https://acct123.r2.cloudflarestorage.com")
        );
        assert_eq!(config.region, DEFAULT_REGION);
        assert_eq!(config.root_path, "");
        assert!(config.force_path_style);
        assert_eq!(config.acl, None);
        assert_eq!(config.agent.max_sockets, 50);
        assert_eq!(config.public_origin().as_deref(), Some("https://pub-abc.r2.dev"));
    }

    #[test]
    fn test_missing_credentials() {
        let env = MapEnv::new().with(ENV_BUCKET_NAME, "b");
        let err = StorageConfig::from_env(&env).unwrap_err();
        assert!(err.to_string().contains(ENV_ACCESS_KEY_ID));
    }

    #[test]
    fn test_object_key() {
        let config = StorageConfig::from_env(&r2_env().with(ENV_ROOT_PATH, "site1/")).unwrap();
        assert_eq!(config.object_key("/photo_ab12.jpg"), "site1/photo_ab12.jpg");
        assert_eq!(
            config.public_file_url("photo_ab12.jpg").as_deref(),
            Some("https://pub-abc.r2.dev/site1/photo_ab12.jpg")
        );

        let flat = StorageConfig::from_env(&r2_env()).unwrap();
        assert_eq!(flat.object_key("photo.jpg"), "photo.jpg");
    }

    #[test]
    fn test_serialized_shape() {
        let config = StorageConfig::from_env(&r2_env()).unwrap();
        let value = serde_json::to_value(&config).unwrap();

        assert_eq!(value["provider"], "aws-s3");
        let options = &value["providerOptions"];
        assert_eq!(options["baseUrl"], "https://pub-abc.r2.dev");
        assert_eq!(options["s3Options"]["forcePathStyle"], true);
        assert_eq!(
            options["s3Options"]["credentials"],
            json!({ "accessKeyId": "AKIA", "secretAccessKey": "shh" })
        );
        assert_eq!(
            options["s3Options"]["params"],
            json!({ "ACL": null, "Bucket": "media-bucket" })
        );
        assert_eq!(
            options["s3Options"]["requestHandler"],
            json!({ "keepAlive": true, "maxSockets": 50, "rejectUnauthorized": true })
        );
        assert_eq!(
            value["actionOptions"],
            json!({ "upload": {}, "uploadStream": {}, "delete": {} })
        );
    }
}
