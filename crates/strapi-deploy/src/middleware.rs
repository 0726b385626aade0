//! Middleware stack and the security middleware's content security policy.

use serde::Serialize;

/// Name of the security middleware.
pub const SECURITY: &str = "strapi::security";

/// Middlewares in load order.
pub const MIDDLEWARE_ORDER: [&str; 10] = [
    "strapi::logger",
    "strapi::errors",
    SECURITY,
    "strapi::cors",
    "strapi::poweredBy",
    "strapi::query",
    "strapi::body",
    "strapi::session",
    "strapi::favicon",
    "strapi::public",
];

const SELF_SOURCE: &str = "'self'";
const R2_STORAGE_SOURCE: &str = "https://*.r2.cloudflarestorage.com";
const R2_PUBLIC_SOURCE: &str = "https://*.r2.dev";
const MARKETPLACE_SOURCE: &str = "market-assets.strapi.io";

/// CSP directives set on top of the framework defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CspDirectives {
    /// `connect-src`
    #[serde(rename = "connect-src")]
    pub connect_src: Vec<String>,
    /// `img-src`
    #[serde(rename = "img-src")]
    pub img_src: Vec<String>,
    /// `media-src`
    #[serde(rename = "media-src")]
    pub media_src: Vec<String>,
    /// Serialized as `null`, which drops the directive
    #[serde(rename = "upgradeInsecureRequests")]
    pub upgrade_insecure_requests: Option<Vec<String>>,
}

impl CspDirectives {
    /// Directives admitting uploaded media from object storage.
    ///
    /// `public_origin` is the origin files are served from, when known.
    #[must_use]
    pub fn for_storage(public_origin: Option<&str>) -> Self {
        let media_sources: Vec<String> = [SELF_SOURCE, "data:", "blob:", MARKETPLACE_SOURCE]
            .into_iter()
            .chain(public_origin)
            .chain([R2_STORAGE_SOURCE, R2_PUBLIC_SOURCE])
            .map(str::to_string)
            .collect();

        Self {
            connect_src: vec![SELF_SOURCE.to_string(), "https:".to_string()],
            img_src: media_sources.clone(),
            media_src: media_sources,
            upgrade_insecure_requests: None,
        }
    }
}

/// Content security policy options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentSecurityPolicy {
    /// Start from the framework's default directives
    pub use_defaults: bool,
    /// Overridden directives
    pub directives: CspDirectives,
}

/// Security middleware options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityConfig {
    /// Content security policy
    pub content_security_policy: ContentSecurityPolicy,
}

/// Entry of the middleware stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Middleware {
    /// Framework middleware with default options
    Named(String),
    /// Middleware with explicit options
    Configured {
        /// Middleware name
        name: String,
        /// Options
        config: SecurityConfig,
    },
}

impl Middleware {
    /// Middleware name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Named(name) | Self::Configured { name, .. } => name,
        }
    }
}

/// Full middleware stack, with the security middleware configured for object storage.
#[must_use]
pub fn middleware_stack(public_origin: Option<&str>) -> Vec<Middleware> {
    MIDDLEWARE_ORDER
        .iter()
        .map(|&name| {
            if name == SECURITY {
                Middleware::Configured {
                    name: name.to_string(),
                    config: SecurityConfig {
                        content_security_policy: ContentSecurityPolicy {
                            use_defaults: true,
                            directives: CspDirectives::for_storage(public_origin),
                        },
                    },
                }
            } else {
                Middleware::Named(name.to_string())
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_stack_order() {
        let stack = middleware_stack(None);
        let names: Vec<_> = stack.iter().map(Middleware::name).collect();
        assert_eq!(names, MIDDLEWARE_ORDER);
        assert!(matches!(stack[2], Middleware::Configured { .. }));
        assert_eq!(
            serde_json::to_value(&stack[0]).unwrap(),
            json!("strapi::logger")
        );
    }

    #[test]
    fn test_csp_with_public_origin() {
        let directives = CspDirectives::for_storage(Some("https://pub-abc.r2.dev"));

        assert_eq!(directives.connect_src, ["'self'", "https:"]);
        assert_eq!(
            directives.img_src,
            [
                "'self'",
                "data:",
                "blob:",
                "market-assets.strapi.io",
                "https://pub-abc.r2.dev",
                "https://*.r2.cloudflarestorage.com",
                "https://*.r2.dev",
            ]
        );
        assert_eq!(directives.media_src, directives.img_src);
    }

    #[test]
    fn test_csp_without_public_origin() {
        let directives = CspDirectives::for_storage(None);
        assert_eq!(directives.img_src.len(), 6);
        assert!(!directives.img_src.iter().any(|s| s.contains("pub-")));
    }

    #[test]
    fn test_security_serialized_shape() {
        let stack = middleware_stack(Some("https://cdn.example.com"));
        let value = serde_json::to_value(&stack[2]).unwrap();

        assert_eq!(value["name"], "strapi::security");
        let csp = &value["config"]["contentSecurityPolicy"];
        assert_eq!(csp["useDefaults"], true);
        assert_eq!(csp["directives"]["upgradeInsecureRequests"], json!(null));
        assert_eq!(csp["directives"]["connect-src"], json!(["'self'", "https:"]));
        assert!(csp["directives"]
            .as_object()
            .unwrap()
            .contains_key("upgradeInsecureRequests"));
    }
}
