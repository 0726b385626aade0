//! Populate presets per content type.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;
use strapi_core::{ContentType, Error, Populate, Result};

/// Named populate preset.
///
/// Serialized as its display form (`all`, `minimal`, `deep`, `deep,<depth>`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum PopulatePreset {
    /// Every relation, component and media field the frontend renders
    #[default]
    All,
    /// Only the relations needed for listings
    Minimal,
    /// Recursive population through the deep-populate plugin
    Deep(Option<u32>),
}

impl PopulatePreset {
    /// Populate value for the given content type.
    #[must_use]
    pub fn for_type(self, content_type: ContentType) -> Populate {
        match (self, content_type) {
            (Self::Deep(depth), _) => Populate::deep(depth),
            (Self::All, ContentType::Post) => posts_all(),
            (Self::Minimal, ContentType::Post) => Populate::list(["author", "category"]),
            (Self::All, ContentType::Author) => Populate::list(["avatar", "posts"]),
            (Self::Minimal, ContentType::Author) => Populate::list(["avatar"]),
            (Self::All, ContentType::Category) => categories_all(),
            (Self::Minimal, ContentType::Category) => Populate::list(["seo", "heroImage"]),
        }
    }
}

impl FromStr for PopulatePreset {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "all" => Ok(Self::All),
            "minimal" => Ok(Self::Minimal),
            "deep" => Ok(Self::Deep(None)),
            _ => s
                .strip_prefix("deep,")
                .and_then(|depth| depth.parse().ok())
                .map(|depth| Self::Deep(Some(depth)))
                .ok_or_else(|| Error::InvalidRequest(format!("Unknown populate preset: {s}"))),
        }
    }
}

impl fmt::Display for PopulatePreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Minimal => f.write_str("minimal"),
            Self::Deep(None) => f.write_str("deep"),
            Self::Deep(Some(depth)) => write!(f, "deep,{depth}"),
        }
    }
}

impl Serialize for PopulatePreset {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PopulatePreset {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer)?
            .parse()
            .map_err(serde::de::Error::custom)
    }
}

/// Preset populate value for a content type.
#[must_use]
pub fn preset(content_type: ContentType, preset: PopulatePreset) -> Populate {
    preset.for_type(content_type)
}

fn posts_all() -> Populate {
    tree(json!({
        "author": { "populate": ["avatar"] },
        "category": { "populate": ["seo", "heroImage"] },
        "seo": { "populate": ["ogImage"] },
        "heroImage": { "populate": ["image"] },
        "contentArea": {
            "populate": {
                "on": {
                    "generic.image-block": { "populate": ["image"] },
                    "generic.image-link": { "populate": ["image"] },
                    "generic.hero-image": { "populate": ["image"] },
                    "generic.seo": { "populate": ["ogImage"] }
                }
            }
        }
    }))
}

fn categories_all() -> Populate {
    tree(json!({
        "seo": { "populate": ["ogImage"] },
        "heroImage": { "populate": ["image"] },
        "category": true,
        "categories": true
    }))
}

// Non-object literals never reach here; fall back to the wildcard all the same.
fn tree(value: Value) -> Populate {
    match value {
        Value::Object(map) => Populate::Nested(map),
        _ => Populate::Wildcard,
    }
}
