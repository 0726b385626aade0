//! Reusable components and the post dynamic zone.

use crate::models::Media;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// Discriminator field of dynamic-zone entries.
pub const COMPONENT_KEY: &str = "__component";

/// `generic.text-block`
pub const TEXT_BLOCK: &str = "generic.text-block";
/// `generic.image-block`
pub const IMAGE_BLOCK: &str = "generic.image-block";
/// `generic.image-link`
pub const IMAGE_LINK: &str = "generic.image-link";
/// `generic.gif-embed`
pub const GIF_EMBED: &str = "generic.gif-embed";
/// `generic.video-embed`
pub const VIDEO_EMBED: &str = "generic.video-embed";
/// `generic.adsense-block`
pub const ADSENSE_BLOCK: &str = "generic.adsense-block";
/// `generic.custom-ad-break`
pub const CUSTOM_AD_BREAK: &str = "generic.custom-ad-break";
/// `generic.hero-image`
pub const HERO_IMAGE: &str = "generic.hero-image";
/// `generic.seo`
pub const SEO: &str = "generic.seo";

/// SEO metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Seo {
    /// Component row id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// `<title>` override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_title: Option<String>,
    /// Meta description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_description: Option<String>,
    /// Open Graph image
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub og_image: Option<Media>,
}

/// Hero image with caption.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct HeroImage {
    /// Component row id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Image file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<Media>,
    /// Caption
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    /// Alternative text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
}

/// Rich-text block.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TextBlock {
    /// Component row id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Blocks document as returned by the API
    #[serde(default)]
    pub content: Value,
}

impl TextBlock {
    /// Concatenated text of the block, one line per top-level block.
    #[must_use]
    pub fn plain_text(&self) -> String {
        match &self.content {
            Value::String(text) => text.clone(),
            Value::Array(blocks) => blocks
                .iter()
                .map(|block| {
                    let mut line = String::new();
                    collect_text(block, &mut line);
                    line
                })
                .collect::<Vec<_>>()
                .join("\n"),
            other => {
                let mut text = String::new();
                collect_text(other, &mut text);
                text
            }
        }
    }
}

fn collect_text(node: &Value, out: &mut String) {
    match node {
        Value::Array(children) => children.iter().for_each(|child| collect_text(child, out)),
        Value::Object(map) => {
            if let Some(Value::String(text)) = map.get("text") {
                out.push_str(text);
            }
            if let Some(children) = map.get("children") {
                collect_text(children, out);
            }
        }
        _ => {}
    }
}

/// Inline image.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ImageBlock {
    /// Component row id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Image file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<Media>,
    /// Caption
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    /// Alternative text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
}

/// Image wrapped in a link.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ImageLink {
    /// Component row id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Image file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<Media>,
    /// Link target
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Caption
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    /// Alternative text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    /// Open the link in a new tab
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_in_new_tab: Option<bool>,
}

/// Externally hosted GIF.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GifEmbed {
    /// Component row id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// GIF URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Alternative text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
}

/// Externally hosted video.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct VideoEmbed {
    /// Component row id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Video URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Caption
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

/// AdSense slot placement.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AdsenseBlock {
    /// Component row id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Ad slot identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot_id: Option<String>,
    /// Ad format
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Label shown above the ad
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Responsive sizing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub responsive: Option<bool>,
    /// Only render on desktop layouts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desktop_only: Option<bool>,
}

/// Site-defined ad break.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CustomAdBreak {
    /// Component row id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Ad break kind
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

/// One entry of a dynamic zone, keyed on `__component`.
///
/// Entries with a discriminator this crate does not know decode to
/// [`DynamicZoneComponent::Unrecognized`] with their fields preserved, so newly added
/// component kinds on the server never break decoding of the whole post.
#[derive(Debug, Clone, PartialEq)]
pub enum DynamicZoneComponent {
    /// `generic.text-block`
    TextBlock(TextBlock),
    /// `generic.image-block`
    ImageBlock(ImageBlock),
    /// `generic.image-link`
    ImageLink(ImageLink),
    /// `generic.gif-embed`
    GifEmbed(GifEmbed),
    /// `generic.video-embed`
    VideoEmbed(VideoEmbed),
    /// `generic.adsense-block`
    AdsenseBlock(AdsenseBlock),
    /// `generic.custom-ad-break`
    CustomAdBreak(CustomAdBreak),
    /// `generic.hero-image`
    HeroImage(HeroImage),
    /// `generic.seo`
    Seo(Seo),
    /// Any other discriminator
    Unrecognized {
        /// Discriminator as sent by the server
        component: String,
        /// Remaining fields
        fields: Map<String, Value>,
    },
}

impl DynamicZoneComponent {
    /// The `__component` discriminator.
    #[must_use]
    pub fn component(&self) -> &str {
        match self {
            Self::TextBlock(_) => TEXT_BLOCK,
            Self::ImageBlock(_) => IMAGE_BLOCK,
            Self::ImageLink(_) => IMAGE_LINK,
            Self::GifEmbed(_) => GIF_EMBED,
            Self::VideoEmbed(_) => VIDEO_EMBED,
            Self::AdsenseBlock(_) => ADSENSE_BLOCK,
            Self::CustomAdBreak(_) => CUSTOM_AD_BREAK,
            Self::HeroImage(_) => HERO_IMAGE,
            Self::Seo(_) => SEO,
            Self::Unrecognized { component, .. } => component,
        }
    }

    /// Returns true if the entry carries the given discriminator.
    #[must_use]
    pub fn is_component(&self, component: &str) -> bool {
        self.component() == component
    }

    /// Returns true for discriminators this crate does not model.
    #[must_use]
    pub const fn is_unrecognized(&self) -> bool {
        matches!(self, Self::Unrecognized { .. })
    }

    /// Media referenced by the entry, if any.
    #[must_use]
    pub fn media(&self) -> Option<&Media> {
        match self {
            Self::ImageBlock(block) => block.image.as_ref(),
            Self::ImageLink(link) => link.image.as_ref(),
            Self::HeroImage(hero) => hero.image.as_ref(),
            Self::Seo(seo) => seo.og_image.as_ref(),
            _ => None,
        }
    }

    fn from_map(mut map: Map<String, Value>) -> Result<Self, serde_json::Error> {
        let component = match map.remove(COMPONENT_KEY) {
            Some(Value::String(component)) => component,
            Some(other) => {
                return Err(serde::de::Error::custom(format!(
                    "`{COMPONENT_KEY}` must be a string, got {other}"
                )))
            }
            None => return Err(serde::de::Error::missing_field(COMPONENT_KEY)),
        };

        let component = match component.as_str() {
            TEXT_BLOCK => Self::TextBlock(decode(map)?),
            IMAGE_BLOCK => Self::ImageBlock(decode(map)?),
            IMAGE_LINK => Self::ImageLink(decode(map)?),
            GIF_EMBED => Self::GifEmbed(decode(map)?),
            VIDEO_EMBED => Self::VideoEmbed(decode(map)?),
            ADSENSE_BLOCK => Self::AdsenseBlock(decode(map)?),
            CUSTOM_AD_BREAK => Self::CustomAdBreak(decode(map)?),
            HERO_IMAGE => Self::HeroImage(decode(map)?),
            SEO => Self::Seo(decode(map)?),
            _ => Self::Unrecognized {
                component,
                fields: map,
            },
        };
        Ok(component)
    }

    fn fields(&self) -> Result<Value, serde_json::Error> {
        match self {
            Self::TextBlock(inner) => serde_json::to_value(inner),
            Self::ImageBlock(inner) => serde_json::to_value(inner),
            Self::ImageLink(inner) => serde_json::to_value(inner),
            Self::GifEmbed(inner) => serde_json::to_value(inner),
            Self::VideoEmbed(inner) => serde_json::to_value(inner),
            Self::AdsenseBlock(inner) => serde_json::to_value(inner),
            Self::CustomAdBreak(inner) => serde_json::to_value(inner),
            Self::HeroImage(inner) => serde_json::to_value(inner),
            Self::Seo(inner) => serde_json::to_value(inner),
            Self::Unrecognized { fields, .. } => Ok(Value::Object(fields.clone())),
        }
    }
}

fn decode<T>(map: Map<String, Value>) -> Result<T, serde_json::Error>
where
    T: DeserializeOwned,
{
    T::deserialize(Value::Object(map))
}

impl<'de> Deserialize<'de> for DynamicZoneComponent {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let map = Map::<String, Value>::deserialize(deserializer)?;
        Self::from_map(map).map_err(serde::de::Error::custom)
    }
}

impl Serialize for DynamicZoneComponent {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut out = Map::new();
        out.insert(
            COMPONENT_KEY.to_string(),
            Value::String(self.component().to_string()),
        );
        if let Value::Object(fields) = self.fields().map_err(serde::ser::Error::custom)? {
            out.extend(fields);
        }
        out.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_known_component() {
        let entry: DynamicZoneComponent = serde_json::from_value(json!({
            "__component": "generic.adsense-block",
            "id": 7,
            "slotId": "123456",
            "responsive": true,
            "desktopOnly": false
        }))
        .unwrap();

        match &entry {
            DynamicZoneComponent::AdsenseBlock(block) => {
                assert_eq!(block.slot_id.as_deref(), Some("123456"));
                assert_eq!(block.desktop_only, Some(false));
            }
            other => panic!("unexpected variant: {other:?}"),
        }
        assert!(entry.is_component(ADSENSE_BLOCK));
        assert!(!entry.is_unrecognized());
    }

    #[test]
    fn test_unrecognized_component_is_preserved() {
        let raw = json!({
            "__component": "generic.quiz",
            "id": 2,
            "question": "Why?"
        });
        let entry: DynamicZoneComponent = serde_json::from_value(raw.clone()).unwrap();

        assert!(entry.is_unrecognized());
        assert_eq!(entry.component(), "generic.quiz");
        assert_eq!(serde_json::to_value(&entry).unwrap(), raw);
    }

    #[test]
    fn test_missing_discriminator() {
        let err = serde_json::from_value::<DynamicZoneComponent>(json!({ "id": 1 })).unwrap_err();
        assert!(err.to_string().contains(COMPONENT_KEY));
    }

    #[test]
    fn test_custom_ad_break_type_field() {
        let entry: DynamicZoneComponent = serde_json::from_value(json!({
            "__component": "generic.custom-ad-break",
            "type": "newsletter"
        }))
        .unwrap();

        let DynamicZoneComponent::CustomAdBreak(ad) = &entry else {
            panic!("unexpected variant: {entry:?}");
        };
        assert_eq!(ad.kind.as_deref(), Some("newsletter"));
        assert_eq!(
            serde_json::to_value(&entry).unwrap(),
            json!({ "__component": "generic.custom-ad-break", "type": "newsletter" })
        );
    }

    #[test]
    fn test_text_block_plain_text() {
        let block = TextBlock {
            id: None,
            content: json!([
                { "type": "paragraph", "children": [
                    { "type": "text", "text": "Hello " },
                    { "type": "text", "text": "world", "bold": true }
                ]},
                { "type": "paragraph", "children": [{ "type": "text", "text": "Bye" }] }
            ]),
        };
        assert_eq!(block.plain_text(), "Hello world\nBye");
    }

    #[test]
    fn test_component_media() {
        let entry: DynamicZoneComponent = serde_json::from_value(json!({
            "__component": "generic.image-block",
            "image": { "id": 5, "url": "/uploads/a.png" }
        }))
        .unwrap();
        assert_eq!(entry.media().map(|m| m.id), Some(5));
    }
}
