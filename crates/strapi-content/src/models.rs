//! Response envelopes, entities, relations, media and content-type attributes.
//!
//! Entities decode from both API shapes: the nested form
//! (`{"id": 1, "attributes": {...}}`) and the flattened form
//! (`{"id": 1, "documentId": "...", "title": ...}`). Relation fields accept `null`,
//! a single entity, a list of entities, or the `{"data": ...}` wrapper of the nested form.

use crate::components::{DynamicZoneComponent, HeroImage, Seo};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use strapi_core::Error;
use url::Url;

/// Top-level response envelope: `{ data, meta? }`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Response<T> {
    /// Entity or list of entities
    pub data: T,
    /// Response metadata
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
}

impl<T> Response<T> {
    /// Pagination metadata, when the response carries it.
    #[must_use]
    pub fn pagination(&self) -> Option<&PaginationMeta> {
        self.meta.as_ref().and_then(|meta| meta.pagination.as_ref())
    }
}

/// Response metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Meta {
    /// Pagination state of a collection response
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination: Option<PaginationMeta>,
}

/// Pagination metadata in either page or offset form.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    /// Current page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    /// Entries per page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    /// Number of pages
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_count: Option<u32>,
    /// Offset of the first entry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<u32>,
    /// Maximum number of entries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    /// Total number of matching entries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
}

impl PaginationMeta {
    /// Returns true if a later page exists.
    #[must_use]
    pub fn has_next_page(&self) -> bool {
        match (self.page, self.page_count, self.start, self.limit, self.total) {
            (Some(page), Some(count), ..) => page < count,
            (_, _, Some(start), Some(limit), Some(total)) => u64::from(start) + u64::from(limit) < total,
            _ => false,
        }
    }
}

/// A content entry with its identifiers and attribute set.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity<A> {
    /// Numeric row id
    pub id: i64,
    /// Stable document identifier (absent in the nested API shape)
    pub document_id: Option<String>,
    /// Attribute set
    pub attributes: A,
    /// Entry-level metadata
    pub meta: Option<Value>,
}

impl<A> Entity<A>
where
    A: DeserializeOwned,
{
    fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        match value {
            Value::Object(map) => Self::from_map(map),
            other => Err(serde::de::Error::custom(format!(
                "expected an entity object, got {other}"
            ))),
        }
    }

    fn from_map(mut map: Map<String, Value>) -> Result<Self, serde_json::Error> {
        let id = match map.remove("id") {
            Some(value) => i64::deserialize(value)?,
            None => return Err(serde::de::Error::missing_field("id")),
        };
        let document_id = map
            .remove("documentId")
            .map(Option::<String>::deserialize)
            .transpose()?
            .flatten();
        let meta = map.remove("meta").filter(|value| !value.is_null());

        let attributes = match map.remove("attributes") {
            Some(Value::Object(nested)) => Value::Object(nested),
            Some(other) => {
                map.insert("attributes".to_string(), other);
                Value::Object(map)
            }
            None => Value::Object(map),
        };

        Ok(Self {
            id,
            document_id,
            attributes: A::deserialize(attributes)?,
            meta,
        })
    }
}

impl<'de, A> Deserialize<'de> for Entity<A>
where
    A: DeserializeOwned,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let map = Map::<String, Value>::deserialize(deserializer)?;
        Self::from_map(map).map_err(serde::de::Error::custom)
    }
}

/// Serializes in the flattened shape.
impl<A> Serialize for Entity<A>
where
    A: Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut out = Map::new();
        out.insert("id".to_string(), Value::from(self.id));
        if let Some(document_id) = &self.document_id {
            out.insert("documentId".to_string(), Value::from(document_id.as_str()));
        }
        match serde_json::to_value(&self.attributes).map_err(serde::ser::Error::custom)? {
            Value::Object(attributes) => out.extend(attributes),
            other => {
                out.insert("attributes".to_string(), other);
            }
        }
        if let Some(meta) = &self.meta {
            out.insert("meta".to_string(), meta.clone());
        }
        out.serialize(serializer)
    }
}

/// A relation field as returned by the API.
#[derive(Debug, Clone, PartialEq)]
pub enum Relation<A> {
    /// The field was not part of the response (not populated)
    NotPopulated,
    /// The relation is populated but empty
    Null,
    /// To-one relation
    One(Box<Entity<A>>),
    /// To-many relation
    Many(Vec<Entity<A>>),
}

impl<A> Default for Relation<A> {
    fn default() -> Self {
        Self::NotPopulated
    }
}

impl<A> Relation<A> {
    /// Returns true if the relation holds at least the populated shape of an entity.
    #[must_use]
    pub const fn is_populated(&self) -> bool {
        matches!(self, Self::One(_) | Self::Many(_))
    }

    /// Returns true if the field was absent from the response.
    #[must_use]
    pub const fn is_not_populated(&self) -> bool {
        matches!(self, Self::NotPopulated)
    }

    /// The related entity of a to-one relation.
    #[must_use]
    pub fn one(&self) -> Option<&Entity<A>> {
        match self {
            Self::One(entity) => Some(entity),
            _ => None,
        }
    }

    /// All related entities; a to-one relation yields a single element.
    #[must_use]
    pub fn many(&self) -> &[Entity<A>] {
        match self {
            Self::One(entity) => std::slice::from_ref(entity),
            Self::Many(entities) => entities,
            Self::NotPopulated | Self::Null => &[],
        }
    }
}

impl<A> Relation<A>
where
    A: DeserializeOwned,
{
    fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        match value {
            Value::Null => Ok(Self::Null),
            Value::Array(items) => items
                .into_iter()
                .map(Entity::from_value)
                .collect::<Result<Vec<_>, _>>()
                .map(Self::Many),
            Value::Object(mut map) => {
                if !map.contains_key("id") {
                    if let Some(inner) = map.remove("data") {
                        return Self::from_value(inner);
                    }
                }
                Entity::from_map(map).map(|entity| Self::One(Box::new(entity)))
            }
            other => Err(serde::de::Error::custom(format!(
                "expected a relation, got {other}"
            ))),
        }
    }
}

impl<'de, A> Deserialize<'de> for Relation<A>
where
    A: DeserializeOwned,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Self::from_value(Value::deserialize(deserializer)?).map_err(serde::de::Error::custom)
    }
}

impl<A> Serialize for Relation<A>
where
    A: Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::NotPopulated | Self::Null => serializer.serialize_none(),
            Self::One(entity) => entity.serialize(serializer),
            Self::Many(entities) => entities.serialize(serializer),
        }
    }
}

/// Uploaded file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Media {
    /// Numeric id
    pub id: i64,
    /// Document identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
    /// Original file name
    #[serde(default)]
    pub name: String,
    /// Alternative text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternative_text: Option<String>,
    /// Caption
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    /// Pixel width
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    /// Pixel height
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    /// Responsive variants
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formats: Option<MediaFormats>,
    /// Storage hash
    #[serde(default)]
    pub hash: String,
    /// File extension including the dot
    #[serde(default)]
    pub ext: String,
    /// MIME type
    #[serde(default)]
    pub mime: String,
    /// Size in kilobytes
    #[serde(default)]
    pub size: f64,
    /// Public URL, absolute for object storage or root-relative for local uploads
    pub url: String,
    /// Preview URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_url: Option<String>,
    /// Upload provider name
    #[serde(default)]
    pub provider: String,
    /// Provider-specific metadata
    #[serde(rename = "provider_metadata", default, skip_serializing_if = "Option::is_none")]
    pub provider_metadata: Option<Value>,
    /// Creation timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Update timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Media {
    /// Resolve the media URL against the CMS origin.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidEndpoint`] if the URL cannot be resolved.
    pub fn absolute_url(&self, origin: &Url) -> Result<Url, Error> {
        origin.join(&self.url).map_err(Error::from)
    }

    /// Largest available variant, falling back to the original file.
    #[must_use]
    pub fn best_url(&self) -> &str {
        self.formats
            .as_ref()
            .and_then(MediaFormats::largest)
            .map_or(self.url.as_str(), |format| format.url.as_str())
    }
}

/// Returns true when a media field is populated.
#[must_use]
pub fn has_media(media: Option<&Media>) -> bool {
    media.is_some()
}

/// Responsive variants generated for images.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MediaFormats {
    /// Thumbnail variant
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<MediaFormat>,
    /// Small variant
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub small: Option<MediaFormat>,
    /// Medium variant
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medium: Option<MediaFormat>,
    /// Large variant
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub large: Option<MediaFormat>,
}

impl MediaFormats {
    /// Largest variant present.
    #[must_use]
    pub fn largest(&self) -> Option<&MediaFormat> {
        self.large
            .as_ref()
            .or(self.medium.as_ref())
            .or(self.small.as_ref())
            .or(self.thumbnail.as_ref())
    }
}

/// One responsive variant of an image.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MediaFormat {
    /// File name
    pub name: String,
    /// Storage hash
    pub hash: String,
    /// File extension
    pub ext: String,
    /// MIME type
    pub mime: String,
    /// Pixel width
    pub width: u32,
    /// Pixel height
    pub height: u32,
    /// Size in kilobytes
    pub size: f64,
    /// Storage path
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Public URL
    pub url: String,
}

/// Author attributes.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AuthorAttributes {
    /// Display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Short biography
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_bio: Option<String>,
    /// URL slug
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    /// Avatar image
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<Media>,
    /// Import source marker
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Creation timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Update timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Publication timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
    /// Posts written by the author
    #[serde(default, skip_serializing_if = "Relation::is_not_populated")]
    pub posts: Relation<PostAttributes>,
}

/// Category attributes.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CategoryAttributes {
    /// Display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// URL slug
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    /// Ordering weight
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<i64>,
    /// Short description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_short: Option<String>,
    /// Long description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_long: Option<String>,
    /// Import source marker
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// SEO component
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seo: Option<Seo>,
    /// Hero image component
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hero_image: Option<HeroImage>,
    /// Creation timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Update timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Publication timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
    /// Posts in this category
    #[serde(default, skip_serializing_if = "Relation::is_not_populated")]
    pub posts: Relation<PostAttributes>,
    /// Parent category
    #[serde(default, skip_serializing_if = "Relation::is_not_populated")]
    pub category: Relation<CategoryAttributes>,
    /// Child categories
    #[serde(default, skip_serializing_if = "Relation::is_not_populated")]
    pub categories: Relation<CategoryAttributes>,
}

/// Post attributes.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PostAttributes {
    /// Title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// URL slug
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    /// Teaser text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    /// Editorial publication date (date or date-time string)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_published: Option<String>,
    /// Editorial modification date (date or date-time string)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_modified: Option<String>,
    /// Description used by showcase listings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub showcase_description: Option<String>,
    /// Import source marker
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// SEO component
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seo: Option<Seo>,
    /// Hero image component
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hero_image: Option<HeroImage>,
    /// Body made of dynamic-zone components
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_area: Option<Vec<DynamicZoneComponent>>,
    /// Author relation
    #[serde(default, skip_serializing_if = "Relation::is_not_populated")]
    pub author: Relation<AuthorAttributes>,
    /// Category relation
    #[serde(default, skip_serializing_if = "Relation::is_not_populated")]
    pub category: Relation<CategoryAttributes>,
    /// Creation timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Update timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Publication timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
}

/// Author entity.
pub type AuthorEntity = Entity<AuthorAttributes>;
/// Category entity.
pub type CategoryEntity = Entity<CategoryAttributes>;
/// Post entity.
pub type PostEntity = Entity<PostAttributes>;

/// Single author response.
pub type AuthorResponse = Response<AuthorEntity>;
/// Author collection response.
pub type AuthorsResponse = Response<Vec<AuthorEntity>>;
/// Single category response.
pub type CategoryResponse = Response<CategoryEntity>;
/// Category collection response.
pub type CategoriesResponse = Response<Vec<CategoryEntity>>;
/// Single post response.
pub type PostResponse = Response<PostEntity>;
/// Post collection response.
pub type PostsResponse = Response<Vec<PostEntity>>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn entity_from_flattened_shape() {
        let post: PostEntity = serde_json::from_value(json!({
            "id": 3,
            "documentId": "k2x9",
            "title": "Hello",
            "slug": "hello",
            "author": null
        }))
        .unwrap();

        assert_eq!(post.id, 3);
        assert_eq!(post.document_id.as_deref(), Some("k2x9"));
        assert_eq!(post.attributes.title.as_deref(), Some("Hello"));
        assert_eq!(post.attributes.author, Relation::Null);
        assert!(post.attributes.category.is_not_populated());
    }

    #[test]
    fn entity_from_nested_shape() {
        let post: PostEntity = serde_json::from_value(json!({
            "id": 4,
            "attributes": {
                "title": "Nested",
                "author": { "data": { "id": 9, "attributes": { "name": "Ada" } } },
                "category": { "data": null }
            }
        }))
        .unwrap();

        assert_eq!(post.document_id, None);
        let author = post.attributes.author.one().unwrap();
        assert_eq!(author.id, 9);
        assert_eq!(author.attributes.name.as_deref(), Some("Ada"));
        assert_eq!(post.attributes.category, Relation::Null);
    }

    #[test]
    fn entity_requires_id() {
        let err = serde_json::from_value::<PostEntity>(json!({ "title": "x" })).unwrap_err();
        assert!(err.to_string().contains("id"));
    }

    #[test]
    fn to_many_relation() {
        let author: AuthorEntity = serde_json::from_value(json!({
            "id": 1,
            "documentId": "a1",
            "posts": [
                { "id": 10, "documentId": "p10", "title": "One" },
                { "id": 11, "documentId": "p11", "title": "Two" }
            ]
        }))
        .unwrap();

        let posts = author.attributes.posts.many();
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[1].attributes.title.as_deref(), Some("Two"));
        assert!(author.attributes.posts.is_populated());
    }

    #[test]
    fn entity_serializes_flattened() {
        let post: PostEntity = serde_json::from_value(json!({
            "id": 4,
            "attributes": { "title": "Nested" }
        }))
        .unwrap();

        let value = serde_json::to_value(&post).unwrap();
        assert_eq!(value, json!({ "id": 4, "title": "Nested" }));
    }

    #[test]
    fn media_urls() {
        let media: Media = serde_json::from_value(json!({
            "id": 1,
            "name": "cover.jpg",
            "url": "/uploads/cover.jpg",
            "formats": {
                "small": {
                    "name": "small_cover.jpg", "hash": "small_cover", "ext": ".jpg",
                    "mime": "image/jpeg", "width": 500, "height": 300, "size": 20.5,
                    "url": "/uploads/small_cover.jpg"
                }
            }
        }))
        .unwrap();

        let origin = Url::parse("https://cms.example.com").unwrap();
        assert_eq!(
            media.absolute_url(&origin).unwrap().as_str(),
            "https://cms.example.com/uploads/cover.jpg"
        );
        assert_eq!(media.best_url(), "/uploads/small_cover.jpg");
        assert!(has_media(Some(&media)));
        assert!(!has_media(None));
    }

    #[test]
    fn pagination_meta() {
        let response: PostsResponse = serde_json::from_value(json!({
            "data": [],
            "meta": { "pagination": { "page": 1, "pageSize": 25, "pageCount": 3, "total": 60 } }
        }))
        .unwrap();

        let pagination = response.pagination().unwrap();
        assert_eq!(pagination.page_size, Some(25));
        assert!(pagination.has_next_page());

        let offset = PaginationMeta {
            start: Some(50),
            limit: Some(25),
            total: Some(60),
            ..PaginationMeta::default()
        };
        assert!(!offset.has_next_page());
    }
}
