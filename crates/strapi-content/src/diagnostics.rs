//! Deep-populate diagnostic.
//!
//! Fetches one post with `populate=*` and one without, then compares which relation
//! fields come back populated. The deep-populate plugin is considered active when the
//! populated response carries more fields and at least one relation.

use crate::client::ContentApi;
use crate::Result;
use serde::Serialize;
use serde_json::{Map, Value};
use strapi_core::{ContentType, Pagination, Populate, StrapiQuery};
use tracing::{debug, info, warn};

/// Relation and component fields expected to appear once population works.
pub const DEEP_POPULATE_FIELDS: [&str; 5] = ["category", "author", "seo", "heroImage", "contentArea"];

/// Fields of the post's category that show population reached a second level.
pub const NESTED_CATEGORY_FIELDS: [&str; 4] = ["seo", "heroImage", "category", "categories"];

/// How a field appears in an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldPresence {
    /// Key absent
    Missing,
    /// Key present with `null`
    Null,
    /// Key present with a value
    Populated,
}

impl FieldPresence {
    fn of(fields: &Map<String, Value>, name: &str) -> Self {
        match fields.get(name) {
            None => Self::Missing,
            Some(Value::Null) => Self::Null,
            Some(_) => Self::Populated,
        }
    }
}

/// Outcome of [`check_deep_populate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PopulateReport {
    /// Number of top-level fields with `populate=*`
    pub field_count_with: usize,
    /// Number of top-level fields without populate
    pub field_count_without: usize,
    /// Presence of each [`DEEP_POPULATE_FIELDS`] entry with `populate=*`
    pub with_populate: Vec<(String, FieldPresence)>,
    /// Presence of each [`DEEP_POPULATE_FIELDS`] entry without populate
    pub without_populate: Vec<(String, FieldPresence)>,
    /// Whether the populated category carries any [`NESTED_CATEGORY_FIELDS`] entry
    pub nested_category_relations: bool,
}

impl PopulateReport {
    fn new(with: &Map<String, Value>, without: &Map<String, Value>) -> Self {
        let presence = |fields: &Map<String, Value>| -> Vec<(String, FieldPresence)> {
            DEEP_POPULATE_FIELDS
                .iter()
                .map(|name| ((*name).to_string(), FieldPresence::of(fields, name)))
                .collect()
        };
        let nested_category_relations = with
            .get("category")
            .and_then(Value::as_object)
            .map(|category| {
                category
                    .get("data")
                    .and_then(Value::as_object)
                    .unwrap_or(category)
            })
            .map(attributes_of)
            .is_some_and(|category| {
                NESTED_CATEGORY_FIELDS
                    .iter()
                    .any(|name| FieldPresence::of(category, name) == FieldPresence::Populated)
            });

        Self {
            field_count_with: with.len(),
            field_count_without: without.len(),
            with_populate: presence(with),
            without_populate: presence(without),
            nested_category_relations,
        }
    }

    /// Relation fields populated with `populate=*`.
    #[must_use]
    pub fn populated_fields(&self) -> Vec<&str> {
        self.with_populate
            .iter()
            .filter(|(_, presence)| *presence == FieldPresence::Populated)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// True when `populate=*` adds fields and at least one relation is populated.
    #[must_use]
    pub fn deep_populate_working(&self) -> bool {
        self.field_count_with > self.field_count_without && !self.populated_fields().is_empty()
    }
}

/// Compare a post fetched with and without `populate=*`.
///
/// Returns `Ok(None)` when the post collection is empty.
///
/// # Errors
///
/// Propagates request failures from either fetch.
pub async fn check_deep_populate(api: &dyn ContentApi) -> Result<Option<PopulateReport>> {
    let without = StrapiQuery::new().pagination(Pagination::page_size(1));
    let with = without.clone().populate(Populate::Wildcard);

    let populated = api.fetch_raw(ContentType::Post, &with).await?;
    let plain = api.fetch_raw(ContentType::Post, &without).await?;

    let (Some(populated), Some(plain)) = (first_entity(&populated.data), first_entity(&plain.data))
    else {
        warn!("No posts available for the deep populate check");
        return Ok(None);
    };

    let report = PopulateReport::new(populated, plain);
    debug!(
        with = report.field_count_with,
        without = report.field_count_without,
        "Compared post field counts"
    );
    if report.deep_populate_working() {
        info!(fields = ?report.populated_fields(), "Deep populate is working");
    } else {
        warn!("Deep populate did not populate any relation");
    }
    Ok(Some(report))
}

fn first_entity(data: &[Value]) -> Option<&Map<String, Value>> {
    data.first().and_then(Value::as_object).map(attributes_of)
}

// Nested entities keep their fields under `attributes`.
fn attributes_of(entity: &Map<String, Value>) -> &Map<String, Value> {
    entity
        .get("attributes")
        .and_then(Value::as_object)
        .unwrap_or(entity)
}
