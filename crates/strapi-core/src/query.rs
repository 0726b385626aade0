//! Query model and URL builder for the content REST API.
//!
//! [`StrapiQuery`] describes what to fetch (populate, fields, filters, sort, pagination,
//! publication state, locale). [`UrlBuilder`] resolves an endpoint against the configured
//! origin and API prefix and encodes the query with the CMS bracket conventions:
//!
//! | input | parameters |
//! |---|---|
//! | `Populate::Wildcard` | `populate=*` |
//! | `Populate::Single(s)` | `populate=s` |
//! | `Populate::List(v)` | `populate[]=v0&populate[]=v1...` |
//! | `Populate::Nested(m)` | `populate=<json>` |
//! | `fields` | `fields[]=...` |
//! | `filters` | `filters[key]=<json>` |
//! | `Sort::Single` / `Sort::List` | `sort=...` / `sort[]=...` |
//! | `Pagination` | `pagination[page]`, `pagination[pageSize]`, `pagination[start]`, `pagination[limit]` |
//!
//! Parameters are emitted in exactly that order and, within a field, in insertion order.

use crate::config::StrapiConfig;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use url::{form_urlencoded, Url};

/// Builder for assembling ordered query parameter pairs.
#[derive(Debug, Default, Clone)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    /// Create a new, empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self { pairs: Vec::new() }
    }

    /// Append a required key/value pair.
    pub fn push(&mut self, key: impl Into<String>, value: impl fmt::Display) {
        self.pairs.push((key.into(), value.to_string()));
    }

    /// Append a key/value pair when the value is present.
    pub fn push_opt<T>(&mut self, key: impl Into<String>, value: Option<T>)
    where
        T: fmt::Display,
    {
        if let Some(value) = value {
            self.push(key, value);
        }
    }

    /// Append one pair per item, all under the same key.
    pub fn push_each<I, T>(&mut self, key: &str, values: I)
    where
        I: IntoIterator<Item = T>,
        T: fmt::Display,
    {
        for value in values {
            self.push(key, value);
        }
    }

    /// Append a JSON-serialized value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Encoding`] if the value cannot be serialized.
    pub fn push_json<T>(&mut self, key: impl Into<String>, value: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        let encoded =
            serde_json::to_string(value).map_err(|err| Error::Encoding(err.to_string()))?;
        self.pairs.push((key.into(), encoded));
        Ok(())
    }

    /// Return the collected key/value pairs.
    #[must_use]
    pub fn into_pairs(self) -> Vec<(String, String)> {
        self.pairs
    }

    /// Returns true if no parameters have been added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Which relations, components and media to expand.
#[derive(Debug, Clone, PartialEq)]
pub enum Populate {
    /// `populate=*`: every first-level relation (recursive with the deep-populate plugin)
    Wildcard,
    /// A single populate string passed through verbatim
    Single(String),
    /// A list of relation names
    List(Vec<String>),
    /// A nested populate tree, sent as one JSON-encoded parameter
    Nested(Map<String, Value>),
}

impl Populate {
    /// Populate a list of relations.
    pub fn list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::List(items.into_iter().map(Into::into).collect())
    }

    /// Deep-populate plugin preset (`deep` or `deep,<depth>`).
    #[must_use]
    pub fn deep(depth: Option<u32>) -> Self {
        match depth {
            Some(depth) => Self::Single(format!("deep,{depth}")),
            None => Self::Single("deep".to_string()),
        }
    }

    /// Build a nested populate tree from any serializable value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Encoding`] if the value does not serialize to a JSON object.
    pub fn nested<T>(value: &T) -> Result<Self>
    where
        T: Serialize + ?Sized,
    {
        match serde_json::to_value(value).map_err(|err| Error::Encoding(err.to_string()))? {
            Value::Object(map) => Ok(Self::Nested(map)),
            other => Err(Error::Encoding(format!(
                "nested populate must be an object, got {other}"
            ))),
        }
    }

    fn encode(&self, params: &mut QueryParams) -> Result<()> {
        match self {
            Self::Wildcard => params.push("populate", "*"),
            Self::Single(value) => params.push("populate", value),
            Self::List(items) => params.push_each("populate[]", items),
            Self::Nested(map) => params.push_json("populate", map)?,
        }
        Ok(())
    }
}

impl From<&str> for Populate {
    /// `*` becomes [`Populate::Wildcard`] and JSON object text becomes [`Populate::Nested`].
    fn from(value: &str) -> Self {
        if value == "*" {
            return Self::Wildcard;
        }
        if value.starts_with('{') {
            if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(value) {
                return Self::Nested(map);
            }
        }
        Self::Single(value.to_string())
    }
}

impl From<String> for Populate {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<Vec<&str>> for Populate {
    fn from(value: Vec<&str>) -> Self {
        Self::list(value)
    }
}

impl From<Vec<String>> for Populate {
    fn from(value: Vec<String>) -> Self {
        Self::List(value)
    }
}

impl From<Map<String, Value>> for Populate {
    fn from(value: Map<String, Value>) -> Self {
        Self::Nested(value)
    }
}

/// Sort order, e.g. `title:asc`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sort {
    /// A single `sort=` parameter
    Single(String),
    /// Repeated `sort[]=` parameters
    List(Vec<String>),
}

impl From<&str> for Sort {
    fn from(value: &str) -> Self {
        Self::Single(value.to_string())
    }
}

impl From<String> for Sort {
    fn from(value: String) -> Self {
        Self::Single(value)
    }
}

impl From<Vec<&str>> for Sort {
    fn from(value: Vec<&str>) -> Self {
        Self::List(value.into_iter().map(str::to_string).collect())
    }
}

impl From<Vec<String>> for Sort {
    fn from(value: Vec<String>) -> Self {
        Self::List(value)
    }
}

/// Paging parameters.
///
/// Page-based (`page`/`pageSize`) and offset-based (`start`/`limit`) fields are not checked
/// for mixing; the CMS rejects such requests itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Pagination {
    /// 1-based page number
    pub page: Option<u32>,
    /// Entries per page
    pub page_size: Option<u32>,
    /// Offset of the first entry
    pub start: Option<u32>,
    /// Maximum number of entries
    pub limit: Option<u32>,
}

impl Pagination {
    /// Page-based pagination.
    #[must_use]
    pub const fn page(page: u32, page_size: u32) -> Self {
        Self {
            page: Some(page),
            page_size: Some(page_size),
            start: None,
            limit: None,
        }
    }

    /// Offset-based pagination.
    #[must_use]
    pub const fn offset(start: u32, limit: u32) -> Self {
        Self {
            page: None,
            page_size: None,
            start: Some(start),
            limit: Some(limit),
        }
    }

    /// Only set the page size.
    #[must_use]
    pub const fn page_size(page_size: u32) -> Self {
        Self {
            page: None,
            page_size: Some(page_size),
            start: None,
            limit: None,
        }
    }

    fn encode(&self, params: &mut QueryParams) {
        params.push_opt("pagination[page]", self.page);
        params.push_opt("pagination[pageSize]", self.page_size);
        params.push_opt("pagination[start]", self.start);
        params.push_opt("pagination[limit]", self.limit);
    }

    fn is_empty(&self) -> bool {
        self.page.is_none() && self.page_size.is_none() && self.start.is_none() && self.limit.is_none()
    }
}

/// Draft inclusion toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublicationState {
    /// Published entries only
    Live,
    /// Published entries and drafts
    Preview,
}

impl PublicationState {
    /// Wire representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Live => "live",
            Self::Preview => "preview",
        }
    }
}

impl FromStr for PublicationState {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "live" => Ok(Self::Live),
            "preview" => Ok(Self::Preview),
            _ => Err(Error::InvalidRequest(format!(
                "Unknown publication state: {s}"
            ))),
        }
    }
}

impl fmt::Display for PublicationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured description of a content query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StrapiQuery {
    /// Relations to expand
    pub populate: Option<Populate>,
    /// Scalar fields to return
    pub fields: Vec<String>,
    /// Filter expressions keyed by field name, in insertion order
    pub filters: Vec<(String, Value)>,
    /// Sort order
    pub sort: Option<Sort>,
    /// Paging
    pub pagination: Option<Pagination>,
    /// Draft inclusion
    pub publication_state: Option<PublicationState>,
    /// i18n locale
    pub locale: Option<String>,
}

impl StrapiQuery {
    /// Create an empty query.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set what to populate.
    ///
    /// An empty list clears the setting, since it encodes to no parameter at all.
    #[must_use]
    pub fn populate(mut self, populate: impl Into<Populate>) -> Self {
        self.populate = match populate.into() {
            Populate::List(items) if items.is_empty() => None,
            populate => Some(populate),
        };
        self
    }

    /// Restrict the returned fields.
    #[must_use]
    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields.extend(fields.into_iter().map(Into::into));
        self
    }

    /// Add a filter expression, e.g. `filter("slug", json!({"$eq": "my-post"}))`.
    #[must_use]
    pub fn filter(mut self, key: impl Into<String>, value: Value) -> Self {
        self.filters.push((key.into(), value));
        self
    }

    /// Add a filter expression from any serializable value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Encoding`] if the value cannot be serialized to JSON.
    pub fn try_filter<T>(self, key: impl Into<String>, value: &T) -> Result<Self>
    where
        T: Serialize + ?Sized,
    {
        let value = serde_json::to_value(value).map_err(|err| Error::Encoding(err.to_string()))?;
        Ok(self.filter(key, value))
    }

    /// Set the sort order.
    ///
    /// An empty list clears the setting.
    #[must_use]
    pub fn sort(mut self, sort: impl Into<Sort>) -> Self {
        self.sort = match sort.into() {
            Sort::List(items) if items.is_empty() => None,
            sort => Some(sort),
        };
        self
    }

    /// Set pagination.
    #[must_use]
    pub const fn pagination(mut self, pagination: Pagination) -> Self {
        self.pagination = Some(pagination);
        self
    }

    /// Set the publication state.
    #[must_use]
    pub const fn publication_state(mut self, state: PublicationState) -> Self {
        self.publication_state = Some(state);
        self
    }

    /// Set the locale.
    #[must_use]
    pub fn locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    /// Encode the query into ordered key/value pairs (not yet percent-encoded).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Encoding`] if a filter or nested populate value cannot be serialized.
    pub fn to_pairs(&self) -> Result<Vec<(String, String)>> {
        let mut params = QueryParams::new();

        if let Some(populate) = &self.populate {
            populate.encode(&mut params)?;
        }
        params.push_each("fields[]", &self.fields);
        for (key, value) in &self.filters {
            params.push_json(format!("filters[{key}]"), value)?;
        }
        match &self.sort {
            Some(Sort::Single(value)) => params.push("sort", value),
            Some(Sort::List(values)) => params.push_each("sort[]", values),
            None => {}
        }
        if let Some(pagination) = &self.pagination {
            pagination.encode(&mut params);
        }
        params.push_opt("publicationState", self.publication_state);
        params.push_opt("locale", self.locale.as_deref());

        Ok(params.into_pairs())
    }

    /// Encode the query as a form-urlencoded query string without the leading `?`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Encoding`] if a filter or nested populate value cannot be serialized.
    pub fn to_query_string(&self) -> Result<String> {
        let pairs = self.to_pairs()?;
        Ok(form_urlencoded::Serializer::new(String::new())
            .extend_pairs(pairs)
            .finish())
    }

    /// Decode a query string produced by [`StrapiQuery::to_query_string`].
    ///
    /// Queries assembled through the builder methods and `From` conversions decode back
    /// to an equal value. Hand-assigned fields can leave forms the wire cannot tell apart:
    /// `Populate::Single` holding JSON object text decodes as [`Populate::Nested`], and an
    /// empty `Populate::List` or `Sort::List` decodes as unset.
    ///
    /// Hand-written bracket filters such as `filters[slug][$eq]=x` are folded into
    /// nested JSON objects, and filter values that are not valid JSON are kept as strings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRequest`] for unknown parameters, repeated single-valued
    /// parameters, and malformed pagination or publication state values.
    pub fn from_query_string(query: &str) -> Result<Self> {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut parsed = Self::new();

        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            let value = value.into_owned();
            match &*key {
                "populate" => {
                    ensure_unset(parsed.populate.is_some(), "populate")?;
                    parsed.populate = Some(Populate::from(value));
                }
                "populate[]" => match &mut parsed.populate {
                    None => parsed.populate = Some(Populate::List(vec![value])),
                    Some(Populate::List(items)) => items.push(value),
                    Some(_) => return Err(mixed("populate")),
                },
                "fields[]" => parsed.fields.push(value),
                "sort" => {
                    ensure_unset(parsed.sort.is_some(), "sort")?;
                    parsed.sort = Some(Sort::Single(value));
                }
                "sort[]" => match &mut parsed.sort {
                    None => parsed.sort = Some(Sort::List(vec![value])),
                    Some(Sort::List(items)) => items.push(value),
                    Some(Sort::Single(_)) => return Err(mixed("sort")),
                },
                "publicationState" => {
                    parsed.publication_state = Some(value.parse()?);
                }
                "locale" => {
                    ensure_unset(parsed.locale.is_some(), "locale")?;
                    parsed.locale = Some(value);
                }
                other => {
                    if let Some(field) = bracketed(other, "pagination") {
                        let pagination = parsed.pagination.get_or_insert_with(Pagination::default);
                        set_pagination(pagination, field, &value)?;
                    } else if let Some(path) = bracketed(other, "filters") {
                        insert_filter(&mut parsed.filters, path, value)?;
                    } else {
                        return Err(Error::InvalidRequest(format!(
                            "Unknown query parameter: {other}"
                        )));
                    }
                }
            }
        }

        if parsed.pagination.is_some_and(|p| p.is_empty()) {
            parsed.pagination = None;
        }

        Ok(parsed)
    }
}

fn ensure_unset(is_set: bool, name: &str) -> Result<()> {
    if is_set {
        Err(Error::InvalidRequest(format!("Repeated parameter: {name}")))
    } else {
        Ok(())
    }
}

fn mixed(name: &str) -> Error {
    Error::InvalidRequest(format!("Mixed single and list forms of {name}"))
}

/// Returns the text between `name[` and the final `]`.
fn bracketed<'a>(key: &'a str, name: &str) -> Option<&'a str> {
    key.strip_prefix(name)?
        .strip_prefix('[')?
        .strip_suffix(']')
        .filter(|inner| !inner.is_empty())
}

fn set_pagination(pagination: &mut Pagination, field: &str, raw: &str) -> Result<()> {
    let number = raw.parse::<u32>().map_err(|err| {
        Error::InvalidRequest(format!("Invalid pagination[{field}] `{raw}`: {err}"))
    })?;
    let slot = match field {
        "page" => &mut pagination.page,
        "pageSize" => &mut pagination.page_size,
        "start" => &mut pagination.start,
        "limit" => &mut pagination.limit,
        _ => {
            return Err(Error::InvalidRequest(format!(
                "Unknown pagination field: {field}"
            )))
        }
    };
    *slot = Some(number);
    Ok(())
}

fn insert_filter(filters: &mut Vec<(String, Value)>, path: &str, raw: String) -> Result<()> {
    let mut segments = path.split("][");
    let field = segments.next().unwrap_or_default().to_string();
    let rest: Vec<&str> = segments.collect();

    let leaf = serde_json::from_str::<Value>(&raw).unwrap_or(Value::String(raw));

    if rest.is_empty() {
        filters.push((field, leaf));
        return Ok(());
    }

    let index = match filters.iter().position(|(key, _)| *key == field) {
        Some(index) => index,
        None => {
            filters.push((field, Value::Object(Map::new())));
            filters.len() - 1
        }
    };

    let mut cursor = &mut filters[index].1;
    for segment in rest {
        let Value::Object(map) = cursor else {
            return Err(Error::InvalidRequest(format!(
                "Conflicting filter path: filters[{path}]"
            )));
        };
        cursor = map
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }
    *cursor = leaf;
    Ok(())
}

/// Resolves endpoints against a fixed origin and API prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlBuilder {
    base: Url,
    api_prefix: String,
}

impl UrlBuilder {
    /// Create a builder for an origin and API prefix (e.g. `/api`).
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if the base URL cannot be parsed or cannot carry a path.
    pub fn new(base_url: impl AsRef<str>, api_prefix: impl AsRef<str>) -> Result<Self> {
        let base = Url::parse(base_url.as_ref())
            .map_err(|err| Error::ConfigError(format!("Invalid base URL: {err}")))?;
        if base.cannot_be_a_base() {
            return Err(Error::ConfigError(format!(
                "Base URL cannot be a base: {base}"
            )));
        }
        let trimmed = api_prefix.as_ref().trim_matches('/');
        let api_prefix = if trimmed.is_empty() {
            String::new()
        } else {
            format!("/{trimmed}")
        };
        Ok(Self { base, api_prefix })
    }

    /// Create a builder from a client configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if the configured base URL is invalid.
    pub fn from_config(config: &StrapiConfig) -> Result<Self> {
        Self::new(&config.base_url, &config.api_prefix)
    }

    /// Origin the endpoints are resolved against.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base
    }

    /// Normalized API prefix (`/api`), or empty when the API is served at the root.
    #[must_use]
    pub fn api_prefix(&self) -> &str {
        &self.api_prefix
    }

    /// Place the endpoint inside the API namespace exactly once.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidEndpoint`] for an empty endpoint.
    pub fn normalize_endpoint(&self, endpoint: &str) -> Result<String> {
        if endpoint.is_empty() {
            return Err(Error::InvalidEndpoint("endpoint must not be empty".to_string()));
        }
        if self.has_prefix(endpoint) {
            Ok(endpoint.to_string())
        } else if endpoint.starts_with('/') {
            Ok(format!("{}{endpoint}", self.api_prefix))
        } else {
            Ok(format!("{}/{endpoint}", self.api_prefix))
        }
    }

    fn has_prefix(&self, endpoint: &str) -> bool {
        if self.api_prefix.is_empty() {
            return endpoint.starts_with('/');
        }
        endpoint
            .strip_prefix(self.api_prefix.as_str())
            .is_some_and(|rest| {
                rest.is_empty() || rest.starts_with(|c| matches!(c, '/' | '?' | '#'))
            })
    }

    /// Resolve the endpoint and append the encoded query.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidEndpoint`] if the endpoint cannot be resolved and
    /// [`Error::Encoding`] if a query value cannot be serialized.
    pub fn url(&self, endpoint: &str, query: Option<&StrapiQuery>) -> Result<Url> {
        let path = self.normalize_endpoint(endpoint)?;
        let mut url = self.base.join(&path).map_err(|err| {
            Error::InvalidEndpoint(format!("Invalid endpoint `{endpoint}`: {err}"))
        })?;

        if let Some(query) = query {
            let pairs = query.to_pairs()?;
            if !pairs.is_empty() {
                url.query_pairs_mut().extend_pairs(pairs);
            }
        }

        Ok(url)
    }

    /// Build the fully qualified URL string for an endpoint and optional query.
    ///
    /// # Errors
    ///
    /// See [`UrlBuilder::url`].
    pub fn build(&self, endpoint: &str, query: Option<&StrapiQuery>) -> Result<String> {
        self.url(endpoint, query).map(String::from)
    }
}
