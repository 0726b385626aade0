//! Typed client for the post, author and category collections.

use crate::models::{
    AuthorResponse, AuthorsResponse, CategoriesResponse, CategoryEntity, CategoryResponse, Entity,
    PostEntity, PostResponse, PostsResponse, Response,
};
use crate::Result;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use strapi_core::client::{ApiClient, ApiClientBuilder};
use strapi_core::{ContentType, Error, Pagination, StrapiConfig, StrapiQuery};
use tracing::debug;
use url::Url;

const USER_AGENT: &str = concat!("strapi-content/", env!("CARGO_PKG_VERSION"));

/// Read access to the content collections.
///
/// Every operation takes a [`StrapiQuery`] so callers control population, paging,
/// publication state and locale.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContentApi: Send + Sync {
    /// List posts.
    async fn list_posts(&self, query: &StrapiQuery) -> Result<PostsResponse>;

    /// Fetch a post by document id.
    async fn get_post(&self, document_id: &str, query: &StrapiQuery) -> Result<PostResponse>;

    /// First post whose slug equals `slug`.
    async fn find_post_by_slug(&self, slug: &str, query: &StrapiQuery)
        -> Result<Option<PostEntity>>;

    /// List authors.
    async fn list_authors(&self, query: &StrapiQuery) -> Result<AuthorsResponse>;

    /// Fetch an author by document id.
    async fn get_author(&self, document_id: &str, query: &StrapiQuery) -> Result<AuthorResponse>;

    /// List categories.
    async fn list_categories(&self, query: &StrapiQuery) -> Result<CategoriesResponse>;

    /// Fetch a category by document id.
    async fn get_category(&self, document_id: &str, query: &StrapiQuery)
        -> Result<CategoryResponse>;

    /// First category whose slug equals `slug`.
    async fn find_category_by_slug(
        &self,
        slug: &str,
        query: &StrapiQuery,
    ) -> Result<Option<CategoryEntity>>;

    /// List a collection without decoding entities.
    async fn fetch_raw(
        &self,
        content_type: ContentType,
        query: &StrapiQuery,
    ) -> Result<Response<Vec<Value>>>;
}

/// Builder for [`ContentClient`].
#[derive(Debug, Clone)]
pub struct ContentClientBuilder {
    inner: ApiClientBuilder,
}

impl ContentClientBuilder {
    /// Create a builder from a [`StrapiConfig`].
    #[must_use]
    pub fn new(config: StrapiConfig) -> Self {
        Self {
            inner: ApiClient::builder(config).with_user_agent(USER_AGENT),
        }
    }

    /// Configure an API token sent as `Authorization: Bearer`.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.inner = self.inner.with_token(token);
        self
    }

    /// Build the client.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> Result<ContentClient> {
        let inner = self.inner.build()?;
        Ok(ContentClient { inner })
    }
}

/// [`ContentApi`] over HTTP.
#[derive(Clone)]
pub struct ContentClient {
    inner: ApiClient,
}

impl ContentClient {
    /// Construct a client for an origin with default settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        ContentClientBuilder::new(StrapiConfig::new(base_url)?).build()
    }

    /// Construct a client from a configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn from_config(config: &StrapiConfig) -> Result<Self> {
        ContentClientBuilder::new(config.clone()).build()
    }

    /// Wrap an existing [`ApiClient`].
    #[must_use]
    pub const fn from_api_client(inner: ApiClient) -> Self {
        Self { inner }
    }

    /// Underlying fetch wrapper.
    #[must_use]
    pub const fn api(&self) -> &ApiClient {
        &self.inner
    }

    /// Return the base URL.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        self.inner.base_url()
    }

    /// Walk every page of a collection and return all entries.
    ///
    /// Paging is page-based with `page_size` entries per request; any pagination already
    /// set on `query` is replaced.
    ///
    /// # Errors
    ///
    /// Fails on the first page that cannot be fetched or decoded.
    pub async fn collect_all<A>(
        &self,
        content_type: ContentType,
        query: &StrapiQuery,
        page_size: u32,
    ) -> Result<Vec<Entity<A>>>
    where
        A: DeserializeOwned,
    {
        let mut entries = Vec::new();
        let mut page = 1;
        loop {
            let query = query.clone().pagination(Pagination::page(page, page_size));
            let response: Response<Vec<Entity<A>>> = self.list(content_type, &query).await?;
            let fetched = response.data.len();
            let has_next = response.pagination().is_some_and(|meta| meta.has_next_page());
            entries.extend(response.data);

            if fetched == 0 || !has_next {
                break;
            }
            page += 1;
        }
        debug!(content_type = %content_type, count = entries.len(), "Collected all entries");
        Ok(entries)
    }

    async fn list<T>(&self, content_type: ContentType, query: &StrapiQuery) -> Result<T>
    where
        T: DeserializeOwned,
    {
        self.inner
            .fetch(&content_type.collection_path(), Some(query))
            .await
    }

    async fn get<T>(
        &self,
        content_type: ContentType,
        document_id: &str,
        query: &StrapiQuery,
    ) -> Result<T>
    where
        T: DeserializeOwned,
    {
        if document_id.trim().is_empty() {
            return Err(Error::InvalidRequest(format!(
                "Empty document id for {content_type}"
            )));
        }
        self.inner
            .fetch(&content_type.entry_path(document_id), Some(query))
            .await
    }

    async fn find_by_slug<A>(
        &self,
        content_type: ContentType,
        slug: &str,
        query: &StrapiQuery,
    ) -> Result<Option<Entity<A>>>
    where
        A: DeserializeOwned,
    {
        let query = slug_query(slug, query);
        let response: Response<Vec<Entity<A>>> = self.list(content_type, &query).await?;
        debug!(
            content_type = %content_type,
            slug,
            matches = response.data.len(),
            "Slug lookup"
        );
        Ok(response.data.into_iter().next())
    }
}

fn slug_query(slug: &str, query: &StrapiQuery) -> StrapiQuery {
    let mut query = query.clone().filter("slug", json!({ "$eq": slug }));
    if query.pagination.is_none() {
        query = query.pagination(Pagination::page_size(1));
    }
    query
}

#[async_trait]
impl ContentApi for ContentClient {
    async fn list_posts(&self, query: &StrapiQuery) -> Result<PostsResponse> {
        self.list(ContentType::Post, query).await
    }

    async fn get_post(&self, document_id: &str, query: &StrapiQuery) -> Result<PostResponse> {
        self.get(ContentType::Post, document_id, query).await
    }

    async fn find_post_by_slug(
        &self,
        slug: &str,
        query: &StrapiQuery,
    ) -> Result<Option<PostEntity>> {
        self.find_by_slug(ContentType::Post, slug, query).await
    }

    async fn list_authors(&self, query: &StrapiQuery) -> Result<AuthorsResponse> {
        self.list(ContentType::Author, query).await
    }

    async fn get_author(&self, document_id: &str, query: &StrapiQuery) -> Result<AuthorResponse> {
        self.get(ContentType::Author, document_id, query).await
    }

    async fn list_categories(&self, query: &StrapiQuery) -> Result<CategoriesResponse> {
        self.list(ContentType::Category, query).await
    }

    async fn get_category(
        &self,
        document_id: &str,
        query: &StrapiQuery,
    ) -> Result<CategoryResponse> {
        self.get(ContentType::Category, document_id, query).await
    }

    async fn find_category_by_slug(
        &self,
        slug: &str,
        query: &StrapiQuery,
    ) -> Result<Option<CategoryEntity>> {
        self.find_by_slug(ContentType::Category, slug, query).await
    }

    async fn fetch_raw(
        &self,
        content_type: ContentType,
        query: &StrapiQuery,
    ) -> Result<Response<Vec<Value>>> {
        self.list(content_type, query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PostAttributes;
    use crate::populate::PopulatePreset;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(server: &MockServer) -> ContentClient {
        ContentClient::new(server.uri()).unwrap()
    }

    #[tokio::test]
    async fn list_posts_decodes_entities() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/posts"))
            .and(query_param("populate[]", "author"))
            .and(header("User-Agent", USER_AGENT))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{
                    "id": 1,
                    "documentId": "p1",
                    "title": "First",
                    "author": { "id": 2, "documentId": "a2", "name": "Ada" },
                    "category": null
                }],
                "meta": { "pagination": { "page": 1, "pageSize": 25, "pageCount": 1, "total": 1 } }
            })))
            .mount(&server)
            .await;

        let query = StrapiQuery::new().populate(PopulatePreset::Minimal.for_type(ContentType::Post));
        let posts = test_client(&server).list_posts(&query).await.unwrap();

        assert_eq!(posts.data.len(), 1);
        let post = &posts.data[0];
        assert_eq!(post.attributes.title.as_deref(), Some("First"));
        assert_eq!(
            post.attributes.author.one().and_then(|a| a.attributes.name.as_deref()),
            Some("Ada")
        );
        assert_eq!(posts.pagination().and_then(|p| p.total), Some(1));
    }

    #[tokio::test]
    async fn get_author_by_document_id() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/authors/a2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "id": 2, "documentId": "a2", "name": "Ada", "slug": "ada" },
                "meta": {}
            })))
            .mount(&server)
            .await;

        let author = test_client(&server)
            .get_author("a2", &StrapiQuery::new())
            .await
            .unwrap();
        assert_eq!(author.data.attributes.slug.as_deref(), Some("ada"));
    }

    #[tokio::test]
    async fn get_with_empty_document_id_is_rejected() {
        let client = ContentClient::new("http://127.0.0.1:1").unwrap();
        let err = client.get_post("  ", &StrapiQuery::new()).await.unwrap_err();
        assert!(matches!(err, Error::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn find_post_by_slug_filters_and_limits() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/posts"))
            .and(query_param("filters[slug]", r#"{"$eq":"hello-world"}"#))
            .and(query_param("pagination[pageSize]", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{ "id": 5, "documentId": "p5", "slug": "hello-world" }]
            })))
            .mount(&server)
            .await;

        let post = test_client(&server)
            .find_post_by_slug("hello-world", &StrapiQuery::new())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(post.document_id.as_deref(), Some("p5"));
    }

    #[tokio::test]
    async fn find_category_by_slug_without_match() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/categories"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
            .mount(&server)
            .await;

        let category = test_client(&server)
            .find_category_by_slug("nope", &StrapiQuery::new())
            .await
            .unwrap();
        assert!(category.is_none());
    }

    #[tokio::test]
    async fn not_found_propagates_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/categories/missing"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "data": null,
                "error": { "status": 404, "name": "NotFoundError", "message": "Not Found" }
            })))
            .mount(&server)
            .await;

        let err = test_client(&server)
            .get_category("missing", &StrapiQuery::new())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn collect_all_walks_pages() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/posts"))
            .and(query_param("pagination[page]", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{ "id": 1, "title": "a" }, { "id": 2, "title": "b" }],
                "meta": { "pagination": { "page": 1, "pageSize": 2, "pageCount": 2, "total": 3 } }
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/posts"))
            .and(query_param("pagination[page]", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{ "id": 3, "title": "c" }],
                "meta": { "pagination": { "page": 2, "pageSize": 2, "pageCount": 2, "total": 3 } }
            })))
            .mount(&server)
            .await;

        let posts: Vec<Entity<PostAttributes>> = test_client(&server)
            .collect_all(ContentType::Post, &StrapiQuery::new(), 2)
            .await
            .unwrap();
        let ids: Vec<_> = posts.iter().map(|post| post.id).collect();
        assert_eq!(ids, [1, 2, 3]);
    }

    #[tokio::test]
    async fn fetch_raw_keeps_json() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/authors"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{ "id": 1, "avatar": { "id": 4, "url": "/a.png" } }]
            })))
            .mount(&server)
            .await;

        let raw = test_client(&server)
            .fetch_raw(ContentType::Author, &StrapiQuery::new())
            .await
            .unwrap();
        assert_eq!(raw.data[0]["avatar"]["url"], "/a.png");
    }

    #[test]
    fn slug_query_keeps_caller_pagination() {
        let query = StrapiQuery::new().pagination(Pagination::page(2, 10));
        let query = slug_query("x", &query);
        assert_eq!(query.pagination, Some(Pagination::page(2, 10)));
        assert_eq!(query.filters, vec![("slug".to_string(), json!({ "$eq": "x" }))]);
    }
}
