//! # strapi-content
//!
//! Typed access to the blog collections (posts, authors, categories) served by the
//! content REST API.
//!
//! ## Example
//!
//! ```no_run
//! use strapi_content::{ContentApi, ContentClient, PopulatePreset};
//! use strapi_core::{ContentType, StrapiQuery};
//!
//! # async fn example() -> strapi_content::Result<()> {
//! let client = ContentClient::new("http://localhost:1337")?;
//! let query = StrapiQuery::new().populate(PopulatePreset::All.for_type(ContentType::Post));
//! let post = client.find_post_by_slug("hello-world", &query).await?;
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod components;
pub mod diagnostics;
pub mod models;
pub mod populate;

pub use client::{ContentApi, ContentClient, ContentClientBuilder};
pub use components::DynamicZoneComponent;
pub use diagnostics::{check_deep_populate, FieldPresence, PopulateReport};
pub use models::{
    AuthorAttributes, AuthorEntity, AuthorResponse, AuthorsResponse, CategoriesResponse,
    CategoryAttributes, CategoryEntity, CategoryResponse, Entity, Media, MediaFormat,
    MediaFormats, Meta, PaginationMeta, PostAttributes, PostEntity, PostResponse, PostsResponse,
    Relation, Response,
};
pub use populate::{preset, PopulatePreset};

/// Result type used across the content client.
pub type Result<T> = strapi_core::Result<T>;
