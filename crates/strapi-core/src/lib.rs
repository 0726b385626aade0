//! # strapi-core
//!
//! Core types and utilities for consuming a Strapi content REST API.
//!
//! ## Modules
//!
//! - [`query`] - Query model, URL builder and query-string parser
//! - [`client`] - HTTP fetch wrapper
//! - [`config`] - Client configuration (origin, API prefix, token)
//! - [`error`] - Error type shared by the workspace
//! - [`types`] - Content-type enumeration

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod config;
pub mod error;
pub mod query;
pub mod types;

// Re-export commonly used types
pub use client::{ApiClient, ApiClientBuilder};
pub use config::StrapiConfig;
pub use error::{ApiErrorDetail, Error, Result};
pub use query::{Pagination, Populate, PublicationState, Sort, StrapiQuery, UrlBuilder};
pub use types::ContentType;
