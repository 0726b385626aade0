//! Core content-type enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Path of the health endpoint, served outside the API prefix.
pub const HEALTH_PATH: &str = "/_health";

/// Collection types exposed by the content API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    /// Blog posts
    Post,
    /// Post authors
    Author,
    /// Post categories (self-referencing hierarchy)
    Category,
}

impl ContentType {
    /// Singular API name (`post`).
    #[must_use]
    pub const fn singular(&self) -> &'static str {
        match self {
            Self::Post => "post",
            Self::Author => "author",
            Self::Category => "category",
        }
    }

    /// Plural API name used as the collection route (`posts`).
    #[must_use]
    pub const fn plural(&self) -> &'static str {
        match self {
            Self::Post => "posts",
            Self::Author => "authors",
            Self::Category => "categories",
        }
    }

    /// Content-type UID (`api::post.post`).
    #[must_use]
    pub fn uid(&self) -> String {
        let name = self.singular();
        format!("api::{name}.{name}")
    }

    /// Collection endpoint relative to the API prefix (`/posts`).
    #[must_use]
    pub fn collection_path(&self) -> String {
        format!("/{}", self.plural())
    }

    /// Single-entry endpoint relative to the API prefix (`/posts/<documentId>`).
    #[must_use]
    pub fn entry_path(&self, document_id: &str) -> String {
        format!("/{}/{document_id}", self.plural())
    }

    /// Returns all content types.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Post, Self::Author, Self::Category]
    }
}

impl FromStr for ContentType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.to_lowercase();
        Self::all()
            .iter()
            .copied()
            .find(|ct| ct.singular() == lower || ct.plural() == lower || ct.uid() == lower)
            .ok_or_else(|| Error::InvalidRequest(format!("Unknown content type: {s}")))
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.plural())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_and_paths() {
        assert_eq!(ContentType::Category.plural(), "categories");
        assert_eq!(ContentType::Post.uid(), "api::post.post");
        assert_eq!(ContentType::Author.collection_path(), "/authors");
        assert_eq!(ContentType::Post.entry_path("abc123"), "/posts/abc123");
        assert_eq!(ContentType::Post.to_string(), "posts");
    }

    #[test]
    fn test_from_str() {
        assert_eq!("Posts".parse::<ContentType>().unwrap(), ContentType::Post);
        assert_eq!("category".parse::<ContentType>().unwrap(), ContentType::Category);
        assert_eq!(
            "api::author.author".parse::<ContentType>().unwrap(),
            ContentType::Author
        );
        assert!("widgets".parse::<ContentType>().is_err());
    }

    #[test]
    fn test_all() {
        assert_eq!(ContentType::all().len(), 3);
    }
}
