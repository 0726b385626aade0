//! Variable sources.
//!
//! Empty values are treated the same as unset ones, so `PORT=` falls back to the default
//! instead of failing to parse.

use crate::Result;
use secrecy::{ExposeSecret, SecretString};
use serde::ser::SerializeSeq;
use serde::Serializer;
use std::collections::HashMap;
use std::fmt::Display;
use std::str::FromStr;
use strapi_core::Error;

/// A source of configuration variables.
pub trait Environment {
    /// Raw value of a variable.
    fn var(&self, key: &str) -> Option<String>;

    /// Value of a variable, with empty values treated as unset.
    fn get(&self, key: &str) -> Option<String> {
        self.var(key).filter(|value| !value.trim().is_empty())
    }

    /// Value of a variable or the given default.
    fn string_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }

    /// Value of a variable that must be set.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if the variable is unset or empty.
    fn required(&self, key: &str) -> Result<String> {
        self.get(key)
            .ok_or_else(|| Error::ConfigError(format!("Missing required variable {key}")))
    }

    /// Parsed value of a variable or the given default.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if the value does not parse.
    fn parse_or<T>(&self, key: &str, default: T) -> Result<T>
    where
        Self: Sized,
        T: FromStr,
        T::Err: Display,
    {
        match self.get(key) {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|err| Error::ConfigError(format!("Invalid {key} `{raw}`: {err}"))),
            None => Ok(default),
        }
    }

    /// Comma-separated list; blank items are dropped.
    fn list(&self, key: &str) -> Vec<String> {
        self.get(key)
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|item| !item.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Variables of the current process.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl Environment for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// Fixed set of variables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MapEnv {
    vars: HashMap<String, String>,
}

impl MapEnv {
    /// Create an empty environment.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a variable.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }
}

impl<K, V> FromIterator<(K, V)> for MapEnv
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }
}

impl Environment for MapEnv {
    fn var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }
}

// Framework config needs the plain values.
pub(crate) fn serialize_secret<S>(
    secret: &SecretString,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(secret.expose_secret())
}

pub(crate) fn serialize_secrets<S>(
    secrets: &[SecretString],
    serializer: S,
) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let mut seq = serializer.serialize_seq(Some(secrets.len()))?;
    for secret in secrets {
        seq.serialize_element(secret.expose_secret())?;
    }
    seq.end()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_is_unset() {
        let env = MapEnv::new().with("HOST", "").with("NAME", "strapi");
        assert_eq!(env.var("HOST").as_deref(), Some(""));
        assert_eq!(env.get("HOST"), None);
        assert_eq!(env.string_or("HOST", "0.0.0.0"), "0.0.0.0");
        assert_eq!(env.string_or("NAME", "x"), "strapi");
    }

    #[test]
    fn test_parse_or() {
        let env: MapEnv = [("PORT", "8080"), ("BAD", "eighty")].into_iter().collect();
        assert_eq!(env.parse_or("PORT", 1337u16).unwrap(), 8080);
        assert_eq!(env.parse_or("MISSING", 1337u16).unwrap(), 1337);

        let err = env.parse_or("BAD", 1u16).unwrap_err();
        assert!(matches!(err, Error::ConfigError(ref msg) if msg.contains("BAD")));
    }

    #[test]
    fn test_list_and_required() {
        let env = MapEnv::new().with("APP_KEYS", "a, b,,c ");
        assert_eq!(env.list("APP_KEYS"), ["a", "b", "c"]);
        assert!(env.list("MISSING").is_empty());
        assert!(env.required("MISSING").is_err());
        assert_eq!(env.required("APP_KEYS").unwrap(), "a, b,,c ");
    }
}
