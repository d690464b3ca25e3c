//! Placeholder converters for route patterns.
//!
//! | Name   | Regex                          | Accepts                 |
//! |--------|--------------------------------|-------------------------|
//! | `int`  | `[0-9]+`                       | values fitting in `i64` |
//! | `str`  | `[^/]+`                        | any non-empty segment   |
//! | `slug` | `[-a-zA-Z0-9_]+`               | slugs                   |
//! | `uuid` | `[0-9a-f]{8}-...-[0-9a-f]{12}` | lowercase UUIDs         |
//! | `path` | `.+`                           | anything, slashes too   |
//!
//! [`Converter::Regex`] carries a caller-supplied pattern; routers use it for
//! lookup values and format suffixes.

use std::fmt;

use profiles_core::{ApiError, ApiResult};

const UUID_REGEX: &str = "[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}";

/// How a `<type:name>` placeholder matches and validates its segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Converter {
    /// Digits, parsed as `i64`.
    Int,
    /// A non-empty segment without `/`.
    Str,
    /// Letters, digits, hyphens and underscores.
    Slug,
    /// A hyphenated lowercase UUID.
    Uuid,
    /// Any non-empty string, including `/`.
    Path,
    /// A custom regex. Values are accepted as matched.
    Regex(String),
}

impl Converter {
    /// Looks up a built-in converter by its placeholder name.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::ImproperlyConfigured`] for an unknown name.
    pub fn from_name(name: &str) -> ApiResult<Self> {
        match name {
            "int" => Ok(Self::Int),
            "str" => Ok(Self::Str),
            "slug" => Ok(Self::Slug),
            "uuid" => Ok(Self::Uuid),
            "path" => Ok(Self::Path),
            other => Err(ApiError::ImproperlyConfigured(format!(
                "Unknown path converter: '{other}'"
            ))),
        }
    }

    /// Returns the regex fragment that matches values for this converter.
    pub fn regex(&self) -> &str {
        match self {
            Self::Int => "[0-9]+",
            Self::Str => "[^/]+",
            Self::Slug => "[-a-zA-Z0-9_]+",
            Self::Uuid => UUID_REGEX,
            Self::Path => ".+",
            Self::Regex(pattern) => pattern,
        }
    }

    /// Checks a regex-matched value, rejecting e.g. integers that overflow.
    pub fn validate(&self, value: &str) -> bool {
        match self {
            Self::Int => value.parse::<i64>().is_ok(),
            Self::Uuid => uuid::Uuid::parse_str(value).is_ok(),
            Self::Str | Self::Slug | Self::Path => !value.is_empty(),
            Self::Regex(_) => true,
        }
    }
}

impl fmt::Display for Converter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int => f.write_str("int"),
            Self::Str => f.write_str("str"),
            Self::Slug => f.write_str("slug"),
            Self::Uuid => f.write_str("uuid"),
            Self::Path => f.write_str("path"),
            Self::Regex(pattern) => write!(f, "regex({pattern})"),
        }
    }
}
