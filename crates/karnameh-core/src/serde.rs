//! Deserializers for query-string parameters.
//!
//! Browsers and form builders send `?teacher_id=` for "no filter". These
//! helpers read such empty values as `None` instead of failing the request.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Deserializer};

/// Deserialize an optional value that may arrive as an empty string.
///
/// Accepts native JSON values as well as their string form, so the same DTO
/// works behind `Query` and `Json` extractors.
pub fn empty_string_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
        Bool(bool),
    }

    let raw: Option<Raw> = Option::deserialize(deserializer)?;
    let text = match raw {
        None => return Ok(None),
        Some(Raw::Text(s)) => s,
        Some(Raw::Number(n)) => n.to_string(),
        Some(Raw::Bool(b)) => b.to_string(),
    };

    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    trimmed
        .parse::<T>()
        .map(Some)
        .map_err(serde::de::Error::custom)
}
