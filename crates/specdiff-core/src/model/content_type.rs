use serde::{Deserialize, Serialize};
use std::fmt;

/// Content type of an observed or declared body
///
/// `NoBody` is a sentinel distinct from every media type string, so an
/// interaction without a body never matches a declared `application/json`
/// body by accident, and two body-less sides always match each other.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    NoBody,
    Media(String),
}

impl ContentType {
    /// Normalize a `Content-Type` header value
    ///
    /// Parameters (`; charset=utf-8`) are dropped and the media type is
    /// lowercased. A missing or blank header yields `NoBody`.
    pub fn from_header(value: Option<&str>) -> Self {
        let media = value
            .and_then(|v| v.split(';').next())
            .map(|v| v.trim().to_ascii_lowercase())
            .unwrap_or_default();
        if media.is_empty() {
            ContentType::NoBody
        } else {
            ContentType::Media(media)
        }
    }

    pub fn media(value: impl Into<String>) -> Self {
        ContentType::from_header(Some(&value.into()))
    }

    pub fn as_media(&self) -> Option<&str> {
        match self {
            ContentType::NoBody => None,
            ContentType::Media(m) => Some(m),
        }
    }

    pub fn is_no_body(&self) -> bool {
        matches!(self, ContentType::NoBody)
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentType::NoBody => f.write_str("No Body"),
            ContentType::Media(m) => f.write_str(m),
        }
    }
}
