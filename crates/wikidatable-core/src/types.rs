//! Core types for Wikidatable

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Knowledge-graph item identifier (`Q42`) - cheaply cloneable
#[derive(Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(Arc<str>);

impl EntityId {
    pub fn new(s: impl Into<String>) -> Self {
        Self(Arc::from(s.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `Q` followed by one or more ASCII digits.
    pub fn is_valid(&self) -> bool {
        is_prefixed_number(&self.0, 'Q')
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Knowledge-graph property identifier (`P1082`) - cheaply cloneable
#[derive(Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyId(Arc<str>);

impl PropertyId {
    pub fn new(s: impl Into<String>) -> Self {
        Self(Arc::from(s.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `P` followed by one or more ASCII digits.
    pub fn is_valid(&self) -> bool {
        is_prefixed_number(&self.0, 'P')
    }
}

impl std::fmt::Display for PropertyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for PropertyId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for PropertyId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

fn is_prefixed_number(s: &str, prefix: char) -> bool {
    match s.strip_prefix(prefix) {
        Some(digits) => !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()),
        None => false,
    }
}

/// Provenance of one claim value.
///
/// An absent reference is modelled as `Option<Reference>` by the caller, so a
/// `Reference` value always means one was found. Empty strings never appear in
/// the optional fields; a missing value is `None`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retrieved: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
}

impl Reference {
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = non_empty(url.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = non_empty(title.into());
        self
    }

    pub fn with_published(mut self, date: impl Into<String>) -> Self {
        self.published = non_empty(date.into());
        self
    }

    pub fn with_retrieved(mut self, date: impl Into<String>) -> Self {
        self.retrieved = non_empty(date.into());
        self
    }

    /// True when no field carries any data.
    pub fn is_empty(&self) -> bool {
        self.url.is_none()
            && self.title.is_none()
            && self.published.is_none()
            && self.retrieved.is_none()
            && self.language.is_none()
            && self.website.is_none()
    }

    /// Title, language and site are all known, so a metadata lookup adds nothing.
    pub fn has_metadata(&self) -> bool {
        self.title.is_some() && self.language.is_some() && self.website.is_some()
    }
}

/// Maps the empty string to `None`.
pub fn non_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

/// A resolved claim value together with its best reference, if any.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedClaim {
    pub value: f64,
    pub reference: Option<Reference>,
}

impl ResolvedClaim {
    pub fn new(value: f64, reference: Option<Reference>) -> Self {
        Self { value, reference }
    }
}

/// Heading configuration: which property fills a column, and optionally
/// which property it is divided by (rendered as a percentage).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadingConfig {
    pub data: PropertyId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub per: Option<PropertyId>,
}

impl HeadingConfig {
    pub fn single(data: impl Into<PropertyId>) -> Self {
        Self {
            data: data.into(),
            per: None,
        }
    }

    pub fn ratio(data: impl Into<PropertyId>, per: impl Into<PropertyId>) -> Self {
        Self {
            data: data.into(),
            per: Some(per.into()),
        }
    }

    pub fn is_ratio(&self) -> bool {
        self.per.is_some()
    }
}
