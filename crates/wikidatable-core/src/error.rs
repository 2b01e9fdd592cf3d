//! Error types for Wikidatable

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("missing {field} in configuration {config}")]
    Configuration { config: String, field: String },

    #[error("page not found: {0}")]
    PageNotFound(String),

    #[error("invalid page {title}: {message}")]
    InvalidPage { title: String, message: String },

    #[error("write failed for {title}: {message}")]
    Write { title: String, message: String },

    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("json error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("toml error: {0}")]
    TomlError(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn configuration(config: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Configuration {
            config: config.into(),
            field: field.into(),
        }
    }

    pub fn invalid_page(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidPage {
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn write(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Write {
            title: title.into(),
            message: message.into(),
        }
    }

    /// Write failures halt the whole run; everything else is recovered per configuration.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Write { .. })
    }
}
