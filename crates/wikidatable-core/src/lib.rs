//! Wikidatable Core - Types, configuration, and error handling

pub mod config;
pub mod document;
pub mod error;
pub mod types;

pub use config::{BotConfig, CitationConfig, RunConfig, Strategy, WikidataConfig};
pub use document::{parse_data_map, parse_headings, ConfigurationDocument, DataEntry, DataMap, HeadingMap};
pub use error::{Error, Result};
pub use types::*;
