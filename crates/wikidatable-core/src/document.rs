//! Configuration pages and the heading/data maps they point at.
//!
//! These are JSON documents maintained by hand on the wiki, so parsing is
//! lenient: one malformed heading or data row is logged and dropped rather
//! than failing the whole configuration.

use crate::error::{Error, Result};
use crate::types::{EntityId, HeadingConfig};
use serde_json::Value;
use std::collections::HashMap;
use tracing::warn;

/// Heading key -> heading configuration.
pub type HeadingMap = HashMap<String, HeadingConfig>;

/// Property id -> entity id for one row of the data map.
pub type DataEntry = HashMap<String, EntityId>;

/// Data key -> row.
pub type DataMap = HashMap<String, DataEntry>;

/// One configuration page (`.../Something.json`).
#[derive(Clone, Debug)]
pub struct ConfigurationDocument {
    /// Title of the configuration page itself.
    pub title: String,
    /// Title of the page holding the data map.
    pub data: String,
    /// Title of the page holding the template wikitext.
    pub template: String,
    /// Raw `headings` object, parsed with [`parse_headings`].
    pub headings: serde_json::Map<String, Value>,
}

impl ConfigurationDocument {
    /// Extracts the three required fields, in the order `data`, `template`,
    /// `headings`. The first missing one is reported.
    pub fn from_value(title: impl Into<String>, value: &Value) -> Result<Self> {
        let title = title.into();

        let data = value
            .get("data")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::configuration(&title, "data"))?
            .to_string();
        let template = value
            .get("template")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::configuration(&title, "template"))?
            .to_string();
        let headings = value
            .get("headings")
            .and_then(Value::as_object)
            .ok_or_else(|| Error::configuration(&title, "headings"))?
            .clone();

        Ok(Self {
            title,
            data,
            template,
            headings,
        })
    }

    /// Title the resolved template is written to: the configuration title
    /// without its `.json` suffix.
    pub fn output_title(&self) -> &str {
        self.title.strip_suffix(".json").unwrap_or(&self.title)
    }

    pub fn heading_map(&self) -> HeadingMap {
        parse_headings(&self.title, &self.headings)
    }
}

/// Parses a `headings` object. Headings without a string `data` property are
/// dropped with a warning, so their markers later fail as unknown headings.
pub fn parse_headings(config: &str, raw: &serde_json::Map<String, Value>) -> HeadingMap {
    let mut headings = HeadingMap::new();
    for (key, value) in raw {
        match serde_json::from_value::<HeadingConfig>(value.clone()) {
            Ok(heading) => {
                headings.insert(key.clone(), heading);
            }
            Err(e) => {
                warn!("Failed to get config heading data for {} for config {}: {}", key, config, e);
            }
        }
    }
    headings
}

/// Parses a data map page. Rows that are not objects are dropped, as are
/// non-string entity ids inside a row.
pub fn parse_data_map(title: &str, value: &Value) -> Result<DataMap> {
    let rows = value
        .as_object()
        .ok_or_else(|| Error::invalid_page(title, "data map is not a JSON object"))?;

    let mut data = DataMap::new();
    for (key, row) in rows {
        let Some(row) = row.as_object() else {
            warn!("Data key {} in {} is not an object, skipping", key, title);
            continue;
        };
        let entry: DataEntry = row
            .iter()
            .filter_map(|(prop, entity)| {
                entity
                    .as_str()
                    .map(|e| (prop.clone(), EntityId::new(e)))
            })
            .collect();
        data.insert(key.clone(), entry);
    }
    Ok(data)
}
