//! Bot configuration
//!
//! Endpoints, strategy selection and run parameters. Loaded from TOML at
//! startup, falls back to defaults if no config file exists.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level bot configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Knowledge-graph endpoints and lookup strategy.
    pub wikidata: WikidataConfig,
    /// Citation-metadata service.
    pub citation: CitationConfig,
    /// Which pages to read and how to write.
    pub bot: RunConfig,
}

/// How claims and references are looked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Fetch the whole entity document once and read claims from it.
    Snapshot,
    /// One ranked SPARQL query per (entity, property).
    Query,
}

impl std::str::FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "snapshot" => Ok(Self::Snapshot),
            "query" | "sparql" => Ok(Self::Query),
            other => Err(format!("unknown strategy: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WikidataConfig {
    pub strategy: Strategy,
    /// Base of the entity-data endpoint; `/{id}.json` is appended.
    pub entity_data_url: String,
    pub sparql_url: String,
    /// Per-attempt timeout for the structured query.
    pub query_timeout_ms: u64,
    /// Total attempts for the structured query.
    pub query_attempts: u32,
    /// Max memoized (entity, property) results. 0 disables the cache.
    pub claim_cache_capacity: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CitationConfig {
    /// Base of the citation endpoint; the escaped source URL is appended.
    pub endpoint: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Page listing the configuration pages to process.
    pub index_page: String,
    pub edit_summary: String,
    pub user_agent: String,
}

// ============================================================
// Defaults
// ============================================================

impl Default for WikidataConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::Query,
            entity_data_url: "https://www.wikidata.org/wiki/Special:EntityData".into(),
            sparql_url: "https://query.wikidata.org/sparql".into(),
            query_timeout_ms: 1_500,
            query_attempts: 3,
            claim_cache_capacity: 1_024,
        }
    }
}

impl Default for CitationConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://en.wikipedia.org/api/rest_v1/data/citation/mediawiki".into(),
        }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            index_page: "User:Yapperbot/Wikidatable.json".into(),
            edit_summary: "Updating Wikidatatable from template".into(),
            user_agent: format!("Wikidatable/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

// ============================================================
// Loading
// ============================================================

impl BotConfig {
    /// Load config from a TOML file, falling back to defaults.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => {
                    tracing::info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {}, using defaults", path.display(), e);
                    Self::default()
                }
            },
            Err(_) => {
                tracing::info!("No config at {}, using defaults", path.display());
                Self::default()
            }
        }
    }

    /// Write the current config as TOML (for generating a default config file).
    pub fn to_toml(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_default()
    }
}
