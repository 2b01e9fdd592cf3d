//! The bot run: read the index page, then resolve and write each configured
//! table in turn.
//!
//! Per-configuration problems (missing fields, unreadable data or template
//! pages) skip that configuration. A failed write stops the whole run.

use crate::store::PageStore;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, info_span, warn, Instrument};
use wikidatable_core::{parse_data_map, BotConfig, ConfigurationDocument, Error, Result, Strategy};
use wikidatable_engine::{CitationFormatter, TemplateEngine};
use wikidatable_wikidata::{
    CachingSource, CitationCache, CitationMetadataResolver, CitoidClient, QuerySource, ReferenceSource,
    SnapshotCache, SnapshotSource,
};

/// What happened to one configuration.
#[derive(Debug, Clone)]
pub struct ConfigReport {
    pub config: String,
    pub output_title: String,
    pub resolved: usize,
    pub failed: usize,
    /// Final page text (what was written, or would have been on a dry run).
    pub body: String,
}

#[derive(Debug, Default)]
pub struct RunReport {
    pub processed: Vec<ConfigReport>,
    /// Skipped configurations with the reason.
    pub skipped: Vec<(String, Error)>,
}

impl RunReport {
    pub fn markers_resolved(&self) -> usize {
        self.processed.iter().map(|r| r.resolved).sum()
    }

    pub fn markers_failed(&self) -> usize {
        self.processed.iter().map(|r| r.failed).sum()
    }
}

pub struct Runner {
    store: Arc<dyn PageStore>,
    engine: TemplateEngine,
    index_page: String,
    edit_summary: String,
    dry_run: bool,
}

impl Runner {
    pub fn new(store: Arc<dyn PageStore>, engine: TemplateEngine, config: &BotConfig) -> Self {
        Self {
            store,
            engine,
            index_page: config.bot.index_page.clone(),
            edit_summary: config.bot.edit_summary.clone(),
            dry_run: false,
        }
    }

    /// Resolve everything but write nothing.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub async fn run(&self) -> Result<RunReport> {
        let configs = self.configurations().await?;
        info!("Processing {} configurations from {}", configs.len(), self.index_page);

        let mut report = RunReport::default();
        for config in configs {
            let span = info_span!("config", config = %config);
            match self.process(&config).instrument(span).await {
                Ok(done) => report.processed.push(done),
                Err(e) if e.is_fatal() => {
                    error!("Aborting run on config {}: {}", config, e);
                    return Err(e);
                }
                Err(e) => report.skipped.push((config, e)),
            }
        }

        info!(
            "Run complete: {} written, {} skipped, {} markers resolved, {} unresolved",
            report.processed.len(),
            report.skipped.len(),
            report.markers_resolved(),
            report.markers_failed()
        );
        Ok(report)
    }

    /// Titles listed under `configurations` on the index page.
    async fn configurations(&self) -> Result<Vec<String>> {
        let index = self.store.load_json(&self.index_page).await?;
        let list = index
            .get("configurations")
            .and_then(Value::as_array)
            .ok_or_else(|| Error::configuration(&self.index_page, "configurations"))?;
        Ok(list
            .iter()
            .filter_map(|v| match v.as_str() {
                Some(title) => Some(title.to_string()),
                None => {
                    warn!("Ignoring non-string configuration entry {} in {}", v, self.index_page);
                    None
                }
            })
            .collect())
    }

    /// Resolve one configuration and write its output page.
    ///
    /// Non-fatal failures are logged here once, naming what could not be
    /// loaded; the caller only records the skip.
    pub async fn process(&self, config: &str) -> Result<ConfigReport> {
        let raw = self
            .store
            .load_json(config)
            .await
            .map_err(|e| failed("configuration", config, e))?;
        let doc = ConfigurationDocument::from_value(config, &raw).map_err(|e| {
            let thing = match &e {
                Error::Configuration { field, .. } => field.clone(),
                _ => "configuration".to_string(),
            };
            failed(&thing, config, e)
        })?;

        let data_page = self
            .store
            .load_json(&doc.data)
            .await
            .map_err(|e| failed("data map", config, e))?;
        let data = parse_data_map(&doc.data, &data_page).map_err(|e| failed("data map", config, e))?;

        let template = self
            .store
            .fetch_wikitext(&doc.template)
            .await
            .map_err(|e| failed("template", config, e))?;

        let headings = doc.heading_map();
        let resolution = self.engine.resolve(config, &template, &headings, &data).await;
        let output_title = doc.output_title().to_string();

        if self.dry_run {
            info!("Dry run: not writing {}", output_title);
        } else {
            self.store
                .edit(&output_title, &resolution.body, &self.edit_summary)
                .await
                .map_err(|e| match e {
                    Error::Write { .. } => e,
                    other => Error::write(&output_title, other.to_string()),
                })?;
        }

        Ok(ConfigReport {
            config: config.to_string(),
            output_title,
            resolved: resolution.resolved.len(),
            failed: resolution.failures.len(),
            body: resolution.body,
        })
    }
}

fn failed(thing: &str, config: &str, e: Error) -> Error {
    warn!("Failed to get {} for config {}: {}", thing, config, e);
    e
}

/// Wire up the configured lookup strategy and citation service.
pub fn build_engine(config: &BotConfig) -> std::result::Result<TemplateEngine, reqwest::Error> {
    let client = reqwest::Client::builder()
        .user_agent(config.bot.user_agent.clone())
        .build()?;

    let wikidata = &config.wikidata;
    let source: Arc<dyn ReferenceSource> = match wikidata.strategy {
        Strategy::Snapshot => {
            let inner = SnapshotSource::new(Arc::new(SnapshotCache::new()))
                .with_client(client.clone())
                .with_base_url(wikidata.entity_data_url.clone());
            with_claim_cache(inner, wikidata.claim_cache_capacity)
        }
        Strategy::Query => {
            let inner = QuerySource::new()
                .with_client(client.clone())
                .with_endpoint(wikidata.sparql_url.clone())
                .with_timeout(Duration::from_millis(wikidata.query_timeout_ms))
                .with_attempts(wikidata.query_attempts);
            with_claim_cache(inner, wikidata.claim_cache_capacity)
        }
    };
    info!("Resolving claims with the {} strategy", source.name());

    let citoid = CitoidClient::new()
        .with_client(client)
        .with_endpoint(config.citation.endpoint.clone());
    let metadata = CitationMetadataResolver::new(Arc::new(citoid), Arc::new(CitationCache::new()));

    Ok(TemplateEngine::new(source, CitationFormatter::new(metadata)))
}

fn with_claim_cache<S: ReferenceSource + 'static>(inner: S, capacity: usize) -> Arc<dyn ReferenceSource> {
    if capacity == 0 {
        Arc::new(inner)
    } else {
        Arc::new(CachingSource::new(inner, capacity))
    }
}
