//! Targeted-query strategy: one ranked SPARQL query per (entity, property).

use crate::dates::normalize_display;
use crate::source::{parse_amount, validate_ids, ReferenceSource, ResolutionError, ResolveResult};
use crate::types::{SparqlResponse, SparqlTerm};
use async_trait::async_trait;
use reqwest::Client;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};
use wikidatable_core::{EntityId, PropertyId, Reference, ResolvedClaim};

const SPARQL_URL: &str = "https://query.wikidata.org/sparql";
const DEFAULT_TIMEOUT: Duration = Duration::from_millis(1500);
const DEFAULT_ATTEMPTS: u32 = 3;
const RETRY_DELAY: Duration = Duration::from_millis(100);

/// All statements for the pair with optional reference data, preferred rank
/// first, then the most complete reference. Only the top row is used.
const LOOKUP_QUERY: &str = r#"SELECT ?val ?pointintime ?refLabel ?url ?retrieved ?published ?rank WHERE {
  wd:{entity} p:{property} ?statement.
  ?statement ps:{property} ?val;
    wikibase:rank ?rank.
  OPTIONAL { ?statement pq:P585 ?pointintime. }
  OPTIONAL {
    ?statement prov:wasDerivedFrom ?refnode.
    OPTIONAL { ?refnode pr:P248 ?ref. }
    OPTIONAL { ?refnode pr:P854|pr:P856|pr:P1065 ?url. }
    OPTIONAL { ?refnode pr:P577 ?published. }
    OPTIONAL { ?refnode pr:P813 ?retrieved. }
  }
  SERVICE wikibase:label { bd:serviceParam wikibase:language "en". }
}
ORDER BY DESC(?rank) DESC(?pointintime) DESC(?published) DESC(?retrieved) DESC(?url) DESC(?refLabel) LIMIT 1
"#;

type Row = HashMap<String, SparqlTerm>;

pub struct QuerySource {
    client: Client,
    endpoint: String,
    timeout: Duration,
    attempts: u32,
}

impl Default for QuerySource {
    fn default() -> Self {
        Self::new()
    }
}

impl QuerySource {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            endpoint: SPARQL_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            attempts: DEFAULT_ATTEMPTS,
        }
    }

    pub fn with_endpoint(mut self, url: impl Into<String>) -> Self {
        self.endpoint = url.into();
        self
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts.max(1);
        self
    }

    async fn run_query(&self, query: &str) -> ResolveResult<Vec<Row>> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("query", query), ("format", "json")])
            .header("accept", "application/sparql-results+json")
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ResolutionError::RequestFailed(format!("{}: {}", status, error_text)));
        }

        let body: SparqlResponse = response
            .json()
            .await
            .map_err(|e| ResolutionError::InvalidResponse(e.to_string()))?;
        Ok(body.results.bindings)
    }

    /// Runs the query up to `attempts` times, backing off between tries.
    async fn query_with_retry(&self, query: &str) -> ResolveResult<Vec<Row>> {
        let mut last_err = String::new();
        for attempt in 1..=self.attempts {
            match self.run_query(query).await {
                Ok(rows) => return Ok(rows),
                Err(e) => {
                    last_err = e.to_string();
                    if attempt < self.attempts {
                        let delay = RETRY_DELAY * 2u32.pow(attempt - 1);
                        warn!(
                            "SPARQL query failed (attempt {}), retrying in {}ms: {}",
                            attempt,
                            delay.as_millis(),
                            last_err
                        );
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }
        Err(ResolutionError::RetriesExhausted {
            attempts: self.attempts,
            message: last_err,
        })
    }
}

#[async_trait]
impl ReferenceSource for QuerySource {
    fn name(&self) -> &str {
        "query"
    }

    async fn resolve(&self, entity: &EntityId, property: &PropertyId) -> ResolveResult<ResolvedClaim> {
        validate_ids(entity, property)?;
        let query = lookup_query(entity, property);
        debug!("SPARQL lookup: {} {}", entity, property);

        let rows = self.query_with_retry(&query).await?;
        let row = rows.first().ok_or_else(|| ResolutionError::NoSolutions {
            entity: entity.clone(),
            property: property.clone(),
        })?;
        claim_from_row(row, property)
    }
}

/// Query text for one (entity, property) pair. Ids must already be validated.
pub fn lookup_query(entity: &EntityId, property: &PropertyId) -> String {
    LOOKUP_QUERY
        .replace("{entity}", entity.as_str())
        .replace("{property}", property.as_str())
}

/// Builds the claim from the top result row.
pub fn claim_from_row(row: &Row, property: &PropertyId) -> ResolveResult<ResolvedClaim> {
    let amount = bound(row, "val").ok_or_else(|| ResolutionError::invalid_amount(property, ""))?;
    let value = parse_amount(property, amount)?;

    let title = bound(row, "refLabel").map(str::to_string);
    let url = bound(row, "url").map(str::to_string);
    if title.is_none() && url.is_none() {
        return Ok(ResolvedClaim::new(value, None));
    }

    let published = date(row, "published").or_else(|| date(row, "pointintime"));
    let reference = Reference {
        url,
        title,
        published,
        retrieved: date(row, "retrieved"),
        ..Default::default()
    };
    Ok(ResolvedClaim::new(value, Some(reference)))
}

fn bound<'a>(row: &'a Row, var: &str) -> Option<&'a str> {
    row.get(var)
        .map(|term| term.value.as_str())
        .filter(|v| !v.is_empty())
}

/// SPARQL serializes xsd:dateTime without the leading sign Wikibase uses.
fn date(row: &Row, var: &str) -> Option<String> {
    let raw = bound(row, var)?;
    if raw.starts_with('+') || raw.starts_with('-') {
        normalize_display(raw)
    } else {
        normalize_display(&format!("+{}", raw))
    }
}
