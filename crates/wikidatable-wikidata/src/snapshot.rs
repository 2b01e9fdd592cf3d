//! Bulk-snapshot strategy: fetch the whole entity document once per run and
//! read claims out of it.
//!
//! Claims are not ranked here. The last statement for the property and the
//! last reference block on it are taken as-is.

use crate::cache::SnapshotCache;
use crate::dates::normalize_display;
use crate::source::{parse_amount, validate_ids, ReferenceSource, ResolutionError, ResolveResult};
use crate::types::{first_snak, EntityDataResponse, EntityDocument, ReferenceBlock, Statement};
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use tracing::{debug, error};
use wikidatable_core::{non_empty, EntityId, PropertyId, Reference, ResolvedClaim};

const ENTITY_DATA_URL: &str = "https://www.wikidata.org/wiki/Special:EntityData";

/// Reference slots, first present wins.
const URL_PROPERTIES: &[&str] = &["P854", "P1065", "P856"];
const RETRIEVED_PROPERTY: &str = "P813";
const PUBLISHED_PROPERTY: &str = "P577";
const TITLE_PROPERTY: &str = "P1476";
/// Point-in-time qualifier on the statement itself.
const POINT_IN_TIME_QUALIFIER: &str = "P585";

pub struct SnapshotSource {
    client: Client,
    base_url: String,
    cache: Arc<SnapshotCache>,
}

impl SnapshotSource {
    pub fn new(cache: Arc<SnapshotCache>) -> Self {
        Self {
            client: Client::new(),
            base_url: ENTITY_DATA_URL.to_string(),
            cache,
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    /// Cached document, or fetch and cache it.
    pub async fn entity(&self, id: &EntityId) -> ResolveResult<Arc<EntityDocument>> {
        if let Some(doc) = self.cache.get(id) {
            debug!("Snapshot cache hit: {}", id);
            return Ok(doc);
        }

        let url = format!("{}/{}.json", self.base_url.trim_end_matches('/'), id);
        debug!("Fetching entity snapshot: {}", url);

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("Entity data error {} for {}: {}", status, id, error_text);
            return Err(ResolutionError::RequestFailed(format!("{}: {}", status, error_text)));
        }

        let body: EntityDataResponse = response
            .json()
            .await
            .map_err(|e| ResolutionError::InvalidResponse(e.to_string()))?;
        let doc = select_entity(body, id)?;
        Ok(self.cache.insert(id.clone(), Arc::new(doc)))
    }
}

#[async_trait]
impl ReferenceSource for SnapshotSource {
    fn name(&self) -> &str {
        "snapshot"
    }

    async fn resolve(&self, entity: &EntityId, property: &PropertyId) -> ResolveResult<ResolvedClaim> {
        validate_ids(entity, property)?;
        let doc = self.entity(entity).await?;
        claim_from_document(&doc, entity, property)
    }
}

/// Redirected ids come back keyed by their target, so a lone entity is
/// accepted under any key.
fn select_entity(mut body: EntityDataResponse, id: &EntityId) -> ResolveResult<EntityDocument> {
    if let Some(doc) = body.entities.remove(id.as_str()) {
        return Ok(doc);
    }
    if body.entities.len() == 1 {
        if let Some((_, doc)) = body.entities.into_iter().next() {
            return Ok(doc);
        }
    }
    Err(ResolutionError::MissingEntity(id.clone()))
}

/// Reads the last `property` statement of a document.
pub fn claim_from_document(
    doc: &EntityDocument,
    entity: &EntityId,
    property: &PropertyId,
) -> ResolveResult<ResolvedClaim> {
    let statement = doc
        .claims
        .get(property.as_str())
        .and_then(|statements| statements.last())
        .ok_or_else(|| ResolutionError::MissingClaim {
            entity: entity.clone(),
            property: property.clone(),
        })?;

    let amount = statement
        .mainsnak
        .amount()
        .ok_or_else(|| ResolutionError::invalid_amount(property, ""))?;
    let value = parse_amount(property, amount)?;

    let reference = statement
        .references
        .last()
        .map(|block| reference_from_block(block, statement))
        .filter(|reference| !reference.is_empty());

    Ok(ResolvedClaim::new(value, reference))
}

fn reference_from_block(block: &ReferenceBlock, statement: &Statement) -> Reference {
    let url = URL_PROPERTIES
        .iter()
        .find_map(|p| {
            first_snak(&block.snaks, p)
                .and_then(|s| s.string())
                .filter(|url| !url.is_empty())
        })
        .map(str::to_string);

    let date = |property: &str| {
        first_snak(&block.snaks, property)
            .and_then(|s| s.time())
            .and_then(normalize_display)
    };

    let mut reference = Reference {
        url,
        title: first_snak(&block.snaks, TITLE_PROPERTY)
            .and_then(|s| s.text())
            .map(str::to_string)
            .and_then(non_empty),
        published: date(PUBLISHED_PROPERTY),
        retrieved: date(RETRIEVED_PROPERTY),
        ..Default::default()
    };

    // No publication date: the statement's point in time stands in for the
    // retrieval date.
    if reference.published.is_none() {
        if let Some(point_in_time) = first_snak(&statement.qualifiers, POINT_IN_TIME_QUALIFIER)
            .and_then(|s| s.time())
            .and_then(normalize_display)
        {
            reference.retrieved = Some(point_in_time);
        }
    }

    reference
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: serde_json::Value) -> EntityDocument {
        serde_json::from_value(value).unwrap()
    }

    fn quantity(amount: &str) -> serde_json::Value {
        json!({"datavalue": {"value": {"amount": amount, "unit": "1"}, "type": "quantity"}})
    }

    fn time(t: &str) -> serde_json::Value {
        json!({"datavalue": {"value": {"time": t, "precision": 11}, "type": "time"}})
    }

    #[test]
    fn takes_last_statement_and_last_reference() {
        let d = doc(json!({"claims": {"P1082": [
            {"mainsnak": quantity("+100"), "rank": "preferred"},
            {"mainsnak": quantity("+200"), "references": [
                {"snaks": {"P854": [{"datavalue": {"value": "http://old", "type": "string"}}]}},
                {"snaks": {
                    "P854": [{"datavalue": {"value": "http://new", "type": "string"}}],
                    "P577": [time("+2021-03-04T00:00:00Z")],
                    "P813": [time("+2022-00-00T00:00:00Z")]
                }}
            ]}
        ]}}));

        let claim = claim_from_document(&d, &"Q1".into(), &"P1082".into()).unwrap();
        assert_eq!(claim.value, 200.0);
        let r = claim.reference.unwrap();
        assert_eq!(r.url.as_deref(), Some("http://new"));
        assert_eq!(r.published.as_deref(), Some("2021-03-04"));
        assert_eq!(r.retrieved.as_deref(), Some("2022"));
    }

    #[test]
    fn point_in_time_qualifier_stands_in_for_retrieved() {
        let d = doc(json!({"claims": {"P1082": [{
            "mainsnak": quantity("+5"),
            "qualifiers": {"P585": [time("+2019-06-00T00:00:00Z")]},
            "references": [{"snaks": {"P854": [{"datavalue": {"value": "http://x", "type": "string"}}]}}]
        }]}}));
        let r = claim_from_document(&d, &"Q1".into(), &"P1082".into())
            .unwrap()
            .reference
            .unwrap();
        assert!(r.published.is_none());
        assert_eq!(r.retrieved.as_deref(), Some("June 2019"));
    }

    #[test]
    fn point_in_time_replaces_retrieved_when_unpublished() {
        let d = doc(json!({"claims": {"P1082": [{
            "mainsnak": quantity("+5"),
            "qualifiers": {"P585": [time("+2019-06-00T00:00:00Z")]},
            "references": [{"snaks": {
                "P854": [{"datavalue": {"value": "http://x", "type": "string"}}],
                "P813": [time("+2023-01-15T00:00:00Z")]
            }}]
        }]}}));
        let r = claim_from_document(&d, &"Q1".into(), &"P1082".into())
            .unwrap()
            .reference
            .unwrap();
        assert!(r.published.is_none());
        assert_eq!(r.retrieved.as_deref(), Some("June 2019"));
    }

    #[test]
    fn published_reference_keeps_its_retrieved_date() {
        let d = doc(json!({"claims": {"P1082": [{
            "mainsnak": quantity("+5"),
            "qualifiers": {"P585": [time("+2019-06-00T00:00:00Z")]},
            "references": [{"snaks": {
                "P577": [time("+2018-00-00T00:00:00Z")],
                "P813": [time("+2023-01-15T00:00:00Z")]
            }}]
        }]}}));
        let r = claim_from_document(&d, &"Q1".into(), &"P1082".into())
            .unwrap()
            .reference
            .unwrap();
        assert_eq!(r.published.as_deref(), Some("2018"));
        assert_eq!(r.retrieved.as_deref(), Some("2023-01-15"));
    }

    #[test]
    fn first_value_of_first_url_slot_wins() {
        let d = doc(json!({"claims": {"P1082": [{
            "mainsnak": quantity("+5"),
            "references": [{"snaks": {
                "P856": [{"datavalue": {"value": "http://official", "type": "string"}}],
                "P854": [
                    {"datavalue": {"value": "http://first", "type": "string"}},
                    {"datavalue": {"value": "http://second", "type": "string"}}
                ],
                "P577": [time("+2020-01-02T00:00:00Z"), time("+1999-00-00T00:00:00Z")]
            }}]
        }]}}));
        let r = claim_from_document(&d, &"Q1".into(), &"P1082".into())
            .unwrap()
            .reference
            .unwrap();
        assert_eq!(r.url.as_deref(), Some("http://first"));
        assert_eq!(r.published.as_deref(), Some("2020-01-02"));
    }

    #[test]
    fn archive_url_beats_official_website() {
        let d = doc(json!({"claims": {"P1082": [{
            "mainsnak": quantity("+5"),
            "references": [{"snaks": {
                "P856": [{"datavalue": {"value": "http://official", "type": "string"}}],
                "P1065": [{"datavalue": {"value": "http://archive", "type": "string"}}]
            }}]
        }]}}));
        let r = claim_from_document(&d, &"Q1".into(), &"P1082".into())
            .unwrap()
            .reference
            .unwrap();
        assert_eq!(r.url.as_deref(), Some("http://archive"));
    }

    #[test]
    fn empty_url_and_title_are_dropped() {
        let d = doc(json!({"claims": {"P1082": [{
            "mainsnak": quantity("+5"),
            "references": [{"snaks": {
                "P854": [{"datavalue": {"value": "", "type": "string"}}],
                "P1476": [{"datavalue": {"value": {"text": "", "language": "en"}, "type": "monolingualtext"}}],
                "P813": [time("+2023-01-15T00:00:00Z")]
            }}]
        }]}}));
        let r = claim_from_document(&d, &"Q1".into(), &"P1082".into())
            .unwrap()
            .reference
            .unwrap();
        assert!(r.url.is_none());
        assert!(r.title.is_none());
        assert_eq!(r.retrieved.as_deref(), Some("2023-01-15"));
    }

    #[test]
    fn statement_without_references_has_no_reference() {
        let d = doc(json!({"claims": {"P1082": [{"mainsnak": quantity("-0.5")}]}}));
        let claim = claim_from_document(&d, &"Q1".into(), &"P1082".into()).unwrap();
        assert_eq!(claim.value, -0.5);
        assert!(claim.reference.is_none());
    }

    #[test]
    fn missing_claim_is_an_error() {
        let d = doc(json!({"claims": {}}));
        let err = claim_from_document(&d, &"Q1".into(), &"P1082".into()).unwrap_err();
        assert!(matches!(err, ResolutionError::MissingClaim { .. }));
    }

    #[test]
    fn unparseable_amount_is_an_error() {
        let d = doc(json!({"claims": {"P1082": [{"mainsnak": quantity("lots")}]}}));
        let err = claim_from_document(&d, &"Q1".into(), &"P1082".into()).unwrap_err();
        assert!(matches!(err, ResolutionError::InvalidAmount { .. }));

        let d = doc(json!({"claims": {"P1082": [{"mainsnak": {"snaktype": "somevalue"}}]}}));
        let err = claim_from_document(&d, &"Q1".into(), &"P1082".into()).unwrap_err();
        assert!(matches!(err, ResolutionError::InvalidAmount { .. }));
    }

    #[test]
    fn redirected_entity_is_accepted() {
        let body: EntityDataResponse =
            serde_json::from_value(json!({"entities": {"Q2": {"claims": {}}}})).unwrap();
        assert!(select_entity(body, &"Q1".into()).is_ok());
    }
}
