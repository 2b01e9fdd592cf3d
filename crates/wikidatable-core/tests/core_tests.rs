//! Tests for wikidatable-core: identifiers, references, headings, config, errors

use wikidatable_core::*;

// ===========================================================================
// Identifiers
// ===========================================================================

#[test]
fn entity_id_new_and_display() {
    let id = EntityId::new("Q145");
    assert_eq!(id.as_str(), "Q145");
    assert_eq!(format!("{}", id), "Q145");
}

#[test]
fn entity_id_validation() {
    assert!(EntityId::from("Q1").is_valid());
    assert!(EntityId::from("Q123456").is_valid());
    assert!(!EntityId::from("Q").is_valid());
    assert!(!EntityId::from("P31").is_valid());
    assert!(!EntityId::from("Q1 . ?s ?p ?o").is_valid());
    assert!(!EntityId::from("").is_valid());
}

#[test]
fn property_id_validation() {
    assert!(PropertyId::from("P1082").is_valid());
    assert!(!PropertyId::from("p1082").is_valid());
    assert!(!PropertyId::from("Q5").is_valid());
}

#[test]
fn property_id_serializes_transparently() {
    let json = serde_json::to_string(&PropertyId::new("P585")).unwrap();
    assert_eq!(json, r#""P585""#);
}

#[test]
fn entity_id_deserializes_from_plain_string() {
    let ids: Vec<EntityId> = serde_json::from_str(r#"["Q145", "Q142"]"#).unwrap();
    assert_eq!(ids, vec![EntityId::new("Q145"), EntityId::new("Q142")]);
    assert_eq!(serde_json::to_value(&ids[0]).unwrap(), serde_json::json!("Q145"));
}

// ===========================================================================
// Reference
// ===========================================================================

#[test]
fn reference_builders_drop_empty_strings() {
    let r = Reference::default()
        .with_url("http://example.org")
        .with_title("")
        .with_published("2020-01-01");
    assert_eq!(r.url.as_deref(), Some("http://example.org"));
    assert!(r.title.is_none());
    assert_eq!(r.published.as_deref(), Some("2020-01-01"));
    assert!(!r.is_empty());
}

#[test]
fn reference_default_is_empty() {
    assert!(Reference::default().is_empty());
    assert!(!Reference::default().has_metadata());
}

#[test]
fn reference_has_metadata_needs_all_three() {
    let mut r = Reference::default().with_title("Census");
    r.language = Some("en".into());
    assert!(!r.has_metadata());
    r.website = Some("ONS".into());
    assert!(r.has_metadata());
}

// ===========================================================================
// HeadingConfig
// ===========================================================================

#[test]
fn heading_config_deserializes_optional_per() {
    let h: HeadingConfig = serde_json::from_str(r#"{"data":"P1082"}"#).unwrap();
    assert_eq!(h, HeadingConfig::single("P1082"));
    assert!(!h.is_ratio());

    let h: HeadingConfig = serde_json::from_str(r#"{"data":"P1082","per":"P2046"}"#).unwrap();
    assert_eq!(h, HeadingConfig::ratio("P1082", "P2046"));
    assert!(h.is_ratio());
}

// ===========================================================================
// BotConfig
// ===========================================================================

#[test]
fn bot_config_defaults() {
    let config = BotConfig::default();
    assert_eq!(config.wikidata.strategy, Strategy::Query);
    assert_eq!(config.wikidata.query_timeout_ms, 1500);
    assert_eq!(config.wikidata.query_attempts, 3);
    assert_eq!(config.bot.index_page, "User:Yapperbot/Wikidatable.json");
    assert!(config.citation.endpoint.ends_with("/citation/mediawiki"));
}

#[test]
fn bot_config_partial_toml_keeps_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wikidatable.toml");
    std::fs::write(
        &path,
        "[wikidata]\nstrategy = \"snapshot\"\nquery_attempts = 5\n",
    )
    .unwrap();

    let config = BotConfig::load(&path);
    assert_eq!(config.wikidata.strategy, Strategy::Snapshot);
    assert_eq!(config.wikidata.query_attempts, 5);
    assert_eq!(config.wikidata.query_timeout_ms, 1500);
    assert_eq!(config.bot.edit_summary, "Updating Wikidatatable from template");
}

#[test]
fn bot_config_missing_file_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = BotConfig::load(&dir.path().join("absent.toml"));
    assert_eq!(config.wikidata.claim_cache_capacity, 1024);
}

#[test]
fn bot_config_malformed_file_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    std::fs::write(&path, "[wikidata\nstrategy = ").unwrap();
    let config = BotConfig::load(&path);
    assert_eq!(config.wikidata.strategy, Strategy::Query);
}

#[test]
fn bot_config_toml_roundtrip() {
    let toml_text = BotConfig::default().to_toml();
    assert!(toml_text.contains("strategy = \"query\""));
    let back: BotConfig = toml::from_str(&toml_text).unwrap();
    assert_eq!(back.wikidata.sparql_url, "https://query.wikidata.org/sparql");
}

#[test]
fn strategy_from_str() {
    assert_eq!("snapshot".parse::<Strategy>().unwrap(), Strategy::Snapshot);
    assert_eq!("SPARQL".parse::<Strategy>().unwrap(), Strategy::Query);
    assert!("bulk".parse::<Strategy>().is_err());
}

// ===========================================================================
// Error
// ===========================================================================

#[test]
fn error_display() {
    let e = Error::configuration("C.json", "template");
    assert_eq!(e.to_string(), "missing template in configuration C.json");

    let e = Error::write("Page", "protected");
    assert_eq!(e.to_string(), "write failed for Page: protected");
}

#[test]
fn only_write_errors_are_fatal() {
    assert!(Error::write("Page", "x").is_fatal());
    assert!(!Error::configuration("C", "data").is_fatal());
    assert!(!Error::PageNotFound("T".into()).is_fatal());
}
