//! Wire types for the entity-data, SPARQL and citation endpoints

use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

// ============================================================
// Entity data (Special:EntityData/{id}.json)
// ============================================================

#[derive(Debug, Deserialize)]
pub struct EntityDataResponse {
    pub entities: HashMap<String, EntityDocument>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct EntityDocument {
    #[serde(default)]
    pub claims: HashMap<String, Vec<Statement>>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Statement {
    pub mainsnak: Snak,
    #[serde(default)]
    pub rank: Option<String>,
    #[serde(default)]
    pub qualifiers: HashMap<String, Vec<Snak>>,
    #[serde(default)]
    pub references: Vec<ReferenceBlock>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ReferenceBlock {
    #[serde(default)]
    pub snaks: HashMap<String, Vec<Snak>>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Snak {
    #[serde(default)]
    pub datavalue: Option<DataValue>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct DataValue {
    pub value: Value,
}

impl Snak {
    fn value(&self) -> Option<&Value> {
        self.datavalue.as_ref().map(|dv| &dv.value)
    }

    /// `value.amount` of a quantity snak.
    pub fn amount(&self) -> Option<&str> {
        self.value()?.get("amount")?.as_str()
    }

    /// `value.time` of a time snak.
    pub fn time(&self) -> Option<&str> {
        self.value()?.get("time")?.as_str()
    }

    /// Plain string value (urls, external ids).
    pub fn string(&self) -> Option<&str> {
        self.value()?.as_str()
    }

    /// `value.text` of a monolingual-text snak.
    pub fn text(&self) -> Option<&str> {
        self.value()?.get("text")?.as_str()
    }
}

/// First snak for `property` in a snak map.
pub fn first_snak<'a>(snaks: &'a HashMap<String, Vec<Snak>>, property: &str) -> Option<&'a Snak> {
    snaks.get(property)?.first()
}

// ============================================================
// SPARQL JSON results
// ============================================================

#[derive(Debug, Deserialize)]
pub struct SparqlResponse {
    pub results: SparqlResults,
}

#[derive(Debug, Deserialize)]
pub struct SparqlResults {
    #[serde(default)]
    pub bindings: Vec<HashMap<String, SparqlTerm>>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct SparqlTerm {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
    #[serde(default)]
    pub datatype: Option<String>,
}

// ============================================================
// Citation metadata
// ============================================================

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CitationRecord {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub website_title: Option<String>,
}
