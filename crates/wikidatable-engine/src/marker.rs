//! Marker scanning and substitution.
//!
//! Values go where `<!-- DATASLOT:heading:key -->` sits; citations where the
//! matching `<!-- REFSLOT:heading:key -->` sits. Scanning and substitution are
//! separate passes so substitution stays a pure string transform.

use regex::{NoExpand, Regex, RegexBuilder};
use std::sync::OnceLock;

const DATASLOT_PATTERN: &str = r"(?i)<!-- *DATASLOT:([^:]+?):([^:]+?) *-->";

fn dataslot_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(DATASLOT_PATTERN).expect("dataslot pattern is valid"))
}

/// One DATASLOT occurrence.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Marker {
    /// Exact matched text, used as the replacement anchor.
    pub raw: String,
    pub heading: String,
    pub data_key: String,
}

/// A marker with its final value and, when a reference was found, the
/// citation to put in its REFSLOT.
#[derive(Clone, Debug, PartialEq)]
pub struct Substitution {
    pub marker: Marker,
    pub value: f64,
    pub citation: Option<String>,
}

/// All DATASLOT markers in scan order, duplicates included.
pub fn scan(body: &str) -> Vec<Marker> {
    dataslot_regex()
        .captures_iter(body)
        .map(|caps| Marker {
            raw: caps[0].to_string(),
            heading: caps[1].to_string(),
            data_key: caps[2].to_string(),
        })
        .collect()
}

/// Matches the REFSLOT for one (heading, data key) pair, keys taken literally.
pub fn refslot_regex(heading: &str, data_key: &str) -> Result<Regex, regex::Error> {
    let pattern = format!(
        r"<!-- *REFSLOT:{}:{} *-->",
        regex::escape(heading),
        regex::escape(data_key)
    );
    RegexBuilder::new(&pattern).case_insensitive(true).build()
}

/// Fixed point with ten decimal places.
pub fn format_value(value: f64) -> String {
    format!("{:.10}", value)
}

/// Applies substitutions in order. For each one the REFSLOT is filled first
/// (if there is a citation), then every occurrence of the marker text is
/// replaced by the value.
pub fn apply(body: &str, substitutions: &[Substitution]) -> String {
    let mut text = body.to_string();
    for sub in substitutions {
        if let Some(citation) = &sub.citation {
            match refslot_regex(&sub.marker.heading, &sub.marker.data_key) {
                Ok(re) => {
                    text = re.replace_all(&text, NoExpand(citation)).into_owned();
                }
                Err(e) => {
                    tracing::warn!("Failed to compile refslot pattern for {}: {}", sub.marker.raw, e);
                }
            }
        }
        text = text.replace(&sub.marker.raw, &format_value(sub.value));
    }
    text
}
