//! Template resolution: scan markers, resolve each one against the reference
//! source, then substitute values and citations.
//!
//! Markers are resolved strictly in scan order. A failing marker is logged
//! and left in the output untouched; it never stops the pass.

use crate::cite::CitationFormatter;
use crate::marker::{apply, scan, Marker, Substitution};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};
use wikidatable_core::{DataMap, HeadingMap, PropertyId};
use wikidatable_wikidata::{ReferenceSource, ResolutionError};

#[derive(Debug, thiserror::Error)]
pub enum MarkerError {
    #[error("unknown heading {0}")]
    UnknownHeading(String),

    #[error("unknown data key {0}")]
    UnknownDataKey(String),

    #[error("no entity for {property} under data key {data_key}")]
    MissingEntity { data_key: String, property: PropertyId },

    #[error("{property} in {heading}: {source}")]
    Primary {
        heading: String,
        property: PropertyId,
        #[source]
        source: ResolutionError,
    },

    #[error("per property {property} in {heading}: {source}")]
    Secondary {
        heading: String,
        property: PropertyId,
        #[source]
        source: ResolutionError,
    },
}

/// Outcome of one template pass.
#[derive(Debug)]
pub struct Resolution {
    /// The template with every resolved marker substituted.
    pub body: String,
    /// Resolved markers, in scan order.
    pub resolved: Vec<Substitution>,
    /// Markers left unresolved, with why.
    pub failures: Vec<(Marker, MarkerError)>,
}

pub struct TemplateEngine {
    source: Arc<dyn ReferenceSource>,
    formatter: CitationFormatter,
}

impl TemplateEngine {
    pub fn new(source: Arc<dyn ReferenceSource>, formatter: CitationFormatter) -> Self {
        Self { source, formatter }
    }

    /// Resolves one template. `config` names the configuration in log lines.
    pub async fn resolve(
        &self,
        config: &str,
        body: &str,
        headings: &HeadingMap,
        data: &DataMap,
    ) -> Resolution {
        let (resolved, failures) = self.plan(config, body, headings, data).await;
        Resolution {
            body: apply(body, &resolved),
            resolved,
            failures,
        }
    }

    /// First pass: resolve every distinct marker without touching the text.
    ///
    /// Identical marker text is resolved once (substitution replaces all
    /// occurrences). Once a data key or heading is known to be missing,
    /// later markers using it are skipped.
    pub async fn plan(
        &self,
        config: &str,
        body: &str,
        headings: &HeadingMap,
        data: &DataMap,
    ) -> (Vec<Substitution>, Vec<(Marker, MarkerError)>) {
        let mut done: HashSet<String> = HashSet::new();
        let mut failed_keys: HashSet<String> = HashSet::new();
        let mut failed_headings: HashSet<String> = HashSet::new();
        let mut resolved = Vec::new();
        let mut failures = Vec::new();

        for marker in scan(body) {
            if done.contains(&marker.raw)
                || failed_keys.contains(&marker.data_key)
                || failed_headings.contains(&marker.heading)
            {
                continue;
            }
            done.insert(marker.raw.clone());

            match self.resolve_marker(&marker, headings, data).await {
                Ok(sub) => {
                    debug!("Resolved {} = {}", marker.raw, sub.value);
                    resolved.push(sub);
                }
                Err(e) => {
                    warn!("Failed to get {} for config {}: {}", marker.raw, config, e);
                    match &e {
                        MarkerError::UnknownDataKey(key) => {
                            failed_keys.insert(key.clone());
                        }
                        MarkerError::UnknownHeading(heading) => {
                            failed_headings.insert(heading.clone());
                        }
                        _ => {}
                    }
                    failures.push((marker, e));
                }
            }
        }

        (resolved, failures)
    }

    async fn resolve_marker(
        &self,
        marker: &Marker,
        headings: &HeadingMap,
        data: &DataMap,
    ) -> Result<Substitution, MarkerError> {
        let heading = headings
            .get(&marker.heading)
            .ok_or_else(|| MarkerError::UnknownHeading(marker.heading.clone()))?;
        let entry = data
            .get(&marker.data_key)
            .ok_or_else(|| MarkerError::UnknownDataKey(marker.data_key.clone()))?;
        let entity = entry
            .get(heading.data.as_str())
            .ok_or_else(|| MarkerError::MissingEntity {
                data_key: marker.data_key.clone(),
                property: heading.data.clone(),
            })?;

        let primary = self
            .source
            .resolve(entity, &heading.data)
            .await
            .map_err(|source| MarkerError::Primary {
                heading: marker.heading.clone(),
                property: heading.data.clone(),
                source,
            })?;

        let (value, secondary_reference) = match &heading.per {
            Some(per) => {
                // The per property may live on its own entity; otherwise it is
                // read from the same entity as the primary value.
                let per_entity = entry.get(per.as_str()).unwrap_or(entity);
                let secondary = self
                    .source
                    .resolve(per_entity, per)
                    .await
                    .map_err(|source| MarkerError::Secondary {
                        heading: marker.heading.clone(),
                        property: per.clone(),
                        source,
                    })?;
                // Division by zero yields inf/NaN, rendered as-is.
                ((primary.value / secondary.value) * 100.0, secondary.reference)
            }
            None => (primary.value, None),
        };

        let citation = self
            .formatter
            .format(
                primary.reference.as_ref(),
                heading.is_ratio(),
                secondary_reference.as_ref(),
            )
            .await;

        Ok(Substitution {
            marker: marker.clone(),
            value,
            citation,
        })
    }
}
