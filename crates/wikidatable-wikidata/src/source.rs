//! Reference source trait

use async_trait::async_trait;
use wikidatable_core::{EntityId, PropertyId, ResolvedClaim};

/// Result type for claim lookups
pub type ResolveResult<T> = Result<T, ResolutionError>;

/// Claim lookup error types
#[derive(Debug, thiserror::Error)]
pub enum ResolutionError {
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("entity {0} missing from snapshot")]
    MissingEntity(EntityId),

    #[error("no {property} claim on {entity}")]
    MissingClaim { entity: EntityId, property: PropertyId },

    #[error("invalid amount for {property}: {value:?}")]
    InvalidAmount { property: PropertyId, value: String },

    #[error("no solutions found for {entity} {property}")]
    NoSolutions { entity: EntityId, property: PropertyId },

    #[error("query failed after {attempts} attempts: {message}")]
    RetriesExhausted { attempts: u32, message: String },

    #[error("request failed: {0}")]
    RequestFailed(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("network error: {0}")]
    NetworkError(#[from] reqwest::Error),
}

impl ResolutionError {
    pub fn invalid_amount(property: &PropertyId, value: impl Into<String>) -> Self {
        Self::InvalidAmount {
            property: property.clone(),
            value: value.into(),
        }
    }
}

/// Resolves the best value of one property on one entity, plus its reference.
///
/// Implemented by the snapshot and query strategies; tests supply in-memory
/// fakes.
#[async_trait]
pub trait ReferenceSource: Send + Sync {
    fn name(&self) -> &str;

    async fn resolve(&self, entity: &EntityId, property: &PropertyId) -> ResolveResult<ResolvedClaim>;
}

/// Rejects ids that would otherwise be spliced into a URL or query verbatim.
pub fn validate_ids(entity: &EntityId, property: &PropertyId) -> ResolveResult<()> {
    if !entity.is_valid() {
        return Err(ResolutionError::InvalidIdentifier(entity.to_string()));
    }
    if !property.is_valid() {
        return Err(ResolutionError::InvalidIdentifier(property.to_string()));
    }
    Ok(())
}

/// Parses a quantity amount (`+1234`, `-0.5`, `1234`).
pub fn parse_amount(property: &PropertyId, amount: &str) -> ResolveResult<f64> {
    amount
        .trim()
        .parse::<f64>()
        .map_err(|_| ResolutionError::invalid_amount(property, amount))
}
