//! Wikidatable Wikidata - Claim, reference and citation-metadata lookups

pub mod cache;
pub mod citation;
pub mod dates;
pub mod query;
pub mod snapshot;
pub mod source;
pub mod types;

pub use cache::{CachingSource, CitationCache, RunCache, SnapshotCache};
pub use citation::{CitationMetadata, CitationMetadataResolver, CitoidClient, MetadataLookupError, MetadataSource};
pub use dates::{normalize, DatePrecision, NormalizedDate};
pub use query::QuerySource;
pub use snapshot::SnapshotSource;
pub use source::{ReferenceSource, ResolutionError, ResolveResult};
