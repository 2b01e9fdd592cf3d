//! Wikidatable Engine - Marker resolution and citation rendering

pub mod cite;
pub mod engine;
pub mod marker;

pub use cite::{render_citation, sanitize, CitationFormatter};
pub use engine::{MarkerError, Resolution, TemplateEngine};
pub use marker::{apply, format_value, scan, Marker, Substitution};
