//! Wikidatable - keeps wiki tables in sync with Wikidata.
//!
//! The library half of the `wikidatable` binary: page storage and the
//! per-configuration run loop. Resolution itself lives in the workspace crates.

pub mod runner;
pub mod store;

pub use runner::{build_engine, ConfigReport, RunReport, Runner};
pub use store::{FsPageStore, PageStore};
