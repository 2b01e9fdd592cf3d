//! Run-scoped memoization.
//!
//! Every cache here lives for one bot run and never evicts. Entries are
//! write-once: the first value stored for a key is the one every later
//! caller sees.

use crate::source::{ReferenceSource, ResolveResult};
use crate::types::EntityDocument;
use crate::citation::CitationMetadata;
use async_trait::async_trait;
use dashmap::DashMap;
use std::borrow::Borrow;
use std::hash::Hash;
use std::sync::Arc;
use tracing::debug;
use wikidatable_core::{EntityId, PropertyId, ResolvedClaim};

/// Entity id -> full entity document.
pub type SnapshotCache = RunCache<EntityId, Arc<EntityDocument>>;

/// Source URL -> citation metadata (possibly empty).
pub type CitationCache = RunCache<String, CitationMetadata>;

pub struct RunCache<K, V> {
    entries: DashMap<K, V>,
    capacity: Option<usize>,
}

impl<K: Eq + Hash, V: Clone> Default for RunCache<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Eq + Hash, V: Clone> RunCache<K, V> {
    pub fn new() -> Self {
        Self { entries: DashMap::new(), capacity: None }
    }

    /// Stops storing new keys once `capacity` entries exist.
    pub fn bounded(capacity: usize) -> Self {
        Self { entries: DashMap::new(), capacity: Some(capacity) }
    }

    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    /// Stores `value` unless the key is already present, and returns whatever
    /// is stored for the key afterwards. When the cache is full the value is
    /// handed back without being stored.
    pub fn insert(&self, key: K, value: V) -> V {
        if let Some(limit) = self.capacity {
            if self.entries.len() >= limit && !self.entries.contains_key(&key) {
                return value;
            }
        }
        self.entries.entry(key).or_insert(value).value().clone()
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Memoizes successful lookups of any [`ReferenceSource`] by (entity, property).
pub struct CachingSource<S> {
    inner: S,
    cache: RunCache<(EntityId, PropertyId), ResolvedClaim>,
}

impl<S: ReferenceSource> CachingSource<S> {
    pub fn new(inner: S, capacity: usize) -> Self {
        Self {
            inner,
            cache: RunCache::bounded(capacity),
        }
    }

    pub fn cached(&self) -> usize {
        self.cache.len()
    }
}

#[async_trait]
impl<S: ReferenceSource> ReferenceSource for CachingSource<S> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn resolve(&self, entity: &EntityId, property: &PropertyId) -> ResolveResult<ResolvedClaim> {
        let key = (entity.clone(), property.clone());
        if let Some(hit) = self.cache.get(&key) {
            debug!("Claim cache hit: {} {}", entity, property);
            return Ok(hit);
        }
        let claim = self.inner.resolve(entity, property).await?;
        Ok(self.cache.insert(key, claim))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_insert_wins() {
        let cache: RunCache<String, u32> = RunCache::new();
        assert_eq!(cache.insert("a".into(), 1), 1);
        assert_eq!(cache.insert("a".into(), 2), 1);
        assert_eq!(cache.get("a"), Some(1));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn bounded_cache_stops_storing() {
        let cache: RunCache<u32, u32> = RunCache::bounded(2);
        cache.insert(1, 10);
        cache.insert(2, 20);
        assert_eq!(cache.insert(3, 30), 30);
        assert!(!cache.contains_key(&3));
        assert_eq!(cache.len(), 2);
        // existing keys still answer from the cache
        assert_eq!(cache.insert(1, 99), 10);
    }
}
