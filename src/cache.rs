//! TTL cache for single-entity lookups, injected as a gateway decorator.

use async_trait::async_trait;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

use crate::gateway::{LookupError, LookupGateway};
use crate::models::{PersonBiography, PersonId, PersonSummary, WorkId, WorkSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Work,
    Credits,
    Person,
    PersonWorks,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub kind: EntityKind,
    pub id: i32,
}

impl CacheKey {
    pub fn new(kind: EntityKind, id: i32) -> Self {
        Self { kind, id }
    }
}

#[derive(Debug)]
struct Entry<V> {
    stored_at: Instant,
    value: V,
}

#[derive(Debug)]
pub struct TtlCache<K, V> {
    ttl: Duration,
    max_entries: usize,
    entries: Mutex<HashMap<K, Entry<V>>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            ttl,
            max_entries,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.ttl.is_zero() && self.max_entries > 0
    }

    pub async fn get(&self, key: &K) -> Option<V> {
        if !self.is_enabled() {
            return None;
        }
        let mut guard = self.entries.lock().await;
        let fresh = guard
            .get(key)
            .map(|e| e.stored_at.elapsed() < self.ttl)?;
        if fresh {
            guard.get(key).map(|e| e.value.clone())
        } else {
            guard.remove(key);
            None
        }
    }

    pub async fn insert(&self, key: K, value: V) {
        if !self.is_enabled() {
            return;
        }
        let ttl = self.ttl;
        let mut guard = self.entries.lock().await;
        guard.retain(|_, e| e.stored_at.elapsed() < ttl);
        if guard.len() >= self.max_entries {
            guard.clear();
        }
        guard.insert(
            key,
            Entry {
                stored_at: Instant::now(),
                value,
            },
        );
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[derive(Debug, Clone)]
enum Cached {
    Work(Option<WorkSummary>),
    Credits(Vec<PersonSummary>),
    Person(PersonBiography),
    PersonWorks(Vec<WorkSummary>),
}

/// Wraps another gateway and remembers successful single-entity lookups.
/// Searches and failures always go upstream.
pub struct CachedGateway<G> {
    inner: G,
    cache: TtlCache<CacheKey, Cached>,
}

impl<G: LookupGateway> CachedGateway<G> {
    pub fn new(inner: G, ttl: Duration, max_entries: usize) -> Self {
        Self {
            inner,
            cache: TtlCache::new(ttl, max_entries),
        }
    }

    pub fn into_shared(self) -> Arc<dyn LookupGateway>
    where
        G: 'static,
    {
        Arc::new(self)
    }

    pub fn inner(&self) -> &G {
        &self.inner
    }

    async fn lookup(&self, key: CacheKey) -> Option<Cached> {
        let hit = self.cache.get(&key).await;
        if hit.is_some() {
            debug!(kind = ?key.kind, id = key.id, "cache hit");
        }
        hit
    }
}

#[async_trait]
impl<G: LookupGateway> LookupGateway for CachedGateway<G> {
    async fn search_works(&self, query: &str) -> Result<Vec<WorkSummary>, LookupError> {
        self.inner.search_works(query).await
    }

    async fn search_people(&self, query: &str) -> Result<Vec<PersonSummary>, LookupError> {
        self.inner.search_people(query).await
    }

    async fn get_work(&self, id: WorkId) -> Result<Option<WorkSummary>, LookupError> {
        let key = CacheKey::new(EntityKind::Work, id);
        if let Some(Cached::Work(work)) = self.lookup(key).await {
            return Ok(work);
        }
        let work = self.inner.get_work(id).await?;
        self.cache.insert(key, Cached::Work(work.clone())).await;
        Ok(work)
    }

    async fn get_people_for_work(&self, id: WorkId) -> Result<Vec<PersonSummary>, LookupError> {
        let key = CacheKey::new(EntityKind::Credits, id);
        if let Some(Cached::Credits(people)) = self.lookup(key).await {
            return Ok(people);
        }
        let people = self.inner.get_people_for_work(id).await?;
        self.cache.insert(key, Cached::Credits(people.clone())).await;
        Ok(people)
    }

    async fn get_person(&self, id: PersonId) -> Result<PersonBiography, LookupError> {
        let key = CacheKey::new(EntityKind::Person, id);
        if let Some(Cached::Person(bio)) = self.lookup(key).await {
            return Ok(bio);
        }
        let bio = self.inner.get_person(id).await?;
        self.cache.insert(key, Cached::Person(bio.clone())).await;
        Ok(bio)
    }

    async fn get_works_for_person(&self, id: PersonId) -> Result<Vec<WorkSummary>, LookupError> {
        let key = CacheKey::new(EntityKind::PersonWorks, id);
        if let Some(Cached::PersonWorks(works)) = self.lookup(key).await {
            return Ok(works);
        }
        let works = self.inner.get_works_for_person(id).await?;
        self.cache.insert(key, Cached::PersonWorks(works.clone())).await;
        Ok(works)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn entries_expire_after_ttl() {
        let cache: TtlCache<CacheKey, u32> = TtlCache::new(Duration::from_secs(10), 100);
        let key = CacheKey::new(EntityKind::Person, 1);
        cache.insert(key, 5).await;
        assert_eq!(cache.get(&key).await, Some(5));

        tokio::time::advance(Duration::from_secs(11)).await;
        assert_eq!(cache.get(&key).await, None);
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn same_id_different_kind_is_a_different_key() {
        let cache: TtlCache<CacheKey, &'static str> = TtlCache::new(Duration::from_secs(60), 100);
        cache.insert(CacheKey::new(EntityKind::Work, 1), "work").await;
        cache.insert(CacheKey::new(EntityKind::Person, 1), "person").await;
        assert_eq!(cache.get(&CacheKey::new(EntityKind::Work, 1)).await, Some("work"));
        assert_eq!(cache.get(&CacheKey::new(EntityKind::Person, 1)).await, Some("person"));
    }

    #[tokio::test]
    async fn clears_when_full() {
        let cache: TtlCache<i32, i32> = TtlCache::new(Duration::from_secs(60), 2);
        cache.insert(1, 1).await;
        cache.insert(2, 2).await;
        cache.insert(3, 3).await;
        assert_eq!(cache.len().await, 1);
        assert_eq!(cache.get(&3).await, Some(3));
    }

    #[tokio::test]
    async fn zero_ttl_disables_caching() {
        let cache: TtlCache<i32, i32> = TtlCache::new(Duration::ZERO, 10);
        cache.insert(1, 1).await;
        assert_eq!(cache.get(&1).await, None);
        assert!(cache.is_empty().await);
    }
}
