//! Versioned place-list cache.
//!
//! Default store: a JSON file at ~/.place_atlas/cache.json.
//! Keys: `{version}:{cities|states}:{normalized canonical country}`.
//! TTL: 7 days for cities, 30 days for divisions.
//! An entry is also rejected when it is empty, when a city list is too small
//! for its country (unless the country is exempt) or when it is larger than
//! the country's current limit. Division lists have no minimum size. Store
//! failures are logged and read as misses.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use super::types::{CanonicalCountry, CountryRules, PlaceError, PlaceKind, ResolutionResult, Result};

/// Bump to invalidate every entry written by an earlier release.
pub const CACHE_VERSION: &str = "v3";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub country_key: String,
    pub kind: PlaceKind,
    pub items: Vec<String>,
    /// Unix millis.
    pub written_at: i64,
    pub cache_version: String,
}

/// Time source for TTL checks.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> i64;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock(AtomicI64);

impl ManualClock {
    pub fn new(now_ms: i64) -> Self {
        Self(AtomicI64::new(now_ms))
    }

    pub fn set(&self, now_ms: i64) {
        self.0.store(now_ms, Ordering::SeqCst);
    }

    pub fn advance(&self, ms: i64) {
        self.0.fetch_add(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.0.load(Ordering::SeqCst)
    }
}

/// Raw key/value storage behind [`PlaceCache`].
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn read(&self, key: &str) -> Result<Option<CacheEntry>>;
    async fn write(&self, key: &str, entry: CacheEntry) -> Result<()>;
}

/// Process-local store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn read(&self, key: &str) -> Result<Option<CacheEntry>> {
        let entries = self
            .entries
            .lock()
            .map_err(|e| PlaceError::Config(format!("cache lock poisoned: {}", e)))?;
        Ok(entries.get(key).cloned())
    }

    async fn write(&self, key: &str, entry: CacheEntry) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| PlaceError::Config(format!("cache lock poisoned: {}", e)))?;
        entries.insert(key.to_string(), entry);
        Ok(())
    }
}

/// A store that never holds anything (`--no-cache`).
#[derive(Debug, Default, Clone, Copy)]
pub struct NullStore;

#[async_trait]
impl CacheStore for NullStore {
    async fn read(&self, _key: &str) -> Result<Option<CacheEntry>> {
        Ok(None)
    }

    async fn write(&self, _key: &str, _entry: CacheEntry) -> Result<()> {
        Ok(())
    }
}

/// JSON-file store. The whole map is kept in memory and rewritten on each put.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<HashMap<String, CacheEntry>>,
    /// Held across snapshot and disk write so the newest snapshot lands last.
    disk: tokio::sync::Mutex<()>,
}

impl FileStore {
    /// Load from the default location (~/.place_atlas/cache.json).
    pub fn load() -> Self {
        Self::load_from(Self::default_path())
    }

    /// Load from a specific path. Unreadable or corrupt files start empty.
    pub fn load_from(path: PathBuf) -> Self {
        let entries = Self::read_file(&path).unwrap_or_default();
        Self {
            path,
            entries: Mutex::new(entries),
            disk: tokio::sync::Mutex::new(()),
        }
    }

    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".place_atlas")
            .join("cache.json")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_file(path: &Path) -> Option<HashMap<String, CacheEntry>> {
        let data = fs::read_to_string(path).ok()?;
        match serde_json::from_str(&data) {
            Ok(entries) => Some(entries),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring corrupt cache file");
                None
            }
        }
    }
}

#[async_trait]
impl CacheStore for FileStore {
    async fn read(&self, key: &str) -> Result<Option<CacheEntry>> {
        let entries = self
            .entries
            .lock()
            .map_err(|e| PlaceError::Config(format!("cache lock poisoned: {}", e)))?;
        Ok(entries.get(key).cloned())
    }

    async fn write(&self, key: &str, entry: CacheEntry) -> Result<()> {
        let _disk = self.disk.lock().await;
        let json = {
            let mut entries = self
                .entries
                .lock()
                .map_err(|e| PlaceError::Config(format!("cache lock poisoned: {}", e)))?;
            entries.insert(key.to_string(), entry);
            serde_json::to_string_pretty(&*entries)?
        };
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.path, json).await?;
        Ok(())
    }
}

/// Validating front for a [`CacheStore`].
#[derive(Clone)]
pub struct PlaceCache {
    store: Arc<dyn CacheStore>,
    clock: Arc<dyn Clock>,
    version: String,
}

impl PlaceCache {
    pub fn new(store: Arc<dyn CacheStore>, clock: Arc<dyn Clock>, version: impl Into<String>) -> Self {
        Self {
            store,
            clock,
            version: version.into(),
        }
    }

    /// In-memory cache on the system clock.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()), Arc::new(SystemClock), CACHE_VERSION)
    }

    /// A cache that always misses.
    pub fn disabled() -> Self {
        Self::new(Arc::new(NullStore), Arc::new(SystemClock), CACHE_VERSION)
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn key(&self, country: &CanonicalCountry, kind: PlaceKind) -> String {
        format!("{}:{}:{}", self.version, kind.cache_tag(), country.key())
    }

    /// A trusted entry, or `None` on any miss, expiry, size violation or store error.
    pub async fn get(
        &self,
        country: &CanonicalCountry,
        kind: PlaceKind,
        rules: &CountryRules,
    ) -> Option<CacheEntry> {
        let key = self.key(country, kind);
        let entry = match self.store.read(&key).await {
            Ok(Some(entry)) => entry,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "cache read failed, treating as miss");
                return None;
            }
        };
        match self.rejection(&entry, kind, rules) {
            None => Some(entry),
            Some(reason) => {
                tracing::debug!(key = %key, reason, "cache entry rejected");
                None
            }
        }
    }

    /// Store a result. Failures are logged and otherwise ignored.
    pub async fn put(&self, country: &CanonicalCountry, result: &ResolutionResult) {
        let key = self.key(country, result.kind);
        let entry = CacheEntry {
            country_key: country.key(),
            kind: result.kind,
            items: result.items.clone(),
            written_at: self.clock.now_ms(),
            cache_version: self.version.clone(),
        };
        if let Err(e) = self.store.write(&key, entry).await {
            tracing::warn!(key = %key, error = %e, "cache write failed");
        }
    }

    fn rejection(&self, entry: &CacheEntry, kind: PlaceKind, rules: &CountryRules) -> Option<&'static str> {
        if entry.cache_version != self.version {
            Some("version mismatch")
        } else if entry.kind != kind {
            Some("kind mismatch")
        } else if self.clock.now_ms() - entry.written_at > kind.ttl_ms() {
            Some("expired")
        } else if entry.items.is_empty() {
            Some("empty")
        } else if kind == PlaceKind::Cities && entry.items.len() < rules.min_items {
            Some("below minimum size")
        } else if entry.items.len() > rules.limit {
            Some("exceeds current limit")
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::places::aliases::canonical_of;
    use tempfile::TempDir;

    const RULES: CountryRules = CountryRules { limit: 100, min_items: 30 };
    const DAY: i64 = 24 * 3600 * 1000;

    fn items(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("Place {:03}", i)).collect()
    }

    fn manual_cache() -> (PlaceCache, Arc<ManualClock>, Arc<MemoryStore>) {
        let clock = Arc::new(ManualClock::new(1_000_000));
        let store = Arc::new(MemoryStore::new());
        let cache = PlaceCache::new(store.clone(), clock.clone(), CACHE_VERSION);
        (cache, clock, store)
    }

    #[tokio::test]
    async fn test_put_get() {
        let (cache, _, _) = manual_cache();
        let sweden = canonical_of("Sweden");
        cache.put(&sweden, &ResolutionResult::cities(items(40))).await;

        let hit = cache.get(&sweden, PlaceKind::Cities, &RULES).await.unwrap();
        assert_eq!(hit.items.len(), 40);
        assert_eq!(hit.country_key, "sweden");
        assert!(cache.get(&sweden, PlaceKind::Divisions, &RULES).await.is_none());
    }

    #[tokio::test]
    async fn test_alias_shares_key() {
        let (cache, _, _) = manual_cache();
        cache.put(&canonical_of("USA"), &ResolutionResult::cities(items(50))).await;
        assert!(cache.get(&canonical_of("America"), PlaceKind::Cities, &RULES).await.is_some());
    }

    #[tokio::test]
    async fn test_key_layout() {
        let (cache, _, _) = manual_cache();
        assert_eq!(cache.key(&canonical_of("Türkiye"), PlaceKind::Divisions), "v3:states:turkey");
    }

    #[tokio::test]
    async fn test_ttl_per_kind() {
        let (cache, clock, _) = manual_cache();
        let c = canonical_of("Germany");
        cache.put(&c, &ResolutionResult::cities(items(40))).await;
        cache.put(&c, &ResolutionResult::divisions(items(40))).await;

        clock.advance(7 * DAY);
        assert!(cache.get(&c, PlaceKind::Cities, &RULES).await.is_some());
        clock.advance(1);
        assert!(cache.get(&c, PlaceKind::Cities, &RULES).await.is_none());
        assert!(cache.get(&c, PlaceKind::Divisions, &RULES).await.is_some());
        clock.advance(23 * DAY);
        assert!(cache.get(&c, PlaceKind::Divisions, &RULES).await.is_none());
    }

    #[tokio::test]
    async fn test_oversized_entry_is_miss() {
        let (cache, _, _) = manual_cache();
        let z = canonical_of("Z");
        cache.put(&z, &ResolutionResult::cities(items(150))).await;
        assert!(cache.get(&z, PlaceKind::Cities, &RULES).await.is_none());
        let relaxed = CountryRules { limit: 150, min_items: 30 };
        assert!(cache.get(&z, PlaceKind::Cities, &relaxed).await.is_some());
    }

    #[tokio::test]
    async fn test_undersized_entry_unless_exempt() {
        let (cache, _, _) = manual_cache();
        let c = canonical_of("Monaco");
        cache.put(&c, &ResolutionResult::cities(items(3))).await;
        assert!(cache.get(&c, PlaceKind::Cities, &RULES).await.is_none());
        let exempt = CountryRules { limit: 100, min_items: 1 };
        assert!(cache.get(&c, PlaceKind::Cities, &exempt).await.is_some());
    }

    #[tokio::test]
    async fn test_short_division_list_is_served() {
        let (cache, _, _) = manual_cache();
        let c = canonical_of("Germany");
        cache.put(&c, &ResolutionResult::divisions(items(16))).await;
        let hit = cache.get(&c, PlaceKind::Divisions, &RULES).await.unwrap();
        assert_eq!(hit.items.len(), 16);

        cache.put(&c, &ResolutionResult::divisions(Vec::new())).await;
        assert!(cache.get(&c, PlaceKind::Divisions, &RULES).await.is_none());
    }

    #[tokio::test]
    async fn test_version_bump_invalidates() {
        let clock = Arc::new(ManualClock::new(0));
        let store = Arc::new(MemoryStore::new());
        let old = PlaceCache::new(store.clone(), clock.clone(), "v2");
        let new = PlaceCache::new(store.clone(), clock.clone(), "v3");
        let c = canonical_of("France");
        old.put(&c, &ResolutionResult::cities(items(40))).await;
        assert!(old.get(&c, PlaceKind::Cities, &RULES).await.is_some());
        assert!(new.get(&c, PlaceKind::Cities, &RULES).await.is_none());
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_stale_version_under_current_key() {
        let (cache, _, store) = manual_cache();
        let c = canonical_of("Spain");
        let key = cache.key(&c, PlaceKind::Cities);
        store
            .write(&key, CacheEntry {
                country_key: c.key(),
                kind: PlaceKind::Cities,
                items: items(40),
                written_at: 1_000_000,
                cache_version: "v1".into(),
            })
            .await
            .unwrap();
        assert!(cache.get(&c, PlaceKind::Cities, &RULES).await.is_none());
    }

    struct BrokenStore;

    #[async_trait]
    impl CacheStore for BrokenStore {
        async fn read(&self, _key: &str) -> Result<Option<CacheEntry>> {
            Err(PlaceError::Io(std::io::Error::new(std::io::ErrorKind::Other, "unavailable")))
        }
        async fn write(&self, _key: &str, _entry: CacheEntry) -> Result<()> {
            Err(PlaceError::Io(std::io::Error::new(std::io::ErrorKind::Other, "quota exceeded")))
        }
    }

    #[tokio::test]
    async fn test_store_errors_swallowed() {
        let cache = PlaceCache::new(Arc::new(BrokenStore), Arc::new(SystemClock), CACHE_VERSION);
        let c = canonical_of("Italy");
        cache.put(&c, &ResolutionResult::cities(items(40))).await;
        assert!(cache.get(&c, PlaceKind::Cities, &RULES).await.is_none());
    }

    #[tokio::test]
    async fn test_file_store_persistence() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("cache.json");
        let c = canonical_of("Norway");

        {
            let cache = PlaceCache::new(Arc::new(FileStore::load_from(path.clone())), Arc::new(SystemClock), CACHE_VERSION);
            cache.put(&c, &ResolutionResult::cities(items(35))).await;
        }

        let cache = PlaceCache::new(Arc::new(FileStore::load_from(path)), Arc::new(SystemClock), CACHE_VERSION);
        let hit = cache.get(&c, PlaceKind::Cities, &RULES).await.unwrap();
        assert_eq!(hit.items, items(35));
    }

    #[tokio::test]
    async fn test_file_store_concurrent_writes_keep_every_key() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cache.json");
        let store = Arc::new(FileStore::load_from(path.clone()));
        let cache = PlaceCache::new(store, Arc::new(SystemClock), CACHE_VERSION);
        let countries: Vec<_> = ["Sweden", "Norway", "Spain", "Italy", "France", "Austria"]
            .iter()
            .map(|n| canonical_of(n))
            .collect();

        let mut tasks = tokio::task::JoinSet::new();
        for c in countries.clone() {
            let cache = cache.clone();
            tasks.spawn(async move { cache.put(&c, &ResolutionResult::cities(items(40))).await });
        }
        while tasks.join_next().await.is_some() {}

        let reloaded = PlaceCache::new(Arc::new(FileStore::load_from(path)), Arc::new(SystemClock), CACHE_VERSION);
        for c in &countries {
            assert!(reloaded.get(c, PlaceKind::Cities, &RULES).await.is_some(), "lost {}", c.name);
        }
    }

    #[tokio::test]
    async fn test_file_store_corrupt_file_starts_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cache.json");
        fs::write(&path, "{ not json").unwrap();
        let store = FileStore::load_from(path);
        assert!(store.read("v3:cities:sweden").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_null_store() {
        let cache = PlaceCache::disabled();
        let c = canonical_of("Chile");
        cache.put(&c, &ResolutionResult::cities(items(40))).await;
        assert!(cache.get(&c, PlaceKind::Cities, &RULES).await.is_none());
    }
}
