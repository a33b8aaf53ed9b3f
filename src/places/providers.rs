//! Place sources: bundled divisions, per-country quick chunks, the global
//! dataset, the remote lookup service, and an in-memory source.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;

use super::aliases::normalize;
use super::protocol::race_variants;
use super::types::{CanonicalCountry, PlaceError, Result};

/// One tier's data source.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Short name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Place names for `country`. An unknown country is `Ok(vec![])`;
    /// errors mean the source itself could not answer.
    async fn fetch(&self, country: &CanonicalCountry) -> Result<Vec<String>>;
}

/// Chunk file name: "Bosnia and Herzegovina" → "bosnia-and-herzegovina".
pub fn chunk_slug(name: &str) -> String {
    normalize(name)
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

// ─── Bundled divisions ──────────────────────────────────────────

const BUNDLED_DIVISIONS: &str = include_str!("../../data/divisions.json");

/// Administrative divisions compiled into the binary.
#[derive(Debug, Clone, Default)]
pub struct BundledDivisions {
    table: HashMap<String, Vec<String>>,
}

impl BundledDivisions {
    pub fn builtin() -> Self {
        match serde_json::from_str::<HashMap<String, Vec<String>>>(BUNDLED_DIVISIONS) {
            Ok(map) => Self::from_map(map),
            Err(e) => {
                tracing::warn!(error = %e, "bundled division table unreadable");
                Self::default()
            }
        }
    }

    pub fn from_map(map: HashMap<String, Vec<String>>) -> Self {
        let table = map.into_iter().map(|(k, v)| (normalize(&k), v)).collect();
        Self { table }
    }

    pub fn countries(&self) -> usize {
        self.table.len()
    }
}

#[async_trait]
impl SourceAdapter for BundledDivisions {
    fn name(&self) -> &'static str {
        "divisions"
    }

    async fn fetch(&self, country: &CanonicalCountry) -> Result<Vec<String>> {
        Ok(country
            .variants
            .iter()
            .find_map(|v| self.table.get(&normalize(v)))
            .cloned()
            .unwrap_or_default())
    }
}

// ─── Quick per-country chunks ───────────────────────────────────

/// `{data_dir}/cities/{slug}.json`, read on demand.
#[derive(Debug, Clone)]
pub struct QuickDataset {
    dir: PathBuf,
}

impl QuickDataset {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: data_dir.into().join("cities"),
        }
    }

    fn chunk_path(&self, country: &CanonicalCountry) -> PathBuf {
        self.dir.join(format!("{}.json", chunk_slug(&country.name)))
    }
}

#[async_trait]
impl SourceAdapter for QuickDataset {
    fn name(&self) -> &'static str {
        "quick"
    }

    async fn fetch(&self, country: &CanonicalCountry) -> Result<Vec<String>> {
        let path = self.chunk_path(country);
        let data = match tokio::fs::read_to_string(&path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(PlaceError::SourceUnavailable {
                    adapter: self.name(),
                    reason: format!("{}: {}", path.display(), e),
                })
            }
        };
        Ok(serde_json::from_str(&data)?)
    }
}

// ─── Global dataset ─────────────────────────────────────────────

#[derive(Deserialize)]
struct GlobalRow {
    name: String,
    country: String,
}

struct IndexedRow {
    name: String,
    country_key: String,
}

/// `{data_dir}/world_cities.json`, loaded once and filtered in memory.
pub struct GlobalDataset {
    path: PathBuf,
    rows: OnceCell<Arc<Vec<IndexedRow>>>,
}

impl GlobalDataset {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            path: data_dir.into().join("world_cities.json"),
            rows: OnceCell::new(),
        }
    }

    async fn rows(&self) -> Result<&Arc<Vec<IndexedRow>>> {
        self.rows
            .get_or_try_init(|| async {
                let data = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
                    PlaceError::SourceUnavailable {
                        adapter: "global",
                        reason: format!("{}: {}", self.path.display(), e),
                    }
                })?;
                let rows: Vec<GlobalRow> = serde_json::from_str(&data)?;
                tracing::info!(rows = rows.len(), path = %self.path.display(), "global dataset loaded");
                Ok(Arc::new(
                    rows.into_iter()
                        .map(|r| IndexedRow {
                            country_key: normalize(&r.country),
                            name: r.name,
                        })
                        .collect(),
                ))
            })
            .await
    }
}

#[async_trait]
impl SourceAdapter for GlobalDataset {
    fn name(&self) -> &'static str {
        "global"
    }

    async fn fetch(&self, country: &CanonicalCountry) -> Result<Vec<String>> {
        let rows = self.rows().await?;
        let keys: HashSet<String> = country.variants.iter().map(|v| normalize(v)).collect();
        Ok(rows
            .iter()
            .filter(|r| keys.contains(&r.country_key))
            .map(|r| r.name.clone())
            .collect())
    }
}

// ─── Remote lookup ──────────────────────────────────────────────

/// A remote place-list service: one country name in, names or failure out.
#[async_trait]
pub trait RemoteLookup: Send + Sync {
    async fn lookup(&self, country: &str) -> Result<Vec<String>>;
}

#[derive(Deserialize)]
struct RemoteResponse {
    #[serde(default)]
    error: bool,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    data: Vec<String>,
}

/// JSON-over-HTTP lookup: POST `{"country": name}` → `{"error", "data"}`.
#[derive(Debug, Clone)]
pub struct HttpLookup {
    endpoint: String,
    timeout: Duration,
}

impl HttpLookup {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout,
        }
    }
}

fn http_lookup(endpoint: &str, country: &str, timeout: Duration) -> Result<Vec<String>> {
    let response = ureq::post(endpoint)
        .set("User-Agent", "PlaceAtlas/0.3 (place-resolver)")
        .timeout(timeout)
        .send_json(serde_json::json!({ "country": country }))
        .map_err(|e| PlaceError::Network(e.to_string()))?;

    let body: RemoteResponse = response
        .into_json()
        .map_err(|e| PlaceError::InvalidResponse(e.to_string()))?;

    if body.error {
        return Err(PlaceError::InvalidResponse(
            body.msg.unwrap_or_else(|| format!("lookup failed for '{}'", country)),
        ));
    }
    Ok(body.data)
}

#[async_trait]
impl RemoteLookup for HttpLookup {
    async fn lookup(&self, country: &str) -> Result<Vec<String>> {
        let endpoint = self.endpoint.clone();
        let country = country.to_string();
        let timeout = self.timeout;
        // Abandoned attempts keep running on the blocking pool; their result is dropped.
        tokio::task::spawn_blocking(move || http_lookup(&endpoint, &country, timeout))
            .await
            .map_err(|e| PlaceError::Network(e.to_string()))?
    }
}

/// Races every alias spelling against a [`RemoteLookup`].
#[derive(Clone)]
pub struct RemoteSource {
    lookup: Arc<dyn RemoteLookup>,
    attempt_timeout: Duration,
}

impl RemoteSource {
    pub fn new(lookup: Arc<dyn RemoteLookup>, attempt_timeout: Duration) -> Self {
        Self {
            lookup,
            attempt_timeout,
        }
    }
}

#[async_trait]
impl SourceAdapter for RemoteSource {
    fn name(&self) -> &'static str {
        "remote"
    }

    async fn fetch(&self, country: &CanonicalCountry) -> Result<Vec<String>> {
        let lookup = Arc::clone(&self.lookup);
        let won = race_variants(&country.variants, self.attempt_timeout, move |variant| {
            let lookup = Arc::clone(&lookup);
            async move { lookup.lookup(&variant).await }
        })
        .await;
        match won {
            Some((variant, items)) => {
                tracing::debug!(country = %country.name, variant = %variant, count = items.len(), "remote answered");
                Ok(items)
            }
            None => Err(PlaceError::SourceUnavailable {
                adapter: self.name(),
                reason: format!("no spelling of '{}' answered", country.name),
            }),
        }
    }
}

// ─── In-memory source ───────────────────────────────────────────

/// A fixed table, for embedding and tests.
#[derive(Debug, Clone)]
pub struct MemorySource {
    name: &'static str,
    table: HashMap<String, Vec<String>>,
}

impl MemorySource {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            table: HashMap::new(),
        }
    }

    pub fn with<I, S>(mut self, country: &str, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.table
            .insert(normalize(country), items.into_iter().map(Into::into).collect());
        self
    }
}

#[async_trait]
impl SourceAdapter for MemorySource {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn fetch(&self, country: &CanonicalCountry) -> Result<Vec<String>> {
        Ok(country
            .variants
            .iter()
            .find_map(|v| self.table.get(&normalize(v)))
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::places::aliases::canonical_of;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    #[test]
    fn test_chunk_slug() {
        assert_eq!(chunk_slug("Bosnia and Herzegovina"), "bosnia-and-herzegovina");
        assert_eq!(chunk_slug("Côte d'Ivoire"), "cote-d-ivoire");
        assert_eq!(chunk_slug("Saint Martin (French part)"), "saint-martin-french-part");
    }

    #[tokio::test]
    async fn test_bundled_divisions() {
        let d = BundledDivisions::builtin();
        assert!(d.countries() >= 20);
        let turkey = d.fetch(&canonical_of("Türkiye")).await.unwrap();
        assert_eq!(turkey.len(), 81);
        let us = d.fetch(&canonical_of("USA")).await.unwrap();
        assert_eq!(us.len(), 51);
        assert!(d.fetch(&canonical_of("Narnia")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_quick_dataset() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("cities")).unwrap();
        fs::write(dir.path().join("cities").join("czech-republic.json"), r#"["Prague", "Brno", "Ostrava"]"#).unwrap();
        fs::write(dir.path().join("cities").join("broken.json"), "[1, 2").unwrap();

        let quick = QuickDataset::new(dir.path());
        let got = quick.fetch(&canonical_of("Czechia")).await.unwrap();
        assert_eq!(got, vec!["Prague", "Brno", "Ostrava"]);
        assert!(quick.fetch(&canonical_of("Peru")).await.unwrap().is_empty());
        assert!(quick.fetch(&canonical_of("Broken")).await.is_err());
    }

    #[tokio::test]
    async fn test_global_dataset_filters_by_variants() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("world_cities.json"),
            r#"[
                {"name": "Abidjan", "country": "Côte d'Ivoire"},
                {"name": "Bouaké", "country": "Ivory Coast"},
                {"name": "Accra", "country": "Ghana"}
            ]"#,
        )
        .unwrap();

        let global = GlobalDataset::new(dir.path());
        let mut got = global.fetch(&canonical_of("Cote d'Ivoire")).await.unwrap();
        got.sort();
        assert_eq!(got, vec!["Abidjan", "Bouaké"]);

        // Loaded once: later file changes are not seen.
        fs::remove_file(dir.path().join("world_cities.json")).unwrap();
        assert_eq!(global.fetch(&canonical_of("Ghana")).await.unwrap(), vec!["Accra"]);
    }

    #[tokio::test]
    async fn test_global_dataset_missing_file() {
        let dir = TempDir::new().unwrap();
        let global = GlobalDataset::new(dir.path());
        assert!(matches!(
            global.fetch(&canonical_of("Ghana")).await,
            Err(PlaceError::SourceUnavailable { adapter: "global", .. })
        ));
    }

    struct ScriptedLookup {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl RemoteLookup for ScriptedLookup {
        async fn lookup(&self, country: &str) -> Result<Vec<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match country {
                "Czechia" => Ok(vec!["Prague".into(), "Brno".into()]),
                "Czech Republic" => Ok(vec![]),
                _ => Err(PlaceError::Network("unknown".into())),
            }
        }
    }

    #[tokio::test]
    async fn test_remote_source_races_variants() {
        let lookup = Arc::new(ScriptedLookup { calls: AtomicUsize::new(0) });
        let remote = RemoteSource::new(lookup.clone(), Duration::from_millis(500));
        let got = remote.fetch(&canonical_of("Czech Republic")).await.unwrap();
        assert_eq!(got, vec!["Prague", "Brno"]);
        assert!(lookup.calls.load(Ordering::SeqCst) >= 1);
    }

    #[tokio::test]
    async fn test_remote_source_all_fail() {
        let lookup = Arc::new(ScriptedLookup { calls: AtomicUsize::new(0) });
        let remote = RemoteSource::new(lookup, Duration::from_millis(500));
        assert!(remote.fetch(&canonical_of("Peru")).await.is_err());
    }

    #[tokio::test]
    async fn test_http_lookup_unreachable() {
        let http = HttpLookup::new("http://127.0.0.1:9/cities", Duration::from_millis(200));
        assert!(http.lookup("Sweden").await.is_err());
    }

    #[tokio::test]
    async fn test_memory_source_alias_lookup() {
        let src = MemorySource::new("test").with("Holland", ["Amsterdam", "Rotterdam"]);
        assert_eq!(src.fetch(&canonical_of("Netherlands")).await.unwrap().len(), 2);
    }

    #[test]
    fn test_remote_response_defaults() {
        let r: RemoteResponse = serde_json::from_str(r#"{"data": ["Lima"]}"#).unwrap();
        assert!(!r.error);
        assert_eq!(r.data, vec!["Lima"]);
    }
}
