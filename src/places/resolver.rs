//! Place resolver: orchestrates the fallback chain.
//!
//! Flow: aliases → policy overrides → cache → quick chunk → global dataset →
//! remote lookup → divisions → last resort (quick chunk, however small).
//!
//! A failing or slow tier counts as empty; the chain always moves on.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use super::aliases;
use super::cache::PlaceCache;
use super::policy::{self, Override, PolicyTables};
use super::protocol::RequestToken;
use super::providers::SourceAdapter;
use super::providers::{BundledDivisions, GlobalDataset, HttpLookup, QuickDataset, RemoteSource};
use super::types::{CanonicalCountry, CountryRules, PlaceError, PlaceKind, ResolutionResult, Result};
use crate::config::AtlasConfig;

const DEFAULT_TIER_TIMEOUT: Duration = Duration::from_secs(5);

/// Where an accepted list came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tier {
    Policy,
    Cache,
    Quick,
    Global,
    Remote,
    Divisions,
    LastResort,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Policy => write!(f, "policy"),
            Self::Cache => write!(f, "cache"),
            Self::Quick => write!(f, "quick"),
            Self::Global => write!(f, "global"),
            Self::Remote => write!(f, "remote"),
            Self::Divisions => write!(f, "divisions"),
            Self::LastResort => write!(f, "last-resort"),
        }
    }
}

/// The tiered resolution engine.
pub struct PlaceResolver {
    policy: Arc<PolicyTables>,
    cache: PlaceCache,
    quick: Option<Arc<dyn SourceAdapter>>,
    global: Option<Arc<dyn SourceAdapter>>,
    remote: Option<Arc<dyn SourceAdapter>>,
    divisions: Arc<dyn SourceAdapter>,
    tier_timeout: Duration,
}

/// Assembles a [`PlaceResolver`]; unset tiers are skipped.
pub struct PlaceResolverBuilder {
    policy: PolicyTables,
    cache: PlaceCache,
    quick: Option<Arc<dyn SourceAdapter>>,
    global: Option<Arc<dyn SourceAdapter>>,
    remote: Option<Arc<dyn SourceAdapter>>,
    divisions: Arc<dyn SourceAdapter>,
    tier_timeout: Duration,
}

impl Default for PlaceResolverBuilder {
    fn default() -> Self {
        Self {
            policy: PolicyTables::builtin(),
            cache: PlaceCache::in_memory(),
            quick: None,
            global: None,
            remote: None,
            divisions: Arc::new(BundledDivisions::builtin()),
            tier_timeout: DEFAULT_TIER_TIMEOUT,
        }
    }
}

impl PlaceResolverBuilder {
    pub fn policy(mut self, policy: PolicyTables) -> Self {
        self.policy = policy;
        self
    }

    pub fn cache(mut self, cache: PlaceCache) -> Self {
        self.cache = cache;
        self
    }

    pub fn quick(mut self, source: Arc<dyn SourceAdapter>) -> Self {
        self.quick = Some(source);
        self
    }

    pub fn global(mut self, source: Arc<dyn SourceAdapter>) -> Self {
        self.global = Some(source);
        self
    }

    pub fn remote(mut self, source: Arc<dyn SourceAdapter>) -> Self {
        self.remote = Some(source);
        self
    }

    pub fn divisions(mut self, source: Arc<dyn SourceAdapter>) -> Self {
        self.divisions = source;
        self
    }

    pub fn tier_timeout(mut self, timeout: Duration) -> Self {
        self.tier_timeout = timeout;
        self
    }

    pub fn build(self) -> PlaceResolver {
        PlaceResolver {
            policy: Arc::new(self.policy),
            cache: self.cache,
            quick: self.quick,
            global: self.global,
            remote: self.remote,
            divisions: self.divisions,
            tier_timeout: self.tier_timeout,
        }
    }
}

impl PlaceResolver {
    pub fn builder() -> PlaceResolverBuilder {
        PlaceResolverBuilder::default()
    }

    /// Wire up the on-disk sources, the remote service and the cache from config.
    pub fn from_config(config: &AtlasConfig, cache: PlaceCache) -> Self {
        let mut builder = Self::builder()
            .policy(config.policy())
            .cache(cache)
            .quick(Arc::new(QuickDataset::new(&config.data_dir)))
            .global(Arc::new(GlobalDataset::new(&config.data_dir)))
            .tier_timeout(config.tier_timeout());

        match (&config.remote_endpoint, config.offline) {
            (Some(endpoint), false) => {
                let lookup = HttpLookup::new(endpoint.clone(), config.remote_timeout());
                builder = builder.remote(Arc::new(RemoteSource::new(Arc::new(lookup), config.remote_timeout())));
            }
            _ => tracing::debug!("remote tier disabled"),
        }
        builder.build()
    }

    pub fn policy(&self) -> &PolicyTables {
        &self.policy
    }

    /// Places for a country. Never fails; the worst case is an empty list.
    pub async fn resolve_places(&self, query: &str) -> ResolutionResult {
        match self.resolve(query, None).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(query, error = %e, "resolution failed");
                ResolutionResult::empty()
            }
        }
    }

    /// Same as [`resolve_places`](Self::resolve_places) but abandons with
    /// [`PlaceError::Superseded`] once `token` is no longer current.
    pub async fn resolve_places_for(&self, query: &str, token: &RequestToken) -> Result<ResolutionResult> {
        self.resolve(query, Some(token)).await
    }

    async fn resolve(&self, query: &str, token: Option<&RequestToken>) -> Result<ResolutionResult> {
        let country = aliases::canonical_of(query);
        let rules = self.policy.rules_for(&country);
        let forced = self.policy.override_for(&country);

        // 1. Policy overrides
        match forced {
            Some(Override::NoData) => {
                tracing::info!(country = %country.name, "no place data for country");
                return Ok(ResolutionResult::empty());
            }
            Some(Override::PopularOnly) => {
                let popular: Vec<String> = policy::popular_cities(&country).iter().map(|s| s.to_string()).collect();
                if !popular.is_empty() {
                    return Ok(self.finish(&country, Tier::Policy, PlaceKind::Cities, &popular));
                }
            }
            Some(Override::DivisionsAsCities) => {
                ensure_current(token)?;
                let divisions = self.fetch_tier(&self.divisions, &country).await;
                if !divisions.is_empty() {
                    return Ok(self.finish(&country, Tier::Policy, PlaceKind::Cities, &divisions));
                }
            }
            Some(Override::ForceCities) | None => {}
        }
        let force_cities = forced == Some(Override::ForceCities);
        let adequate = |items: &[String]| {
            if force_cities {
                !items.is_empty()
            } else {
                items.len() >= rules.min_items
            }
        };

        // 2. Cache
        ensure_current(token)?;
        if let Some(hit) = self.cached(&country, &rules, force_cities).await {
            tracing::info!(country = %country.name, tier = %Tier::Cache, kind = %hit.kind, count = hit.len(), "resolved");
            return Ok(hit);
        }

        // 3. Quick chunk
        ensure_current(token)?;
        let quick = match &self.quick {
            Some(source) => self.fetch_tier(source, &country).await,
            None => Vec::new(),
        };
        if adequate(&quick) {
            return Ok(self.accept(&country, Tier::Quick, PlaceKind::Cities, &quick).await);
        }

        // 4. Global dataset, 5. remote lookup
        for (tier, source) in [(Tier::Global, &self.global), (Tier::Remote, &self.remote)] {
            let Some(source) = source else { continue };
            ensure_current(token)?;
            let items = self.fetch_tier(source, &country).await;
            if adequate(&items) {
                return Ok(self.accept(&country, tier, PlaceKind::Cities, &items).await);
            }
        }

        // 6. Divisions
        if !force_cities {
            ensure_current(token)?;
            let divisions = self.fetch_tier(&self.divisions, &country).await;
            if !divisions.is_empty() {
                return Ok(self.accept(&country, Tier::Divisions, PlaceKind::Divisions, &divisions).await);
            }
        }

        // 7. Last resort
        ensure_current(token)?;
        Ok(self.finish(&country, Tier::LastResort, PlaceKind::Cities, &quick))
    }

    async fn cached(&self, country: &CanonicalCountry, rules: &CountryRules, force_cities: bool) -> Option<ResolutionResult> {
        let kinds: &[PlaceKind] = if force_cities {
            &[PlaceKind::Cities]
        } else {
            &[PlaceKind::Cities, PlaceKind::Divisions]
        };
        for kind in kinds {
            if let Some(entry) = self.cache.get(country, *kind, rules).await {
                return Some(ResolutionResult {
                    kind: entry.kind,
                    items: entry.items,
                });
            }
        }
        None
    }

    /// Run one adapter under the tier timeout; failures become empty lists.
    async fn fetch_tier(&self, source: &Arc<dyn SourceAdapter>, country: &CanonicalCountry) -> Vec<String> {
        match tokio::time::timeout(self.tier_timeout, source.fetch(country)).await {
            Ok(Ok(items)) => {
                tracing::debug!(country = %country.name, source = source.name(), count = items.len(), "tier answered");
                items
            }
            Ok(Err(e)) => {
                tracing::debug!(country = %country.name, source = source.name(), error = %e, "tier failed");
                Vec::new()
            }
            Err(_) => {
                let e = PlaceError::Timeout {
                    adapter: source.name(),
                    timeout_ms: self.tier_timeout.as_millis() as u64,
                };
                tracing::warn!(country = %country.name, error = %e, "tier timed out");
                Vec::new()
            }
        }
    }

    /// Cap, cache and return.
    async fn accept(&self, country: &CanonicalCountry, tier: Tier, kind: PlaceKind, items: &[String]) -> ResolutionResult {
        let result = self.finish(country, tier, kind, items);
        self.cache.put(country, &result).await;
        result
    }

    /// Cap and return.
    fn finish(&self, country: &CanonicalCountry, tier: Tier, kind: PlaceKind, items: &[String]) -> ResolutionResult {
        let capped = self.policy.cap(country, items);
        tracing::info!(
            country = %country.name,
            tier = %tier,
            kind = %kind,
            raw = items.len(),
            count = capped.len(),
            "resolved"
        );
        ResolutionResult { kind, items: capped }
    }
}

fn ensure_current(token: Option<&RequestToken>) -> Result<()> {
    match token {
        Some(t) if !t.is_current() => Err(PlaceError::Superseded),
        _ => Ok(()),
    }
}
