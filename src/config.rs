//! Runtime configuration at ~/.place_atlas/config.json.
//!
//! Every field has a default, so a missing file means "stock settings".
//! Command-line flags are layered on top by the binary.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::places::cache::CACHE_VERSION;
use crate::places::policy::{PolicyTables, DEFAULT_LIMIT, MIN_ITEMS};
use crate::places::types::{PlaceError, Result};

const DEFAULT_REMOTE_ENDPOINT: &str = "https://countriesnow.space/api/v0.1/countries/cities";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AtlasConfig {
    /// Holds `cities/<slug>.json` and `world_cities.json`.
    pub data_dir: PathBuf,
    /// Cache file; `None` means ~/.place_atlas/cache.json.
    pub cache_path: Option<PathBuf>,
    pub use_cache: bool,
    pub cache_version: String,
    pub default_limit: usize,
    pub min_items: usize,
    /// Per-country limit overrides, any spelling.
    pub limits: HashMap<String, usize>,
    pub remote_endpoint: Option<String>,
    pub remote_timeout_ms: u64,
    pub tier_timeout_ms: u64,
    pub offline: bool,
}

impl Default for AtlasConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            cache_path: None,
            use_cache: true,
            cache_version: CACHE_VERSION.to_string(),
            default_limit: DEFAULT_LIMIT,
            min_items: MIN_ITEMS,
            limits: HashMap::new(),
            remote_endpoint: Some(DEFAULT_REMOTE_ENDPOINT.to_string()),
            remote_timeout_ms: 1000,
            tier_timeout_ms: 5000,
            offline: false,
        }
    }
}

impl AtlasConfig {
    /// Load from the default location; a missing file yields defaults.
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// Load from an explicit path; the file must exist and parse.
    pub fn load_from(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .map_err(|e| PlaceError::Config(format!("{}: {}", path.display(), e)))?;
        serde_json::from_str(&data).map_err(|e| PlaceError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".place_atlas")
            .join("config.json")
    }

    pub fn policy(&self) -> PolicyTables {
        self.limits.iter().fold(
            PolicyTables::builtin()
                .with_default_limit(self.default_limit)
                .with_min_items(self.min_items),
            |policy, (country, limit)| policy.with_limit(country, *limit),
        )
    }

    pub fn remote_timeout(&self) -> Duration {
        Duration::from_millis(self.remote_timeout_ms)
    }

    pub fn tier_timeout(&self) -> Duration {
        Duration::from_millis(self.tier_timeout_ms)
    }
}
