//! Core types for the place-resolution subsystem.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use super::aliases;

const DAY_MS: i64 = 24 * 3600 * 1000;

/// What a resolved place list represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaceKind {
    Cities,
    Divisions,
}

impl PlaceKind {
    /// Category tag used inside cache keys.
    pub fn cache_tag(self) -> &'static str {
        match self {
            Self::Cities => "cities",
            Self::Divisions => "states",
        }
    }

    /// How long a cached list of this kind stays trustworthy.
    pub fn ttl_ms(self) -> i64 {
        match self {
            Self::Cities => 7 * DAY_MS,
            Self::Divisions => 30 * DAY_MS,
        }
    }
}

impl fmt::Display for PlaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cities => write!(f, "cities"),
            Self::Divisions => write!(f, "divisions"),
        }
    }
}

/// A bounded, deduplicated, sorted place list for one country.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionResult {
    pub kind: PlaceKind,
    pub items: Vec<String>,
}

impl ResolutionResult {
    pub fn cities(items: Vec<String>) -> Self {
        Self { kind: PlaceKind::Cities, items }
    }

    pub fn divisions(items: Vec<String>) -> Self {
        Self { kind: PlaceKind::Divisions, items }
    }

    /// The "type your own value" answer.
    pub fn empty() -> Self {
        Self::cities(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// A country after alias resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalCountry {
    /// Representative spelling.
    pub name: String,
    /// Every known spelling, canonical first.
    pub variants: Vec<String>,
}

impl CanonicalCountry {
    /// Normalized canonical name, used for table lookups and cache keys.
    pub fn key(&self) -> String {
        aliases::normalize(&self.name)
    }
}

/// Per-country size rules shared by the engine and the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountryRules {
    /// Hard cap on result length.
    pub limit: usize,
    /// Smallest list a tier may return and still count as adequate.
    pub min_items: usize,
}

/// Place resolution errors.
///
/// Only `Superseded` and `Config` ever reach callers; everything else is
/// absorbed by the engine as an empty tier or a cache miss.
#[derive(Debug, Error)]
pub enum PlaceError {
    #[error("Source '{adapter}' unavailable: {reason}")]
    SourceUnavailable { adapter: &'static str, reason: String },

    #[error("Source '{adapter}' timed out after {timeout_ms}ms")]
    Timeout { adapter: &'static str, timeout_ms: u64 },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Request superseded by a newer selection")]
    Superseded,

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, PlaceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_serializes_lowercase() {
        let json = serde_json::to_string(&ResolutionResult::divisions(vec!["Ontario".into()])).unwrap();
        assert_eq!(json, r#"{"kind":"divisions","items":["Ontario"]}"#);
    }

    #[test]
    fn test_ttl_divisions_longer_than_cities() {
        assert_eq!(PlaceKind::Cities.ttl_ms(), 7 * DAY_MS);
        assert_eq!(PlaceKind::Divisions.ttl_ms(), 30 * DAY_MS);
    }

    #[test]
    fn test_cache_tags() {
        assert_eq!(PlaceKind::Cities.cache_tag(), "cities");
        assert_eq!(PlaceKind::Divisions.cache_tag(), "states");
    }

    #[test]
    fn test_error_display() {
        let e = PlaceError::Timeout { adapter: "remote", timeout_ms: 1000 };
        assert_eq!(e.to_string(), "Source 'remote' timed out after 1000ms");
    }
}
