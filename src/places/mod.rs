//! Place-list resolution for country pickers.
//!
//! Turns any spelling of a country into a bounded, sorted list of its cities
//! or administrative divisions, drawing on policy tables, a versioned cache
//! and a chain of bundled, on-disk and remote sources.

pub mod aliases;
pub mod cache;
pub mod policy;
pub mod protocol;
pub mod providers;
pub mod resolver;
pub mod sampling;
pub mod types;

pub use aliases::{canonical_of, flag_code_for, is_likely_island, normalize, variants_of};
pub use cache::{CacheStore, FileStore, MemoryStore, PlaceCache};
pub use protocol::{race_variants, PlaceSelection, RequestSession, RequestToken};
pub use providers::{RemoteLookup, SourceAdapter};
pub use resolver::PlaceResolver;
pub use sampling::{cap_country, cap_to_limit};
pub use types::{CanonicalCountry, PlaceError, PlaceKind, ResolutionResult};
