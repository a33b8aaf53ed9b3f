//! Consumer-side protocol for selections that change faster than they resolve.
//!
//! Each selection gets a [`RequestToken`] from a [`RequestSession`]. A result
//! is applied only while its token is still the latest one issued; anything
//! that settles later is dropped. Engines check the token between tiers and
//! abandon work as soon as it goes stale.

use std::cmp::Ordering as CmpOrdering;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinSet;

use super::resolver::PlaceResolver;
use super::types::{ResolutionResult, Result};

/// Issues strictly increasing tokens for one consumer.
#[derive(Debug, Clone, Default)]
pub struct RequestSession {
    latest: Arc<AtomicU64>,
}

impl RequestSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new request; every earlier token becomes stale.
    pub fn issue(&self) -> RequestToken {
        let id = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        RequestToken {
            id,
            latest: Arc::clone(&self.latest),
        }
    }

    /// Invalidate every outstanding token without starting a new request.
    pub fn cancel(&self) {
        self.latest.fetch_add(1, Ordering::SeqCst);
    }

    pub fn latest(&self) -> u64 {
        self.latest.load(Ordering::SeqCst)
    }

    /// Hand back `value` only if `token` is still this session's latest.
    pub fn settle<T>(&self, token: &RequestToken, value: T) -> Option<T> {
        if Arc::ptr_eq(&self.latest, &token.latest) && token.is_current() {
            Some(value)
        } else {
            None
        }
    }
}

/// Opaque, monotonically increasing request identifier.
#[derive(Debug, Clone)]
pub struct RequestToken {
    id: u64,
    latest: Arc<AtomicU64>,
}

impl RequestToken {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn is_current(&self) -> bool {
        self.latest.load(Ordering::SeqCst) == self.id
    }
}

impl PartialEq for RequestToken {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for RequestToken {}

impl PartialOrd for RequestToken {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}

impl Ord for RequestToken {
    fn cmp(&self, other: &Self) -> CmpOrdering {
        self.id.cmp(&other.id)
    }
}

/// What a [`PlaceSelection`] currently shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedSelection {
    pub country: String,
    pub token: u64,
    pub result: ResolutionResult,
}

/// A consumer holding one country selection and its place list.
#[derive(Debug, Default)]
pub struct PlaceSelection {
    session: RequestSession,
    state: Mutex<Option<AppliedSelection>>,
}

impl PlaceSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select a country. Returns `true` if this call's result was applied.
    pub async fn select(&self, resolver: &PlaceResolver, country: &str) -> bool {
        let token = {
            let mut state = match self.state.lock() {
                Ok(s) => s,
                Err(_) => return false,
            };
            *state = None;
            self.session.issue()
        };

        let result = match resolver.resolve_places_for(country, &token).await {
            Ok(result) => result,
            Err(e) => {
                tracing::debug!(country, token = token.id(), error = %e, "selection abandoned");
                return false;
            }
        };

        let mut state = match self.state.lock() {
            Ok(s) => s,
            Err(_) => return false,
        };
        match self.session.settle(&token, result) {
            Some(result) => {
                *state = Some(AppliedSelection {
                    country: country.to_string(),
                    token: token.id(),
                    result,
                });
                true
            }
            None => {
                tracing::debug!(country, token = token.id(), "discarding stale result");
                false
            }
        }
    }

    /// Clear the selection and drop any in-flight result.
    pub fn clear(&self) {
        if let Ok(mut state) = self.state.lock() {
            self.session.cancel();
            *state = None;
        }
    }

    pub fn current(&self) -> Option<AppliedSelection> {
        self.state.lock().ok().and_then(|s| s.clone())
    }

    pub fn session(&self) -> &RequestSession {
        &self.session
    }
}

/// Try every spelling at once; the first non-empty answer wins and the rest
/// are aborted. Each attempt gets its own timeout. `None` if all fail.
pub async fn race_variants<F, Fut>(
    variants: &[String],
    per_attempt: Duration,
    lookup: F,
) -> Option<(String, Vec<String>)>
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = Result<Vec<String>>> + Send + 'static,
{
    let mut attempts = JoinSet::new();
    for variant in variants {
        let name = variant.clone();
        let fut = lookup(variant.clone());
        attempts.spawn(async move { (name, tokio::time::timeout(per_attempt, fut).await) });
    }

    while let Some(joined) = attempts.join_next().await {
        match joined {
            Ok((name, Ok(Ok(items)))) if !items.is_empty() => {
                attempts.abort_all();
                return Some((name, items));
            }
            Ok((name, Ok(Ok(_)))) => tracing::debug!(variant = %name, "empty answer"),
            Ok((name, Ok(Err(e)))) => tracing::debug!(variant = %name, error = %e, "attempt failed"),
            Ok((name, Err(_))) => tracing::debug!(variant = %name, "attempt timed out"),
            Err(e) => tracing::debug!(error = %e, "attempt task failed"),
        }
    }
    None
}
