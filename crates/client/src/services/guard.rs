//! Suppression of duplicate lifecycle requests.
//!
//! A double click on "accept" must not reach the server twice. Each guarded
//! call claims a key (e.g. `accept:o1`) for a short window; a second claim
//! inside the window fails with [`ApiError::Duplicate`] before any request
//! is built. The claim also yields the idempotency key sent to the server.

use std::time::Duration;

use moka::future::Cache;
use uuid::Uuid;

use crate::error::ApiError;

/// Upper bound on simultaneously tracked keys.
const MAX_TRACKED_KEYS: u64 = 1_024;

/// Time-windowed claim table shared by every clone.
#[derive(Clone)]
pub struct InFlightGuard {
    claims: Option<Cache<String, Uuid>>,
}

impl std::fmt::Debug for InFlightGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InFlightGuard")
            .field("enabled", &self.claims.is_some())
            .finish()
    }
}

impl InFlightGuard {
    /// Guard with the given suppression window. A zero window disables it.
    #[must_use]
    pub fn new(window: Duration) -> Self {
        let claims = (!window.is_zero()).then(|| {
            Cache::builder()
                .max_capacity(MAX_TRACKED_KEYS)
                .time_to_live(window)
                .build()
        });
        Self { claims }
    }

    /// Claim `key`, returning a fresh idempotency key.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Duplicate`] if `key` was claimed within the window.
    pub async fn claim(&self, key: &str) -> Result<Uuid, ApiError> {
        let Some(claims) = &self.claims else {
            return Ok(Uuid::new_v4());
        };
        let entry = claims
            .entry(key.to_owned())
            .or_insert_with(async { Uuid::new_v4() })
            .await;
        if entry.is_fresh() {
            Ok(entry.into_value())
        } else {
            Err(ApiError::Duplicate(format!("{key} is already in progress")))
        }
    }

    /// Drop a claim early so the action can be retried by the user.
    pub async fn release(&self, key: &str) {
        if let Some(claims) = &self.claims {
            claims.invalidate(key).await;
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_second_claim_is_duplicate() {
        let guard = InFlightGuard::new(Duration::from_secs(60));
        guard.claim("accept:o1").await.unwrap();

        let err = guard.claim("accept:o1").await.unwrap_err();
        assert!(matches!(err, ApiError::Duplicate(_)));

        // Different key, different action.
        guard.claim("reject:o1").await.unwrap();
    }

    #[tokio::test]
    async fn test_release_allows_retry() {
        let guard = InFlightGuard::new(Duration::from_secs(60));
        let first = guard.claim("deliver:o2").await.unwrap();
        guard.release("deliver:o2").await;
        let second = guard.claim("deliver:o2").await.unwrap();
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn test_zero_window_disables_guard() {
        let guard = InFlightGuard::new(Duration::ZERO);
        guard.claim("accept:o1").await.unwrap();
        guard.claim("accept:o1").await.unwrap();
    }

    #[tokio::test]
    async fn test_claim_expires_after_window() {
        let guard = InFlightGuard::new(Duration::from_millis(50));
        guard.claim("accept:o3").await.unwrap();
        tokio::time::sleep(Duration::from_millis(120)).await;
        guard.claim("accept:o3").await.unwrap();
    }
}
