//! In-process nonce store with TTL expiry.

use crate::messages::Action;
use crate::nonce::{new_nonce, NonceAuthority, NonceError};
use async_trait::async_trait;
use log::debug;
use moka::future::Cache;
use std::time::{Duration, Instant};

/// Default lifetime of an issued nonce.
pub const DEFAULT_NONCE_TTL: Duration = Duration::from_secs(300);

/// Default upper bound on outstanding nonces.
pub const DEFAULT_NONCE_CAPACITY: u64 = 10_000;

#[derive(Clone)]
struct IssuedNonce {
    action: Action,
    issued_at: Instant,
}

/// Nonce authority for single-process deployments and tests.
///
/// Nonces are removed on lookup, so each resolves at most once. Unresolved
/// nonces are evicted by the cache once their TTL elapses.
pub struct MemoryNonceStore {
    entries: Cache<String, IssuedNonce>,
    ttl: Duration,
}

impl MemoryNonceStore {
    pub fn new(ttl: Duration) -> Self {
        Self::with_capacity(ttl, DEFAULT_NONCE_CAPACITY)
    }

    pub fn with_capacity(ttl: Duration, max_capacity: u64) -> Self {
        let entries = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(ttl)
            .build();

        Self { entries, ttl }
    }

    /// Number of live nonces, after pending evictions have run.
    pub async fn len(&self) -> u64 {
        self.entries.run_pending_tasks().await;
        self.entries.entry_count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for MemoryNonceStore {
    fn default() -> Self {
        Self::new(DEFAULT_NONCE_TTL)
    }
}

#[async_trait]
impl NonceAuthority for MemoryNonceStore {
    async fn mint(&self, action: Action) -> Result<String, NonceError> {
        let nonce = new_nonce();
        self.entries
            .insert(
                nonce.clone(),
                IssuedNonce {
                    action,
                    issued_at: Instant::now(),
                },
            )
            .await;
        debug!("Issued nonce for {}", action);
        Ok(nonce)
    }

    async fn resolve_action(&self, nonce: &str) -> Result<Action, NonceError> {
        let issued = self
            .entries
            .remove(nonce)
            .await
            .ok_or(NonceError::NotFound)?;

        // An entry may outlive its TTL until the cache's next maintenance run.
        if issued.issued_at.elapsed() >= self.ttl {
            return Err(NonceError::Expired);
        }
        Ok(issued.action)
    }
}
