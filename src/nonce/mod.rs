//! Nonce authority: mints challenge nonces and resolves them back to the
//! action they were issued for.
//!
//! Implementations own uniqueness, expiry and single use. A nonce must stop
//! resolving once it has been looked up, which is what makes a signed
//! [`ClientResponse`](crate::messages::ClientResponse) non-replayable.

pub mod memory;
pub mod redis;

pub use self::memory::MemoryNonceStore;
pub use self::redis::RedisNonceStore;

use crate::messages::Action;
use async_trait::async_trait;
use thiserror::Error;

/// Errors from a [`NonceAuthority`].
#[derive(Debug, Error)]
pub enum NonceError {
    #[error("Nonce not found or already used")]
    NotFound,

    #[error("Nonce expired")]
    Expired,

    #[error("Nonce store error: {0}")]
    Backend(String),
}

impl From<::redis::RedisError> for NonceError {
    fn from(e: ::redis::RedisError) -> Self {
        NonceError::Backend(e.to_string())
    }
}

#[async_trait]
pub trait NonceAuthority: Send + Sync {
    /// Generate and record a fresh nonce bound to `action`.
    async fn mint(&self, action: Action) -> Result<String, NonceError>;

    /// Return the action bound to `nonce`, consuming it.
    async fn resolve_action(&self, nonce: &str) -> Result<Action, NonceError>;
}

/// Fresh random nonce.
pub(crate) fn new_nonce() -> String {
    uuid::Uuid::new_v4().to_string()
}
