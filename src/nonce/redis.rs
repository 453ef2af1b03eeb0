//! Redis-backed nonce store shared across server instances.

use crate::messages::Action;
use crate::nonce::{new_nonce, NonceAuthority, NonceError};
use async_trait::async_trait;
use log::debug;
use std::sync::Arc;
use std::time::Duration;

/// Redis key prefix for issued nonces.
const NONCE_KEY_PREFIX: &str = "ontlogin:nonce:";

/// Nonce authority storing `nonce -> action code` with a Redis TTL.
///
/// Lookup uses `GETDEL` (Redis 6.2+), so a nonce is consumed atomically even
/// when several instances race on the same response.
pub struct RedisNonceStore {
    client: Arc<redis::Client>,
    ttl: Duration,
}

impl RedisNonceStore {
    pub fn new(client: Arc<redis::Client>, ttl: Duration) -> Self {
        Self { client, ttl }
    }

    fn key(nonce: &str) -> String {
        format!("{}{}", NONCE_KEY_PREFIX, nonce)
    }
}

#[async_trait]
impl NonceAuthority for RedisNonceStore {
    async fn mint(&self, action: Action) -> Result<String, NonceError> {
        let nonce = new_nonce();
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        // SET NX so a colliding nonce is never rebound to another action.
        let stored: bool = redis::cmd("SET")
            .arg(Self::key(&nonce))
            .arg(action.code())
            .arg("NX")
            .arg("EX")
            .arg(self.ttl.as_secs().max(1))
            .query_async(&mut conn)
            .await?;

        if !stored {
            return Err(NonceError::Backend("Nonce collision".to_string()));
        }

        debug!("Issued nonce for {}", action);
        Ok(nonce)
    }

    async fn resolve_action(&self, nonce: &str) -> Result<Action, NonceError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let code: Option<i32> = redis::cmd("GETDEL")
            .arg(Self::key(nonce))
            .query_async(&mut conn)
            .await?;

        let code = code.ok_or(NonceError::NotFound)?;
        Action::try_from(code)
            .map_err(|code| NonceError::Backend(format!("Stored action code {} is invalid", code)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_prefix() {
        assert_eq!(RedisNonceStore::key("abc"), "ontlogin:nonce:abc");
    }
}
