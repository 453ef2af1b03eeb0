//! Login SDK: challenge issuance and response validation.
//!
//! # Usage
//!
//! ```ignore
//! use ontlogin::{LoginSdk, SdkConfig, ProcessorRegistry, MemoryNonceStore};
//!
//! let registry = ProcessorRegistry::new().with_processor("ont", Arc::new(ont_processor));
//! let sdk = LoginSdk::new(SdkConfig::from_env()?, registry, Arc::new(MemoryNonceStore::default()))?;
//!
//! let challenge = sdk.generate_challenge(&hello).await?;
//! // ... client signs the challenge ...
//! match sdk.validate_client_response(&response).await {
//!     Ok(login) => { /* issue a session for login.did / login.action */ }
//!     Err(e) => { /* reject, e.kind() names the failed step */ }
//! }
//! ```

mod challenge;
mod validator;

pub use validator::ValidatedLogin;

use crate::config::{ConfigError, SdkConfig};
use crate::did::{did_chain, ProcessorRegistry, ReferenceError};
use crate::error::{LoginError, LoginResult};
use crate::nonce::NonceAuthority;
use std::sync::Arc;

/// Server-side validator for the DID login protocol.
///
/// Holds only read-only state plus the injected nonce authority, so one
/// instance can serve concurrent requests behind an `Arc`.
pub struct LoginSdk {
    config: SdkConfig,
    processors: ProcessorRegistry,
    nonces: Arc<dyn NonceAuthority>,
}

impl LoginSdk {
    /// Create an SDK. Every configured chain needs a registered processor.
    pub fn new(
        config: SdkConfig,
        processors: ProcessorRegistry,
        nonces: Arc<dyn NonceAuthority>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        if let Some(missing) = config.chain.iter().find(|c| !processors.contains(c)) {
            return Err(ConfigError::MissingProcessor(missing.clone()));
        }

        Ok(Self {
            config,
            processors,
            nonces,
        })
    }

    pub fn config(&self) -> &SdkConfig {
        &self.config
    }

    /// Chain identifier of `did`.
    pub fn did_chain<'a>(&self, did: &'a str) -> Result<&'a str, ReferenceError> {
        did_chain(did)
    }

    /// Credential documents embedded in `presentation`, decoded by the
    /// processor for `chain`.
    pub async fn get_credential_jsons(&self, chain: &str, presentation: &str) -> LoginResult<Vec<String>> {
        let processor = self
            .processors
            .get(chain)
            .ok_or_else(|| LoginError::UnsupportedChain(chain.to_string()))?;

        processor
            .get_credential_jsons(presentation)
            .await
            .map_err(LoginError::CredentialExtractionFailed)
    }
}

impl std::fmt::Debug for LoginSdk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginSdk")
            .field("config", &self.config)
            .field("processors", &self.processors)
            .finish_non_exhaustive()
    }
}
