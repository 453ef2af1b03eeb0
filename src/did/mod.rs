//! Per-chain DID processors.
//!
//! Each supported blockchain contributes one [`DidProcessor`] that knows how to
//! look up key material for its DIDs and check signatures and verifiable
//! presentations against it. The login SDK only ever sees the trait; processors
//! are registered in a [`ProcessorRegistry`] keyed by chain identifier.
//!
//! ```text
//! ┌──────────────┐  did:ont:..   ┌───────────────────┐
//! │ LoginSdk     │──────────────▶│ ProcessorRegistry │
//! │  (validator) │               └───────┬───────────┘
//! └──────────────┘                       │ "ont", "etho", ...
//!                                        ▼
//!                               ┌───────────────────┐
//!                               │ dyn DidProcessor  │
//!                               └───────────────────┘
//! ```

pub mod error;
pub mod jws;
pub mod local;
pub mod reference;

pub use error::{ProcessorError, ReferenceError};
pub use local::LocalKeyProcessor;
pub use reference::{did_chain, parse_verification_method, VerificationMethodRef};

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// Capability contract implemented once per blockchain.
///
/// Implementations may perform network or storage I/O; callers cancel by
/// dropping the returned future.
#[async_trait]
pub trait DidProcessor: Send + Sync {
    /// Verify `signature` over `message` with key `key_index` of `did`.
    async fn verify_sig(
        &self,
        did: &str,
        key_index: u32,
        message: &[u8],
        signature: &[u8],
    ) -> Result<(), ProcessorError>;

    /// Verify that `presentation` was made by `did`/`key_index` and carries
    /// every credential type in `required_types`.
    async fn verify_presentation(
        &self,
        did: &str,
        key_index: u32,
        presentation: &str,
        required_types: &[String],
    ) -> Result<(), ProcessorError>;

    /// Extract the embedded credential documents as JSON strings.
    async fn get_credential_jsons(&self, presentation: &str) -> Result<Vec<String>, ProcessorError>;
}

/// Read-only mapping from chain identifier to its processor.
///
/// Chain names are matched without regard to ASCII case.
#[derive(Clone, Default)]
pub struct ProcessorRegistry {
    processors: HashMap<String, Arc<dyn DidProcessor>>,
}

impl ProcessorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `processor` for `chain`, replacing any previous entry.
    pub fn with_processor(mut self, chain: impl Into<String>, processor: Arc<dyn DidProcessor>) -> Self {
        self.processors
            .insert(chain.into().to_ascii_lowercase(), processor);
        self
    }

    pub fn get(&self, chain: &str) -> Option<&Arc<dyn DidProcessor>> {
        self.processors.get(&chain.to_ascii_lowercase())
    }

    pub fn contains(&self, chain: &str) -> bool {
        self.processors.contains_key(&chain.to_ascii_lowercase())
    }

    pub fn chains(&self) -> impl Iterator<Item = &str> {
        self.processors.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.processors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }
}

impl std::fmt::Debug for ProcessorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut chains: Vec<&str> = self.chains().collect();
        chains.sort_unstable();
        f.debug_struct("ProcessorRegistry")
            .field("chains", &chains)
            .finish()
    }
}
