//! Server side of the DID login protocol.
//!
//! A relying party issues a one-time challenge ([`LoginSdk::generate_challenge`]),
//! the client signs it with a key from its DID document, and the server checks
//! the signature and any verifiable presentations
//! ([`LoginSdk::validate_client_response`]).
//!
//! Chain-specific work (key lookup, signature and presentation checks) is
//! delegated to a [`DidProcessor`] per chain, and nonce bookkeeping to a
//! [`NonceAuthority`]. Both are injected at construction.

pub mod config;
pub mod did;
pub mod error;
pub mod messages;
pub mod nonce;
pub mod sdk;

pub use config::{ConfigError, SdkConfig};
pub use did::{
    did_chain, parse_verification_method, DidProcessor, LocalKeyProcessor, ProcessorError,
    ProcessorRegistry, ReferenceError, VerificationMethodRef,
};
pub use error::{LoginError, LoginResult};
pub use messages::{
    Action, ClientHello, ClientResponse, ClientResponseMsg, Proof, ServerHello, ServerInfo,
    ServerInfoToSign, VcFilter,
};
pub use nonce::{MemoryNonceStore, NonceAuthority, NonceError, RedisNonceStore};
pub use sdk::{LoginSdk, ValidatedLogin};
