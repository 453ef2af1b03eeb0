//! Error types for challenge issuance and response validation.

use crate::did::error::{ProcessorError, ReferenceError};
use crate::nonce::NonceError;
use thiserror::Error;

/// Reasons a hello or a response is rejected.
///
/// Every variant is terminal for the attempt; nothing is retried.
#[derive(Debug, Error)]
pub enum LoginError {
    #[error("Wrong protocol version: {0}")]
    WrongVersion(String),

    #[error("Message type not supported: {0}")]
    TypeNotSupported(String),

    #[error("Action not supported: {0}")]
    ActionNotSupported(i32),

    #[error(transparent)]
    MalformedReference(#[from] ReferenceError),

    #[error("DID {did} does not match verification method DID {method_did}")]
    DidMismatch { did: String, method_did: String },

    #[error("Chain not supported: {0}")]
    UnsupportedChain(String),

    #[error("Nonce rejected: {0}")]
    NonceInvalid(#[source] NonceError),

    #[error("Failed to mint nonce: {0}")]
    NonceMintFailed(#[source] NonceError),

    #[error("Failed to decode proof value: {0}")]
    SignatureDecodeFailed(#[from] hex::FromHexError),

    #[error("Failed to encode signing message: {0}")]
    MessageEncodingFailed(#[from] serde_json::Error),

    #[error("Signature verification failed: {0}")]
    SignatureVerificationFailed(#[source] ProcessorError),

    #[error("Presentation {index} failed verification: {source}")]
    PresentationVerificationFailed {
        index: usize,
        #[source]
        source: ProcessorError,
    },

    #[error("Failed to extract credentials: {0}")]
    CredentialExtractionFailed(#[source] ProcessorError),
}

impl LoginError {
    /// Stable identifier of the failure, suitable for logs and API error codes.
    pub fn kind(&self) -> &'static str {
        match self {
            LoginError::WrongVersion(_) => "WrongVersion",
            LoginError::TypeNotSupported(_) => "TypeNotSupported",
            LoginError::ActionNotSupported(_) => "ActionNotSupported",
            LoginError::MalformedReference(_) => "MalformedReference",
            LoginError::DidMismatch { .. } => "DidMismatch",
            LoginError::UnsupportedChain(_) => "UnsupportedChain",
            LoginError::NonceInvalid(_) => "NonceInvalid",
            LoginError::NonceMintFailed(_) => "NonceMintFailed",
            LoginError::SignatureDecodeFailed(_) => "SignatureDecodeFailed",
            LoginError::MessageEncodingFailed(_) => "MessageEncodingFailed",
            LoginError::SignatureVerificationFailed(_) => "SignatureVerificationFailed",
            LoginError::PresentationVerificationFailed { .. } => "PresentationVerificationFailed",
            LoginError::CredentialExtractionFailed(_) => "CredentialExtractionFailed",
        }
    }
}

pub type LoginResult<T> = Result<T, LoginError>;
