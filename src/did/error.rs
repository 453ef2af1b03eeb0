//! Error types for DID parsing and per-chain processors.

use thiserror::Error;

/// Errors raised while parsing DIDs and verification-method references.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReferenceError {
    #[error("Malformed verification method {reference:?}: {reason}")]
    MalformedReference { reference: String, reason: String },

    #[error("Malformed DID {did:?}: expected did:<chain>:<identifier>")]
    MalformedDid { did: String },
}

/// Errors returned by a [`DidProcessor`](crate::did::DidProcessor).
#[derive(Debug, Error)]
pub enum ProcessorError {
    #[error("DID not found: {did}")]
    DidNotFound { did: String },

    #[error("Key {key_index} not found for {did}")]
    KeyNotFound { did: String, key_index: u32 },

    #[error("Invalid signature: {reason}")]
    InvalidSignature { reason: String },

    #[error("Invalid presentation: {reason}")]
    InvalidPresentation { reason: String },

    #[error("Missing required credential type: {vc_type}")]
    MissingCredentialType { vc_type: String },

    #[error("Token expired (now {now})")]
    Expired { now: i64 },

    #[error("Processor backend error: {0}")]
    Backend(String),
}

impl ProcessorError {
    pub(crate) fn presentation(reason: impl Into<String>) -> Self {
        ProcessorError::InvalidPresentation {
            reason: reason.into(),
        }
    }

    pub(crate) fn signature(reason: impl Into<String>) -> Self {
        ProcessorError::InvalidSignature {
            reason: reason.into(),
        }
    }
}
