use crate::did::{parse_verification_method, DidProcessor};
use crate::error::{LoginError, LoginResult};
use crate::messages::{Action, ClientResponse, ClientResponseMsg, SYS_VER, TYPE_CLIENT_RESPONSE};
use crate::sdk::LoginSdk;
use log::{debug, info, warn};
use std::sync::Arc;

/// Outcome of a successful [`LoginSdk::validate_client_response`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedLogin {
    /// DID as written in the verification method.
    pub did: String,
    pub key_index: u32,
    pub chain: String,
    /// Action the challenge nonce was issued for.
    pub action: Action,
}

impl LoginSdk {
    /// Validate a signed client response.
    ///
    /// Steps run strictly in order, each a hard stop:
    /// 1. version and message type
    /// 2. verification method parse, DID match
    /// 3. chain processor lookup
    /// 4. nonce lookup (consumes the nonce)
    /// 5. canonical message reconstruction
    /// 6. proof value hex decode
    /// 7. signature verification
    /// 8. presentation verification, all-or-nothing
    pub async fn validate_client_response(&self, response: &ClientResponse) -> LoginResult<ValidatedLogin> {
        debug!("Validating client response for {}", response.did);

        self.validate_inner(response).await.inspect_err(|e| {
            warn!(
                "Rejected client response for {}: {} ({})",
                response.did,
                e,
                e.kind()
            );
        })
    }

    async fn validate_inner(&self, response: &ClientResponse) -> LoginResult<ValidatedLogin> {
        // 1. Format
        if !response.ver.eq_ignore_ascii_case(SYS_VER) {
            return Err(LoginError::WrongVersion(response.ver.clone()));
        }
        if !response.msg_type.eq_ignore_ascii_case(TYPE_CLIENT_RESPONSE) {
            return Err(LoginError::TypeNotSupported(response.msg_type.clone()));
        }

        // 2. Reference
        let method = parse_verification_method(&response.proof.verification_method)?;
        if !method.did.eq_ignore_ascii_case(&response.did) {
            return Err(LoginError::DidMismatch {
                did: response.did.clone(),
                method_did: method.did,
            });
        }

        // 3. Chain
        let chain = method.chain()?.to_ascii_lowercase();
        let processor: &Arc<dyn DidProcessor> = self
            .processors
            .get(&chain)
            .ok_or_else(|| LoginError::UnsupportedChain(chain.clone()))?;

        // 4. Nonce
        let action = self
            .nonces
            .resolve_action(&response.nonce)
            .await
            .map_err(LoginError::NonceInvalid)?;

        // 5. Canonical message
        let message = ClientResponseMsg {
            msg_type: response.msg_type.clone(),
            server: self.config.server_info.to_sign(),
            nonce: response.nonce.clone(),
            did: method.did.clone(),
            created: response.proof.created,
        }
        .to_signing_bytes()?;

        // 6. Signature bytes
        let signature = hex::decode(&response.proof.value)?;

        // 7. Signature
        processor
            .verify_sig(&method.did, method.key_index, &message, &signature)
            .await
            .map_err(LoginError::SignatureVerificationFailed)?;

        // 8. Presentations
        if !response.vps.is_empty() {
            let required_types = self.config.required_types(action);
            for (index, vp) in response.vps.iter().enumerate() {
                processor
                    .verify_presentation(&method.did, method.key_index, vp, &required_types)
                    .await
                    .map_err(|source| LoginError::PresentationVerificationFailed { index, source })?;
            }
        }

        info!(
            "Client response validated for {} on chain {} ({})",
            method.did, chain, action
        );

        Ok(ValidatedLogin {
            did: method.did,
            key_index: method.key_index,
            chain,
            action,
        })
    }
}
