//! DID processor backed by locally registered P-256 key material.
//!
//! Useful for chains whose DID documents are provisioned out of band, and as
//! the reference implementation of [`DidProcessor`] in tests. Documents are
//! fixed at construction; there is no fetching, caching or revocation.

use crate::config::ConfigError;
use crate::did::error::ProcessorError;
use crate::did::jws::{decode_unverified, header_kid, verify_es256};
use crate::did::reference::parse_verification_method;
use crate::did::DidProcessor;
use async_trait::async_trait;
use log::{debug, warn};
use p256::ecdsa::signature::Verifier;
use p256::ecdsa::{Signature, VerifyingKey};
use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};

/// DID document as accepted by [`LocalKeyProcessorBuilder::with_json_documents`].
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalDidDocument {
    pub id: String,
    /// Hex-encoded SEC1 public keys, in key-index order.
    pub public_keys: Vec<String>,
}

/// Processor verifying ES256 signatures and VP-JWTs against in-memory keys.
#[derive(Debug, Clone)]
pub struct LocalKeyProcessor {
    /// Keyed by lowercased DID.
    documents: HashMap<String, Vec<VerifyingKey>>,
}

/// Builder for [`LocalKeyProcessor`].
#[derive(Debug, Default)]
pub struct LocalKeyProcessorBuilder {
    documents: HashMap<String, Vec<VerifyingKey>>,
}

impl LocalKeyProcessorBuilder {
    /// Register `keys` for `did`; key index `n` is `keys[n]`.
    pub fn with_document(mut self, did: &str, keys: Vec<VerifyingKey>) -> Self {
        self.documents.insert(did.to_ascii_lowercase(), keys);
        self
    }

    /// Register documents from their JSON form.
    pub fn with_json_documents(mut self, json: &str) -> Result<Self, ConfigError> {
        let documents: Vec<LocalDidDocument> = serde_json::from_str(json)?;

        for doc in documents {
            let keys = doc
                .public_keys
                .iter()
                .map(|hex_key| {
                    let bytes = hex::decode(hex_key).map_err(|e| {
                        ConfigError::Invalid(format!("Invalid key hex for {}: {}", doc.id, e))
                    })?;
                    VerifyingKey::from_sec1_bytes(&bytes).map_err(|e| {
                        ConfigError::Invalid(format!("Invalid P-256 key for {}: {}", doc.id, e))
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            self = self.with_document(&doc.id, keys);
        }

        Ok(self)
    }

    pub fn build(self) -> LocalKeyProcessor {
        LocalKeyProcessor {
            documents: self.documents,
        }
    }
}

impl LocalKeyProcessor {
    pub fn builder() -> LocalKeyProcessorBuilder {
        LocalKeyProcessorBuilder::default()
    }

    fn key(&self, did: &str, key_index: u32) -> Result<&VerifyingKey, ProcessorError> {
        let keys = self
            .documents
            .get(&did.to_ascii_lowercase())
            .ok_or_else(|| ProcessorError::DidNotFound {
                did: did.to_string(),
            })?;

        keys.get(key_index as usize)
            .ok_or_else(|| ProcessorError::KeyNotFound {
                did: did.to_string(),
                key_index,
            })
    }

    /// Verify one embedded credential and return its `vc.type` entries.
    fn verify_credential(&self, holder: &str, credential: &str) -> Result<Vec<String>, ProcessorError> {
        let kid = header_kid(credential)?
            .ok_or_else(|| ProcessorError::presentation("Credential header has no kid"))?;
        let issuer = parse_verification_method(&kid)
            .map_err(|e| ProcessorError::presentation(format!("Invalid credential kid: {}", e)))?;

        let jws = verify_es256(credential, self.key(&issuer.did, issuer.key_index)?)?;

        match jws.claim_str("iss") {
            Some(iss) if iss.eq_ignore_ascii_case(&issuer.did) => {}
            _ => {
                return Err(ProcessorError::presentation(format!(
                    "Credential iss does not match signer {}",
                    issuer.did
                )))
            }
        }

        if let Some(sub) = jws.claim_str("sub") {
            if !sub.eq_ignore_ascii_case(holder) {
                return Err(ProcessorError::presentation(format!(
                    "Credential subject {} is not the holder",
                    sub
                )));
            }
        }

        Ok(jws
            .claims
            .pointer("/vc/type")
            .and_then(Value::as_array)
            .map(|types| {
                types
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default())
    }
}

/// Credential JWTs listed in a VP payload.
fn embedded_credentials(vp: &Value) -> Result<Vec<&str>, ProcessorError> {
    let credentials = vp
        .pointer("/vp/verifiableCredential")
        .and_then(Value::as_array)
        .ok_or_else(|| ProcessorError::presentation("Presentation has no vp.verifiableCredential"))?;

    credentials
        .iter()
        .map(|c| {
            c.as_str()
                .ok_or_else(|| ProcessorError::presentation("Embedded credential is not a JWT string"))
        })
        .collect()
}

#[async_trait]
impl DidProcessor for LocalKeyProcessor {
    async fn verify_sig(
        &self,
        did: &str,
        key_index: u32,
        message: &[u8],
        signature: &[u8],
    ) -> Result<(), ProcessorError> {
        let key = self.key(did, key_index)?;

        let sig = Signature::from_slice(signature)
            .map_err(|e| ProcessorError::signature(format!("Invalid ES256 signature format: {}", e)))?;

        key.verify(message, &sig).map_err(|_| {
            warn!("Signature verification failed for {}#key-{}", did, key_index);
            ProcessorError::signature("Signature does not match DID key")
        })
    }

    async fn verify_presentation(
        &self,
        did: &str,
        key_index: u32,
        presentation: &str,
        required_types: &[String],
    ) -> Result<(), ProcessorError> {
        let vp = verify_es256(presentation, self.key(did, key_index)?)?;

        match vp.claim_str("iss") {
            Some(iss) if iss.eq_ignore_ascii_case(did) => {}
            _ => return Err(ProcessorError::presentation("Presentation iss is not the holder")),
        }

        let mut types = BTreeSet::new();
        for credential in embedded_credentials(&vp.claims)? {
            types.extend(self.verify_credential(did, credential)?);
        }

        debug!("Presentation from {} carries credential types {:?}", did, types);

        if let Some(missing) = required_types.iter().find(|t| !types.contains(*t)) {
            return Err(ProcessorError::MissingCredentialType {
                vc_type: missing.clone(),
            });
        }

        Ok(())
    }

    async fn get_credential_jsons(&self, presentation: &str) -> Result<Vec<String>, ProcessorError> {
        let vp = decode_unverified(presentation)?;

        embedded_credentials(&vp)?
            .into_iter()
            .map(|credential| {
                let claims = decode_unverified(credential)?;
                serde_json::to_string(&claims)
                    .map_err(|e| ProcessorError::presentation(format!("Invalid credential JSON: {}", e)))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::did::jws::sign_es256;
    use crate::sdk::test_support::init_logging;
    use p256::ecdsa::signature::Signer;
    use p256::ecdsa::SigningKey;
    use serde_json::json;

    const HOLDER: &str = "did:ont:holder";
    const ISSUER: &str = "did:ont:issuer";

    struct Fixture {
        processor: LocalKeyProcessor,
        holder_key: SigningKey,
        issuer_key: SigningKey,
    }

    fn fixture() -> Fixture {
        init_logging();

        let holder_key = SigningKey::from_slice(&[0x11; 32]).unwrap();
        let issuer_key = SigningKey::from_slice(&[0x22; 32]).unwrap();
        let other_key = SigningKey::from_slice(&[0x33; 32]).unwrap();

        let processor = LocalKeyProcessor::builder()
            .with_document(
                HOLDER,
                vec![VerifyingKey::from(&other_key), VerifyingKey::from(&holder_key)],
            )
            .with_document(ISSUER, vec![VerifyingKey::from(&issuer_key)])
            .build();

        Fixture {
            processor,
            holder_key,
            issuer_key,
        }
    }

    fn credential(f: &Fixture, vc_type: &str) -> String {
        sign_es256(
            &format!("{}#key-0", ISSUER),
            &json!({
                "iss": ISSUER,
                "sub": HOLDER,
                "vc": {"type": ["VerifiableCredential", vc_type]},
            }),
            &f.issuer_key,
        )
        .unwrap()
    }

    fn presentation(f: &Fixture, credentials: Vec<String>) -> String {
        sign_es256(
            &format!("{}#key-1", HOLDER),
            &json!({
                "iss": HOLDER,
                "vp": {"verifiableCredential": credentials},
            }),
            &f.holder_key,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_verify_sig() {
        let f = fixture();
        let message = b"canonical message";
        let signature: Signature = f.holder_key.sign(message);
        let sig_bytes = signature.to_bytes();

        assert!(f.processor.verify_sig(HOLDER, 1, message, &sig_bytes).await.is_ok());
        // DID lookup is case-insensitive.
        assert!(f
            .processor
            .verify_sig("DID:ONT:HOLDER", 1, message, &sig_bytes)
            .await
            .is_ok());

        assert!(matches!(
            f.processor.verify_sig(HOLDER, 0, message, &sig_bytes).await,
            Err(ProcessorError::InvalidSignature { .. })
        ));
        assert!(matches!(
            f.processor.verify_sig(HOLDER, 5, message, &sig_bytes).await,
            Err(ProcessorError::KeyNotFound { key_index: 5, .. })
        ));
        assert!(matches!(
            f.processor.verify_sig("did:ont:nobody", 0, message, &sig_bytes).await,
            Err(ProcessorError::DidNotFound { .. })
        ));
        assert!(matches!(
            f.processor.verify_sig(HOLDER, 1, message, &[0u8; 10]).await,
            Err(ProcessorError::InvalidSignature { .. })
        ));
    }

    #[tokio::test]
    async fn test_verify_presentation_with_required_types() {
        let f = fixture();
        let vp = presentation(&f, vec![credential(&f, "EmailCredential"), credential(&f, "KycCredential")]);

        let required = vec!["EmailCredential".to_string(), "KycCredential".to_string()];
        assert!(f.processor.verify_presentation(HOLDER, 1, &vp, &required).await.is_ok());

        let required = vec!["PassportCredential".to_string()];
        assert!(matches!(
            f.processor.verify_presentation(HOLDER, 1, &vp, &required).await,
            Err(ProcessorError::MissingCredentialType { vc_type }) if vc_type == "PassportCredential"
        ));
    }

    #[tokio::test]
    async fn test_presentation_signed_by_wrong_key() {
        let f = fixture();
        let vp = presentation(&f, vec![credential(&f, "EmailCredential")]);

        assert!(matches!(
            f.processor.verify_presentation(HOLDER, 0, &vp, &[]).await,
            Err(ProcessorError::InvalidPresentation { .. })
        ));
    }

    #[tokio::test]
    async fn test_credential_from_unknown_issuer() {
        let f = fixture();
        let rogue = SigningKey::from_slice(&[0x44; 32]).unwrap();
        let forged = sign_es256(
            "did:ont:rogue#key-0",
            &json!({"iss": "did:ont:rogue", "vc": {"type": ["EmailCredential"]}}),
            &rogue,
        )
        .unwrap();
        let vp = presentation(&f, vec![forged]);

        assert!(matches!(
            f.processor.verify_presentation(HOLDER, 1, &vp, &[]).await,
            Err(ProcessorError::DidNotFound { did }) if did == "did:ont:rogue"
        ));
    }

    #[tokio::test]
    async fn test_credential_for_other_subject() {
        let f = fixture();
        let not_ours = sign_es256(
            &format!("{}#key-0", ISSUER),
            &json!({"iss": ISSUER, "sub": "did:ont:someone", "vc": {"type": ["EmailCredential"]}}),
            &f.issuer_key,
        )
        .unwrap();
        let vp = presentation(&f, vec![not_ours]);

        assert!(f.processor.verify_presentation(HOLDER, 1, &vp, &[]).await.is_err());
    }

    #[tokio::test]
    async fn test_get_credential_jsons() {
        let f = fixture();
        let vp = presentation(&f, vec![credential(&f, "EmailCredential")]);

        let jsons = f.processor.get_credential_jsons(&vp).await.unwrap();
        assert_eq!(jsons.len(), 1);
        let doc: Value = serde_json::from_str(&jsons[0]).unwrap();
        assert_eq!(doc["iss"], ISSUER);
        assert_eq!(doc["vc"]["type"][1], "EmailCredential");
    }

    #[test]
    fn test_json_documents() {
        let key = SigningKey::from_slice(&[0x11; 32]).unwrap();
        let sec1 = hex::encode(key.verifying_key().to_encoded_point(true).as_bytes());
        let json = format!(r#"[{{"id": "did:ont:abc", "publicKeys": ["{}"]}}]"#, sec1);

        let processor = LocalKeyProcessor::builder()
            .with_json_documents(&json)
            .unwrap()
            .build();
        assert!(processor.key("did:ont:abc", 0).is_ok());

        assert!(matches!(
            LocalKeyProcessor::builder().with_json_documents(r#"[{"id": "did:ont:abc", "publicKeys": ["zz"]}]"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            LocalKeyProcessor::builder().with_json_documents(r#"[{"id": "did:ont:abc", "publicKeys": ["02ff"]}]"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            LocalKeyProcessor::builder().with_json_documents("{not json"),
            Err(ConfigError::Parse(_))
        ));
    }
}
