//! ES256 compact JWS handling for verifiable presentations.
//!
//! Presentations and the credentials inside them are JWTs signed with a
//! P-256 key from the holder's or issuer's DID document. `exp` is optional;
//! when present it must be a NumericDate in the future.

use crate::did::error::ProcessorError;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::Utc;
use jsonwebtoken::errors::{Error as JwtError, ErrorKind};
use jsonwebtoken::{decode, decode_header, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use p256::ecdsa::{SigningKey, VerifyingKey};
use p256::pkcs8::EncodePrivateKey;
use serde_json::Value;

/// A JWS whose signature and expiry have been checked.
#[derive(Debug, Clone)]
pub struct VerifiedJws {
    pub header: Header,
    pub claims: Value,
}

impl VerifiedJws {
    /// String claim `name`, if present.
    pub fn claim_str(&self, name: &str) -> Option<&str> {
        self.claims.get(name).and_then(Value::as_str)
    }
}

/// `kid` from the header of `token`, before any verification.
pub fn header_kid(token: &str) -> Result<Option<String>, ProcessorError> {
    let header = decode_header(token)
        .map_err(|e| ProcessorError::presentation(format!("Invalid JWS header: {}", e)))?;
    Ok(header.kid)
}

fn decoding_key(key: &VerifyingKey) -> Result<DecodingKey, ProcessorError> {
    let point = key.to_encoded_point(false);
    let (x, y) = match (point.x(), point.y()) {
        (Some(x), Some(y)) => (URL_SAFE_NO_PAD.encode(x), URL_SAFE_NO_PAD.encode(y)),
        _ => return Err(ProcessorError::Backend("P-256 key has no affine coordinates".to_string())),
    };

    DecodingKey::from_ec_components(&x, &y)
        .map_err(|e| ProcessorError::Backend(format!("Invalid P-256 key: {}", e)))
}

fn es256_validation() -> Validation {
    let mut validation = Validation::new(Algorithm::ES256);
    validation.set_required_spec_claims::<&str>(&[]);
    validation.validate_exp = true;
    validation.validate_aud = false;
    validation.leeway = 0;
    validation
}

/// Verify the ES256 signature of `token` against `key` and check `exp`.
pub fn verify_es256(token: &str, key: &VerifyingKey) -> Result<VerifiedJws, ProcessorError> {
    let data = decode::<Value>(token, &decoding_key(key)?, &es256_validation()).map_err(|e| {
        match e.kind() {
            ErrorKind::ExpiredSignature => ProcessorError::Expired {
                now: Utc::now().timestamp(),
            },
            ErrorKind::InvalidSignature => ProcessorError::presentation("JWS signature does not match key"),
            ErrorKind::InvalidAlgorithm => ProcessorError::presentation("Unsupported JWS algorithm"),
            _ => ProcessorError::presentation(format!("Invalid JWS: {}", e)),
        }
    })?;

    check_exp(&data.claims)?;

    Ok(VerifiedJws {
        header: data.header,
        claims: data.claims,
    })
}

// jsonwebtoken only understands integer `exp`; fractional or non-numeric
// values would otherwise pass as absent.
fn check_exp(claims: &Value) -> Result<(), ProcessorError> {
    let Some(exp) = claims.get("exp") else {
        return Ok(());
    };
    let exp = exp
        .as_f64()
        .ok_or_else(|| ProcessorError::presentation("exp claim is not a NumericDate"))?;

    let now = Utc::now().timestamp();
    if exp <= now as f64 {
        return Err(ProcessorError::Expired { now });
    }
    Ok(())
}

/// Claims of `token` with no signature or time checks.
pub fn decode_unverified(token: &str) -> Result<Value, ProcessorError> {
    let mut validation = Validation::new(Algorithm::ES256);
    validation.insecure_disable_signature_validation();
    validation.set_required_spec_claims::<&str>(&[]);
    validation.validate_exp = false;
    validation.validate_aud = false;

    decode::<Value>(token, &DecodingKey::from_secret(&[]), &validation)
        .map(|data| data.claims)
        .map_err(|e| ProcessorError::presentation(format!("Invalid JWS: {}", e)))
}

/// Produce an ES256 compact JWS over `claims`, with `kid` in the header.
pub fn sign_es256(kid: &str, claims: &Value, key: &SigningKey) -> Result<String, JwtError> {
    let mut header = Header::new(Algorithm::ES256);
    header.kid = Some(kid.to_string());

    let der = key
        .to_pkcs8_der()
        .map_err(|_| JwtError::from(ErrorKind::InvalidEcdsaKey))?;
    encode(&header, claims, &EncodingKey::from_ec_der(der.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn key(seed: u8) -> SigningKey {
        SigningKey::from_slice(&[seed; 32]).unwrap()
    }

    #[test]
    fn test_sign_then_verify() {
        let signing_key = key(7);
        let token = sign_es256("did:ont:abc#key-0", &json!({"iss": "did:ont:abc"}), &signing_key).unwrap();

        assert_eq!(header_kid(&token).unwrap().as_deref(), Some("did:ont:abc#key-0"));

        let jws = verify_es256(&token, signing_key.verifying_key()).unwrap();
        assert_eq!(jws.header.kid.as_deref(), Some("did:ont:abc#key-0"));
        assert_eq!(jws.claim_str("iss"), Some("did:ont:abc"));

        assert!(matches!(
            verify_es256(&token, key(8).verifying_key()),
            Err(ProcessorError::InvalidPresentation { .. })
        ));
    }

    #[test]
    fn test_rejects_tampered_payload() {
        let signing_key = key(7);
        let token = sign_es256("k", &json!({"iss": "did:ont:abc"}), &signing_key).unwrap();
        let forged_payload = URL_SAFE_NO_PAD.encode(br#"{"iss":"did:ont:evil"}"#);
        let parts: Vec<&str> = token.split('.').collect();
        let forged = format!("{}.{}.{}", parts[0], forged_payload, parts[2]);

        assert!(verify_es256(&forged, signing_key.verifying_key()).is_err());
        assert_eq!(decode_unverified(&forged).unwrap()["iss"], "did:ont:evil");
    }

    #[test]
    fn test_rejects_other_algorithms() {
        let token = encode(
            &Header::new(Algorithm::HS256),
            &json!({"iss": "did:ont:abc"}),
            &EncodingKey::from_secret(b"shared"),
        )
        .unwrap();

        assert!(matches!(
            verify_es256(&token, key(7).verifying_key()),
            Err(ProcessorError::InvalidPresentation { .. })
        ));
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(verify_es256("not-a-jws", key(7).verifying_key()).is_err());
        assert!(header_kid("a.b.c").is_err());
        assert!(decode_unverified("a.b.c").is_err());
    }

    #[test]
    fn test_expiry() {
        let signing_key = key(3);
        let verify = |claims: Value| verify_es256(&sign_es256("k", &claims, &signing_key).unwrap(), signing_key.verifying_key());

        assert!(matches!(verify(json!({"exp": 1})), Err(ProcessorError::Expired { .. })));
        assert!(verify(json!({"exp": Utc::now().timestamp() + 3600})).is_ok());
        assert!(verify(json!({"iss": "did:ont:abc"})).is_ok());
    }

    #[test]
    fn test_fractional_and_non_numeric_exp() {
        let signing_key = key(3);
        let verify = |claims: Value| verify_es256(&sign_es256("k", &claims, &signing_key).unwrap(), signing_key.verifying_key());

        assert!(matches!(verify(json!({"exp": 1.5})), Err(ProcessorError::Expired { .. })));
        assert!(matches!(
            verify(json!({"exp": "1"})),
            Err(ProcessorError::InvalidPresentation { .. })
        ));

        let later = Utc::now().timestamp() as f64 + 3600.5;
        assert!(verify(json!({"exp": later})).is_ok());
    }
}
