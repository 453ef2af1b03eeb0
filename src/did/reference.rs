//! Parsing of DIDs and `did#key-<index>` verification-method references.

use crate::did::error::ReferenceError;
use std::fmt;
use std::str::FromStr;

/// A parsed verification-method reference: the DID and the key index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VerificationMethodRef {
    pub did: String,
    pub key_index: u32,
}

impl VerificationMethodRef {
    /// Chain segment of the referenced DID.
    pub fn chain(&self) -> Result<&str, ReferenceError> {
        did_chain(&self.did)
    }
}

impl FromStr for VerificationMethodRef {
    type Err = ReferenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_verification_method(s)
    }
}

impl fmt::Display for VerificationMethodRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#key-{}", self.did, self.key_index)
    }
}

/// Parse `<did>#<prefix>-<index>` into its DID and key index.
///
/// The prefix is not checked, so both `key-0` and `keys-1` are accepted.
pub fn parse_verification_method(reference: &str) -> Result<VerificationMethodRef, ReferenceError> {
    let malformed = |reason: &str| ReferenceError::MalformedReference {
        reference: reference.to_string(),
        reason: reason.to_string(),
    };

    let parts: Vec<&str> = reference.split('#').collect();
    if parts.len() != 2 {
        return Err(malformed("expected exactly one '#'"));
    }

    let key_parts: Vec<&str> = parts[1].split('-').collect();
    if key_parts.len() != 2 {
        return Err(malformed("expected key fragment of the form key-<index>"));
    }

    let key_index = key_parts[1]
        .parse::<u32>()
        .map_err(|_| malformed("key index is not a non-negative integer"))?;

    Ok(VerificationMethodRef {
        did: parts[0].to_string(),
        key_index,
    })
}

/// Chain identifier of a `did:<chain>:<identifier>` string.
pub fn did_chain(did: &str) -> Result<&str, ReferenceError> {
    let parts: Vec<&str> = did.split(':').collect();
    if parts.len() != 3 {
        return Err(ReferenceError::MalformedDid {
            did: did.to_string(),
        });
    }
    Ok(parts[1])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_did_chain() {
        assert_eq!(did_chain("did:ont:testdid").unwrap(), "ont");
        assert_eq!(did_chain("did:etho:0x1234").unwrap(), "etho");
    }

    #[test]
    fn test_did_chain_rejects_wrong_segment_count() {
        for did in ["did:ont", "did:ont:a:b", "", "ont", "did:ont:abc#key-1:x"] {
            assert!(
                matches!(did_chain(did), Err(ReferenceError::MalformedDid { .. })),
                "{did} should be rejected"
            );
        }
    }

    #[test]
    fn test_parse_verification_method() {
        let parsed = parse_verification_method("did:ont:abc#key-0").unwrap();
        assert_eq!(parsed.did, "did:ont:abc");
        assert_eq!(parsed.key_index, 0);

        let parsed: VerificationMethodRef = "did:ont:abc#keys-12".parse().unwrap();
        assert_eq!(parsed.key_index, 12);
        assert_eq!(parsed.chain().unwrap(), "ont");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        let cases = [
            "did:ont:abc",         // no '#'
            "did:ont:abc#a#key-1", // two '#'
            "did:ont:abc#key1",    // no '-'
            "did:ont:abc#key-1-2", // two '-'
            "did:ont:abc#key-x",   // non-integer
            "did:ont:abc#key--1",  // negative
            "did:ont:abc#key-",    // empty index
        ];
        for reference in cases {
            assert!(
                matches!(
                    parse_verification_method(reference),
                    Err(ReferenceError::MalformedReference { .. })
                ),
                "{reference} should be rejected"
            );
        }
    }

    #[test]
    fn test_display_round_trip() {
        let parsed = parse_verification_method("did:ont:abc#key-3").unwrap();
        assert_eq!(parsed.to_string(), "did:ont:abc#key-3");
    }
}
