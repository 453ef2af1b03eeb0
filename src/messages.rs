//! Wire messages for the DID login handshake.
//!
//! The handshake is three messages long:
//!
//! ```text
//! client                                server
//!   │ ── ClientHello { action } ──────────▶ │  mint nonce bound to action
//!   │ ◀───────── ServerHello { nonce, .. } ─ │
//!   │  sign ClientResponseMsg               │
//!   │ ── ClientResponse { proof, VPs } ───▶ │  verify signature + presentations
//! ```
//!
//! Field names and ordering follow the JSON encoding used by client-side
//! signers. `ClientResponseMsg` in particular is a signing contract: changing
//! its field order or omission rules breaks every deployed client.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Supported protocol version.
pub const SYS_VER: &str = "v1";

/// Type tag of a [`ClientHello`].
pub const TYPE_CLIENT_HELLO: &str = "client_hello";

/// Type tag of a [`ServerHello`].
pub const TYPE_SERVER_HELLO: &str = "server_hello";

/// Type tag of a [`ClientResponse`].
pub const TYPE_CLIENT_RESPONSE: &str = "client_response";

/// Action a client asks to perform. Encoded as an integer on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Authorization,
    Certification,
}

impl Action {
    pub const fn code(self) -> i32 {
        match self {
            Action::Authorization => 0,
            Action::Certification => 1,
        }
    }
}

impl TryFrom<i32> for Action {
    type Error = i32;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Action::Authorization),
            1 => Ok(Action::Certification),
            other => Err(other),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Authorization => write!(f, "authorization"),
            Action::Certification => write!(f, "certification"),
        }
    }
}

/// First message of a session, sent by the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientHello {
    pub ver: String,
    #[serde(rename = "type")]
    pub msg_type: String,
    /// Raw action code; validated against [`Action`] by the challenge issuer.
    pub action: i32,
}

/// Identity of the relying-party server, as advertised in the challenge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerInfo {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub icon: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub did: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub verification_method: String,
}

impl ServerInfo {
    /// The reduced descriptor that is covered by the client's signature.
    pub fn to_sign(&self) -> ServerInfoToSign {
        ServerInfoToSign {
            name: self.name.clone(),
            url: self.url.clone(),
            did: self.did.clone(),
        }
    }
}

/// Server fields included in the signed payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerInfoToSign {
    pub name: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub did: String,
}

/// Credential policy entry for an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VcFilter {
    #[serde(rename = "type")]
    pub vc_type: String,
    #[serde(default)]
    pub required: bool,
}

impl VcFilter {
    pub fn required(vc_type: impl Into<String>) -> Self {
        Self {
            vc_type: vc_type.into(),
            required: true,
        }
    }

    pub fn optional(vc_type: impl Into<String>) -> Self {
        Self {
            vc_type: vc_type.into(),
            required: false,
        }
    }
}

/// Challenge returned to the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerHello {
    pub ver: String,
    #[serde(rename = "type")]
    pub msg_type: String,
    pub nonce: String,
    pub server: ServerInfo,
    pub chain: Vec<String>,
    pub alg: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vc_filters: Option<Vec<VcFilter>>,
}

/// Signature over the canonical [`ClientResponseMsg`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proof {
    /// `<did>#key-<index>`
    pub verification_method: String,
    /// Creation time in seconds since the Unix epoch.
    pub created: u64,
    /// Hex-encoded signature bytes.
    pub value: String,
}

/// Signed reply to a [`ServerHello`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientResponse {
    pub ver: String,
    #[serde(rename = "type")]
    pub msg_type: String,
    pub did: String,
    pub nonce: String,
    pub proof: Proof,
    /// Verifiable presentations, opaque at this layer.
    #[serde(rename = "VPs", default, skip_serializing_if = "Vec::is_empty")]
    pub vps: Vec<String>,
}

/// The exact structure a client signs.
///
/// Serialized with `serde_json` in declaration order, no whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientResponseMsg {
    #[serde(rename = "type")]
    pub msg_type: String,
    pub server: ServerInfoToSign,
    pub nonce: String,
    pub did: String,
    pub created: u64,
}

impl ClientResponseMsg {
    /// Canonical bytes covered by [`Proof::value`].
    pub fn to_signing_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}
