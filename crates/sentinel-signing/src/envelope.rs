//! Signature envelope (spec §3.9, §6.3): the transport form stored at a
//! sibling path to the policy bytes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Metadata carried alongside a signature. Opaque to the evaluator except
/// for `policy_hash`, which is an advisory fast-reject hint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SignatureMetadata {
    /// Identifier of the signing key, as reported by the KMS-style backend.
    pub key_id: String,
    /// Signing algorithm. Currently always `RSASSA_PSS_SHA_256`.
    pub algorithm: String,
    /// When the signature was produced.
    pub signed_at: DateTime<Utc>,
    /// Lowercase hex SHA-256 of the signed policy bytes.
    pub policy_hash: String,
}

/// The JSON envelope stored at the signature path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SignatureEnvelope {
    /// Base64-encoded signature bytes.
    pub signature: String,
    /// Envelope metadata.
    pub metadata: SignatureMetadata,
}

/// A malformed envelope document, caught at parse time and never passed
/// through to the signature check.
#[derive(Debug, Error)]
pub enum EnvelopeParseError {
    /// The JSON document does not match the envelope shape.
    #[error("malformed signature envelope: {0}")]
    Malformed(String),
    /// `signature` is not valid base64.
    #[error("signature field is not valid base64: {0}")]
    InvalidBase64(String),
}

impl SignatureEnvelope {
    /// Parse an envelope from JSON bytes.
    ///
    /// # Errors
    /// Returns [`EnvelopeParseError::Malformed`] if the document does not
    /// match the envelope shape.
    pub fn from_json_bytes(bytes: &[u8]) -> Result<Self, EnvelopeParseError> {
        serde_json::from_slice(bytes).map_err(|e| EnvelopeParseError::Malformed(e.to_string()))
    }

    /// Decode the base64 `signature` field into raw bytes.
    ///
    /// # Errors
    /// Returns [`EnvelopeParseError::InvalidBase64`] if `signature` is not
    /// valid base64.
    pub fn signature_bytes(&self) -> Result<Vec<u8>, EnvelopeParseError> {
        use base64::engine::general_purpose::STANDARD;
        use base64::Engine as _;
        STANDARD.decode(&self.signature).map_err(|e| EnvelopeParseError::InvalidBase64(e.to_string()))
    }
}
