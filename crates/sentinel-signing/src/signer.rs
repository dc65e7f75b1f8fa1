//! KMS-style asymmetric signing and verification of raw policy bytes
//! (spec §4.6). Default algorithm: `RSASSA_PSS_SHA_256`.

use rsa::pss::{Signature, SigningKey, VerifyingKey};
use rsa::signature::{RandomizedSigner, SignatureEncoding, Verifier as RsaVerifier};
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

/// The one algorithm identifier this crate emits and accepts.
pub const ALGORITHM: &str = "RSASSA_PSS_SHA_256";

/// Infrastructure failure while signing: network, access, or missing key.
/// Distinguished from a cryptographically-invalid result, which is not an
/// error at all.
#[derive(Debug, Error)]
pub enum SignError {
    /// The KMS-style backend could not produce a signature.
    #[error("signing backend failure: {0}")]
    Backend(String),
}

/// Infrastructure failure while verifying. A `(false, Ok(()))` outcome
/// ("cryptographically invalid") is represented by [`Verifier::verify`]'s
/// `Ok(false)`, never by this error — callers must treat `Err` as
/// fail-closed just as strictly as an invalid signature.
#[derive(Debug, Error)]
pub enum VerifyError {
    /// The KMS-style backend could not complete the verify call.
    #[error("verification backend failure: {0}")]
    Backend(String),
}

/// Signs raw policy bytes. Operates on the bytes directly — the backend
/// hashes internally with its declared algorithm, not the caller.
pub trait Signer: Send + Sync {
    /// Sign `policy_bytes`, returning the raw signature bytes.
    ///
    /// # Errors
    /// Returns [`SignError`] on any backend failure.
    fn sign(&self, policy_bytes: &[u8]) -> Result<Vec<u8>, SignError>;

    /// The key identifier this signer attributes to its signatures.
    fn key_id(&self) -> &str;
}

/// Verifies a signature produced by the matching [`Signer`].
pub trait Verifier: Send + Sync {
    /// Check `signature_bytes` against `policy_bytes`.
    ///
    /// Returns `Ok(true)` for a valid signature, `Ok(false)` for a
    /// cryptographically invalid one (a result, not an error), and `Err`
    /// only for an infrastructure failure that the caller must treat as
    /// fail-closed.
    ///
    /// # Errors
    /// Returns [`VerifyError`] on any backend failure.
    fn verify(&self, policy_bytes: &[u8], signature_bytes: &[u8]) -> Result<bool, VerifyError>;
}

/// A stateless, freely-shareable `RSASSA_PSS_SHA_256` signer/verifier pair
/// built on an in-process RSA keypair, standing in for a networked KMS.
#[derive(Clone)]
pub struct RsaPssSigner {
    key_id: String,
    private_key: RsaPrivateKey,
}

impl RsaPssSigner {
    /// Wrap an existing keypair under `key_id`.
    #[must_use]
    pub fn new(key_id: impl Into<String>, private_key: RsaPrivateKey) -> Self {
        Self { key_id: key_id.into(), private_key }
    }

    /// The public half, for constructing an [`RsaPssVerifier`].
    #[must_use]
    pub fn public_key(&self) -> RsaPublicKey {
        RsaPublicKey::from(&self.private_key)
    }
}

impl Signer for RsaPssSigner {
    fn sign(&self, policy_bytes: &[u8]) -> Result<Vec<u8>, SignError> {
        let signing_key = SigningKey::<Sha256>::new(self.private_key.clone());
        let mut rng = rand::thread_rng();
        let signature = signing_key.sign_with_rng(&mut rng, policy_bytes);
        Ok(signature.to_vec())
    }

    fn key_id(&self) -> &str {
        &self.key_id
    }
}

/// The verifying half of an [`RsaPssSigner`]'s keypair. Stateless except
/// for the immutable public key; freely shareable across threads.
#[derive(Clone)]
pub struct RsaPssVerifier {
    public_key: RsaPublicKey,
}

impl RsaPssVerifier {
    /// Construct a verifier from the signer's public key.
    #[must_use]
    pub fn new(public_key: RsaPublicKey) -> Self {
        Self { public_key }
    }
}

impl Verifier for RsaPssVerifier {
    fn verify(&self, policy_bytes: &[u8], signature_bytes: &[u8]) -> Result<bool, VerifyError> {
        let signature = Signature::try_from(signature_bytes).map_err(|e| VerifyError::Backend(e.to_string()))?;
        let verifying_key = VerifyingKey::<Sha256>::new(self.public_key.clone());
        Ok(verifying_key.verify(policy_bytes, &signature).is_ok())
    }
}

/// Hex-encoded SHA-256 digest of `bytes`, used as an advisory fast-reject
/// hint. Never a substitute for the cryptographic check in
/// [`Verifier::verify`].
#[must_use]
pub fn compute_policy_hash(bytes: &[u8]) -> String {
    use sha2::Digest;
    let digest = Sha256::digest(bytes);
    hex::encode(digest)
}

/// Constant-time comparison of two hex digest strings, as required by the
/// fast-reject path (spec §4.6).
#[must_use]
pub fn hashes_match(expected_hex: &str, actual_hex: &str) -> bool {
    expected_hex.as_bytes().ct_eq(actual_hex.as_bytes()).into()
}
