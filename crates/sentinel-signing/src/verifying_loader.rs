//! Verifying loader (spec §4.7): composes the raw loader and verifier with
//! an enforcement/warn split, and owns the bijective policy/signature path
//! derivation.

use crate::envelope::{EnvelopeParseError, SignatureEnvelope};
use crate::raw_loader::{LoadError, RawLoader};
use crate::signer::{Verifier, VerifyError};
use sentinel_policy::Policy;
use thiserror::Error;
use tracing::warn;

const POLICIES_PREFIX: &str = "/sentinel/policies/";
const SIGNATURES_PREFIX: &str = "/sentinel/signatures/";

/// Swap the `policies` prefix for `signatures`, or prepend the signatures
/// prefix for a non-standard path. Bijective for standard paths: applying
/// [`derive_policy_path`] to the result recovers the original.
#[must_use]
pub fn derive_sig_path(policy_path: &str) -> String {
    match policy_path.strip_prefix(POLICIES_PREFIX) {
        Some(rest) => format!("{SIGNATURES_PREFIX}{rest}"),
        None => format!("{SIGNATURES_PREFIX}{policy_path}"),
    }
}

/// Inverse of [`derive_sig_path`] for standard paths.
#[must_use]
pub fn derive_policy_path(sig_path: &str) -> String {
    match sig_path.strip_prefix(SIGNATURES_PREFIX) {
        Some(rest) => format!("{POLICIES_PREFIX}{rest}"),
        None => format!("{POLICIES_PREFIX}{sig_path}"),
    }
}

/// The error taxonomy exported by the verifying loader (spec §4.7, §7).
/// Messages never leak the configuration store's internal path
/// conventions — callers log them to structured audit, not to end users.
#[derive(Debug, Error)]
pub enum VerifyingLoaderError {
    /// No policy at `policy_path`.
    #[error("policy not found")]
    PolicyNotFound,
    /// The signature path had nothing stored and `enforce` was set.
    #[error("signature required but none found")]
    SignatureEnforced,
    /// Present for symmetry with the `logged, not failed` disposition in
    /// spec §7; never constructed as an `Err` by [`VerifyingLoader::load`]
    /// itself (the non-enforcing, missing-signature path returns `Ok`).
    #[error("signature missing")]
    SignatureMissing,
    /// The signature envelope failed cryptographic verification.
    #[error("policy signature invalid")]
    SignatureInvalid,
    /// Network, auth, or other transport-layer failure.
    #[error("transport error")]
    Transport,
    /// The envelope or policy document failed to parse.
    #[error("parse error: {0}")]
    ParseError(String),
}

impl From<EnvelopeParseError> for VerifyingLoaderError {
    fn from(_: EnvelopeParseError) -> Self {
        Self::ParseError("malformed signature envelope".to_string())
    }
}

impl From<VerifyError> for VerifyingLoaderError {
    fn from(_: VerifyError) -> Self {
        Self::Transport
    }
}

/// The outcome of a successful load: the parsed policy and whether it was
/// verified or admitted unsigned under a warn-only posture.
#[derive(Debug, Clone)]
pub struct LoadedPolicy {
    /// The parsed, not-yet-structurally-validated policy.
    pub policy: Policy,
    /// `false` only when `enforce` is unset and no signature was found.
    pub verified: bool,
}

/// Composes a [`RawLoader`] (used for both the policy path and its derived
/// signature path) with a [`Verifier`], under an enforcement flag.
pub struct VerifyingLoader<L, V> {
    loader: L,
    verifier: V,
    /// When set, a missing signature fails closed instead of warning.
    pub enforce: bool,
}

impl<L: RawLoader, V: Verifier> VerifyingLoader<L, V> {
    /// Construct a verifying loader. `enforce=true` is the production
    /// posture; `enforce=false` is intended for local development only.
    #[must_use]
    pub fn new(loader: L, verifier: V, enforce: bool) -> Self {
        Self { loader, verifier, enforce }
    }

    /// Load, verify, and parse the policy at `policy_path`.
    ///
    /// # Errors
    /// See [`VerifyingLoaderError`]. Never falls through to a permissive
    /// result on any error path; absence of a usable policy is always a
    /// `deny`, never an implicit allow.
    pub fn load(&self, policy_path: &str) -> Result<LoadedPolicy, VerifyingLoaderError> {
        let raw = self.loader.load_raw(policy_path).map_err(|e| match e {
            LoadError::NotFound(_) => VerifyingLoaderError::PolicyNotFound,
            LoadError::Transport { .. } => VerifyingLoaderError::Transport,
        })?;

        let sig_path = derive_sig_path(policy_path);
        let sig_bytes = match self.loader.load_raw(&sig_path) {
            Ok(bytes) => bytes,
            Err(LoadError::NotFound(_)) => {
                if self.enforce {
                    return Err(VerifyingLoaderError::SignatureEnforced);
                }
                warn!(error_code = "signature_missing", %policy_path, "loading policy without a signature");
                let policy = Policy::from_yaml_bytes(&raw)
                    .map_err(|e| VerifyingLoaderError::ParseError(e.to_string()))?;
                return Ok(LoadedPolicy { policy, verified: false });
            }
            Err(LoadError::Transport { .. }) => return Err(VerifyingLoaderError::Transport),
        };

        let envelope = SignatureEnvelope::from_json_bytes(&sig_bytes)?;
        let signature = envelope.signature_bytes()?;
        let ok = self.verifier.verify(&raw, &signature)?;
        if !ok {
            return Err(VerifyingLoaderError::SignatureInvalid);
        }

        let policy = Policy::from_yaml_bytes(&raw).map_err(|e| VerifyingLoaderError::ParseError(e.to_string()))?;
        Ok(LoadedPolicy { policy, verified: true })
    }
}
