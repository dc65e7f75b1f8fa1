//! Raw policy loading, KMS-style sign/verify, and a fail-closed verifying
//! loader (spec §4.5-§4.7, §3.9).
#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod envelope;
pub mod raw_loader;
pub mod signer;
pub mod verifying_loader;

pub use envelope::{EnvelopeParseError, SignatureEnvelope, SignatureMetadata};
pub use raw_loader::{FsRawLoader, LoadError, MapRawLoader, RawLoader};
pub use signer::{compute_policy_hash, hashes_match, RsaPssSigner, RsaPssVerifier, SignError, Signer, Verifier, VerifyError, ALGORITHM};
pub use verifying_loader::{derive_policy_path, derive_sig_path, LoadedPolicy, VerifyingLoader, VerifyingLoaderError};
