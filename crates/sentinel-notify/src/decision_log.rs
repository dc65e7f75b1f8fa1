//! Append-only decision audit log (spec §6.6): one JSON Lines record per
//! policy evaluation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

/// A failure writing a decision record.
#[derive(Debug, Error)]
pub enum DecisionLogError {
    /// The underlying file could not be opened or written.
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    /// The record failed to serialize.
    #[error("serialize: {0}")]
    Serde(#[from] serde_json::Error),
}

/// One audit record per evaluated request (spec §6.6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionRecord {
    /// When the decision was reached.
    pub timestamp: DateTime<Utc>,
    /// Requesting principal.
    pub user: String,
    /// Target profile.
    pub profile: String,
    /// The resolved policy effect (`allow`, `deny`, `require_server`, …).
    pub effect: String,
    /// Name of the rule that matched, if any.
    pub matched_rule: Option<String>,
    /// Index of the matched rule within the policy, if any.
    pub matched_rule_index: Option<usize>,
    /// Human-readable reason, carried from the evaluator/gate.
    pub reason: String,
    /// Filesystem or store path the policy was loaded from.
    pub policy_path: String,
    /// When the policy document backing this decision was last loaded.
    pub evaluated_at: DateTime<Utc>,
}

/// A JSONL-backed append-only writer for [`DecisionRecord`]s. Serializes
/// appends behind a mutex so concurrent evaluators never interleave lines.
#[derive(Debug)]
pub struct DecisionLogWriter {
    path: PathBuf,
    lock: Mutex<()>,
}

impl DecisionLogWriter {
    /// Open (creating if absent) a decision log at `path`.
    ///
    /// # Errors
    /// Returns [`DecisionLogError::Io`] if the file cannot be created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, DecisionLogError> {
        let path = path.as_ref().to_path_buf();
        OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self { path, lock: Mutex::new(()) })
    }

    /// Append one decision record as a single JSON line.
    ///
    /// # Errors
    /// Returns [`DecisionLogError`] if the record cannot be serialized or
    /// written.
    pub fn append(&self, record: &DecisionRecord) -> Result<(), DecisionLogError> {
        let line = serde_json::to_string(record)?;
        let _guard = self.lock.lock().expect("lock poisoned");
        let mut file = OpenOptions::new().append(true).open(&self.path)?;
        file.write_all(line.as_bytes())?;
        file.write_all(b"\n")?;
        file.flush()?;
        Ok(())
    }
}
