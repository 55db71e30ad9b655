//! Implementation of `agentmap fingerprint <file>`.
//!
//! Prints the SHA-256 structural fingerprint of the raw snapshot. JSON mode
//! also reports the fingerprint of the normalised model, which ignores
//! dangling and duplicate edge records.

use agentmap_core::{TopologyModel, TopologySnapshot, fingerprint_of, model_fingerprint};
use serde::Serialize;

use crate::OutputFormat;
use crate::error::CliError;
use crate::format::emit;

/// Raw and normalised digests of one snapshot.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Fingerprints {
    /// Digest of the snapshot as received.
    pub fingerprint: String,
    /// Digest of the normalised model.
    pub model_fingerprint: String,
}

impl Fingerprints {
    /// Computes both digests.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::IoError`] if the snapshot cannot be encoded.
    pub fn compute(snapshot: TopologySnapshot) -> Result<Self, CliError> {
        let fingerprint = fingerprint_of(&snapshot).map_err(|e| encode_error(&e))?;
        let model = TopologyModel::from_snapshot(snapshot);
        let model_fingerprint = model_fingerprint(&model).map_err(|e| encode_error(&e))?;
        Ok(Self {
            fingerprint,
            model_fingerprint,
        })
    }
}

fn encode_error(e: &serde_json::Error) -> CliError {
    CliError::IoError {
        source: "fingerprint encoder".to_owned(),
        detail: e.to_string(),
    }
}

/// Runs the `fingerprint` command.
///
/// # Errors
///
/// Returns [`CliError::IoError`] if encoding or writing stdout fails.
pub fn run(snapshot: TopologySnapshot, format: OutputFormat) -> Result<(), CliError> {
    let fingerprints = Fingerprints::compute(snapshot)?;
    emit(format, &fingerprints, |w| {
        writeln!(w, "{}", fingerprints.fingerprint)
    })
}
