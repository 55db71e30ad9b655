/// Structural fingerprint of a topology snapshot.
///
/// Callers that cache a [`crate::analysis::TopologyAnalysis`] key it on this
/// digest: equal digests mean the `(nodes, edges)` input is structurally
/// identical, so every derived stage can be reused.
///
/// # Algorithm
///
/// The node and edge lists are serialized to compact JSON as the two-element
/// array `[nodes, edges]`, preserving list order, and streamed into SHA-256.
/// Map-valued fields (unknown metric keys) serialize in key order, so the
/// encoding is canonical. The 32-byte digest is returned as 64 lowercase hex
/// characters.
use std::io;

use sha2::{Digest, Sha256};

use crate::graph::TopologyModel;
use crate::snapshot::TopologySnapshot;
use crate::structures::{Edge, Node};

/// `io::Write` adapter feeding bytes straight into a hasher.
struct DigestWriter(Sha256);

impl io::Write for DigestWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Encodes a byte slice as a lowercase hexadecimal string.
fn hex_encode(bytes: &[u8]) -> String {
    const HEX_CHARS: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for &b in bytes {
        out.push(HEX_CHARS[(b >> 4) as usize] as char);
        out.push(HEX_CHARS[(b & 0x0f) as usize] as char);
    }
    out
}

/// Returns the SHA-256 hex digest of `(nodes, edges)`.
///
/// # Errors
///
/// Returns the `serde_json` error if a value cannot be encoded. Node and edge
/// records always encode, so this only surfaces on a broken serializer.
pub fn snapshot_fingerprint(nodes: &[Node], edges: &[Edge]) -> Result<String, serde_json::Error> {
    let mut writer = DigestWriter(Sha256::new());
    serde_json::to_writer(&mut writer, &(nodes, edges))?;
    Ok(hex_encode(&writer.0.finalize()))
}

/// [`snapshot_fingerprint`] of a decoded snapshot.
///
/// # Errors
///
/// See [`snapshot_fingerprint`].
pub fn fingerprint_of(snapshot: &TopologySnapshot) -> Result<String, serde_json::Error> {
    snapshot_fingerprint(&snapshot.nodes, &snapshot.edges)
}

/// [`snapshot_fingerprint`] of a normalised model.
///
/// Two raw snapshots that differ only in duplicate edge records or dangling
/// edges share a model fingerprint.
///
/// # Errors
///
/// See [`snapshot_fingerprint`].
pub fn model_fingerprint(model: &TopologyModel) -> Result<String, serde_json::Error> {
    snapshot_fingerprint(model.nodes(), model.edges())
}
