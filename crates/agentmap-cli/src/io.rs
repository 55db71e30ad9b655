/// Input reading with size enforcement, UTF-8 validation and decoding.
///
/// This module is the single entry point for all input I/O in the `agentmap`
/// binary. `agentmap-core` never touches the filesystem.
///
/// - Disk files: size checked via `std::fs::metadata` before any read.
/// - Stdin: buffered with a `Read::take` cap so allocation is bounded.
/// - UTF-8 validation via `std::str::from_utf8` with byte-offset reporting.
/// - Decode failures become [`CliError::ParseFailed`].
///
/// Every error here has exit code 2.
use std::io::Read as _;
use std::path::Path;

use agentmap_core::{SankeyResponse, TopologySnapshot, parse_sankey, parse_snapshot};

use crate::PathOrStdin;
use crate::error::CliError;

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Reads the entire contents of `source` into a `String`.
///
/// # Errors
///
/// Returns [`CliError`] for a missing or unreadable file, input larger than
/// `max_size`, and invalid UTF-8.
pub fn read_input(source: &PathOrStdin, max_size: u64) -> Result<String, CliError> {
    let content = match source {
        PathOrStdin::Path(path) => read_file(path, max_size)?,
        PathOrStdin::Stdin => read_stdin(max_size)?,
    };
    tracing::debug!(source = %source, bytes = content.len(), "read input");
    Ok(content)
}

/// Reads and decodes a topology snapshot.
///
/// # Errors
///
/// As [`read_input`], plus [`CliError::ParseFailed`] for malformed JSON.
pub fn read_snapshot(source: &PathOrStdin, max_size: u64) -> Result<TopologySnapshot, CliError> {
    let content = read_input(source, max_size)?;
    parse_snapshot(&content).map_err(|e| CliError::ParseFailed {
        source: source.to_string(),
        detail: e.to_string(),
    })
}

/// Reads and decodes a Sankey response.
///
/// # Errors
///
/// As [`read_input`], plus [`CliError::ParseFailed`] for malformed JSON.
pub fn read_sankey(source: &PathOrStdin, max_size: u64) -> Result<SankeyResponse, CliError> {
    let content = read_input(source, max_size)?;
    parse_sankey(&content).map_err(|e| CliError::ParseFailed {
        source: source.to_string(),
        detail: format!("invalid sankey response at line {} column {}: {e}", e.line(), e.column()),
    })
}

// ---------------------------------------------------------------------------
// Disk file reading
// ---------------------------------------------------------------------------

fn read_file(path: &Path, max_size: u64) -> Result<String, CliError> {
    // Size check via metadata: no allocation until we know it's within bounds.
    let file_size = std::fs::metadata(path)
        .map_err(|e| io_error_to_cli(&e, path))?
        .len();

    if file_size > max_size {
        return Err(CliError::FileTooLarge {
            source: path.display().to_string(),
            limit: max_size,
            actual: Some(file_size),
        });
    }

    let bytes = std::fs::read(path).map_err(|e| io_error_to_cli(&e, path))?;
    bytes_to_string(&bytes, &path.display().to_string())
}

/// Maps a `std::io::Error` arising from a disk-file operation to a [`CliError`].
fn io_error_to_cli(e: &std::io::Error, path: &Path) -> CliError {
    let kind = e.kind();
    if kind == std::io::ErrorKind::NotFound {
        CliError::FileNotFound {
            path: path.to_path_buf(),
        }
    } else if kind == std::io::ErrorKind::PermissionDenied {
        CliError::PermissionDenied {
            path: path.to_path_buf(),
        }
    } else {
        CliError::IoError {
            source: path.display().to_string(),
            detail: e.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Stdin reading
// ---------------------------------------------------------------------------

/// Reads the entire stdin stream, capped at `max_size` bytes.
///
/// If the stream produces exactly `max_size` bytes one more byte is probed to
/// tell "exactly at the limit" from "over the limit".
fn read_stdin(max_size: u64) -> Result<String, CliError> {
    let stdin = std::io::stdin();
    let mut limited = stdin.lock().take(max_size);
    let mut buf: Vec<u8> = Vec::new();

    limited
        .read_to_end(&mut buf)
        .map_err(|e| CliError::StdinReadError {
            detail: e.to_string(),
        })?;

    if buf.len() as u64 == max_size {
        let mut probe = [0u8; 1];
        let extra = limited
            .into_inner()
            .read(&mut probe)
            .map_err(|e| CliError::StdinReadError {
                detail: e.to_string(),
            })?;
        if extra > 0 {
            return Err(CliError::FileTooLarge {
                source: "-".to_owned(),
                limit: max_size,
                actual: None,
            });
        }
    }

    bytes_to_string(&buf, "-")
}

// ---------------------------------------------------------------------------
// UTF-8 conversion
// ---------------------------------------------------------------------------

fn bytes_to_string(bytes: &[u8], source_label: &str) -> Result<String, CliError> {
    match std::str::from_utf8(bytes) {
        Ok(s) => Ok(s.to_owned()),
        Err(e) => Err(CliError::InvalidUtf8 {
            source: source_label.to_owned(),
            byte_offset: e.valid_up_to(),
        }),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
