/// Validated newtype wrappers for identifier strings.
///
/// [`NodeId`] enforces its shape constraint at construction time via
/// [`TryFrom<&str>`]. Once constructed, the inner value is immutable (no
/// `DerefMut`). The serde `Deserialize` impl re-runs validation so an invalid
/// id cannot enter the type system from backend JSON.
use std::borrow::Borrow;
use std::fmt;
use std::ops::Deref;

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors produced when constructing a validated newtype from an invalid string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NewtypeError {
    /// The string did not match the expected format.
    InvalidFormat {
        /// Name of the type that rejected the input.
        type_name: &'static str,
        /// A human-readable description of the expected format.
        expected: &'static str,
        /// The input that was rejected.
        got: String,
    },
}

impl fmt::Display for NewtypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidFormat {
                type_name,
                expected,
                got,
            } => write!(f, "invalid {type_name}: expected {expected}, got {got:?}"),
        }
    }
}

impl std::error::Error for NewtypeError {}

// ---------------------------------------------------------------------------
// NodeId
// ---------------------------------------------------------------------------

/// Non-empty, snapshot-unique identifier of a topology node.
///
/// Ordered so that id-based tie-breaks (fallback root selection, DFS restarts)
/// are deterministic. Implements [`Borrow<str>`] so maps keyed by `NodeId`
/// can be queried with a plain `&str`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(String);

impl TryFrom<&str> for NodeId {
    type Error = NewtypeError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        if s.is_empty() {
            Err(NewtypeError::InvalidFormat {
                type_name: "NodeId",
                expected: "non-empty string",
                got: s.to_owned(),
            })
        } else {
            Ok(Self(s.to_owned()))
        }
    }
}

impl NodeId {
    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Deref for NodeId {
    type Target = str;
    fn deref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for NodeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for NodeId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for NodeId {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for NodeId {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let s = String::deserialize(d)?;
        Self::try_from(s.as_str()).map_err(de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Edge keys
// ---------------------------------------------------------------------------

/// Separator between source and target in an edge id.
pub const EDGE_KEY_SEPARATOR: &str = "->";

/// Returns the canonical edge id for a `(source, target)` pair: `"source->target"`.
///
/// Edge identity is the ordered endpoint pair, so this string doubles as the
/// membership key of [`crate::graph::classify::EdgeClassification::back_edge_pairs`].
pub fn edge_key(source: &str, target: &str) -> String {
    let mut key = String::with_capacity(source.len() + EDGE_KEY_SEPARATOR.len() + target.len());
    key.push_str(source);
    key.push_str(EDGE_KEY_SEPARATOR);
    key.push_str(target);
    key
}
