/// Serde helper functions for the wire format of the telemetry backend.
///
/// Backends aggregate counts in languages whose JSON encoders do not separate
/// integers from floats, so a call count can arrive as `3` or `3.0`. The
/// helpers here accept both, as long as the value is a whole, non-negative
/// number that fits in a `u64`.
///
/// Use with `#[serde(default, deserialize_with = "...")]`:
///
/// ```rust,ignore
/// #[serde(default, deserialize_with = "crate::serde_helpers::deserialize_count")]
/// pub call_count: u64,
/// ```
use std::fmt;

use serde::de::{self, Unexpected, Visitor};
use serde::{Deserialize, Deserializer};

/// Exclusive upper bound of `u64` as an `f64` (2^64).
const U64_LIMIT: f64 = 18_446_744_073_709_551_616.0;

/// Deserializes a count from an integer or an integral float.
///
/// | JSON      | Rust result |
/// |-----------|-------------|
/// | `3`       | `3`         |
/// | `3.0`     | `3`         |
/// | `null`    | `0`         |
/// | `3.5`     | error       |
/// | `-1`      | error       |
pub fn deserialize_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(CountVisitor)
}

/// Like [`deserialize_count`], but `null` yields `None`.
///
/// Pair with `#[serde(default)]` so an absent key is also `None`.
pub fn deserialize_optional_count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct Count(#[serde(deserialize_with = "deserialize_count")] u64);

    let count: Option<Count> = Option::deserialize(deserializer)?;
    Ok(count.map(|Count(n)| n))
}

struct CountVisitor;

impl<'de> Visitor<'de> for CountVisitor {
    type Value = u64;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a non-negative whole number")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<u64, E> {
        Ok(v)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<u64, E> {
        u64::try_from(v).map_err(|_| E::invalid_value(Unexpected::Signed(v), &self))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<u64, E> {
        if v.is_finite() && v >= 0.0 && v.fract() == 0.0 && v < U64_LIMIT {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let n = v as u64;
            Ok(n)
        } else {
            Err(E::invalid_value(Unexpected::Float(v), &self))
        }
    }

    fn visit_unit<E: de::Error>(self) -> Result<u64, E> {
        Ok(0)
    }
}
