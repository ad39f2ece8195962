//! Byte quantities
//!
//! Parses the quantity notation operators already use in manifests and
//! launch flags (`512Mi`, `1.5Gi`, `900M`) and renders byte counts back
//! for humans and for Kubernetes.

use serde::{de, Deserializer};
use std::fmt;

const KI: u64 = 1024;
const MI: u64 = KI * 1024;
const GI: u64 = MI * 1024;
const TI: u64 = GI * 1024;

/// Bytes in one mebibyte, the unit of the runtime heap flag
pub const MIB: u64 = MI;

/// Largest fractional precision accepted in a quantity mantissa
const MAX_FRACTION_DIGITS: usize = 9;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UnitsError {
    #[error("byte quantity is empty")]
    Empty,

    #[error("malformed byte quantity `{0}`")]
    Malformed(String),

    #[error("unknown unit suffix `{suffix}` in `{input}`")]
    UnknownSuffix { input: String, suffix: String },

    #[error("byte quantity `{0}` does not fit in 64 bits")]
    Overflow(String),
}

fn multiplier(suffix: &str) -> Option<u64> {
    let value = match suffix {
        "" | "B" => 1,
        "Ki" => KI,
        "Mi" => MI,
        "Gi" => GI,
        "Ti" => TI,
        "Pi" => TI * KI,
        "Ei" => TI * MI,
        "k" | "K" => 1_000,
        "M" => 1_000_000,
        "G" => 1_000_000_000,
        "T" => 1_000_000_000_000,
        "P" => 1_000_000_000_000_000,
        "E" => 1_000_000_000_000_000_000,
        _ => return None,
    };
    Some(value)
}

/// Parse a byte quantity; fractional results round up to the next byte
pub fn parse_bytes(input: &str) -> Result<u64, UnitsError> {
    let raw = input.trim();
    if raw.is_empty() {
        return Err(UnitsError::Empty);
    }

    let split = raw
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(raw.len());
    let (mantissa, suffix) = raw.split_at(split);
    let suffix = suffix.trim();

    let factor = multiplier(suffix).ok_or_else(|| UnitsError::UnknownSuffix {
        input: raw.to_string(),
        suffix: suffix.to_string(),
    })?;

    let (int_part, frac_part) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    if (int_part.is_empty() && frac_part.is_empty())
        || frac_part.contains('.')
        || frac_part.len() > MAX_FRACTION_DIGITS
    {
        return Err(UnitsError::Malformed(raw.to_string()));
    }

    let overflow = || UnitsError::Overflow(raw.to_string());
    let digits = format!("{int_part}{frac_part}");
    let numerator: u128 = digits.parse().map_err(|_| overflow())?;
    let denominator = 10u128.pow(frac_part.len() as u32);
    let bytes = numerator
        .checked_mul(u128::from(factor))
        .ok_or_else(overflow)?
        .div_ceil(denominator);
    u64::try_from(bytes).map_err(|_| overflow())
}

/// Format bytes as human-readable string
pub fn format_bytes(bytes: u64) -> String {
    if bytes >= GI {
        format!("{:.2}Gi", bytes as f64 / GI as f64)
    } else if bytes >= MI {
        format!("{:.2}Mi", bytes as f64 / MI as f64)
    } else if bytes >= KI {
        format!("{:.2}Ki", bytes as f64 / KI as f64)
    } else {
        format!("{}B", bytes)
    }
}

/// Render bytes as an exact Kubernetes quantity string
pub fn to_quantity_string(bytes: u64) -> String {
    if bytes == 0 {
        return "0".to_string();
    }
    for (unit, size) in [("Ti", TI), ("Gi", GI), ("Mi", MI), ("Ki", KI)] {
        if bytes % size == 0 {
            return format!("{}{}", bytes / size, unit);
        }
    }
    bytes.to_string()
}

/// Mebibytes needed to hold `bytes`, rounded up
pub fn ceil_mib(bytes: u64) -> u64 {
    bytes.div_ceil(MIB)
}

/// Serde helper: accept a byte count as an integer or a quantity string
pub fn deserialize_bytes<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    deserializer.deserialize_any(BytesVisitor)
}

/// Serde helper for optional byte counts
pub fn deserialize_opt_bytes<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<u64>, D::Error> {
    deserializer.deserialize_option(OptBytesVisitor)
}

struct BytesVisitor;

impl<'de> de::Visitor<'de> for BytesVisitor {
    type Value = u64;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a byte count or a quantity such as \"512Mi\"")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<u64, E> {
        Ok(v)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<u64, E> {
        u64::try_from(v).map_err(|_| E::custom(format!("byte count {v} is negative")))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<u64, E> {
        if v.is_finite() && v >= 0.0 && v.fract() == 0.0 && v < u64::MAX as f64 {
            Ok(v as u64)
        } else {
            Err(E::custom(format!("byte count {v} is not a whole non-negative number")))
        }
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<u64, E> {
        parse_bytes(v).map_err(E::custom)
    }
}

struct OptBytesVisitor;

impl<'de> de::Visitor<'de> for OptBytesVisitor {
    type Value = Option<u64>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an optional byte count")
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        deserialize_bytes(deserializer).map(Some)
    }
}
