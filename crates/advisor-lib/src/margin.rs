//! Exact decimal safety margins
//!
//! A margin is stored as `numerator / 10^scale` so that headroom can be
//! computed with integer ceiling division. `0.33` is exactly 33/100, never
//! the nearest binary float.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Maximum number of fractional digits a margin may carry
pub const MAX_SCALE: u32 = 18;

/// Default memory buffer (20%) applied when the operator gives none
pub const DEFAULT_MEMORY_BUFFER_PERCENT: i64 = 20;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MarginParseError {
    #[error("safety margin is empty")]
    Empty,

    #[error("malformed safety margin `{0}`")]
    Malformed(String),

    #[error("safety margin `{0}` has more than 18 fractional digits")]
    TooPrecise(String),

    #[error("safety margin `{0}` is out of range")]
    OutOfRange(String),
}

/// Headroom ratio applied above a measured peak
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SafetyMargin {
    numerator: i64,
    scale: u32,
}

impl SafetyMargin {
    pub const ZERO: Self = Self {
        numerator: 0,
        scale: 0,
    };

    pub const ONE: Self = Self {
        numerator: 1,
        scale: 0,
    };

    /// Build `numerator / 10^scale`, normalizing trailing zeros away
    pub fn from_parts(numerator: i64, scale: u32) -> Result<Self, MarginParseError> {
        if scale > MAX_SCALE {
            return Err(MarginParseError::TooPrecise(format!("{numerator}e-{scale}")));
        }
        let mut margin = Self { numerator, scale };
        while margin.scale > 0 && margin.numerator % 10 == 0 {
            margin.numerator /= 10;
            margin.scale -= 1;
        }
        if margin.numerator == 0 {
            margin.scale = 0;
        }
        Ok(margin)
    }

    /// Margin from a whole percentage, e.g. `from_percent(20)` is 0.2
    pub fn from_percent(percent: i64) -> Self {
        // scale 2 is always within MAX_SCALE
        Self::from_parts(percent, 2).unwrap_or(Self::ZERO)
    }

    pub fn is_positive(&self) -> bool {
        self.numerator > 0
    }

    /// True when the margin is strictly greater than 1
    pub fn exceeds_one(&self) -> bool {
        i128::from(self.numerator) > pow10(self.scale)
    }

    pub fn as_f64(&self) -> f64 {
        self.numerator as f64 / 10f64.powi(self.scale as i32)
    }

    /// `ceil(bytes * (1 + margin))`, or `None` for a negative margin or a
    /// result that does not fit in `u64`
    pub fn apply_ceil(&self, bytes: u64) -> Option<u64> {
        if self.numerator < 0 {
            return None;
        }
        let denominator = pow10(self.scale) as u128;
        let factor = denominator + self.numerator as u128;
        let scaled = u128::from(bytes) * factor;
        u64::try_from(scaled.div_ceil(denominator)).ok()
    }
}

fn pow10(scale: u32) -> i128 {
    10i128.pow(scale)
}

impl Default for SafetyMargin {
    fn default() -> Self {
        Self::from_percent(DEFAULT_MEMORY_BUFFER_PERCENT)
    }
}

impl Ord for SafetyMargin {
    fn cmp(&self, other: &Self) -> Ordering {
        let lhs = i128::from(self.numerator) * pow10(other.scale);
        let rhs = i128::from(other.numerator) * pow10(self.scale);
        lhs.cmp(&rhs)
    }
}

impl PartialOrd for SafetyMargin {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl FromStr for SafetyMargin {
    type Err = MarginParseError;

    /// Accepts `0.33`, `.5`, `1`, `-0.1` and percentages such as `33%`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        if raw.is_empty() {
            return Err(MarginParseError::Empty);
        }
        let malformed = || MarginParseError::Malformed(raw.to_string());

        let (body, percent) = match raw.strip_suffix('%') {
            Some(body) => (body.trim_end(), true),
            None => (raw, false),
        };
        let (negative, unsigned) = match body.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, body.strip_prefix('+').unwrap_or(body)),
        };
        let (int_part, frac_part) = unsigned.split_once('.').unwrap_or((unsigned, ""));
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(malformed());
        }
        let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if !all_digits(int_part) || !all_digits(frac_part) {
            return Err(malformed());
        }

        let mut digits = format!("{int_part}{frac_part}");
        let mut scale = frac_part.len() as u32 + if percent { 2 } else { 0 };
        while scale > 0 && digits.ends_with('0') {
            digits.pop();
            scale -= 1;
        }
        if scale > MAX_SCALE {
            return Err(MarginParseError::TooPrecise(raw.to_string()));
        }

        let magnitude = if digits.is_empty() {
            0
        } else {
            digits
                .parse::<i64>()
                .map_err(|_| MarginParseError::OutOfRange(raw.to_string()))?
        };
        let numerator = if negative { -magnitude } else { magnitude };
        Self::from_parts(numerator, scale)
    }
}

impl TryFrom<f64> for SafetyMargin {
    type Error = MarginParseError;

    /// Converts through the shortest decimal that round-trips the float
    fn try_from(value: f64) -> Result<Self, Self::Error> {
        if !value.is_finite() {
            return Err(MarginParseError::Malformed(value.to_string()));
        }
        value.to_string().parse()
    }
}

impl fmt::Display for SafetyMargin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.numerator < 0 { "-" } else { "" };
        let magnitude = self.numerator.unsigned_abs();
        if self.scale == 0 {
            return write!(f, "{sign}{magnitude}");
        }
        let denominator = 10u64.pow(self.scale);
        write!(
            f,
            "{sign}{}.{:0width$}",
            magnitude / denominator,
            magnitude % denominator,
            width = self.scale as usize
        )
    }
}

impl Serialize for SafetyMargin {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_f64())
    }
}

impl<'de> Deserialize<'de> for SafetyMargin {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(MarginVisitor)
    }
}

struct MarginVisitor;

impl<'de> de::Visitor<'de> for MarginVisitor {
    type Value = SafetyMargin;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a decimal ratio such as 0.33 or a percentage such as \"33%\"")
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        SafetyMargin::try_from(v).map_err(E::custom)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        SafetyMargin::from_parts(v, 0).map_err(E::custom)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        let numerator =
            i64::try_from(v).map_err(|_| E::custom(MarginParseError::OutOfRange(v.to_string())))?;
        self.visit_i64(numerator)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        v.parse().map_err(E::custom)
    }
}
