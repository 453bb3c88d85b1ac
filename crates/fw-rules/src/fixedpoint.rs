//! Fixed-point money and percentage types.
//!
//! All monetary values in the engine use a 1e-6 (micros) fixed-point
//! representation stored as `i64`: 1 USD = 1_000_000 [`Micros`]. Percentages
//! use the same scale in [`Pct`]: 1% = 1_000_000. Raw `i64` money is
//! error-prone — it allows accidental arithmetic with unrelated integers
//! (contract counts, seconds, ids) with no compile-time signal — so both
//! types wrap the raw value and offer no implicit `From<i64>`.
//!
//! On the wire both types are decimal strings ("49950.25", "15.0"), which
//! preserves upstream precision exactly and keeps JSON output readable for
//! the delivery layer.

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use std::str::FromStr;

/// 1e-6 fixed-point scale.
pub const MICROS_SCALE: i64 = 1_000_000;

/// Why a decimal string failed to parse into fixed point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseFixedError {
    Empty,
    /// Non-digit characters outside of one leading sign and one decimal point.
    Malformed { raw: String },
    /// More than six fraction digits: cannot be represented exactly.
    TooPrecise { raw: String },
    /// Magnitude exceeds the i64 range at 1e-6 scale.
    OutOfRange { raw: String },
}

impl fmt::Display for ParseFixedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "decimal value is empty"),
            Self::Malformed { raw } => write!(f, "{raw:?} is not a decimal number"),
            Self::TooPrecise { raw } => write!(f, "{raw:?} has more than 6 fraction digits"),
            Self::OutOfRange { raw } => write!(f, "{raw:?} overflows the fixed-point range"),
        }
    }
}

impl std::error::Error for ParseFixedError {}

/// Exact decimal-string → 1e-6 fixed-point parse. Never rounds.
fn parse_fixed(raw: &str) -> Result<i64, ParseFixedError> {
    let s = raw.trim();
    if s.is_empty() {
        return Err(ParseFixedError::Empty);
    }

    let (negative, digits) = match s.as_bytes()[0] {
        b'-' => (true, &s[1..]),
        b'+' => (false, &s[1..]),
        _ => (false, s),
    };
    let (int_part, frac_part) = match digits.split_once('.') {
        Some((i, f)) => (i, f),
        None => (digits, ""),
    };
    if int_part.is_empty() && frac_part.is_empty() {
        return Err(ParseFixedError::Malformed { raw: raw.to_string() });
    }
    if !int_part.bytes().all(|b| b.is_ascii_digit())
        || !frac_part.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(ParseFixedError::Malformed { raw: raw.to_string() });
    }
    if frac_part.len() > 6 {
        return Err(ParseFixedError::TooPrecise { raw: raw.to_string() });
    }

    let whole: i64 = if int_part.is_empty() {
        0
    } else {
        int_part
            .parse()
            .map_err(|_| ParseFixedError::OutOfRange { raw: raw.to_string() })?
    };

    let mut frac: i64 = 0;
    if !frac_part.is_empty() {
        frac = frac_part
            .parse()
            .map_err(|_| ParseFixedError::Malformed { raw: raw.to_string() })?;
        for _ in frac_part.len()..6 {
            frac *= 10;
        }
    }

    let magnitude = whole
        .checked_mul(MICROS_SCALE)
        .and_then(|m| m.checked_add(frac))
        .ok_or_else(|| ParseFixedError::OutOfRange { raw: raw.to_string() })?;

    Ok(if negative { -magnitude } else { magnitude })
}

fn fmt_fixed(raw: i64, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let whole = raw / MICROS_SCALE;
    let frac = (raw % MICROS_SCALE).abs();
    // When |value| < 1 and the value is negative, `whole` truncates to 0 and
    // loses the sign. Emit "-0" explicitly in that case.
    if raw < 0 && whole == 0 {
        write!(f, "-{whole}.{frac:06}")
    } else {
        write!(f, "{whole}.{frac:06}")
    }
}

// ---------------------------------------------------------------------------
// Micros
// ---------------------------------------------------------------------------

/// A fixed-point monetary amount at 1e-6 scale.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Micros(i64);

impl Micros {
    pub const ZERO: Micros = Micros(0);
    pub const MAX: Micros = Micros(i64::MAX);
    pub const MIN: Micros = Micros(i64::MIN);

    /// Construct from a raw i64 known to be at 1e-6 scale.
    #[inline]
    pub const fn new(raw: i64) -> Self {
        Micros(raw)
    }

    /// Construct from a whole-unit count (dollars, contracts, seconds).
    #[inline]
    pub const fn from_whole(units: i64) -> Self {
        Micros(units * MICROS_SCALE)
    }

    #[inline]
    pub const fn raw(self) -> i64 {
        self.0
    }

    /// Parse from a decimal string ("1234.56"). Exact or error.
    pub fn parse_str(raw: &str) -> Result<Self, ParseFixedError> {
        parse_fixed(raw).map(Micros)
    }

    #[inline]
    pub fn saturating_add(self, rhs: Micros) -> Micros {
        Micros(self.0.saturating_add(rhs.0))
    }

    #[inline]
    pub fn saturating_sub(self, rhs: Micros) -> Micros {
        Micros(self.0.saturating_sub(rhs.0))
    }

    /// Absolute value. `Micros::MIN.abs()` saturates to `Micros::MAX`.
    #[inline]
    pub fn abs(self) -> Micros {
        Micros(self.0.saturating_abs())
    }

    #[inline]
    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// `pct` of this amount, e.g. `hwm.percent_of(Pct::from_whole(5))` is a
    /// 5% drawdown allowance. Computed in i128 then saturated to i64.
    pub fn percent_of(self, pct: Pct) -> Micros {
        let v = (self.0 as i128) * (pct.0 as i128) / (Pct::HUNDRED.0 as i128);
        Micros(clamp_i128(v))
    }
}

impl Add for Micros {
    type Output = Micros;
    #[inline]
    fn add(self, rhs: Micros) -> Micros {
        Micros(self.0 + rhs.0)
    }
}

impl Sub for Micros {
    type Output = Micros;
    #[inline]
    fn sub(self, rhs: Micros) -> Micros {
        Micros(self.0 - rhs.0)
    }
}

impl Neg for Micros {
    type Output = Micros;
    #[inline]
    fn neg(self) -> Micros {
        Micros(-self.0)
    }
}

impl AddAssign for Micros {
    #[inline]
    fn add_assign(&mut self, rhs: Micros) {
        self.0 += rhs.0;
    }
}

impl SubAssign for Micros {
    #[inline]
    fn sub_assign(&mut self, rhs: Micros) {
        self.0 -= rhs.0;
    }
}

impl fmt::Display for Micros {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_fixed(self.0, f)
    }
}

impl FromStr for Micros {
    type Err = ParseFixedError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Micros::parse_str(s)
    }
}

impl Serialize for Micros {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Micros {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Micros::parse_str(&s).map_err(D::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Pct
// ---------------------------------------------------------------------------

/// A percentage at 1e-6 scale: `Pct::HUNDRED` = 100%.
///
/// Buffer percentages produced by the evaluators are always clamped to
/// [0, 100] via [`Pct::from_ratio`]; raw percentage-point arithmetic (the
/// consistency rule) uses [`Pct::ratio_unclamped`] and signed subtraction.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pct(i64);

impl Pct {
    pub const ZERO: Pct = Pct(0);
    pub const HUNDRED: Pct = Pct(100 * MICROS_SCALE);

    #[inline]
    pub const fn new(raw: i64) -> Self {
        Pct(raw)
    }

    /// Construct from whole percentage points, e.g. `Pct::from_whole(5)` = 5%.
    #[inline]
    pub const fn from_whole(points: i64) -> Self {
        Pct(points * MICROS_SCALE)
    }

    #[inline]
    pub const fn raw(self) -> i64 {
        self.0
    }

    /// Parse from a decimal string ("5", "37.5"). Exact or error.
    pub fn parse_str(raw: &str) -> Result<Self, ParseFixedError> {
        parse_fixed(raw).map(Pct)
    }

    /// `num / den` as a percentage, clamped to [0, 100].
    ///
    /// A non-positive denominator cannot express a ratio; it yields 100% when
    /// the numerator is non-negative (nothing to lose against no threshold)
    /// and 0% otherwise.
    pub fn from_ratio(num: Micros, den: Micros) -> Pct {
        if den.0 <= 0 {
            return if num.0 >= 0 { Pct::HUNDRED } else { Pct::ZERO };
        }
        let v = (num.0 as i128) * (Pct::HUNDRED.0 as i128) / (den.0 as i128);
        Pct(clamp_i128(v).clamp(0, Pct::HUNDRED.0))
    }

    /// `num / den` as a percentage, unclamped and signed.
    pub fn ratio_unclamped(num: Micros, den: Micros) -> Pct {
        if den.0 == 0 {
            return Pct::ZERO;
        }
        let v = (num.0 as i128) * (Pct::HUNDRED.0 as i128) / (den.0 as i128);
        Pct(clamp_i128(v))
    }

    #[inline]
    pub fn saturating_sub(self, rhs: Pct) -> Pct {
        Pct(self.0.saturating_sub(rhs.0))
    }

    #[inline]
    pub fn as_f64(self) -> f64 {
        self.0 as f64 / MICROS_SCALE as f64
    }
}

impl fmt::Display for Pct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_fixed(self.0, f)
    }
}

impl FromStr for Pct {
    type Err = ParseFixedError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Pct::parse_str(s)
    }
}

impl Serialize for Pct {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Pct {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Pct::parse_str(&s).map_err(D::Error::custom)
    }
}

fn clamp_i128(v: i128) -> i64 {
    if v > i64::MAX as i128 {
        i64::MAX
    } else if v < i64::MIN as i128 {
        i64::MIN
    } else {
        v as i64
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
