//! Arbitrary-magnitude decimal numbers.
//!
//! Rune experience and cost curves routinely run past `f64::MAX`: the
//! antiquities rune alone starts at a cost coefficient of 1e206 and
//! multiplies by 1e50 per level. [`Decimal`] keeps a normalized `f64`
//! mantissa in `[1, 10)` next to an `i64` base-10 exponent. Exponents are
//! capped at [`MAX_EXPONENT`] so every exponent converts to `f64` exactly;
//! larger magnitudes saturate to [`Decimal::MAX`]. Precision stays at
//! roughly 15 significant digits.
//!
//! ```
//! use runeforge_logic::decimal::Decimal;
//!
//! let cost = Decimal::from(1e206) * Decimal::pow10(150.0);
//! assert_eq!(cost.exponent(), 356);
//! assert!((cost.log10() - 356.0).abs() < 1e-9);
//! ```

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};
use std::str::FromStr;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Digits of `f64` precision; terms further apart than this are absorbed.
const PRECISION_DIGITS: i64 = 17;

/// Largest exponent kept as-is. Beyond `2^53 - 1` an exponent no longer
/// survives the trip through `f64` in `log10` and `pow10`.
pub const MAX_EXPONENT: i64 = (1 << 53) - 1;

/// Mantissa/exponent decimal with value `mantissa * 10^exponent`.
///
/// Always normalized: either exactly zero (`0e0`) or `1 <= |mantissa| < 10`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Decimal {
    mantissa: f64,
    exponent: i64,
}

/// Failure to parse a decimal from text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid decimal literal `{0}`")]
pub struct DecimalParseError(pub String);

impl Decimal {
    pub const ZERO: Decimal = Decimal {
        mantissa: 0.0,
        exponent: 0,
    };

    pub const ONE: Decimal = Decimal {
        mantissa: 1.0,
        exponent: 0,
    };

    /// Largest representable magnitude; stands in for infinity.
    pub const MAX: Decimal = Decimal {
        mantissa: 9.999_999_999_999_999,
        exponent: MAX_EXPONENT,
    };

    /// Build from a raw mantissa and exponent, normalizing the result.
    pub fn from_parts(mantissa: f64, exponent: i64) -> Self {
        if mantissa.is_nan() || mantissa == 0.0 {
            return Self::ZERO;
        }
        if mantissa.is_infinite() {
            return if mantissa > 0.0 { Self::MAX } else { -Self::MAX };
        }
        if (1.0..10.0).contains(&mantissa.abs()) {
            return Self::from_parts_normalized(mantissa, exponent);
        }

        let shift = mantissa.abs().log10().floor() as i64;
        let mut m = scale_by_pow10(mantissa, -shift);
        let mut e = exponent.saturating_add(shift);

        // log10 rounding can leave the mantissa one decade off.
        if m.abs() >= 10.0 {
            m /= 10.0;
            e = e.saturating_add(1);
        } else if m.abs() < 1.0 {
            m *= 10.0;
            e = e.saturating_sub(1);
        }
        Self::from_parts_normalized(m, e)
    }

    fn from_parts_normalized(mantissa: f64, exponent: i64) -> Self {
        if exponent > MAX_EXPONENT {
            return if mantissa > 0.0 { Self::MAX } else { -Self::MAX };
        }
        if exponent < -MAX_EXPONENT {
            return Self::ZERO;
        }
        Self { mantissa, exponent }
    }

    /// `10^power`, exact in the exponent and `f64`-precise in the mantissa.
    pub fn pow10(power: f64) -> Self {
        if power.is_nan() {
            return Self::ZERO;
        }
        // 2^53 itself is exact as f64.
        let limit = (MAX_EXPONENT + 1) as f64;
        if power >= limit {
            return Self::MAX;
        }
        if power <= -limit {
            return Self::ZERO;
        }
        let whole = power.floor();
        Self::from_parts(10f64.powf(power - whole), whole as i64)
    }

    pub fn mantissa(self) -> f64 {
        self.mantissa
    }

    pub fn exponent(self) -> i64 {
        self.exponent
    }

    pub fn is_zero(self) -> bool {
        self.mantissa == 0.0
    }

    pub fn is_negative(self) -> bool {
        self.mantissa < 0.0
    }

    /// Base-10 logarithm as `f64`. Zero gives `-inf`, negatives give NaN.
    pub fn log10(self) -> f64 {
        if self.is_zero() {
            return f64::NEG_INFINITY;
        }
        if self.is_negative() {
            return f64::NAN;
        }
        self.exponent as f64 + self.mantissa.log10()
    }

    /// Logarithm in an arbitrary base, used by coin-count bonus formulas.
    pub fn log(self, base: f64) -> f64 {
        self.log10() / base.log10()
    }

    /// `self^power` for non-negative `self`.
    pub fn powf(self, power: f64) -> Self {
        if self.is_zero() {
            return if power == 0.0 { Self::ONE } else { Self::ZERO };
        }
        Self::pow10(self.log10() * power)
    }

    /// Lossy conversion; saturates to `±inf` above `f64` range.
    pub fn to_f64(self) -> f64 {
        if self.is_zero() {
            return 0.0;
        }
        if self.exponent > 308 {
            return if self.is_negative() {
                f64::NEG_INFINITY
            } else {
                f64::INFINITY
            };
        }
        if self.exponent < -324 {
            return 0.0;
        }
        scale_by_pow10(self.mantissa, self.exponent)
    }

    pub fn abs(self) -> Self {
        Self {
            mantissa: self.mantissa.abs(),
            exponent: self.exponent,
        }
    }

    pub fn floor(self) -> Self {
        self.round_with(f64::floor)
    }

    pub fn ceil(self) -> Self {
        self.round_with(f64::ceil)
    }

    /// Clamp negative drift back to zero.
    pub fn max_zero(self) -> Self {
        if self.is_negative() {
            Self::ZERO
        } else {
            self
        }
    }

    fn round_with(self, round: fn(f64) -> f64) -> Self {
        if self.is_zero() || self.exponent >= PRECISION_DIGITS {
            // No fractional digits left at this magnitude.
            return self;
        }
        if self.exponent < -1 {
            return Self::from(round(self.mantissa.signum() * 0.01));
        }
        Self::from(round(self.to_f64()))
    }

    fn signum_rank(self) -> i8 {
        if self.is_zero() {
            0
        } else if self.is_negative() {
            -1
        } else {
            1
        }
    }
}

/// Multiply `value` by `10^power` without overflowing the intermediate.
fn scale_by_pow10(value: f64, power: i64) -> f64 {
    if power > 300 {
        value * 10f64.powi(300) * 10f64.powi((power - 300) as i32)
    } else if power < -300 {
        value / 10f64.powi(300) / 10f64.powi((-power - 300).min(400) as i32)
    } else if power < 0 {
        value / 10f64.powi(-power as i32)
    } else {
        value * 10f64.powi(power as i32)
    }
}

impl Eq for Decimal {}

impl Ord for Decimal {
    fn cmp(&self, other: &Self) -> Ordering {
        let (a, b) = (self.signum_rank(), other.signum_rank());
        if a != b || a == 0 {
            return a.cmp(&b);
        }
        let magnitude = self
            .exponent
            .cmp(&other.exponent)
            .then_with(|| {
                self.mantissa
                    .abs()
                    .partial_cmp(&other.mantissa.abs())
                    .unwrap_or(Ordering::Equal)
            });
        if a > 0 {
            magnitude
        } else {
            magnitude.reverse()
        }
    }
}

impl PartialOrd for Decimal {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl From<f64> for Decimal {
    fn from(value: f64) -> Self {
        Self::from_parts(value, 0)
    }
}

impl From<u64> for Decimal {
    fn from(value: u64) -> Self {
        Self::from_parts(value as f64, 0)
    }
}

impl From<u32> for Decimal {
    fn from(value: u32) -> Self {
        Self::from_parts(f64::from(value), 0)
    }
}

impl Neg for Decimal {
    type Output = Decimal;

    fn neg(self) -> Self {
        Self {
            mantissa: -self.mantissa,
            exponent: self.exponent,
        }
    }
}

impl Add for Decimal {
    type Output = Decimal;

    fn add(self, rhs: Self) -> Self {
        if self.is_zero() {
            return rhs;
        }
        if rhs.is_zero() {
            return self;
        }
        let (big, small) = if self.exponent >= rhs.exponent {
            (self, rhs)
        } else {
            (rhs, self)
        };
        let gap = big.exponent - small.exponent;
        if gap > PRECISION_DIGITS {
            return big;
        }
        Self::from_parts(
            big.mantissa + scale_by_pow10(small.mantissa, -gap),
            big.exponent,
        )
    }
}

impl Sub for Decimal {
    type Output = Decimal;

    fn sub(self, rhs: Self) -> Self {
        self + (-rhs)
    }
}

impl Mul for Decimal {
    type Output = Decimal;

    fn mul(self, rhs: Self) -> Self {
        if self.is_zero() || rhs.is_zero() {
            return Self::ZERO;
        }
        Self::from_parts(
            self.mantissa * rhs.mantissa,
            self.exponent.saturating_add(rhs.exponent),
        )
    }
}

impl Div for Decimal {
    type Output = Decimal;

    /// Division by zero saturates to [`Decimal::MAX`] (zero over zero is zero).
    fn div(self, rhs: Self) -> Self {
        if self.is_zero() {
            return Self::ZERO;
        }
        if rhs.is_zero() {
            return if self.is_negative() {
                -Self::MAX
            } else {
                Self::MAX
            };
        }
        Self::from_parts(
            self.mantissa / rhs.mantissa,
            self.exponent.saturating_sub(rhs.exponent),
        )
    }
}

impl Add<f64> for Decimal {
    type Output = Decimal;

    fn add(self, rhs: f64) -> Self {
        self + Decimal::from(rhs)
    }
}

impl Sub<f64> for Decimal {
    type Output = Decimal;

    fn sub(self, rhs: f64) -> Self {
        self - Decimal::from(rhs)
    }
}

impl Mul<f64> for Decimal {
    type Output = Decimal;

    fn mul(self, rhs: f64) -> Self {
        self * Decimal::from(rhs)
    }
}

impl Div<f64> for Decimal {
    type Output = Decimal;

    fn div(self, rhs: f64) -> Self {
        self / Decimal::from(rhs)
    }
}

impl AddAssign for Decimal {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl SubAssign for Decimal {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl std::iter::Sum for Decimal {
    fn sum<I: Iterator<Item = Decimal>>(iter: I) -> Self {
        iter.fold(Decimal::ZERO, |acc, x| acc + x)
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return write!(f, "0");
        }
        if (-7..16).contains(&self.exponent) {
            write!(f, "{}", self.to_f64())
        } else {
            write!(f, "{}e{}", self.mantissa, self.exponent)
        }
    }
}

impl FromStr for Decimal {
    type Err = DecimalParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let invalid = || DecimalParseError(s.to_string());
        match trimmed.find(['e', 'E']) {
            Some(split) => {
                let mantissa: f64 = trimmed[..split].parse().map_err(|_| invalid())?;
                let exponent: i64 = trimmed[split + 1..].parse().map_err(|_| invalid())?;
                if !mantissa.is_finite() {
                    return Err(invalid());
                }
                Ok(Self::from_parts(mantissa, exponent))
            }
            None => {
                let value: f64 = trimmed.parse().map_err(|_| invalid())?;
                if !value.is_finite() {
                    return Err(invalid());
                }
                Ok(Self::from(value))
            }
        }
    }
}

/// Human-readable formats always get `<mantissa>e<exponent>`, never the
/// plain form `Display` uses for small values, so a save reloads bit-exact.
impl Serialize for Decimal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            if self.is_zero() {
                serializer.serialize_str("0")
            } else {
                serializer.collect_str(&format_args!("{}e{}", self.mantissa, self.exponent))
            }
        } else {
            (self.mantissa, self.exponent).serialize(serializer)
        }
    }
}

impl<'de> Deserialize<'de> for Decimal {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            deserializer.deserialize_any(DecimalVisitor)
        } else {
            let (mantissa, exponent) = <(f64, i64)>::deserialize(deserializer)?;
            Ok(Decimal::from_parts(mantissa, exponent))
        }
    }
}

struct DecimalVisitor;

impl<'de> Visitor<'de> for DecimalVisitor {
    type Value = Decimal;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a number or a decimal string such as \"1.5e300\"")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Decimal, E> {
        v.parse().map_err(E::custom)
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Decimal, E> {
        Ok(Decimal::from(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Decimal, E> {
        Ok(Decimal::from(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Decimal, E> {
        Ok(Decimal::from(v as f64))
    }
}
