use crate::error::CoreError;
use dashu::base::BitTest;
use dashu::base::Sign;
use dashu::integer::IBig;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Mantissa bit-length cap applied by renormalizing operations.
///
/// Multiplication would otherwise double the mantissa size on every call;
/// capping it bounds per-operation cost at a fixed precision ceiling,
/// enough for iteration counts in the low thousands.
pub const MANTISSA_TARGET_BITS: usize = 240;

/// Exponent gap beyond which the smaller addend is negligible and dropped.
pub const ALIGN_DROP_BITS: i64 = 4096;

/// Arbitrary-precision binary floating point: value = mantissa × 2^exponent.
///
/// Immutable value type; every operation returns a new instance. Zero is
/// canonically `(0, 0)`.
///
/// Addition is exact (operands are aligned at the smaller exponent, up to
/// the [`ALIGN_DROP_BITS`] cutoff), so a value built up by accumulating
/// small offsets, like a camera center under deep zoom, keeps every bit it
/// needs. Multiplication renormalizes its result down to
/// [`MANTISSA_TARGET_BITS`], which is where the precision ceiling lives.
#[derive(Clone, Debug)]
pub struct BigFloat {
    mantissa: IBig,
    exponent: i64,
}

impl BigFloat {
    /// Canonical zero.
    pub fn zero() -> Self {
        Self {
            mantissa: IBig::ZERO,
            exponent: 0,
        }
    }

    /// Construct from raw parts without renormalizing.
    pub fn from_parts(mantissa: IBig, exponent: i64) -> Self {
        if mantissa == IBig::ZERO {
            return Self::zero();
        }
        Self { mantissa, exponent }
    }

    /// Decompose a finite double per IEEE-754: sign, biased exponent and
    /// 52-bit fraction, with the implicit leading bit restored for normal
    /// values and the fixed exponent floor for subnormals.
    pub fn from_f64(value: f64) -> Result<Self, CoreError> {
        if !value.is_finite() {
            return Err(CoreError::NonFinite);
        }
        if value == 0.0 {
            return Ok(Self::zero());
        }

        let bits = value.to_bits();
        let negative = bits >> 63 == 1;
        let biased_exp = ((bits >> 52) & 0x7FF) as i64;
        let fraction = bits & 0x000F_FFFF_FFFF_FFFF;

        let (magnitude, exponent) = if biased_exp == 0 {
            // Subnormal: no implicit bit, fixed exponent floor.
            (fraction, -1074)
        } else {
            (fraction | (1u64 << 52), biased_exp - 1075)
        };

        let mut mantissa = IBig::from(magnitude);
        if negative {
            mantissa = -mantissa;
        }
        Ok(Self { mantissa, exponent })
    }

    pub fn is_zero(&self) -> bool {
        self.mantissa == IBig::ZERO
    }

    pub fn is_positive(&self) -> bool {
        !self.is_zero() && self.mantissa.sign() == Sign::Positive
    }

    pub fn exponent(&self) -> i64 {
        self.exponent
    }

    /// Bit length of the mantissa magnitude (0 for zero).
    pub fn mantissa_bits(&self) -> usize {
        ibig_bit_len(&self.mantissa)
    }

    pub fn neg(&self) -> Self {
        Self {
            mantissa: -&self.mantissa,
            exponent: self.exponent,
        }
    }

    /// Exact addition: the operand with the larger exponent is shifted down
    /// to the smaller exponent before the mantissas are summed.
    ///
    /// If the exponent gap exceeds [`ALIGN_DROP_BITS`] the smaller addend is
    /// dropped outright. This is a documented precision-loss policy, not an
    /// error; it bounds intermediate mantissa growth.
    pub fn add(&self, other: &Self) -> Self {
        if self.is_zero() {
            return other.clone();
        }
        if other.is_zero() {
            return self.clone();
        }

        let (hi, lo) = if self.exponent >= other.exponent {
            (self, other)
        } else {
            (other, self)
        };
        let gap = hi.exponent - lo.exponent;
        if gap > ALIGN_DROP_BITS {
            return hi.clone();
        }

        let mantissa = (&hi.mantissa << gap as usize) + &lo.mantissa;
        Self::from_parts(mantissa, lo.exponent)
    }

    pub fn sub(&self, other: &Self) -> Self {
        self.add(&other.neg())
    }

    /// Multiply: mantissas multiply, exponents add, result is renormalized.
    pub fn mul(&self, other: &Self) -> Self {
        Self {
            mantissa: &self.mantissa * &other.mantissa,
            exponent: self.exponent + other.exponent,
        }
        .normalized()
    }

    /// Scale by a machine integer (pixel offsets and the like).
    pub fn mul_i64(&self, factor: i64) -> Self {
        Self {
            mantissa: &self.mantissa * IBig::from(factor),
            exponent: self.exponent,
        }
        .normalized()
    }

    /// Convert to a fixed-point integer at `bits` fractional bits:
    /// result ≈ value × 2^bits.
    ///
    /// Left shifts are exact; right shifts round half-up by adding a
    /// half-unit bias before truncating.
    pub fn to_fixed_point(&self, bits: usize) -> IBig {
        if self.is_zero() {
            return IBig::ZERO;
        }
        let shift = self.exponent + bits as i64;
        if shift >= 0 {
            &self.mantissa << shift as usize
        } else {
            shr_round_half_up(&self.mantissa, (-shift) as usize)
        }
    }

    /// Best-effort conversion to a machine double from the top 53 mantissa
    /// bits. Approximation path for display and heuristics only, never for
    /// the numeric kernels.
    pub fn to_f64(&self) -> f64 {
        if self.is_zero() {
            return 0.0;
        }
        let dropped = self.mantissa_bits().saturating_sub(53);
        let top = (&self.mantissa >> dropped).to_f64().value();
        libm::ldexp(top, ldexp_exponent(self.exponent + dropped as i64))
    }

    /// Approximate binary magnitude: log2|value|, `-inf` for zero.
    pub fn log2_approx(&self) -> f64 {
        if self.is_zero() {
            return f64::NEG_INFINITY;
        }
        let dropped = self.mantissa_bits().saturating_sub(53);
        let top = (&self.mantissa >> dropped).to_f64().value().abs();
        top.log2() + (self.exponent + dropped as i64) as f64
    }

    fn normalized(mut self) -> Self {
        if self.mantissa == IBig::ZERO {
            self.exponent = 0;
            return self;
        }
        loop {
            let len = ibig_bit_len(&self.mantissa);
            if len <= MANTISSA_TARGET_BITS {
                return self;
            }
            // Rounding half-up can carry into one extra bit, hence the loop.
            let shift = len - MANTISSA_TARGET_BITS;
            self.mantissa = shr_round_half_up(&self.mantissa, shift);
            self.exponent += shift as i64;
        }
    }
}

/// Bit length of the magnitude of `value` (0 for zero).
pub(crate) fn ibig_bit_len(value: &IBig) -> usize {
    let (_, magnitude) = value.clone().into_parts();
    magnitude.bit_len()
}

/// Arithmetic right shift with round-half-up (ties toward +inf).
pub(crate) fn shr_round_half_up(value: &IBig, shift: usize) -> IBig {
    if shift == 0 {
        return value.clone();
    }
    (value + (IBig::ONE << (shift - 1))) >> shift
}

/// ldexp saturates to 0 or infinity long before this clamp bites.
fn ldexp_exponent(exponent: i64) -> i32 {
    exponent.clamp(-4400, 4400) as i32
}

impl PartialEq for BigFloat {
    fn eq(&self, other: &Self) -> bool {
        matches!(self.partial_cmp(other), Some(Ordering::Equal))
    }
}

impl PartialOrd for BigFloat {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        let diff = self.sub(other);
        Some(if diff.is_zero() {
            Ordering::Equal
        } else if diff.is_positive() {
            Ordering::Greater
        } else {
            Ordering::Less
        })
    }
}

impl std::fmt::Display for BigFloat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}*2^{}", self.mantissa, self.exponent)
    }
}

#[derive(Serialize, Deserialize)]
struct BigFloatSerde {
    mantissa: String,
    exponent: i64,
}

impl Serialize for BigFloat {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        BigFloatSerde {
            mantissa: self.mantissa.to_string(),
            exponent: self.exponent,
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for BigFloat {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = BigFloatSerde::deserialize(deserializer)?;
        let mantissa = raw
            .mantissa
            .parse::<IBig>()
            .map_err(|e| serde::de::Error::custom(format!("failed to parse mantissa: {}", e)))?;
        Ok(BigFloat::from_parts(mantissa, raw.exponent))
    }
}
