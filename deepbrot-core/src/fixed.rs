//! Fixed-point helpers.
//!
//! A fixed-point value is a signed arbitrary-precision integer meaning
//! `integer / 2^bits`. The bit width is never self-describing: it always
//! travels alongside the value, as a job field or a function parameter.

use crate::bigfloat::{ibig_bit_len, BigFloat};
use crate::error::CoreError;
use dashu::integer::IBig;

/// Fixed-point multiply: `(a * b) >> bits`, truncating.
pub fn mul_fixed(a: &IBig, b: &IBig, bits: usize) -> IBig {
    (a * b) >> bits
}

/// Convert a finite double to fixed point at `bits` fractional bits.
pub fn from_f64(value: f64, bits: usize) -> Result<IBig, CoreError> {
    Ok(BigFloat::from_f64(value)?.to_fixed_point(bits))
}

/// Best-effort double from a fixed-point value, via the top 53 bits.
pub fn to_f64(value: &IBig, bits: usize) -> f64 {
    BigFloat::from_parts(value.clone(), -(bits as i64)).to_f64()
}

/// Bit length of the magnitude (0 for zero). The cheap approximate log2
/// used by the smooth-iteration estimate and precision checks.
pub fn bit_len(value: &IBig) -> usize {
    ibig_bit_len(value)
}

/// Serde adapter carrying an `IBig` as a decimal string.
///
/// Use with `#[serde(with = "serde_ibig")]` on job message fields.
pub mod serde_ibig {
    use dashu::integer::IBig;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &IBig, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<IBig, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse::<IBig>().map_err(serde::de::Error::custom)
    }
}
