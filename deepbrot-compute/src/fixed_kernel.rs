//! Arbitrary-precision escape-time kernel.
//!
//! Every quantity is a fixed-point integer at `bits` fractional bits, so the
//! iteration is exact to the working precision at any zoom depth. Cost is
//! linear in the iteration count, with a per-step big-integer multiply.

use dashu::integer::IBig;
use deepbrot_core::fixed::{bit_len, mul_fixed};
use deepbrot_core::EscapeData;

/// Escape-time iteration `z ← z² + c` for one point.
///
/// `cx`/`cy` are fixed-point at `bits` fractional bits. The escape test
/// compares `|z|²` against 4 scaled into the same fixed-point domain. Points
/// that reach the boundary exactly count as escaped, so `c = 2` leaves at
/// iteration 1.
pub fn escape_time_fixed(cx: &IBig, cy: &IBig, bits: usize, max_iterations: u32) -> EscapeData {
    let escape = IBig::from(4) << bits;
    let mut x = IBig::ZERO;
    let mut y = IBig::ZERO;

    for i in 0..max_iterations {
        let x2 = mul_fixed(&x, &x, bits);
        let y2 = mul_fixed(&y, &y, bits);
        let norm_sq = &x2 + &y2;
        if norm_sq >= escape {
            return EscapeData::new(i, max_iterations, true, smooth_escape(&norm_sq, bits, i));
        }

        let xy = mul_fixed(&x, &y, bits);
        x = x2 - y2 + cx;
        y = (xy << 1usize) + cy;
    }

    EscapeData::interior(max_iterations)
}

/// Continuous escape value μ = i + 1 − log2(log2|z|), with log2|z| taken
/// from the bit length of the fixed-point |z|². A bit-length log is off by
/// less than one bit, which is invisible after the outer log2.
fn smooth_escape(norm_sq: &IBig, bits: usize, iteration: u32) -> f32 {
    let log2_norm_sq = (bit_len(norm_sq) as f64 - 1.0) - bits as f64;
    let log2_z = (log2_norm_sq / 2.0).max(1.0);
    (iteration as f64 + 1.0 - log2_z.log2()) as f32
}
