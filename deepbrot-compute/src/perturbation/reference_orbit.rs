//! Reference orbit computation.
//!
//! The orbit is iterated once at full fixed-point precision and stored as
//! f64 snapshots; orbit values are bounded by the escape radius, so the
//! snapshots lose nothing a delta iteration cares about.

use dashu::integer::IBig;
use deepbrot_core::fixed::{mul_fixed, to_f64};

/// A pre-computed reference orbit for perturbation rendering.
#[derive(Clone, Debug)]
pub struct ReferenceOrbit {
    /// Reference point c as f64.
    pub reference: (f64, f64),
    /// f64 snapshots of z_n, one per iteration.
    pub orbit: Vec<(f64, f64)>,
    /// Iteration at which the reference escaped (None if it never did).
    pub escaped_at: Option<u32>,
}

impl ReferenceOrbit {
    /// Iterate `z ← z² + c` at `bits` fixed-point precision, snapshotting
    /// every step. Stops early if the reference itself escapes.
    pub fn compute(cx: &IBig, cy: &IBig, bits: usize, max_iterations: u32) -> Self {
        let escape = IBig::from(4) << bits;
        let mut orbit = Vec::with_capacity(max_iterations as usize);
        let mut x = IBig::ZERO;
        let mut y = IBig::ZERO;
        let mut escaped_at = None;

        for i in 0..max_iterations {
            orbit.push((to_f64(&x, bits), to_f64(&y, bits)));

            let x2 = mul_fixed(&x, &x, bits);
            let y2 = mul_fixed(&y, &y, bits);
            let norm_sq = &x2 + &y2;
            if norm_sq >= escape {
                escaped_at = Some(i);
                break;
            }

            let xy = mul_fixed(&x, &y, bits);
            x = x2 - y2 + cx;
            y = (xy << 1usize) + cy;
        }

        Self {
            reference: (to_f64(cx, bits), to_f64(cy, bits)),
            orbit,
            escaped_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deepbrot_core::fixed::from_f64;

    fn compute(cx: f64, cy: f64, max_iterations: u32) -> ReferenceOrbit {
        let cx = from_f64(cx, 128).unwrap();
        let cy = from_f64(cy, 128).unwrap();
        ReferenceOrbit::compute(&cx, &cy, 128, max_iterations)
    }

    #[test]
    fn interior_reference_fills_the_whole_orbit() {
        let orbit = compute(-0.5, 0.0, 200);
        assert_eq!(orbit.escaped_at, None);
        assert_eq!(orbit.orbit.len(), 200);
        assert_eq!(orbit.reference, (-0.5, 0.0));
    }

    #[test]
    fn orbit_starts_at_zero_then_c() {
        let orbit = compute(-0.5, 0.25, 10);
        assert_eq!(orbit.orbit[0], (0.0, 0.0));
        assert_eq!(orbit.orbit[1], (-0.5, 0.25));
    }

    #[test]
    fn escaping_reference_records_where_it_left() {
        // z1 = 2 sits exactly on the escape boundary.
        let orbit = compute(2.0, 0.0, 100);
        assert_eq!(orbit.escaped_at, Some(1));
        assert_eq!(orbit.orbit.len(), 2);
    }

    #[test]
    fn snapshots_track_the_f64_orbit_at_shallow_depth() {
        let orbit = compute(-0.75, 0.1, 50);
        let mut x = 0.0f64;
        let mut y = 0.0f64;
        for i in 0..12 {
            let (ox, oy) = orbit.orbit[i];
            assert!((ox - x).abs() < 1e-6, "step {i}");
            assert!((oy - y).abs() < 1e-6, "step {i}");
            let nx = x * x - y * y - 0.75;
            let ny = 2.0 * x * y + 0.1;
            x = nx;
            y = ny;
        }
    }
}
