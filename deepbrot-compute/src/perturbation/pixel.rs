use deepbrot_core::EscapeData;

/// Delta iteration for one pixel against a reference orbit.
///
/// `dc` is the pixel's offset from the reference point; dz starts at 0 and
/// advances by `dz ← 2·z_ref·dz + dz² + dc` in plain f64. The escape test
/// runs on the reconstructed `z = z_ref + dz`. If the orbit ends before
/// `max_iterations` the reference escaped there, and a pixel this close to
/// it escapes with it.
pub fn escape_time_perturbation(
    dc_re: f64,
    dc_im: f64,
    orbit: &[(f64, f64)],
    max_iterations: u32,
) -> EscapeData {
    let mut dzx = 0.0f64;
    let mut dzy = 0.0f64;

    for i in 0..max_iterations {
        let Some(&(zx, zy)) = orbit.get(i as usize) else {
            return EscapeData::new(i, max_iterations, true, i as f32);
        };

        let rx = zx + dzx;
        let ry = zy + dzy;
        let norm_sq = rx * rx + ry * ry;
        if norm_sq >= 4.0 {
            return EscapeData::new(i, max_iterations, true, smooth_escape(norm_sq, i));
        }

        // 2·z_ref·dz
        let a_re = 2.0 * (zx * dzx - zy * dzy);
        let a_im = 2.0 * (zx * dzy + zy * dzx);
        // dz²
        let b_re = dzx * dzx - dzy * dzy;
        let b_im = 2.0 * dzx * dzy;

        dzx = a_re + b_re + dc_re;
        dzy = a_im + b_im + dc_im;
    }

    EscapeData::interior(max_iterations)
}

fn smooth_escape(norm_sq: f64, iteration: u32) -> f32 {
    let log2_z = (norm_sq.log2() / 2.0).max(1.0);
    (iteration as f64 + 1.0 - log2_z.log2()) as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::perturbation::ReferenceOrbit;
    use deepbrot_core::fixed::from_f64;

    fn orbit_at(cx: f64, cy: f64, max_iterations: u32) -> ReferenceOrbit {
        let cx = from_f64(cx, 128).unwrap();
        let cy = from_f64(cy, 128).unwrap();
        ReferenceOrbit::compute(&cx, &cy, 128, max_iterations)
    }

    #[test]
    fn zero_delta_reproduces_the_reference_point() {
        // dc = 0 means the pixel is the reference itself.
        let orbit = orbit_at(-0.5, 0.0, 300);
        let data = escape_time_perturbation(0.0, 0.0, &orbit.orbit, 300);
        assert!(!data.escaped);
        assert_eq!(data.iterations, 300);
    }

    #[test]
    fn pixel_near_interior_reference_escapes_on_its_own() {
        // Reference deep in the cardioid, pixel far outside the set.
        let orbit = orbit_at(-0.5, 0.0, 100);
        let data = escape_time_perturbation(3.0, 0.0, &orbit.orbit, 100);
        assert!(data.escaped);
        assert!(data.iterations <= 2);
    }

    #[test]
    fn pixel_follows_an_escaping_reference() {
        let reference = orbit_at(2.0, 0.0, 100);
        assert_eq!(reference.escaped_at, Some(1));
        let data = escape_time_perturbation(1e-9, 0.0, &reference.orbit, 100);
        assert!(data.escaped);
        assert!(data.iterations <= reference.orbit.len() as u32);
    }

    #[test]
    fn smooth_value_is_finite_and_near_the_count() {
        let orbit = orbit_at(-0.75, 0.1, 1000);
        let data = escape_time_perturbation(1e-7, 1e-7, &orbit.orbit, 1000);
        assert!(data.escaped);
        assert!(data.smooth.is_finite());
        assert!(data.smooth > data.iterations as f32 - 1.0);
        assert!(data.smooth < data.iterations as f32 + 2.0);
    }
}
