use serde::{Deserialize, Serialize};

/// Result of evaluating one pixel.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EscapeData {
    /// Iterations before escape (or `max_iterations` if the orbit never escaped).
    pub iterations: u32,
    /// Iteration cap used for this computation (for colorizer normalization).
    pub max_iterations: u32,
    /// Whether the point escaped the set.
    pub escaped: bool,
    /// Continuous escape value μ = i + 1 − log2(log2|z|) for banding-free
    /// coloring. Interior points store 0.0.
    pub smooth: f32,
}

impl EscapeData {
    /// Create a new EscapeData, sanitizing any NaN/Infinity smooth value.
    /// serde_json writes non-finite floats as null, which would poison
    /// deserialization downstream.
    pub fn new(iterations: u32, max_iterations: u32, escaped: bool, smooth: f32) -> Self {
        Self {
            iterations,
            max_iterations,
            escaped,
            smooth: sanitize_f32(smooth),
        }
    }

    /// An interior (non-escaping) point.
    pub fn interior(max_iterations: u32) -> Self {
        Self {
            iterations: max_iterations,
            max_iterations,
            escaped: false,
            smooth: 0.0,
        }
    }
}

#[inline]
fn sanitize_f32(value: f32) -> f32 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_sanitizes_non_finite_smooth() {
        assert_eq!(EscapeData::new(10, 100, true, f32::NAN).smooth, 0.0);
        assert_eq!(EscapeData::new(10, 100, true, f32::INFINITY).smooth, 0.0);
        assert_eq!(EscapeData::new(10, 100, true, 10.5).smooth, 10.5);
    }

    #[test]
    fn interior_point_never_escapes() {
        let data = EscapeData::interior(500);
        assert_eq!(data.iterations, 500);
        assert!(!data.escaped);
        assert_eq!(data.smooth, 0.0);
    }

    #[test]
    fn serialization_roundtrip() {
        let original = EscapeData::new(42, 1000, true, 42.7);
        let json = serde_json::to_string(&original).unwrap();
        let restored: EscapeData = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, original);
    }
}
