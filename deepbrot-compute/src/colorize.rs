//! Escape-count coloring.
//!
//! Three phase-shifted sine waves over the normalized escape value. Interior
//! points are black. Workers colorize, so the result stream is RGBA8 strips.

use deepbrot_core::EscapeData;
use std::f64::consts::TAU;

const PHASES: [f64; 3] = [0.0, 0.33, 0.66];

/// RGBA8 color for one pixel.
pub fn colorize(data: &EscapeData) -> [u8; 4] {
    if !data.escaped || data.max_iterations == 0 {
        return [0, 0, 0, 255];
    }

    let t = f64::from(data.smooth).max(0.0) / f64::from(data.max_iterations);
    let channel = |phase: f64| {
        let wave = 0.5 + 0.5 * (TAU * (t * 3.0 + phase)).sin();
        (wave * 255.0) as u8
    };
    [channel(PHASES[0]), channel(PHASES[1]), channel(PHASES[2]), 255]
}
