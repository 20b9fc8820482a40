use crate::camera::Camera;
use crate::fixed::serde_ibig;
use dashu::integer::IBig;
use serde::{Deserialize, Serialize};

/// Kernel selection for one render generation.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// Arbitrary-precision fixed-point iteration for every pixel.
    DirectFixedPoint,
    /// One high-precision reference orbit plus f64 delta iteration per pixel.
    Perturbation,
}

/// Everything the dispatcher needs to start a render.
///
/// Canvas dimensions and precision ride along inside the camera.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RenderRequest {
    pub camera: Camera,
    /// User-facing iteration ceiling (clamped to the supported range).
    pub max_iterations_cap: u32,
    /// Pixel block size: 1 for full quality, larger for preview passes.
    pub pixel_step: u32,
    pub mode: RenderMode,
}

/// Messages sent from the dispatcher to a worker.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(tag = "type")]
pub enum WorkerJob {
    /// Render a strip with the fixed-point kernel. World coordinates are
    /// fixed-point integers at `precision_bits` fractional bits.
    FixedStrip {
        token: u64,
        canvas_width: u32,
        origin_row: u32,
        row_count: u32,
        pixel_step: u32,
        max_iterations: u32,
        precision_bits: usize,
        #[serde(with = "serde_ibig")]
        world_origin_x: IBig,
        #[serde(with = "serde_ibig")]
        world_origin_y: IBig,
        #[serde(with = "serde_ibig")]
        world_scale: IBig,
    },

    /// Render a strip against a previously published reference orbit.
    /// Coordinates are f64 offsets from the reference point.
    PerturbationStrip {
        token: u64,
        canvas_width: u32,
        origin_row: u32,
        row_count: u32,
        pixel_step: u32,
        max_iterations: u32,
        world_origin_x: f64,
        world_origin_y: f64,
        world_scale: f64,
        reference_x: f64,
        reference_y: f64,
    },

    /// Install a reference orbit for use by later perturbation strips.
    PublishOrbit { publish: OrbitPublish },

    /// Terminate the worker loop.
    Shutdown,
}

/// A reference orbit broadcast once per perturbation render.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct OrbitPublish {
    pub token: u64,
    pub max_iterations: u32,
    /// f64 snapshots of the reference orbit, one per iteration. Shorter than
    /// `max_iterations` when the reference itself escaped.
    pub orbit: Vec<(f64, f64)>,
}

/// A finished strip of RGBA8 pixels, sent from a worker back to the
/// dispatcher.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct StripResult {
    pub token: u64,
    pub origin_row: u32,
    pub row_count: u32,
    /// `canvas_width * row_count * 4` bytes, row-major RGBA8.
    pub pixels: Vec<u8>,
}
