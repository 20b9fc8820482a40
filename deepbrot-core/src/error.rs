use thiserror::Error;

/// Errors raised by the numeric and camera layers.
///
/// The kernels themselves are pure arithmetic over validated inputs and
/// cannot fail; everything that can go wrong is rejected here, before
/// dispatch.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CoreError {
    /// A NaN or infinite double was handed to the arbitrary-precision layer.
    #[error("non-finite value cannot enter the arbitrary-precision layer")]
    NonFinite,

    /// Precision outside the supported range, or too low to resolve the
    /// current scale.
    #[error("unusable precision: {bits} bits")]
    InvalidPrecision { bits: usize },

    /// Zoom factors must be finite and strictly positive.
    #[error("invalid zoom factor: {factor}")]
    InvalidZoomFactor { factor: f64 },

    /// Canvas with no renderable pixels.
    #[error("invalid canvas size: {width}x{height}")]
    InvalidCanvas { width: u32, height: u32 },
}
