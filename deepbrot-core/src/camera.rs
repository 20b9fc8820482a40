//! View model: complex-plane center and per-pixel scale, kept in both an
//! arbitrary-precision representation and a machine-double mirror.
//!
//! The mirror is recomputed from the BigFloat state after every operation.
//! Once the scale drops below what a double can resolve (the deep regime),
//! the mirror is an approximation only and all pixel placement must route
//! through [`Camera::fixed_snapshot`].

use crate::bigfloat::BigFloat;
use crate::error::CoreError;
use crate::fixed::serde_ibig;
use crate::precision::{auto_precision_bits, MAX_PRECISION_BITS, MIN_PRECISION_BITS};
use dashu::integer::IBig;
use serde::{Deserialize, Serialize};

/// World units visible across the canvas after a reset.
const RESET_SPAN: f64 = 3.5;

/// Default log2(scale) below which the deep regime engages. Full f64
/// underflow is near -1080; triggering earlier keeps a safety margin.
pub const DEFAULT_DEEP_TRIGGER_LOG2: f64 = -960.0;

/// Machine-double mirror of the camera state.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CameraApprox {
    pub center_x: f64,
    pub center_y: f64,
    pub scale: f64,
}

/// Precision regime selected from the magnitude of the current scale.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Regime {
    /// Scale still representable in a double with bits to spare.
    Direct,
    /// Doubles can no longer resolve per-pixel differences.
    Deep,
}

/// World origin and per-pixel scale as fixed-point integers at `bits`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FixedFrame {
    #[serde(with = "serde_ibig")]
    pub origin_x: IBig,
    #[serde(with = "serde_ibig")]
    pub origin_y: IBig,
    #[serde(with = "serde_ibig")]
    pub scale: IBig,
    pub bits: usize,
}

/// Interactive view state. Pure value type: pan/zoom/reset return new
/// instances and never mutate in place.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Camera {
    center_x: BigFloat,
    center_y: BigFloat,
    scale: BigFloat,
    initial_scale: BigFloat,
    precision_bits: usize,
    canvas_width: u32,
    canvas_height: u32,
    deep_trigger_log2: f64,
    approx: CameraApprox,
}

impl Camera {
    /// Canonical view: center (-0.5, 0), the full set visible across the
    /// canvas width.
    pub fn new(
        canvas_width: u32,
        canvas_height: u32,
        precision_bits: usize,
    ) -> Result<Self, CoreError> {
        if canvas_width == 0 || canvas_height == 0 {
            return Err(CoreError::InvalidCanvas {
                width: canvas_width,
                height: canvas_height,
            });
        }
        validate_precision(precision_bits)?;

        let scale = BigFloat::from_f64(RESET_SPAN / canvas_width as f64)?;
        let mut camera = Self {
            center_x: BigFloat::from_f64(-0.5)?,
            center_y: BigFloat::zero(),
            initial_scale: scale.clone(),
            scale,
            precision_bits,
            canvas_width,
            canvas_height,
            deep_trigger_log2: DEFAULT_DEEP_TRIGGER_LOG2,
            approx: CameraApprox {
                center_x: 0.0,
                center_y: 0.0,
                scale: 0.0,
            },
        };
        camera.refresh_approx();
        Ok(camera)
    }

    /// Override the deep-regime trigger (log2 of scale).
    pub fn with_deep_trigger(mut self, deep_trigger_log2: f64) -> Self {
        self.deep_trigger_log2 = deep_trigger_log2;
        self
    }

    pub fn center(&self) -> (&BigFloat, &BigFloat) {
        (&self.center_x, &self.center_y)
    }

    pub fn scale(&self) -> &BigFloat {
        &self.scale
    }

    pub fn precision_bits(&self) -> usize {
        self.precision_bits
    }

    pub fn canvas_width(&self) -> u32 {
        self.canvas_width
    }

    pub fn canvas_height(&self) -> u32 {
        self.canvas_height
    }

    pub fn approx(&self) -> CameraApprox {
        self.approx
    }

    /// Translate the center by a pixel delta: center += delta × scale.
    pub fn pan(&self, dx_px: i64, dy_px: i64) -> Self {
        let mut next = self.clone();
        next.center_x = self.center_x.add(&self.scale.mul_i64(dx_px));
        next.center_y = self.center_y.add(&self.scale.mul_i64(dy_px));
        next.refresh_approx();
        next
    }

    /// Rescale around the canvas point `(px, py)`, keeping the world
    /// coordinate under the cursor invariant:
    /// center += offset × (scale_before − scale_after), with the offset
    /// measured from the canvas midpoint.
    pub fn zoom_at(&self, px: i64, py: i64, factor: f64) -> Result<Self, CoreError> {
        if !factor.is_finite() || factor <= 0.0 {
            return Err(CoreError::InvalidZoomFactor { factor });
        }

        let off_x = px - (self.canvas_width / 2) as i64;
        let off_y = py - (self.canvas_height / 2) as i64;

        let scale_after = self.scale.mul(&BigFloat::from_f64(factor)?);
        let shrink = self.scale.sub(&scale_after);

        let mut next = self.clone();
        next.center_x = self.center_x.add(&shrink.mul_i64(off_x));
        next.center_y = self.center_y.add(&shrink.mul_i64(off_y));
        next.scale = scale_after;
        next.refresh_approx();
        Ok(next)
    }

    /// Back to the canonical view. Precision and canvas stay as they are.
    pub fn reset(&self) -> Result<Self, CoreError> {
        let camera = Self::new(self.canvas_width, self.canvas_height, self.precision_bits)?;
        Ok(camera.with_deep_trigger(self.deep_trigger_log2))
    }

    /// Switch to an explicit precision. Lossless when increasing; when
    /// decreasing, values re-round at the next fixed-point conversion.
    pub fn with_precision(&self, bits: usize) -> Result<Self, CoreError> {
        validate_precision(bits)?;
        let mut next = self.clone();
        next.precision_bits = bits;
        Ok(next)
    }

    /// Auto-escalate precision to cover the current zoom depth. Never
    /// decreases the bit width.
    pub fn ensure_precision(&self) -> Self {
        let bits = auto_precision_bits(self.scale.log2_approx(), self.precision_bits);
        if bits == self.precision_bits {
            return self.clone();
        }
        log::debug!(
            "precision escalated from {} to {} bits",
            self.precision_bits,
            bits
        );
        let mut next = self.clone();
        next.precision_bits = bits;
        next
    }

    /// Which kernel regime the current scale calls for.
    pub fn regime(&self) -> Regime {
        let mirror = self.approx.scale;
        if mirror == 0.0 || !mirror.is_finite() || self.scale.log2_approx() < self.deep_trigger_log2
        {
            Regime::Deep
        } else {
            Regime::Direct
        }
    }

    /// log2(initial_scale / scale), clamped non-negative.
    pub fn magnification_log2(&self) -> f64 {
        (self.initial_scale.log2_approx() - self.scale.log2_approx()).max(0.0)
    }

    /// World origin (top-left) and scale as fixed-point integers at the
    /// camera's precision: origin = center − half_canvas × scale, computed
    /// in the fixed-point domain.
    ///
    /// Fails when the precision cannot resolve the scale at all; this is
    /// the configuration check that keeps degenerate shift amounts out of
    /// the kernels.
    pub fn fixed_snapshot(&self) -> Result<FixedFrame, CoreError> {
        let bits = self.precision_bits;
        let scale = self.scale.to_fixed_point(bits);
        if scale == IBig::ZERO {
            return Err(CoreError::InvalidPrecision { bits });
        }

        let half_w = IBig::from(self.canvas_width / 2);
        let half_h = IBig::from(self.canvas_height / 2);
        let origin_x = self.center_x.to_fixed_point(bits) - half_w * &scale;
        let origin_y = self.center_y.to_fixed_point(bits) - half_h * &scale;

        Ok(FixedFrame {
            origin_x,
            origin_y,
            scale,
            bits,
        })
    }

    fn refresh_approx(&mut self) {
        self.approx = CameraApprox {
            center_x: self.center_x.to_f64(),
            center_y: self.center_y.to_f64(),
            scale: self.scale.to_f64(),
        };
    }
}

fn validate_precision(bits: usize) -> Result<(), CoreError> {
    if !(MIN_PRECISION_BITS..=MAX_PRECISION_BITS).contains(&bits) {
        return Err(CoreError::InvalidPrecision { bits });
    }
    Ok(())
}
