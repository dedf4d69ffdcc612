//! Ken Burns motion catalog.
//!
//! Every effect is a pure function of elapsed time, clip duration and canvas size. Effects carry
//! no state, so one value can be shared by any number of clips.

use kurbo::{Affine, Vec2};
use rand::Rng;

use crate::animation::ease::Ease;
use crate::foundation::core::Canvas;

/// Scale and center displacement of a clip at one instant.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MotionTransform {
    /// Uniform scale about the canvas center.
    pub scale: f64,
    /// Horizontal displacement of the scaled image's center, in pixels.
    pub dx: f64,
    /// Vertical displacement of the scaled image's center, in pixels.
    pub dy: f64,
}

impl MotionTransform {
    /// No scaling, no displacement.
    pub const IDENTITY: Self = Self {
        scale: 1.0,
        dx: 0.0,
        dy: 0.0,
    };

    /// Affine mapping clip-space pixel coordinates to canvas coordinates.
    pub fn to_affine(self, canvas: Canvas) -> Affine {
        let c = canvas.center().to_vec2();
        Affine::translate(c + Vec2::new(self.dx, self.dy))
            * Affine::scale(self.scale)
            * Affine::translate(-c)
    }
}

/// One of the fixed motion effects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotionEffect {
    /// Zoom in while the image drifts left (camera pans right).
    ZoomAndPanRight,
    /// Zoom in while the image drifts right (camera pans left).
    ZoomAndPanLeft,
    /// Zoom in while the image drifts up (camera pans down).
    ZoomAndPanDown,
    /// Zoom in while the image drifts down (camera pans up).
    ZoomAndPanUp,
    /// Subtle continuous zoom in.
    SlowZoomIn,
    /// Start zoomed, ease back to full frame.
    SlowZoomOut,
    /// Fixed zoom, drift toward the top-left.
    #[serde(rename = "diagonal_drift_1")]
    DiagonalDrift1,
    /// Fixed zoom, drift toward the top-right.
    #[serde(rename = "diagonal_drift_2")]
    DiagonalDrift2,
    /// Fallback for unrecognized tags; never drawn by [`choose_effect`].
    #[serde(other)]
    Default,
}

impl MotionEffect {
    /// Effects eligible for random selection.
    pub const CATALOG: [MotionEffect; 8] = [
        Self::ZoomAndPanRight,
        Self::ZoomAndPanLeft,
        Self::ZoomAndPanDown,
        Self::ZoomAndPanUp,
        Self::SlowZoomIn,
        Self::SlowZoomOut,
        Self::DiagonalDrift1,
        Self::DiagonalDrift2,
    ];

    /// Stable snake_case tag.
    pub fn tag(self) -> &'static str {
        match self {
            Self::ZoomAndPanRight => "zoom_and_pan_right",
            Self::ZoomAndPanLeft => "zoom_and_pan_left",
            Self::ZoomAndPanDown => "zoom_and_pan_down",
            Self::ZoomAndPanUp => "zoom_and_pan_up",
            Self::SlowZoomIn => "slow_zoom_in",
            Self::SlowZoomOut => "slow_zoom_out",
            Self::DiagonalDrift1 => "diagonal_drift_1",
            Self::DiagonalDrift2 => "diagonal_drift_2",
            Self::Default => "default",
        }
    }

    /// Resolve a tag; anything unrecognized becomes [`MotionEffect::Default`].
    pub fn from_tag(tag: &str) -> Self {
        let tag = tag.trim().to_ascii_lowercase();
        Self::CATALOG
            .into_iter()
            .find(|e| e.tag() == tag)
            .unwrap_or(Self::Default)
    }

    /// Evaluate the effect `elapsed` seconds into a clip of `duration` seconds.
    pub fn evaluate(self, elapsed: f64, duration: f64, canvas: Canvas) -> MotionTransform {
        let e = Ease::SmoothStep.progress(elapsed, duration);
        let w = f64::from(canvas.width);
        let h = f64::from(canvas.height);

        let (scale, dx, dy) = match self {
            Self::ZoomAndPanRight => (1.0 + 0.15 * e, -0.10 * w * e, 0.0),
            Self::ZoomAndPanLeft => (1.0 + 0.15 * e, 0.10 * w * e, 0.0),
            Self::ZoomAndPanDown => (1.0 + 0.15 * e, 0.0, -0.10 * h * e),
            Self::ZoomAndPanUp => (1.0 + 0.15 * e, 0.0, 0.10 * h * e),
            Self::SlowZoomIn => (1.0 + 0.20 * e, 0.0, 0.0),
            Self::SlowZoomOut => (1.20 - 0.20 * e, 0.0, 0.0),
            Self::DiagonalDrift1 => (1.15, -0.075 * w * e, -0.075 * h * e),
            Self::DiagonalDrift2 => (1.15, 0.075 * w * e, -0.075 * h * e),
            Self::Default => (1.0 + 0.10 * e, 0.0, 0.0),
        };
        MotionTransform { scale, dx, dy }
    }
}

impl std::fmt::Display for MotionEffect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// Draw one effect uniformly from [`MotionEffect::CATALOG`].
pub fn choose_effect<R: Rng + ?Sized>(rng: &mut R) -> MotionEffect {
    MotionEffect::CATALOG[rng.gen_range(0..MotionEffect::CATALOG.len())]
}

#[cfg(test)]
#[path = "../../tests/unit/motion/effect.rs"]
mod tests;
