/// Easing functions used to map normalized progress.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Ease {
    /// Linear interpolation.
    Linear,
    /// Hermite smoothstep `u²(3−2u)`: zero velocity at both endpoints.
    SmoothStep,
}

impl Ease {
    /// Apply this easing function to normalized progress `t` in `[0, 1]`.
    pub fn apply(self, t: f64) -> f64 {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        match self {
            Self::Linear => t,
            Self::SmoothStep => t * t * (3.0 - 2.0 * t),
        }
    }

    /// Progress of `elapsed` through `duration`, eased.
    ///
    /// Non-positive durations are treated as already complete.
    pub fn progress(self, elapsed: f64, duration: f64) -> f64 {
        if duration <= 0.0 {
            return self.apply(1.0);
        }
        self.apply(elapsed / duration)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/ease.rs"]
mod tests;
