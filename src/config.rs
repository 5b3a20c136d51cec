use crate::foundation::core::Rgba8;
use crate::foundation::error::{ScrawlError, ScrawlResult};

/// How the width of a variable-width segment moves from its start width to its end width.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WidthEasing {
    /// Weight `t^3`; the reference look, width holds near the start and catches up late.
    #[default]
    Cubic,
    /// Weight `t`.
    Linear,
}

impl WidthEasing {
    pub fn weight(self, t: f64) -> f64 {
        match self {
            Self::Cubic => t * t * t,
            Self::Linear => t,
        }
    }
}

/// Pen appearance applied to newly emitted segments.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct StrokeStyle {
    pub color: Rgba8,
    pub base_width: f64,
    pub constant_width: bool,
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self {
            color: Rgba8::BLACK,
            base_width: 10.0,
            constant_width: false,
        }
    }
}

impl StrokeStyle {
    pub fn validate(&self) -> ScrawlResult<()> {
        if !self.base_width.is_finite() || self.base_width <= 0.0 {
            return Err(ScrawlError::validation(format!(
                "stroke base_width must be finite and > 0, got {}",
                self.base_width
            )));
        }
        Ok(())
    }
}

/// Tuning constants for smoothing and rasterization.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct InkConfig {
    /// Weight of the newest velocity measurement in the exponential filter.
    pub velocity_filter_weight: f64,
    /// Velocity (units/sec) at the midpoint of the width curve; also the filter seed.
    pub initial_velocity: f64,
    /// Width floor as a fraction of the base width.
    pub relative_min_width: f64,
    /// Dots stamped per variable-width segment.
    pub ribbon_steps: u32,
    /// Single-tap dot diameter, relative to the width at `initial_velocity`.
    pub dot_scale: f64,
    pub width_easing: WidthEasing,
    /// Flattening tolerance used when building circle and curve outlines.
    pub curve_tolerance: f64,
}

pub const RIBBON_STEPS_ENV: &str = "SCRAWL_RIBBON_STEPS";

impl Default for InkConfig {
    fn default() -> Self {
        Self {
            velocity_filter_weight: 0.9,
            initial_velocity: 220.0,
            relative_min_width: 0.4,
            ribbon_steps: 300,
            dot_scale: 1.5,
            width_easing: WidthEasing::Cubic,
            curve_tolerance: 0.1,
        }
    }
}

impl InkConfig {
    /// Defaults, with `SCRAWL_RIBBON_STEPS` applied when it holds a positive integer.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(steps) = std::env::var(RIBBON_STEPS_ENV)
            .ok()
            .and_then(|v| v.trim().parse::<u32>().ok())
            .filter(|&n| n > 0)
        {
            config.ribbon_steps = steps;
        }
        config
    }

    pub fn validate(&self) -> ScrawlResult<()> {
        let w = self.velocity_filter_weight;
        if !w.is_finite() || !(0.0..=1.0).contains(&w) {
            return Err(ScrawlError::validation(
                "velocity_filter_weight must be within [0, 1]",
            ));
        }
        if !self.initial_velocity.is_finite() || self.initial_velocity <= 0.0 {
            return Err(ScrawlError::validation("initial_velocity must be > 0"));
        }
        let m = self.relative_min_width;
        if !m.is_finite() || m <= 0.0 || m > 1.0 {
            return Err(ScrawlError::validation(
                "relative_min_width must be within (0, 1]",
            ));
        }
        if self.ribbon_steps == 0 {
            return Err(ScrawlError::validation("ribbon_steps must be > 0"));
        }
        if !self.dot_scale.is_finite() || self.dot_scale <= 0.0 {
            return Err(ScrawlError::validation("dot_scale must be > 0"));
        }
        if !self.curve_tolerance.is_finite() || self.curve_tolerance <= 0.0 {
            return Err(ScrawlError::validation("curve_tolerance must be > 0"));
        }
        Ok(())
    }
}
