use crate::config::InkConfig;

/// Velocity-to-width mapping plus the per-stroke filter state that keeps widths continuous.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WidthModel {
    base_width: f64,
    initial_velocity: f64,
    filter_weight: f64,
    relative_min_width: f64,
    last_velocity: f64,
    last_width: f64,
}

impl WidthModel {
    pub fn new(base_width: f64, config: &InkConfig) -> Self {
        Self {
            base_width,
            initial_velocity: config.initial_velocity,
            filter_weight: config.velocity_filter_weight,
            relative_min_width: config.relative_min_width,
            last_velocity: config.initial_velocity,
            last_width: base_width,
        }
    }

    pub fn base_width(&self) -> f64 {
        self.base_width
    }

    pub fn initial_velocity(&self) -> f64 {
        self.initial_velocity
    }

    pub fn last_velocity(&self) -> f64 {
        self.last_velocity
    }

    pub fn last_width(&self) -> f64 {
        self.last_width
    }

    /// Logistic falloff centred on the initial velocity: `base` at rest, approaching
    /// `relative_min_width * base` as velocity grows.
    pub fn width_for_velocity(&self, velocity: f64) -> f64 {
        let v0 = self.initial_velocity;
        let span = self.base_width * (1.0 - self.relative_min_width);
        self.base_width - span / (1.0 + (-(velocity - v0) / v0).exp())
    }

    /// Reseed the filter for a fresh stroke.
    pub fn reset(&mut self) {
        self.last_velocity = self.initial_velocity;
        self.last_width = self.base_width;
    }

    /// Change the base width; the filter is reseeded against it.
    pub fn set_base_width(&mut self, base_width: f64) {
        self.base_width = base_width;
        self.reset();
    }

    /// Feed one raw velocity measurement and return `(start_width, end_width)` for the segment
    /// it describes. `None` reuses the previous filtered velocity.
    pub fn advance(&mut self, raw_velocity: Option<f64>) -> (f64, f64) {
        let smoothed = match raw_velocity {
            Some(v) if v.is_finite() => {
                let w = self.filter_weight;
                w * v + (1.0 - w) * self.last_velocity
            }
            _ => {
                tracing::warn!(
                    last_velocity = self.last_velocity,
                    "no usable velocity between samples, holding previous velocity"
                );
                self.last_velocity
            }
        };
        let width = self.width_for_velocity(smoothed);

        let start = self.last_width;
        self.last_velocity = smoothed;
        self.last_width = width;
        (start, width)
    }
}
