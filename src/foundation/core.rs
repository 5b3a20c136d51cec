use crate::foundation::error::{ScrawlError, ScrawlResult};

pub use kurbo::{Point, Rect};

/// One raw pointer sample: a position in view space plus the time it was observed (seconds).
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Sample {
    pub position: Point,
    pub timestamp: f64,
}

impl Sample {
    pub fn new(position: Point, timestamp: f64) -> ScrawlResult<Self> {
        if !position.is_finite() {
            return Err(ScrawlError::validation("sample position must be finite"));
        }
        if !timestamp.is_finite() {
            return Err(ScrawlError::validation("sample timestamp must be finite"));
        }
        Ok(Self {
            position,
            timestamp,
        })
    }

    /// Speed (units/sec) travelled from `origin` to `self`.
    ///
    /// Returns `None` when `self` is not strictly later than `origin`; callers decide how to
    /// carry on without a measurement.
    pub fn velocity_from(&self, origin: &Sample) -> Option<f64> {
        let dt = self.timestamp - origin.timestamp;
        if dt.is_nan() || dt <= 0.0 {
            return None;
        }
        let v = self.position.distance(origin.position) / dt;
        v.is_finite().then_some(v)
    }
}

/// Straight (non-premultiplied) RGBA8 color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    pub const BLACK: Self = Self::rgba(0, 0, 0, 255);
    pub const WHITE: Self = Self::rgba(255, 255, 255, 255);
    pub const TRANSPARENT: Self = Self::rgba(0, 0, 0, 0);

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r, g, b, 255)
    }

    pub fn premultiplied(self) -> [u8; 4] {
        fn premul(c: u8, a: u8) -> u8 {
            let c = u16::from(c);
            let a = u16::from(a);
            (((c * a) + 127) / 255) as u8
        }

        [
            premul(self.r, self.a),
            premul(self.g, self.a),
            premul(self.b, self.a),
            self.a,
        ]
    }

    pub(crate) fn to_cpu(self) -> vello_cpu::peniko::Color {
        vello_cpu::peniko::Color::from_rgba8(self.r, self.g, self.b, self.a)
    }
}

impl Default for Rgba8 {
    fn default() -> Self {
        Self::BLACK
    }
}

/// Pixel dimensions of a drawing surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct CanvasSize {
    pub width: u32,
    pub height: u32,
}

impl CanvasSize {
    pub fn new(width: u32, height: u32) -> ScrawlResult<Self> {
        let size = Self { width, height };
        size.validate()?;
        Ok(size)
    }

    pub fn validate(self) -> ScrawlResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(ScrawlError::validation(format!(
                "canvas size must be non-empty, got {}x{}",
                self.width, self.height
            )));
        }
        if self.width > u32::from(u16::MAX) || self.height > u32::from(u16::MAX) {
            return Err(ScrawlError::validation(format!(
                "canvas size {}x{} exceeds {} pixels per side",
                self.width,
                self.height,
                u16::MAX
            )));
        }
        Ok(())
    }

    pub fn bounds(self) -> Rect {
        Rect::new(0.0, 0.0, f64::from(self.width), f64::from(self.height))
    }

    pub fn pixel_count(self) -> usize {
        self.width as usize * self.height as usize
    }
}
