use kurbo::{CubicBez, ParamCurve, ParamCurveExtrema};

use crate::config::WidthEasing;
use crate::foundation::core::{Point, Rect, Rgba8};

/// Session-unique, monotonically increasing segment tag.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct SegmentId(pub u64);

/// Hands out [`SegmentId`]s in creation order.
#[derive(Clone, Debug, Default)]
pub struct SegmentIds {
    next: u64,
}

impl SegmentIds {
    pub fn next_id(&mut self) -> SegmentId {
        let id = SegmentId(self.next);
        self.next += 1;
        id
    }
}

/// A single-sample touch, drawn as a filled circle.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Dot {
    pub id: SegmentId,
    pub position: Point,
    /// Diameter.
    pub width: f64,
    pub color: Rgba8,
}

/// One fitted cubic segment of a stroke.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BezierStroke {
    pub id: SegmentId,
    pub start: Point,
    pub ctrl1: Point,
    pub ctrl2: Point,
    pub end: Point,
    pub start_width: f64,
    pub end_width: f64,
    pub color: Rgba8,
    pub constant_width: bool,
    /// Timestamp of the sample that closed this segment.
    pub timestamp: f64,
}

impl BezierStroke {
    pub fn curve(&self) -> CubicBez {
        CubicBez::new(self.start, self.ctrl1, self.ctrl2, self.end)
    }

    pub fn position_at(&self, t: f64) -> Point {
        self.curve().eval(t)
    }

    pub fn width_at(&self, t: f64, easing: WidthEasing) -> f64 {
        self.start_width + easing.weight(t) * (self.end_width - self.start_width)
    }

    pub fn max_width(&self) -> f64 {
        self.start_width.max(self.end_width)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PathSegment {
    Dot(Dot),
    Bezier(BezierStroke),
}

impl PathSegment {
    pub fn id(&self) -> SegmentId {
        match self {
            Self::Dot(d) => d.id,
            Self::Bezier(b) => b.id,
        }
    }

    /// Area the segment may paint, before anti-aliasing.
    pub fn bounds(&self) -> Rect {
        match self {
            Self::Dot(d) => {
                let r = d.width / 2.0;
                Rect::from_points(d.position, d.position).inflate(r, r)
            }
            Self::Bezier(b) => {
                let r = b.max_width() / 2.0;
                b.curve().bounding_box().inflate(r, r)
            }
        }
    }

    pub fn as_bezier(&self) -> Option<&BezierStroke> {
        match self {
            Self::Bezier(b) => Some(b),
            Self::Dot(_) => None,
        }
    }
}
