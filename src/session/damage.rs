use crate::foundation::core::{CanvasSize, Rect};

/// Pixel rectangle, clamped to a canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirtyRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl DirtyRect {
    /// Smallest pixel rectangle covering `rect` inside `canvas`; `None` when they don't meet.
    pub fn covering(rect: Rect, canvas: CanvasSize) -> Option<Self> {
        let r = rect.expand().intersect(canvas.bounds());
        if !(r.width() >= 1.0 && r.height() >= 1.0) {
            return None;
        }
        Some(Self {
            x: r.x0 as u32,
            y: r.y0 as u32,
            width: r.width() as u32,
            height: r.height() as u32,
        })
    }

    pub fn union(self, other: DirtyRect) -> DirtyRect {
        let x0 = self.x.min(other.x);
        let y0 = self.y.min(other.y);
        let x1 = (self.x + self.width).max(other.x + other.width);
        let y1 = (self.y + self.height).max(other.y + other.height);
        DirtyRect {
            x: x0,
            y: y0,
            width: x1 - x0,
            height: y1 - y0,
        }
    }
}

/// What part of the visible canvas a call changed; the view layer repaints accordingly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Damage {
    #[default]
    None,
    Rect(DirtyRect),
    Full,
}

impl Damage {
    pub fn merge(self, other: Damage) -> Damage {
        match (self, other) {
            (Damage::Full, _) | (_, Damage::Full) => Damage::Full,
            (Damage::None, d) | (d, Damage::None) => d,
            (Damage::Rect(a), Damage::Rect(b)) => Damage::Rect(a.union(b)),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Damage::None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn covering_clamps_and_rounds_out() {
        let canvas = CanvasSize::new(100, 50).unwrap();
        let r = DirtyRect::covering(Rect::new(-3.5, 10.2, 20.1, 80.0), canvas).unwrap();
        assert_eq!(
            r,
            DirtyRect {
                x: 0,
                y: 10,
                width: 21,
                height: 40
            }
        );
        assert!(DirtyRect::covering(Rect::new(200.0, 0.0, 210.0, 5.0), canvas).is_none());
    }

    #[test]
    fn merge_prefers_full_and_unions_rects() {
        let a = DirtyRect {
            x: 0,
            y: 0,
            width: 2,
            height: 2,
        };
        let b = DirtyRect {
            x: 5,
            y: 1,
            width: 1,
            height: 4,
        };
        assert_eq!(
            Damage::Rect(a).merge(Damage::Rect(b)),
            Damage::Rect(DirtyRect {
                x: 0,
                y: 0,
                width: 6,
                height: 5
            })
        );
        assert_eq!(Damage::None.merge(Damage::Rect(a)), Damage::Rect(a));
        assert_eq!(Damage::Rect(a).merge(Damage::Full), Damage::Full);
        assert!(Damage::None.merge(Damage::None).is_none());
    }
}
