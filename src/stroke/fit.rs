use crate::config::{InkConfig, StrokeStyle};
use crate::foundation::core::{Point, Sample};
use crate::foundation::error::{ScrawlError, ScrawlResult};
use crate::stroke::segment::{BezierStroke, Dot, SegmentIds};
use crate::stroke::width::WidthModel;

/// Samples needed to fit one cubic segment.
pub const WINDOW_LEN: usize = 5;

#[derive(Clone, Debug, PartialEq)]
enum FitState {
    Idle,
    Collecting {
        window: Vec<Sample>,
        /// Samples received since pointer-down, including discarded ones.
        seen: usize,
        emitted: usize,
    },
}

/// Turns a raw pointer stream into cubic segments, one per three new samples.
///
/// Each segment starts exactly where the previous one ended: after fitting
/// `[p0, p1, p2, p3, p4]` the window keeps the synthesized endpoint and `p4`.
#[derive(Clone, Debug)]
pub struct CurveFitter {
    state: FitState,
    widths: WidthModel,
    dot_scale: f64,
}

impl CurveFitter {
    pub fn new(style: &StrokeStyle, config: &InkConfig) -> Self {
        Self {
            state: FitState::Idle,
            widths: WidthModel::new(style.base_width, config),
            dot_scale: config.dot_scale,
        }
    }

    pub fn widths(&self) -> &WidthModel {
        &self.widths
    }

    pub fn is_collecting(&self) -> bool {
        matches!(self.state, FitState::Collecting { .. })
    }

    /// Samples waiting in the window.
    pub fn pending(&self) -> &[Sample] {
        match &self.state {
            FitState::Idle => &[],
            FitState::Collecting { window, .. } => window,
        }
    }

    pub fn begin(&mut self, sample: Sample) {
        if self.is_collecting() {
            tracing::debug!("pointer-down while a stroke was active, restarting fit window");
        }
        self.widths.reset();
        let mut window = Vec::with_capacity(WINDOW_LEN);
        window.push(sample);
        self.state = FitState::Collecting {
            window,
            seen: 1,
            emitted: 0,
        };
    }

    /// Append a sample; returns a segment every time the window fills.
    pub fn push(
        &mut self,
        sample: Sample,
        style: &StrokeStyle,
        ids: &mut SegmentIds,
    ) -> ScrawlResult<Option<BezierStroke>> {
        let FitState::Collecting {
            window,
            seen,
            emitted,
        } = &mut self.state
        else {
            return Err(ScrawlError::validation(
                "pointer moved without a preceding pointer-down",
            ));
        };

        window.push(sample);
        *seen += 1;
        if window.len() < WINDOW_LEN {
            return Ok(None);
        }

        let [p0, p1, p2, _, p4] = [window[0], window[1], window[2], window[3], window[4]];
        let end = Sample {
            position: Point::new(
                (p2.position.x + p4.position.x) / 2.0,
                (p2.position.y + p4.position.y) / 2.0,
            ),
            timestamp: p4.timestamp,
        };

        let (start_width, end_width) = if style.constant_width {
            (style.base_width, style.base_width)
        } else {
            self.widths.advance(end.velocity_from(&p0))
        };

        let segment = BezierStroke {
            id: ids.next_id(),
            start: p0.position,
            ctrl1: p1.position,
            ctrl2: p2.position,
            end: end.position,
            start_width,
            end_width,
            color: style.color,
            constant_width: style.constant_width,
            timestamp: end.timestamp,
        };

        window.clear();
        window.push(end);
        window.push(p4);
        *emitted += 1;

        tracing::debug!(
            id = segment.id.0,
            start_width,
            end_width,
            "fitted bezier segment"
        );
        Ok(Some(segment))
    }

    /// Close the stroke. A stroke that only ever saw its pointer-down sample becomes a dot.
    pub fn end(&mut self, style: &StrokeStyle, ids: &mut SegmentIds) -> Option<Dot> {
        let state = std::mem::replace(&mut self.state, FitState::Idle);
        let dot = match state {
            FitState::Collecting {
                window,
                seen: 1,
                emitted: 0,
            } if window.len() == 1 => Some(Dot {
                id: ids.next_id(),
                position: window[0].position,
                width: self.dot_width(),
                color: style.color,
            }),
            _ => None,
        };
        self.widths.reset();
        dot
    }

    /// Diameter of a single-tap dot.
    pub fn dot_width(&self) -> f64 {
        let v0 = self.widths.initial_velocity();
        self.dot_scale * self.widths.width_for_velocity(v0)
    }

    /// Drop buffered samples that have not produced a segment yet and reseed the width filter.
    /// The stroke itself stays open. Returns `true` when samples were dropped.
    pub fn discard_pending(&mut self) -> bool {
        self.widths.reset();
        match &mut self.state {
            FitState::Idle => false,
            FitState::Collecting { window, .. } => {
                let dropped = !window.is_empty();
                window.clear();
                dropped
            }
        }
    }

    pub fn set_base_width(&mut self, base_width: f64) {
        self.widths.set_base_width(base_width);
    }
}
