use std::io::Read;

use crate::config::{InkConfig, StrokeStyle};
use crate::foundation::core::{CanvasSize, Point};
use crate::foundation::error::{ScrawlError, ScrawlResult};
use crate::session::canvas::DrawingSession;
use crate::session::damage::Damage;

/// One recorded call into a [`DrawingSession`].
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputEvent {
    Began { x: f64, y: f64, t: f64 },
    Moved { x: f64, y: f64, t: f64 },
    Ended,
    Undo,
    Clear,
    Style(StrokeStyle),
}

/// A canvas, a starting style and a sequence of input events.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Trace {
    pub canvas: CanvasSize,
    #[serde(default)]
    pub style: StrokeStyle,
    #[serde(default)]
    pub config: Option<InkConfig>,
    #[serde(default)]
    pub events: Vec<InputEvent>,
}

impl Trace {
    pub fn from_json_str(s: &str) -> ScrawlResult<Self> {
        serde_json::from_str(s).map_err(|e| ScrawlError::serde(e.to_string()))
    }

    pub fn from_reader(r: impl Read) -> ScrawlResult<Self> {
        serde_json::from_reader(r).map_err(|e| ScrawlError::serde(e.to_string()))
    }

    pub fn to_json_string(&self) -> ScrawlResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| ScrawlError::serde(e.to_string()))
    }

    /// Fresh session for this trace; without an explicit config the environment defaults apply.
    pub fn session(&self) -> ScrawlResult<DrawingSession> {
        let config = self.config.unwrap_or_else(InkConfig::from_env);
        DrawingSession::new(self.canvas, self.style, config)
    }

    /// Build a session and apply every event.
    pub fn play(&self) -> ScrawlResult<DrawingSession> {
        let mut session = self.session()?;
        replay(&mut session, &self.events)?;
        Ok(session)
    }
}

/// Apply `events` in order, stopping at the first failure. Returns the combined damage.
#[tracing::instrument(skip(session, events), fields(events = events.len()))]
pub fn replay(session: &mut DrawingSession, events: &[InputEvent]) -> ScrawlResult<Damage> {
    let mut damage = Damage::None;
    for (i, event) in events.iter().enumerate() {
        let d = apply(session, event).map_err(|e| match e {
            ScrawlError::Validation(msg) => ScrawlError::validation(format!("event {i}: {msg}")),
            other => other,
        })?;
        damage = damage.merge(d);
    }
    Ok(damage)
}

fn apply(session: &mut DrawingSession, event: &InputEvent) -> ScrawlResult<Damage> {
    match *event {
        InputEvent::Began { x, y, t } => {
            session.touch_began(Point::new(x, y), t)?;
            Ok(Damage::None)
        }
        InputEvent::Moved { x, y, t } => session.touch_moved(Point::new(x, y), t),
        InputEvent::Ended => session.touch_ended(),
        InputEvent::Undo => session.undo_last_stroke(),
        InputEvent::Clear => Ok(session.clear_all()),
        InputEvent::Style(style) => {
            session.set_style(style)?;
            Ok(Damage::None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRACE: &str = r#"{
        "canvas": {"width": 64, "height": 48},
        "events": [
            {"type": "began", "x": 0.0, "y": 0.0, "t": 0.0},
            {"type": "moved", "x": 10.0, "y": 0.0, "t": 0.1},
            {"type": "moved", "x": 20.0, "y": 0.0, "t": 0.2},
            {"type": "moved", "x": 30.0, "y": 0.0, "t": 0.3},
            {"type": "moved", "x": 40.0, "y": 0.0, "t": 0.4},
            {"type": "ended"},
            {"type": "style", "base_width": 4.0, "constant_width": true},
            {"type": "began", "x": 30.0, "y": 30.0, "t": 1.0},
            {"type": "ended"}
        ]
    }"#;

    #[test]
    fn parses_and_plays_trace() {
        let trace = Trace::from_json_str(TRACE).unwrap();
        assert_eq!(trace.events.len(), 9);
        assert_eq!(trace.style, StrokeStyle::default());

        let session = trace.play().unwrap();
        assert_eq!(session.stroke_count(), 2);
        assert_eq!(session.segments().len(), 2);
        assert!(session.style().constant_width);
        assert_eq!(session.style().base_width, 4.0);
    }

    #[test]
    fn malformed_json_is_a_serde_error() {
        let err = Trace::from_json_str("{\"canvas\": 3}").unwrap_err();
        assert!(matches!(err, ScrawlError::Serde(_)));
    }

    #[test]
    fn failing_event_reports_its_index() {
        let trace = Trace {
            canvas: CanvasSize::new(10, 10).unwrap(),
            style: StrokeStyle::default(),
            config: None,
            events: vec![
                InputEvent::Began {
                    x: 0.0,
                    y: 0.0,
                    t: 0.0,
                },
                InputEvent::Moved {
                    x: f64::NAN,
                    y: 0.0,
                    t: 0.1,
                },
            ],
        };
        let err = trace.play().unwrap_err();
        assert!(err.to_string().contains("event 1"), "{err}");
    }

    #[test]
    fn trace_serializes_back_to_json() {
        let trace = Trace::from_json_str(TRACE).unwrap();
        let json = trace.to_json_string().unwrap();
        assert!(json.contains("\"type\": \"began\""));
    }
}
