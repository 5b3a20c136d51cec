//! Velocity-sensitive freehand inking.
//!
//! Pointer samples go in, a list of cubic bezier segments (and single-tap dots) comes out.
//! Segment width follows a low-pass filtered drawing velocity: fast strokes thin out, slow
//! strokes swell. [`DrawingSession`] keeps the segment log, groups it into undoable strokes,
//! and maintains a composed bitmap so each new segment is rasterized on its own.
//!
//! Rendering is CPU-only (`vello_cpu`); exported bitmaps convert to [`image::RgbaImage`].
#![forbid(unsafe_code)]

mod config;
mod foundation;
mod render;
mod replay;
mod session;
mod stroke;

pub use config::{InkConfig, RIBBON_STEPS_ENV, StrokeStyle, WidthEasing};
pub use foundation::core::{CanvasSize, Point, Rect, Rgba8, Sample};
pub use foundation::error::{ScrawlError, ScrawlResult};
pub use render::composite::{Layer, PremulRgba8, over, over_in_place, over_layer};
pub use render::raster::{Rasterize, layer_bounds, rasterize_layer};
pub use render::surface::Surface;
pub use render::target::{Background, render_segments_onto};
pub use replay::{InputEvent, Trace, replay};
pub use session::canvas::{DrawingSession, Snapshot};
pub use session::damage::{Damage, DirtyRect};
pub use session::history::{StrokeHistory, StrokeSpan};
pub use stroke::fit::{CurveFitter, WINDOW_LEN};
pub use stroke::segment::{BezierStroke, Dot, PathSegment, SegmentId, SegmentIds};
pub use stroke::width::WidthModel;
