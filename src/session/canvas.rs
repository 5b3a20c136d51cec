use std::sync::Arc;

use crate::config::{InkConfig, StrokeStyle};
use crate::foundation::core::{CanvasSize, Point, Rect, Rgba8, Sample};
use crate::foundation::error::ScrawlResult;
use crate::render::composite::{Layer, over_layer};
use crate::render::raster::rasterize_layer;
use crate::render::surface::Surface;
use crate::render::target::{Background, render_segments_onto};
use crate::session::damage::{Damage, DirtyRect};
use crate::session::history::{StrokeHistory, StrokeSpan};
use crate::stroke::fit::CurveFitter;
use crate::stroke::segment::{PathSegment, SegmentIds};

/// One drawing: the append-only segment log, stroke grouping for undo, and the composed
/// bitmap cache that lets each new segment be drawn without replaying the history.
///
/// All calls are synchronous; a call that rasterizes has finished updating the cache when it
/// returns.
#[derive(Debug)]
pub struct DrawingSession {
    size: CanvasSize,
    config: InkConfig,
    style: StrokeStyle,
    fitter: CurveFitter,
    ids: SegmentIds,
    segments: Vec<PathSegment>,
    history: StrokeHistory,
    /// Segments emitted since the current pointer-down.
    active: Option<StrokeSpan>,
    cache: Option<Surface>,
    /// `cache` holds exactly `segments[..cached_len]`.
    cached_len: usize,
}

impl DrawingSession {
    pub fn new(size: CanvasSize, style: StrokeStyle, config: InkConfig) -> ScrawlResult<Self> {
        size.validate()?;
        style.validate()?;
        config.validate()?;
        Ok(Self {
            size,
            fitter: CurveFitter::new(&style, &config),
            config,
            style,
            ids: SegmentIds::default(),
            segments: Vec::new(),
            history: StrokeHistory::default(),
            active: None,
            cache: None,
            cached_len: 0,
        })
    }

    pub fn with_defaults(size: CanvasSize) -> ScrawlResult<Self> {
        Self::new(size, StrokeStyle::default(), InkConfig::default())
    }

    pub fn size(&self) -> CanvasSize {
        self.size
    }

    pub fn style(&self) -> &StrokeStyle {
        &self.style
    }

    pub fn config(&self) -> &InkConfig {
        &self.config
    }

    /// Every live segment in draw order.
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn stroke_count(&self) -> usize {
        self.history.len()
    }

    /// Completed strokes, oldest first. A cycle that emitted no segment yields an empty slice.
    pub fn strokes(&self) -> impl Iterator<Item = &[PathSegment]> + '_ {
        self.history
            .spans()
            .iter()
            .map(|span| span.map_or(&[][..], |span| span.slice(&self.segments)))
    }

    pub fn is_stroke_active(&self) -> bool {
        self.fitter.is_collecting()
    }

    /// Raw samples buffered toward the next segment.
    pub fn pending_samples(&self) -> &[Sample] {
        self.fitter.pending()
    }

    /// The composed drawing, `None` when nothing has been drawn since the last invalidation.
    pub fn cached_bitmap(&self) -> Option<&Surface> {
        self.cache.as_ref()
    }

    /// Width the current style gives a segment drawn at `velocity`.
    pub fn width_for_velocity(&self, velocity: f64) -> f64 {
        self.fitter.widths().width_for_velocity(velocity)
    }

    pub fn touch_began(&mut self, point: Point, timestamp: f64) -> ScrawlResult<()> {
        let sample = Sample::new(point, timestamp)?;
        if self.fitter.is_collecting() {
            tracing::debug!("pointer-down without pointer-up, sealing the open stroke");
            self.seal_active();
        }
        self.fitter.begin(sample);
        Ok(())
    }

    pub fn touch_moved(&mut self, point: Point, timestamp: f64) -> ScrawlResult<Damage> {
        let sample = Sample::new(point, timestamp)?;
        let Some(segment) = self.fitter.push(sample, &self.style, &mut self.ids)? else {
            return Ok(Damage::None);
        };
        self.record(PathSegment::Bezier(segment));
        self.draw_latest_only()
    }

    /// Close the stroke: a lone pointer-down becomes a dot, and the stroke's segments become
    /// one undo step.
    pub fn touch_ended(&mut self) -> ScrawlResult<Damage> {
        if !self.fitter.is_collecting() {
            tracing::debug!("pointer-up without an active stroke ignored");
            return Ok(Damage::None);
        }
        if let Some(dot) = self.fitter.end(&self.style, &mut self.ids) {
            self.record(PathSegment::Dot(dot));
        }
        self.seal_active();
        self.draw_latest_only()
    }

    /// Replace the pen style. Buffered samples that have not formed a segment are dropped so
    /// no half-built curve picks up the new look. Returns whether samples were dropped.
    pub fn set_style(&mut self, style: StrokeStyle) -> ScrawlResult<bool> {
        style.validate()?;
        if style.base_width != self.style.base_width {
            self.fitter.set_base_width(style.base_width);
        }
        self.style = style;
        let dropped = self.fitter.discard_pending();
        if dropped {
            tracing::debug!("style change discarded pending samples");
        }
        Ok(dropped)
    }

    pub fn set_color(&mut self, color: Rgba8) -> ScrawlResult<bool> {
        self.set_style(StrokeStyle {
            color,
            ..self.style
        })
    }

    pub fn set_base_width(&mut self, base_width: f64) -> ScrawlResult<bool> {
        self.set_style(StrokeStyle {
            base_width,
            ..self.style
        })
    }

    pub fn set_constant_width(&mut self, constant_width: bool) -> ScrawlResult<bool> {
        self.set_style(StrokeStyle {
            constant_width,
            ..self.style
        })
    }

    /// Remove the newest completed stroke and rebuild the cache. No-op without history.
    #[tracing::instrument(skip(self), fields(strokes = self.history.len()))]
    pub fn undo_last_stroke(&mut self) -> ScrawlResult<Damage> {
        self.fitter.discard_pending();
        let Some(entry) = self.history.pop() else {
            return Ok(Damage::None);
        };
        let Some(span) = entry else {
            tracing::debug!("undid a stroke that drew nothing");
            return Ok(Damage::None);
        };

        let before = self.segments.len();
        self.segments.retain(|s| !span.contains(s.id()));
        tracing::debug!(
            removed = before - self.segments.len(),
            "undid stroke {}..={}",
            span.first.0,
            span.last.0
        );

        self.invalidate_cache();
        self.redraw_all()
    }

    /// Forget everything drawn, including segments of a stroke still in progress.
    pub fn clear_all(&mut self) -> Damage {
        self.segments.clear();
        self.history.clear();
        self.active = None;
        self.fitter.discard_pending();
        self.invalidate_cache();
        tracing::debug!("cleared drawing");
        Damage::Full
    }

    /// Composite segments the cache has not seen yet (normally just the newest) onto it.
    pub fn draw_latest_only(&mut self) -> ScrawlResult<Damage> {
        let start = if self.cache.is_some() {
            self.cached_len.min(self.segments.len())
        } else {
            0
        };
        if start == self.segments.len() {
            return Ok(Damage::None);
        }

        let mut layers = Vec::with_capacity(self.segments.len() - start);
        for segment in &self.segments[start..] {
            if let Some(layer) = rasterize_layer(segment, self.size, &self.config)? {
                layers.push(layer);
            }
        }

        // Layers are complete before an existing cache is written, and compositing cannot fail.
        let rebuilt = match self.cache.as_mut() {
            Some(cache) => {
                composite_layers(cache, &layers);
                false
            }
            None => {
                let mut cache = Surface::new(self.size)?;
                composite_layers(&mut cache, &layers);
                self.cache = Some(cache);
                true
            }
        };
        self.cached_len = self.segments.len();

        if rebuilt {
            return Ok(Damage::Full);
        }
        Ok(layers
            .iter()
            .filter_map(|l| layer_damage(l, self.size))
            .fold(Damage::None, |acc, d| acc.merge(Damage::Rect(d))))
    }

    /// Rebuild the cache from a blank surface. On failure the previous cache is kept.
    #[tracing::instrument(skip(self), fields(segments = self.segments.len()))]
    pub fn redraw_all(&mut self) -> ScrawlResult<Damage> {
        let mut surface = Surface::new(self.size)?;
        for segment in &self.segments {
            if let Some(layer) = rasterize_layer(segment, self.size, &self.config)? {
                over_layer(&mut surface, &layer);
            }
        }
        self.cache = Some(surface);
        self.cached_len = self.segments.len();
        Ok(Damage::Full)
    }

    /// Compose the drawing onto `background` (stretched to the canvas size) on a new surface of
    /// `output` size. Live state, including the cache, is untouched.
    pub fn render_onto(
        &self,
        background: Option<&image::RgbaImage>,
        output: CanvasSize,
    ) -> ScrawlResult<Surface> {
        let background = background.map_or(Background::Transparent, Background::Image);
        render_segments_onto(&self.segments, self.size, background, output, &self.config)
    }

    /// Like [`Self::render_onto`] with a solid color filling the canvas bounds.
    pub fn render_onto_color(&self, color: Rgba8, output: CanvasSize) -> ScrawlResult<Surface> {
        render_segments_onto(
            &self.segments,
            self.size,
            Background::Color(color),
            output,
            &self.config,
        )
    }

    /// Immutable copy of the segment log for rendering elsewhere while the session moves on.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            view: self.size,
            config: self.config,
            segments: self.segments.as_slice().into(),
        }
    }

    fn record(&mut self, segment: PathSegment) {
        let id = segment.id();
        match &mut self.active {
            Some(span) => span.extend_to(id),
            None => self.active = Some(StrokeSpan::single(id)),
        }
        self.segments.push(segment);
    }

    fn seal_active(&mut self) {
        let span = self.active.take();
        match span {
            Some(span) => {
                tracing::debug!(first = span.first.0, last = span.last.0, "sealed stroke")
            }
            None => tracing::debug!("sealed stroke without segments"),
        }
        self.history.commit(span);
    }

    fn invalidate_cache(&mut self) {
        self.cache = None;
        self.cached_len = 0;
    }
}

fn composite_layers(cache: &mut Surface, layers: &[Layer]) {
    for layer in layers {
        over_layer(cache, layer);
    }
}

fn layer_damage(layer: &Layer, canvas: CanvasSize) -> Option<DirtyRect> {
    let rect = Rect::new(
        f64::from(layer.x),
        f64::from(layer.y),
        f64::from(layer.x + layer.surface.width()),
        f64::from(layer.y + layer.surface.height()),
    );
    DirtyRect::covering(rect, canvas)
}

/// Segment log frozen at one point in time; cheap to clone and safe to send to another thread.
#[derive(Clone, Debug)]
pub struct Snapshot {
    view: CanvasSize,
    config: InkConfig,
    segments: Arc<[PathSegment]>,
}

impl Snapshot {
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn render_onto(
        &self,
        background: Background<'_>,
        output: CanvasSize,
    ) -> ScrawlResult<Surface> {
        render_segments_onto(&self.segments, self.view, background, output, &self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> DrawingSession {
        DrawingSession::with_defaults(CanvasSize::new(120, 80).unwrap()).unwrap()
    }

    fn line(s: &mut DrawingSession, y: f64, moves: usize, t0: f64) {
        s.touch_began(Point::new(5.0, y), t0).unwrap();
        for i in 1..=moves {
            s.touch_moved(Point::new(5.0 + 8.0 * i as f64, y), t0 + 0.02 * i as f64)
                .unwrap();
        }
        s.touch_ended().unwrap();
    }

    #[test]
    fn fast_path_only_draws_new_segments() {
        let mut s = session();
        s.touch_began(Point::new(5.0, 40.0), 0.0).unwrap();
        let mut damages = Vec::new();
        for i in 1..=7 {
            damages.push(
                s.touch_moved(Point::new(5.0 + 10.0 * i as f64, 40.0), 0.02 * i as f64)
                    .unwrap(),
            );
        }
        assert!(damages[..3].iter().all(Damage::is_none));
        assert_eq!(damages[3], Damage::Full);
        assert!(matches!(damages[6], Damage::Rect(_)));
        assert_eq!(s.cached_len, 2);
        assert!(s.cached_bitmap().is_some());
    }

    #[test]
    fn empty_stroke_still_takes_a_history_entry() {
        let mut s = session();
        s.touch_began(Point::new(5.0, 5.0), 0.0).unwrap();
        s.touch_moved(Point::new(6.0, 5.0), 0.1).unwrap();
        assert_eq!(s.touch_ended().unwrap(), Damage::None);
        assert_eq!(s.stroke_count(), 1);
        assert!(s.strokes().next().unwrap().is_empty());
        assert!(s.segments().is_empty());
        assert!(s.cached_bitmap().is_none());

        assert_eq!(s.undo_last_stroke().unwrap(), Damage::None);
        assert_eq!(s.stroke_count(), 0);
    }

    #[test]
    fn failed_draw_call_leaves_cache_untouched() {
        let mut s = session();
        line(&mut s, 20.0, 4, 0.0);
        let before = s.cached_bitmap().cloned().unwrap();

        s.touch_began(Point::new(5.0, 60.0), 1.0).unwrap();
        assert!(s.touch_moved(Point::new(f64::NAN, 60.0), 1.1).is_err());
        assert_eq!(s.cached_bitmap(), Some(&before));
        assert_eq!(s.cached_len, 1);

        // Nothing new to draw leaves the cache as it was.
        assert_eq!(s.draw_latest_only().unwrap(), Damage::None);
        assert_eq!(s.cached_bitmap(), Some(&before));
    }

    #[test]
    fn undo_mid_stroke_keeps_active_segments() {
        let mut s = session();
        line(&mut s, 20.0, 4, 0.0);
        assert_eq!(s.stroke_count(), 1);

        s.touch_began(Point::new(5.0, 60.0), 1.0).unwrap();
        for i in 1..=6 {
            s.touch_moved(Point::new(5.0 + 8.0 * i as f64, 60.0), 1.0 + 0.02 * i as f64)
                .unwrap();
        }
        assert_eq!(s.segments().len(), 2);
        s.undo_last_stroke().unwrap();
        assert_eq!(s.segments().len(), 1);
        assert!(s.pending_samples().is_empty());

        s.touch_ended().unwrap();
        assert_eq!(s.stroke_count(), 1);
        assert_eq!(s.strokes().next().unwrap().len(), 1);
    }

    #[test]
    fn clear_mid_stroke_drops_active_segments() {
        let mut s = session();
        s.touch_began(Point::new(5.0, 40.0), 0.0).unwrap();
        for i in 1..=4 {
            s.touch_moved(Point::new(5.0 + 8.0 * i as f64, 40.0), 0.02 * i as f64)
                .unwrap();
        }
        assert_eq!(s.clear_all(), Damage::Full);
        s.touch_ended().unwrap();
        assert_eq!(s.stroke_count(), 1);
        assert!(s.segments().is_empty());
        assert!(s.strokes().all(<[PathSegment]>::is_empty));
    }

    #[test]
    fn setters_discard_pending_window() {
        let mut s = session();
        s.touch_began(Point::new(5.0, 40.0), 0.0).unwrap();
        s.touch_moved(Point::new(9.0, 40.0), 0.02).unwrap();
        assert!(s.set_color(Rgba8::rgb(200, 0, 0)).unwrap());
        assert!(s.pending_samples().is_empty());
        assert!(!s.set_constant_width(true).unwrap());
        assert!(s.set_base_width(0.0).is_err());
        assert_eq!(s.style().color, Rgba8::rgb(200, 0, 0));
        assert!(s.style().constant_width);
    }

    #[test]
    fn redraw_keeps_cache_consistent_with_segments() {
        let mut s = session();
        line(&mut s, 20.0, 7, 0.0);
        line(&mut s, 50.0, 4, 1.0);
        let fast = s.cached_bitmap().cloned().unwrap();
        assert_eq!(s.redraw_all().unwrap(), Damage::Full);
        assert_eq!(s.cached_bitmap(), Some(&fast));
        assert_eq!(s.cached_len, s.segments().len());
    }

    #[test]
    fn snapshot_is_detached_from_later_edits() {
        let mut s = session();
        line(&mut s, 20.0, 4, 0.0);
        let snap = s.snapshot();
        s.clear_all();
        assert_eq!(snap.segments().len(), 1);
        let out = snap
            .render_onto(Background::Transparent, s.size())
            .unwrap();
        assert!(!out.is_blank());
    }
}
