use vello_cpu::RenderContext;
use vello_cpu::kurbo::{self as cpu_kurbo, Shape as _};

use crate::config::InkConfig;
use crate::foundation::core::{CanvasSize, Point, Rect};
use crate::foundation::error::ScrawlResult;
use crate::render::composite::Layer;
use crate::render::surface::Surface;
use crate::stroke::segment::{BezierStroke, Dot, PathSegment};

/// Extra pixels around a segment's geometric bounds reserved for anti-aliasing.
const AA_PAD: f64 = 1.0;

/// Something that paints itself into a render context in view coordinates.
pub trait Rasterize {
    fn rasterize(&self, ctx: &mut RenderContext, config: &InkConfig);
}

impl Rasterize for Dot {
    fn rasterize(&self, ctx: &mut RenderContext, config: &InkConfig) {
        ctx.set_paint(self.color.to_cpu());
        stamp(ctx, self.position, self.width, config.curve_tolerance);
    }
}

impl Rasterize for BezierStroke {
    fn rasterize(&self, ctx: &mut RenderContext, config: &InkConfig) {
        ctx.set_paint(self.color.to_cpu());

        if self.constant_width {
            let mut path = cpu_kurbo::BezPath::new();
            path.move_to(point_to_cpu(self.start));
            path.curve_to(
                point_to_cpu(self.ctrl1),
                point_to_cpu(self.ctrl2),
                point_to_cpu(self.end),
            );
            ctx.set_stroke(
                cpu_kurbo::Stroke::new(self.start_width)
                    .with_caps(cpu_kurbo::Cap::Round)
                    .with_join(cpu_kurbo::Join::Round),
            );
            ctx.stroke_path(&path);
            return;
        }

        let steps = config.ribbon_steps;
        for i in 0..steps {
            let t = f64::from(i) / f64::from(steps);
            stamp(
                ctx,
                self.position_at(t),
                self.width_at(t, config.width_easing),
                config.curve_tolerance,
            );
        }
    }
}

impl Rasterize for PathSegment {
    fn rasterize(&self, ctx: &mut RenderContext, config: &InkConfig) {
        match self {
            Self::Dot(d) => d.rasterize(ctx, config),
            Self::Bezier(b) => b.rasterize(ctx, config),
        }
    }
}

/// Filled circle of the given diameter.
fn stamp(ctx: &mut RenderContext, center: Point, diameter: f64, tolerance: f64) {
    if diameter.is_nan() || diameter <= 0.0 {
        return;
    }
    let circle = cpu_kurbo::Circle::new(point_to_cpu(center), diameter / 2.0);
    ctx.fill_path(&circle.to_path(tolerance));
}

fn point_to_cpu(p: Point) -> cpu_kurbo::Point {
    cpu_kurbo::Point::new(p.x, p.y)
}

/// Integer pixel rectangle a segment can touch inside `clip`, or `None` if it misses.
pub fn layer_bounds(segment: &PathSegment, clip: CanvasSize) -> Option<Rect> {
    let r = segment.bounds().inflate(AA_PAD, AA_PAD).expand();
    if !r.is_finite() {
        return None;
    }
    let r = r.intersect(clip.bounds());
    (r.width() >= 1.0 && r.height() >= 1.0).then_some(r)
}

/// Rasterize one segment into its own transparent layer, positioned in a target of size `clip`.
pub fn rasterize_layer(
    segment: &PathSegment,
    clip: CanvasSize,
    config: &InkConfig,
) -> ScrawlResult<Option<Layer>> {
    let Some(r) = layer_bounds(segment, clip) else {
        return Ok(None);
    };

    let size = CanvasSize::new(r.width() as u32, r.height() as u32)?;
    let mut surface = Surface::new(size)?;

    let mut ctx = RenderContext::new(size.width as u16, size.height as u16);
    ctx.set_transform(cpu_kurbo::Affine::translate((-r.x0, -r.y0)));
    segment.rasterize(&mut ctx, config);
    ctx.flush();
    ctx.render_to_pixmap(surface.pixmap_mut());

    Ok(Some(Layer {
        x: r.x0 as u32,
        y: r.y0 as u32,
        surface,
    }))
}
