use std::sync::Arc;

use vello_cpu::RenderContext;
use vello_cpu::kurbo as cpu_kurbo;

use crate::config::InkConfig;
use crate::foundation::core::{CanvasSize, Rgba8};
use crate::foundation::error::ScrawlResult;
use crate::render::composite::over_layer;
use crate::render::raster::rasterize_layer;
use crate::render::surface::Surface;
use crate::stroke::segment::PathSegment;

/// What sits underneath the drawing when it is exported.
#[derive(Clone, Copy, Debug, Default)]
pub enum Background<'a> {
    #[default]
    Transparent,
    /// Straight-alpha image, stretched to the view bounds.
    Image(&'a image::RgbaImage),
    /// Solid fill of the view bounds.
    Color(Rgba8),
}

/// Composite `segments` over `background` on a fresh surface of `output` size.
///
/// The background is fitted to `view` (the live canvas size), not to `output`; segments are
/// drawn in view coordinates without scaling.
#[tracing::instrument(skip(segments, background, config), fields(segments = segments.len()))]
pub fn render_segments_onto(
    segments: &[PathSegment],
    view: CanvasSize,
    background: Background<'_>,
    output: CanvasSize,
    config: &InkConfig,
) -> ScrawlResult<Surface> {
    view.validate()?;
    let mut surface = Surface::new(output)?;
    paint_background(&mut surface, view, background)?;

    for segment in segments {
        if let Some(layer) = rasterize_layer(segment, output, config)? {
            over_layer(&mut surface, &layer);
        }
    }
    Ok(surface)
}

fn paint_background(
    surface: &mut Surface,
    view: CanvasSize,
    background: Background<'_>,
) -> ScrawlResult<()> {
    let (vw, vh) = (f64::from(view.width), f64::from(view.height));
    let mut ctx = RenderContext::new(surface.width() as u16, surface.height() as u16);

    match background {
        Background::Transparent => return Ok(()),
        Background::Color(color) => {
            ctx.set_paint(color.to_cpu());
            ctx.fill_rect(&cpu_kurbo::Rect::new(0.0, 0.0, vw, vh));
        }
        Background::Image(img) => {
            let pixmap = Surface::from_rgba_image(img)?.into_pixmap();
            let (iw, ih) = (f64::from(pixmap.width()), f64::from(pixmap.height()));
            ctx.set_transform(cpu_kurbo::Affine::scale_non_uniform(vw / iw, vh / ih));
            ctx.set_paint(vello_cpu::Image {
                image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
                sampler: vello_cpu::peniko::ImageSampler::default(),
            });
            ctx.fill_rect(&cpu_kurbo::Rect::new(0.0, 0.0, iw, ih));
        }
    }

    ctx.flush();
    ctx.render_to_pixmap(surface.pixmap_mut());
    Ok(())
}
