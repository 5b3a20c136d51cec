use crate::foundation::error::{ScrawlError, ScrawlResult};
use crate::foundation::math::mul_div255_u8;
use crate::render::surface::Surface;

pub type PremulRgba8 = [u8; 4];

/// A rasterized segment: a small surface placed at `(x, y)` in target pixels.
#[derive(Clone, Debug)]
pub struct Layer {
    pub x: u32,
    pub y: u32,
    pub surface: Surface,
}

pub fn over(dst: PremulRgba8, src: PremulRgba8) -> PremulRgba8 {
    let sa = src[3];
    if sa == 0 {
        return dst;
    }
    if sa == 255 {
        return src;
    }

    let inv = 255u16 - u16::from(sa);
    let mut out = [0u8; 4];
    for i in 0..4 {
        out[i] = src[i].saturating_add(mul_div255_u8(u16::from(dst[i]), inv));
    }
    out
}

pub fn over_in_place(dst: &mut [u8], src: &[u8]) -> ScrawlResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(ScrawlError::render(
            "over_in_place expects equal-length rgba8 buffers",
        ));
    }
    blend_row(dst, src);
    Ok(())
}

fn blend_row(dst: &mut [u8], src: &[u8]) {
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let out = over([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]]);
        d.copy_from_slice(&out);
    }
}

/// Source-over `layer` onto `dst`; parts of the layer outside `dst` are ignored.
///
/// Infallible: a surface's buffer always matches its size, so callers can finish every fallible
/// step before touching `dst`.
pub fn over_layer(dst: &mut Surface, layer: &Layer) {
    let (dw, dh) = (dst.width(), dst.height());
    if layer.x >= dw || layer.y >= dh {
        return;
    }
    let lw = layer.surface.width();
    let w = lw.min(dw - layer.x) as usize;
    let h = layer.surface.height().min(dh - layer.y) as usize;

    let src = layer.surface.data();
    let dst_stride = dw as usize * 4;
    let src_stride = lw as usize * 4;
    let dst_data = dst.data_mut();
    for row in 0..h {
        let d0 = (layer.y as usize + row) * dst_stride + layer.x as usize * 4;
        let s0 = row * src_stride;
        blend_row(&mut dst_data[d0..d0 + w * 4], &src[s0..s0 + w * 4]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::core::{CanvasSize, Rgba8};

    #[test]
    fn over_src_alpha_0_is_noop() {
        let dst = [10, 20, 30, 40];
        let src = [0, 0, 0, 0];
        assert_eq!(over(dst, src), dst);
    }

    #[test]
    fn over_src_opaque_replaces_dst() {
        let dst = [0, 0, 0, 255];
        let src = [255, 0, 0, 255];
        assert_eq!(over(dst, src), src);
    }

    #[test]
    fn over_dst_transparent_returns_src() {
        let dst = [0, 0, 0, 0];
        let src = [100, 110, 120, 200];
        assert_eq!(over(dst, src), src);
    }

    #[test]
    fn over_half_alpha_blends() {
        let dst = [0, 0, 255, 255];
        let src = [128, 0, 0, 128];
        assert_eq!(over(dst, src), [128, 0, 127, 255]);
    }

    #[test]
    fn over_in_place_rejects_mismatched_buffers() {
        let mut dst = vec![0u8; 8];
        assert!(over_in_place(&mut dst, &[0u8; 4]).is_err());
    }

    #[test]
    fn layer_is_placed_and_clipped() {
        let mut dst = Surface::new(CanvasSize::new(4, 4).unwrap()).unwrap();
        let layer = Layer {
            x: 3,
            y: 2,
            surface: Surface::filled(CanvasSize::new(2, 3).unwrap(), Rgba8::WHITE).unwrap(),
        };
        over_layer(&mut dst, &layer);

        assert_eq!(dst.pixel(3, 2), Some([255, 255, 255, 255]));
        assert_eq!(dst.pixel(3, 3), Some([255, 255, 255, 255]));
        assert_eq!(dst.pixel(2, 2), Some([0, 0, 0, 0]));
        assert_eq!(dst.pixel(3, 1), Some([0, 0, 0, 0]));

        let outside = Layer {
            x: 9,
            y: 0,
            surface: Surface::filled(CanvasSize::new(1, 1).unwrap(), Rgba8::WHITE).unwrap(),
        };
        let before = dst.clone();
        over_layer(&mut dst, &outside);
        assert_eq!(dst, before);
    }
}
