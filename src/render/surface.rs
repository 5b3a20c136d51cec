use vello_cpu::peniko::color::PremulRgba8;

use crate::foundation::core::{CanvasSize, Rgba8};
use crate::foundation::error::{ScrawlError, ScrawlResult};
use crate::foundation::math::unpremul_u8;

/// Premultiplied RGBA8 raster backed by a `vello_cpu` pixmap.
#[derive(Clone, Debug)]
pub struct Surface {
    size: CanvasSize,
    pixmap: vello_cpu::Pixmap,
}

impl Surface {
    /// Transparent surface. Allocation failure is reported, not aborted on.
    pub fn new(size: CanvasSize) -> ScrawlResult<Self> {
        Self::filled(size, Rgba8::TRANSPARENT)
    }

    pub fn filled(size: CanvasSize, color: Rgba8) -> ScrawlResult<Self> {
        size.validate()?;
        let [r, g, b, a] = color.premultiplied();
        let px = PremulRgba8 { r, g, b, a };

        let n = size.pixel_count();
        let mut pixels = Vec::new();
        pixels.try_reserve_exact(n).map_err(|_| {
            ScrawlError::render(format!(
                "failed to allocate {}x{} surface",
                size.width, size.height
            ))
        })?;
        pixels.resize(n, px);

        Ok(Self {
            size,
            pixmap: vello_cpu::Pixmap::from_parts_with_opacity(
                pixels,
                size.width as u16,
                size.height as u16,
                a != 255,
            ),
        })
    }

    /// Premultiplies a straight-alpha image.
    pub fn from_rgba_image(image: &image::RgbaImage) -> ScrawlResult<Self> {
        let (width, height) = image.dimensions();
        let size = CanvasSize::new(width, height)?;
        let mut surface = Self::new(size)?;
        for (dst, src) in surface
            .data_mut()
            .chunks_exact_mut(4)
            .zip(image.as_raw().chunks_exact(4))
        {
            dst.copy_from_slice(&Rgba8::rgba(src[0], src[1], src[2], src[3]).premultiplied());
        }
        Ok(surface)
    }

    /// Straight-alpha copy, suitable for encoding.
    pub fn to_rgba_image(&self) -> ScrawlResult<image::RgbaImage> {
        let mut out = self.data().to_vec();
        for px in out.chunks_exact_mut(4) {
            let a = px[3];
            px[0] = unpremul_u8(px[0], a);
            px[1] = unpremul_u8(px[1], a);
            px[2] = unpremul_u8(px[2], a);
        }
        image::RgbaImage::from_raw(self.size.width, self.size.height, out)
            .ok_or_else(|| ScrawlError::render("surface byte length mismatch"))
    }

    pub fn size(&self) -> CanvasSize {
        self.size
    }

    pub fn width(&self) -> u32 {
        self.size.width
    }

    pub fn height(&self) -> u32 {
        self.size.height
    }

    /// Premultiplied RGBA8 bytes, row-major.
    pub fn data(&self) -> &[u8] {
        self.pixmap.data_as_u8_slice()
    }

    pub(crate) fn data_mut(&mut self) -> &mut [u8] {
        self.pixmap.data_as_u8_slice_mut()
    }

    pub(crate) fn pixmap_mut(&mut self) -> &mut vello_cpu::Pixmap {
        &mut self.pixmap
    }

    pub(crate) fn into_pixmap(self) -> vello_cpu::Pixmap {
        self.pixmap
    }

    /// Premultiplied pixel, `None` outside the surface.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.size.width || y >= self.size.height {
            return None;
        }
        let i = (y as usize * self.size.width as usize + x as usize) * 4;
        let d = self.data();
        Some([d[i], d[i + 1], d[i + 2], d[i + 3]])
    }

    pub fn is_blank(&self) -> bool {
        self.data().chunks_exact(4).all(|px| px[3] == 0)
    }
}

impl PartialEq for Surface {
    fn eq(&self, other: &Self) -> bool {
        self.size == other.size && self.data() == other.data()
    }
}

impl Eq for Surface {}
