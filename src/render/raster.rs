use crate::layout::LayoutRect;
use crate::render::colors::{self, AppColor};
use crate::render::text::TextRenderer;
use crate::render::{Surface, TextMeasure};

/// CPU raster target: an RGBA8 pixel buffer plus fontdue-backed text.
///
/// This is the crate's host surface. Fills are alpha-blended over existing
/// content; text draws as coverage-blended glyphs clipped to the label's
/// safety rectangle. The buffer stays fully opaque.
pub struct RasterSurface {
    width: u32,
    height: u32,
    buf: Vec<u8>,
    text: TextRenderer,
}

impl RasterSurface {
    pub fn new(width: u32, height: u32, text: TextRenderer) -> Self {
        let mut surface = Self {
            width,
            height,
            buf: vec![0u8; width as usize * height as usize * 4],
            text,
        };
        surface.clear(colors::CANVAS);
        surface
    }

    /// Convenience constructor using the first usable system font.
    pub fn from_system_fonts(width: u32, height: u32) -> anyhow::Result<Self> {
        Ok(Self::new(width, height, TextRenderer::from_system_fonts()?))
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw RGBA8 pixels, row-major.
    pub fn pixels(&self) -> &[u8] {
        &self.buf
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        [self.buf[idx], self.buf[idx + 1], self.buf[idx + 2], self.buf[idx + 3]]
    }

    /// Source-over blend of one pixel; `coverage` scales the source alpha.
    fn blend_pixel(&mut self, x: usize, y: usize, color: AppColor, coverage: f32) {
        let alpha = (color.a * coverage).clamp(0.0, 1.0);
        if alpha <= 0.0 {
            return;
        }
        let idx = (y * self.width as usize + x) * 4;
        for (channel, src) in [color.r, color.g, color.b].into_iter().enumerate() {
            let dst = self.buf[idx + channel] as f32 / 255.0;
            let out = src * alpha + dst * (1.0 - alpha);
            self.buf[idx + channel] = (out.clamp(0.0, 1.0) * 255.0) as u8;
        }
        self.buf[idx + 3] = 255;
    }

    /// Clamp a rect to pixel bounds, top-left inclusive, bottom-right exclusive.
    fn pixel_bounds(&self, rect: &LayoutRect) -> (usize, usize, usize, usize) {
        let x0 = (rect.x0.max(0.0) as usize).min(self.width as usize);
        let y0 = (rect.y0.max(0.0) as usize).min(self.height as usize);
        let x1 = (rect.x1.max(0.0).ceil() as usize).min(self.width as usize);
        let y1 = (rect.y1.max(0.0).ceil() as usize).min(self.height as usize);
        (x0, y0, x1, y1)
    }
}

impl TextMeasure for RasterSurface {
    fn measure(&self, text: &str, font_size: f32) -> (f32, f32) {
        self.text.measure_line(text, font_size)
    }
}

impl Surface for RasterSurface {
    fn clear(&mut self, color: AppColor) {
        let [r, g, b, _] = color.to_rgba8();
        for pixel in self.buf.chunks_exact_mut(4) {
            pixel[0] = r;
            pixel[1] = g;
            pixel[2] = b;
            pixel[3] = 255;
        }
    }

    fn fill_rect(&mut self, rect: &LayoutRect, color: AppColor) {
        if rect.is_empty() {
            return;
        }
        let (x0, y0, x1, y1) = self.pixel_bounds(rect);
        for y in y0..y1 {
            for x in x0..x1 {
                self.blend_pixel(x, y, color, 1.0);
            }
        }
    }

    fn draw_line(
        &mut self,
        x: f32,
        y: f32,
        text: &str,
        font_size: f32,
        color: AppColor,
        clip: &LayoutRect,
    ) {
        let glyphs = self.text.rasterize_line(text, font_size);
        let (cx0, cy0, cx1, cy1) = self.pixel_bounds(clip);

        for glyph in glyphs {
            let gx = x + glyph.x;
            let gy = y + glyph.y;
            for row in 0..glyph.height {
                let py = (gy + row as f32) as isize;
                if py < cy0 as isize || py >= cy1 as isize {
                    continue;
                }
                for col in 0..glyph.width {
                    let px = (gx + col as f32) as isize;
                    if px < cx0 as isize || px >= cx1 as isize {
                        continue;
                    }
                    let coverage = glyph.coverage[row * glyph.width + col] as f32 / 255.0;
                    self.blend_pixel(px as usize, py as usize, color, coverage);
                }
            }
        }
    }
}
