use std::path::PathBuf;

use fontdue::layout::{CoordinateSystem, Layout, LayoutSettings, TextStyle};
use fontdue::Font;

use crate::render::TextMeasure;

/// Wraps a display font: pure line measurement plus coverage rasterization.
pub struct TextRenderer {
    font: Font,
}

impl TextRenderer {
    pub fn new(font: Font) -> Self {
        Self { font }
    }

    /// Load the first usable font from known system locations. CJK-capable
    /// candidates come first since company names are mostly Chinese.
    pub fn from_system_fonts() -> anyhow::Result<Self> {
        let mut candidates: Vec<PathBuf> = Vec::new();

        if let Ok(windir) = std::env::var("WINDIR") {
            candidates.push(PathBuf::from(format!("{windir}\\Fonts\\msjh.ttc")));
            candidates.push(PathBuf::from(format!("{windir}\\Fonts\\segoeui.ttf")));
        }

        candidates.push(PathBuf::from("C:\\Windows\\Fonts\\msjh.ttc"));
        candidates.push(PathBuf::from("C:\\Windows\\Fonts\\segoeui.ttf"));

        // Linux/WSL fallbacks
        candidates.push(PathBuf::from(
            "/usr/share/fonts/opentype/noto/NotoSansCJK-Regular.ttc",
        ));
        candidates.push(PathBuf::from(
            "/usr/share/fonts/noto-cjk/NotoSansCJK-Regular.ttc",
        ));
        candidates.push(PathBuf::from(
            "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        ));
        candidates.push(PathBuf::from("/usr/share/fonts/TTF/DejaVuSans.ttf"));

        for path in candidates {
            let Ok(font_data) = std::fs::read(&path) else {
                continue;
            };
            if let Ok(font) = Font::from_bytes(font_data, fontdue::FontSettings::default()) {
                tracing::info!("Loaded display font from {}", path.display());
                return Ok(Self { font });
            }
        }

        anyhow::bail!("unable to load a display font from known locations")
    }

    /// Pure single-line measurement: the laid-out glyph-run extent.
    pub fn measure_line(&self, text: &str, px: f32) -> (f32, f32) {
        if text.is_empty() || px <= 0.0 {
            return (0.0, 0.0);
        }

        let mut layout = Layout::new(CoordinateSystem::PositiveYDown);
        layout.reset(&LayoutSettings::default());
        layout.append(&[&self.font], &TextStyle::new(text, px, 0));

        let mut width = 0.0f32;
        for glyph in layout.glyphs() {
            width = width.max(glyph.x + glyph.width as f32);
        }
        (width, layout.height())
    }

    /// Rasterize a line into coverage glyphs positioned relative to the
    /// line's top-left. The surface blends these with the label color.
    pub fn rasterize_line(&self, text: &str, px: f32) -> Vec<RasterGlyph> {
        if text.is_empty() || px <= 0.0 {
            return Vec::new();
        }

        let mut layout = Layout::new(CoordinateSystem::PositiveYDown);
        layout.reset(&LayoutSettings::default());
        layout.append(&[&self.font], &TextStyle::new(text, px, 0));

        let mut glyphs = Vec::new();
        for glyph in layout.glyphs() {
            let (metrics, coverage) = self.font.rasterize_config(glyph.key);
            if coverage.is_empty() {
                continue;
            }
            glyphs.push(RasterGlyph {
                x: glyph.x,
                y: glyph.y,
                width: metrics.width,
                height: metrics.height,
                coverage,
            });
        }
        glyphs
    }
}

impl TextMeasure for TextRenderer {
    fn measure(&self, text: &str, font_size: f32) -> (f32, f32) {
        self.measure_line(text, font_size)
    }
}

/// One rasterized glyph: 8-bit coverage, row-major.
pub struct RasterGlyph {
    pub x: f32,
    pub y: f32,
    pub width: usize,
    pub height: usize,
    pub coverage: Vec<u8>,
}
