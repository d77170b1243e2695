pub mod colors;
pub mod labels;
pub mod raster;
pub mod text;

use crate::layout::LayoutRect;
use colors::AppColor;

/// Pure text measurement supplied by the host surface. The fit search calls
/// this freely and commits a font size exactly once; implementations must be
/// side-effect-free and deterministic for identical inputs.
pub trait TextMeasure {
    /// Extent of a single line at the given font size.
    fn measure(&self, text: &str, font_size: f32) -> (f32, f32);
}

/// The drawing surface the render coordinator paints through.
///
/// Pass 1 commits geometry (fills), `flush` marks the boundary where that
/// geometry becomes visible and measurable, and pass 2 draws the fitted
/// labels. Everything is called from one thread.
pub trait Surface: TextMeasure {
    /// Clear the whole surface to a background color.
    fn clear(&mut self, color: AppColor);

    /// Fill an axis-aligned rectangle, alpha-blended over existing content.
    fn fill_rect(&mut self, rect: &LayoutRect, color: AppColor);

    /// Draw one line of text with its top-left at (x, y), clipped.
    fn draw_line(
        &mut self,
        x: f32,
        y: f32,
        text: &str,
        font_size: f32,
        color: AppColor,
        clip: &LayoutRect,
    );

    /// Geometry barrier between the paint pass and the label-fit pass.
    /// Immediate-mode surfaces need no work here.
    fn flush(&mut self) {}
}
