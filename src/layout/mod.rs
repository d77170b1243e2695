pub mod squarify;
pub mod weights;

use crate::hierarchy::Hierarchy;

/// An axis-aligned rectangle in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutRect {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl LayoutRect {
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Zero-area rect anchored at a point; placeholder for degenerate layouts.
    pub fn empty_at(x: f32, y: f32) -> Self {
        Self::new(x, y, x, y)
    }

    pub fn width(&self) -> f32 {
        (self.x1 - self.x0).max(0.0)
    }

    pub fn height(&self) -> f32 {
        (self.y1 - self.y0).max(0.0)
    }

    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    pub fn is_empty(&self) -> bool {
        self.x1 <= self.x0 || self.y1 <= self.y0
    }

    /// Shrink on all sides, collapsing to the center instead of inverting.
    pub fn inset(&self, d: f32) -> Self {
        let d = d.min(self.width() / 2.0).min(self.height() / 2.0);
        Self::new(self.x0 + d, self.y0 + d, self.x1 - d, self.y1 - d)
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x0 && x < self.x1 && y >= self.y0 && y < self.y1
    }
}

/// Configuration for the two-level treemap geometry.
#[derive(Debug, Clone, Copy)]
pub struct LayoutConfig {
    /// Padding between the canvas edge and the group rectangles (px)
    pub outer_padding: f32,
    /// Padding between a group's frame and its leaf area (px)
    pub inner_padding: f32,
    /// Reserved header strip height per group (px), clamped to the group rect
    pub header_height: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            outer_padding: 4.0,
            inner_padding: 2.0,
            header_height: 22.0,
        }
    }
}

/// Geometry for one group: frame, header strip, body, and leaf rects.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupLayout {
    /// Full group rectangle, header included.
    pub frame: LayoutRect,
    /// Strip reserved for the group's aggregate label.
    pub header: LayoutRect,
    /// Leaf area below the header, inset by the inner padding.
    pub body: LayoutRect,
    /// One rect per leaf, parallel to `Group::leaves`.
    pub leaves: Vec<LayoutRect>,
}

/// The full layout result, parallel to `Hierarchy::groups`.
#[derive(Debug, Clone, PartialEq)]
pub struct TreemapLayout {
    pub groups: Vec<GroupLayout>,
}

/// Compute the two-level geometry for a weighted hierarchy.
///
/// Groups are partitioned over the padded canvas by their area weights, each
/// group reserves a header strip (clamped to its rectangle), and the
/// remaining body is partitioned among the leaves by their weights. Degenerate
/// interiors produce empty leaf rects; the label fitter skips those.
pub fn compute_layout(
    hierarchy: &Hierarchy,
    viewport_w: f32,
    viewport_h: f32,
    config: &LayoutConfig,
) -> TreemapLayout {
    let canvas =
        LayoutRect::new(0.0, 0.0, viewport_w.max(0.0), viewport_h.max(0.0)).inset(config.outer_padding);

    let group_weights: Vec<f64> = hierarchy.groups.iter().map(|g| g.area_weight).collect();
    let group_rects = subdivide_sorted(&group_weights, canvas);

    let groups: Vec<GroupLayout> = hierarchy
        .groups
        .iter()
        .zip(group_rects)
        .map(|(group, frame)| {
            let header_h = config.header_height.min(frame.height());
            let header = LayoutRect::new(frame.x0, frame.y0, frame.x1, frame.y0 + header_h);
            let body =
                LayoutRect::new(frame.x0, header.y1, frame.x1, frame.y1).inset(config.inner_padding);

            let leaf_weights: Vec<f64> = group.leaves.iter().map(|l| l.area_weight).collect();
            let leaves = if body.is_empty() {
                vec![LayoutRect::empty_at(body.x0, body.y0); leaf_weights.len()]
            } else {
                subdivide_sorted(&leaf_weights, body)
            };

            GroupLayout {
                frame,
                header,
                body,
                leaves,
            }
        })
        .collect();

    tracing::info!(
        "Layout computed: {} groups, {} leaf rects in {:.0}x{:.0} viewport",
        groups.len(),
        groups.iter().map(|g| g.leaves.len()).sum::<usize>(),
        viewport_w,
        viewport_h
    );

    TreemapLayout { groups }
}

/// Run the squarified partitioner on weights sorted descending (it lays out
/// better rows that way), then restore the caller's ordering.
fn subdivide_sorted(weights: &[f64], bounds: LayoutRect) -> Vec<LayoutRect> {
    let mut order: Vec<usize> = (0..weights.len()).collect();
    order.sort_by(|&a, &b| {
        weights[b]
            .partial_cmp(&weights[a])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let sorted: Vec<f64> = order.iter().map(|&i| weights[i]).collect();
    let rects = squarify::squarify(&sorted, bounds);

    let mut out = vec![LayoutRect::empty_at(bounds.x0, bounds.y0); weights.len()];
    for (slot, rect) in order.into_iter().zip(rects) {
        out[slot] = rect;
    }
    out
}
