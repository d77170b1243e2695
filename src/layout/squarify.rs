use crate::layout::LayoutRect;

/// Partition `bounds` into one sub-rectangle per weight, with areas
/// proportional to the weights (squarified treemap row search).
///
/// The result is parallel to `weights`: `out[i]` is the rect for
/// `weights[i]`. Non-positive or non-finite weights, and degenerate bounds,
/// yield empty rects instead of errors. Callers wanting the classic
/// squarified look should pass weights sorted descending.
pub fn squarify(weights: &[f64], bounds: LayoutRect) -> Vec<LayoutRect> {
    let mut out = vec![LayoutRect::empty_at(bounds.x0, bounds.y0); weights.len()];

    let mut x = bounds.x0 as f64;
    let mut y = bounds.y0 as f64;
    let mut w = bounds.width() as f64;
    let mut h = bounds.height() as f64;

    let total: f64 = weights
        .iter()
        .copied()
        .filter(|v| v.is_finite() && *v > 0.0)
        .sum();
    if w <= 1e-6 || h <= 1e-6 || total <= 0.0 {
        if !weights.is_empty() {
            tracing::debug!(
                "Squarify: degenerate bounds ({w:.1}x{h:.1}) or weight sum {total}, emitting empty rects"
            );
        }
        return out;
    }

    // Scale weights to pixel areas; drop the unusable ones up front.
    let area_scale = w * h / total;
    let mut remaining: Vec<(usize, f64)> = weights
        .iter()
        .copied()
        .enumerate()
        .filter(|(_, v)| v.is_finite() && *v > 0.0)
        .map(|(i, v)| (i, v * area_scale))
        .collect();

    while !remaining.is_empty() {
        // Guard against degenerate cases
        if w <= 1e-6 || h <= 1e-6 {
            break;
        }

        let horizontal = w >= h;
        let short = if horizontal { h } else { w };

        // Find best row length
        let mut best_score = f64::INFINITY;
        let mut best_k = 1;
        let mut row_sum = 0.0;

        for k in 1..=remaining.len().min(20) {
            // cap for speed
            let sum: f64 = remaining[0..k].iter().map(|(_, a)| a).sum();
            let score = worst_aspect_ratio(&remaining[0..k], sum, short);
            if score < best_score {
                best_score = score;
                best_k = k;
                row_sum = sum;
            } else if k > 3 {
                break; // diminishing returns
            }
        }

        // A horizontal row's thickness consumes height and is computed
        // against available width; a vertical column, vice versa.
        let long = if horizontal { w } else { h };
        let thickness = row_sum / long.max(1e-8);

        let mut offset = 0.0;
        for &(slot, area) in &remaining[0..best_k] {
            let length = area / thickness.max(1e-8);

            if !length.is_finite() || !thickness.is_finite() || length <= 0.0 || thickness <= 0.0 {
                tracing::warn!(
                    "Squarify: invalid dimensions (length={}, thickness={}, area={}), skipping",
                    length,
                    thickness,
                    area
                );
                continue;
            }

            out[slot] = if horizontal {
                LayoutRect::new(
                    (x + offset) as f32,
                    y as f32,
                    (x + offset + length) as f32,
                    (y + thickness) as f32,
                )
            } else {
                LayoutRect::new(
                    x as f32,
                    (y + offset) as f32,
                    (x + thickness) as f32,
                    (y + offset + length) as f32,
                )
            };
            offset += length;
        }

        // Shrink remaining space
        if horizontal {
            y += thickness;
            h = (h - thickness).max(0.0);
        } else {
            x += thickness;
            w = (w - thickness).max(0.0);
        }

        remaining.drain(0..best_k);
    }

    out
}

fn worst_aspect_ratio(row: &[(usize, f64)], sum: f64, side: f64) -> f64 {
    if row.is_empty() || sum <= 0.0 || side <= 0.0 {
        return f64::MAX;
    }
    let side_sq = side * side;
    let sum_sq = sum * sum;
    let max_r = row.iter().map(|(_, a)| *a).fold(0.0, f64::max);
    let min_r = row.iter().map(|(_, a)| *a).fold(f64::INFINITY, f64::min);
    let a = (side_sq * max_r) / sum_sq;
    let b = sum_sq / (side_sq * min_r);
    a.max(b)
}
