use crate::layout::LayoutRect;
use crate::render::TextMeasure;

/// One rung of the informativeness ladder.
///
/// The first line is `free` + `pinned`: the free part may be shortened with
/// a trailing ellipsis during fitting, the pinned tail (where aggregate
/// values live) never is. `rest` holds stacked lines below the first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Candidate {
    pub free: String,
    pub pinned: String,
    pub rest: Vec<String>,
    /// Whether the free part may be ellipsis-shortened on this rung. Header
    /// ladders keep their one-line rung intact so the stacked rung is tried
    /// before any truncation.
    pub truncate_free: bool,
}

impl Candidate {
    fn line_count(&self) -> usize {
        1 + self.rest.len()
    }

    fn compose(&self, free: &str, truncated: bool) -> Vec<String> {
        let mut first = String::with_capacity(free.len() + self.pinned.len() + 3);
        first.push_str(free);
        if truncated {
            first.push('…');
        }
        first.push_str(&self.pinned);

        let mut lines = Vec::with_capacity(self.line_count());
        lines.push(first);
        lines.extend(self.rest.iter().cloned());
        lines
    }
}

/// Horizontal anchoring of an accepted label within its rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    /// Centered both ways (leaf cells).
    Center,
    /// Left-aligned at the padding, vertically centered (header strips).
    Left,
}

/// Tunables for the fit search.
#[derive(Debug, Clone, Copy)]
pub struct FitConfig {
    /// Preferred padding inside a rectangle (px)
    pub base_padding: f32,
    /// Padding shrinks to this share of the smaller dimension on small rects
    pub padding_ratio: f32,
    /// Absolute padding floor (px)
    pub min_padding: f32,
    /// Hard minimum font size; below this the label hides instead
    pub min_font: f32,
    /// Upper bound on any label font size
    pub max_font: f32,
    /// Initial-guess multiplier over sqrt(rect area)
    pub size_factor: f32,
    /// Line advance as a multiple of font size
    pub line_spacing: f32,
    /// Shrink-loop circuit breaker (iterations, never wall clock)
    pub max_iterations: u32,
    /// Clip inset applied to accepted labels (px)
    pub clip_inset: f32,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            base_padding: 4.0,
            padding_ratio: 0.08,
            min_padding: 1.0,
            min_font: 7.0,
            max_font: 22.0,
            size_factor: 0.28,
            line_spacing: 1.1,
            max_iterations: 60,
            clip_inset: 0.5,
        }
    }
}

/// An accepted label: frozen once the fit search commits it.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelPlan {
    /// Index of the accepted ladder rung.
    pub candidate: usize,
    pub font_size: f32,
    /// Final display lines, top to bottom.
    pub lines: Vec<String>,
    /// Top-left of the text block.
    pub origin: (f32, f32),
    /// Measured block size (w, h).
    pub size: (f32, f32),
    /// Safety net against sub-pixel overflow; drawing never escapes it.
    pub clip: LayoutRect,
}

/// Fit the first workable rung of a candidate ladder into a rectangle.
///
/// Candidates are tried most-informative first. Per candidate: start from a
/// font-size guess bounded by the rectangle, shrink by the limiting scale
/// factor until the measured block fits or the hard minimum is reached, then
/// shorten the free text with an ellipsis. `None` means the label is hidden
/// — never overflowed, and never an error. Degenerate rectangles (including
/// those whose padded interior vanishes) are skipped the same way.
pub fn fit_label<M: TextMeasure + ?Sized>(
    rect: &LayoutRect,
    candidates: &[Candidate],
    anchor: Anchor,
    measure: &M,
    config: &FitConfig,
) -> Option<LabelPlan> {
    let w = rect.width();
    let h = rect.height();
    if w <= 0.0 || h <= 0.0 {
        return None;
    }

    let pad = effective_padding(w, h, config);
    let target_w = w - 2.0 * pad;
    let target_h = h - 2.0 * pad;
    if target_w <= 0.0 || target_h <= 0.0 {
        return None;
    }

    for (index, candidate) in candidates.iter().enumerate() {
        if let Some((font_size, lines, size)) =
            fit_candidate(candidate, target_w, target_h, measure, config)
        {
            let origin = place_block(rect, size, anchor, pad);
            return Some(LabelPlan {
                candidate: index,
                font_size,
                lines,
                origin,
                size,
                clip: rect.inset(config.clip_inset),
            });
        }
    }

    tracing::trace!("No candidate fits {:.0}x{:.0} rect, hiding label", w, h);
    None
}

/// Padding for a rectangle: the configured base, shrunk proportionally on
/// small rects, never below the absolute floor.
pub fn effective_padding(w: f32, h: f32, config: &FitConfig) -> f32 {
    let scaled = (w.min(h) * config.padding_ratio).floor();
    config.base_padding.min(scaled).max(config.min_padding)
}

/// Anchor a measured block inside a rectangle's padded interior.
pub fn place_block(rect: &LayoutRect, size: (f32, f32), anchor: Anchor, pad: f32) -> (f32, f32) {
    let y = rect.y0 + (rect.height() - size.1) / 2.0;
    let x = match anchor {
        Anchor::Center => rect.x0 + (rect.width() - size.0) / 2.0,
        Anchor::Left => rect.x0 + pad,
    };
    (x, y)
}

/// Search one candidate: font-size descent, then free-text truncation.
fn fit_candidate<M: TextMeasure + ?Sized>(
    candidate: &Candidate,
    target_w: f32,
    target_h: f32,
    measure: &M,
    config: &FitConfig,
) -> Option<(f32, Vec<String>, (f32, f32))> {
    let lines = candidate.compose(&candidate.free, false);
    if lines.iter().all(|l| l.is_empty()) {
        return None;
    }

    // Initial guess: proportional to the rectangle's diagonal scale, bounded
    // by what the height can hold per line and by the configured maximum.
    let per_line = target_h / (lines.len() as f32 * config.line_spacing);
    let logical_max = per_line.min(config.max_font);
    let guess = ((target_w * target_h).sqrt() * config.size_factor).floor();
    let mut font = guess.min(logical_max).max(config.min_font);

    let mut dims = measure_block(&lines, font, measure, config);
    let mut iterations = 0u32;
    while (dims.0 > target_w || dims.1 > target_h)
        && font > config.min_font
        && iterations < config.max_iterations
    {
        // Shrink by the limiting axis, always by at least one step.
        let scale = (target_w / dims.0).min(target_h / dims.1);
        font = (font * scale).floor().min(font - 1.0).max(config.min_font);
        dims = measure_block(&lines, font, measure, config);
        iterations += 1;
    }

    if dims.0 <= target_w && dims.1 <= target_h {
        return Some((font, lines, dims));
    }
    if dims.1 > target_h {
        // Too tall even at the floor; dropping characters cannot fix height.
        return None;
    }

    if !candidate.truncate_free {
        return None;
    }

    // Too wide at the hard minimum: shorten the free part, ellipsis-marked,
    // re-measuring after each removal.
    let mut free: Vec<char> = candidate.free.chars().collect();
    while !free.is_empty() {
        free.pop();
        let shortened: String = free.iter().collect();
        let lines = candidate.compose(&shortened, true);
        let dims = measure_block(&lines, font, measure, config);
        if dims.0 <= target_w && dims.1 <= target_h {
            return Some((font, lines, dims));
        }
    }

    None
}

/// Measure a stacked block: widest line by spaced line heights.
fn measure_block<M: TextMeasure + ?Sized>(
    lines: &[String],
    font_size: f32,
    measure: &M,
    config: &FitConfig,
) -> (f32, f32) {
    let mut w = 0.0f32;
    let mut h = 0.0f32;
    for line in lines {
        let (lw, lh) = measure.measure(line, font_size);
        w = w.max(lw);
        h += lh.max(font_size) * config.line_spacing;
    }
    (w, h)
}

/// Percentage text: one decimal, explicit "+" for non-negative, em-dash for
/// anything unusable.
pub fn format_pct(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => {
            if v >= 0.0 {
                format!("+{v:.1}%")
            } else {
                format!("{v:.1}%")
            }
        }
        _ => "—".to_string(),
    }
}

/// Leaf ladder: "code name" + value → code + value → value alone.
pub fn leaf_ladder(code: &str, name: &str, value: f64) -> Vec<Candidate> {
    let value_text = format_pct(Some(value));
    let full = if name.is_empty() || name == code {
        code.to_string()
    } else {
        format!("{code} {name}")
    };

    let mut ladder = Vec::with_capacity(3);
    ladder.push(Candidate {
        free: full.clone(),
        pinned: String::new(),
        rest: vec![value_text.clone()],
        truncate_free: true,
    });
    if full != code {
        ladder.push(Candidate {
            free: code.to_string(),
            pinned: String::new(),
            rest: vec![value_text.clone()],
            truncate_free: true,
        });
    }
    ladder.push(Candidate {
        free: String::new(),
        pinned: value_text,
        rest: Vec::new(),
        truncate_free: false,
    });
    ladder
}

/// Header ladder: the aggregate value survives every rung. The ladder moves
/// to two stacked lines before truncating the name, preferring two readable
/// lines over an unreadably small single one when the strip allows it.
pub fn header_ladder(relation: &str, mean: Option<f64>) -> Vec<Candidate> {
    let value_text = format_pct(mean);
    vec![
        Candidate {
            free: relation.to_string(),
            pinned: format!(" {value_text}"),
            rest: Vec::new(),
            truncate_free: false,
        },
        Candidate {
            free: relation.to_string(),
            pinned: String::new(),
            rest: vec![value_text.clone()],
            truncate_free: true,
        },
        Candidate {
            free: String::new(),
            pinned: value_text,
            rest: Vec::new(),
            truncate_free: false,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Deterministic monospace metrics: width 0.6·size per char, height = size.
    struct MonoMeasure;

    impl TextMeasure for MonoMeasure {
        fn measure(&self, text: &str, font_size: f32) -> (f32, f32) {
            let chars = text.chars().count() as f32;
            if chars == 0.0 {
                return (0.0, 0.0);
            }
            (chars * font_size * 0.6, font_size)
        }
    }

    fn fits_padded(plan: &LabelPlan, rect: &LayoutRect, config: &FitConfig) {
        let pad = effective_padding(rect.width(), rect.height(), config);
        assert!(plan.size.0 <= rect.width() - 2.0 * pad + 1e-4);
        assert!(plan.size.1 <= rect.height() - 2.0 * pad + 1e-4);
        assert!(plan.origin.0 >= rect.x0 + pad - 1e-4);
        assert!(plan.origin.1 >= rect.y0 - 1e-4);
    }

    #[test]
    fn narrow_rect_resolves_via_the_ladder() {
        // Scenario: 40×18 px, full → code → value-only.
        let rect = LayoutRect::new(0.0, 0.0, 40.0, 18.0);
        let config = FitConfig::default();
        let ladder = leaf_ladder("2330", "TSMC", 12.3);

        let plan = fit_label(&rect, &ladder, Anchor::Center, &MonoMeasure, &config)
            .expect("narrowest candidate must fit at the minimum font");
        fits_padded(&plan, &rect, &config);
        assert!(plan.lines.iter().any(|l| l.contains("+12.3%")));
    }

    #[test]
    fn tiny_rect_hides_without_panicking() {
        // Scenario: 4×4 px.
        let rect = LayoutRect::new(0.0, 0.0, 4.0, 4.0);
        let ladder = leaf_ladder("2330", "台積電", 12.3);
        let plan = fit_label(&rect, &ladder, Anchor::Center, &MonoMeasure, &FitConfig::default());
        assert!(plan.is_none());
    }

    #[test]
    fn degenerate_rect_is_skipped() {
        let rect = LayoutRect::new(10.0, 10.0, 10.0, 10.0);
        let ladder = leaf_ladder("2330", "台積電", 12.3);
        let plan = fit_label(&rect, &ladder, Anchor::Center, &MonoMeasure, &FitConfig::default());
        assert!(plan.is_none());
    }

    #[test]
    fn large_rect_takes_the_most_informative_candidate() {
        let rect = LayoutRect::new(0.0, 0.0, 300.0, 120.0);
        let config = FitConfig::default();
        let ladder = leaf_ladder("2330", "台積電", 12.3);

        let plan = fit_label(&rect, &ladder, Anchor::Center, &MonoMeasure, &config).unwrap();
        assert_eq!(plan.candidate, 0);
        assert_eq!(plan.lines.len(), 2);
        assert_eq!(plan.lines[0], "2330 台積電");
        fits_padded(&plan, &rect, &config);
    }

    #[test]
    fn accepted_blocks_never_exceed_the_padded_interior() {
        let config = FitConfig::default();
        let ladder = leaf_ladder("2330", "台積電", -55.0);
        for (w, h) in [
            (320.0, 200.0),
            (120.0, 60.0),
            (64.0, 30.0),
            (40.0, 18.0),
            (26.0, 12.0),
            (12.0, 9.0),
        ] {
            let rect = LayoutRect::new(0.0, 0.0, w, h);
            if let Some(plan) = fit_label(&rect, &ladder, Anchor::Center, &MonoMeasure, &config) {
                fits_padded(&plan, &rect, &config);
            }
        }
    }

    #[test]
    fn truncation_marks_with_ellipsis_and_keeps_the_pinned_tail() {
        // A long free part, a pinned value, and a rect wide enough for the
        // value but not the name, tall enough for just one line.
        let rect = LayoutRect::new(0.0, 0.0, 90.0, 13.0);
        let config = FitConfig::default();
        let ladder = vec![Candidate {
            free: "An Exceedingly Long Relation Name".to_string(),
            pinned: " +4.2%".to_string(),
            rest: Vec::new(),
            truncate_free: true,
        }];

        let plan = fit_label(&rect, &ladder, Anchor::Left, &MonoMeasure, &config).unwrap();
        assert_eq!(plan.lines.len(), 1);
        assert!(plan.lines[0].contains('…'), "free text should be ellipsis-marked");
        assert!(plan.lines[0].ends_with(" +4.2%"), "pinned tail must survive");
        fits_padded(&plan, &rect, &config);
    }

    #[test]
    fn header_ladder_never_drops_the_value() {
        for candidate in header_ladder("Upstream Materials", Some(4.2)) {
            let has_value = candidate.pinned.contains("+4.2%")
                || candidate.rest.iter().any(|l| l.contains("+4.2%"));
            assert!(has_value, "every rung keeps the aggregate: {candidate:?}");
        }
    }

    #[test]
    fn header_prefers_two_lines_over_truncating_the_name() {
        // Too narrow for "name value" on one line, tall enough for two.
        let rect = LayoutRect::new(0.0, 0.0, 84.0, 40.0);
        let config = FitConfig::default();
        let ladder = header_ladder("Upstream Materials", Some(4.2));

        let plan = fit_label(&rect, &ladder, Anchor::Left, &MonoMeasure, &config).unwrap();
        assert_eq!(plan.candidate, 1, "expected the stacked rung");
        assert_eq!(plan.lines.len(), 2);
        assert_eq!(plan.lines[0], "Upstream Materials", "name must not be truncated");
        fits_padded(&plan, &rect, &config);
    }

    #[test]
    fn fit_is_idempotent() {
        let rect = LayoutRect::new(3.0, 5.0, 120.0, 47.0);
        let config = FitConfig::default();
        let ladder = leaf_ladder("2317", "鴻海", -3.7);

        let a = fit_label(&rect, &ladder, Anchor::Center, &MonoMeasure, &config);
        let b = fit_label(&rect, &ladder, Anchor::Center, &MonoMeasure, &config);
        assert_eq!(a, b);
    }

    #[test]
    fn shrink_loop_respects_the_iteration_cap() {
        struct CountingMeasure(std::cell::Cell<u32>);
        impl TextMeasure for CountingMeasure {
            fn measure(&self, _text: &str, font_size: f32) -> (f32, f32) {
                self.0.set(self.0.get() + 1);
                // Pathological: everything is always too wide.
                (1e6, font_size)
            }
        }

        let rect = LayoutRect::new(0.0, 0.0, 200.0, 100.0);
        let config = FitConfig::default();
        let ladder = vec![Candidate {
            free: "abc".to_string(),
            pinned: String::new(),
            rest: Vec::new(),
            truncate_free: true,
        }];
        let counter = CountingMeasure(std::cell::Cell::new(0));
        let plan = fit_label(&rect, &ladder, Anchor::Center, &counter, &config);
        assert!(plan.is_none());
        // Shrink iterations + truncation attempts stay bounded: the cap plus
        // one measurement per removable character plus the initial pass.
        assert!(counter.0.get() <= config.max_iterations + 3 + 2);
    }

    #[test]
    fn pct_formatting() {
        assert_eq!(format_pct(Some(12.34)), "+12.3%");
        assert_eq!(format_pct(Some(0.0)), "+0.0%");
        assert_eq!(format_pct(Some(-5.0)), "-5.0%");
        assert_eq!(format_pct(Some(f64::NAN)), "—");
        assert_eq!(format_pct(None), "—");
    }

    #[test]
    fn leaf_ladder_skips_the_code_rung_when_name_is_the_code() {
        let ladder = leaf_ladder("2330", "2330", 1.0);
        assert_eq!(ladder.len(), 2);
        assert_eq!(ladder[0].free, "2330");
    }
}
