use compact_str::CompactString;

use crate::hierarchy::{self, Hierarchy};
use crate::layout::weights::{self, WeightPolicy};
use crate::layout::{self, LayoutConfig, TreemapLayout};
use crate::render::colors::{self, ColorMode, ColorSettings};
use crate::render::labels::{self, Anchor, FitConfig, LabelPlan};
use crate::render::Surface;
use crate::session::{MetricKind, RelationEdge, Session};

/// One render request. Edges are pre-filtered to the company of interest.
#[derive(Debug, Clone, Copy)]
pub struct Query<'a> {
    pub edges: &'a [RelationEdge],
    pub period: &'a str,
    pub kind: MetricKind,
    pub color_mode: ColorMode,
}

/// Per-group aggregate handed back for the summary UI.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupSummary {
    pub relation: CompactString,
    pub mean: f64,
    pub members: usize,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RenderSummary {
    pub groups: Vec<GroupSummary>,
}

/// Outcome of a render. No-data is a state, not an error: zero eligible
/// groups after filtering is the only externally visible failure mode.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderOutcome {
    NoData,
    Rendered(RenderSummary),
}

/// Tunables for the whole pipeline.
#[derive(Debug, Clone)]
pub struct ChartConfig {
    /// Visible group cap, ranked by member count.
    pub max_groups: usize,
    pub weight_policy: WeightPolicy,
    /// Area-weight floor.
    pub epsilon: f64,
    pub layout: LayoutConfig,
    pub fit: FitConfig,
    /// Color settings; the mode is overridden per query.
    pub colors: ColorSettings,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            max_groups: 8,
            weight_policy: WeightPolicy::default(),
            epsilon: weights::EPSILON,
            layout: LayoutConfig::default(),
            fit: FitConfig::default(),
            colors: ColorSettings::default(),
        }
    }
}

/// Frame state kept between renders so a resize can re-anchor without a
/// full re-fit. A new query replaces it wholesale.
struct Frame {
    hierarchy: Hierarchy,
    layout: TreemapLayout,
    /// Per group, per leaf; `None` means hidden.
    leaf_plans: Vec<Vec<Option<LabelPlan>>>,
    header_plans: Vec<Option<LabelPlan>>,
    color_mode: ColorMode,
}

/// The render coordinator.
///
/// `render` runs the full pipeline for a query in two passes over the
/// surface: geometry first, then — after the flush barrier, so fitting reads
/// committed metrics — label fitting and drawing. `resize` only records the
/// new viewport; the next `tick` performs at most one header-refit pass, so
/// a storm of resize events collapses into one unit of work.
pub struct Chart {
    config: ChartConfig,
    viewport: (f32, f32),
    pending_resize: bool,
    frame: Option<Frame>,
}

impl Chart {
    pub fn new(config: ChartConfig, viewport_w: f32, viewport_h: f32) -> Self {
        Self {
            config,
            viewport: (viewport_w, viewport_h),
            pending_resize: false,
            frame: None,
        }
    }

    pub fn viewport(&self) -> (f32, f32) {
        self.viewport
    }

    /// Render entry point. Supersedes any previous render completely.
    pub fn render<S: Surface>(
        &mut self,
        session: &Session,
        surface: &mut S,
        query: &Query,
    ) -> RenderOutcome {
        // A new query rebuilds everything; nothing in-flight survives.
        self.frame = None;
        self.pending_resize = false;

        let Some(mut hier) = hierarchy::build_hierarchy(
            session,
            query.edges,
            query.period,
            query.kind,
            self.config.max_groups,
        ) else {
            tracing::info!("Render: no data for period {}", query.period);
            return RenderOutcome::NoData;
        };

        weights::assign_weights(&mut hier.groups, self.config.weight_policy, self.config.epsilon);
        let layout = layout::compute_layout(&hier, self.viewport.0, self.viewport.1, &self.config.layout);
        let settings = ColorSettings {
            mode: query.color_mode,
            ..self.config.colors
        };

        // Pass 1: geometry.
        paint_geometry(surface, &hier, &layout, &settings);
        surface.flush();

        // Pass 2: labels. Leaves first; headers are fitted after all leaf
        // labels are placed so they absorb any measurement feedback, then
        // everything is drawn.
        let fit = self.config.fit;
        let leaf_plans: Vec<Vec<Option<LabelPlan>>> = hier
            .groups
            .iter()
            .zip(&layout.groups)
            .map(|(group, geometry)| {
                group
                    .leaves
                    .iter()
                    .zip(&geometry.leaves)
                    .map(|(leaf, rect)| {
                        let ladder = labels::leaf_ladder(&leaf.code, &leaf.name, leaf.value);
                        labels::fit_label(rect, &ladder, Anchor::Center, surface, &fit)
                    })
                    .collect()
            })
            .collect();

        let header_plans: Vec<Option<LabelPlan>> = hier
            .groups
            .iter()
            .zip(&layout.groups)
            .map(|(group, geometry)| {
                let ladder = labels::header_ladder(&group.relation, Some(group.mean));
                labels::fit_label(&geometry.header, &ladder, Anchor::Left, surface, &fit)
            })
            .collect();

        for plans in &leaf_plans {
            for plan in plans.iter().flatten() {
                draw_plan(surface, plan, &fit);
            }
        }
        for plan in header_plans.iter().flatten() {
            draw_plan(surface, plan, &fit);
        }

        let hidden = leaf_plans
            .iter()
            .flatten()
            .filter(|p| p.is_none())
            .count();
        tracing::info!(
            "Render complete: {} groups, {} leaf labels hidden",
            hier.groups.len(),
            hidden
        );

        let summary = RenderSummary {
            groups: hier
                .groups
                .iter()
                .map(|g| GroupSummary {
                    relation: g.relation.clone(),
                    mean: g.mean,
                    members: g.member_count(),
                })
                .collect(),
        };

        self.frame = Some(Frame {
            hierarchy: hier,
            layout,
            leaf_plans,
            header_plans,
            color_mode: query.color_mode,
        });

        RenderOutcome::Rendered(summary)
    }

    /// Record a viewport change. Cheap and coalescing: any number of resize
    /// events before the next tick result in a single refit pass.
    pub fn resize(&mut self, width: f32, height: f32) {
        self.viewport = (width, height);
        self.pending_resize = true;
    }

    /// Perform at most one pending resize pass: repaint geometry at the new
    /// viewport, re-fit header labels, and re-anchor frozen leaf plans. A
    /// leaf plan whose block no longer fits its new padded interior is
    /// hidden — no re-measurement — until the next query re-fits everything.
    pub fn tick<S: Surface>(&mut self, surface: &mut S) {
        if !self.pending_resize {
            return;
        }
        self.pending_resize = false;

        let Some(frame) = self.frame.as_mut() else {
            return;
        };

        let config = &self.config;
        let new_layout = layout::compute_layout(
            &frame.hierarchy,
            self.viewport.0,
            self.viewport.1,
            &config.layout,
        );
        let settings = ColorSettings {
            mode: frame.color_mode,
            ..config.colors
        };

        paint_geometry(surface, &frame.hierarchy, &new_layout, &settings);
        surface.flush();

        let fit = config.fit;
        for (plans, geometry) in frame.leaf_plans.iter_mut().zip(&new_layout.groups) {
            for (slot, rect) in plans.iter_mut().zip(&geometry.leaves) {
                let Some(plan) = slot.as_mut() else {
                    continue;
                };
                let pad = labels::effective_padding(rect.width(), rect.height(), &fit);
                let fits = plan.size.0 <= rect.width() - 2.0 * pad
                    && plan.size.1 <= rect.height() - 2.0 * pad;
                if fits {
                    plan.origin = labels::place_block(rect, plan.size, Anchor::Center, pad);
                    plan.clip = rect.inset(fit.clip_inset);
                    draw_plan(surface, plan, &fit);
                } else {
                    *slot = None;
                }
            }
        }

        for ((plan, group), geometry) in frame
            .header_plans
            .iter_mut()
            .zip(&frame.hierarchy.groups)
            .zip(&new_layout.groups)
        {
            let ladder = labels::header_ladder(&group.relation, Some(group.mean));
            *plan = labels::fit_label(&geometry.header, &ladder, Anchor::Left, surface, &fit);
            if let Some(plan) = plan {
                draw_plan(surface, plan, &fit);
            }
        }

        frame.layout = new_layout;
        tracing::debug!(
            "Resize pass complete at {:.0}x{:.0}",
            self.viewport.0,
            self.viewport.1
        );
    }
}

fn paint_geometry<S: Surface>(
    surface: &mut S,
    hierarchy: &Hierarchy,
    layout: &TreemapLayout,
    settings: &ColorSettings,
) {
    surface.clear(colors::CANVAS);
    for (group, geometry) in hierarchy.groups.iter().zip(&layout.groups) {
        surface.fill_rect(&geometry.frame, colors::GROUP_FRAME);
        surface.fill_rect(&geometry.header, colors::GROUP_FRAME.darken(0.04));
        for (leaf, rect) in group.leaves.iter().zip(&geometry.leaves) {
            if !rect.is_empty() {
                surface.fill_rect(rect, colors::value_color(Some(leaf.value), settings));
            }
        }
    }
}

/// Draw an accepted plan line by line. Line advances mirror the fitter's
/// block measurement; each line is centered within the block.
fn draw_plan<S: Surface>(surface: &mut S, plan: &LabelPlan, fit: &FitConfig) {
    let mut y = plan.origin.1;
    for line in &plan.lines {
        let (line_w, line_h) = surface.measure(line, plan.font_size);
        let x = plan.origin.0 + (plan.size.0 - line_w).max(0.0) / 2.0;
        surface.draw_line(x, y, line, plan.font_size, colors::LABEL, &plan.clip);
        y += line_h.max(plan.font_size) * fit.line_spacing;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::LayoutRect;
    use crate::render::colors::AppColor;
    use crate::render::TextMeasure;

    /// Deterministic surface: monospace metrics, records paint operations.
    #[derive(Default)]
    struct TestSurface {
        clears: usize,
        fills: usize,
        flushes: usize,
        texts: Vec<String>,
    }

    impl TextMeasure for TestSurface {
        fn measure(&self, text: &str, font_size: f32) -> (f32, f32) {
            let chars = text.chars().count() as f32;
            if chars == 0.0 {
                return (0.0, 0.0);
            }
            (chars * font_size * 0.6, font_size)
        }
    }

    impl Surface for TestSurface {
        fn clear(&mut self, _color: AppColor) {
            self.clears += 1;
        }
        fn fill_rect(&mut self, _rect: &LayoutRect, _color: AppColor) {
            self.fills += 1;
        }
        fn draw_line(
            &mut self,
            _x: f32,
            _y: f32,
            text: &str,
            _font_size: f32,
            _color: AppColor,
            _clip: &LayoutRect,
        ) {
            self.texts.push(text.to_string());
        }
        fn flush(&mut self) {
            self.flushes += 1;
        }
    }

    fn demo_session() -> Session {
        let mut session = Session::new();
        session.insert_company("2330", "台積電", "半導體");
        session.insert_company("2317", "鴻海", "電子");
        session.insert_company("3008", "大立光", "光學");
        session.insert_company("1101", "台泥", "水泥");
        for (code, value) in [("2330", 12.3), ("2317", -4.1), ("3008", 25.0), ("1101", 0.5)] {
            session.insert_growth(code, "2025-06", MetricKind::YearOverYear, value);
        }
        session
    }

    fn demo_edges() -> Vec<RelationEdge> {
        vec![
            RelationEdge::new("Upstream Materials", "1101"),
            RelationEdge::new("Upstream Components", "3008"),
            RelationEdge::new("Upstream Components", "2330"),
            RelationEdge::new("Downstream Assembly", "2317"),
        ]
    }

    fn demo_query(edges: &[RelationEdge]) -> Query<'_> {
        Query {
            edges,
            period: "2025-06",
            kind: MetricKind::YearOverYear,
            color_mode: ColorMode::RedUp,
        }
    }

    #[test]
    fn zero_edges_yield_no_data_not_a_crash() {
        let session = demo_session();
        let mut chart = Chart::new(ChartConfig::default(), 800.0, 600.0);
        let mut surface = TestSurface::default();

        let outcome = chart.render(&session, &mut surface, &demo_query(&[]));
        assert_eq!(outcome, RenderOutcome::NoData);
        assert!(chart.frame.is_none());
        // No geometry was painted for a no-data outcome.
        assert_eq!(surface.fills, 0);
    }

    #[test]
    fn render_paints_then_flushes_then_labels() {
        let session = demo_session();
        let edges = demo_edges();
        let mut chart = Chart::new(ChartConfig::default(), 800.0, 600.0);
        let mut surface = TestSurface::default();

        let outcome = chart.render(&session, &mut surface, &demo_query(&edges));
        let RenderOutcome::Rendered(summary) = outcome else {
            panic!("expected a rendered outcome");
        };

        assert_eq!(summary.groups.len(), 3);
        let components = summary
            .groups
            .iter()
            .find(|g| g.relation == "Upstream Components")
            .unwrap();
        assert_eq!(components.members, 2);
        assert!((components.mean - (25.0 + 12.3) / 2.0).abs() < 1e-12);

        assert_eq!(surface.clears, 1);
        assert_eq!(surface.flushes, 1);
        // 3 frames + 3 headers + 4 leaves
        assert_eq!(surface.fills, 10);
        assert!(!surface.texts.is_empty());
    }

    #[test]
    fn accepted_plans_fit_their_padded_interiors() {
        let session = demo_session();
        let edges = demo_edges();
        let mut chart = Chart::new(ChartConfig::default(), 800.0, 600.0);
        let mut surface = TestSurface::default();
        chart.render(&session, &mut surface, &demo_query(&edges));

        let frame = chart.frame.as_ref().unwrap();
        let fit = chart.config.fit;
        for (plans, geometry) in frame.leaf_plans.iter().zip(&frame.layout.groups) {
            for (plan, rect) in plans.iter().zip(&geometry.leaves) {
                let Some(plan) = plan else { continue };
                let pad = labels::effective_padding(rect.width(), rect.height(), &fit);
                assert!(plan.size.0 <= rect.width() - 2.0 * pad + 1e-4);
                assert!(plan.size.1 <= rect.height() - 2.0 * pad + 1e-4);
            }
        }
        for (plan, geometry) in frame.header_plans.iter().zip(&frame.layout.groups) {
            let Some(plan) = plan else { continue };
            let rect = &geometry.header;
            let pad = labels::effective_padding(rect.width(), rect.height(), &fit);
            assert!(plan.size.0 <= rect.width() - 2.0 * pad + 1e-4);
            assert!(plan.size.1 <= rect.height() - 2.0 * pad + 1e-4);
        }
    }

    #[test]
    fn identical_queries_produce_identical_frames() {
        let session = demo_session();
        let edges = demo_edges();
        let mut chart = Chart::new(ChartConfig::default(), 800.0, 600.0);

        let mut surface = TestSurface::default();
        chart.render(&session, &mut surface, &demo_query(&edges));
        let first_layout = chart.frame.as_ref().unwrap().layout.clone();
        let first_leaf_plans = chart.frame.as_ref().unwrap().leaf_plans.clone();
        let first_header_plans = chart.frame.as_ref().unwrap().header_plans.clone();

        let mut surface = TestSurface::default();
        chart.render(&session, &mut surface, &demo_query(&edges));
        let frame = chart.frame.as_ref().unwrap();

        assert_eq!(frame.layout, first_layout);
        assert_eq!(frame.leaf_plans, first_leaf_plans);
        assert_eq!(frame.header_plans, first_header_plans);
    }

    #[test]
    fn resize_is_throttled_to_one_pass_per_tick() {
        let session = demo_session();
        let edges = demo_edges();
        let mut chart = Chart::new(ChartConfig::default(), 800.0, 600.0);
        let mut surface = TestSurface::default();
        chart.render(&session, &mut surface, &demo_query(&edges));

        // A storm of resize events...
        chart.resize(900.0, 700.0);
        chart.resize(1000.0, 750.0);
        chart.resize(1024.0, 768.0);

        let mut surface = TestSurface::default();
        chart.tick(&mut surface);
        assert_eq!(surface.flushes, 1, "one coalesced pass");
        assert!(surface.fills > 0);

        // Nothing pending: the next tick is a no-op.
        let mut surface = TestSurface::default();
        chart.tick(&mut surface);
        assert_eq!(surface.flushes, 0);
        assert_eq!(surface.fills, 0);
    }

    #[test]
    fn shrinking_viewport_hides_leaf_plans_that_no_longer_fit() {
        let session = demo_session();
        let edges = demo_edges();
        let mut chart = Chart::new(ChartConfig::default(), 800.0, 600.0);
        let mut surface = TestSurface::default();
        chart.render(&session, &mut surface, &demo_query(&edges));

        let visible_before = chart
            .frame
            .as_ref()
            .unwrap()
            .leaf_plans
            .iter()
            .flatten()
            .filter(|p| p.is_some())
            .count();
        assert!(visible_before > 0);

        chart.resize(60.0, 40.0);
        let mut surface = TestSurface::default();
        chart.tick(&mut surface);

        let frame = chart.frame.as_ref().unwrap();
        let visible_after = frame
            .leaf_plans
            .iter()
            .flatten()
            .filter(|p| p.is_some())
            .count();
        assert!(visible_after < visible_before);

        // Survivors still fit the new geometry.
        let fit = chart.config.fit;
        for (plans, geometry) in frame.leaf_plans.iter().zip(&frame.layout.groups) {
            for (plan, rect) in plans.iter().zip(&geometry.leaves) {
                let Some(plan) = plan else { continue };
                let pad = labels::effective_padding(rect.width(), rect.height(), &fit);
                assert!(plan.size.0 <= rect.width() - 2.0 * pad + 1e-4);
                assert!(plan.size.1 <= rect.height() - 2.0 * pad + 1e-4);
            }
        }
    }

    #[test]
    fn tick_without_a_frame_is_harmless() {
        let mut chart = Chart::new(ChartConfig::default(), 800.0, 600.0);
        chart.resize(400.0, 300.0);
        let mut surface = TestSurface::default();
        chart.tick(&mut surface);
        assert_eq!(surface.fills, 0);
    }

    #[test]
    fn a_new_query_supersedes_pending_resize_work() {
        let session = demo_session();
        let edges = demo_edges();
        let mut chart = Chart::new(ChartConfig::default(), 800.0, 600.0);
        let mut surface = TestSurface::default();
        chart.render(&session, &mut surface, &demo_query(&edges));

        chart.resize(1024.0, 768.0);
        let mut surface = TestSurface::default();
        chart.render(&session, &mut surface, &demo_query(&edges));

        // The render consumed the pending resize; tick has nothing to do.
        let mut surface = TestSurface::default();
        chart.tick(&mut surface);
        assert_eq!(surface.fills, 0);
    }
}
