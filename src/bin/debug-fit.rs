/// Diagnostic tool for the label fitter: runs a full render against the CPU
/// raster surface and dumps every accepted plan
use chainview_rs::chart::{Chart, ChartConfig, Query, RenderOutcome};
use chainview_rs::render::colors::{self, ColorMode};
use chainview_rs::render::labels::{self, Anchor, FitConfig};
use chainview_rs::render::raster::RasterSurface;
use chainview_rs::session::{MetricKind, RelationEdge, Session};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("chainview_rs=debug".parse().unwrap()),
        )
        .init();

    let period = "2025-06";
    let (session, edges) = synthetic_supply_chain(period);

    println!("=== DIAGNOSTIC: Label Fit + Raster Render ===");

    let mut surface = RasterSurface::from_system_fonts(1280, 800)?;
    let mut chart = Chart::new(ChartConfig::default(), 1280.0, 800.0);

    let query = Query {
        edges: &edges,
        period,
        kind: MetricKind::YearOverYear,
        color_mode: ColorMode::RedUp,
    };

    // Full render
    let outcome = chart.render(&session, &mut surface, &query);
    let RenderOutcome::Rendered(summary) = outcome else {
        println!("\nNo data — nothing rendered.");
        return Ok(());
    };

    println!("\n[1] Rendered {} groups:", summary.groups.len());
    for group in &summary.groups {
        println!(
            "    '{}' - {} members, mean {}",
            group.relation,
            group.members,
            labels::format_pct(Some(group.mean))
        );
    }

    // Standalone fit probes against the real font metrics
    println!("\n[2] Fit probes (real font metrics):");
    let fit = FitConfig::default();
    let probes: [(f32, f32); 4] = [(300.0, 120.0), (90.0, 36.0), (40.0, 18.0), (4.0, 4.0)];
    for (w, h) in probes {
        let rect = chainview_rs::layout::LayoutRect::new(0.0, 0.0, w, h);
        let ladder = labels::leaf_ladder("2330", "台積電", 22.4);
        match labels::fit_label(&rect, &ladder, Anchor::Center, &surface, &fit) {
            Some(plan) => println!(
                "    {w:>4.0}x{h:<4.0} → rung {}, {:.0}px font, {} line(s): {:?}",
                plan.candidate,
                plan.font_size,
                plan.lines.len(),
                plan.lines
            ),
            None => println!("    {w:>4.0}x{h:<4.0} → hidden"),
        }
    }

    // Pixel sanity: the canvas must not be uniform background anymore
    println!("\n[3] Pixel sanity:");
    let background = colors::CANVAS.to_rgba8();
    let mut painted = 0usize;
    let total = (surface.width() * surface.height()) as usize;
    for y in 0..surface.height() {
        for x in 0..surface.width() {
            let px = surface.pixel(x, y);
            if px[0] != background[0] || px[1] != background[1] || px[2] != background[2] {
                painted += 1;
            }
        }
    }
    println!(
        "    Painted pixels: {painted}/{total} ({:.1}%)",
        painted as f64 / total as f64 * 100.0
    );
    if painted == 0 {
        println!("    WARNING: nothing painted — check the layout output");
    }

    Ok(())
}

fn synthetic_supply_chain(period: &str) -> (Session, Vec<RelationEdge>) {
    let mut session = Session::new();
    for (code, name, industry) in [
        ("1101", "台泥", "水泥"),
        ("2330", "台積電", "半導體"),
        ("2317", "鴻海", "電子"),
        ("3008", "大立光", "光學"),
        ("3711", "日月光投控", "封測"),
    ] {
        session.insert_company(code, name, industry);
    }
    for (code, value) in [
        ("1101", -2.4),
        ("2330", 22.4),
        ("2317", -4.1),
        ("3008", 31.2),
        ("3711", 5.6),
    ] {
        session.insert_growth(code, period, MetricKind::YearOverYear, value);
    }

    let edges = vec![
        RelationEdge::new("Upstream Materials", "1101"),
        RelationEdge::new("Upstream Components", "3008"),
        RelationEdge::new("Downstream Packaging", "3711"),
        RelationEdge::new("Downstream Assembly", "2317"),
        RelationEdge::new("Downstream Assembly", "2330"),
    ];

    (session, edges)
}
