/// Diagnostic tool to verify the session → hierarchy → weights → layout pipeline
use chainview_rs::hierarchy;
use chainview_rs::layout::weights::{self, WeightPolicy};
use chainview_rs::layout::{self, LayoutConfig};
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

    println!("=== DIAGNOSTIC: Hierarchy → Weights → Layout Pipeline ===");
    println!(
        "Session: {} companies, {} metric readings",
        session.company_count(),
        session.metric_count()
    );

    // Build hierarchy
    let Some(mut hier) =
        hierarchy::build_hierarchy(&session, &edges, period, MetricKind::YearOverYear, 8)
    else {
        println!("\nNo eligible groups — nothing to lay out.");
        return Ok(());
    };
    println!("\n[1] Hierarchy built: {} groups", hier.groups.len());
    for (i, group) in hier.groups.iter().enumerate() {
        println!(
            "    [{}] '{}' - {} members, mean {:+.1}%",
            i,
            group.relation,
            group.member_count(),
            group.mean
        );
    }

    // Assign weights
    let policy = WeightPolicy::default();
    weights::assign_weights(&mut hier.groups, policy, weights::EPSILON);
    println!("\n[2] Weights assigned ({policy:?}):");
    for group in &hier.groups {
        let leaf_sum: f64 = group.leaves.iter().map(|l| l.area_weight).sum();
        println!(
            "    '{}' weight {:.4} (leaf sum {:.4}, drift {:.2e})",
            group.relation,
            group.area_weight,
            leaf_sum,
            (leaf_sum - group.area_weight).abs()
        );
    }

    // Compute layout
    let config = LayoutConfig::default();
    let layout = layout::compute_layout(&hier, 1280.0, 800.0, &config);
    println!("\n[3] Layout computed: {} group frames", layout.groups.len());
    for (group, geometry) in hier.groups.iter().zip(&layout.groups) {
        println!(
            "    '{}' frame {:.0}x{:.0} at ({:.0}, {:.0}), header {:.0}px, {} leaf rects",
            group.relation,
            geometry.frame.width(),
            geometry.frame.height(),
            geometry.frame.x0,
            geometry.frame.y0,
            geometry.header.height(),
            geometry.leaves.len()
        );
        for (leaf, rect) in group.leaves.iter().zip(&geometry.leaves) {
            println!(
                "        {} {:>8} [{}] {:+.1}%  {:.0}x{:.0} at ({:.0}, {:.0})",
                leaf.code,
                leaf.name,
                session.industry(&leaf.code).unwrap_or("-"),
                leaf.value,
                rect.width(),
                rect.height(),
                rect.x0,
                rect.y0
            );
        }
    }

    // Check for anomalies
    println!("\n[4] Checking for anomalies:");
    let mut frame_area = 0.0f32;
    for geometry in &layout.groups {
        frame_area += geometry.frame.area();
    }
    let canvas_area = (1280.0 - 2.0 * config.outer_padding) * (800.0 - 2.0 * config.outer_padding);
    println!("    Total frame area: {frame_area:.0}px²");
    println!("    Padded canvas:    {canvas_area:.0}px²");
    println!("    Coverage: {:.1}%", frame_area / canvas_area * 100.0);

    let empty_leaves = layout
        .groups
        .iter()
        .flat_map(|g| &g.leaves)
        .filter(|r| r.is_empty())
        .count();
    println!("    Empty leaf rects: {empty_leaves}");

    Ok(())
}

/// A small TSMC-centric supply chain with one unresolvable partner and one
/// duplicate edge, to exercise the filtering rules.
fn synthetic_supply_chain(period: &str) -> (Session, Vec<RelationEdge>) {
    let mut session = Session::new();
    let companies = [
        ("1101", "台泥", "水泥"),
        ("1301", "台塑", "塑膠"),
        ("2330", "台積電", "半導體"),
        ("2317", "鴻海", "電子"),
        ("3008", "大立光", "光學"),
        ("3711", "日月光投控", "封測"),
        ("2454", "聯發科", "IC設計"),
        ("2412", "中華電", "電信"),
    ];
    for (code, name, industry) in companies {
        session.insert_company(code, name, industry);
    }
    let readings = [
        ("1101", -2.4),
        ("1301", 0.8),
        ("2330", 22.4),
        ("2317", -4.1),
        ("3008", 31.2),
        ("3711", 5.6),
        ("2454", 12.9),
        // 2412 deliberately has no reading for this period.
    ];
    for (code, value) in readings {
        session.insert_growth(code, period, MetricKind::YearOverYear, value);
    }

    let edges = vec![
        RelationEdge::new("Upstream Materials", "1101"),
        RelationEdge::new("Upstream Materials", "1301"),
        RelationEdge::new("Upstream Components", "3008"),
        RelationEdge::new("Upstream Components", "2454"),
        RelationEdge::new("Upstream Components", "2454"), // duplicate
        RelationEdge::new("Downstream Packaging", "3711"),
        RelationEdge::new("Downstream Assembly", "2317"),
        RelationEdge::new("Downstream Assembly", "2412"), // unresolvable
        RelationEdge::new("Downstream Assembly", "2330"),
    ];

    (session, edges)
}
