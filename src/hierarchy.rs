use std::collections::{HashMap, HashSet};

use compact_str::CompactString;

use crate::session::{MetricKind, RelationEdge, Session};

/// A single company's data point within a relation-type group.
#[derive(Debug, Clone, PartialEq)]
pub struct Leaf {
    pub code: CompactString,
    pub name: CompactString,
    /// Resolved growth value in percent. Finite by construction: leaves with
    /// no resolvable metric never make it into a group.
    pub value: f64,
    /// Share of canvas area, filled in by the weight assigner.
    pub area_weight: f64,
}

/// Cluster of leaves sharing a relation-type label. Never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub relation: CompactString,
    pub leaves: Vec<Leaf>,
    /// Mean of the leaf values.
    pub mean: f64,
    /// Share of canvas area, filled in by the weight assigner.
    pub area_weight: f64,
}

impl Group {
    pub fn member_count(&self) -> usize {
        self.leaves.len()
    }
}

/// The two-level weighted tree: root → groups → leaves.
#[derive(Debug, Clone, PartialEq)]
pub struct Hierarchy {
    pub groups: Vec<Group>,
}

/// Build the render hierarchy for one query.
///
/// Edges whose partner has no resolvable metric are dropped (a filtering
/// rule, not an error), duplicate partners within one relation collapse to
/// the first occurrence, and the visible group count is capped by ranking on
/// member count — not value — so a small extreme-valued group cannot crowd
/// out broadly represented ones.
///
/// Returns `None` when zero groups survive filtering: the explicit no-data
/// condition, distinct from a successful empty render.
pub fn build_hierarchy(
    session: &Session,
    edges: &[RelationEdge],
    period: &str,
    kind: MetricKind,
    max_groups: usize,
) -> Option<Hierarchy> {
    let mut order: Vec<CompactString> = Vec::new();
    let mut members: HashMap<CompactString, Vec<Leaf>> = HashMap::new();
    let mut seen: HashSet<(CompactString, CompactString)> = HashSet::new();
    let mut dropped_leaves = 0usize;

    for edge in edges {
        let Some(value) = session.growth(&edge.partner, period, kind) else {
            dropped_leaves += 1;
            tracing::debug!(
                "No {:?} value for {} in {}, dropping leaf",
                kind,
                edge.partner,
                period
            );
            continue;
        };
        // A company can appear in several supply-chain stages, but within one
        // relation group it counts once; first occurrence wins.
        if !seen.insert((edge.relation.clone(), edge.partner.clone())) {
            continue;
        }

        let leaves = members.entry(edge.relation.clone()).or_insert_with(|| {
            order.push(edge.relation.clone());
            Vec::new()
        });
        leaves.push(Leaf {
            code: edge.partner.clone(),
            name: CompactString::new(session.display_name(&edge.partner)),
            value,
            area_weight: 0.0,
        });
    }

    // Assemble groups in first-seen relation order.
    let mut groups: Vec<Group> = order
        .into_iter()
        .filter_map(|relation| {
            let leaves = members.remove(&relation)?;
            if leaves.is_empty() {
                return None;
            }
            let mean = leaves.iter().map(|l| l.value).sum::<f64>() / leaves.len() as f64;
            Some(Group {
                relation,
                leaves,
                mean,
                area_weight: 0.0,
            })
        })
        .collect();

    if groups.is_empty() {
        tracing::info!(
            "Hierarchy: 0 eligible groups ({} edges, {} unresolvable)",
            edges.len(),
            dropped_leaves
        );
        return None;
    }

    // Cap visible groups by member count. Stable sort keeps first-seen order
    // among equals, then the kept set is restored to first-seen order.
    if groups.len() > max_groups {
        let mut ranked: Vec<usize> = (0..groups.len()).collect();
        ranked.sort_by_key(|&i| std::cmp::Reverse(groups[i].member_count()));
        let keep: HashSet<usize> = ranked.into_iter().take(max_groups).collect();
        let total = groups.len();
        let mut index = 0usize;
        groups.retain(|_| {
            let kept = keep.contains(&index);
            index += 1;
            kept
        });
        tracing::info!(
            "Hierarchy: capped {} groups to {} by member count",
            total,
            max_groups
        );
    }

    tracing::info!(
        "Hierarchy built: {} groups, {} leaves ({} edges dropped as unavailable)",
        groups.len(),
        groups.iter().map(Group::member_count).sum::<usize>(),
        dropped_leaves
    );

    Some(Hierarchy { groups })
}
