use crate::hierarchy::Group;

/// Epsilon floor for area weights. Keeps the weakest group visible and is
/// the substitute weight for malformed means.
pub const EPSILON: f64 = 0.01;

/// How group means map to area weights.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WeightPolicy {
    /// `weight = (mean − weakest mean) + ε`. The weakest group gets exactly
    /// ε; the rest scale with their distance from it. Faithful to magnitude,
    /// so one runaway month can dominate the canvas.
    Magnitude,
    /// Groups sorted ascending by mean take weights linearly interpolated
    /// across `[w_min, w_max]` by rank position, bounding outlier dominance.
    Rank { w_min: f64, w_max: f64 },
}

impl Default for WeightPolicy {
    fn default() -> Self {
        Self::Rank {
            w_min: 0.95,
            w_max: 1.55,
        }
    }
}

/// Assign group and leaf area weights in place.
///
/// Afterwards every group weight is finite and ≥ ε, and each group's leaf
/// weights sum to the group weight. Malformed means never abort a render:
/// they substitute ε and log a data-quality warning.
pub fn assign_weights(groups: &mut [Group], policy: WeightPolicy, epsilon: f64) {
    if groups.is_empty() {
        return;
    }

    match policy {
        WeightPolicy::Magnitude => {
            let min_mean = groups
                .iter()
                .map(|g| g.mean)
                .filter(|m| m.is_finite())
                .fold(f64::INFINITY, f64::min);
            for group in groups.iter_mut() {
                group.area_weight = if group.mean.is_finite() && min_mean.is_finite() {
                    (group.mean - min_mean) + epsilon
                } else {
                    tracing::warn!(
                        "Non-finite mean for group '{}', substituting ε",
                        group.relation
                    );
                    epsilon
                };
            }
        }
        WeightPolicy::Rank { w_min, w_max } => {
            let mut ranked: Vec<usize> = (0..groups.len())
                .filter(|&i| groups[i].mean.is_finite())
                .collect();
            ranked.sort_by(|&a, &b| {
                groups[a]
                    .mean
                    .partial_cmp(&groups[b].mean)
                    .unwrap_or(std::cmp::Ordering::Equal)
            });

            let n = ranked.len();
            for (rank, &gi) in ranked.iter().enumerate() {
                groups[gi].area_weight = if n <= 1 {
                    w_max
                } else {
                    w_min + (w_max - w_min) * rank as f64 / (n - 1) as f64
                };
            }
            for group in groups.iter_mut() {
                if !group.mean.is_finite() {
                    tracing::warn!(
                        "Non-finite mean for group '{}', substituting ε",
                        group.relation
                    );
                    group.area_weight = epsilon;
                }
            }
        }
    }

    // Epsilon floor: whatever the policy produced, never hand the
    // subdivider a weight that would collapse a group to invisibility.
    for group in groups.iter_mut() {
        if !group.area_weight.is_finite() || group.area_weight <= 0.0 {
            group.area_weight = epsilon;
        }
        distribute_leaf_weights(group, epsilon);
    }
}

/// Split a group's weight among its leaves: `base_i = max(ε, v_i − min + ε)`,
/// scaled so the bases sum exactly to the group weight. A single-leaf group
/// degenerates to that leaf; all-equal leaves split evenly.
fn distribute_leaf_weights(group: &mut Group, epsilon: f64) {
    if group.leaves.is_empty() {
        return;
    }

    let min_value = group
        .leaves
        .iter()
        .map(|l| l.value)
        .fold(f64::INFINITY, f64::min);

    let bases: Vec<f64> = group
        .leaves
        .iter()
        .map(|l| (l.value - min_value + epsilon).max(epsilon))
        .collect();
    let total: f64 = bases.iter().sum();

    for (leaf, base) in group.leaves.iter_mut().zip(bases) {
        leaf.area_weight = base * group.area_weight / total;
    }
}
