//! Cross-dataset overlap checking.
//!
//! Matching is exact movie-id equality after each dataset's raw
//! identifiers have been normalized to the shared integer space by an
//! external mapping; this module only joins. The join builds from the
//! smallest set and probes the others, so the cost is linear in the
//! sum of the set sizes, and the report is invariant to the order the
//! datasets are passed in.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use chrono::Utc;
use tracing::info;

use mvf_models::{OverlapReport, PairwiseOverlap};

/// One dataset's id set under the shared identity space.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub name: String,
    pub ids: HashSet<u32>,
}

impl Dataset {
    /// Create a dataset from any id collection.
    pub fn new(name: impl Into<String>, ids: impl IntoIterator<Item = u32>) -> Self {
        Self {
            name: name.into(),
            ids: ids.into_iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Resolve movie identities across three datasets.
///
/// Produces the full three-way intersection, every pairwise
/// intersection (fusion needs the two-way sets for partial-modality
/// movies), and per-dataset counts. An empty intersection is an empty
/// report, not an error.
pub fn resolve(a: &Dataset, b: &Dataset, c: &Dataset) -> OverlapReport {
    let dataset_names = vec![a.name.clone(), b.name.clone(), c.name.clone()];

    let per_dataset_counts: BTreeMap<String, usize> = [a, b, c]
        .iter()
        .map(|d| (d.name.clone(), d.len()))
        .collect();

    // Probe from the smallest set so the three-way pass touches the
    // fewest candidate ids.
    let mut ordered = [a, b, c];
    ordered.sort_by_key(|d| d.len());
    let [smallest, mid, largest] = ordered;

    let matched_ids: BTreeSet<u32> = smallest
        .ids
        .iter()
        .filter(|id| mid.ids.contains(id) && largest.ids.contains(id))
        .copied()
        .collect();

    let pairwise = vec![
        pair_intersection(a, b),
        pair_intersection(a, c),
        pair_intersection(b, c),
    ];

    let matched_count = matched_ids.len();
    info!(
        datasets = ?dataset_names,
        matched_count,
        "Resolved dataset overlap"
    );

    OverlapReport {
        dataset_names,
        matched_ids,
        pairwise,
        per_dataset_counts,
        matched_count,
        generated_at: Utc::now(),
    }
}

/// Intersect one dataset pair, probing from the smaller side.
fn pair_intersection(x: &Dataset, y: &Dataset) -> PairwiseOverlap {
    let (small, large) = if x.len() <= y.len() { (x, y) } else { (y, x) };
    let ids: BTreeSet<u32> = small
        .ids
        .iter()
        .filter(|id| large.ids.contains(id))
        .copied()
        .collect();

    // Store names in lexicographic order so the entry does not depend
    // on input order.
    let (first, second) = if x.name <= y.name {
        (x.name.clone(), y.name.clone())
    } else {
        (y.name.clone(), x.name.clone())
    };

    PairwiseOverlap { first, second, ids }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn datasets() -> (Dataset, Dataset, Dataset) {
        (
            Dataset::new("scenesense", [1, 2, 3]),
            Dataset::new("mmtf", [2, 3, 4]),
            Dataset::new("movielens", [3, 4, 5]),
        )
    }

    #[test]
    fn test_three_way_and_pairwise_reference_scenario() {
        let (a, b, c) = datasets();
        let report = resolve(&a, &b, &c);

        assert_eq!(report.matched_ids, [3].into_iter().collect());
        assert_eq!(report.matched_count, 1);

        let ab = report.pair_between("scenesense", "mmtf").unwrap();
        assert_eq!(ab.ids, [2, 3].into_iter().collect());
        let bc = report.pair_between("mmtf", "movielens").unwrap();
        assert_eq!(bc.ids, [3, 4].into_iter().collect());
        let ac = report.pair_between("scenesense", "movielens").unwrap();
        assert_eq!(ac.ids, [3].into_iter().collect());
    }

    #[test]
    fn test_per_dataset_counts() {
        let (a, b, c) = datasets();
        let report = resolve(&a, &b, &c);
        assert_eq!(report.per_dataset_counts["scenesense"], 3);
        assert_eq!(report.per_dataset_counts["mmtf"], 3);
        assert_eq!(report.per_dataset_counts["movielens"], 3);
    }

    #[test]
    fn test_order_invariant() {
        let (a, b, c) = datasets();
        let forward = resolve(&a, &b, &c);
        let rotated = resolve(&c, &a, &b);
        let swapped = resolve(&b, &c, &a);

        for other in [&rotated, &swapped] {
            assert_eq!(forward.matched_ids, other.matched_ids);
            assert_eq!(forward.matched_count, other.matched_count);
            assert_eq!(forward.per_dataset_counts, other.per_dataset_counts);
            for pair in &forward.pairwise {
                let match_in_other = other
                    .pair_between(&pair.first, &pair.second)
                    .expect("pair present regardless of order");
                assert_eq!(pair.ids, match_in_other.ids);
            }
        }
    }

    #[test]
    fn test_disjoint_sets_yield_empty_report() {
        let a = Dataset::new("a", [1, 2]);
        let b = Dataset::new("b", [3, 4]);
        let c = Dataset::new("c", [5]);
        let report = resolve(&a, &b, &c);
        assert!(report.matched_ids.is_empty());
        assert_eq!(report.matched_count, 0);
        for pair in &report.pairwise {
            assert!(pair.ids.is_empty());
        }
    }

    #[test]
    fn test_empty_dataset_is_allowed() {
        let a = Dataset::new("a", []);
        let b = Dataset::new("b", [1]);
        let c = Dataset::new("c", [1]);
        let report = resolve(&a, &b, &c);
        assert!(report.matched_ids.is_empty());
        assert_eq!(report.pair_between("b", "c").unwrap().ids.len(), 1);
    }
}
