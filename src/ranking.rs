//! Per-year ranking of entities by one index, and the reshaping that feeds
//! the rank-trajectory ("bump") chart.
//!
//! The tie-break rule is load-bearing: rows with equal values rank in input
//! order (first occurrence wins the lower rank), so the output matches the
//! published reference tables exactly. A stable descending sort gives that
//! for free.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::data::{IndexTable, Metric};

/// One entity's position in one year's ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedEntry {
    pub entity: String,
    pub year: i32,
    pub value: f64,
    pub rank: u32,
}

/// Rank entities within each year by `metric`, descending, and keep the top
/// `k` per year. Ranks are 1-based and contiguous within a year; a year with
/// fewer than `k` rows yields fewer entries, never padding. Output is sorted
/// by (entity, year) for trajectory rendering.
pub fn rank_top_k(table: &IndexTable, metric: Metric, k: usize) -> Vec<RankedEntry> {
    let mut by_year: BTreeMap<i32, Vec<(usize, &str, f64)>> = BTreeMap::new();
    for (idx, row) in table.rows.iter().enumerate() {
        by_year
            .entry(row.year)
            .or_default()
            .push((idx, row.entity.as_str(), metric.value(row)));
    }

    let mut out = Vec::new();
    for (year, mut group) in by_year {
        // Stable sort: equal values keep input order, so the earlier row
        // takes the lower rank. NaN compares as equal and stays in place.
        group.sort_by(|a, b| b.2.partial_cmp(&a.2).unwrap_or(Ordering::Equal));
        for (pos, (_, entity, value)) in group.into_iter().take(k).enumerate() {
            out.push(RankedEntry {
                entity: entity.to_string(),
                year,
                value,
                rank: (pos + 1) as u32,
            });
        }
    }

    out.sort_by(|a, b| (a.entity.as_str(), a.year).cmp(&(b.entity.as_str(), b.year)));
    out
}

/// One entity's ranked years, split into runs of consecutive years.
///
/// An entity that drops out of the top k and comes back gets one segment per
/// run; the renderer draws each segment as its own line so nothing is
/// interpolated across the gap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    pub entity: String,
    pub segments: Vec<Vec<RankedEntry>>,
}

/// Group (entity, year)-sorted entries into per-entity trajectories.
pub fn trajectories(entries: &[RankedEntry]) -> Vec<Trajectory> {
    let mut out: Vec<Trajectory> = Vec::new();
    for entry in entries {
        let needs_new_entity = out.last().map(|t| t.entity != entry.entity).unwrap_or(true);
        if needs_new_entity {
            out.push(Trajectory {
                entity: entry.entity.clone(),
                segments: vec![vec![entry.clone()]],
            });
            continue;
        }
        let trajectory = out.last_mut().expect("just checked non-empty");
        let segment = trajectory.segments.last_mut().expect("segments non-empty");
        let prev_year = segment.last().expect("segment non-empty").year;
        if entry.year == prev_year + 1 {
            segment.push(entry.clone());
        } else {
            trajectory.segments.push(vec![entry.clone()]);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::IndexRecord;

    fn row(entity: &str, year: i32, ccii: f64) -> IndexRecord {
        IndexRecord {
            entity: entity.to_string(),
            year,
            ccii,
            gwe: 0.0,
            gwghg: 0.0,
        }
    }

    fn table(rows: Vec<IndexRecord>) -> IndexTable {
        IndexTable {
            entity_column: "country".to_string(),
            rows,
        }
    }

    #[test]
    fn test_ties_rank_in_input_order() {
        // A and B share the top value; A appears first and must take rank 1.
        let t = table(vec![
            row("A", 2020, 5.0),
            row("B", 2020, 5.0),
            row("C", 2020, 3.0),
        ]);
        let ranked = rank_top_k(&t, Metric::Ccii, 10);
        let by_entity: Vec<(&str, u32)> =
            ranked.iter().map(|e| (e.entity.as_str(), e.rank)).collect();
        assert_eq!(by_entity, vec![("A", 1), ("B", 2), ("C", 3)]);
    }

    #[test]
    fn test_ranks_contiguous_from_one() {
        let t = table(vec![
            row("A", 2020, 1.0),
            row("B", 2020, 9.0),
            row("C", 2020, 4.0),
            row("D", 2021, 2.0),
            row("E", 2021, 7.0),
        ]);
        let ranked = rank_top_k(&t, Metric::Ccii, 10);
        for year in [2020, 2021] {
            let mut ranks: Vec<u32> = ranked
                .iter()
                .filter(|e| e.year == year)
                .map(|e| e.rank)
                .collect();
            ranks.sort_unstable();
            let expect: Vec<u32> = (1..=ranks.len() as u32).collect();
            assert_eq!(ranks, expect, "year {}", year);
        }
    }

    #[test]
    fn test_top_k_cuts_below_k() {
        let t = table(vec![
            row("A", 2020, 1.0),
            row("B", 2020, 2.0),
            row("C", 2020, 3.0),
            row("D", 2020, 4.0),
        ]);
        let ranked = rank_top_k(&t, Metric::Ccii, 2);
        assert_eq!(ranked.len(), 2);
        assert!(ranked.iter().all(|e| e.rank <= 2));
        assert!(ranked.iter().any(|e| e.entity == "D" && e.rank == 1));
        assert!(ranked.iter().any(|e| e.entity == "C" && e.rank == 2));
    }

    #[test]
    fn test_short_year_yields_short_group() {
        let t = table(vec![row("A", 2020, 1.0), row("B", 2021, 1.0), row("C", 2021, 2.0)]);
        let ranked = rank_top_k(&t, Metric::Ccii, 10);
        assert_eq!(ranked.iter().filter(|e| e.year == 2020).count(), 1);
        assert_eq!(ranked.iter().filter(|e| e.year == 2021).count(), 2);
    }

    #[test]
    fn test_output_sorted_by_entity_then_year() {
        let t = table(vec![
            row("B", 2021, 1.0),
            row("A", 2021, 2.0),
            row("B", 2020, 1.0),
            row("A", 2020, 2.0),
        ]);
        let ranked = rank_top_k(&t, Metric::Ccii, 10);
        let keys: Vec<(&str, i32)> = ranked.iter().map(|e| (e.entity.as_str(), e.year)).collect();
        assert_eq!(
            keys,
            vec![("A", 2020), ("A", 2021), ("B", 2020), ("B", 2021)]
        );
    }

    #[test]
    fn test_deterministic_across_runs() {
        let t = table(vec![
            row("A", 2020, 5.0),
            row("B", 2020, 5.0),
            row("C", 2020, 5.0),
        ]);
        let first = rank_top_k(&t, Metric::Ccii, 10);
        for _ in 0..10 {
            assert_eq!(rank_top_k(&t, Metric::Ccii, 10), first);
        }
    }

    #[test]
    fn test_trajectory_splits_at_year_gap() {
        // B is ranked in 2019 and 2021 but not 2020: two segments.
        let t = table(vec![
            row("A", 2019, 9.0),
            row("B", 2019, 8.0),
            row("A", 2020, 9.0),
            row("C", 2020, 8.0),
            row("A", 2021, 9.0),
            row("B", 2021, 8.0),
        ]);
        let ranked = rank_top_k(&t, Metric::Ccii, 2);
        let trajs = trajectories(&ranked);

        let a = trajs.iter().find(|t| t.entity == "A").unwrap();
        assert_eq!(a.segments.len(), 1);
        assert_eq!(a.segments[0].len(), 3);

        let b = trajs.iter().find(|t| t.entity == "B").unwrap();
        assert_eq!(b.segments.len(), 2);
        assert_eq!(b.segments[0][0].year, 2019);
        assert_eq!(b.segments[1][0].year, 2021);
    }

    #[test]
    fn test_empty_table_ranks_to_nothing() {
        let t = table(vec![]);
        assert!(rank_top_k(&t, Metric::Gwe, 10).is_empty());
        assert!(trajectories(&[]).is_empty());
    }
}
