//! Log-dampened popularity, the system-wide fallback ranking signal

use crate::{is_valid_rating, Catalog, Interaction};
use ahash::AHashMap;
use serde::Serialize;
use std::cmp::Ordering;

/// `avg_rating * ln(1 + review_count)`
#[inline]
pub fn popularity_score(avg_rating: f64, review_count: u64) -> f64 {
    avg_rating * (review_count as f64).ln_1p()
}

#[inline]
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Aggregated rating statistics for one item
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemStats {
    pub item_id: String,
    pub avg_rating: f64,
    pub review_count: u64,
    pub popularity_score: f64,
}

impl ItemStats {
    pub fn new(item_id: impl Into<String>, avg_rating: f64, review_count: u64) -> Self {
        Self {
            item_id: item_id.into(),
            avg_rating,
            review_count,
            popularity_score: popularity_score(avg_rating, review_count),
        }
    }
}

/// Per-item stats from raw review records. The mean is rounded to two
/// decimals before scoring.
pub fn stats_from_interactions(interactions: &[Interaction]) -> Vec<ItemStats> {
    let mut sums: AHashMap<&str, (f64, u64)> = AHashMap::new();
    for record in interactions.iter().filter(|r| is_valid_rating(r.rating)) {
        let entry = sums.entry(record.item_id.as_str()).or_insert((0.0, 0));
        entry.0 += record.rating;
        entry.1 += 1;
    }

    sums.into_iter()
        .map(|(item, (sum, count))| ItemStats::new(item, round2(sum / count as f64), count))
        .collect()
}

/// Per-item stats from the catalog's aggregate columns
pub fn stats_from_catalog(catalog: &Catalog) -> Vec<ItemStats> {
    catalog
        .products()
        .iter()
        .filter(|p| !p.asin.is_empty())
        .map(|p| ItemStats::new(p.asin.clone(), round2(p.avg_rating), p.total_reviews))
        .collect()
}

/// Popularity order: score descending, then review count descending, then
/// item id ascending
pub fn popularity_order(a: &ItemStats, b: &ItemStats) -> Ordering {
    b.popularity_score
        .partial_cmp(&a.popularity_score)
        .unwrap_or(Ordering::Equal)
        .then_with(|| b.review_count.cmp(&a.review_count))
        .then_with(|| a.item_id.cmp(&b.item_id))
}

/// Sort stats into popularity order in place
pub fn rank_by_popularity(stats: &mut [ItemStats]) {
    stats.sort_by(popularity_order);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_popularity_score_formula() {
        assert_eq!(popularity_score(4.0, 0), 0.0);
        assert!((popularity_score(4.0, 9) - 4.0 * 10f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn test_stats_from_interactions_rounds_mean() {
        let records = vec![
            Interaction::new("u1", "a", 5.0),
            Interaction::new("u2", "a", 4.0),
            Interaction::new("u3", "a", 4.0),
            Interaction::new("u4", "a", f64::NAN),
        ];
        let stats = stats_from_interactions(&records);
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].avg_rating, 4.33);
        assert_eq!(stats[0].review_count, 3);
    }

    #[test]
    fn test_rank_ties_break_on_count_then_id() {
        let mut stats = vec![
            ItemStats::new("b", 5.0, 3),
            ItemStats::new("a", 5.0, 3),
            ItemStats::new("c", 5.0, 10),
            ItemStats {
                item_id: "d".into(),
                avg_rating: 1.0,
                review_count: 20,
                popularity_score: 5.0 * 4f64.ln(),
            },
        ];
        rank_by_popularity(&mut stats);
        let order: Vec<&str> = stats.iter().map(|s| s.item_id.as_str()).collect();
        // "d" ties with a/b on score but has more reviews
        assert_eq!(order, vec!["c", "d", "a", "b"]);
    }
}
