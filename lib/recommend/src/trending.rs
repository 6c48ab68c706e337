//! Trending items: popularity restricted to a recent review window

use crate::records::{ItemDetails, TrendingRecord};
use ahash::AHashMap;
use snaprec_core::{is_valid_rating, popularity_score, Catalog, Interaction, ItemStats};
use std::cmp::Ordering;
use tracing::debug;

const SECONDS_PER_DAY: i64 = 86_400;

fn in_category(catalog: &Catalog, item_id: &str, category: Option<&str>) -> bool {
    match category {
        None => true,
        Some(wanted) => catalog
            .category_of(item_id)
            .is_some_and(|c| c.eq_ignore_ascii_case(wanted)),
    }
}

/// Score items by `mean_recent_rating * ln(1 + recent_count)` over the
/// reviews dated within `window_days` of the newest review.
///
/// When no review carries a timestamp the ranking degrades to `popularity`,
/// which must already be in popularity order.
pub fn trending(
    reviews: &[Interaction],
    popularity: &[ItemStats],
    catalog: &Catalog,
    category: Option<&str>,
    window_days: u32,
    n: usize,
) -> Vec<TrendingRecord> {
    let Some(newest) = reviews.iter().filter_map(|r| r.timestamp).max() else {
        debug!("No review timestamps, trending falls back to popularity");
        return popularity
            .iter()
            .filter(|s| in_category(catalog, &s.item_id, category))
            .take(n)
            .map(|s| TrendingRecord {
                item_id: s.item_id.clone(),
                trending_score: s.popularity_score,
                recent_reviews: s.review_count,
                recent_avg_rating: s.avg_rating,
                details: ItemDetails::lookup(catalog, &s.item_id),
            })
            .collect();
    };

    let cutoff = newest - i64::from(window_days) * SECONDS_PER_DAY;
    let mut recent: AHashMap<&str, (f64, u64)> = AHashMap::new();
    for review in reviews {
        let Some(ts) = review.timestamp else { continue };
        if ts < cutoff || !is_valid_rating(review.rating) {
            continue;
        }
        if !in_category(catalog, &review.item_id, category) {
            continue;
        }
        let entry = recent.entry(review.item_id.as_str()).or_insert((0.0, 0));
        entry.0 += review.rating;
        entry.1 += 1;
    }

    let mut scored: Vec<(&str, f64, f64, u64)> = recent
        .into_iter()
        .map(|(item, (sum, count))| {
            let mean = sum / count as f64;
            (item, popularity_score(mean, count), mean, count)
        })
        .collect();
    scored.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(Ordering::Equal)
            .then_with(|| b.3.cmp(&a.3))
            .then_with(|| a.0.cmp(b.0))
    });

    scored
        .into_iter()
        .take(n)
        .map(|(item, score, mean, count)| TrendingRecord {
            item_id: item.to_string(),
            trending_score: score,
            recent_reviews: count,
            recent_avg_rating: mean,
            details: ItemDetails::lookup(catalog, item),
        })
        .collect()
}
