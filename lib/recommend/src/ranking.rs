//! Ordering rules shared by every list the recommender returns

use crate::records::ScoredItem;
use ahash::AHashSet;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use snaprec_core::popularity::popularity_order;
use snaprec_core::{Catalog, ItemStats};
use std::cmp::Ordering;

/// Sort predictions by score descending, then catalog review count
/// descending, then item id ascending, and keep the first `n`.
pub fn rank_predictions(
    mut items: Vec<ScoredItem>,
    catalog: &Catalog,
    n: usize,
) -> Vec<ScoredItem> {
    items.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| catalog.review_count(&b.item_id).cmp(&catalog.review_count(&a.item_id)))
            .then_with(|| a.item_id.cmp(&b.item_id))
    });
    items.truncate(n);
    items
}

/// Merge two ranked lists keeping the higher score per item
pub fn merge_max(first: Vec<ScoredItem>, second: Vec<ScoredItem>) -> Vec<ScoredItem> {
    let mut merged: Vec<ScoredItem> = Vec::with_capacity(first.len() + second.len());
    for item in first.into_iter().chain(second) {
        match merged.iter_mut().find(|m| m.item_id == item.item_id) {
            Some(existing) => {
                if item.score > existing.score {
                    existing.score = item.score;
                }
            }
            None => merged.push(item),
        }
    }
    merged
}

/// Popularity entries expressed as predictions: the item's mean rating is
/// the score, the list keeps popularity order.
pub fn popularity_as_predictions(ranked: &[ItemStats], n: usize) -> Vec<ScoredItem> {
    ranked
        .iter()
        .take(n)
        .map(|s| ScoredItem::new(s.item_id.clone(), s.avg_rating))
        .collect()
}

/// Category-diversified popularity list.
///
/// `ranked` must already be in popularity order. Each category contributes
/// `ceil(n / k)` items drawn at random from its `2 * per` most popular
/// ones; categories are interleaved in order of their best item. Without any
/// category metadata this is the plain top `n`.
pub fn diversified_by_category(
    ranked: &[ItemStats],
    catalog: &Catalog,
    n: usize,
    seed: u64,
) -> Vec<ItemStats> {
    let mut groups: Vec<(&str, Vec<&ItemStats>)> = Vec::new();
    for stats in ranked {
        let Some(category) = catalog.category_of(&stats.item_id) else {
            continue;
        };
        match groups.iter_mut().find(|(name, _)| *name == category) {
            Some((_, members)) => members.push(stats),
            None => groups.push((category, vec![stats])),
        }
    }

    if groups.is_empty() || n == 0 {
        return ranked.iter().take(n).cloned().collect();
    }

    let per = n.div_ceil(groups.len());
    let mut rng = StdRng::seed_from_u64(seed);

    let picks: Vec<Vec<&ItemStats>> = groups
        .into_iter()
        .map(|(_, members)| {
            let tier_len = members.len().min(2 * per);
            let mut tier = members[..tier_len].to_vec();
            tier.shuffle(&mut rng);
            tier.truncate(per);
            tier.sort_by(|a, b| popularity_order(a, b));
            tier
        })
        .collect();

    let mut out = Vec::with_capacity(n);
    'rounds: for round in 0..per {
        for group in &picks {
            if let Some(stats) = group.get(round) {
                out.push((*stats).clone());
                if out.len() == n {
                    break 'rounds;
                }
            }
        }
    }

    // Small categories leave gaps; fill them in popularity order.
    if out.len() < n {
        let taken: AHashSet<String> = out.iter().map(|s| s.item_id.clone()).collect();
        let rest: Vec<ItemStats> = ranked
            .iter()
            .filter(|s| catalog.category_of(&s.item_id).is_some())
            .filter(|s| !taken.contains(&s.item_id))
            .take(n - out.len())
            .cloned()
            .collect();
        out.extend(rest);
    }
    out
}
