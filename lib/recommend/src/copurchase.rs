//! Co-purchase analysis
//!
//! Both directions are bounded: a user query looks at no more than
//! `item_cap` of the user's items and `user_cap` co-purchasers, a product
//! query follows no more than `item_cap` similar-product edges. High-degree
//! users and products therefore report partial counts.

use crate::records::{
    CoPurchaseNeighbor, CoPurchasedItem, CoPurchaser, ItemDetails, ProductCoPurchaseReport,
    UserCoPurchaseReport,
};
use ahash::{AHashMap, AHashSet};
use snaprec_core::{Catalog, InteractionMatrix};
use std::cmp::Reverse;

const TOP_CO_PURCHASERS: usize = 5;
const TOP_CO_PURCHASED_ITEMS: usize = 10;

/// Exploration caps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoPurchaseLimits {
    pub item_cap: usize,
    pub user_cap: usize,
}

/// Sort `(key, count)` pairs by count descending, key ascending
fn by_count<K: Ord>(counts: impl IntoIterator<Item = (K, u64)>) -> Vec<(K, u64)> {
    let mut sorted: Vec<(K, u64)> = counts.into_iter().collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    sorted
}

pub fn analyze_user(
    matrix: &InteractionMatrix,
    catalog: &Catalog,
    user: usize,
    limits: CoPurchaseLimits,
) -> UserCoPurchaseReport {
    let row = matrix.row(user);
    let explored: Vec<usize> = row.indices().iter().copied().take(limits.item_cap).collect();

    let mut co_purchasers: AHashMap<usize, u64> = AHashMap::new();
    for &item in &explored {
        for buyer in matrix.column(item).indices() {
            if *buyer != user {
                *co_purchasers.entry(*buyer).or_insert(0) += 1;
            }
        }
    }

    // Rank by count, ties on user id rather than row position
    let mut ranked: Vec<(usize, u64)> = co_purchasers.iter().map(|(&u, &c)| (u, c)).collect();
    ranked.sort_by_key(|&(u, c)| (Reverse(c), matrix.user_id(u)));

    let mut co_purchased: AHashMap<usize, u64> = AHashMap::new();
    for &(other, _) in ranked.iter().take(limits.user_cap) {
        for item in matrix.row(other).indices() {
            if !row.contains(*item) {
                *co_purchased.entry(*item).or_insert(0) += 1;
            }
        }
    }

    let co_purchased_items = by_count(
        co_purchased
            .into_iter()
            .map(|(item, count)| (matrix.item_id(item).to_string(), count)),
    )
    .into_iter()
    .take(TOP_CO_PURCHASED_ITEMS)
    .map(|(item_id, frequency)| CoPurchasedItem {
        details: ItemDetails::lookup(catalog, &item_id),
        item_id,
        co_purchase_frequency: frequency,
    })
    .collect();

    UserCoPurchaseReport {
        user_id: matrix.user_id(user).to_string(),
        total_purchases: row.nnz(),
        explored_items: explored.len(),
        co_purchasers_count: co_purchasers.len(),
        top_co_purchasers: ranked
            .iter()
            .take(TOP_CO_PURCHASERS)
            .map(|&(u, count)| CoPurchaser {
                user_id: matrix.user_id(u).to_string(),
                shared_items: count,
            })
            .collect(),
        co_purchased_items,
    }
}

/// Reviewer overlap between `product` and the products it was co-purchased
/// with. `reviewers` maps item id to its sorted, distinct reviewer ids.
pub fn analyze_product(
    catalog: &Catalog,
    reviewers: &AHashMap<String, Vec<String>>,
    product: &str,
    limits: CoPurchaseLimits,
) -> ProductCoPurchaseReport {
    let asin = catalog
        .get(product)
        .map(|p| p.asin.as_str())
        .filter(|a| !a.is_empty())
        .unwrap_or(product);
    let edges = catalog.similar_products(asin);
    let explored = &edges[..edges.len().min(limits.item_cap)];

    let empty: Vec<String> = Vec::new();
    let own: AHashSet<&str> = reviewers
        .get(asin)
        .unwrap_or(&empty)
        .iter()
        .map(String::as_str)
        .collect();

    let mut neighbor_union: AHashSet<&str> = AHashSet::new();
    let mut neighbors = Vec::with_capacity(explored.len());
    for similar in explored {
        let theirs = reviewers.get(similar).unwrap_or(&empty);
        let shared = theirs.iter().filter(|u| own.contains(u.as_str())).count();
        neighbor_union.extend(theirs.iter().map(String::as_str));
        neighbors.push(CoPurchaseNeighbor {
            item_id: similar.clone(),
            shared_reviewers: shared,
            details: ItemDetails::lookup(catalog, similar),
        });
    }

    let mut shared: Vec<&str> = own.intersection(&neighbor_union).copied().collect();
    shared.sort_unstable();

    ProductCoPurchaseReport {
        product_id: asin.to_string(),
        similar_count: edges.len(),
        explored_neighbors: explored.len(),
        product_reviewers: own.len(),
        neighbor_reviewers: neighbor_union.len(),
        shared_users_count: shared.len(),
        shared_users: shared
            .into_iter()
            .take(limits.user_cap)
            .map(str::to_string)
            .collect(),
        neighbors,
    }
}
