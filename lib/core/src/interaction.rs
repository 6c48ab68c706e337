//! User × item rating matrix
//!
//! Built once per load from raw interaction records. Absent `(user, item)`
//! pairs are never stored; zero-filling only happens inside the similarity
//! kernels.

use crate::{Error, Result, SparseVector};
use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Minimum observed entries per user and per item unless configured otherwise
pub const DEFAULT_MIN_INTERACTIONS: usize = 5;

pub const MIN_RATING: f64 = 1.0;
pub const MAX_RATING: f64 = 5.0;

/// One (user, item, rating) observation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Interaction {
    pub user_id: String,
    pub item_id: String,
    pub rating: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl Interaction {
    pub fn new(user_id: impl Into<String>, item_id: impl Into<String>, rating: f64) -> Self {
        Self {
            user_id: user_id.into(),
            item_id: item_id.into(),
            rating,
            timestamp: None,
        }
    }

    #[must_use]
    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
}

/// True for finite ratings inside the 1..=5 star range
#[inline]
pub fn is_valid_rating(rating: f64) -> bool {
    rating.is_finite() && (MIN_RATING..=MAX_RATING).contains(&rating)
}

/// Clamp a predicted rating into the star range
#[inline]
pub fn clamp_rating(rating: f64) -> f64 {
    rating.clamp(MIN_RATING, MAX_RATING)
}

struct Kept {
    rating: f64,
    timestamp: Option<i64>,
}

/// Sparse user × item rating matrix.
///
/// Rows are users and columns are items, both in ascending id order. The
/// density filter runs once: users and items below `min_interactions` are
/// dropped together, and the survivors are not re-checked afterwards. A user
/// that qualified only thanks to items removed in the same pass can therefore
/// keep fewer than `min_interactions` entries.
#[derive(Debug, Clone)]
pub struct InteractionMatrix {
    users: Vec<String>,
    items: Vec<String>,
    user_index: AHashMap<String, usize>,
    item_index: AHashMap<String, usize>,
    rows: Vec<SparseVector>,
    cols: Vec<SparseVector>,
    min_interactions: usize,
}

impl InteractionMatrix {
    /// Build the matrix from raw records.
    ///
    /// Malformed ratings are skipped with a warning. Duplicate `(user, item)`
    /// pairs keep the latest record when both carry a timestamp, otherwise the
    /// first one seen. Returns [`Error::EmptyMatrix`] when no user or no item
    /// survives the density filter.
    pub fn build(interactions: &[Interaction], min_interactions: usize) -> Result<Self> {
        let mut kept: AHashMap<(&str, &str), Kept> = AHashMap::new();
        let mut skipped = 0usize;

        for record in interactions {
            if !is_valid_rating(record.rating) {
                warn!(
                    "Skipping interaction {}/{} with malformed rating {}",
                    record.user_id, record.item_id, record.rating
                );
                skipped += 1;
                continue;
            }

            let key = (record.user_id.as_str(), record.item_id.as_str());
            match kept.get_mut(&key) {
                Some(existing) => {
                    if let (Some(old), Some(new)) = (existing.timestamp, record.timestamp) {
                        if new > old {
                            existing.rating = record.rating;
                            existing.timestamp = record.timestamp;
                        }
                    }
                }
                None => {
                    kept.insert(
                        key,
                        Kept {
                            rating: record.rating,
                            timestamp: record.timestamp,
                        },
                    );
                }
            }
        }

        let mut user_counts: AHashMap<&str, usize> = AHashMap::new();
        let mut item_counts: AHashMap<&str, usize> = AHashMap::new();
        for (user, item) in kept.keys() {
            *user_counts.entry(*user).or_insert(0) += 1;
            *item_counts.entry(*item).or_insert(0) += 1;
        }

        let survivors: Vec<(&str, &str, f64)> = kept
            .iter()
            .filter(|((user, item), _)| {
                user_counts[user] >= min_interactions && item_counts[item] >= min_interactions
            })
            .map(|((user, item), k)| (*user, *item, k.rating))
            .collect();

        let mut users: Vec<String> = survivors
            .iter()
            .map(|(u, _, _)| *u)
            .collect::<AHashSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect();
        let mut items: Vec<String> = survivors
            .iter()
            .map(|(_, i, _)| *i)
            .collect::<AHashSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect();
        users.sort();
        items.sort();

        if users.is_empty() || items.is_empty() {
            warn!(
                "No users or items survived min_interactions={} ({} records)",
                min_interactions,
                interactions.len()
            );
            return Err(Error::EmptyMatrix {
                users: users.len(),
                items: items.len(),
            });
        }

        let user_index: AHashMap<String, usize> = users
            .iter()
            .enumerate()
            .map(|(i, u)| (u.clone(), i))
            .collect();
        let item_index: AHashMap<String, usize> = items
            .iter()
            .enumerate()
            .map(|(i, it)| (it.clone(), i))
            .collect();

        let mut row_entries: Vec<Vec<(usize, f64)>> = vec![Vec::new(); users.len()];
        let mut col_entries: Vec<Vec<(usize, f64)>> = vec![Vec::new(); items.len()];
        for (user, item, rating) in &survivors {
            let u = user_index[*user];
            let i = item_index[*item];
            row_entries[u].push((i, *rating));
            col_entries[i].push((u, *rating));
        }

        let matrix = Self {
            users,
            items,
            user_index,
            item_index,
            rows: row_entries.into_iter().map(SparseVector::new).collect(),
            cols: col_entries.into_iter().map(SparseVector::new).collect(),
            min_interactions,
        };

        info!(
            "Built matrix: {} users, {} items, {} ratings ({} skipped, min={})",
            matrix.n_users(),
            matrix.n_items(),
            matrix.nnz(),
            skipped,
            min_interactions
        );

        Ok(matrix)
    }

    /// `(users, items)`
    pub fn shape(&self) -> (usize, usize) {
        (self.users.len(), self.items.len())
    }

    pub fn n_users(&self) -> usize {
        self.users.len()
    }

    pub fn n_items(&self) -> usize {
        self.items.len()
    }

    /// Number of observed ratings
    pub fn nnz(&self) -> usize {
        self.rows.iter().map(SparseVector::nnz).sum()
    }

    pub fn density(&self) -> f64 {
        let cells = self.n_users() * self.n_items();
        if cells == 0 {
            0.0
        } else {
            self.nnz() as f64 / cells as f64
        }
    }

    pub fn min_interactions(&self) -> usize {
        self.min_interactions
    }

    pub fn users(&self) -> &[String] {
        &self.users
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }

    #[inline]
    pub fn user_idx(&self, user_id: &str) -> Option<usize> {
        self.user_index.get(user_id).copied()
    }

    #[inline]
    pub fn item_idx(&self, item_id: &str) -> Option<usize> {
        self.item_index.get(item_id).copied()
    }

    #[inline]
    pub fn user_id(&self, idx: usize) -> &str {
        &self.users[idx]
    }

    #[inline]
    pub fn item_id(&self, idx: usize) -> &str {
        &self.items[idx]
    }

    pub fn contains_user(&self, user_id: &str) -> bool {
        self.user_index.contains_key(user_id)
    }

    pub fn contains_item(&self, item_id: &str) -> bool {
        self.item_index.contains_key(item_id)
    }

    /// Ratings given by a user, indexed by item position
    #[inline]
    pub fn row(&self, user: usize) -> &SparseVector {
        &self.rows[user]
    }

    /// Ratings received by an item, indexed by user position
    #[inline]
    pub fn column(&self, item: usize) -> &SparseVector {
        &self.cols[item]
    }

    pub fn rows(&self) -> &[SparseVector] {
        &self.rows
    }

    pub fn columns(&self) -> &[SparseVector] {
        &self.cols
    }

    #[inline]
    pub fn rating(&self, user: usize, item: usize) -> Option<f64> {
        self.rows[user].get(item)
    }

    pub fn rating_by_id(&self, user_id: &str, item_id: &str) -> Option<f64> {
        let u = self.user_idx(user_id)?;
        let i = self.item_idx(item_id)?;
        self.rating(u, i)
    }

    /// Mean of a user's observed ratings. Every row holds at least one entry.
    #[inline]
    pub fn user_mean(&self, user: usize) -> f64 {
        self.rows[user].mean().unwrap_or(0.0)
    }

    /// Item positions the user rated at or above `threshold`
    pub fn liked_items(&self, user: usize, threshold: f64) -> Vec<usize> {
        self.rows[user]
            .iter()
            .filter(|(_, r)| *r >= threshold)
            .map(|(i, _)| i)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dense_dataset() -> Vec<Interaction> {
        let mut records = Vec::new();
        for u in 0..3 {
            for i in 0..3 {
                records.push(Interaction::new(format!("u{u}"), format!("i{i}"), 4.0));
            }
        }
        records
    }

    #[test]
    fn test_build_sorted_indices() {
        let records = vec![
            Interaction::new("bob", "B2", 4.0),
            Interaction::new("alice", "A1", 5.0),
            Interaction::new("alice", "B2", 3.0),
        ];
        let matrix = InteractionMatrix::build(&records, 1).unwrap();

        assert_eq!(matrix.users(), &["alice".to_string(), "bob".to_string()]);
        assert_eq!(matrix.items(), &["A1".to_string(), "B2".to_string()]);
        assert_eq!(matrix.shape(), (2, 2));
        assert_eq!(matrix.nnz(), 3);
        assert_eq!(matrix.rating_by_id("bob", "A1"), None);
        assert_eq!(matrix.rating_by_id("alice", "B2"), Some(3.0));
    }

    #[test]
    fn test_duplicate_keeps_latest_timestamp() {
        let records = vec![
            Interaction::new("u", "i", 2.0).with_timestamp(200),
            Interaction::new("u", "i", 5.0).with_timestamp(100),
            Interaction::new("u", "i", 4.0).with_timestamp(300),
        ];
        let matrix = InteractionMatrix::build(&records, 1).unwrap();
        assert_eq!(matrix.rating_by_id("u", "i"), Some(4.0));
    }

    #[test]
    fn test_duplicate_without_timestamp_keeps_first() {
        let records = vec![
            Interaction::new("u", "i", 2.0),
            Interaction::new("u", "i", 5.0).with_timestamp(100),
        ];
        let matrix = InteractionMatrix::build(&records, 1).unwrap();
        assert_eq!(matrix.rating_by_id("u", "i"), Some(2.0));
    }

    #[test]
    fn test_malformed_ratings_are_skipped() {
        let records = vec![
            Interaction::new("u", "i", f64::NAN),
            Interaction::new("u", "j", 0.0),
            Interaction::new("u", "k", 3.0),
        ];
        let matrix = InteractionMatrix::build(&records, 1).unwrap();
        assert_eq!(matrix.nnz(), 1);
        assert!(matrix.contains_item("k"));
        assert!(!matrix.contains_item("i"));
    }

    #[test]
    fn test_density_filter() {
        let mut records = dense_dataset();
        // A sparse user and a sparse item fall below the threshold of 3
        records.push(Interaction::new("lonely", "i0", 5.0));
        records.push(Interaction::new("u0", "rare", 5.0));

        let matrix = InteractionMatrix::build(&records, 3).unwrap();
        assert_eq!(matrix.shape(), (3, 3));
        assert!(!matrix.contains_user("lonely"));
        assert!(!matrix.contains_item("rare"));

        for u in 0..matrix.n_users() {
            assert!(matrix.row(u).nnz() >= 3);
        }
        for i in 0..matrix.n_items() {
            assert!(matrix.column(i).nnz() >= 3);
        }
    }

    #[test]
    fn test_filter_is_single_pass() {
        // "u" qualifies with two ratings, but one of them is on an item that
        // is dropped in the same pass; "u" is kept with a single entry.
        let records = vec![
            Interaction::new("u", "popular", 5.0),
            Interaction::new("u", "rare", 5.0),
            Interaction::new("v", "popular", 4.0),
            Interaction::new("v", "other", 4.0),
            Interaction::new("w", "other", 3.0),
            Interaction::new("w", "popular", 3.0),
        ];
        let matrix = InteractionMatrix::build(&records, 2).unwrap();
        assert!(!matrix.contains_item("rare"));
        let u = matrix.user_idx("u").unwrap();
        assert_eq!(matrix.row(u).nnz(), 1);
    }

    #[test]
    fn test_empty_matrix_error() {
        let records = vec![Interaction::new("u", "i", 5.0)];
        let err = InteractionMatrix::build(&records, 5).unwrap_err();
        assert!(matches!(err, Error::EmptyMatrix { users: 0, items: 0 }));
    }

    #[test]
    fn test_user_mean_and_liked() {
        let records = vec![
            Interaction::new("u", "a", 5.0),
            Interaction::new("u", "b", 2.0),
            Interaction::new("u", "c", 4.0),
        ];
        let matrix = InteractionMatrix::build(&records, 1).unwrap();
        let u = matrix.user_idx("u").unwrap();
        assert!((matrix.user_mean(u) - 11.0 / 3.0).abs() < 1e-9);
        let liked: Vec<&str> = matrix
            .liked_items(u, 4.0)
            .into_iter()
            .map(|i| matrix.item_id(i))
            .collect();
        assert_eq!(liked, vec!["a", "c"]);
    }
}
