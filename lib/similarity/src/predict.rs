//! Neighbor-weighted rating prediction
//!
//! Both predictors are pure: they read the interaction and similarity
//! matrices and never mutate them, so they can be called concurrently for
//! different `(user, item)` pairs. `None` means no neighbor contributed and
//! the caller should fall back.

use crate::matrix::SimilarityMatrix;
use crate::metric::Axis;
use snaprec_core::{clamp_rating, Error, InteractionMatrix, Result};

/// One similar user's rating of the target item
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NeighborRating {
    pub similarity: f64,
    pub rating: f64,
    /// The neighbor's mean over all of their ratings
    pub mean: f64,
}

/// User-based aggregation.
///
/// `target_mean + Σ sim · (rating − neighbor_mean) / Σ |sim|`, clamped to the
/// star range. Neighbors with negative similarity do contribute.
pub fn predict_user_based(
    target_mean: f64,
    neighbors: impl IntoIterator<Item = NeighborRating>,
) -> Option<f64> {
    let mut numerator = 0.0;
    let mut denominator = 0.0;

    for n in neighbors {
        numerator += n.similarity * (n.rating - n.mean);
        denominator += n.similarity.abs();
    }

    if denominator == 0.0 {
        return None;
    }

    Some(clamp_rating(target_mean + numerator / denominator))
}

/// Item-based aggregation over `(similarity, rating)` pairs of the items the
/// user already rated.
///
/// Only strictly positive similarities contribute, and the result is not
/// re-centered on the user's mean.
pub fn predict_item_based(rated: impl IntoIterator<Item = (f64, f64)>) -> Option<f64> {
    let mut numerator = 0.0;
    let mut denominator = 0.0;

    for (similarity, rating) in rated {
        if similarity > 0.0 {
            numerator += similarity * rating;
            denominator += similarity.abs();
        }
    }

    if denominator == 0.0 {
        return None;
    }

    Some(clamp_rating(numerator / denominator))
}

/// Predict a rating for a `(user, item)` position pair
pub trait RatingPredictor {
    fn predict(&self, user: usize, item: usize) -> Option<f64>;
}

/// User-based predictor bound to a matrix and its user-user similarities
#[derive(Debug, Clone, Copy)]
pub struct UserBasedPredictor<'a> {
    matrix: &'a InteractionMatrix,
    similarity: &'a SimilarityMatrix,
    neighbors: usize,
}

impl<'a> UserBasedPredictor<'a> {
    pub fn new(
        matrix: &'a InteractionMatrix,
        similarity: &'a SimilarityMatrix,
        neighbors: usize,
    ) -> Result<Self> {
        if similarity.axis() != Axis::User {
            return Err(Error::InvalidParameter(format!(
                "user-based prediction needs user similarities, got {}",
                similarity.axis()
            )));
        }
        Ok(Self {
            matrix,
            similarity,
            neighbors,
        })
    }

    /// The configured number of most similar users
    pub fn neighbors_of(&self, user: usize) -> Vec<(usize, f64)> {
        self.similarity.top_k_by_index(user, self.neighbors)
    }

    /// Predict with a precomputed neighbor list, reused across items
    pub fn predict_with_neighbors(
        &self,
        user: usize,
        item: usize,
        neighbors: &[(usize, f64)],
    ) -> Option<f64> {
        let contributions = neighbors.iter().filter_map(|&(n, similarity)| {
            self.matrix.rating(n, item).map(|rating| NeighborRating {
                similarity,
                rating,
                mean: self.matrix.user_mean(n),
            })
        });
        predict_user_based(self.matrix.user_mean(user), contributions)
    }
}

impl RatingPredictor for UserBasedPredictor<'_> {
    fn predict(&self, user: usize, item: usize) -> Option<f64> {
        let neighbors = self.neighbors_of(user);
        self.predict_with_neighbors(user, item, &neighbors)
    }
}

/// Item-based predictor bound to a matrix and its item-item similarities
#[derive(Debug, Clone, Copy)]
pub struct ItemBasedPredictor<'a> {
    matrix: &'a InteractionMatrix,
    similarity: &'a SimilarityMatrix,
}

impl<'a> ItemBasedPredictor<'a> {
    pub fn new(matrix: &'a InteractionMatrix, similarity: &'a SimilarityMatrix) -> Result<Self> {
        if similarity.axis() != Axis::Item {
            return Err(Error::InvalidParameter(format!(
                "item-based prediction needs item similarities, got {}",
                similarity.axis()
            )));
        }
        Ok(Self { matrix, similarity })
    }
}

impl RatingPredictor for ItemBasedPredictor<'_> {
    fn predict(&self, user: usize, item: usize) -> Option<f64> {
        let row = self.similarity.row(item);
        predict_item_based(
            self.matrix
                .row(user)
                .iter()
                .map(|(rated, rating)| (row[rated], rating)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metric::SimilarityMetric;
    use snaprec_core::Interaction;

    fn neighbor(similarity: f64, rating: f64, mean: f64) -> NeighborRating {
        NeighborRating {
            similarity,
            rating,
            mean,
        }
    }

    #[test]
    fn test_user_based_bias_correction() {
        let neighbors = vec![
            neighbor(0.8, 5.0, 4.0),
            neighbor(0.2, 2.0, 3.0),
        ];
        // 3.0 + (0.8 * 1.0 + 0.2 * -1.0) / 1.0
        let predicted = predict_user_based(3.0, neighbors).unwrap();
        assert!((predicted - 3.6).abs() < 1e-12);
    }

    #[test]
    fn test_user_based_negative_similarity_counts() {
        let neighbors = vec![neighbor(-0.5, 1.0, 3.0)];
        // 3.0 + (-0.5 * -2.0) / 0.5
        let predicted = predict_user_based(3.0, neighbors).unwrap();
        assert!((predicted - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_user_based_is_clamped() {
        let neighbors = vec![neighbor(1.0, 5.0, 1.0)];
        assert_eq!(predict_user_based(4.5, neighbors), Some(5.0));

        let neighbors = vec![neighbor(1.0, 1.0, 5.0)];
        assert_eq!(predict_user_based(2.0, neighbors), Some(1.0));
    }

    #[test]
    fn test_user_based_without_contributions_is_none() {
        assert_eq!(predict_user_based(3.0, Vec::new()), None);
        let zero = vec![neighbor(0.0, 4.0, 3.0)];
        assert_eq!(predict_user_based(3.0, zero), None);
    }

    #[test]
    fn test_item_based_uses_positive_similarity_only() {
        let predicted = predict_item_based(vec![(0.5, 4.0), (0.5, 2.0), (-0.9, 5.0)]).unwrap();
        assert!((predicted - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_item_based_only_negative_is_none() {
        assert_eq!(predict_item_based(vec![(-0.4, 5.0)]), None);
        assert_eq!(predict_item_based(vec![(0.0, 5.0)]), None);
    }

    #[test]
    fn test_item_predictor_with_negative_neighbor_returns_none() {
        // "x" and "y" are anti-correlated once user bias is removed; "u" only rated "x"
        let records = vec![
            Interaction::new("a", "x", 5.0),
            Interaction::new("a", "y", 1.0),
            Interaction::new("b", "x", 4.0),
            Interaction::new("b", "y", 2.0),
            Interaction::new("u", "x", 4.0),
        ];
        let matrix = InteractionMatrix::build(&records, 1).unwrap();
        let sim = SimilarityMatrix::compute(&matrix, Axis::Item, SimilarityMetric::AdjustedCosine);
        assert!(sim.get("x", "y").unwrap() < 0.0);

        let predictor = ItemBasedPredictor::new(&matrix, &sim).unwrap();
        let u = matrix.user_idx("u").unwrap();
        let y = matrix.item_idx("y").unwrap();
        assert_eq!(predictor.predict(u, y), None);
    }

    #[test]
    fn test_user_predictor_end_to_end() {
        let records = vec![
            Interaction::new("t", "a", 4.0),
            Interaction::new("t", "b", 2.0),
            Interaction::new("n", "a", 5.0),
            Interaction::new("n", "b", 3.0),
            Interaction::new("n", "c", 5.0),
        ];
        let matrix = InteractionMatrix::build(&records, 1).unwrap();
        let sim = SimilarityMatrix::compute(&matrix, Axis::User, SimilarityMetric::Cosine);
        let predictor = UserBasedPredictor::new(&matrix, &sim, 10).unwrap();

        let t = matrix.user_idx("t").unwrap();
        let c = matrix.item_idx("c").unwrap();
        // t mean 3.0, n mean 13/3, single neighbor: 3 + (5 - 13/3)
        let predicted = predictor.predict(t, c).unwrap();
        assert!((predicted - (3.0 + 5.0 - 13.0 / 3.0)).abs() < 1e-9);
    }

    #[test]
    fn test_predictor_rejects_wrong_axis() {
        let records = vec![Interaction::new("u", "i", 4.0)];
        let matrix = InteractionMatrix::build(&records, 1).unwrap();
        let items = SimilarityMatrix::compute(&matrix, Axis::Item, SimilarityMetric::Cosine);
        assert!(UserBasedPredictor::new(&matrix, &items, 5).is_err());
    }
}
