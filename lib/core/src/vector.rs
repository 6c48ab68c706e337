use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A sparse vector of observed values.
///
/// Positions that are not stored are implicit zeros. Indices are kept sorted
/// and unique so that pairwise operations can walk both vectors in one pass.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct SparseVector {
    indices: Vec<usize>,
    values: Vec<f64>,
}

impl SparseVector {
    /// Build from unordered `(index, value)` entries. Later duplicates of an
    /// index are ignored.
    #[must_use]
    pub fn new(mut entries: Vec<(usize, f64)>) -> Self {
        entries.sort_by_key(|(i, _)| *i);
        entries.dedup_by_key(|(i, _)| *i);
        let (indices, values) = entries.into_iter().unzip();
        Self { indices, values }
    }

    #[inline]
    #[must_use]
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    #[inline]
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.indices.iter().copied().zip(self.values.iter().copied())
    }

    /// Stored value at `index`, `None` when the position is absent
    #[inline]
    pub fn get(&self, index: usize) -> Option<f64> {
        self.indices
            .binary_search(&index)
            .ok()
            .map(|pos| self.values[pos])
    }

    #[inline]
    pub fn contains(&self, index: usize) -> bool {
        self.indices.binary_search(&index).is_ok()
    }

    #[inline]
    pub fn sum(&self) -> f64 {
        self.values.iter().sum()
    }

    /// Mean of the stored values only
    #[inline]
    pub fn mean(&self) -> Option<f64> {
        if self.values.is_empty() {
            None
        } else {
            Some(self.sum() / self.values.len() as f64)
        }
    }

    #[inline]
    pub fn squared_norm(&self) -> f64 {
        self.values.iter().map(|v| v * v).sum()
    }

    #[inline]
    pub fn norm(&self) -> f64 {
        self.squared_norm().sqrt()
    }

    /// Dot product; only positions stored in both vectors contribute
    pub fn dot(&self, other: &SparseVector) -> f64 {
        let mut acc = 0.0;
        self.walk_common(other, |a, b| acc += a * b);
        acc
    }

    /// Number of positions stored in both vectors
    pub fn overlap(&self, other: &SparseVector) -> usize {
        let mut count = 0;
        self.walk_common(other, |_, _| count += 1);
        count
    }

    /// Cosine similarity over the zero-filled vectors
    #[inline]
    pub fn cosine_similarity(&self, other: &SparseVector) -> f64 {
        let norm_a = self.norm();
        let norm_b = other.norm();

        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }

        self.dot(other) / (norm_a * norm_b)
    }

    /// Copy with every stored value mapped through `f`
    #[must_use]
    pub fn map_values(&self, f: impl Fn(f64) -> f64) -> Self {
        Self {
            indices: self.indices.clone(),
            values: self.values.iter().map(|v| f(*v)).collect(),
        }
    }

    fn walk_common(&self, other: &SparseVector, mut f: impl FnMut(f64, f64)) {
        let (mut i, mut j) = (0, 0);
        while i < self.indices.len() && j < other.indices.len() {
            match self.indices[i].cmp(&other.indices[j]) {
                Ordering::Less => i += 1,
                Ordering::Greater => j += 1,
                Ordering::Equal => {
                    f(self.values[i], other.values[j]);
                    i += 1;
                    j += 1;
                }
            }
        }
    }
}

impl FromIterator<(usize, f64)> for SparseVector {
    fn from_iter<T: IntoIterator<Item = (usize, f64)>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity() {
        let v1 = SparseVector::new(vec![(0, 1.0)]);
        let v2 = SparseVector::new(vec![(0, 1.0)]);
        assert!((v1.cosine_similarity(&v2) - 1.0).abs() < 1e-9);

        let v3 = SparseVector::new(vec![(0, 1.0)]);
        let v4 = SparseVector::new(vec![(1, 1.0)]);
        assert_eq!(v3.cosine_similarity(&v4), 0.0);
    }

    #[test]
    fn test_zero_norm_cosine_is_zero() {
        let empty = SparseVector::default();
        let v = SparseVector::new(vec![(2, 3.0)]);
        assert_eq!(empty.cosine_similarity(&v), 0.0);
    }

    #[test]
    fn test_entries_sorted_and_deduplicated() {
        let v = SparseVector::new(vec![(3, 1.0), (1, 2.0), (3, 9.0)]);
        assert_eq!(v.indices(), &[1, 3]);
        assert_eq!(v.get(3), Some(1.0));
        assert_eq!(v.get(2), None);
    }

    #[test]
    fn test_dot_and_overlap() {
        let a = SparseVector::new(vec![(0, 1.0), (2, 2.0), (5, 3.0)]);
        let b = SparseVector::new(vec![(2, 4.0), (5, 1.0), (7, 8.0)]);
        assert_eq!(a.dot(&b), 11.0);
        assert_eq!(a.overlap(&b), 2);
    }

    #[test]
    fn test_mean_of_stored_values() {
        let v = SparseVector::new(vec![(0, 5.0), (9, 3.0)]);
        assert_eq!(v.mean(), Some(4.0));
        assert_eq!(SparseVector::default().mean(), None);
    }
}
