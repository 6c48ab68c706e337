//! Pairwise similarity kernels
//!
//! Every kernel compares two sparse vectors as if the absent positions were
//! zero. `dim` is the full length of the zero-filled vectors, needed by the
//! kernels whose value depends on the number of zeros (Pearson).
//! Degenerate inputs (zero norm, zero variance, empty union) score 0.

use snaprec_core::SparseVector;

/// Signature shared by all kernels: `(a, b, dim) -> score`
pub type Kernel = fn(&SparseVector, &SparseVector, usize) -> f64;

/// Cosine similarity of the zero-filled vectors
pub fn cosine(a: &SparseVector, b: &SparseVector, _dim: usize) -> f64 {
    a.cosine_similarity(b)
}

/// Pearson correlation of the zero-filled vectors
///
/// Computed from sparse sums: the implicit zeros still count toward the mean
/// and the variance.
pub fn pearson(a: &SparseVector, b: &SparseVector, dim: usize) -> f64 {
    if dim < 2 {
        return 0.0;
    }
    let n = dim as f64;
    let (sa, sb) = (a.sum(), b.sum());
    let (saa, sbb) = (a.squared_norm(), b.squared_norm());

    let cov = a.dot(b) - sa * sb / n;
    let var_a = saa - sa * sa / n;
    let var_b = sbb - sb * sb / n;

    if is_zero_variance(var_a, saa) || is_zero_variance(var_b, sbb) {
        return 0.0;
    }

    cov / (var_a * var_b).sqrt()
}

#[inline]
fn is_zero_variance(var: f64, squared_sum: f64) -> bool {
    var <= 1e-12 * squared_sum.max(1.0)
}

/// Jaccard index of the binarized vectors (value > 0 → 1)
///
/// An empty union uses a denominator of 1, so the score is 0.
pub fn jaccard(a: &SparseVector, b: &SparseVector, _dim: usize) -> f64 {
    let positive = |v: &SparseVector| -> SparseVector {
        v.iter()
            .filter(|(_, x)| *x > 0.0)
            .map(|(i, _)| (i, 1.0))
            .collect()
    };
    let (a, b) = (positive(a), positive(b));

    let intersection = a.overlap(&b);
    let union = a.nnz() + b.nnz() - intersection;
    let union = if union == 0 { 1 } else { union };

    intersection as f64 / union as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(entries: &[(usize, f64)]) -> SparseVector {
        SparseVector::new(entries.to_vec())
    }

    #[test]
    fn test_cosine_overlap_beats_disjoint() {
        let u1 = v(&[(0, 5.0), (1, 4.0)]);
        let u2 = v(&[(0, 5.0), (1, 5.0)]);
        let u3 = v(&[(2, 1.0)]);

        let close = cosine(&u1, &u2, 3);
        let far = cosine(&u1, &u3, 3);
        assert!(close > 0.99);
        assert_eq!(far, 0.0);
    }

    #[test]
    fn test_pearson_matches_dense_formula() {
        // zero-filled: a = [1, 2, 0, 4], b = [2, 0, 1, 5]
        let a = v(&[(0, 1.0), (1, 2.0), (3, 4.0)]);
        let b = v(&[(0, 2.0), (2, 1.0), (3, 5.0)]);

        let da = [1.0, 2.0, 0.0, 4.0];
        let db = [2.0, 0.0, 1.0, 5.0];
        let ma = da.iter().sum::<f64>() / 4.0;
        let mb = db.iter().sum::<f64>() / 4.0;
        let cov: f64 = da.iter().zip(db.iter()).map(|(x, y)| (x - ma) * (y - mb)).sum();
        let va: f64 = da.iter().map(|x| (x - ma).powi(2)).sum();
        let vb: f64 = db.iter().map(|y| (y - mb).powi(2)).sum();
        let expected = cov / (va * vb).sqrt();

        assert!((pearson(&a, &b, 4) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_pearson_zero_variance_is_zero() {
        let flat = v(&[(0, 3.0), (1, 3.0)]);
        let other = v(&[(0, 1.0), (1, 5.0)]);
        assert_eq!(pearson(&flat, &other, 2), 0.0);
        assert_eq!(pearson(&SparseVector::default(), &other, 2), 0.0);
    }

    #[test]
    fn test_jaccard_bounds_and_empty_union() {
        let a = v(&[(0, 5.0), (1, 1.0)]);
        let b = v(&[(1, 2.0), (2, 3.0)]);
        assert!((jaccard(&a, &b, 3) - 1.0 / 3.0).abs() < 1e-12);

        let empty = SparseVector::default();
        assert_eq!(jaccard(&empty, &empty, 3), 0.0);
    }

    #[test]
    fn test_jaccard_ignores_non_positive_values() {
        let a = v(&[(0, -1.0), (1, 2.0)]);
        let b = v(&[(0, 3.0), (1, 2.0)]);
        assert!((jaccard(&a, &b, 2) - 0.5).abs() < 1e-12);
    }
}
