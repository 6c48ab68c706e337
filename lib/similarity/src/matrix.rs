//! Square similarity matrices over users or items

use crate::metric::{Axis, SimilarityMetric};
use ahash::AHashMap;
use snaprec_core::{InteractionMatrix, SparseVector};
use std::cmp::Ordering;
use tracing::info;

/// Symmetric `n × n` similarity scores for one axis and metric.
///
/// Entity order matches the axis order of the source [`InteractionMatrix`].
/// The diagonal is set to exactly 1.0 rather than computed.
#[derive(Debug, Clone)]
pub struct SimilarityMatrix {
    axis: Axis,
    metric: SimilarityMetric,
    ids: Vec<String>,
    index: AHashMap<String, usize>,
    scores: Vec<f64>,
}

impl SimilarityMatrix {
    /// Compute all pairwise similarities along `axis` under `metric`.
    ///
    /// Absent ratings count as 0. For adjusted cosine each user's mean is
    /// subtracted from their observed ratings first, and the absent entries
    /// stay 0 after centering. Cost is O(n²) pair evaluations with no early
    /// exit.
    pub fn compute(matrix: &InteractionMatrix, axis: Axis, metric: SimilarityMetric) -> Self {
        let centered: Vec<SparseVector>;
        let rows: &[SparseVector] = if metric.centers_user_mean() {
            centered = (0..matrix.n_users())
                .map(|u| {
                    let mean = matrix.user_mean(u);
                    matrix.row(u).map_values(|r| r - mean)
                })
                .collect();
            &centered
        } else {
            matrix.rows()
        };

        let (vectors, dim, ids): (Vec<SparseVector>, usize, &[String]) = match axis {
            Axis::User => (rows.to_vec(), matrix.n_items(), matrix.users()),
            Axis::Item => (transpose(rows, matrix.n_items()), matrix.n_users(), matrix.items()),
        };

        let n = vectors.len();
        let kernel = metric.kernel();
        let (lo, hi) = metric.range();
        let mut scores = vec![0.0; n * n];

        for i in 0..n {
            scores[i * n + i] = 1.0;
            for j in (i + 1)..n {
                let raw = kernel(&vectors[i], &vectors[j], dim);
                let score = if raw.is_finite() { raw.clamp(lo, hi) } else { 0.0 };
                scores[i * n + j] = score;
                scores[j * n + i] = score;
            }
        }

        info!("Computed {} {} similarity over {} entities", metric, axis, n);

        Self {
            axis,
            metric,
            ids: ids.to_vec(),
            index: ids.iter().enumerate().map(|(i, id)| (id.clone(), i)).collect(),
            scores,
        }
    }

    pub fn axis(&self) -> Axis {
        self.axis
    }

    pub fn metric(&self) -> SimilarityMetric {
        self.metric
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    #[inline]
    pub fn position(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    #[inline]
    pub fn score(&self, a: usize, b: usize) -> f64 {
        self.scores[a * self.ids.len() + b]
    }

    /// Similarity between two entities by id
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        Some(self.score(self.position(a)?, self.position(b)?))
    }

    /// All scores of one entity, in axis order
    #[inline]
    pub fn row(&self, idx: usize) -> &[f64] {
        let n = self.ids.len();
        &self.scores[idx * n..(idx + 1) * n]
    }

    /// The `k` most similar partners of the entity at `idx`, self excluded,
    /// sorted descending. Equal scores keep axis order.
    pub fn top_k_by_index(&self, idx: usize, k: usize) -> Vec<(usize, f64)> {
        let mut partners: Vec<(usize, f64)> = self
            .row(idx)
            .iter()
            .copied()
            .enumerate()
            .filter(|(j, _)| *j != idx)
            .collect();
        partners.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        partners.truncate(k);
        partners
    }

    /// The `k` most similar partners of `id`; empty for an unknown id
    pub fn top_k(&self, id: &str, k: usize) -> Vec<(String, f64)> {
        match self.position(id) {
            Some(idx) => self
                .top_k_by_index(idx, k)
                .into_iter()
                .map(|(j, score)| (self.ids[j].clone(), score))
                .collect(),
            None => Vec::new(),
        }
    }
}

/// Turn user rows into item columns
fn transpose(rows: &[SparseVector], n_cols: usize) -> Vec<SparseVector> {
    let mut cols: Vec<Vec<(usize, f64)>> = vec![Vec::new(); n_cols];
    for (u, row) in rows.iter().enumerate() {
        for (i, value) in row.iter() {
            cols[i].push((u, value));
        }
    }
    cols.into_iter().map(SparseVector::new).collect()
}
