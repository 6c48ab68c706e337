//! Similarity metric and axis selection
//!
//! Metrics are a closed set. Names coming from the outside are parsed once at
//! the boundary and rejected with [`Error::InvalidParameter`] when unknown.

use crate::distance::{self, Kernel};
use serde::{Deserialize, Serialize};
use snaprec_core::Error;
use std::fmt;
use std::str::FromStr;

/// Which entities are compared: rows (users) or columns (items)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    User,
    Item,
}

impl Axis {
    pub fn as_str(&self) -> &'static str {
        match self {
            Axis::User => "user",
            Axis::Item => "item",
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Axis {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "user" | "users" => Ok(Axis::User),
            "item" | "items" => Ok(Axis::Item),
            other => Err(Error::InvalidParameter(format!("unknown axis: {other}"))),
        }
    }
}

/// Similarity metric
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityMetric {
    /// Vector cosine over zero-filled ratings
    #[default]
    Cosine,
    /// Correlation coefficient over zero-filled ratings
    Pearson,
    /// |A ∩ B| / |A ∪ B| over binarized ratings
    Jaccard,
    /// Cosine after subtracting each user's mean rating
    AdjustedCosine,
}

impl SimilarityMetric {
    pub const ALL: [SimilarityMetric; 4] = [
        SimilarityMetric::Cosine,
        SimilarityMetric::Pearson,
        SimilarityMetric::Jaccard,
        SimilarityMetric::AdjustedCosine,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SimilarityMetric::Cosine => "cosine",
            SimilarityMetric::Pearson => "pearson",
            SimilarityMetric::Jaccard => "jaccard",
            SimilarityMetric::AdjustedCosine => "adjusted_cosine",
        }
    }

    /// Pairwise kernel for this metric
    pub fn kernel(&self) -> Kernel {
        match self {
            SimilarityMetric::Cosine | SimilarityMetric::AdjustedCosine => distance::cosine,
            SimilarityMetric::Pearson => distance::pearson,
            SimilarityMetric::Jaccard => distance::jaccard,
        }
    }

    /// Closed range every score of this metric falls in
    pub fn range(&self) -> (f64, f64) {
        match self {
            SimilarityMetric::Jaccard => (0.0, 1.0),
            _ => (-1.0, 1.0),
        }
    }

    /// Whether ratings are centered on each user's mean before comparison
    pub fn centers_user_mean(&self) -> bool {
        matches!(self, SimilarityMetric::AdjustedCosine)
    }
}

impl fmt::Display for SimilarityMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SimilarityMetric {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cosine" => Ok(SimilarityMetric::Cosine),
            "pearson" => Ok(SimilarityMetric::Pearson),
            "jaccard" => Ok(SimilarityMetric::Jaccard),
            "adjusted_cosine" | "adjusted-cosine" => Ok(SimilarityMetric::AdjustedCosine),
            other => Err(Error::InvalidParameter(format!(
                "unknown similarity metric: {other}"
            ))),
        }
    }
}
