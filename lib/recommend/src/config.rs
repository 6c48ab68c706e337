use serde::{Deserialize, Serialize};
use snaprec_core::{Error, Result, DEFAULT_MIN_INTERACTIONS};
use snaprec_similarity::SimilarityMetric;
use std::path::Path;

/// Configuration for a [`crate::Recommender`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommenderConfig {
    /// Users and items with fewer observed ratings are dropped from the matrix
    pub min_interactions: usize,
    pub metric: SimilarityMetric,
    /// Neighbor users consulted by user-based prediction
    pub neighbors: usize,
    /// Items explored per co-purchase query
    pub copurchase_item_cap: usize,
    /// Co-purchasing users explored per co-purchase query
    pub copurchase_user_cap: usize,
    pub liked_threshold: f64,
    pub eval_sample_size: usize,
    pub trending_window_days: u32,
    pub seed: u64,
    pub max_reviews: Option<usize>,
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        Self {
            min_interactions: DEFAULT_MIN_INTERACTIONS,
            metric: SimilarityMetric::Cosine,
            neighbors: 50,
            copurchase_item_cap: 10,
            copurchase_user_cap: 50,
            liked_threshold: 4.0,
            eval_sample_size: 100,
            trending_window_days: 30,
            seed: 42,
            max_reviews: None,
        }
    }
}

impl RecommenderConfig {
    /// Read a JSON config file. Missing fields take their defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.neighbors == 0 {
            return Err(Error::InvalidParameter("neighbors must be positive".into()));
        }
        if self.copurchase_item_cap == 0 || self.copurchase_user_cap == 0 {
            return Err(Error::InvalidParameter(
                "co-purchase exploration caps must be positive".into(),
            ));
        }
        if !self.liked_threshold.is_finite() {
            return Err(Error::InvalidParameter("liked_threshold must be finite".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = RecommenderConfig::default();
        assert_eq!(config.min_interactions, 5);
        assert_eq!(config.metric, SimilarityMetric::Cosine);
        assert_eq!(config.neighbors, 50);
        assert_eq!(config.copurchase_item_cap, 10);
        assert_eq!(config.copurchase_user_cap, 50);
        assert_eq!(config.seed, 42);
        assert!(config.max_reviews.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_takes_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"min_interactions": 2, "metric": "adjusted_cosine"}}"#).unwrap();

        let config = RecommenderConfig::from_file(file.path()).unwrap();
        assert_eq!(config.min_interactions, 2);
        assert_eq!(config.metric, SimilarityMetric::AdjustedCosine);
        assert_eq!(config.neighbors, 50);
    }

    #[test]
    fn test_unknown_metric_in_file_is_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"metric": "euclidean"}}"#).unwrap();
        assert!(RecommenderConfig::from_file(file.path()).is_err());
    }

    #[test]
    fn test_zero_neighbors_is_invalid() {
        let config = RecommenderConfig {
            neighbors: 0,
            ..Default::default()
        };
        assert!(config.validate().unwrap_err().is_invalid_parameter());
    }
}
