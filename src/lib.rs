//! # snaprec
//!
//! Collaborative-filtering recommendations over the Stanford SNAP Amazon
//! product co-purchasing dataset.
//!
//! snaprec builds a sparse user × item rating matrix from product reviews,
//! computes user-user and item-item similarity under cosine, Pearson, Jaccard
//! or adjusted cosine, and predicts unseen ratings by weighted neighbor
//! aggregation. Users outside the matrix get a popularity list spread across
//! product categories.
//!
//! ## Quick Start
//!
//! ### As a Server
//!
//! ```bash
//! snaprec --data-dir ./data/processed --http-port 5000
//! ```
//!
//! ### As a Library
//!
//! ```rust,no_run
//! use snaprec::prelude::*;
//!
//! let mut recommender = Recommender::new(RecommenderConfig::default());
//! recommender.load_from_dir("./data/processed").unwrap();
//! recommender.warm_up().unwrap();
//!
//! for item in recommender.recommend("A2JW67OY8U6HHK", RecommendMethod::Hybrid, 10).unwrap() {
//!     println!("{} {:.2}", item.item_id, item.score);
//! }
//! ```
//!
//! ## Crate Structure
//!
//! - [`snaprec-core`](https://docs.rs/snaprec-core) - Interaction matrix, catalog, popularity, errors
//! - [`snaprec-similarity`](https://docs.rs/snaprec-similarity) - Metrics, similarity matrices, rating predictors
//! - [`snaprec-recommend`](https://docs.rs/snaprec-recommend) - The `Recommender` facade
//! - [`snaprec-storage`](https://docs.rs/snaprec-storage) - JSON Lines dataset loader
//! - [`snaprec-api`](https://docs.rs/snaprec-api) - REST API

// Re-export core types
pub use snaprec_core::{
    Catalog, Error, Interaction, InteractionMatrix, ItemStats, Product, Result, SimilarEdge,
    SparseVector,
};

// Re-export similarity
pub use snaprec_similarity::{
    Axis, ItemBasedPredictor, RatingPredictor, SimilarityMatrix, SimilarityMetric,
    UserBasedPredictor,
};

// Re-export the facade
pub use snaprec_recommend::{
    CoPurchaseReport, EvaluationReport, RecommendMethod, RecommendationRecord, Recommender,
    RecommenderConfig, RecommenderState, ScoredItem, SimilarItemRecord, Stats, TrendingRecord,
};

// Re-export storage
pub use snaprec_storage::{Dataset, DatasetLoader, LoadReport};

// Re-export API
pub use snaprec_api::{RestApi, SharedRecommender};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        Axis, Dataset, DatasetLoader, Error, Interaction, InteractionMatrix, RecommendMethod,
        Recommender, RecommenderConfig, Result, SimilarityMatrix, SimilarityMetric,
    };
}
