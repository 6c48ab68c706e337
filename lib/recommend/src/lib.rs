//! # snaprec Recommend
//!
//! The [`Recommender`] facade: owns the loaded catalog, the interaction
//! matrix and a per-`(axis, metric)` similarity cache, and answers every
//! query the web layer asks.
//!
//! ```text
//! reviews ──► InteractionMatrix ──► SimilarityMatrix (cached) ──► predictor ──► ranked list
//!                                                                                  │
//! products / similar_products ──► Catalog ─────────────────────────────────► enrichment
//! ```
//!
//! Unknown users are never an error; they get the category-diversified
//! popularity list from [`Recommender::cold_start`].

pub mod config;
pub mod copurchase;
pub mod evaluate;
pub mod facade;
pub mod ranking;
pub mod records;
pub mod trending;

pub use config::RecommenderConfig;
pub use facade::{Recommender, RecommenderState};
pub use records::{
    CoPurchaseReport, EvaluationReport, ItemDetails, PopularRecord, ProductCoPurchaseReport,
    RecommendMethod, RecommendationRecord, ScoredItem, SimilarItemRecord, Stats, TrendingRecord,
    UserCoPurchaseReport,
};
