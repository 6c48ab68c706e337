//! # snaprec Similarity
//!
//! Pairwise similarity and neighbor-based rating prediction over an
//! [`InteractionMatrix`](snaprec_core::InteractionMatrix).
//!
//! ## Features
//!
//! - **Metrics**: cosine, Pearson, Jaccard and adjusted cosine as a closed enum
//!   mapped to pure kernels
//! - **Both axes**: user-user (rows) and item-item (columns)
//! - **Top-k neighbors**: stable, self-excluding neighbor selection
//! - **Predictors**: user-based (bias corrected) and item-based (positive
//!   similarities only)
//!
//! ## Example
//!
//! ```rust
//! use snaprec_core::{Interaction, InteractionMatrix};
//! use snaprec_similarity::{Axis, SimilarityMatrix, SimilarityMetric};
//!
//! let records = vec![
//!     Interaction::new("u1", "i1", 5.0),
//!     Interaction::new("u1", "i2", 4.0),
//!     Interaction::new("u2", "i1", 5.0),
//!     Interaction::new("u2", "i2", 5.0),
//!     Interaction::new("u3", "i3", 1.0),
//! ];
//! let matrix = InteractionMatrix::build(&records, 1).unwrap();
//! let users = SimilarityMatrix::compute(&matrix, Axis::User, SimilarityMetric::Cosine);
//!
//! assert!(users.get("u1", "u2").unwrap() > users.get("u1", "u3").unwrap());
//! assert_eq!(users.top_k("u1", 1)[0].0, "u2");
//! ```
//!
//! ## Pipeline
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ Interaction │────>│ Similarity  │────>│  Predictor  │
//! │   Matrix    │     │   Matrix    │     │ (per query) │
//! └─────────────┘     └─────────────┘     └─────────────┘
//! ```

pub mod distance;
pub mod matrix;
pub mod metric;
pub mod predict;

pub use distance::Kernel;
pub use matrix::SimilarityMatrix;
pub use metric::{Axis, SimilarityMetric};
pub use predict::{
    predict_item_based, predict_user_based, ItemBasedPredictor, NeighborRating, RatingPredictor,
    UserBasedPredictor,
};
