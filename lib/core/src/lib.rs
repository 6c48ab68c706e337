//! # snaprec Core
//!
//! Core data structures for the snaprec recommender.
//!
//! - [`InteractionMatrix`] - sparse user × item rating matrix with a density filter
//! - [`SparseVector`] - sorted sparse row/column representation
//! - [`Catalog`] - read-only product catalog and co-purchase edges
//! - [`popularity`] - the log-dampened popularity score used as the fallback signal
//!
//! ## Example
//!
//! ```rust
//! use snaprec_core::{Interaction, InteractionMatrix};
//!
//! let records = vec![
//!     Interaction::new("A1", "0827229534", 5.0),
//!     Interaction::new("A2", "0827229534", 4.0),
//!     Interaction::new("A1", "0738700797", 3.0),
//! ];
//! let matrix = InteractionMatrix::build(&records, 1).unwrap();
//! assert_eq!(matrix.shape(), (2, 2));
//! assert_eq!(matrix.rating_by_id("A2", "0738700797"), None);
//! ```

pub mod catalog;
pub mod error;
pub mod interaction;
pub mod popularity;
pub mod vector;

pub use catalog::{Catalog, Product, SimilarEdge};
pub use error::{Error, Result};
pub use interaction::{
    clamp_rating, is_valid_rating, Interaction, InteractionMatrix, DEFAULT_MIN_INTERACTIONS,
    MAX_RATING, MIN_RATING,
};
pub use popularity::{popularity_score, ItemStats};
pub use vector::SparseVector;
