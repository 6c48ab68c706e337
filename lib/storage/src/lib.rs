//! # snaprec Storage
//!
//! Reads the products, reviews and similar-products tables exported from the
//! SNAP Amazon metadata dump. Tables are JSON Lines, plain or gzip-compressed.

pub mod loader;
pub mod sample;

pub use loader::{parse_review_date, Dataset, DatasetLoader, LoadReport};
pub use sample::sample_in_order;
