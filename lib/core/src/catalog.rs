//! Product catalog and co-purchase edges
//!
//! Read-only view over the products and similar-products tables. The
//! recommender only joins against it by item id for display enrichment and
//! category grouping.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

/// A row of the products table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Product {
    pub id: String,
    pub asin: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub group: String,
    #[serde(default)]
    pub salesrank: Option<i64>,
    #[serde(default)]
    pub avg_rating: f64,
    #[serde(default)]
    pub total_reviews: u64,
    #[serde(default)]
    pub similar_count: u32,
    #[serde(default)]
    pub categories_count: u32,
    #[serde(default)]
    pub discontinued: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
}

impl Product {
    /// The product group, `None` when the column is blank
    pub fn category(&self) -> Option<&str> {
        let group = self.group.trim();
        if group.is_empty() {
            None
        } else {
            Some(group)
        }
    }
}

/// Directed co-purchase edge: customers who bought `product_asin` also
/// bought `similar_asin`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SimilarEdge {
    #[serde(default)]
    pub product_id: String,
    pub product_asin: String,
    pub similar_asin: String,
}

/// Products indexed by ASIN (the canonical item id) and by numeric id
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    products: Vec<Product>,
    by_asin: AHashMap<String, usize>,
    by_id: AHashMap<String, usize>,
    similar: AHashMap<String, Vec<String>>,
    edge_count: usize,
}

impl Catalog {
    pub fn new(products: Vec<Product>, edges: Vec<SimilarEdge>) -> Self {
        let mut by_asin = AHashMap::with_capacity(products.len());
        let mut by_id = AHashMap::with_capacity(products.len());
        for (pos, product) in products.iter().enumerate() {
            if !product.asin.is_empty() {
                by_asin.entry(product.asin.clone()).or_insert(pos);
            }
            if !product.id.is_empty() {
                by_id.entry(product.id.clone()).or_insert(pos);
            }
        }

        let edge_count = edges.len();
        let mut similar: AHashMap<String, Vec<String>> = AHashMap::new();
        for edge in edges {
            similar
                .entry(edge.product_asin)
                .or_default()
                .push(edge.similar_asin);
        }

        Self {
            products,
            by_asin,
            by_id,
            similar,
            edge_count,
        }
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Look up by ASIN first, then by numeric product id
    pub fn get(&self, item_id: &str) -> Option<&Product> {
        self.by_asin
            .get(item_id)
            .or_else(|| self.by_id.get(item_id))
            .map(|&pos| &self.products[pos])
    }

    pub fn contains(&self, item_id: &str) -> bool {
        self.get(item_id).is_some()
    }

    pub fn category_of(&self, item_id: &str) -> Option<&str> {
        self.get(item_id).and_then(Product::category)
    }

    /// Catalog review count, 0 for unknown items
    pub fn review_count(&self, item_id: &str) -> u64 {
        self.get(item_id).map(|p| p.total_reviews).unwrap_or(0)
    }

    /// Distinct non-blank product groups, sorted
    pub fn categories(&self) -> Vec<String> {
        let mut categories: Vec<String> = self
            .products
            .iter()
            .filter_map(Product::category)
            .map(str::to_string)
            .collect();
        categories.sort();
        categories.dedup();
        categories
    }

    /// Co-purchase neighbors of an ASIN in table order
    pub fn similar_products(&self, asin: &str) -> &[String] {
        self.similar.get(asin).map(Vec::as_slice).unwrap_or(&[])
    }
}
