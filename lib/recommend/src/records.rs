//! Serializable results handed to the web layer

use serde::{Deserialize, Serialize};
use snaprec_core::{Catalog, Error};
use std::fmt;
use std::str::FromStr;

pub const UNKNOWN: &str = "Unknown";

/// How a recommendation list is produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RecommendMethod {
    UserBased,
    #[default]
    ItemBased,
    Hybrid,
    Popularity,
}

impl RecommendMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecommendMethod::UserBased => "user_based",
            RecommendMethod::ItemBased => "item_based",
            RecommendMethod::Hybrid => "hybrid",
            RecommendMethod::Popularity => "popularity",
        }
    }
}

impl fmt::Display for RecommendMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecommendMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "user_based" | "user" => Ok(RecommendMethod::UserBased),
            "item_based" | "item" => Ok(RecommendMethod::ItemBased),
            "hybrid" => Ok(RecommendMethod::Hybrid),
            "popularity" | "popular" => Ok(RecommendMethod::Popularity),
            other => Err(Error::InvalidParameter(format!(
                "unknown recommendation method: {other}"
            ))),
        }
    }
}

/// A ranked `(item, score)` pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredItem {
    pub item_id: String,
    pub score: f64,
}

impl ScoredItem {
    pub fn new(item_id: impl Into<String>, score: f64) -> Self {
        Self {
            item_id: item_id.into(),
            score,
        }
    }
}

/// Catalog fields joined onto every outgoing record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemDetails {
    pub title: String,
    pub category: String,
    pub avg_rating: f64,
    pub num_reviews: u64,
    pub price: Option<f64>,
}

impl ItemDetails {
    /// Look the item up in the catalog; unknown items get placeholder values
    pub fn lookup(catalog: &Catalog, item_id: &str) -> Self {
        match catalog.get(item_id) {
            Some(product) => Self {
                title: if product.title.trim().is_empty() {
                    UNKNOWN.to_string()
                } else {
                    product.title.clone()
                },
                category: product.category().unwrap_or(UNKNOWN).to_string(),
                avg_rating: product.avg_rating,
                num_reviews: product.total_reviews,
                price: product.price,
            },
            None => Self::unknown(),
        }
    }

    pub fn unknown() -> Self {
        Self {
            title: UNKNOWN.to_string(),
            category: UNKNOWN.to_string(),
            avg_rating: 0.0,
            num_reviews: 0,
            price: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationRecord {
    pub item_id: String,
    pub predicted_rating: f64,
    #[serde(flatten)]
    pub details: ItemDetails,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarItemRecord {
    pub item_id: String,
    pub similarity: f64,
    #[serde(flatten)]
    pub details: ItemDetails,
}

/// Popularity ranking entry; `avg_rating`/`review_count` are computed from
/// the loaded reviews, `details` echo the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopularRecord {
    pub item_id: String,
    pub popularity_score: f64,
    pub review_avg_rating: f64,
    pub review_count: u64,
    #[serde(flatten)]
    pub details: ItemDetails,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendingRecord {
    pub item_id: String,
    pub trending_score: f64,
    pub recent_reviews: u64,
    pub recent_avg_rating: f64,
    #[serde(flatten)]
    pub details: ItemDetails,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoPurchaser {
    pub user_id: String,
    pub shared_items: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoPurchasedItem {
    pub item_id: String,
    pub co_purchase_frequency: u64,
    #[serde(flatten)]
    pub details: ItemDetails,
}

/// "Who else bought what this user bought, and what else did they buy"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserCoPurchaseReport {
    pub user_id: String,
    pub total_purchases: usize,
    pub explored_items: usize,
    pub co_purchasers_count: usize,
    pub top_co_purchasers: Vec<CoPurchaser>,
    pub co_purchased_items: Vec<CoPurchasedItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoPurchaseNeighbor {
    pub item_id: String,
    pub shared_reviewers: usize,
    #[serde(flatten)]
    pub details: ItemDetails,
}

/// Reviewer overlap between a product and its co-purchase neighbors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductCoPurchaseReport {
    pub product_id: String,
    pub similar_count: usize,
    pub explored_neighbors: usize,
    pub product_reviewers: usize,
    pub neighbor_reviewers: usize,
    pub shared_users_count: usize,
    pub shared_users: Vec<String>,
    pub neighbors: Vec<CoPurchaseNeighbor>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CoPurchaseReport {
    User(UserCoPurchaseReport),
    Product(ProductCoPurchaseReport),
}

/// Mean per-user precision and recall over users with at least one liked item
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct EvaluationReport {
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub test_users_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: f64,
    pub max: f64,
    pub avg: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub state: String,
    pub metric: String,
    pub total_products: usize,
    pub total_ratings: usize,
    pub total_users: usize,
    pub total_items: usize,
    pub categories: usize,
    pub avg_rating: f64,
    pub matrix_density: f64,
    pub co_purchase_edges: usize,
    pub price_range: Option<PriceRange>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use snaprec_core::Product;

    #[test]
    fn test_method_parsing() {
        assert_eq!("user_based".parse::<RecommendMethod>().unwrap(), RecommendMethod::UserBased);
        assert_eq!("Item-Based".parse::<RecommendMethod>().unwrap(), RecommendMethod::ItemBased);
        assert_eq!("hybrid".parse::<RecommendMethod>().unwrap(), RecommendMethod::Hybrid);
        assert_eq!("popular".parse::<RecommendMethod>().unwrap(), RecommendMethod::Popularity);
        assert!("svd".parse::<RecommendMethod>().unwrap_err().is_invalid_parameter());
        assert_eq!(RecommendMethod::default(), RecommendMethod::ItemBased);
    }

    #[test]
    fn test_details_for_missing_item() {
        let catalog = Catalog::default();
        let details = ItemDetails::lookup(&catalog, "B000000000");
        assert_eq!(details, ItemDetails::unknown());
        assert_eq!(details.title, "Unknown");
        assert_eq!(details.price, None);
    }

    #[test]
    fn test_details_from_catalog() {
        let catalog = Catalog::new(
            vec![Product {
                id: "7".into(),
                asin: "0827229534".into(),
                title: "Patterns of Preaching".into(),
                group: "Book".into(),
                avg_rating: 5.0,
                total_reviews: 2,
                price: Some(12.5),
                ..Default::default()
            }],
            vec![],
        );
        let details = ItemDetails::lookup(&catalog, "0827229534");
        assert_eq!(details.category, "Book");
        assert_eq!(details.num_reviews, 2);
        assert_eq!(details.price, Some(12.5));
        assert_eq!(ItemDetails::lookup(&catalog, "7").title, "Patterns of Preaching");
    }

    #[test]
    fn test_record_flattens_details() {
        let record = RecommendationRecord {
            item_id: "X".into(),
            predicted_rating: 4.5,
            details: ItemDetails::unknown(),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["title"], "Unknown");
        assert_eq!(json["predicted_rating"], 4.5);
        assert!(json.get("details").is_none());
    }

    #[test]
    fn test_co_purchase_report_is_tagged() {
        let report = CoPurchaseReport::Product(ProductCoPurchaseReport {
            product_id: "X".into(),
            similar_count: 0,
            explored_neighbors: 0,
            product_reviewers: 0,
            neighbor_reviewers: 0,
            shared_users_count: 0,
            shared_users: vec![],
            neighbors: vec![],
        });
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["kind"], "product");
    }
}
