// Dataset loading from JSON Lines tables
use crate::sample::sample_in_order;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use flate2::read::GzDecoder;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use snaprec_core::{is_valid_rating, Error, Interaction, Product, Result, SimilarEdge};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const PRODUCTS_TABLE: &str = "products";
pub const REVIEWS_TABLE: &str = "reviews";
pub const SIMILAR_TABLE: &str = "similar_products";

/// Everything read from a data directory
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub products: Vec<Product>,
    pub reviews: Vec<Interaction>,
    pub similar: Vec<SimilarEdge>,
}

/// Counters describing one load
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub products: usize,
    pub reviews: usize,
    pub similar_edges: usize,
    /// Lines that were not valid JSON objects or lacked required columns
    pub skipped_lines: usize,
    /// Reviews dropped for a missing, non-numeric or out-of-range rating
    pub skipped_ratings: usize,
    /// Reviews dropped by `max_reviews` sampling
    pub sampled_out: usize,
    pub similar_table_present: bool,
}

/// Reads `products`, `reviews` and `similar_products` from a directory.
///
/// Each table is a `.jsonl` file, or `.jsonl.gz`. Missing required tables
/// fail with [`Error::DataUnavailable`]; a missing similar-products table
/// only logs a warning.
#[derive(Debug, Clone)]
pub struct DatasetLoader {
    data_dir: PathBuf,
    max_reviews: Option<usize>,
    seed: u64,
}

impl DatasetLoader {
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
            max_reviews: None,
            seed: 42,
        }
    }

    /// Down-sample reviews to at most `max_reviews` using `seed`
    #[must_use]
    pub fn with_sampling(mut self, max_reviews: Option<usize>, seed: u64) -> Self {
        self.max_reviews = max_reviews;
        self.seed = seed;
        self
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn load(&self) -> Result<(Dataset, LoadReport)> {
        if !self.data_dir.is_dir() {
            return Err(Error::DataUnavailable(format!(
                "data directory {} does not exist",
                self.data_dir.display()
            )));
        }

        let mut report = LoadReport::default();

        let products_reader = self.open_table(PRODUCTS_TABLE)?.ok_or_else(|| {
            Error::DataUnavailable(format!(
                "{PRODUCTS_TABLE}.jsonl not found in {}",
                self.data_dir.display()
            ))
        })?;
        let reviews_reader = self.open_table(REVIEWS_TABLE)?.ok_or_else(|| {
            Error::DataUnavailable(format!(
                "{REVIEWS_TABLE}.jsonl not found in {}",
                self.data_dir.display()
            ))
        })?;

        let products = read_products(products_reader, &mut report)?;
        let mut reviews = read_reviews(reviews_reader, &mut report)?;

        let similar = match self.open_table(SIMILAR_TABLE)? {
            Some(reader) => {
                report.similar_table_present = true;
                read_similar(reader, &mut report)?
            }
            None => {
                warn!(
                    "{}.jsonl not found in {}, co-purchase lookups will be empty",
                    SIMILAR_TABLE,
                    self.data_dir.display()
                );
                Vec::new()
            }
        };

        if let Some(max) = self.max_reviews {
            let before = reviews.len();
            reviews = sample_in_order(reviews, max, self.seed);
            report.sampled_out = before - reviews.len();
            if report.sampled_out > 0 {
                info!("Sampled {} of {} reviews (seed {})", reviews.len(), before, self.seed);
            }
        }

        report.products = products.len();
        report.reviews = reviews.len();
        report.similar_edges = similar.len();

        info!(
            "Loaded {} products, {} reviews, {} co-purchase edges from {}",
            report.products,
            report.reviews,
            report.similar_edges,
            self.data_dir.display()
        );
        if report.skipped_lines > 0 || report.skipped_ratings > 0 {
            warn!(
                "Skipped {} malformed lines and {} invalid ratings",
                report.skipped_lines, report.skipped_ratings
            );
        }

        Ok((
            Dataset {
                products,
                reviews,
                similar,
            },
            report,
        ))
    }

    /// Open `<name>.jsonl`, falling back to `<name>.jsonl.gz`
    fn open_table(&self, name: &str) -> Result<Option<Box<dyn BufRead>>> {
        let plain = self.data_dir.join(format!("{name}.jsonl"));
        if plain.is_file() {
            debug!("Reading {}", plain.display());
            let file = File::open(&plain)?;
            return Ok(Some(Box::new(BufReader::new(file))));
        }

        let gz = self.data_dir.join(format!("{name}.jsonl.gz"));
        if gz.is_file() {
            debug!("Reading {}", gz.display());
            let file = File::open(&gz)?;
            let decoder = GzDecoder::new(BufReader::new(file));
            return Ok(Some(Box::new(BufReader::new(decoder))));
        }

        Ok(None)
    }
}

#[derive(Debug, Deserialize)]
struct ProductRow {
    #[serde(default)]
    id: Value,
    #[serde(default)]
    asin: Value,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    group: Option<String>,
    #[serde(default)]
    salesrank: Value,
    #[serde(default)]
    avg_rating: Value,
    #[serde(default)]
    total_reviews: Value,
    #[serde(default)]
    similar_count: Value,
    #[serde(default)]
    categories_count: Value,
    #[serde(default)]
    discontinued: Option<bool>,
    #[serde(default)]
    price: Value,
}

#[derive(Debug, Deserialize)]
struct ReviewRow {
    #[serde(default)]
    customer_id: Value,
    #[serde(default)]
    user_id: Value,
    #[serde(default)]
    product_asin: Value,
    #[serde(default)]
    product_id: Value,
    #[serde(default)]
    rating: Value,
    #[serde(default)]
    timestamp: Value,
    #[serde(default)]
    date: Value,
}

#[derive(Debug, Deserialize)]
struct SimilarRow {
    #[serde(default)]
    product_id: Value,
    #[serde(default)]
    product_asin: Value,
    #[serde(default)]
    similar_asin: Value,
}

/// Render an id column that may have been written as a string or a number
fn id_from(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn f64_from(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

fn u64_from(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn i64_from(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Parse a review date into unix seconds at midnight UTC.
///
/// Accepts `YYYY-M-D` with or without zero padding, optionally followed by a
/// time of day, and RFC 3339 timestamps.
pub fn parse_review_date(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.timestamp());
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt.and_utc().timestamp());
        }
    }
    let day = raw.split(|c: char| c == ' ' || c == 'T').next()?;
    NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp())
}

fn timestamp_from(row: &ReviewRow) -> Option<i64> {
    i64_from(&row.timestamp).or_else(|| match &row.date {
        Value::String(s) => parse_review_date(s),
        Value::Number(n) => n.as_i64(),
        _ => None,
    })
}

fn for_each_row<T, R, F>(reader: R, table: &str, report: &mut LoadReport, mut f: F) -> Result<()>
where
    T: for<'de> Deserialize<'de>,
    R: BufRead,
    F: FnMut(T, usize, &mut LoadReport),
{
    for (line_no, bytes) in reader.split(b'\n').enumerate() {
        let bytes = bytes?;
        let line = match std::str::from_utf8(&bytes) {
            Ok(line) => line,
            Err(e) => {
                warn!("{}: skipping line {}: {}", table, line_no + 1, e);
                report.skipped_lines += 1;
                continue;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<T>(line) {
            Ok(row) => f(row, line_no + 1, report),
            Err(e) => {
                warn!("{}: skipping line {}: {}", table, line_no + 1, e);
                report.skipped_lines += 1;
            }
        }
    }
    Ok(())
}

fn read_products<R: BufRead>(reader: R, report: &mut LoadReport) -> Result<Vec<Product>> {
    let mut products = Vec::new();
    for_each_row::<ProductRow, _, _>(reader, PRODUCTS_TABLE, report, |row, line_no, report| {
        let asin = id_from(&row.asin);
        let id = id_from(&row.id);
        if asin.is_none() && id.is_none() {
            warn!("{}: skipping line {}: no id or asin", PRODUCTS_TABLE, line_no);
            report.skipped_lines += 1;
            return;
        }
        products.push(Product {
            id: id.unwrap_or_default(),
            asin: asin.unwrap_or_default(),
            title: row.title.unwrap_or_default(),
            group: row.group.unwrap_or_default(),
            salesrank: i64_from(&row.salesrank),
            avg_rating: f64_from(&row.avg_rating).unwrap_or(0.0),
            total_reviews: u64_from(&row.total_reviews).unwrap_or(0),
            similar_count: u64_from(&row.similar_count).unwrap_or(0) as u32,
            categories_count: u64_from(&row.categories_count).unwrap_or(0) as u32,
            discontinued: row.discontinued.unwrap_or(false),
            price: f64_from(&row.price),
        });
    })?;
    Ok(products)
}

fn read_reviews<R: BufRead>(reader: R, report: &mut LoadReport) -> Result<Vec<Interaction>> {
    let mut reviews = Vec::new();
    for_each_row::<ReviewRow, _, _>(reader, REVIEWS_TABLE, report, |row, line_no, report| {
        let user = id_from(&row.customer_id).or_else(|| id_from(&row.user_id));
        let item = id_from(&row.product_asin).or_else(|| id_from(&row.product_id));
        let (Some(user), Some(item)) = (user, item) else {
            warn!("{}: skipping line {}: missing user or product", REVIEWS_TABLE, line_no);
            report.skipped_lines += 1;
            return;
        };

        let rating = match f64_from(&row.rating) {
            Some(r) if is_valid_rating(r) => r,
            _ => {
                debug!("{}: line {} has invalid rating {}", REVIEWS_TABLE, line_no, row.rating);
                report.skipped_ratings += 1;
                return;
            }
        };

        let mut record = Interaction::new(user, item, rating);
        record.timestamp = timestamp_from(&row);
        reviews.push(record);
    })?;
    Ok(reviews)
}

fn read_similar<R: BufRead>(reader: R, report: &mut LoadReport) -> Result<Vec<SimilarEdge>> {
    let mut edges = Vec::new();
    for_each_row::<SimilarRow, _, _>(reader, SIMILAR_TABLE, report, |row, line_no, report| {
        let (Some(product_asin), Some(similar_asin)) =
            (id_from(&row.product_asin), id_from(&row.similar_asin))
        else {
            warn!("{}: skipping line {}: missing asin", SIMILAR_TABLE, line_no);
            report.skipped_lines += 1;
            return;
        };
        edges.push(SimilarEdge {
            product_id: id_from(&row.product_id).unwrap_or_default(),
            product_asin,
            similar_asin,
        });
    })?;
    Ok(edges)
}
