use crate::config::RecommenderConfig;
use crate::copurchase::{self, CoPurchaseLimits};
use crate::evaluate::MetricAccumulator;
use crate::ranking::{
    diversified_by_category, merge_max, popularity_as_predictions, rank_predictions,
};
use crate::records::{
    CoPurchaseReport, EvaluationReport, ItemDetails, PopularRecord, PriceRange,
    RecommendMethod, RecommendationRecord, ScoredItem, SimilarItemRecord, Stats, TrendingRecord,
};
use crate::trending;
use ahash::AHashMap;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use snaprec_core::popularity::{rank_by_popularity, stats_from_catalog, stats_from_interactions};
use snaprec_core::{
    is_valid_rating, Catalog, Error, Interaction, InteractionMatrix, ItemStats, Result,
};
use snaprec_similarity::{
    Axis, ItemBasedPredictor, RatingPredictor, SimilarityMatrix, SimilarityMetric,
    UserBasedPredictor,
};
use snaprec_storage::{Dataset, DatasetLoader, LoadReport};
use std::borrow::Cow;
use std::fmt;
use std::path::Path;
use tracing::{debug, info, warn};

/// Lifecycle of a [`Recommender`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommenderState {
    /// No interaction data
    Unloaded,
    /// Matrix built, no similarity computed yet
    Loaded,
    /// At least one similarity matrix is cached
    Ready,
}

impl RecommenderState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecommenderState::Unloaded => "unloaded",
            RecommenderState::Loaded => "loaded",
            RecommenderState::Ready => "ready",
        }
    }
}

impl fmt::Display for RecommenderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn axes_for(method: RecommendMethod) -> &'static [Axis] {
    match method {
        RecommendMethod::UserBased => &[Axis::User],
        RecommendMethod::ItemBased => &[Axis::Item],
        RecommendMethod::Hybrid => &[Axis::User, Axis::Item],
        RecommendMethod::Popularity => &[],
    }
}

fn validate_n(n: usize) -> Result<()> {
    if n == 0 {
        return Err(Error::InvalidParameter("n must be positive".into()));
    }
    Ok(())
}

struct LoadedData {
    catalog: Catalog,
    reviews: Vec<Interaction>,
    /// `None` when nothing survived the density filter
    matrix: Option<InteractionMatrix>,
    survivors: (usize, usize),
    /// Item stats in popularity order
    popularity: Vec<ItemStats>,
    /// Item id -> sorted distinct reviewer ids, from the raw reviews
    reviewers: AHashMap<String, Vec<String>>,
}

impl LoadedData {
    fn known_user(&self, user_id: &str) -> Option<(&InteractionMatrix, usize)> {
        let matrix = self.matrix.as_ref()?;
        matrix.user_idx(user_id).map(|u| (matrix, u))
    }
}

/// Collaborative-filtering recommender over one loaded dataset.
///
/// Similarity matrices are computed on demand per `(axis, metric)` and
/// cached until [`Recommender::invalidate`]. Methods taking `&self` never
/// populate the cache: when the matrix they need is missing they compute a
/// throwaway copy. Callers serving concurrent reads should call
/// [`Recommender::prepare`] (or [`Recommender::warm_up`]) once beforehand.
pub struct Recommender {
    config: RecommenderConfig,
    data: Option<LoadedData>,
    cache: AHashMap<(Axis, SimilarityMetric), SimilarityMatrix>,
}

impl Recommender {
    pub fn new(config: RecommenderConfig) -> Self {
        Self {
            config,
            data: None,
            cache: AHashMap::new(),
        }
    }

    pub fn config(&self) -> &RecommenderConfig {
        &self.config
    }

    pub fn state(&self) -> RecommenderState {
        match (&self.data, self.cache.is_empty()) {
            (None, _) => RecommenderState::Unloaded,
            (Some(_), true) => RecommenderState::Loaded,
            (Some(_), false) => RecommenderState::Ready,
        }
    }

    pub fn metric(&self) -> SimilarityMetric {
        self.config.metric
    }

    /// The interaction matrix, `None` when unloaded or empty
    pub fn matrix(&self) -> Option<&InteractionMatrix> {
        self.data.as_ref().and_then(|d| d.matrix.as_ref())
    }

    pub fn catalog(&self) -> Option<&Catalog> {
        self.data.as_ref().map(|d| &d.catalog)
    }

    fn data(&self) -> Result<&LoadedData> {
        self.data.as_ref().ok_or(Error::NotLoaded)
    }

    /// Replace the current data with `dataset`.
    ///
    /// An empty matrix is not an error: the recommender becomes `Loaded` and
    /// every user is served as a cold-start user.
    pub fn load(&mut self, dataset: Dataset) -> Result<()> {
        self.data = None;
        self.cache.clear();

        let Dataset {
            products,
            mut reviews,
            similar,
        } = dataset;
        let catalog = Catalog::new(products, similar);

        let before = reviews.len();
        reviews.retain(|r| is_valid_rating(r.rating));
        if reviews.len() < before {
            warn!("Dropped {} reviews with malformed ratings", before - reviews.len());
        }

        let (matrix, survivors) =
            match InteractionMatrix::build(&reviews, self.config.min_interactions) {
                Ok(matrix) => {
                    let shape = matrix.shape();
                    (Some(matrix), shape)
                }
                Err(Error::EmptyMatrix { users, items }) => {
                    warn!(
                        "Empty matrix ({} users, {} items at min={}), cold start only",
                        users, items, self.config.min_interactions
                    );
                    (None, (users, items))
                }
                Err(e) => return Err(e),
            };

        let mut popularity = if reviews.is_empty() {
            stats_from_catalog(&catalog)
        } else {
            stats_from_interactions(&reviews)
        };
        rank_by_popularity(&mut popularity);

        let mut reviewers: AHashMap<String, Vec<String>> = AHashMap::new();
        for review in &reviews {
            reviewers
                .entry(review.item_id.clone())
                .or_default()
                .push(review.user_id.clone());
        }
        for users in reviewers.values_mut() {
            users.sort_unstable();
            users.dedup();
        }

        info!(
            "Recommender loaded: {} products, {} reviews, {} ranked items, {} categories",
            catalog.len(),
            reviews.len(),
            popularity.len(),
            catalog.categories().len()
        );

        self.data = Some(LoadedData {
            catalog,
            reviews,
            matrix,
            survivors,
            popularity,
            reviewers,
        });
        Ok(())
    }

    /// Load the tables under `dir`. On failure the recommender is left
    /// `Unloaded`.
    pub fn load_from_dir<P: AsRef<Path>>(&mut self, dir: P) -> Result<LoadReport> {
        let loader =
            DatasetLoader::new(dir).with_sampling(self.config.max_reviews, self.config.seed);
        let loaded = loader.load().map_err(|e| match e {
            Error::Io(io) => Error::DataUnavailable(format!(
                "failed reading {}: {}",
                loader.data_dir().display(),
                io
            )),
            other => other,
        });

        match loaded {
            Ok((dataset, report)) => {
                self.load(dataset)?;
                Ok(report)
            }
            Err(e) => {
                self.data = None;
                self.cache.clear();
                warn!("Load failed: {}", e);
                Err(e)
            }
        }
    }

    /// Compute (or fetch) the similarity matrix for `axis` under `metric`
    pub fn compute_similarity(
        &mut self,
        axis: Axis,
        metric: SimilarityMetric,
    ) -> Result<&SimilarityMatrix> {
        let data = self.data.as_ref().ok_or(Error::NotLoaded)?;
        let matrix = data.matrix.as_ref().ok_or(Error::EmptyMatrix {
            users: data.survivors.0,
            items: data.survivors.1,
        })?;
        Ok(self
            .cache
            .entry((axis, metric))
            .or_insert_with(|| SimilarityMatrix::compute(matrix, axis, metric)))
    }

    /// Cache whatever `method` needs under the configured metric
    pub fn prepare(&mut self, method: RecommendMethod) -> Result<()> {
        let data = self.data()?;
        if data.matrix.is_none() {
            return Ok(());
        }
        let metric = self.config.metric;
        for &axis in axes_for(method) {
            self.compute_similarity(axis, metric)?;
        }
        Ok(())
    }

    /// Cache both axes under the configured metric
    pub fn warm_up(&mut self) -> Result<()> {
        self.prepare(RecommendMethod::Hybrid)
    }

    pub fn is_prepared(&self, method: RecommendMethod) -> bool {
        match &self.data {
            None => false,
            Some(data) if data.matrix.is_none() => true,
            Some(_) => axes_for(method)
                .iter()
                .all(|&axis| self.cache.contains_key(&(axis, self.config.metric))),
        }
    }

    /// Drop every cached similarity matrix
    pub fn invalidate(&mut self) {
        if !self.cache.is_empty() {
            info!("Dropping {} cached similarity matrices", self.cache.len());
        }
        self.cache.clear();
    }

    pub fn set_metric(&mut self, metric: SimilarityMetric) {
        if self.config.metric != metric {
            info!("Similarity metric {} -> {}", self.config.metric, metric);
            self.config.metric = metric;
            self.invalidate();
        }
    }

    fn similarity(&self, matrix: &InteractionMatrix, axis: Axis) -> Cow<'_, SimilarityMatrix> {
        match self.cache.get(&(axis, self.config.metric)) {
            Some(cached) => Cow::Borrowed(cached),
            None => {
                debug!("{} similarity not prepared, computing uncached", axis);
                Cow::Owned(SimilarityMatrix::compute(matrix, axis, self.config.metric))
            }
        }
    }

    /// Top-`n` `(item, score)` list for `user_id`, caching similarities first
    pub fn recommend(
        &mut self,
        user_id: &str,
        method: RecommendMethod,
        n: usize,
    ) -> Result<Vec<ScoredItem>> {
        validate_n(n)?;
        if self.data()?.known_user(user_id).is_some() {
            self.prepare(method)?;
        }
        self.recommend_prepared(user_id, method, n)
    }

    /// Same as [`Recommender::recommend`] without touching the cache
    pub fn recommend_prepared(
        &self,
        user_id: &str,
        method: RecommendMethod,
        n: usize,
    ) -> Result<Vec<ScoredItem>> {
        validate_n(n)?;
        let data = self.data()?;
        if method == RecommendMethod::Popularity {
            return Ok(popularity_as_predictions(&data.popularity, n));
        }

        let Some((matrix, user)) = data.known_user(user_id) else {
            debug!("User {} not in interaction matrix, cold start", user_id);
            return Ok(self.cold_start_predictions(data, n));
        };

        match method {
            RecommendMethod::UserBased => self.user_based(data, matrix, user, n),
            RecommendMethod::ItemBased => self.item_based(data, matrix, user, n),
            RecommendMethod::Hybrid => {
                let half = n.div_ceil(2);
                let merged = merge_max(
                    self.user_based(data, matrix, user, half)?,
                    self.item_based(data, matrix, user, half)?,
                );
                Ok(rank_predictions(merged, &data.catalog, n))
            }
            RecommendMethod::Popularity => Ok(popularity_as_predictions(&data.popularity, n)),
        }
    }

    fn user_based(
        &self,
        data: &LoadedData,
        matrix: &InteractionMatrix,
        user: usize,
        n: usize,
    ) -> Result<Vec<ScoredItem>> {
        let similarity = self.similarity(matrix, Axis::User);
        let predictor = UserBasedPredictor::new(matrix, &similarity, self.config.neighbors)?;
        let neighbors = predictor.neighbors_of(user);
        if neighbors.is_empty() {
            debug!("No neighbors for {}, popularity fallback", matrix.user_id(user));
            return Ok(popularity_as_predictions(&data.popularity, n));
        }

        let rated = matrix.row(user);
        let predictions = (0..matrix.n_items())
            .filter(|&item| !rated.contains(item))
            .filter_map(|item| {
                predictor
                    .predict_with_neighbors(user, item, &neighbors)
                    .map(|score| ScoredItem::new(matrix.item_id(item), score))
            })
            .collect();
        Ok(rank_predictions(predictions, &data.catalog, n))
    }

    fn item_based(
        &self,
        data: &LoadedData,
        matrix: &InteractionMatrix,
        user: usize,
        n: usize,
    ) -> Result<Vec<ScoredItem>> {
        let similarity = self.similarity(matrix, Axis::Item);
        let predictor = ItemBasedPredictor::new(matrix, &similarity)?;
        Ok(Self::rank_item_based(data, matrix, &predictor, user, n))
    }

    fn rank_item_based(
        data: &LoadedData,
        matrix: &InteractionMatrix,
        predictor: &ItemBasedPredictor<'_>,
        user: usize,
        n: usize,
    ) -> Vec<ScoredItem> {
        let rated = matrix.row(user);
        if rated.is_empty() {
            return popularity_as_predictions(&data.popularity, n);
        }
        let predictions = (0..matrix.n_items())
            .filter(|&item| !rated.contains(item))
            .filter_map(|item| {
                predictor
                    .predict(user, item)
                    .map(|score| ScoredItem::new(matrix.item_id(item), score))
            })
            .collect();
        rank_predictions(predictions, &data.catalog, n)
    }

    fn cold_start_predictions(&self, data: &LoadedData, n: usize) -> Vec<ScoredItem> {
        diversified_by_category(&data.popularity, &data.catalog, n, self.config.seed)
            .into_iter()
            .map(|s| ScoredItem::new(s.item_id, s.avg_rating))
            .collect()
    }

    /// [`Recommender::recommend_prepared`] joined with catalog fields
    pub fn recommend_for_user(
        &self,
        user_id: &str,
        method: RecommendMethod,
        n: usize,
    ) -> Result<Vec<RecommendationRecord>> {
        let catalog = &self.data()?.catalog;
        Ok(self
            .recommend_prepared(user_id, method, n)?
            .into_iter()
            .map(|scored| RecommendationRecord {
                details: ItemDetails::lookup(catalog, &scored.item_id),
                item_id: scored.item_id,
                predicted_rating: scored.score,
            })
            .collect())
    }

    /// Top `n` items by `avg_rating * ln(1 + review_count)`
    pub fn popular_items(&self, n: usize) -> Result<Vec<ItemStats>> {
        validate_n(n)?;
        Ok(self.data()?.popularity.iter().take(n).cloned().collect())
    }

    /// Popular items restricted to one catalog category (case-insensitive)
    pub fn best_sellers(&self, category: Option<&str>, n: usize) -> Result<Vec<PopularRecord>> {
        validate_n(n)?;
        let data = self.data()?;
        Ok(data
            .popularity
            .iter()
            .filter(|s| match category {
                None => true,
                Some(wanted) => data
                    .catalog
                    .category_of(&s.item_id)
                    .is_some_and(|c| c.eq_ignore_ascii_case(wanted)),
            })
            .take(n)
            .map(|s| PopularRecord {
                item_id: s.item_id.clone(),
                popularity_score: s.popularity_score,
                review_avg_rating: s.avg_rating,
                review_count: s.review_count,
                details: ItemDetails::lookup(&data.catalog, &s.item_id),
            })
            .collect())
    }

    /// Popularity list spread across categories, for users with no history
    pub fn cold_start(&self, n: usize) -> Result<Vec<ItemStats>> {
        validate_n(n)?;
        let data = self.data()?;
        Ok(diversified_by_category(&data.popularity, &data.catalog, n, self.config.seed))
    }

    /// Most similar items by rating pattern; empty for items outside the matrix
    pub fn similar_items(&self, item_id: &str, n: usize) -> Result<Vec<SimilarItemRecord>> {
        validate_n(n)?;
        let data = self.data()?;
        let Some(matrix) = data.matrix.as_ref().filter(|m| m.contains_item(item_id)) else {
            debug!("Item {} not in interaction matrix", item_id);
            return Ok(Vec::new());
        };

        let similarity = self.similarity(matrix, Axis::Item);
        Ok(similarity
            .top_k(item_id, n)
            .into_iter()
            .map(|(item_id, score)| SimilarItemRecord {
                details: ItemDetails::lookup(&data.catalog, &item_id),
                item_id,
                similarity: score,
            })
            .collect())
    }

    /// User report when `id` is a matrix user, product report otherwise
    pub fn co_purchase_analysis(&self, id: &str) -> Result<CoPurchaseReport> {
        let data = self.data()?;
        let limits = CoPurchaseLimits {
            item_cap: self.config.copurchase_item_cap,
            user_cap: self.config.copurchase_user_cap,
        };
        Ok(match data.known_user(id) {
            Some((matrix, user)) => CoPurchaseReport::User(copurchase::analyze_user(
                matrix,
                &data.catalog,
                user,
                limits,
            )),
            None => CoPurchaseReport::Product(copurchase::analyze_product(
                &data.catalog,
                &data.reviewers,
                id,
                limits,
            )),
        })
    }

    pub fn trending(&self, category: Option<&str>, n: usize) -> Result<Vec<TrendingRecord>> {
        validate_n(n)?;
        let data = self.data()?;
        Ok(trending::trending(
            &data.reviews,
            &data.popularity,
            &data.catalog,
            category,
            self.config.trending_window_days,
            n,
        ))
    }

    /// Mean per-user precision/recall of item-based recommendations against
    /// each user's liked items.
    ///
    /// With `test_users == None` a seeded sample of `eval_sample_size` matrix
    /// users is drawn. Users outside the matrix or with nothing liked are
    /// skipped.
    pub fn evaluate(&self, test_users: Option<&[String]>, n: usize) -> Result<EvaluationReport> {
        validate_n(n)?;
        let data = self.data()?;
        let Some(matrix) = data.matrix.as_ref() else {
            return Ok(EvaluationReport::default());
        };

        let users: Vec<&str> = match test_users {
            Some(list) => list.iter().map(String::as_str).collect(),
            None => {
                let mut rng = StdRng::seed_from_u64(self.config.seed);
                let amount = self.config.eval_sample_size.min(matrix.n_users());
                rand::seq::index::sample(&mut rng, matrix.n_users(), amount)
                    .into_iter()
                    .map(|u| matrix.user_id(u))
                    .collect()
            }
        };

        let similarity = self.similarity(matrix, Axis::Item);
        let predictor = ItemBasedPredictor::new(matrix, &similarity)?;
        let mut acc = MetricAccumulator::new();

        for user_id in users {
            let Some(user) = matrix.user_idx(user_id) else {
                debug!("Skipping unknown test user {}", user_id);
                continue;
            };
            let liked: Vec<&str> = matrix
                .liked_items(user, self.config.liked_threshold)
                .into_iter()
                .map(|item| matrix.item_id(item))
                .collect();
            if liked.is_empty() {
                continue;
            }
            let ranked = Self::rank_item_based(data, matrix, &predictor, user, n);
            let recommended: Vec<&str> = ranked.iter().map(|s| s.item_id.as_str()).collect();
            acc.add(&recommended, &liked);
        }

        let report = acc.finish();
        info!(
            "Evaluated {} users: precision={:.4} recall={:.4} f1={:.4}",
            report.test_users_count, report.precision, report.recall, report.f1_score
        );
        Ok(report)
    }

    /// Matrix users, sorted
    pub fn users(&self) -> Result<Vec<String>> {
        Ok(self
            .data()?
            .matrix
            .as_ref()
            .map(|m| m.users().to_vec())
            .unwrap_or_default())
    }

    pub fn categories(&self) -> Result<Vec<String>> {
        Ok(self.data()?.catalog.categories())
    }

    pub fn stats(&self) -> Stats {
        let mut stats = Stats {
            state: self.state().to_string(),
            metric: self.config.metric.to_string(),
            total_products: 0,
            total_ratings: 0,
            total_users: 0,
            total_items: 0,
            categories: 0,
            avg_rating: 0.0,
            matrix_density: 0.0,
            co_purchase_edges: 0,
            price_range: None,
        };
        let Some(data) = &self.data else {
            return stats;
        };

        stats.total_products = data.catalog.len();
        stats.total_ratings = data.reviews.len();
        stats.categories = data.catalog.categories().len();
        stats.co_purchase_edges = data.catalog.edge_count();
        if !data.reviews.is_empty() {
            stats.avg_rating =
                data.reviews.iter().map(|r| r.rating).sum::<f64>() / data.reviews.len() as f64;
        }
        if let Some(matrix) = &data.matrix {
            stats.total_users = matrix.n_users();
            stats.total_items = matrix.n_items();
            stats.matrix_density = matrix.density();
        }

        let prices: Vec<f64> = data
            .catalog
            .products()
            .iter()
            .filter_map(|p| p.price)
            .collect();
        if !prices.is_empty() {
            stats.price_range = Some(PriceRange {
                min: prices.iter().copied().fold(f64::INFINITY, f64::min),
                max: prices.iter().copied().fold(f64::NEG_INFINITY, f64::max),
                avg: prices.iter().sum::<f64>() / prices.len() as f64,
            });
        }
        stats
    }
}

impl Default for Recommender {
    fn default() -> Self {
        Self::new(RecommenderConfig::default())
    }
}
