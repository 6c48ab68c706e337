// End-to-end tests: JSON Lines on disk through the public snaprec API
use snaprec::prelude::*;
use snaprec::{CoPurchaseReport, ItemBasedPredictor, RatingPredictor, RecommenderState};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write_lines(dir: &Path, name: &str, lines: &[String]) {
    fs::write(dir.join(name), lines.join("\n")).unwrap();
}

/// Three categories, eight users, six catalog items plus one uncatalogued
/// item with a single rating
fn fixture_dir() -> TempDir {
    let dir = TempDir::new().unwrap();

    let products: Vec<String> = [
        ("1", "0827229534", "Patterns of Preaching", "Book", 12.0),
        ("2", "0738700797", "Candlemas", "Book", 9.5),
        ("3", "0486287785", "World War II Allied Fighter Planes", "Book", 4.0),
        ("4", "B00000AU3R", "Abbey Road", "Music", 15.0),
        ("5", "B00004WGA5", "The Matrix", "DVD", 19.99),
        ("6", "B000056PLX", "Kind of Blue", "Music", 11.0),
    ]
    .iter()
    .map(|(id, asin, title, group, price)| {
        format!(
            r#"{{"id": {id}, "asin": "{asin}", "title": "{title}", "group": "{group}", "salesrank": 1000, "avg_rating": 4.5, "total_reviews": 3, "price": {price}}}"#
        )
    })
    .collect();
    write_lines(dir.path(), "products.jsonl", &products);

    let ratings: &[(&str, &str, u8, &str)] = &[
        ("A1", "0827229534", 5, "2004-1-10"),
        ("A1", "0738700797", 4, "2004-1-11"),
        ("A1", "B00000AU3R", 2, "2004-1-12"),
        ("A2", "0827229534", 5, "2004-2-1"),
        ("A2", "0738700797", 5, "2004-2-2"),
        ("A2", "0486287785", 4, "2004-2-3"),
        ("A3", "0738700797", 4, "2004-3-1"),
        ("A3", "0486287785", 5, "2004-3-2"),
        ("A4", "B00000AU3R", 5, "2004-4-1"),
        ("A4", "B000056PLX", 5, "2004-4-2"),
        ("A4", "B00004WGA5", 3, "2004-4-3"),
        ("A5", "B00000AU3R", 4, "2004-5-1"),
        ("A5", "B000056PLX", 5, "2004-5-2"),
        ("A6", "B00004WGA5", 5, "2004-6-1"),
        ("A6", "0827229534", 2, "2004-6-2"),
        ("A7", "B00004WGA5", 3, "2004-7-1"),
        ("A7", "B000056PLX", 3, "2004-7-2"),
        ("A8", "0486287785", 1, "2004-8-1"),
        ("A8", "A8-unrated", 3, "2004-8-2"),
    ];
    let mut reviews: Vec<String> = ratings
        .iter()
        .map(|(user, asin, rating, date)| {
            format!(
                r#"{{"customer_id": "{user}", "product_asin": "{asin}", "rating": {rating}, "date": "{date}", "votes": 1, "helpful": 1}}"#
            )
        })
        .collect();
    reviews.push("{broken".to_string());
    reviews.push(r#"{"customer_id": "A9", "product_asin": "0827229534", "rating": 0}"#.to_string());
    write_lines(dir.path(), "reviews.jsonl", &reviews);

    let similar = vec![
        r#"{"product_id": 1, "product_asin": "0827229534", "similar_asin": "0738700797"}"#.to_string(),
        r#"{"product_id": 1, "product_asin": "0827229534", "similar_asin": "0486287785"}"#.to_string(),
    ];
    write_lines(dir.path(), "similar_products.jsonl", &similar);

    dir
}

fn loaded(min_interactions: usize) -> (TempDir, Recommender) {
    let dir = fixture_dir();
    let mut recommender = Recommender::new(RecommenderConfig {
        min_interactions,
        ..Default::default()
    });
    recommender.load_from_dir(dir.path()).unwrap();
    (dir, recommender)
}

#[test]
fn test_load_from_dir() {
    let (_dir, recommender) = loaded(2);
    assert_eq!(recommender.state(), RecommenderState::Loaded);

    let stats = recommender.stats();
    assert_eq!(stats.total_products, 6);
    assert_eq!(stats.total_ratings, 19);
    assert_eq!(stats.categories, 3);
    assert_eq!(stats.co_purchase_edges, 2);
    let prices = stats.price_range.unwrap();
    assert_eq!(prices.min, 4.0);
    assert_eq!(prices.max, 19.99);

    // A8-unrated has one rating, so it is filtered; A8 keeps only one item
    // after that but stays, since filtering is a single pass
    let matrix = recommender.matrix().unwrap();
    assert!(!matrix.contains_item("A8-unrated"));
    assert!(matrix.contains_user("A8"));
    for user in 0..matrix.n_users() {
        assert!(matrix.row(user).nnz() >= 1);
    }
}

#[test]
fn test_missing_directory_leaves_unloaded() {
    let mut recommender = Recommender::default();
    let err = recommender.load_from_dir("/definitely/not/here").unwrap_err();
    assert!(err.is_unavailable());
    assert_eq!(recommender.state(), RecommenderState::Unloaded);
}

#[test]
fn test_load_report_counts_skips() {
    let dir = fixture_dir();
    let (_, report) = DatasetLoader::new(dir.path()).load().unwrap();
    assert_eq!(report.skipped_lines, 1);
    assert_eq!(report.skipped_ratings, 1);
    assert!(report.similar_table_present);
}

#[test]
fn test_similarity_matrix_properties() {
    let (_dir, mut recommender) = loaded(2);
    for metric in SimilarityMetric::ALL {
        for axis in [Axis::User, Axis::Item] {
            let sim = recommender.compute_similarity(axis, metric).unwrap();
            let (lo, hi) = metric.range();
            for a in 0..sim.len() {
                assert_eq!(sim.score(a, a), 1.0);
                for b in 0..sim.len() {
                    let s = sim.score(a, b);
                    assert_eq!(s, sim.score(b, a), "{metric} {axis}");
                    assert!((lo..=hi).contains(&s), "{metric} {axis}: {s}");
                }
            }
        }
    }
    assert_eq!(recommender.state(), RecommenderState::Ready);
}

#[test]
fn test_every_method_returns_bounded_lists() {
    let (_dir, mut recommender) = loaded(2);
    recommender.warm_up().unwrap();
    for method in [
        RecommendMethod::UserBased,
        RecommendMethod::ItemBased,
        RecommendMethod::Hybrid,
        RecommendMethod::Popularity,
    ] {
        for n in [1, 3, 10] {
            let recs = recommender.recommend("A1", method, n).unwrap();
            assert!(recs.len() <= n, "{method} n={n}");
            assert!(recs.iter().all(|r| (1.0..=5.0).contains(&r.score)));
        }
    }
}

#[test]
fn test_unknown_user_never_errors() {
    let (_dir, mut recommender) = loaded(2);
    for method in [RecommendMethod::UserBased, RecommendMethod::Hybrid] {
        let recs = recommender.recommend("nobody", method, 4).unwrap();
        assert!(!recs.is_empty());
        assert!(recs.len() <= 4);
    }
}

#[test]
fn test_item_based_ignores_negative_neighbors() {
    let records = vec![
        Interaction::new("u1", "a", 5.0),
        Interaction::new("u1", "b", 1.0),
        Interaction::new("u2", "a", 1.0),
        Interaction::new("u2", "b", 5.0),
        Interaction::new("u3", "a", 5.0),
    ];
    let matrix = InteractionMatrix::build(&records, 1).unwrap();
    let sim = SimilarityMatrix::compute(&matrix, Axis::Item, SimilarityMetric::Pearson);
    let predictor = ItemBasedPredictor::new(&matrix, &sim).unwrap();

    let a = matrix.item_idx("a").unwrap();
    let b = matrix.item_idx("b").unwrap();
    assert!(sim.score(a, b) < 0.0);
    assert_eq!(predictor.predict(matrix.user_idx("u3").unwrap(), b), None);
}

#[test]
fn test_evaluate_on_loaded_data() {
    let (_dir, mut recommender) = loaded(2);
    recommender.prepare(RecommendMethod::ItemBased).unwrap();
    let report = recommender.evaluate(None, 5).unwrap();
    // A7 and A8 rated nothing 4 or above
    assert_eq!(report.test_users_count, 6);
    assert!((0.0..=1.0).contains(&report.f1_score));

    let only_a8 = recommender.evaluate(Some(&["A8".to_string()][..]), 5).unwrap();
    assert_eq!(only_a8.test_users_count, 0);
    assert_eq!(only_a8.precision, 0.0);
}

#[test]
fn test_co_purchase_for_product() {
    let (_dir, recommender) = loaded(2);
    match recommender.co_purchase_analysis("0827229534").unwrap() {
        CoPurchaseReport::Product(report) => {
            assert_eq!(report.similar_count, 2);
            assert_eq!(report.explored_neighbors, 2);
            // Reviewers of 0827229534: A1 A2 A6; of its neighbors: A1 A2 A3 A8
            assert_eq!(report.shared_users, vec!["A1", "A2"]);
            assert_eq!(report.neighbors[0].details.title, "Candlemas");
        }
        other => panic!("expected product report, got {other:?}"),
    }
}

#[test]
fn test_trending_uses_review_dates() {
    let (_dir, recommender) = loaded(2);
    // Newest review is 2004-8-2; 30 days back reaches 2004-7-3
    let trending = recommender.trending(None, 10).unwrap();
    let ids: Vec<&str> = trending.iter().map(|t| t.item_id.as_str()).collect();
    assert_eq!(ids, vec!["A8-unrated", "0486287785"]);
}

#[test]
fn test_metric_switch_changes_cache() {
    let (_dir, mut recommender) = loaded(2);
    recommender.warm_up().unwrap();
    assert!(recommender.is_prepared(RecommendMethod::Hybrid));

    recommender.set_metric(SimilarityMetric::Jaccard);
    assert!(!recommender.is_prepared(RecommendMethod::Hybrid));
    let recs = recommender.recommend("A2", RecommendMethod::UserBased, 3).unwrap();
    assert!(recs.len() <= 3);
    assert!(recommender.is_prepared(RecommendMethod::UserBased));
}
