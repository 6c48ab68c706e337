use clap::Parser;
use parking_lot::RwLock;
use snaprec::{RecommenderConfig, Recommender, RestApi, SimilarityMetric};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Collaborative-filtering recommender over the SNAP Amazon dataset
#[derive(Parser, Debug)]
#[command(name = "snaprec")]
#[command(about = "Collaborative-filtering recommender for SNAP Amazon data", long_about = None)]
struct Args {
    /// Directory holding products.jsonl, reviews.jsonl and similar_products.jsonl
    #[arg(short, long, default_value = "./data/processed")]
    data_dir: PathBuf,

    /// HTTP API port
    #[arg(long, default_value_t = 5000)]
    http_port: u16,

    /// HTTP bind address
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Log level (ignored when RUST_LOG is set)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// JSON recommender config
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    min_interactions: Option<usize>,

    /// cosine, pearson, jaccard or adjusted_cosine
    #[arg(long)]
    metric: Option<String>,

    #[arg(long)]
    seed: Option<u64>,

    /// Down-sample reviews to at most this many
    #[arg(long)]
    max_reviews: Option<usize>,
}

fn build_config(args: &Args) -> anyhow::Result<RecommenderConfig> {
    let mut config = match &args.config {
        Some(path) => RecommenderConfig::from_file(path)?,
        None => RecommenderConfig::default(),
    };
    if let Some(min) = args.min_interactions {
        config.min_interactions = min;
    }
    if let Some(metric) = &args.metric {
        config.metric = metric.parse::<SimilarityMetric>()?;
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if args.max_reviews.is_some() {
        config.max_reviews = args.max_reviews;
    }
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.log_level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => args.log_level.as_str(),
        _ => "info",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting snaprec v{}", env!("CARGO_PKG_VERSION"));
    info!("Data directory: {:?}", args.data_dir);
    info!("HTTP API: {}:{}", args.host, args.http_port);

    let config = build_config(&args)?;
    info!(
        "Config: metric={} min_interactions={} neighbors={} seed={}",
        config.metric, config.min_interactions, config.neighbors, config.seed
    );

    let mut recommender = Recommender::new(config);
    let report = recommender.load_from_dir(&args.data_dir)?;
    if report.skipped_lines > 0 || report.skipped_ratings > 0 {
        warn!(
            "Load skipped {} lines and {} ratings",
            report.skipped_lines, report.skipped_ratings
        );
    }

    // Similarity must be in place before concurrent requests arrive
    recommender.warm_up()?;
    info!("Recommender {}", recommender.state());

    let state = Arc::new(RwLock::new(recommender));
    let host = args.host.clone();
    let http_port = args.http_port;
    let http_handle = std::thread::spawn(move || {
        info!("Starting HTTP server on {}:{}", host, http_port);
        let sys = actix_web::rt::System::new();
        sys.block_on(async {
            if let Err(e) = RestApi::start(state, &host, http_port).await {
                eprintln!("HTTP server error: {}", e);
            }
        })
    });

    info!("snaprec started successfully");
    info!("HTTP API: http://{}:{}/api/stats", args.host, args.http_port);

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
        _ = tokio::task::spawn_blocking(move || {
            http_handle.join().ok();
        }) => {
            info!("HTTP server stopped");
        }
    }

    info!("Shutting down...");
    Ok(())
}
