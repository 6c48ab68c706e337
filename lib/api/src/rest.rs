use actix_cors::Cors;
use actix_web::{web, App, HttpResponse, HttpServer, Result as ActixResult};
use parking_lot::RwLock;
use serde::Deserialize;
use snaprec_core::Error;
use snaprec_recommend::{RecommendMethod, Recommender};
use std::sync::Arc;
use tracing::{debug, info};

/// Recommender shared between workers
pub type SharedRecommender = Arc<RwLock<Recommender>>;

const DEFAULT_N: usize = 10;

#[derive(Deserialize)]
struct RecommendQuery {
    method: Option<String>,
    n: Option<usize>,
}

#[derive(Deserialize)]
struct LimitQuery {
    n: Option<usize>,
}

#[derive(Deserialize)]
struct CategoryQuery {
    category: Option<String>,
    n: Option<usize>,
}

#[derive(Deserialize, Default)]
struct EvaluateRequest {
    test_users: Option<Vec<String>>,
    n: Option<usize>,
}

fn error_response(err: &Error) -> HttpResponse {
    let body = serde_json::json!({ "error": err.to_string() });
    if err.is_invalid_parameter() {
        HttpResponse::BadRequest().json(body)
    } else if err.is_unavailable() {
        HttpResponse::ServiceUnavailable().json(body)
    } else {
        HttpResponse::InternalServerError().json(body)
    }
}

/// Compute the similarity `method` needs once, under the write lock
fn ensure_prepared(state: &SharedRecommender, method: RecommendMethod) -> Result<(), Error> {
    if state.read().is_prepared(method) {
        return Ok(());
    }
    let mut recommender = state.write();
    if !recommender.is_prepared(method) {
        debug!("Preparing similarity for {}", method);
        recommender.prepare(method)?;
    }
    Ok(())
}

pub struct RestApi;

impl RestApi {
    pub async fn start(state: SharedRecommender, host: &str, port: u16) -> std::io::Result<()> {
        info!("Binding REST API on {}:{}", host, port);
        HttpServer::new(move || {
            let cors = Cors::default()
                .allow_any_origin()
                .allow_any_method()
                .allow_any_header()
                .max_age(3600);

            App::new()
                .wrap(cors)
                .app_data(web::Data::new(state.clone()))
                .configure(Self::configure)
        })
        .bind((host, port))?
        .run()
        .await
    }

    /// Register every route; the app must carry a `web::Data<SharedRecommender>`
    pub fn configure(cfg: &mut web::ServiceConfig) {
        cfg.service(
            web::scope("/api")
                .route("/recommendations/{user_id}", web::get().to(recommendations))
                .route("/similar/{item_id}", web::get().to(similar_items))
                .route("/co_purchasing/{id}", web::get().to(co_purchasing))
                .route("/trending", web::get().to(trending))
                .route("/popular", web::get().to(popular))
                .route("/best_sellers/{category}", web::get().to(best_sellers))
                .route("/evaluate", web::post().to(evaluate))
                .route("/users", web::get().to(users))
                .route("/categories", web::get().to(categories))
                .route("/stats", web::get().to(stats)),
        );
    }
}

async fn recommendations(
    state: web::Data<SharedRecommender>,
    path: web::Path<String>,
    query: web::Query<RecommendQuery>,
) -> ActixResult<HttpResponse> {
    let user_id = path.into_inner();
    let method = match query.method.as_deref().map(str::parse::<RecommendMethod>).transpose() {
        Ok(method) => method.unwrap_or_default(),
        Err(e) => return Ok(error_response(&e)),
    };
    let n = query.n.unwrap_or(DEFAULT_N);

    if let Err(e) = ensure_prepared(&state, method) {
        return Ok(error_response(&e));
    }
    match state.read().recommend_for_user(&user_id, method, n) {
        Ok(records) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "user_id": user_id,
            "method": method,
            "recommendations": records,
        }))),
        Err(e) => Ok(error_response(&e)),
    }
}

async fn similar_items(
    state: web::Data<SharedRecommender>,
    path: web::Path<String>,
    query: web::Query<LimitQuery>,
) -> ActixResult<HttpResponse> {
    let item_id = path.into_inner();
    if let Err(e) = ensure_prepared(&state, RecommendMethod::ItemBased) {
        return Ok(error_response(&e));
    }
    match state.read().similar_items(&item_id, query.n.unwrap_or(DEFAULT_N)) {
        Ok(items) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "item_id": item_id,
            "similar_items": items,
        }))),
        Err(e) => Ok(error_response(&e)),
    }
}

async fn co_purchasing(
    state: web::Data<SharedRecommender>,
    path: web::Path<String>,
) -> ActixResult<HttpResponse> {
    match state.read().co_purchase_analysis(&path.into_inner()) {
        Ok(report) => Ok(HttpResponse::Ok().json(report)),
        Err(e) => Ok(error_response(&e)),
    }
}

async fn trending(
    state: web::Data<SharedRecommender>,
    query: web::Query<CategoryQuery>,
) -> ActixResult<HttpResponse> {
    let n = query.n.unwrap_or(DEFAULT_N);
    match state.read().trending(query.category.as_deref(), n) {
        Ok(items) => Ok(HttpResponse::Ok().json(serde_json::json!({ "trending": items }))),
        Err(e) => Ok(error_response(&e)),
    }
}

async fn popular(
    state: web::Data<SharedRecommender>,
    query: web::Query<CategoryQuery>,
) -> ActixResult<HttpResponse> {
    let n = query.n.unwrap_or(DEFAULT_N);
    match state.read().best_sellers(query.category.as_deref(), n) {
        Ok(items) => Ok(HttpResponse::Ok().json(serde_json::json!({ "results": items }))),
        Err(e) => Ok(error_response(&e)),
    }
}

async fn best_sellers(
    state: web::Data<SharedRecommender>,
    path: web::Path<String>,
    query: web::Query<LimitQuery>,
) -> ActixResult<HttpResponse> {
    let category = path.into_inner();
    match state.read().best_sellers(Some(&category), query.n.unwrap_or(DEFAULT_N)) {
        Ok(items) => Ok(HttpResponse::Ok().json(serde_json::json!({ "results": items }))),
        Err(e) => Ok(error_response(&e)),
    }
}

async fn evaluate(
    state: web::Data<SharedRecommender>,
    body: Option<web::Json<EvaluateRequest>>,
) -> ActixResult<HttpResponse> {
    let req = body.map(web::Json::into_inner).unwrap_or_default();
    if let Err(e) = ensure_prepared(&state, RecommendMethod::ItemBased) {
        return Ok(error_response(&e));
    }
    match state
        .read()
        .evaluate(req.test_users.as_deref(), req.n.unwrap_or(DEFAULT_N))
    {
        Ok(report) => Ok(HttpResponse::Ok().json(report)),
        Err(e) => Ok(error_response(&e)),
    }
}

async fn users(state: web::Data<SharedRecommender>) -> ActixResult<HttpResponse> {
    match state.read().users() {
        Ok(users) => Ok(HttpResponse::Ok().json(serde_json::json!({ "users": users }))),
        Err(e) => Ok(error_response(&e)),
    }
}

async fn categories(state: web::Data<SharedRecommender>) -> ActixResult<HttpResponse> {
    match state.read().categories() {
        Ok(categories) => {
            Ok(HttpResponse::Ok().json(serde_json::json!({ "categories": categories })))
        }
        Err(e) => Ok(error_response(&e)),
    }
}

async fn stats(state: web::Data<SharedRecommender>) -> ActixResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(state.read().stats()))
}
