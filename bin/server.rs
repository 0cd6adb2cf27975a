// Receipt Lens - Web Server
// REST API with Axum over the bill parser and the recommender

use anyhow::{Context, Result};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use receipt_lens::{
    init_tracing, load_recommender, AppConfig, BillDigest, BillError, BillParser, Catalog,
    CategoryRules, CategoryTotal, FinancialInput, FinancialSnapshot, ForestConfig, LineItem,
    RecommendError, Recommender, ScanOutcome, ScanReport,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

/// Shared application state, read-only once the server starts
#[derive(Clone)]
struct AppState {
    parser: Arc<BillParser>,
    recommender: Arc<Recommender>,
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    fn ok(data: T) -> Response {
        let body = Self {
            success: true,
            data: Some(data),
            error: None,
        };
        (StatusCode::OK, Json(body)).into_response()
    }

    fn err(status: StatusCode, message: impl ToString) -> Response {
        let body = Self {
            success: false,
            data: None,
            error: Some(message.to_string()),
        };
        (status, Json(body)).into_response()
    }
}

#[derive(Deserialize)]
struct BillText {
    text: String,
}

/// Parsed bill response
#[derive(Serialize)]
struct ParsedBillResponse {
    classified_products: Vec<LineItem>,
    final_amount: Option<f64>,
}

/// Bill digest response
#[derive(Serialize)]
struct BillAnalysisResponse {
    item_count: usize,
    calculated_total: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_category: Option<CategoryTotal>,
    by_category: Vec<CategoryTotal>,
    digest: String,
}

#[derive(Deserialize)]
struct ProductRequest {
    product_id: String,
    #[serde(default = "default_method")]
    method: String,
}

#[derive(Deserialize)]
struct MethodQuery {
    #[serde(default = "default_method")]
    method: String,
}

fn default_method() -> String {
    "basic".to_string()
}

/// Recommendation response; `found: false` means no cheaper alternative exists
#[derive(Serialize)]
struct RecommendResponse {
    found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(flatten)]
    report: Option<ScanReport>,
}

impl From<ScanOutcome> for RecommendResponse {
    fn from(outcome: ScanOutcome) -> Self {
        match outcome {
            ScanOutcome::Found(report) => Self {
                found: true,
                message: None,
                report: Some(report),
            },
            outcome @ ScanOutcome::NoAlternativesFound { .. } => Self {
                found: false,
                message: Some(outcome.to_string().trim_end().to_string()),
                report: None,
            },
        }
    }
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({ "success": true, "data": "OK" }))
}

/// POST /api/parse-bill - Extract and classify products, total = sum of prices
async fn parse_bill(State(state): State<AppState>, Json(body): Json<BillText>) -> Response {
    info!(length = body.text.len(), "received /parse-bill request");

    match state.parser.parse(&body.text) {
        Ok(bill) => {
            info!(items = bill.items().len(), total = ?bill.total(), "bill parsed");
            let final_amount = bill.total();
            ApiResponse::ok(ParsedBillResponse {
                classified_products: bill.into_items(),
                final_amount,
            })
        }
        Err(e @ BillError::EmptyInput) => ApiResponse::<()>::err(StatusCode::BAD_REQUEST, e),
    }
}

/// POST /api/analyze-bill - Category digest for an external summarizer
async fn analyze_bill(State(state): State<AppState>, Json(body): Json<BillText>) -> Response {
    match state.parser.parse(&body.text) {
        Ok(bill) => {
            let digest = BillDigest::from_bill(&bill);
            ApiResponse::ok(BillAnalysisResponse {
                item_count: digest.item_count(),
                calculated_total: digest.calculated_total,
                top_category: digest.top_category().cloned(),
                digest: digest.to_string(),
                by_category: digest.by_category,
            })
        }
        Err(e @ BillError::EmptyInput) => ApiResponse::<()>::err(StatusCode::BAD_REQUEST, e),
    }
}

/// POST /api/analyze-finances - Income vs. expenses snapshot
async fn analyze_finances(Json(input): Json<FinancialInput>) -> Response {
    match FinancialSnapshot::compute(&input) {
        Ok(snapshot) => ApiResponse::ok(snapshot),
        Err(e) => ApiResponse::<()>::err(StatusCode::BAD_REQUEST, e),
    }
}

fn scan(state: &AppState, product_id: &str, method: &str) -> Response {
    match state.recommender.scan_product(product_id, method) {
        Ok(outcome) => ApiResponse::ok(RecommendResponse::from(outcome)),
        Err(e @ RecommendError::NotFound(_)) => ApiResponse::<()>::err(StatusCode::NOT_FOUND, e),
        Err(e @ RecommendError::InvalidMethod(_)) => {
            ApiResponse::<()>::err(StatusCode::BAD_REQUEST, e)
        }
    }
}

/// POST /api/recommend - Cheaper alternatives for a scanned product
async fn recommend(State(state): State<AppState>, Json(req): Json<ProductRequest>) -> Response {
    scan(&state, &req.product_id, &req.method)
}

/// GET /api/products/:product_id/alternatives?method=basic
/// `Path` has already percent-decoded the id exactly once.
async fn product_alternatives(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
    Query(query): Query<MethodQuery>,
) -> Response {
    scan(&state, &product_id, &query.method)
}

// ============================================================================
// Main Server
// ============================================================================

async fn load_state(config: &AppConfig) -> Result<AppState> {
    let rules = match &config.data.rules_path {
        Some(path) => CategoryRules::from_file(path)?,
        None => CategoryRules::default(),
    };

    // Catalog failures are fatal: nothing is served without a valid catalog
    let catalog = Catalog::load_csv(&config.data.catalog_path)?;

    let recommender = match load_recommender(catalog.clone(), &config.data.models_dir)? {
        Some(recommender) => recommender,
        None => {
            let models_dir = config.data.models_dir.clone();
            tokio::task::spawn_blocking(move || {
                let recommender = Recommender::trained(catalog, ForestConfig::default());
                if let Err(e) = receipt_lens::save_models(&recommender, &models_dir) {
                    error!("Failed to save trained models: {:#}", e);
                }
                recommender
            })
            .await
            .context("Model training task failed")?
        }
    };

    let parser = BillParser::new(rules);
    info!(categories = parser.rules().rule_count(), "category rules loaded");

    Ok(AppState {
        parser: Arc::new(parser),
        recommender: Arc::new(recommender),
    })
}

fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/parse-bill", post(parse_bill))
        .route("/analyze-bill", post(analyze_bill))
        .route("/analyze-finances", post(analyze_finances))
        .route("/recommend", post(recommend))
        .route("/products/:product_id/alternatives", get(product_alternatives))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(ServiceBuilder::new().layer(CorsLayer::permissive()))
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = AppConfig::from_env();
    info!("Starting server with config: {:?}", config);

    let state = load_state(&config).await?;

    let app = router(state);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("Server running on http://{}", addr);
    info!("  POST /api/parse-bill      - classified products + calculated total");
    info!("  POST /api/analyze-bill    - category digest");
    info!("  POST /api/recommend       - cheaper alternatives");

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================
