use crate::errors::AppError;
use crate::models::*;
use crate::pipeline::{self, QueryOptions, SortKey, SortOrder, View};
use crate::recommender::{recommend, PLAN_CATALOG};
use crate::repository::CustomerRepository;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Default page size for the full customer listing.
pub const LIST_LIMIT: usize = 100;
/// Default page size for drill-down reports.
pub const REPORT_LIMIT: usize = 10;

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Customer data access with source fallback and caching.
    pub repository: Arc<CustomerRepository>,
}

/// Routes subject to rate limiting in production.
pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(home))
        .route("/plans", get(list_plans))
        .route("/customers", get(list_customers))
        .route("/recommend/:customer_id", get(get_recommendation))
        .route("/top_savings", get(top_savings))
        .route("/top_upsell", get(top_upsell))
        .route("/summary_stats", get(summary_stats))
}

/// Full application router without rate limiting.
pub fn router(state: Arc<AppState>) -> Router {
    compose(state, api_routes())
}

/// Mounts `/health` next to `api`, which callers may wrap in extra layers.
/// Health checks never pass through those layers.
pub fn compose(state: Arc<AppState>, api: Router<Arc<AppState>>) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(api)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

pub async fn home() -> &'static str {
    "Welcome to the Telecom Customer Insights API"
}

/// Health check endpoint.
///
/// Returns the service status, name and version.
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "service": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

/// GET /plans
///
/// Lists the plan catalog in ascending capacity order.
pub async fn list_plans() -> Json<PlanCatalogResponse> {
    Json(PlanCatalogResponse {
        plans: PLAN_CATALOG.to_vec(),
    })
}

/// GET /customers
///
/// Lists customers enriched with their recommendation. Supports `region`,
/// `sort`, `order` and `limit`; defaults to `customer_id` ascending, 100 rows.
pub async fn list_customers(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListQueryParams>,
) -> Json<CustomerListResponse> {
    tracing::info!("GET /customers - params: {:?}", params);

    let table = state.repository.load().await;
    let options = QueryOptions::new(View::All, SortKey::CustomerId, SortOrder::Ascending, LIST_LIMIT)
        .with_params(&params);
    let page = pipeline::query(&table, recommend, &options);

    Json(CustomerListResponse {
        customers: page.records,
        total: page.total,
    })
}

/// GET /recommend/:customer_id
///
/// Recommends a plan for a single customer.
///
/// # Returns
///
/// * `Result<Json<Recommendation>, AppError>` - The recommendation, or 404 when
///   the customer is unknown, the id is not a non-negative integer, or no
///   data is loaded.
pub async fn get_recommendation(
    State(state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
) -> Result<Json<Recommendation>, AppError> {
    tracing::info!("GET /recommend/{}", raw_id);

    let table = state.repository.load().await;
    if table.is_empty() {
        return Err(AppError::NoData);
    }

    // Malformed ids can never match a customer
    let customer_id: u64 = raw_id
        .parse()
        .map_err(|_| AppError::NotFound("Customer not found".to_string()))?;

    let customer = table
        .find(customer_id)
        .ok_or_else(|| AppError::NotFound("Customer not found".to_string()))?;

    Ok(Json(recommend(customer)))
}

/// GET /top_savings
///
/// Customers currently paying more than their recommended plan, largest
/// savings first, 10 rows by default.
pub async fn top_savings(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListQueryParams>,
) -> Json<TopSavingsResponse> {
    tracing::info!("GET /top_savings - params: {:?}", params);

    let table = state.repository.load().await;
    let options = QueryOptions::new(
        View::Savings,
        SortKey::EstimatedSavings,
        SortOrder::Descending,
        REPORT_LIMIT,
    )
    .with_params(&params);
    let page = pipeline::query(&table, recommend, &options);

    Json(TopSavingsResponse {
        top_savings: page.records,
        total: page.total,
    })
}

/// GET /top_upsell
///
/// Customers paying less than their recommended plan, most negative
/// savings first, 10 rows by default.
pub async fn top_upsell(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListQueryParams>,
) -> Json<TopUpsellResponse> {
    tracing::info!("GET /top_upsell - params: {:?}", params);

    let table = state.repository.load().await;
    let options = QueryOptions::new(
        View::Upsell,
        SortKey::EstimatedSavings,
        SortOrder::Ascending,
        REPORT_LIMIT,
    )
    .with_params(&params);
    let page = pipeline::query(&table, recommend, &options);

    Json(TopUpsellResponse {
        top_upsell: page.records,
        total: page.total,
    })
}

/// GET /summary_stats
///
/// Spend totals and savings/upsell opportunity counts, optionally scoped to
/// one region.
pub async fn summary_stats(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SummaryQueryParams>,
) -> Json<SummaryStats> {
    tracing::info!("GET /summary_stats - params: {:?}", params);

    let table = state.repository.load().await;
    Json(pipeline::summarize(&table, recommend, params.region.as_deref()))
}
