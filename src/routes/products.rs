use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::{AppError, AppResult, NotFoundExt},
    extract::{ApiJson, ApiQuery},
    models::{DocumentId, Product},
    routes::Tracked,
    state::AppState,
    store::Filter,
    types::{DataResponse, ListProductsQuery, ListResponse, ProductRequest},
};

pub const DEFAULT_LIMIT: u64 = 100;
pub const MAX_LIMIT: u64 = 1000;

// Checked before any storage call.
fn parse_id(raw: &str) -> AppResult<DocumentId> {
    raw.parse().map_err(|_| AppError::BadRequest("Invalid ID format".into()))
}

pub async fn list_products(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListProductsQuery>,
) -> AppResult<Json<ListResponse<Product>>> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT);
    if !(1..=MAX_LIMIT).contains(&limit) {
        return Err(AppError::InvalidInput(format!("limit must be between 1 and {}", MAX_LIMIT)));
    }

    let mut filter = Filter::new();
    if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        filter = filter.contains("name", search);
    }

    let total = state.products.count(&filter).await.tracked(&state.metrics)?;
    let products = state.products.find(&filter.limit(limit)).await.tracked(&state.metrics)?;
    state.metrics.inc_lists();
    Ok(Json(ListResponse { data: products, total: Some(total) }))
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<DataResponse<Product>>> {
    let id = parse_id(&id)?;
    let product =
        state.products.first(&Filter::by_id(id)).await.tracked(&state.metrics).or_not_found("Product")?;
    state.metrics.inc_lookups();
    Ok(Json(DataResponse::new(product)))
}

pub async fn create_product(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<ProductRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<Product>>)> {
    let mut product = req.into_product()?;
    state.products.create(&mut product).await.tracked(&state.metrics)?;
    state.metrics.inc_created();
    tracing::info!(id = ?product.id, "product created");
    Ok((StatusCode::CREATED, Json(DataResponse::new(product))))
}

pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<ProductRequest>,
) -> AppResult<Json<DataResponse<Product>>> {
    let id = parse_id(&id)?;
    let mut product = req.into_product()?;
    state
        .products
        .first(&Filter::by_id(id.clone()))
        .await
        .tracked(&state.metrics)
        .or_not_found("Product")?;

    product.id = Some(id);
    state.products.save(&mut product).await.tracked(&state.metrics)?;
    state.metrics.inc_saved();
    tracing::info!(id = ?product.id, "product updated");
    Ok(Json(DataResponse::new(product)))
}
