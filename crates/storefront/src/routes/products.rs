//! Public catalog route handlers.

use axum::{Json, extract::State};
use serde::Serialize;
use tracing::instrument;

use vitrine_core::{Paginated, Pagination, ProductId};

use crate::db::ProductRepository;
use crate::error::{AppError, Result};
use crate::extract::{ApiPath, ApiQuery};
use crate::models::{CategoryCount, Product, ProductFilter};
use crate::state::AppState;

/// Product page payload.
#[derive(Serialize)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: Product,
    pub related: Vec<Product>,
}

/// List active products.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<ProductFilter>,
    ApiQuery(pagination): ApiQuery<Pagination>,
) -> Result<Json<Paginated<Product>>> {
    let filter = ProductFilter {
        active: Some(true),
        ..filter
    };
    let page = ProductRepository::new(state.pool())
        .list(&filter, &pagination)
        .await?;
    Ok(Json(page))
}

/// Categories of active products with counts.
#[instrument(skip(state))]
pub async fn categories(State(state): State<AppState>) -> Result<Json<Vec<CategoryCount>>> {
    let categories = ProductRepository::new(state.pool()).categories().await?;
    Ok(Json(categories))
}

/// A single active product with related products.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<Json<ProductDetail>> {
    let repo = ProductRepository::new(state.pool());
    let product = repo
        .get_active(id)
        .await?
        .ok_or_else(product_not_found)?;
    let related = repo.related(&product).await?;

    Ok(Json(ProductDetail { product, related }))
}

pub(crate) fn product_not_found() -> AppError {
    AppError::NotFound("Produto não encontrado".to_string())
}
