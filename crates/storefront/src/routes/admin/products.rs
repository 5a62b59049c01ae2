//! Admin catalog management.

use axum::{Json, extract::State, http::StatusCode};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{info, instrument};

use vitrine_core::{Paginated, Pagination, Price, ProductId};

use crate::db::{ProductRepository, RepositoryError};
use crate::error::Result;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::models::{Product, ProductFilter, ProductInput};
use crate::routes::products::product_not_found;
use crate::state::AppState;
use crate::validation::{ValidationErrors, clean_list};

use super::Deleted;

const MAX_NAME_LENGTH: usize = 200;
const MAX_CATEGORY_LENGTH: usize = 60;
const MAX_DESCRIPTION_LENGTH: usize = 10_000;

/// Product create/replace body.
///
/// Also the shape of products in seed files.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    pub image: String,
    pub category: String,
    #[serde(default)]
    pub stock: i32,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub colors: Vec<String>,
    #[serde(default)]
    pub sizes: Vec<String>,
    pub specifications: Option<serde_json::Map<String, serde_json::Value>>,
}

const fn default_active() -> bool {
    true
}

impl ProductRequest {
    /// Check and normalize the request.
    ///
    /// # Errors
    ///
    /// Returns every invalid field.
    pub fn validate(self) -> std::result::Result<ProductInput, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let name = errors.required("name", &self.name, MAX_NAME_LENGTH);
        let image = errors.required("image", &self.image, 500);
        let category = errors.required("category", &self.category, MAX_CATEGORY_LENGTH);
        let description = self.description.trim().to_owned();
        if description.chars().count() > MAX_DESCRIPTION_LENGTH {
            errors.add(
                "description",
                format!("Máximo de {MAX_DESCRIPTION_LENGTH} caracteres"),
            );
        }

        // Checked after rounding to cents, which is what gets stored
        let price = Price::new(self.price);
        if !price.is_positive() {
            errors.add("price", "O preço deve ser maior que zero");
        } else if price.amount() > Price::MAX {
            errors.add("price", "Preço acima do permitido");
        }
        if self.stock < 0 {
            errors.add("stock", "O estoque não pode ser negativo");
        }

        errors.finish()?;

        Ok(ProductInput {
            name,
            description,
            price,
            image,
            category,
            stock: self.stock,
            active: self.active,
            colors: clean_list(self.colors),
            sizes: clean_list(self.sizes),
            specifications: self.specifications.filter(|s| !s.is_empty()),
        })
    }
}

/// List products, including inactive ones.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<ProductFilter>,
    ApiQuery(pagination): ApiQuery<Pagination>,
) -> Result<Json<Paginated<Product>>> {
    let page = ProductRepository::new(state.pool())
        .list(&filter, &pagination)
        .await?;
    Ok(Json(page))
}

/// Any product by ID.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<Json<Product>> {
    ProductRepository::new(state.pool())
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(product_not_found)
}

/// Create a product.
#[instrument(skip_all)]
pub async fn create(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<ProductRequest>,
) -> Result<(StatusCode, Json<Product>)> {
    let input = body.validate()?;
    let product = ProductRepository::new(state.pool()).create(&input).await?;
    info!(product_id = %product.id, "Product created");
    Ok((StatusCode::CREATED, Json(product)))
}

/// Replace a product.
#[instrument(skip_all, fields(product_id = %id))]
pub async fn update(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ProductId>,
    ApiJson(body): ApiJson<ProductRequest>,
) -> Result<Json<Product>> {
    let input = body.validate()?;
    let product = ProductRepository::new(state.pool())
        .update(id, &input)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => product_not_found(),
            other => other.into(),
        })?;
    info!("Product updated");
    Ok(Json(product))
}

/// Delete a product. Past orders keep their line snapshots.
#[instrument(skip(state))]
pub async fn delete(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<Json<Deleted>> {
    ProductRepository::new(state.pool())
        .delete(id)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => product_not_found(),
            other => other.into(),
        })?;
    info!("Product deleted");
    Ok(Json(Deleted {
        message: "Produto excluído",
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn request(json: serde_json::Value) -> ProductRequest {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_defaults_and_normalization() {
        let input = request(serde_json::json!({
            "name": " Tênis Corrida ",
            "price": "299.9",
            "image": "/img/tenis.jpg",
            "category": "calçados",
            "sizes": ["38", " 39 ", "38", ""]
        }))
        .validate()
        .unwrap();

        assert_eq!(input.name, "Tênis Corrida");
        assert_eq!(input.price, Price::from_cents(29_990));
        assert!(input.active);
        assert_eq!(input.stock, 0);
        assert_eq!(input.sizes, vec!["38".to_string(), "39".to_string()]);
        assert!(input.colors.is_empty());
    }

    #[test]
    fn test_rejects_bad_price_and_stock() {
        let errors = request(serde_json::json!({
            "name": "Boné",
            "price": 0,
            "image": "/img/bone.jpg",
            "category": "acessórios",
            "stock": -1
        }))
        .validate()
        .unwrap_err();

        assert!(errors.get("price").is_some());
        assert!(errors.get("stock").is_some());
        assert!(errors.get("name").is_none());
    }

    #[test]
    fn test_price_that_rounds_to_zero_is_rejected() {
        for price in ["0.001", "0.004"] {
            let errors = request(serde_json::json!({
                "name": "Adesivo",
                "price": price,
                "image": "/img/adesivo.jpg",
                "category": "acessórios"
            }))
            .validate()
            .unwrap_err();
            assert_eq!(errors.get("price"), Some("O preço deve ser maior que zero"), "{price}");
        }

        let input = request(serde_json::json!({
            "name": "Adesivo",
            "price": "0.005",
            "image": "/img/adesivo.jpg",
            "category": "acessórios"
        }))
        .validate();
        // Half-even rounding takes 0.005 to 0.00 as well
        assert!(input.is_err());
    }

    #[test]
    fn test_empty_specifications_are_dropped() {
        let input = request(serde_json::json!({
            "name": "Mochila",
            "price": 150,
            "image": "/img/mochila.jpg",
            "category": "acessórios",
            "specifications": {}
        }))
        .validate()
        .unwrap();
        assert!(input.specifications.is_none());
    }
}
