//! Cart route handlers.
//!
//! Every mutation answers with the full updated cart so the client can
//! re-render without a second request.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use vitrine_core::{CartItemId, ProductId};

use crate::db::carts::{CartChange, MAX_LINE_QUANTITY};
use crate::db::{CartRepository, ProductRepository, RepositoryError};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::RequireAuth;
use crate::models::Cart;
use crate::routes::products::product_not_found;
use crate::state::AppState;
use crate::validation::{ValidationErrors, optional};

/// Add-to-cart body.
#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub product_id: ProductId,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
    pub size: Option<String>,
    pub color: Option<String>,
}

const fn default_quantity() -> i32 {
    1
}

/// Quantity update body. Zero removes the line.
#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    pub quantity: i32,
}

/// Navbar badge payload.
#[derive(Debug, Serialize)]
pub struct CartCount {
    pub count: i64,
}

/// The caller's cart.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Cart>> {
    let cart = CartRepository::new(state.pool()).get(user.id).await?;
    Ok(Json(cart))
}

/// Total units in the caller's cart.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn count(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<CartCount>> {
    let count = CartRepository::new(state.pool()).count(user.id).await?;
    Ok(Json(CartCount { count }))
}

/// Add a product variant to the cart.
#[instrument(skip_all, fields(user_id = %user.id, product_id = %body.product_id))]
pub async fn add_item(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(body): ApiJson<AddItemRequest>,
) -> Result<Json<Cart>> {
    let size = optional(body.size);
    let color = optional(body.color);

    let mut errors = ValidationErrors::new();
    check_quantity(&mut errors, body.quantity, 1);

    let product = ProductRepository::new(state.pool())
        .get(body.product_id)
        .await?
        .ok_or_else(product_not_found)?;
    if !product.active {
        return Err(AppError::BadRequest("Produto indisponível".to_string()));
    }
    if !product.accepts_size(size.as_deref()) {
        errors.add("size", "Selecione um tamanho válido");
    }
    if !product.accepts_color(color.as_deref()) {
        errors.add("color", "Selecione uma cor válida");
    }
    errors.finish()?;

    let carts = CartRepository::new(state.pool());
    let change = carts
        .add_item(
            user.id,
            product.id,
            body.quantity,
            size.as_deref(),
            color.as_deref(),
        )
        .await?;
    into_result(change, &product.name)?;

    add_breadcrumb("cart", "Added to cart", Some(&[("product", &product.name)]));
    info!(quantity = body.quantity, "Item added to cart");

    Ok(Json(carts.get(user.id).await?))
}

/// Set the quantity of a cart line; zero removes it.
#[instrument(skip_all, fields(user_id = %user.id, item_id = %id))]
pub async fn update_item(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(id): ApiPath<CartItemId>,
    ApiJson(body): ApiJson<UpdateItemRequest>,
) -> Result<Json<Cart>> {
    let mut errors = ValidationErrors::new();
    check_quantity(&mut errors, body.quantity, 0);
    errors.finish()?;

    let carts = CartRepository::new(state.pool());
    if body.quantity == 0 {
        carts
            .remove_item(user.id, id)
            .await
            .map_err(item_not_found)?;
    } else {
        match carts.set_quantity(user.id, id, body.quantity).await? {
            CartChange::Updated => {}
            CartChange::NotFound => return Err(item_not_found(RepositoryError::NotFound)),
            CartChange::InsufficientStock { available } => {
                return Err(AppError::BadRequest(format!(
                    "Estoque insuficiente (disponível: {available})"
                )));
            }
            CartChange::LineLimit { in_cart } => {
                return Err(AppError::BadRequest(line_limit_message(in_cart)));
            }
        }
    }

    Ok(Json(carts.get(user.id).await?))
}

/// Remove a cart line.
#[instrument(skip_all, fields(user_id = %user.id, item_id = %id))]
pub async fn remove_item(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(id): ApiPath<CartItemId>,
) -> Result<Json<Cart>> {
    let carts = CartRepository::new(state.pool());
    carts
        .remove_item(user.id, id)
        .await
        .map_err(item_not_found)?;
    Ok(Json(carts.get(user.id).await?))
}

/// Empty the cart.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn clear(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Cart>> {
    CartRepository::new(state.pool()).clear(user.id).await?;
    Ok(Json(Cart::empty()))
}

fn check_quantity(errors: &mut ValidationErrors, quantity: i32, min: i32) {
    if quantity < min {
        errors.add("quantity", format!("A quantidade mínima é {min}"));
    } else if quantity > MAX_LINE_QUANTITY {
        errors.add(
            "quantity",
            format!("A quantidade máxima é {MAX_LINE_QUANTITY}"),
        );
    }
}

fn into_result(change: CartChange, product_name: &str) -> Result<()> {
    match change {
        CartChange::Updated => Ok(()),
        CartChange::NotFound => Err(AppError::BadRequest("Produto indisponível".to_string())),
        CartChange::InsufficientStock { available } => Err(AppError::BadRequest(
            insufficient_stock_message(product_name, available),
        )),
        CartChange::LineLimit { in_cart } => Err(AppError::BadRequest(line_limit_message(in_cart))),
    }
}

fn line_limit_message(in_cart: i32) -> String {
    format!(
        "Limite de {MAX_LINE_QUANTITY} unidades por item (você já tem {in_cart} no carrinho)"
    )
}

pub(crate) fn insufficient_stock_message(product_name: &str, available: i32) -> String {
    if available <= 0 {
        format!("{product_name} está esgotado")
    } else {
        format!("Estoque insuficiente para {product_name} (disponível: {available})")
    }
}

fn item_not_found(err: RepositoryError) -> AppError {
    match err {
        RepositoryError::NotFound => AppError::NotFound("Item não encontrado no carrinho".to_string()),
        other => AppError::Database(other),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_quantity_bounds() {
        let mut errors = ValidationErrors::new();
        check_quantity(&mut errors, 1, 1);
        check_quantity(&mut errors, 0, 0);
        assert!(errors.is_empty());

        check_quantity(&mut errors, 0, 1);
        assert_eq!(errors.get("quantity"), Some("A quantidade mínima é 1"));

        let mut errors = ValidationErrors::new();
        check_quantity(&mut errors, MAX_LINE_QUANTITY + 1, 1);
        assert!(errors.get("quantity").is_some());
    }

    #[test]
    fn test_line_limit_is_a_bad_request() {
        let err = into_result(CartChange::LineLimit { in_cart: 60 }, "Meia").unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::BAD_REQUEST);
        assert_eq!(
            err.to_string(),
            "Bad request: Limite de 99 unidades por item (você já tem 60 no carrinho)"
        );
    }

    #[test]
    fn test_stock_messages_name_the_product() {
        assert_eq!(
            insufficient_stock_message("Tênis Corrida", 0),
            "Tênis Corrida está esgotado"
        );
        assert_eq!(
            insufficient_stock_message("Tênis Corrida", 2),
            "Estoque insuficiente para Tênis Corrida (disponível: 2)"
        );
    }

    #[test]
    fn test_add_request_defaults_quantity() {
        let body: AddItemRequest = serde_json::from_str(r#"{"product_id": 7}"#).unwrap();
        assert_eq!(body.quantity, 1);
        assert_eq!(body.product_id, ProductId::new(7));
        assert!(body.size.is_none());
    }
}
