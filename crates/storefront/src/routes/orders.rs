//! Checkout and order history route handlers.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use tracing::{info, instrument, warn};

use vitrine_core::{OrderId, Paginated, Pagination, PaymentMethod};

use crate::db::OrderRepository;
use crate::db::orders::{CheckoutOutcome, StatusChange};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::middleware::{RequireAuth, has_admin_role};
use crate::models::{NewOrder, Order, ShippingAddress};
use crate::state::AppState;
use crate::validation::{ValidationErrors, optional};

const MAX_FIELD_LENGTH: usize = 120;
const MAX_NOTES_LENGTH: usize = 500;

/// Shipping address as typed by the shopper.
#[derive(Debug, Deserialize)]
pub struct AddressRequest {
    pub name: String,
    pub street: String,
    pub number: String,
    pub complement: Option<String>,
    pub neighborhood: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub phone: Option<String>,
}

/// Checkout body.
#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub shipping_address: AddressRequest,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
}

/// Place an order from the caller's cart.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn checkout(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(body): ApiJson<CheckoutRequest>,
) -> Result<(StatusCode, Json<Order>)> {
    let new_order = validate_checkout(body)?;

    let outcome = OrderRepository::new(state.pool())
        .checkout(user.id, &new_order)
        .await?;

    match outcome {
        CheckoutOutcome::Placed(order) => {
            let order_id = order.id.to_string();
            add_breadcrumb("order", "Order placed", Some(&[("order_id", &order_id)]));
            info!(order_id = %order.id, total = %order.total, "Order placed");
            Ok((StatusCode::CREATED, Json(order)))
        }
        CheckoutOutcome::EmptyCart => Err(AppError::BadRequest(
            "Seu carrinho está vazio".to_string(),
        )),
        CheckoutOutcome::Unavailable { product, available } => {
            warn!(%product, available, "Checkout refused for stock");
            Err(AppError::BadRequest(if available <= 0 {
                format!("{product} não está mais disponível")
            } else {
                format!("Estoque insuficiente para {product} (disponível: {available})")
            }))
        }
    }
}

/// The caller's orders, newest first.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiQuery(pagination): ApiQuery<Pagination>,
) -> Result<Json<Paginated<Order>>> {
    let page = OrderRepository::new(state.pool())
        .list_for_user(user.id, &pagination)
        .await?;
    Ok(Json(page))
}

/// One order. Admins can read any order; everyone else only their own.
///
/// The admin role is confirmed against the database so a demoted admin
/// loses access at once.
#[instrument(skip_all, fields(user_id = %user.id, order_id = %id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(id): ApiPath<OrderId>,
) -> Result<Json<Order>> {
    let repo = OrderRepository::new(state.pool());
    let order = if has_admin_role(state.pool(), &user).await? {
        repo.get(id).await?
    } else {
        repo.get_for_user(user.id, id).await?
    };
    order.map(Json).ok_or_else(order_not_found)
}

/// Cancel one of the caller's orders while it is still pending or confirmed.
#[instrument(skip_all, fields(user_id = %user.id, order_id = %id))]
pub async fn cancel(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(id): ApiPath<OrderId>,
) -> Result<Json<Order>> {
    match OrderRepository::new(state.pool())
        .cancel_for_user(user.id, id)
        .await?
    {
        StatusChange::Updated(order) => {
            info!("Order cancelled by customer");
            Ok(Json(order))
        }
        StatusChange::NotFound => Err(order_not_found()),
        StatusChange::Rejected(status) => Err(AppError::BadRequest(format!(
            "Pedidos com status \"{}\" não podem ser cancelados",
            status.label()
        ))),
    }
}

pub(crate) fn order_not_found() -> AppError {
    AppError::NotFound("Pedido não encontrado".to_string())
}

/// Validate the checkout body, normalizing the address.
fn validate_checkout(body: CheckoutRequest) -> std::result::Result<NewOrder, ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let address = body.shipping_address;

    let shipping_address = ShippingAddress {
        name: errors.required("shipping_address.name", &address.name, MAX_FIELD_LENGTH),
        street: errors.required("shipping_address.street", &address.street, MAX_FIELD_LENGTH),
        number: errors.required("shipping_address.number", &address.number, 20),
        complement: optional(address.complement),
        neighborhood: errors.required(
            "shipping_address.neighborhood",
            &address.neighborhood,
            MAX_FIELD_LENGTH,
        ),
        city: errors.required("shipping_address.city", &address.city, MAX_FIELD_LENGTH),
        state: errors.state("shipping_address.state", &address.state),
        zip_code: errors.cep("shipping_address.zip_code", &address.zip_code),
        phone: optional(address.phone),
    };

    let notes = optional(body.notes);
    if notes
        .as_ref()
        .is_some_and(|n| n.chars().count() > MAX_NOTES_LENGTH)
    {
        errors.add("notes", format!("Máximo de {MAX_NOTES_LENGTH} caracteres"));
    }

    errors.finish()?;

    Ok(NewOrder {
        shipping_address,
        payment_method: body.payment_method,
        notes,
    })
}
