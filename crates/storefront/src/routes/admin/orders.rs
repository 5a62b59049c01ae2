//! Admin order management.

use axum::{Json, extract::State};
use serde::Deserialize;
use tracing::{info, instrument};

use vitrine_core::{OrderId, OrderStatus, Paginated, Pagination, PaymentStatus};

use crate::db::OrderRepository;
use crate::db::orders::StatusChange;
use crate::error::{AppError, Result};
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::models::{Order, OrderFilter, OrderUpdate};
use crate::routes::orders::order_not_found;
use crate::state::AppState;
use crate::validation::{ValidationErrors, optional};

const MAX_TRACKING_CODE_LENGTH: usize = 50;

/// Order update body. Omitted fields are left unchanged; an empty
/// `tracking_code` clears it.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateOrderRequest {
    pub status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
    pub tracking_code: Option<String>,
}

impl UpdateOrderRequest {
    fn validate(self) -> std::result::Result<OrderUpdate, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let tracking_code = self.tracking_code.map(|code| optional(Some(code)));
        if let Some(Some(code)) = &tracking_code
            && code.chars().count() > MAX_TRACKING_CODE_LENGTH
        {
            errors.add(
                "tracking_code",
                format!("Máximo de {MAX_TRACKING_CODE_LENGTH} caracteres"),
            );
        }
        errors.finish()?;

        Ok(OrderUpdate {
            status: self.status,
            payment_status: self.payment_status,
            tracking_code,
        })
    }
}

/// List every order with its customer.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<OrderFilter>,
    ApiQuery(pagination): ApiQuery<Pagination>,
) -> Result<Json<Paginated<Order>>> {
    let page = OrderRepository::new(state.pool())
        .list(&filter, &pagination)
        .await?;
    Ok(Json(page))
}

/// Change status, payment status or tracking code.
#[instrument(skip_all, fields(order_id = %id))]
pub async fn update(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<OrderId>,
    ApiJson(body): ApiJson<UpdateOrderRequest>,
) -> Result<Json<Order>> {
    let update = body.validate()?;

    match OrderRepository::new(state.pool()).update(id, &update).await? {
        StatusChange::Updated(order) => {
            info!(status = %order.status, payment_status = %order.payment_status, "Order updated");
            Ok(Json(order))
        }
        StatusChange::NotFound => Err(order_not_found()),
        StatusChange::Rejected(current) => Err(AppError::BadRequest(format!(
            "Pedidos com status \"{}\" não podem mudar de status",
            current.label()
        ))),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_tracking_code_presence() {
        let update = UpdateOrderRequest::default().validate().unwrap();
        assert_eq!(update.tracking_code, None);

        let update = UpdateOrderRequest {
            tracking_code: Some("  ".to_string()),
            ..Default::default()
        }
        .validate()
        .unwrap();
        assert_eq!(update.tracking_code, Some(None));

        let update = UpdateOrderRequest {
            tracking_code: Some(" BR123456789 ".to_string()),
            status: Some(OrderStatus::Shipped),
            ..Default::default()
        }
        .validate()
        .unwrap();
        assert_eq!(update.tracking_code, Some(Some("BR123456789".to_string())));
        assert_eq!(update.status, Some(OrderStatus::Shipped));
    }

    #[test]
    fn test_long_tracking_code_rejected() {
        let errors = UpdateOrderRequest {
            tracking_code: Some("X".repeat(MAX_TRACKING_CODE_LENGTH + 1)),
            ..Default::default()
        }
        .validate()
        .unwrap_err();
        assert!(errors.get("tracking_code").is_some());
    }

    #[test]
    fn test_body_parses_snake_case_statuses() {
        let body: UpdateOrderRequest =
            serde_json::from_str(r#"{"status": "delivered", "payment_status": "paid"}"#).unwrap();
        assert_eq!(body.status, Some(OrderStatus::Delivered));
        assert_eq!(body.payment_status, Some(PaymentStatus::Paid));
    }
}
