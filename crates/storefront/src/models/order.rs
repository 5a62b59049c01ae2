//! Order domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use vitrine_core::{
    Email, OrderId, OrderItemId, OrderStatus, PaymentMethod, PaymentStatus, Price, ProductId,
    UserId,
};

/// Delivery address captured at checkout and stored denormalized on the order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    /// Recipient name.
    pub name: String,
    pub street: String,
    pub number: String,
    pub complement: Option<String>,
    pub neighborhood: String,
    pub city: String,
    /// Two-letter state code (UF), uppercase.
    pub state: String,
    /// CEP, 8 digits without punctuation.
    pub zip_code: String,
    pub phone: Option<String>,
}

/// A purchased line with the price paid.
#[derive(Debug, Clone, Serialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    /// `None` once the product has been deleted from the catalog.
    pub product_id: Option<ProductId>,
    pub product_name: String,
    pub product_image: Option<String>,
    pub quantity: i32,
    pub price: Price,
    pub size: Option<String>,
    pub color: Option<String>,
    pub line_total: Price,
}

/// Who placed an order (admin listings).
#[derive(Debug, Clone, Serialize)]
pub struct OrderCustomer {
    pub id: UserId,
    pub name: String,
    pub email: Email,
}

/// A placed order.
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub status: OrderStatus,
    pub status_label: &'static str,
    pub total: Price,
    pub total_display: String,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub shipping_address: ShippingAddress,
    pub tracking_code: Option<String>,
    pub notes: Option<String>,
    pub items: Vec<OrderItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer: Option<OrderCustomer>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated checkout data.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
}

/// Admin changes to an order. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct OrderUpdate {
    pub status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
    /// `Some(None)` clears the tracking code.
    pub tracking_code: Option<Option<String>>,
}

/// Admin order list filters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    /// Matches customer name or email.
    pub search: Option<String>,
}
