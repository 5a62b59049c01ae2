//! Role and status enums.
//!
//! With the `postgres` feature these map onto the `shop.*` enum types
//! created by the storefront migrations.

use serde::{Deserialize, Serialize};

/// Error returned when parsing an enum from its string form fails.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid {kind}: {value}")]
pub struct ParseEnumError {
    kind: &'static str,
    value: String,
}

impl ParseEnumError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_owned(),
        }
    }
}

/// Generates `Display`, `FromStr` and `as_str` for a snake_case enum.
macro_rules! string_enum {
    ($name:ident, $kind:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            /// The snake_case name used in JSON and in the database.
            #[must_use]
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    _ => Err(ParseEnumError::new($kind, s)),
                }
            }
        }
    };
}

/// Account role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "shop.user_role", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Regular customer.
    #[default]
    User,
    /// Full access to the admin area.
    Admin,
}

string_enum!(UserRole, "user role", {
    User => "user",
    Admin => "admin",
});

impl UserRole {
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

/// Order lifecycle status.
///
/// The happy path is linear:
///
/// ```text
/// pending -> confirmed -> processing -> shipped -> delivered
/// ```
///
/// Any non-terminal order may be cancelled. Customers may only cancel while
/// the order is `pending` or `confirmed`; everything else is an admin action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "shop.order_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

string_enum!(OrderStatus, "order status", {
    Pending => "pending",
    Confirmed => "confirmed",
    Processing => "processing",
    Shipped => "shipped",
    Delivered => "delivered",
    Cancelled => "cancelled",
});

impl OrderStatus {
    /// All statuses in lifecycle order, cancelled last.
    pub const ALL: [Self; 6] = [
        Self::Pending,
        Self::Confirmed,
        Self::Processing,
        Self::Shipped,
        Self::Delivered,
        Self::Cancelled,
    ];

    /// No transition leaves a terminal status.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    /// Whether the customer who placed the order may still cancel it.
    #[must_use]
    pub const fn is_user_cancellable(&self) -> bool {
        matches!(self, Self::Pending | Self::Confirmed)
    }

    /// Whether an admin may move an order from `self` to `next`.
    ///
    /// Admins can set any status on an open order (including moving it back
    /// a step to correct a mistake). Setting the current status again is a
    /// no-op and allowed.
    #[must_use]
    pub fn can_transition_to(&self, next: Self) -> bool {
        *self == next || !self.is_terminal()
    }

    /// Portuguese label shown to customers.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Pending => "Pendente",
            Self::Confirmed => "Confirmado",
            Self::Processing => "Em preparação",
            Self::Shipped => "Enviado",
            Self::Delivered => "Entregue",
            Self::Cancelled => "Cancelado",
        }
    }
}

/// How the customer chose to pay at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "shop.payment_method", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    CreditCard,
    Pix,
    Boleto,
}

string_enum!(PaymentMethod, "payment method", {
    CreditCard => "credit_card",
    Pix => "pix",
    Boleto => "boleto",
});

/// Payment state, updated by admins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "shop.payment_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Failed,
    Refunded,
}

string_enum!(PaymentStatus, "payment status", {
    Pending => "pending",
    Paid => "paid",
    Failed => "failed",
    Refunded => "refunded",
});

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_user_role_roundtrip_strings() {
        assert_eq!("admin".parse::<UserRole>().unwrap(), UserRole::Admin);
        assert_eq!(UserRole::User.to_string(), "user");
        assert!("superuser".parse::<UserRole>().is_err());
        assert!(UserRole::Admin.is_admin());
        assert!(!UserRole::default().is_admin());
    }

    #[test]
    fn test_only_pending_and_confirmed_are_user_cancellable() {
        let cancellable: Vec<_> = OrderStatus::ALL
            .into_iter()
            .filter(OrderStatus::is_user_cancellable)
            .collect();
        assert_eq!(cancellable, [OrderStatus::Pending, OrderStatus::Confirmed]);
    }

    #[test]
    fn test_terminal_statuses_are_final() {
        for next in OrderStatus::ALL {
            let from_delivered = OrderStatus::Delivered.can_transition_to(next);
            let from_cancelled = OrderStatus::Cancelled.can_transition_to(next);
            assert_eq!(from_delivered, next == OrderStatus::Delivered);
            assert_eq!(from_cancelled, next == OrderStatus::Cancelled);
        }
    }

    #[test]
    fn test_open_orders_accept_any_status() {
        for from in [
            OrderStatus::Pending,
            OrderStatus::Confirmed,
            OrderStatus::Processing,
            OrderStatus::Shipped,
        ] {
            for next in OrderStatus::ALL {
                assert!(from.can_transition_to(next), "{from} -> {next}");
            }
        }
    }

    #[test]
    fn test_status_serde_is_snake_case() {
        let json = serde_json::to_string(&PaymentMethod::CreditCard).unwrap();
        assert_eq!(json, "\"credit_card\"");
        let status: OrderStatus = serde_json::from_str("\"shipped\"").unwrap();
        assert_eq!(status, OrderStatus::Shipped);
        assert_eq!(status.label(), "Enviado");
    }

    #[test]
    fn test_payment_status_parse() {
        assert_eq!("paid".parse::<PaymentStatus>().unwrap(), PaymentStatus::Paid);
        assert!("chargeback".parse::<PaymentStatus>().is_err());
    }
}
