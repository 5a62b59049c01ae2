//! Order repository: checkout, order history and admin order management.
//!
//! Checkout and cancellation run in a single transaction each so stock,
//! orders and carts never disagree.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};

use vitrine_core::{
    Email, OrderId, OrderItemId, OrderStatus, Paginated, Pagination, PaymentMethod,
    PaymentStatus, Price, ProductId, UserId,
};

use super::{RepositoryError, like_pattern};
use crate::models::order::{
    NewOrder, Order, OrderCustomer, OrderFilter, OrderItem, OrderUpdate, ShippingAddress,
};

const ORDER_SELECT: &str = r"
    SELECT o.id, o.user_id, o.status, o.total, o.payment_method, o.payment_status,
           o.shipping_address, o.tracking_code, o.notes, o.created_at, o.updated_at,
           u.name AS customer_name, u.email AS customer_email
    FROM shop.order o
    JOIN shop.user u ON u.id = o.user_id
";

// =============================================================================
// Outcomes
// =============================================================================

/// Result of a checkout attempt.
#[derive(Debug)]
pub enum CheckoutOutcome {
    Placed(Order),
    EmptyCart,
    /// A product is inactive or has less stock than the cart asks for.
    Unavailable { product: String, available: i32 },
}

/// Result of a status change.
#[derive(Debug)]
pub enum StatusChange {
    Updated(Order),
    NotFound,
    /// The order's current status does not allow the change.
    Rejected(OrderStatus),
}

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    user_id: UserId,
    status: OrderStatus,
    total: Price,
    payment_method: PaymentMethod,
    payment_status: PaymentStatus,
    shipping_address: Json<ShippingAddress>,
    tracking_code: Option<String>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    customer_name: String,
    customer_email: String,
}

impl OrderRow {
    fn into_order(
        self,
        items: Vec<OrderItem>,
        with_customer: bool,
    ) -> Result<Order, RepositoryError> {
        let customer = if with_customer {
            let email = Email::parse(&self.customer_email).map_err(|e| {
                RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
            })?;
            Some(OrderCustomer {
                id: self.user_id,
                name: self.customer_name,
                email,
            })
        } else {
            None
        };

        Ok(Order {
            id: self.id,
            user_id: self.user_id,
            status: self.status,
            status_label: self.status.label(),
            total: self.total,
            total_display: self.total.display(),
            payment_method: self.payment_method,
            payment_status: self.payment_status,
            shipping_address: self.shipping_address.0,
            tracking_code: self.tracking_code,
            notes: self.notes,
            items,
            customer,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    id: OrderItemId,
    order_id: OrderId,
    product_id: Option<ProductId>,
    product_name: String,
    product_image: Option<String>,
    quantity: i32,
    price: Price,
    size: Option<String>,
    color: Option<String>,
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        Self {
            id: row.id,
            product_id: row.product_id,
            line_total: row.price.line_total(row.quantity),
            product_name: row.product_name,
            product_image: row.product_image,
            quantity: row.quantity,
            price: row.price,
            size: row.size,
            color: row.color,
        }
    }
}

/// A cart line joined with its locked product row.
#[derive(Debug, sqlx::FromRow)]
struct CheckoutLineRow {
    product_id: ProductId,
    name: String,
    image: String,
    price: Price,
    quantity: i32,
    size: Option<String>,
    color: Option<String>,
    stock: i32,
    active: bool,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Turn the user's cart into an order.
    ///
    /// Product rows are locked in id order, prices are snapshotted onto the
    /// order items, stock is decremented and the cart is emptied. Nothing
    /// is written unless every line can be fulfilled.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn checkout(
        &self,
        user_id: UserId,
        order: &NewOrder,
    ) -> Result<CheckoutOutcome, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let lines = sqlx::query_as::<_, CheckoutLineRow>(
            r"
            SELECT ci.product_id, p.name, p.image, p.price, ci.quantity, ci.size, ci.color,
                   p.stock, p.active
            FROM shop.cart_item ci
            JOIN shop.cart c ON c.id = ci.cart_id
            JOIN shop.product p ON p.id = ci.product_id
            WHERE c.user_id = $1
            ORDER BY p.id, ci.id
            FOR UPDATE OF p
            ",
        )
        .bind(user_id)
        .fetch_all(&mut *tx)
        .await?;

        if lines.is_empty() {
            return Ok(CheckoutOutcome::EmptyCart);
        }

        // The same product can sit on several lines (one per size/color).
        let mut wanted: HashMap<ProductId, i32> = HashMap::new();
        for line in &lines {
            *wanted.entry(line.product_id).or_default() += line.quantity;
        }
        for line in &lines {
            let needed = wanted.get(&line.product_id).copied().unwrap_or(line.quantity);
            if !line.active || needed > line.stock {
                return Ok(CheckoutOutcome::Unavailable {
                    product: line.name.clone(),
                    available: if line.active { line.stock } else { 0 },
                });
            }
        }

        let total: Price = lines.iter().map(|l| l.price.line_total(l.quantity)).sum();

        let order_id = sqlx::query_scalar::<_, OrderId>(
            r"
            INSERT INTO shop.order (user_id, total, payment_method, shipping_address, notes)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            ",
        )
        .bind(user_id)
        .bind(total)
        .bind(order.payment_method)
        .bind(Json(&order.shipping_address))
        .bind(&order.notes)
        .fetch_one(&mut *tx)
        .await?;

        for line in &lines {
            sqlx::query(
                r"
                INSERT INTO shop.order_item
                    (order_id, product_id, product_name, product_image, quantity, price, size, color)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                ",
            )
            .bind(order_id)
            .bind(line.product_id)
            .bind(&line.name)
            .bind(&line.image)
            .bind(line.quantity)
            .bind(line.price)
            .bind(&line.size)
            .bind(&line.color)
            .execute(&mut *tx)
            .await?;
        }

        for (product_id, quantity) in &wanted {
            let result = sqlx::query(
                "UPDATE shop.product SET stock = stock - $2 WHERE id = $1 AND stock >= $2",
            )
            .bind(*product_id)
            .bind(*quantity)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                return Err(RepositoryError::Conflict(format!(
                    "stock changed during checkout for product {product_id}"
                )));
            }
        }

        sqlx::query(
            r"
            DELETE FROM shop.cart_item ci
            USING shop.cart c
            WHERE ci.cart_id = c.id AND c.user_id = $1
            ",
        )
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        let placed = fetch_order(&mut tx, order_id, false)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        tx.commit().await?;

        Ok(CheckoutOutcome::Placed(placed))
    }

    /// The user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_for_user(
        &self,
        user_id: UserId,
        pagination: &Pagination,
    ) -> Result<Paginated<Order>, RepositoryError> {
        let total =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM shop.order WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(self.pool)
                .await?;

        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "{ORDER_SELECT} WHERE o.user_id = $1 ORDER BY o.created_at DESC, o.id DESC LIMIT $2 OFFSET $3"
        ))
        .bind(user_id)
        .bind(pagination.sql_limit())
        .bind(pagination.offset())
        .fetch_all(self.pool)
        .await?;

        let orders = self.attach_items(rows, false).await?;
        Ok(Paginated::new(orders, pagination, total))
    }

    /// Get one of the user's orders.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get_for_user(
        &self,
        user_id: UserId,
        order_id: OrderId,
    ) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "{ORDER_SELECT} WHERE o.id = $1 AND o.user_id = $2"
        ))
        .bind(order_id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        Ok(self.attach_items(vec![row], false).await?.pop())
    }

    /// Get any order with its customer (admin).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get(&self, order_id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!("{ORDER_SELECT} WHERE o.id = $1"))
            .bind(order_id)
            .fetch_optional(self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        Ok(self.attach_items(vec![row], true).await?.pop())
    }

    /// Cancel one of the user's orders while it is still pending or confirmed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn cancel_for_user(
        &self,
        user_id: UserId,
        order_id: OrderId,
    ) -> Result<StatusChange, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let status = sqlx::query_scalar::<_, OrderStatus>(
            "SELECT status FROM shop.order WHERE id = $1 AND user_id = $2 FOR UPDATE",
        )
        .bind(order_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(status) = status else {
            return Ok(StatusChange::NotFound);
        };
        if !status.is_user_cancellable() {
            return Ok(StatusChange::Rejected(status));
        }

        sqlx::query("UPDATE shop.order SET status = 'cancelled' WHERE id = $1")
            .bind(order_id)
            .execute(&mut *tx)
            .await?;
        restore_stock(&mut tx, order_id).await?;

        let order = fetch_order(&mut tx, order_id, false)
            .await?
            .ok_or(RepositoryError::NotFound)?;
        tx.commit().await?;

        Ok(StatusChange::Updated(order))
    }

    /// List all orders for the admin area, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list(
        &self,
        filter: &OrderFilter,
        pagination: &Pagination,
    ) -> Result<Paginated<Order>, RepositoryError> {
        let mut count = QueryBuilder::<Postgres>::new(
            "SELECT COUNT(*) FROM shop.order o JOIN shop.user u ON u.id = o.user_id WHERE TRUE",
        );
        push_filters(&mut count, filter);
        let total = count.build_query_scalar::<i64>().fetch_one(self.pool).await?;

        let mut query = QueryBuilder::<Postgres>::new(ORDER_SELECT);
        query.push(" WHERE TRUE");
        push_filters(&mut query, filter);
        query
            .push(" ORDER BY o.created_at DESC, o.id DESC LIMIT ")
            .push_bind(pagination.sql_limit())
            .push(" OFFSET ")
            .push_bind(pagination.offset());

        let rows = query
            .build_query_as::<OrderRow>()
            .fetch_all(self.pool)
            .await?;

        let orders = self.attach_items(rows, true).await?;
        Ok(Paginated::new(orders, pagination, total))
    }

    /// Apply admin changes to an order.
    ///
    /// Terminal orders keep their status. Moving an order into `cancelled`
    /// puts its items back in stock.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn update(
        &self,
        order_id: OrderId,
        update: &OrderUpdate,
    ) -> Result<StatusChange, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_scalar::<_, OrderStatus>(
            "SELECT status FROM shop.order WHERE id = $1 FOR UPDATE",
        )
        .bind(order_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(current) = current else {
            return Ok(StatusChange::NotFound);
        };

        if let Some(next) = update.status {
            if !current.can_transition_to(next) {
                return Ok(StatusChange::Rejected(current));
            }
            if next == OrderStatus::Cancelled && current != OrderStatus::Cancelled {
                restore_stock(&mut tx, order_id).await?;
            }
        }

        sqlx::query(
            r"
            UPDATE shop.order
            SET status = COALESCE($2, status),
                payment_status = COALESCE($3, payment_status),
                tracking_code = CASE WHEN $4 THEN $5 ELSE tracking_code END
            WHERE id = $1
            ",
        )
        .bind(order_id)
        .bind(update.status)
        .bind(update.payment_status)
        .bind(update.tracking_code.is_some())
        .bind(update.tracking_code.clone().flatten())
        .execute(&mut *tx)
        .await?;

        let order = fetch_order(&mut tx, order_id, true)
            .await?
            .ok_or(RepositoryError::NotFound)?;
        tx.commit().await?;

        Ok(StatusChange::Updated(order))
    }

    async fn attach_items(
        &self,
        rows: Vec<OrderRow>,
        with_customer: bool,
    ) -> Result<Vec<Order>, RepositoryError> {
        let ids: Vec<i32> = rows.iter().map(|r| r.id.as_i32()).collect();
        let items = sqlx::query_as::<_, OrderItemRow>(
            r"
            SELECT id, order_id, product_id, product_name, product_image, quantity, price,
                   size, color
            FROM shop.order_item
            WHERE order_id = ANY($1)
            ORDER BY id
            ",
        )
        .bind(&ids)
        .fetch_all(self.pool)
        .await?;

        group_items(rows, items, with_customer)
    }
}

fn group_items(
    rows: Vec<OrderRow>,
    items: Vec<OrderItemRow>,
    with_customer: bool,
) -> Result<Vec<Order>, RepositoryError> {
    let mut by_order: HashMap<OrderId, Vec<OrderItem>> = HashMap::new();
    for item in items {
        by_order.entry(item.order_id).or_default().push(item.into());
    }

    rows.into_iter()
        .map(|row| {
            let items = by_order.remove(&row.id).unwrap_or_default();
            row.into_order(items, with_customer)
        })
        .collect()
}

async fn fetch_order(
    tx: &mut Transaction<'_, Postgres>,
    order_id: OrderId,
    with_customer: bool,
) -> Result<Option<Order>, RepositoryError> {
    let row = sqlx::query_as::<_, OrderRow>(&format!("{ORDER_SELECT} WHERE o.id = $1"))
        .bind(order_id)
        .fetch_optional(&mut **tx)
        .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let items = sqlx::query_as::<_, OrderItemRow>(
        r"
        SELECT id, order_id, product_id, product_name, product_image, quantity, price,
               size, color
        FROM shop.order_item
        WHERE order_id = $1
        ORDER BY id
        ",
    )
    .bind(order_id)
    .fetch_all(&mut **tx)
    .await?;

    Ok(group_items(vec![row], items, with_customer)?.pop())
}

/// Return an order's units to stock. Deleted products are skipped.
async fn restore_stock(
    tx: &mut Transaction<'_, Postgres>,
    order_id: OrderId,
) -> Result<(), RepositoryError> {
    sqlx::query(
        r"
        UPDATE shop.product p
        SET stock = p.stock + oi.quantity
        FROM (
            SELECT product_id, SUM(quantity)::INTEGER AS quantity
            FROM shop.order_item
            WHERE order_id = $1 AND product_id IS NOT NULL
            GROUP BY product_id
        ) oi
        WHERE p.id = oi.product_id
        ",
    )
    .bind(order_id)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

fn push_filters(query: &mut QueryBuilder<'_, Postgres>, filter: &OrderFilter) {
    if let Some(status) = filter.status {
        query.push(" AND o.status = ").push_bind(status);
    }
    if let Some(search) = filter
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        let pattern = like_pattern(search);
        query
            .push(" AND (u.name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR u.email ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}
