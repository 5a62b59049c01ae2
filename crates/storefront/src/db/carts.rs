//! Cart repository.
//!
//! Each user owns at most one cart, created lazily on the first add. Lines
//! are unique per (product, size, color); adding the same combination again
//! increases the quantity of the existing line, never past
//! [`MAX_LINE_QUANTITY`] or the stock.

use sqlx::{PgPool, Postgres, Transaction};

use vitrine_core::{CartId, CartItemId, Price, ProductId, UserId};

use super::RepositoryError;
use crate::models::cart::{Cart, CartLine};

/// Largest quantity a single cart line can hold.
pub const MAX_LINE_QUANTITY: i32 = 99;

/// Outcome of a quantity change on a cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartChange {
    Updated,
    /// The line (or product) does not exist in this user's cart.
    NotFound,
    /// The requested total quantity exceeds the stock.
    InsufficientStock { available: i32 },
    /// Merging would push the line past [`MAX_LINE_QUANTITY`].
    LineLimit { in_cart: i32 },
}

/// Check a merged line quantity against the line cap and the stock.
///
/// Returns `None` when `in_cart + added` fits.
#[must_use]
pub fn check_line_total(in_cart: i32, added: i32, stock: i32) -> Option<CartChange> {
    let total = in_cart.saturating_add(added);
    if total <= stock.min(MAX_LINE_QUANTITY) {
        None
    } else if stock < MAX_LINE_QUANTITY {
        Some(CartChange::InsufficientStock { available: stock })
    } else {
        Some(CartChange::LineLimit { in_cart })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CartLineRow {
    id: CartItemId,
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

impl From<CartLineRow> for CartLine {
    fn from(row: CartLineRow) -> Self {
        Self {
            id: row.id,
            product_id: row.product_id,
            available: row.active && row.quantity <= row.stock,
            line_total: row.price.line_total(row.quantity),
            name: row.name,
            image: row.image,
            price: row.price,
            quantity: row.quantity,
            size: row.size,
            color: row.color,
            stock: row.stock,
        }
    }
}

/// Repository for cart database operations.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Load the user's cart with current product data.
    ///
    /// Users who never added anything get an empty cart without a row
    /// being created.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get(&self, user_id: UserId) -> Result<Cart, RepositoryError> {
        let cart_id =
            sqlx::query_scalar::<_, CartId>("SELECT id FROM shop.cart WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(self.pool)
                .await?;

        let Some(cart_id) = cart_id else {
            return Ok(Cart::empty());
        };

        let rows = sqlx::query_as::<_, CartLineRow>(
            r"
            SELECT ci.id, ci.product_id, p.name, p.image, p.price, ci.quantity,
                   ci.size, ci.color, p.stock, p.active
            FROM shop.cart_item ci
            JOIN shop.product p ON p.id = ci.product_id
            WHERE ci.cart_id = $1
            ORDER BY ci.created_at, ci.id
            ",
        )
        .bind(cart_id)
        .fetch_all(self.pool)
        .await?;

        Ok(Cart::from_lines(
            Some(cart_id),
            rows.into_iter().map(CartLine::from).collect(),
        ))
    }

    /// Total units in the user's cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self, user_id: UserId) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>(
            r"
            SELECT COALESCE(SUM(ci.quantity), 0)::BIGINT
            FROM shop.cart_item ci
            JOIN shop.cart c ON c.id = ci.cart_id
            WHERE c.user_id = $1
            ",
        )
        .bind(user_id)
        .fetch_one(self.pool)
        .await?;

        Ok(count)
    }

    /// Add `quantity` units of a product variant, merging with an existing line.
    ///
    /// The product row is locked so the stock check and the write see the
    /// same stock value.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn add_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i32,
        size: Option<&str>,
        color: Option<&str>,
    ) -> Result<CartChange, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let Some(stock) = lock_active_stock(&mut tx, product_id).await? else {
            return Ok(CartChange::NotFound);
        };

        let cart_id = sqlx::query_scalar::<_, CartId>(
            r"
            INSERT INTO shop.cart (user_id) VALUES ($1)
            ON CONFLICT (user_id) DO UPDATE SET updated_at = NOW()
            RETURNING id
            ",
        )
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        let existing = sqlx::query_scalar::<_, i32>(
            r"
            SELECT quantity FROM shop.cart_item
            WHERE cart_id = $1 AND product_id = $2
              AND size IS NOT DISTINCT FROM $3 AND color IS NOT DISTINCT FROM $4
            ",
        )
        .bind(cart_id)
        .bind(product_id)
        .bind(size)
        .bind(color)
        .fetch_optional(&mut *tx)
        .await?
        .unwrap_or(0);

        if let Some(refusal) = check_line_total(existing, quantity, stock) {
            return Ok(refusal);
        }

        sqlx::query(
            r"
            INSERT INTO shop.cart_item AS ci (cart_id, product_id, quantity, size, color)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT ON CONSTRAINT cart_item_line_key
            DO UPDATE SET quantity = ci.quantity + EXCLUDED.quantity
            ",
        )
        .bind(cart_id)
        .bind(product_id)
        .bind(quantity)
        .bind(size)
        .bind(color)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(CartChange::Updated)
    }

    /// Set the quantity of one of the user's cart lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn set_quantity(
        &self,
        user_id: UserId,
        item_id: CartItemId,
        quantity: i32,
    ) -> Result<CartChange, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let product_id = sqlx::query_scalar::<_, ProductId>(
            r"
            SELECT ci.product_id
            FROM shop.cart_item ci
            JOIN shop.cart c ON c.id = ci.cart_id
            WHERE ci.id = $1 AND c.user_id = $2
            FOR UPDATE OF ci
            ",
        )
        .bind(item_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(product_id) = product_id else {
            return Ok(CartChange::NotFound);
        };

        let Some(stock) = lock_active_stock(&mut tx, product_id).await? else {
            return Ok(CartChange::NotFound);
        };
        if let Some(refusal) = check_line_total(0, quantity, stock) {
            return Ok(refusal);
        }

        sqlx::query("UPDATE shop.cart_item SET quantity = $2 WHERE id = $1")
            .bind(item_id)
            .bind(quantity)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(CartChange::Updated)
    }

    /// Remove one line from the user's cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the line isn't in this user's cart.
    pub async fn remove_item(
        &self,
        user_id: UserId,
        item_id: CartItemId,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            DELETE FROM shop.cart_item ci
            USING shop.cart c
            WHERE ci.cart_id = c.id AND ci.id = $1 AND c.user_id = $2
            ",
        )
        .bind(item_id)
        .bind(user_id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Remove every line from the user's cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn clear(&self, user_id: UserId) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            DELETE FROM shop.cart_item ci
            USING shop.cart c
            WHERE ci.cart_id = c.id AND c.user_id = $1
            ",
        )
        .bind(user_id)
        .execute(self.pool)
        .await?;

        Ok(())
    }
}

/// Lock an active product row and return its stock.
async fn lock_active_stock(
    tx: &mut Transaction<'_, Postgres>,
    product_id: ProductId,
) -> Result<Option<i32>, RepositoryError> {
    let stock = sqlx::query_scalar::<_, i32>(
        "SELECT stock FROM shop.product WHERE id = $1 AND active FOR SHARE",
    )
    .bind(product_id)
    .fetch_optional(&mut **tx)
    .await?;

    Ok(stock)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_within_limits() {
        assert_eq!(check_line_total(0, 1, 10), None);
        assert_eq!(check_line_total(60, 39, 200), None);
        assert_eq!(check_line_total(2, 3, 5), None);
    }

    #[test]
    fn test_merge_past_line_cap() {
        // Plenty of stock, but two adds of 60 would make a 120-unit line
        assert_eq!(
            check_line_total(60, 60, 200),
            Some(CartChange::LineLimit { in_cart: 60 })
        );
        assert_eq!(
            check_line_total(99, 1, 1_000),
            Some(CartChange::LineLimit { in_cart: 99 })
        );
    }

    #[test]
    fn test_merge_past_stock() {
        assert_eq!(
            check_line_total(2, 2, 3),
            Some(CartChange::InsufficientStock { available: 3 })
        );
        assert_eq!(
            check_line_total(0, 1, 0),
            Some(CartChange::InsufficientStock { available: 0 })
        );
    }
}
