//! Aggregate queries for the admin dashboard.

use serde::Serialize;
use sqlx::PgPool;

use vitrine_core::{OrderStatus, Price, ProductId};

use super::RepositoryError;

/// Number of low-stock products listed on the dashboard.
const LOW_STOCK_LIMIT: i64 = 10;

/// Headline numbers for the admin dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    pub users: i64,
    pub products: i64,
    pub active_products: i64,
    pub posts: i64,
    pub published_posts: i64,
    pub orders: i64,
    /// Sum of all orders that were not cancelled.
    pub revenue: Price,
    pub revenue_display: String,
    pub orders_by_status: Vec<StatusCount>,
    pub low_stock: Vec<LowStockProduct>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct StatusCount {
    pub status: OrderStatus,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct LowStockProduct {
    pub id: ProductId,
    pub name: String,
    pub stock: i32,
}

#[derive(Debug, sqlx::FromRow)]
struct CountsRow {
    users: i64,
    products: i64,
    active_products: i64,
    posts: i64,
    published_posts: i64,
    orders: i64,
    revenue: Price,
}

/// Repository for dashboard queries.
pub struct DashboardRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> DashboardRepository<'a> {
    /// Create a new dashboard repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Collect dashboard statistics.
    ///
    /// Active products with `stock <= low_stock_threshold` are reported as
    /// low on stock.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn stats(&self, low_stock_threshold: i32) -> Result<DashboardStats, RepositoryError> {
        let counts = sqlx::query_as::<_, CountsRow>(
            r"
            SELECT
                (SELECT COUNT(*) FROM shop.user) AS users,
                (SELECT COUNT(*) FROM shop.product) AS products,
                (SELECT COUNT(*) FROM shop.product WHERE active) AS active_products,
                (SELECT COUNT(*) FROM shop.post) AS posts,
                (SELECT COUNT(*) FROM shop.post WHERE published) AS published_posts,
                (SELECT COUNT(*) FROM shop.order) AS orders,
                (SELECT COALESCE(SUM(total), 0)::NUMERIC(12, 2)
                   FROM shop.order WHERE status <> 'cancelled') AS revenue
            ",
        )
        .fetch_one(self.pool)
        .await?;

        let orders_by_status = sqlx::query_as::<_, StatusCount>(
            r"
            SELECT status, COUNT(*) AS count
            FROM shop.order
            GROUP BY status
            ORDER BY status
            ",
        )
        .fetch_all(self.pool)
        .await?;

        let low_stock = sqlx::query_as::<_, LowStockProduct>(
            r"
            SELECT id, name, stock
            FROM shop.product
            WHERE active AND stock <= $1
            ORDER BY stock, name
            LIMIT $2
            ",
        )
        .bind(low_stock_threshold)
        .bind(LOW_STOCK_LIMIT)
        .fetch_all(self.pool)
        .await?;

        Ok(DashboardStats {
            users: counts.users,
            products: counts.products,
            active_products: counts.active_products,
            posts: counts.posts,
            published_posts: counts.published_posts,
            orders: counts.orders,
            revenue_display: counts.revenue.display(),
            revenue: counts.revenue,
            orders_by_status,
            low_stock,
        })
    }
}
