//! Product repository for catalog queries and admin management.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};

use vitrine_core::{Paginated, Pagination, Price, ProductId};

use super::{RepositoryError, like_pattern};
use crate::models::product::{CategoryCount, Product, ProductFilter, ProductInput};

const PRODUCT_COLUMNS: &str = "id, name, description, price, image, category, stock, active, \
                               colors, sizes, specifications, created_at, updated_at";

/// Number of related products shown on a product page.
pub const RELATED_LIMIT: i64 = 4;

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: ProductId,
    name: String,
    description: String,
    price: Price,
    image: String,
    category: String,
    stock: i32,
    active: bool,
    colors: Vec<String>,
    sizes: Vec<String>,
    specifications: Option<Json<Map<String, Value>>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            price_display: row.price.display(),
            price: row.price,
            image: row.image,
            category: row.category,
            stock: row.stock,
            active: row.active,
            colors: row.colors,
            sizes: row.sizes,
            specifications: row.specifications.map(|Json(map)| map),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List products matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        filter: &ProductFilter,
        pagination: &Pagination,
    ) -> Result<Paginated<Product>, RepositoryError> {
        let mut count =
            QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM shop.product WHERE TRUE");
        push_filters(&mut count, filter);
        let total = count.build_query_scalar::<i64>().fetch_one(self.pool).await?;

        let mut query = QueryBuilder::<Postgres>::new(format!(
            "SELECT {PRODUCT_COLUMNS} FROM shop.product WHERE TRUE"
        ));
        push_filters(&mut query, filter);
        query
            .push(" ORDER BY ")
            .push(filter.sort.order_by())
            .push(" LIMIT ")
            .push_bind(pagination.sql_limit())
            .push(" OFFSET ")
            .push_bind(pagination.offset());

        let rows = query
            .build_query_as::<ProductRow>()
            .fetch_all(self.pool)
            .await?;

        Ok(Paginated::new(
            rows.into_iter().map(Product::from).collect(),
            pagination,
            total,
        ))
    }

    /// Categories that have at least one active product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn categories(&self) -> Result<Vec<CategoryCount>, RepositoryError> {
        let categories = sqlx::query_as::<_, CategoryCount>(
            r"
            SELECT category, COUNT(*) AS count
            FROM shop.product
            WHERE active
            GROUP BY category
            ORDER BY category
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(categories)
    }

    /// Get a product by ID, active or not.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM shop.product WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Product::from))
    }

    /// Get a product visible in the storefront.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_active(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        Ok(self.get(id).await?.filter(|p| p.active))
    }

    /// Other active products from the same category, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn related(&self, product: &Product) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            SELECT {PRODUCT_COLUMNS}
            FROM shop.product
            WHERE active AND category = $1 AND id <> $2
            ORDER BY created_at DESC, id DESC
            LIMIT $3
            "
        ))
        .bind(&product.category)
        .bind(product.id)
        .bind(RELATED_LIMIT)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// Insert a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, input: &ProductInput) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            INSERT INTO shop.product
                (name, description, price, image, category, stock, active, colors, sizes, specifications)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.price)
        .bind(&input.image)
        .bind(&input.category)
        .bind(input.stock)
        .bind(input.active)
        .bind(&input.colors)
        .bind(&input.sizes)
        .bind(input.specifications.as_ref().map(Json))
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Replace every editable field of a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    pub async fn update(
        &self,
        id: ProductId,
        input: &ProductInput,
    ) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            UPDATE shop.product
            SET name = $2, description = $3, price = $4, image = $5, category = $6,
                stock = $7, active = $8, colors = $9, sizes = $10, specifications = $11
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.price)
        .bind(&input.image)
        .bind(&input.category)
        .bind(input.stock)
        .bind(input.active)
        .bind(&input.colors)
        .bind(&input.sizes)
        .bind(input.specifications.as_ref().map(Json))
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }

    /// Delete a product.
    ///
    /// Cart lines for it disappear; order lines keep their snapshot and
    /// lose the reference.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    pub async fn delete(&self, id: ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.product WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Delete every product. Used by the seed command's `--clear`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn delete_all(&self) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.product")
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

fn push_filters(query: &mut QueryBuilder<'_, Postgres>, filter: &ProductFilter) {
    if let Some(active) = filter.active {
        query.push(" AND active = ").push_bind(active);
    }
    if let Some(category) = filter.category.as_deref().filter(|c| !c.is_empty()) {
        query.push(" AND category = ").push_bind(category.to_owned());
    }
    if let Some(search) = filter
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        let pattern = like_pattern(search);
        query
            .push(" AND (name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR description ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(min) = filter.min_price {
        query.push(" AND price >= ").push_bind(min);
    }
    if let Some(max) = filter.max_price {
        query.push(" AND price <= ").push_bind(max);
    }
    if filter.in_stock {
        query.push(" AND stock > 0");
    }
}
