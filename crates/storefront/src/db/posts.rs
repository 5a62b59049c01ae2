//! Blog post repository.

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};

use vitrine_core::{Paginated, Pagination, PostId, Slug};

use super::{RepositoryError, like_pattern};
use crate::models::post::{Post, PostFilter, PostInput, PostSummary};
use crate::models::product::CategoryCount;

const POST_COLUMNS: &str = "id, title, slug, summary, content, author, category, read_time, \
                            image, published, published_at, created_at, updated_at";

const SUMMARY_COLUMNS: &str =
    "id, title, slug, summary, author, category, read_time, image, published, published_at";

/// Published posts first by publication date, drafts by creation.
const LIST_ORDER: &str = "published_at DESC NULLS LAST, created_at DESC, id DESC";

/// Number of recent posts shown beside an article.
pub const RECENT_LIMIT: i64 = 3;

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct PostRow {
    id: PostId,
    title: String,
    slug: String,
    summary: String,
    content: String,
    author: String,
    category: String,
    read_time: i32,
    image: Option<String>,
    published: bool,
    published_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PostRow> for Post {
    type Error = RepositoryError;

    fn try_from(row: PostRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            title: row.title,
            slug: parse_slug(&row.slug)?,
            summary: row.summary,
            content: row.content,
            author: row.author,
            category: row.category,
            read_time: row.read_time,
            image: row.image,
            published: row.published,
            published_at: row.published_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PostSummaryRow {
    id: PostId,
    title: String,
    slug: String,
    summary: String,
    author: String,
    category: String,
    read_time: i32,
    image: Option<String>,
    published: bool,
    published_at: Option<DateTime<Utc>>,
}

impl TryFrom<PostSummaryRow> for PostSummary {
    type Error = RepositoryError;

    fn try_from(row: PostSummaryRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            title: row.title,
            slug: parse_slug(&row.slug)?,
            summary: row.summary,
            author: row.author,
            category: row.category,
            read_time: row.read_time,
            image: row.image,
            published: row.published,
            published_at: row.published_at,
        })
    }
}

fn parse_slug(raw: &str) -> Result<Slug, RepositoryError> {
    Slug::parse(raw)
        .map_err(|e| RepositoryError::DataCorruption(format!("invalid slug in database: {e}")))
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for blog post database operations.
pub struct PostRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PostRepository<'a> {
    /// Create a new post repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List post summaries matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        filter: &PostFilter,
        pagination: &Pagination,
    ) -> Result<Paginated<PostSummary>, RepositoryError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM shop.post WHERE TRUE");
        push_filters(&mut count, filter);
        let total = count.build_query_scalar::<i64>().fetch_one(self.pool).await?;

        let mut query = QueryBuilder::<Postgres>::new(format!(
            "SELECT {SUMMARY_COLUMNS} FROM shop.post WHERE TRUE"
        ));
        push_filters(&mut query, filter);
        query
            .push(" ORDER BY ")
            .push(LIST_ORDER)
            .push(" LIMIT ")
            .push_bind(pagination.sql_limit())
            .push(" OFFSET ")
            .push_bind(pagination.offset());

        let rows = query
            .build_query_as::<PostSummaryRow>()
            .fetch_all(self.pool)
            .await?;
        let posts = rows
            .into_iter()
            .map(TryInto::try_into)
            .collect::<Result<Vec<PostSummary>, _>>()?;

        Ok(Paginated::new(posts, pagination, total))
    }

    /// Get a published post by slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_published_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<Post>, RepositoryError> {
        let row = sqlx::query_as::<_, PostRow>(&format!(
            "SELECT {POST_COLUMNS} FROM shop.post WHERE slug = $1 AND published"
        ))
        .bind(slug)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Get any post by ID, including drafts.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: PostId) -> Result<Option<Post>, RepositoryError> {
        let row = sqlx::query_as::<_, PostRow>(&format!(
            "SELECT {POST_COLUMNS} FROM shop.post WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Categories with at least one published post.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn categories(&self) -> Result<Vec<CategoryCount>, RepositoryError> {
        let categories = sqlx::query_as::<_, CategoryCount>(
            r"
            SELECT category, COUNT(*) AS count
            FROM shop.post
            WHERE published
            GROUP BY category
            ORDER BY category
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(categories)
    }

    /// Most recently published posts, excluding `exclude`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn recent(&self, exclude: PostId) -> Result<Vec<PostSummary>, RepositoryError> {
        let rows = sqlx::query_as::<_, PostSummaryRow>(&format!(
            r"
            SELECT {SUMMARY_COLUMNS}
            FROM shop.post
            WHERE published AND id <> $1
            ORDER BY {LIST_ORDER}
            LIMIT $2
            "
        ))
        .bind(exclude)
        .bind(RECENT_LIMIT)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Insert a post, stamping `published_at` when it goes out published.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug is taken.
    pub async fn create(&self, input: &PostInput) -> Result<Post, RepositoryError> {
        let row = sqlx::query_as::<_, PostRow>(&format!(
            r"
            INSERT INTO shop.post
                (title, slug, summary, content, author, category, read_time, image,
                 published, published_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, CASE WHEN $9 THEN NOW() END)
            RETURNING {POST_COLUMNS}
            "
        ))
        .bind(&input.title)
        .bind(input.slug.as_str())
        .bind(&input.summary)
        .bind(&input.content)
        .bind(&input.author)
        .bind(&input.category)
        .bind(input.read_time)
        .bind(&input.image)
        .bind(input.published)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique_violation(e, "slug"))?;

        row.try_into()
    }

    /// Replace a post's fields.
    ///
    /// `published_at` is set the first time the post is published and kept
    /// afterwards, even if it is later unpublished.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the post doesn't exist.
    /// Returns `RepositoryError::Conflict` if the slug is taken by another post.
    pub async fn update(&self, id: PostId, input: &PostInput) -> Result<Post, RepositoryError> {
        let row = sqlx::query_as::<_, PostRow>(&format!(
            r"
            UPDATE shop.post
            SET title = $2, slug = $3, summary = $4, content = $5, author = $6,
                category = $7, read_time = $8, image = $9, published = $10,
                published_at = CASE WHEN $10 THEN COALESCE(published_at, NOW())
                                    ELSE published_at END
            WHERE id = $1
            RETURNING {POST_COLUMNS}
            "
        ))
        .bind(id)
        .bind(&input.title)
        .bind(input.slug.as_str())
        .bind(&input.summary)
        .bind(&input.content)
        .bind(&input.author)
        .bind(&input.category)
        .bind(input.read_time)
        .bind(&input.image)
        .bind(input.published)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique_violation(e, "slug"))?
        .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }

    /// Delete a post.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the post doesn't exist.
    pub async fn delete(&self, id: PostId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.post WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Delete every post. Used by the seed command's `--clear`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn delete_all(&self) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.post")
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

fn push_filters(query: &mut QueryBuilder<'_, Postgres>, filter: &PostFilter) {
    if let Some(published) = filter.published {
        query.push(" AND published = ").push_bind(published);
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
            .push(" AND (title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR summary ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}
