//! Public blog route handlers.

use axum::{Json, extract::State};
use serde::Serialize;
use tracing::instrument;

use vitrine_core::{Paginated, Pagination};

use crate::db::PostRepository;
use crate::error::{AppError, Result};
use crate::extract::{ApiPath, ApiQuery};
use crate::models::{CategoryCount, Post, PostFilter, PostSummary};
use crate::state::AppState;

/// Article page payload.
#[derive(Serialize)]
pub struct PostDetail {
    #[serde(flatten)]
    pub post: Post,
    pub content_html: String,
    pub recent: Vec<PostSummary>,
}

/// List published posts, newest first.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<PostFilter>,
    ApiQuery(pagination): ApiQuery<Pagination>,
) -> Result<Json<Paginated<PostSummary>>> {
    let filter = PostFilter {
        published: Some(true),
        ..filter
    };
    let page = PostRepository::new(state.pool())
        .list(&filter, &pagination)
        .await?;
    Ok(Json(page))
}

/// Categories with published posts.
#[instrument(skip(state))]
pub async fn categories(State(state): State<AppState>) -> Result<Json<Vec<CategoryCount>>> {
    let categories = PostRepository::new(state.pool()).categories().await?;
    Ok(Json(categories))
}

/// A published post with its rendered body.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    ApiPath(slug): ApiPath<String>,
) -> Result<Json<PostDetail>> {
    let repo = PostRepository::new(state.pool());
    let post = repo
        .get_published_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound("Artigo não encontrado".to_string()))?;

    let content_html = state
        .markdown()
        .render_post(post.id, post.updated_at, &post.content)
        .await;
    let recent = repo.recent(post.id).await?;

    Ok(Json(PostDetail {
        post,
        content_html,
        recent,
    }))
}
