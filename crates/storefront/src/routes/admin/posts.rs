//! Admin blog management.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use tracing::{info, instrument};

use vitrine_core::{Paginated, Pagination, PostId, Slug};

use crate::db::{PostRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::models::post::estimate_read_time;
use crate::models::{Post, PostFilter, PostInput, PostSummary};
use crate::state::AppState;
use crate::validation::{ValidationErrors, optional};

use super::Deleted;

const MAX_TITLE_LENGTH: usize = 200;
const MAX_SUMMARY_LENGTH: usize = 500;

/// Post create/replace body.
///
/// `slug` defaults to one derived from the title and `read_time` to an
/// estimate from the word count. Also the shape of posts in seed files.
#[derive(Debug, Clone, Deserialize)]
pub struct PostRequest {
    pub title: String,
    pub slug: Option<String>,
    #[serde(default)]
    pub summary: String,
    pub content: String,
    pub author: String,
    pub category: String,
    pub read_time: Option<i32>,
    pub image: Option<String>,
    #[serde(default)]
    pub published: bool,
}

impl PostRequest {
    /// Check and normalize the request.
    ///
    /// # Errors
    ///
    /// Returns every invalid field.
    pub fn validate(self) -> std::result::Result<PostInput, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let title = errors.required("title", &self.title, MAX_TITLE_LENGTH);
        let author = errors.required("author", &self.author, 100);
        let category = errors.required("category", &self.category, 60);
        if self.content.trim().is_empty() {
            errors.add("content", "Campo obrigatório");
        }
        let summary = self.summary.trim().to_owned();
        if summary.chars().count() > MAX_SUMMARY_LENGTH {
            errors.add("summary", format!("Máximo de {MAX_SUMMARY_LENGTH} caracteres"));
        }

        let slug = match optional(self.slug) {
            Some(slug) => Slug::parse(&slug)
                .map_err(|_| errors.add("slug", "Use apenas letras minúsculas, números e hífens"))
                .ok(),
            None => match Slug::from_title(&title) {
                Ok(slug) => Some(slug),
                // An empty title is already reported
                Err(_) if errors.get("title").is_some() => None,
                Err(_) => {
                    errors.add("slug", "Não foi possível gerar o endereço a partir do título");
                    None
                }
            },
        };

        let read_time = match self.read_time {
            Some(minutes) if minutes < 1 => {
                errors.add("read_time", "O tempo de leitura deve ser de pelo menos 1 minuto");
                1
            }
            Some(minutes) => minutes,
            None => estimate_read_time(&self.content),
        };

        let (Some(slug), true) = (slug, errors.is_empty()) else {
            return Err(errors);
        };

        Ok(PostInput {
            title,
            slug,
            summary,
            content: self.content,
            author,
            category,
            read_time,
            image: optional(self.image),
            published: self.published,
        })
    }
}

/// List posts, drafts included.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<PostFilter>,
    ApiQuery(pagination): ApiQuery<Pagination>,
) -> Result<Json<Paginated<PostSummary>>> {
    let page = PostRepository::new(state.pool())
        .list(&filter, &pagination)
        .await?;
    Ok(Json(page))
}

/// Any post by ID, with its markdown source.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<PostId>,
) -> Result<Json<Post>> {
    PostRepository::new(state.pool())
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(post_not_found)
}

/// Create a post.
#[instrument(skip_all)]
pub async fn create(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<PostRequest>,
) -> Result<(StatusCode, Json<Post>)> {
    let input = body.validate()?;
    let post = PostRepository::new(state.pool())
        .create(&input)
        .await
        .map_err(write_error)?;
    info!(post_id = %post.id, slug = %post.slug, "Post created");
    Ok((StatusCode::CREATED, Json(post)))
}

/// Replace a post.
#[instrument(skip_all, fields(post_id = %id))]
pub async fn update(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<PostId>,
    ApiJson(body): ApiJson<PostRequest>,
) -> Result<Json<Post>> {
    let input = body.validate()?;
    let post = PostRepository::new(state.pool())
        .update(id, &input)
        .await
        .map_err(write_error)?;
    info!("Post updated");
    Ok(Json(post))
}

/// Delete a post.
#[instrument(skip(state))]
pub async fn delete(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<PostId>,
) -> Result<Json<Deleted>> {
    PostRepository::new(state.pool())
        .delete(id)
        .await
        .map_err(write_error)?;
    info!("Post deleted");
    Ok(Json(Deleted {
        message: "Artigo excluído",
    }))
}

fn post_not_found() -> AppError {
    AppError::NotFound("Artigo não encontrado".to_string())
}

fn write_error(err: RepositoryError) -> AppError {
    match err {
        RepositoryError::NotFound => post_not_found(),
        RepositoryError::Conflict(_) => {
            let mut errors = ValidationErrors::new();
            errors.add("slug", "Já existe um artigo com este endereço");
            errors.into()
        }
        other => other.into(),
    }
}
