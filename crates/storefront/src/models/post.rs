//! Blog post domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use vitrine_core::{PostId, Slug};

/// Average reading speed used to estimate `read_time`.
const WORDS_PER_MINUTE: usize = 200;

/// A full blog post.
#[derive(Debug, Clone, Serialize)]
pub struct Post {
    pub id: PostId,
    pub title: String,
    pub slug: Slug,
    pub summary: String,
    /// Markdown source.
    pub content: String,
    pub author: String,
    pub category: String,
    /// Estimated reading time in minutes.
    pub read_time: i32,
    pub image: Option<String>,
    pub published: bool,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A post without its body, for listings.
#[derive(Debug, Clone, Serialize)]
pub struct PostSummary {
    pub id: PostId,
    pub title: String,
    pub slug: Slug,
    pub summary: String,
    pub author: String,
    pub category: String,
    pub read_time: i32,
    pub image: Option<String>,
    pub published: bool,
    pub published_at: Option<DateTime<Utc>>,
}

impl From<&Post> for PostSummary {
    fn from(post: &Post) -> Self {
        Self {
            id: post.id,
            title: post.title.clone(),
            slug: post.slug.clone(),
            summary: post.summary.clone(),
            author: post.author.clone(),
            category: post.category.clone(),
            read_time: post.read_time,
            image: post.image.clone(),
            published: post.published,
            published_at: post.published_at,
        }
    }
}

/// Validated data for creating or replacing a post.
#[derive(Debug, Clone)]
pub struct PostInput {
    pub title: String,
    pub slug: Slug,
    pub summary: String,
    pub content: String,
    pub author: String,
    pub category: String,
    pub read_time: i32,
    pub image: Option<String>,
    pub published: bool,
}

/// Blog listing filters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostFilter {
    pub category: Option<String>,
    /// Case-insensitive match on title or summary.
    pub search: Option<String>,
    /// Admin-only: restrict to published or drafts.
    pub published: Option<bool>,
}

/// Estimate reading time in whole minutes (at least one).
#[must_use]
pub fn estimate_read_time(content: &str) -> i32 {
    let words = content.split_whitespace().count();
    let minutes = words.div_ceil(WORDS_PER_MINUTE).max(1);
    i32::try_from(minutes).unwrap_or(i32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_read_time() {
        assert_eq!(estimate_read_time(""), 1);
        assert_eq!(estimate_read_time(&"palavra ".repeat(200)), 1);
        assert_eq!(estimate_read_time(&"palavra ".repeat(201)), 2);
        assert_eq!(estimate_read_time(&"palavra ".repeat(1000)), 5);
    }
}
