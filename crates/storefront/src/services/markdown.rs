//! Markdown rendering for blog posts.
//!
//! Post bodies are stored as markdown and rendered to HTML on read. Rendered
//! HTML is cached per post revision (`id` plus `updated_at`), so an edit
//! naturally misses the cache.

use std::time::Duration;

use chrono::{DateTime, Utc};
use comrak::{Options, markdown_to_html};
use moka::future::Cache;
use tracing::debug;

use vitrine_core::PostId;

type CacheKey = (PostId, i64);

/// Renders post markdown to HTML with a small in-memory cache.
#[derive(Clone)]
pub struct MarkdownRenderer {
    cache: Cache<CacheKey, String>,
}

impl MarkdownRenderer {
    #[must_use]
    pub fn new() -> Self {
        let cache = Cache::builder()
            .max_capacity(500)
            .time_to_live(Duration::from_secs(3600))
            .build();

        Self { cache }
    }

    /// Render a post body, reusing the cached HTML for the same revision.
    pub async fn render_post(
        &self,
        id: PostId,
        updated_at: DateTime<Utc>,
        content: &str,
    ) -> String {
        let key = (id, updated_at.timestamp_micros());

        if let Some(html) = self.cache.get(&key).await {
            debug!(post_id = %id, "Markdown cache hit");
            return html;
        }

        let html = render(content);
        self.cache.insert(key, html.clone()).await;
        html
    }
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Render markdown with GitHub Flavored Markdown extensions.
///
/// Raw HTML in the source is not passed through.
#[must_use]
pub fn render(content: &str) -> String {
    let mut options = Options::default();

    options.extension.strikethrough = true;
    options.extension.table = true;
    options.extension.autolink = true;
    options.extension.tasklist = true;
    options.extension.header_ids = Some(String::new());

    markdown_to_html(content, &options)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_basic_markdown() {
        let html = render("# Novidades\n\nTexto em **negrito**.");
        assert!(html.contains("<h1>"));
        assert!(html.contains("Novidades"));
        assert!(html.contains("<strong>negrito</strong>"));
    }

    #[test]
    fn test_render_gfm_table() {
        let html = render("| Tamanho | Busto |\n|---|---|\n| P | 88 |\n");
        assert!(html.contains("<table>"));
    }

    #[test]
    fn test_raw_html_is_not_passed_through() {
        let html = render("<script>alert(1)</script>");
        assert!(!html.contains("<script>"));
    }

    #[tokio::test]
    async fn test_cached_by_revision() {
        let renderer = MarkdownRenderer::new();
        let id = PostId::new(1);
        let t1 = Utc::now();

        let first = renderer.render_post(id, t1, "versão *um*").await;
        // Same revision: the stale cached HTML wins over the new body.
        let again = renderer.render_post(id, t1, "versão *dois*").await;
        assert_eq!(first, again);

        let t2 = t1 + chrono::Duration::seconds(1);
        let edited = renderer.render_post(id, t2, "versão *dois*").await;
        assert!(edited.contains("dois"));
    }
}
