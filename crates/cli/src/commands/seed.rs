//! Seed products and blog posts from a YAML file.
//!
//! Entries use the same shape and validation as the admin API. Everything
//! is validated before the database is touched.
//!
//! ```yaml
//! products:
//!   - name: Camiseta Básica
//!     price: "49.90"
//!     image: /img/camiseta.jpg
//!     category: roupas
//!     stock: 20
//!     sizes: [P, M, G]
//! posts:
//!   - title: Guia de Tamanhos
//!     content: "# Como medir..."
//!     author: Equipe Vitrine
//!     category: dicas
//!     published: true
//! ```

use std::path::Path;

use serde::Deserialize;
use tracing::{error, info, warn};

use vitrine_storefront::db::{PostRepository, ProductRepository, RepositoryError};
use vitrine_storefront::models::{PostInput, ProductInput};
use vitrine_storefront::routes::admin::posts::PostRequest;
use vitrine_storefront::routes::admin::products::ProductRequest;

use super::ConnectError;

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error("Could not read seed file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("{0} invalid entries in seed file")]
    Invalid(usize),

    #[error("Database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Top-level layout of a seed file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedFile {
    #[serde(default)]
    pub products: Vec<ProductRequest>,
    #[serde(default)]
    pub posts: Vec<PostRequest>,
}

/// Validated seed data.
#[derive(Debug)]
pub struct SeedData {
    pub products: Vec<ProductInput>,
    pub posts: Vec<PostInput>,
}

impl SeedFile {
    /// Validate every entry, collecting one message per invalid entry.
    ///
    /// # Errors
    ///
    /// Returns the messages for all invalid entries.
    pub fn validate(self) -> Result<SeedData, Vec<String>> {
        let mut problems = Vec::new();

        let mut products = Vec::with_capacity(self.products.len());
        for (index, product) in self.products.into_iter().enumerate() {
            let label = format!("products[{index}] ({})", product.name);
            match product.validate() {
                Ok(input) => products.push(input),
                Err(errors) => problems.push(format!("{label}: {errors}")),
            }
        }

        let mut posts = Vec::with_capacity(self.posts.len());
        for (index, post) in self.posts.into_iter().enumerate() {
            let label = format!("posts[{index}] ({})", post.title);
            match post.validate() {
                Ok(input) => posts.push(input),
                Err(errors) => problems.push(format!("{label}: {errors}")),
            }
        }

        if problems.is_empty() {
            Ok(SeedData { products, posts })
        } else {
            Err(problems)
        }
    }
}

/// Load `path` into the database.
///
/// Posts whose slug already exists are skipped, so re-running a seed file
/// only adds what is missing. Products have no natural key; use `clear` to
/// avoid duplicates.
///
/// # Errors
///
/// Returns `SeedError` if the file is unreadable or invalid, or a database
/// operation fails.
pub async fn run(path: &Path, clear: bool) -> Result<(), SeedError> {
    info!(path = %path.display(), "Loading seed file");

    let content = tokio::fs::read_to_string(path).await?;
    let file: SeedFile = serde_yaml::from_str(&content)?;

    let data = file.validate().map_err(|problems| {
        error!("Seed file validation failed:");
        for problem in &problems {
            error!("  - {problem}");
        }
        SeedError::Invalid(problems.len())
    })?;

    info!(
        products = data.products.len(),
        posts = data.posts.len(),
        "Seed file validated"
    );

    let pool = super::connect().await?;
    let products = ProductRepository::new(&pool);
    let posts = PostRepository::new(&pool);

    if clear {
        let removed_posts = posts.delete_all().await?;
        let removed_products = products.delete_all().await?;
        info!(removed_products, removed_posts, "Cleared existing content");
    }

    for input in &data.products {
        products.create(input).await?;
    }

    let mut skipped = 0_usize;
    for input in &data.posts {
        match posts.create(input).await {
            Ok(_) => {}
            Err(RepositoryError::Conflict(_)) => {
                warn!(slug = %input.slug, "Post already exists, skipping");
                skipped += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }

    info!("Seeding complete!");
    info!("  Products inserted: {}", data.products.len());
    info!("  Posts inserted: {}", data.posts.len() - skipped);
    info!("  Posts skipped (already exist): {}", skipped);

    Ok(())
}
