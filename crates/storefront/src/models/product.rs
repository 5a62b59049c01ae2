//! Product domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use vitrine_core::{Price, ProductId};

/// A catalog product.
#[derive(Debug, Clone, Serialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Price,
    /// Formatted price, e.g. `R$ 129,90`.
    pub price_display: String,
    pub image: String,
    pub category: String,
    pub stock: i32,
    pub active: bool,
    pub colors: Vec<String>,
    pub sizes: Vec<String>,
    /// Free-form key/value technical details.
    pub specifications: Option<serde_json::Map<String, serde_json::Value>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock > 0
    }

    /// Whether `size` is acceptable for this product.
    ///
    /// Products without sizes accept no size; products with sizes require one
    /// of them.
    #[must_use]
    pub fn accepts_size(&self, size: Option<&str>) -> bool {
        accepts_option(&self.sizes, size)
    }

    /// Same rule as [`Product::accepts_size`] for colors.
    #[must_use]
    pub fn accepts_color(&self, color: Option<&str>) -> bool {
        accepts_option(&self.colors, color)
    }
}

fn accepts_option(options: &[String], chosen: Option<&str>) -> bool {
    match chosen {
        None => options.is_empty(),
        Some(value) => options.iter().any(|o| o == value),
    }
}

/// Validated data for creating or replacing a product.
#[derive(Debug, Clone)]
pub struct ProductInput {
    pub name: String,
    pub description: String,
    pub price: Price,
    pub image: String,
    pub category: String,
    pub stock: i32,
    pub active: bool,
    pub colors: Vec<String>,
    pub sizes: Vec<String>,
    pub specifications: Option<serde_json::Map<String, serde_json::Value>>,
}

/// Listing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductSort {
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
    Name,
}

impl ProductSort {
    /// `ORDER BY` clause; `id` breaks ties so pages are stable.
    #[must_use]
    pub const fn order_by(&self) -> &'static str {
        match self {
            Self::Newest => "created_at DESC, id DESC",
            Self::PriceAsc => "price ASC, id ASC",
            Self::PriceDesc => "price DESC, id DESC",
            Self::Name => "name ASC, id ASC",
        }
    }
}

/// Catalog filters from query parameters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductFilter {
    pub category: Option<String>,
    /// Case-insensitive match on name or description.
    pub search: Option<String>,
    pub min_price: Option<rust_decimal::Decimal>,
    pub max_price: Option<rust_decimal::Decimal>,
    /// Only products with stock left.
    #[serde(default)]
    pub in_stock: bool,
    /// Admin-only: restrict to active (`true`) or inactive (`false`).
    /// Public listings always force `Some(true)`.
    pub active: Option<bool>,
    #[serde(default)]
    pub sort: ProductSort,
}

/// A category with the number of active products in it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct CategoryCount {
    pub category: String,
    pub count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(sizes: &[&str], colors: &[&str]) -> Product {
        Product {
            id: ProductId::new(1),
            name: "Camiseta Básica".to_string(),
            description: "Algodão".to_string(),
            price: Price::from_cents(4990),
            price_display: Price::from_cents(4990).display(),
            image: "/img/camiseta.jpg".to_string(),
            category: "roupas".to_string(),
            stock: 3,
            active: true,
            colors: colors.iter().map(ToString::to_string).collect(),
            sizes: sizes.iter().map(ToString::to_string).collect(),
            specifications: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_option_rules_without_variants() {
        let p = product(&[], &[]);
        assert!(p.accepts_size(None));
        assert!(p.accepts_color(None));
        assert!(!p.accepts_size(Some("M")));
    }

    #[test]
    fn test_option_rules_with_variants() {
        let p = product(&["P", "M", "G"], &["preto"]);
        assert!(p.accepts_size(Some("M")));
        assert!(!p.accepts_size(Some("GG")));
        assert!(!p.accepts_size(None));
        assert!(p.accepts_color(Some("preto")));
        assert!(!p.accepts_color(Some("azul")));
    }

    #[test]
    fn test_sort_always_has_tiebreaker() {
        for sort in [
            ProductSort::Newest,
            ProductSort::PriceAsc,
            ProductSort::PriceDesc,
            ProductSort::Name,
        ] {
            assert!(sort.order_by().contains("id"));
        }
    }
}
