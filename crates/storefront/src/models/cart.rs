//! Cart domain types.

use serde::Serialize;

use vitrine_core::{CartId, CartItemId, Price, ProductId};

/// One line in a cart, joined with the current product data.
#[derive(Debug, Clone, Serialize)]
pub struct CartLine {
    pub id: CartItemId,
    pub product_id: ProductId,
    pub name: String,
    pub image: String,
    pub price: Price,
    pub quantity: i32,
    pub size: Option<String>,
    pub color: Option<String>,
    /// Units currently in stock.
    pub stock: i32,
    /// False when the product was deactivated or the line exceeds stock;
    /// checkout refuses unavailable lines.
    pub available: bool,
    pub line_total: Price,
}

/// A user's cart with computed totals.
#[derive(Debug, Clone, Serialize)]
pub struct Cart {
    pub id: Option<CartId>,
    pub items: Vec<CartLine>,
    pub subtotal: Price,
    pub subtotal_display: String,
    /// Sum of quantities (navbar badge).
    pub item_count: i64,
}

impl Cart {
    /// Build a cart view from its lines; totals only count available lines.
    #[must_use]
    pub fn from_lines(id: Option<CartId>, items: Vec<CartLine>) -> Self {
        let subtotal: Price = items
            .iter()
            .filter(|line| line.available)
            .map(|line| line.line_total)
            .sum();
        let item_count = items.iter().map(|line| i64::from(line.quantity)).sum();

        Self {
            id,
            items,
            subtotal,
            subtotal_display: subtotal.display(),
            item_count,
        }
    }

    #[must_use]
    pub fn empty() -> Self {
        Self::from_lines(None, Vec::new())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(id: i32, cents: i64, quantity: i32, available: bool) -> CartLine {
        let price = Price::from_cents(cents);
        CartLine {
            id: CartItemId::new(id),
            product_id: ProductId::new(id),
            name: format!("Produto {id}"),
            image: String::new(),
            price,
            quantity,
            size: None,
            color: None,
            stock: 10,
            available,
            line_total: price.line_total(quantity),
        }
    }

    #[test]
    fn test_empty_cart() {
        let cart = Cart::empty();
        assert!(cart.is_empty());
        assert_eq!(cart.subtotal, Price::ZERO);
        assert_eq!(cart.item_count, 0);
        assert_eq!(cart.subtotal_display, "R$ 0,00");
    }

    #[test]
    fn test_totals_skip_unavailable_lines() {
        let cart = Cart::from_lines(
            Some(CartId::new(1)),
            vec![line(1, 5000, 2, true), line(2, 1990, 1, false)],
        );
        assert_eq!(cart.subtotal, Price::from_cents(10_000));
        assert_eq!(cart.item_count, 3);
    }
}
