//! # Shopping Cart
//!
//! The cart lives in the visitor's session under [`CART_KEY`]; it is never
//! written to the database.

use crate::db::models::Product;
use serde::{Deserialize, Serialize};

/// Session key holding the serialized cart
pub const CART_KEY: &str = "cart";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: String,
    pub title: String,
    pub unit_cents: i64,
    pub qty: u32,
}

impl CartItem {
    pub fn line_cents(&self) -> i64 {
        self.unit_cents * i64::from(self.qty)
    }
}

/// Cart contents plus running totals.
///
/// Totals are recomputed after every change, so they always match `items`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    pub items: Vec<CartItem>,
    pub total_qty: u32,
    pub total_cents: i64,
}

impl Cart {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Add one unit of `product`.
    pub fn add(&mut self, product: &Product) {
        match self.items.iter_mut().find(|item| item.product_id == product.id) {
            Some(item) => item.qty += 1,
            None => self.items.push(CartItem {
                product_id: product.id.clone(),
                title: product.title.clone(),
                unit_cents: product.price_cents,
                qty: 1,
            }),
        }
        self.recompute();
    }

    /// Remove one unit; the line disappears when it reaches zero.
    /// Returns false if the product was not in the cart.
    pub fn reduce(&mut self, product_id: &str) -> bool {
        let Some(index) = self.items.iter().position(|item| item.product_id == product_id) else {
            return false;
        };

        if self.items[index].qty > 1 {
            self.items[index].qty -= 1;
        } else {
            self.items.remove(index);
        }
        self.recompute();
        true
    }

    /// Remove the whole line. Returns false if the product was not in the cart.
    pub fn remove_all(&mut self, product_id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.product_id != product_id);
        self.recompute();
        self.items.len() != before
    }

    fn recompute(&mut self) {
        self.total_qty = self.items.iter().map(|item| item.qty).sum();
        self.total_cents = self.items.iter().map(CartItem::line_cents).sum();
    }
}
