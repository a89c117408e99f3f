//! Shopping carts, read when an order is placed from a cart.

use common::{CartId, ProductId, UserId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub quantity: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    pub id: CartId,
    pub user_id: UserId,
    pub lines: Vec<CartLine>,
}

impl Cart {
    pub fn new(user_id: UserId) -> Self {
        Self {
            id: CartId::new(),
            user_id,
            lines: Vec::new(),
        }
    }

    /// Adds a line, builder style.
    pub fn with_line(mut self, product_id: ProductId, quantity: i64) -> Self {
        self.lines.push(CartLine {
            product_id,
            quantity,
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
