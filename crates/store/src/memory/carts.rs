use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use common::{CartId, UserId};
use domain::Cart;
use tokio::sync::RwLock;

use crate::{CartStore, Result, StoreError};

/// In-memory carts, one per user.
#[derive(Clone, Default)]
pub struct InMemoryCartStore {
    carts: Arc<RwLock<HashMap<UserId, Cart>>>,
    fail_on_clear: Arc<AtomicBool>,
}

impl InMemoryCartStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the cart as its user's current cart.
    pub async fn put(&self, cart: Cart) -> CartId {
        let id = cart.id;
        self.carts.write().await.insert(cart.user_id, cart);
        id
    }

    /// Makes every subsequent clear fail until switched back.
    pub fn set_fail_on_clear(&self, fail: bool) {
        self.fail_on_clear.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl CartStore for InMemoryCartStore {
    async fn get_cart_for_user(&self, user_id: UserId) -> Result<Option<Cart>> {
        Ok(self.carts.read().await.get(&user_id).cloned())
    }

    async fn clear_cart(&self, cart_id: CartId) -> Result<()> {
        if self.fail_on_clear.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("cart store offline".to_string()));
        }

        let mut carts = self.carts.write().await;
        let cart = carts
            .values_mut()
            .find(|c| c.id == cart_id)
            .ok_or(StoreError::CartNotFound(cart_id))?;
        cart.lines.clear();
        Ok(())
    }
}
