use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::AddressId;
use domain::Address;
use tokio::sync::RwLock;

use crate::{AddressBook, Result, StoreError};

#[derive(Clone, Default)]
pub struct InMemoryAddressBook {
    addresses: Arc<RwLock<HashMap<AddressId, Address>>>,
}

impl InMemoryAddressBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, address: Address) -> AddressId {
        let id = address.id;
        self.addresses.write().await.insert(id, address);
        id
    }
}

#[async_trait]
impl AddressBook for InMemoryAddressBook {
    async fn get_address(&self, address_id: AddressId) -> Result<Address> {
        self.addresses
            .read()
            .await
            .get(&address_id)
            .cloned()
            .ok_or(StoreError::AddressNotFound(address_id))
    }
}
