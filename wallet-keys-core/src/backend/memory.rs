use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use secrecy::{ExposeSecret, SecretString};

use crate::errors::{StoreError, StoreResult};
use crate::store::CredentialStore;
use crate::types::AccountRecord;

/// In-process store for development and tests. Contents are lost on restart.
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, SecretString>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn put(&self, account_id: &str, secret: &SecretString) -> StoreResult<()> {
        let value = SecretString::from(secret.expose_secret().to_owned());
        self.entries.write().insert(account_id.to_owned(), value);
        Ok(())
    }

    async fn get(&self, account_id: &str) -> StoreResult<AccountRecord> {
        let entries = self.entries.read();
        let secret = entries
            .get(account_id)
            .ok_or_else(|| StoreError::not_found(account_id))?;
        Ok(AccountRecord::new(account_id, secret.expose_secret()))
    }

    async fn delete(&self, account_id: &str) -> StoreResult<()> {
        self.entries.write().remove(account_id);
        Ok(())
    }
}
