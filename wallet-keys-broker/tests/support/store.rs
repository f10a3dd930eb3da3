use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use secrecy::SecretString;
use wallet_keys_core::{AccountRecord, CredentialStore, MemoryStore, StoreError, StoreResult};

/// Memory store that counts every call reaching it.
#[derive(Default)]
pub struct CountingStore {
    inner: MemoryStore,
    calls: AtomicUsize,
}

impl CountingStore {
    #[allow(dead_code)]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn hit(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl CredentialStore for CountingStore {
    async fn put(&self, account_id: &str, secret: &SecretString) -> StoreResult<()> {
        self.hit();
        self.inner.put(account_id, secret).await
    }

    async fn get(&self, account_id: &str) -> StoreResult<AccountRecord> {
        self.hit();
        self.inner.get(account_id).await
    }

    async fn delete(&self, account_id: &str) -> StoreResult<()> {
        self.hit();
        self.inner.delete(account_id).await
    }
}

/// Store whose backend is always unreachable.
#[allow(dead_code)]
pub struct UnavailableStore;

fn unavailable<T>() -> StoreResult<T> {
    Err(StoreError::Backend("connection refused".into()))
}

#[async_trait]
impl CredentialStore for UnavailableStore {
    async fn put(&self, _account_id: &str, _secret: &SecretString) -> StoreResult<()> {
        unavailable()
    }

    async fn get(&self, _account_id: &str) -> StoreResult<AccountRecord> {
        unavailable()
    }

    async fn delete(&self, _account_id: &str) -> StoreResult<()> {
        unavailable()
    }

    async fn health_check(&self) -> StoreResult<()> {
        unavailable()
    }
}
