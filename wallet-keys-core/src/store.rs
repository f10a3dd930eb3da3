use std::sync::Arc;

use async_trait::async_trait;
use secrecy::SecretString;

use crate::errors::StoreResult;
use crate::types::AccountRecord;

/// Durable mapping from account identifier to secret.
///
/// Implementations hold no business rules: argument validation happens in the
/// caller. Each key is independent of every other key and no cross-key
/// transactions are offered.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Overwrite the record for `account_id`. The write never expires.
    async fn put(&self, account_id: &str, secret: &SecretString) -> StoreResult<()>;

    /// Fetch the record for `account_id`, or [`StoreError::NotFound`](crate::StoreError::NotFound)
    /// when no record exists.
    async fn get(&self, account_id: &str) -> StoreResult<AccountRecord>;

    /// Remove the record for `account_id`. Removing an absent key succeeds.
    async fn delete(&self, account_id: &str) -> StoreResult<()>;

    /// Check whether the backend is reachable.
    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }
}

#[async_trait]
impl<T> CredentialStore for Box<T>
where
    T: CredentialStore + ?Sized,
{
    async fn put(&self, account_id: &str, secret: &SecretString) -> StoreResult<()> {
        (**self).put(account_id, secret).await
    }

    async fn get(&self, account_id: &str) -> StoreResult<AccountRecord> {
        (**self).get(account_id).await
    }

    async fn delete(&self, account_id: &str) -> StoreResult<()> {
        (**self).delete(account_id).await
    }

    async fn health_check(&self) -> StoreResult<()> {
        (**self).health_check().await
    }
}

#[async_trait]
impl<T> CredentialStore for Arc<T>
where
    T: CredentialStore + ?Sized,
{
    async fn put(&self, account_id: &str, secret: &SecretString) -> StoreResult<()> {
        (**self).put(account_id, secret).await
    }

    async fn get(&self, account_id: &str) -> StoreResult<AccountRecord> {
        (**self).get(account_id).await
    }

    async fn delete(&self, account_id: &str) -> StoreResult<()> {
        (**self).delete(account_id).await
    }

    async fn health_check(&self) -> StoreResult<()> {
        (**self).health_check().await
    }
}
