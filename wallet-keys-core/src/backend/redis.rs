use async_trait::async_trait;
use ::redis::aio::ConnectionManager;
use ::redis::{AsyncCommands, Client, RedisError};
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use crate::errors::{StoreError, StoreResult};
use crate::store::CredentialStore;
use crate::types::AccountRecord;

pub const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379";

/// Redis-backed store. Each account is a plain string key holding the secret.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    /// Open a managed connection to `url`. The manager reconnects on failure.
    pub async fn connect(url: &str) -> StoreResult<Self> {
        let client = Client::open(url)
            .map_err(|err| StoreError::Backend(format!("invalid redis url: {err}")))?;
        let conn = ConnectionManager::new(client)
            .await
            .map_err(|err| StoreError::Backend(format!("failed to connect to redis: {err}")))?;
        Ok(Self { conn })
    }
}

fn backend_error(err: RedisError) -> StoreError {
    StoreError::Backend(err.to_string())
}

#[async_trait]
impl CredentialStore for RedisStore {
    async fn put(&self, account_id: &str, secret: &SecretString) -> StoreResult<()> {
        let mut conn = self.conn.clone();
        // SET and PERSIST run in one MULTI block; the key never carries an expiry.
        let _: () = ::redis::pipe()
            .atomic()
            .set(account_id, secret.expose_secret())
            .ignore()
            .persist(account_id)
            .ignore()
            .query_async(&mut conn)
            .await
            .map_err(backend_error)?;
        debug!(%account_id, "stored account secret");
        Ok(())
    }

    async fn get(&self, account_id: &str) -> StoreResult<AccountRecord> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(account_id).await.map_err(backend_error)?;
        match value {
            Some(secret) => Ok(AccountRecord::new(account_id, secret)),
            None => Err(StoreError::not_found(account_id)),
        }
    }

    async fn delete(&self, account_id: &str) -> StoreResult<()> {
        let mut conn = self.conn.clone();
        let removed: u64 = conn.del(account_id).await.map_err(backend_error)?;
        debug!(%account_id, removed, "deleted account secret");
        Ok(())
    }

    async fn health_check(&self) -> StoreResult<()> {
        let mut conn = self.conn.clone();
        let _: String = ::redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(backend_error)?;
        Ok(())
    }
}
