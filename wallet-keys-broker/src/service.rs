use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tracing::{error, info};
use wallet_keys_core::{AccountRecord, CredentialStore, StoreError};

use crate::auth::{TokenVerifier, VerifyError};

/// Terminal failure of a key request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    #[error("authorization token missing")]
    TokenMissing,
    #[error("authorization token could not be verified")]
    TokenVerificationFailed,
    #[error("account id and secret are both required")]
    InvalidKey,
    #[error("account not found")]
    KeyNotFound,
    #[error("credential store unavailable: {0}")]
    Storage(String),
}

impl From<VerifyError> for KeyError {
    fn from(value: VerifyError) -> Self {
        match value {
            VerifyError::TokenMissing => KeyError::TokenMissing,
            VerifyError::VerificationFailed => KeyError::TokenVerificationFailed,
        }
    }
}

impl From<StoreError> for KeyError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound { .. } => KeyError::KeyNotFound,
            StoreError::Backend(err) => KeyError::Storage(err),
        }
    }
}

/// Verifies the caller and then performs exactly one store operation.
///
/// The store is never touched unless verification succeeded. An `account_id`
/// of `None` means the caller sent an identifier that could not be decoded;
/// it is resolved only after verification.
#[derive(Clone)]
pub struct KeyService {
    verifier: Arc<dyn TokenVerifier>,
    store: Arc<dyn CredentialStore>,
}

impl KeyService {
    pub fn new(verifier: Arc<dyn TokenVerifier>, store: Arc<dyn CredentialStore>) -> Self {
        Self { verifier, store }
    }

    pub async fn fetch(
        &self,
        auth_header: Option<&str>,
        account_id: Option<String>,
    ) -> Result<AccountRecord, KeyError> {
        self.verifier.verify(auth_header).await?;
        let account_id = account_id.ok_or(KeyError::KeyNotFound)?;
        self.fetch_verified(account_id).await
    }

    pub async fn store(
        &self,
        auth_header: Option<&str>,
        account_id: Option<String>,
        secret: Option<SecretString>,
    ) -> Result<(), KeyError> {
        self.verifier.verify(auth_header).await?;
        self.store_verified(account_id, secret).await
    }

    /// Deleting an undecodable identifier succeeds: no record can exist under it.
    pub async fn delete(
        &self,
        auth_header: Option<&str>,
        account_id: Option<String>,
    ) -> Result<(), KeyError> {
        self.verifier.verify(auth_header).await?;
        match account_id {
            Some(account_id) => self.delete_verified(account_id).await,
            None => Ok(()),
        }
    }

    async fn fetch_verified(&self, account_id: String) -> Result<AccountRecord, KeyError> {
        let record = self
            .store
            .get(&account_id)
            .await
            .map_err(|err| store_failure("fetch", err))?;
        info!(%account_id, "fetched account keys");
        Ok(record)
    }

    async fn store_verified(
        &self,
        account_id: Option<String>,
        secret: Option<SecretString>,
    ) -> Result<(), KeyError> {
        let account_id = account_id
            .filter(|value| !value.is_empty())
            .ok_or(KeyError::InvalidKey)?;
        let secret = secret
            .filter(|value| !value.expose_secret().is_empty())
            .ok_or(KeyError::InvalidKey)?;
        self.store
            .put(&account_id, &secret)
            .await
            .map_err(|err| store_failure("store", err))?;
        info!(%account_id, "stored account keys");
        Ok(())
    }

    async fn delete_verified(&self, account_id: String) -> Result<(), KeyError> {
        self.store
            .delete(&account_id)
            .await
            .map_err(|err| store_failure("delete", err))?;
        info!(%account_id, "deleted account keys");
        Ok(())
    }

    /// Probe the store without verifying a caller. Used by `/healthz`.
    pub async fn health_check(&self) -> Result<(), KeyError> {
        self.store
            .health_check()
            .await
            .map_err(|err| store_failure("health", err))
    }
}

fn store_failure(operation: &'static str, err: StoreError) -> KeyError {
    if let StoreError::Backend(reason) = &err {
        error!(operation, %reason, "credential store failure");
    }
    KeyError::from(err)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use serde_json::Map;
    use wallet_keys_core::{MemoryStore, StoreResult};

    use super::*;
    use crate::auth::IdentityClaims;

    struct StaticVerifier {
        result: Result<(), VerifyError>,
    }

    #[async_trait]
    impl TokenVerifier for StaticVerifier {
        async fn verify(&self, auth_header: Option<&str>) -> Result<IdentityClaims, VerifyError> {
            auth_header.ok_or(VerifyError::TokenMissing)?;
            self.result?;
            Ok(IdentityClaims {
                aud: "wallet-client".into(),
                iss: None,
                sub: Some("tester".into()),
                email: None,
                iat: None,
                exp: None,
                extra: Map::new(),
            })
        }
    }

    #[derive(Default)]
    struct TrackingStore {
        inner: MemoryStore,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl CredentialStore for TrackingStore {
        async fn put(&self, account_id: &str, secret: &SecretString) -> StoreResult<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.put(account_id, secret).await
        }

        async fn get(&self, account_id: &str) -> StoreResult<AccountRecord> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.get(account_id).await
        }

        async fn delete(&self, account_id: &str) -> StoreResult<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.delete(account_id).await
        }
    }

    struct FailingStore;

    #[async_trait]
    impl CredentialStore for FailingStore {
        async fn put(&self, _account_id: &str, _secret: &SecretString) -> StoreResult<()> {
            Err(StoreError::Backend("connection refused".into()))
        }

        async fn get(&self, _account_id: &str) -> StoreResult<AccountRecord> {
            Err(StoreError::Backend("connection refused".into()))
        }

        async fn delete(&self, _account_id: &str) -> StoreResult<()> {
            Err(StoreError::Backend("connection refused".into()))
        }

        async fn health_check(&self) -> StoreResult<()> {
            Err(StoreError::Backend("connection refused".into()))
        }
    }

    const HEADER: Option<&str> = Some("Bearer token");

    fn service(result: Result<(), VerifyError>) -> (KeyService, Arc<TrackingStore>) {
        let store = Arc::new(TrackingStore::default());
        let service = KeyService::new(Arc::new(StaticVerifier { result }), store.clone());
        (service, store)
    }

    fn acct() -> Option<String> {
        Some("acct".into())
    }

    fn secret(value: &str) -> Option<SecretString> {
        Some(SecretString::from(value.to_owned()))
    }

    #[tokio::test]
    async fn missing_header_short_circuits_every_operation() {
        let (service, store) = service(Ok(()));
        let err = service.fetch(None, acct()).await.unwrap_err();
        assert_eq!(err, KeyError::TokenMissing);
        let err = service.fetch(None, None).await.unwrap_err();
        assert_eq!(err, KeyError::TokenMissing);
        let err = service.store(None, acct(), secret("s")).await.unwrap_err();
        assert_eq!(err, KeyError::TokenMissing);
        let err = service.store(None, None, None).await.unwrap_err();
        assert_eq!(err, KeyError::TokenMissing);
        let err = service.delete(None, acct()).await.unwrap_err();
        assert_eq!(err, KeyError::TokenMissing);
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn undecodable_id_is_resolved_after_verification() {
        let (rejecting, rejected_store) = service(Err(VerifyError::VerificationFailed));
        let err = rejecting.fetch(HEADER, None).await.unwrap_err();
        assert_eq!(err, KeyError::TokenVerificationFailed);
        let err = rejecting.delete(HEADER, None).await.unwrap_err();
        assert_eq!(err, KeyError::TokenVerificationFailed);
        assert_eq!(rejected_store.calls.load(Ordering::SeqCst), 0);

        let (accepting, store) = service(Ok(()));
        let err = accepting.fetch(HEADER, None).await.unwrap_err();
        assert_eq!(err, KeyError::KeyNotFound);
        accepting.delete(HEADER, None).await.unwrap();
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failed_verification_never_touches_store() {
        let (service, store) = service(Err(VerifyError::VerificationFailed));
        let err = service.store(HEADER, acct(), secret("s")).await.unwrap_err();
        assert_eq!(err, KeyError::TokenVerificationFailed);
        let err = service.fetch(HEADER, acct()).await.unwrap_err();
        assert_eq!(err, KeyError::TokenVerificationFailed);
        let err = service.delete(HEADER, acct()).await.unwrap_err();
        assert_eq!(err, KeyError::TokenVerificationFailed);
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn store_rejects_absent_or_empty_fields() {
        let (service, store) = service(Ok(()));
        let cases = vec![
            (None, secret("s")),
            (Some("acct".to_string()), None),
            (Some(String::new()), secret("s")),
            (Some("acct".to_string()), secret("")),
        ];
        for (account_id, secret) in cases {
            let err = service.store(HEADER, account_id, secret).await.unwrap_err();
            assert_eq!(err, KeyError::InvalidKey);
        }
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
        assert!(store.inner.is_empty());
    }

    #[tokio::test]
    async fn store_fetch_delete_lifecycle() {
        let (service, _store) = service(Ok(()));
        service.store(HEADER, acct(), secret("ciphertext1")).await.unwrap();

        let record = service.fetch(HEADER, acct()).await.unwrap();
        assert_eq!(record.account_id, "acct");
        assert_eq!(record.expose_secret(), "ciphertext1");

        service.delete(HEADER, acct()).await.unwrap();
        service.delete(HEADER, acct()).await.unwrap();
        let err = service.fetch(HEADER, acct()).await.unwrap_err();
        assert_eq!(err, KeyError::KeyNotFound);
    }

    #[tokio::test]
    async fn invalid_store_leaves_prior_value_intact() {
        let (service, _store) = service(Ok(()));
        service.store(HEADER, acct(), secret("original")).await.unwrap();
        let err = service.store(HEADER, acct(), None).await.unwrap_err();
        assert_eq!(err, KeyError::InvalidKey);

        let record = service.fetch(HEADER, acct()).await.unwrap();
        assert_eq!(record.expose_secret(), "original");
    }

    #[tokio::test]
    async fn backend_failures_surface_as_storage_errors() {
        let verifier = Arc::new(StaticVerifier { result: Ok(()) });
        let service = KeyService::new(verifier, Arc::new(FailingStore));

        let err = service.fetch(HEADER, acct()).await.unwrap_err();
        assert_eq!(err, KeyError::Storage("connection refused".into()));
        let err = service.delete(HEADER, acct()).await.unwrap_err();
        assert!(matches!(err, KeyError::Storage(_)));
        assert!(matches!(
            service.health_check().await,
            Err(KeyError::Storage(_))
        ));
    }
}
