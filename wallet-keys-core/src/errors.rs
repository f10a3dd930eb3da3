use thiserror::Error;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// No record exists for the key. Expected for absent or deleted accounts.
    #[error("account {account_id} not found")]
    NotFound { account_id: String },
    #[error("storage error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn not_found(account_id: impl Into<String>) -> Self {
        Self::NotFound {
            account_id: account_id.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
