//! Credential store primitives shared by the wallet keys broker.

pub mod backend;
pub mod errors;
pub mod store;
pub mod types;

pub use backend::memory::MemoryStore;
pub use backend::redis::RedisStore;
pub use errors::{StoreError, StoreResult};
pub use store::CredentialStore;
pub use types::AccountRecord;
