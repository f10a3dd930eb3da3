use secrecy::{ExposeSecret, SecretString};

/// Secret material stored for a single wallet account.
///
/// `account_id` is the storage key (conventionally a hash of the account's
/// public key). `secret` is an opaque, client-encrypted blob that is stored and
/// returned verbatim. The `Debug` output never includes the secret.
#[derive(Debug)]
pub struct AccountRecord {
    pub account_id: String,
    pub secret: SecretString,
}

impl AccountRecord {
    pub fn new(account_id: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            secret: SecretString::from(secret.into()),
        }
    }

    /// Borrow the raw secret value.
    pub fn expose_secret(&self) -> &str {
        self.secret.expose_secret()
    }
}
