use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use wallet_keys_core::AccountRecord;

/// Body of `PUT /wallet/key`.
///
/// Missing and `null` fields both deserialize to `None`. `accountNumber` and
/// `secretSeed` are accepted as input aliases; responses always use
/// `account_id` and `secret`.
#[derive(Default, Deserialize)]
pub struct PutKeyRequest {
    #[serde(default, alias = "accountNumber")]
    pub account_id: Option<String>,
    #[serde(default, alias = "secretSeed")]
    pub secret: Option<String>,
}

impl PutKeyRequest {
    pub fn into_parts(self) -> (Option<String>, Option<SecretString>) {
        (self.account_id, self.secret.map(SecretString::from))
    }
}

/// Body of a successful `GET /wallet/key/{account_id}`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AccountKeysResponse {
    pub account_id: String,
    pub secret: String,
}

impl From<AccountRecord> for AccountKeysResponse {
    fn from(record: AccountRecord) -> Self {
        let secret = record.expose_secret().to_owned();
        Self {
            account_id: record.account_id,
            secret,
        }
    }
}

#[cfg(test)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    #[test]
    fn put_request_accepts_nulls_and_aliases() {
        let request: PutKeyRequest =
            serde_json::from_str(r#"{"account_id": null, "secret": "c1"}"#).unwrap();
        let (account_id, secret) = request.into_parts();
        assert!(account_id.is_none());
        assert_eq!(secret.unwrap().expose_secret(), "c1");

        let legacy: PutKeyRequest =
            serde_json::from_str(r#"{"accountNumber": "GD5F", "secretSeed": "c2"}"#).unwrap();
        assert_eq!(legacy.account_id.as_deref(), Some("GD5F"));
        assert_eq!(legacy.secret.as_deref(), Some("c2"));

        let empty: PutKeyRequest = serde_json::from_str("{}").unwrap();
        assert!(empty.account_id.is_none() && empty.secret.is_none());
    }

    #[test]
    fn response_serializes_both_fields() {
        let response = AccountKeysResponse::from(AccountRecord::new("GD5F", "ciphertext1"));
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"account_id": "GD5F", "secret": "ciphertext1"})
        );
    }
}
