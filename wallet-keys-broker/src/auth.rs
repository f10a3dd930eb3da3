use std::time::Duration;

use anyhow::{Context, anyhow};
use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};
use url::form_urlencoded;

use crate::config::AuthConfig;

pub const DEFAULT_VERIFY_URL: &str =
    "https://www.googleapis.com/oauth2/v3/tokeninfo?id_token={token}";
pub const TOKEN_PLACEHOLDER: &str = "{token}";

/// Why a caller could not be authenticated.
///
/// Every provider-side cause maps to [`VerifyError::VerificationFailed`]. The
/// cause only appears in the `warn` log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum VerifyError {
    #[error("authorization header missing")]
    TokenMissing,
    #[error("token could not be verified")]
    VerificationFailed,
}

/// Claims returned by the identity provider for a valid token.
///
/// Only `aud` is checked locally; the rest is carried for diagnostics.
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityClaims {
    pub aud: String,
    #[serde(default)]
    pub iss: Option<String>,
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub iat: Option<Value>,
    #[serde(default)]
    pub exp: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[async_trait]
pub trait TokenVerifier: Send + Sync {
    /// Verify the raw `Authorization` header value presented by the caller.
    async fn verify(&self, auth_header: Option<&str>) -> Result<IdentityClaims, VerifyError>;
}

/// Relays bearer tokens to a remote token-info endpoint and checks the audience.
#[derive(Clone)]
pub struct RemoteTokenVerifier {
    client: HttpClient,
    url_template: String,
    audience: String,
}

impl RemoteTokenVerifier {
    pub fn new(
        client: HttpClient,
        url_template: impl Into<String>,
        audience: impl Into<String>,
    ) -> anyhow::Result<Self> {
        let url_template = url_template.into();
        let audience = audience.into();
        if !url_template.contains(TOKEN_PLACEHOLDER) {
            return Err(anyhow!(
                "verification url `{url_template}` does not contain {TOKEN_PLACEHOLDER}"
            ));
        }
        url::Url::parse(&url_template.replace(TOKEN_PLACEHOLDER, "probe"))
            .with_context(|| format!("invalid verification url `{url_template}`"))?;
        if audience.trim().is_empty() {
            return Err(anyhow!("expected audience must not be empty"));
        }

        Ok(Self {
            client,
            url_template,
            audience,
        })
    }

    pub fn from_config(config: &AuthConfig) -> anyhow::Result<Self> {
        let client = build_client(config.timeout)?;
        Self::new(client, config.verify_url.clone(), config.audience.clone())
    }

    fn verification_url(&self, token: &str) -> String {
        let encoded: String = form_urlencoded::byte_serialize(token.as_bytes()).collect();
        self.url_template.replace(TOKEN_PLACEHOLDER, &encoded)
    }

    async fn fetch_claims(&self, token: &str) -> Result<IdentityClaims, String> {
        self.client
            .get(self.verification_url(token))
            .send()
            .await
            .map_err(|err| format!("identity provider unreachable: {err}"))?
            .error_for_status()
            .map_err(|err| format!("identity provider rejected token: {err}"))?
            .json::<IdentityClaims>()
            .await
            .map_err(|err| format!("invalid token claims: {err}"))
    }
}

#[async_trait]
impl TokenVerifier for RemoteTokenVerifier {
    async fn verify(&self, auth_header: Option<&str>) -> Result<IdentityClaims, VerifyError> {
        let header = auth_header
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or(VerifyError::TokenMissing)?;

        let Some(token) = extract_bearer_token(header).filter(|token| !token.is_empty()) else {
            warn!("authorization header does not carry a bearer token");
            return Err(VerifyError::VerificationFailed);
        };

        let claims = self.fetch_claims(token).await.map_err(|reason| {
            warn!(%reason, "unable to verify token");
            VerifyError::VerificationFailed
        })?;

        if claims.aud != self.audience {
            warn!(aud = %claims.aud, "unable to verify token due to aud claim mismatch");
            return Err(VerifyError::VerificationFailed);
        }

        debug!(sub = claims.sub.as_deref().unwrap_or("-"), "token verified");
        Ok(claims)
    }
}

pub fn extract_bearer_token(value: &str) -> Option<&str> {
    let value = value.trim();
    if let Some(rest) = value.strip_prefix("Bearer ") {
        Some(rest.trim())
    } else if let Some(rest) = value.strip_prefix("bearer ") {
        Some(rest.trim())
    } else {
        None
    }
}

pub fn build_client(timeout: Duration) -> anyhow::Result<HttpClient> {
    HttpClient::builder()
        .timeout(timeout)
        .build()
        .context("failed to build reqwest client")
}
