use std::time::Duration;

use mockito::{Matcher, Mock, Server, ServerGuard};
use serde_json::json;
use wallet_keys_broker::auth::{RemoteTokenVerifier, build_client};

/// Stand-in for the token-info endpoint. Unmatched requests get mockito's 501.
pub struct FakeIdp {
    server: ServerGuard,
}

impl FakeIdp {
    pub async fn start() -> Self {
        Self {
            server: Server::new_async().await,
        }
    }

    pub fn template(&self) -> String {
        format!("{}/tokeninfo?id_token={{token}}", self.server.url())
    }

    #[allow(dead_code)]
    pub fn verifier(&self, audience: &str) -> RemoteTokenVerifier {
        let client = build_client(Duration::from_secs(5)).expect("client");
        RemoteTokenVerifier::new(client, self.template(), audience).expect("verifier")
    }

    /// Answer `token` with claims issued for `audience`.
    pub async fn accept(&mut self, token: &str, audience: &str, hits: usize) -> Mock {
        let claims = json!({
            "iss": "https://accounts.google.com",
            "aud": audience,
            "sub": "110169484474386276334",
            "email": "holder@example.com",
            "iat": "1700000000",
            "exp": "1700003600",
        });
        self.respond(token, 200, &claims.to_string(), hits).await
    }

    #[allow(dead_code)]
    pub async fn respond(&mut self, token: &str, status: usize, body: &str, hits: usize) -> Mock {
        self.server
            .mock("GET", Matcher::Regex("^/tokeninfo".into()))
            .match_query(Matcher::UrlEncoded("id_token".into(), token.into()))
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(body)
            .expect(hits)
            .create_async()
            .await
    }
}
