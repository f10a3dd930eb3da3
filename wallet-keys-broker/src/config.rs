use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use serde::Deserialize;
use tracing::info;
use wallet_keys_core::backend::redis::DEFAULT_REDIS_URL;
use wallet_keys_core::{CredentialStore, MemoryStore, RedisStore};

use crate::auth::{DEFAULT_VERIFY_URL, TOKEN_PLACEHOLDER};

pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";
pub const DEFAULT_VERIFY_TIMEOUT_MS: u64 = 10_000;

pub const ENV_CONFIG_PATH: &str = "WALLET_KEYS__CONFIG";
const ENV_BIND_ADDRESS: &str = "WALLET_KEYS__BIND_ADDRESS";
const ENV_AUDIENCE: &str = "WALLET_KEYS__AUDIENCE";
const ENV_VERIFY_URL: &str = "WALLET_KEYS__VERIFY_URL";
const ENV_VERIFY_TIMEOUT_MS: &str = "WALLET_KEYS__VERIFY_TIMEOUT_MS";
const ENV_STORE: &str = "WALLET_KEYS__STORE";
const ENV_REDIS_URL: &str = "WALLET_KEYS__REDIS_URL";

/// Fully resolved start-up configuration.
#[derive(Debug, Clone)]
pub struct BrokerConfig {
    pub http_addr: SocketAddr,
    pub auth: AuthConfig,
    pub store: StoreConfig,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Client id the token's `aud` claim must equal.
    pub audience: String,
    /// Verification endpoint with a `{token}` placeholder.
    pub verify_url: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreConfig {
    Memory,
    Redis { url: String },
}

/// One source of settings. Later layers win field by field.
#[derive(Default, Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigLayer {
    pub bind_address: Option<String>,
    pub auth: Option<AuthLayer>,
    pub store: Option<StoreLayer>,
}

#[derive(Default, Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthLayer {
    pub audience: Option<String>,
    pub verify_url: Option<String>,
    pub timeout_ms: Option<u64>,
}

#[derive(Default, Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreLayer {
    pub kind: Option<String>,
    pub redis_url: Option<String>,
}

impl ConfigLayer {
    pub fn from_file(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        toml::from_str(&data).with_context(|| format!("invalid toml config {}", path.display()))
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let timeout_ms = lookup(ENV_VERIFY_TIMEOUT_MS)
            .map(|value| {
                value
                    .trim()
                    .parse::<u64>()
                    .with_context(|| format!("{ENV_VERIFY_TIMEOUT_MS} must be an integer"))
            })
            .transpose()?;

        Ok(Self {
            bind_address: lookup(ENV_BIND_ADDRESS),
            auth: Some(AuthLayer {
                audience: lookup(ENV_AUDIENCE),
                verify_url: lookup(ENV_VERIFY_URL),
                timeout_ms,
            }),
            store: Some(StoreLayer {
                kind: lookup(ENV_STORE),
                redis_url: lookup(ENV_REDIS_URL),
            }),
        })
    }

    pub fn merge(self, over: ConfigLayer) -> ConfigLayer {
        ConfigLayer {
            bind_address: over.bind_address.or(self.bind_address),
            auth: merge_option(self.auth, over.auth, |base, over| AuthLayer {
                audience: over.audience.or(base.audience),
                verify_url: over.verify_url.or(base.verify_url),
                timeout_ms: over.timeout_ms.or(base.timeout_ms),
            }),
            store: merge_option(self.store, over.store, |base, over| StoreLayer {
                kind: over.kind.or(base.kind),
                redis_url: over.redis_url.or(base.redis_url),
            }),
        }
    }

    pub fn resolve(self) -> Result<BrokerConfig> {
        let bind = self
            .bind_address
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());
        let http_addr = bind
            .parse()
            .with_context(|| format!("invalid bind address `{bind}`"))?;

        let auth = self.auth.unwrap_or_default();
        let audience = auth
            .audience
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| anyhow!("expected audience is required ({ENV_AUDIENCE})"))?;
        let verify_url = auth
            .verify_url
            .unwrap_or_else(|| DEFAULT_VERIFY_URL.to_string());
        if !verify_url.contains(TOKEN_PLACEHOLDER) {
            bail!("verification url must contain {TOKEN_PLACEHOLDER}");
        }
        let timeout = Duration::from_millis(auth.timeout_ms.unwrap_or(DEFAULT_VERIFY_TIMEOUT_MS));

        let store_layer = self.store.unwrap_or_default();
        let store = match store_layer.kind.as_deref().unwrap_or("redis") {
            "redis" => StoreConfig::Redis {
                url: store_layer
                    .redis_url
                    .unwrap_or_else(|| DEFAULT_REDIS_URL.to_string()),
            },
            "memory" => StoreConfig::Memory,
            other => bail!("unsupported store `{other}`"),
        };

        Ok(BrokerConfig {
            http_addr,
            auth: AuthConfig {
                audience,
                verify_url,
                timeout,
            },
            store,
        })
    }
}

fn merge_option<T>(base: Option<T>, over: Option<T>, merge: impl FnOnce(T, T) -> T) -> Option<T> {
    match (base, over) {
        (Some(base), Some(over)) => Some(merge(base, over)),
        (base, over) => over.or(base),
    }
}

pub async fn load_store(config: &StoreConfig) -> Result<Arc<dyn CredentialStore>> {
    match config {
        StoreConfig::Memory => {
            info!("using in-memory credential store; records are lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreConfig::Redis { url } => {
            let store = RedisStore::connect(url)
                .await
                .context("failed to initialize redis credential store")?;
            info!("connected to redis credential store");
            Ok(Arc::new(store))
        }
    }
}
