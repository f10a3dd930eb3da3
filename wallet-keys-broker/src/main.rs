use std::path::PathBuf;
use std::process;

use clap::Parser;
use wallet_keys_broker::config::{AuthLayer, ConfigLayer, ENV_CONFIG_PATH, StoreLayer};
use wallet_keys_broker::telemetry;

#[derive(Parser)]
#[command(about = "Token-gated store for wallet secret keys")]
struct BrokerArgs {
    /// TOML config file
    #[arg(long, env = ENV_CONFIG_PATH)]
    config: Option<PathBuf>,
    /// Override bind address
    #[arg(long)]
    bind: Option<String>,
    /// Override the expected token audience (client id)
    #[arg(long)]
    audience: Option<String>,
    /// Override the verification url template; `{token}` is replaced by the bearer token
    #[arg(long)]
    verify_url: Option<String>,
    /// Credential store backend: `redis` or `memory`
    #[arg(long)]
    store: Option<String>,
    /// Override the redis connection url
    #[arg(long)]
    redis_url: Option<String>,
}

impl BrokerArgs {
    fn overrides(&self) -> ConfigLayer {
        ConfigLayer {
            bind_address: self.bind.clone(),
            auth: Some(AuthLayer {
                audience: self.audience.clone(),
                verify_url: self.verify_url.clone(),
                timeout_ms: None,
            }),
            store: Some(StoreLayer {
                kind: self.store.clone(),
                redis_url: self.redis_url.clone(),
            }),
        }
    }
}

#[tokio::main]
async fn main() {
    if let Err(err) = real_main().await {
        eprintln!("broker exited with error: {err:#}");
        process::exit(1);
    }
}

async fn real_main() -> anyhow::Result<()> {
    let args = BrokerArgs::parse();
    telemetry::init()?;

    let file_layer = match &args.config {
        Some(path) => ConfigLayer::from_file(path)?,
        None => ConfigLayer::default(),
    };
    let config = file_layer
        .merge(ConfigLayer::from_env()?)
        .merge(args.overrides())
        .resolve()?;

    wallet_keys_broker::run(config).await
}
