use clap::Parser;

use hunter_relay::{Args, RelayConfig};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hunter_relay=info".into()),
        )
        .init();

    if let Err(e) = start().await {
        tracing::error!(error = %e, "hunter-relay exited");
        std::process::exit(1);
    }
}

async fn start() -> hunter_common::Result<()> {
    let config = RelayConfig::try_from(Args::parse())?;
    hunter_relay::run(config).await
}
