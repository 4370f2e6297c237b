//! Game contract CLI: deploy (or reuse) the app, fund it, and say hello.

use game_client::{
    connect, get_account, Config, GameClient, KeyStore, OnSchemaBreak, OnUpdate,
};
use game_client::account::DEFAULT_ACCOUNT_FUNDING;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config: Config = config::Config::builder()
        .add_source(config::File::with_name("game").required(false))
        .add_source(config::Environment::with_prefix("GAME"))
        .build()?
        .try_deserialize()?;

    info!(network = ?config.network, algod = %config.algod_url, "Configuration loaded");

    let ledger = connect(&config)?;
    let keys = KeyStore::new_plaintext(PathBuf::from(&config.keys_path))?;
    let creator = get_account(ledger.as_ref(), &keys, "CREATOR", DEFAULT_ACCOUNT_FUNDING).await?;

    let mut client =
        GameClient::new(ledger, creator, config.indexer()?).with_spec(config.app_spec()?);
    if let Some(indexer) = client.indexer() {
        let health = indexer.health().await?;
        info!(url = indexer.base_url(), round = health.round, "Indexer reachable");
    }

    let outcome = client
        .deploy(OnSchemaBreak::AppendApp, OnUpdate::AppendApp)
        .await?;
    info!(
        app_id = outcome.app_id(),
        address = %client.app_address(),
        ?outcome,
        "Application ready"
    );

    if config.app_funding > 0 {
        client.fund_app(config.app_funding).await?;
    }

    let greeting = client.hello("World").await?;
    info!(
        tx_id = %greeting.tx_id,
        round = greeting.confirmed_round,
        "{}",
        greeting.return_value
    );

    Ok(())
}
