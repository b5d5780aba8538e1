use anyhow::Result;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use faucet_farmer::chain::{ClientConfig, SuiClient};
use faucet_farmer::config::{Config, CONFIG_FILE};
use faucet_farmer::faucet::FaucetClient;
use faucet_farmer::orchestrator::{FarmOrchestrator, OrchestratorConfig, RunOutcome};
use faucet_farmer::proxy::{self, ProxyValidator};
use faucet_farmer::storage::MnemonicStore;
use faucet_farmer::transport::ReqwestTransport;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "faucet_farmer=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load_or_default(CONFIG_FILE)?;
    let records = proxy::load(&config.farm.proxy_file)?;
    info!("Found {} proxies in {}", records.len(), config.farm.proxy_file.display());

    let transport = Arc::new(ReqwestTransport::new(config.farm.request_timeout()));
    let validator = ProxyValidator::new(
        transport.clone(),
        config.network.probe_url.clone(),
        config.farm.probe_timeout(),
        config.farm.probe_concurrency,
    );
    let faucet = FaucetClient::new(transport, config.network.faucet_url.clone());
    let chain = Arc::new(SuiClient::new(ClientConfig::from_network(
        &config.network,
        config.farm.request_timeout_secs,
    ))?);
    let store = MnemonicStore::new(&config.farm.mnemonic_file);

    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown requested, finishing current iteration");
            shutdown.cancel();
        }
    });

    let mut orchestrator = FarmOrchestrator::new(
        OrchestratorConfig::from_config(&config),
        validator,
        faucet,
        chain,
        store,
        config.templates.clone(),
        cancel,
    );

    match orchestrator.run(records).await {
        RunOutcome::NoUsableProxies { total } => {
            warn!("None of the {} proxies passed validation", total);
        }
        RunOutcome::Exhausted(stats)
        | RunOutcome::PassLimitReached(stats)
        | RunOutcome::Cancelled(stats) => {
            info!("{}", stats.summary());
            for address in &stats.funded_addresses {
                info!("Funded {}", address);
            }
            info!("Mnemonics saved to {}", config.farm.mnemonic_file.display());
        }
    }

    Ok(())
}
