/// Farming Orchestrator - drives the proxy pool through fund-then-mint passes
///
/// 1. Validate the parsed proxy list (the only concurrent step)
/// 2. Walk every eligible proxy in order: new identity, faucet request,
///    persist mnemonic, mint batch
/// 3. Repeat passes until no proxy is eligible, the pass limit is hit or
///    the run is cancelled

use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use crate::chain::{ChainClient, MintTemplate};
use crate::config::Config;
use crate::error::FarmError;
use crate::faucet::{FaucetClient, FundingOutcome};
use crate::minter::{IdentityMinter, MintBatchOutcome};
use crate::proxy::{ProxyPool, ProxyRecord, ProxyValidator};
use crate::storage::MnemonicStore;

mod stats;
pub use self::stats::{FarmStatistics, StatsCollector};

/// Loop-level state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Running,
    /// Terminal: no proxy is eligible any more
    Exhausted,
}

/// How a run ended
#[derive(Debug, Clone)]
pub enum RunOutcome {
    /// Validation left nothing to work with
    NoUsableProxies { total: usize },
    Exhausted(FarmStatistics),
    PassLimitReached(FarmStatistics),
    Cancelled(FarmStatistics),
}

/// Configuration for the orchestrator
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Global pause after the faucet rate limits a proxy
    pub rate_limit_backoff: Duration,
    /// Pause after an iteration fails
    pub error_backoff: Duration,
    pub max_passes: Option<u32>,
    pub explorer_url: String,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl OrchestratorConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            rate_limit_backoff: config.farm.rate_limit_backoff(),
            error_backoff: config.farm.error_backoff(),
            max_passes: config.farm.max_passes,
            explorer_url: config.network.explorer_url.clone(),
        }
    }

    fn explorer_link(&self, address: &str) -> String {
        format!(
            "{}/addresses/{}?network=testnet",
            self.explorer_url.trim_end_matches('/'),
            address
        )
    }
}

/// Result of one proxy's turn within a pass
#[derive(Debug)]
enum IterationOutcome {
    Minted { address: String, receipts: usize },
    PartiallyMinted {
        address: String,
        completed: usize,
        failed_template: String,
        reason: String,
    },
    RateLimited,
    NotFunded,
}

/// Main orchestrator coordinating the farming loop
pub struct FarmOrchestrator {
    config: OrchestratorConfig,
    validator: ProxyValidator,
    faucet: FaucetClient,
    chain: Arc<dyn ChainClient>,
    minter: IdentityMinter,
    store: MnemonicStore,
    templates: Vec<MintTemplate>,
    stats: StatsCollector,
    state: LoopState,
    cancel: CancellationToken,
}

impl FarmOrchestrator {
    pub fn new(
        config: OrchestratorConfig,
        validator: ProxyValidator,
        faucet: FaucetClient,
        chain: Arc<dyn ChainClient>,
        store: MnemonicStore,
        templates: Vec<MintTemplate>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            config,
            validator,
            faucet,
            minter: IdentityMinter::new(chain.clone()),
            chain,
            store,
            templates,
            stats: StatsCollector::new(),
            state: LoopState::Idle,
            cancel,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn statistics(&self) -> FarmStatistics {
        self.stats.get_stats()
    }

    /// Validate `records` and farm with whatever survives
    pub async fn run(&mut self, records: Vec<ProxyRecord>) -> RunOutcome {
        log::info!("Run {}: found {} proxies", self.stats.run_id(), records.len());

        let report = self.validator.validate(records, &self.cancel).await;
        self.stats.pool_validated(report.total, report.pool.len());

        if self.cancel.is_cancelled() {
            return RunOutcome::Cancelled(self.stats.get_stats());
        }

        if report.total > 0 && report.all_valid() {
            log::info!("All proxies are valid");
        } else {
            log::info!(
                "Valid {}/{} proxies ({} auth failed, {} rate limited)",
                report.pool.len(),
                report.total,
                report.auth_failed,
                report.rate_limited
            );
        }

        if report.pool.is_empty() {
            log::warn!("No working proxies found, please make sure the proxy is in the correct format");
            return RunOutcome::NoUsableProxies { total: report.total };
        }

        let mut pool = report.pool;
        self.run_pool(&mut pool).await
    }

    /// Farm with an already validated pool until it is exhausted
    pub async fn run_pool(&mut self, pool: &mut ProxyPool) -> RunOutcome {
        self.state = LoopState::Running;
        let mut passes = 0u32;

        while pool.has_eligible() {
            if let Some(max) = self.config.max_passes {
                if passes >= max {
                    log::info!("Pass limit of {} reached. {}", max, self.stats.get_stats().summary());
                    return RunOutcome::PassLimitReached(self.stats.get_stats());
                }
            }
            passes += 1;
            self.stats.pass_started();
            log::debug!("Starting pass {} with {} eligible proxies", passes, pool.eligible_count());

            for index in 0..pool.len() {
                if self.cancel.is_cancelled() {
                    log::info!("Run cancelled. {}", self.stats.get_stats().summary());
                    return RunOutcome::Cancelled(self.stats.get_stats());
                }

                let Some(record) = pool.get_mut(index) else {
                    continue;
                };
                if !record.is_eligible() {
                    continue;
                }

                let proxy = record.redacted();
                match self.run_iteration(record).await {
                    Ok(IterationOutcome::Minted { address, receipts }) => {
                        log::info!("Minted {} assets for {}", receipts, address);
                    }
                    Ok(IterationOutcome::PartiallyMinted {
                        address,
                        completed,
                        failed_template,
                        reason,
                    }) => {
                        let err = FarmError::MintAborted {
                            template: failed_template,
                            completed,
                            reason,
                        };
                        log::error!("Funded {} via {} but minting was incomplete: {}", address, proxy, err);
                        self.backoff(self.config.error_backoff).await;
                    }
                    Ok(IterationOutcome::RateLimited) => {
                        self.backoff(self.config.rate_limit_backoff).await;
                    }
                    Ok(IterationOutcome::NotFunded) => {}
                    Err(e) => {
                        log::error!("Iteration via {} failed: {}", proxy, e);
                        self.stats.record_error(e.to_string());
                        self.backoff(self.config.error_backoff).await;
                    }
                }
                log::info!("{}", "-".repeat(100));
            }

            log::debug!(
                "Pass {} finished, {}/{} proxies still eligible",
                passes,
                pool.eligible_count(),
                pool.len()
            );
        }

        self.state = LoopState::Exhausted;
        let stats = self.stats.get_stats();
        log::info!("All proxies exhausted. {}", stats.summary());
        RunOutcome::Exhausted(stats)
    }

    /// One proxy's turn: identity, faucet, persist, mint
    async fn run_iteration(&mut self, record: &mut ProxyRecord) -> Result<IterationOutcome, FarmError> {
        let identity = self
            .chain
            .generate_identity()
            .map_err(|e| FarmError::Identity(format!("{:#}", e)))?;

        self.stats.funding_attempted();
        match self.faucet.request_funds(record, &identity.address).await {
            FundingOutcome::Granted(_) => {}
            FundingOutcome::RateLimited { .. } => {
                self.stats.funding_denied();
                self.stats.proxy_rate_limited();
                return Ok(IterationOutcome::RateLimited);
            }
            FundingOutcome::Denied { .. } => {
                self.stats.funding_denied();
                return Ok(IterationOutcome::NotFunded);
            }
        }

        self.stats.funding_granted(&identity.address);
        log::info!("Sui Address: {}", identity.address);

        // custody first: the phrase must be on disk before anything is minted
        self.store.append(identity.mnemonic())?;
        log::info!("Mnemonic saved to {}", self.store.path().display());

        let batch = self.minter.mint_batch(&identity, &self.templates).await;
        let receipts = batch.receipts().len();

        match batch {
            MintBatchOutcome::Complete(_) => {
                self.stats.minted(receipts, true);
                log::info!("Result: {}", self.config.explorer_link(&identity.address));
                Ok(IterationOutcome::Minted {
                    address: identity.address.clone(),
                    receipts,
                })
            }
            MintBatchOutcome::Partial {
                failed_template,
                reason,
                ..
            } => {
                self.stats.minted(receipts, false);
                Ok(IterationOutcome::PartiallyMinted {
                    address: identity.address.clone(),
                    completed: receipts,
                    failed_template,
                    reason,
                })
            }
        }
    }

    /// Sleep unless cancelled first
    async fn backoff(&self, duration: Duration) {
        if duration.is_zero() {
            return;
        }
        log::info!("Pausing for {} ms", duration.as_millis());
        tokio::select! {
            _ = self.cancel.cancelled() => {}
            _ = sleep(duration) => {}
        }
    }
}
