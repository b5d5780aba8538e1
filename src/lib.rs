// Library exports for faucet_farmer

pub mod chain;
pub mod config;
pub mod error;
pub mod faucet;
pub mod minter;
pub mod orchestrator;
pub mod proxy;
pub mod storage;
pub mod transport;

#[cfg(test)]
mod testing;

// Re-export main types for convenience
pub use chain::{ChainClient, SuiClient, SuiWallet};
pub use config::Config;
pub use faucet::{FaucetClient, FundingOutcome};
pub use orchestrator::{FarmOrchestrator, OrchestratorConfig, RunOutcome};
pub use proxy::{ProxyPool, ProxyRecord, ProxyValidator};
pub use transport::{HttpTransport, ReqwestTransport};
