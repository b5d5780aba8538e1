use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::chain::MintTemplate;

/// Optional override file looked up in the working directory
pub const CONFIG_FILE: &str = "farmer.toml";

/// Every table and field is optional in the file; missing ones keep the
/// built-in default
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub farm: FarmConfig,
    pub network: NetworkConfig,
    pub templates: Vec<MintTemplate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FarmConfig {
    pub proxy_file: PathBuf,
    pub mnemonic_file: PathBuf,
    pub probe_concurrency: usize,
    pub probe_timeout_secs: u64,
    pub request_timeout_secs: u64,
    /// Global pause after the faucet answers 429
    pub rate_limit_backoff_ms: u64,
    /// Pause after an iteration fails unexpectedly
    pub error_backoff_ms: u64,
    /// Stop after this many passes even if proxies remain eligible
    pub max_passes: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub faucet_url: String,
    pub probe_url: String,
    pub rpc_endpoint: String,
    pub explorer_url: String,
    pub nft_package: String,
    pub nft_module: String,
    pub nft_function: String,
    pub gas_budget: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            farm: FarmConfig::default(),
            network: NetworkConfig::default(),
            templates: default_templates(),
        }
    }
}

impl Default for FarmConfig {
    fn default() -> Self {
        Self {
            proxy_file: PathBuf::from("proxy.txt"),
            mnemonic_file: PathBuf::from("mnemonic.txt"),
            probe_concurrency: (num_cpus::get() * 4).max(4),
            probe_timeout_secs: 15,
            request_timeout_secs: 30,
            rate_limit_backoff_ms: 5_000,
            error_backoff_ms: 10_000,
            max_passes: None,
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            faucet_url: "https://faucet.testnet.sui.io/gas".to_string(),
            probe_url: "https://api64.ipify.org/?format=json".to_string(),
            rpc_endpoint: "https://fullnode.testnet.sui.io".to_string(),
            explorer_url: "https://explorer.sui.io".to_string(),
            nft_package: "0x2".to_string(),
            nft_module: "devnet_nft".to_string(),
            nft_function: "mint".to_string(),
            gas_budget: 10_000_000,
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load `path` if it exists, otherwise fall back to the built-in defaults
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }
}

impl FarmConfig {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn rate_limit_backoff(&self) -> Duration {
        Duration::from_millis(self.rate_limit_backoff_ms)
    }

    pub fn error_backoff(&self) -> Duration {
        Duration::from_millis(self.error_backoff_ms)
    }
}

/// Sample NFTs minted for every funded identity
pub fn default_templates() -> Vec<MintTemplate> {
    [
        (
            "Example NFT",
            "An NFT created by Sui Wallet",
            "ipfs://QmZPWWy5Si54R3d26toaqRiqvCH7HkGdXkxwUgCm2oKKM2?filename=img-sq-01.png",
        ),
        (
            "Example NFT",
            "An NFT created by the wallet Command Line Tool",
            "ipfs://bafkreibngqhl3gaa7daob4i2vccziay2jjlp435cf66vhono7nrvww53ty",
        ),
        (
            "Wizard Land",
            "Expanding The Magic Land",
            "https://gateway.pinata.cloud/ipfs/QmYfw8RbtdjPAF3LrC6S3wGVwWgn6QKq4LGS4HFS55adU2?w=800&h=450&c=crop",
        ),
        (
            "Ethos 2048 Game",
            "This player has unlocked the 2048 tile on Ethos 2048. They are a Winner!",
            "https://arweave.net/QW9doLmmWdQ-7t8GZ85HtY8yzutoir8lGEJP9zOPQqA",
        ),
        (
            "Sample NFT 1",
            "Sample NFT",
            "https://cdn.martianwallet.xyz/assets/sample-nft.png",
        ),
        (
            "Sui Test Ecosystem",
            "Get ready for the Suinami 🌊",
            "ipfs://QmVnWhM2qYr9JkjGLaEVSZnCprRLDW8qns1oYYVXjnb4DA/sui.jpg",
        ),
        (
            "Skull Sui",
            "Skulls are emerging from the ground!",
            "https://gateway.pinata.cloud/ipfs/QmcsJtucGrzkup9cZp2N8vvTc9zxuQtV85z3g2Rs4YRLGX",
        ),
    ]
    .into_iter()
    .map(|(name, description, url)| MintTemplate::new(name, description, url))
    .collect()
}
