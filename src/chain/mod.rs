pub mod wallet;
pub mod client;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

pub use wallet::{SuiWallet, TransactionSigner};
pub use client::{SuiClient, ClientConfig};

/// A freshly generated keyed identity.
/// The mnemonic is the only durable credential for the address.
#[derive(Clone)]
pub struct Identity {
    mnemonic: Zeroizing<String>,
    pub address: String,
}

impl Identity {
    pub fn new(mnemonic: String, address: String) -> Self {
        Self {
            mnemonic: Zeroizing::new(mnemonic),
            address,
        }
    }

    pub fn mnemonic(&self) -> &str {
        &self.mnemonic
    }
}

impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Identity")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

/// One sample asset to mint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintTemplate {
    pub name: String,
    pub description: String,
    pub url: String,
}

impl MintTemplate {
    pub fn new(name: &str, description: &str, url: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            url: url.to_string(),
        }
    }
}

/// Chain acknowledgement of a mint submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintReceipt {
    pub template: String,
    pub digest: String,
}

/// Identity and transaction capability of the target chain
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Generate a new mnemonic and derive its address
    fn generate_identity(&self) -> Result<Identity>;

    fn derive_address(&self, mnemonic: &str) -> Result<String>;

    /// Sign and submit one mint call for `template`
    async fn submit_mint(&self, identity: &Identity, template: &MintTemplate) -> Result<MintReceipt>;
}
