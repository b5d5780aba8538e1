/// JSON-RPC client for a Sui full node
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use super::wallet::{generate_mnemonic, SuiWallet, TransactionSigner};
use super::{ChainClient, Identity, MintReceipt, MintTemplate};
use crate::config::NetworkConfig;

/// Configuration for the full node client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub rpc_endpoint: String,
    /// Request timeout in seconds
    pub request_timeout: u64,
    pub package: String,
    pub module: String,
    pub function: String,
    pub gas_budget: u64,
}

impl ClientConfig {
    pub fn from_network(network: &NetworkConfig, request_timeout: u64) -> Self {
        Self {
            rpc_endpoint: network.rpc_endpoint.clone(),
            request_timeout,
            package: network.nft_package.clone(),
            module: network.nft_module.clone(),
            function: network.nft_function.clone(),
            gas_budget: network.gas_budget,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    result: Option<Value>,
    error: Option<RpcError>,
}

impl RpcResponse {
    fn into_result(self, method: &str) -> Result<Value> {
        if let Some(err) = self.error {
            return Err(anyhow!("{} failed ({}): {}", method, err.code, err.message));
        }
        self.result
            .ok_or_else(|| anyhow!("{} returned neither result nor error", method))
    }
}

pub struct SuiClient {
    client: Client,
    config: ClientConfig,
    signer: TransactionSigner,
    next_id: AtomicU64,
}

impl SuiClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout))
            .build()?;

        Ok(Self {
            client,
            config,
            signer: TransactionSigner::new(),
            next_id: AtomicU64::new(1),
        })
    }

    async fn call(&self, method: &str, params: Value) -> Result<Value> {
        let request = json!({
            "jsonrpc": "2.0",
            "id": self.next_id.fetch_add(1, Ordering::Relaxed),
            "method": method,
            "params": params,
        });

        let response = self
            .client
            .post(&self.config.rpc_endpoint)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(anyhow!("{} HTTP {}: {}", method, status, error_text));
        }

        let rpc: RpcResponse = response.json().await?;
        rpc.into_result(method)
    }

    /// Ask the node to build the mint transaction; returns base64 tx bytes
    async fn build_mint(&self, sender: &str, template: &MintTemplate) -> Result<String> {
        let result = self
            .call("unsafe_moveCall", self.mint_call_params(sender, template))
            .await?;

        result
            .get("txBytes")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| anyhow!("unsafe_moveCall response missing txBytes"))
    }

    async fn execute(&self, tx_bytes: &str, signature: &str) -> Result<String> {
        let result = self
            .call(
                "sui_executeTransactionBlock",
                json!([
                    tx_bytes,
                    [signature],
                    { "showEffects": true },
                    "WaitForLocalExecution"
                ]),
            )
            .await?;

        extract_digest(&result)
    }

    fn mint_call_params(&self, sender: &str, template: &MintTemplate) -> Value {
        json!([
            sender,
            self.config.package,
            self.config.module,
            self.config.function,
            [],
            [template.name, template.description, template.url],
            null,
            self.config.gas_budget.to_string(),
        ])
    }
}

/// Pull the digest out of an execution result, failing on an aborted effect
fn extract_digest(result: &Value) -> Result<String> {
    if let Some(status) = result.pointer("/effects/status") {
        if status.get("status").and_then(Value::as_str) != Some("success") {
            let reason = status
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("unknown failure");
            return Err(anyhow!("transaction failed on chain: {}", reason));
        }
    }

    result
        .get("digest")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| anyhow!("execution response missing digest"))
}

#[async_trait]
impl ChainClient for SuiClient {
    fn generate_identity(&self) -> Result<Identity> {
        let mnemonic = generate_mnemonic()?;
        let address = self.derive_address(&mnemonic)?;
        Ok(Identity::new(mnemonic.as_str().to_string(), address))
    }

    fn derive_address(&self, mnemonic: &str) -> Result<String> {
        Ok(SuiWallet::from_mnemonic(mnemonic)?.address.clone())
    }

    async fn submit_mint(&self, identity: &Identity, template: &MintTemplate) -> Result<MintReceipt> {
        let tx_bytes = self.build_mint(&identity.address, template).await?;

        let signature = {
            let wallet = SuiWallet::from_mnemonic(identity.mnemonic())?;
            self.signer.sign_transaction(&tx_bytes, &wallet)?
        };

        let digest = self.execute(&tx_bytes, &signature).await?;
        log::debug!("Mint '{}' for {} executed: {}", template.name, identity.address, digest);

        Ok(MintReceipt {
            template: template.name.clone(),
            digest,
        })
    }
}
