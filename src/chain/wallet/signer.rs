use anyhow::Result;
use base64::{engine::general_purpose::STANDARD, Engine};
use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use ed25519_dalek::Signer;

use super::SuiWallet;

/// Intent prefix for a transaction: scope TransactionData, version V0, app Sui
const TRANSACTION_INTENT: [u8; 3] = [0, 0, 0];
const ED25519_FLAG: u8 = 0x00;

/// Transaction signer for Sui
/// Signs the blake2b-256 digest of the intent message with ed25519
pub struct TransactionSigner;

impl TransactionSigner {
    pub fn new() -> Self {
        Self
    }

    /// Sign base64 transaction bytes as returned by the full node.
    /// Returns the base64 serialized signature `flag || sig || pubkey`.
    pub fn sign_transaction(&self, tx_bytes_b64: &str, wallet: &SuiWallet) -> Result<String> {
        let tx_bytes = STANDARD.decode(tx_bytes_b64)?;
        let digest = Self::intent_digest(&tx_bytes);

        let signature = wallet.signing_key().sign(&digest);

        let mut serialized = Vec::with_capacity(1 + 64 + 32);
        serialized.push(ED25519_FLAG);
        serialized.extend_from_slice(&signature.to_bytes());
        serialized.extend_from_slice(&wallet.public_key_bytes());

        Ok(STANDARD.encode(serialized))
    }

    fn intent_digest(tx_bytes: &[u8]) -> [u8; 32] {
        let mut hasher = Blake2b::<U32>::new();
        hasher.update(TRANSACTION_INTENT);
        hasher.update(tx_bytes);
        let mut digest = [0u8; 32];
        digest.copy_from_slice(&hasher.finalize());
        digest
    }
}

impl Default for TransactionSigner {
    fn default() -> Self {
        Self::new()
    }
}
