mod keys;
mod signer;

pub use keys::{generate_mnemonic, SuiWallet};
pub use signer::TransactionSigner;
