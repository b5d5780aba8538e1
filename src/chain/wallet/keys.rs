use anyhow::{anyhow, Result};
use bip39::Mnemonic;
use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use ed25519_dalek::SigningKey;
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha512;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

type HmacSha512 = Hmac<Sha512>;
type Blake2b256 = Blake2b<U32>;

/// m/44'/784'/0'/0'/0', every level hardened as ed25519 requires
const SUI_HD_PATH: [u32; 5] = [44, 784, 0, 0, 0];
const HARDENED: u32 = 0x8000_0000;
const ED25519_FLAG: u8 = 0x00;

/// 12-word English mnemonic from 128 bits of fresh entropy
pub fn generate_mnemonic() -> Result<Zeroizing<String>> {
    let mut entropy = Zeroizing::new([0u8; 16]);
    rand::thread_rng().fill_bytes(&mut entropy[..]);
    let mnemonic = Mnemonic::from_entropy(&entropy[..])?;
    Ok(Zeroizing::new(mnemonic.to_string()))
}

/// Ed25519 wallet for Sui derived with SLIP-0010
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SuiWallet {
    #[zeroize(skip)]
    pub address: String,

    private_key_bytes: [u8; 32],
    public_key_bytes: [u8; 32],
}

impl SuiWallet {
    /// Create a wallet from a BIP39 mnemonic with no passphrase
    pub fn from_mnemonic(mnemonic_str: &str) -> Result<Self> {
        let mnemonic = Mnemonic::parse(mnemonic_str)?;
        let seed = Zeroizing::new(mnemonic.to_seed(""));

        let private_key = derive_slip10_ed25519(&seed[..], &SUI_HD_PATH)?;
        let signing_key = SigningKey::from_bytes(&private_key);
        let public_key_bytes = signing_key.verifying_key().to_bytes();

        Ok(Self {
            address: sui_address(&public_key_bytes),
            private_key_bytes: *private_key,
            public_key_bytes,
        })
    }

    /// Signing key for this wallet. Caller is responsible for secure handling.
    pub fn signing_key(&self) -> SigningKey {
        SigningKey::from_bytes(&self.private_key_bytes)
    }

    pub fn public_key_bytes(&self) -> [u8; 32] {
        self.public_key_bytes
    }
}

impl std::fmt::Debug for SuiWallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SuiWallet")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

/// SLIP-0010 ed25519 derivation along a fully hardened path
fn derive_slip10_ed25519(seed: &[u8], path: &[u32]) -> Result<Zeroizing<[u8; 32]>> {
    let (mut key, mut chain_code) = hmac_split(b"ed25519 seed", seed)?;

    for index in path {
        let mut data = Zeroizing::new(Vec::with_capacity(37));
        data.push(0u8);
        data.extend_from_slice(&key[..]);
        data.extend_from_slice(&(index | HARDENED).to_be_bytes());

        let (child_key, child_chain) = hmac_split(&chain_code[..], &data)?;
        key = child_key;
        chain_code = child_chain;
    }

    Ok(key)
}

fn hmac_split(key: &[u8], data: &[u8]) -> Result<(Zeroizing<[u8; 32]>, Zeroizing<[u8; 32]>)> {
    let mut mac = HmacSha512::new_from_slice(key)
        .map_err(|e| anyhow!("Invalid HMAC key: {}", e))?;
    mac.update(data);
    let output = mac.finalize().into_bytes();

    let mut left = Zeroizing::new([0u8; 32]);
    let mut right = Zeroizing::new([0u8; 32]);
    left.copy_from_slice(&output[..32]);
    right.copy_from_slice(&output[32..]);
    Ok((left, right))
}

/// `0x` + hex(blake2b-256(flag || pubkey))
fn sui_address(public_key: &[u8; 32]) -> String {
    let mut hasher = Blake2b256::new();
    hasher.update([ED25519_FLAG]);
    hasher.update(public_key);
    format!("0x{}", hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;

    // SLIP-0010 test vector 1 for ed25519
    const VECTOR_SEED: &str = "000102030405060708090a0b0c0d0e0f";

    #[test]
    fn test_slip10_master_key() {
        let seed = hex::decode(VECTOR_SEED).unwrap();
        let key = derive_slip10_ed25519(&seed, &[]).unwrap();
        assert_eq!(
            hex::encode(&key[..]),
            "2b4be7f19ee27bbf30c667b642d5f4aa69fd169872f8fc3059c08ebae2eb19e7"
        );
    }

    #[test]
    fn test_slip10_first_hardened_child() {
        let seed = hex::decode(VECTOR_SEED).unwrap();
        let key = derive_slip10_ed25519(&seed, &[0]).unwrap();
        assert_eq!(
            hex::encode(&key[..]),
            "68e0fe46dfb67e368c75379acec591dad19df3cde26e63b93a8e704f1dade7a3"
        );
    }

    #[test]
    fn test_address_depends_on_key() {
        let a = sui_address(&[1u8; 32]);
        let b = sui_address(&[2u8; 32]);
        assert_ne!(a, b);
        assert_eq!(a.len(), 66);
    }

    #[test]
    fn test_invalid_mnemonic_rejected() {
        assert!(SuiWallet::from_mnemonic("not a real mnemonic").is_err());
    }

    #[test]
    fn test_public_key_matches_signing_key() {
        let mnemonic = generate_mnemonic().unwrap();
        let wallet = SuiWallet::from_mnemonic(&mnemonic).unwrap();
        assert_eq!(
            wallet.signing_key().verifying_key().to_bytes(),
            wallet.public_key_bytes()
        );
    }
}
