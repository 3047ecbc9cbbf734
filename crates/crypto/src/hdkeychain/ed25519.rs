//! Ed25519 extended keys (SLIP-0010 style)
//!
//! Only hardened private derivation is defined for this family: the child
//! key is re-keyed from HMAC output rather than tweaked, and the HMAC input
//! contains the parent secret. Deriving with a non-hardened index, or from
//! an extended public key, fails with [`KeychainError::UnusableChild`].

use super::{
    decode_extended_key, encode_extended_key, hmac_sha512, KeychainError, HARDENED_KEY_START,
    HRP_XPRV, HRP_XPUB, KEY_FAMILY_ED25519,
};
use crate::ed25519::{Ed25519PublicKey, Ed25519SecretKey};
use std::fmt;
use std::str::FromStr;
use zeroize::Zeroize;

/// Domain-separated HMAC key for the Ed25519 master node
const MASTER_KEY_SALT: &[u8] = b"ed25519 seed";

/// Extended Ed25519 private key: seed plus chain code
#[derive(Clone)]
pub struct ExtendedPrivateKey {
    secret_key: Ed25519SecretKey,
    chain_code: [u8; 32],
    depth: u8,
}

impl ExtendedPrivateKey {
    /// Derive the master key from a 16..=64 byte seed
    pub fn new_master(seed: &[u8]) -> Result<Self, KeychainError> {
        if seed.len() < 16 || seed.len() > 64 {
            return Err(KeychainError::InvalidExtendedKey(format!(
                "seed must be 16..=64 bytes, got {}",
                seed.len()
            )));
        }

        let i = hmac_sha512(MASTER_KEY_SALT, &[seed]);
        let mut il = [0u8; 32];
        il.copy_from_slice(&i[..32]);
        let secret_key = Ed25519SecretKey::from_seed(&il);
        let mut chain_code = [0u8; 32];
        chain_code.copy_from_slice(&i[32..]);
        il.zeroize();

        Ok(Self {
            secret_key,
            chain_code,
            depth: 0,
        })
    }

    /// Derive the hardened child key at `index`
    ///
    /// `index` must already carry the hardening bit; a non-hardened index
    /// fails with [`KeychainError::UnusableChild`].
    pub fn derive(&self, index: u32) -> Result<Self, KeychainError> {
        if index < HARDENED_KEY_START {
            return Err(KeychainError::UnusableChild);
        }
        let depth = self.depth.checked_add(1).ok_or_else(|| {
            KeychainError::InvalidExtendedKey("maximum derivation depth exceeded".to_string())
        })?;

        let mut key_bytes = self.secret_key.to_bytes();
        let i = hmac_sha512(
            &self.chain_code,
            &[&[0u8], &key_bytes, &index.to_be_bytes()],
        );
        key_bytes.zeroize();

        let mut il = [0u8; 32];
        il.copy_from_slice(&i[..32]);
        let secret_key = Ed25519SecretKey::from_seed(&il);
        let mut chain_code = [0u8; 32];
        chain_code.copy_from_slice(&i[32..]);
        il.zeroize();

        Ok(Self {
            secret_key,
            chain_code,
            depth,
        })
    }

    /// Neuter this key to its public counterpart
    pub fn to_public(&self) -> ExtendedPublicKey {
        ExtendedPublicKey {
            public_key: self.secret_key.public_key(),
            chain_code: self.chain_code,
            depth: self.depth,
        }
    }

    /// The secret key at this node
    pub fn secret_key(&self) -> &Ed25519SecretKey {
        &self.secret_key
    }

    /// Depth of this node in the derivation tree (0 = master)
    pub fn depth(&self) -> u8 {
        self.depth
    }
}

impl fmt::Display for ExtendedPrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let encoded = encode_extended_key(
            HRP_XPRV,
            KEY_FAMILY_ED25519,
            self.depth,
            &self.chain_code,
            &self.secret_key.to_bytes(),
        )?;
        f.write_str(&encoded)
    }
}

impl fmt::Debug for ExtendedPrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtendedPrivateKey")
            .field("family", &"ed25519")
            .field("depth", &self.depth)
            .field("key", &"[REDACTED]")
            .finish()
    }
}

impl FromStr for ExtendedPrivateKey {
    type Err = KeychainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (depth, chain_code, key) = decode_extended_key(s, HRP_XPRV, KEY_FAMILY_ED25519, 32)?;
        let key_bytes: [u8; 32] = key
            .as_slice()
            .try_into()
            .map_err(|_| KeychainError::InvalidExtendedKey("bad key length".to_string()))?;

        Ok(Self {
            secret_key: Ed25519SecretKey::from_bytes(&key_bytes),
            chain_code,
            depth,
        })
    }
}

/// Extended Ed25519 public key
///
/// A watch-only handle: it identifies the node but cannot derive children.
#[derive(Clone, PartialEq, Eq)]
pub struct ExtendedPublicKey {
    public_key: Ed25519PublicKey,
    chain_code: [u8; 32],
    depth: u8,
}

impl ExtendedPublicKey {
    /// Child derivation is not defined for Ed25519 public keys
    pub fn derive(&self, _index: u32) -> Result<Self, KeychainError> {
        Err(KeychainError::UnusableChild)
    }

    /// The public key at this node
    pub fn public_key(&self) -> &Ed25519PublicKey {
        &self.public_key
    }

    /// Depth of this node in the derivation tree (0 = master)
    pub fn depth(&self) -> u8 {
        self.depth
    }
}

impl fmt::Display for ExtendedPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let encoded = encode_extended_key(
            HRP_XPUB,
            KEY_FAMILY_ED25519,
            self.depth,
            &self.chain_code,
            &self.public_key.to_bytes(),
        )?;
        f.write_str(&encoded)
    }
}

impl fmt::Debug for ExtendedPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtendedPublicKey")
            .field("family", &"ed25519")
            .field("depth", &self.depth)
            .field("public_key", &self.public_key)
            .finish()
    }
}

impl FromStr for ExtendedPublicKey {
    type Err = KeychainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (depth, chain_code, key) = decode_extended_key(s, HRP_XPUB, KEY_FAMILY_ED25519, 32)?;
        let key_bytes: [u8; 32] = key
            .as_slice()
            .try_into()
            .map_err(|_| KeychainError::InvalidExtendedKey("bad key length".to_string()))?;
        let public_key = Ed25519PublicKey::from_bytes(&key_bytes)
            .map_err(|e| KeychainError::InvalidExtendedKey(e.to_string()))?;

        Ok(Self {
            public_key,
            chain_code,
            depth,
        })
    }
}
