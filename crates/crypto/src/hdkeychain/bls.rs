//! BLS12-381 extended keys
//!
//! Derivation follows the BIP-32 shape with one deliberate difference: the
//! HMAC input is always the compressed parent public key, never the secret
//! scalar. Child keys are additive tweaks (`child = parent + tweak`), which
//! keeps private and public derivation in lockstep and lets a watch-only
//! extended public key derive children at hardened indices too.

use super::{
    decode_extended_key, encode_extended_key, hmac_sha512, KeychainError, HRP_XPRV, HRP_XPUB,
    KEY_FAMILY_BLS,
};
use crate::bls::{BlsPublicKey, BlsSecretKey};
use std::fmt;
use std::str::FromStr;
use zeroize::Zeroize;

/// Domain-separated HMAC key for the BLS master node
const MASTER_KEY_SALT: &[u8] = b"BLS12-381 seed";

/// Extended BLS private key: secret scalar plus chain code
#[derive(Clone)]
pub struct ExtendedPrivateKey {
    secret_key: BlsSecretKey,
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
        let secret_key = BlsSecretKey::from_seed(&il);
        let mut chain_code = [0u8; 32];
        chain_code.copy_from_slice(&i[32..]);
        il.zeroize();

        Ok(Self {
            secret_key,
            chain_code,
            depth: 0,
        })
    }

    /// Derive the child key at `index` (hardened or not)
    pub fn derive(&self, index: u32) -> Result<Self, KeychainError> {
        let depth = self.depth.checked_add(1).ok_or_else(|| {
            KeychainError::InvalidExtendedKey("maximum derivation depth exceeded".to_string())
        })?;

        let (tweak, chain_code) = child_tweak(
            &self.chain_code,
            &self.secret_key.public_key(),
            index,
        );
        let secret_key = self
            .secret_key
            .add_tweak(&tweak)
            .map_err(|e| KeychainError::InvalidExtendedKey(e.to_string()))?;

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
    pub fn secret_key(&self) -> &BlsSecretKey {
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
            KEY_FAMILY_BLS,
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
            .field("family", &"bls12-381")
            .field("depth", &self.depth)
            .field("key", &"[REDACTED]")
            .finish()
    }
}

impl FromStr for ExtendedPrivateKey {
    type Err = KeychainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (depth, chain_code, key) = decode_extended_key(s, HRP_XPRV, KEY_FAMILY_BLS, 32)?;
        let key_bytes: [u8; 32] = key
            .as_slice()
            .try_into()
            .map_err(|_| KeychainError::InvalidExtendedKey("bad key length".to_string()))?;
        let secret_key = BlsSecretKey::from_bytes(&key_bytes)
            .map_err(|e| KeychainError::InvalidExtendedKey(e.to_string()))?;

        Ok(Self {
            secret_key,
            chain_code,
            depth,
        })
    }
}

/// Extended BLS public key: G1 point plus chain code
#[derive(Clone, PartialEq, Eq)]
pub struct ExtendedPublicKey {
    public_key: BlsPublicKey,
    chain_code: [u8; 32],
    depth: u8,
}

impl ExtendedPublicKey {
    /// Derive the child public key at `index` (hardened or not)
    ///
    /// Unlike secp256k1-style trees there is no secret material in the
    /// tweak, so hardened indices derive from the public key as well.
    pub fn derive(&self, index: u32) -> Result<Self, KeychainError> {
        let depth = self.depth.checked_add(1).ok_or_else(|| {
            KeychainError::InvalidExtendedKey("maximum derivation depth exceeded".to_string())
        })?;

        let (tweak, chain_code) = child_tweak(&self.chain_code, &self.public_key, index);
        let public_key = self
            .public_key
            .add_tweak(&tweak.public_key())
            .map_err(|e| KeychainError::InvalidExtendedKey(e.to_string()))?;

        Ok(Self {
            public_key,
            chain_code,
            depth,
        })
    }

    /// The public key at this node
    pub fn public_key(&self) -> &BlsPublicKey {
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
            KEY_FAMILY_BLS,
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
            .field("family", &"bls12-381")
            .field("depth", &self.depth)
            .field("public_key", &self.public_key)
            .finish()
    }
}

impl FromStr for ExtendedPublicKey {
    type Err = KeychainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (depth, chain_code, key) = decode_extended_key(s, HRP_XPUB, KEY_FAMILY_BLS, 48)?;
        let key_bytes: [u8; 48] = key
            .as_slice()
            .try_into()
            .map_err(|_| KeychainError::InvalidExtendedKey("bad key length".to_string()))?;
        let public_key = BlsPublicKey::from_bytes(&key_bytes)
            .map_err(|e| KeychainError::InvalidExtendedKey(e.to_string()))?;

        Ok(Self {
            public_key,
            chain_code,
            depth,
        })
    }
}

/// Compute the child tweak and chain code for one derivation step.
fn child_tweak(
    chain_code: &[u8; 32],
    parent_pubkey: &BlsPublicKey,
    index: u32,
) -> (BlsSecretKey, [u8; 32]) {
    let pubkey_bytes = parent_pubkey.to_bytes();
    let i = hmac_sha512(chain_code, &[&pubkey_bytes, &index.to_be_bytes()]);

    let mut il = [0u8; 32];
    il.copy_from_slice(&i[..32]);
    let tweak = BlsSecretKey::from_seed(&il);
    let mut child_chain_code = [0u8; 32];
    child_chain_code.copy_from_slice(&i[32..]);
    il.zeroize();

    (tweak, child_chain_code)
}
