//! Bech32m address encoding for the Halcyon chain
//!
//! An address is a one-byte type tag followed by the first 20 bytes of the
//! SHA-256 digest of the public key. Validator addresses carry the `halv`
//! human-readable prefix, account addresses (BLS and Ed25519) carry `hal`.
//! The same public key therefore yields distinct validator and account
//! address strings.

use crate::bls::BlsPublicKey;
use crate::ed25519::Ed25519PublicKey;
use crate::error::CryptoError;
use bech32::{FromBase32, ToBase32, Variant};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// Human-readable prefix for account addresses
pub const HRP_ACCOUNT: &str = "hal";

/// Human-readable prefix for validator addresses
pub const HRP_VALIDATOR: &str = "halv";

/// Length of the address hash in bytes
pub const ADDRESS_HASH_LENGTH: usize = 20;

/// Role of an address, encoded as the first payload byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum AddressType {
    /// Validator address (BLS12-381 key)
    Validator = 1,
    /// Account address backed by a BLS12-381 key
    BlsAccount = 2,
    /// Account address backed by an Ed25519 key
    Ed25519Account = 3,
}

impl TryFrom<u8> for AddressType {
    type Error = CryptoError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(AddressType::Validator),
            2 => Ok(AddressType::BlsAccount),
            3 => Ok(AddressType::Ed25519Account),
            _ => Err(CryptoError::InvalidAddress(format!(
                "unknown address type {value}"
            ))),
        }
    }
}

/// A chain address: type tag plus truncated public-key hash
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address {
    ty: AddressType,
    hash: [u8; ADDRESS_HASH_LENGTH],
}

impl Address {
    fn new(ty: AddressType, pubkey_bytes: &[u8]) -> Self {
        let digest = Sha256::digest(pubkey_bytes);
        let mut hash = [0u8; ADDRESS_HASH_LENGTH];
        hash.copy_from_slice(&digest[..ADDRESS_HASH_LENGTH]);
        Self { ty, hash }
    }

    /// Validator address for a BLS public key
    pub fn validator(pubkey: &BlsPublicKey) -> Self {
        Self::new(AddressType::Validator, &pubkey.to_bytes())
    }

    /// Account address for a BLS public key
    pub fn bls_account(pubkey: &BlsPublicKey) -> Self {
        Self::new(AddressType::BlsAccount, &pubkey.to_bytes())
    }

    /// Account address for an Ed25519 public key
    pub fn ed25519_account(pubkey: &Ed25519PublicKey) -> Self {
        Self::new(AddressType::Ed25519Account, &pubkey.to_bytes())
    }

    /// The role encoded in this address
    pub fn address_type(&self) -> AddressType {
        self.ty
    }

    /// True for validator addresses
    pub fn is_validator_address(&self) -> bool {
        self.ty == AddressType::Validator
    }

    /// True for account addresses of either key family
    pub fn is_account_address(&self) -> bool {
        !self.is_validator_address()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hrp = match self.ty {
            AddressType::Validator => HRP_VALIDATOR,
            AddressType::BlsAccount | AddressType::Ed25519Account => HRP_ACCOUNT,
        };
        let mut payload = Vec::with_capacity(1 + ADDRESS_HASH_LENGTH);
        payload.push(self.ty as u8);
        payload.extend_from_slice(&self.hash);
        let encoded =
            bech32::encode(hrp, payload.to_base32(), Variant::Bech32m).map_err(|_| fmt::Error)?;
        f.write_str(&encoded)
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({self})")
    }
}

impl FromStr for Address {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (hrp, data, variant) =
            bech32::decode(s).map_err(|e| CryptoError::InvalidAddress(e.to_string()))?;

        if variant != Variant::Bech32m {
            return Err(CryptoError::InvalidAddress(
                "address must use bech32m".to_string(),
            ));
        }

        let payload = Vec::<u8>::from_base32(&data)
            .map_err(|e| CryptoError::InvalidAddress(e.to_string()))?;
        if payload.len() != 1 + ADDRESS_HASH_LENGTH {
            return Err(CryptoError::InvalidLength {
                expected: 1 + ADDRESS_HASH_LENGTH,
                actual: payload.len(),
            });
        }

        let ty = AddressType::try_from(payload[0])?;
        let expected_hrp = match ty {
            AddressType::Validator => HRP_VALIDATOR,
            AddressType::BlsAccount | AddressType::Ed25519Account => HRP_ACCOUNT,
        };
        if hrp != expected_hrp {
            return Err(CryptoError::InvalidAddress(format!(
                "prefix '{hrp}' does not match address type"
            )));
        }

        let mut hash = [0u8; ADDRESS_HASH_LENGTH];
        hash.copy_from_slice(&payload[1..]);
        Ok(Self { ty, hash })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bls::BlsSecretKey;
    use crate::ed25519::Ed25519SecretKey;

    #[test]
    fn test_validator_address_roundtrip() {
        let pk = BlsSecretKey::generate(&mut rand::thread_rng()).public_key();
        let addr = Address::validator(&pk);
        let encoded = addr.to_string();

        assert!(encoded.starts_with(HRP_VALIDATOR));
        let decoded = Address::from_str(&encoded).unwrap();
        assert_eq!(addr, decoded);
        assert!(decoded.is_validator_address());
    }

    #[test]
    fn test_account_address_roundtrip() {
        let pk = BlsSecretKey::generate(&mut rand::thread_rng()).public_key();
        let addr = Address::bls_account(&pk);
        let encoded = addr.to_string();

        assert!(encoded.starts_with(HRP_ACCOUNT));
        let decoded = Address::from_str(&encoded).unwrap();
        assert_eq!(addr, decoded);
        assert!(decoded.is_account_address());
        assert_eq!(decoded.address_type(), AddressType::BlsAccount);
    }

    #[test]
    fn test_ed25519_account_address() {
        let pk = Ed25519SecretKey::generate(&mut rand::thread_rng()).public_key();
        let addr = Address::ed25519_account(&pk);
        let decoded = Address::from_str(&addr.to_string()).unwrap();
        assert_eq!(decoded.address_type(), AddressType::Ed25519Account);
    }

    #[test]
    fn test_same_key_distinct_roles() {
        let pk = BlsSecretKey::generate(&mut rand::thread_rng()).public_key();
        let validator = Address::validator(&pk).to_string();
        let account = Address::bls_account(&pk).to_string();
        assert_ne!(validator, account);
    }

    #[test]
    fn test_deterministic_encoding() {
        let pk = BlsSecretKey::generate(&mut rand::thread_rng()).public_key();
        assert_eq!(
            Address::validator(&pk).to_string(),
            Address::validator(&pk).to_string()
        );
    }

    #[test]
    fn test_invalid_strings_rejected() {
        assert!(Address::from_str("not-an-address").is_err());
        assert!(Address::from_str("hal1qqqqqq").is_err());

        // Valid bech32m but wrong payload length
        let junk = bech32::encode("hal", [1u8, 2, 3].to_base32(), Variant::Bech32m).unwrap();
        assert!(Address::from_str(&junk).is_err());
    }

    #[test]
    fn test_mismatched_prefix_rejected() {
        let pk = BlsSecretKey::generate(&mut rand::thread_rng()).public_key();
        let addr = Address::validator(&pk);

        // Re-encode the validator payload under the account prefix
        let mut payload = vec![addr.address_type() as u8];
        payload.extend_from_slice(&addr.hash);
        let forged = bech32::encode(HRP_ACCOUNT, payload.to_base32(), Variant::Bech32m).unwrap();
        assert!(Address::from_str(&forged).is_err());
    }
}
