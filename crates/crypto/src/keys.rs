//! Curve-tagged key types
//!
//! The wallet handles two key families behind one surface. Rather than a
//! trait object, keys are tagged enums: the vault branches on the tag where
//! the families differ (hardening rules, address roles) and dispatches
//! uniformly everywhere else.

use crate::address::Address;
use crate::bls::{BlsPublicKey, BlsSecretKey, BlsSignature, DST_SIGNATURE};
use crate::ed25519::{Ed25519PublicKey, Ed25519SecretKey, Ed25519Signature};
use crate::error::CryptoError;

/// A secret key of either family
#[derive(Clone, Debug)]
pub enum PrivateKey {
    /// BLS12-381 secret key
    Bls(BlsSecretKey),
    /// Ed25519 secret key
    Ed25519(Ed25519SecretKey),
}

impl PrivateKey {
    /// The corresponding public key
    pub fn public_key(&self) -> PublicKey {
        match self {
            PrivateKey::Bls(sk) => PublicKey::Bls(sk.public_key()),
            PrivateKey::Ed25519(sk) => PublicKey::Ed25519(sk.public_key()),
        }
    }

    /// Sign a message with the family's signature scheme
    pub fn sign(&self, msg: &[u8]) -> Signature {
        match self {
            PrivateKey::Bls(sk) => Signature::Bls(sk.sign(msg, DST_SIGNATURE)),
            PrivateKey::Ed25519(sk) => Signature::Ed25519(sk.sign(msg)),
        }
    }

    /// Raw key bytes (32 bytes for both families)
    pub fn to_bytes(&self) -> [u8; 32] {
        match self {
            PrivateKey::Bls(sk) => sk.to_bytes(),
            PrivateKey::Ed25519(sk) => sk.to_bytes(),
        }
    }
}

/// A public key of either family
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PublicKey {
    /// BLS12-381 public key (48 bytes)
    Bls(BlsPublicKey),
    /// Ed25519 public key (32 bytes)
    Ed25519(Ed25519PublicKey),
}

impl PublicKey {
    /// Parse from canonical hex; the family is recovered from the length
    pub fn from_hex(s: &str) -> Result<Self, CryptoError> {
        let bytes = hex::decode(s).map_err(|_| CryptoError::InvalidPublicKey)?;
        match bytes.len() {
            48 => {
                let arr: [u8; 48] = bytes
                    .as_slice()
                    .try_into()
                    .map_err(|_| CryptoError::InvalidPublicKey)?;
                Ok(PublicKey::Bls(BlsPublicKey::from_bytes(&arr)?))
            }
            32 => {
                let arr: [u8; 32] = bytes
                    .as_slice()
                    .try_into()
                    .map_err(|_| CryptoError::InvalidPublicKey)?;
                Ok(PublicKey::Ed25519(Ed25519PublicKey::from_bytes(&arr)?))
            }
            other => Err(CryptoError::InvalidLength {
                expected: 48,
                actual: other,
            }),
        }
    }

    /// Canonical hex form
    pub fn to_hex(&self) -> String {
        match self {
            PublicKey::Bls(pk) => hex::encode(pk.to_bytes()),
            PublicKey::Ed25519(pk) => hex::encode(pk.to_bytes()),
        }
    }

    /// Verify a signature of the matching family
    ///
    /// A signature of the other family never verifies.
    pub fn verify(&self, msg: &[u8], sig: &Signature) -> bool {
        match (self, sig) {
            (PublicKey::Bls(pk), Signature::Bls(sig)) => pk.verify(msg, DST_SIGNATURE, sig),
            (PublicKey::Ed25519(pk), Signature::Ed25519(sig)) => pk.verify(msg, sig),
            _ => false,
        }
    }

    /// The account address for this key
    pub fn account_address(&self) -> Address {
        match self {
            PublicKey::Bls(pk) => Address::bls_account(pk),
            PublicKey::Ed25519(pk) => Address::ed25519_account(pk),
        }
    }

    /// The validator address; only BLS keys can act as validators
    pub fn validator_address(&self) -> Option<Address> {
        match self {
            PublicKey::Bls(pk) => Some(Address::validator(pk)),
            PublicKey::Ed25519(_) => None,
        }
    }
}

/// A signature of either family
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Signature {
    /// BLS12-381 signature (96 bytes)
    Bls(BlsSignature),
    /// Ed25519 signature (64 bytes)
    Ed25519(Ed25519Signature),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bls_dispatch() {
        let sk = PrivateKey::Bls(BlsSecretKey::generate(&mut rand::thread_rng()));
        let pk = sk.public_key();

        let msg = b"tagged dispatch";
        let sig = sk.sign(msg);
        assert!(pk.verify(msg, &sig));
        assert!(!pk.verify(b"other", &sig));
    }

    #[test]
    fn test_ed25519_dispatch() {
        let sk = PrivateKey::Ed25519(Ed25519SecretKey::generate(&mut rand::thread_rng()));
        let pk = sk.public_key();

        let msg = b"tagged dispatch";
        let sig = sk.sign(msg);
        assert!(pk.verify(msg, &sig));
    }

    #[test]
    fn test_cross_family_never_verifies() {
        let bls = PrivateKey::Bls(BlsSecretKey::generate(&mut rand::thread_rng()));
        let ed = PrivateKey::Ed25519(Ed25519SecretKey::generate(&mut rand::thread_rng()));

        let msg = b"cross family";
        assert!(!bls.public_key().verify(msg, &ed.sign(msg)));
        assert!(!ed.public_key().verify(msg, &bls.sign(msg)));
    }

    #[test]
    fn test_hex_roundtrip() {
        let bls = PrivateKey::Bls(BlsSecretKey::generate(&mut rand::thread_rng()));
        let ed = PrivateKey::Ed25519(Ed25519SecretKey::generate(&mut rand::thread_rng()));

        for key in [bls.public_key(), ed.public_key()] {
            let restored = PublicKey::from_hex(&key.to_hex()).unwrap();
            assert_eq!(restored, key);
        }
    }

    #[test]
    fn test_from_hex_rejects_bad_input() {
        assert!(PublicKey::from_hex("zz").is_err());
        assert!(PublicKey::from_hex(&hex::encode([0u8; 16])).is_err());
    }

    #[test]
    fn test_validator_address_bls_only() {
        let bls = PrivateKey::Bls(BlsSecretKey::generate(&mut rand::thread_rng()));
        let ed = PrivateKey::Ed25519(Ed25519SecretKey::generate(&mut rand::thread_rng()));

        assert!(bls.public_key().validator_address().is_some());
        assert!(ed.public_key().validator_address().is_none());
    }
}
