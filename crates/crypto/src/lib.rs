//! Cryptographic primitives for the Halcyon wallet
//!
//! This crate provides:
//! - BLS12-381 keys and signatures (validator and account roles)
//! - Ed25519 keys and signatures (account role)
//! - Hierarchical-deterministic extended keys for both families
//! - BIP-39 mnemonic generation and recovery
//! - Bech32m chain addresses

pub mod address;
pub mod bls;
pub mod ed25519;
pub mod error;
pub mod hdkeychain;
pub mod keys;
pub mod mnemonic;
pub mod secure;

// Address exports
pub use address::{Address, AddressType, HRP_ACCOUNT, HRP_VALIDATOR};

// BLS12-381 exports
pub use bls::{BlsPublicKey, BlsSecretKey, BlsSignature, DST_SIGNATURE};

// Ed25519 exports
pub use ed25519::{Ed25519PublicKey, Ed25519SecretKey, Ed25519Signature};

// Curve-tagged key exports
pub use keys::{PrivateKey, PublicKey, Signature};

// HD keychain exports
pub use hdkeychain::{KeychainError, HARDENED_KEY_START};

// Mnemonic exports
pub use mnemonic::{Mnemonic, MnemonicError};

// Secret container exports
pub use secure::{SecretBytes, SecretString};

// Error exports
pub use error::CryptoError;
