//! Hierarchical-deterministic key vault for the Halcyon wallet
//!
//! This crate provides:
//! - [`Vault`]: HD key management over two curve families (BLS12-381 and
//!   Ed25519), an address directory, imported keys, password rotation and
//!   neutering
//! - [`Encrypter`]: the Argon2id + AES-128-CTR envelope protecting every
//!   secret at rest
//! - [`addresspath`]: parsing and formatting of `m/p'/c'/t'/i` derivation
//!   paths
//!
//! # Example
//!
//! ```rust
//! use halcyon_vault::Vault;
//! use halcyon_crypto::Mnemonic;
//!
//! let mnemonic = Mnemonic::generate().unwrap();
//! let mut vault = Vault::create_from_mnemonic(mnemonic.phrase(), 21888).unwrap();
//!
//! let info = vault.new_validator_address("my validator").unwrap();
//! assert!(info.path.starts_with("m/12381'/21888'/1'"));
//! ```

pub mod addresspath;
pub mod encrypter;
pub mod error;
pub mod vault;

// Vault exports
pub use vault::{AddressInfo, PurposeBranch, Purposes, Vault};

// Encrypter exports
pub use encrypter::{Encrypter, EncrypterError, EncrypterOptions};

// Path exports
pub use addresspath::{Path, PathError};

// Error exports
pub use error::{VaultError, VaultResult};
