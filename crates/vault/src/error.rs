//! Vault error types

use crate::encrypter::EncrypterError;
use halcyon_crypto::KeychainError;
use thiserror::Error;

/// Result type for vault operations
pub type VaultResult<T> = Result<T, VaultError>;

/// Errors returned by vault operations
///
/// Every variant maps to a stable string code via [`VaultError::code`] so an
/// RPC layer can transport error kinds without matching on display text.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VaultError {
    /// Mnemonic fails BIP-39 word list or checksum validation
    #[error("invalid mnemonic: {0}")]
    InvalidMnemonic(String),

    /// The password does not open the vault's encrypter
    #[error("invalid password")]
    InvalidPassword,

    /// The requested address is not in the directory
    #[error("address not found: {0}")]
    AddressNotFound(String),

    /// The address is already present in the directory
    #[error("address already exists")]
    AddressExists,

    /// The operation requires secret material a neutered vault lacks
    #[error("vault is neutered")]
    Neutered,

    /// Derivation is not defined for this key and index combination
    #[error("derived child key is unusable")]
    UnusableChild,

    /// Stored key material is malformed or inconsistent
    #[error("invalid key material: {0}")]
    InvalidKeyMaterial(String),
}

impl VaultError {
    /// Stable string code for RPC transport
    pub fn code(&self) -> &'static str {
        match self {
            VaultError::InvalidMnemonic(_) => "INVALID_MNEMONIC",
            VaultError::InvalidPassword => "INVALID_PASSWORD",
            VaultError::AddressNotFound(_) => "ADDRESS_NOT_FOUND",
            VaultError::AddressExists => "ADDRESS_EXISTS",
            VaultError::Neutered => "NEUTERED",
            VaultError::UnusableChild => "UNUSABLE_CHILD",
            VaultError::InvalidKeyMaterial(_) => "INVALID_KEY_MATERIAL",
        }
    }
}

impl From<EncrypterError> for VaultError {
    fn from(err: EncrypterError) -> Self {
        match err {
            EncrypterError::InvalidPassword => VaultError::InvalidPassword,
            EncrypterError::InvalidParams(msg) => VaultError::InvalidKeyMaterial(msg),
        }
    }
}

impl From<KeychainError> for VaultError {
    fn from(err: KeychainError) -> Self {
        match err {
            KeychainError::UnusableChild => VaultError::UnusableChild,
            KeychainError::InvalidExtendedKey(msg) => VaultError::InvalidKeyMaterial(msg),
        }
    }
}
