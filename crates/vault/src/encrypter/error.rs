//! Encrypter error types

use thiserror::Error;

/// Errors that can occur inside the encryption envelope
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncrypterError {
    /// The password does not open this envelope
    ///
    /// Covers both a wrong password and tampered ciphertext; callers cannot
    /// tell the two apart.
    #[error("invalid password")]
    InvalidPassword,

    /// Invalid KDF or cipher parameters
    #[error("invalid encrypter parameters: {0}")]
    InvalidParams(String),
}

/// Result type for encrypter operations
pub type EncrypterResult<T> = Result<T, EncrypterError>;
