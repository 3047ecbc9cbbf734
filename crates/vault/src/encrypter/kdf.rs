//! Argon2id key derivation for the encryption envelope
//!
//! Parameters are stored in plaintext next to the ciphertext so the envelope
//! is self-describing; the salt is fixed per envelope and the derived key is
//! never persisted.

use argon2::{Algorithm, Argon2, Params, Version};
use halcyon_crypto::SecretBytes;
use serde::{Deserialize, Serialize};

use super::error::{EncrypterError, EncrypterResult};

/// Length of the derived key in bytes (16 cipher + 16 checksum)
pub const KEY_LENGTH: usize = 32;

/// Salt length in bytes
pub const SALT_LENGTH: usize = 16;

/// Default Argon2id time cost
pub const DEFAULT_ITERATIONS: u32 = 3;

/// Default Argon2id memory cost in KiB (64 MiB)
pub const DEFAULT_MEMORY: u32 = 64 * 1024;

/// Default Argon2id lane count
pub const DEFAULT_PARALLELISM: u32 = 4;

/// Argon2id parameters persisted with the vault
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KdfParams {
    /// Time cost (number of passes)
    pub iterations: u32,
    /// Memory cost in KiB
    pub memory: u32,
    /// Number of lanes
    pub parallelism: u32,
    /// Salt as hex string
    pub salt: String,
}

impl KdfParams {
    /// Create parameters with a freshly generated salt
    pub fn random(iterations: u32, memory: u32, parallelism: u32) -> Self {
        Self {
            iterations,
            memory,
            parallelism,
            salt: hex::encode(generate_salt()),
        }
    }

    /// Validate the parameters
    pub fn validate(&self) -> EncrypterResult<()> {
        if self.iterations == 0 {
            return Err(EncrypterError::InvalidParams(
                "iterations must be positive".to_string(),
            ));
        }
        if self.parallelism == 0 {
            return Err(EncrypterError::InvalidParams(
                "parallelism must be positive".to_string(),
            ));
        }
        if self.memory < 8 * self.parallelism {
            return Err(EncrypterError::InvalidParams(
                "memory must be at least 8 KiB per lane".to_string(),
            ));
        }
        let salt = hex::decode(&self.salt)
            .map_err(|e| EncrypterError::InvalidParams(format!("invalid salt hex: {e}")))?;
        if salt.len() < 8 {
            return Err(EncrypterError::InvalidParams(
                "salt must be at least 8 bytes".to_string(),
            ));
        }
        Ok(())
    }

    /// Derive the envelope key from a password
    pub fn derive_key(&self, password: &str) -> EncrypterResult<SecretBytes> {
        self.validate()?;

        let salt = hex::decode(&self.salt)
            .map_err(|e| EncrypterError::InvalidParams(format!("invalid salt hex: {e}")))?;

        let params = Params::new(self.memory, self.iterations, self.parallelism, Some(KEY_LENGTH))
            .map_err(|e| EncrypterError::InvalidParams(e.to_string()))?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        let mut key = vec![0u8; KEY_LENGTH];
        argon2
            .hash_password_into(password.as_bytes(), &salt, &mut key)
            .map_err(|e| EncrypterError::InvalidParams(e.to_string()))?;

        Ok(SecretBytes::new(Box::new(key)))
    }
}

/// Generate a random salt
pub fn generate_salt() -> [u8; SALT_LENGTH] {
    use rand::RngCore;
    let mut salt = [0u8; SALT_LENGTH];
    rand::thread_rng().fill_bytes(&mut salt);
    salt
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    fn test_params() -> KdfParams {
        KdfParams {
            iterations: 1,
            memory: 8,
            parallelism: 1,
            salt: hex::encode([0xAA; SALT_LENGTH]),
        }
    }

    #[test]
    fn test_derive_key_deterministic() {
        let params = test_params();

        let k1 = params.derive_key("password").unwrap();
        let k2 = params.derive_key("password").unwrap();
        assert_eq!(k1.expose_secret(), k2.expose_secret());
        assert_eq!(k1.expose_secret().len(), KEY_LENGTH);
    }

    #[test]
    fn test_different_passwords_different_keys() {
        let params = test_params();

        let k1 = params.derive_key("password").unwrap();
        let k2 = params.derive_key("different").unwrap();
        assert_ne!(k1.expose_secret(), k2.expose_secret());
    }

    #[test]
    fn test_salt_affects_output() {
        let mut a = test_params();
        let mut b = test_params();
        a.salt = hex::encode([0x11; SALT_LENGTH]);
        b.salt = hex::encode([0x22; SALT_LENGTH]);

        let k1 = a.derive_key("pw").unwrap();
        let k2 = b.derive_key("pw").unwrap();
        assert_ne!(k1.expose_secret(), k2.expose_secret());
    }

    #[test]
    fn test_params_validation() {
        let mut params = test_params();
        assert!(params.validate().is_ok());

        params.iterations = 0;
        assert!(params.validate().is_err());

        params = test_params();
        params.parallelism = 0;
        assert!(params.validate().is_err());

        params = test_params();
        params.memory = 4;
        assert!(params.validate().is_err());

        params = test_params();
        params.salt = "not-hex".to_string();
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_random_params_fresh_salt() {
        let a = KdfParams::random(1, 8, 1);
        let b = KdfParams::random(1, 8, 1);
        assert_ne!(a.salt, b.salt);
    }

    #[test]
    fn test_params_serialization() {
        let params = test_params();
        let json = serde_json::to_string(&params).unwrap();
        let parsed: KdfParams = serde_json::from_str(&json).unwrap();
        assert_eq!(params, parsed);
    }
}
