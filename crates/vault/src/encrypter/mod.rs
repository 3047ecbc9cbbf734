//! Password-based encryption envelope
//!
//! Secrets at rest are wrapped in a self-describing envelope: Argon2id turns
//! the password into 32 bytes, the first half keys AES-128-CTR, the second
//! half keys a SHA-256 checksum over the ciphertext. A blob is
//! `hex(iv || ciphertext || checksum)`; KDF parameters and the method string
//! are stored next to the blobs in plaintext.
//!
//! The empty password selects the *no-op* envelope: blobs are plain hex and
//! only the empty password opens them. This is how an unencrypted vault and
//! an encrypted one share one storage shape.
//!
//! Any checksum mismatch is reported as [`EncrypterError::InvalidPassword`];
//! a wrong password and tampered ciphertext are indistinguishable by design.

mod cipher;
mod error;
mod kdf;

use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use halcyon_crypto::SecretBytes;

pub use self::error::{EncrypterError, EncrypterResult};
pub use self::kdf::{KdfParams, DEFAULT_ITERATIONS, DEFAULT_MEMORY, DEFAULT_PARALLELISM};

use self::cipher::{apply_keystream, generate_iv, CIPHER_KEY_LENGTH, IV_LENGTH};
use self::kdf::KEY_LENGTH;

/// Method identifier for the Argon2id/AES-128-CTR/SHA-256 envelope
pub const ENCRYPTION_METHOD: &str = "argon2id-aes-128-ctr-sha256";

/// Checksum length in bytes
const CHECKSUM_LENGTH: usize = 32;

/// Tunable KDF cost settings
///
/// Defaults are production-grade; tests lower them to keep the Argon2 work
/// negligible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncrypterOptions {
    iterations: u32,
    memory: u32,
    parallelism: u32,
}

impl Default for EncrypterOptions {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
            memory: DEFAULT_MEMORY,
            parallelism: DEFAULT_PARALLELISM,
        }
    }
}

impl EncrypterOptions {
    /// Set the Argon2id time cost
    pub fn with_iterations(mut self, iterations: u32) -> Self {
        self.iterations = iterations;
        self
    }

    /// Set the Argon2id memory cost in KiB
    pub fn with_memory(mut self, memory: u32) -> Self {
        self.memory = memory;
        self
    }

    /// Set the Argon2id lane count
    pub fn with_parallelism(mut self, parallelism: u32) -> Self {
        self.parallelism = parallelism;
        self
    }
}

/// The encryption envelope configuration stored inside a vault
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Encrypter {
    /// Envelope method identifier; empty for the no-op envelope
    pub method: String,
    /// KDF parameters; absent for the no-op envelope
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<KdfParams>,
}

impl Encrypter {
    /// The no-op envelope used by unencrypted vaults
    pub fn no_op() -> Self {
        Self {
            method: String::new(),
            params: None,
        }
    }

    /// A fresh Argon2id envelope with a new random salt
    pub fn new(options: &EncrypterOptions) -> Self {
        Self {
            method: ENCRYPTION_METHOD.to_string(),
            params: Some(KdfParams::random(
                options.iterations,
                options.memory,
                options.parallelism,
            )),
        }
    }

    /// True when this envelope actually encrypts
    pub fn is_encrypted(&self) -> bool {
        !self.method.is_empty()
    }

    /// Encrypt a secret under the password
    pub fn encrypt(&self, password: &str, plaintext: &[u8]) -> EncrypterResult<String> {
        if !self.is_encrypted() {
            if !password.is_empty() {
                return Err(EncrypterError::InvalidPassword);
            }
            return Ok(hex::encode(plaintext));
        }

        if password.is_empty() {
            return Err(EncrypterError::InvalidPassword);
        }
        if self.method != ENCRYPTION_METHOD {
            return Err(EncrypterError::InvalidParams(format!(
                "unsupported method '{}'",
                self.method
            )));
        }
        let params = self
            .params
            .as_ref()
            .ok_or_else(|| EncrypterError::InvalidParams("missing KDF parameters".to_string()))?;

        let derived_key = params.derive_key(password)?;
        let (cipher_key, checksum_key) = split_derived_key(derived_key.expose_secret())?;

        let iv = generate_iv();
        let mut body = plaintext.to_vec();
        apply_keystream(cipher_key, &iv, &mut body);
        let checksum = compute_checksum(checksum_key, &body);

        let mut blob = Vec::with_capacity(IV_LENGTH + body.len() + CHECKSUM_LENGTH);
        blob.extend_from_slice(&iv);
        blob.extend_from_slice(&body);
        blob.extend_from_slice(&checksum);
        Ok(hex::encode(blob))
    }

    /// Decrypt a blob with the password
    pub fn decrypt(&self, password: &str, blob: &str) -> EncrypterResult<SecretBytes> {
        if !self.is_encrypted() {
            if !password.is_empty() {
                return Err(EncrypterError::InvalidPassword);
            }
            let plaintext = hex::decode(blob).map_err(|_| EncrypterError::InvalidPassword)?;
            return Ok(SecretBytes::new(Box::new(plaintext)));
        }

        if password.is_empty() {
            return Err(EncrypterError::InvalidPassword);
        }
        let params = self
            .params
            .as_ref()
            .ok_or_else(|| EncrypterError::InvalidParams("missing KDF parameters".to_string()))?;

        let bytes = hex::decode(blob).map_err(|_| EncrypterError::InvalidPassword)?;
        if bytes.len() < IV_LENGTH + CHECKSUM_LENGTH {
            return Err(EncrypterError::InvalidPassword);
        }
        let (iv, rest) = bytes.split_at(IV_LENGTH);
        let (ciphertext, checksum) = rest.split_at(rest.len() - CHECKSUM_LENGTH);
        let iv: &[u8; IV_LENGTH] = iv
            .try_into()
            .map_err(|_| EncrypterError::InvalidPassword)?;

        let derived_key = params.derive_key(password)?;
        let (cipher_key, checksum_key) = split_derived_key(derived_key.expose_secret())?;

        let expected = compute_checksum(checksum_key, ciphertext);
        if !constant_time_eq(&expected, checksum) {
            return Err(EncrypterError::InvalidPassword);
        }

        let mut plaintext = ciphertext.to_vec();
        apply_keystream(cipher_key, iv, &mut plaintext);
        Ok(SecretBytes::new(Box::new(plaintext)))
    }
}

/// Split the derived key into its cipher and checksum halves
fn split_derived_key(
    derived_key: &[u8],
) -> EncrypterResult<(&[u8; CIPHER_KEY_LENGTH], &[u8; CIPHER_KEY_LENGTH])> {
    if derived_key.len() != KEY_LENGTH {
        return Err(EncrypterError::InvalidParams(format!(
            "derived key must be {KEY_LENGTH} bytes, got {}",
            derived_key.len()
        )));
    }
    let (cipher_key, checksum_key) = derived_key.split_at(CIPHER_KEY_LENGTH);
    let cipher_key = cipher_key
        .try_into()
        .map_err(|_| EncrypterError::InvalidParams("bad derived key split".to_string()))?;
    let checksum_key = checksum_key
        .try_into()
        .map_err(|_| EncrypterError::InvalidParams("bad derived key split".to_string()))?;
    Ok((cipher_key, checksum_key))
}

/// Checksum over `derived_key[16..32] || ciphertext`
///
/// Binds the ciphertext to the password without revealing cipher key bytes.
fn compute_checksum(
    checksum_key: &[u8; CIPHER_KEY_LENGTH],
    ciphertext: &[u8],
) -> [u8; CHECKSUM_LENGTH] {
    let mut hasher = Sha256::new();
    hasher.update(checksum_key);
    hasher.update(ciphertext);
    hasher.finalize().into()
}

/// Constant-time comparison to prevent timing attacks
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_encrypter() -> Encrypter {
        Encrypter::new(
            &EncrypterOptions::default()
                .with_iterations(1)
                .with_memory(8)
                .with_parallelism(1),
        )
    }

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let encrypter = test_encrypter();
        let secret = b"the master secret";

        let blob = encrypter.encrypt("passphrase", secret).unwrap();
        let decrypted = encrypter.decrypt("passphrase", &blob).unwrap();
        assert_eq!(decrypted.expose_secret(), secret);
    }

    #[test]
    fn test_wrong_password_fails() {
        let encrypter = test_encrypter();
        let blob = encrypter.encrypt("correct", b"secret").unwrap();

        assert_eq!(
            encrypter.decrypt("wrong", &blob).unwrap_err(),
            EncrypterError::InvalidPassword
        );
    }

    #[test]
    fn test_empty_password_rejected_when_encrypted() {
        let encrypter = test_encrypter();
        assert_eq!(
            encrypter.encrypt("", b"secret").unwrap_err(),
            EncrypterError::InvalidPassword
        );

        let blob = encrypter.encrypt("pw", b"secret").unwrap();
        assert_eq!(
            encrypter.decrypt("", &blob).unwrap_err(),
            EncrypterError::InvalidPassword
        );
    }

    #[test]
    fn test_tampered_ciphertext_reports_invalid_password() {
        let encrypter = test_encrypter();
        let blob = encrypter.encrypt("pw", b"secret").unwrap();

        let mut bytes = hex::decode(&blob).unwrap();
        bytes[IV_LENGTH] ^= 0x01;
        let tampered = hex::encode(bytes);

        assert_eq!(
            encrypter.decrypt("pw", &tampered).unwrap_err(),
            EncrypterError::InvalidPassword
        );
    }

    #[test]
    fn test_truncated_blob_reports_invalid_password() {
        let encrypter = test_encrypter();
        assert_eq!(
            encrypter.decrypt("pw", "0011").unwrap_err(),
            EncrypterError::InvalidPassword
        );
        assert_eq!(
            encrypter.decrypt("pw", "not-hex").unwrap_err(),
            EncrypterError::InvalidPassword
        );
    }

    #[test]
    fn test_fresh_iv_per_encryption() {
        let encrypter = test_encrypter();
        let a = encrypter.encrypt("pw", b"same plaintext").unwrap();
        let b = encrypter.encrypt("pw", b"same plaintext").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_no_op_mode() {
        let encrypter = Encrypter::no_op();
        assert!(!encrypter.is_encrypted());

        let blob = encrypter.encrypt("", b"plain secret").unwrap();
        assert_eq!(blob, hex::encode(b"plain secret"));

        let decrypted = encrypter.decrypt("", &blob).unwrap();
        assert_eq!(decrypted.expose_secret(), b"plain secret");
    }

    #[test]
    fn test_no_op_rejects_non_empty_password() {
        let encrypter = Encrypter::no_op();
        assert_eq!(
            encrypter.encrypt("pw", b"secret").unwrap_err(),
            EncrypterError::InvalidPassword
        );
        assert_eq!(
            encrypter.decrypt("pw", "00ff").unwrap_err(),
            EncrypterError::InvalidPassword
        );
    }

    #[test]
    fn test_is_encrypted() {
        assert!(test_encrypter().is_encrypted());
        assert!(!Encrypter::no_op().is_encrypted());
    }

    #[test]
    fn test_serialization_roundtrip() {
        let encrypter = test_encrypter();
        let json = serde_json::to_string(&encrypter).unwrap();
        let parsed: Encrypter = serde_json::from_str(&json).unwrap();
        assert_eq!(encrypter, parsed);

        // A parsed envelope still opens blobs written before serialization
        let blob = encrypter.encrypt("pw", b"secret").unwrap();
        assert_eq!(parsed.decrypt("pw", &blob).unwrap().expose_secret(), b"secret");
    }

    #[test]
    fn test_no_op_serialization_omits_params() {
        let json = serde_json::to_string(&Encrypter::no_op()).unwrap();
        assert!(!json.contains("params"));
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(&[1, 2, 3], &[1, 2, 3]));
        assert!(!constant_time_eq(&[1, 2, 3], &[1, 2, 4]));
        assert!(!constant_time_eq(&[1, 2, 3], &[1, 2]));
    }
}
