//! Secret wrapper aliases for consistent secret handling
//!
//! Thin layer over the `secrecy` crate. Both aliases zeroize on drop and
//! expose their contents only via `expose_secret()`.

use secrecy::SecretBox;

/// A secret byte buffer that is zeroized on drop.
///
/// Used for decrypted key material, derived KDF keys and similar transient
/// binary secrets.
pub type SecretBytes = SecretBox<Vec<u8>>;

/// A secret string that is zeroized on drop.
///
/// Used for passphrases and mnemonic phrases.
pub type SecretString = secrecy::SecretString;

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_secret_bytes() {
        let secret = SecretBytes::new(Box::new(vec![1, 2, 3, 4, 5]));
        assert_eq!(secret.expose_secret(), &vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_secret_string() {
        let secret: SecretString = "my-passphrase".to_string().into();
        let exposed: &str = secret.expose_secret();
        assert_eq!(exposed, "my-passphrase");
    }
}
