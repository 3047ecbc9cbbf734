//! BIP-39 mnemonic phrase support
//!
//! The mnemonic is the wallet backup: the vault turns it into the 64-byte
//! PBKDF2 seed that roots both HD derivation trees. The phrase itself lives
//! in a [`SecretString`] and never appears in Debug output.

use crate::secure::SecretString;
use bip39::Mnemonic as Bip39Mnemonic;
use rand::RngCore;
use secrecy::ExposeSecret;
use thiserror::Error;
use zeroize::{Zeroize, Zeroizing};

/// Result type for mnemonic operations
pub type MnemonicResult<T> = Result<T, MnemonicError>;

/// Errors that can occur during mnemonic operations
#[derive(Debug, Error)]
pub enum MnemonicError {
    /// Phrase contains an unknown word or fails its checksum
    #[error("invalid mnemonic phrase: {0}")]
    InvalidPhrase(String),

    /// Requested phrase length is not a BIP-39 length
    #[error("unsupported word count {0}, expected 12, 15, 18, 21 or 24")]
    UnsupportedWordCount(usize),
}

impl From<bip39::Error> for MnemonicError {
    fn from(err: bip39::Error) -> Self {
        MnemonicError::InvalidPhrase(err.to_string())
    }
}

/// Phrase lengths accepted by BIP-39
const WORD_COUNTS: [usize; 5] = [12, 15, 18, 21, 24];

/// BIP-39 mnemonic phrase wrapper
///
/// The same phrase always yields the same seed, so recovering a wallet is
/// re-running the derivation in `create_from_mnemonic`.
pub struct Mnemonic {
    inner: Bip39Mnemonic,
    phrase: SecretString,
}

impl Mnemonic {
    /// Generate a new 24-word (256-bit entropy) phrase
    pub fn generate() -> MnemonicResult<Self> {
        Self::generate_with_word_count(24)
    }

    /// Generate a phrase with the given word count
    ///
    /// Every 3 words encode 32 bits of entropy, so `word_count / 3 * 4`
    /// bytes are drawn from the OS generator.
    pub fn generate_with_word_count(word_count: usize) -> MnemonicResult<Self> {
        if !WORD_COUNTS.contains(&word_count) {
            return Err(MnemonicError::UnsupportedWordCount(word_count));
        }
        let entropy_len = word_count / 3 * 4;

        let mut entropy = Zeroizing::new([0u8; 32]);
        rand::thread_rng().fill_bytes(&mut entropy[..entropy_len]);

        let inner = Bip39Mnemonic::from_entropy(&entropy[..entropy_len])
            .map_err(|e| MnemonicError::InvalidPhrase(e.to_string()))?;
        Ok(Self::from_inner(inner))
    }

    /// Import an existing phrase
    ///
    /// Word casing and stray whitespace are forgiven; unknown words and bad
    /// checksums are not.
    pub fn from_phrase(phrase: &str) -> MnemonicResult<Self> {
        let mut normalized = phrase
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();
        let parsed = Bip39Mnemonic::parse_normalized(&normalized);
        normalized.zeroize();

        Ok(Self::from_inner(parsed?))
    }

    fn from_inner(inner: Bip39Mnemonic) -> Self {
        let phrase = inner.to_string();
        Self {
            inner,
            phrase: phrase.into(),
        }
    }

    /// The phrase itself; handle it like any other secret
    pub fn phrase(&self) -> &str {
        self.phrase.expose_secret()
    }

    /// Number of words in the phrase
    pub fn word_count(&self) -> usize {
        self.inner.word_count()
    }

    /// The 64-byte seed that roots both HD derivation trees
    ///
    /// Derived via PBKDF2 per BIP-39; the optional passphrase yields a
    /// completely different wallet.
    pub fn to_seed(&self, passphrase: Option<&str>) -> Zeroizing<[u8; 64]> {
        Zeroizing::new(self.inner.to_seed(passphrase.unwrap_or("")))
    }

    /// Check a phrase without keeping it around
    pub fn validate(phrase: &str) -> MnemonicResult<()> {
        Self::from_phrase(phrase).map(|_| ())
    }
}

impl std::fmt::Debug for Mnemonic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Mnemonic({} words, [REDACTED])", self.word_count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hdkeychain::{bls, ed25519};

    // BIP-39 reference vector phrase (entropy 0x7f repeated; NOT for real funds)
    const KNOWN_PHRASE: &str =
        "legal winner thank year wave sausage worth useful legal winner thank yellow";

    #[test]
    fn test_seed_roots_both_master_keys() {
        let mnemonic = Mnemonic::generate().unwrap();
        let seed = mnemonic.to_seed(None);

        let bls_master = bls::ExtendedPrivateKey::new_master(seed.as_slice()).unwrap();
        let ed25519_master = ed25519::ExtendedPrivateKey::new_master(seed.as_slice()).unwrap();

        // One seed, two domain-separated masters
        assert_ne!(
            bls_master.secret_key().to_bytes(),
            ed25519_master.secret_key().to_bytes()
        );
    }

    #[test]
    fn test_recovered_phrase_reproduces_master_keys() {
        let original = Mnemonic::generate_with_word_count(12).unwrap();
        let recovered = Mnemonic::from_phrase(original.phrase()).unwrap();

        assert_eq!(*original.to_seed(None), *recovered.to_seed(None));

        let master_a =
            bls::ExtendedPrivateKey::new_master(original.to_seed(None).as_slice()).unwrap();
        let master_b =
            bls::ExtendedPrivateKey::new_master(recovered.to_seed(None).as_slice()).unwrap();
        assert_eq!(
            master_a.secret_key().to_bytes(),
            master_b.secret_key().to_bytes()
        );
    }

    #[test]
    fn test_messy_input_reaches_same_wallet() {
        let clean = Mnemonic::from_phrase(KNOWN_PHRASE).unwrap();
        let messy = format!("  {}  ", KNOWN_PHRASE.to_uppercase().replace(' ', "   "));
        let imported = Mnemonic::from_phrase(&messy).unwrap();

        assert_eq!(imported.phrase(), KNOWN_PHRASE);
        assert_eq!(*imported.to_seed(None), *clean.to_seed(None));
    }

    #[test]
    fn test_bip39_passphrase_changes_wallet() {
        let mnemonic = Mnemonic::from_phrase(KNOWN_PHRASE).unwrap();

        let plain = mnemonic.to_seed(None);
        let protected = mnemonic.to_seed(Some("extra-passphrase"));
        assert_ne!(*plain, *protected);

        let master_a = ed25519::ExtendedPrivateKey::new_master(plain.as_slice()).unwrap();
        let master_b = ed25519::ExtendedPrivateKey::new_master(protected.as_slice()).unwrap();
        assert_ne!(
            master_a.secret_key().to_bytes(),
            master_b.secret_key().to_bytes()
        );
    }

    #[test]
    fn test_generated_word_counts() {
        for count in WORD_COUNTS {
            let mnemonic = Mnemonic::generate_with_word_count(count).unwrap();
            assert_eq!(mnemonic.word_count(), count);
            assert_eq!(mnemonic.phrase().split_whitespace().count(), count);
        }
    }

    #[test]
    fn test_unsupported_word_count() {
        for count in [0, 3, 13, 23, 25] {
            assert!(matches!(
                Mnemonic::generate_with_word_count(count),
                Err(MnemonicError::UnsupportedWordCount(c)) if c == count
            ));
        }
    }

    #[test]
    fn test_bad_phrases_rejected() {
        // Unknown word
        assert!(Mnemonic::from_phrase(
            "legal winner thank year wave sausage worth useful legal winner thank zzz"
        )
        .is_err());

        // Valid words, broken checksum
        assert!(Mnemonic::from_phrase(
            "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon"
        )
        .is_err());

        // Wrong length
        assert!(Mnemonic::from_phrase("legal winner thank").is_err());
    }

    #[test]
    fn test_validate() {
        assert!(Mnemonic::validate(KNOWN_PHRASE).is_ok());
        assert!(Mnemonic::validate("definitely not a mnemonic").is_err());
    }

    #[test]
    fn test_debug_output_redacted() {
        let mnemonic = Mnemonic::from_phrase(KNOWN_PHRASE).unwrap();
        let debug = format!("{:?}", mnemonic);

        assert!(debug.contains("[REDACTED]"));
        assert!(debug.contains("12 words"));
        assert!(!debug.contains("legal"));
        assert!(!debug.contains("yellow"));
    }
}
