//! Hierarchical-deterministic extended keys
//!
//! BIP-32 style derivation for the two key families the wallet supports:
//!
//! - [`bls`]: BLS12-381 extended keys. Child keys are additive tweaks of the
//!   parent, and the tweak is computed from the parent *public* key, so an
//!   extended public key can derive children at any index, hardened or not.
//! - [`ed25519`]: SLIP-0010 style Ed25519 extended keys. Only hardened
//!   private derivation is defined; everything else fails with
//!   [`KeychainError::UnusableChild`].
//!
//! Extended keys serialize to bech32m strings (`xsecret1…` / `xpublic1…`)
//! that callers treat as opaque containers.

use hmac::{Hmac, Mac};
use sha2::Sha512;
use thiserror::Error;
use zeroize::Zeroizing;

pub mod bls;
pub mod ed25519;

/// First hardened child index (2^31)
pub const HARDENED_KEY_START: u32 = 0x8000_0000;

/// Human-readable prefix for extended private keys
pub const HRP_XPRV: &str = "xsecret";

/// Human-readable prefix for extended public keys
pub const HRP_XPUB: &str = "xpublic";

/// Key-family tag embedded in the serialized form
pub(crate) const KEY_FAMILY_BLS: u8 = 1;
pub(crate) const KEY_FAMILY_ED25519: u8 = 2;

/// Errors raised by extended-key derivation and decoding
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KeychainError {
    /// Derivation is not defined for this key and index combination
    #[error("derived child key is unusable")]
    UnusableChild,

    /// Malformed or out-of-domain extended key material
    #[error("invalid extended key: {0}")]
    InvalidExtendedKey(String),
}

type HmacSha512 = Hmac<Sha512>;

/// HMAC-SHA512 over the concatenation of `parts`, keyed by `key`.
///
/// The 64-byte output is split by callers into a 32-byte key tweak and a
/// 32-byte chain code; the buffer is zeroized on drop.
pub(crate) fn hmac_sha512(key: &[u8], parts: &[&[u8]]) -> Zeroizing<[u8; 64]> {
    let mut mac =
        HmacSha512::new_from_slice(key).expect("hmac accepts keys of any length");
    for part in parts {
        mac.update(part);
    }
    Zeroizing::new(mac.finalize().into_bytes().into())
}

/// Serialize an extended key payload as bech32m.
pub(crate) fn encode_extended_key(
    hrp: &str,
    family: u8,
    depth: u8,
    chain_code: &[u8; 32],
    key: &[u8],
) -> Result<String, std::fmt::Error> {
    use bech32::ToBase32;

    let mut payload = Vec::with_capacity(2 + 32 + key.len());
    payload.push(family);
    payload.push(depth);
    payload.extend_from_slice(chain_code);
    payload.extend_from_slice(key);
    bech32::encode(hrp, payload.to_base32(), bech32::Variant::Bech32m)
        .map_err(|_| std::fmt::Error)
}

/// Parse an extended key string, checking prefix, family tag and key length.
pub(crate) fn decode_extended_key(
    s: &str,
    expected_hrp: &str,
    expected_family: u8,
    key_len: usize,
) -> Result<(u8, [u8; 32], Vec<u8>), KeychainError> {
    use bech32::FromBase32;

    let (hrp, data, variant) = bech32::decode(s)
        .map_err(|e| KeychainError::InvalidExtendedKey(e.to_string()))?;
    if variant != bech32::Variant::Bech32m {
        return Err(KeychainError::InvalidExtendedKey(
            "extended key must use bech32m".to_string(),
        ));
    }
    if hrp != expected_hrp {
        return Err(KeychainError::InvalidExtendedKey(format!(
            "unexpected prefix '{hrp}'"
        )));
    }

    let payload = Vec::<u8>::from_base32(&data)
        .map_err(|e| KeychainError::InvalidExtendedKey(e.to_string()))?;
    if payload.len() != 2 + 32 + key_len {
        return Err(KeychainError::InvalidExtendedKey(format!(
            "payload length {} does not match key family",
            payload.len()
        )));
    }
    if payload[0] != expected_family {
        return Err(KeychainError::InvalidExtendedKey(format!(
            "key family tag {} does not match",
            payload[0]
        )));
    }

    let depth = payload[1];
    let mut chain_code = [0u8; 32];
    chain_code.copy_from_slice(&payload[2..34]);
    Ok((depth, chain_code, payload[34..].to_vec()))
}
