//! Derivation path parsing and formatting
//!
//! Canonical form is `m/purpose'/coin'/type'/index` with the leaf quote
//! present exactly when the index is hardened. Accessors return the raw
//! encoded component values, hardening bit included, so callers can
//! recover both the literal index and its hardening state.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// First hardened child index (2^31)
pub const HARDENED_KEY_START: u32 = halcyon_crypto::HARDENED_KEY_START;

/// Purpose for BLS12-381 validator and account branches
pub const PURPOSE_BLS: u32 = 12381;

/// Purpose for the BIP-44 style Ed25519 account branch
pub const PURPOSE_BIP44: u32 = 44;

/// Purpose for imported private keys
pub const PURPOSE_IMPORTED: u32 = 65535;

/// Path subtype for validator addresses
pub const ADDRESS_TYPE_VALIDATOR: u32 = 1;

/// Path subtype for BLS account addresses
pub const ADDRESS_TYPE_BLS_ACCOUNT: u32 = 2;

/// Path subtype for Ed25519 account addresses
pub const ADDRESS_TYPE_ED25519_ACCOUNT: u32 = 3;

/// Set the hardening bit on an index
pub const fn hardened(index: u32) -> u32 {
    index | HARDENED_KEY_START
}

/// Errors raised while parsing a derivation path
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PathError {
    /// Path does not start with `m/`
    #[error("path must start with 'm/'")]
    MissingPrefix,

    /// Path does not have exactly four components
    #[error("path must have exactly 4 components, got {0}")]
    InvalidDepth(usize),

    /// A component is not a valid index
    #[error("invalid path component: {0}")]
    InvalidComponent(String),

    /// Component that must be hardened is not
    #[error("path component '{0}' must be hardened")]
    NotHardened(String),

    /// Purpose outside {12381, 44, 65535}
    #[error("unsupported purpose: {0}")]
    UnsupportedPurpose(u32),

    /// Subtype outside {1, 2, 3}
    #[error("unsupported address type: {0}")]
    UnsupportedAddressType(u32),
}

/// A parsed four-level derivation path
///
/// All fields hold raw encoded values; the first three always carry the
/// hardening bit, the leaf may or may not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Path {
    purpose: u32,
    coin_type: u32,
    address_type: u32,
    address_index: u32,
}

impl Path {
    /// Build a path from raw component values
    pub fn new(purpose: u32, coin_type: u32, address_type: u32, address_index: u32) -> Self {
        Self {
            purpose,
            coin_type,
            address_type,
            address_index,
        }
    }

    /// Raw purpose component (hardening bit set)
    pub fn purpose(&self) -> u32 {
        self.purpose
    }

    /// Raw coin-type component (hardening bit set)
    pub fn coin_type(&self) -> u32 {
        self.coin_type
    }

    /// Raw subtype component (hardening bit set)
    pub fn address_type(&self) -> u32 {
        self.address_type
    }

    /// Raw leaf component; hardened iff the hardening bit is set
    pub fn address_index(&self) -> u32 {
        self.address_index
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "m/{}'/{}'/{}'/{}",
            self.purpose & !HARDENED_KEY_START,
            self.coin_type & !HARDENED_KEY_START,
            self.address_type & !HARDENED_KEY_START,
            self.address_index & !HARDENED_KEY_START,
        )?;
        if self.address_index >= HARDENED_KEY_START {
            write!(f, "'")?;
        }
        Ok(())
    }
}

impl FromStr for Path {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s.strip_prefix("m/").ok_or(PathError::MissingPrefix)?;

        let parts: Vec<&str> = rest.split('/').collect();
        if parts.len() != 4 {
            return Err(PathError::InvalidDepth(parts.len()));
        }

        let purpose = parse_component(parts[0], true)?;
        let coin_type = parse_component(parts[1], true)?;
        let address_type = parse_component(parts[2], true)?;
        let address_index = parse_component(parts[3], false)?;

        match purpose & !HARDENED_KEY_START {
            PURPOSE_BLS | PURPOSE_BIP44 | PURPOSE_IMPORTED => {}
            other => return Err(PathError::UnsupportedPurpose(other)),
        }
        match address_type & !HARDENED_KEY_START {
            ADDRESS_TYPE_VALIDATOR | ADDRESS_TYPE_BLS_ACCOUNT | ADDRESS_TYPE_ED25519_ACCOUNT => {}
            other => return Err(PathError::UnsupportedAddressType(other)),
        }

        Ok(Self {
            purpose,
            coin_type,
            address_type,
            address_index,
        })
    }
}

/// Parse one path component into its raw encoded value.
fn parse_component(part: &str, must_harden: bool) -> Result<u32, PathError> {
    let (literal, is_hardened) = match part.strip_suffix('\'') {
        Some(stripped) => (stripped, true),
        None => (part, false),
    };

    if must_harden && !is_hardened {
        return Err(PathError::NotHardened(part.to_string()));
    }

    // Reject empty, signs, leading zeros beyond plain digits and values that
    // would collide with the hardening bit.
    if literal.is_empty() || !literal.bytes().all(|b| b.is_ascii_digit()) {
        return Err(PathError::InvalidComponent(part.to_string()));
    }
    let value: u32 = literal
        .parse()
        .map_err(|_| PathError::InvalidComponent(part.to_string()))?;
    if value >= HARDENED_KEY_START {
        return Err(PathError::InvalidComponent(part.to_string()));
    }

    Ok(if is_hardened {
        hardened(value)
    } else {
        value
    })
}
