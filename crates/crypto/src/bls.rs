//! BLS12-381 cryptographic operations
//!
//! This module wraps the `blst` min_pk variant (48-byte public keys,
//! 96-byte signatures) and adds the additive key tweaks the HD keychain
//! needs: child keys are `parent + tweak` on the scalar field and on G1
//! respectively, so derivation commutes with `public_key()`.

use crate::error::CryptoError;
use blst::min_pk::{
    AggregatePublicKey as BlstAggPubKey, PublicKey as BlstPubKey, SecretKey as BlstSecKey,
    Signature as BlstSig,
};
use blst::{
    blst_bendian_from_scalar, blst_scalar, blst_scalar_from_bendian, blst_sk_add_n_check,
    BLST_ERROR,
};
use rand::{CryptoRng, RngCore};
use zeroize::Zeroize;

/// Domain separation tag for wallet signatures
pub const DST_SIGNATURE: &[u8] = b"HALCYON_SIG_V1";

/// BLS12-381 secret key (32 bytes)
#[derive(Clone)]
pub struct BlsSecretKey(BlstSecKey);

impl BlsSecretKey {
    /// Generate a new random secret key
    pub fn generate<R: CryptoRng + RngCore>(rng: &mut R) -> Self {
        let mut ikm = [0u8; 32];
        rng.fill_bytes(&mut ikm);
        let key = Self::from_seed(&ikm);
        ikm.zeroize();
        key
    }

    /// Derive from seed bytes (32 bytes, uses the blst key-derivation map)
    ///
    /// The seed is mapped onto a valid non-zero scalar, so any 32 bytes of
    /// entropy (including HMAC output) produce a usable key.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        let sk = BlstSecKey::key_gen(seed, &[]).expect("seed is valid length");
        Self(sk)
    }

    /// Load from raw bytes (32 bytes scalar)
    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self, CryptoError> {
        BlstSecKey::from_bytes(bytes)
            .map(Self)
            .map_err(|_| CryptoError::InvalidSecretKey)
    }

    /// Serialize to bytes
    pub fn to_bytes(&self) -> [u8; 32] {
        self.0.to_bytes()
    }

    /// Get the corresponding public key
    pub fn public_key(&self) -> BlsPublicKey {
        BlsPublicKey(self.0.sk_to_pk())
    }

    /// Sign a message with domain separation
    pub fn sign(&self, msg: &[u8], dst: &[u8]) -> BlsSignature {
        let sig = self.0.sign(msg, dst, &[]);
        BlsSignature(sig)
    }

    /// Add another secret key to this one modulo the scalar field order
    ///
    /// Used for HD child derivation: `child = parent + tweak`.
    pub fn add_tweak(&self, tweak: &BlsSecretKey) -> Result<Self, CryptoError> {
        let mut a_bytes = self.0.to_bytes();
        let mut b_bytes = tweak.0.to_bytes();
        let mut out_bytes = [0u8; 32];

        let ok = unsafe {
            let mut a = blst_scalar::default();
            let mut b = blst_scalar::default();
            let mut out = blst_scalar::default();
            blst_scalar_from_bendian(&mut a, a_bytes.as_ptr());
            blst_scalar_from_bendian(&mut b, b_bytes.as_ptr());
            let valid = blst_sk_add_n_check(&mut out, &a, &b);
            blst_bendian_from_scalar(out_bytes.as_mut_ptr(), &out);
            valid
        };

        a_bytes.zeroize();
        b_bytes.zeroize();

        if !ok {
            out_bytes.zeroize();
            return Err(CryptoError::InvalidSecretKey);
        }

        let sum = Self::from_bytes(&out_bytes);
        out_bytes.zeroize();
        sum
    }
}

impl std::fmt::Debug for BlsSecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlsSecretKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// BLS12-381 public key (48 bytes compressed)
#[derive(Clone, PartialEq, Eq)]
pub struct BlsPublicKey(BlstPubKey);

impl BlsPublicKey {
    /// Load from bytes (48 bytes compressed)
    pub fn from_bytes(bytes: &[u8; 48]) -> Result<Self, CryptoError> {
        BlstPubKey::from_bytes(bytes)
            .map(Self)
            .map_err(|_| CryptoError::InvalidPublicKey)
    }

    /// Serialize to bytes (48 bytes compressed)
    pub fn to_bytes(&self) -> [u8; 48] {
        self.0.to_bytes()
    }

    /// Verify a signature
    pub fn verify(&self, msg: &[u8], dst: &[u8], sig: &BlsSignature) -> bool {
        sig.0.verify(true, msg, dst, &[], &self.0, true) == BLST_ERROR::BLST_SUCCESS
    }

    /// Add another public key to this one on G1
    ///
    /// Point-addition counterpart of [`BlsSecretKey::add_tweak`]:
    /// `pk(a) + pk(b) == pk(a + b)`.
    pub fn add_tweak(&self, tweak: &BlsPublicKey) -> Result<Self, CryptoError> {
        BlstAggPubKey::aggregate(&[&self.0, &tweak.0], true)
            .map(|agg| Self(agg.to_public_key()))
            .map_err(|_| CryptoError::InvalidPublicKey)
    }
}

impl std::fmt::Debug for BlsPublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let bytes = self.to_bytes();
        write!(f, "BlsPublicKey({})", hex::encode(&bytes[..8]))
    }
}

/// BLS12-381 signature (96 bytes)
#[derive(Clone)]
pub struct BlsSignature(BlstSig);

impl BlsSignature {
    /// Load from bytes (96 bytes)
    pub fn from_bytes(bytes: &[u8; 96]) -> Result<Self, CryptoError> {
        BlstSig::from_bytes(bytes)
            .map(Self)
            .map_err(|_| CryptoError::InvalidSignature)
    }

    /// Serialize to bytes
    pub fn to_bytes(&self) -> [u8; 96] {
        self.0.to_bytes()
    }

    /// Verify signature against public key
    pub fn verify(&self, msg: &[u8], dst: &[u8], pubkey: &BlsPublicKey) -> bool {
        self.0.verify(true, msg, dst, &[], &pubkey.0, true) == BLST_ERROR::BLST_SUCCESS
    }
}

impl std::fmt::Debug for BlsSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let bytes = self.to_bytes();
        write!(f, "BlsSignature({})", hex::encode(&bytes[..8]))
    }
}

impl PartialEq for BlsSignature {
    fn eq(&self, other: &Self) -> bool {
        self.to_bytes() == other.to_bytes()
    }
}

impl Eq for BlsSignature {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_generation() {
        let sk = BlsSecretKey::generate(&mut rand::thread_rng());
        let bytes = sk.public_key().to_bytes();
        let restored = BlsPublicKey::from_bytes(&bytes).unwrap();
        assert_eq!(sk.public_key().to_bytes(), restored.to_bytes());
    }

    #[test]
    fn test_sign_verify() {
        let sk = BlsSecretKey::generate(&mut rand::thread_rng());
        let msg = b"test message";
        let sig = sk.sign(msg, DST_SIGNATURE);
        assert!(sk.public_key().verify(msg, DST_SIGNATURE, &sig));
    }

    #[test]
    fn test_wrong_message_fails() {
        let sk = BlsSecretKey::generate(&mut rand::thread_rng());
        let sig = sk.sign(b"correct message", DST_SIGNATURE);
        assert!(!sk.public_key().verify(b"wrong message", DST_SIGNATURE, &sig));
    }

    #[test]
    fn test_domain_separation() {
        let sk = BlsSecretKey::generate(&mut rand::thread_rng());
        let msg = b"same message";
        let sig = sk.sign(msg, DST_SIGNATURE);

        assert!(!sk.public_key().verify(msg, b"OTHER_DST", &sig));
        assert!(sk.public_key().verify(msg, DST_SIGNATURE, &sig));
    }

    #[test]
    fn test_from_seed_deterministic() {
        let seed = [7u8; 32];
        let sk1 = BlsSecretKey::from_seed(&seed);
        let sk2 = BlsSecretKey::from_seed(&seed);
        assert_eq!(sk1.to_bytes(), sk2.to_bytes());
    }

    #[test]
    fn test_tweak_commutes_with_public_key() {
        let a = BlsSecretKey::generate(&mut rand::thread_rng());
        let b = BlsSecretKey::generate(&mut rand::thread_rng());

        let sum_sk = a.add_tweak(&b).unwrap();
        let sum_pk = a.public_key().add_tweak(&b.public_key()).unwrap();

        assert_eq!(sum_sk.public_key().to_bytes(), sum_pk.to_bytes());
    }

    #[test]
    fn test_tweaked_key_signs() {
        let a = BlsSecretKey::generate(&mut rand::thread_rng());
        let b = BlsSecretKey::generate(&mut rand::thread_rng());
        let sum = a.add_tweak(&b).unwrap();

        let msg = b"signed by tweaked key";
        let sig = sum.sign(msg, DST_SIGNATURE);
        assert!(sum.public_key().verify(msg, DST_SIGNATURE, &sig));
    }

    #[test]
    fn test_secret_key_roundtrip() {
        let sk = BlsSecretKey::generate(&mut rand::thread_rng());
        let restored = BlsSecretKey::from_bytes(&sk.to_bytes()).unwrap();
        assert_eq!(sk.to_bytes(), restored.to_bytes());
    }

    #[test]
    fn test_debug_output_redacted() {
        let sk = BlsSecretKey::generate(&mut rand::thread_rng());
        let debug = format!("{:?}", sk);
        assert!(debug.contains("[REDACTED]"));
    }
}
