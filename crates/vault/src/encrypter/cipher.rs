//! AES-128-CTR keystream for the encryption envelope
//!
//! CTR mode is an involution: XOR-ing with the keystream once encrypts,
//! doing it again decrypts, and the blob body stays exactly as long as the
//! plaintext. Authenticity comes from the envelope checksum, not from the
//! cipher, so this module only ever applies the keystream in place.

use aes::Aes128;
use cipher::{KeyIvInit, StreamCipher};
use ctr::Ctr128BE;

/// IV (initialization vector) length in bytes
pub const IV_LENGTH: usize = 16;

/// Cipher key length; the first half of the derived envelope key
pub const CIPHER_KEY_LENGTH: usize = 16;

type Aes128Ctr = Ctr128BE<Aes128>;

/// XOR `data` in place with the AES-128-CTR keystream for `(key, iv)`.
///
/// Called once to encrypt and once to decrypt; the fixed-size array
/// parameters make wrong key or IV sizes unrepresentable.
pub(super) fn apply_keystream(
    cipher_key: &[u8; CIPHER_KEY_LENGTH],
    iv: &[u8; IV_LENGTH],
    data: &mut [u8],
) {
    let mut cipher = Aes128Ctr::new(cipher_key.into(), iv.into());
    cipher.apply_keystream(data);
}

/// Generate a random IV
pub(super) fn generate_iv() -> [u8; IV_LENGTH] {
    use rand::RngCore;
    let mut iv = [0u8; IV_LENGTH];
    rand::thread_rng().fill_bytes(&mut iv);
    iv
}
