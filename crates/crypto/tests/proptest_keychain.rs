//! Property-based tests for HD key derivation
//!
//! Uses proptest to verify derivation invariants across many randomly
//! generated seeds and indices. Case counts are modest because BLS point
//! arithmetic dominates runtime.

use proptest::prelude::*;

use halcyon_crypto::hdkeychain::{bls, ed25519, KeychainError, HARDENED_KEY_START};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Property: BLS private and public derivation agree at every index
    #[test]
    fn prop_bls_derivation_commutes(
        seed in any::<[u8; 32]>(),
        index in any::<u32>(),
    ) {
        let master = bls::ExtendedPrivateKey::new_master(&seed).expect("valid seed length");

        let via_private = master.derive(index).expect("derive private").to_public();
        let via_public = master.to_public().derive(index).expect("derive public");
        prop_assert_eq!(via_private, via_public);
    }

    /// Property: BLS derivation is deterministic and index-sensitive
    #[test]
    fn prop_bls_derivation_deterministic(
        seed in any::<[u8; 32]>(),
        index1 in 0u32..1024,
        index2 in 1024u32..2048,
    ) {
        let master = bls::ExtendedPrivateKey::new_master(&seed).expect("valid seed length");

        let a = master.derive(index1).expect("derive");
        let b = master.derive(index1).expect("derive");
        prop_assert_eq!(a.secret_key().to_bytes(), b.secret_key().to_bytes());

        let c = master.derive(index2).expect("derive");
        prop_assert_ne!(a.secret_key().to_bytes(), c.secret_key().to_bytes());
    }

    /// Property: extended keys round-trip through their string form
    #[test]
    fn prop_bls_string_roundtrip(seed in any::<[u8; 32]>(), index in any::<u32>()) {
        use std::str::FromStr;

        let child = bls::ExtendedPrivateKey::new_master(&seed)
            .expect("valid seed length")
            .derive(index)
            .expect("derive");

        let restored = bls::ExtendedPrivateKey::from_str(&child.to_string())
            .expect("formatted key must parse");
        prop_assert_eq!(restored.to_string(), child.to_string());

        let xpub = child.to_public();
        let restored_pub = bls::ExtendedPublicKey::from_str(&xpub.to_string())
            .expect("formatted key must parse");
        prop_assert_eq!(restored_pub, xpub);
    }

    /// Property: Ed25519 rejects exactly the non-hardened indices
    #[test]
    fn prop_ed25519_hardened_only(seed in any::<[u8; 32]>(), index in 0u32..HARDENED_KEY_START) {
        let master = ed25519::ExtendedPrivateKey::new_master(&seed).expect("valid seed length");

        prop_assert_eq!(
            master.derive(index).unwrap_err(),
            KeychainError::UnusableChild
        );
        prop_assert!(master.derive(index | HARDENED_KEY_START).is_ok());
    }

    /// Property: different seeds never produce the same master key
    #[test]
    fn prop_distinct_seeds_distinct_masters(
        seed1 in any::<[u8; 32]>(),
        seed2 in any::<[u8; 32]>(),
    ) {
        prop_assume!(seed1 != seed2);

        let bls1 = bls::ExtendedPrivateKey::new_master(&seed1).expect("valid seed length");
        let bls2 = bls::ExtendedPrivateKey::new_master(&seed2).expect("valid seed length");
        prop_assert_ne!(bls1.secret_key().to_bytes(), bls2.secret_key().to_bytes());

        let ed1 = ed25519::ExtendedPrivateKey::new_master(&seed1).expect("valid seed length");
        let ed2 = ed25519::ExtendedPrivateKey::new_master(&seed2).expect("valid seed length");
        prop_assert_ne!(ed1.secret_key().to_bytes(), ed2.secret_key().to_bytes());
    }
}
