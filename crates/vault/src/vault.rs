//! The key vault
//!
//! A [`Vault`] owns two HD purpose branches (BLS12-381 and Ed25519), an
//! encrypted master-secret blob holding the BIP-39 phrase, an encrypted
//! store of imported private keys, and the address directory. All secret
//! material goes through the vault's [`Encrypter`]; an unencrypted vault
//! uses the no-op envelope so the storage shape never changes.
//!
//! The vault is a plain value: single writer, no interior mutability, no
//! I/O. Every operation checks its preconditions (including the password)
//! before mutating anything, so a failed call leaves the vault untouched.

use std::collections::BTreeMap;
use std::str::FromStr;

use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use halcyon_crypto::hdkeychain::{bls as bls_keychain, ed25519 as ed25519_keychain};
use halcyon_crypto::{Address, BlsSecretKey, Mnemonic, PrivateKey};

use crate::addresspath::{
    hardened, Path, ADDRESS_TYPE_BLS_ACCOUNT, ADDRESS_TYPE_ED25519_ACCOUNT,
    ADDRESS_TYPE_VALIDATOR, HARDENED_KEY_START, PURPOSE_BIP44, PURPOSE_BLS, PURPOSE_IMPORTED,
};
use crate::encrypter::{Encrypter, EncrypterOptions};
use crate::error::{VaultError, VaultResult};

/// Everything the directory records about one address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressInfo {
    /// Canonical bech32m address string
    pub address: String,
    /// Public key in canonical hex
    pub public_key: String,
    /// Free-form user label
    pub label: String,
    /// Canonical derivation path string
    pub path: String,
}

/// One HD purpose branch: the account-level extended keys at
/// `m/purpose'/coin'`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurposeBranch {
    /// Extended public key; always present, survives neutering
    pub xpub_account: String,
    /// Extended private key wrapped by the encrypter; absent iff neutered
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xprv_account_encrypted: Option<String>,
}

/// The two purpose branches of a vault
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Purposes {
    /// BLS12-381 branch (purpose 12381): validators and BLS accounts
    pub bls: PurposeBranch,
    /// Ed25519 branch (purpose 44): hardened-only accounts
    pub bip44: PurposeBranch,
}

/// A hierarchical-deterministic key vault
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vault {
    /// Coin type of the target chain
    pub coin_type: u32,
    /// Encryption envelope configuration
    pub encrypter: Encrypter,
    /// Encrypted master-secret blob (the BIP-39 phrase); absent iff neutered
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_store: Option<String>,
    /// The HD purpose branches
    pub purposes: Purposes,
    /// Address directory keyed by address string
    pub addresses: BTreeMap<String, AddressInfo>,
    /// Imported private keys, encrypted, indexed by import order
    pub imported_keys: Vec<String>,
}

impl Vault {
    /// Create a fresh unencrypted vault from a BIP-39 mnemonic
    ///
    /// Derives the account-level extended keys for both purpose branches
    /// from the mnemonic with an empty BIP-39 passphrase. The new vault has
    /// an empty address directory.
    pub fn create_from_mnemonic(mnemonic: &str, coin_type: u32) -> VaultResult<Self> {
        let mnemonic = Mnemonic::from_phrase(mnemonic)
            .map_err(|e| VaultError::InvalidMnemonic(e.to_string()))?;
        let seed = mnemonic.to_seed(None);

        let bls_account = bls_keychain::ExtendedPrivateKey::new_master(seed.as_slice())?
            .derive(hardened(PURPOSE_BLS))?
            .derive(hardened(coin_type))?;
        let ed25519_account = ed25519_keychain::ExtendedPrivateKey::new_master(seed.as_slice())?
            .derive(hardened(PURPOSE_BIP44))?
            .derive(hardened(coin_type))?;

        let encrypter = Encrypter::no_op();
        let key_store = encrypter.encrypt("", mnemonic.phrase().as_bytes())?;
        let bls_xprv = encrypter.encrypt("", bls_account.to_string().as_bytes())?;
        let ed25519_xprv = encrypter.encrypt("", ed25519_account.to_string().as_bytes())?;

        Ok(Self {
            coin_type,
            encrypter,
            key_store: Some(key_store),
            purposes: Purposes {
                bls: PurposeBranch {
                    xpub_account: bls_account.to_public().to_string(),
                    xprv_account_encrypted: Some(bls_xprv),
                },
                bip44: PurposeBranch {
                    xpub_account: ed25519_account.to_public().to_string(),
                    xprv_account_encrypted: Some(ed25519_xprv),
                },
            },
            addresses: BTreeMap::new(),
            imported_keys: Vec::new(),
        })
    }

    /// True when the vault carries no secret material
    pub fn is_neutered(&self) -> bool {
        self.key_store.is_none()
    }

    /// True when secrets are ciphertext under a non-empty password
    pub fn is_encrypted(&self) -> bool {
        self.encrypter.is_encrypted()
    }

    /// Allocate the next validator address under purpose 12381
    ///
    /// Works on a neutered vault too: the leaf is non-hardened and BLS
    /// supports public-only derivation.
    pub fn new_validator_address(&mut self, label: &str) -> VaultResult<AddressInfo> {
        self.new_bls_address(label, ADDRESS_TYPE_VALIDATOR)
    }

    /// Allocate the next BLS account address under purpose 12381
    pub fn new_bls_account_address(&mut self, label: &str) -> VaultResult<AddressInfo> {
        self.new_bls_address(label, ADDRESS_TYPE_BLS_ACCOUNT)
    }

    fn new_bls_address(&mut self, label: &str, address_type: u32) -> VaultResult<AddressInfo> {
        let xpub = bls_keychain::ExtendedPublicKey::from_str(&self.purposes.bls.xpub_account)?;

        let index = self.next_address_index(PURPOSE_BLS, address_type);
        let child = xpub.derive(hardened(address_type))?.derive(index)?;
        let pubkey = child.public_key();

        let address = match address_type {
            ADDRESS_TYPE_VALIDATOR => Address::validator(pubkey),
            _ => Address::bls_account(pubkey),
        };
        let path = Path::new(
            hardened(PURPOSE_BLS),
            hardened(self.coin_type),
            hardened(address_type),
            index,
        );

        let info = AddressInfo {
            address: address.to_string(),
            public_key: hex::encode(pubkey.to_bytes()),
            label: label.to_string(),
            path: path.to_string(),
        };
        self.insert_address(info.clone())?;
        Ok(info)
    }

    /// Allocate the next Ed25519 account address under purpose 44
    ///
    /// Ed25519 leaves are hardened, so derivation needs the account private
    /// key and therefore the password.
    pub fn new_ed25519_account_address(
        &mut self,
        label: &str,
        password: &str,
    ) -> VaultResult<AddressInfo> {
        if self.is_neutered() {
            return Err(VaultError::Neutered);
        }
        let xprv = self.ed25519_account_xprv(password)?;

        let index = self.next_address_index(PURPOSE_BIP44, ADDRESS_TYPE_ED25519_ACCOUNT);
        let child = xprv
            .derive(hardened(ADDRESS_TYPE_ED25519_ACCOUNT))?
            .derive(hardened(index))?;
        let pubkey = child.secret_key().public_key();

        let path = Path::new(
            hardened(PURPOSE_BIP44),
            hardened(self.coin_type),
            hardened(ADDRESS_TYPE_ED25519_ACCOUNT),
            hardened(index),
        );

        let info = AddressInfo {
            address: Address::ed25519_account(&pubkey).to_string(),
            public_key: hex::encode(pubkey.to_bytes()),
            label: label.to_string(),
            path: path.to_string(),
        };
        self.insert_address(info.clone())?;
        Ok(info)
    }

    /// Import a raw BLS private key
    ///
    /// The key lands under the synthetic purpose 65535 and contributes two
    /// directory entries (validator and account) sharing one hardened index.
    /// The password is validated before anything is touched so a key is
    /// never sealed under an envelope the user cannot open.
    pub fn import_bls_private_key(
        &mut self,
        password: &str,
        private_key: &BlsSecretKey,
    ) -> VaultResult<()> {
        if self.is_neutered() {
            return Err(VaultError::Neutered);
        }
        let key_store = self.key_store.as_ref().ok_or(VaultError::Neutered)?;
        self.encrypter.decrypt(password, key_store)?;

        let pubkey = private_key.public_key();
        let validator_address = Address::validator(&pubkey).to_string();
        let account_address = Address::bls_account(&pubkey).to_string();
        if self.addresses.contains_key(&validator_address)
            || self.addresses.contains_key(&account_address)
        {
            return Err(VaultError::AddressExists);
        }

        let index = self.imported_keys.len() as u32;
        let key_bytes = Zeroizing::new(private_key.to_bytes());
        let blob = self.encrypter.encrypt(password, key_bytes.as_slice())?;

        let public_key = hex::encode(pubkey.to_bytes());
        let validator_path = Path::new(
            hardened(PURPOSE_IMPORTED),
            hardened(self.coin_type),
            hardened(ADDRESS_TYPE_VALIDATOR),
            hardened(index),
        );
        let account_path = Path::new(
            hardened(PURPOSE_IMPORTED),
            hardened(self.coin_type),
            hardened(ADDRESS_TYPE_BLS_ACCOUNT),
            hardened(index),
        );

        self.imported_keys.push(blob);
        self.addresses.insert(
            validator_address.clone(),
            AddressInfo {
                address: validator_address,
                public_key: public_key.clone(),
                label: String::new(),
                path: validator_path.to_string(),
            },
        );
        self.addresses.insert(
            account_address.clone(),
            AddressInfo {
                address: account_address,
                public_key,
                label: String::new(),
                path: account_path.to_string(),
            },
        );
        Ok(())
    }

    /// Retrieve the private keys for the given addresses, in input order
    ///
    /// Partial failure is total failure: either every requested key is
    /// returned or the whole call errors.
    pub fn private_keys(
        &self,
        password: &str,
        addresses: &[&str],
    ) -> VaultResult<Vec<PrivateKey>> {
        if self.is_neutered() {
            return Err(VaultError::Neutered);
        }

        // Resolve everything before opening the encrypter.
        let mut requests = Vec::with_capacity(addresses.len());
        for address in addresses {
            let info = self
                .addresses
                .get(*address)
                .ok_or_else(|| VaultError::AddressNotFound(address.to_string()))?;
            let path = Path::from_str(&info.path)
                .map_err(|e| VaultError::InvalidKeyMaterial(e.to_string()))?;
            requests.push((info, path));
        }

        let purpose_of = |path: &Path| path.purpose() & !HARDENED_KEY_START;
        let bls_xprv = if requests.iter().any(|(_, p)| purpose_of(p) == PURPOSE_BLS) {
            Some(self.bls_account_xprv(password)?)
        } else {
            None
        };
        let ed25519_xprv = if requests.iter().any(|(_, p)| purpose_of(p) == PURPOSE_BIP44) {
            Some(self.ed25519_account_xprv(password)?)
        } else {
            None
        };

        let mut keys = Vec::with_capacity(requests.len());
        for (info, path) in requests {
            match purpose_of(&path) {
                PURPOSE_BLS => {
                    let xprv = bls_xprv
                        .as_ref()
                        .ok_or_else(|| missing_account_key("bls"))?;
                    let child = xprv.derive(path.address_type())?.derive(path.address_index())?;
                    keys.push(PrivateKey::Bls(child.secret_key().clone()));
                }
                PURPOSE_BIP44 => {
                    let xprv = ed25519_xprv
                        .as_ref()
                        .ok_or_else(|| missing_account_key("ed25519"))?;
                    let child = xprv.derive(path.address_type())?.derive(path.address_index())?;
                    keys.push(PrivateKey::Ed25519(child.secret_key().clone()));
                }
                PURPOSE_IMPORTED => {
                    let index = (path.address_index() & !HARDENED_KEY_START) as usize;
                    let blob = self
                        .imported_keys
                        .get(index)
                        .ok_or_else(|| VaultError::AddressNotFound(info.address.clone()))?;
                    let plaintext = self.encrypter.decrypt(password, blob)?;
                    let key_bytes: [u8; 32] = plaintext
                        .expose_secret()
                        .as_slice()
                        .try_into()
                        .map_err(|_| {
                            VaultError::InvalidKeyMaterial(
                                "imported key must be 32 bytes".to_string(),
                            )
                        })?;
                    let secret_key = BlsSecretKey::from_bytes(&key_bytes)
                        .map_err(|e| VaultError::InvalidKeyMaterial(e.to_string()))?;
                    keys.push(PrivateKey::Bls(secret_key));
                }
                other => {
                    return Err(VaultError::InvalidKeyMaterial(format!(
                        "unsupported purpose {other}"
                    )))
                }
            }
        }
        Ok(keys)
    }

    /// Recover the BIP-39 phrase
    pub fn mnemonic(&self, password: &str) -> VaultResult<String> {
        let key_store = self.key_store.as_ref().ok_or(VaultError::Neutered)?;
        let plaintext = self.encrypter.decrypt(password, key_store)?;
        String::from_utf8(plaintext.expose_secret().clone())
            .map_err(|_| VaultError::InvalidKeyMaterial("mnemonic is not valid UTF-8".to_string()))
    }

    /// Re-encrypt every secret under a new password with default KDF costs
    ///
    /// Passing an empty `new_password` removes encryption; an empty
    /// `old_password` is only valid when the vault is unencrypted.
    pub fn update_password(&mut self, old_password: &str, new_password: &str) -> VaultResult<()> {
        self.update_password_with_options(old_password, new_password, EncrypterOptions::default())
    }

    /// Re-encrypt every secret under a new password and fresh KDF costs
    ///
    /// Atomic: the working set is decrypted and re-encrypted in full before
    /// any field is replaced, so a wrong old password leaves the vault
    /// unchanged.
    pub fn update_password_with_options(
        &mut self,
        old_password: &str,
        new_password: &str,
        options: EncrypterOptions,
    ) -> VaultResult<()> {
        if self.is_neutered() {
            return Err(VaultError::Neutered);
        }

        // Decrypt the full working set under the old password.
        let key_store_blob = self.key_store.as_ref().ok_or(VaultError::Neutered)?;
        let bls_blob = self
            .purposes
            .bls
            .xprv_account_encrypted
            .as_ref()
            .ok_or(VaultError::Neutered)?;
        let ed25519_blob = self
            .purposes
            .bip44
            .xprv_account_encrypted
            .as_ref()
            .ok_or(VaultError::Neutered)?;

        let key_store_plain = self.encrypter.decrypt(old_password, key_store_blob)?;
        let bls_plain = self.encrypter.decrypt(old_password, bls_blob)?;
        let ed25519_plain = self.encrypter.decrypt(old_password, ed25519_blob)?;
        let mut imported_plain = Vec::with_capacity(self.imported_keys.len());
        for blob in &self.imported_keys {
            imported_plain.push(self.encrypter.decrypt(old_password, blob)?);
        }

        // Re-encrypt everything under the new envelope.
        let encrypter = if new_password.is_empty() {
            Encrypter::no_op()
        } else {
            Encrypter::new(&options)
        };
        let key_store = encrypter.encrypt(new_password, key_store_plain.expose_secret())?;
        let bls_xprv = encrypter.encrypt(new_password, bls_plain.expose_secret())?;
        let ed25519_xprv = encrypter.encrypt(new_password, ed25519_plain.expose_secret())?;
        let mut imported_keys = Vec::with_capacity(imported_plain.len());
        for plain in &imported_plain {
            imported_keys.push(encrypter.encrypt(new_password, plain.expose_secret())?);
        }

        // Swap in one step.
        self.encrypter = encrypter;
        self.key_store = Some(key_store);
        self.purposes.bls.xprv_account_encrypted = Some(bls_xprv);
        self.purposes.bip44.xprv_account_encrypted = Some(ed25519_xprv);
        self.imported_keys = imported_keys;
        Ok(())
    }

    /// Set the label of an address
    pub fn set_label(&mut self, address: &str, label: &str) -> VaultResult<()> {
        match self.addresses.get_mut(address) {
            Some(info) => {
                info.label = label.to_string();
                Ok(())
            }
            None => Err(VaultError::AddressNotFound(address.to_string())),
        }
    }

    /// The label of an address; empty for unknown addresses
    pub fn label(&self, address: &str) -> String {
        self.addresses
            .get(address)
            .map(|info| info.label.clone())
            .unwrap_or_default()
    }

    /// Look up an address in the directory
    pub fn address_info(&self, address: &str) -> Option<&AddressInfo> {
        self.addresses.get(address)
    }

    /// Look up an address by its derivation path
    pub fn address_from_path(&self, path: &str) -> Option<&AddressInfo> {
        self.addresses.values().find(|info| info.path == path)
    }

    /// Snapshot of the directory, ordered by (purpose, subtype, index)
    ///
    /// Purpose order is numeric: 44 before 12381 before 65535.
    pub fn address_infos(&self) -> Vec<AddressInfo> {
        let mut infos: Vec<AddressInfo> = self.addresses.values().cloned().collect();
        infos.sort_by_key(|info| path_sort_key(&info.path));
        infos
    }

    /// All account addresses (BLS, Ed25519 and imported), ordered
    pub fn all_account_addresses(&self) -> Vec<AddressInfo> {
        self.filtered_infos(|path| {
            path.address_type() & !HARDENED_KEY_START != ADDRESS_TYPE_VALIDATOR
        })
    }

    /// All validator addresses (HD and imported), ordered
    pub fn all_validator_addresses(&self) -> Vec<AddressInfo> {
        self.filtered_infos(|path| {
            path.address_type() & !HARDENED_KEY_START == ADDRESS_TYPE_VALIDATOR
        })
    }

    /// All addresses backed by imported private keys, ordered
    pub fn all_imported_private_keys_addresses(&self) -> Vec<AddressInfo> {
        self.filtered_infos(|path| path.purpose() & !HARDENED_KEY_START == PURPOSE_IMPORTED)
    }

    /// Number of addresses in the directory
    pub fn address_count(&self) -> usize {
        self.addresses.len()
    }

    /// True when the directory contains the address
    pub fn contains(&self, address: &str) -> bool {
        self.addresses.contains_key(address)
    }

    /// Produce the watch-only counterpart of this vault
    ///
    /// The copy keeps the coin type, the extended public keys and the full
    /// address directory, and drops every secret slot: the master-secret
    /// blob, both account private keys and all imported keys. The original
    /// vault is untouched.
    pub fn neuter(&self) -> Vault {
        Vault {
            coin_type: self.coin_type,
            encrypter: Encrypter::no_op(),
            key_store: None,
            purposes: Purposes {
                bls: PurposeBranch {
                    xpub_account: self.purposes.bls.xpub_account.clone(),
                    xprv_account_encrypted: None,
                },
                bip44: PurposeBranch {
                    xpub_account: self.purposes.bip44.xpub_account.clone(),
                    xprv_account_encrypted: None,
                },
            },
            addresses: self.addresses.clone(),
            imported_keys: Vec::new(),
        }
    }

    /// Count of existing addresses under `m/purpose'/coin'/type'`, which is
    /// also the next dense index.
    fn next_address_index(&self, purpose: u32, address_type: u32) -> u32 {
        self.addresses
            .values()
            .filter_map(|info| Path::from_str(&info.path).ok())
            .filter(|path| {
                path.purpose() & !HARDENED_KEY_START == purpose
                    && path.address_type() & !HARDENED_KEY_START == address_type
            })
            .count() as u32
    }

    fn insert_address(&mut self, info: AddressInfo) -> VaultResult<()> {
        if self.addresses.contains_key(&info.address) {
            return Err(VaultError::AddressExists);
        }
        self.addresses.insert(info.address.clone(), info);
        Ok(())
    }

    fn filtered_infos<F>(&self, predicate: F) -> Vec<AddressInfo>
    where
        F: Fn(&Path) -> bool,
    {
        self.address_infos()
            .into_iter()
            .filter(|info| {
                Path::from_str(&info.path)
                    .map(|path| predicate(&path))
                    .unwrap_or(false)
            })
            .collect()
    }

    /// Decrypt and parse the BLS account-level private key
    fn bls_account_xprv(&self, password: &str) -> VaultResult<bls_keychain::ExtendedPrivateKey> {
        let blob = self
            .purposes
            .bls
            .xprv_account_encrypted
            .as_ref()
            .ok_or(VaultError::Neutered)?;
        let plaintext = self.encrypter.decrypt(password, blob)?;
        let encoded = std::str::from_utf8(plaintext.expose_secret())
            .map_err(|_| VaultError::InvalidKeyMaterial("extended key is not UTF-8".to_string()))?;
        Ok(bls_keychain::ExtendedPrivateKey::from_str(encoded)?)
    }

    /// Decrypt and parse the Ed25519 account-level private key
    fn ed25519_account_xprv(
        &self,
        password: &str,
    ) -> VaultResult<ed25519_keychain::ExtendedPrivateKey> {
        let blob = self
            .purposes
            .bip44
            .xprv_account_encrypted
            .as_ref()
            .ok_or(VaultError::Neutered)?;
        let plaintext = self.encrypter.decrypt(password, blob)?;
        let encoded = std::str::from_utf8(plaintext.expose_secret())
            .map_err(|_| VaultError::InvalidKeyMaterial("extended key is not UTF-8".to_string()))?;
        Ok(ed25519_keychain::ExtendedPrivateKey::from_str(encoded)?)
    }
}

/// Sort key for the directory ordering: literal (purpose, subtype, index)
fn path_sort_key(path: &str) -> (u32, u32, u32) {
    match Path::from_str(path) {
        Ok(p) => (
            p.purpose() & !HARDENED_KEY_START,
            p.address_type() & !HARDENED_KEY_START,
            p.address_index() & !HARDENED_KEY_START,
        ),
        // Unparseable paths sort last; they cannot appear via public ops
        Err(_) => (u32::MAX, u32::MAX, u32::MAX),
    }
}

fn missing_account_key(family: &str) -> VaultError {
    VaultError::InvalidKeyMaterial(format!("{family} account key was not opened"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_sort_key_purpose_order() {
        let ed = path_sort_key("m/44'/21888'/3'/0'");
        let bls = path_sort_key("m/12381'/21888'/1'/0");
        let imported = path_sort_key("m/65535'/21888'/1'/0'");
        assert!(ed < bls);
        assert!(bls < imported);
    }

    #[test]
    fn test_path_sort_key_subtype_then_index() {
        assert!(path_sort_key("m/12381'/21888'/1'/9") < path_sort_key("m/12381'/21888'/2'/0"));
        assert!(path_sort_key("m/12381'/21888'/1'/0") < path_sort_key("m/12381'/21888'/1'/1"));
    }
}
