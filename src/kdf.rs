//! Key schedule
//!
//! master     = PBKDF2-HMAC-SHA256(passphrase, salt, iterations, len=32)
//! index_key  = HMAC-SHA256(key=master,    msg=keyword || TAG_INDEX)
//! encrypt_key= HMAC-SHA256(key=master,    msg=keyword || TAG_ENCRYPT)
//! label      = HMAC-SHA256(key=index_key, msg="COUNT")

use hmac::digest::Key;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::keys::{BlindLabel, EncryptKey, IndexKey, Keyword, MasterSecret, SubkeyPair, KEY_BYTES};

type HmacSha256 = Hmac<Sha256>;

/// Domain tag appended to the keyword when deriving the index subkey.
pub const TAG_INDEX: u8 = 0x01;

/// Domain tag appended to the keyword when deriving the encryption subkey.
pub const TAG_ENCRYPT: u8 = 0x02;

/// Message MACed under the index subkey to produce the blind label.
pub const LABEL_MESSAGE: &[u8] = b"COUNT";

/// Iteration count used when a client does not configure one.
pub const DEFAULT_ITERATIONS: u32 = 4096;

fn hmac_sha256(key: &[u8; KEY_BYTES], parts: &[&[u8]]) -> [u8; KEY_BYTES] {
    // HMAC zero-pads short keys to the block size, so a padded block is the same key.
    let mut block = Key::<HmacSha256>::default();
    block[..KEY_BYTES].copy_from_slice(key);
    let mut mac = <HmacSha256 as Mac>::new(&block);
    for part in parts {
        mac.update(part);
    }
    let tag = mac.finalize().into_bytes();
    let mut out = [0u8; KEY_BYTES];
    out.copy_from_slice(&tag);
    out
}

/// Derive the client's master secret from a passphrase.
///
/// An iteration count of zero is treated as one.
pub fn derive_master_secret(passphrase: &[u8], salt: &[u8], iterations: u32) -> MasterSecret {
    let mut out = [0u8; KEY_BYTES];
    pbkdf2::pbkdf2_hmac::<Sha256>(passphrase, salt, iterations.max(1), &mut out);
    MasterSecret::from_bytes(out)
}

/// Derive the index and encryption subkeys for one keyword.
pub fn derive_subkeys(keyword: &Keyword, master: &MasterSecret) -> SubkeyPair {
    let index = hmac_sha256(master.as_bytes(), &[keyword.as_bytes(), &[TAG_INDEX]]);
    let encrypt = hmac_sha256(master.as_bytes(), &[keyword.as_bytes(), &[TAG_ENCRYPT]]);
    SubkeyPair {
        index_key: IndexKey::from_bytes(index),
        encrypt_key: EncryptKey::from_bytes(encrypt),
    }
}

/// Compute the blind label addressing a keyword's index entry.
pub fn blind_label(index_key: &IndexKey) -> BlindLabel {
    BlindLabel::from_bytes(hmac_sha256(index_key.as_bytes(), &[LABEL_MESSAGE]))
}
