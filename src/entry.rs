//! Index entry format (v1)
//!
//!   version[1] || nonce[12] || aead_ct[16+]
//!
//! aead_ct seals the document key under the keyword's encryption subkey with
//!   aad = PROTOCOL_ID || b"|index|" || label
//! so an entry only opens at the label it was written for.

use crate::aead;
use crate::error::{OpenError, SealError};
use crate::keys::{BlindLabel, EncryptKey};

/// Protocol identifier for AAD domain separation.
pub const PROTOCOL_ID: &[u8] = b"cryptkv-sse-v1";

/// Version byte for v1 entries.
pub const ENTRY_VERSION: u8 = 0x01;

pub const NONCE_BYTES: usize = 12;
pub const AEAD_TAG_BYTES: usize = 16;
pub const HEADER_BYTES: usize = 1;

/// Smallest well-formed entry (empty document key).
pub const MIN_ENTRY_BYTES: usize = HEADER_BYTES + NONCE_BYTES + AEAD_TAG_BYTES; // 29

/// Borrowed view of a decoded entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryParts<'a> {
    pub version: u8,
    pub nonce: &'a [u8; NONCE_BYTES],
    pub ciphertext: &'a [u8],
}

fn entry_aad(label: &BlindLabel) -> Vec<u8> {
    let mut aad = Vec::with_capacity(PROTOCOL_ID.len() + 7 + label.as_bytes().len());
    aad.extend_from_slice(PROTOCOL_ID);
    aad.extend_from_slice(b"|index|");
    aad.extend_from_slice(label.as_bytes());
    aad
}

pub fn encode_entry(nonce: &[u8; NONCE_BYTES], ciphertext: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(HEADER_BYTES + NONCE_BYTES + ciphertext.len());
    out.push(ENTRY_VERSION);
    out.extend_from_slice(nonce);
    out.extend_from_slice(ciphertext);
    out
}

pub fn decode_entry(bytes: &[u8]) -> Result<EntryParts<'_>, OpenError> {
    if bytes.len() < MIN_ENTRY_BYTES {
        return Err(OpenError);
    }
    let version = bytes[0];
    if version != ENTRY_VERSION {
        return Err(OpenError);
    }
    let nonce: &[u8; NONCE_BYTES] = bytes[HEADER_BYTES..HEADER_BYTES + NONCE_BYTES]
        .try_into()
        .map_err(|_| OpenError)?;
    Ok(EntryParts {
        version,
        nonce,
        ciphertext: &bytes[HEADER_BYTES + NONCE_BYTES..],
    })
}

/// Seal a document key into an index entry for `label`.
pub fn seal_entry(
    key: &EncryptKey,
    label: &BlindLabel,
    document_key: &[u8],
) -> Result<Vec<u8>, SealError> {
    let nonce = aead::nonce()?;
    let ct = aead::aead_seal(key.as_bytes(), &nonce, document_key, &entry_aad(label))?;
    Ok(encode_entry(&nonce, &ct))
}

/// Open an index entry read from `label`, returning the document key.
pub fn open_entry(key: &EncryptKey, label: &BlindLabel, entry: &[u8]) -> Result<Vec<u8>, OpenError> {
    let parts = decode_entry(entry)?;
    aead::aead_open(key.as_bytes(), parts.nonce, parts.ciphertext, &entry_aad(label))
}
