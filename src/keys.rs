//! Typed key material.
//!
//! The capability split is carried by the types: the client holds a
//! [`MasterSecret`] and [`Keyword`]s, the server only ever receives an
//! [`IndexKey`] and an [`EncryptKey`], and storage only ever sees a
//! [`BlindLabel`]. None of these convert into one another except through the
//! derivations in [`crate::kdf`].

use core::fmt;
use core::hash::{Hash, Hasher};

use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::KeyParseError;

/// Size of every derived key and of the blind label.
pub const KEY_BYTES: usize = 32;

fn parse_hex_32(s: &str) -> Result<[u8; KEY_BYTES], KeyParseError> {
    let bytes = hex::decode(s.trim())?;
    if bytes.len() != KEY_BYTES {
        return Err(KeyParseError::WrongLength {
            expected: KEY_BYTES,
            got: bytes.len(),
        });
    }
    let mut out = [0u8; KEY_BYTES];
    out.copy_from_slice(&bytes);
    Ok(out)
}

// ---------------------------------------------------------------------------
// Client-only material
// ---------------------------------------------------------------------------

/// Per-client root secret. Never leaves the client.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct MasterSecret([u8; KEY_BYTES]);

impl MasterSecret {
    pub(crate) fn from_bytes(bytes: [u8; KEY_BYTES]) -> Self {
        Self(bytes)
    }

    pub(crate) fn as_bytes(&self) -> &[u8; KEY_BYTES] {
        &self.0
    }
}

impl fmt::Debug for MasterSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MasterSecret(..)")
    }
}

/// A plaintext search keyword. Never leaves the client.
#[derive(Clone, PartialEq, Eq)]
pub struct Keyword(String);

impl Keyword {
    pub fn new(keyword: impl Into<String>) -> Self {
        Self(keyword.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl From<&str> for Keyword {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Keyword {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Debug for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Keyword(..)")
    }
}

// ---------------------------------------------------------------------------
// Per-keyword subkeys (sent to the server)
// ---------------------------------------------------------------------------

macro_rules! subkey {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Clone, Zeroize, ZeroizeOnDrop)]
        pub struct $name([u8; KEY_BYTES]);

        impl $name {
            pub fn from_bytes(bytes: [u8; KEY_BYTES]) -> Self {
                Self(bytes)
            }

            pub fn from_hex(s: &str) -> Result<Self, KeyParseError> {
                parse_hex_32(s).map(Self)
            }

            pub fn to_hex(&self) -> String {
                hex::encode(self.0)
            }

            pub fn as_bytes(&self) -> &[u8; KEY_BYTES] {
                &self.0
            }
        }

        impl PartialEq for $name {
            fn eq(&self, other: &Self) -> bool {
                self.0.ct_eq(&other.0).into()
            }
        }

        impl Eq for $name {}

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(concat!(stringify!($name), "(..)"))
            }
        }
    };
}

subkey!(
    /// Subkey that addresses a keyword's slot in the `index` bucket.
    IndexKey
);

subkey!(
    /// Subkey that seals the document key stored in a keyword's index entry.
    EncryptKey
);

/// The two subkeys derived for one keyword.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubkeyPair {
    pub index_key: IndexKey,
    pub encrypt_key: EncryptKey,
}

impl SubkeyPair {
    pub fn into_parts(self) -> (IndexKey, EncryptKey) {
        (self.index_key, self.encrypt_key)
    }
}

// ---------------------------------------------------------------------------
// Blind label (storage-visible)
// ---------------------------------------------------------------------------

/// Pseudorandom storage key of a keyword's entry in the `index` bucket.
#[derive(Clone, Copy)]
pub struct BlindLabel([u8; KEY_BYTES]);

impl BlindLabel {
    pub fn from_bytes(bytes: [u8; KEY_BYTES]) -> Self {
        Self(bytes)
    }

    pub fn from_hex(s: &str) -> Result<Self, KeyParseError> {
        parse_hex_32(s).map(Self)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_BYTES] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl PartialEq for BlindLabel {
    fn eq(&self, other: &Self) -> bool {
        self.0.ct_eq(&other.0).into()
    }
}

impl Eq for BlindLabel {}

impl Hash for BlindLabel {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl fmt::Debug for BlindLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlindLabel({})", self.to_hex())
    }
}

impl fmt::Display for BlindLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_roundtrip_preserves_key() {
        let k = IndexKey::from_bytes([7u8; KEY_BYTES]);
        let back = IndexKey::from_hex(&k.to_hex()).unwrap();
        assert_eq!(k, back);
    }

    #[test]
    fn hex_rejects_wrong_length() {
        let err = EncryptKey::from_hex("abcd").unwrap_err();
        assert_eq!(err, KeyParseError::WrongLength { expected: 32, got: 2 });
    }

    #[test]
    fn hex_rejects_garbage() {
        assert!(matches!(
            BlindLabel::from_hex("zz"),
            Err(KeyParseError::InvalidHex(_))
        ));
    }

    #[test]
    fn debug_never_prints_secret_bytes() {
        let k = EncryptKey::from_bytes([0xAB; KEY_BYTES]);
        let s = format!("{:?}", k);
        assert_eq!(s, "EncryptKey(..)");
        assert!(!s.contains("ab"));
        assert_eq!(format!("{:?}", Keyword::from("secret")), "Keyword(..)");
    }
}
