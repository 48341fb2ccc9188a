//! # CryptKV
//!
//! Client-side key schedule and index-entry sealing for a searchable
//! symmetric encryption index over a bucketed key-value store.
//!
//! ## Quick Start
//!
//! ```rust
//! use cryptkv::{blind_label, derive_master_secret, derive_subkeys, open_entry, seal_entry, Keyword};
//!
//! let master = derive_master_secret(b"passphrase", b"salt", 4096);
//! let pair = derive_subkeys(&Keyword::from("invoice-2024"), &master);
//!
//! // What the server computes from the index subkey it is sent.
//! let label = blind_label(&pair.index_key);
//!
//! let entry = seal_entry(&pair.encrypt_key, &label, b"doc-17").unwrap();
//! let doc_key = open_entry(&pair.encrypt_key, &label, &entry).unwrap();
//! assert_eq!(doc_key, b"doc-17");
//! ```
//!
//! ## Security Properties
//!
//! - **Blind labels**: storage keys are HMAC outputs; the keyword is not
//!   recoverable from them
//! - **Domain-separated subkeys**: the label key and the sealing key are
//!   independent even though both come from the same keyword
//! - **Uniform open errors**: wrong key, wrong label and tampering all produce
//!   the same [`OpenError`]
//! - **Label binding**: an entry moved to another label does not open
//!
//! ## What's NOT Provided
//!
//! - Encryption of document values (only the keyword → document binding is hidden)
//! - Multiple documents per keyword

#![deny(unsafe_code)]

mod aead;
mod error;

pub mod entry;
pub mod kdf;
pub mod keys;

pub use entry::{open_entry, seal_entry};
pub use error::{KeyParseError, OpenError, SealError};
pub use kdf::{blind_label, derive_master_secret, derive_subkeys, DEFAULT_ITERATIONS};
pub use keys::{BlindLabel, EncryptKey, IndexKey, Keyword, MasterSecret, SubkeyPair, KEY_BYTES};

/// Library version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
