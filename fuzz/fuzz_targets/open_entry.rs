#![no_main]

use cryptkv::{blind_label, derive_master_secret, derive_subkeys, BlindLabel, EncryptKey, Keyword};
use libfuzzer_sys::fuzz_target;
use once_cell::sync::Lazy;

static KEYS: Lazy<(EncryptKey, BlindLabel)> = Lazy::new(|| {
    let master = derive_master_secret(b"fuzz", b"salt", 1);
    let pair = derive_subkeys(&Keyword::from("fuzz"), &master);
    let label = blind_label(&pair.index_key);
    (pair.encrypt_key, label)
});

fuzz_target!(|data: &[u8]| {
    let (key, label) = &*KEYS;

    let _ = cryptkv::entry::decode_entry(data);
    let _ = cryptkv::open_entry(key, label, data);
});
