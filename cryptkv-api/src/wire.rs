//! Wire protocol: request/response bodies and the stable result-code space.
//!
//! Subkeys travel as lowercase hex of their 32 bytes. `ok`/`code` carry the
//! protocol outcome; transport problems (bad JSON, bad hex, timeouts) never
//! appear as codes.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Result codes (part of the wire contract; never renumber)
// ---------------------------------------------------------------------------

pub mod codes {
    /// Put: `ok=true` always carries [`put::OK`].
    pub mod put {
        pub const OK: u32 = 0;
        pub const LOOKUP_FAILED: u32 = 0;
        pub const DECRYPT_FAILED: u32 = 1;
        pub const DELETE_OLD_FAILED: u32 = 2;
        pub const WRITE_FAILED: u32 = 3;
        pub const INDEX_WRITE_FAILED: u32 = 4;
    }

    pub mod get {
        pub const OK: u32 = 0;
        pub const NO_INDEX: u32 = 0;
        pub const DECRYPT_FAILED: u32 = 1;
        pub const DOCUMENT_MISSING: u32 = 2;
    }

    pub mod delete {
        pub const OK: u32 = 0;
        pub const NO_INDEX: u32 = 0;
        pub const DECRYPT_FAILED: u32 = 1;
        pub const DOCUMENT_DELETE_FAILED: u32 = 2;
        pub const INDEX_DELETE_FAILED: u32 = 3;
    }
}

/// Route paths.
pub const PUT_PATH: &str = "/api/put";
pub const GET_PATH: &str = "/api/get";
pub const DELETE_PATH: &str = "/api/delete";
pub const HEALTH_PATH: &str = "/health";

// ---------------------------------------------------------------------------
// Put
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PutRequest {
    pub document_key: String,
    pub document_value: String,
    pub index_key: String,
    pub encrypt_key: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PutResponse {
    pub ok: bool,
    pub code: u32,
}

impl PutResponse {
    pub fn success() -> Self {
        Self { ok: true, code: codes::put::OK }
    }

    pub fn failure(code: u32) -> Self {
        Self { ok: false, code }
    }
}

// ---------------------------------------------------------------------------
// Get
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetRequest {
    pub index_key: String,
    pub encrypt_key: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetResponse {
    pub ok: bool,
    pub code: u32,
    #[serde(default)]
    pub document_key: String,
    #[serde(default)]
    pub document_value: String,
}

/// Client-side reading of a get response.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GetStatus {
    Found,
    NoIndex,
    DecryptFailed,
    /// Index entry present but its document is gone.
    DocumentMissing,
    Unknown(u32),
}

impl GetResponse {
    pub fn found(document_key: String, document_value: String) -> Self {
        Self {
            ok: true,
            code: codes::get::OK,
            document_key,
            document_value,
        }
    }

    pub fn miss(code: u32) -> Self {
        Self {
            ok: false,
            code,
            document_key: String::new(),
            document_value: String::new(),
        }
    }

    pub fn status(&self) -> GetStatus {
        if self.ok {
            return GetStatus::Found;
        }
        match self.code {
            codes::get::NO_INDEX => GetStatus::NoIndex,
            codes::get::DECRYPT_FAILED => GetStatus::DecryptFailed,
            codes::get::DOCUMENT_MISSING => GetStatus::DocumentMissing,
            other => GetStatus::Unknown(other),
        }
    }
}

// ---------------------------------------------------------------------------
// Delete
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteRequest {
    pub index_key: String,
    pub encrypt_key: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub ok: bool,
    pub code: u32,
}

impl DeleteResponse {
    pub fn success() -> Self {
        Self { ok: true, code: codes::delete::OK }
    }

    pub fn failure(code: u32) -> Self {
        Self { ok: false, code }
    }

    /// The keyword had no binding visible to the supplied keys.
    pub fn is_not_found(&self) -> bool {
        !self.ok
            && matches!(self.code, codes::delete::NO_INDEX | codes::delete::DECRYPT_FAILED)
    }
}
