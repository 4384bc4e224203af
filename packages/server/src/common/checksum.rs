//! Canonical result serialization and integrity checksums.
//!
//! A submitted result is serialized deterministically (object keys
//! sorted, no insignificant whitespace) and digested with SHA-256. The
//! hex digest must match the checksum the node claims, byte for byte.

use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::common::error::ApiError;

/// Serialize a result payload into its canonical form.
///
/// `serde_json` backs objects with a `BTreeMap`, so key order in the
/// encoded form is sorted regardless of how the payload arrived.
pub fn canonicalize(payload: &Value) -> Result<String, ApiError> {
    serde_json::to_string(payload)
        .map_err(|e| ApiError::Validation(format!("payload cannot be canonically serialized: {e}")))
}

/// SHA-256 hex digest of the canonical serialization.
pub fn result_checksum(payload: &Value) -> Result<String, ApiError> {
    let canonical = canonicalize(payload)?;
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}
