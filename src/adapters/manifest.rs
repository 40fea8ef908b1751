//! Model directory integrity: SHA-256 manifest and Ed25519 signature.
//!
//! A model directory may carry:
//! - `manifest.json`: the SHA-256 of every bound file
//! - `model.sig`: a detached Ed25519 signature over the raw manifest bytes
//!
//! When a verifying key is configured both files are mandatory. Without a
//! key, a present manifest is still checked for hash mismatches so that a
//! truncated or swapped `model.json` fails at startup instead of producing
//! predictions.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use base64::Engine;
use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::config::{IntegrityPolicy, PUBKEY_B64_ENV};

pub const MANIFEST_FILE: &str = "manifest.json";
pub const SIGNATURE_FILE: &str = "model.sig";
pub const MODEL_FILE: &str = "model.json";

const MANIFEST_VERSION: u32 = 1;

/// Clock skew tolerated for `created_at`, in seconds.
const MAX_FUTURE_SKEW_SECS: i64 = 300;

#[derive(Debug, Error)]
pub enum IntegrityError {
    #[error("{0} is required but missing")]
    Missing(String),

    #[error("Signed model required but no verifying key configured (set DIABSCREEN_MODEL_PUBKEY_B64 or DIABSCREEN_MODEL_PUBKEY_FILE)")]
    NoVerifyingKey,

    #[error("Invalid verifying key: {0}")]
    InvalidKey(String),

    #[error("Model signature does not verify")]
    BadSignature,

    #[error("Invalid manifest: {0}")]
    InvalidManifest(String),

    #[error("File hash mismatch for {0}")]
    HashMismatch(String),

    #[error("IO error on {path}: {reason}")]
    Io { path: String, reason: String },
}

/// Contents of `manifest.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelManifest {
    pub version: u32,
    /// Unix timestamp (seconds) when the manifest was written.
    pub created_at: i64,
    /// Relative file name -> lowercase hex SHA-256.
    pub files: BTreeMap<String, String>,
}

impl ModelManifest {
    /// Hash the named files inside `dir` into a fresh manifest.
    ///
    /// # Errors
    /// Returns error if a file cannot be read.
    pub fn for_files(dir: &Path, names: &[&str]) -> Result<Self, IntegrityError> {
        let mut files = BTreeMap::new();
        for name in names {
            let bytes = read_file(&dir.join(name))?;
            files.insert((*name).to_string(), sha256_hex(&bytes));
        }
        Ok(Self {
            version: MANIFEST_VERSION,
            created_at: chrono::Utc::now().timestamp(),
            files,
        })
    }

    /// Whether the manifest covers `model.json`.
    #[must_use]
    pub fn binds_model(&self) -> bool {
        self.files.contains_key(MODEL_FILE)
    }
}

#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

fn read_file(path: &Path) -> Result<Vec<u8>, IntegrityError> {
    fs::read(path).map_err(|e| IntegrityError::Io {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

// Constant-time compare for ASCII strings (SHA-256 hex digests).
fn constant_time_eq_str(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff: u8 = 0;
    for (x, y) in a.as_bytes().iter().zip(b.as_bytes().iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

/// Decode a base64 Ed25519 verifying key.
///
/// # Errors
/// Returns `IntegrityError::InvalidKey` on bad base64 or wrong length.
pub fn verifying_key_from_b64(b64: &str) -> Result<VerifyingKey, IntegrityError> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(b64.trim())
        .map_err(|_| IntegrityError::InvalidKey("not valid base64".into()))?;
    let raw: [u8; 32] = bytes.as_slice().try_into().map_err(|_| {
        IntegrityError::InvalidKey(format!("expected 32 bytes, got {}", bytes.len()))
    })?;
    VerifyingKey::from_bytes(&raw).map_err(|_| IntegrityError::InvalidKey("not a curve point".into()))
}

fn configured_key(policy: &IntegrityPolicy) -> Result<Option<VerifyingKey>, IntegrityError> {
    if let Some(b64) = &policy.verifying_key_b64 {
        return verifying_key_from_b64(b64).map(Some);
    }
    if let Some(path) = &policy.verifying_key_file {
        let content = read_file(path)?;
        let b64 = String::from_utf8_lossy(&content);
        return verifying_key_from_b64(&b64).map(Some);
    }
    Ok(None)
}

fn check_manifest(base_dir: &Path, manifest: &ModelManifest) -> Result<(), IntegrityError> {
    if manifest.version != MANIFEST_VERSION {
        return Err(IntegrityError::InvalidManifest(format!(
            "unsupported version {}",
            manifest.version
        )));
    }

    let now = chrono::Utc::now().timestamp();
    if manifest.created_at > now + MAX_FUTURE_SKEW_SECS {
        return Err(IntegrityError::InvalidManifest(
            "created_at is in the future".into(),
        ));
    }

    if !manifest.binds_model() {
        return Err(IntegrityError::InvalidManifest(format!(
            "manifest must include {MODEL_FILE}"
        )));
    }

    for (rel, expected_hex) in &manifest.files {
        // Only plain file names: the manifest must not point outside the directory.
        if rel.contains('/') || rel.contains('\\') || rel == ".." {
            return Err(IntegrityError::InvalidManifest(format!(
                "file entry {rel:?} is not a plain file name"
            )));
        }
        let actual_hex = sha256_hex(&read_file(&base_dir.join(rel))?);
        if !constant_time_eq_str(&actual_hex, &expected_hex.to_ascii_lowercase()) {
            return Err(IntegrityError::HashMismatch(rel.clone()));
        }
    }

    Ok(())
}

fn parse_manifest(bytes: &[u8]) -> Result<ModelManifest, IntegrityError> {
    serde_json::from_slice(bytes).map_err(|e| IntegrityError::InvalidManifest(e.to_string()))
}

/// Verify a model directory according to `policy`.
///
/// Returns the checked manifest, or `None` when the directory is unsigned
/// and the policy allows it.
///
/// # Errors
/// Returns `IntegrityError` when a required file is missing, the signature
/// does not verify, or any bound file's hash differs.
pub fn verify_model_dir(
    model_dir: &Path,
    policy: &IntegrityPolicy,
) -> Result<Option<ModelManifest>, IntegrityError> {
    let manifest_path = model_dir.join(MANIFEST_FILE);
    let sig_path = model_dir.join(SIGNATURE_FILE);

    let Some(key) = configured_key(policy)? else {
        if policy.require_signed {
            return Err(IntegrityError::NoVerifyingKey);
        }
        if !manifest_path.exists() {
            tracing::warn!(
                "Loading UNSIGNED model from {:?}; set {} to enforce signatures",
                model_dir,
                PUBKEY_B64_ENV
            );
            return Ok(None);
        }

        tracing::warn!("No verifying key configured; checking manifest hashes only");
        let manifest = parse_manifest(&read_file(&manifest_path)?)?;
        check_manifest(model_dir, &manifest)?;
        return Ok(Some(manifest));
    };

    if !manifest_path.exists() {
        return Err(IntegrityError::Missing(manifest_path.display().to_string()));
    }
    if !sig_path.exists() {
        return Err(IntegrityError::Missing(sig_path.display().to_string()));
    }

    let sig_bytes = read_file(&sig_path)?;
    let sig_raw: [u8; 64] = sig_bytes
        .as_slice()
        .try_into()
        .map_err(|_| IntegrityError::BadSignature)?;
    let signature = Signature::from_bytes(&sig_raw);

    let manifest_bytes = read_file(&manifest_path)?;
    key.verify(&manifest_bytes, &signature)
        .map_err(|_| IntegrityError::BadSignature)?;

    let manifest = parse_manifest(&manifest_bytes)?;
    check_manifest(model_dir, &manifest)?;

    tracing::info!(
        "Model signature and hashes verified ({} files)",
        manifest.files.len()
    );
    Ok(Some(manifest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::{Signer, SigningKey};
    use rand::RngCore;
    use tempfile::tempdir;

    fn signing_key() -> SigningKey {
        let mut seed = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut seed);
        SigningKey::from_bytes(&seed)
    }

    fn policy_for(key: &SigningKey) -> IntegrityPolicy {
        IntegrityPolicy {
            verifying_key_b64: Some(
                base64::engine::general_purpose::STANDARD.encode(key.verifying_key().to_bytes()),
            ),
            ..IntegrityPolicy::default()
        }
    }

    fn write_signed_dir(dir: &Path, key: &SigningKey) {
        fs::write(dir.join(MODEL_FILE), br#"{"placeholder":true}"#).expect("write model");
        let manifest = ModelManifest::for_files(dir, &[MODEL_FILE]).expect("manifest");
        let bytes = serde_json::to_vec_pretty(&manifest).expect("serialize");
        fs::write(dir.join(MANIFEST_FILE), &bytes).expect("write manifest");
        let sig: Signature = key.sign(&bytes);
        fs::write(dir.join(SIGNATURE_FILE), sig.to_bytes()).expect("write sig");
    }

    #[test]
    fn test_signed_dir_verifies() {
        let temp = tempdir().expect("tempdir");
        let key = signing_key();
        write_signed_dir(temp.path(), &key);

        let manifest = verify_model_dir(temp.path(), &policy_for(&key))
            .expect("verify")
            .expect("manifest");
        assert!(manifest.binds_model());
    }

    #[test]
    fn test_wrong_key_is_rejected() {
        let temp = tempdir().expect("tempdir");
        write_signed_dir(temp.path(), &signing_key());

        let err = verify_model_dir(temp.path(), &policy_for(&signing_key())).unwrap_err();
        assert!(matches!(err, IntegrityError::BadSignature));
    }

    #[test]
    fn test_tampered_model_is_rejected() {
        let temp = tempdir().expect("tempdir");
        let key = signing_key();
        write_signed_dir(temp.path(), &key);
        fs::write(temp.path().join(MODEL_FILE), b"{}").expect("tamper");

        let err = verify_model_dir(temp.path(), &policy_for(&key)).unwrap_err();
        assert!(matches!(err, IntegrityError::HashMismatch(name) if name == MODEL_FILE));
    }

    #[test]
    fn test_key_requires_signature_file() {
        let temp = tempdir().expect("tempdir");
        let key = signing_key();
        write_signed_dir(temp.path(), &key);
        fs::remove_file(temp.path().join(SIGNATURE_FILE)).expect("remove sig");

        let err = verify_model_dir(temp.path(), &policy_for(&key)).unwrap_err();
        assert!(matches!(err, IntegrityError::Missing(_)));
    }

    #[test]
    fn test_unsigned_dir_allowed_without_key() {
        let temp = tempdir().expect("tempdir");
        fs::write(temp.path().join(MODEL_FILE), b"{}").expect("write model");

        let result = verify_model_dir(temp.path(), &IntegrityPolicy::default()).expect("allowed");
        assert!(result.is_none());
    }

    #[test]
    fn test_require_signed_without_key_fails() {
        let temp = tempdir().expect("tempdir");
        let policy = IntegrityPolicy {
            require_signed: true,
            ..IntegrityPolicy::default()
        };
        let err = verify_model_dir(temp.path(), &policy).unwrap_err();
        assert!(matches!(err, IntegrityError::NoVerifyingKey));
    }

    #[test]
    fn test_manifest_hashes_checked_without_key() {
        let temp = tempdir().expect("tempdir");
        write_signed_dir(temp.path(), &signing_key());
        assert!(verify_model_dir(temp.path(), &IntegrityPolicy::default())
            .expect("hashes match")
            .is_some());

        fs::write(temp.path().join(MODEL_FILE), b"{}").expect("tamper");
        let err = verify_model_dir(temp.path(), &IntegrityPolicy::default()).unwrap_err();
        assert!(matches!(err, IntegrityError::HashMismatch(_)));
    }

    #[test]
    fn test_manifest_must_bind_model() {
        let temp = tempdir().expect("tempdir");
        fs::write(temp.path().join("notes.txt"), b"hi").expect("write");
        let manifest = ModelManifest::for_files(temp.path(), &["notes.txt"]).expect("manifest");
        fs::write(
            temp.path().join(MANIFEST_FILE),
            serde_json::to_vec(&manifest).expect("serialize"),
        )
        .expect("write manifest");

        let err = verify_model_dir(temp.path(), &IntegrityPolicy::default()).unwrap_err();
        assert!(matches!(err, IntegrityError::InvalidManifest(_)));
    }

    fn write_manifest(dir: &Path, manifest: &ModelManifest) {
        fs::write(
            dir.join(MANIFEST_FILE),
            serde_json::to_vec(manifest).expect("serialize"),
        )
        .expect("write manifest");
    }

    #[test]
    fn test_future_manifest_is_rejected() {
        let temp = tempdir().expect("tempdir");
        fs::write(temp.path().join(MODEL_FILE), b"{}").expect("write model");
        let mut manifest = ModelManifest::for_files(temp.path(), &[MODEL_FILE]).expect("manifest");

        manifest.created_at += 60;
        write_manifest(temp.path(), &manifest);
        assert!(verify_model_dir(temp.path(), &IntegrityPolicy::default()).is_ok());

        manifest.created_at += 3600;
        write_manifest(temp.path(), &manifest);
        let err = verify_model_dir(temp.path(), &IntegrityPolicy::default()).unwrap_err();
        assert!(matches!(err, IntegrityError::InvalidManifest(_)));
    }

    #[test]
    fn test_manifest_entries_must_be_plain_file_names() {
        let temp = tempdir().expect("tempdir");
        fs::write(temp.path().join(MODEL_FILE), b"{}").expect("write model");
        let mut manifest = ModelManifest::for_files(temp.path(), &[MODEL_FILE]).expect("manifest");
        manifest
            .files
            .insert("../outside.json".into(), sha256_hex(b"{}"));
        write_manifest(temp.path(), &manifest);

        let err = verify_model_dir(temp.path(), &IntegrityPolicy::default()).unwrap_err();
        assert!(matches!(err, IntegrityError::InvalidManifest(_)));
    }

    #[test]
    fn test_invalid_key_base64() {
        assert!(verifying_key_from_b64("!!!").is_err());
        assert!(verifying_key_from_b64("AAAA").is_err());
    }
}
