//! Model signing utility for Diabscreen classifier artifacts.
//!
//! Two subcommands:
//! - `keygen` writes a fresh Ed25519 seed (and optionally its public key)
//! - `sign` writes `manifest.json` and `model.sig` into a model directory
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin sign_model -- keygen --out-seed <path> [--out-pub <path>] [--force]
//! DIABSCREEN_SIGNING_SEED_FILE=<path> cargo run --bin sign_model -- sign <model_dir>
//! ```
//!
//! The printed base64 public key goes into `DIABSCREEN_MODEL_PUBKEY_B64`.

use std::env;
use std::fs;
use std::io::Write;
#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose;
use base64::Engine;
use ed25519_dalek::{Signature, Signer, SigningKey};
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use diabscreen::adapters::manifest::{ModelManifest, MANIFEST_FILE, MODEL_FILE, SIGNATURE_FILE};

const SEED_FILE_ENV: &str = "DIABSCREEN_SIGNING_SEED_FILE";

#[derive(Zeroize, ZeroizeOnDrop)]
struct Seed([u8; 32]);

fn usage() -> String {
    "Usage:\n  sign_model keygen --out-seed <path> [--out-pub <path>] [--force]\n  sign_model sign <model_dir>   (seed read from DIABSCREEN_SIGNING_SEED_FILE)"
        .to_string()
}

fn main() -> Result<(), String> {
    let mut args = env::args().skip(1);
    match args.next().as_deref() {
        Some("keygen") => keygen(args),
        Some("sign") => sign(args),
        Some("-h") | Some("--help") => {
            println!("{}", usage());
            Ok(())
        }
        _ => Err(usage()),
    }
}

fn keygen(mut args: impl Iterator<Item = String>) -> Result<(), String> {
    let mut out_seed_path: Option<PathBuf> = None;
    let mut out_pub_path: Option<PathBuf> = None;
    let mut force = false;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--out-seed" => out_seed_path = Some(args.next().ok_or_else(usage)?.into()),
            "--out-pub" => out_pub_path = Some(args.next().ok_or_else(usage)?.into()),
            "--force" => force = true,
            _ => return Err(format!("Unknown arg: {arg}\n{}", usage())),
        }
    }
    let out_seed_path = out_seed_path.ok_or_else(usage)?;

    for path in std::iter::once(&out_seed_path).chain(out_pub_path.as_ref()) {
        if path.exists() && !force {
            return Err(format!(
                "Refusing to overwrite existing file {path:?}. Use --force."
            ));
        }
    }

    let mut seed = Seed([0u8; 32]);
    OsRng.fill_bytes(&mut seed.0);

    let signing_key = SigningKey::from_bytes(&seed.0);
    let pub_b64 = general_purpose::STANDARD.encode(signing_key.verifying_key().as_bytes());
    let seed_b64 = Zeroizing::new(general_purpose::STANDARD.encode(seed.0));

    // Seed is secret: owner read/write only.
    write_line(&out_seed_path, &seed_b64, 0o600)?;
    println!("Wrote signing seed (base64) to {out_seed_path:?}");

    if let Some(pub_path) = &out_pub_path {
        write_line(pub_path, &pub_b64, 0o644)?;
        println!("Wrote public key (base64) to {pub_path:?}");
    }

    // Print only non-secret material.
    println!("DIABSCREEN_MODEL_PUBKEY_B64={pub_b64}");
    Ok(())
}

fn sign(mut args: impl Iterator<Item = String>) -> Result<(), String> {
    let model_dir = PathBuf::from(args.next().ok_or_else(usage)?);
    if args.next().is_some() {
        return Err(usage());
    }

    // Accept a path to model.json as well as its directory.
    let model_dir = if model_dir.is_file() {
        model_dir
            .parent()
            .ok_or_else(|| "Model path has no parent directory".to_string())?
            .to_path_buf()
    } else {
        model_dir
    };

    if !model_dir.join(MODEL_FILE).exists() {
        return Err(format!("No {MODEL_FILE} found in {model_dir:?}"));
    }

    let seed = read_signing_seed()?;
    let signing_key = SigningKey::from_bytes(&seed.0);

    let manifest = ModelManifest::for_files(&model_dir, &[MODEL_FILE]).map_err(|e| e.to_string())?;
    let manifest_bytes = serde_json::to_vec_pretty(&manifest)
        .map_err(|e| format!("Failed to serialize {MANIFEST_FILE}: {e}"))?;

    let manifest_path = model_dir.join(MANIFEST_FILE);
    fs::write(&manifest_path, &manifest_bytes)
        .map_err(|e| format!("Failed to write {manifest_path:?}: {e}"))?;

    let sig: Signature = signing_key.sign(&manifest_bytes);
    let sig_path = model_dir.join(SIGNATURE_FILE);
    fs::write(&sig_path, sig.to_bytes())
        .map_err(|e| format!("Failed to write {sig_path:?}: {e}"))?;

    println!("Signed manifest: {manifest_path:?}");
    println!("Wrote signature: {sig_path:?}");
    println!(
        "DIABSCREEN_MODEL_PUBKEY_B64={}",
        general_purpose::STANDARD.encode(signing_key.verifying_key().as_bytes())
    );
    Ok(())
}

fn read_signing_seed() -> Result<Seed, String> {
    let path = env::var(SEED_FILE_ENV)
        .map_err(|_| format!("Missing signing seed. Set {SEED_FILE_ENV} to a file written by `sign_model keygen`."))?;

    let content = Zeroizing::new(
        fs::read_to_string(path.trim())
            .map_err(|e| format!("Failed reading signing seed file: {e}"))?,
    );
    let raw = Zeroizing::new(
        general_purpose::STANDARD
            .decode(content.trim())
            .map_err(|e| format!("Invalid base64 in signing seed: {e}"))?,
    );

    if raw.len() != 32 {
        return Err(format!(
            "Signing seed must be 32 bytes after base64 decode (got {})",
            raw.len()
        ));
    }

    let mut seed = Seed([0u8; 32]);
    seed.0.copy_from_slice(&raw);
    Ok(seed)
}

fn write_line(path: &Path, content: &str, mode: u32) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        // Best-effort: the open below reports the real error.
        let _ = fs::create_dir_all(parent);
    }

    let mut opts = fs::OpenOptions::new();
    opts.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        opts.mode(mode);
    }
    #[cfg(not(unix))]
    let _ = mode;

    let mut file = opts
        .open(path)
        .map_err(|e| format!("Failed to open {path:?}: {e}"))?;
    file.write_all(content.as_bytes())
        .and_then(|()| file.write_all(b"\n"))
        .map_err(|e| format!("Failed to write {path:?}: {e}"))
}
