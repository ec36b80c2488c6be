//! Ingest manifest loader.
//!
//! The manifest is an asset list: each entry names a `content_address`,
//! a local `path`, the `hash` and `size` it's expected to have, and opaque
//! `metadata`. `ingest_timestamp` is not part of the on-disk manifest — it is
//! derived by the engine from the execution context's `base_time`, never
//! read from the manifest or the wall clock.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::hasher::{is_hex64, sha256_file};
use crate::{IoError, IoResult};

/// Manifests larger than this are rejected outright, before parsing.
pub const MAX_MANIFEST_BYTES: u64 = 4 * 1024 * 1024;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Asset {
    pub content_address: String,
    pub path: String,
    pub hash: String,
    pub size: u64,
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    pub assets: Vec<Asset>,
}

/// An asset resolved against a base directory, ready for digest verification.
#[derive(Clone, Debug)]
pub struct ResolvedAsset {
    pub asset: Asset,
    pub absolute_path: PathBuf,
}

/// Shape and offline-policy checks that require no I/O: every path must be
/// local (no URL scheme), every hash must be lowercase 64-hex, and the
/// advertised `content_address` must be consistent with `hash`.
pub fn validate_manifest(manifest: &Manifest) -> IoResult<()> {
    if manifest.assets.is_empty() {
        return Err(IoError::Invalid("manifest has no assets".to_string()));
    }
    for asset in &manifest.assets {
        if crate::looks_like_url_strict(&asset.path) {
            return Err(IoError::Invalid(format!("asset path looks like a URL: {}", asset.path)));
        }
        if !is_hex64(&asset.hash) {
            return Err(IoError::Invalid(format!("asset hash is not lowercase 64-hex: {}", asset.hash)));
        }
        let addr_digest = asset.content_address.split('.').next().unwrap_or("");
        if addr_digest != asset.hash {
            return Err(IoError::Invalid(format!(
                "content_address digest does not match hash for {}",
                asset.path
            )));
        }
    }
    Ok(())
}

/// Join each asset's `path` under `base_dir` and confirm the file exists.
pub fn resolve_paths(manifest: &Manifest, base_dir: &Path) -> IoResult<Vec<ResolvedAsset>> {
    manifest
        .assets
        .iter()
        .map(|asset| {
            let absolute_path = base_dir.join(&asset.path);
            let meta = std::fs::metadata(&absolute_path)
                .map_err(|e| IoError::Path(format!("{}: {e}", absolute_path.display())))?;
            if !meta.is_file() {
                return Err(IoError::Path(format!("not a file: {}", absolute_path.display())));
            }
            Ok(ResolvedAsset { asset: asset.clone(), absolute_path })
        })
        .collect()
}

/// Verify each resolved asset's on-disk bytes hash to the manifest's declared `hash`
/// and `size`. Returns the first mismatch found.
pub fn verify_digests(resolved: &[ResolvedAsset]) -> IoResult<()> {
    for r in resolved {
        let meta = std::fs::metadata(&r.absolute_path)?;
        if meta.len() != r.asset.size {
            return Err(IoError::Invalid(format!(
                "size mismatch for {}: expected {}, found {}",
                r.asset.path, r.asset.size, meta.len()
            )));
        }
        let actual = sha256_file(&r.absolute_path)?;
        if actual != r.asset.hash {
            return Err(IoError::Invalid(format!(
                "hash mismatch for {}: expected {}, found {actual}",
                r.asset.path, r.asset.hash
            )));
        }
    }
    Ok(())
}

/// Parse manifest bytes, enforcing the size cap before touching serde.
pub fn parse_manifest(bytes: &[u8]) -> IoResult<Manifest> {
    if bytes.len() as u64 > MAX_MANIFEST_BYTES {
        return Err(IoError::Invalid(format!(
            "manifest exceeds {MAX_MANIFEST_BYTES} bytes"
        )));
    }
    Ok(serde_json::from_slice(bytes)?)
}

/// Load, parse, shape-validate, resolve, and digest-verify a manifest in one call.
pub fn load_verify_manifest(path: &Path, base_dir: &Path) -> IoResult<Vec<ResolvedAsset>> {
    let bytes = std::fs::read(path)?;
    let manifest = parse_manifest(&bytes)?;
    validate_manifest(&manifest)?;
    let resolved = resolve_paths(&manifest, base_dir)?;
    verify_digests(&resolved)?;
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn asset(content_address: &str, hash: &str, path: &str, size: u64) -> Asset {
        Asset {
            content_address: content_address.to_string(),
            path: path.to_string(),
            hash: hash.to_string(),
            size,
            metadata: BTreeMap::new(),
        }
    }

    const ABC_HASH: &str = "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad";

    #[test]
    fn validate_rejects_url_paths() {
        let m = Manifest { assets: vec![asset(ABC_HASH, ABC_HASH, "https://example.com/a", 3)] };
        assert!(validate_manifest(&m).is_err());
    }

    #[test]
    fn validate_rejects_content_address_hash_mismatch() {
        let other = "0".repeat(64);
        let m = Manifest { assets: vec![asset(&other, ABC_HASH, "a.bin", 3)] };
        assert!(validate_manifest(&m).is_err());
    }

    #[test]
    fn end_to_end_digest_verification() {
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("a.bin");
        let mut f = std::fs::File::create(&file_path).unwrap();
        f.write_all(b"abc").unwrap();
        drop(f);

        let m = Manifest { assets: vec![asset(ABC_HASH, ABC_HASH, "a.bin", 3)] };
        validate_manifest(&m).unwrap();
        let resolved = resolve_paths(&m, dir.path()).unwrap();
        verify_digests(&resolved).unwrap();
    }
}
