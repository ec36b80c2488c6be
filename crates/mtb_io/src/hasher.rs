//! Hashing over raw bytes and canonical JSON.
//!
//! `hash(bytes)` returns lowercase hex SHA-256 by default, SHA-512 on request.
//! `content_address(path)` hashes file contents streaming in fixed-size chunks;
//! the chunk size is an implementation constant and does not affect the hash.

#![forbid(unsafe_code)]

use crate::{IoError, IoResult};

#[cfg(feature = "hash")]
use digest::Digest;
#[cfg(feature = "hash")]
use sha2::{Sha256, Sha512};

#[cfg(feature = "hash")]
use crate::canonical::canonical_bytes;
#[cfg(feature = "hash")]
use serde::Serialize;

const CHUNK_SIZE: usize = 64 * 1024;

/// Lowercase 64-hex SHA-256 of raw bytes.
#[cfg(feature = "hash")]
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

#[cfg(not(feature = "hash"))]
pub fn sha256_hex(_bytes: &[u8]) -> String {
    String::new()
}

/// Lowercase 128-hex SHA-512 of raw bytes.
#[cfg(feature = "hash")]
pub fn sha512_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha512::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Streaming SHA-256 for any reader, in fixed-size chunks; returns lowercase 64-hex.
#[cfg(feature = "hash")]
pub fn sha256_stream<R: std::io::Read>(reader: &mut R) -> IoResult<String> {
    let mut hasher = Sha256::new();
    let mut buf = [0u8; CHUNK_SIZE];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

#[cfg(not(feature = "hash"))]
pub fn sha256_stream<R: std::io::Read>(_reader: &mut R) -> IoResult<String> {
    Err(IoError::Hash("hash feature disabled".into()))
}

/// SHA-256 of a value's canonical JSON representation; returns lowercase 64-hex.
#[cfg(feature = "hash")]
pub fn sha256_canonical<T: Serialize>(value: &T) -> IoResult<String> {
    let bytes = canonical_bytes(value)?;
    Ok(sha256_hex(&bytes))
}

#[cfg(not(feature = "hash"))]
pub fn sha256_canonical<T>(_value: &T) -> IoResult<String> {
    Err(IoError::Hash("hash feature disabled".into()))
}

/// Hash a file from disk, streaming; returns lowercase 64-hex.
#[cfg(feature = "hash")]
pub fn sha256_file<P: AsRef<std::path::Path>>(path: P) -> IoResult<String> {
    let mut f = std::fs::File::open(path)?;
    sha256_stream(&mut f)
}

#[cfg(not(feature = "hash"))]
pub fn sha256_file<P: AsRef<std::path::Path>>(_path: P) -> IoResult<String> {
    Err(IoError::Hash("hash feature disabled".into()))
}

/// Compute a content address for a file on disk: the SHA-256 hex of its bytes,
/// suffixed with `.<ext>` when the path carries a recognizable extension.
#[cfg(feature = "hash")]
pub fn content_address<P: AsRef<std::path::Path>>(path: P) -> IoResult<String> {
    let path = path.as_ref();
    let digest = sha256_file(path)?;
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if !ext.is_empty() => Ok(format!("{digest}.{ext}")),
        _ => Ok(digest),
    }
}

#[cfg(not(feature = "hash"))]
pub fn content_address<P: AsRef<std::path::Path>>(_path: P) -> IoResult<String> {
    Err(IoError::Hash("hash feature disabled".into()))
}

/// True iff string is lowercase 64-hex.
pub fn is_hex64(s: &str) -> bool {
    s.len() == 64 && s.as_bytes().iter().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

/// Return a short prefix of a 64-hex string (1..=64). Errors if non-hex or out of range.
pub fn short_hex(full_hex: &str, len: usize) -> IoResult<String> {
    if !(1..=64).contains(&len) {
        return Err(IoError::Hash("short_hex length out of range".into()));
    }
    if !is_hex64(full_hex) {
        return Err(IoError::Hash("short_hex expects lowercase 64-hex".into()));
    }
    Ok(full_hex[..len].to_string())
}

/// Decode a hex string into raw bytes. Used by callers that need the raw
/// digest (e.g. deriving a time base from a fingerprint), not its hex text.
pub fn hex_decode(s: &str) -> IoResult<Vec<u8>> {
    hex::decode(s).map_err(|e| IoError::Hash(format!("invalid hex: {e}")))
}
