//! Content addresses: `sha256hex[.ext]`, the only legitimate handle to an artifact.

use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

fn is_lower_hex_64(s: &str) -> bool {
    s.len() == 64 && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

/// A lowercase hex SHA-256 digest, optionally suffixed with `.<ext>`.
///
/// Equality of `ContentAddress` implies equality of content; this type never
/// stores bytes itself, only the handle.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "String", into = "String"))]
pub struct ContentAddress {
    digest: String,
    ext: Option<String>,
}

impl ContentAddress {
    /// Build a bare address from a hex digest, with no extension.
    pub fn from_digest(digest: impl Into<String>) -> Result<Self, CoreError> {
        let digest = digest.into();
        if !is_lower_hex_64(&digest) {
            return Err(CoreError::InvalidAddress(digest));
        }
        Ok(Self { digest, ext: None })
    }

    /// Build an address with an explicit extension, e.g. `"wav"`.
    pub fn with_extension(digest: impl Into<String>, ext: impl Into<String>) -> Result<Self, CoreError> {
        let mut a = Self::from_digest(digest)?;
        a.ext = Some(ext.into());
        Ok(a)
    }

    pub fn digest(&self) -> &str {
        &self.digest
    }

    pub fn extension(&self) -> Option<&str> {
        self.ext.as_deref()
    }
}

impl fmt::Display for ContentAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.ext {
            Some(ext) => write!(f, "{}.{}", self.digest, ext),
            None => write!(f, "{}", self.digest),
        }
    }
}

impl FromStr for ContentAddress {
    type Err = CoreError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('.') {
            Some((digest, ext)) if is_lower_hex_64(digest) && !ext.is_empty() => {
                Ok(Self { digest: digest.to_string(), ext: Some(ext.to_string()) })
            }
            _ if is_lower_hex_64(s) => Ok(Self { digest: s.to_string(), ext: None }),
            _ => Err(CoreError::InvalidAddress(s.to_string())),
        }
    }
}

impl TryFrom<String> for ContentAddress {
    type Error = CoreError;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<ContentAddress> for String {
    fn from(a: ContentAddress) -> String {
        a.to_string()
    }
}
