//! Deterministic time derivation.
//!
//! No module in this crate or in `mtb_engine` may consult a wall clock.
//! Every timestamp is `base_time + seq * DELTA_MILLIS`, where `base_time` is
//! either supplied by the caller or derived once from the DAG fingerprint.

/// Fixed tick interval between successive evidence events, in milliseconds.
pub const DELTA_MILLIS: u64 = 1;

/// A single deterministic instant, expressed as milliseconds since the Unix
/// epoch. Never read from the system clock.
#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimeBase(pub u64);

impl TimeBase {
    /// Construct directly from caller-supplied epoch milliseconds.
    pub fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    /// `epoch + (fingerprint mod 2^31) seconds`, taking the low 31 bits of
    /// the fingerprint's first 8 bytes as an unsigned integer.
    ///
    /// `fingerprint_bytes` is the raw SHA-256 digest of the DAG fingerprint
    /// (not its hex encoding); callers in `mtb_dag`/`mtb_engine` hash first
    /// and pass the bytes in here.
    pub fn derive_from_fingerprint(fingerprint_bytes: &[u8]) -> Self {
        let mut buf = [0u8; 8];
        let n = fingerprint_bytes.len().min(8);
        buf[..n].copy_from_slice(&fingerprint_bytes[..n]);
        let raw = u64::from_be_bytes(buf);
        let seconds = raw % (1u64 << 31);
        Self(seconds * 1000)
    }

    /// The timestamp of the `seq`-th evidence event recorded against this base.
    pub fn timestamp_for_seq(&self, seq: u64) -> u64 {
        self.0 + seq * DELTA_MILLIS
    }
}
