//! Strip, hash, reinsert. The one operation that turns an assembled `Mtb`
//! into a bundle the hostile verifier can trust down to the byte.

use mtb_engine::recorder::IntegrityProof;
use mtb_io::canonical::canonical_bytes;
use mtb_io::hasher::sha256_hex;

use crate::model::Mtb;
use crate::BundleError;

/// Remove any existing proof, canonicalize, hash, and reinsert.
pub fn seal(mut mtb: Mtb) -> Result<Mtb, BundleError> {
    mtb.integrity_proof = None;
    let bytes = canonical_bytes(&mtb)?;
    let hash = sha256_hex(&bytes);
    mtb.integrity_proof = Some(IntegrityProof { alg: "sha256".to_string(), hash });
    Ok(mtb)
}

/// Strip the proof, recompute, compare. Any divergence (or absence of a
/// proof at all) is `SealMismatch`.
pub fn verify_seal(mtb: &Mtb) -> Result<(), BundleError> {
    let proof = mtb.integrity_proof.as_ref().ok_or(BundleError::SealMismatch)?;
    let mut unsealed = mtb.clone();
    unsealed.integrity_proof = None;
    let bytes = canonical_bytes(&unsealed)?;
    let recomputed = sha256_hex(&bytes);
    if recomputed == proof.hash {
        Ok(())
    } else {
        Err(BundleError::SealMismatch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::minimal_mtb;

    #[test]
    fn seal_then_verify_round_trips() {
        let mtb = seal(minimal_mtb()).unwrap();
        verify_seal(&mtb).unwrap();
    }

    #[test]
    fn tampering_after_seal_breaks_verification() {
        let mut mtb = seal(minimal_mtb()).unwrap();
        mtb.archive_declaration = Some(crate::model::ArchiveDeclaration {
            declared_at: 1,
            statement: "tampered".to_string(),
            signature: None,
        });
        assert!(matches!(verify_seal(&mtb), Err(BundleError::SealMismatch)));
    }

    #[test]
    fn unsealed_mtb_fails_verification() {
        let mtb = minimal_mtb();
        assert!(matches!(verify_seal(&mtb), Err(BundleError::SealMismatch)));
    }
}
