//! Optional RSA-PSS signing and verification over canonical bytes.
//!
//! Signatures are evidence, not prerequisites: the engine never requires one
//! to proceed, and the hostile verifier treats an absent signature as a
//! warning, not an error. Salt length is fixed at zero so that repeated
//! signatures over the same bytes and key are bit-identical — the `rsa`
//! crate's PSS signing API still asks for an RNG, so we hand it a ChaCha20
//! stream seeded from the signing key's public modulus; with salt length 0
//! the RNG is never actually drawn from, so this is a shape requirement, not
//! a source of nondeterminism.

use rand_chacha::ChaCha20Rng;
use rand_core::SeedableRng;
use rsa::pss::{Signature, SigningKey, VerifyingKey};
use rsa::sha2::Sha256;
use rsa::signature::{RandomizedSigner, SignatureEncoding, Verifier};
use rsa::{RsaPrivateKey, RsaPublicKey};

use crate::{IoError, IoResult};

/// Signs canonical bytes with a fixed, zero-length PSS salt.
pub struct Signer {
    key: SigningKey<Sha256>,
    seed: [u8; 32],
}

impl Signer {
    pub fn new(private_key: RsaPrivateKey) -> Self {
        let mut seed = [0u8; 32];
        let n_bytes = private_key.to_public_key().n().to_bytes_be();
        let take = n_bytes.len().min(32);
        seed[..take].copy_from_slice(&n_bytes[..take]);
        Self { key: SigningKey::<Sha256>::new_with_salt_len(private_key, 0), seed }
    }

    /// Sign `bytes`, returning raw PSS signature bytes.
    pub fn sign(&self, bytes: &[u8]) -> IoResult<Vec<u8>> {
        let mut rng = ChaCha20Rng::from_seed(self.seed);
        let sig: Signature = self
            .key
            .try_sign_with_rng(&mut rng, bytes)
            .map_err(|e| IoError::Sign(e.to_string()))?;
        Ok(sig.to_vec())
    }
}

/// Verifies PSS signatures against a public key; trusts nothing else.
pub struct SignatureVerifier {
    key: VerifyingKey<Sha256>,
}

impl SignatureVerifier {
    pub fn new(public_key: RsaPublicKey) -> Self {
        Self { key: VerifyingKey::<Sha256>::new_with_salt_len(public_key, 0) }
    }

    pub fn verify(&self, bytes: &[u8], signature: &[u8]) -> IoResult<()> {
        let sig = Signature::try_from(signature).map_err(|e| IoError::Sign(e.to_string()))?;
        self.key
            .verify(bytes, &sig)
            .map_err(|_| IoError::Sign("signature does not verify".to_string()))
    }
}
