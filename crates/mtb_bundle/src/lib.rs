//! mtb_bundle — the Master Truth Bundle data model, the Builder that
//! assembles one from a recorded run, the Sealer that binds a canonical
//! integrity proof into it, and the hostile Verifier that checks a bundle
//! from bytes and a public rule set alone.

use thiserror::Error;

pub mod builder;
pub mod model;
pub mod sealer;
pub mod verifier;

#[cfg(test)]
mod test_support;

pub use builder::MtbBuilder;
pub use model::{ArchiveDeclaration, Mtb};
pub use sealer::{seal, verify_seal};
pub use verifier::{MtbVerifier, VerifyReport};

#[derive(Error, Debug)]
pub enum BundleError {
    #[error("bundle seal does not match its contents")]
    SealMismatch,

    #[error("bundle schema is invalid: {0}")]
    SchemaInvalid(String),

    #[error(transparent)]
    Io(#[from] mtb_io::IoError),

    #[error(transparent)]
    Engine(#[from] mtb_engine::EngineError),
}
