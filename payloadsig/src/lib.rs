//! Asymmetric signatures over opaque byte payloads.
//!
//! Keys are loaded from PEM (PKCS#1, PKCS#8, SubjectPublicKeyInfo) or OpenSSH public key text,
//! and signatures are RSASSA-PKCS1-v1_5 over SHA-256, exchanged as standard base64 over text channels.

mod crypto;
mod error;
mod signature;
mod trace;

/// The signature scheme used by every key in this crate
pub const ALGORITHM: crypto::AlgorithmName = crypto::AlgorithmName::RsaV1_5Sha256;

pub mod prelude {
  pub use crate::{
    crypto::{AlgorithmName, PublicKey, SecretKey, SigningKey, VerifyingKey, MAX_MODULUS_BITS, MIN_MODULUS_BITS},
    error::{PayloadSigError, PayloadSigResult},
    signature::{sign, sign_base64, verify, verify_base64, PayloadSignature},
    ALGORITHM,
  };
}

/* ----------------------------------------------------------------- */
