mod asymmetric;
mod openssh;

use crate::error::{PayloadSigError, PayloadSigResult};

pub use asymmetric::{PublicKey, SecretKey, MAX_MODULUS_BITS, MIN_MODULUS_BITS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// Algorithm names
pub enum AlgorithmName {
  /// RSASSA-PKCS1-v1_5 over a SHA-256 digest (RFC 8017 section 8.2). Deterministic.
  RsaV1_5Sha256,
}

impl AlgorithmName {
  pub fn as_str(&self) -> &'static str {
    match self {
      AlgorithmName::RsaV1_5Sha256 => "rsa-v1_5-sha256",
    }
  }
}

impl std::fmt::Display for AlgorithmName {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

impl core::str::FromStr for AlgorithmName {
  type Err = PayloadSigError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "rsa-v1_5-sha256" => Ok(Self::RsaV1_5Sha256),
      _ => Err(PayloadSigError::InvalidAlgorithmName(s.to_string())),
    }
  }
}

/// SigningKey trait
pub trait SigningKey {
  fn sign(&self, data: &[u8]) -> PayloadSigResult<Vec<u8>>;
  fn key_id(&self) -> String;
  fn alg(&self) -> AlgorithmName;
}

/// VerifyingKey trait
pub trait VerifyingKey {
  /// Succeeds only if `signature` was made over exactly `data` by the paired private key.
  /// Every failure is reported as [`PayloadSigError::InvalidSignature`].
  fn verify(&self, data: &[u8], signature: &[u8]) -> PayloadSigResult<()>;
  fn key_id(&self) -> String;
  fn alg(&self) -> AlgorithmName;
}
