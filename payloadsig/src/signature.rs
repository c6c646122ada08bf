use crate::{
  crypto::{SigningKey, VerifyingKey},
  error::{PayloadSigError, PayloadSigResult},
};
use base64::{engine::general_purpose, Engine as _};

/// Raw signature bytes, as long as the signing key's modulus.
/// The text form is standard base64 with padding and no line breaks.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PayloadSignature(Vec<u8>);

impl PayloadSignature {
  pub fn from_bytes(bytes: Vec<u8>) -> Self {
    Self(bytes)
  }

  /// Decode from standard base64
  pub fn from_base64(encoded: &str) -> PayloadSigResult<Self> {
    let bytes = general_purpose::STANDARD.decode(encoded)?;
    Ok(Self(bytes))
  }

  /// Encode to standard base64
  pub fn to_base64(&self) -> String {
    general_purpose::STANDARD.encode(&self.0)
  }

  pub fn as_bytes(&self) -> &[u8] {
    &self.0
  }

  pub fn into_bytes(self) -> Vec<u8> {
    self.0
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }
}

impl AsRef<[u8]> for PayloadSignature {
  fn as_ref(&self) -> &[u8] {
    &self.0
  }
}

impl From<Vec<u8>> for PayloadSignature {
  fn from(bytes: Vec<u8>) -> Self {
    Self(bytes)
  }
}

impl std::fmt::Display for PayloadSignature {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.to_base64())
  }
}

impl core::str::FromStr for PayloadSignature {
  type Err = PayloadSigError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Self::from_base64(s)
  }
}

/* -------------------------------- */
/// Sign a payload
pub fn sign<K: SigningKey + ?Sized>(key: &K, message: &[u8]) -> PayloadSigResult<PayloadSignature> {
  key.sign(message).map(PayloadSignature)
}

/// Verify a payload against its signature
pub fn verify<K: VerifyingKey + ?Sized>(key: &K, message: &[u8], signature: &PayloadSignature) -> PayloadSigResult<()> {
  key.verify(message, signature.as_bytes())
}

/// Sign a payload and return the signature as standard base64
pub fn sign_base64<K: SigningKey + ?Sized>(key: &K, message: &[u8]) -> PayloadSigResult<String> {
  sign(key, message).map(|signature| signature.to_base64())
}

/// Verify a payload against a base64 signature received over a text channel.
/// Undecodable text is reported as [`PayloadSigError::InvalidSignature`] like any other bad signature.
pub fn verify_base64<K: VerifyingKey + ?Sized>(key: &K, message: &[u8], signature: &str) -> PayloadSigResult<()> {
  let signature = PayloadSignature::from_base64(signature).map_err(|_| PayloadSigError::InvalidSignature)?;
  verify(key, message, &signature)
}
