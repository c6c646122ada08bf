use thiserror::Error;

/// Result type for payload signature
pub type PayloadSigResult<T> = std::result::Result<T, PayloadSigError>;

/// Error type for payload signature
#[derive(Error, Debug)]
pub enum PayloadSigError {
  #[error("Base64 decode error: {0}")]
  Base64DecodeError(#[from] base64::DecodeError),

  /// Unknown algorithm name
  #[error("Invalid algorithm name: {0}")]
  InvalidAlgorithmName(String),

  /* ----- Crypto errors ----- */
  /// Malformed or unsupported key encoding, raised only at load time
  #[error("Invalid key format: {0}")]
  KeyFormatError(String),

  /// The private key operation failed
  #[error("Failed to sign: {0}")]
  SigningError(String),

  /// Signature does not verify.
  /// Carries no detail on purpose: wrong key, altered message, bad length and garbage bytes all look the same.
  #[error("Invalid signature")]
  InvalidSignature,
}

impl PayloadSigError {
  /// True if the error was raised while loading key material
  pub fn is_key_format_error(&self) -> bool {
    matches!(self, Self::KeyFormatError(_))
  }

  /// True if the error is the verification failure
  pub fn is_invalid_signature(&self) -> bool {
    matches!(self, Self::InvalidSignature)
  }
}
