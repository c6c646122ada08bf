use super::{openssh, AlgorithmName};
use crate::{
  error::{PayloadSigError, PayloadSigResult},
  trace::*,
};
use base64::{engine::general_purpose, Engine as _};
use pkcs8::{der::Decode, Document, PrivateKeyInfo};
use rsa::{
  pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey},
  pkcs1v15,
  pkcs8::EncodePublicKey,
  rand_core::OsRng,
  signature::{DigestVerifier, RandomizedDigestSigner, SignatureEncoding},
  traits::PublicKeyParts,
  RsaPrivateKey, RsaPublicKey,
};
use sha2::{Digest, Sha256};
use spki::SubjectPublicKeyInfoRef;

/// Smallest accepted modulus, in bits
pub const MIN_MODULUS_BITS: usize = 1024;
/// Largest accepted modulus, in bits. Public keys above this cannot be decoded, so private keys are held to it too.
pub const MAX_MODULUS_BITS: usize = RsaPublicKey::MAX_SIZE;

#[allow(non_upper_case_globals)]
/// Algorithm OIDs
mod algorithm_oids {
  /// OID for `rsaEncryption`, if you're curious
  pub const Rsa: &str = "1.2.840.113549.1.1.1";
}

/// PEM labels
mod pem_labels {
  /// PKCS#8 PrivateKeyInfo
  pub const PRIVATE_KEY: &str = "PRIVATE KEY";
  /// PKCS#1 RSAPrivateKey
  pub const RSA_PRIVATE_KEY: &str = "RSA PRIVATE KEY";
  /// X.509 SubjectPublicKeyInfo
  pub const PUBLIC_KEY: &str = "PUBLIC KEY";
  /// PKCS#1 RSAPublicKey
  pub const RSA_PUBLIC_KEY: &str = "RSA PUBLIC KEY";
}

fn key_format_error(what: &str, e: impl std::fmt::Display) -> PayloadSigError {
  PayloadSigError::KeyFormatError(format!("{what}: {e}"))
}

fn utf8_text(bytes: &[u8]) -> PayloadSigResult<&str> {
  std::str::from_utf8(bytes).map_err(|e| key_format_error("Key material is not valid UTF-8", e))
}

const PEM_BEGIN: &str = "-----BEGIN ";

/// Cut the PEM block out of key file text: drops a byte order mark, explanatory text before the
/// pre-encapsulation boundary, and surrounding whitespace
fn pem_block(text: &str) -> Option<&str> {
  let text = text.trim_start_matches('\u{feff}');
  text.find(PEM_BEGIN).map(|start| text[start..].trim())
}

fn decode_pem(pem: &str) -> PayloadSigResult<(&str, Document)> {
  let block = pem_block(pem).unwrap_or_else(|| pem.trim());
  Document::from_pem(block).map_err(|e| key_format_error("Error decoding PEM", e))
}

/* -------------------------------- */
/// Secret key for payload signature.
///
/// Wraps an RSA private key and signs with [`AlgorithmName::RsaV1_5Sha256`].
/// Immutable once loaded, so a single instance can sign from many threads at once.
#[derive(Clone)]
pub struct SecretKey {
  inner: pkcs1v15::SigningKey<Sha256>,
  public_key: PublicKey,
}

impl SecretKey {
  fn from_rsa(key: RsaPrivateKey, form: &str) -> PayloadSigResult<Self> {
    key
      .validate()
      .map_err(|e| key_format_error("Inconsistent RSA private key", e))?;
    let public_key = PublicKey::from_rsa(key.to_public_key(), form)?;
    Ok(Self {
      inner: pkcs1v15::SigningKey::<Sha256>::new(key),
      public_key,
    })
  }

  /// parse der
  /// Derive secret key from PKCS#8 der bytes
  pub fn from_der(der: &[u8]) -> PayloadSigResult<Self> {
    let pki = PrivateKeyInfo::from_der(der).map_err(|e| key_format_error("Error decoding PrivateKeyInfo", e))?;

    match pki.algorithm.oid.to_string().as_ref() {
      algorithm_oids::Rsa => {
        debug!("Read RSA private key (PKCS#8)");
        let sk = RsaPrivateKey::try_from(pki).map_err(|e| key_format_error("Error decoding RSA private key", e))?;
        Self::from_rsa(sk, "PKCS#8")
      }
      oid => Err(PayloadSigError::KeyFormatError(format!(
        "Unsupported private key algorithm: {oid}"
      ))),
    }
  }

  /// Derive secret key from PKCS#1 der bytes
  pub fn from_pkcs1_der(der: &[u8]) -> PayloadSigResult<Self> {
    debug!("Read RSA private key (PKCS#1)");
    let sk = RsaPrivateKey::from_pkcs1_der(der).map_err(|e| key_format_error("Error decoding RSAPrivateKey", e))?;
    Self::from_rsa(sk, "PKCS#1")
  }

  /// Derive secret key from pem string, either `PRIVATE KEY` or `RSA PRIVATE KEY`
  pub fn from_pem(pem: &str) -> PayloadSigResult<Self> {
    let (tag, doc) = decode_pem(pem)?;
    match tag {
      pem_labels::PRIVATE_KEY => Self::from_der(doc.as_bytes()),
      pem_labels::RSA_PRIVATE_KEY => Self::from_pkcs1_der(doc.as_bytes()),
      _ => Err(PayloadSigError::KeyFormatError(format!("Invalid private key tag: {tag}"))),
    }
  }

  /// Derive secret key from raw key file contents
  pub fn from_bytes(bytes: &[u8]) -> PayloadSigResult<Self> {
    Self::from_pem(utf8_text(bytes)?)
  }

  /// Get public key from secret key
  pub fn public_key(&self) -> PublicKey {
    self.public_key.clone()
  }

  /// Modulus size in bits
  pub fn modulus_bits(&self) -> usize {
    self.public_key.modulus_bits()
  }

  /// Length in bytes of every signature this key produces
  pub fn signature_len(&self) -> usize {
    self.public_key.signature_len()
  }
}

impl std::fmt::Debug for SecretKey {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("SecretKey")
      .field("alg", &self.public_key.alg_name())
      .field("key_id", &self.public_key.key_id)
      .finish_non_exhaustive()
  }
}

impl super::SigningKey for SecretKey {
  /// Sign data
  fn sign(&self, data: &[u8]) -> PayloadSigResult<Vec<u8>> {
    let mut digest = <Sha256 as Digest>::new();
    digest.update(data);
    // the rng only blinds the private key operation, the PKCS#1 v1.5 output stays deterministic
    let sig: pkcs1v15::Signature = self
      .inner
      .try_sign_digest_with_rng(&mut OsRng, digest)
      .map_err(|e| PayloadSigError::SigningError(e.to_string()))?;
    Ok(sig.to_vec())
  }

  fn key_id(&self) -> String {
    self.public_key.key_id.clone()
  }

  fn alg(&self) -> AlgorithmName {
    self.public_key.alg_name()
  }
}

impl super::VerifyingKey for SecretKey {
  fn verify(&self, data: &[u8], signature: &[u8]) -> PayloadSigResult<()> {
    self.public_key.verify(data, signature)
  }

  fn key_id(&self) -> String {
    self.public_key.key_id.clone()
  }

  fn alg(&self) -> AlgorithmName {
    self.public_key.alg_name()
  }
}

/* -------------------------------- */
/// Public key for payload signature.
///
/// Loaded from PEM (`PUBLIC KEY` or `RSA PUBLIC KEY`) or from an OpenSSH `ssh-rsa` line.
#[derive(Clone)]
pub struct PublicKey {
  inner: pkcs1v15::VerifyingKey<Sha256>,
  key_id: String,
}

impl PublicKey {
  pub(super) fn from_rsa(key: RsaPublicKey, form: &str) -> PayloadSigResult<Self> {
    let bits = key.n().bits();
    if bits < MIN_MODULUS_BITS {
      warn!("Rejected {form} RSA key: {bits}-bit modulus is below {MIN_MODULUS_BITS} bits");
      return Err(PayloadSigError::KeyFormatError(format!(
        "RSA modulus of {bits} bits is below the minimum of {MIN_MODULUS_BITS} bits"
      )));
    }
    if bits > MAX_MODULUS_BITS {
      warn!("Rejected {form} RSA key: {bits}-bit modulus is above {MAX_MODULUS_BITS} bits");
      return Err(PayloadSigError::KeyFormatError(format!(
        "RSA modulus of {bits} bits is above the maximum of {MAX_MODULUS_BITS} bits"
      )));
    }
    let spki_der = key
      .to_public_key_der()
      .map_err(|e| key_format_error("Error encoding SubjectPublicKeyInfo", e))?;
    let key_id = general_purpose::URL_SAFE_NO_PAD.encode(Sha256::digest(spki_der.as_bytes()));
    debug!("Loaded {form} RSA key: {bits}-bit modulus, key id {key_id}");

    Ok(Self {
      inner: pkcs1v15::VerifyingKey::<Sha256>::new(key),
      key_id,
    })
  }

  /// Derive public key from SubjectPublicKeyInfo der bytes
  pub fn from_der(der: &[u8]) -> PayloadSigResult<Self> {
    let spki_ref =
      SubjectPublicKeyInfoRef::from_der(der).map_err(|e| key_format_error("Error decoding SubjectPublicKeyInfo", e))?;
    match spki_ref.algorithm.oid.to_string().as_ref() {
      algorithm_oids::Rsa => {
        let pk = RsaPublicKey::try_from(spki_ref).map_err(|e| key_format_error("Error decoding RSA public key", e))?;
        Self::from_rsa(pk, "SPKI")
      }
      oid => Err(PayloadSigError::KeyFormatError(format!(
        "Unsupported public key algorithm: {oid}"
      ))),
    }
  }

  /// Derive public key from PKCS#1 der bytes
  pub fn from_pkcs1_der(der: &[u8]) -> PayloadSigResult<Self> {
    let pk = RsaPublicKey::from_pkcs1_der(der).map_err(|e| key_format_error("Error decoding RSAPublicKey", e))?;
    Self::from_rsa(pk, "PKCS#1")
  }

  /// Convert from pem string, either `PUBLIC KEY` or `RSA PUBLIC KEY`
  pub fn from_pem(pem: &str) -> PayloadSigResult<Self> {
    let (tag, doc) = decode_pem(pem)?;
    match tag {
      pem_labels::PUBLIC_KEY => Self::from_der(doc.as_bytes()),
      pem_labels::RSA_PUBLIC_KEY => Self::from_pkcs1_der(doc.as_bytes()),
      _ => Err(PayloadSigError::KeyFormatError(format!("Invalid public key tag: {tag}"))),
    }
  }

  /// Convert from a single OpenSSH public key line, e.g. `ssh-rsa AAAA... comment`
  pub fn from_openssh(line: &str) -> PayloadSigResult<Self> {
    let pk = openssh::parse_rsa_public_key(line)?;
    Self::from_rsa(pk, "OpenSSH")
  }

  /// Derive public key from raw key file contents.
  /// PEM and OpenSSH forms are both accepted and told apart by their framing.
  pub fn from_bytes(bytes: &[u8]) -> PayloadSigResult<Self> {
    let text = utf8_text(bytes)?;
    if let Some(block) = pem_block(text) {
      Self::from_pem(block)
    } else {
      Self::from_openssh(text)
    }
  }

  /// Modulus size in bits
  pub fn modulus_bits(&self) -> usize {
    self.rsa().n().bits()
  }

  /// Length in bytes of every valid signature under this key
  pub fn signature_len(&self) -> usize {
    self.rsa().size()
  }

  fn rsa(&self) -> &RsaPublicKey {
    self.inner.as_ref()
  }

  fn alg_name(&self) -> AlgorithmName {
    AlgorithmName::RsaV1_5Sha256
  }
}

impl std::fmt::Debug for PublicKey {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("PublicKey")
      .field("alg", &self.alg_name())
      .field("key_id", &self.key_id)
      .finish_non_exhaustive()
  }
}

impl super::VerifyingKey for PublicKey {
  /// Verify signature
  fn verify(&self, data: &[u8], signature: &[u8]) -> PayloadSigResult<()> {
    if signature.len() != self.signature_len() {
      debug!("Rejected signature of unexpected length");
      return Err(PayloadSigError::InvalidSignature);
    }
    let signature = pkcs1v15::Signature::try_from(signature).map_err(|_| PayloadSigError::InvalidSignature)?;
    let mut digest = <Sha256 as Digest>::new();
    digest.update(data);
    // the encoded message comparison inside the rsa crate is constant time
    self.inner.verify_digest(digest, &signature).map_err(|_| {
      debug!("Signature verification failed");
      PayloadSigError::InvalidSignature
    })
  }

  /// Create key id
  fn key_id(&self) -> String {
    self.key_id.clone()
  }

  /// Get the algorithm name
  fn alg(&self) -> AlgorithmName {
    self.alg_name()
  }
}
