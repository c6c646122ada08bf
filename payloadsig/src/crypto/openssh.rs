//! Single-line OpenSSH public keys (`ssh-rsa <base64 blob> [comment]`, RFC 4253 section 6.6).

use crate::error::{PayloadSigError, PayloadSigResult};
use base64::{engine::general_purpose, Engine as _};
use rsa::{BigUint, RsaPublicKey};

const SSH_RSA: &str = "ssh-rsa";

fn openssh_error(reason: impl Into<String>) -> PayloadSigError {
  PayloadSigError::KeyFormatError(format!("Invalid OpenSSH public key: {}", reason.into()))
}

/// Cursor over the SSH wire encoding
struct WireReader<'a> {
  buf: &'a [u8],
}

impl<'a> WireReader<'a> {
  /// `string`: uint32 big-endian length followed by that many bytes
  fn read_string(&mut self) -> PayloadSigResult<&'a [u8]> {
    if self.buf.len() < 4 {
      return Err(openssh_error("truncated length field"));
    }
    let (len, rest) = self.buf.split_at(4);
    let len = u32::from_be_bytes([len[0], len[1], len[2], len[3]]) as usize;
    if rest.len() < len {
      return Err(openssh_error("truncated field"));
    }
    let (value, rest) = rest.split_at(len);
    self.buf = rest;
    Ok(value)
  }

  /// `mpint`: two's complement big-endian; only non-negative values are meaningful for RSA
  fn read_positive_mpint(&mut self) -> PayloadSigResult<BigUint> {
    let bytes = self.read_string()?;
    match bytes.first() {
      None => Err(openssh_error("zero integer")),
      Some(first) if first & 0x80 != 0 => Err(openssh_error("negative integer")),
      Some(_) => Ok(BigUint::from_bytes_be(bytes)),
    }
  }

  fn is_empty(&self) -> bool {
    self.buf.is_empty()
  }
}

/// Parse `ssh-rsa AAAA... [comment]` into an RSA public key
pub(super) fn parse_rsa_public_key(text: &str) -> PayloadSigResult<RsaPublicKey> {
  let mut lines = text.lines().map(str::trim).filter(|line| !line.is_empty());
  let line = lines.next().ok_or_else(|| openssh_error("empty input"))?;
  if lines.next().is_some() {
    return Err(openssh_error("expected a single key line"));
  }

  let mut fields = line.split_whitespace();
  let key_type = fields.next().ok_or_else(|| openssh_error("empty input"))?;
  if key_type != SSH_RSA {
    return Err(openssh_error(format!("unsupported key type {key_type}")));
  }
  let blob = fields.next().ok_or_else(|| openssh_error("missing key data"))?;
  // anything left is the comment
  let blob = general_purpose::STANDARD
    .decode(blob)
    .map_err(|e| openssh_error(format!("key data is not base64: {e}")))?;

  let mut reader = WireReader { buf: &blob };
  if reader.read_string()? != SSH_RSA.as_bytes() {
    return Err(openssh_error("embedded key type does not match"));
  }
  let e = reader.read_positive_mpint()?;
  let n = reader.read_positive_mpint()?;
  if !reader.is_empty() {
    return Err(openssh_error("trailing bytes after key data"));
  }

  RsaPublicKey::new(n, e).map_err(|e| openssh_error(e.to_string()))
}
