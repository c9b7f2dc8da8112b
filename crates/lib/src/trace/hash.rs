//! Content digests.
//!
//! `Hash` is a 64-bit digest used as a build trace. Content digests are the
//! leading 8 bytes of a SHA-256; combining digests uses a fixed mixing
//! function that is deliberately not commutative, so the order in which
//! dependencies are listed is part of a target's identity.

use std::fmt;
use std::fs;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// A 64-bit content digest.
///
/// # Format
///
/// Displayed as 16 lowercase hexadecimal characters, e.g. `"00000000000006bb"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Hash(pub u64);

/// Error parsing a [`Hash`] from text.
#[derive(Debug, Error, PartialEq)]
pub enum ParseHashError {
  #[error("invalid hex digest: {0}")]
  InvalidHex(#[from] hex::FromHexError),

  #[error("digest must be 8 bytes, got {0}")]
  WrongLength(usize),
}

impl Hash {
  /// Zero element of the digest fold.
  pub const NIL: Hash = Hash(1723);

  /// Mix `other` into `self`.
  ///
  /// `a.mix(b)` generally differs from `b.mix(a)`.
  pub const fn mix(self, other: Hash) -> Hash {
    let seed = self.0;
    Hash(
      seed
        ^ other
          .0
          .wrapping_add(0x9e37_79b9_7f4a_7c15)
          .wrapping_add(seed << 6)
          .wrapping_add(seed >> 2),
    )
  }

  /// Digest arbitrary bytes.
  pub fn of_bytes(data: &[u8]) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update(data);
    from_digest(&hasher.finalize())
  }

  /// Digest the UTF-8 bytes of `text`.
  pub fn of_str(text: &str) -> Hash {
    Self::of_bytes(text.as_bytes())
  }

  /// Digest a file's contents, streaming it from disk.
  pub fn of_file(path: &Path) -> std::io::Result<Hash> {
    let mut file = fs::File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];

    loop {
      let bytes_read = file.read(&mut buffer)?;
      if bytes_read == 0 {
        break;
      }
      hasher.update(&buffer[..bytes_read]);
    }

    Ok(from_digest(&hasher.finalize()))
  }
}

fn from_digest(digest: &[u8]) -> Hash {
  let mut prefix = [0u8; 8];
  prefix.copy_from_slice(&digest[..8]);
  Hash(u64::from_be_bytes(prefix))
}

impl fmt::Display for Hash {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&hex::encode(self.0.to_be_bytes()))
  }
}

impl FromStr for Hash {
  type Err = ParseHashError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let bytes = hex::decode(s.trim())?;
    let prefix: [u8; 8] = bytes
      .as_slice()
      .try_into()
      .map_err(|_| ParseHashError::WrongLength(bytes.len()))?;
    Ok(Hash(u64::from_be_bytes(prefix)))
  }
}
