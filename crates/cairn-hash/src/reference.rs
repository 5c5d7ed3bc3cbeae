use std::fmt;

use sha1::{Digest, Sha1};

use crate::error::HashError;

/// Length of the digest in bytes.
pub const DIGEST_LEN: usize = 20;

/// Textual prefix of every ref.
const PREFIX: &str = "sha1-";

/// Content-addressed reference to a stored chunk.
///
/// A `Ref` is the SHA-1 hash of a chunk's canonical byte encoding. Identical
/// content always produces the same `Ref`, so two values with identical
/// canonical encodings share one chunk. Refs order by digest bytes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ref([u8; DIGEST_LEN]);

impl Ref {
    /// Compute the ref of a canonical byte sequence.
    pub fn of(data: &[u8]) -> Self {
        Self(Sha1::digest(data).into())
    }

    /// Create a ref from a pre-computed digest.
    pub fn from_digest(digest: [u8; DIGEST_LEN]) -> Self {
        Self(digest)
    }

    /// The raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }

    /// Hex-encoded digest, without the `sha1-` prefix.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Short hex form (first 8 characters), for logs.
    pub fn short_hex(&self) -> String {
        hex::encode(&self.0[..4])
    }

    /// Parse the exact textual form `sha1-` + 40 lowercase hex characters.
    ///
    /// Anything else — wrong prefix, wrong length, uppercase or non-hex
    /// characters — is [`HashError::MalformedRef`].
    pub fn parse(s: &str) -> Result<Self, HashError> {
        let malformed = || HashError::MalformedRef(s.to_string());
        let hex_part = s.strip_prefix(PREFIX).ok_or_else(malformed)?;
        if hex_part.len() != DIGEST_LEN * 2 {
            return Err(malformed());
        }
        // `hex::decode` tolerates uppercase; the wire form does not.
        if !hex_part
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
        {
            return Err(malformed());
        }
        let bytes = hex::decode(hex_part).map_err(|_| malformed())?;
        let mut digest = [0u8; DIGEST_LEN];
        digest.copy_from_slice(&bytes);
        Ok(Self(digest))
    }
}

impl fmt::Display for Ref {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{PREFIX}{}", self.to_hex())
    }
}

impl fmt::Debug for Ref {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ref({})", self.short_hex())
    }
}
