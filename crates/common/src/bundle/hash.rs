use std::fmt;

use serde::{Serialize, Serializer};
use sha2::{Digest, Sha256};

/// Opaque hash of a bundle's compiled output.
///
/// Stable for as long as the compiled output is unchanged; a rebuild that
///  changes the output produces a new hash.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentHash(Vec<u8>);

impl ContentHash {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// SHA-256 over the given content
    pub fn of(content: &[u8]) -> Self {
        Self(Sha256::digest(content).to_vec())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Lowercase hex encoding of the hash
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    /// The cache validator derived from this hash
    pub fn validator(&self) -> Validator {
        Validator(format!("\"{}\"", self.to_hex()))
    }
}

impl From<u32> for ContentHash {
    fn from(value: u32) -> Self {
        Self(value.to_be_bytes().to_vec())
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for ContentHash {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

/// Quoted-hex entity tag sent as `ETag` and compared against `If-None-Match`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validator(String);

impl Validator {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Byte-for-byte comparison with a raw `If-None-Match` value.
    ///
    /// Weak validators and comma separated lists are not interpreted: the
    ///  header must carry exactly this validator, quotes included.
    pub fn matches(&self, if_none_match: Option<&[u8]>) -> bool {
        if_none_match == Some(self.0.as_bytes())
    }
}

impl fmt::Display for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
