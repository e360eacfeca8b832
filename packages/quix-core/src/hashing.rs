//! Value fingerprints used as unique-index keys.

use std::fmt;

use sha2::{Digest, Sha256};

use crate::types::Value;

const TAG_TEXT: u8 = b't';
const TAG_INTEGER: u8 = b'i';
const TAG_FLOAT: u8 = b'f';
const TAG_BOOLEAN: u8 = b'b';

/// SHA-256 digest of a value's canonical encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hex form, used as the index file name.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Computes the fingerprint of `value`.
///
/// The encoding is a type tag byte followed by the payload, so `"1"` and
/// `1` never share a key. Equal values always share a key: `-0.0` is
/// folded onto `0.0` because the two compare equal.
pub fn fingerprint(value: &Value) -> Fingerprint {
    let mut hasher = Sha256::new();
    match value {
        Value::Text(s) => {
            hasher.update([TAG_TEXT]);
            hasher.update(s.as_bytes());
        }
        Value::Integer(i) => {
            hasher.update([TAG_INTEGER]);
            hasher.update(i.to_be_bytes());
        }
        Value::Float(x) => {
            let x = if *x == 0.0 { 0.0 } else { *x };
            hasher.update([TAG_FLOAT]);
            hasher.update(x.to_bits().to_be_bytes());
        }
        Value::Boolean(b) => {
            hasher.update([TAG_BOOLEAN]);
            hasher.update([u8::from(*b)]);
        }
    }
    Fingerprint(hasher.finalize().into())
}
