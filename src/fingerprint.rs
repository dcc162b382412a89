//! Canonical encoding and content fingerprints of parameter sets.
//!
//! The canonical encoding is both what gets hashed and what gets written to
//! the input file, so a stored input can be re-fingerprinted and compared
//! against the name it was stored under.
use crate::error::Result;
use crate::params::ParamSet;
use crate::util::sha256_hex;
use serde::{Deserialize, Serialize};
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Value};
use std::fmt;

/// Hex length of a fingerprint (SHA-256).
pub const FINGERPRINT_LEN: usize = 64;

const CANONICAL_INDENT: &[u8] = b"    ";

/// Stable identifier derived from the canonical encoding of a [`ParamSet`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn of(params: &ParamSet) -> Result<Self> {
        Ok(Self::of_canonical(&canonical_bytes(params)?))
    }

    pub(crate) fn of_canonical(bytes: &[u8]) -> Self {
        Self(sha256_hex(bytes))
    }

    /// Validates the shape of a fingerprint (64 lowercase hex chars).
    pub fn parse(text: &str) -> Option<Self> {
        let valid = text.len() == FINGERPRINT_LEN
            && text
                .bytes()
                .all(|byte| matches!(byte, b'0'..=b'9' | b'a'..=b'f'));
        valid.then(|| Self(text.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Leading characters, for log lines.
    pub fn short(&self) -> &str {
        &self.0[..8]
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Fingerprint {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| format!("invalid fingerprint '{value}'"))
    }
}

impl From<Fingerprint> for String {
    fn from(value: Fingerprint) -> Self {
        value.0
    }
}

/// Canonical bytes: keys sorted recursively, four-space indent, trailing newline.
pub fn canonical_bytes(params: &ParamSet) -> Result<Vec<u8>> {
    let value = canonical_value(params.as_map());
    let mut out = Vec::new();
    let formatter = PrettyFormatter::with_indent(CANONICAL_INDENT);
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    value.serialize(&mut serializer)?;
    out.push(b'\n');
    Ok(out)
}

// Rebuilds every object with keys inserted in sorted order, so the output is
// sorted whether or not serde_json preserves insertion order.
fn canonical_value(map: &Map<String, Value>) -> Value {
    let mut entries: Vec<(&String, &Value)> = map.iter().collect();
    entries.sort_by(|left, right| left.0.cmp(right.0));
    let mut sorted = Map::new();
    for (key, value) in entries {
        sorted.insert(key.clone(), canonical_child(value));
    }
    Value::Object(sorted)
}

fn canonical_child(value: &Value) -> Value {
    match value {
        Value::Object(map) => canonical_value(map),
        Value::Array(items) => Value::Array(items.iter().map(canonical_child).collect()),
        other => other.clone(),
    }
}
