//! Instrument identity shared by patches, definitions and favorites.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Stable identifier of a tradable instrument (`_i` on patches, `_id` on definitions).
///
/// Ordering is plain byte order of the id string; the store keeps quotes in
/// this order. Decoding also accepts a JSON number and keeps its decimal form.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct InstrumentId(String);

impl InstrumentId {
    /// Wraps an id string as-is.
    pub fn new(id: impl Into<String>) -> Self {
        InstrumentId(id.into())
    }

    /// Borrow the raw id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InstrumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for InstrumentId {
    fn from(value: &str) -> Self {
        InstrumentId::new(value)
    }
}

impl From<String> for InstrumentId {
    fn from(value: String) -> Self {
        InstrumentId(value)
    }
}

impl Borrow<str> for InstrumentId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(serde_json::Number),
}

impl<'de> Deserialize<'de> for InstrumentId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(text) => InstrumentId(text),
            RawId::Number(number) => InstrumentId(number.to_string()),
        })
    }
}
