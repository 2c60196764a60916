use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha1::{Digest, Sha1};
use thiserror::Error;
use uuid::Uuid;

/// A persisted field that could not be converted into its typed value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {field} value '{value}'")]
pub struct FieldParseError {
    pub field: &'static str,
    pub value: String,
}

impl FieldParseError {
    pub fn new(field: &'static str, value: impl Into<String>) -> Self {
        Self {
            field,
            value: value.into(),
        }
    }
}

/// Content-derived identifier of a state or widget.
///
/// `uid` is derived from the attributes that make an element "the same"
/// element across screens (class, text, description), `config_id` from the
/// attributes that describe its current configuration (bounds, capability
/// flags). Equality is structural on both halves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConcreteId {
    pub uid: Uuid,
    pub config_id: Uuid,
}

impl ConcreteId {
    /// Identifier of the placeholder state every trace starts from.
    pub const EMPTY: ConcreteId = ConcreteId {
        uid: Uuid::nil(),
        config_id: Uuid::nil(),
    };

    pub fn new(uid: Uuid, config_id: Uuid) -> Self {
        Self { uid, config_id }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::EMPTY
    }

    /// Parse an optional reference column; `null` and blank mean "no reference".
    pub fn parse_optional(raw: &str) -> Result<Option<ConcreteId>, FieldParseError> {
        let raw = raw.trim();
        if raw.is_empty() || raw.eq_ignore_ascii_case("null") {
            return Ok(None);
        }
        raw.parse().map(Some)
    }
}

impl fmt::Display for ConcreteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.uid, self.config_id)
    }
}

impl FromStr for ConcreteId {
    type Err = FieldParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || FieldParseError::new("ConcreteId", s);
        let (uid, config_id) = s.trim().split_once('_').ok_or_else(invalid)?;
        Ok(Self {
            uid: Uuid::parse_str(uid).map_err(|_| invalid())?,
            config_id: Uuid::parse_str(config_id).map_err(|_| invalid())?,
        })
    }
}

impl Serialize for ConcreteId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ConcreteId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Hash an ordered list of attribute values into a UUID.
///
/// Values are joined with a unit separator so `["ab", "c"]` and `["a", "bc"]`
/// never collide.
pub fn fingerprint<'a>(parts: impl IntoIterator<Item = &'a str>) -> Uuid {
    let mut hasher = Sha1::new();
    for part in parts {
        hasher.update(part.as_bytes());
        hasher.update([0x1f]);
    }
    let digest = hasher.finalize();

    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&digest[..16]);
    Uuid::from_bytes(bytes)
}
