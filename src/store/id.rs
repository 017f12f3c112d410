use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Opaque store-assigned identifier. External representation is the
/// 24-character hex string the store uses for primary keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(ObjectId);

#[derive(Debug, thiserror::Error)]
#[error("invalid identifier: {0}")]
pub struct InvalidIdentifier(pub String);

impl EntityId {
    /// Parse the external hex form. Anything that is not exactly 24 hex
    /// characters is rejected here, before any store access.
    pub fn parse(raw: &str) -> Result<Self, InvalidIdentifier> {
        ObjectId::parse_str(raw)
            .map(EntityId)
            .map_err(|_| InvalidIdentifier(raw.to_string()))
    }

    pub fn is_valid(raw: &str) -> bool {
        ObjectId::parse_str(raw).is_ok()
    }

    pub fn generate() -> Self {
        EntityId(ObjectId::new())
    }

    pub fn as_object_id(&self) -> ObjectId {
        self.0
    }

    pub fn to_hex(&self) -> String {
        self.0.to_hex()
    }
}

impl From<ObjectId> for EntityId {
    fn from(oid: ObjectId) -> Self {
        EntityId(oid)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_hex())
    }
}

impl FromStr for EntityId {
    type Err = InvalidIdentifier;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
