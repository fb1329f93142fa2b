use serde::{Deserialize, Serialize};

/// Opaque snapshot of a vector collection's metadata.
///
/// The schema belongs to the vector store. It is carried as raw JSON and
/// serialized back out exactly as received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CollectionInfo(serde_json::Value);

impl CollectionInfo {
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    /// Look up a top-level field, if the snapshot is an object.
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.0.get(key)
    }

    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }

    pub fn into_value(self) -> serde_json::Value {
        self.0
    }
}

impl From<serde_json::Value> for CollectionInfo {
    fn from(value: serde_json::Value) -> Self {
        Self(value)
    }
}
