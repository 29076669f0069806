//! Node identity tokens
//!
//! Every live composite value in a state tree is wrapped in a node that
//! carries a `NodeId`. Ids are never reused, so a handle to a destroyed node
//! can always be told apart from a handle to a live one.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identity token of a node (UUIDv7, time-ordered)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(Uuid);

impl NodeId {
    /// Generate a fresh NodeId
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Get the underlying UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
