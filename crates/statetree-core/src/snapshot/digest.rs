//! Snapshot digests
//!
//! A digest is the hex SHA256 of the snapshot's JSON text. Key order is part
//! of the text, so two trees digest equal only when their snapshots are
//! equal including property and entry order.

use sha2::{Digest, Sha256};
use statetree_core_types::NodeId;

use crate::errors::Result;
use crate::ops::Store;

impl Store {
    /// Hex-encoded SHA256 digest of the snapshot of `node`
    ///
    /// # Errors
    ///
    /// Returns `NodeNotFound` or `NodeDestroyed` if `node` is not live, or
    /// `Serialization` if the snapshot cannot be encoded.
    pub fn snapshot_digest(&self, node: NodeId) -> Result<String> {
        let canonical = serde_json::to_string(&self.snapshot(node)?)?;
        Ok(hash_string(&canonical))
    }
}

/// Hash a string using SHA256.
pub fn hash_string(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}
