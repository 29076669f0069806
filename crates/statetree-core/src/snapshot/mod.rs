//! Snapshot derivation
//!
//! A snapshot is a plain `serde_json::Value` mirroring a node's data: model
//! properties in declaration order, array elements in order, map entries in
//! insertion order. Snapshots carry no node identity and are rebuilt on
//! every request.
//!
//! ## Responsibilities
//!
//! - Project any live node to its snapshot
//! - Deep clone through the snapshot (`clone_node`)
//! - Restore a node from a snapshot (`apply_snapshot`)
//! - Digest a snapshot for cheap equality checks

pub mod apply;
pub mod digest;

use serde_json::{Map, Value};
use statetree_core_types::NodeId;

use crate::errors::{Result, StateTreeError};
use crate::model::{NodeValue, Slot};
use crate::ops::Store;

pub use digest::hash_string;

impl Store {
    /// Current snapshot of `node`
    ///
    /// # Errors
    ///
    /// Returns `NodeNotFound` or `NodeDestroyed` if `node` or a descendant is
    /// not live.
    pub fn snapshot(&self, node: NodeId) -> Result<Value> {
        match &self.get_node(node)?.value {
            NodeValue::Model(entries) | NodeValue::Map(entries) => {
                let mut object = Map::with_capacity(entries.len());
                for (key, slot) in entries {
                    object.insert(key.clone(), self.slot_snapshot(slot)?);
                }
                Ok(Value::Object(object))
            }
            NodeValue::Array(items) => items
                .iter()
                .map(|slot| self.slot_snapshot(slot))
                .collect::<Result<Vec<_>>>()
                .map(Value::Array),
        }
    }

    pub(crate) fn slot_snapshot(&self, slot: &Slot) -> Result<Value> {
        match slot {
            Slot::Leaf(value) => Ok(value.clone()),
            Slot::Node(child) => self.snapshot(*child),
        }
    }

    /// Deep copy `node` into a new, independent root
    ///
    /// The clone has the same type and an equal snapshot, and shares no node
    /// with the source.
    ///
    /// # Errors
    ///
    /// Returns `NodeNotFound` or `NodeDestroyed` if `node` is not live.
    pub fn clone_node(&mut self, node: NodeId) -> Result<NodeId> {
        crate::log_op!("clone_node", self.clone_impl(node))
    }

    fn clone_impl(&mut self, node: NodeId) -> Result<NodeId> {
        let ty = self.get_type(node)?;
        let snapshot = self.snapshot(node)?;
        match self.build(&ty, Some(&snapshot)) {
            Slot::Node(id) => Ok(id),
            Slot::Leaf(_) => Err(StateTreeError::Internal {
                message: format!("clone of '{}' produced no node", ty.name()),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Type;
    use serde_json::json;

    #[test]
    fn test_snapshot_keeps_declaration_and_insertion_order() {
        let ty = Type::model("Doc")
            .prop("z", Type::map(Type::number()))
            .prop_default("a", json!(1))
            .build();
        let mut store = Store::new();
        let doc = store.create(&ty, json!({"z": {"b": 1, "a": 2}})).unwrap();

        let rendered = serde_json::to_string(&store.snapshot(doc).unwrap()).unwrap();
        assert_eq!(rendered, r#"{"z":{"b":1,"a":2},"a":1}"#);
    }

    #[test]
    fn test_clone_is_independent() {
        let ty = Type::model("Doc")
            .prop("items", Type::array(Type::model("Item").prop_default("n", json!(0)).build()))
            .build();
        let mut store = Store::new();
        let doc = store.create(&ty, json!({"items": [{"n": 1}]})).unwrap();

        let copy = store.clone_node(doc).unwrap();
        assert_ne!(copy, doc);
        assert_eq!(store.snapshot(copy).unwrap(), store.snapshot(doc).unwrap());

        let copy_items = store.child(copy, "items").unwrap();
        store.push(copy_items, json!({"n": 2})).unwrap();
        assert_eq!(store.snapshot(doc).unwrap(), json!({"items": [{"n": 1}]}));
    }
}
