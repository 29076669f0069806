//! Primitive mutations
//!
//! Each mutation is checked in full before any node is touched, then applied
//! and announced with its patches in one step. Nodes evicted by a
//! replacement, splice or map deletion are destroyed; `detach` is the only
//! way to take a node out of a tree and keep it alive.

use serde_json::Value;
use statetree_core_types::NodeId;

use super::store::Store;
use crate::errors::{Result, StateTreeError};
use crate::model::{ContainerKind, Input, NodeValue, Slot};
use crate::patch::Patch;
use crate::path::{format_pointer, parse_index};

impl Store {
    /// Slot `key` of `node`
    ///
    /// # Errors
    ///
    /// Returns `InvalidKey` if `node` has no such child.
    pub fn get(&self, node: NodeId, key: &str) -> Result<&Slot> {
        self.get_node(node)?
            .slot(key)
            .ok_or_else(|| self.invalid_key(node, key))
    }

    /// Snapshot of slot `key` of `node`
    ///
    /// # Errors
    ///
    /// Returns `InvalidKey` if `node` has no such child.
    pub fn get_value(&self, node: NodeId, key: &str) -> Result<Value> {
        let slot = self.get(node, key)?.clone();
        self.slot_snapshot(&slot)
    }

    /// Composite child `key` of `node`
    ///
    /// # Errors
    ///
    /// Returns `InvalidKey` if there is no such child or it holds a leaf.
    pub fn child(&self, node: NodeId, key: &str) -> Result<NodeId> {
        self.get(node, key)?
            .as_node()
            .ok_or_else(|| self.invalid_key(node, key))
    }

    fn invalid_key(&self, node: NodeId, key: &str) -> StateTreeError {
        StateTreeError::InvalidKey {
            path: self.path(node).unwrap_or_default(),
            key: key.to_string(),
        }
    }

    fn unsupported(&self, node: NodeId, op: &str) -> StateTreeError {
        StateTreeError::UnsupportedOperation {
            op: op.to_string(),
            path: self.path(node).unwrap_or_default(),
            type_name: self
                .get_node(node)
                .map(|n| n.ty.name().to_string())
                .unwrap_or_default(),
        }
    }

    fn target_parts(&self, node: NodeId, key: &str) -> Result<Vec<String>> {
        let mut parts = self.path_parts(node)?;
        parts.push(key.to_string());
        Ok(parts)
    }

    fn holds(&self, node: NodeId, key: &str, input: &Input) -> bool {
        match (input, self.get_node(node).ok().and_then(|n| n.slot(key))) {
            (Input::Node(id), Some(Slot::Node(current))) => id == current,
            _ => false,
        }
    }

    /// Assign slot `key` of a model, array or map node
    ///
    /// Models accept declared property names, arrays an existing index, maps
    /// any key. Assigning a node into the slot it already occupies does
    /// nothing.
    ///
    /// # Errors
    ///
    /// Returns `InvalidKey` for an unknown property or index, `Validation`
    /// if the value does not satisfy the slot type, and `ParentConflict` if
    /// a node input is already attached elsewhere.
    pub fn set(&mut self, node: NodeId, key: &str, input: impl Into<Input>) -> Result<()> {
        let input = input.into();
        match self.container_kind(node)? {
            ContainerKind::Model => self.set_property(node, key, input),
            ContainerKind::Array => {
                let index = parse_index(key).ok_or_else(|| self.invalid_key(node, key))?;
                self.array_set(node, index, input)
            }
            ContainerKind::Map => self.map_set(node, key, input),
        }
    }

    fn set_property(&mut self, node: NodeId, key: &str, input: Input) -> Result<()> {
        let ty = self.get_child_type(node, key)?;
        if self.holds(node, key, &input) {
            return Ok(());
        }
        let target = self.target_parts(node, key)?;
        let prepared = self.prepare(node, &ty, input, &target)?;
        let slot = self.materialize(prepared, node, key);
        self.replace_slot(node, key, slot)
    }

    /// Assign element `index` of an array node
    ///
    /// # Errors
    ///
    /// Returns `InvalidKey` if `index` is out of range; otherwise as `set`.
    pub fn array_set(&mut self, node: NodeId, index: usize, input: impl Into<Input>) -> Result<()> {
        let input = input.into();
        if self.container_kind(node)? != ContainerKind::Array {
            return Err(self.unsupported(node, "array_set"));
        }
        let key = index.to_string();
        if index >= self.len(node)? {
            return Err(self.invalid_key(node, &key));
        }
        if self.holds(node, &key, &input) {
            return Ok(());
        }
        let ty = self.get_child_type(node, &key)?;
        let target = self.target_parts(node, &key)?;
        let prepared = self.prepare(node, &ty, input, &target)?;
        let slot = self.materialize(prepared, node, &key);
        self.replace_slot(node, &key, slot)
    }

    /// Set entry `key` of a map node, adding it if absent
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedOperation` if `node` is not a map; otherwise as
    /// `set`.
    pub fn map_set(&mut self, node: NodeId, key: &str, input: impl Into<Input>) -> Result<()> {
        let input = input.into();
        if self.container_kind(node)? != ContainerKind::Map {
            return Err(self.unsupported(node, "map_set"));
        }
        if self.holds(node, key, &input) {
            return Ok(());
        }
        let ty = self.get_child_type(node, key)?;
        let target = self.target_parts(node, key)?;
        let prepared = self.prepare(node, &ty, input, &target)?;
        let slot = self.materialize(prepared, node, key);
        self.replace_slot(node, key, slot)
    }

    /// Write an already linked slot, destroy the evicted node and emit
    fn replace_slot(&mut self, node: NodeId, key: &str, slot: Slot) -> Result<()> {
        let new_value = self.slot_snapshot(&slot)?;
        let old = {
            let container = self.get_node_mut(node)?;
            match &mut container.value {
                NodeValue::Model(entries) | NodeValue::Map(entries) => {
                    entries.insert(key.to_string(), slot)
                }
                NodeValue::Array(items) => match parse_index(key).and_then(|i| items.get_mut(i)) {
                    Some(existing) => Some(std::mem::replace(existing, slot)),
                    None => {
                        return Err(StateTreeError::Internal {
                            message: format!("array slot '{}' vanished during assignment", key),
                        })
                    }
                },
            }
        };

        let patch = match old {
            None => Patch::add(vec![key.to_string()], new_value),
            Some(old) => {
                let old_value = self.detached_snapshot(&old);
                if let Slot::Node(evicted) = old {
                    self.tombstone(evicted);
                }
                Patch::replace(vec![key.to_string()], new_value, old_value)
            }
        };
        self.emit_patches(node, Some(key), vec![patch])
    }

    /// Snapshot of a slot that may already have been unlinked
    fn detached_snapshot(&self, slot: &Slot) -> Option<Value> {
        self.slot_snapshot(slot).ok()
    }

    /// Number of children of `node`
    ///
    /// # Errors
    ///
    /// Returns `NodeNotFound` or `NodeDestroyed` if `node` is not live.
    pub fn len(&self, node: NodeId) -> Result<usize> {
        Ok(self.get_node(node)?.len())
    }

    /// Keys of `node` in order: property names, indices or map keys
    ///
    /// # Errors
    ///
    /// Returns `NodeNotFound` or `NodeDestroyed` if `node` is not live.
    pub fn keys(&self, node: NodeId) -> Result<Vec<String>> {
        Ok(self.get_node(node)?.keys())
    }

    /// Remove `delete_count` elements at `start` and insert `inserts` there
    ///
    /// Returns snapshots of the removed elements. The removed nodes are
    /// destroyed.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedOperation` if `node` is not an array, `InvalidKey`
    /// if `start` is past the end, and any error an assignment of each
    /// insert would raise. Nothing changes on error.
    pub fn splice(
        &mut self,
        node: NodeId,
        start: usize,
        delete_count: usize,
        inserts: Vec<Input>,
    ) -> Result<Vec<Value>> {
        self.splice_impl(node, start, delete_count, inserts, true)
    }

    fn splice_impl(
        &mut self,
        node: NodeId,
        start: usize,
        delete_count: usize,
        inserts: Vec<Input>,
        destroy: bool,
    ) -> Result<Vec<Value>> {
        if self.container_kind(node)? != ContainerKind::Array {
            return Err(self.unsupported(node, "splice"));
        }
        let len = self.len(node)?;
        if start > len {
            return Err(self.invalid_key(node, &start.to_string()));
        }
        let delete_count = delete_count.min(len - start);
        let element = self.get_child_type(node, "0")?;
        let base = self.path_parts(node)?;
        let pointer_at = |index: usize| {
            let mut parts = base.clone();
            parts.push(index.to_string());
            format_pointer(&parts)
        };

        let mut seen: Vec<(NodeId, usize)> = Vec::new();
        for (offset, input) in inserts.iter().enumerate() {
            if let Input::Node(id) = input {
                if let Some((_, first)) = seen.iter().find(|(other, _)| other == id) {
                    return Err(StateTreeError::ParentConflict {
                        attempted_path: pointer_at(start + offset),
                        existing_path: pointer_at(start + first),
                    });
                }
                seen.push((*id, offset));
            }
        }

        let mut prepared = Vec::with_capacity(inserts.len());
        for (offset, input) in inserts.into_iter().enumerate() {
            let mut target = base.clone();
            target.push((start + offset).to_string());
            prepared.push(self.prepare(node, &element, input, &target)?);
        }

        let removed_values = (start..start + delete_count)
            .map(|index| self.get_value(node, &index.to_string()))
            .collect::<Result<Vec<_>>>()?;

        let new_slots: Vec<Slot> = prepared
            .into_iter()
            .enumerate()
            .map(|(offset, p)| self.materialize(p, node, &(start + offset).to_string()))
            .collect();
        let added_values = new_slots
            .iter()
            .map(|slot| self.slot_snapshot(slot))
            .collect::<Result<Vec<_>>>()?;
        let inserted = new_slots.len();

        let (removed, shifted) = {
            let container = self.get_node_mut(node)?;
            let NodeValue::Array(items) = &mut container.value else {
                return Err(StateTreeError::Internal {
                    message: "array node lost its elements".to_string(),
                });
            };
            let removed: Vec<Slot> = items
                .splice(start..start + delete_count, new_slots)
                .collect();
            let shifted: Vec<(usize, NodeId)> = items
                .iter()
                .enumerate()
                .skip(start + inserted)
                .filter_map(|(index, slot)| slot.as_node().map(|id| (index, id)))
                .collect();
            (removed, shifted)
        };

        for (index, id) in shifted {
            if let Some(child) = self.nodes.get_mut(&id) {
                child.segment = Some(index.to_string());
            }
        }
        for id in removed.iter().filter_map(Slot::as_node) {
            if destroy {
                self.tombstone(id);
            } else {
                self.unlink(id);
            }
        }

        let mut patches = Vec::with_capacity(delete_count + inserted);
        for (offset, old) in removed_values.iter().enumerate().rev() {
            patches.push(Patch::remove(
                vec![(start + offset).to_string()],
                Some(old.clone()),
            ));
        }
        for (offset, value) in added_values.into_iter().enumerate() {
            patches.push(Patch::add(vec![(start + offset).to_string()], value));
        }
        if !patches.is_empty() {
            self.emit_patches(node, None, patches)?;
        }
        Ok(removed_values)
    }

    /// Append an element to an array node
    ///
    /// # Errors
    ///
    /// As `splice`.
    pub fn push(&mut self, node: NodeId, input: impl Into<Input>) -> Result<()> {
        let len = self.len(node)?;
        self.splice(node, len, 0, vec![input.into()]).map(|_| ())
    }

    /// Insert an element before `index`; `index == len` appends
    ///
    /// # Errors
    ///
    /// As `splice`.
    pub fn insert(&mut self, node: NodeId, index: usize, input: impl Into<Input>) -> Result<()> {
        self.splice(node, index, 0, vec![input.into()]).map(|_| ())
    }

    /// Remove and destroy element `index`, returning its snapshot
    ///
    /// # Errors
    ///
    /// Returns `InvalidKey` if `index` is out of range; otherwise as `splice`.
    pub fn remove(&mut self, node: NodeId, index: usize) -> Result<Value> {
        if index >= self.len(node)? {
            return Err(self.invalid_key(node, &index.to_string()));
        }
        let mut removed = self.splice(node, index, 1, Vec::new())?;
        removed.pop().ok_or_else(|| StateTreeError::Internal {
            message: "splice removed nothing".to_string(),
        })
    }

    /// Remove and destroy every element of an array node
    ///
    /// # Errors
    ///
    /// As `splice`.
    pub fn clear(&mut self, node: NodeId) -> Result<()> {
        let len = self.len(node)?;
        self.splice(node, 0, len, Vec::new()).map(|_| ())
    }

    /// Delete entry `key` of a map node, returning its snapshot
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedOperation` if `node` is not a map and `InvalidKey`
    /// if the key is absent.
    pub fn map_delete(&mut self, node: NodeId, key: &str) -> Result<Value> {
        self.map_delete_impl(node, key, true)
    }

    fn map_delete_impl(&mut self, node: NodeId, key: &str, destroy: bool) -> Result<Value> {
        if self.container_kind(node)? != ContainerKind::Map {
            return Err(self.unsupported(node, "map_delete"));
        }
        let old_value = self.get_value(node, key)?;
        let removed = {
            let container = self.get_node_mut(node)?;
            match &mut container.value {
                NodeValue::Map(entries) => entries.shift_remove(key),
                _ => None,
            }
        };
        if let Some(Slot::Node(id)) = removed {
            if destroy {
                self.tombstone(id);
            } else {
                self.unlink(id);
            }
        }
        self.emit_patches(
            node,
            Some(key),
            vec![Patch::remove(vec![key.to_string()], Some(old_value.clone()))],
        )?;
        Ok(old_value)
    }

    /// Clear a `maybe` model property to null
    fn clear_property(&mut self, node: NodeId, key: &str, destroy: bool) -> Result<()> {
        let ty = self.get_child_type(node, key)?;
        if !ty.is_maybe() {
            let target = self.target_parts(node, key)?;
            return Err(StateTreeError::single_violation(
                ty.name(),
                format_pointer(&target),
                "value is required",
            ));
        }
        let old_value = self.get_value(node, key)?;
        let old = {
            let container = self.get_node_mut(node)?;
            match &mut container.value {
                NodeValue::Model(props) => props.insert(key.to_string(), Slot::Leaf(Value::Null)),
                _ => None,
            }
        };
        if let Some(Slot::Node(id)) = old {
            if destroy {
                self.tombstone(id);
            } else {
                self.unlink(id);
            }
        }
        self.emit_patches(
            node,
            Some(key),
            vec![Patch::replace(vec![key.to_string()], Value::Null, Some(old_value))],
        )
    }

    /// Take `node` out of its parent without destroying it
    ///
    /// The node becomes the root of its own tree and can be attached
    /// elsewhere. Detaching a root does nothing.
    ///
    /// # Errors
    ///
    /// Returns `Validation` if `node` fills a model property that is not
    /// `maybe`.
    pub fn detach(&mut self, node: NodeId) -> Result<()> {
        self.remove_from_parent(node, false)
    }

    /// Detach `node` if attached and mark it and its subtree destroyed
    ///
    /// # Errors
    ///
    /// Returns `NodeDestroyed` if already destroyed, and `Validation` if
    /// `node` fills a model property that is not `maybe`.
    pub fn destroy(&mut self, node: NodeId) -> Result<()> {
        crate::log_op!("destroy", self.destroy_impl(node))
    }

    fn destroy_impl(&mut self, node: NodeId) -> Result<()> {
        if self.get_node(node)?.is_root() {
            self.tombstone(node);
            Ok(())
        } else {
            self.remove_from_parent(node, true)
        }
    }

    fn remove_from_parent(&mut self, node: NodeId, destroy: bool) -> Result<()> {
        let child = self.get_node(node)?;
        let (Some(parent), Some(segment)) = (child.parent, child.segment.clone()) else {
            return Ok(());
        };
        match self.container_kind(parent)? {
            ContainerKind::Array => {
                let index = parse_index(&segment).ok_or_else(|| StateTreeError::Internal {
                    message: format!("array child with segment '{}'", segment),
                })?;
                self.splice_impl(parent, index, 1, Vec::new(), destroy)
                    .map(|_| ())
            }
            ContainerKind::Map => self.map_delete_impl(parent, &segment, destroy).map(|_| ()),
            ContainerKind::Model => self.clear_property(parent, &segment, destroy),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patch::PatchOp;
    use crate::types::Type;
    use serde_json::json;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn doc_type() -> Type {
        let row = Type::model("Row").prop_default("article_id", json!(0)).build();
        Type::model("Document")
            .prop("rows", Type::array(row.clone()))
            .prop("lookup", Type::map(row.clone()))
            .prop("selected", Type::maybe(row))
            .prop_default("customer_id", json!(0))
            .build()
    }

    fn recorded(store: &mut Store, node: NodeId) -> Rc<RefCell<Vec<Patch>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = log.clone();
        store
            .on_patch(node, move |p| sink.borrow_mut().push(p.clone()))
            .unwrap();
        log
    }

    #[test]
    fn test_set_primitive_property() {
        let mut store = Store::new();
        let doc = store.create(&doc_type(), json!({})).unwrap();
        let log = recorded(&mut store, doc);

        store.set(doc, "customer_id", json!(4)).unwrap();

        assert_eq!(store.get_value(doc, "customer_id").unwrap(), json!(4));
        let patches = log.borrow();
        assert_eq!(patches.len(), 1);
        assert_eq!(patches[0].op, PatchOp::Replace);
        assert_eq!(patches[0].pointer(), "/customer_id");
        assert_eq!(patches[0].old_value, Some(json!(0)));
    }

    #[test]
    fn test_set_rejects_bad_value_without_change() {
        let mut store = Store::new();
        let doc = store.create(&doc_type(), json!({})).unwrap();
        let log = recorded(&mut store, doc);

        let result = store.set(doc, "customer_id", json!("four"));

        match result {
            Err(StateTreeError::Validation { violations, .. }) => {
                assert_eq!(violations[0].path, "/customer_id")
            }
            other => panic!("expected validation error, got {:?}", other),
        }
        assert_eq!(store.get_value(doc, "customer_id").unwrap(), json!(0));
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_set_unknown_property() {
        let mut store = Store::new();
        let doc = store.create(&doc_type(), json!({})).unwrap();
        assert!(matches!(
            store.set(doc, "nope", json!(1)),
            Err(StateTreeError::InvalidKey { .. })
        ));
    }

    #[test]
    fn test_splice_patch_order() {
        let mut store = Store::new();
        let doc = store
            .create(&doc_type(), json!({"rows": [{"article_id": 1}, {"article_id": 2}, {"article_id": 3}]}))
            .unwrap();
        let rows = store.child(doc, "rows").unwrap();
        let log = recorded(&mut store, doc);

        let removed = store
            .splice(rows, 0, 2, vec![Input::Value(json!({"article_id": 9}))])
            .unwrap();

        assert_eq!(removed, vec![json!({"article_id": 1}), json!({"article_id": 2})]);
        let pointers: Vec<(PatchOp, String)> =
            log.borrow().iter().map(|p| (p.op, p.pointer())).collect();
        assert_eq!(
            pointers,
            vec![
                (PatchOp::Remove, "/rows/1".to_string()),
                (PatchOp::Remove, "/rows/0".to_string()),
                (PatchOp::Add, "/rows/0".to_string()),
            ]
        );
        assert_eq!(
            store.snapshot(rows).unwrap(),
            json!([{"article_id": 9}, {"article_id": 3}])
        );
    }

    #[test]
    fn test_splice_renumbers_siblings() {
        let mut store = Store::new();
        let doc = store.create(&doc_type(), json!({"rows": [{}, {}]})).unwrap();
        let rows = store.child(doc, "rows").unwrap();
        let second = store.child(rows, "1").unwrap();

        store.insert(rows, 0, json!({"article_id": 5})).unwrap();

        assert_eq!(store.path(second).unwrap(), "/rows/2");
    }

    #[test]
    fn test_splice_out_of_range() {
        let mut store = Store::new();
        let doc = store.create(&doc_type(), json!({})).unwrap();
        let rows = store.child(doc, "rows").unwrap();
        assert!(matches!(
            store.splice(rows, 1, 0, Vec::new()),
            Err(StateTreeError::InvalidKey { .. })
        ));
        assert!(matches!(store.remove(rows, 0), Err(StateTreeError::InvalidKey { .. })));
    }

    #[test]
    fn test_splice_on_model_is_unsupported() {
        let mut store = Store::new();
        let doc = store.create(&doc_type(), json!({})).unwrap();
        assert!(matches!(
            store.push(doc, json!({})),
            Err(StateTreeError::UnsupportedOperation { .. })
        ));
    }

    #[test]
    fn test_map_add_replace_remove() {
        let mut store = Store::new();
        let doc = store.create(&doc_type(), json!({})).unwrap();
        let lookup = store.child(doc, "lookup").unwrap();
        let log = recorded(&mut store, doc);

        store.map_set(lookup, "a", json!({"article_id": 1})).unwrap();
        let first = store.child(lookup, "a").unwrap();
        store.map_set(lookup, "a", json!({"article_id": 2})).unwrap();
        let removed = store.map_delete(lookup, "a").unwrap();

        let ops: Vec<PatchOp> = log.borrow().iter().map(|p| p.op).collect();
        assert_eq!(ops, vec![PatchOp::Add, PatchOp::Replace, PatchOp::Remove]);
        assert_eq!(removed, json!({"article_id": 2}));
        assert!(store.is_destroyed(first));
        assert!(store.keys(lookup).unwrap().is_empty());
    }

    #[test]
    fn test_reassigning_same_node_is_noop() {
        let mut store = Store::new();
        let doc = store.create(&doc_type(), json!({"selected": {}})).unwrap();
        let selected = store.child(doc, "selected").unwrap();
        let log = recorded(&mut store, doc);

        store.set(doc, "selected", selected).unwrap();

        assert!(log.borrow().is_empty());
        assert!(store.is_alive(selected));
    }

    #[test]
    fn test_detach_and_reattach_moves_node() {
        let mut store = Store::new();
        let doc = store.create(&doc_type(), json!({"rows": [{"article_id": 7}]})).unwrap();
        let rows = store.child(doc, "rows").unwrap();
        let row = store.child(rows, "0").unwrap();
        let log = recorded(&mut store, doc);

        store.detach(row).unwrap();
        assert!(store.get_node(row).unwrap().is_root());
        store.set(doc, "selected", row).unwrap();

        assert_eq!(store.path(row).unwrap(), "/selected");
        let ops: Vec<(PatchOp, String)> =
            log.borrow().iter().map(|p| (p.op, p.pointer())).collect();
        assert_eq!(
            ops,
            vec![
                (PatchOp::Remove, "/rows/0".to_string()),
                (PatchOp::Replace, "/selected".to_string()),
            ]
        );
    }

    #[test]
    fn test_detach_required_property_fails() {
        let mut store = Store::new();
        let doc = store.create(&doc_type(), json!({})).unwrap();
        let rows = store.child(doc, "rows").unwrap();
        assert!(matches!(
            store.detach(rows),
            Err(StateTreeError::Validation { .. })
        ));
        assert_eq!(store.parent(rows).unwrap(), doc);
    }

    #[test]
    fn test_attach_node_of_other_type_fails() {
        let mut store = Store::new();
        let doc = store.create(&doc_type(), json!({})).unwrap();
        let rows = store.child(doc, "rows").unwrap();
        let lookalike = Type::model("Row").prop_default("article_id", json!(0)).build();
        let stranger = store.create(&lookalike, json!({})).unwrap();

        assert!(matches!(
            store.push(rows, stranger),
            Err(StateTreeError::Validation { .. })
        ));
        assert!(store.get_node(stranger).unwrap().is_root());
        assert_eq!(store.len(rows).unwrap(), 0);
    }
}
