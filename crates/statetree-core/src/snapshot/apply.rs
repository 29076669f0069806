//! Snapshot reconciliation
//!
//! `apply_snapshot` moves a live node to the state described by a snapshot
//! through ordinary primitive mutations, so listeners see the usual patches.
//! Child nodes whose slot still holds a composite of the same type are
//! updated in place and keep their identity; equal leaves are left alone.
//! New map keys are appended after the surviving ones.

use serde_json::Value;
use statetree_core_types::NodeId;

use crate::errors::{Result, StateTreeError};
use crate::model::{ContainerKind, Input, Slot};
use crate::ops::Store;
use crate::types::Type;

impl Store {
    /// Reconcile `node` with `snapshot`
    ///
    /// Capture a snapshot before a risky action and apply it on failure to
    /// roll the tree back.
    ///
    /// # Errors
    ///
    /// Returns `Validation` if `snapshot` does not satisfy the node's type;
    /// the node is unchanged in that case.
    pub fn apply_snapshot(&mut self, node: NodeId, snapshot: Value) -> Result<()> {
        crate::log_op!("apply_snapshot", self.apply_snapshot_impl(node, &snapshot))
    }

    pub(crate) fn apply_snapshot_impl(&mut self, node: NodeId, snapshot: &Value) -> Result<()> {
        let ty = self.get_type(node)?;
        let violations = ty.validate_from(Some(snapshot), self.path_parts(node)?);
        if !violations.is_empty() {
            return Err(StateTreeError::Validation {
                type_name: ty.name().to_string(),
                violations,
            });
        }
        self.reconcile(node, snapshot)
    }

    fn reconcile(&mut self, node: NodeId, snapshot: &Value) -> Result<()> {
        let ty = self.get_type(node)?;
        match self.container_kind(node)? {
            ContainerKind::Model => {
                let properties: Vec<(String, Type)> = ty
                    .as_model()
                    .map(|def| {
                        def.properties()
                            .map(|(key, prop)| (key.to_string(), prop.clone()))
                            .collect()
                    })
                    .unwrap_or_default();
                for (key, prop_ty) in properties {
                    self.reconcile_slot(node, &key, &prop_ty, snapshot.get(&key))?;
                }
            }
            ContainerKind::Array => {
                let element = self.get_child_type(node, "0")?;
                let items = snapshot.as_array().cloned().unwrap_or_default();
                let len = self.len(node)?;
                for (index, item) in items.iter().enumerate().take(len) {
                    self.reconcile_slot(node, &index.to_string(), &element, Some(item))?;
                }
                if items.len() < len {
                    self.splice(node, items.len(), len - items.len(), Vec::new())?;
                } else if items.len() > len {
                    let tail = items[len..].iter().cloned().map(Input::Value).collect();
                    self.splice(node, len, 0, tail)?;
                }
            }
            ContainerKind::Map => {
                let element = self.get_child_type(node, "")?;
                let entries = snapshot.as_object().cloned().unwrap_or_default();
                for key in self.keys(node)? {
                    if !entries.contains_key(&key) {
                        self.map_delete(node, &key)?;
                    }
                }
                for (key, item) in &entries {
                    if self.get_node(node)?.slot(key).is_some() {
                        self.reconcile_slot(node, key, &element, Some(item))?;
                    } else {
                        self.map_set(node, key, item.clone())?;
                    }
                }
            }
        }
        Ok(())
    }

    fn reconcile_slot(
        &mut self,
        node: NodeId,
        key: &str,
        ty: &Type,
        value: Option<&Value>,
    ) -> Result<()> {
        let value = match value {
            Some(v) => v.clone(),
            None => ty.default_snapshot().unwrap_or(Value::Null),
        };
        let current = self.get(node, key)?.clone();
        match current {
            Slot::Node(child) if !value.is_null() && self.get_node(child)?.ty == *ty.base() => {
                self.reconcile(child, &value)
            }
            Slot::Leaf(current) if current == value => Ok(()),
            _ => self.set(node, key, value),
        }
    }
}
