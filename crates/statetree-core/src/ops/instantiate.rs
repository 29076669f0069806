//! Node construction and attachment
//!
//! Values are validated in full before any node is built, so a failed
//! `create` or assignment leaves the store untouched.

use indexmap::IndexMap;
use serde_json::Value;
use statetree_core_types::NodeId;

use super::store::Store;
use crate::errors::{Result, StateTreeError};
use crate::model::{Input, Node, NodeValue, Slot};
use crate::path::format_pointer;
use crate::types::{Type, TypeKind};

/// Checked, ready-to-apply content for one slot
#[derive(Debug)]
pub(crate) enum Prepared {
    Leaf(Value),
    /// Existing unattached node
    Attach(NodeId),
    /// Validated snapshot to instantiate
    Build(Type, Value),
}

impl Store {
    /// Create a new root node of `ty` from a (possibly partial) snapshot
    ///
    /// Absent properties are filled from their declared defaults.
    ///
    /// # Errors
    ///
    /// Returns `NotComposite` for primitive, frozen and reference types, and
    /// `Validation` listing every violated path if `snapshot` does not
    /// satisfy `ty`.
    pub fn create(&mut self, ty: &Type, snapshot: Value) -> Result<NodeId> {
        crate::log_op!("create", self.create_impl(ty, Some(&snapshot)))
    }

    /// Create a new root node of `ty` entirely from defaults
    ///
    /// # Errors
    ///
    /// Same as `create`.
    pub fn create_default(&mut self, ty: &Type) -> Result<NodeId> {
        crate::log_op!("create", self.create_impl(ty, None))
    }

    fn create_impl(&mut self, ty: &Type, snapshot: Option<&Value>) -> Result<NodeId> {
        if !ty.base().is_composite() {
            return Err(StateTreeError::NotComposite {
                type_name: ty.name().to_string(),
            });
        }

        let violations = ty.validate_optional(snapshot);
        if !violations.is_empty() {
            return Err(StateTreeError::Validation {
                type_name: ty.name().to_string(),
                violations,
            });
        }

        match self.build(ty, snapshot) {
            Slot::Node(id) => {
                tracing::debug!(node_id = %id, type_name = ty.name(), "created node");
                Ok(id)
            }
            // An empty maybe has no node to hand back
            Slot::Leaf(_) => Err(StateTreeError::NotComposite {
                type_name: ty.name().to_string(),
            }),
        }
    }

    /// Instantiate an already validated value as a detached slot
    pub(crate) fn build(&mut self, ty: &Type, value: Option<&Value>) -> Slot {
        let owned;
        let value = match value {
            Some(v) => v,
            None => {
                owned = ty.default_snapshot().unwrap_or(Value::Null);
                &owned
            }
        };

        match ty.kind() {
            TypeKind::Primitive(_) | TypeKind::Frozen | TypeKind::Reference(_) => {
                Slot::Leaf(value.clone())
            }
            TypeKind::Maybe(inner) => {
                if value.is_null() {
                    Slot::Leaf(Value::Null)
                } else {
                    self.build(inner, Some(value))
                }
            }
            TypeKind::WithDefault(inner, _) => self.build(inner, Some(value)),
            TypeKind::Model(def) => {
                let object = value.as_object();
                let mut props = IndexMap::with_capacity(def.properties.len());
                for (key, prop_ty) in &def.properties {
                    let slot = self.build(prop_ty, object.and_then(|o| o.get(key)));
                    props.insert(key.clone(), slot);
                }
                self.adopt(ty, NodeValue::Model(props))
            }
            TypeKind::Array(element) => {
                let items = value
                    .as_array()
                    .map(|items| items.iter().map(|item| self.build(element, Some(item))).collect())
                    .unwrap_or_default();
                self.adopt(ty, NodeValue::Array(items))
            }
            TypeKind::Map(element) => {
                let mut entries = IndexMap::new();
                if let Some(object) = value.as_object() {
                    for (key, item) in object {
                        let slot = self.build(element, Some(item));
                        entries.insert(key.clone(), slot);
                    }
                }
                self.adopt(ty, NodeValue::Map(entries))
            }
        }
    }

    /// Insert a fresh node owning the given children
    fn adopt(&mut self, ty: &Type, value: NodeValue) -> Slot {
        let id = NodeId::new();
        let node = Node::new(id, ty.clone(), value);
        for (key, child) in node.keys().into_iter().zip(slots_of(&node.value)) {
            if let Some(child) = child.as_node() {
                if let Some(child_node) = self.nodes.get_mut(&child) {
                    child_node.parent = Some(id);
                    child_node.segment = Some(key);
                }
            }
        }
        self.insert_node(node);
        Slot::Node(id)
    }

    /// Check an input against the declared type of a target slot
    ///
    /// `target` is the absolute path of the slot. Nothing is mutated.
    pub(crate) fn prepare(
        &self,
        container: NodeId,
        slot_ty: &Type,
        input: Input,
        target: &[String],
    ) -> Result<Prepared> {
        match input {
            Input::Value(value) => {
                let violations = slot_ty.validate_from(Some(&value), target.to_vec());
                if !violations.is_empty() {
                    return Err(StateTreeError::Validation {
                        type_name: slot_ty.name().to_string(),
                        violations,
                    });
                }
                if slot_ty.base().is_composite() {
                    Ok(Prepared::Build(slot_ty.clone(), value))
                } else {
                    Ok(Prepared::Leaf(value))
                }
            }
            Input::Node(id) => {
                let node = self.get_node(id)?;
                let base = slot_ty.base();
                match base.kind() {
                    TypeKind::Reference(target_ty) => {
                        if node.ty != *target_ty {
                            return Err(StateTreeError::InvalidReference {
                                path: format_pointer(target),
                                reason: format!(
                                    "expected a {}, got a {}",
                                    target_ty.name(),
                                    node.ty.name()
                                ),
                            });
                        }
                        if self.root(id)? != self.root(container)? {
                            return Err(StateTreeError::InvalidReference {
                                path: format_pointer(target),
                                reason: "target lives in a different tree".to_string(),
                            });
                        }
                        // relative to the holding node
                        let pointer = self.relative_pointer(container, id)?;
                        Ok(Prepared::Leaf(Value::String(pointer)))
                    }
                    _ if base.is_composite() => {
                        if node.ty != *base {
                            return Err(StateTreeError::single_violation(
                                slot_ty.name(),
                                format_pointer(target),
                                format!("expected {}, got a node of {}", base.name(), node.ty.name()),
                            ));
                        }
                        if node.parent.is_some() {
                            return Err(StateTreeError::ParentConflict {
                                attempted_path: format_pointer(target),
                                existing_path: self.path(id)?,
                            });
                        }
                        if self.root(container)? == id {
                            return Err(StateTreeError::CycleDetected {
                                path: format_pointer(target),
                            });
                        }
                        Ok(Prepared::Attach(id))
                    }
                    _ => {
                        let snapshot = self.snapshot(id)?;
                        self.prepare(container, slot_ty, Input::Value(snapshot), target)
                    }
                }
            }
        }
    }

    /// Turn prepared content into a slot owned by `parent` at `segment`
    pub(crate) fn materialize(&mut self, prepared: Prepared, parent: NodeId, segment: &str) -> Slot {
        let slot = match prepared {
            Prepared::Leaf(value) => Slot::Leaf(value),
            Prepared::Attach(id) => Slot::Node(id),
            Prepared::Build(ty, value) => self.build(&ty, Some(&value)),
        };
        if let Some(child) = slot.as_node() {
            self.link(child, parent, segment);
        }
        slot
    }

    pub(crate) fn link(&mut self, child: NodeId, parent: NodeId, segment: &str) {
        if let Some(node) = self.nodes.get_mut(&child) {
            node.parent = Some(parent);
            node.segment = Some(segment.to_string());
            tracing::debug!(node_id = %child, parent = %parent, segment, "attached node");
        }
    }

    pub(crate) fn unlink(&mut self, child: NodeId) {
        if let Some(node) = self.nodes.get_mut(&child) {
            node.parent = None;
            node.segment = None;
            tracing::debug!(node_id = %child, "detached node");
        }
    }
}

fn slots_of(value: &NodeValue) -> Vec<Slot> {
    match value {
        NodeValue::Model(props) | NodeValue::Map(props) => props.values().cloned().collect(),
        NodeValue::Array(items) => items.clone(),
    }
}
