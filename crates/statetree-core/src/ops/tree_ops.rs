//! Tree navigation: paths, parents, roots, types and path resolution

use statetree_core_types::NodeId;

use super::store::Store;
use crate::errors::{Result, StateTreeError};
use crate::model::{ContainerKind, Slot};
use crate::path::{format_pointer, format_relative, parse_pointer, parse_relative};
use crate::types::{Type, TypeKind};

impl Store {
    /// Segments from the root down to `node`; empty for a root
    ///
    /// # Errors
    ///
    /// Returns `NodeNotFound` or `NodeDestroyed` if `node` is not live.
    pub fn path_parts(&self, node: NodeId) -> Result<Vec<String>> {
        let (_, mut segments) = self.ancestry(node)?;
        segments.reverse();
        Ok(segments)
    }

    /// Pointer-formatted path of `node`; `/` for a root
    ///
    /// # Errors
    ///
    /// Returns `NodeNotFound` or `NodeDestroyed` if `node` is not live.
    pub fn path(&self, node: NodeId) -> Result<String> {
        Ok(format_pointer(&self.path_parts(node)?))
    }

    /// Direct parent of `node`
    ///
    /// # Errors
    ///
    /// Returns `NoParentAtDepth` if `node` is a root.
    pub fn parent(&self, node: NodeId) -> Result<NodeId> {
        self.parent_at(node, 1)
    }

    /// Ancestor `depth` levels above `node`; depth 0 is the node itself
    ///
    /// # Errors
    ///
    /// Returns `NoParentAtDepth` if the ancestor chain is shorter than `depth`.
    pub fn parent_at(&self, node: NodeId, depth: usize) -> Result<NodeId> {
        let mut current = self.get_node(node)?;
        for _ in 0..depth {
            match current.parent {
                Some(parent) => current = self.get_node(parent)?,
                None => {
                    return Err(StateTreeError::NoParentAtDepth {
                        path: self.path(node)?,
                        depth,
                    })
                }
            }
        }
        Ok(current.id)
    }

    /// # Errors
    ///
    /// Returns `NodeNotFound` or `NodeDestroyed` if `node` is not live.
    pub fn has_parent(&self, node: NodeId) -> Result<bool> {
        self.has_parent_at(node, 1)
    }

    /// # Errors
    ///
    /// Returns `NodeNotFound` or `NodeDestroyed` if `node` is not live.
    pub fn has_parent_at(&self, node: NodeId, depth: usize) -> Result<bool> {
        let (chain, _) = self.ancestry(node)?;
        Ok(chain.len() > depth)
    }

    /// # Errors
    ///
    /// Returns `NodeNotFound` or `NodeDestroyed` if `node` is not live.
    pub fn root(&self, node: NodeId) -> Result<NodeId> {
        let (chain, _) = self.ancestry(node)?;
        Ok(chain.last().copied().unwrap_or(node))
    }

    /// Type descriptor of `node`
    ///
    /// # Errors
    ///
    /// Returns `NodeNotFound` or `NodeDestroyed` if `node` is not live.
    pub fn get_type(&self, node: NodeId) -> Result<Type> {
        Ok(self.get_node(node)?.ty.clone())
    }

    /// Declared type of the child slot `key`, without materializing it
    ///
    /// For arrays and maps this is the element type, whatever the key.
    ///
    /// # Errors
    ///
    /// Returns `InvalidKey` if a model declares no property `key`.
    pub fn get_child_type(&self, node: NodeId, key: &str) -> Result<Type> {
        let ty = &self.get_node(node)?.ty;
        match ty.kind() {
            TypeKind::Model(def) => def.property(key).cloned().ok_or_else(|| {
                StateTreeError::InvalidKey {
                    path: self.path(node).unwrap_or_default(),
                    key: key.to_string(),
                }
            }),
            TypeKind::Array(element) | TypeKind::Map(element) => Ok(element.clone()),
            _ => Err(StateTreeError::Internal {
                message: format!("node of non-composite type '{}'", ty.name()),
            }),
        }
    }

    pub(crate) fn container_kind(&self, node: NodeId) -> Result<ContainerKind> {
        Ok(self.get_node(node)?.value.kind())
    }

    /// Follow child segments from `base`
    ///
    /// Returns `None` when a segment is missing or names a leaf.
    ///
    /// # Errors
    ///
    /// Returns `NodeNotFound` or `NodeDestroyed` if `base` is not live.
    pub fn resolve(&self, base: NodeId, parts: &[String]) -> Result<Option<NodeId>> {
        let mut current = self.get_node(base)?;
        for part in parts {
            match current.slot(part) {
                Some(Slot::Node(child)) => current = self.get_node(*child)?,
                _ => return Ok(None),
            }
        }
        Ok(Some(current.id))
    }

    /// Resolve a pointer relative to `base`
    ///
    /// # Errors
    ///
    /// Returns `NodeNotFound` or `NodeDestroyed` if `base` is not live.
    pub fn resolve_path(&self, base: NodeId, pointer: &str) -> Result<Option<NodeId>> {
        self.resolve(base, &parse_pointer(pointer))
    }

    /// Relative pointer from `from` to `to`, climbing to their nearest
    /// common ancestor and descending from there
    ///
    /// # Errors
    ///
    /// Returns `InvalidReference` if the two nodes live in different trees.
    pub fn relative_pointer(&self, from: NodeId, to: NodeId) -> Result<String> {
        let (from_chain, _) = self.ancestry(from)?;
        let (to_chain, to_segments) = self.ancestry(to)?;
        let common = to_chain
            .iter()
            .enumerate()
            .find_map(|(down, id)| from_chain.iter().position(|a| a == id).map(|up| (up, down)));
        let Some((ups, downs)) = common else {
            return Err(StateTreeError::InvalidReference {
                path: self.path(from)?,
                reason: "target lives in a different tree".to_string(),
            });
        };
        let parts: Vec<String> = to_segments[..downs].iter().rev().cloned().collect();
        Ok(format_relative(ups, &parts))
    }

    /// Resolve a relative pointer from `base`
    ///
    /// Returns `None` when the climb passes the root or a segment is
    /// missing.
    ///
    /// # Errors
    ///
    /// Returns `NodeNotFound` or `NodeDestroyed` if `base` is not live.
    pub fn resolve_relative(&self, base: NodeId, ups: usize, parts: &[String]) -> Result<Option<NodeId>> {
        let mut current = base;
        for _ in 0..ups {
            match self.get_node(current)?.parent {
                Some(parent) => current = parent,
                None => return Ok(None),
            }
        }
        self.resolve(current, parts)
    }

    /// Resolve the reference stored in slot `key` of `node`
    ///
    /// The stored relative pointer is followed from `node`, so references
    /// inside a subtree keep resolving after the subtree is cloned or
    /// attached under a new parent. Returns `None` for an empty `maybe`
    /// reference.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedOperation` if the slot is not a reference, and
    /// `InvalidReference` if the stored pointer no longer names a node of the
    /// target type.
    pub fn resolve_reference(&self, node: NodeId, key: &str) -> Result<Option<NodeId>> {
        let slot_ty = self.get_child_type(node, key)?;
        let slot_path = {
            let mut parts = self.path_parts(node)?;
            parts.push(key.to_string());
            format_pointer(&parts)
        };
        let TypeKind::Reference(target_ty) = slot_ty.base().kind() else {
            return Err(StateTreeError::UnsupportedOperation {
                op: "resolve_reference".to_string(),
                path: slot_path,
                type_name: slot_ty.name().to_string(),
            });
        };

        let pointer = match self.get_node(node)?.slot(key) {
            Some(Slot::Leaf(serde_json::Value::String(pointer))) => pointer.clone(),
            Some(Slot::Leaf(serde_json::Value::Null)) => return Ok(None),
            _ => {
                return Err(StateTreeError::InvalidKey {
                    path: self.path(node)?,
                    key: key.to_string(),
                })
            }
        };
        let Some((ups, parts)) = parse_relative(&pointer) else {
            return Err(StateTreeError::InvalidReference {
                path: slot_path,
                reason: format!("'{}' is not a relative pointer", pointer),
            });
        };

        match self.resolve_relative(node, ups, &parts)? {
            Some(id) if self.get_node(id)?.ty == *target_ty => Ok(Some(id)),
            Some(id) => Err(StateTreeError::InvalidReference {
                path: slot_path,
                reason: format!(
                    "'{}' is a {}, expected a {}",
                    pointer,
                    self.get_node(id)?.ty.name(),
                    target_ty.name()
                ),
            }),
            None => Err(StateTreeError::InvalidReference {
                path: slot_path,
                reason: format!("no node at '{}'", pointer),
            }),
        }
    }
}
