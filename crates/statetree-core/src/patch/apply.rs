//! Patch replay
//!
//! Applies patches through the ordinary mutators, so the target tree emits
//! its own patches while replaying. Replay is not transactional: when a
//! patch fails, the patches before it stay applied.

use serde_json::Value;
use statetree_core_types::NodeId;

use super::{Patch, PatchOp};
use crate::errors::{Result, StateTreeError};
use crate::model::ContainerKind;
use crate::ops::Store;
use crate::path::{format_pointer, parse_index};

impl Store {
    /// Apply one patch to the tree rooted at `root`
    ///
    /// The patch path is resolved relative to `root`. A `replace` with an
    /// empty path reconciles `root` itself with the patch value.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPatchTarget` if the path does not name a slot the
    /// operation can apply to or the value does not fit the slot's type.
    pub fn apply_patch(&mut self, root: NodeId, patch: &Patch) -> Result<()> {
        self.apply_patch_impl(root, patch).map_err(|e| match e {
            StateTreeError::Validation { violations, .. } => {
                let reason = violations
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("; ");
                invalid_target(patch, &reason)
            }
            StateTreeError::InvalidKey { key, .. } => {
                invalid_target(patch, &format!("invalid key '{}'", key))
            }
            other => other,
        })
    }

    fn apply_patch_impl(&mut self, root: NodeId, patch: &Patch) -> Result<()> {
        let Some((key, container_path)) = patch.path.split_last() else {
            return match (patch.op, &patch.value) {
                (PatchOp::Replace, Some(value)) => self.apply_snapshot_impl(root, value),
                _ => Err(invalid_target(patch, "only a replace with a value can target the root")),
            };
        };

        let container = self
            .resolve(root, container_path)?
            .ok_or_else(|| invalid_target(patch, "no node at the parent path"))?;

        match self.container_kind(container)? {
            ContainerKind::Model => {
                let prop_ty = self
                    .get_child_type(container, key)
                    .map_err(|_| invalid_target(patch, "unknown property"))?;
                match patch.op {
                    PatchOp::Add | PatchOp::Replace => {
                        self.set(container, key, value_of(patch)?)
                    }
                    PatchOp::Remove if prop_ty.is_maybe() => {
                        self.set(container, key, Value::Null)
                    }
                    PatchOp::Remove => Err(invalid_target(patch, "property cannot be removed")),
                }
            }
            ContainerKind::Array => {
                let len = self.len(container)?;
                match patch.op {
                    PatchOp::Add => {
                        let index = if key == "-" {
                            len
                        } else {
                            parse_index(key)
                                .filter(|i| *i <= len)
                                .ok_or_else(|| invalid_target(patch, "index out of range"))?
                        };
                        self.insert(container, index, value_of(patch)?)
                    }
                    PatchOp::Replace => {
                        let index = existing_index(patch, key, len)?;
                        self.array_set(container, index, value_of(patch)?)
                    }
                    PatchOp::Remove => {
                        let index = existing_index(patch, key, len)?;
                        self.remove(container, index).map(|_| ())
                    }
                }
            }
            ContainerKind::Map => match patch.op {
                PatchOp::Add | PatchOp::Replace => self.map_set(container, key, value_of(patch)?),
                PatchOp::Remove => {
                    if self.get_node(container)?.slot(key).is_none() {
                        return Err(invalid_target(patch, "no such key"));
                    }
                    self.map_delete(container, key).map(|_| ())
                }
            },
        }
    }

    /// Apply patches in order to the tree rooted at `root`
    ///
    /// # Errors
    ///
    /// Stops at the first failing patch and returns its error; earlier
    /// patches remain applied.
    pub fn apply_patches(&mut self, root: NodeId, patches: &[Patch]) -> Result<()> {
        crate::log_op!("apply_patches", {
            let mut result = Ok(());
            for patch in patches {
                if let Err(e) = self.apply_patch(root, patch) {
                    result = Err(e);
                    break;
                }
            }
            result
        })
    }
}

fn invalid_target(patch: &Patch, reason: &str) -> StateTreeError {
    StateTreeError::InvalidPatchTarget {
        path: format_pointer(&patch.path),
        reason: reason.to_string(),
    }
}

fn value_of(patch: &Patch) -> Result<Value> {
    patch
        .value
        .clone()
        .ok_or_else(|| invalid_target(patch, "patch carries no value"))
}

fn existing_index(patch: &Patch, key: &str, len: usize) -> Result<usize> {
    parse_index(key)
        .filter(|i| *i < len)
        .ok_or_else(|| invalid_target(patch, "index out of range"))
}
