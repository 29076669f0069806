//! Structural patches
//!
//! Every primitive mutation emits one or more patches synchronously, in
//! causal order. Patch values are snapshots, never live nodes, so replaying
//! a patch stream onto another tree never shares identity with the source.
//!
//! ## Emission rules
//!
//! - Model property assignment: one `replace`.
//! - Array splice: one `remove` per removed element in descending index
//!   order, then one `add` per inserted element in ascending order.
//! - Array slot assignment: one `replace`.
//! - Map assignment: `add` for a new key, `replace` for an existing one;
//!   map deletion: `remove`.
//! - Moving a node (detach, then attach elsewhere) is a `remove` followed by
//!   an `add`; there is no move operation.

pub mod apply;
pub mod recorder;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::path::format_pointer;

pub use recorder::PatchRecorder;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatchOp {
    Add,
    Replace,
    Remove,
}

impl PatchOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            PatchOp::Add => "add",
            PatchOp::Replace => "replace",
            PatchOp::Remove => "remove",
        }
    }
}

/// A single structural change at a path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patch {
    pub op: PatchOp,
    /// Segments from the observed node down to the changed slot
    pub path: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_value: Option<Value>,
}

impl Patch {
    pub fn add(path: Vec<String>, value: Value) -> Self {
        Self {
            op: PatchOp::Add,
            path,
            value: Some(value),
            old_value: None,
        }
    }

    pub fn replace(path: Vec<String>, value: Value, old_value: Option<Value>) -> Self {
        Self {
            op: PatchOp::Replace,
            path,
            value: Some(value),
            old_value,
        }
    }

    pub fn remove(path: Vec<String>, old_value: Option<Value>) -> Self {
        Self {
            op: PatchOp::Remove,
            path,
            value: None,
            old_value,
        }
    }

    /// Path formatted as a pointer string
    pub fn pointer(&self) -> String {
        format_pointer(&self.path)
    }

    /// Same patch with `prefix` prepended to its path
    pub(crate) fn rebased(&self, prefix: &[String]) -> Self {
        let mut path = Vec::with_capacity(prefix.len() + self.path.len());
        path.extend_from_slice(prefix);
        path.extend_from_slice(&self.path);
        Self {
            path,
            ..self.clone()
        }
    }
}
