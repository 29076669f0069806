//! Action invocation and recording
//!
//! Actions are named mutating operations declared on model types and
//! resolved by name at dispatch time. Every invocation is announced to the
//! action listeners in scope before the action body runs.

pub mod invoke;
pub mod recorder;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::path::format_pointer;

pub use recorder::ActionRecorder;

/// Recorded invocation of a named action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionCall {
    /// Segments from the observed node down to the action's target
    pub path: Vec<String>,
    pub name: String,
    pub args: Vec<Value>,
    /// True when the call was made from inside another action that the same
    /// listener also observed. Replaying the outer call repeats it, so
    /// replay skips nested calls.
    #[serde(default)]
    pub nested: bool,
}

impl ActionCall {
    pub fn pointer(&self) -> String {
        format_pointer(&self.path)
    }
}
