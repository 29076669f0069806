use statetree_core_types::NodeId;
use thiserror::Error;

use crate::types::Violation;

/// Result type alias using StateTreeError
pub type Result<T> = std::result::Result<T, StateTreeError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// This taxonomy provides a stable, structured classification of all errors
/// raised by the state tree. Each kind maps to a stable error code that can be
/// used for programmatic error handling and assertions in tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Construction/Assignment
    Validation,
    NotComposite,
    InvalidKey,
    InvalidReference,
    UnsupportedOperation,

    // Structural
    ParentConflict,
    CycleDetected,
    NoParentAtDepth,
    NotFound,
    Destroyed,

    // Replay
    InvalidPatchTarget,
    ActionPathNotFound,
    UnknownAction,

    // User actions
    ActionFailed,

    // Integration
    Serialization,

    // Internal
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::Validation => "ERR_VALIDATION",
            ExErrorKind::NotComposite => "ERR_NOT_COMPOSITE",
            ExErrorKind::InvalidKey => "ERR_INVALID_KEY",
            ExErrorKind::InvalidReference => "ERR_INVALID_REFERENCE",
            ExErrorKind::UnsupportedOperation => "ERR_UNSUPPORTED_OPERATION",
            ExErrorKind::ParentConflict => "ERR_PARENT_CONFLICT",
            ExErrorKind::CycleDetected => "ERR_CYCLE_DETECTED",
            ExErrorKind::NoParentAtDepth => "ERR_NO_PARENT_AT_DEPTH",
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::Destroyed => "ERR_NODE_DESTROYED",
            ExErrorKind::InvalidPatchTarget => "ERR_INVALID_PATCH_TARGET",
            ExErrorKind::ActionPathNotFound => "ERR_ACTION_PATH_NOT_FOUND",
            ExErrorKind::UnknownAction => "ERR_UNKNOWN_ACTION",
            ExErrorKind::ActionFailed => "ERR_ACTION_FAILED",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }
}

/// Canonical structured error type
///
/// This error type provides a structured representation of errors with
/// classification fields for programmatic handling and rich context for debugging.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    node_id: Option<NodeId>,
    path: Option<String>,
    message: String,
    source: Option<Box<ExError>>,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            node_id: None,
            path: None,
            message: String::new(),
            source: None,
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add node identity context
    pub fn with_node_id(mut self, node_id: NodeId) -> Self {
        self.node_id = Some(node_id);
        self
    }

    /// Add tree path context
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Add source error
    pub fn with_source(mut self, source: ExError) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    pub fn node_id(&self) -> Option<NodeId> {
        self.node_id
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn source_error(&self) -> Option<&ExError> {
        self.source.as_deref()
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(path) = &self.path {
            write!(f, " (path: {})", path)?;
        }
        if let Some(node_id) = &self.node_id {
            write!(f, " (node_id: {})", node_id)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        None
    }
}

// ========== End Error Facility ==========

fn format_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StateTreeError {
    // ===== Construction / Assignment Errors =====
    #[error("Value does not satisfy type '{type_name}': {}", format_violations(.violations))]
    Validation {
        type_name: String,
        violations: Vec<Violation>,
    },

    #[error("Type '{type_name}' does not describe a composite value and cannot back a node")]
    NotComposite { type_name: String },

    #[error("No child '{key}' at '{path}'")]
    InvalidKey { path: String, key: String },

    #[error("Invalid reference at '{path}': {reason}")]
    InvalidReference { path: String, reason: String },

    #[error("Operation '{op}' is not supported on '{path}' of type '{type_name}'")]
    UnsupportedOperation {
        op: String,
        path: String,
        type_name: String,
    },

    // ===== Structural Errors =====
    #[error("Cannot add an object to a state tree if it is already part of the same or another state tree. Tried to assign an object to '{attempted_path}', but it lives already at '{existing_path}'")]
    ParentConflict {
        attempted_path: String,
        existing_path: String,
    },

    #[error("Cannot attach the root of a tree inside its own subtree at '{path}'")]
    CycleDetected { path: String },

    #[error("Failed to find a parent for '{path}' with depth {depth}")]
    NoParentAtDepth { path: String, depth: usize },

    #[error("Node not found: {node_id}")]
    NodeNotFound { node_id: NodeId },

    #[error("Node was destroyed: {node_id}")]
    NodeDestroyed { node_id: NodeId },

    // ===== Replay Errors =====
    #[error("Cannot apply patch at '{path}': {reason}")]
    InvalidPatchTarget { path: String, reason: String },

    #[error("No node at action path '{path}'")]
    ActionPathNotFound { path: String },

    #[error("Type '{type_name}' has no action named '{action}'")]
    UnknownAction { type_name: String, action: String },

    // ===== Action Errors =====
    #[error("Action '{action}' failed: {reason}")]
    ActionFailed { action: String, reason: String },

    // ===== Generic Errors =====
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl StateTreeError {
    /// Shorthand for a validation failure carrying a single violation
    pub(crate) fn single_violation(
        type_name: impl Into<String>,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        StateTreeError::Validation {
            type_name: type_name.into(),
            violations: vec![Violation::new(path, message)],
        }
    }
}

impl From<serde_json::Error> for StateTreeError {
    fn from(err: serde_json::Error) -> Self {
        StateTreeError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<StateTreeError> for ExError {
    fn from(err: StateTreeError) -> Self {
        let message = err.to_string();
        match err {
            StateTreeError::Validation { violations, .. } => {
                let mut ex = ExError::new(ExErrorKind::Validation).with_message(message);
                if let Some(first) = violations.first() {
                    ex = ex.with_path(first.path.clone());
                }
                ex
            }

            StateTreeError::NotComposite { .. } => {
                ExError::new(ExErrorKind::NotComposite).with_message(message)
            }

            StateTreeError::InvalidKey { path, .. } => ExError::new(ExErrorKind::InvalidKey)
                .with_path(path)
                .with_message(message),

            StateTreeError::InvalidReference { path, .. } => {
                ExError::new(ExErrorKind::InvalidReference)
                    .with_path(path)
                    .with_message(message)
            }

            StateTreeError::UnsupportedOperation { op, path, .. } => {
                ExError::new(ExErrorKind::UnsupportedOperation)
                    .with_op(op)
                    .with_path(path)
                    .with_message(message)
            }

            StateTreeError::ParentConflict { attempted_path, .. } => {
                ExError::new(ExErrorKind::ParentConflict)
                    .with_op("attach")
                    .with_path(attempted_path)
                    .with_message(message)
            }

            StateTreeError::CycleDetected { path } => ExError::new(ExErrorKind::CycleDetected)
                .with_op("attach")
                .with_path(path)
                .with_message(message),

            StateTreeError::NoParentAtDepth { path, .. } => {
                ExError::new(ExErrorKind::NoParentAtDepth)
                    .with_op("get_parent")
                    .with_path(path)
                    .with_message(message)
            }

            StateTreeError::NodeNotFound { node_id } => ExError::new(ExErrorKind::NotFound)
                .with_node_id(node_id)
                .with_message("Node not found"),

            StateTreeError::NodeDestroyed { node_id } => ExError::new(ExErrorKind::Destroyed)
                .with_node_id(node_id)
                .with_message("Node was destroyed"),

            StateTreeError::InvalidPatchTarget { path, .. } => {
                ExError::new(ExErrorKind::InvalidPatchTarget)
                    .with_op("apply_patch")
                    .with_path(path)
                    .with_message(message)
            }

            StateTreeError::ActionPathNotFound { path } => {
                ExError::new(ExErrorKind::ActionPathNotFound)
                    .with_op("replay_actions")
                    .with_path(path)
                    .with_message(message)
            }

            StateTreeError::UnknownAction { .. } => ExError::new(ExErrorKind::UnknownAction)
                .with_op("invoke_action")
                .with_message(message),

            StateTreeError::ActionFailed { .. } => ExError::new(ExErrorKind::ActionFailed)
                .with_op("invoke_action")
                .with_message(message),

            StateTreeError::Serialization { .. } => {
                ExError::new(ExErrorKind::Serialization).with_message(message)
            }

            StateTreeError::Internal { .. } => {
                ExError::new(ExErrorKind::Internal).with_message(message)
            }
        }
    }
}
