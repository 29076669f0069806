//! Mutation notification hook
//!
//! The store does not track dependencies or decide when anything should be
//! re-rendered. It only reports every primitive mutation to an injected
//! `MutationObserver`; reactive machinery subscribes from the outside.

use statetree_core_types::NodeId;

/// Receiver of post-mutation notifications
///
/// Called once after each primitive mutation (property set, array splice,
/// map set or delete) has been fully applied.
pub trait MutationObserver {
    /// `node` is the composite node whose children changed; `changed_path`
    /// is the absolute path of the changed child, or of `node` itself for
    /// array splices.
    fn on_mutation(&mut self, node: NodeId, changed_path: &[String]);
}

/// Observer that ignores every notification
///
/// # Example
/// ```
/// use statetree_core::observer::{MutationObserver, NoopMutationObserver};
/// use statetree_core::NodeId;
///
/// let mut observer = NoopMutationObserver;
/// observer.on_mutation(NodeId::new(), &["rows".to_string()]);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMutationObserver;

impl MutationObserver for NoopMutationObserver {
    fn on_mutation(&mut self, _node: NodeId, _changed_path: &[String]) {}
}
