use std::collections::{HashMap, HashSet};

use statetree_core_types::NodeId;

use crate::action::ActionCall;
use crate::errors::{Result, StateTreeError};
use crate::model::Node;
use crate::observer::{MutationObserver, NoopMutationObserver};
use crate::patch::Patch;

pub type PatchListener = Box<dyn FnMut(&Patch)>;
pub type ActionListener = Box<dyn FnMut(&ActionCall)>;

/// Handle returned when registering a listener, used to remove it again
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

pub(crate) struct Listener<F> {
    pub(crate) id: ListenerId,
    /// Node the listener was installed on; it hears events at or below it
    pub(crate) scope: NodeId,
    pub(crate) callback: F,
}

/// In-memory store for every node of every tree
///
/// Nodes are addressed by `NodeId` handles. A tree is a root node plus the
/// nodes reachable through its child slots; standalone nodes created with
/// `create` are roots of their own single-node trees until attached.
///
/// Not thread-safe - designed for single-threaded cooperative use. Listener
/// callbacks run synchronously inside the mutation that triggered them.
pub struct Store {
    /// Live nodes by id
    pub(crate) nodes: HashMap<NodeId, Node>,
    /// Ids of destroyed nodes, kept so later access reports `NodeDestroyed`
    pub(crate) destroyed: HashSet<NodeId>,
    pub(crate) patch_listeners: Vec<Listener<PatchListener>>,
    pub(crate) action_listeners: Vec<Listener<ActionListener>>,
    /// Targets of the actions currently executing, outermost first
    pub(crate) action_stack: Vec<NodeId>,
    pub(crate) observer: Box<dyn MutationObserver>,
    next_listener: u64,
}

impl Store {
    /// Create a new empty Store
    pub fn new() -> Self {
        Self::with_observer(NoopMutationObserver)
    }

    /// Create a new empty Store reporting mutations to `observer`
    pub fn with_observer(observer: impl MutationObserver + 'static) -> Self {
        Self {
            nodes: HashMap::new(),
            destroyed: HashSet::new(),
            patch_listeners: Vec::new(),
            action_listeners: Vec::new(),
            action_stack: Vec::new(),
            observer: Box::new(observer),
            next_listener: 0,
        }
    }

    /// Replace the mutation observer
    pub fn set_observer(&mut self, observer: impl MutationObserver + 'static) {
        self.observer = Box::new(observer);
    }

    /// Get a node by ID
    ///
    /// # Errors
    ///
    /// Returns `NodeNotFound` if the node never existed in this store, or
    /// `NodeDestroyed` if it was destroyed.
    pub fn get_node(&self, id: NodeId) -> Result<&Node> {
        match self.nodes.get(&id) {
            Some(node) => Ok(node),
            None => Err(self.missing(id)),
        }
    }

    /// Get a mutable reference to a node by ID
    ///
    /// # Errors
    ///
    /// Returns `NodeNotFound` or `NodeDestroyed` like `get_node`.
    pub(crate) fn get_node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        if self.destroyed.contains(&id) {
            return Err(StateTreeError::NodeDestroyed { node_id: id });
        }
        self.nodes
            .get_mut(&id)
            .ok_or(StateTreeError::NodeNotFound { node_id: id })
    }

    fn missing(&self, id: NodeId) -> StateTreeError {
        if self.destroyed.contains(&id) {
            StateTreeError::NodeDestroyed { node_id: id }
        } else {
            StateTreeError::NodeNotFound { node_id: id }
        }
    }

    pub fn is_alive(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn is_destroyed(&self, id: NodeId) -> bool {
        self.destroyed.contains(&id)
    }

    /// Number of live nodes across all trees
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Ids of all live roots
    pub fn list_roots(&self) -> Vec<NodeId> {
        let mut roots: Vec<NodeId> = self
            .nodes
            .values()
            .filter(|n| n.is_root())
            .map(|n| n.id)
            .collect();
        roots.sort();
        roots
    }

    pub(crate) fn insert_node(&mut self, node: Node) {
        self.nodes.insert(node.id, node);
    }

    /// Remove a node and its whole subtree, leaving tombstones
    ///
    /// Listeners installed on any removed node are dropped.
    pub(crate) fn tombstone(&mut self, id: NodeId) {
        let mut stack = vec![id];
        let mut removed = HashSet::new();
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.remove(&current) {
                stack.extend(node.child_ids());
                removed.insert(current);
            }
        }
        tracing::debug!(node_id = %id, removed = removed.len(), "destroyed subtree");
        self.patch_listeners.retain(|l| !removed.contains(&l.scope));
        self.action_listeners.retain(|l| !removed.contains(&l.scope));
        self.destroyed.extend(removed);
    }

    fn next_listener_id(&mut self) -> ListenerId {
        self.next_listener += 1;
        ListenerId(self.next_listener)
    }

    /// Register a listener for every patch emitted at or below `node`
    ///
    /// Patch paths are relative to `node`. Listeners run in registration
    /// order.
    ///
    /// # Errors
    ///
    /// Returns `NodeNotFound` or `NodeDestroyed` if `node` is not live.
    pub fn on_patch(
        &mut self,
        node: NodeId,
        listener: impl FnMut(&Patch) + 'static,
    ) -> Result<ListenerId> {
        self.get_node(node)?;
        let id = self.next_listener_id();
        self.patch_listeners.push(Listener {
            id,
            scope: node,
            callback: Box::new(listener),
        });
        Ok(id)
    }

    /// Register a listener for every action invoked at or below `node`
    ///
    /// The listener runs before the action body, so it never observes the
    /// action's own mutations. Call paths are relative to `node`.
    ///
    /// # Errors
    ///
    /// Returns `NodeNotFound` or `NodeDestroyed` if `node` is not live.
    pub fn on_action(
        &mut self,
        node: NodeId,
        listener: impl FnMut(&ActionCall) + 'static,
    ) -> Result<ListenerId> {
        self.get_node(node)?;
        let id = self.next_listener_id();
        self.action_listeners.push(Listener {
            id,
            scope: node,
            callback: Box::new(listener),
        });
        Ok(id)
    }

    /// Remove a patch or action listener; returns false if it was already gone
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let before = self.patch_listeners.len() + self.action_listeners.len();
        self.patch_listeners.retain(|l| l.id != id);
        self.action_listeners.retain(|l| l.id != id);
        before != self.patch_listeners.len() + self.action_listeners.len()
    }

    /// Nodes from `id` up to its root, inclusive, with the segment of each
    /// non-root entry
    pub(crate) fn ancestry(&self, id: NodeId) -> Result<(Vec<NodeId>, Vec<String>)> {
        let mut chain = Vec::new();
        let mut segments = Vec::new();
        let mut current = self.get_node(id)?;
        loop {
            chain.push(current.id);
            match current.parent {
                Some(parent) => {
                    segments.push(current.segment.clone().unwrap_or_default());
                    current = self.get_node(parent)?;
                }
                None => break,
            }
        }
        Ok((chain, segments))
    }

    /// Deliver patches produced by one primitive mutation of `container`
    ///
    /// `local` patches carry paths relative to `container`. Each listener
    /// whose scope is `container` or one of its ancestors receives them
    /// rebased onto its own scope, then the observer is notified once.
    pub(crate) fn emit_patches(
        &mut self,
        container: NodeId,
        changed_key: Option<&str>,
        local: Vec<Patch>,
    ) -> Result<()> {
        let (chain, segments) = self.ancestry(container)?;

        for patch in &local {
            for listener in self.patch_listeners.iter_mut() {
                if let Some(k) = chain.iter().position(|id| *id == listener.scope) {
                    let prefix: Vec<String> = segments[..k].iter().rev().cloned().collect();
                    (listener.callback)(&patch.rebased(&prefix));
                }
            }
        }

        let mut changed_path: Vec<String> = segments.iter().rev().cloned().collect();
        if let Some(key) = changed_key {
            changed_path.push(key.to_string());
        }
        tracing::debug!(
            node_id = %container,
            path = %crate::path::format_pointer(&changed_path),
            patch_count = local.len(),
            "mutation applied"
        );
        self.observer.on_mutation(container, &changed_path);
        Ok(())
    }

    /// Announce an action invocation on `target` to the listeners in scope
    pub(crate) fn emit_action(
        &mut self,
        target: NodeId,
        name: &str,
        args: &[serde_json::Value],
    ) -> Result<()> {
        let (chain, segments) = self.ancestry(target)?;
        let enclosing: Vec<Vec<NodeId>> = self
            .action_stack
            .iter()
            .filter_map(|id| self.ancestry(*id).ok().map(|(c, _)| c))
            .collect();

        for listener in self.action_listeners.iter_mut() {
            if let Some(k) = chain.iter().position(|id| *id == listener.scope) {
                let call = ActionCall {
                    path: segments[..k].iter().rev().cloned().collect(),
                    name: name.to_string(),
                    args: args.to_vec(),
                    nested: enclosing.iter().any(|c| c.contains(&listener.scope)),
                };
                (listener.callback)(&call);
            }
        }
        Ok(())
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("nodes", &self.nodes.len())
            .field("destroyed", &self.destroyed.len())
            .field("patch_listeners", &self.patch_listeners.len())
            .field("action_listeners", &self.action_listeners.len())
            .finish()
    }
}
