use std::cell::RefCell;
use std::rc::Rc;

use statetree_core_types::NodeId;

use super::Patch;
use crate::errors::Result;
use crate::ops::{ListenerId, Store};

/// Captures the patches emitted at or below one node
///
/// Patch paths are relative to that node, so the log can be replayed onto
/// any structurally compatible tree.
#[derive(Debug)]
pub struct PatchRecorder {
    listener: ListenerId,
    patches: Rc<RefCell<Vec<Patch>>>,
    recording: bool,
}

impl PatchRecorder {
    /// Patches captured so far, in emission order
    pub fn patches(&self) -> Vec<Patch> {
        self.patches.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.patches.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.patches.borrow().is_empty()
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    /// Stop capturing; patches already captured are kept
    pub fn stop(&mut self, store: &mut Store) {
        if self.recording {
            store.remove_listener(self.listener);
            self.recording = false;
        }
    }

    /// Apply the captured patches, in order, to the tree rooted at `target`
    ///
    /// # Errors
    ///
    /// As `Store::apply_patches`.
    pub fn replay(&self, store: &mut Store, target: NodeId) -> Result<()> {
        let patches = self.patches();
        store.apply_patches(target, &patches)
    }
}

impl Store {
    /// Start recording patches emitted at or below `node`
    ///
    /// # Errors
    ///
    /// Returns `NodeNotFound` or `NodeDestroyed` if `node` is not live.
    pub fn record_patches(&mut self, node: NodeId) -> Result<PatchRecorder> {
        let patches = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&patches);
        let listener = self.on_patch(node, move |patch| sink.borrow_mut().push(patch.clone()))?;
        Ok(PatchRecorder {
            listener,
            patches,
            recording: true,
        })
    }
}
