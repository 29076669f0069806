use std::cell::RefCell;
use std::rc::Rc;

use statetree_core_types::NodeId;

use super::ActionCall;
use crate::errors::Result;
use crate::ops::{ListenerId, Store};

/// Captures the action calls made at or below one node
#[derive(Debug)]
pub struct ActionRecorder {
    listener: ListenerId,
    actions: Rc<RefCell<Vec<ActionCall>>>,
    recording: bool,
}

impl ActionRecorder {
    /// Calls captured so far, outer calls before the calls they make
    pub fn actions(&self) -> Vec<ActionCall> {
        self.actions.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.actions.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.borrow().is_empty()
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    pub fn stop(&mut self, store: &mut Store) {
        if self.recording {
            store.remove_listener(self.listener);
            self.recording = false;
        }
    }

    /// Re-invoke the captured calls on the tree rooted at `target`
    ///
    /// # Errors
    ///
    /// As `Store::replay_actions`.
    pub fn replay(&self, store: &mut Store, target: NodeId) -> Result<()> {
        let actions = self.actions();
        store.replay_actions(target, &actions)
    }
}

impl Store {
    /// Start recording action calls made at or below `node`
    ///
    /// # Errors
    ///
    /// Returns `NodeNotFound` or `NodeDestroyed` if `node` is not live.
    pub fn record_actions(&mut self, node: NodeId) -> Result<ActionRecorder> {
        let actions = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&actions);
        let listener = self.on_action(node, move |call| sink.borrow_mut().push(call.clone()))?;
        Ok(ActionRecorder {
            listener,
            actions,
            recording: true,
        })
    }
}
