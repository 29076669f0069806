use std::time::Instant;

use serde_json::Value;
use statetree_core_types::NodeId;

use super::ActionCall;
use crate::errors::{Result, StateTreeError};
use crate::ops::Store;
use crate::{log_op_end, log_op_error, log_op_start};

impl Store {
    /// Invoke the action `name` declared on the type of `node`
    ///
    /// Action listeners in scope are notified before the action body runs.
    /// The body's mutations are not rolled back if it fails.
    ///
    /// # Errors
    ///
    /// Returns `UnknownAction` if the type declares no such action, or
    /// whatever error the action body returns.
    pub fn invoke(&mut self, node: NodeId, name: &str, args: Vec<Value>) -> Result<()> {
        log_op_start!("invoke_action", action = name);
        let start = Instant::now();

        let result = self.invoke_impl(node, name, &args);

        let elapsed = start.elapsed().as_millis() as u64;
        match &result {
            Ok(()) => log_op_end!("invoke_action", duration_ms = elapsed, action = name),
            Err(e) => log_op_error!("invoke_action", e.clone(), duration_ms = elapsed, action = name),
        }
        result
    }

    fn invoke_impl(&mut self, node: NodeId, name: &str, args: &[Value]) -> Result<()> {
        let ty = self.get_type(node)?;
        let action = ty
            .action(name)
            .ok_or_else(|| StateTreeError::UnknownAction {
                type_name: ty.name().to_string(),
                action: name.to_string(),
            })?;

        self.emit_action(node, name, args)?;

        self.action_stack.push(node);
        let result = action.call(self, node, args);
        self.action_stack.pop();
        result
    }

    /// Invoke recorded calls, in order, on the tree rooted at `target`
    ///
    /// Nested calls are skipped: replaying the outer call repeats them.
    ///
    /// # Errors
    ///
    /// Returns `ActionPathNotFound` if a call path does not resolve,
    /// `UnknownAction` if the resolved node has no such action, or the
    /// action's own error. Calls before the failing one stay applied.
    pub fn replay_actions(&mut self, target: NodeId, calls: &[ActionCall]) -> Result<()> {
        crate::log_op!("replay_actions", self.replay_actions_impl(target, calls))
    }

    fn replay_actions_impl(&mut self, target: NodeId, calls: &[ActionCall]) -> Result<()> {
        for call in calls.iter().filter(|c| !c.nested) {
            let node = self
                .resolve(target, &call.path)?
                .ok_or_else(|| StateTreeError::ActionPathNotFound {
                    path: call.pointer(),
                })?;
            self.invoke(node, &call.name, call.args.clone())?;
        }
        Ok(())
    }
}
