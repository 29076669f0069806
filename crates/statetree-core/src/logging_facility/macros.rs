//! Canonical logging macros
//!
//! These macros provide a structured, consistent way to log operations.

/// Log the start of an operation
///
/// # Example
///
/// ```
/// # use statetree_core::log_op_start;
/// log_op_start!("clone_node");
/// log_op_start!("invoke_action", action = "setCustomer");
/// ```
#[macro_export]
macro_rules! log_op_start {
    ($op:expr) => {{
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::schema::EVENT_START,
        );
    }};
    ($op:expr, $($field:tt)*) => {{
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::schema::EVENT_START,
            $($field)*
        );
    }};
}

/// Log the successful end of an operation
///
/// # Example
///
/// ```
/// # use statetree_core::log_op_end;
/// log_op_end!("clone_node", duration_ms = 3);
/// ```
#[macro_export]
macro_rules! log_op_end {
    ($op:expr, duration_ms = $duration:expr) => {{
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::schema::EVENT_END,
            duration_ms = $duration,
        );
    }};
    ($op:expr, duration_ms = $duration:expr, $($field:tt)*) => {{
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::schema::EVENT_END,
            duration_ms = $duration,
            $($field)*
        );
    }};
}

/// Log an operation error
///
/// The error is converted into an `ExError` so the event carries the stable
/// error kind and code.
///
/// # Example
///
/// ```
/// # use statetree_core::{log_op_error, errors::StateTreeError};
/// let err = StateTreeError::ActionPathNotFound { path: "/rows/3".to_string() };
/// log_op_error!("replay_actions", err, duration_ms = 10);
/// ```
#[macro_export]
macro_rules! log_op_error {
    ($op:expr, $err:expr, duration_ms = $duration:expr) => {{
        let ex_err: $crate::errors::ExError = $err.into();
        tracing::error!(
            component = module_path!(),
            op = $op,
            event = $crate::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err.kind = ?ex_err.kind(),
            err.code = ex_err.code(),
        );
    }};
    ($op:expr, $err:expr, duration_ms = $duration:expr, $($field:tt)*) => {{
        let ex_err: $crate::errors::ExError = $err.into();
        tracing::error!(
            component = module_path!(),
            op = $op,
            event = $crate::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err.kind = ?ex_err.kind(),
            err.code = ex_err.code(),
            $($field)*
        );
    }};
}

/// Run an operation body between start and end/error boundary events
///
/// The body must evaluate to a `Result`; errors are logged and returned
/// unchanged.
#[macro_export]
macro_rules! log_op {
    ($op:expr, $body:expr) => {{
        $crate::log_op_start!($op);
        let start = std::time::Instant::now();
        let result = $body;
        let elapsed = start.elapsed().as_millis() as u64;
        match &result {
            Ok(_) => $crate::log_op_end!($op, duration_ms = elapsed),
            Err(e) => $crate::log_op_error!($op, e.clone(), duration_ms = elapsed),
        }
        result
    }};
}
