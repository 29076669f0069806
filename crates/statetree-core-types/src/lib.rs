//! Core types shared across the state tree facilities
//!
//! This crate provides the foundational types used by the node store,
//! the error facility and the logging facility:
//!
//! - **Identity**: `NodeId`, the stable identity token of a live node
//! - **Schema constants**: Canonical field keys and event names

pub mod identity;
pub mod schema;

pub use identity::NodeId;
