//! StateTree Core - typed, mutable object-graph store
//!
//! This crate provides a state tree: a graph of typed nodes in which every
//! composite value has exactly one owning parent, including:
//! - Type descriptors (primitives, models, arrays, maps, maybe, defaults,
//!   references) with full validation
//! - An arena `Store` holding nodes, with path, parent and root queries
//! - Snapshot derivation, cloning and snapshot restore
//! - Structural patches emitted on every mutation, recording and replay
//! - Named model actions with call recording and replay
//!
//! ```
//! use serde_json::json;
//! use statetree_core::{Store, Type};
//!
//! let row = Type::model("Row").prop_default("article_id", json!(0)).build();
//! let doc_type = Type::model("Document").prop("rows", Type::array(row.clone())).build();
//!
//! let mut store = Store::new();
//! let doc = store.create(&doc_type, json!({})).unwrap();
//! let item = store.create(&row, json!({})).unwrap();
//! let rows = store.child(doc, "rows").unwrap();
//! store.push(rows, item).unwrap();
//!
//! assert_eq!(store.path(item).unwrap(), "/rows/0");
//! ```

pub mod action;
pub mod errors;
pub mod logging_facility;
pub mod model;
pub mod observer;
pub mod ops;
pub mod patch;
pub mod path;
pub mod snapshot;
pub mod types;

pub use statetree_core_types::{schema, NodeId};

// Re-export commonly used types
pub use action::{ActionCall, ActionRecorder};
pub use errors::{ExError, ExErrorKind, Result, StateTreeError};
pub use model::{ContainerKind, Input, Node, NodeValue, Slot};
pub use observer::{MutationObserver, NoopMutationObserver};
pub use ops::{ListenerId, Store};
pub use patch::{Patch, PatchOp, PatchRecorder};
pub use types::{ModelBuilder, PrimitiveKind, Type, TypeKind, Violation};
