pub mod instantiate;
pub mod mutation_ops;
pub mod store;
pub mod tree_ops;

pub use store::{ListenerId, Store};
