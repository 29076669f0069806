pub mod node;

pub use node::{ContainerKind, Input, Node, NodeValue, Slot};
