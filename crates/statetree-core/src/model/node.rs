use indexmap::IndexMap;
use serde_json::Value;
use statetree_core_types::NodeId;

use crate::path::parse_index;
use crate::types::Type;

/// Content of one child position of a composite node
#[derive(Debug, Clone, PartialEq)]
pub enum Slot {
    /// Primitive, frozen or reference value, or `null` for an empty `maybe`
    Leaf(Value),
    /// Owned composite child
    Node(NodeId),
}

impl Slot {
    pub fn as_node(&self) -> Option<NodeId> {
        match self {
            Slot::Node(id) => Some(*id),
            Slot::Leaf(_) => None,
        }
    }

    pub fn as_leaf(&self) -> Option<&Value> {
        match self {
            Slot::Leaf(value) => Some(value),
            Slot::Node(_) => None,
        }
    }
}

/// Value handed to a mutator
///
/// A plain snapshot value is validated and auto-boxed into new nodes of the
/// slot's declared type; an existing node is attached as-is and must not
/// already have a parent.
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    Value(Value),
    Node(NodeId),
}

impl From<Value> for Input {
    fn from(value: Value) -> Self {
        Input::Value(value)
    }
}

impl From<NodeId> for Input {
    fn from(id: NodeId) -> Self {
        Input::Node(id)
    }
}

/// Shape of a composite node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    Model,
    Array,
    Map,
}

/// Children of a composite node
#[derive(Debug, Clone, PartialEq)]
pub enum NodeValue {
    /// Declared properties, in declaration order
    Model(IndexMap<String, Slot>),
    Array(Vec<Slot>),
    /// Entries in insertion order
    Map(IndexMap<String, Slot>),
}

impl NodeValue {
    pub fn kind(&self) -> ContainerKind {
        match self {
            NodeValue::Model(_) => ContainerKind::Model,
            NodeValue::Array(_) => ContainerKind::Array,
            NodeValue::Map(_) => ContainerKind::Map,
        }
    }
}

/// Runtime wrapper giving a composite value identity, parent and path
#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) id: NodeId,
    pub(crate) ty: Type,
    pub(crate) parent: Option<NodeId>,
    pub(crate) segment: Option<String>,
    pub(crate) value: NodeValue,
}

impl Node {
    pub(crate) fn new(id: NodeId, ty: Type, value: NodeValue) -> Self {
        Self {
            id,
            ty,
            parent: None,
            segment: None,
            value,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn node_type(&self) -> &Type {
        &self.ty
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Path segment under the parent; `None` for roots
    pub fn segment(&self) -> Option<&str> {
        self.segment.as_deref()
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn value(&self) -> &NodeValue {
        &self.value
    }

    /// Look up the slot for a property name, array index or map key
    pub fn slot(&self, key: &str) -> Option<&Slot> {
        match &self.value {
            NodeValue::Model(props) => props.get(key),
            NodeValue::Map(entries) => entries.get(key),
            NodeValue::Array(items) => parse_index(key).and_then(|i| items.get(i)),
        }
    }

    /// Number of children (properties, elements or entries)
    pub fn len(&self) -> usize {
        match &self.value {
            NodeValue::Model(props) => props.len(),
            NodeValue::Map(entries) => entries.len(),
            NodeValue::Array(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Child keys in order: property names, indices or map keys
    pub fn keys(&self) -> Vec<String> {
        match &self.value {
            NodeValue::Model(props) => props.keys().cloned().collect(),
            NodeValue::Map(entries) => entries.keys().cloned().collect(),
            NodeValue::Array(items) => (0..items.len()).map(|i| i.to_string()).collect(),
        }
    }

    /// Ids of the composite children, in order
    pub fn child_ids(&self) -> Vec<NodeId> {
        let slots: Box<dyn Iterator<Item = &Slot>> = match &self.value {
            NodeValue::Model(props) => Box::new(props.values()),
            NodeValue::Map(entries) => Box::new(entries.values()),
            NodeValue::Array(items) => Box::new(items.iter()),
        };
        slots.filter_map(Slot::as_node).collect()
    }
}
