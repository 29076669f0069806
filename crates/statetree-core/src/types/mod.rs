//! Type descriptors
//!
//! A `Type` is an immutable schema value describing how to validate,
//! instantiate and snapshot one kind of value. Descriptors are shared
//! handles: cloning is cheap and equality is identity, so two separately
//! built models with the same shape are still different types.
//!
//! Descriptors can only be composed from already-built descriptors, which
//! keeps the definition graph finite and acyclic. Cycles in the *data* are
//! expressed with `Type::reference`, which stores a path instead of an
//! ownership edge.

mod builder;
mod validation;

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;
use statetree_core_types::NodeId;

use crate::errors::Result;
use crate::ops::Store;

pub use builder::ModelBuilder;
pub use validation::Violation;

/// Leaf value kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveKind {
    String,
    Number,
    Integer,
    Boolean,
}

impl PrimitiveKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrimitiveKind::String => "string",
            PrimitiveKind::Number => "number",
            PrimitiveKind::Integer => "integer",
            PrimitiveKind::Boolean => "boolean",
        }
    }

    /// Infer the primitive kind of a literal default value
    pub fn of_literal(value: &Value) -> Option<Self> {
        match value {
            Value::String(_) => Some(PrimitiveKind::String),
            Value::Number(_) => Some(PrimitiveKind::Number),
            Value::Bool(_) => Some(PrimitiveKind::Boolean),
            _ => None,
        }
    }

    pub fn matches_value(&self, value: &Value) -> bool {
        match self {
            PrimitiveKind::String => value.is_string(),
            PrimitiveKind::Number => value.is_number(),
            PrimitiveKind::Integer => value.as_f64().map(|f| f.fract() == 0.0).unwrap_or(false),
            PrimitiveKind::Boolean => value.is_boolean(),
        }
    }
}

type ActionFn = dyn Fn(&mut Store, NodeId, &[Value]) -> Result<()> + Send + Sync;

/// A named mutating operation declared on a model type
///
/// The function receives the store, the node the action was invoked on and
/// the call arguments. Nested `Store::invoke` calls are recorded like any
/// other invocation.
#[derive(Clone)]
pub struct Action(Arc<ActionFn>);

impl Action {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&mut Store, NodeId, &[Value]) -> Result<()> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub(crate) fn call(&self, store: &mut Store, node: NodeId, args: &[Value]) -> Result<()> {
        (self.0)(store, node, args)
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Action")
    }
}

/// Property and action tables of a model type
#[derive(Debug, Clone, Default)]
pub struct ModelDef {
    pub(crate) properties: IndexMap<String, Type>,
    pub(crate) actions: IndexMap<String, Action>,
}

impl ModelDef {
    pub fn properties(&self) -> impl Iterator<Item = (&str, &Type)> {
        self.properties.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn property(&self, name: &str) -> Option<&Type> {
        self.properties.get(name)
    }

    pub fn action_names(&self) -> impl Iterator<Item = &str> {
        self.actions.keys().map(String::as_str)
    }
}

#[derive(Debug)]
pub enum TypeKind {
    Primitive(PrimitiveKind),
    /// Any plain JSON value, stored as a leaf without node identity
    Frozen,
    Model(ModelDef),
    Array(Type),
    Map(Type),
    Maybe(Type),
    WithDefault(Type, Value),
    Reference(Type),
}

#[derive(Debug)]
struct TypeDef {
    name: String,
    kind: TypeKind,
}

/// Shared, immutable type descriptor
#[derive(Clone)]
pub struct Type(Arc<TypeDef>);

impl Type {
    fn new(name: impl Into<String>, kind: TypeKind) -> Self {
        Self(Arc::new(TypeDef {
            name: name.into(),
            kind,
        }))
    }

    pub fn string() -> Self {
        Self::primitive(PrimitiveKind::String)
    }

    pub fn number() -> Self {
        Self::primitive(PrimitiveKind::Number)
    }

    pub fn integer() -> Self {
        Self::primitive(PrimitiveKind::Integer)
    }

    pub fn boolean() -> Self {
        Self::primitive(PrimitiveKind::Boolean)
    }

    pub fn primitive(kind: PrimitiveKind) -> Self {
        Self::new(kind.as_str(), TypeKind::Primitive(kind))
    }

    pub fn frozen() -> Self {
        Self::new("frozen", TypeKind::Frozen)
    }

    pub fn array(element: Type) -> Self {
        Self::new(format!("{}[]", element.name()), TypeKind::Array(element))
    }

    pub fn map(element: Type) -> Self {
        Self::new(format!("map<{}>", element.name()), TypeKind::Map(element))
    }

    /// Accepts `null` as the explicit empty marker in addition to `inner`
    pub fn maybe(inner: Type) -> Self {
        Self::new(format!("{} | null", inner.name()), TypeKind::Maybe(inner))
    }

    /// Substitutes `default` when the value is absent
    pub fn with_default(inner: Type, default: Value) -> Self {
        Self::new(inner.name().to_string(), TypeKind::WithDefault(inner, default))
    }

    pub fn reference(target: Type) -> Self {
        Self::new(
            format!("reference({})", target.name()),
            TypeKind::Reference(target),
        )
    }

    /// Start building a model type
    pub fn model(name: impl Into<String>) -> ModelBuilder {
        ModelBuilder::new(name)
    }

    pub(crate) fn from_model(name: String, def: ModelDef) -> Self {
        Self::new(name, TypeKind::Model(def))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn kind(&self) -> &TypeKind {
        &self.0.kind
    }

    /// True for the kinds that are backed by a node
    pub fn is_composite(&self) -> bool {
        matches!(
            self.kind(),
            TypeKind::Model(_) | TypeKind::Array(_) | TypeKind::Map(_)
        )
    }

    /// Strip `maybe` and `with_default` wrappers
    pub fn base(&self) -> &Type {
        match self.kind() {
            TypeKind::Maybe(inner) | TypeKind::WithDefault(inner, _) => inner.base(),
            _ => self,
        }
    }

    pub fn is_maybe(&self) -> bool {
        match self.kind() {
            TypeKind::Maybe(_) => true,
            TypeKind::WithDefault(inner, _) => inner.is_maybe(),
            _ => false,
        }
    }

    pub fn as_model(&self) -> Option<&ModelDef> {
        match self.kind() {
            TypeKind::Model(def) => Some(def),
            _ => None,
        }
    }

    /// Element type of an array or map type
    pub fn element_type(&self) -> Option<&Type> {
        match self.kind() {
            TypeKind::Array(element) | TypeKind::Map(element) => Some(element),
            _ => None,
        }
    }

    pub fn action(&self, name: &str) -> Option<Action> {
        self.as_model()
            .and_then(|def| def.actions.get(name))
            .cloned()
    }

    /// Snapshot substituted when a value of this type is absent
    ///
    /// `None` means the type has no usable default and absence is a violation.
    pub fn default_snapshot(&self) -> Option<Value> {
        match self.kind() {
            TypeKind::Primitive(_) | TypeKind::Frozen | TypeKind::Reference(_) => None,
            TypeKind::Model(_) | TypeKind::Map(_) => Some(Value::Object(Default::default())),
            TypeKind::Array(_) => Some(Value::Array(Vec::new())),
            TypeKind::Maybe(_) => Some(Value::Null),
            TypeKind::WithDefault(_, default) => Some(default.clone()),
        }
    }
}

impl PartialEq for Type {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Type {}

impl fmt::Debug for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Type({})", self.name())
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
