use serde_json::Value;
use statetree_core_types::NodeId;

use super::{Action, ModelDef, PrimitiveKind, Type};
use crate::errors::Result;
use crate::ops::Store;

/// Builder for model types
///
/// Properties keep their declaration order, which is also the key order of
/// the model's snapshots.
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use statetree_core::{Store, Type};
///
/// let row = Type::model("Row")
///     .prop_default("article_id", json!(0))
///     .action("setArticle", |store, node, args| {
///         let id = args.first().cloned().unwrap_or(json!(0));
///         store.set(node, "article_id", id)
///     })
///     .build();
///
/// let mut store = Store::new();
/// let node = store.create(&row, json!({})).unwrap();
/// store.invoke(node, "setArticle", vec![json!(7)]).unwrap();
/// assert_eq!(store.snapshot(node).unwrap(), json!({"article_id": 7}));
/// ```
#[derive(Debug)]
pub struct ModelBuilder {
    name: String,
    def: ModelDef,
}

impl ModelBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            def: ModelDef::default(),
        }
    }

    /// Declare a property of the given type
    pub fn prop(mut self, name: impl Into<String>, ty: Type) -> Self {
        self.def.properties.insert(name.into(), ty);
        self
    }

    /// Declare a property from a literal default value
    ///
    /// Strings, numbers and booleans become the matching primitive with that
    /// default; any other literal becomes a `frozen` value with that default.
    pub fn prop_default(self, name: impl Into<String>, default: Value) -> Self {
        let inner = match PrimitiveKind::of_literal(&default) {
            Some(kind) => Type::primitive(kind),
            None => Type::frozen(),
        };
        self.prop(name, Type::with_default(inner, default))
    }

    /// Declare a named action
    pub fn action<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&mut Store, NodeId, &[Value]) -> Result<()> + Send + Sync + 'static,
    {
        self.def.actions.insert(name.into(), Action::new(f));
        self
    }

    pub fn build(self) -> Type {
        Type::from_model(self.name, self.def)
    }
}
