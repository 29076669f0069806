use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Type, TypeKind};
use crate::path::{format_pointer, parse_relative};

/// One reason a value does not satisfy a type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Pointer to the offending value, relative to the validated value
    pub path: String,
    pub message: String,
}

impl Violation {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

impl Type {
    /// Validate a present value, collecting every violation
    pub fn validate(&self, value: &Value) -> Vec<Violation> {
        self.validate_from(Some(value), Vec::new())
    }

    /// Validate a value that may be absent (a missing property)
    pub fn validate_optional(&self, value: Option<&Value>) -> Vec<Violation> {
        self.validate_from(value, Vec::new())
    }

    pub fn is(&self, value: &Value) -> bool {
        self.validate(value).is_empty()
    }

    /// Validate with violation paths prefixed by `prefix`
    pub(crate) fn validate_from(&self, value: Option<&Value>, prefix: Vec<String>) -> Vec<Violation> {
        let mut path = prefix;
        let mut out = Vec::new();
        self.validate_at(value, &mut path, &mut out);
        out
    }

    fn validate_at(&self, value: Option<&Value>, path: &mut Vec<String>, out: &mut Vec<Violation>) {
        let value = match value {
            Some(v) => v,
            None => {
                match self.default_snapshot() {
                    Some(default) => self.validate_at(Some(&default), path, out),
                    None => out.push(Violation::new(format_pointer(path), "value is required")),
                }
                return;
            }
        };

        match self.kind() {
            TypeKind::Primitive(kind) => {
                if !kind.matches_value(value) {
                    out.push(self.mismatch(path, value));
                }
            }
            TypeKind::Frozen => {}
            TypeKind::Model(def) => {
                let Some(object) = value.as_object() else {
                    out.push(self.mismatch(path, value));
                    return;
                };
                for (key, ty) in &def.properties {
                    path.push(key.clone());
                    ty.validate_at(object.get(key), path, out);
                    path.pop();
                }
                for key in object.keys() {
                    if !def.properties.contains_key(key) {
                        path.push(key.clone());
                        out.push(Violation::new(
                            format_pointer(path),
                            format!("unknown property of '{}'", self.name()),
                        ));
                        path.pop();
                    }
                }
            }
            TypeKind::Array(element) => {
                let Some(items) = value.as_array() else {
                    out.push(self.mismatch(path, value));
                    return;
                };
                for (index, item) in items.iter().enumerate() {
                    path.push(index.to_string());
                    element.validate_at(Some(item), path, out);
                    path.pop();
                }
            }
            TypeKind::Map(element) => {
                let Some(entries) = value.as_object() else {
                    out.push(self.mismatch(path, value));
                    return;
                };
                for (key, item) in entries {
                    path.push(key.clone());
                    element.validate_at(Some(item), path, out);
                    path.pop();
                }
            }
            TypeKind::Maybe(inner) => {
                if !value.is_null() {
                    inner.validate_at(Some(value), path, out);
                }
            }
            TypeKind::WithDefault(inner, _) => inner.validate_at(Some(value), path, out),
            TypeKind::Reference(_) => {
                if value.as_str().and_then(parse_relative).is_none() {
                    out.push(Violation::new(
                        format_pointer(path),
                        format!("expected {} (a relative pointer), got {}", self.name(), value),
                    ));
                }
            }
        }
    }

    fn mismatch(&self, path: &[String], value: &Value) -> Violation {
        Violation::new(
            format_pointer(path),
            format!("expected {}, got {}", self.name(), value),
        )
    }
}
