//! Cycle-safe flattening of object graphs into JSON values.
//!
//! Leaves (scalars, strings, enums, UUIDs) become strings, collections and
//! arrays become JSON arrays, maps and objects become JSON objects with
//! stringified keys. `Optional` wrappers are unwrapped. A reference value
//! met again while its own subtree is still being walked is replaced by
//! [`CYCLE_MARKER`].

use crate::config::ExcludedFields;
use crate::context::ConversionContext;
use crate::error::Result;
use crate::field::{FieldDescriptor, MemberAccess, PrivilegedAccess};
use crate::model::Value;
use serde_json::{Map, Value as Json};
use std::sync::Arc;
use tracing::trace;

/// Substituted for a back reference to a value still being flattened.
pub const CYCLE_MARKER: &str = "<cycle>";

/// Walks a value graph into `serde_json::Value`.
#[derive(Debug, Clone)]
pub struct Flattener {
    access: Arc<dyn MemberAccess>,
    excluded: ExcludedFields,
}

impl Default for Flattener {
    fn default() -> Self {
        Self::new(Arc::new(PrivilegedAccess), ExcludedFields::none())
    }
}

impl Flattener {
    pub fn new(access: Arc<dyn MemberAccess>, excluded: ExcludedFields) -> Self {
        Self { access, excluded }
    }

    /// Flatten `value` with a fresh context.
    pub fn flatten(&self, value: &Value) -> Result<Json> {
        let mut context = ConversionContext::new();
        self.flatten_in(value, &mut context)
    }

    /// Flatten `value` as part of an ongoing walk.
    pub fn flatten_in(&self, value: &Value, context: &mut ConversionContext) -> Result<Json> {
        match value {
            Value::Null => return Ok(Json::Null),
            Value::Optional(None) => return Ok(Json::Null),
            Value::Optional(Some(inner)) => return self.flatten_in(inner, context),
            Value::Object(_) | Value::Collection(_) | Value::Map(_) | Value::Array(_) => {}
            leaf => return Ok(Json::String(leaf.to_string())),
        }

        if !context.enter(value) {
            trace!(value = %value.runtime_type(), "cycle detected");
            return Ok(Json::String(CYCLE_MARKER.to_string()));
        }
        let flattened = self.flatten_reference(value, context);
        context.leave(value);
        flattened
    }

    fn flatten_reference(&self, value: &Value, context: &mut ConversionContext) -> Result<Json> {
        match value {
            Value::Collection(_) | Value::Array(_) => {
                let mut items = Vec::new();
                for item in value.elements() {
                    items.push(self.flatten_in(&item, context)?);
                }
                Ok(Json::Array(items))
            }
            Value::Map(map) => {
                let entries = map.borrow().entries().to_vec();
                let mut object = Map::new();
                for (key, entry) in &entries {
                    object.insert(key.to_string(), self.flatten_in(entry, context)?);
                }
                Ok(Json::Object(object))
            }
            _ => {
                let mut object = Map::new();
                for (name, member) in FieldDescriptor::members(value, &self.access) {
                    if member.is_static() || self.excluded.is_excluded(&name) {
                        continue;
                    }
                    let member_value = member.value()?;
                    object.insert(name, self.flatten_in(&member_value, context)?);
                }
                Ok(Json::Object(object))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ClassDef, FieldDef, MapKind, Type};
    use serde_json::json;

    fn node_class() -> Arc<ClassDef> {
        ClassDef::builder("Node")
            .field(FieldDef::new("name", Type::String))
            .field(FieldDef::new("next", Type::class("Node")))
            .field(FieldDef::constant("KIND", Type::String, || "node".into()))
            .build()
    }

    #[test]
    fn test_leaves_are_stringified() {
        let flattener = Flattener::default();
        assert_eq!(flattener.flatten(&Value::Int(42)).unwrap(), json!("42"));
        assert_eq!(flattener.flatten(&Value::Double(1.0)).unwrap(), json!("1.0"));
        assert_eq!(flattener.flatten(&Value::Null).unwrap(), Json::Null);
        assert_eq!(
            flattener
                .flatten(&Value::Optional(Some(Box::new(Value::Bool(true)))))
                .unwrap(),
            json!("true")
        );
    }

    #[test]
    fn test_self_reference_is_marked() {
        let node = Value::new_object(&node_class(), [("name", Value::from("a"))]);
        node.as_object()
            .unwrap()
            .borrow_mut()
            .set("next", node.clone());

        let flattened = Flattener::default().flatten(&node).unwrap();
        assert_eq!(flattened, json!({"name": "a", "next": CYCLE_MARKER}));
    }

    #[test]
    fn test_shared_siblings_are_not_cycles() {
        let shared = Value::new_object(&node_class(), [("name", Value::from("s"))]);
        let list = Value::list(Type::Any, [shared.clone(), shared]);
        let flattened = Flattener::default().flatten(&list).unwrap();
        assert_eq!(
            flattened,
            json!([{"name": "s", "next": null}, {"name": "s", "next": null}])
        );
    }

    #[test]
    fn test_maps_use_string_keys_and_exclusions_apply() {
        let node = Value::new_object(&node_class(), [("name", Value::from("n"))]);
        let map = Value::map(MapKind::LinkedHashMap, Type::Any, Type::Any, [(Value::Int(1), node)]);
        let flattener = Flattener::new(Arc::new(PrivilegedAccess), ExcludedFields::only(["next"]));
        assert_eq!(flattener.flatten(&map).unwrap(), json!({"1": {"name": "n"}}));
    }
}
