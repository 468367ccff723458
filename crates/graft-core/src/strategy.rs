//! Source field resolution.
//!
//! A strategy maps a destination field name to the matching slot on a
//! source value. Strategies are tried in configured order and the first
//! non-empty descriptor wins.

use crate::error::Result;
use crate::field::{FieldDescriptor, MemberAccess};
use crate::model::Value;
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

/// Locates a source slot for a destination field name.
pub trait FieldStrategy: Send + Sync + fmt::Debug {
    /// Stable identifier, used for configuration equality and logging.
    fn name(&self) -> &'static str;

    /// The matching source descriptor, or `FieldDescriptor::empty`.
    fn find(
        &self,
        source: &Value,
        name: &str,
        access: &Arc<dyn MemberAccess>,
    ) -> Result<FieldDescriptor>;
}

/// Exact member name match on object sources.
#[derive(Debug, Default, Clone, Copy)]
pub struct ByName;

impl FieldStrategy for ByName {
    fn name(&self) -> &'static str {
        "by-name"
    }

    fn find(
        &self,
        source: &Value,
        name: &str,
        access: &Arc<dyn MemberAccess>,
    ) -> Result<FieldDescriptor> {
        Ok(FieldDescriptor::member(source, name, access))
    }
}

/// Dot-separated path through nested objects (`address.city`).
///
/// String-keyed maps along the way are stepped into by key. The walk gives
/// up on an unresolved step, a null intermediate value or a static member.
#[derive(Debug, Default, Clone, Copy)]
pub struct ByPath;

impl ByPath {
    fn step(current: &Value, segment: &str, access: &Arc<dyn MemberAccess>) -> Result<FieldDescriptor> {
        if let Some(map) = current.as_map() {
            let key = Value::from(segment);
            if map.borrow().contains_key(&key) {
                return Ok(FieldDescriptor::of_map_entry(segment, current, key, access));
            }
            return Ok(FieldDescriptor::empty(segment));
        }
        ByName.find(current, segment, access)
    }
}

impl FieldStrategy for ByPath {
    fn name(&self) -> &'static str {
        "by-path"
    }

    fn find(
        &self,
        source: &Value,
        name: &str,
        access: &Arc<dyn MemberAccess>,
    ) -> Result<FieldDescriptor> {
        let mut current = source.clone();
        let mut segments = name.split('.').peekable();
        while let Some(segment) = segments.next() {
            let found = Self::step(&current, segment, access)?;
            if !found.has_field() || found.is_static() {
                return Ok(FieldDescriptor::empty(name));
            }
            if segments.peek().is_none() {
                return Ok(found);
            }
            current = found.value()?;
            if current.is_null() {
                return Ok(FieldDescriptor::empty(name));
            }
        }
        Ok(FieldDescriptor::empty(name))
    }
}

/// By name first, by path only when the name is not found.
///
/// A plain name on an object source is not retried as a path.
#[derive(Debug, Default, Clone, Copy)]
pub struct ByNameThenPath;

impl FieldStrategy for ByNameThenPath {
    fn name(&self) -> &'static str {
        "by-name-then-path"
    }

    fn find(
        &self,
        source: &Value,
        name: &str,
        access: &Arc<dyn MemberAccess>,
    ) -> Result<FieldDescriptor> {
        let found = ByName.find(source, name, access)?;
        if found.has_field() || (source.as_object().is_some() && !name.contains('.')) {
            return Ok(found);
        }
        ByPath.find(source, name, access)
    }
}

/// Explicit source map key.
///
/// Scalar keys only, so strategies stay shareable across threads; the
/// lookup value is built per call.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MapKeyValue {
    Int(i32),
    Long(i64),
    Bool(bool),
    Str(String),
}

impl MapKeyValue {
    pub fn to_value(&self) -> Value {
        match self {
            MapKeyValue::Int(n) => Value::Int(*n),
            MapKeyValue::Long(n) => Value::Long(*n),
            MapKeyValue::Bool(b) => Value::Bool(*b),
            MapKeyValue::Str(s) => Value::Str(s.clone()),
        }
    }
}

impl From<i32> for MapKeyValue {
    fn from(n: i32) -> Self {
        MapKeyValue::Int(n)
    }
}

impl From<i64> for MapKeyValue {
    fn from(n: i64) -> Self {
        MapKeyValue::Long(n)
    }
}

impl From<bool> for MapKeyValue {
    fn from(b: bool) -> Self {
        MapKeyValue::Bool(b)
    }
}

impl From<&str> for MapKeyValue {
    fn from(s: &str) -> Self {
        MapKeyValue::Str(s.to_string())
    }
}

impl From<String> for MapKeyValue {
    fn from(s: String) -> Self {
        MapKeyValue::Str(s)
    }
}

/// Key lookup on map sources.
///
/// A field name resolves to the key registered for it, or to the name
/// itself as a string key. Non-map sources never match.
#[derive(Debug, Default, Clone)]
pub struct MapKey {
    keys: IndexMap<String, MapKeyValue>,
}

impl MapKey {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read destination field `field` from source key `key`.
    pub fn with_key(mut self, field: impl Into<String>, key: impl Into<MapKeyValue>) -> Self {
        self.keys.insert(field.into(), key.into());
        self
    }

    pub fn keys(&self) -> &IndexMap<String, MapKeyValue> {
        &self.keys
    }
}

impl FieldStrategy for MapKey {
    fn name(&self) -> &'static str {
        "map-key"
    }

    fn find(
        &self,
        source: &Value,
        name: &str,
        access: &Arc<dyn MemberAccess>,
    ) -> Result<FieldDescriptor> {
        let Some(map) = source.as_map() else {
            return Ok(FieldDescriptor::empty(name));
        };
        let key = self
            .keys
            .get(name)
            .map(MapKeyValue::to_value)
            .unwrap_or_else(|| Value::from(name));
        if !map.borrow().contains_key(&key) {
            return Ok(FieldDescriptor::empty(name));
        }
        Ok(FieldDescriptor::of_map_entry(name, source, key, access))
    }
}

/// First non-empty result across `strategies`.
pub fn find_first(
    strategies: &[Arc<dyn FieldStrategy>],
    source: &Value,
    name: &str,
    access: &Arc<dyn MemberAccess>,
) -> Result<FieldDescriptor> {
    for strategy in strategies {
        let found = strategy.find(source, name, access)?;
        if found.has_field() {
            return Ok(found);
        }
    }
    Ok(FieldDescriptor::empty(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::PrivilegedAccess;
    use crate::model::{ClassDef, FieldDef, MapKind, Type};

    fn access() -> Arc<dyn MemberAccess> {
        Arc::new(PrivilegedAccess)
    }

    fn customer() -> Value {
        let address = ClassDef::builder("Address")
            .field(FieldDef::new("city", Type::String))
            .field(FieldDef::constant("COUNTRY", Type::String, || "NL".into()))
            .build();
        let customer = ClassDef::builder("Customer")
            .field(FieldDef::new("name", Type::String))
            .field(FieldDef::new("address", Type::class("Address")))
            .field(FieldDef::new("previous", Type::class("Address")))
            .field(FieldDef::new("tags", Type::map(Type::String, Type::String)))
            .build();
        let home = Value::new_object(&address, [("city", Value::from("Utrecht"))]);
        let tags = Value::map(
            MapKind::HashMap,
            Type::String,
            Type::String,
            [("tier".into(), "gold".into())],
        );
        Value::new_object(
            &customer,
            [("name", Value::from("Ada")), ("address", home), ("tags", tags)],
        )
    }

    #[test]
    fn test_by_name() {
        let found = ByName.find(&customer(), "name", &access()).unwrap();
        assert_eq!(found.value().ok(), Some(Value::from("Ada")));
        assert!(!ByName.find(&customer(), "missing", &access()).unwrap().has_field());
    }

    #[test]
    fn test_by_path_walks_objects_and_maps() {
        let source = customer();
        let city = ByPath.find(&source, "address.city", &access()).unwrap();
        assert_eq!(city.value().ok(), Some(Value::from("Utrecht")));

        let tier = ByPath.find(&source, "tags.tier", &access()).unwrap();
        assert_eq!(tier.value().ok(), Some(Value::from("gold")));
    }

    #[test]
    fn test_by_path_stops_on_null_static_or_missing() {
        let source = customer();
        assert!(!ByPath.find(&source, "previous.city", &access()).unwrap().has_field());
        assert!(!ByPath.find(&source, "address.COUNTRY", &access()).unwrap().has_field());
        assert!(!ByPath.find(&source, "address.zip", &access()).unwrap().has_field());
    }

    #[test]
    fn test_name_then_path_prefers_name() {
        let source = customer();
        let found = ByNameThenPath.find(&source, "address.city", &access()).unwrap();
        assert_eq!(found.value().ok(), Some(Value::from("Utrecht")));
    }

    #[test]
    fn test_name_then_path_reads_map_sources_by_key() {
        let source = Value::map(
            MapKind::HashMap,
            Type::String,
            Type::Any,
            [("name".into(), "Ada".into())],
        );
        let found = ByNameThenPath.find(&source, "name", &access()).unwrap();
        assert_eq!(found.value().ok(), Some(Value::from("Ada")));
        assert!(!ByNameThenPath.find(&customer(), "missing", &access()).unwrap().has_field());
    }

    #[test]
    fn test_map_key() {
        let source = Value::map(
            MapKind::LinkedHashMap,
            Type::Any,
            Type::Any,
            [("full_name".into(), "Ada".into()), (Value::Int(7), "seven".into())],
        );
        let strategy = MapKey::new().with_key("name", "full_name").with_key("lucky", 7);
        assert_eq!(
            strategy.find(&source, "name", &access()).unwrap().value().ok(),
            Some(Value::from("Ada"))
        );
        assert_eq!(
            strategy.find(&source, "lucky", &access()).unwrap().value().ok(),
            Some(Value::from("seven"))
        );
        assert!(!strategy.find(&source, "other", &access()).unwrap().has_field());
        assert!(!strategy.find(&customer(), "name", &access()).unwrap().has_field());
        assert_eq!(strategy.keys().get("lucky"), Some(&MapKeyValue::Int(7)));
    }

    #[test]
    fn test_map_key_values() {
        assert_eq!(MapKeyValue::from(7).to_value(), Value::Int(7));
        assert_eq!(MapKeyValue::from(7_000_000_000_i64).to_value(), Value::Long(7_000_000_000));
        assert_eq!(MapKeyValue::from(true).to_value(), Value::Bool(true));
        assert_eq!(MapKeyValue::from("k").to_value(), Value::from("k"));
    }
}
