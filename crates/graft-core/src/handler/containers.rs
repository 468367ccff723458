//! Collection, array and map conversions.
//!
//! The destination element (or key and value) types come from the resolved
//! destination type; every element is pushed through the full handler
//! chain on its own.

use super::{FieldHandler, Outcome};
use crate::container::ContainerFactory;
use crate::converter::Session;
use crate::error::Result;
use crate::field::FieldDescriptor;
use crate::model::{CollectionKind, Type, Value};
use tracing::debug;

fn element_type_or_break(session: &Session<'_>, dst: &FieldDescriptor) -> Option<Type> {
    let element = session.resolver().element_type(dst.ty(), session.bindings());
    if element.is_none() {
        debug!(destination = %dst.describe(), "no binding for element type");
    }
    element
}

/// Elements and declared element type of a collection or array value.
fn source_elements(value: &Value) -> Option<(Vec<Value>, Type)> {
    match value {
        Value::Collection(c) => {
            let c = c.borrow();
            Some((c.items().to_vec(), c.element_type().clone()))
        }
        Value::Array(a) => {
            let a = a.borrow();
            Some((a.items().to_vec(), a.component().clone()))
        }
        _ => None,
    }
}

pub(crate) fn build_collection(
    session: &mut Session<'_>,
    kind: CollectionKind,
    element: &Type,
    items: &[Value],
    source_element: &Type,
) -> Result<Value> {
    let mut converted = Vec::with_capacity(items.len());
    for item in items {
        converted.push(session.convert_slot(item, source_element, element)?);
    }
    let target = ContainerFactory::new_collection(kind, element.clone())?;
    if let Some(collection) = target.as_collection() {
        let mut collection = collection.borrow_mut();
        for item in converted {
            collection.add(item);
        }
    }
    Ok(target)
}

fn build_array(
    session: &mut Session<'_>,
    component: &Type,
    items: &[Value],
    source_element: &Type,
) -> Result<Value> {
    let mut converted = Vec::with_capacity(items.len());
    for item in items {
        converted.push(session.convert_slot(item, source_element, component)?);
    }
    let target = ContainerFactory::new_array(component, converted.len());
    if let Some(array) = target.as_array() {
        let mut array = array.borrow_mut();
        for (index, item) in converted.into_iter().enumerate() {
            if !item.is_null() {
                array.set(index, item);
            }
        }
    }
    Ok(target)
}

fn convert_sequence(
    session: &mut Session<'_>,
    src: &FieldDescriptor,
    dst: &FieldDescriptor,
) -> Result<Outcome> {
    let Some((items, source_element)) = source_elements(&src.value()?) else {
        return Ok(Outcome::Skip);
    };
    let Some(element) = element_type_or_break(session, dst) else {
        return Ok(Outcome::Break);
    };
    let target = match dst.ty() {
        Type::Collection(kind, _) => build_collection(session, *kind, &element, &items, &source_element)?,
        Type::Array(_) => build_array(session, &element, &items, &source_element)?,
        _ => return Ok(Outcome::Skip),
    };
    dst.set_value(target)?;
    Ok(Outcome::Converted)
}

/// Collection to collection.
#[derive(Debug, Default, Clone, Copy)]
pub struct IterableToIterable;

impl FieldHandler for IterableToIterable {
    fn name(&self) -> &'static str {
        "iterable-to-iterable"
    }

    fn source_type(&self, ty: &Type, _session: &Session<'_>) -> bool {
        ty.is_collection()
    }

    fn destination_type(&self, ty: &Type, _session: &Session<'_>) -> bool {
        ty.is_collection()
    }

    fn handle(&self, src: &FieldDescriptor, dst: &FieldDescriptor, session: &mut Session<'_>) -> Result<Outcome> {
        convert_sequence(session, src, dst)
    }
}

/// Array to array.
#[derive(Debug, Default, Clone, Copy)]
pub struct ArrayToArray;

impl FieldHandler for ArrayToArray {
    fn name(&self) -> &'static str {
        "array-to-array"
    }

    fn source_type(&self, ty: &Type, _session: &Session<'_>) -> bool {
        ty.is_array()
    }

    fn destination_type(&self, ty: &Type, _session: &Session<'_>) -> bool {
        ty.is_array()
    }

    fn handle(&self, src: &FieldDescriptor, dst: &FieldDescriptor, session: &mut Session<'_>) -> Result<Outcome> {
        convert_sequence(session, src, dst)
    }
}

/// Collection to array.
#[derive(Debug, Default, Clone, Copy)]
pub struct IterableToArray;

impl FieldHandler for IterableToArray {
    fn name(&self) -> &'static str {
        "iterable-to-array"
    }

    fn source_type(&self, ty: &Type, _session: &Session<'_>) -> bool {
        ty.is_collection()
    }

    fn destination_type(&self, ty: &Type, _session: &Session<'_>) -> bool {
        ty.is_array()
    }

    fn handle(&self, src: &FieldDescriptor, dst: &FieldDescriptor, session: &mut Session<'_>) -> Result<Outcome> {
        convert_sequence(session, src, dst)
    }
}

/// Array to collection.
#[derive(Debug, Default, Clone, Copy)]
pub struct ArrayToIterable;

impl FieldHandler for ArrayToIterable {
    fn name(&self) -> &'static str {
        "array-to-iterable"
    }

    fn source_type(&self, ty: &Type, _session: &Session<'_>) -> bool {
        ty.is_array()
    }

    fn destination_type(&self, ty: &Type, _session: &Session<'_>) -> bool {
        ty.is_collection()
    }

    fn handle(&self, src: &FieldDescriptor, dst: &FieldDescriptor, session: &mut Session<'_>) -> Result<Outcome> {
        convert_sequence(session, src, dst)
    }
}

/// Map to map, converting keys and values separately.
#[derive(Debug, Default, Clone, Copy)]
pub struct MapToMap;

impl FieldHandler for MapToMap {
    fn name(&self) -> &'static str {
        "map-to-map"
    }

    fn source_type(&self, ty: &Type, _session: &Session<'_>) -> bool {
        ty.is_map()
    }

    fn destination_type(&self, ty: &Type, _session: &Session<'_>) -> bool {
        ty.is_map()
    }

    fn handle(&self, src: &FieldDescriptor, dst: &FieldDescriptor, session: &mut Session<'_>) -> Result<Outcome> {
        let source = src.value()?;
        let Some(map) = source.as_map() else {
            return Ok(Outcome::Skip);
        };
        let Type::Map(kind, _, _) = dst.ty() else {
            return Ok(Outcome::Skip);
        };
        let Some((key_type, value_type)) = session.resolver().entry_types(dst.ty(), session.bindings()) else {
            debug!(destination = %dst.describe(), "no binding for map entry types");
            return Ok(Outcome::Break);
        };
        let (entries, source_key, source_value) = {
            let map = map.borrow();
            (map.entries().to_vec(), map.key_type().clone(), map.value_type().clone())
        };

        let mut converted = Vec::with_capacity(entries.len());
        for (key, value) in &entries {
            converted.push((
                session.convert_slot(key, &source_key, &key_type)?,
                session.convert_slot(value, &source_value, &value_type)?,
            ));
        }
        let target = ContainerFactory::new_map(*kind, key_type, value_type)?;
        if let Some(map) = target.as_map() {
            let mut map = map.borrow_mut();
            for (key, value) in converted {
                map.put(key, value);
            }
        }
        dst.set_value(target)?;
        Ok(Outcome::Converted)
    }
}
