//! Field descriptors: uniform handles onto named slots.
//!
//! A descriptor abstracts over a declared field, an accessor property, a
//! map entry and a detached value cell. It can also be empty, which is how
//! strategies report "not found".

use crate::error::{Error, Result};
use crate::model::{AccessorDef, FieldDef, Object, Type, Value, Visibility};
use indexmap::IndexMap;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

/// Capability to read and write declared fields.
///
/// Injected into every descriptor so that access to private members goes
/// through one auditable place.
pub trait MemberAccess: Send + Sync + fmt::Debug {
    fn read(&self, object: &Object, field: &FieldDef) -> Result<Value>;
    fn write(&self, object: &mut Object, field: &FieldDef, value: Value) -> Result<()>;
}

/// Reads and writes every field regardless of visibility.
#[derive(Debug, Default, Clone, Copy)]
pub struct PrivilegedAccess;

impl MemberAccess for PrivilegedAccess {
    fn read(&self, object: &Object, field: &FieldDef) -> Result<Value> {
        Ok(read_slot(object, field))
    }

    fn write(&self, object: &mut Object, field: &FieldDef, value: Value) -> Result<()> {
        write_slot(object, field, value)
    }
}

/// Refuses private members.
#[derive(Debug, Default, Clone, Copy)]
pub struct PublicAccess;

impl PublicAccess {
    fn check(object: &Object, field: &FieldDef) -> Result<()> {
        match field.visibility() {
            Visibility::Public => Ok(()),
            Visibility::Private => Err(Error::Access {
                member: format!("{}.{}", object.class().name(), field.name()),
                reason: "member is private".to_string(),
            }),
        }
    }
}

impl MemberAccess for PublicAccess {
    fn read(&self, object: &Object, field: &FieldDef) -> Result<Value> {
        Self::check(object, field)?;
        Ok(read_slot(object, field))
    }

    fn write(&self, object: &mut Object, field: &FieldDef, value: Value) -> Result<()> {
        Self::check(object, field)?;
        write_slot(object, field, value)
    }
}

fn read_slot(object: &Object, field: &FieldDef) -> Value {
    field
        .static_value()
        .unwrap_or_else(|| object.get(field.name()))
}

fn write_slot(object: &mut Object, field: &FieldDef, value: Value) -> Result<()> {
    if field.is_static() {
        return Err(Error::Access {
            member: format!("{}.{}", object.class().name(), field.name()),
            reason: "static fields are read-only".to_string(),
        });
    }
    object.set(field.name(), value);
    Ok(())
}

#[derive(Clone)]
enum Slot {
    Empty,
    Field(FieldDef),
    Accessor(AccessorDef),
    MapEntry(Value),
    Cell(Rc<RefCell<Value>>),
}

/// A handle onto one named slot of one instance.
#[derive(Clone)]
pub struct FieldDescriptor {
    name: String,
    slot: Slot,
    ty: Type,
    owner: Option<Value>,
    access: Arc<dyn MemberAccess>,
}

impl FieldDescriptor {
    /// The "not found" sentinel.
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            slot: Slot::Empty,
            ty: Type::Any,
            owner: None,
            access: Arc::new(PrivilegedAccess),
        }
    }

    pub fn of_field(owner: &Value, field: &FieldDef, access: &Arc<dyn MemberAccess>) -> Self {
        Self {
            name: field.name().to_string(),
            ty: field.ty().clone(),
            slot: Slot::Field(field.clone()),
            owner: Some(owner.clone()),
            access: Arc::clone(access),
        }
    }

    pub fn of_accessor(
        owner: &Value,
        accessor: &AccessorDef,
        access: &Arc<dyn MemberAccess>,
    ) -> Self {
        Self {
            name: accessor.property().to_string(),
            ty: accessor.ty().clone(),
            slot: Slot::Accessor(accessor.clone()),
            owner: Some(owner.clone()),
            access: Arc::clone(access),
        }
    }

    /// Entry `key` of a map value, typed with the map's value type.
    pub fn of_map_entry(
        name: impl Into<String>,
        owner: &Value,
        key: Value,
        access: &Arc<dyn MemberAccess>,
    ) -> Self {
        let ty = owner
            .as_map()
            .map(|m| m.borrow().value_type().clone())
            .unwrap_or(Type::Any);
        Self {
            name: name.into(),
            ty,
            slot: Slot::MapEntry(key),
            owner: Some(owner.clone()),
            access: Arc::clone(access),
        }
    }

    /// A detached slot holding `value`, used to push container elements
    /// through the handler chain.
    pub fn cell(name: impl Into<String>, ty: Type, value: Value) -> Self {
        Self {
            name: name.into(),
            ty,
            slot: Slot::Cell(Rc::new(RefCell::new(value))),
            owner: None,
            access: Arc::new(PrivilegedAccess),
        }
    }

    /// Every readable member of `value`: declared fields derived to base,
    /// then accessor properties not already named by a field. Non-objects
    /// have no members.
    pub fn members(value: &Value, access: &Arc<dyn MemberAccess>) -> IndexMap<String, FieldDescriptor> {
        let mut members = IndexMap::new();
        let Some(object) = value.as_object() else {
            return members;
        };
        let class = Arc::clone(object.borrow().class());
        for def in class.ancestry() {
            for field in def.declared_fields() {
                members
                    .entry(field.name().to_string())
                    .or_insert_with(|| FieldDescriptor::of_field(value, field, access));
            }
        }
        for def in class.ancestry() {
            for accessor in def.accessors() {
                members
                    .entry(accessor.property().to_string())
                    .or_insert_with(|| FieldDescriptor::of_accessor(value, accessor, access));
            }
        }
        members
    }

    /// The member of `value` named `name`, with the same precedence as
    /// [`FieldDescriptor::members`], or the empty sentinel.
    pub fn member(value: &Value, name: &str, access: &Arc<dyn MemberAccess>) -> Self {
        let Some(object) = value.as_object() else {
            return Self::empty(name);
        };
        let class = Arc::clone(object.borrow().class());
        if let Some(field) = class.field(name) {
            return Self::of_field(value, field, access);
        }
        match class.accessor(name) {
            Some(accessor) => Self::of_accessor(value, accessor, access),
            None => Self::empty(name),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared type of the slot.
    pub fn ty(&self) -> &Type {
        &self.ty
    }

    /// Same slot with its type replaced, e.g. by a resolved generic type.
    pub fn with_type(mut self, ty: Type) -> Self {
        self.ty = ty;
        self
    }

    /// `false` for the empty sentinel.
    pub fn has_field(&self) -> bool {
        !matches!(self.slot, Slot::Empty)
    }

    /// Whether the descriptor is bound to an owning instance (cells count
    /// as bound to themselves).
    pub fn has_object(&self) -> bool {
        self.owner.is_some() || matches!(self.slot, Slot::Cell(_))
    }

    pub fn is_static(&self) -> bool {
        matches!(&self.slot, Slot::Field(field) if field.is_static())
    }

    pub fn is_expandable(&self) -> bool {
        matches!(&self.slot, Slot::Field(field) if field.is_expandable())
    }

    pub fn is_writable(&self) -> bool {
        match &self.slot {
            Slot::Empty => false,
            Slot::Field(field) => !field.is_static() && self.owner.is_some(),
            Slot::Accessor(accessor) => accessor.is_writable() && self.owner.is_some(),
            Slot::MapEntry(_) | Slot::Cell(_) => true,
        }
    }

    /// Current value; `Null` for the empty sentinel and unbound shapes.
    pub fn value(&self) -> Result<Value> {
        match (&self.slot, &self.owner) {
            (Slot::Empty, _) => Ok(Value::Null),
            (Slot::Cell(cell), _) => Ok(cell.borrow().clone()),
            (Slot::Field(field), Some(Value::Object(object))) => {
                self.access.read(&object.borrow(), field)
            }
            (Slot::Field(field), _) if field.is_static() => {
                Ok(field.static_value().unwrap_or(Value::Null))
            }
            (Slot::Accessor(accessor), Some(Value::Object(object))) => {
                Ok(accessor.read(&object.borrow()))
            }
            (Slot::MapEntry(key), Some(Value::Map(map))) => {
                Ok(map.borrow().get(key).cloned().unwrap_or(Value::Null))
            }
            _ => Ok(Value::Null),
        }
    }

    /// Declared type, or the runtime type of the current value when the
    /// declared type is `Any` or an unbound variable.
    pub fn effective_type(&self) -> Type {
        match &self.ty {
            Type::Any | Type::Variable(_) => match self.value() {
                Ok(value) if !value.is_null() => value.runtime_type(),
                _ => self.ty.clone(),
            },
            declared => declared.clone(),
        }
    }

    pub fn set_value(&self, value: Value) -> Result<()> {
        match (&self.slot, &self.owner) {
            (Slot::Cell(cell), _) => {
                *cell.borrow_mut() = value;
                Ok(())
            }
            (Slot::Field(field), Some(Value::Object(object))) => {
                self.access.write(&mut object.borrow_mut(), field, value)
            }
            (Slot::Accessor(accessor), Some(Value::Object(object))) => {
                if accessor.write(&mut object.borrow_mut(), value) {
                    Ok(())
                } else {
                    Err(Error::Access {
                        member: self.describe(),
                        reason: "property has no setter".to_string(),
                    })
                }
            }
            (Slot::MapEntry(key), Some(Value::Map(map))) => {
                map.borrow_mut().put(key.clone(), value);
                Ok(())
            }
            _ => Err(Error::Access {
                member: self.describe(),
                reason: "descriptor is not bound to an instance".to_string(),
            }),
        }
    }

    /// `Owner.name: Type`, for diagnostics.
    pub fn describe(&self) -> String {
        let owner = match &self.owner {
            Some(Value::Object(object)) => object.borrow().class().name().to_string(),
            Some(other) => other.runtime_type().to_string(),
            None => match self.slot {
                Slot::Empty => "<none>".to_string(),
                _ => "<detached>".to_string(),
            },
        };
        format!("{owner}.{}: {}", self.name, self.ty)
    }
}

impl fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}
