//! Dynamic values.
//!
//! Scalars are held inline. Objects, collections, maps and arrays are shared
//! mutable references, so object graphs keep identity and may be cyclic.
//! Containers carry their element types.

use super::class::ClassDef;
use super::types::{CollectionKind, MapKind, Primitive, Type};
use indexmap::IndexMap;
use std::cell::RefCell;
use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;
use uuid::Uuid;

pub type ObjectRef = Rc<RefCell<Object>>;
pub type CollectionRef = Rc<RefCell<CollectionObject>>;
pub type MapRef = Rc<RefCell<MapObject>>;
pub type ArrayRef = Rc<RefCell<ArrayObject>>;

/// A runtime value.
#[derive(Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Char(char),
    Str(String),
    Uuid(Uuid),
    Enum(EnumValue),
    Optional(Option<Box<Value>>),
    Object(ObjectRef),
    Collection(CollectionRef),
    Map(MapRef),
    Array(ArrayRef),
}

/// An enum constant.
#[derive(Clone)]
pub struct EnumValue {
    class: Arc<ClassDef>,
    constant: String,
}

impl EnumValue {
    pub fn new(class: Arc<ClassDef>, constant: String) -> Self {
        Self { class, constant }
    }

    pub fn class(&self) -> &Arc<ClassDef> {
        &self.class
    }

    pub fn constant(&self) -> &str {
        &self.constant
    }

    pub fn ordinal(&self) -> Option<usize> {
        self.class.ordinal(&self.constant)
    }
}

impl PartialEq for EnumValue {
    fn eq(&self, other: &Self) -> bool {
        self.class.name() == other.class.name() && self.constant == other.constant
    }
}

impl fmt::Debug for EnumValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.class.name(), self.constant)
    }
}

/// An instance of a user class.
pub struct Object {
    class: Arc<ClassDef>,
    slots: IndexMap<String, Value>,
}

impl Object {
    /// New instance with every instance field at its default value.
    pub fn new(class: Arc<ClassDef>) -> Self {
        let slots = class
            .instance_fields()
            .into_iter()
            .map(|field| (field.name().to_string(), Value::default_for(field.ty())))
            .collect();
        Self { class, slots }
    }

    pub fn class(&self) -> &Arc<ClassDef> {
        &self.class
    }

    /// Slot value; `Null` when the slot does not exist.
    pub fn get(&self, name: &str) -> Value {
        self.slots.get(name).cloned().unwrap_or(Value::Null)
    }

    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.slots.insert(name.into(), value);
    }

    pub fn slots(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.slots.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Slots are not printed: graphs may be cyclic.
        f.debug_struct("Object")
            .field("class", &self.class.name())
            .field("slots", &self.slots.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Elements of a list, set or queue.
#[derive(Debug)]
pub struct CollectionObject {
    kind: CollectionKind,
    element_type: Type,
    items: Vec<Value>,
}

impl CollectionObject {
    pub fn new(kind: CollectionKind, element_type: Type) -> Self {
        Self {
            kind,
            element_type,
            items: Vec::new(),
        }
    }

    pub fn kind(&self) -> CollectionKind {
        self.kind
    }

    pub fn element_type(&self) -> &Type {
        &self.element_type
    }

    pub fn items(&self) -> &[Value] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Add an element. Unique kinds reject duplicates; sorted kinds insert
    /// in natural order.
    pub fn add(&mut self, value: Value) -> bool {
        if self.kind.is_unique() && self.items.contains(&value) {
            return false;
        }
        if self.kind.is_sorted() {
            let at = self
                .items
                .iter()
                .position(|existing| value.natural_cmp(existing) == Some(Ordering::Less))
                .unwrap_or(self.items.len());
            self.items.insert(at, value);
        } else {
            self.items.push(value);
        }
        true
    }
}

/// Key/value entries of a map.
#[derive(Debug)]
pub struct MapObject {
    kind: MapKind,
    key_type: Type,
    value_type: Type,
    entries: Vec<(Value, Value)>,
}

impl MapObject {
    pub fn new(kind: MapKind, key_type: Type, value_type: Type) -> Self {
        Self {
            kind,
            key_type,
            value_type,
            entries: Vec::new(),
        }
    }

    pub fn kind(&self) -> MapKind {
        self.kind
    }

    pub fn key_type(&self) -> &Type {
        &self.key_type
    }

    pub fn value_type(&self) -> &Type {
        &self.value_type
    }

    pub fn entries(&self) -> &[(Value, Value)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &Value) -> bool {
        self.get(key).is_some()
    }

    /// Insert or replace; returns the previous value for the key.
    pub fn put(&mut self, key: Value, value: Value) -> Option<Value> {
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            return Some(std::mem::replace(&mut entry.1, value));
        }
        if self.kind.is_sorted() {
            let at = self
                .entries
                .iter()
                .position(|(existing, _)| key.natural_cmp(existing) == Some(Ordering::Less))
                .unwrap_or(self.entries.len());
            self.entries.insert(at, (key, value));
        } else {
            self.entries.push((key, value));
        }
        None
    }
}

/// Fixed-length array.
#[derive(Debug)]
pub struct ArrayObject {
    component: Type,
    items: Vec<Value>,
}

impl ArrayObject {
    /// Array of `len` default values for `component`.
    pub fn new(component: Type, len: usize) -> Self {
        let items = vec![Value::default_for(&component); len];
        Self { component, items }
    }

    pub fn from_items(component: Type, items: Vec<Value>) -> Self {
        Self { component, items }
    }

    pub fn component(&self) -> &Type {
        &self.component
    }

    pub fn items(&self) -> &[Value] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.items.get(index)
    }

    /// Returns `false` when `index` is out of bounds.
    pub fn set(&mut self, index: usize, value: Value) -> bool {
        match self.items.get_mut(index) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }
}

impl Value {
    pub fn object(object: Object) -> Self {
        Value::Object(Rc::new(RefCell::new(object)))
    }

    /// New object of `class` with the given slots set over the defaults.
    pub fn new_object<I, S>(class: &Arc<ClassDef>, slots: I) -> Self
    where
        I: IntoIterator<Item = (S, Value)>,
        S: Into<String>,
    {
        let mut object = Object::new(Arc::clone(class));
        for (name, value) in slots {
            object.set(name, value);
        }
        Value::object(object)
    }

    pub fn collection<I>(kind: CollectionKind, element_type: Type, items: I) -> Self
    where
        I: IntoIterator<Item = Value>,
    {
        let mut collection = CollectionObject::new(kind, element_type);
        for item in items {
            collection.add(item);
        }
        Value::Collection(Rc::new(RefCell::new(collection)))
    }

    /// `ArrayList` of `items`.
    pub fn list<I>(element_type: Type, items: I) -> Self
    where
        I: IntoIterator<Item = Value>,
    {
        Value::collection(CollectionKind::ArrayList, element_type, items)
    }

    pub fn map<I>(kind: MapKind, key_type: Type, value_type: Type, entries: I) -> Self
    where
        I: IntoIterator<Item = (Value, Value)>,
    {
        let mut map = MapObject::new(kind, key_type, value_type);
        for (key, value) in entries {
            map.put(key, value);
        }
        Value::Map(Rc::new(RefCell::new(map)))
    }

    pub fn array(component: Type, items: Vec<Value>) -> Self {
        Value::Array(Rc::new(RefCell::new(ArrayObject::from_items(component, items))))
    }

    pub fn from_collection(collection: CollectionObject) -> Self {
        Value::Collection(Rc::new(RefCell::new(collection)))
    }

    pub fn from_map(map: MapObject) -> Self {
        Value::Map(Rc::new(RefCell::new(map)))
    }

    pub fn from_array(array: ArrayObject) -> Self {
        Value::Array(Rc::new(RefCell::new(array)))
    }

    /// Zero value for primitives, `Null` for everything else.
    pub fn default_for(ty: &Type) -> Self {
        match ty {
            Type::Primitive(p) => Value::zero(*p),
            _ => Value::Null,
        }
    }

    pub fn zero(primitive: Primitive) -> Self {
        match primitive {
            Primitive::Boolean => Value::Bool(false),
            Primitive::Byte => Value::Byte(0),
            Primitive::Short => Value::Short(0),
            Primitive::Int => Value::Int(0),
            Primitive::Long => Value::Long(0),
            Primitive::Float => Value::Float(0.0),
            Primitive::Double => Value::Double(0.0),
            Primitive::Char => Value::Char('\0'),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Primitive kind of a scalar value.
    pub fn primitive_kind(&self) -> Option<Primitive> {
        match self {
            Value::Bool(_) => Some(Primitive::Boolean),
            Value::Byte(_) => Some(Primitive::Byte),
            Value::Short(_) => Some(Primitive::Short),
            Value::Int(_) => Some(Primitive::Int),
            Value::Long(_) => Some(Primitive::Long),
            Value::Float(_) => Some(Primitive::Float),
            Value::Double(_) => Some(Primitive::Double),
            Value::Char(_) => Some(Primitive::Char),
            _ => None,
        }
    }

    /// Type of the value itself. Scalars report their boxed type.
    pub fn runtime_type(&self) -> Type {
        if let Some(primitive) = self.primitive_kind() {
            return Type::Boxed(primitive);
        }
        match self {
            Value::Str(_) => Type::String,
            Value::Uuid(_) => Type::Uuid,
            Value::Enum(e) => Type::class(e.class.name()),
            Value::Optional(Some(inner)) => Type::optional(inner.runtime_type()),
            Value::Optional(None) => Type::optional(Type::Any),
            Value::Object(o) => Type::class(o.borrow().class.name()),
            Value::Collection(c) => {
                let c = c.borrow();
                Type::collection(c.kind, c.element_type.clone())
            }
            Value::Map(m) => {
                let m = m.borrow();
                Type::map_of(m.kind, m.key_type.clone(), m.value_type.clone())
            }
            Value::Array(a) => Type::array(a.borrow().component.clone()),
            _ => Type::Any,
        }
    }

    /// Address of a reference value, used for identity tracking.
    pub fn identity(&self) -> Option<usize> {
        match self {
            Value::Object(o) => Some(Rc::as_ptr(o) as *const () as usize),
            Value::Collection(c) => Some(Rc::as_ptr(c) as *const () as usize),
            Value::Map(m) => Some(Rc::as_ptr(m) as *const () as usize),
            Value::Array(a) => Some(Rc::as_ptr(a) as *const () as usize),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Integral scalars widened to `i64`.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Byte(v) => Some(i64::from(*v)),
            Value::Short(v) => Some(i64::from(*v)),
            Value::Int(v) => Some(i64::from(*v)),
            Value::Long(v) => Some(*v),
            Value::Char(c) => Some(i64::from(u32::from(*c))),
            _ => None,
        }
    }

    /// Numeric scalars as `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(f64::from(*v)),
            Value::Double(v) => Some(*v),
            other => other.as_i64().map(|v| v as f64),
        }
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_collection(&self) -> Option<&CollectionRef> {
        match self {
            Value::Collection(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&MapRef> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&ArrayRef> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_enum(&self) -> Option<&EnumValue> {
        match self {
            Value::Enum(e) => Some(e),
            _ => None,
        }
    }

    /// Read a slot of an object value.
    pub fn get(&self, slot: &str) -> Value {
        match self {
            Value::Object(o) => o.borrow().get(slot),
            _ => Value::Null,
        }
    }

    /// Elements of a collection or array value.
    pub fn elements(&self) -> Vec<Value> {
        match self {
            Value::Collection(c) => c.borrow().items.clone(),
            Value::Array(a) => a.borrow().items.clone(),
            _ => Vec::new(),
        }
    }

    /// Numeric promotion along the lattice; `None` when `self` does not
    /// strictly widen to `target`.
    pub fn widen(&self, target: Primitive) -> Option<Value> {
        let source = self.primitive_kind()?;
        if !source.widens_to(target) {
            return None;
        }
        if let Value::Float(v) = self {
            return Some(Value::Double(f64::from(*v)));
        }
        let wide = self.as_i64()?;
        match target {
            Primitive::Short => i16::try_from(wide).ok().map(Value::Short),
            Primitive::Int => i32::try_from(wide).ok().map(Value::Int),
            Primitive::Long => Some(Value::Long(wide)),
            Primitive::Float => Some(Value::Float(wide as f32)),
            Primitive::Double => Some(Value::Double(wide as f64)),
            _ => None,
        }
    }

    /// Natural ordering for comparable scalars; `None` when incomparable.
    pub fn natural_cmp(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            (Value::Char(a), Value::Char(b)) => Some(a.cmp(b)),
            (Value::Uuid(a), Value::Uuid(b)) => Some(a.cmp(b)),
            (Value::Enum(a), Value::Enum(b)) if a.class.name() == b.class.name() => {
                Some(a.ordinal().cmp(&b.ordinal()))
            }
            (a, b) => match (a.as_i64(), b.as_i64()) {
                (Some(x), Some(y)) => Some(x.cmp(&y)),
                _ => a.as_f64()?.partial_cmp(&b.as_f64()?),
            },
        }
    }

    /// Characters of the rendered value.
    pub fn to_char_array(&self) -> Value {
        let items = self.to_string().chars().map(Value::Char).collect();
        Value::array(Type::CHAR, items)
    }
}

fn render_float(value: f64, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if value.is_nan() {
        f.write_str("NaN")
    } else if value.is_infinite() {
        f.write_str(if value > 0.0 { "Infinity" } else { "-Infinity" })
    } else if value.fract() == 0.0 && value.abs() < 1e7 {
        write!(f, "{value:.1}")
    } else {
        write!(f, "{value}")
    }
}

fn join(f: &mut fmt::Formatter<'_>, items: impl Iterator<Item = String>) -> fmt::Result {
    let mut first = true;
    for item in items {
        if !first {
            f.write_str(", ")?;
        }
        first = false;
        f.write_str(&item)?;
    }
    Ok(())
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Byte(v) => write!(f, "{v}"),
            Value::Short(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Long(v) => write!(f, "{v}"),
            Value::Float(v) => {
                if v.fract() == 0.0 && v.abs() < 1e7 {
                    write!(f, "{v:.1}")
                } else {
                    render_float(f64::from(*v), f)
                }
            }
            Value::Double(v) => render_float(*v, f),
            Value::Char(c) => write!(f, "{c}"),
            Value::Str(s) => f.write_str(s),
            Value::Uuid(u) => write!(f, "{}", u.hyphenated()),
            Value::Enum(e) => f.write_str(&e.constant),
            Value::Optional(Some(inner)) => write!(f, "Optional[{inner}]"),
            Value::Optional(None) => f.write_str("Optional.empty"),
            Value::Object(o) => {
                let object = o.borrow();
                match object.class.renderer() {
                    Some(render) => f.write_str(&render(&object)),
                    None => write!(f, "{}@{:x}", object.class.name(), Rc::as_ptr(o) as usize),
                }
            }
            Value::Collection(c) => {
                f.write_str("[")?;
                join(f, c.borrow().items.iter().map(ToString::to_string))?;
                f.write_str("]")
            }
            Value::Map(m) => {
                f.write_str("{")?;
                join(
                    f,
                    m.borrow().entries.iter().map(|(k, v)| format!("{k}={v}")),
                )?;
                f.write_str("}")
            }
            Value::Array(a) => write!(f, "{}[]@{:x}", a.borrow().component, Rc::as_ptr(a) as usize),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("Null"),
            Value::Str(s) => write!(f, "Str({s:?})"),
            Value::Enum(e) => write!(f, "Enum({e:?})"),
            Value::Optional(inner) => write!(f, "Optional({inner:?})"),
            Value::Object(o) => write!(f, "{:?}", o.borrow()),
            Value::Collection(c) => {
                let c = c.borrow();
                write!(f, "{}<{}>{:?}", c.kind.name(), c.element_type, c.items)
            }
            Value::Map(m) => {
                let m = m.borrow();
                write!(f, "{}<{}, {}>{:?}", m.kind.name(), m.key_type, m.value_type, m.entries)
            }
            Value::Array(a) => {
                let a = a.borrow();
                write!(f, "{}[]{:?}", a.component, a.items)
            }
            scalar => write!(f, "{}({scalar})", scalar.runtime_type()),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Byte(a), Value::Byte(b)) => a == b,
            (Value::Short(a), Value::Short(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Long(a), Value::Long(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Double(a), Value::Double(b)) => a.to_bits() == b.to_bits(),
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Uuid(a), Value::Uuid(b)) => a == b,
            (Value::Enum(a), Value::Enum(b)) => a == b,
            (Value::Optional(a), Value::Optional(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            (Value::Collection(a), Value::Collection(b)) => {
                if Rc::ptr_eq(a, b) {
                    return true;
                }
                let (a, b) = (a.borrow(), b.borrow());
                if a.kind.is_unique() != b.kind.is_unique() || a.items.len() != b.items.len() {
                    return false;
                }
                if a.kind.is_unique() {
                    a.items.iter().all(|item| b.items.contains(item))
                } else {
                    a.items == b.items
                }
            }
            (Value::Map(a), Value::Map(b)) => {
                if Rc::ptr_eq(a, b) {
                    return true;
                }
                let (a, b) = (a.borrow(), b.borrow());
                a.entries.len() == b.entries.len()
                    && a.entries.iter().all(|(k, v)| b.get(k) == Some(v))
            }
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i8> for Value {
    fn from(v: i8) -> Self {
        Value::Byte(v)
    }
}

impl From<i16> for Value {
    fn from(v: i16) -> Self {
        Value::Short(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Long(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<char> for Value {
    fn from(v: char) -> Self {
        Value::Char(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<Uuid> for Value {
    fn from(v: Uuid) -> Self {
        Value::Uuid(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        Value::Optional(v.map(|inner| Box::new(inner.into())))
    }
}
