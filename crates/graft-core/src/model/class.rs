//! Class definitions: the reflective surface the engine works against.
//!
//! A `ClassDef` declares what the host language would expose through
//! reflection: fields, accessor methods, single-argument constructors,
//! static factory methods, enum constants and the super class chain.

use super::types::Type;
use super::value::{EnumValue, Object, Value};
use crate::error::{Error, Result};
use std::fmt;
use std::sync::Arc;

/// Single-argument callable used by constructors and static methods.
pub type Invoker = Arc<dyn Fn(&Value) -> anyhow::Result<Value> + Send + Sync>;
/// Accessor read function.
pub type Getter = Arc<dyn Fn(&Object) -> Value + Send + Sync>;
/// Accessor write function.
pub type Setter = Arc<dyn Fn(&mut Object, Value) + Send + Sync>;
/// User-registered instance creation override.
pub type Creator = Arc<dyn Fn() -> Value + Send + Sync>;
/// Custom string rendering for objects of a class.
pub type Renderer = Arc<dyn Fn(&Object) -> String + Send + Sync>;
/// Supplier for the value of a static field.
pub type ConstantSupplier = Arc<dyn Fn() -> Value + Send + Sync>;

/// Member visibility. Private members need a privileged `MemberAccess`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Public,
    Private,
}

/// A declared field.
#[derive(Clone)]
pub struct FieldDef {
    name: String,
    ty: Type,
    visibility: Visibility,
    expandable: bool,
    constant: Option<ConstantSupplier>,
}

impl FieldDef {
    /// An instance field.
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
            visibility: Visibility::Public,
            expandable: false,
            constant: None,
        }
    }

    /// A static field whose value comes from `supplier`.
    pub fn constant(
        name: impl Into<String>,
        ty: Type,
        supplier: impl Fn() -> Value + Send + Sync + 'static,
    ) -> Self {
        Self {
            constant: Some(Arc::new(supplier)),
            ..Self::new(name, ty)
        }
    }

    pub fn private(mut self) -> Self {
        self.visibility = Visibility::Private;
        self
    }

    /// Mark the field expandable: it is only populated when the expandable
    /// policy selects it.
    pub fn expandable(mut self) -> Self {
        self.expandable = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> &Type {
        &self.ty
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn is_static(&self) -> bool {
        self.constant.is_some()
    }

    pub fn is_expandable(&self) -> bool {
        self.expandable
    }

    /// Current value of a static field.
    pub fn static_value(&self) -> Option<Value> {
        self.constant.as_ref().map(|supplier| supplier())
    }
}

impl fmt::Debug for FieldDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDef")
            .field("name", &self.name)
            .field("ty", &self.ty)
            .field("visibility", &self.visibility)
            .field("static", &self.is_static())
            .field("expandable", &self.expandable)
            .finish()
    }
}

/// A getter-style method exposed as a property.
///
/// `getFullName` becomes the property `fullName`, `isActive` becomes `active`.
#[derive(Clone)]
pub struct AccessorDef {
    method: String,
    property: String,
    ty: Type,
    getter: Getter,
    setter: Option<Setter>,
}

impl AccessorDef {
    pub fn getter(
        method: impl Into<String>,
        ty: Type,
        getter: impl Fn(&Object) -> Value + Send + Sync + 'static,
    ) -> Self {
        let method = method.into();
        Self {
            property: property_name(&method),
            method,
            ty,
            getter: Arc::new(getter),
            setter: None,
        }
    }

    pub fn with_setter(mut self, setter: impl Fn(&mut Object, Value) + Send + Sync + 'static) -> Self {
        self.setter = Some(Arc::new(setter));
        self
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn property(&self) -> &str {
        &self.property
    }

    pub fn ty(&self) -> &Type {
        &self.ty
    }

    pub fn read(&self, object: &Object) -> Value {
        (self.getter)(object)
    }

    pub fn is_writable(&self) -> bool {
        self.setter.is_some()
    }

    /// Returns `false` when the accessor has no setter.
    pub fn write(&self, object: &mut Object, value: Value) -> bool {
        match &self.setter {
            Some(setter) => {
                setter(object, value);
                true
            }
            None => false,
        }
    }
}

impl fmt::Debug for AccessorDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessorDef")
            .field("method", &self.method)
            .field("property", &self.property)
            .field("ty", &self.ty)
            .field("writable", &self.is_writable())
            .finish()
    }
}

/// Property name for an accessor method name.
pub fn property_name(method: &str) -> String {
    let stripped = ["get", "is"].iter().find_map(|prefix| {
        method
            .strip_prefix(prefix)
            .filter(|rest| rest.chars().next().is_some_and(char::is_uppercase))
    });
    match stripped {
        Some(rest) => {
            let mut chars = rest.chars();
            let mut out = String::with_capacity(rest.len());
            if let Some(first) = chars.next() {
                out.extend(first.to_lowercase());
            }
            out.push_str(chars.as_str());
            out
        }
        None => method.to_string(),
    }
}

/// A single-argument static method.
#[derive(Clone)]
pub struct MethodDef {
    name: String,
    param: Type,
    returns: Type,
    invoke: Invoker,
}

impl MethodDef {
    pub fn new(
        name: impl Into<String>,
        param: Type,
        returns: Type,
        invoke: impl Fn(&Value) -> anyhow::Result<Value> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            param,
            returns,
            invoke: Arc::new(invoke),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn param(&self) -> &Type {
        &self.param
    }

    pub fn returns(&self) -> &Type {
        &self.returns
    }

    pub fn invoke(&self, argument: &Value) -> anyhow::Result<Value> {
        (self.invoke)(argument)
    }
}

impl fmt::Debug for MethodDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "static {} {}({})", self.returns, self.name, self.param)
    }
}

/// A single-argument constructor.
#[derive(Clone)]
pub struct ConstructorDef {
    param: Type,
    invoke: Invoker,
}

impl ConstructorDef {
    pub fn param(&self) -> &Type {
        &self.param
    }

    pub fn invoke(&self, argument: &Value) -> anyhow::Result<Value> {
        (self.invoke)(argument)
    }
}

impl fmt::Debug for ConstructorDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "new({})", self.param)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassKind {
    Class,
    Abstract,
    Enum,
}

/// A class, abstract class or enum.
pub struct ClassDef {
    name: String,
    kind: ClassKind,
    super_class: Option<Arc<ClassDef>>,
    super_args: Vec<Type>,
    interfaces: Vec<String>,
    type_params: Vec<String>,
    fields: Vec<FieldDef>,
    accessors: Vec<AccessorDef>,
    constructors: Vec<ConstructorDef>,
    static_methods: Vec<MethodDef>,
    constants: Vec<String>,
    creator: Option<Creator>,
    renderer: Option<Renderer>,
}

impl ClassDef {
    pub fn builder(name: impl Into<String>) -> ClassBuilder {
        ClassBuilder::new(name.into(), ClassKind::Class)
    }

    /// Builder for an enum with the given constants, in ordinal order.
    pub fn enumeration<I, S>(name: impl Into<String>, constants: I) -> ClassBuilder
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut builder = ClassBuilder::new(name.into(), ClassKind::Enum);
        builder.class.constants = constants.into_iter().map(Into::into).collect();
        builder
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ClassKind {
        self.kind
    }

    pub fn is_enum(&self) -> bool {
        self.kind == ClassKind::Enum
    }

    pub fn is_abstract(&self) -> bool {
        self.kind == ClassKind::Abstract
    }

    pub fn super_class(&self) -> Option<&Arc<ClassDef>> {
        self.super_class.as_ref()
    }

    /// Type arguments passed to the super class, in terms of this class's
    /// own type parameters.
    pub fn super_args(&self) -> &[Type] {
        &self.super_args
    }

    pub fn type_params(&self) -> &[String] {
        &self.type_params
    }

    pub fn declared_fields(&self) -> &[FieldDef] {
        &self.fields
    }

    pub fn accessors(&self) -> &[AccessorDef] {
        &self.accessors
    }

    pub fn constructors(&self) -> &[ConstructorDef] {
        &self.constructors
    }

    pub fn static_methods(&self) -> &[MethodDef] {
        &self.static_methods
    }

    pub fn constants(&self) -> &[String] {
        &self.constants
    }

    pub fn creator(&self) -> Option<&Creator> {
        self.creator.as_ref()
    }

    pub fn renderer(&self) -> Option<&Renderer> {
        self.renderer.as_ref()
    }

    /// This class followed by its super classes, derived first.
    pub fn ancestry(&self) -> impl Iterator<Item = &ClassDef> {
        std::iter::successors(Some(self), |class| class.super_class.as_deref())
    }

    /// Whether this class is, extends or implements `name`.
    pub fn is_subtype_of(&self, name: &str) -> bool {
        self.ancestry()
            .any(|class| class.name == name || class.interfaces.iter().any(|i| i == name))
    }

    /// First field named `name`, searching derived to base.
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.ancestry()
            .flat_map(|class| class.fields.iter())
            .find(|field| field.name == name)
    }

    /// First accessor exposing property `name`, searching derived to base.
    pub fn accessor(&self, property: &str) -> Option<&AccessorDef> {
        self.ancestry()
            .flat_map(|class| class.accessors.iter())
            .find(|accessor| accessor.property == property)
    }

    /// Instance fields across the hierarchy, derived first. A base field
    /// shadowed by a derived field of the same name is left out.
    pub fn instance_fields(&self) -> Vec<&FieldDef> {
        let mut seen: Vec<&FieldDef> = Vec::new();
        for field in self.ancestry().flat_map(|class| class.fields.iter()) {
            if !field.is_static() && !seen.iter().any(|f| f.name == field.name) {
                seen.push(field);
            }
        }
        seen
    }

    /// Ordinal of an enum constant.
    pub fn ordinal(&self, constant: &str) -> Option<usize> {
        self.constants.iter().position(|c| c == constant)
    }

    /// Name lookup of an enum constant.
    pub fn enum_constant(self: &Arc<Self>, constant: &str) -> Option<Value> {
        self.ordinal(constant).map(|_| {
            Value::Enum(EnumValue::new(Arc::clone(self), constant.to_string()))
        })
    }

    /// Default construction: every instance field at its default value.
    ///
    /// Ignores any registered creator override.
    pub fn instantiate(self: &Arc<Self>) -> Result<Value> {
        match self.kind {
            ClassKind::Class => Ok(Value::object(Object::new(Arc::clone(self)))),
            ClassKind::Abstract => Err(Error::Instantiation {
                class: self.name.clone(),
                reason: "class is abstract".to_string(),
            }),
            ClassKind::Enum => Err(Error::Instantiation {
                class: self.name.clone(),
                reason: "enums cannot be instantiated".to_string(),
            }),
        }
    }

    /// Creation through the user override when one is registered, falling
    /// back to default construction.
    pub fn create(self: &Arc<Self>) -> Result<Value> {
        match &self.creator {
            Some(creator) => match creator() {
                Value::Null => Err(Error::Instantiation {
                    class: self.name.clone(),
                    reason: "creator returned null".to_string(),
                }),
                value => Ok(value),
            },
            None => self.instantiate(),
        }
    }
}

impl fmt::Debug for ClassDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassDef")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("super", &self.super_class.as_ref().map(|s| s.name()))
            .field("type_params", &self.type_params)
            .field("fields", &self.fields)
            .finish_non_exhaustive()
    }
}

/// Builder for `ClassDef`.
pub struct ClassBuilder {
    class: ClassDef,
}

impl ClassBuilder {
    fn new(name: String, kind: ClassKind) -> Self {
        Self {
            class: ClassDef {
                name,
                kind,
                super_class: None,
                super_args: Vec::new(),
                interfaces: Vec::new(),
                type_params: Vec::new(),
                fields: Vec::new(),
                accessors: Vec::new(),
                constructors: Vec::new(),
                static_methods: Vec::new(),
                constants: Vec::new(),
                creator: None,
                renderer: None,
            },
        }
    }

    pub fn abstract_class(mut self) -> Self {
        self.class.kind = ClassKind::Abstract;
        self
    }

    pub fn extends(mut self, base: &Arc<ClassDef>) -> Self {
        self.class.super_class = Some(Arc::clone(base));
        self
    }

    /// Extend a generic base, e.g. `extends Base<T>`.
    pub fn extends_generic(mut self, base: &Arc<ClassDef>, args: Vec<Type>) -> Self {
        self.class.super_class = Some(Arc::clone(base));
        self.class.super_args = args;
        self
    }

    pub fn implements(mut self, interface: impl Into<String>) -> Self {
        self.class.interfaces.push(interface.into());
        self
    }

    pub fn type_param(mut self, name: impl Into<String>) -> Self {
        self.class.type_params.push(name.into());
        self
    }

    pub fn field(mut self, field: FieldDef) -> Self {
        self.class.fields.push(field);
        self
    }

    pub fn accessor(mut self, accessor: AccessorDef) -> Self {
        self.class.accessors.push(accessor);
        self
    }

    pub fn constructor(
        mut self,
        param: Type,
        invoke: impl Fn(&Value) -> anyhow::Result<Value> + Send + Sync + 'static,
    ) -> Self {
        self.class.constructors.push(ConstructorDef {
            param,
            invoke: Arc::new(invoke),
        });
        self
    }

    pub fn static_method(mut self, method: MethodDef) -> Self {
        self.class.static_methods.push(method);
        self
    }

    pub fn creator(mut self, creator: impl Fn() -> Value + Send + Sync + 'static) -> Self {
        self.class.creator = Some(Arc::new(creator));
        self
    }

    pub fn renderer(mut self, renderer: impl Fn(&Object) -> String + Send + Sync + 'static) -> Self {
        self.class.renderer = Some(Arc::new(renderer));
        self
    }

    pub fn build(self) -> Arc<ClassDef> {
        Arc::new(self.class)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_property_name() {
        assert_eq!(property_name("getFullName"), "fullName");
        assert_eq!(property_name("isActive"), "active");
        assert_eq!(property_name("getter"), "getter");
        assert_eq!(property_name("size"), "size");
    }

    #[test]
    fn test_instance_fields_shadowing() {
        let base = ClassDef::builder("Base")
            .field(FieldDef::new("id", Type::LONG))
            .field(FieldDef::new("name", Type::String))
            .build();
        let derived = ClassDef::builder("Derived")
            .extends(&base)
            .field(FieldDef::new("name", Type::String).private())
            .field(FieldDef::constant("MAX", Type::INT, || Value::Int(3)))
            .build();

        let names: Vec<_> = derived.instance_fields().iter().map(|f| f.name()).collect();
        assert_eq!(names, vec!["name", "id"]);
        assert!(derived.is_subtype_of("Base"));
        assert_eq!(
            derived.field("name").map(FieldDef::visibility),
            Some(Visibility::Private)
        );
    }

    #[test]
    fn test_instantiate_rejects_abstract_and_enum() {
        let shape = ClassDef::builder("Shape").abstract_class().build();
        assert!(matches!(shape.instantiate(), Err(Error::Instantiation { .. })));

        let status = ClassDef::enumeration("Status", ["ACTIVE", "INACTIVE"]).build();
        assert!(status.instantiate().is_err());
        assert_eq!(status.ordinal("INACTIVE"), Some(1));
        assert!(status.enum_constant("ACTIVE").is_some());
        assert!(status.enum_constant("DELETED").is_none());
    }
}
