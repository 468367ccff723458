//! Runtime object model.
//!
//! Types, values and class definitions stand in for host-language
//! reflection: every slot the engine reads or writes is described by a
//! `Type`, every instance carries its `ClassDef`.

pub mod class;
pub mod registry;
pub mod typed;
pub mod types;
pub mod value;

pub use class::{
    AccessorDef, ClassBuilder, ClassDef, ClassKind, ConstructorDef, FieldDef, MethodDef,
    Visibility, property_name,
};
pub use registry::TypeRegistry;
pub use typed::Reflect;
pub use types::{CollectionKind, MapKind, Primitive, Type};
pub use value::{
    ArrayObject, ArrayRef, CollectionObject, CollectionRef, EnumValue, MapObject, MapRef, Object,
    ObjectRef, Value,
};
