//! Transform walker over runtime types.
//!
//! Implementors override the hooks they care about; the walker rebuilds
//! every other shape from its transformed parts.

use super::bindings::TypeBindings;
use crate::model::Type;

/// Rewrites a `Type`, possibly failing (`None`) on a part it cannot map.
pub trait TypeTransform {
    /// Replacement for a formal type parameter.
    fn transform_variable(&self, name: &str) -> Option<Type>;

    /// Transform a complete type. Uses the default walker.
    fn transform_type(&self, ty: &Type) -> Option<Type> {
        walk_transform_type(self, ty)
    }

    /// Transform an array type given its component.
    fn transform_array(&self, component: &Type) -> Option<Type> {
        Some(Type::array(self.transform_type(component)?))
    }
}

/// Walk and transform a type, recursing into type arguments.
pub fn walk_transform_type<V>(visitor: &V, ty: &Type) -> Option<Type>
where
    V: TypeTransform + ?Sized,
{
    match ty {
        Type::Variable(name) => visitor.transform_variable(name),
        Type::Array(component) => visitor.transform_array(component),
        Type::Optional(inner) => Some(Type::optional(visitor.transform_type(inner)?)),
        Type::Collection(kind, element) => Some(Type::collection(
            *kind,
            visitor.transform_type(element)?,
        )),
        Type::Map(kind, key, value) => Some(Type::map_of(
            *kind,
            visitor.transform_type(key)?,
            visitor.transform_type(value)?,
        )),
        Type::Class(name, args) => {
            let args: Option<Vec<_>> = args.iter().map(|a| visitor.transform_type(a)).collect();
            Some(Type::Class(name.clone(), args?))
        }
        Type::Any | Type::Primitive(_) | Type::Boxed(_) | Type::String | Type::Uuid => {
            Some(ty.clone())
        }
    }
}

/// Substitutes bound type parameters.
///
/// An array of a type parameter prefers the recorded `T[]` binding over
/// rebuilding the array from `T`.
pub struct Substitution<'a> {
    bindings: &'a TypeBindings,
}

impl<'a> Substitution<'a> {
    pub fn new(bindings: &'a TypeBindings) -> Self {
        Self { bindings }
    }
}

impl TypeTransform for Substitution<'_> {
    fn transform_variable(&self, name: &str) -> Option<Type> {
        self.bindings.get(name).cloned()
    }

    fn transform_array(&self, component: &Type) -> Option<Type> {
        if let Type::Variable(name) = component {
            if let Some(array) = self.bindings.get(&TypeBindings::array_key(name)) {
                return Some(array.clone());
            }
        }
        Some(Type::array(self.transform_type(component)?))
    }
}
