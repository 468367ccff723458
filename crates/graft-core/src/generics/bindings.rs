//! Formal type parameter bindings.

use crate::model::Type;
use indexmap::IndexMap;
use std::fmt;

/// Formal type parameter name to concrete type.
///
/// Besides plain parameters (`T`), a concrete binding also records the
/// array form (`T[]`) with a boxed component, which is what an array field
/// declared as `T[]` resolves to.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypeBindings {
    types: IndexMap<String, Type>,
}

impl TypeBindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Key under which the array form of `name` is recorded.
    pub fn array_key(name: &str) -> String {
        format!("{name}[]")
    }

    /// Bind `name`; concrete types also bind `name[]`.
    pub fn bind(&mut self, name: impl Into<String>, ty: Type) {
        let name = name.into();
        if !ty.has_variables() {
            self.types
                .insert(Self::array_key(&name), Type::array(ty.boxed()));
        }
        self.types.insert(name, ty);
    }

    pub fn get(&self, name: &str) -> Option<&Type> {
        self.types.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Type)> {
        self.types.iter().map(|(name, ty)| (name.as_str(), ty))
    }
}

impl fmt::Display for TypeBindings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (name, ty)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}={ty}")?;
        }
        f.write_str("}")
    }
}

impl<S: Into<String>> FromIterator<(S, Type)> for TypeBindings {
    fn from_iter<I: IntoIterator<Item = (S, Type)>>(iter: I) -> Self {
        let mut bindings = TypeBindings::new();
        for (name, ty) in iter {
            bindings.bind(name, ty);
        }
        bindings
    }
}
