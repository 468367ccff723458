//! Generic type resolution.
//!
//! A destination requested as `Page<DestItem>` declares its fields in terms
//! of the formal parameter `T`. The resolver pairs formal parameters with
//! the requested arguments, follows `extends Base<...>` arguments up the
//! class hierarchy, and substitutes the bindings into every member type.

pub mod bindings;
pub mod transform;

pub use bindings::TypeBindings;
pub use transform::{Substitution, TypeTransform, walk_transform_type};

use crate::model::{ClassDef, Type, TypeRegistry};
use indexmap::{IndexMap, IndexSet};
use std::sync::Arc;
use tracing::debug;

/// Member types of one destination class after substitution.
#[derive(Debug, Clone, Default)]
pub struct ResolvedMembers {
    bindings: TypeBindings,
    types: IndexMap<String, Type>,
    unresolved: IndexSet<String>,
}

impl ResolvedMembers {
    /// Bindings of the class itself, as seen by its own members.
    pub fn bindings(&self) -> &TypeBindings {
        &self.bindings
    }

    /// Concrete type of member `name`.
    pub fn type_of(&self, name: &str) -> Option<&Type> {
        self.types.get(name)
    }

    /// Member mentions a type parameter with no binding.
    pub fn is_unresolved(&self, name: &str) -> bool {
        self.unresolved.contains(name)
    }

    pub fn unresolved(&self) -> impl Iterator<Item = &str> {
        self.unresolved.iter().map(String::as_str)
    }
}

/// Recovers concrete member types for parameterized destinations.
#[derive(Debug, Clone, Copy)]
pub struct TypeResolver<'a> {
    registry: &'a TypeRegistry,
}

impl<'a> TypeResolver<'a> {
    pub fn new(registry: &'a TypeRegistry) -> Self {
        Self { registry }
    }

    /// Substitute `bindings` into `ty`; `None` when a parameter is unbound.
    pub fn resolve(&self, ty: &Type, bindings: &TypeBindings) -> Option<Type> {
        if !ty.has_variables() {
            return Some(ty.clone());
        }
        Substitution::new(bindings).transform_type(ty)
    }

    /// Bindings for `class` requested with `args`.
    ///
    /// Arguments may themselves mention parameters of the enclosing
    /// destination; those are resolved against `enclosing` first. Missing
    /// or unresolvable arguments leave the parameter unbound.
    pub fn bind_class(&self, class: &ClassDef, args: &[Type], enclosing: &TypeBindings) -> TypeBindings {
        let mut bindings = TypeBindings::new();
        for (index, param) in class.type_params().iter().enumerate() {
            match args.get(index).map(|arg| self.resolve(arg, enclosing)) {
                Some(Some(ty)) => bindings.bind(param.clone(), ty),
                Some(None) => debug!(
                    class = class.name(),
                    param = param.as_str(),
                    "type argument references an unbound parameter"
                ),
                None => debug!(
                    class = class.name(),
                    param = param.as_str(),
                    "raw use of generic class, parameter left unbound"
                ),
            }
        }
        bindings
    }

    /// Bindings for a requested class type, looked up in the registry.
    pub fn bind_type(&self, ty: &Type, enclosing: &TypeBindings) -> Option<TypeBindings> {
        let class = self.registry.class_of(ty)?;
        let args: Vec<Type> = ty.type_args().into_iter().cloned().collect();
        Some(self.bind_class(class, &args, enclosing))
    }

    /// Concrete types of every field and accessor property of `class`
    /// requested with `args`.
    ///
    /// Members declared on a base class are resolved against the bindings
    /// derived from the subclass's super type arguments. Fields shadow
    /// accessors of the same name and derived members shadow base ones,
    /// matching member enumeration.
    pub fn resolve_members(
        &self,
        class: &Arc<ClassDef>,
        args: &[Type],
        enclosing: &TypeBindings,
    ) -> ResolvedMembers {
        let own = self.bind_class(class, args, enclosing);

        let mut levels: Vec<(&ClassDef, TypeBindings)> = Vec::new();
        let mut current = Some((class.as_ref(), own.clone()));
        while let Some((def, bindings)) = current {
            current = def
                .super_class()
                .map(|base| (base.as_ref(), self.bind_class(base, def.super_args(), &bindings)));
            levels.push((def, bindings));
        }

        let mut resolved = ResolvedMembers {
            bindings: own,
            ..ResolvedMembers::default()
        };
        let fields = levels
            .iter()
            .flat_map(|(def, b)| def.declared_fields().iter().map(move |f| (f.name(), f.ty(), b)));
        let accessors = levels
            .iter()
            .flat_map(|(def, b)| def.accessors().iter().map(move |a| (a.property(), a.ty(), b)));
        for (name, ty, bindings) in fields.chain(accessors) {
            if resolved.types.contains_key(name) || resolved.unresolved.contains(name) {
                continue;
            }
            match self.resolve(ty, bindings) {
                Some(concrete) => {
                    resolved.types.insert(name.to_string(), concrete);
                }
                None => {
                    debug!(
                        class = class.name(),
                        member = name,
                        declared = %ty,
                        "no binding for member type"
                    );
                    resolved.unresolved.insert(name.to_string());
                }
            }
        }
        resolved
    }

    /// Element type for a container destination, resolving parameters.
    pub fn element_type(&self, container: &Type, bindings: &TypeBindings) -> Option<Type> {
        container
            .element_type()
            .and_then(|element| self.resolve(element, bindings))
    }

    /// Key and value types for a map destination, resolving parameters.
    pub fn entry_types(&self, map: &Type, bindings: &TypeBindings) -> Option<(Type, Type)> {
        let (key, value) = map.entry_types()?;
        Some((self.resolve(key, bindings)?, self.resolve(value, bindings)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AccessorDef, FieldDef, Value};

    fn registry() -> (TypeRegistry, Arc<ClassDef>) {
        let base = ClassDef::builder("Holder")
            .type_param("V")
            .field(FieldDef::new("value", Type::var("V")))
            .field(FieldDef::new("history", Type::array(Type::var("V"))))
            .build();
        let page = ClassDef::builder("Page")
            .type_param("T")
            .extends_generic(&base, vec![Type::list(Type::var("T"))])
            .field(FieldDef::new("items", Type::list(Type::var("T"))))
            .field(FieldDef::new("first", Type::var("T")))
            .field(FieldDef::new("total", Type::INT))
            .accessor(AccessorDef::getter("getLast", Type::var("T"), |_| Value::Null))
            .build();
        (TypeRegistry::new().with(&page), page)
    }

    #[test]
    fn test_resolve_members_substitutes_arguments() {
        let (registry, page) = registry();
        let resolver = TypeResolver::new(&registry);
        let members = resolver.resolve_members(&page, &[Type::class("Item")], &TypeBindings::new());

        assert_eq!(members.type_of("items"), Some(&Type::list(Type::class("Item"))));
        assert_eq!(members.type_of("first"), Some(&Type::class("Item")));
        assert_eq!(members.type_of("total"), Some(&Type::INT));
        assert_eq!(members.type_of("last"), Some(&Type::class("Item")));
        assert_eq!(members.bindings().get("T"), Some(&Type::class("Item")));
    }

    #[test]
    fn test_base_members_follow_super_arguments() {
        let (registry, page) = registry();
        let resolver = TypeResolver::new(&registry);
        let members = resolver.resolve_members(&page, &[Type::LONG], &TypeBindings::new());

        assert_eq!(
            members.type_of("value"),
            Some(&Type::list(Type::LONG))
        );
        assert_eq!(
            members.type_of("history"),
            Some(&Type::array(Type::list(Type::LONG)))
        );
    }

    #[test]
    fn test_raw_use_leaves_members_unresolved() {
        let (registry, page) = registry();
        let resolver = TypeResolver::new(&registry);
        let members = resolver.resolve_members(&page, &[], &TypeBindings::new());

        assert!(members.is_unresolved("first"));
        assert!(members.is_unresolved("items"));
        assert!(!members.is_unresolved("total"));
    }

    #[test]
    fn test_arguments_resolve_against_enclosing_bindings() {
        let (registry, _) = registry();
        let resolver = TypeResolver::new(&registry);
        let enclosing: TypeBindings = [("E", Type::String)].into_iter().collect();
        let bindings = resolver
            .bind_type(&Type::generic("Page", vec![Type::var("E")]), &enclosing)
            .unwrap_or_default();
        assert_eq!(bindings.get("T"), Some(&Type::String));
        assert_eq!(
            resolver.element_type(&Type::list(Type::var("T")), &bindings),
            Some(Type::String)
        );
    }
}
