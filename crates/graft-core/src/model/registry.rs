//! Class registry and assignability.

use super::class::ClassDef;
use super::types::Type;
use crate::error::{Error, Result};
use indexmap::IndexMap;
use std::sync::Arc;

/// Known classes by name.
///
/// The registry resolves `Type::Class` tokens to definitions and decides
/// whether a value of one declared type can be stored in a slot of another
/// without conversion.
#[derive(Debug, Default, Clone)]
pub struct TypeRegistry {
    classes: IndexMap<String, Arc<ClassDef>>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a class together with its super classes.
    pub fn register(&mut self, class: &Arc<ClassDef>) -> &mut Self {
        let mut current = Some(class);
        while let Some(def) = current {
            self.classes
                .entry(def.name().to_string())
                .or_insert_with(|| Arc::clone(def));
            current = def.super_class();
        }
        self
    }

    /// Builder-style `register`.
    pub fn with(mut self, class: &Arc<ClassDef>) -> Self {
        self.register(class);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Arc<ClassDef>> {
        self.classes.get(name)
    }

    pub fn require(&self, name: &str) -> Result<&Arc<ClassDef>> {
        self.get(name)
            .ok_or_else(|| Error::UnknownClass(name.to_string()))
    }

    /// Definition behind a `Type::Class`.
    pub fn class_of(&self, ty: &Type) -> Option<&Arc<ClassDef>> {
        ty.class_name().and_then(|name| self.get(name))
    }

    pub fn require_type(&self, ty: &Type) -> Result<&Arc<ClassDef>> {
        self.class_of(ty)
            .ok_or_else(|| Error::UnknownClass(ty.to_string()))
    }

    pub fn is_enum(&self, ty: &Type) -> bool {
        self.class_of(ty).is_some_and(|class| class.is_enum())
    }

    pub fn class_names(&self) -> impl Iterator<Item = &str> {
        self.classes.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// A value declared as `src` can be stored as-is in a slot declared as
    /// `dst`.
    ///
    /// Primitive and boxed forms of the same kind are not assignable to each
    /// other; that step is a conversion of its own.
    pub fn is_assignable(&self, dst: &Type, src: &Type) -> bool {
        match (dst, src) {
            (Type::Any, _) => true,
            (Type::Variable(_), _) | (_, Type::Variable(_)) => false,
            (Type::Primitive(a), Type::Primitive(b)) => a == b,
            (Type::Boxed(a), Type::Boxed(b)) => a == b,
            (Type::String, Type::String) | (Type::Uuid, Type::Uuid) => true,
            (Type::Optional(d), Type::Optional(s)) => self.type_arg_matches(d, s),
            (Type::Array(d), Type::Array(s)) => {
                if d.is_primitive() || s.is_primitive() {
                    d == s
                } else {
                    self.is_assignable(d, s)
                }
            }
            (Type::Collection(dk, de), Type::Collection(sk, se)) => {
                dk.is_assignable_from(*sk) && self.type_arg_matches(de, se)
            }
            (Type::Map(dk, dkey, dval), Type::Map(sk, skey, sval)) => {
                dk.is_assignable_from(*sk)
                    && self.type_arg_matches(dkey, skey)
                    && self.type_arg_matches(dval, sval)
            }
            (Type::Class(dname, dargs), Type::Class(sname, sargs)) => {
                let subtype = dname == sname
                    || self
                        .get(sname)
                        .is_some_and(|class| class.is_subtype_of(dname));
                let args_match = if dargs.is_empty() {
                    true
                } else if sargs.is_empty() {
                    dargs.iter().all(|a| *a == Type::Any)
                } else {
                    dargs.len() == sargs.len()
                        && dargs
                            .iter()
                            .zip(sargs)
                            .all(|(d, s)| self.type_arg_matches(d, s))
                };
                subtype && args_match
            }
            _ => false,
        }
    }

    /// Generic arguments are invariant, except that `Any` accepts anything.
    fn type_arg_matches(&self, dst: &Type, src: &Type) -> bool {
        *dst == Type::Any || dst == src
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CollectionKind, FieldDef, Primitive};

    fn registry() -> TypeRegistry {
        let base = ClassDef::builder("Base")
            .field(FieldDef::new("id", Type::LONG))
            .build();
        let derived = ClassDef::builder("Derived")
            .extends(&base)
            .implements("Named")
            .build();
        TypeRegistry::new().with(&derived)
    }

    #[test]
    fn test_register_includes_super_classes() {
        let registry = registry();
        assert!(registry.get("Base").is_some());
        assert!(registry.require("Missing").is_err());
    }

    #[test]
    fn test_class_assignability() {
        let registry = registry();
        assert!(registry.is_assignable(&Type::class("Base"), &Type::class("Derived")));
        assert!(registry.is_assignable(&Type::class("Named"), &Type::class("Derived")));
        assert!(!registry.is_assignable(&Type::class("Derived"), &Type::class("Base")));
    }

    #[test]
    fn test_container_assignability_is_element_aware() {
        let registry = registry();
        let src = Type::collection(CollectionKind::ArrayList, Type::class("SourceItem"));
        assert!(registry.is_assignable(&Type::list(Type::class("SourceItem")), &src));
        assert!(!registry.is_assignable(&Type::list(Type::class("DestItem")), &src));
        assert!(registry.is_assignable(&Type::list(Type::Any), &src));
        assert!(!registry.is_assignable(&Type::set(Type::Any), &src));
    }

    #[test]
    fn test_primitive_and_boxed_are_distinct() {
        let registry = registry();
        assert!(!registry.is_assignable(&Type::INT, &Type::Boxed(Primitive::Int)));
        assert!(registry.is_assignable(&Type::Any, &Type::INT));
        assert!(!registry.is_assignable(&Type::var("T"), &Type::String));
    }
}
