//! Conversion orchestration.
//!
//! [`Converter`] holds an immutable [`Configuration`] and exposes the entry
//! points. Every call opens a [`Session`] carrying the generic bindings of
//! the destination currently being populated; sessions are never shared.

use crate::config::Configuration;
use crate::container::ContainerFactory;
use crate::error::{Error, Result};
use crate::field::FieldDescriptor;
use crate::flatten::Flattener;
use crate::generics::{ResolvedMembers, TypeBindings, TypeResolver};
use crate::handler::{HandlerChain, Outcome};
use crate::model::{Type, TypeRegistry, Value};
use crate::strategy;
use std::mem;
use std::sync::Arc;
use tracing::debug;

/// State of one top-level conversion call.
pub struct Session<'c> {
    config: &'c Configuration,
    bindings: TypeBindings,
}

impl<'c> Session<'c> {
    pub fn new(config: &'c Configuration) -> Self {
        Self {
            config,
            bindings: TypeBindings::new(),
        }
    }

    pub fn config(&self) -> &'c Configuration {
        self.config
    }

    pub fn registry(&self) -> &'c TypeRegistry {
        self.config.registry()
    }

    pub fn resolver(&self) -> TypeResolver<'c> {
        TypeResolver::new(self.config.registry())
    }

    /// Bindings of the destination currently being populated.
    pub fn bindings(&self) -> &TypeBindings {
        &self.bindings
    }

    /// Run the configured handler chain over one field pair.
    pub fn convert_pair(&mut self, source: &FieldDescriptor, destination: &FieldDescriptor) -> Result<Outcome> {
        let config = self.config;
        HandlerChain::run(config.handlers(), source, destination, self)
    }

    /// Convert a detached value into `target`.
    ///
    /// `None` when every handler declined. After a `Break` the target's
    /// default value is returned.
    pub fn convert_element(&mut self, value: &Value, declared: &Type, target: &Type) -> Result<Option<Value>> {
        let source = FieldDescriptor::cell("[element]", declared.clone(), value.clone());
        let destination = FieldDescriptor::cell("[element]", target.clone(), Value::default_for(target));
        match self.convert_pair(&source, &destination)? {
            Outcome::Skip => Ok(None),
            Outcome::Converted | Outcome::Break => destination.value().map(Some),
        }
    }

    /// Convert one container element or map entry part.
    ///
    /// An element no handler converts becomes null, unless `target` is a
    /// primitive slot, which fails with [`Error::NoConversion`].
    pub fn convert_slot(&mut self, value: &Value, declared: &Type, target: &Type) -> Result<Value> {
        match self.convert_element(value, declared, target)? {
            Some(converted) => Ok(converted),
            None if target.is_primitive() => Err(Error::NoConversion {
                from: value.runtime_type().to_string(),
                to: target.to_string(),
            }),
            None => Ok(Value::Null),
        }
    }

    /// Populate every writable member of `destination` from `source`.
    ///
    /// `requested` is the destination type as asked for; its type arguments
    /// bind the destination class's formal parameters for the duration of
    /// this object.
    pub fn convert_object(&mut self, source: &Value, destination: &Value, requested: &Type) -> Result<()> {
        let Some(object) = destination.as_object() else {
            return Err(Error::InvalidDestination(format!(
                "{} is not an object",
                destination.runtime_type()
            )));
        };
        let class = Arc::clone(object.borrow().class());
        let args: Vec<Type> = match requested {
            Type::Class(_, args) => args.clone(),
            _ => Vec::new(),
        };
        let members = self
            .resolver()
            .resolve_members(&class, &args, &self.bindings);

        let enclosing = mem::replace(&mut self.bindings, members.bindings().clone());
        let result = self.convert_members(source, destination, &members);
        self.bindings = enclosing;
        result
    }

    fn convert_members(&mut self, source: &Value, destination: &Value, members: &ResolvedMembers) -> Result<()> {
        let config = self.config;
        let access = config.access();

        for (name, field) in FieldDescriptor::members(destination, access) {
            if field.is_static() {
                continue;
            }
            if config.excluded().is_excluded(&name) {
                debug!(field = name.as_str(), "excluded");
                continue;
            }
            if members.is_unresolved(&name) {
                debug!(field = name.as_str(), declared = %field.ty(), "unresolved generic binding, left unset");
                continue;
            }
            let field = match members.type_of(&name) {
                Some(resolved) if field.ty().has_variables() => field.with_type(resolved.clone()),
                _ => field,
            };

            let counterpart = strategy::find_first(config.strategies(), source, &name, access)?;
            if !counterpart.has_field() {
                debug!(field = name.as_str(), "no source counterpart");
                continue;
            }
            self.convert_pair(&counterpart, &field)?;
        }
        Ok(())
    }
}

/// Structural object mapper.
#[derive(Debug, Clone, Default)]
pub struct Converter {
    config: Arc<Configuration>,
}

impl Converter {
    pub fn new(config: Configuration) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Converter sharing an existing configuration.
    pub fn shared(config: Arc<Configuration>) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    pub fn session(&self) -> Session<'_> {
        Session::new(&self.config)
    }

    /// Populate the existing `destination` object from `source`.
    pub fn convert_into(&self, source: &Value, destination: &Value) -> Result<Value> {
        self.convert_object(source, destination, None::<fn(&Value, &Value) -> anyhow::Result<()>>)
    }

    /// Like [`Converter::convert_into`], then run `extra`, which may
    /// override any value set so far.
    pub fn convert_into_with<F>(&self, source: &Value, destination: &Value, extra: F) -> Result<Value>
    where
        F: FnOnce(&Value, &Value) -> anyhow::Result<()>,
    {
        self.convert_object(source, destination, Some(extra))
    }

    /// Convert into an instance produced by `factory`.
    pub fn convert_with<F>(&self, source: &Value, factory: F) -> Result<Value>
    where
        F: FnOnce() -> Value,
    {
        let destination = factory();
        if destination.is_null() {
            return Err(Error::NullArgument("destination factory result"));
        }
        self.convert_into(source, &destination)
    }

    /// Convert into a default-constructed instance of `class`.
    ///
    /// Any creation override registered on the class is ignored.
    pub fn convert_to(&self, source: &Value, class: &str) -> Result<Value> {
        let destination = self.config.registry().require(class)?.instantiate()?;
        self.convert_into(source, &destination)
    }

    /// Convert into a fully described destination type.
    ///
    /// Parameterized classes have their formal parameters bound from the
    /// type arguments. Containers and scalar types are converted through
    /// the handler chain directly.
    pub fn convert_to_type(&self, source: &Value, ty: &Type) -> Result<Value> {
        if source.is_null() {
            return Err(Error::NullArgument("source"));
        }
        match ty {
            Type::Any | Type::Variable(_) => {
                Err(Error::InvalidDestination(format!("{ty} is not a concrete type")))
            }
            Type::Class(_, _) if !self.config.registry().is_enum(ty) => {
                let destination = self.config.registry().require_type(ty)?.instantiate()?;
                let mut session = self.session();
                session.convert_object(source, &destination, ty)?;
                Ok(destination)
            }
            _ => {
                let mut session = self.session();
                match session.convert_element(source, &source.runtime_type(), ty)? {
                    Some(converted) if !converted.is_null() => Ok(converted),
                    _ => Err(Error::InvalidDestination(format!(
                        "no conversion from {} to {ty}",
                        source.runtime_type()
                    ))),
                }
            }
        }
    }

    /// New map of the same kind with `key_fn` applied to every key and
    /// `value_fn` to every value.
    pub fn convert_map_with<K, V>(&self, map: &Value, key_fn: K, value_fn: V) -> Result<Value>
    where
        K: Fn(&Value) -> anyhow::Result<Value>,
        V: Fn(&Value) -> anyhow::Result<Value>,
    {
        let Some(map) = map.as_map() else {
            return Err(Error::InvalidDestination(format!(
                "{} is not a map",
                map.runtime_type()
            )));
        };
        let (kind, entries) = {
            let map = map.borrow();
            (map.kind(), map.entries().to_vec())
        };
        let mut converted = Vec::with_capacity(entries.len());
        for (key, value) in &entries {
            converted.push((key_fn(key)?, value_fn(value)?));
        }
        let (key_type, value_type) = match converted.first() {
            Some((key, value)) => (key.runtime_type(), value.runtime_type()),
            None => (Type::Any, Type::Any),
        };
        let target = ContainerFactory::new_map(kind, key_type, value_type)?;
        if let Some(map) = target.as_map() {
            let mut map = map.borrow_mut();
            for (key, value) in converted {
                map.put(key, value);
            }
        }
        Ok(target)
    }

    /// New collection of the same kind with `element_fn` applied to every
    /// element.
    pub fn convert_collection_with<F>(&self, collection: &Value, element_fn: F) -> Result<Value>
    where
        F: Fn(&Value) -> anyhow::Result<Value>,
    {
        let Some(collection) = collection.as_collection() else {
            return Err(Error::InvalidDestination(format!(
                "{} is not a collection",
                collection.runtime_type()
            )));
        };
        let (kind, items) = {
            let collection = collection.borrow();
            (collection.kind(), collection.items().to_vec())
        };
        let mut converted = Vec::with_capacity(items.len());
        for item in &items {
            converted.push(element_fn(item)?);
        }
        let element_type = converted
            .first()
            .map(Value::runtime_type)
            .unwrap_or(Type::Any);
        Ok(Value::collection(kind, element_type, converted))
    }

    /// Flatten a value graph into JSON, honoring the excluded-field policy
    /// and member access of this converter.
    pub fn flatten(&self, value: &Value) -> Result<serde_json::Value> {
        Flattener::new(Arc::clone(self.config.access()), self.config.excluded().clone()).flatten(value)
    }

    fn convert_object<F>(&self, source: &Value, destination: &Value, extra: Option<F>) -> Result<Value>
    where
        F: FnOnce(&Value, &Value) -> anyhow::Result<()>,
    {
        if source.is_null() {
            return Err(Error::NullArgument("source"));
        }
        if destination.is_null() {
            return Err(Error::NullArgument("destination"));
        }
        let requested = destination.runtime_type();
        debug!(source = %source.runtime_type(), destination = %requested, "converting");

        let mut session = self.session();
        session.convert_object(source, destination, &requested)?;
        if let Some(extra) = extra {
            extra(source, destination)?;
        }
        Ok(destination.clone())
    }
}
