//! Conversion configuration.
//!
//! A `Configuration` is an immutable bundle of handler chain, strategy
//! list, field policies, user converters, class registry and member access
//! capability. It is `Send + Sync` and can be shared between conversions;
//! the per-call generic bindings live in the conversion session instead.

use crate::field::{MemberAccess, PrivilegedAccess};
use crate::handler::{FieldHandler, HandlerChain};
use crate::model::{ClassDef, Reflect, Type, TypeRegistry, Value};
use crate::strategy::{ByNameThenPath, FieldStrategy, MapKey};
use indexmap::IndexSet;
use std::fmt;
use std::sync::Arc;

/// Tri-state selection over field names.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FieldSelection {
    All,
    #[default]
    None,
    Only(IndexSet<String>),
}

impl FieldSelection {
    /// `None` selects everything, an empty list nothing, otherwise exactly
    /// the listed names.
    pub fn from_names(names: Option<Vec<String>>) -> Self {
        match names {
            None => FieldSelection::All,
            Some(names) if names.is_empty() => FieldSelection::None,
            Some(names) => FieldSelection::Only(names.into_iter().collect()),
        }
    }

    pub fn only<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FieldSelection::Only(names.into_iter().map(Into::into).collect())
    }

    pub fn contains(&self, name: &str) -> bool {
        match self {
            FieldSelection::All => true,
            FieldSelection::None => false,
            FieldSelection::Only(names) => names.contains(name),
        }
    }
}

/// Destination fields never written by conversion.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExcludedFields(FieldSelection);

impl ExcludedFields {
    pub fn new(selection: FieldSelection) -> Self {
        Self(selection)
    }

    pub fn all() -> Self {
        Self(FieldSelection::All)
    }

    pub fn none() -> Self {
        Self(FieldSelection::None)
    }

    pub fn only<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(FieldSelection::only(names))
    }

    pub fn is_excluded(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    pub fn selection(&self) -> &FieldSelection {
        &self.0
    }
}

/// Fields marked expandable that conversion should populate.
///
/// Unmarked fields are always populated.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExpandableFields(FieldSelection);

impl ExpandableFields {
    pub fn new(selection: FieldSelection) -> Self {
        Self(selection)
    }

    pub fn all() -> Self {
        Self(FieldSelection::All)
    }

    pub fn none() -> Self {
        Self(FieldSelection::None)
    }

    pub fn only<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(FieldSelection::only(names))
    }

    pub fn should_expand(&self, name: &str, marked: bool) -> bool {
        !marked || self.0.contains(name)
    }

    pub fn selection(&self) -> &FieldSelection {
        &self.0
    }
}

/// Function backing a single-field converter.
pub type ConvertFn = Arc<dyn Fn(&Value) -> anyhow::Result<Value> + Send + Sync>;

/// A user-supplied single-argument conversion with its declared types.
#[derive(Clone)]
pub struct SimpleConverter {
    argument: Type,
    returns: Type,
    function: ConvertFn,
}

impl SimpleConverter {
    /// Typed converter; argument and return types come from `Reflect`.
    pub fn typed<A, R, F>(function: F) -> Self
    where
        A: Reflect + 'static,
        R: Reflect + 'static,
        F: Fn(A) -> R + Send + Sync + 'static,
    {
        let function: ConvertFn = Arc::new(move |value: &Value| -> anyhow::Result<Value> {
            let argument = A::from_value(value).ok_or_else(|| {
                anyhow::anyhow!("expected {} argument, got {value:?}", A::type_of())
            })?;
            Ok(function(argument).into_value())
        });
        Self {
            argument: A::type_of(),
            returns: R::type_of(),
            function,
        }
    }

    /// Converter over runtime values with explicitly declared types.
    pub fn raw(
        argument: Type,
        returns: Type,
        function: impl Fn(&Value) -> anyhow::Result<Value> + Send + Sync + 'static,
    ) -> Self {
        Self {
            argument,
            returns,
            function: Arc::new(function),
        }
    }

    pub fn argument(&self) -> &Type {
        &self.argument
    }

    pub fn returns(&self) -> &Type {
        &self.returns
    }

    pub fn apply(&self, value: &Value) -> anyhow::Result<Value> {
        (self.function)(value)
    }
}

impl fmt::Debug for SimpleConverter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SimpleConverter({} -> {})", self.argument, self.returns)
    }
}

/// Ordered user converters.
///
/// Two registries are equal when they hold the same number of converters;
/// functions themselves cannot be compared.
#[derive(Debug, Clone, Default)]
pub struct ConverterRegistry {
    converters: Vec<SimpleConverter>,
}

impl ConverterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<A, R, F>(&mut self, function: F) -> &mut Self
    where
        A: Reflect + 'static,
        R: Reflect + 'static,
        F: Fn(A) -> R + Send + Sync + 'static,
    {
        self.converters.push(SimpleConverter::typed(function));
        self
    }

    pub fn register_raw(&mut self, converter: SimpleConverter) -> &mut Self {
        self.converters.push(converter);
        self
    }

    /// First converter taking `argument` whose result fits a `returns`
    /// slot. Primitive types match through their boxed forms.
    pub fn find(
        &self,
        argument: &Type,
        returns: &Type,
        registry: &TypeRegistry,
    ) -> Option<&SimpleConverter> {
        let argument = argument.boxed();
        let returns = returns.boxed();
        self.converters.iter().find(|converter| {
            converter.argument.boxed() == argument
                && registry.is_assignable(&returns, &converter.returns.boxed())
        })
    }

    pub fn len(&self) -> usize {
        self.converters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.converters.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SimpleConverter> {
        self.converters.iter()
    }
}

impl PartialEq for ConverterRegistry {
    fn eq(&self, other: &Self) -> bool {
        self.converters.len() == other.converters.len()
    }
}

/// Immutable conversion configuration.
#[derive(Clone)]
pub struct Configuration {
    handlers: Vec<Arc<dyn FieldHandler>>,
    strategies: Vec<Arc<dyn FieldStrategy>>,
    excluded: ExcludedFields,
    expandable: ExpandableFields,
    converters: ConverterRegistry,
    registry: TypeRegistry,
    access: Arc<dyn MemberAccess>,
}

impl Configuration {
    pub fn builder() -> ConfigurationBuilder {
        ConfigurationBuilder::default()
    }

    pub fn handlers(&self) -> &[Arc<dyn FieldHandler>] {
        &self.handlers
    }

    pub fn strategies(&self) -> &[Arc<dyn FieldStrategy>] {
        &self.strategies
    }

    pub fn excluded(&self) -> &ExcludedFields {
        &self.excluded
    }

    pub fn expandable(&self) -> &ExpandableFields {
        &self.expandable
    }

    pub fn converters(&self) -> &ConverterRegistry {
        &self.converters
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub fn access(&self) -> &Arc<dyn MemberAccess> {
        &self.access
    }

    /// Builder seeded with this configuration.
    pub fn to_builder(&self) -> ConfigurationBuilder {
        ConfigurationBuilder {
            handlers: self.handlers.clone(),
            strategies: self.strategies.clone(),
            excluded: self.excluded.clone(),
            expandable: self.expandable.clone(),
            converters: self.converters.clone(),
            registry: self.registry.clone(),
            access: Arc::clone(&self.access),
        }
    }
}

fn _assert_send_sync() {
    fn shareable<T: Send + Sync>() {}
    shareable::<Configuration>();
}

impl Default for Configuration {
    fn default() -> Self {
        ConfigurationBuilder::default().build()
    }
}

impl PartialEq for Configuration {
    fn eq(&self, other: &Self) -> bool {
        let handler_names =
            |c: &Configuration| c.handlers.iter().map(|h| h.name()).collect::<Vec<_>>();
        let strategy_names =
            |c: &Configuration| c.strategies.iter().map(|s| s.name()).collect::<Vec<_>>();

        handler_names(self) == handler_names(other)
            && strategy_names(self) == strategy_names(other)
            && self.excluded == other.excluded
            && self.expandable == other.expandable
            && self.converters == other.converters
            && self.registry.class_names().eq(other.registry.class_names())
    }
}

impl fmt::Debug for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Configuration")
            .field(
                "handlers",
                &self.handlers.iter().map(|h| h.name()).collect::<Vec<_>>(),
            )
            .field(
                "strategies",
                &self.strategies.iter().map(|s| s.name()).collect::<Vec<_>>(),
            )
            .field("excluded", &self.excluded)
            .field("expandable", &self.expandable)
            .field("converters", &self.converters.len())
            .field("classes", &self.registry.len())
            .field("access", &self.access)
            .finish()
    }
}

/// Builder for [`Configuration`].
#[derive(Clone)]
pub struct ConfigurationBuilder {
    handlers: Vec<Arc<dyn FieldHandler>>,
    strategies: Vec<Arc<dyn FieldStrategy>>,
    excluded: ExcludedFields,
    expandable: ExpandableFields,
    converters: ConverterRegistry,
    registry: TypeRegistry,
    access: Arc<dyn MemberAccess>,
}

impl Default for ConfigurationBuilder {
    fn default() -> Self {
        Self {
            handlers: HandlerChain::standard(),
            strategies: default_strategies(),
            excluded: ExcludedFields::none(),
            expandable: ExpandableFields::none(),
            converters: ConverterRegistry::new(),
            registry: TypeRegistry::new(),
            access: Arc::new(PrivilegedAccess),
        }
    }
}

/// By name then path, then map key.
pub fn default_strategies() -> Vec<Arc<dyn FieldStrategy>> {
    vec![Arc::new(ByNameThenPath), Arc::new(MapKey::new())]
}

impl ConfigurationBuilder {
    /// Replace the handler chain.
    pub fn handlers(mut self, handlers: Vec<Arc<dyn FieldHandler>>) -> Self {
        self.handlers = handlers;
        self
    }

    /// Run `handler` before every other handler.
    pub fn prepend_handler(mut self, handler: impl FieldHandler + 'static) -> Self {
        self.handlers.insert(0, Arc::new(handler));
        self
    }

    pub fn strategies(mut self, strategies: Vec<Arc<dyn FieldStrategy>>) -> Self {
        self.strategies = strategies;
        self
    }

    pub fn excluded(mut self, excluded: ExcludedFields) -> Self {
        self.excluded = excluded;
        self
    }

    pub fn expandable(mut self, expandable: ExpandableFields) -> Self {
        self.expandable = expandable;
        self
    }

    /// Register a typed single-argument converter.
    pub fn converter<A, R, F>(mut self, function: F) -> Self
    where
        A: Reflect + 'static,
        R: Reflect + 'static,
        F: Fn(A) -> R + Send + Sync + 'static,
    {
        self.converters.register(function);
        self
    }

    pub fn raw_converter(mut self, converter: SimpleConverter) -> Self {
        self.converters.register_raw(converter);
        self
    }

    pub fn registry(mut self, registry: TypeRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Add a class, and its super classes, to the registry.
    pub fn class(mut self, class: &Arc<ClassDef>) -> Self {
        self.registry.register(class);
        self
    }

    pub fn access(mut self, access: impl MemberAccess + 'static) -> Self {
        self.access = Arc::new(access);
        self
    }

    pub fn build(self) -> Configuration {
        Configuration {
            handlers: self.handlers,
            strategies: self.strategies,
            excluded: self.excluded,
            expandable: self.expandable,
            converters: self.converters,
            registry: self.registry,
            access: self.access,
        }
    }
}
