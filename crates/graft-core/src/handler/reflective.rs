//! Conversions through destination factory methods, constructors and user
//! functions.

use super::{FieldHandler, Outcome};
use crate::converter::Session;
use crate::error::{Error, Result};
use crate::field::FieldDescriptor;
use crate::model::{ClassDef, MethodDef, Type, TypeRegistry, Value};
use std::sync::Arc;
use tracing::warn;

/// A parameter declared as `param` accepts an argument of type `argument`.
pub(crate) fn accepts(registry: &TypeRegistry, param: &Type, argument: &Type) -> bool {
    registry.is_assignable(param, argument) || param.boxed() == argument.boxed()
}

/// Static methods of `class` taking `argument` and returning something a
/// `destination` slot accepts, in declaration order.
pub(crate) fn factory_methods<'a>(
    registry: &TypeRegistry,
    class: &'a ClassDef,
    argument: &Type,
    destination: &Type,
) -> Vec<&'a MethodDef> {
    class
        .static_methods()
        .iter()
        .filter(|method| {
            accepts(registry, method.param(), argument)
                && accepts(registry, destination, method.returns())
        })
        .collect()
}

/// Invoke `methods` in order until one yields a non-null value.
///
/// A failing method is logged and the next one tried. When every method
/// failed, the last failure is returned.
pub(crate) fn first_success<'a>(
    methods: impl IntoIterator<Item = &'a MethodDef>,
    argument: &Value,
) -> Result<Option<Value>> {
    let mut last_error = None;
    for method in methods {
        match method.invoke(argument) {
            Ok(Value::Null) => {}
            Ok(value) => return Ok(Some(value)),
            Err(err) => {
                warn!(method = method.name(), error = %err, "factory method failed");
                last_error = Some(err);
            }
        }
    }
    match last_error {
        Some(err) => Err(Error::Callback(err)),
        None => Ok(None),
    }
}

fn destination_class<'c>(session: &Session<'c>, ty: &Type) -> Option<&'c Arc<ClassDef>> {
    session.registry().class_of(ty)
}

/// Class destinations, enums included.
fn is_class(ty: &Type, session: &Session<'_>) -> bool {
    destination_class(session, ty).is_some()
}

/// Single-argument static factory on the destination class.
#[derive(Debug, Default, Clone, Copy)]
pub struct FromStaticFactory;

impl FieldHandler for FromStaticFactory {
    fn name(&self) -> &'static str {
        "from-static-factory"
    }

    fn destination_type(&self, ty: &Type, session: &Session<'_>) -> bool {
        is_class(ty, session)
    }

    fn condition(&self, src: &FieldDescriptor, dst: &FieldDescriptor, session: &Session<'_>) -> bool {
        destination_class(session, dst.ty()).is_some_and(|class| {
            !factory_methods(session.registry(), class, &src.effective_type(), dst.ty()).is_empty()
        })
    }

    fn handle(&self, src: &FieldDescriptor, dst: &FieldDescriptor, session: &mut Session<'_>) -> Result<Outcome> {
        let Some(class) = destination_class(session, dst.ty()) else {
            return Ok(Outcome::Skip);
        };
        let methods = factory_methods(session.registry(), class, &src.effective_type(), dst.ty());
        match first_success(methods, &src.value()?)? {
            Some(value) => {
                dst.set_value(value)?;
                Ok(Outcome::Converted)
            }
            None => Ok(Outcome::Skip),
        }
    }
}

/// Single-argument constructor on the destination class.
#[derive(Debug, Default, Clone, Copy)]
pub struct FromConstructor;

impl FieldHandler for FromConstructor {
    fn name(&self) -> &'static str {
        "from-constructor"
    }

    fn destination_type(&self, ty: &Type, session: &Session<'_>) -> bool {
        destination_class(session, ty).is_some_and(|class| !class.is_enum() && !class.is_abstract())
    }

    fn condition(&self, src: &FieldDescriptor, dst: &FieldDescriptor, session: &Session<'_>) -> bool {
        let source_type = src.effective_type();
        destination_class(session, dst.ty()).is_some_and(|class| {
            class
                .constructors()
                .iter()
                .any(|ctor| accepts(session.registry(), ctor.param(), &source_type))
        })
    }

    fn handle(&self, src: &FieldDescriptor, dst: &FieldDescriptor, session: &mut Session<'_>) -> Result<Outcome> {
        let Some(class) = destination_class(session, dst.ty()) else {
            return Ok(Outcome::Skip);
        };
        let source_type = src.effective_type();
        let Some(ctor) = class
            .constructors()
            .iter()
            .find(|ctor| accepts(session.registry(), ctor.param(), &source_type))
        else {
            return Ok(Outcome::Skip);
        };
        let value = ctor.invoke(&src.value()?)?;
        dst.set_value(value)?;
        Ok(Outcome::Converted)
    }
}

/// Caller-registered converter matching the boxed source type and the
/// destination type.
#[derive(Debug, Default, Clone, Copy)]
pub struct FromUserFunction;

impl FieldHandler for FromUserFunction {
    fn name(&self) -> &'static str {
        "from-user-function"
    }

    fn condition(&self, src: &FieldDescriptor, dst: &FieldDescriptor, session: &Session<'_>) -> bool {
        let config = session.config();
        config
            .converters()
            .find(&src.effective_type(), dst.ty(), config.registry())
            .is_some()
    }

    fn handle(&self, src: &FieldDescriptor, dst: &FieldDescriptor, session: &mut Session<'_>) -> Result<Outcome> {
        let config = session.config();
        let Some(converter) = config
            .converters()
            .find(&src.effective_type(), dst.ty(), config.registry())
        else {
            return Ok(Outcome::Skip);
        };
        let value = converter.apply(&src.value()?)?;
        dst.set_value(value)?;
        Ok(Outcome::Converted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Primitive;

    fn money() -> Arc<ClassDef> {
        ClassDef::builder("Money")
            .field(crate::model::FieldDef::new("cents", Type::LONG))
            .static_method(MethodDef::new("broken", Type::String, Type::class("Money"), |_| {
                anyhow::bail!("cannot parse")
            }))
            .static_method(MethodDef::new("parse", Type::String, Type::class("Money"), |_| {
                Ok(Value::Null)
            }))
            .static_method(MethodDef::new("ofCents", Type::LONG, Type::class("Money"), |_| {
                Ok(Value::Null)
            }))
            .build()
    }

    #[test]
    fn test_factory_methods_filter_by_argument_and_return() {
        let money = money();
        let registry = TypeRegistry::new().with(&money);
        let by_string = factory_methods(&registry, &money, &Type::String, &Type::class("Money"));
        assert_eq!(by_string.len(), 2);
        let by_long = factory_methods(
            &registry,
            &money,
            &Type::Boxed(Primitive::Long),
            &Type::class("Money"),
        );
        assert_eq!(by_long.iter().map(|m| m.name()).collect::<Vec<_>>(), vec!["ofCents"]);
        assert!(factory_methods(&registry, &money, &Type::String, &Type::String).is_empty());
    }

    #[test]
    fn test_first_success_reports_last_failure() {
        let money = money();
        let failing: Vec<_> = money.static_methods().iter().take(1).collect();
        assert!(matches!(
            first_success(failing, &Value::from("x")),
            Err(Error::Callback(_))
        ));
        let nulls: Vec<_> = money.static_methods().iter().skip(1).collect();
        assert_eq!(first_success(nulls, &Value::from("x")).ok(), Some(None));
    }
}
