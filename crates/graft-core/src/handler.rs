//! Field handler chain.
//!
//! Each handler inspects one resolved (source, destination) field pair and
//! either converts it, declines (`Skip`), or stops the chain without
//! writing (`Break`). Source and destination type predicates are checked
//! before a handler's condition so irrelevant handlers are passed over
//! cheaply.

pub mod basic;
pub mod containers;
pub mod object;
pub mod reflective;
pub mod text;

use crate::converter::Session;
use crate::error::{Error, Result};
use crate::field::FieldDescriptor;
use crate::model::Type;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

pub use basic::{Assignable, ExpandableGuard, NullSource, NumericWidening, PrimitiveBoxing, StaticDestination};
pub use containers::{ArrayToArray, ArrayToIterable, IterableToArray, IterableToIterable, MapToMap};
pub use object::{AnyToAny, AnyToIterable};
pub use reflective::{FromConstructor, FromStaticFactory, FromUserFunction};
pub use text::{AnyToCharArray, AnyToString, StringToAnyByFactory, StringToEnum};

/// Result of one handler invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Value written; the chain stops.
    Converted,
    /// Declined; the next handler is tried.
    Skip,
    /// Nothing to write; the chain stops.
    Break,
}

/// One step of the handler chain.
pub trait FieldHandler: Send + Sync + fmt::Debug {
    /// Stable identifier, used for configuration equality and diagnostics.
    fn name(&self) -> &'static str;

    /// Accepts the effective source type.
    fn source_type(&self, _ty: &Type, _session: &Session<'_>) -> bool {
        true
    }

    /// Accepts the declared destination type.
    fn destination_type(&self, _ty: &Type, _session: &Session<'_>) -> bool {
        true
    }

    /// Guard checked after both type predicates.
    fn condition(
        &self,
        _source: &FieldDescriptor,
        _destination: &FieldDescriptor,
        _session: &Session<'_>,
    ) -> bool {
        true
    }

    fn handle(
        &self,
        source: &FieldDescriptor,
        destination: &FieldDescriptor,
        session: &mut Session<'_>,
    ) -> Result<Outcome>;
}

/// Ordered handler list and its driver.
pub struct HandlerChain;

impl HandlerChain {
    /// Built-in handlers in priority order.
    pub fn standard() -> Vec<Arc<dyn FieldHandler>> {
        vec![
            Arc::new(StaticDestination),
            Arc::new(ExpandableGuard),
            Arc::new(NullSource),
            Arc::new(Assignable),
            Arc::new(PrimitiveBoxing),
            Arc::new(NumericWidening),
            Arc::new(StringToEnum),
            Arc::new(AnyToString),
            Arc::new(AnyToCharArray),
            Arc::new(StringToAnyByFactory),
            Arc::new(IterableToIterable),
            Arc::new(ArrayToArray),
            Arc::new(IterableToArray),
            Arc::new(ArrayToIterable),
            Arc::new(MapToMap),
            Arc::new(FromStaticFactory),
            Arc::new(FromConstructor),
            Arc::new(FromUserFunction),
            Arc::new(AnyToIterable),
            Arc::new(AnyToAny),
        ]
    }

    /// Try `handlers` in order until one converts or breaks.
    ///
    /// A handler error is wrapped with both field descriptions and ends
    /// the chain. Returns `Skip` when every handler declined.
    pub fn run(
        handlers: &[Arc<dyn FieldHandler>],
        source: &FieldDescriptor,
        destination: &FieldDescriptor,
        session: &mut Session<'_>,
    ) -> Result<Outcome> {
        let source_type = source.effective_type();
        let destination_type = destination.ty().clone();

        for handler in handlers {
            if !handler.source_type(&source_type, session)
                || !handler.destination_type(&destination_type, session)
                || !handler.condition(source, destination, session)
            {
                continue;
            }
            trace!(
                handler = handler.name(),
                source = %source_type,
                destination = %destination_type,
                field = destination.name(),
                "trying handler"
            );
            match handler.handle(source, destination, session) {
                Ok(Outcome::Skip) => continue,
                Ok(outcome) => return Ok(outcome),
                Err(cause) => {
                    return Err(Error::Handler {
                        handler: handler.name(),
                        source_field: source.describe(),
                        destination_field: destination.describe(),
                        cause: Box::new(cause),
                    });
                }
            }
        }

        debug!(
            source = %source.describe(),
            destination = %destination.describe(),
            "no handler applied"
        );
        Ok(Outcome::Skip)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Configuration;
    use crate::model::Value;

    #[derive(Debug)]
    struct Failing;

    impl FieldHandler for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn handle(
            &self,
            _source: &FieldDescriptor,
            _destination: &FieldDescriptor,
            _session: &mut Session<'_>,
        ) -> Result<Outcome> {
            Err(Error::UnsupportedShape("boom".into()))
        }
    }

    #[derive(Debug)]
    struct OnlyStrings;

    impl FieldHandler for OnlyStrings {
        fn name(&self) -> &'static str {
            "only-strings"
        }

        fn source_type(&self, ty: &Type, _session: &Session<'_>) -> bool {
            ty.is_char_sequence()
        }

        fn handle(
            &self,
            _source: &FieldDescriptor,
            destination: &FieldDescriptor,
            _session: &mut Session<'_>,
        ) -> Result<Outcome> {
            destination.set_value("seen".into())?;
            Ok(Outcome::Converted)
        }
    }

    #[test]
    fn test_standard_chain_order() {
        let names: Vec<_> = HandlerChain::standard().iter().map(|h| h.name()).collect();
        assert_eq!(names.first(), Some(&"static-destination"));
        assert_eq!(names.get(1), Some(&"expandable-guard"));
        assert_eq!(names.get(2), Some(&"null-source"));
        assert_eq!(names.last(), Some(&"any-to-any"));
        assert_eq!(names.len(), 20);
    }

    #[test]
    fn test_type_predicates_filter_handlers() {
        let config = Configuration::default();
        let mut session = Session::new(&config);
        let handlers: Vec<Arc<dyn FieldHandler>> = vec![Arc::new(OnlyStrings)];

        let src = FieldDescriptor::cell("n", Type::INT, Value::Int(1));
        let dst = FieldDescriptor::cell("n", Type::String, Value::Null);
        let outcome = HandlerChain::run(&handlers, &src, &dst, &mut session).unwrap();
        assert_eq!(outcome, Outcome::Skip);

        let src = FieldDescriptor::cell("s", Type::String, "x".into());
        let outcome = HandlerChain::run(&handlers, &src, &dst, &mut session).unwrap();
        assert_eq!(outcome, Outcome::Converted);
        assert_eq!(dst.value().ok(), Some(Value::from("seen")));
    }

    #[test]
    fn test_errors_are_wrapped_with_both_fields() {
        let config = Configuration::default();
        let mut session = Session::new(&config);
        let handlers: Vec<Arc<dyn FieldHandler>> = vec![Arc::new(Failing)];

        let src = FieldDescriptor::cell("from", Type::String, "x".into());
        let dst = FieldDescriptor::cell("to", Type::String, Value::Null);
        let err = HandlerChain::run(&handlers, &src, &dst, &mut session).unwrap_err();
        match err {
            Error::Handler {
                handler,
                source_field,
                destination_field,
                ..
            } => {
                assert_eq!(handler, "failing");
                assert!(source_field.contains("from"));
                assert!(destination_field.contains("to"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
