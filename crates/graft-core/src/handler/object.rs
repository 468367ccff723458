//! Whole-object conversions.

use super::containers::build_collection;
use super::{FieldHandler, Outcome};
use crate::converter::Session;
use crate::error::Result;
use crate::field::FieldDescriptor;
use crate::model::{Type, Value};
use tracing::debug;

/// Single value into a one-element collection.
#[derive(Debug, Default, Clone, Copy)]
pub struct AnyToIterable;

impl FieldHandler for AnyToIterable {
    fn name(&self) -> &'static str {
        "any-to-iterable"
    }

    fn source_type(&self, ty: &Type, _session: &Session<'_>) -> bool {
        !ty.is_container()
    }

    fn destination_type(&self, ty: &Type, _session: &Session<'_>) -> bool {
        ty.is_collection()
    }

    fn handle(&self, src: &FieldDescriptor, dst: &FieldDescriptor, session: &mut Session<'_>) -> Result<Outcome> {
        let Type::Collection(kind, _) = dst.ty() else {
            return Ok(Outcome::Skip);
        };
        let Some(element) = session.resolver().element_type(dst.ty(), session.bindings()) else {
            debug!(destination = %dst.describe(), "no binding for element type");
            return Ok(Outcome::Break);
        };
        let value = src.value()?;
        let target = build_collection(session, *kind, &element, &[value], &src.effective_type())?;
        dst.set_value(target)?;
        Ok(Outcome::Converted)
    }
}

/// Recursive conversion of an object or map into a class instance.
///
/// An instance already held by the destination slot is reused; otherwise
/// one is created through the class's creation override or default
/// construction.
#[derive(Debug, Default, Clone, Copy)]
pub struct AnyToAny;

impl FieldHandler for AnyToAny {
    fn name(&self) -> &'static str {
        "any-to-any"
    }

    fn source_type(&self, ty: &Type, _session: &Session<'_>) -> bool {
        ty.class_name().is_some() || ty.is_map()
    }

    fn destination_type(&self, ty: &Type, session: &Session<'_>) -> bool {
        session
            .registry()
            .class_of(ty)
            .is_some_and(|class| !class.is_enum())
    }

    fn handle(&self, src: &FieldDescriptor, dst: &FieldDescriptor, session: &mut Session<'_>) -> Result<Outcome> {
        let source = src.value()?;
        if source.as_object().is_none() && source.as_map().is_none() {
            return Ok(Outcome::Skip);
        }
        let class = session.registry().require_type(dst.ty())?;
        let target = match dst.value()? {
            Value::Object(existing) if existing.borrow().class().is_subtype_of(class.name()) => {
                Value::Object(existing)
            }
            _ => class.create()?,
        };
        session.convert_object(&source, &target, dst.ty())?;
        dst.set_value(target)?;
        Ok(Outcome::Converted)
    }
}
