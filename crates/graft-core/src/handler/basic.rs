//! Guards, direct assignment and primitive handling.

use super::{FieldHandler, Outcome};
use crate::converter::Session;
use crate::error::Result;
use crate::field::FieldDescriptor;
use crate::model::Type;
use tracing::debug;

/// Stops on static or read-only destinations.
#[derive(Debug, Default, Clone, Copy)]
pub struct StaticDestination;

impl FieldHandler for StaticDestination {
    fn name(&self) -> &'static str {
        "static-destination"
    }

    fn condition(&self, _src: &FieldDescriptor, dst: &FieldDescriptor, _session: &Session<'_>) -> bool {
        dst.is_static() || !dst.is_writable()
    }

    fn handle(&self, _src: &FieldDescriptor, dst: &FieldDescriptor, _session: &mut Session<'_>) -> Result<Outcome> {
        debug!(destination = %dst.describe(), "destination is static or read-only");
        Ok(Outcome::Break)
    }
}

/// Stops on fields marked expandable that the policy does not select.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExpandableGuard;

impl FieldHandler for ExpandableGuard {
    fn name(&self) -> &'static str {
        "expandable-guard"
    }

    fn condition(&self, _src: &FieldDescriptor, dst: &FieldDescriptor, session: &Session<'_>) -> bool {
        !session
            .config()
            .expandable()
            .should_expand(dst.name(), dst.is_expandable())
    }

    fn handle(&self, _src: &FieldDescriptor, dst: &FieldDescriptor, _session: &mut Session<'_>) -> Result<Outcome> {
        debug!(destination = %dst.describe(), "expandable field not selected");
        Ok(Outcome::Break)
    }
}

/// Leaves the destination untouched when the source value is null.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSource;

impl FieldHandler for NullSource {
    fn name(&self) -> &'static str {
        "null-source"
    }

    fn handle(&self, src: &FieldDescriptor, _dst: &FieldDescriptor, _session: &mut Session<'_>) -> Result<Outcome> {
        if src.value()?.is_null() {
            Ok(Outcome::Break)
        } else {
            Ok(Outcome::Skip)
        }
    }
}

/// Copies the value when the destination type accepts the source type.
#[derive(Debug, Default, Clone, Copy)]
pub struct Assignable;

impl FieldHandler for Assignable {
    fn name(&self) -> &'static str {
        "assignable"
    }

    fn condition(&self, src: &FieldDescriptor, dst: &FieldDescriptor, session: &Session<'_>) -> bool {
        session
            .registry()
            .is_assignable(dst.ty(), &src.effective_type())
    }

    fn handle(&self, src: &FieldDescriptor, dst: &FieldDescriptor, _session: &mut Session<'_>) -> Result<Outcome> {
        dst.set_value(src.value()?)?;
        Ok(Outcome::Converted)
    }
}

/// Primitive to boxed and boxed to primitive of the same kind.
#[derive(Debug, Default, Clone, Copy)]
pub struct PrimitiveBoxing;

impl FieldHandler for PrimitiveBoxing {
    fn name(&self) -> &'static str {
        "primitive-boxing"
    }

    fn source_type(&self, ty: &Type, _session: &Session<'_>) -> bool {
        ty.primitive().is_some()
    }

    fn destination_type(&self, ty: &Type, _session: &Session<'_>) -> bool {
        ty.primitive().is_some()
    }

    fn condition(&self, src: &FieldDescriptor, dst: &FieldDescriptor, _session: &Session<'_>) -> bool {
        src.effective_type().primitive() == dst.ty().primitive()
    }

    fn handle(&self, src: &FieldDescriptor, dst: &FieldDescriptor, _session: &mut Session<'_>) -> Result<Outcome> {
        dst.set_value(src.value()?)?;
        Ok(Outcome::Converted)
    }
}

/// Numeric promotion along the widening lattice. Narrowing is never
/// attempted.
#[derive(Debug, Default, Clone, Copy)]
pub struct NumericWidening;

impl FieldHandler for NumericWidening {
    fn name(&self) -> &'static str {
        "numeric-widening"
    }

    fn source_type(&self, ty: &Type, _session: &Session<'_>) -> bool {
        ty.primitive().is_some()
    }

    fn destination_type(&self, ty: &Type, _session: &Session<'_>) -> bool {
        ty.primitive().is_some_and(|p| p.is_numeric())
    }

    fn condition(&self, src: &FieldDescriptor, dst: &FieldDescriptor, _session: &Session<'_>) -> bool {
        match (src.effective_type().primitive(), dst.ty().primitive()) {
            (Some(from), Some(to)) => from.widens_to(to),
            _ => false,
        }
    }

    fn handle(&self, src: &FieldDescriptor, dst: &FieldDescriptor, _session: &mut Session<'_>) -> Result<Outcome> {
        let Some(target) = dst.ty().primitive() else {
            return Ok(Outcome::Skip);
        };
        match src.value()?.widen(target) {
            Some(widened) => {
                dst.set_value(widened)?;
                Ok(Outcome::Converted)
            }
            None => Ok(Outcome::Skip),
        }
    }
}
