//! Conversions to and from text.

use super::reflective::{factory_methods, first_success};
use super::{FieldHandler, Outcome};
use crate::converter::Session;
use crate::error::{Error, Result};
use crate::field::FieldDescriptor;
use crate::model::{Type, Value};

/// String to enum constant.
///
/// Every static factory on the enum taking a string is tried first; only
/// when none yields a constant is the name looked up.
#[derive(Debug, Default, Clone, Copy)]
pub struct StringToEnum;

impl FieldHandler for StringToEnum {
    fn name(&self) -> &'static str {
        "string-to-enum"
    }

    fn source_type(&self, ty: &Type, _session: &Session<'_>) -> bool {
        ty.is_char_sequence()
    }

    fn destination_type(&self, ty: &Type, session: &Session<'_>) -> bool {
        session.registry().is_enum(ty)
    }

    fn handle(&self, src: &FieldDescriptor, dst: &FieldDescriptor, session: &mut Session<'_>) -> Result<Outcome> {
        let class = session.registry().require_type(dst.ty())?;
        let value = src.value()?;
        let methods = factory_methods(session.registry(), class, &Type::String, dst.ty());
        let from_factory = if methods.is_empty() {
            None
        } else {
            first_success(methods, &value).ok().flatten()
        };

        let constant = match from_factory {
            Some(constant) => constant,
            None => {
                let name = value.as_str().unwrap_or_default();
                class
                    .enum_constant(name)
                    .ok_or_else(|| Error::UnknownEnumConstant {
                        class: class.name().to_string(),
                        constant: name.to_string(),
                    })?
            }
        };
        dst.set_value(constant)?;
        Ok(Outcome::Converted)
    }
}

/// Anything to its string rendering.
#[derive(Debug, Default, Clone, Copy)]
pub struct AnyToString;

impl FieldHandler for AnyToString {
    fn name(&self) -> &'static str {
        "any-to-string"
    }

    fn destination_type(&self, ty: &Type, _session: &Session<'_>) -> bool {
        ty.is_char_sequence()
    }

    fn handle(&self, src: &FieldDescriptor, dst: &FieldDescriptor, _session: &mut Session<'_>) -> Result<Outcome> {
        let rendered = src.value()?.to_string();
        dst.set_value(Value::Str(rendered))?;
        Ok(Outcome::Converted)
    }
}

/// Anything to the characters of its string rendering.
#[derive(Debug, Default, Clone, Copy)]
pub struct AnyToCharArray;

impl FieldHandler for AnyToCharArray {
    fn name(&self) -> &'static str {
        "any-to-char-array"
    }

    fn destination_type(&self, ty: &Type, _session: &Session<'_>) -> bool {
        ty.is_char_array()
    }

    fn handle(&self, src: &FieldDescriptor, dst: &FieldDescriptor, _session: &mut Session<'_>) -> Result<Outcome> {
        dst.set_value(src.value()?.to_char_array())?;
        Ok(Outcome::Converted)
    }
}

/// String to any class with a static factory taking a string
/// (`Money.parse("12.50")`).
#[derive(Debug, Default, Clone, Copy)]
pub struct StringToAnyByFactory;

impl FieldHandler for StringToAnyByFactory {
    fn name(&self) -> &'static str {
        "string-to-any-by-factory"
    }

    fn source_type(&self, ty: &Type, _session: &Session<'_>) -> bool {
        ty.is_char_sequence()
    }

    fn destination_type(&self, ty: &Type, session: &Session<'_>) -> bool {
        session.registry().class_of(ty).is_some()
    }

    fn condition(&self, _src: &FieldDescriptor, dst: &FieldDescriptor, session: &Session<'_>) -> bool {
        session.registry().class_of(dst.ty()).is_some_and(|class| {
            !factory_methods(session.registry(), class, &Type::String, dst.ty()).is_empty()
        })
    }

    fn handle(&self, src: &FieldDescriptor, dst: &FieldDescriptor, session: &mut Session<'_>) -> Result<Outcome> {
        let class = session.registry().require_type(dst.ty())?;
        let methods = factory_methods(session.registry(), class, &Type::String, dst.ty());
        match first_success(methods, &src.value()?)? {
            Some(value) => {
                dst.set_value(value)?;
                Ok(Outcome::Converted)
            }
            None => Ok(Outcome::Skip),
        }
    }
}
