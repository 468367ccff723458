//! Bridges between Rust scalar types and runtime values.

use super::types::{Primitive, Type};
use super::value::Value;
use uuid::Uuid;

/// A Rust type with a fixed runtime `Type` and lossless value conversions.
///
/// Used by typed converter registration: the argument and return types of
/// a registered function come from `Reflect::type_of` instead of being
/// inspected at runtime.
pub trait Reflect: Sized {
    fn type_of() -> Type;
    fn from_value(value: &Value) -> Option<Self>;
    fn into_value(self) -> Value;
}

macro_rules! reflect_scalar {
    ($rust:ty, $primitive:ident, $variant:ident) => {
        impl Reflect for $rust {
            fn type_of() -> Type {
                Type::Boxed(Primitive::$primitive)
            }

            fn from_value(value: &Value) -> Option<Self> {
                match value {
                    Value::$variant(v) => Some(*v),
                    _ => None,
                }
            }

            fn into_value(self) -> Value {
                Value::$variant(self)
            }
        }
    };
}

reflect_scalar!(bool, Boolean, Bool);
reflect_scalar!(i8, Byte, Byte);
reflect_scalar!(i16, Short, Short);
reflect_scalar!(i32, Int, Int);
reflect_scalar!(i64, Long, Long);
reflect_scalar!(f32, Float, Float);
reflect_scalar!(f64, Double, Double);
reflect_scalar!(char, Char, Char);

impl Reflect for String {
    fn type_of() -> Type {
        Type::String
    }

    fn from_value(value: &Value) -> Option<Self> {
        value.as_str().map(str::to_string)
    }

    fn into_value(self) -> Value {
        Value::Str(self)
    }
}

impl Reflect for Uuid {
    fn type_of() -> Type {
        Type::Uuid
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Uuid(u) => Some(*u),
            _ => None,
        }
    }

    fn into_value(self) -> Value {
        Value::Uuid(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_types_are_boxed() {
        assert_eq!(i32::type_of(), Type::Boxed(Primitive::Int));
        assert_eq!(String::type_of(), Type::String);
        assert_eq!(i32::from_value(&Value::Int(5)), Some(5));
        assert_eq!(i32::from_value(&Value::Long(5)), None);
        assert_eq!("x".to_string().into_value(), Value::from("x"));
    }
}
