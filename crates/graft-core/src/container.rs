//! Concrete container instances for abstract container types.

use crate::error::{Error, Result};
use crate::model::{ArrayObject, CollectionKind, CollectionObject, MapKind, MapObject, Type, Value};

/// Creates empty containers.
///
/// Collections are matched in a fixed priority order: list-compatible kinds
/// get an `ArrayList`, set-compatible kinds a `HashSet`, queue-compatible
/// kinds a `LinkedList`; any other concrete kind is instantiated directly.
#[derive(Debug, Default, Clone, Copy)]
pub struct ContainerFactory;

impl ContainerFactory {
    /// Concrete kind backing a requested collection kind.
    pub fn collection_kind(requested: CollectionKind) -> Result<CollectionKind> {
        const PRIORITY: [CollectionKind; 3] = [
            CollectionKind::ArrayList,
            CollectionKind::HashSet,
            CollectionKind::LinkedList,
        ];
        if let Some(kind) = PRIORITY
            .into_iter()
            .find(|candidate| requested.is_assignable_from(*candidate))
        {
            return Ok(kind);
        }
        if requested.is_abstract() {
            return Err(Error::UnsupportedShape(format!(
                "no concrete implementation of {}",
                requested.name()
            )));
        }
        Ok(requested)
    }

    /// Concrete kind backing a requested map kind.
    pub fn map_kind(requested: MapKind) -> Result<MapKind> {
        match requested {
            MapKind::Map => Ok(MapKind::HashMap),
            kind if kind.is_abstract() => Err(Error::UnsupportedShape(format!(
                "no concrete implementation of {}",
                kind.name()
            ))),
            kind => Ok(kind),
        }
    }

    pub fn new_collection(kind: CollectionKind, element: Type) -> Result<Value> {
        let kind = Self::collection_kind(kind)?;
        Ok(Value::from_collection(CollectionObject::new(kind, element)))
    }

    pub fn new_map(kind: MapKind, key: Type, value: Type) -> Result<Value> {
        let kind = Self::map_kind(kind)?;
        Ok(Value::from_map(MapObject::new(kind, key, value)))
    }

    /// Array of `len` default elements.
    ///
    /// Generic components arrive already boxed through their `T[]` binding.
    pub fn new_array(component: &Type, len: usize) -> Value {
        Value::from_array(ArrayObject::new(component.clone(), len))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Primitive;
    use rstest::rstest;

    #[rstest]
    #[case(CollectionKind::Iterable, CollectionKind::ArrayList)]
    #[case(CollectionKind::Collection, CollectionKind::ArrayList)]
    #[case(CollectionKind::List, CollectionKind::ArrayList)]
    #[case(CollectionKind::Set, CollectionKind::HashSet)]
    #[case(CollectionKind::Queue, CollectionKind::LinkedList)]
    #[case(CollectionKind::Deque, CollectionKind::LinkedList)]
    #[case(CollectionKind::LinkedHashSet, CollectionKind::LinkedHashSet)]
    #[case(CollectionKind::TreeSet, CollectionKind::TreeSet)]
    #[case(CollectionKind::ArrayDeque, CollectionKind::ArrayDeque)]
    fn test_collection_priority(#[case] requested: CollectionKind, #[case] expected: CollectionKind) {
        assert_eq!(ContainerFactory::collection_kind(requested).ok(), Some(expected));
    }

    #[test]
    fn test_unsupported_shapes() {
        assert!(matches!(
            ContainerFactory::collection_kind(CollectionKind::SortedSet),
            Err(Error::UnsupportedShape(_))
        ));
        assert!(ContainerFactory::map_kind(MapKind::SortedMap).is_err());
    }

    #[test]
    fn test_map_kinds() {
        assert_eq!(ContainerFactory::map_kind(MapKind::Map).ok(), Some(MapKind::HashMap));
        assert_eq!(ContainerFactory::map_kind(MapKind::TreeMap).ok(), Some(MapKind::TreeMap));
    }

    #[test]
    fn test_arrays_keep_their_component() {
        let array = ContainerFactory::new_array(&Type::Boxed(Primitive::Int), 2);
        let component = array.as_array().map(|a| a.borrow().component().clone());
        assert_eq!(component, Some(Type::Boxed(Primitive::Int)));
        assert_eq!(array.elements(), vec![Value::Null, Value::Null]);

        let plain = ContainerFactory::new_array(&Type::INT, 2);
        assert_eq!(plain.elements(), vec![Value::Int(0), Value::Int(0)]);
    }
}
