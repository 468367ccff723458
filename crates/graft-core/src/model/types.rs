//! Runtime type descriptors.
//!
//! A `Type` describes the declared shape of a slot: a primitive, a boxed
//! (nullable) primitive, a container with its element types, a user class
//! with its type arguments, or a formal type parameter that still has to be
//! bound by the generics resolver.

use std::fmt;

/// Primitive scalar kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    Boolean,
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    Char,
}

impl Primitive {
    /// Lower-case primitive name, e.g. `int`.
    pub fn name(self) -> &'static str {
        match self {
            Primitive::Boolean => "boolean",
            Primitive::Byte => "byte",
            Primitive::Short => "short",
            Primitive::Int => "int",
            Primitive::Long => "long",
            Primitive::Float => "float",
            Primitive::Double => "double",
            Primitive::Char => "char",
        }
    }

    /// Name of the boxed counterpart, e.g. `Integer`.
    pub fn boxed_name(self) -> &'static str {
        match self {
            Primitive::Boolean => "Boolean",
            Primitive::Byte => "Byte",
            Primitive::Short => "Short",
            Primitive::Int => "Integer",
            Primitive::Long => "Long",
            Primitive::Float => "Float",
            Primitive::Double => "Double",
            Primitive::Char => "Character",
        }
    }

    /// Whether the kind takes part in numeric promotion. `char` does.
    pub fn is_numeric(self) -> bool {
        !matches!(self, Primitive::Boolean)
    }

    /// Next step up the promotion lattice.
    ///
    /// `byte -> short -> int -> long -> float -> double` and `char -> int`.
    fn promotes_to(self) -> Option<Primitive> {
        match self {
            Primitive::Byte => Some(Primitive::Short),
            Primitive::Short | Primitive::Char => Some(Primitive::Int),
            Primitive::Int => Some(Primitive::Long),
            Primitive::Long => Some(Primitive::Float),
            Primitive::Float => Some(Primitive::Double),
            Primitive::Double | Primitive::Boolean => None,
        }
    }

    /// True when `self` strictly widens to `target`. Identity is not widening.
    pub fn widens_to(self, target: Primitive) -> bool {
        let mut current = self.promotes_to();
        while let Some(step) = current {
            if step == target {
                return true;
            }
            current = step.promotes_to();
        }
        false
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Collection shapes, abstract interfaces and concrete implementations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionKind {
    Iterable,
    Collection,
    List,
    ArrayList,
    LinkedList,
    Set,
    HashSet,
    LinkedHashSet,
    SortedSet,
    TreeSet,
    Queue,
    Deque,
    ArrayDeque,
}

impl CollectionKind {
    /// Every kind a value of this kind can be assigned to, itself included.
    pub fn supertypes(self) -> &'static [CollectionKind] {
        use CollectionKind::*;
        match self {
            Iterable => &[Iterable],
            Collection => &[Collection, Iterable],
            List => &[List, Collection, Iterable],
            ArrayList => &[ArrayList, List, Collection, Iterable],
            LinkedList => &[LinkedList, List, Deque, Queue, Collection, Iterable],
            Set => &[Set, Collection, Iterable],
            HashSet => &[HashSet, Set, Collection, Iterable],
            LinkedHashSet => &[LinkedHashSet, HashSet, Set, Collection, Iterable],
            SortedSet => &[SortedSet, Set, Collection, Iterable],
            TreeSet => &[TreeSet, SortedSet, Set, Collection, Iterable],
            Queue => &[Queue, Collection, Iterable],
            Deque => &[Deque, Queue, Collection, Iterable],
            ArrayDeque => &[ArrayDeque, Deque, Queue, Collection, Iterable],
        }
    }

    /// `self` accepts values of kind `other`.
    pub fn is_assignable_from(self, other: CollectionKind) -> bool {
        other.supertypes().contains(&self)
    }

    pub fn is_abstract(self) -> bool {
        use CollectionKind::*;
        matches!(
            self,
            Iterable | Collection | List | Set | SortedSet | Queue | Deque
        )
    }

    /// Rejects duplicate elements.
    pub fn is_unique(self) -> bool {
        CollectionKind::Set.is_assignable_from(self)
    }

    /// Keeps elements in natural order.
    pub fn is_sorted(self) -> bool {
        CollectionKind::SortedSet.is_assignable_from(self)
    }

    pub fn name(self) -> &'static str {
        use CollectionKind::*;
        match self {
            Iterable => "Iterable",
            Collection => "Collection",
            List => "List",
            ArrayList => "ArrayList",
            LinkedList => "LinkedList",
            Set => "Set",
            HashSet => "HashSet",
            LinkedHashSet => "LinkedHashSet",
            SortedSet => "SortedSet",
            TreeSet => "TreeSet",
            Queue => "Queue",
            Deque => "Deque",
            ArrayDeque => "ArrayDeque",
        }
    }
}

/// Map shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MapKind {
    Map,
    HashMap,
    LinkedHashMap,
    SortedMap,
    TreeMap,
}

impl MapKind {
    pub fn supertypes(self) -> &'static [MapKind] {
        use MapKind::*;
        match self {
            Map => &[Map],
            HashMap => &[HashMap, Map],
            LinkedHashMap => &[LinkedHashMap, HashMap, Map],
            SortedMap => &[SortedMap, Map],
            TreeMap => &[TreeMap, SortedMap, Map],
        }
    }

    pub fn is_assignable_from(self, other: MapKind) -> bool {
        other.supertypes().contains(&self)
    }

    pub fn is_abstract(self) -> bool {
        matches!(self, MapKind::Map | MapKind::SortedMap)
    }

    pub fn is_sorted(self) -> bool {
        MapKind::SortedMap.is_assignable_from(self)
    }

    pub fn name(self) -> &'static str {
        match self {
            MapKind::Map => "Map",
            MapKind::HashMap => "HashMap",
            MapKind::LinkedHashMap => "LinkedHashMap",
            MapKind::SortedMap => "SortedMap",
            MapKind::TreeMap => "TreeMap",
        }
    }
}

/// A type expression describing a slot.
///
/// Containers and classes carry their type arguments. A raw container (no
/// explicit instantiation) uses `Type::Any` as its argument.
///
/// # Examples
///
/// ```rust
/// use graft_core::model::Type;
///
/// let items = Type::list(Type::class("DestItem"));
/// assert_eq!(items.to_string(), "List<DestItem>");
/// assert_eq!(items.element_type(), Some(&Type::class("DestItem")));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    /// The top type; any value fits.
    Any,
    Primitive(Primitive),
    /// Nullable wrapper around a primitive.
    Boxed(Primitive),
    String,
    Uuid,
    Optional(Box<Type>),
    Array(Box<Type>),
    Collection(CollectionKind, Box<Type>),
    Map(MapKind, Box<Type>, Box<Type>),
    /// User class or enum, with type arguments when parameterized.
    Class(String, Vec<Type>),
    /// Formal type parameter, e.g. `T` in `Page<T>`.
    Variable(String),
}

impl Type {
    pub const BOOLEAN: Type = Type::Primitive(Primitive::Boolean);
    pub const BYTE: Type = Type::Primitive(Primitive::Byte);
    pub const SHORT: Type = Type::Primitive(Primitive::Short);
    pub const INT: Type = Type::Primitive(Primitive::Int);
    pub const LONG: Type = Type::Primitive(Primitive::Long);
    pub const FLOAT: Type = Type::Primitive(Primitive::Float);
    pub const DOUBLE: Type = Type::Primitive(Primitive::Double);
    pub const CHAR: Type = Type::Primitive(Primitive::Char);

    pub fn boxed_of(primitive: Primitive) -> Self {
        Type::Boxed(primitive)
    }

    pub fn class(name: impl Into<String>) -> Self {
        Type::Class(name.into(), Vec::new())
    }

    pub fn generic(name: impl Into<String>, args: Vec<Type>) -> Self {
        Type::Class(name.into(), args)
    }

    pub fn var(name: impl Into<String>) -> Self {
        Type::Variable(name.into())
    }

    pub fn list(element: Type) -> Self {
        Type::Collection(CollectionKind::List, Box::new(element))
    }

    pub fn set(element: Type) -> Self {
        Type::Collection(CollectionKind::Set, Box::new(element))
    }

    pub fn collection(kind: CollectionKind, element: Type) -> Self {
        Type::Collection(kind, Box::new(element))
    }

    pub fn map(key: Type, value: Type) -> Self {
        Type::Map(MapKind::Map, Box::new(key), Box::new(value))
    }

    pub fn map_of(kind: MapKind, key: Type, value: Type) -> Self {
        Type::Map(kind, Box::new(key), Box::new(value))
    }

    pub fn array(component: Type) -> Self {
        Type::Array(Box::new(component))
    }

    pub fn optional(inner: Type) -> Self {
        Type::Optional(Box::new(inner))
    }

    /// Primitive kind for both `Primitive` and `Boxed` types.
    pub fn primitive(&self) -> Option<Primitive> {
        match self {
            Type::Primitive(p) | Type::Boxed(p) => Some(*p),
            _ => None,
        }
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, Type::Primitive(_))
    }

    pub fn is_char_sequence(&self) -> bool {
        matches!(self, Type::String)
    }

    pub fn is_char_array(&self) -> bool {
        matches!(self, Type::Array(c) if **c == Type::CHAR)
    }

    /// Arrays, collections and maps; these are never walked field by field.
    pub fn is_container(&self) -> bool {
        matches!(self, Type::Array(_) | Type::Collection(..) | Type::Map(..))
    }

    pub fn is_collection(&self) -> bool {
        matches!(self, Type::Collection(..))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Type::Array(_))
    }

    pub fn is_map(&self) -> bool {
        matches!(self, Type::Map(..))
    }

    pub fn is_variable(&self) -> bool {
        matches!(self, Type::Variable(_))
    }

    /// Class name for `Class` types.
    pub fn class_name(&self) -> Option<&str> {
        match self {
            Type::Class(name, _) => Some(name),
            _ => None,
        }
    }

    /// Type arguments for parameterized classes and containers.
    pub fn type_args(&self) -> Vec<&Type> {
        match self {
            Type::Class(_, args) => args.iter().collect(),
            Type::Collection(_, e) | Type::Array(e) | Type::Optional(e) => vec![e.as_ref()],
            Type::Map(_, k, v) => vec![k.as_ref(), v.as_ref()],
            _ => Vec::new(),
        }
    }

    /// Element type of arrays, collections and optionals.
    pub fn element_type(&self) -> Option<&Type> {
        match self {
            Type::Array(e) | Type::Collection(_, e) | Type::Optional(e) => Some(e),
            _ => None,
        }
    }

    /// Key and value types of maps.
    pub fn entry_types(&self) -> Option<(&Type, &Type)> {
        match self {
            Type::Map(_, k, v) => Some((k, v)),
            _ => None,
        }
    }

    /// True when a formal type parameter appears anywhere inside.
    pub fn has_variables(&self) -> bool {
        match self {
            Type::Variable(_) => true,
            other => other.type_args().into_iter().any(Type::has_variables),
        }
    }

    /// Box a primitive type; other types are returned unchanged.
    pub fn boxed(&self) -> Type {
        match self {
            Type::Primitive(p) => Type::Boxed(*p),
            other => other.clone(),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn args(f: &mut fmt::Formatter<'_>, args: &[&Type]) -> fmt::Result {
            if args.is_empty() {
                return Ok(());
            }
            f.write_str("<")?;
            for (i, arg) in args.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{arg}")?;
            }
            f.write_str(">")
        }

        match self {
            Type::Any => f.write_str("Object"),
            Type::Primitive(p) => f.write_str(p.name()),
            Type::Boxed(p) => f.write_str(p.boxed_name()),
            Type::String => f.write_str("String"),
            Type::Uuid => f.write_str("UUID"),
            Type::Optional(inner) => {
                f.write_str("Optional")?;
                args(f, &[inner.as_ref()])
            }
            Type::Array(component) => write!(f, "{component}[]"),
            Type::Collection(kind, element) => {
                f.write_str(kind.name())?;
                args(f, &[element.as_ref()])
            }
            Type::Map(kind, key, value) => {
                f.write_str(kind.name())?;
                args(f, &[key.as_ref(), value.as_ref()])
            }
            Type::Class(name, type_args) => {
                f.write_str(name)?;
                args(f, &type_args.iter().collect::<Vec<_>>())
            }
            Type::Variable(name) => f.write_str(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_widening_follows_lattice() {
        assert!(Primitive::Byte.widens_to(Primitive::Double));
        assert!(Primitive::Char.widens_to(Primitive::Long));
        assert!(!Primitive::Double.widens_to(Primitive::Byte));
        assert!(!Primitive::Byte.widens_to(Primitive::Char));
        assert!(!Primitive::Int.widens_to(Primitive::Int));
        assert!(!Primitive::Boolean.widens_to(Primitive::Int));
    }

    #[test]
    fn test_collection_kind_assignability() {
        assert!(CollectionKind::List.is_assignable_from(CollectionKind::ArrayList));
        assert!(CollectionKind::Queue.is_assignable_from(CollectionKind::LinkedList));
        assert!(!CollectionKind::Set.is_assignable_from(CollectionKind::ArrayList));
        assert!(CollectionKind::TreeSet.is_sorted());
        assert!(CollectionKind::LinkedHashSet.is_unique());
    }

    #[test]
    fn test_display() {
        let t = Type::map(Type::String, Type::list(Type::var("T")));
        assert_eq!(t.to_string(), "Map<String, List<T>>");
        assert_eq!(Type::array(Type::INT).to_string(), "int[]");
        assert_eq!(Type::Boxed(Primitive::Int).to_string(), "Integer");
    }

    #[test]
    fn test_has_variables() {
        assert!(Type::generic("Page", vec![Type::list(Type::var("T"))]).has_variables());
        assert!(!Type::list(Type::String).has_variables());
    }
}
