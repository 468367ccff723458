//! Structural object mapping.
//!
//! A [`Converter`] copies state from a source object graph into a
//! destination graph whose shape may differ. Destination members are paired
//! with source members through [`strategy`] lookups and each pair is handed
//! to an ordered chain of [`handler`]s, which convert scalars, strings,
//! enums, containers and nested objects. Generic destination types are
//! resolved through [`generics`] so element types of nested containers are
//! known at each level.

pub mod config;
pub mod container;
pub mod context;
pub mod converter;
pub mod error;
pub mod field;
pub mod flatten;
pub mod generics;
pub mod handler;
pub mod model;
pub mod settings;
pub mod strategy;

pub use config::{Configuration, ConfigurationBuilder, ExcludedFields, ExpandableFields, SimpleConverter};
pub use converter::{Converter, Session};
pub use error::{Error, Result};
pub use field::{FieldDescriptor, MemberAccess, PrivilegedAccess, PublicAccess};
pub use handler::{FieldHandler, HandlerChain, Outcome};
pub use settings::ConversionSettings;
pub use strategy::FieldStrategy;
