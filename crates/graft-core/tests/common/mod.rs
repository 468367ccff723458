//! Shared class fixtures for the scenario tests.
#![allow(dead_code)]

use graft_core::Configuration;
use graft_core::model::{ClassDef, FieldDef, Type, TypeRegistry, Value};
use std::sync::Arc;

pub fn source_item() -> Arc<ClassDef> {
    ClassDef::builder("SourceItem")
        .field(FieldDef::new("id", Type::INT))
        .field(FieldDef::new("label", Type::String))
        .build()
}

pub fn dest_item() -> Arc<ClassDef> {
    ClassDef::builder("DestItem")
        .field(FieldDef::new("id", Type::LONG))
        .field(FieldDef::new("label", Type::String))
        .build()
}

pub fn status() -> Arc<ClassDef> {
    ClassDef::enumeration("Status", ["ACTIVE", "INACTIVE"]).build()
}

pub fn order() -> Arc<ClassDef> {
    ClassDef::builder("Order")
        .field(FieldDef::new("x", Type::INT))
        .field(FieldDef::new("status", Type::String))
        .field(FieldDef::new("items", Type::list(Type::class("SourceItem"))))
        .build()
}

pub fn order_view() -> Arc<ClassDef> {
    ClassDef::builder("OrderView")
        .field(FieldDef::new("x", Type::String))
        .field(FieldDef::new("status", Type::class("Status")))
        .field(FieldDef::new("items", Type::list(Type::class("DestItem"))))
        .build()
}

/// `Page<T>` with a generic element list and a generic head element.
pub fn page() -> Arc<ClassDef> {
    ClassDef::builder("Page")
        .type_param("T")
        .field(FieldDef::new("items", Type::list(Type::var("T"))))
        .field(FieldDef::new("first", Type::var("T")))
        .field(FieldDef::new("total", Type::LONG))
        .build()
}

/// `ItemPage extends Page<DestItem>`.
pub fn item_page(page: &Arc<ClassDef>) -> Arc<ClassDef> {
    ClassDef::builder("ItemPage")
        .extends_generic(page, vec![Type::class("DestItem")])
        .field(FieldDef::new("title", Type::String))
        .build()
}

pub fn registry() -> TypeRegistry {
    let page = page();
    TypeRegistry::new()
        .with(&source_item())
        .with(&dest_item())
        .with(&status())
        .with(&order())
        .with(&order_view())
        .with(&item_page(&page))
        .with(&page)
}

pub fn configuration() -> Configuration {
    Configuration::builder().registry(registry()).build()
}

pub fn item(class: &Arc<ClassDef>, id: i32, label: &str) -> Value {
    Value::new_object(class, [("id", Value::Int(id)), ("label", Value::from(label))])
}

/// Installs a test subscriber once so `RUST_LOG` shows engine events.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}
