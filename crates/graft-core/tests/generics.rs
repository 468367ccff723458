//! Parameterized destinations.

mod common;

use graft_core::model::{ClassDef, FieldDef, Primitive, Type, Value};
use graft_core::{Configuration, Converter};

fn source_page() -> Value {
    let source_item = common::source_item();
    let listing = ClassDef::builder("Listing")
        .field(FieldDef::new("items", Type::list(Type::class("SourceItem"))))
        .field(FieldDef::new("first", Type::class("SourceItem")))
        .field(FieldDef::new("total", Type::INT))
        .field(FieldDef::new("title", Type::String))
        .build();
    Value::new_object(
        &listing,
        [
            (
                "items",
                Value::list(
                    Type::class("SourceItem"),
                    [
                        common::item(&source_item, 1, "a"),
                        common::item(&source_item, 2, "b"),
                    ],
                ),
            ),
            ("first", common::item(&source_item, 1, "a")),
            ("total", Value::Int(2)),
            ("title", Value::from("results")),
        ],
    )
}

fn assert_dest_items(items: &Value) {
    let items = items.as_collection().unwrap().borrow();
    assert_eq!(items.element_type(), &Type::class("DestItem"));
    let ids: Vec<_> = items.items().iter().map(|item| item.get("id")).collect();
    assert_eq!(ids, vec![Value::Long(1), Value::Long(2)]);
}

#[test]
fn test_type_arguments_bind_member_types() {
    let converter = Converter::new(common::configuration());
    let page_type = Type::generic("Page", vec![Type::class("DestItem")]);

    let page = converter.convert_to_type(&source_page(), &page_type).unwrap();

    assert_dest_items(&page.get("items"));
    let first = page.get("first");
    let first = first.as_object().unwrap().borrow();
    assert_eq!(first.class().name(), "DestItem");
    assert_eq!(first.get("id"), Value::Long(1));
    assert_eq!(page.get("total"), Value::Long(2));
}

#[test]
fn test_super_class_arguments_bind_inherited_members() {
    let converter = Converter::new(common::configuration());

    let page = converter.convert_to(&source_page(), "ItemPage").unwrap();

    assert_eq!(page.get("title"), Value::from("results"));
    assert_dest_items(&page.get("items"));
    assert_eq!(page.get("first").get("label"), Value::from("a"));
}

#[test]
fn test_raw_destination_leaves_generic_members_unset() {
    let converter = Converter::new(common::configuration());

    let page = converter.convert_to(&source_page(), "Page").unwrap();

    assert_eq!(page.get("items"), Value::Null);
    assert_eq!(page.get("first"), Value::Null);
    assert_eq!(page.get("total"), Value::Long(2));
}

#[test]
fn test_nested_parameterized_field() {
    let wrapper = ClassDef::builder("Wrapper")
        .field(FieldDef::new(
            "page",
            Type::generic("Page", vec![Type::Boxed(Primitive::Long)]),
        ))
        .build();
    let numbers = ClassDef::builder("Numbers")
        .field(FieldDef::new("items", Type::list(Type::Boxed(Primitive::Int))))
        .build();
    let holder = ClassDef::builder("Holder")
        .field(FieldDef::new("page", Type::class("Numbers")))
        .build();
    let config = common::configuration()
        .to_builder()
        .class(&wrapper)
        .class(&numbers)
        .class(&holder)
        .build();
    let converter = Converter::new(config);

    let source = Value::new_object(
        &holder,
        [(
            "page",
            Value::new_object(
                &numbers,
                [(
                    "items",
                    Value::list(Type::Boxed(Primitive::Int), [Value::Int(3), Value::Int(4)]),
                )],
            ),
        )],
    );
    let converted = converter.convert_to(&source, "Wrapper").unwrap();

    let items = converted.get("page").get("items");
    let items = items.as_collection().unwrap().borrow();
    assert_eq!(items.element_type(), &Type::Boxed(Primitive::Long));
    assert_eq!(items.items(), &[Value::Long(3), Value::Long(4)]);
}

#[test]
fn test_generic_array_member() {
    let series = ClassDef::builder("Series")
        .type_param("T")
        .field(FieldDef::new("points", Type::array(Type::var("T"))))
        .build();
    let samples = ClassDef::builder("Samples")
        .field(FieldDef::new("points", Type::list(Type::Boxed(Primitive::Int))))
        .build();
    let converter = Converter::new(Configuration::builder().class(&series).build());

    let source = Value::new_object(
        &samples,
        [(
            "points",
            Value::list(Type::Boxed(Primitive::Int), [Value::Int(1), Value::Int(2)]),
        )],
    );
    let converted = converter
        .convert_to_type(&source, &Type::generic("Series", vec![Type::Boxed(Primitive::Double)]))
        .unwrap();

    let points = converted.get("points");
    let points = points.as_array().unwrap().borrow();
    assert_eq!(points.component(), &Type::Boxed(Primitive::Double));
    assert_eq!(points.items(), &[Value::Double(1.0), Value::Double(2.0)]);
}
