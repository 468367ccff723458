//! Field policies, member access, source strategies and file settings.

mod common;

use graft_core::model::{
    AccessorDef, ClassDef, FieldDef, MapKind, MethodDef, Primitive, Type, Value,
};
use graft_core::strategy::{ByName, ByPath, MapKey};
use graft_core::{
    Configuration, ConversionSettings, Converter, Error, ExpandableFields, PublicAccess,
};
use std::sync::{Arc, OnceLock};

fn customer_classes() -> (Arc<ClassDef>, Arc<ClassDef>) {
    let customer = ClassDef::builder("Customer")
        .field(FieldDef::new("name", Type::String))
        .field(FieldDef::new("orders", Type::list(Type::String)))
        .field(FieldDef::new("notes", Type::list(Type::String)))
        .build();
    let summary = ClassDef::builder("CustomerSummary")
        .field(FieldDef::new("name", Type::String))
        .field(FieldDef::new("orders", Type::list(Type::String)).expandable())
        .field(FieldDef::new("notes", Type::list(Type::String)).expandable())
        .build();
    (customer, summary)
}

fn customer(class: &Arc<ClassDef>) -> Value {
    Value::new_object(
        class,
        [
            ("name", Value::from("Ada")),
            ("orders", Value::list(Type::String, [Value::from("o-1")])),
            ("notes", Value::list(Type::String, [Value::from("vip")])),
        ],
    )
}

#[test]
fn test_expandable_fields_follow_policy() {
    let (customer_class, summary) = customer_classes();
    let source = customer(&customer_class);

    let default = Converter::new(Configuration::builder().class(&summary).build());
    let converted = default.convert_to(&source, "CustomerSummary").unwrap();
    assert_eq!(converted.get("name"), Value::from("Ada"));
    assert_eq!(converted.get("orders"), Value::Null);
    assert_eq!(converted.get("notes"), Value::Null);

    let selective = Converter::new(
        Configuration::builder()
            .class(&summary)
            .expandable(ExpandableFields::only(["orders"]))
            .build(),
    );
    let converted = selective.convert_to(&source, "CustomerSummary").unwrap();
    assert_eq!(converted.get("orders").to_string(), "[o-1]");
    assert_eq!(converted.get("notes"), Value::Null);

    let everything = Converter::new(
        Configuration::builder()
            .class(&summary)
            .expandable(ExpandableFields::all())
            .build(),
    );
    let converted = everything.convert_to(&source, "CustomerSummary").unwrap();
    assert_eq!(converted.get("notes").to_string(), "[vip]");
}

#[test]
fn test_public_access_refuses_private_members() {
    let secretive = ClassDef::builder("Secretive")
        .field(FieldDef::new("pin", Type::String).private())
        .build();
    let open = ClassDef::builder("Open")
        .field(FieldDef::new("pin", Type::String))
        .build();
    let source = Value::new_object(&secretive, [("pin", Value::from("1234"))]);

    let privileged = Converter::new(Configuration::builder().class(&open).build());
    let converted = privileged.convert_to(&source, "Open").unwrap();
    assert_eq!(converted.get("pin"), Value::from("1234"));

    let public = Converter::new(Configuration::builder().class(&open).access(PublicAccess).build());
    let err = public.convert_to(&source, "Open").unwrap_err();
    assert!(matches!(err, Error::Handler { .. }));
    assert!(matches!(err.root_cause(), Error::Access { member, .. } if member == "Secretive.pin"));
}

#[test]
fn test_map_sources_with_explicit_keys() {
    let profile = ClassDef::builder("Profile")
        .field(FieldDef::new("name", Type::String))
        .field(FieldDef::new("age", Type::LONG))
        .field(FieldDef::new("city", Type::String))
        .build();
    let source = Value::map(
        MapKind::HashMap,
        Type::Any,
        Type::Any,
        [
            (Value::from("full_name"), Value::from("Grace")),
            (Value::from("age"), Value::Int(85)),
            (Value::Int(7), Value::from("Arlington")),
        ],
    );
    let config = Configuration::builder()
        .class(&profile)
        .strategies(vec![
            Arc::new(ByName),
            Arc::new(MapKey::new().with_key("name", "full_name").with_key("city", 7)),
        ])
        .build();

    let converted = Converter::new(config).convert_to(&source, "Profile").unwrap();

    assert_eq!(converted.get("name"), Value::from("Grace"));
    assert_eq!(converted.get("age"), Value::Long(85));
    assert_eq!(converted.get("city"), Value::from("Arlington"));
}

#[test]
fn test_path_strategy_reads_nested_members() {
    let address = ClassDef::builder("Address")
        .field(FieldDef::new("city", Type::String))
        .build();
    let person = ClassDef::builder("Person")
        .field(FieldDef::new("address", Type::class("Address")))
        .build();
    let flat = ClassDef::builder("Flat")
        .field(FieldDef::new("address.city", Type::String))
        .build();
    let source = Value::new_object(
        &person,
        [(
            "address",
            Value::new_object(&address, [("city", Value::from("Oslo"))]),
        )],
    );
    let config = Configuration::builder()
        .class(&flat)
        .strategies(vec![Arc::new(ByPath)])
        .build();

    let converted = Converter::new(config).convert_to(&source, "Flat").unwrap();
    assert_eq!(converted.get("address.city"), Value::from("Oslo"));
}

#[test]
fn test_accessor_properties_are_sources_and_destinations() {
    let person = ClassDef::builder("Person")
        .field(FieldDef::new("first", Type::String))
        .field(FieldDef::new("last", Type::String))
        .accessor(AccessorDef::getter("getFullName", Type::String, |object| {
            Value::from(format!("{} {}", object.get("first"), object.get("last")))
        }))
        .build();
    let card = ClassDef::builder("Card")
        .field(FieldDef::new("label", Type::String).private())
        .accessor(
            AccessorDef::getter("getFullName", Type::String, |object| object.get("label"))
                .with_setter(|object, value| object.set("label", value)),
        )
        .build();
    let converter = Converter::new(Configuration::builder().class(&card).build());
    let source = Value::new_object(
        &person,
        [("first", Value::from("Alan")), ("last", Value::from("Turing"))],
    );

    let converted = converter.convert_to(&source, "Card").unwrap();
    assert_eq!(converted.get("label"), Value::from("Alan Turing"));
}

/// `Money` with a static `parse(String)` factory producing `Money` values.
fn money_class() -> Arc<ClassDef> {
    let slot: Arc<OnceLock<Arc<ClassDef>>> = Arc::new(OnceLock::new());
    let parse_class = Arc::clone(&slot);
    let money = ClassDef::builder("Money")
        .field(FieldDef::new("cents", Type::LONG))
        .static_method(MethodDef::new(
            "parse",
            Type::String,
            Type::class("Money"),
            move |value| {
                let class = parse_class
                    .get()
                    .ok_or_else(|| anyhow::anyhow!("Money is not built yet"))?;
                let text = value.as_str().unwrap_or_default();
                let cents = text.replace('.', "").parse::<i64>()?;
                Ok(Value::new_object(class, [("cents", Value::Long(cents))]))
            },
        ))
        .build();
    let _ = slot.set(Arc::clone(&money));
    money
}

#[test]
fn test_string_factory_and_creator_bypass() {
    let invoice = ClassDef::builder("Invoice")
        .field(FieldDef::new("amount", Type::class("Money")))
        .creator(|| Value::Null)
        .build();
    let invoice_source = ClassDef::builder("InvoiceSource")
        .field(FieldDef::new("amount", Type::String))
        .build();
    let converter = Converter::new(
        Configuration::builder()
            .class(&money_class())
            .class(&invoice)
            .build(),
    );
    let source = Value::new_object(&invoice_source, [("amount", Value::from("12.50"))]);

    // The creator override yields null; convert_to must not consult it.
    let converted = converter.convert_to(&source, "Invoice").unwrap();
    assert_eq!(converted.get("amount").get("cents"), Value::Long(1250));

    let bad = Value::new_object(&invoice_source, [("amount", Value::from("twelve"))]);
    let err = converter.convert_to(&bad, "Invoice").unwrap_err();
    assert!(matches!(err.root_cause(), Error::Callback(_)));
}

#[test]
fn test_constructor_from_source_value() {
    let plain = ClassDef::builder("Celsius")
        .field(FieldDef::new("degrees", Type::DOUBLE))
        .build();
    let celsius = ClassDef::builder("Celsius")
        .field(FieldDef::new("degrees", Type::DOUBLE))
        .constructor(Type::Boxed(Primitive::Double), move |value| {
            Ok(Value::new_object(&plain, [("degrees", value.clone())]))
        })
        .build();
    let reading = ClassDef::builder("Reading")
        .field(FieldDef::new("temperature", Type::class("Celsius")))
        .build();
    let raw = ClassDef::builder("RawReading")
        .field(FieldDef::new("temperature", Type::DOUBLE))
        .build();
    let converter = Converter::new(
        Configuration::builder()
            .class(&celsius)
            .class(&reading)
            .build(),
    );

    let source = Value::new_object(&raw, [("temperature", Value::Double(21.5))]);
    let converted = converter.convert_to(&source, "Reading").unwrap();
    assert_eq!(converted.get("temperature").get("degrees"), Value::Double(21.5));
}

#[test]
fn test_settings_file_drives_configuration() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("graft.toml");
    std::fs::write(
        &path,
        r#"
excluded = ["label"]
strategies = ["by-name", "map-key"]

[map-keys]
id = "identifier"
"#,
    )?;
    let settings = ConversionSettings::load(&path)?;
    let config = settings
        .apply(Configuration::builder())
        .registry(common::registry())
        .build();
    let converter = Converter::new(config);

    let source = Value::map(
        MapKind::HashMap,
        Type::String,
        Type::Any,
        [
            (Value::from("identifier"), Value::Int(11)),
            (Value::from("label"), Value::from("ignored")),
        ],
    );
    let converted = converter.convert_to(&source, "DestItem")?;
    assert_eq!(converted.get("id"), Value::Long(11));
    assert_eq!(converted.get("label"), Value::Null);
    Ok(())
}

#[test]
fn test_configuration_equality_ignores_closures() {
    let a = common::configuration();
    let b = common::configuration()
        .to_builder()
        .build();
    assert_eq!(a, b);

    let c = a.to_builder().expandable(ExpandableFields::all()).build();
    assert_ne!(a, c);
}
