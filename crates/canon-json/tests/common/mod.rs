//! Shared fixture types for the integration matrices.

#![allow(dead_code)]

use canon_json::{Codec, CustomCodec, Field, Form, Registry, Shape, TypeDef, Value};
use time::macros::datetime;
use time::OffsetDateTime;

pub const TESLA_TAG: &str = "car/tesla";

/// 2020-06-02 18:05:13.004346374 at UTC+2.
pub fn sample_time() -> OffsetDateTime {
    datetime!(2020-06-02 18:05:13.004346374 +2)
}

fn custom_output() -> CustomCodec {
    CustomCodec::new()
        .with_encoder(|_| Ok(b"\"custom\"".to_vec()))
        .with_decoder(|_| Ok(Value::Struct(vec![Value::from("custom")])))
}

fn value_struct() -> Shape {
    Shape::structure(vec![Field::new("Value", Shape::Str)])
}

/// Registry with the fixture types:
///
/// - `Tesla { Color }`, tagged `car/tesla` in value form, implements `Car`;
/// - `Ford { Model }`, tagged `car/ford` in pointer form, implements `Car`;
/// - `Boat { Name }`, tagged `boat`, implements nothing;
/// - `PtrCustom { Value }` with pointer-form hooks only;
/// - `BareCustom { Value }` with value-form hooks only;
/// - `Struct`, the nested struct with an interface field.
pub fn registry() -> Registry {
    let registry = Registry::new();
    registry
        .register(
            TESLA_TAG,
            TypeDef::new(
                "Tesla",
                Shape::structure(vec![Field::new("Color", Shape::Str)]),
            )
            .implementing("Car"),
        )
        .unwrap();
    registry
        .register_as(
            "car/ford",
            TypeDef::new(
                "Ford",
                Shape::structure(vec![Field::new("Model", Shape::Str)]),
            )
            .implementing("Car"),
            Form::Pointer,
        )
        .unwrap();
    registry
        .register(
            "boat",
            TypeDef::new(
                "Boat",
                Shape::structure(vec![Field::new("Name", Shape::Str)]),
            ),
        )
        .unwrap();
    registry
        .define(TypeDef::new("PtrCustom", value_struct()).with_pointer_codec(custom_output()))
        .unwrap();
    registry
        .define(TypeDef::new("BareCustom", value_struct()).with_value_codec(custom_output()))
        .unwrap();
    registry
        .define(TypeDef::new(
            "Struct",
            Shape::structure(vec![
                Field::new("Name", Shape::Str).rename("name"),
                Field::new("Value", Shape::i64()),
                Field::new("Child", Shape::ptr(Shape::named("Struct"))).omit_empty(),
                Field::new("Empty", Shape::Str).rename("empty").omit_empty(),
                Field::new("Car", Shape::interface("Car")).omit_empty(),
            ]),
        ))
        .unwrap();
    registry
}

pub fn codec() -> Codec {
    Codec::new(registry())
}

pub fn tesla(color: &str) -> Value {
    Value::Struct(vec![Value::from(color)])
}

/// `Struct` value: name, value, child, empty, car.
pub fn structure(name: &str, value: i64, child: Value, empty: &str, car: Value) -> Value {
    Value::Struct(vec![
        Value::from(name),
        Value::from(value),
        child,
        Value::from(empty),
        car,
    ])
}

pub fn encode(value: &Value, shape: &Shape) -> String {
    codec().encode_to_string(value, shape).unwrap()
}
