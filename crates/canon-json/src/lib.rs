//! Deterministic canonical JSON with registry-tagged polymorphic values.
//!
//! Values are encoded against a declared [`Shape`]. Equal inputs always
//! produce byte-identical output:
//!
//! - map keys are sorted, struct fields keep declaration order;
//! - 64-bit integers are written as quoted decimal strings;
//! - byte sequences are standard padded base64;
//! - timestamps are UTC RFC3339 with nine fractional digits;
//! - values held behind an interface are wrapped as
//!   `{"type":<tag>,"value":<inner>}`, with tags taken from a [`Registry`].
//!
//! ```
//! use canon_json::{Codec, Field, Registry, Shape, TypeDef, Value};
//!
//! let registry = Registry::new();
//! let tesla = TypeDef::new(
//!     "Tesla",
//!     Shape::structure(vec![Field::new("Color", Shape::Str)]),
//! )
//! .implementing("Car");
//! registry.register("car/tesla", tesla).unwrap();
//!
//! let codec = Codec::new(registry);
//! let car = Value::held("Tesla", Value::Struct(vec!["blue".into()]));
//! let json = codec.encode_to_string(&car, &Shape::interface("Car")).unwrap();
//! assert_eq!(json, r#"{"type":"car/tesla","value":{"Color":"blue"}}"#);
//!
//! let back = codec.decode(json.as_bytes(), &Shape::interface("Car")).unwrap();
//! assert_eq!(back, car);
//! ```

mod codec;
mod config;
mod decoder;
mod encoder;
mod error;
mod json;
mod registry;
mod shape;
pub mod timestamp;
mod value;

pub use codec::Codec;
pub use config::{CodecConfig, DEFAULT_MAX_DEPTH};
pub use error::{DecodeError, EncodeError, HookError};
pub use registry::{
    CustomCodec, DecodeSelfFn, EncodeSelfFn, Form, Registry, RegistryError, TypeDef,
};
pub use shape::{Field, NumFormat, OpaqueKind, Shape, StructShape};
pub use value::{Held, Value};
