//! Runtime values walked by the encoder and produced by the decoder.
//!
//! A [`Value`] carries data only. Which JSON form it takes is decided by the
//! [`Shape`](crate::Shape) it is encoded against.

use std::collections::BTreeMap;

use time::OffsetDateTime;

/// A runtime value.
///
/// Non-nil pointers have no variant of their own: the pointee is stored
/// directly and the pointer-ness lives in [`Shape::Ptr`](crate::Shape::Ptr).
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absent pointer, interface, slice, map or byte sequence.
    Nil,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    Time(OffsetDateTime),
    /// Slice or fixed-size array elements.
    Seq(Vec<Value>),
    /// String-keyed mapping. Iteration order is the canonical key order.
    Map(BTreeMap<String, Value>),
    /// Struct members in declaration order, one per declared field.
    Struct(Vec<Value>),
    /// A concrete value held behind an interface.
    Held(Box<Held>),
}

/// A concrete value stored in an interface slot.
#[derive(Debug, Clone, PartialEq)]
pub struct Held {
    /// Name of the concrete [`TypeDef`](crate::TypeDef).
    pub type_name: String,
    /// Whether the interface holds a pointer to the value.
    pub by_ref: bool,
    pub value: Value,
}

impl Value {
    /// Wraps `value` as an interface-held value of type `type_name`.
    pub fn held(type_name: impl Into<String>, value: Value) -> Self {
        Value::Held(Box::new(Held {
            type_name: type_name.into(),
            by_ref: false,
            value,
        }))
    }

    /// Wraps `value` as an interface-held pointer to type `type_name`.
    pub fn held_ref(type_name: impl Into<String>, value: Value) -> Self {
        Value::Held(Box::new(Held {
            type_name: type_name.into(),
            by_ref: true,
            value,
        }))
    }

    pub fn bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Value::Bytes(bytes.into())
    }

    /// Builds a map value from `(key, value)` pairs; later duplicates win.
    pub fn map<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Value::Map(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// Short kind name used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Uint(_) => "uint",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::Time(_) => "time",
            Value::Seq(_) => "sequence",
            Value::Map(_) => "map",
            Value::Struct(_) => "struct",
            Value::Held(_) => "interface value",
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

macro_rules! impl_from_signed {
    ($($t:ty),*) => {
        $(impl From<$t> for Value {
            fn from(v: $t) -> Self {
                Value::Int(v as i64)
            }
        })*
    };
}

macro_rules! impl_from_unsigned {
    ($($t:ty),*) => {
        $(impl From<$t> for Value {
            fn from(v: $t) -> Self {
                Value::Uint(v as u64)
            }
        })*
    };
}

impl_from_signed!(i8, i16, i32, i64);
impl_from_unsigned!(u8, u16, u32, u64);

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(v as f64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<OffsetDateTime> for Value {
    fn from(v: OffsetDateTime) -> Self {
        Value::Time(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Nil, Into::into)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::Seq(v)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(v: BTreeMap<String, Value>) -> Self {
        Value::Map(v)
    }
}
