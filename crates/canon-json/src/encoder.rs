//! Shape-driven canonical encoder.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::config::CodecConfig;
use crate::error::EncodeError;
use crate::json::{format_float, validate, write_str};
use crate::registry::Registry;
use crate::shape::{NumFormat, Shape, StructShape};
use crate::timestamp::{self, ZERO_TIME};
use crate::value::{Held, Value};

/// Walks a [`Value`] against its declared [`Shape`] and writes canonical JSON.
///
/// One encoder is created per call; it owns only its output buffer.
pub(crate) struct CanonicalEncoder<'c> {
    registry: &'c Registry,
    config: &'c CodecConfig,
    out: Vec<u8>,
}

impl<'c> CanonicalEncoder<'c> {
    pub fn new(registry: &'c Registry, config: &'c CodecConfig) -> Self {
        Self {
            registry,
            config,
            out: Vec::new(),
        }
    }

    /// Encodes a root value.
    ///
    /// A root whose declared type is a registered concrete type (behind any
    /// number of pointers) is written in its interface envelope.
    pub fn encode(mut self, value: &Value, shape: &Shape) -> Result<Vec<u8>, EncodeError> {
        let (inner, by_ref) = shape.deref();
        match inner {
            Shape::Named(name) if self.registry.tag_for(name).is_some() => {
                if value.is_nil() {
                    self.write_any(value, shape, false, 0)?;
                } else {
                    let held = Held {
                        type_name: name.clone(),
                        by_ref,
                        value: value.clone(),
                    };
                    self.write_held(&held, &Shape::Any, 0)?;
                }
            }
            _ => self.write_any(value, shape, false, 0)?,
        }
        Ok(self.out)
    }

    fn write_any(
        &mut self,
        value: &Value,
        shape: &Shape,
        addressable: bool,
        depth: usize,
    ) -> Result<(), EncodeError> {
        if depth > self.config.max_depth {
            return Err(EncodeError::DepthLimit(self.config.max_depth));
        }
        if let Shape::Opaque(kind) = shape {
            return Err(EncodeError::UnsupportedShape(kind.as_str()));
        }
        if let Shape::Named(name) = shape {
            return self.write_named(name, value, addressable, depth);
        }
        if value.is_nil() {
            return if shape.accepts_nil() {
                self.out.extend_from_slice(b"null");
                Ok(())
            } else {
                Err(mismatch(shape, value))
            };
        }

        match (shape, value) {
            (Shape::Bytes, Value::Bytes(b)) => {
                self.write_base64(b);
                Ok(())
            }
            (Shape::ByteArray(len), Value::Bytes(b)) => {
                check_len(*len, b.len())?;
                self.write_base64(b);
                Ok(())
            }
            (Shape::Num(format), _) => self.write_num(*format, value, shape),
            (Shape::Bool, Value::Bool(b)) => {
                self.out
                    .extend_from_slice(if *b { b"true" } else { b"false" });
                Ok(())
            }
            (Shape::Str, Value::Str(s)) => {
                write_str(&mut self.out, s, self.config.escape_html);
                Ok(())
            }
            (Shape::Time, Value::Time(t)) => {
                let text = timestamp::format(*t).ok_or_else(|| EncodeError::OutOfRange {
                    format: "RFC3339 timestamp",
                    value: t.to_string(),
                })?;
                self.out.push(b'"');
                self.out.extend_from_slice(text.as_bytes());
                self.out.push(b'"');
                Ok(())
            }
            (Shape::Ptr(inner), _) => self.write_any(value, inner, true, depth + 1),
            (Shape::Seq(elem), Value::Seq(items)) => self.write_arr(items, elem, true, depth),
            (Shape::Array(len, elem), Value::Seq(items)) => {
                check_len(*len, items.len())?;
                self.write_arr(items, elem, addressable, depth)
            }
            (Shape::Map(elem), Value::Map(entries)) => {
                self.out.push(b'{');
                for (i, (key, item)) in entries.iter().enumerate() {
                    if i > 0 {
                        self.out.push(b',');
                    }
                    write_str(&mut self.out, key, self.config.escape_html);
                    self.out.push(b':');
                    self.write_any(item, elem, false, depth + 1)?;
                }
                self.out.push(b'}');
                Ok(())
            }
            (Shape::Struct(st), Value::Struct(fields)) => {
                self.write_struct(st, fields, addressable, depth)
            }
            (Shape::Interface(_) | Shape::Any, Value::Held(held)) => {
                self.write_held(held, shape, depth)
            }
            _ => Err(mismatch(shape, value)),
        }
    }

    fn write_named(
        &mut self,
        name: &str,
        value: &Value,
        addressable: bool,
        depth: usize,
    ) -> Result<(), EncodeError> {
        let def = self
            .registry
            .lookup(name)
            .ok_or_else(|| EncodeError::UnknownType(name.to_owned()))?;
        if !value.is_nil() {
            if let Some(hook) = def.encode_hook(addressable) {
                let bytes = hook(value).map_err(|source| EncodeError::Custom {
                    type_name: name.to_owned(),
                    source,
                })?;
                if validate(&bytes, self.config.max_depth).is_err() {
                    return Err(EncodeError::InvalidCustomOutput(name.to_owned()));
                }
                self.out.extend_from_slice(&bytes);
                return Ok(());
            }
        }
        self.write_any(value, &def.shape, addressable, depth + 1)
    }

    fn write_held(&mut self, held: &Held, shape: &Shape, depth: usize) -> Result<(), EncodeError> {
        let tag = self
            .registry
            .tag_for(&held.type_name)
            .ok_or_else(|| EncodeError::UnregisteredType(held.type_name.clone()))?;
        if let Shape::Interface(interface) = shape {
            let implements = self
                .registry
                .lookup(&held.type_name)
                .is_some_and(|def| def.implements(interface));
            if !implements {
                return Err(EncodeError::NotImplemented {
                    type_name: held.type_name.clone(),
                    interface: interface.clone(),
                });
            }
        }
        if held.by_ref && held.value.is_nil() {
            self.out.extend_from_slice(b"null");
            return Ok(());
        }
        tracing::trace!(%tag, type_name = %held.type_name, "wrapping interface value");
        self.out.extend_from_slice(b"{\"type\":");
        write_str(&mut self.out, &tag, self.config.escape_html);
        self.out.extend_from_slice(b",\"value\":");
        self.write_named(&held.type_name, &held.value, held.by_ref, depth + 1)?;
        self.out.push(b'}');
        Ok(())
    }

    fn write_struct(
        &mut self,
        st: &StructShape,
        fields: &[Value],
        addressable: bool,
        depth: usize,
    ) -> Result<(), EncodeError> {
        check_len(st.fields.len(), fields.len())?;
        self.out.push(b'{');
        let mut first = true;
        for (field, value) in st.fields.iter().zip(fields) {
            if field.skip || (field.omit_empty && self.is_empty(value, &field.shape, depth)) {
                continue;
            }
            if !first {
                self.out.push(b',');
            }
            first = false;
            write_str(&mut self.out, field.json_name(), self.config.escape_html);
            self.out.push(b':');
            self.write_any(value, &field.shape, addressable, depth + 1)?;
        }
        self.out.push(b'}');
        Ok(())
    }

    fn write_arr(
        &mut self,
        items: &[Value],
        elem: &Shape,
        addressable: bool,
        depth: usize,
    ) -> Result<(), EncodeError> {
        self.out.push(b'[');
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.out.push(b',');
            }
            self.write_any(item, elem, addressable, depth + 1)?;
        }
        self.out.push(b']');
        Ok(())
    }

    fn write_base64(&mut self, bytes: &[u8]) {
        self.out.push(b'"');
        self.out.extend_from_slice(STANDARD.encode(bytes).as_bytes());
        self.out.push(b'"');
    }

    fn write_num(
        &mut self,
        format: NumFormat,
        value: &Value,
        shape: &Shape,
    ) -> Result<(), EncodeError> {
        let text = if format.is_float() {
            let Value::Float(f) = value else {
                return Err(mismatch(shape, value));
            };
            format_float(*f, format == NumFormat::F32)
                .ok_or_else(|| EncodeError::UnsupportedValue(f.to_string()))?
        } else if format.is_unsigned() {
            let n = match value {
                Value::Uint(u) => *u,
                Value::Int(i) => u64::try_from(*i).map_err(|_| out_of_range(format, i))?,
                _ => return Err(mismatch(shape, value)),
            };
            if n > format.unsigned_max() {
                return Err(out_of_range(format, &n));
            }
            n.to_string()
        } else {
            let n = match value {
                Value::Int(i) => *i,
                Value::Uint(u) => i64::try_from(*u).map_err(|_| out_of_range(format, u))?,
                _ => return Err(mismatch(shape, value)),
            };
            let (min, max) = format.signed_range();
            if n < min || n > max {
                return Err(out_of_range(format, &n));
            }
            n.to_string()
        };
        if format.is_wide() {
            self.out.push(b'"');
            self.out.extend_from_slice(text.as_bytes());
            self.out.push(b'"');
        } else {
            self.out.extend_from_slice(text.as_bytes());
        }
        Ok(())
    }

    /// Emptiness test for omit-if-empty fields.
    fn is_empty(&self, value: &Value, shape: &Shape, depth: usize) -> bool {
        if depth > self.config.max_depth {
            return false;
        }
        match (value, shape) {
            (_, Shape::Named(name)) => match self.registry.lookup(name) {
                Some(def) => self.is_empty(value, &def.shape, depth + 1),
                None => value.is_nil(),
            },
            // A non-nil pointer is never empty, whatever it points at.
            (_, Shape::Ptr(_)) if !value.is_nil() => false,
            (Value::Nil, _) => true,
            (Value::Bool(b), _) => !b,
            (Value::Int(i), _) => *i == 0,
            (Value::Uint(u), _) => *u == 0,
            (Value::Float(f), _) => *f == 0.0,
            (Value::Str(s), _) => s.is_empty(),
            (Value::Bytes(b), _) => b.is_empty(),
            (Value::Time(t), _) => *t == ZERO_TIME,
            (Value::Seq(items), Shape::Array(_, elem)) => {
                items.iter().all(|item| self.is_empty(item, elem, depth + 1))
            }
            (Value::Seq(items), _) => items.is_empty(),
            (Value::Map(entries), _) => entries.is_empty(),
            (Value::Struct(fields), Shape::Struct(st)) => st
                .fields
                .iter()
                .zip(fields)
                .all(|(field, item)| self.is_empty(item, &field.shape, depth + 1)),
            (Value::Struct(fields), _) => fields.is_empty(),
            (Value::Held(_), _) => false,
        }
    }
}

fn mismatch(shape: &Shape, value: &Value) -> EncodeError {
    EncodeError::ShapeMismatch {
        expected: shape.kind(),
        found: value.kind(),
    }
}

fn out_of_range(format: NumFormat, value: &dyn std::fmt::Display) -> EncodeError {
    EncodeError::OutOfRange {
        format: format.as_str(),
        value: value.to_string(),
    }
}

fn check_len(expected: usize, actual: usize) -> Result<(), EncodeError> {
    if expected == actual {
        Ok(())
    } else {
        Err(EncodeError::LengthMismatch { expected, actual })
    }
}
