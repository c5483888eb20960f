//! Shape-driven decoder over a validated JSON document.

use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::config::CodecConfig;
use crate::error::DecodeError;
use crate::json::{validate, Scanner, Token};
use crate::registry::{Form, Registry};
use crate::shape::{NumFormat, Shape, StructShape};
use crate::timestamp::{self, ZERO_TIME};
use crate::value::{Held, Value};

pub(crate) struct CanonicalDecoder<'a, 'c> {
    scan: Scanner<'a>,
    registry: &'c Registry,
    config: &'c CodecConfig,
}

impl<'a, 'c> CanonicalDecoder<'a, 'c> {
    pub fn new(data: &'a [u8], registry: &'c Registry, config: &'c CodecConfig) -> Self {
        Self {
            scan: Scanner::new(data),
            registry,
            config,
        }
    }

    /// Decodes the whole document against `shape`.
    ///
    /// Syntax is checked up front so that malformed input is reported as
    /// such even when it would also mismatch the shape.
    pub fn decode(mut self, shape: &Shape) -> Result<Value, DecodeError> {
        validate(self.scan.data, self.config.max_depth)?;

        let (inner, _) = shape.deref();
        let Shape::Named(name) = inner else {
            return self.read_any(shape, 0);
        };
        let Some(expected) = self.registry.tag_for(name) else {
            return self.read_any(shape, 0);
        };
        match self.scan.token() {
            Some(Token::Object) => {
                let (found, held) = self.read_envelope(&Shape::Any, 0)?;
                if held.type_name != *name {
                    return Err(DecodeError::UnexpectedType { expected, found });
                }
                Ok(held.value)
            }
            Some(Token::Null) => self.read_any(shape, 0),
            Some(token) => Err(self.mismatch("object", token)),
            None => Err(self.scan.err("unexpected end of input")),
        }
    }

    fn read_any(&mut self, shape: &Shape, depth: usize) -> Result<Value, DecodeError> {
        if depth > self.config.max_depth {
            return Err(DecodeError::DepthLimit(self.config.max_depth));
        }
        match shape {
            Shape::Opaque(kind) => return Err(DecodeError::UnsupportedShape(kind.as_str())),
            Shape::Named(name) => return self.read_named(name, depth),
            _ => {}
        }
        let token = self
            .scan
            .token()
            .ok_or_else(|| self.scan.err("unexpected end of input"))?;
        if token == Token::Null {
            self.scan.read_literal(b"null")?;
            return self.zero_value(shape, &mut Vec::new());
        }

        match (shape, token) {
            (Shape::Bool, Token::Bool) => Ok(Value::Bool(self.scan.read_bool()?)),
            (Shape::Num(format), _) => self.read_num(*format, token),
            (Shape::Str, Token::String) => Ok(Value::Str(self.scan.read_str()?)),
            (Shape::Bytes, Token::String) => Ok(Value::Bytes(self.read_base64()?)),
            (Shape::ByteArray(len), Token::String) => {
                let bytes = self.read_base64()?;
                check_len(*len, bytes.len())?;
                Ok(Value::Bytes(bytes))
            }
            (Shape::Time, Token::String) => {
                let text = self.scan.read_str()?;
                match timestamp::parse(&text) {
                    Ok(t) => Ok(Value::Time(t)),
                    Err(reason) => Err(DecodeError::InvalidTimestamp { text, reason }),
                }
            }
            (Shape::Ptr(inner), _) => self.read_any(inner, depth + 1),
            (Shape::Seq(elem), Token::Array) => Ok(Value::Seq(self.read_arr(elem, depth)?)),
            (Shape::Array(len, elem), Token::Array) => {
                let items = self.read_arr(elem, depth)?;
                check_len(*len, items.len())?;
                Ok(Value::Seq(items))
            }
            (Shape::Map(elem), Token::Object) => {
                let mut entries = BTreeMap::new();
                self.read_obj(|dec, key| {
                    let item = dec.read_any(elem, depth + 1)?;
                    entries.insert(key, item);
                    Ok(())
                })?;
                Ok(Value::Map(entries))
            }
            (Shape::Struct(st), Token::Object) => self.read_struct(st, depth),
            (Shape::Interface(_) | Shape::Any, Token::Object) => {
                let (_, held) = self.read_envelope(shape, depth)?;
                Ok(Value::Held(Box::new(held)))
            }
            _ => Err(self.mismatch(shape.kind(), token)),
        }
    }

    fn read_named(&mut self, name: &str, depth: usize) -> Result<Value, DecodeError> {
        if depth > self.config.max_depth {
            return Err(DecodeError::DepthLimit(self.config.max_depth));
        }
        let def = self
            .registry
            .lookup(name)
            .ok_or_else(|| DecodeError::UnknownType(name.to_owned()))?;
        if let Some(hook) = def.decode_hook() {
            self.scan.skip_ws();
            let start = self.scan.x;
            self.scan.skip_value(depth, self.config.max_depth)?;
            let data: &'a [u8] = self.scan.data;
            return hook(&data[start..self.scan.x]).map_err(|source| DecodeError::Custom {
                type_name: name.to_owned(),
                source,
            });
        }
        self.read_any(&def.shape, depth + 1)
    }

    /// Reads `{"type":<tag>,"value":<inner>}` with the keys in either order.
    fn read_envelope(&mut self, shape: &Shape, depth: usize) -> Result<(String, Held), DecodeError> {
        let mut tag: Option<String> = None;
        let mut value_at: Option<usize> = None;
        let max_depth = self.config.max_depth;
        self.read_obj(|dec, key| {
            match key.as_str() {
                "type" => {
                    if dec.scan.token() != Some(Token::String) {
                        return Err(DecodeError::InvalidEnvelope("`type` must be a string"));
                    }
                    tag = Some(dec.scan.read_str()?);
                }
                "value" => {
                    dec.scan.skip_ws();
                    value_at = Some(dec.scan.x);
                    dec.scan.skip_value(depth + 1, max_depth)?;
                }
                _ => dec.scan.skip_value(depth + 1, max_depth)?,
            }
            Ok(())
        })?;
        let end = self.scan.x;

        let tag = tag
            .filter(|t| !t.is_empty())
            .ok_or(DecodeError::InvalidEnvelope("missing `type`"))?;
        let value_at = value_at.ok_or(DecodeError::InvalidEnvelope("missing `value`"))?;
        let def = self
            .registry
            .type_for(&tag)
            .ok_or_else(|| DecodeError::UnregisteredType(tag.clone()))?;
        if let Shape::Interface(interface) = shape {
            if !def.implements(interface) {
                return Err(DecodeError::NotImplemented {
                    type_name: def.name.clone(),
                    interface: interface.clone(),
                });
            }
        }
        let by_ref = self.registry.form_of(&tag) == Some(Form::Pointer);

        self.scan.x = value_at;
        let value = if by_ref && self.scan.token() == Some(Token::Null) {
            Value::Nil
        } else {
            self.read_named(&def.name, depth + 1)?
        };
        self.scan.x = end;
        tracing::trace!(%tag, type_name = %def.name, "unwrapped interface value");

        let held = Held {
            type_name: def.name.clone(),
            by_ref,
            value,
        };
        Ok((tag, held))
    }

    fn read_struct(&mut self, st: &StructShape, depth: usize) -> Result<Value, DecodeError> {
        let mut slots: Vec<Option<Value>> = vec![None; st.fields.len()];
        let max_depth = self.config.max_depth;
        self.read_obj(|dec, key| {
            match st.position(&key) {
                Some(i) => slots[i] = Some(dec.read_any(&st.fields[i].shape, depth + 1)?),
                None => dec.scan.skip_value(depth + 1, max_depth)?,
            }
            Ok(())
        })?;

        let mut visiting = Vec::new();
        let mut fields = Vec::with_capacity(slots.len());
        for (slot, field) in slots.into_iter().zip(&st.fields) {
            fields.push(match slot {
                Some(value) => value,
                None => self.zero_value(&field.shape, &mut visiting)?,
            });
        }
        Ok(Value::Struct(fields))
    }

    fn read_arr(&mut self, elem: &Shape, depth: usize) -> Result<Vec<Value>, DecodeError> {
        let mut items = Vec::new();
        self.scan.expect(b'[', "expected '['")?;
        if self.scan.eat(b']') {
            return Ok(items);
        }
        loop {
            items.push(self.read_any(elem, depth + 1)?);
            if self.scan.eat(b',') {
                continue;
            }
            self.scan.expect(b']', "expected ',' or ']'")?;
            return Ok(items);
        }
    }

    /// Walks an object, handing each key to `on_entry` with the cursor on
    /// its value.
    fn read_obj<F>(&mut self, mut on_entry: F) -> Result<(), DecodeError>
    where
        F: FnMut(&mut Self, String) -> Result<(), DecodeError>,
    {
        self.scan.expect(b'{', "expected '{'")?;
        if self.scan.eat(b'}') {
            return Ok(());
        }
        loop {
            self.scan.skip_ws();
            let key = self.scan.read_str()?;
            self.scan.expect(b':', "expected ':'")?;
            on_entry(self, key)?;
            if self.scan.eat(b',') {
                continue;
            }
            return self.scan.expect(b'}', "expected ',' or '}'");
        }
    }

    fn read_num(&mut self, format: NumFormat, token: Token) -> Result<Value, DecodeError> {
        let offset = self.scan.x;
        if format.is_wide() {
            if token != Token::String {
                return Err(self.mismatch(format.as_str(), token));
            }
            let text = self.scan.read_str()?;
            return parse_wide(format, text, offset);
        }
        if token != Token::Number {
            return Err(self.mismatch(format.as_str(), token));
        }
        let number = self.scan.read_number()?;
        let out_of_range = || DecodeError::OutOfRange {
            format: format.as_str(),
            text: number.text.to_owned(),
            offset,
        };
        if format.is_float() {
            let parsed = if format == NumFormat::F32 {
                number.text.parse::<f32>().map(f64::from)
            } else {
                number.text.parse::<f64>()
            };
            let f = parsed.map_err(|_| out_of_range())?;
            return if f.is_finite() {
                Ok(Value::Float(f))
            } else {
                Err(out_of_range())
            };
        }
        if !number.integral {
            return Err(DecodeError::ShapeMismatch {
                expected: format.as_str(),
                found: "fractional number",
                offset,
            });
        }
        if format.is_unsigned() {
            let n = number.text.parse::<u64>().map_err(|_| out_of_range())?;
            if n > format.unsigned_max() {
                return Err(out_of_range());
            }
            Ok(Value::Uint(n))
        } else {
            let n = number.text.parse::<i64>().map_err(|_| out_of_range())?;
            let (min, max) = format.signed_range();
            if n < min || n > max {
                return Err(out_of_range());
            }
            Ok(Value::Int(n))
        }
    }

    fn read_base64(&mut self) -> Result<Vec<u8>, DecodeError> {
        let offset = self.scan.x;
        let text = self.scan.read_str()?;
        STANDARD
            .decode(text.as_bytes())
            .map_err(|source| DecodeError::InvalidBase64 { offset, source })
    }

    /// Value produced for `null` or a missing struct field.
    fn zero_value(&self, shape: &Shape, visiting: &mut Vec<String>) -> Result<Value, DecodeError> {
        Ok(match shape {
            Shape::Bool => Value::Bool(false),
            Shape::Num(f) if f.is_float() => Value::Float(0.0),
            Shape::Num(f) if f.is_unsigned() => Value::Uint(0),
            Shape::Num(_) => Value::Int(0),
            Shape::Str => Value::Str(String::new()),
            Shape::ByteArray(len) => Value::Bytes(vec![0; *len]),
            Shape::Time => Value::Time(ZERO_TIME),
            Shape::Array(len, elem) => {
                let mut items = Vec::with_capacity(*len);
                for _ in 0..*len {
                    items.push(self.zero_value(elem, visiting)?);
                }
                Value::Seq(items)
            }
            Shape::Struct(st) => {
                let mut fields = Vec::with_capacity(st.fields.len());
                for field in &st.fields {
                    fields.push(self.zero_value(&field.shape, visiting)?);
                }
                Value::Struct(fields)
            }
            Shape::Named(name) => {
                if visiting.iter().any(|v| v == name) {
                    return Err(DecodeError::RecursiveType(name.clone()));
                }
                let def = self
                    .registry
                    .lookup(name)
                    .ok_or_else(|| DecodeError::UnknownType(name.clone()))?;
                visiting.push(name.clone());
                let zero = self.zero_value(&def.shape, visiting)?;
                visiting.pop();
                zero
            }
            Shape::Bytes
            | Shape::Ptr(_)
            | Shape::Seq(_)
            | Shape::Map(_)
            | Shape::Interface(_)
            | Shape::Any
            | Shape::Opaque(_) => Value::Nil,
        })
    }

    fn mismatch(&self, expected: &'static str, token: Token) -> DecodeError {
        DecodeError::ShapeMismatch {
            expected,
            found: token.as_str(),
            offset: self.scan.x,
        }
    }
}

/// Parses a quoted 64-bit integer body, which must match `-?[0-9]+`.
fn parse_wide(format: NumFormat, text: String, offset: usize) -> Result<Value, DecodeError> {
    let digits = text.strip_prefix('-').unwrap_or(&text);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(DecodeError::InvalidInteger { text, offset });
    }
    let negative = digits.len() != text.len();
    let parsed = if format.is_unsigned() {
        if negative {
            digits
                .bytes()
                .all(|b| b == b'0')
                .then_some(Value::Uint(0))
        } else {
            text.parse::<u64>().ok().map(Value::Uint)
        }
    } else {
        text.parse::<i64>().ok().map(Value::Int)
    };
    parsed.ok_or_else(|| DecodeError::OutOfRange {
        format: format.as_str(),
        text,
        offset,
    })
}

fn check_len(expected: usize, actual: usize) -> Result<(), DecodeError> {
    if expected == actual {
        Ok(())
    } else {
        Err(DecodeError::LengthMismatch { expected, actual })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(doc: &str, shape: &Shape) -> Result<Value, DecodeError> {
        let registry = Registry::new();
        let config = CodecConfig::default();
        CanonicalDecoder::new(doc.as_bytes(), &registry, &config).decode(shape)
    }

    #[test]
    fn wide_integers_must_be_quoted_digits() {
        assert_eq!(decode("\"-64\"", &Shape::i64()).unwrap(), Value::Int(-64));
        assert_eq!(
            decode("\"18446744073709551615\"", &Shape::u64()).unwrap(),
            Value::Uint(u64::MAX)
        );
        assert!(matches!(
            decode("64", &Shape::i64()),
            Err(DecodeError::ShapeMismatch { .. })
        ));
        assert!(matches!(
            decode("\"6.4\"", &Shape::i64()),
            Err(DecodeError::InvalidInteger { .. })
        ));
        assert!(matches!(
            decode("\"-\"", &Shape::i64()),
            Err(DecodeError::InvalidInteger { .. })
        ));
        assert!(matches!(
            decode("\"9223372036854775808\"", &Shape::i64()),
            Err(DecodeError::OutOfRange { .. })
        ));
        assert!(matches!(
            decode("\"-1\"", &Shape::u64()),
            Err(DecodeError::OutOfRange { .. })
        ));
    }

    #[test]
    fn narrow_integers_must_be_integral_and_in_range() {
        assert_eq!(decode("-128", &Shape::i8()).unwrap(), Value::Int(-128));
        assert!(matches!(
            decode("128", &Shape::i8()),
            Err(DecodeError::OutOfRange { .. })
        ));
        assert!(matches!(
            decode("1.5", &Shape::i32()),
            Err(DecodeError::ShapeMismatch { .. })
        ));
        assert!(matches!(
            decode("-1", &Shape::u32()),
            Err(DecodeError::OutOfRange { .. })
        ));
    }

    #[test]
    fn floats_reject_overflow() {
        assert_eq!(decode("1e2", &Shape::f64()).unwrap(), Value::Float(100.0));
        assert!(matches!(
            decode("1e400", &Shape::f64()),
            Err(DecodeError::OutOfRange { .. })
        ));
        assert!(matches!(
            decode("1e39", &Shape::f32()),
            Err(DecodeError::OutOfRange { .. })
        ));
    }

    #[test]
    fn null_yields_zero_values() {
        assert_eq!(decode("null", &Shape::Str).unwrap(), Value::Str(String::new()));
        assert_eq!(decode("null", &Shape::seq(Shape::Bool)).unwrap(), Value::Nil);
        assert_eq!(
            decode("null", &Shape::ByteArray(2)).unwrap(),
            Value::Bytes(vec![0, 0])
        );
        assert_eq!(decode("null", &Shape::Time).unwrap(), Value::Time(ZERO_TIME));
    }

    #[test]
    fn malformed_wins_over_mismatch() {
        assert!(matches!(
            decode("[1,", &Shape::Str),
            Err(DecodeError::Malformed { .. })
        ));
    }

    #[test]
    fn mismatch_reports_offset() {
        let err = decode("  [1]", &Shape::Str).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::ShapeMismatch {
                expected: "string",
                found: "array",
                offset: 2
            }
        ));
    }

    #[test]
    fn recursive_definition_is_rejected() {
        let registry = Registry::new();
        registry
            .define(crate::TypeDef::new(
                "Node",
                Shape::structure(vec![crate::Field::new("Next", Shape::named("Node"))]),
            ))
            .unwrap();
        let config = CodecConfig::default();
        let err = CanonicalDecoder::new(b"{}", &registry, &config)
            .decode(&Shape::named("Node"))
            .unwrap_err();
        assert!(matches!(err, DecodeError::RecursiveType(name) if name == "Node"));
    }
}
