//! Cursor-based JSON scanner used for validation and token reads.

use crate::error::DecodeError;

/// JSON token kind, identified by its first byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    Null,
    Bool,
    Number,
    String,
    Array,
    Object,
}

impl Token {
    pub fn as_str(self) -> &'static str {
        match self {
            Token::Null => "null",
            Token::Bool => "boolean",
            Token::Number => "number",
            Token::String => "string",
            Token::Array => "array",
            Token::Object => "object",
        }
    }
}

/// A validated number literal.
#[derive(Debug, Clone, Copy)]
pub struct Number<'a> {
    pub text: &'a str,
    /// No fraction and no exponent.
    pub integral: bool,
}

pub struct Scanner<'a> {
    pub data: &'a [u8],
    /// Cursor position.
    pub x: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, x: 0 }
    }

    pub fn err(&self, reason: &'static str) -> DecodeError {
        DecodeError::Malformed {
            offset: self.x,
            reason,
        }
    }

    pub fn skip_ws(&mut self) {
        while let Some(b' ' | b'\t' | b'\n' | b'\r') = self.data.get(self.x) {
            self.x += 1;
        }
    }

    pub fn peek(&self) -> Option<u8> {
        self.data.get(self.x).copied()
    }

    pub fn at_end(&self) -> bool {
        self.x >= self.data.len()
    }

    /// Skips whitespace and classifies the next value.
    pub fn token(&mut self) -> Option<Token> {
        self.skip_ws();
        Some(match self.peek()? {
            b'n' => Token::Null,
            b't' | b'f' => Token::Bool,
            b'"' => Token::String,
            b'[' => Token::Array,
            b'{' => Token::Object,
            _ => Token::Number,
        })
    }

    /// Skips whitespace and consumes `b` if it is next.
    pub fn eat(&mut self, b: u8) -> bool {
        self.skip_ws();
        if self.peek() == Some(b) {
            self.x += 1;
            true
        } else {
            false
        }
    }

    pub fn expect(&mut self, b: u8, reason: &'static str) -> Result<(), DecodeError> {
        if self.eat(b) {
            Ok(())
        } else {
            Err(self.err(reason))
        }
    }

    pub fn read_literal(&mut self, lit: &[u8]) -> Result<(), DecodeError> {
        if self.data[self.x..].starts_with(lit) {
            self.x += lit.len();
            Ok(())
        } else {
            Err(self.err("invalid literal"))
        }
    }

    /// Reads `true` or `false`.
    pub fn read_bool(&mut self) -> Result<bool, DecodeError> {
        match self.peek() {
            Some(b't') => self.read_literal(b"true").map(|_| true),
            Some(b'f') => self.read_literal(b"false").map(|_| false),
            _ => Err(self.err("invalid literal")),
        }
    }

    /// Reads a quoted string at the cursor, resolving escapes.
    pub fn read_str(&mut self) -> Result<String, DecodeError> {
        let open = self.x;
        if self.peek() != Some(b'"') {
            return Err(self.err("expected string"));
        }
        self.x += 1;
        let mut out: Vec<u8> = Vec::new();
        loop {
            let start = self.x;
            while let Some(&c) = self.data.get(self.x) {
                if c == b'"' || c == b'\\' || c < 0x20 {
                    break;
                }
                self.x += 1;
            }
            out.extend_from_slice(&self.data[start..self.x]);
            match self.peek() {
                None => return Err(self.err("unterminated string")),
                Some(b'"') => {
                    self.x += 1;
                    break;
                }
                Some(b'\\') => {
                    self.x += 1;
                    self.read_escape(&mut out)?;
                }
                Some(_) => return Err(self.err("control character in string")),
            }
        }
        String::from_utf8(out).map_err(|_| DecodeError::Malformed {
            offset: open,
            reason: "invalid UTF-8 in string",
        })
    }

    fn read_escape(&mut self, out: &mut Vec<u8>) -> Result<(), DecodeError> {
        let Some(c) = self.peek() else {
            return Err(self.err("unterminated escape"));
        };
        self.x += 1;
        let simple = match c {
            b'"' => b'"',
            b'\\' => b'\\',
            b'/' => b'/',
            b'b' => 0x08,
            b'f' => 0x0c,
            b'n' => b'\n',
            b'r' => b'\r',
            b't' => b'\t',
            b'u' => {
                let ch = self.read_unicode_escape()?;
                let mut buf = [0u8; 4];
                out.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
                return Ok(());
            }
            _ => return Err(self.err("invalid escape")),
        };
        out.push(simple);
        Ok(())
    }

    /// Reads the hex part of a unicode escape, joining surrogate pairs.
    fn read_unicode_escape(&mut self) -> Result<char, DecodeError> {
        let hi = self.read_hex4()?;
        let code = match hi {
            0xd800..=0xdbff => {
                if !self.data[self.x..].starts_with(b"\\u") {
                    return Err(self.err("unpaired surrogate"));
                }
                self.x += 2;
                let lo = self.read_hex4()?;
                if !(0xdc00..=0xdfff).contains(&lo) {
                    return Err(self.err("unpaired surrogate"));
                }
                0x10000 + ((hi - 0xd800) << 10) + (lo - 0xdc00)
            }
            0xdc00..=0xdfff => return Err(self.err("unpaired surrogate")),
            _ => hi,
        };
        char::from_u32(code).ok_or_else(|| self.err("invalid code point"))
    }

    fn read_hex4(&mut self) -> Result<u32, DecodeError> {
        let Some(digits) = self.data.get(self.x..self.x + 4) else {
            return Err(self.err("truncated unicode escape"));
        };
        let mut code = 0u32;
        for &d in digits {
            let v = match d {
                b'0'..=b'9' => d - b'0',
                b'a'..=b'f' => d - b'a' + 10,
                b'A'..=b'F' => d - b'A' + 10,
                _ => return Err(self.err("invalid unicode escape")),
            };
            code = (code << 4) | v as u32;
        }
        self.x += 4;
        Ok(code)
    }

    /// Reads a number literal following RFC 8259 grammar.
    pub fn read_number(&mut self) -> Result<Number<'a>, DecodeError> {
        let start = self.x;
        let mut integral = true;
        if self.peek() == Some(b'-') {
            self.x += 1;
        }
        match self.peek() {
            Some(b'0') => self.x += 1,
            Some(b'1'..=b'9') => self.skip_digits(),
            _ => return Err(self.err("invalid number")),
        }
        if self.peek() == Some(b'.') {
            integral = false;
            self.x += 1;
            if !matches!(self.peek(), Some(b'0'..=b'9')) {
                return Err(self.err("expected digit after decimal point"));
            }
            self.skip_digits();
        }
        if let Some(b'e' | b'E') = self.peek() {
            integral = false;
            self.x += 1;
            if let Some(b'+' | b'-') = self.peek() {
                self.x += 1;
            }
            if !matches!(self.peek(), Some(b'0'..=b'9')) {
                return Err(self.err("expected digit in exponent"));
            }
            self.skip_digits();
        }
        let data: &'a [u8] = self.data;
        let text =
            std::str::from_utf8(&data[start..self.x]).map_err(|_| self.err("invalid number"))?;
        Ok(Number { text, integral })
    }

    fn skip_digits(&mut self) {
        while let Some(b'0'..=b'9') = self.peek() {
            self.x += 1;
        }
    }

    /// Skips one value, validating its syntax. `depth` is the nesting level
    /// of the value being skipped.
    pub fn skip_value(&mut self, depth: usize, max_depth: usize) -> Result<(), DecodeError> {
        self.skip_ws();
        match self.peek() {
            None => Err(self.err("unexpected end of input")),
            Some(b'n') => self.read_literal(b"null"),
            Some(b't' | b'f') => self.read_bool().map(drop),
            Some(b'"') => self.read_str().map(drop),
            Some(b'-' | b'0'..=b'9') => self.read_number().map(drop),
            Some(b'[') => {
                if depth >= max_depth {
                    return Err(DecodeError::DepthLimit(max_depth));
                }
                self.x += 1;
                if self.eat(b']') {
                    return Ok(());
                }
                loop {
                    self.skip_value(depth + 1, max_depth)?;
                    if self.eat(b',') {
                        continue;
                    }
                    return self.expect(b']', "expected ',' or ']'");
                }
            }
            Some(b'{') => {
                if depth >= max_depth {
                    return Err(DecodeError::DepthLimit(max_depth));
                }
                self.x += 1;
                if self.eat(b'}') {
                    return Ok(());
                }
                loop {
                    self.skip_ws();
                    self.read_str()?;
                    self.expect(b':', "expected ':'")?;
                    self.skip_value(depth + 1, max_depth)?;
                    if self.eat(b',') {
                        continue;
                    }
                    return self.expect(b'}', "expected ',' or '}'");
                }
            }
            Some(_) => Err(self.err("unexpected character")),
        }
    }
}

/// Checks that `data` holds exactly one JSON value, optionally surrounded by
/// whitespace.
pub fn validate(data: &[u8], max_depth: usize) -> Result<(), DecodeError> {
    let mut scan = Scanner::new(data);
    scan.skip_value(0, max_depth)?;
    scan.skip_ws();
    if scan.at_end() {
        Ok(())
    } else {
        Err(scan.err("trailing characters after value"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offset_of(err: DecodeError) -> usize {
        match err {
            DecodeError::Malformed { offset, .. } => offset,
            other => panic!("expected malformed error, got {other:?}"),
        }
    }

    #[test]
    fn validate_accepts_documents() {
        for doc in [
            "null",
            " true ",
            "-0.5e+3",
            "\"x\"",
            "[]",
            "{}",
            "[1, [2, {\"a\": null}], \"s\"]",
            "{\"a\":{\"b\":[true,false]}}\n",
        ] {
            assert!(validate(doc.as_bytes(), 16).is_ok(), "{doc}");
        }
    }

    #[test]
    fn validate_rejects_malformed() {
        for doc in [
            "", "{", "[1,]", "{\"a\" 1}", "01", "1.", "-", "tru", "\"abc", "[1] 2", "{1:2}",
            "\"\t\"", "+1", ".5",
        ] {
            assert!(
                matches!(validate(doc.as_bytes(), 16), Err(DecodeError::Malformed { .. })),
                "{doc}"
            );
        }
    }

    #[test]
    fn trailing_garbage_offset() {
        assert_eq!(offset_of(validate(b"[1] x", 16).unwrap_err()), 4);
    }

    #[test]
    fn depth_limit() {
        assert!(validate(b"[[[]]]", 3).is_ok());
        assert!(matches!(
            validate(b"[[[[]]]]", 3),
            Err(DecodeError::DepthLimit(3))
        ));
    }

    #[test]
    fn read_str_resolves_escapes() {
        let bs = "\\";
        let doc = format!("\"a{bs}n{bs}\"{bs}{bs}{bs}/{bs}u00e9{bs}ud83c{bs}udf89\"");
        let mut scan = Scanner::new(doc.as_bytes());
        assert_eq!(scan.read_str().unwrap(), "a\n\"\\/é🎉");
        assert!(scan.at_end());
    }

    #[test]
    fn read_str_rejects_lone_surrogate() {
        let doc = format!("\"{}ud83c\"", "\\");
        let mut scan = Scanner::new(doc.as_bytes());
        assert!(scan.read_str().is_err());
    }

    #[test]
    fn read_str_rejects_invalid_utf8() {
        let mut scan = Scanner::new(b"\"\xff\"");
        assert!(scan.read_str().is_err());
    }

    #[test]
    fn number_integrality() {
        let mut scan = Scanner::new(b"-12");
        assert!(scan.read_number().unwrap().integral);
        let mut scan = Scanner::new(b"1e2");
        let n = scan.read_number().unwrap();
        assert!(!n.integral);
        assert_eq!(n.text, "1e2");
    }
}
