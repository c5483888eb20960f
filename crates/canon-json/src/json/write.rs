//! Canonical JSON text output primitives.

const HEX: &[u8; 16] = b"0123456789abcdef";

/// Writes `s` as a quoted JSON string.
///
/// Control characters, `"` and `\` are always escaped; with `escape_html`
/// so are `<`, `>` and `&`. U+2028 and U+2029 are always escaped.
pub fn write_str(out: &mut Vec<u8>, s: &str, escape_html: bool) {
    let bytes = s.as_bytes();
    out.push(b'"');
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if b < 0x80 {
            let needs_escape = b < 0x20
                || b == b'"'
                || b == b'\\'
                || (escape_html && matches!(b, b'<' | b'>' | b'&'));
            if !needs_escape {
                i += 1;
                continue;
            }
            out.extend_from_slice(&bytes[start..i]);
            match b {
                b'"' => out.extend_from_slice(b"\\\""),
                b'\\' => out.extend_from_slice(b"\\\\"),
                b'\n' => out.extend_from_slice(b"\\n"),
                b'\r' => out.extend_from_slice(b"\\r"),
                b'\t' => out.extend_from_slice(b"\\t"),
                0x08 => out.extend_from_slice(b"\\b"),
                0x0c => out.extend_from_slice(b"\\f"),
                _ => {
                    out.extend_from_slice(b"\\u00");
                    out.push(HEX[(b >> 4) as usize]);
                    out.push(HEX[(b & 0x0f) as usize]);
                }
            }
            i += 1;
            start = i;
            continue;
        }
        // U+2028 / U+2029 encode as E2 80 A8 / E2 80 A9.
        if b == 0xe2 && i + 2 < bytes.len() && bytes[i + 1] == 0x80 && bytes[i + 2] & 0xfe == 0xa8
        {
            out.extend_from_slice(&bytes[start..i]);
            out.extend_from_slice(b"\\u202");
            out.push(HEX[(bytes[i + 2] & 0x0f) as usize]);
            i += 3;
            start = i;
            continue;
        }
        i += 1;
    }
    out.extend_from_slice(&bytes[start..]);
    out.push(b'"');
}

/// Shortest round-trip rendering of a float, `None` for NaN and infinities.
///
/// Magnitudes below 1e-6 or from 1e21 up use exponent form (`1e+21`,
/// `1e-7`). `single` formats at 32-bit precision.
pub fn format_float(f: f64, single: bool) -> Option<String> {
    if !f.is_finite() {
        return None;
    }
    let abs = f.abs();
    let exponent = abs != 0.0
        && if single {
            let a = abs as f32;
            a < 1e-6 || a >= 1e21
        } else {
            abs < 1e-6 || abs >= 1e21
        };
    let text = match (single, exponent) {
        (true, false) => format!("{}", f as f32),
        (true, true) => format!("{:e}", f as f32),
        (false, false) => format!("{}", f),
        (false, true) => format!("{:e}", f),
    };
    if !exponent {
        return Some(text);
    }
    match text.find('e') {
        Some(pos) if text.as_bytes().get(pos + 1) != Some(&b'-') => {
            Some(format!("{}e+{}", &text[..pos], &text[pos + 1..]))
        }
        _ => Some(text),
    }
}
