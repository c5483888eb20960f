//! Codec configuration.

/// Default nesting limit for both encoding and decoding.
pub const DEFAULT_MAX_DEPTH: usize = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecConfig {
    /// Maximum nesting depth of values and documents.
    pub max_depth: usize,
    /// Escape `<`, `>` and `&` in strings as `\u003c`, `\u003e`, `\u0026`.
    pub escape_html: bool,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl CodecConfig {
    pub fn new() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            escape_html: true,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_escape_html(mut self, escape_html: bool) -> Self {
        self.escape_html = escape_html;
        self
    }
}
