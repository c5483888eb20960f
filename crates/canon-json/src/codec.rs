//! Entry points tying the registry, configuration and codec passes together.

use crate::config::CodecConfig;
use crate::decoder::CanonicalDecoder;
use crate::encoder::CanonicalEncoder;
use crate::error::{DecodeError, EncodeError};
use crate::registry::Registry;
use crate::shape::Shape;
use crate::value::Value;

/// Canonical JSON codec bound to a [`Registry`].
///
/// Cloning is cheap; clones share the registry.
#[derive(Debug, Clone)]
pub struct Codec {
    registry: Registry,
    config: CodecConfig,
}

impl Codec {
    pub fn new(registry: Registry) -> Self {
        Self {
            registry,
            config: CodecConfig::default(),
        }
    }

    pub fn with_config(registry: Registry, config: CodecConfig) -> Self {
        Self { registry, config }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Encodes `value` against its declared `shape`.
    ///
    /// Equal inputs always produce identical bytes.
    pub fn encode(&self, value: &Value, shape: &Shape) -> Result<Vec<u8>, EncodeError> {
        let out = CanonicalEncoder::new(&self.registry, &self.config).encode(value, shape)?;
        tracing::trace!(bytes = out.len(), shape = shape.kind(), "encoded value");
        Ok(out)
    }

    pub fn encode_to_string(&self, value: &Value, shape: &Shape) -> Result<String, EncodeError> {
        let out = self.encode(value, shape)?;
        // Every byte written is either ASCII or copied from a `str` or from
        // hook output that parsed as JSON text.
        Ok(String::from_utf8_lossy(&out).into_owned())
    }

    /// Decodes `data` against `shape`.
    pub fn decode(&self, data: &[u8], shape: &Shape) -> Result<Value, DecodeError> {
        let value = CanonicalDecoder::new(data, &self.registry, &self.config).decode(shape)?;
        tracing::trace!(bytes = data.len(), shape = shape.kind(), "decoded value");
        Ok(value)
    }

    /// Decodes into `target`, which is left untouched on error.
    pub fn decode_into(
        &self,
        data: &[u8],
        shape: &Shape,
        target: &mut Value,
    ) -> Result<(), DecodeError> {
        *target = self.decode(data, shape)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_into_keeps_target_on_error() {
        let codec = Codec::new(Registry::new());
        let mut target = Value::from("keep");
        assert!(codec.decode_into(b"[1,", &Shape::Str, &mut target).is_err());
        assert_eq!(target, Value::from("keep"));

        codec.decode_into(b"\"new\"", &Shape::Str, &mut target).unwrap();
        assert_eq!(target, Value::from("new"));
    }

    #[test]
    fn encode_to_string() {
        let codec = Codec::new(Registry::new());
        let text = codec
            .encode_to_string(&Value::from("héllo"), &Shape::Str)
            .unwrap();
        assert_eq!(text, "\"héllo\"");
    }

    #[test]
    fn codec_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync + Clone>() {}
        assert_send_sync::<Codec>();
    }
}
