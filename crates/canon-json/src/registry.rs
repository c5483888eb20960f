//! Type registry: named concrete types and their polymorphic tags.
//!
//! A [`Registry`] is populated during initialisation and read by every
//! encode/decode call afterwards. Clones share the same state.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use thiserror::Error;

use crate::error::HookError;
use crate::shape::Shape;
use crate::value::Value;

/// Custom encode hook. Its output is written to the document as-is.
pub type EncodeSelfFn = Arc<dyn Fn(&Value) -> Result<Vec<u8>, HookError> + Send + Sync>;

/// Custom decode hook. Receives the raw JSON text of the matched value.
pub type DecodeSelfFn = Arc<dyn Fn(&[u8]) -> Result<Value, HookError> + Send + Sync>;

/// A pair of optional self-encoding hooks attached to a type.
#[derive(Clone, Default)]
pub struct CustomCodec {
    pub encode: Option<EncodeSelfFn>,
    pub decode: Option<DecodeSelfFn>,
}

impl CustomCodec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_encoder<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value) -> Result<Vec<u8>, HookError> + Send + Sync + 'static,
    {
        self.encode = Some(Arc::new(f));
        self
    }

    pub fn with_decoder<F>(mut self, f: F) -> Self
    where
        F: Fn(&[u8]) -> Result<Value, HookError> + Send + Sync + 'static,
    {
        self.decode = Some(Arc::new(f));
        self
    }
}

impl fmt::Debug for CustomCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomCodec")
            .field("encode", &self.encode.is_some())
            .field("decode", &self.decode.is_some())
            .finish()
    }
}

/// A named concrete type.
#[derive(Debug, Clone)]
pub struct TypeDef {
    pub name: String,
    /// Underlying shape used when no custom hook applies.
    pub shape: Shape,
    /// Interfaces this type satisfies.
    pub implements: BTreeSet<String>,
    /// Hooks available on both values and pointers.
    pub value_codec: Option<CustomCodec>,
    /// Hooks available only on addressable values; shadow `value_codec`.
    pub pointer_codec: Option<CustomCodec>,
}

impl TypeDef {
    pub fn new(name: impl Into<String>, shape: Shape) -> Self {
        Self {
            name: name.into(),
            shape,
            implements: BTreeSet::new(),
            value_codec: None,
            pointer_codec: None,
        }
    }

    pub fn implementing(mut self, interface: impl Into<String>) -> Self {
        self.implements.insert(interface.into());
        self
    }

    pub fn with_value_codec(mut self, codec: CustomCodec) -> Self {
        self.value_codec = Some(codec);
        self
    }

    pub fn with_pointer_codec(mut self, codec: CustomCodec) -> Self {
        self.pointer_codec = Some(codec);
        self
    }

    pub fn implements(&self, interface: &str) -> bool {
        self.implements.contains(interface)
    }

    /// Pointer-form hook when addressable, else the value-form hook.
    pub(crate) fn encode_hook(&self, addressable: bool) -> Option<&EncodeSelfFn> {
        let by_pointer = self
            .pointer_codec
            .as_ref()
            .and_then(|c| c.encode.as_ref())
            .filter(|_| addressable);
        by_pointer.or_else(|| self.value_codec.as_ref().and_then(|c| c.encode.as_ref()))
    }

    /// Decode targets are always addressable, so the pointer form wins.
    pub(crate) fn decode_hook(&self) -> Option<&DecodeSelfFn> {
        self.pointer_codec
            .as_ref()
            .and_then(|c| c.decode.as_ref())
            .or_else(|| self.value_codec.as_ref().and_then(|c| c.decode.as_ref()))
    }
}

/// Whether a tagged type is stored in interfaces as a value or a pointer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Form {
    #[default]
    Value,
    Pointer,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("tag `{tag}` is already registered to type `{existing}`")]
    DuplicateTag { tag: String, existing: String },
    #[error("type `{type_name}` is already registered under tag `{existing}`")]
    DuplicateType { type_name: String, existing: String },
    #[error("tag `{tag}` is already registered in {existing:?} form")]
    FormMismatch { tag: String, existing: Form },
    #[error("type `{0}` is already defined")]
    AlreadyDefined(String),
}

#[derive(Debug, Clone)]
struct Binding {
    type_name: String,
    form: Form,
}

#[derive(Debug, Default)]
struct RegistryInner {
    types: HashMap<String, Arc<TypeDef>>,
    by_tag: HashMap<String, Binding>,
    by_type: HashMap<String, String>,
}

/// Shared table of named types and tag bindings.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    inner: Arc<RwLock<RegistryInner>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, RegistryInner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, RegistryInner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds an untagged named type.
    pub fn define(&self, def: TypeDef) -> Result<(), RegistryError> {
        let mut inner = self.write();
        if inner.types.contains_key(&def.name) {
            tracing::warn!(type_name = %def.name, "type already defined");
            return Err(RegistryError::AlreadyDefined(def.name));
        }
        tracing::debug!(type_name = %def.name, "defined type");
        inner.types.insert(def.name.clone(), Arc::new(def));
        Ok(())
    }

    /// Registers `def` under `tag` in value form.
    pub fn register(&self, tag: impl Into<String>, def: TypeDef) -> Result<(), RegistryError> {
        self.register_as(tag, def, Form::Value)
    }

    /// Registers `def` under `tag`.
    ///
    /// Re-registering the same pair in the same form is a no-op; a different
    /// form is a [`RegistryError::FormMismatch`]. If the type was already
    /// defined, the existing definition is kept and only the tag is added.
    pub fn register_as(
        &self,
        tag: impl Into<String>,
        def: TypeDef,
        form: Form,
    ) -> Result<(), RegistryError> {
        let tag = tag.into();
        let mut inner = self.write();

        if let Some(existing) = inner.by_tag.get(&tag) {
            if existing.type_name == def.name {
                if existing.form == form {
                    return Ok(());
                }
                tracing::warn!(%tag, type_name = %def.name, existing = ?existing.form, ?form, "form mismatch");
                return Err(RegistryError::FormMismatch {
                    tag,
                    existing: existing.form,
                });
            }
            tracing::warn!(%tag, type_name = %def.name, existing = %existing.type_name, "duplicate tag");
            return Err(RegistryError::DuplicateTag {
                tag,
                existing: existing.type_name.clone(),
            });
        }
        if let Some(existing) = inner.by_type.get(&def.name) {
            tracing::warn!(%tag, type_name = %def.name, %existing, "type already tagged");
            return Err(RegistryError::DuplicateType {
                type_name: def.name,
                existing: existing.clone(),
            });
        }

        tracing::debug!(%tag, type_name = %def.name, ?form, "registered type");
        inner.by_type.insert(def.name.clone(), tag.clone());
        inner.by_tag.insert(
            tag,
            Binding {
                type_name: def.name.clone(),
                form,
            },
        );
        inner
            .types
            .entry(def.name.clone())
            .or_insert_with(|| Arc::new(def));
        Ok(())
    }

    pub fn tag_for(&self, type_name: &str) -> Option<String> {
        self.read().by_type.get(type_name).cloned()
    }

    pub fn type_for(&self, tag: &str) -> Option<Arc<TypeDef>> {
        let inner = self.read();
        let binding = inner.by_tag.get(tag)?;
        inner.types.get(&binding.type_name).cloned()
    }

    pub fn form_of(&self, tag: &str) -> Option<Form> {
        self.read().by_tag.get(tag).map(|b| b.form)
    }

    /// Looks up any defined type, tagged or not.
    pub fn lookup(&self, type_name: &str) -> Option<Arc<TypeDef>> {
        self.read().types.get(type_name).cloned()
    }

    /// Number of defined types.
    pub fn len(&self) -> usize {
        self.read().types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().types.is_empty()
    }

    /// Registered tags in sorted order.
    pub fn tags(&self) -> Vec<String> {
        let mut tags: Vec<String> = self.read().by_tag.keys().cloned().collect();
        tags.sort_unstable();
        tags
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::Field;

    fn tesla() -> TypeDef {
        TypeDef::new("Tesla", Shape::structure(vec![Field::new("Color", Shape::Str)]))
            .implementing("Car")
    }

    #[test]
    fn register_and_lookup() {
        let r = Registry::new();
        r.register("car/tesla", tesla()).unwrap();
        assert_eq!(r.tag_for("Tesla").as_deref(), Some("car/tesla"));
        assert_eq!(r.type_for("car/tesla").unwrap().name, "Tesla");
        assert_eq!(r.form_of("car/tesla"), Some(Form::Value));
        assert!(r.type_for("car/ford").is_none());
        assert!(r.tag_for("Ford").is_none());
    }

    #[test]
    fn identical_registration_is_idempotent() {
        let r = Registry::new();
        r.register("car/tesla", tesla()).unwrap();
        r.register("car/tesla", tesla()).unwrap();
        assert_eq!(r.tags(), vec!["car/tesla".to_string()]);
    }

    #[test]
    fn registration_in_other_form_is_rejected() {
        let r = Registry::new();
        r.register_as("car/tesla", tesla(), Form::Pointer).unwrap();
        let err = r
            .register("car/tesla", TypeDef::new("Tesla", Shape::Bool))
            .unwrap_err();
        assert_eq!(
            err,
            RegistryError::FormMismatch {
                tag: "car/tesla".into(),
                existing: Form::Pointer,
            }
        );
        assert_eq!(r.form_of("car/tesla"), Some(Form::Pointer));
        assert_eq!(
            err.to_string(),
            "tag `car/tesla` is already registered in Pointer form"
        );
    }

    #[test]
    fn duplicate_tag_is_rejected() {
        let r = Registry::new();
        r.register("car/tesla", tesla()).unwrap();
        let err = r
            .register("car/tesla", TypeDef::new("Ford", Shape::Str))
            .unwrap_err();
        assert_eq!(
            err,
            RegistryError::DuplicateTag {
                tag: "car/tesla".into(),
                existing: "Tesla".into(),
            }
        );
    }

    #[test]
    fn duplicate_type_is_rejected() {
        let r = Registry::new();
        r.register("car/tesla", tesla()).unwrap();
        let err = r.register("car/model-s", tesla()).unwrap_err();
        assert_eq!(
            err,
            RegistryError::DuplicateType {
                type_name: "Tesla".into(),
                existing: "car/tesla".into(),
            }
        );
        assert!(r.type_for("car/model-s").is_none());
    }

    #[test]
    fn define_then_tag_keeps_definition() {
        let r = Registry::new();
        r.define(tesla()).unwrap();
        assert!(r.tag_for("Tesla").is_none());
        r.register_as("car/tesla", TypeDef::new("Tesla", Shape::Bool), Form::Pointer)
            .unwrap();
        let def = r.type_for("car/tesla").unwrap();
        assert!(matches!(def.shape, Shape::Struct(_)));
        assert_eq!(r.form_of("car/tesla"), Some(Form::Pointer));
        assert_eq!(r.len(), 1);
    }

    #[test]
    fn redefinition_is_rejected() {
        let r = Registry::new();
        r.define(tesla()).unwrap();
        assert_eq!(
            r.define(tesla()).unwrap_err(),
            RegistryError::AlreadyDefined("Tesla".into())
        );
    }

    #[test]
    fn clones_share_state() {
        let r = Registry::new();
        let shared = r.clone();
        r.register("car/tesla", tesla()).unwrap();
        assert!(shared.type_for("car/tesla").is_some());
    }

    #[test]
    fn pointer_hook_shadows_value_hook_when_addressable() {
        let def = TypeDef::new("T", Shape::Str)
            .with_value_codec(CustomCodec::new().with_encoder(|_| Ok(b"\"value\"".to_vec())))
            .with_pointer_codec(CustomCodec::new().with_encoder(|_| Ok(b"\"ptr\"".to_vec())));
        let by_ptr = def.encode_hook(true).unwrap();
        let by_val = def.encode_hook(false).unwrap();
        assert_eq!(by_ptr(&Value::Nil).unwrap(), b"\"ptr\"");
        assert_eq!(by_val(&Value::Nil).unwrap(), b"\"value\"");
    }

    #[test]
    fn pointer_only_hook_needs_addressable_value() {
        let def = TypeDef::new("T", Shape::Str)
            .with_pointer_codec(CustomCodec::new().with_encoder(|_| Ok(b"1".to_vec())));
        assert!(def.encode_hook(true).is_some());
        assert!(def.encode_hook(false).is_none());
    }
}
