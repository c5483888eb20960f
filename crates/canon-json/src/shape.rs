//! Declared shapes: the static type a value is encoded or decoded against.

/// Number format of a numeric shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumFormat {
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
}

impl NumFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::I8 => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::F32 => "f32",
            Self::F64 => "f64",
        }
    }

    /// 64-bit integers travel as quoted decimal strings.
    pub fn is_wide(self) -> bool {
        matches!(self, Self::I64 | Self::U64)
    }

    pub fn is_unsigned(self) -> bool {
        matches!(self, Self::U8 | Self::U16 | Self::U32 | Self::U64)
    }

    pub fn is_float(self) -> bool {
        matches!(self, Self::F32 | Self::F64)
    }

    /// Inclusive signed range for the signed integer formats.
    pub(crate) fn signed_range(self) -> (i64, i64) {
        match self {
            Self::I8 => (i8::MIN as i64, i8::MAX as i64),
            Self::I16 => (i16::MIN as i64, i16::MAX as i64),
            Self::I32 => (i32::MIN as i64, i32::MAX as i64),
            _ => (i64::MIN, i64::MAX),
        }
    }

    /// Inclusive upper bound for the unsigned integer formats.
    pub(crate) fn unsigned_max(self) -> u64 {
        match self {
            Self::U8 => u8::MAX as u64,
            Self::U16 => u16::MAX as u64,
            Self::U32 => u32::MAX as u64,
            _ => u64::MAX,
        }
    }
}

/// Kinds of value the codec cannot represent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpaqueKind {
    Func,
    Chan,
    Complex,
    UnsafePointer,
}

impl OpaqueKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Func => "func",
            Self::Chan => "chan",
            Self::Complex => "complex",
            Self::UnsafePointer => "unsafe pointer",
        }
    }
}

/// A struct member descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// Declared member name.
    pub member: String,
    /// JSON name override; defaults to `member`.
    pub rename: Option<String>,
    pub shape: Shape,
    /// Drop the field from output when its value is empty.
    pub omit_empty: bool,
    /// Never encode or decode this field.
    pub skip: bool,
}

impl Field {
    pub fn new(member: impl Into<String>, shape: Shape) -> Self {
        Self {
            member: member.into(),
            rename: None,
            shape,
            omit_empty: false,
            skip: false,
        }
    }

    pub fn rename(mut self, name: impl Into<String>) -> Self {
        self.rename = Some(name.into());
        self
    }

    pub fn omit_empty(mut self) -> Self {
        self.omit_empty = true;
        self
    }

    pub fn skip(mut self) -> Self {
        self.skip = true;
        self
    }

    /// Key written to and matched in JSON objects.
    pub fn json_name(&self) -> &str {
        self.rename.as_deref().unwrap_or(&self.member)
    }
}

/// Ordered struct members. Output order is declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StructShape {
    pub fields: Vec<Field>,
}

impl StructShape {
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    /// Index of the non-skipped field whose JSON name is `key`.
    pub fn position(&self, key: &str) -> Option<usize> {
        self.fields
            .iter()
            .position(|f| !f.skip && f.json_name() == key)
    }
}

/// The declared static type of a value.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Bool,
    Num(NumFormat),
    Str,
    /// Variable-length byte sequence.
    Bytes,
    /// Fixed-length byte array.
    ByteArray(usize),
    Time,
    Ptr(Box<Shape>),
    /// Variable-length sequence.
    Seq(Box<Shape>),
    /// Fixed-length array.
    Array(usize, Box<Shape>),
    /// String-keyed mapping.
    Map(Box<Shape>),
    Struct(StructShape),
    /// A named interface; holds any registered type that implements it.
    Interface(String),
    /// The empty interface; holds any registered type.
    Any,
    /// Reference to a [`TypeDef`](crate::TypeDef) by name.
    Named(String),
    Opaque(OpaqueKind),
}

impl Shape {
    pub fn i8() -> Self {
        Shape::Num(NumFormat::I8)
    }

    pub fn i16() -> Self {
        Shape::Num(NumFormat::I16)
    }

    pub fn i32() -> Self {
        Shape::Num(NumFormat::I32)
    }

    pub fn i64() -> Self {
        Shape::Num(NumFormat::I64)
    }

    pub fn u8() -> Self {
        Shape::Num(NumFormat::U8)
    }

    pub fn u16() -> Self {
        Shape::Num(NumFormat::U16)
    }

    pub fn u32() -> Self {
        Shape::Num(NumFormat::U32)
    }

    pub fn u64() -> Self {
        Shape::Num(NumFormat::U64)
    }

    pub fn f32() -> Self {
        Shape::Num(NumFormat::F32)
    }

    pub fn f64() -> Self {
        Shape::Num(NumFormat::F64)
    }

    pub fn ptr(inner: Shape) -> Self {
        Shape::Ptr(Box::new(inner))
    }

    pub fn seq(elem: Shape) -> Self {
        Shape::Seq(Box::new(elem))
    }

    pub fn array(len: usize, elem: Shape) -> Self {
        Shape::Array(len, Box::new(elem))
    }

    pub fn map(value: Shape) -> Self {
        Shape::Map(Box::new(value))
    }

    pub fn structure(fields: Vec<Field>) -> Self {
        Shape::Struct(StructShape::new(fields))
    }

    pub fn interface(name: impl Into<String>) -> Self {
        Shape::Interface(name.into())
    }

    pub fn named(name: impl Into<String>) -> Self {
        Shape::Named(name.into())
    }

    /// Short kind name used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Shape::Bool => "bool",
            Shape::Num(f) => f.as_str(),
            Shape::Str => "string",
            Shape::Bytes => "bytes",
            Shape::ByteArray(_) => "byte array",
            Shape::Time => "time",
            Shape::Ptr(_) => "pointer",
            Shape::Seq(_) => "sequence",
            Shape::Array(..) => "array",
            Shape::Map(_) => "map",
            Shape::Struct(_) => "struct",
            Shape::Interface(_) => "interface",
            Shape::Any => "any",
            Shape::Named(_) => "named type",
            Shape::Opaque(k) => k.as_str(),
        }
    }

    /// Whether a nil value is representable without consulting the registry.
    ///
    /// `Named` shapes answer `false` here; callers resolve them first.
    pub(crate) fn accepts_nil(&self) -> bool {
        matches!(
            self,
            Shape::Ptr(_)
                | Shape::Seq(_)
                | Shape::Map(_)
                | Shape::Bytes
                | Shape::Interface(_)
                | Shape::Any
        )
    }

    /// Strips pointer layers, returning the innermost shape and whether any
    /// layer was removed.
    pub(crate) fn deref(&self) -> (&Shape, bool) {
        let mut shape = self;
        let mut by_ref = false;
        while let Shape::Ptr(inner) = shape {
            shape = inner;
            by_ref = true;
        }
        (shape, by_ref)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_name_defaults_to_member() {
        assert_eq!(Field::new("Value", Shape::i64()).json_name(), "Value");
        assert_eq!(
            Field::new("Name", Shape::Str).rename("name").json_name(),
            "name"
        );
    }

    #[test]
    fn position_ignores_skipped_fields() {
        let st = StructShape::new(vec![
            Field::new("Hidden", Shape::Str).rename("x").skip(),
            Field::new("Shown", Shape::Str).rename("x"),
        ]);
        assert_eq!(st.position("x"), Some(1));
        assert_eq!(st.position("Hidden"), None);
    }

    #[test]
    fn deref_strips_all_pointer_layers() {
        let shape = Shape::ptr(Shape::ptr(Shape::named("T")));
        let (inner, by_ref) = shape.deref();
        assert_eq!(inner, &Shape::named("T"));
        assert!(by_ref);
        assert!(!Shape::Str.deref().1);
    }

    #[test]
    fn wide_formats() {
        assert!(NumFormat::I64.is_wide());
        assert!(NumFormat::U64.is_wide());
        assert!(!NumFormat::I32.is_wide());
        assert!(!NumFormat::F64.is_wide());
    }
}
