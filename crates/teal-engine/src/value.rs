//! Native scalar values and their type tags.

/// Type tag for a native column or value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeType {
    /// 64-bit signed integer.
    Integer,
    /// 64-bit floating point.
    Float,
    /// UTF-8 text.
    Text,
    /// Boolean.
    Boolean,
    /// Raw bytes. Not representable in the caller-facing model; marshaling
    /// a blob fails rather than truncating it.
    Blob,
    /// Ordered sequence of nested values.
    List,
    /// Named nested values.
    Struct,
    /// Column with no declared or inferable type.
    Any,
}

impl NativeType {
    /// Short lowercase name, used in diagnostics.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            NativeType::Integer => "integer",
            NativeType::Float => "float",
            NativeType::Text => "text",
            NativeType::Boolean => "boolean",
            NativeType::Blob => "blob",
            NativeType::List => "list",
            NativeType::Struct => "struct",
            NativeType::Any => "any",
        }
    }
}

/// One native value as produced (or consumed) by an engine.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeValue {
    /// SQL NULL.
    Null,
    /// 64-bit signed integer.
    Integer(i64),
    /// 64-bit floating point.
    Float(f64),
    /// UTF-8 text.
    Text(String),
    /// Boolean.
    Boolean(bool),
    /// Raw bytes.
    Blob(Vec<u8>),
    /// Ordered sequence of nested values.
    List(Vec<NativeValue>),
    /// Named nested values.
    Struct(Vec<(String, NativeValue)>),
}

impl NativeValue {
    /// The type tag of this value. `Null` has no tag of its own and reports
    /// [`NativeType::Any`].
    #[must_use]
    pub fn type_tag(&self) -> NativeType {
        match self {
            NativeValue::Null => NativeType::Any,
            NativeValue::Integer(_) => NativeType::Integer,
            NativeValue::Float(_) => NativeType::Float,
            NativeValue::Text(_) => NativeType::Text,
            NativeValue::Boolean(_) => NativeType::Boolean,
            NativeValue::Blob(_) => NativeType::Blob,
            NativeValue::List(_) => NativeType::List,
            NativeValue::Struct(_) => NativeType::Struct,
        }
    }

    /// True for `Null`.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, NativeValue::Null)
    }
}
