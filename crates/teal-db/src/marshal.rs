//! Result marshaling: native frames to the caller-facing record model.
//!
//! Marshaling is total and lossless for the supported scalar kinds and
//! happens synchronously inside the worker that executed the command, so a
//! caller never observes a half-populated [`ResultSet`]. A native type with
//! no caller-facing representation fails the whole command with
//! `UnsupportedType` instead of truncating.

use std::sync::Arc;

use teal_engine::{NativeFrame, NativeType, NativeValue};

use crate::error::TealError;

/// A caller-facing scalar or nested value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
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
    /// Ordered sequence of nested values.
    List(Vec<Value>),
    /// Named nested values.
    Struct(Vec<(String, Value)>),
}

impl Value {
    /// True for `Null`.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Integer payload, if this is an integer.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// Float payload, if this is a float.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Text payload, if this is text.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(v) => Some(v),
            _ => None,
        }
    }

    /// Boolean payload, if this is a boolean.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(v) => Some(*v),
            _ => None,
        }
    }
}

/// Declared type of a result column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    /// 64-bit signed integer.
    Integer,
    /// 64-bit floating point.
    Float,
    /// UTF-8 text.
    Text,
    /// Boolean.
    Boolean,
    /// Ordered sequence of nested values.
    List,
    /// Named nested values.
    Struct,
    /// No declared or inferable type.
    Any,
}

/// One result column: name plus declared type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    /// Column name.
    pub name: String,
    /// Declared type, fixed for the lifetime of the result set.
    pub ty: ValueType,
}

/// One result row. Values are addressed by position or by column name.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Arc<[Column]>,
    values: Vec<Value>,
}

impl Row {
    /// Value by column name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        let idx = self.columns.iter().position(|c| c.name == name)?;
        self.values.get(idx)
    }

    /// Value by position.
    #[must_use]
    pub fn get_index(&self, idx: usize) -> Option<&Value> {
        self.values.get(idx)
    }

    /// All values in column order.
    #[must_use]
    pub fn values(&self) -> &[Value] {
        &self.values
    }
}

/// The structured output of a successful command.
///
/// The column set and declared types are fixed at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSet {
    columns: Arc<[Column]>,
    rows: Vec<Row>,
}

impl ResultSet {
    /// A result with no columns and no rows (statements without output).
    #[must_use]
    pub fn empty() -> Self {
        Self {
            columns: Arc::from(Vec::<Column>::new().into_boxed_slice()),
            rows: Vec::new(),
        }
    }

    /// Column descriptors.
    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// All rows.
    #[must_use]
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Row by index.
    #[must_use]
    pub fn row(&self, idx: usize) -> Option<&Row> {
        self.rows.get(idx)
    }

    /// Row count.
    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// Column count.
    #[must_use]
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// Consume into rows.
    #[must_use]
    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }
}

fn map_column_type(ty: NativeType, column: &str) -> Result<ValueType, TealError> {
    match ty {
        NativeType::Integer => Ok(ValueType::Integer),
        NativeType::Float => Ok(ValueType::Float),
        NativeType::Text => Ok(ValueType::Text),
        NativeType::Boolean => Ok(ValueType::Boolean),
        NativeType::List => Ok(ValueType::List),
        NativeType::Struct => Ok(ValueType::Struct),
        NativeType::Any => Ok(ValueType::Any),
        NativeType::Blob => Err(TealError::UnsupportedType {
            what: format!("column '{column}' has native type blob"),
        }),
    }
}

fn marshal_value(value: NativeValue, column: &str) -> Result<Value, TealError> {
    match value {
        NativeValue::Null => Ok(Value::Null),
        NativeValue::Integer(v) => Ok(Value::Integer(v)),
        NativeValue::Float(v) => Ok(Value::Float(v)),
        NativeValue::Text(v) => Ok(Value::Text(v)),
        NativeValue::Boolean(v) => Ok(Value::Boolean(v)),
        NativeValue::List(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(marshal_value(item, column)?);
            }
            Ok(Value::List(out))
        }
        NativeValue::Struct(fields) => {
            let mut out = Vec::with_capacity(fields.len());
            for (name, item) in fields {
                let marshaled = marshal_value(item, column)?;
                out.push((name, marshaled));
            }
            Ok(Value::Struct(out))
        }
        NativeValue::Blob(_) => Err(TealError::UnsupportedType {
            what: format!("column '{column}' produced a blob value"),
        }),
    }
}

/// Convert a native frame into a [`ResultSet`].
///
/// # Errors
///
/// Returns [`TealError::UnsupportedType`] for any column or value outside
/// the caller-facing model.
pub fn marshal_frame(frame: NativeFrame) -> Result<ResultSet, TealError> {
    let (native_columns, native_rows) = frame.into_parts();

    let mut columns = Vec::with_capacity(native_columns.len());
    for c in &native_columns {
        columns.push(Column {
            name: c.name.clone(),
            ty: map_column_type(c.ty, &c.name)?,
        });
    }
    let columns: Arc<[Column]> = Arc::from(columns.into_boxed_slice());

    let mut rows = Vec::with_capacity(native_rows.len());
    for native_row in native_rows {
        let mut values = Vec::with_capacity(native_row.len());
        for (i, value) in native_row.into_iter().enumerate() {
            values.push(marshal_value(value, &columns[i].name)?);
        }
        rows.push(Row {
            columns: Arc::clone(&columns),
            values,
        });
    }

    Ok(ResultSet { columns, rows })
}

/// Convert caller bind parameters into native values.
///
/// The mapping is total; engines reject what they cannot bind.
#[must_use]
pub fn unmarshal_params(params: &[Value]) -> Vec<NativeValue> {
    params.iter().map(unmarshal_value).collect()
}

fn unmarshal_value(value: &Value) -> NativeValue {
    match value {
        Value::Null => NativeValue::Null,
        Value::Integer(v) => NativeValue::Integer(*v),
        Value::Float(v) => NativeValue::Float(*v),
        Value::Text(v) => NativeValue::Text(v.clone()),
        Value::Boolean(v) => NativeValue::Boolean(*v),
        Value::List(items) => NativeValue::List(items.iter().map(unmarshal_value).collect()),
        Value::Struct(fields) => NativeValue::Struct(
            fields
                .iter()
                .map(|(name, v)| (name.clone(), unmarshal_value(v)))
                .collect(),
        ),
    }
}
