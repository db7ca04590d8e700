//! Raw engine output before marshaling.

use crate::value::{NativeType, NativeValue};

/// One named, type-tagged output column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeColumn {
    /// Column name as reported by the engine.
    pub name: String,
    /// Native type tag for every value in the column.
    pub ty: NativeType,
}

impl NativeColumn {
    /// Create a column descriptor.
    pub fn new(name: impl Into<String>, ty: NativeType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// The engine's raw result: a fixed column set plus row-major values.
///
/// The column set and type tags are fixed at construction; every row pushed
/// must match the column count.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NativeFrame {
    columns: Vec<NativeColumn>,
    rows: Vec<Vec<NativeValue>>,
}

impl NativeFrame {
    /// Create an empty frame with the given column set.
    #[must_use]
    pub fn new(columns: Vec<NativeColumn>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// A frame with no columns and no rows (statements that return nothing).
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Append one row.
    ///
    /// # Panics
    ///
    /// Panics if the row length does not match the column count; engines
    /// constructing frames control both sides.
    pub fn push_row(&mut self, row: Vec<NativeValue>) {
        assert_eq!(
            row.len(),
            self.columns.len(),
            "row arity does not match frame columns"
        );
        self.rows.push(row);
    }

    /// Column descriptors.
    #[must_use]
    pub fn columns(&self) -> &[NativeColumn] {
        &self.columns
    }

    /// All rows, row-major.
    #[must_use]
    pub fn rows(&self) -> &[Vec<NativeValue>] {
        &self.rows
    }

    /// Row count.
    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// Consume into columns and rows.
    #[must_use]
    pub fn into_parts(self) -> (Vec<NativeColumn>, Vec<Vec<NativeValue>>) {
        (self.columns, self.rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_and_read() {
        let mut frame = NativeFrame::new(vec![
            NativeColumn::new("id", NativeType::Integer),
            NativeColumn::new("name", NativeType::Text),
        ]);
        frame.push_row(vec![
            NativeValue::Integer(1),
            NativeValue::Text("a".into()),
        ]);
        assert_eq!(frame.num_rows(), 1);
        assert_eq!(frame.columns()[1].name, "name");
    }

    #[test]
    #[should_panic(expected = "row arity")]
    fn arity_mismatch_panics() {
        let mut frame = NativeFrame::new(vec![NativeColumn::new("id", NativeType::Integer)]);
        frame.push_row(vec![NativeValue::Integer(1), NativeValue::Null]);
    }

    #[test]
    fn empty_frame() {
        let frame = NativeFrame::empty();
        assert_eq!(frame.num_rows(), 0);
        assert!(frame.columns().is_empty());
    }
}
