//! Append-only storage of one leaf field: a value per row plus the row's
//! repetition and definition levels.
//!
//! Rows whose definition level is below the field's maximum carry no value;
//! the typed value vector holds the type's default at those positions so that
//! the three vectors stay aligned by row id.

use std::sync::Arc;

use nestor_common::{Result, error::Error, verify_arg};
use nestor_format::{FieldId, Level, ScalarType, Schema, Value};

/// Row id within a column.
pub type Tid = u64;

/// Typed value storage of a column.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValues {
    Boolean(Vec<bool>),
    Int64(Vec<i64>),
    Float64(Vec<f64>),
    String(Vec<String>),
}

impl ColumnValues {
    fn with_capacity(scalar_type: ScalarType, capacity: usize) -> ColumnValues {
        match scalar_type {
            ScalarType::Boolean => ColumnValues::Boolean(Vec::with_capacity(capacity)),
            ScalarType::Int64 => ColumnValues::Int64(Vec::with_capacity(capacity)),
            ScalarType::Float64 => ColumnValues::Float64(Vec::with_capacity(capacity)),
            ScalarType::String => ColumnValues::String(Vec::with_capacity(capacity)),
        }
    }

    pub fn scalar_type(&self) -> ScalarType {
        match self {
            ColumnValues::Boolean(_) => ScalarType::Boolean,
            ColumnValues::Int64(_) => ScalarType::Int64,
            ColumnValues::Float64(_) => ScalarType::Float64,
            ColumnValues::String(_) => ScalarType::String,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ColumnValues::Boolean(v) => v.len(),
            ColumnValues::Int64(v) => v.len(),
            ColumnValues::Float64(v) => v.len(),
            ColumnValues::String(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Appends `value`, or the type default for `None`.
    ///
    /// Returns `false` (and appends nothing) if the value has the wrong type.
    fn push(&mut self, value: Option<Value>) -> bool {
        match (self, value) {
            (ColumnValues::Boolean(v), Some(Value::Boolean(x))) => v.push(x),
            (ColumnValues::Boolean(v), None) => v.push(false),
            (ColumnValues::Int64(v), Some(Value::Int64(x))) => v.push(x),
            (ColumnValues::Int64(v), None) => v.push(0),
            (ColumnValues::Float64(v), Some(Value::Float64(x))) => v.push(x),
            (ColumnValues::Float64(v), None) => v.push(0.0),
            (ColumnValues::String(v), Some(Value::String(x))) => v.push(x),
            (ColumnValues::String(v), None) => v.push(String::new()),
            _ => return false,
        }
        true
    }

    fn get(&self, index: usize) -> Option<Value> {
        match self {
            ColumnValues::Boolean(v) => v.get(index).copied().map(Value::Boolean),
            ColumnValues::Int64(v) => v.get(index).copied().map(Value::Int64),
            ColumnValues::Float64(v) => v.get(index).copied().map(Value::Float64),
            ColumnValues::String(v) => v.get(index).cloned().map(Value::String),
        }
    }
}

/// A single row of a column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnRow {
    /// `None` when the definition level is below the field's maximum.
    pub value: Option<Value>,
    pub repetition_level: Level,
    pub definition_level: Level,
}

impl ColumnRow {
    pub fn new(value: Option<Value>, repetition_level: Level, definition_level: Level) -> ColumnRow {
        ColumnRow {
            value,
            repetition_level,
            definition_level,
        }
    }

    pub fn is_null(&self) -> bool {
        self.value.is_none()
    }
}

/// Storage of one leaf field.
#[derive(Debug, Clone)]
pub struct Column {
    field: FieldId,
    path: Arc<str>,
    max_repetition_level: Level,
    max_definition_level: Level,
    values: ColumnValues,
    repetition_levels: Vec<Level>,
    definition_levels: Vec<Level>,
    /// Row ids with repetition level 0, one per record.
    record_starts: Vec<Tid>,
}

impl Column {
    /// Creates an empty column for the leaf `field`.
    pub fn new(schema: &Schema, field: FieldId, capacity: usize) -> Result<Column> {
        let node = schema.resolve(field)?;
        let Some(scalar_type) = node.scalar_type() else {
            return Err(Error::invalid_arg(
                "field",
                format!("'{}' is a group, columns store leaf fields", node.path_name()),
            ));
        };
        Ok(Column {
            field,
            path: Arc::from(node.path_name()),
            max_repetition_level: node.max_repetition_level(),
            max_definition_level: node.max_definition_level(),
            values: ColumnValues::with_capacity(scalar_type, capacity),
            repetition_levels: Vec::with_capacity(capacity),
            definition_levels: Vec::with_capacity(capacity),
            record_starts: Vec::new(),
        })
    }

    /// Appends a row and returns its row id.
    ///
    /// A value must be given exactly when `definition_level` equals the
    /// field's maximum definition level.
    pub fn insert(
        &mut self,
        value: Option<Value>,
        repetition_level: Level,
        definition_level: Level,
    ) -> Result<Tid> {
        verify_arg!(
            repetition_level,
            repetition_level <= self.max_repetition_level
        );
        verify_arg!(
            definition_level,
            definition_level <= self.max_definition_level
        );
        verify_arg!(
            value,
            value.is_some() == (definition_level == self.max_definition_level)
        );
        if let Some(v) = &value
            && v.scalar_type() != Some(self.scalar_type())
        {
            return Err(Error::schema_mismatch(
                self.path.as_ref(),
                format!("expected {}, got {}", self.scalar_type(), v.kind_name()),
            ));
        }

        let tid = self.len() as Tid;
        if !self.values.push(value) {
            return Err(Error::schema_mismatch(self.path.as_ref(), "value type mismatch"));
        }
        self.repetition_levels.push(repetition_level);
        self.definition_levels.push(definition_level);
        if repetition_level == 0 {
            self.record_starts.push(tid);
        }
        Ok(tid)
    }

    /// Reads the row at `tid`.
    pub fn get(&self, tid: Tid) -> Result<ColumnRow> {
        let index = tid as usize;
        if tid >= self.len() as Tid {
            return Err(Error::store_underrun(self.path.as_ref(), tid, self.len() as u64));
        }
        let definition_level = self.definition_levels[index];
        let value = if definition_level == self.max_definition_level {
            self.values.get(index)
        } else {
            None
        };
        Ok(ColumnRow {
            value,
            repetition_level: self.repetition_levels[index],
            definition_level,
        })
    }

    /// Repetition level of the row at `tid`, `None` past the end.
    pub fn repetition_level(&self, tid: Tid) -> Option<Level> {
        self.repetition_levels.get(tid as usize).copied()
    }

    pub fn definition_level(&self, tid: Tid) -> Option<Level> {
        self.definition_levels.get(tid as usize).copied()
    }

    pub fn len(&self) -> usize {
        self.repetition_levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn field(&self) -> FieldId {
        self.field
    }

    /// Dotted path of the stored field.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn scalar_type(&self) -> ScalarType {
        self.values.scalar_type()
    }

    pub fn max_repetition_level(&self) -> Level {
        self.max_repetition_level
    }

    pub fn max_definition_level(&self) -> Level {
        self.max_definition_level
    }

    pub fn values(&self) -> &ColumnValues {
        &self.values
    }

    pub fn repetition_levels(&self) -> &[Level] {
        &self.repetition_levels
    }

    pub fn definition_levels(&self) -> &[Level] {
        &self.definition_levels
    }

    /// Number of records that have rows in this column.
    pub fn record_count(&self) -> usize {
        self.record_starts.len()
    }

    /// First row of the record at `record_index`.
    pub fn record_start(&self, record_index: usize) -> Option<Tid> {
        self.record_starts.get(record_index).copied()
    }

    /// Row range of the record at `record_index`.
    pub fn record_rows(&self, record_index: usize) -> Option<std::ops::Range<Tid>> {
        let start = self.record_start(record_index)?;
        let end = self
            .record_start(record_index + 1)
            .unwrap_or(self.len() as Tid);
        Some(start..end)
    }

    /// Drops every row from `len` on, used to roll back a partially applied
    /// batch.
    pub(crate) fn truncate(&mut self, len: usize) {
        if len >= self.len() {
            return;
        }
        match &mut self.values {
            ColumnValues::Boolean(v) => v.truncate(len),
            ColumnValues::Int64(v) => v.truncate(len),
            ColumnValues::Float64(v) => v.truncate(len),
            ColumnValues::String(v) => v.truncate(len),
        }
        self.repetition_levels.truncate(len);
        self.definition_levels.truncate(len);
        let kept = self.record_starts.partition_point(|&tid| (tid as usize) < len);
        self.record_starts.truncate(kept);
    }
}

impl std::fmt::Display for Column {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", self.path)?;
        writeln!(f, "| value | r | d |")?;
        writeln!(f, "|-------|---|---|")?;
        for tid in 0..self.len() as Tid {
            let Ok(row) = self.get(tid) else {
                break;
            };
            match &row.value {
                Some(Value::String(s)) => write!(f, "| {s} ")?,
                Some(value) => write!(f, "| {value} ")?,
                None => write!(f, "| NULL ")?,
            }
            writeln!(
                f,
                "| {} | {} |",
                row.repetition_level, row.definition_level
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use nestor_format::{FieldBuilder, ScalarType, SchemaBuilder, Value};

    use super::{Column, ColumnRow};

    fn url_column() -> Column {
        let schema = SchemaBuilder::new(
            "Doc",
            vec![
                FieldBuilder::repeated_group("name")
                    .with_child(FieldBuilder::optional("url", ScalarType::String)),
            ],
        )
        .finish()
        .unwrap();
        let url = schema.find_field("name.url").unwrap();
        Column::new(&schema, url, 4).unwrap()
    }

    #[test]
    fn test_insert_and_get() {
        let mut column = url_column();
        assert_eq!(column.insert(Some(Value::from("http://A")), 0, 2).unwrap(), 0);
        assert_eq!(column.insert(Some(Value::from("http://B")), 1, 2).unwrap(), 1);
        assert_eq!(column.insert(None, 1, 1).unwrap(), 2);
        assert_eq!(column.insert(None, 0, 0).unwrap(), 3);

        assert_eq!(column.len(), 4);
        assert_eq!(
            column.get(1).unwrap(),
            ColumnRow::new(Some(Value::from("http://B")), 1, 2)
        );
        assert!(column.get(2).unwrap().is_null());
        assert_eq!(column.record_count(), 2);
        assert_eq!(column.record_rows(0), Some(0..3));
        assert_eq!(column.record_rows(1), Some(3..4));
        assert_eq!(column.record_rows(2), None);
    }

    #[test]
    fn test_get_past_end_is_underrun() {
        let mut column = url_column();
        column.insert(None, 0, 0).unwrap();
        let err = column.get(1).unwrap_err();
        assert!(err.is_store_underrun());
    }

    #[test]
    fn test_insert_rejects_inconsistent_rows() {
        let mut column = url_column();
        assert!(column.insert(None, 0, 2).is_err());
        assert!(column.insert(Some(Value::from("x")), 0, 1).is_err());
        assert!(column.insert(None, 2, 0).is_err());
        assert!(column.insert(None, 0, 3).is_err());
        assert!(
            column
                .insert(Some(Value::Int64(1)), 0, 2)
                .unwrap_err()
                .is_schema_mismatch()
        );
        assert!(column.is_empty());
    }

    #[test]
    fn test_truncate() {
        let mut column = url_column();
        column.insert(Some(Value::from("a")), 0, 2).unwrap();
        column.insert(None, 0, 0).unwrap();
        column.insert(Some(Value::from("b")), 1, 2).unwrap();
        column.truncate(1);
        assert_eq!(column.len(), 1);
        assert_eq!(column.record_count(), 1);
    }

    #[test]
    fn test_display() {
        let mut column = url_column();
        column.insert(Some(Value::from("http://A")), 0, 2).unwrap();
        column.insert(None, 1, 1).unwrap();
        let text = column.to_string();
        assert!(text.starts_with("name.url\n| value | r | d |"));
        assert!(text.contains("| http://A | 0 | 2 |"));
        assert!(text.contains("| NULL | 1 | 1 |"));
    }
}
