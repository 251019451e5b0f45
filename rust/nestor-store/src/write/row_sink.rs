//! Destinations of shredded rows.

use nestor_common::{Result, error::Error};
use nestor_format::{Level, Value};

use crate::column::Column;

/// Receives the rows produced by the writer tree. `column` is the leaf ordinal
/// of the target field.
pub trait RowSink {
    fn insert(
        &mut self,
        column: usize,
        value: Option<Value>,
        repetition_level: Level,
        definition_level: Level,
    ) -> Result<()>;
}

impl RowSink for [Column] {
    fn insert(
        &mut self,
        column: usize,
        value: Option<Value>,
        repetition_level: Level,
        definition_level: Level,
    ) -> Result<()> {
        let len = self.len();
        let target = self
            .get_mut(column)
            .ok_or_else(|| Error::invalid_arg("column", format!("{column} >= {len}")))?;
        target.insert(value, repetition_level, definition_level)?;
        Ok(())
    }
}

/// A row buffered by [`StagedRecord`].
#[derive(Debug, Clone, PartialEq)]
pub struct StagedRow {
    pub value: Option<Value>,
    pub repetition_level: Level,
    pub definition_level: Level,
}

/// Rows of one fully shredded record, buffered per column until committed.
#[derive(Debug, Clone, Default)]
pub struct StagedRecord {
    columns: Vec<Vec<StagedRow>>,
}

impl StagedRecord {
    pub fn new(column_count: usize) -> StagedRecord {
        StagedRecord {
            columns: vec![Vec::new(); column_count],
        }
    }

    /// Buffered rows of the column with the given leaf ordinal.
    pub fn rows(&self, column: usize) -> &[StagedRow] {
        self.columns.get(column).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Total number of buffered rows over all columns.
    pub fn row_count(&self) -> usize {
        self.columns.iter().map(Vec::len).sum()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Appends the buffered rows to `columns`.
    ///
    /// On failure the columns may hold a prefix of the record; callers that
    /// need atomicity truncate the columns back to their previous lengths.
    pub fn commit(self, columns: &mut [Column]) -> Result<()> {
        if self.columns.len() != columns.len() {
            return Err(Error::invalid_arg(
                "columns",
                format!(
                    "staged record has {} columns, store has {}",
                    self.columns.len(),
                    columns.len()
                ),
            ));
        }
        for (rows, column) in self.columns.into_iter().zip(columns.iter_mut()) {
            for row in rows {
                column.insert(row.value, row.repetition_level, row.definition_level)?;
            }
        }
        Ok(())
    }
}

impl RowSink for StagedRecord {
    fn insert(
        &mut self,
        column: usize,
        value: Option<Value>,
        repetition_level: Level,
        definition_level: Level,
    ) -> Result<()> {
        let len = self.columns.len();
        let rows = self
            .columns
            .get_mut(column)
            .ok_or_else(|| Error::invalid_arg("column", format!("{column} >= {len}")))?;
        rows.push(StagedRow {
            value,
            repetition_level,
            definition_level,
        });
        Ok(())
    }
}
