//! Sequential cursor over the rows of one column.

use nestor_common::{Result, error::Error};
use nestor_format::{FieldId, Level};

use crate::column::{Column, ColumnRow, Tid};

/// Reads a column row by row.
#[derive(Debug, Clone)]
pub struct FieldReader<'a> {
    column: &'a Column,
    position: Tid,
}

impl<'a> FieldReader<'a> {
    pub fn new(column: &'a Column) -> FieldReader<'a> {
        FieldReader {
            column,
            position: 0,
        }
    }

    /// Creates a reader positioned at the first row of the record at
    /// `record_index`.
    pub fn at_record(column: &'a Column, record_index: usize) -> Result<FieldReader<'a>> {
        let position = column.record_start(record_index).ok_or_else(|| {
            Error::store_underrun(
                column.path(),
                record_index as u64,
                column.record_count() as u64,
            )
        })?;
        Ok(FieldReader { column, position })
    }

    pub fn field(&self) -> FieldId {
        self.column.field()
    }

    pub fn column(&self) -> &'a Column {
        self.column
    }

    /// Id of the row returned by the next [`FieldReader::read_next`].
    pub fn position(&self) -> Tid {
        self.position
    }

    pub fn seek(&mut self, position: Tid) {
        self.position = position;
    }

    pub fn is_exhausted(&self) -> bool {
        self.position >= self.column.len() as Tid
    }

    /// Returns the next row without consuming it.
    pub fn peek(&self) -> Result<ColumnRow> {
        self.column.get(self.position)
    }

    /// Returns the next row and advances past it.
    pub fn read_next(&mut self) -> Result<ColumnRow> {
        let row = self.column.get(self.position)?;
        self.position += 1;
        Ok(row)
    }

    /// Repetition level of the next row; `0` past the end, which is also the
    /// level that starts the next record.
    pub fn next_repetition_level(&self) -> Level {
        self.column.repetition_level(self.position).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use nestor_format::Value;
    use nestor_testkit::document::{document_schema, large_document, small_document};

    use super::FieldReader;
    use crate::table::DocumentTable;

    #[test]
    fn test_reader_walks_column() {
        let mut table = DocumentTable::new(document_schema(), Default::default()).unwrap();
        table.insert(&large_document().unwrap()).unwrap();
        table.insert(&small_document().unwrap()).unwrap();

        let forward = table.column_by_path("Links.Forward").unwrap();
        let mut reader = FieldReader::new(forward);
        assert_eq!(reader.read_next().unwrap().value, Some(Value::Int64(20)));
        assert_eq!(reader.next_repetition_level(), 1);
        reader.read_next().unwrap();
        reader.read_next().unwrap();
        assert_eq!(reader.next_repetition_level(), 0);
        assert_eq!(reader.peek().unwrap().value, Some(Value::Int64(80)));
        reader.read_next().unwrap();
        assert!(reader.is_exhausted());
        assert_eq!(reader.next_repetition_level(), 0);
        assert!(reader.read_next().unwrap_err().is_store_underrun());
    }

    #[test]
    fn test_reader_at_record() {
        let mut table = DocumentTable::new(document_schema(), Default::default()).unwrap();
        table.insert(&large_document().unwrap()).unwrap();
        table.insert(&small_document().unwrap()).unwrap();

        let code = table.column_by_path("Name.Language.Code").unwrap();
        let reader = FieldReader::at_record(code, 1).unwrap();
        assert_eq!(reader.position(), 4);
        assert!(FieldReader::at_record(code, 2).unwrap_err().is_store_underrun());
    }
}
