use nestor_format::{Level, Value};
use nestor_testkit::document::document_schema;

use crate::{options::TableOptions, table::DocumentTable};

mod assembly_errors;

pub(crate) fn document_table(options: TableOptions) -> DocumentTable {
    DocumentTable::new(document_schema(), options).unwrap()
}

/// All rows of a column as `(value, r, d)`.
pub(crate) fn column_rows(table: &DocumentTable, path: &str) -> Vec<(Option<Value>, Level, Level)> {
    let column = table.column_by_path(path).unwrap();
    (0..column.len() as u64)
        .map(|tid| {
            let row = column.get(tid).unwrap();
            (row.value, row.repetition_level, row.definition_level)
        })
        .collect()
}

pub(crate) fn int(v: i64) -> Option<Value> {
    Some(Value::Int64(v))
}

pub(crate) fn text(v: &str) -> Option<Value> {
    Some(Value::from(v))
}
