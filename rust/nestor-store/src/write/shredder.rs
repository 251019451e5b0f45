//! Record shredding: decomposes a nested record into per-column rows.

use nestor_common::{Result, error::Error};
use nestor_format::{FieldId, Level, Record, Value};

use super::{
    field_writer::{WriterKind, WriterTree},
    row_sink::{RowSink, StagedRecord},
};

/// Walks a record against the writer tree and emits one row per leaf
/// occurrence, null or not.
///
/// The first value of a field within a parent instance inherits the parent's
/// current repetition level; further values of a repeated field use the
/// field's own repetition level. A field absent from a present parent yields a
/// null at the parent's definition level in every column below it.
pub struct Shredder<'a> {
    tree: &'a WriterTree,
}

impl<'a> Shredder<'a> {
    pub fn new(tree: &'a WriterTree) -> Shredder<'a> {
        Shredder { tree }
    }

    /// Shreds `record` straight into `sink`.
    ///
    /// A schema mismatch may be detected after some rows have been written;
    /// use [`Shredder::stage`] to keep the destination untouched in that case.
    pub fn dissect<S: RowSink + ?Sized>(&self, record: &Record, sink: &mut S) -> Result<()> {
        self.dissect_group(FieldId::ROOT, record, 0, sink)
    }

    /// Shreds `record` into a [`StagedRecord`] buffer.
    pub fn stage(&self, record: &Record) -> Result<StagedRecord> {
        let mut staged = StagedRecord::new(self.tree.column_count());
        self.dissect(record, &mut staged)?;
        log::trace!(
            "staged record: {} rows over {} columns",
            staged.row_count(),
            staged.column_count()
        );
        Ok(staged)
    }

    fn dissect_group<S: RowSink + ?Sized>(
        &self,
        group: FieldId,
        record: &Record,
        repetition_level: Level,
        sink: &mut S,
    ) -> Result<()> {
        let schema = self.tree.schema();
        let WriterKind::Inner { children } = self.tree.node(group)?.kind() else {
            return Err(Error::schema_mismatch(
                self.tree.path(group),
                "a record cannot be written to a scalar field",
            ));
        };

        if let Some((unknown, _)) = record
            .fields()
            .find(|(name, _)| schema.find_child(group, name).is_none())
        {
            let element = match self.tree.path(group).as_str() {
                "" => unknown.to_string(),
                parent => format!("{parent}.{unknown}"),
            };
            return Err(Error::schema_mismatch(element, "field is not part of the schema"));
        }

        for &child in children {
            let node = schema.resolve(child)?;
            let writer = self.tree.find_child(group, child)?;
            let values = record.get_all(node.name());
            if values.is_empty() {
                if node.cardinality().is_required() {
                    return Err(Error::schema_mismatch(
                        node.path_name(),
                        "required field is missing",
                    ));
                }
                self.tree.write_null(
                    child,
                    repetition_level,
                    writer.null_definition_level(),
                    sink,
                )?;
                continue;
            }

            if values.len() > 1 && !node.is_repeated() {
                return Err(Error::schema_mismatch(
                    node.path_name(),
                    format!("{} values for a non-repeated field", values.len()),
                ));
            }

            for (i, value) in values.iter().enumerate() {
                let level = if i == 0 {
                    repetition_level
                } else {
                    node.max_repetition_level()
                };
                match value {
                    Value::Record(nested) => self.dissect_group(child, nested, level, sink)?,
                    scalar => self.tree.write_value(child, scalar, level, sink)?,
                }
            }
        }
        Ok(())
    }
}
