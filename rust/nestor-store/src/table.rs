//! Document table: a set of leaf columns of one nested schema, with record
//! insertion on the write side and FSM-driven record assembly on the read side.

use std::{ops::Range, sync::Arc};

use nestor_common::{Result, error::Error, verify_arg};
use nestor_format::{FieldId, Projection, Record, Schema};
use rayon::prelude::*;

use crate::{
    column::Column,
    options::TableOptions,
    read::{Assembler, FieldReader, RecordFsm, RecordIter},
    write::{Shredder, StagedRecord, WriterTree},
};

/// In-memory columnar store of nested records.
///
/// Columns are kept in schema leaf order. Inserting a record either appends
/// rows to every column or, when the record does not conform to the schema,
/// leaves all columns untouched.
pub struct DocumentTable {
    schema: Arc<Schema>,
    options: TableOptions,
    writer_tree: WriterTree,
    columns: Vec<Column>,
    record_count: usize,
}

impl DocumentTable {
    pub fn new(schema: Arc<Schema>, options: TableOptions) -> Result<DocumentTable> {
        let columns = schema
            .leaves()
            .iter()
            .map(|&leaf| Column::new(&schema, leaf, options.initial_capacity))
            .collect::<Result<Vec<_>>>()?;
        let writer_tree = WriterTree::new(&schema);
        log::debug!(
            "document table '{}' created with {} columns",
            schema.name(),
            columns.len()
        );
        Ok(DocumentTable {
            schema,
            options,
            writer_tree,
            columns,
            record_count: 0,
        })
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn options(&self) -> &TableOptions {
        &self.options
    }

    pub fn writer_tree(&self) -> &WriterTree {
        &self.writer_tree
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.record_count
    }

    pub fn is_empty(&self) -> bool {
        self.record_count == 0
    }

    /// All columns, in schema leaf order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Column of the leaf field `field`.
    pub fn column(&self, field: FieldId) -> Result<&Column> {
        let node = self.schema.resolve(field)?;
        self.schema
            .leaf_ordinal(field)
            .and_then(|ordinal| self.columns.get(ordinal))
            .ok_or_else(|| Error::schema_mismatch(node.path_name(), "not a leaf field"))
    }

    /// Column of the leaf field with the given dotted path.
    pub fn column_by_path(&self, path: &str) -> Result<&Column> {
        let field = self
            .schema
            .find_field(path)
            .ok_or_else(|| Error::schema_mismatch(path, "no such field"))?;
        self.column(field)
    }

    /// Shreds and stores one record, returning its index.
    pub fn insert(&mut self, record: &Record) -> Result<u64> {
        let staged = Shredder::new(&self.writer_tree)
            .stage(record)
            .inspect_err(|e| log::warn!("record rejected: {e}"))?;
        let index = self.record_count as u64;
        self.commit(vec![staged])?;
        Ok(index)
    }

    /// Shreds and stores a batch of records, returning their index range.
    ///
    /// Every record is shredded before any is stored; if one of them does not
    /// conform to the schema, the table is left unchanged.
    pub fn insert_batch(&mut self, records: &[Record]) -> Result<Range<u64>> {
        let shredder = Shredder::new(&self.writer_tree);
        let parallel =
            self.options.parallel_load && records.len() >= self.options.min_parallel_batch;
        let staged = if parallel {
            records
                .par_iter()
                .map(|record| shredder.stage(record))
                .collect::<Result<Vec<_>>>()
        } else {
            records
                .iter()
                .map(|record| shredder.stage(record))
                .collect::<Result<Vec<_>>>()
        };
        let staged =
            staged.inspect_err(|e| log::warn!("batch of {} records rejected: {e}", records.len()))?;

        let start = self.record_count as u64;
        self.commit(staged)?;
        log::debug!(
            "loaded {} records (parallel: {parallel}), table now holds {}",
            records.len(),
            self.record_count
        );
        Ok(start..self.record_count as u64)
    }

    /// Appends staged records to the columns, restoring the previous column
    /// lengths if any row is refused.
    fn commit(&mut self, staged: Vec<StagedRecord>) -> Result<()> {
        let lengths = self.columns.iter().map(Column::len).collect::<Vec<_>>();
        let count = staged.len();
        for record in staged {
            if let Err(e) = record.commit(&mut self.columns) {
                for (column, &len) in self.columns.iter_mut().zip(&lengths) {
                    column.truncate(len);
                }
                return Err(e);
            }
        }
        self.record_count += count;
        Ok(())
    }

    /// Validates a projection of dotted leaf paths against the table schema.
    pub fn projection<S: AsRef<str>>(&self, paths: impl IntoIterator<Item = S>) -> Result<Projection> {
        Projection::from_paths(&self.schema, paths)
    }

    pub fn build_fsm(&self, projection: &Projection) -> Result<RecordFsm> {
        RecordFsm::new(&self.schema, projection)
    }

    pub fn assembler<'a>(&'a self, fsm: &'a RecordFsm) -> Assembler<'a> {
        Assembler::new(&self.schema, fsm)
    }

    /// Readers over the FSM's columns, positioned at the record `record_index`.
    pub fn readers(&self, fsm: &RecordFsm, record_index: usize) -> Result<Vec<FieldReader<'_>>> {
        fsm.fields()
            .iter()
            .map(|&field| FieldReader::at_record(self.column(field)?, record_index))
            .collect()
    }

    /// Reconstructs the record at `record_index`, restricted to the FSM's
    /// projection.
    pub fn assemble(&self, record_index: usize, fsm: &RecordFsm) -> Result<Record> {
        verify_arg!(record_index, record_index < self.record_count);
        let mut readers = self.readers(fsm, record_index)?;
        self.assembler(fsm).assemble_next(&mut readers)
    }

    /// Reconstructs the records in `range`, in order.
    pub fn assemble_range(&self, range: Range<usize>, fsm: &RecordFsm) -> Result<Vec<Record>> {
        verify_arg!(range, range.start <= range.end && range.end <= self.record_count);
        let chunk_size = self.options.assembly_chunk_size.max(1);
        if !self.options.parallel_assembly || range.len() <= chunk_size {
            return self.assemble_chunk(range, fsm);
        }

        let chunks = range
            .clone()
            .step_by(chunk_size)
            .map(|start| start..(start + chunk_size).min(range.end))
            .collect::<Vec<_>>();
        let assembled = chunks
            .into_par_iter()
            .map(|chunk| self.assemble_chunk(chunk, fsm))
            .collect::<Result<Vec<_>>>()?;
        Ok(assembled.into_iter().flatten().collect())
    }

    fn assemble_chunk(&self, range: Range<usize>, fsm: &RecordFsm) -> Result<Vec<Record>> {
        if range.is_empty() {
            return Ok(Vec::new());
        }
        let mut readers = self.readers(fsm, range.start)?;
        let assembler = self.assembler(fsm);
        range
            .map(|_| assembler.assemble_next(&mut readers))
            .collect()
    }

    /// Lazily reconstructs every stored record.
    pub fn records<'a>(&'a self, fsm: &'a RecordFsm) -> Result<RecordIter<'a>> {
        let readers = if self.is_empty() {
            fsm.fields()
                .iter()
                .map(|&field| self.column(field).map(FieldReader::new))
                .collect::<Result<Vec<_>>>()?
        } else {
            self.readers(fsm, 0)?
        };
        Ok(RecordIter::new(
            self.assembler(fsm),
            readers,
            self.record_count,
        ))
    }

    /// Renders every column as a `| value | r | d |` table.
    pub fn dump_columns(&self) -> String {
        self.columns
            .iter()
            .map(|column| column.to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }
}
