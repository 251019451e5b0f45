//! Record assembly: rebuilds nested records from projected columns, driven by
//! a [`RecordFsm`].
//!
//! The assembler keeps the chain of currently open group instances, from the
//! root record down. Each row read moves that chain:
//!
//! - reading a field that comes later in the projection than the previous one
//!   keeps the groups shared with the previous field and opens the new field's
//!   remaining groups, up to the row's definition level;
//! - reading the same field again, or an earlier one, starts a new instance
//!   of the repeated node that owns the row's repetition level.
//!
//! Groups are opened even when the leaf value is absent, so a group that was
//! present but empty in the original record is reproduced.
//!
//! A record must start with a repetition level 0 row and leave every reader at
//! the start of the next record (or at the end of its column); anything else
//! is reported as [`InvalidFormat`](nestor_common::error::ErrorKind::InvalidFormat).

use nestor_common::{Result, error::Error, try_or_ret_some_err, verify_data};
use nestor_format::{FieldId, Record, Schema, Value};

use super::{field_reader::FieldReader, record_fsm::RecordFsm};

/// Reconstructs records from a set of field readers.
pub struct Assembler<'a> {
    schema: &'a Schema,
    fsm: &'a RecordFsm,
}

impl<'a> Assembler<'a> {
    pub fn new(schema: &'a Schema, fsm: &'a RecordFsm) -> Assembler<'a> {
        Assembler { schema, fsm }
    }

    pub fn fsm(&self) -> &RecordFsm {
        self.fsm
    }

    /// Assembles the record the readers are positioned at and leaves them at
    /// the start of the following record.
    ///
    /// `readers` holds one reader per FSM field, in FSM order.
    pub fn assemble_next(&self, readers: &mut [FieldReader<'_>]) -> Result<Record> {
        self.check_readers(readers)?;

        let mut record = Record::new();
        let mut open: Vec<(FieldId, usize)> = Vec::new();
        let mut previous: Option<usize> = None;
        let mut current = Some(0usize);

        while let Some(index) = current {
            let field = self.fsm.fields()[index];
            let node = self.schema.resolve(field)?;
            let row = readers[index].read_next()?;
            let forward = previous.is_none_or(|p| p < index);
            log::trace!(
                "read {} (r={}, d={})",
                node.path_name(),
                row.repetition_level,
                row.definition_level
            );
            if previous.is_none() && row.repetition_level != 0 {
                return Err(Error::invalid_format(
                    node.path_name(),
                    format!(
                        "record starts at row {} with repetition level {}",
                        readers[index].position() - 1,
                        row.repetition_level
                    ),
                ));
            }

            let path = self.schema.ancestry(field);
            let groups = &path[..path.len() - 1];

            let keep = if forward {
                previous
                    .map(|p| self.fsm.fields()[p])
                    .and_then(|p| self.schema.common_ancestor(p, field))
                    .map(|ancestor| self.schema.full_definition_level(ancestor) as usize)
                    .unwrap_or(0)
                    .min(open.len())
            } else {
                let level = row.repetition_level;
                let owner = path.iter().position(|&node| {
                    self.schema.field(node).is_some_and(|n| n.is_repeated())
                        && self.schema.max_repetition_level(node) == level
                });
                let Some(owner) = owner.filter(|_| level > 0) else {
                    return Err(Error::invalid_format(
                        node.path_name(),
                        format!("repetition level {level} does not repeat any node"),
                    ));
                };
                verify_data!(open, open.len() >= owner.min(groups.len()));
                owner
            };
            open.truncate(keep);

            for &group in &groups[open.len()..] {
                if self.schema.max_definition_level(group) > row.definition_level {
                    break;
                }
                let parent = Self::open_group(self.schema, &mut record, &open)?;
                let values = parent.get_all_mut(self.schema.resolve(group)?.name());
                values.push(Value::Record(Record::new()));
                open.push((group, values.len() - 1));
            }

            if let Some(value) = row.value {
                verify_data!(open, open.len() == groups.len());
                let parent = Self::open_group(self.schema, &mut record, &open)?;
                parent.get_all_mut(node.name()).push(value);
            }

            let level = readers[index].next_repetition_level();
            current = self
                .fsm
                .next_field(field, level)
                .and_then(|next| self.fsm.position(next));
            previous = Some(index);
        }

        for reader in readers.iter() {
            if reader.next_repetition_level() != 0 {
                return Err(Error::invalid_format(
                    reader.column().path(),
                    format!("record ends inside the column at row {}", reader.position()),
                ));
            }
        }
        Ok(record)
    }

    fn check_readers(&self, readers: &[FieldReader<'_>]) -> Result<()> {
        let fields = self.fsm.fields();
        if readers.len() != fields.len()
            || readers.iter().zip(fields).any(|(r, &f)| r.field() != f)
        {
            return Err(Error::invalid_arg(
                "readers",
                "expected one reader per FSM field, in FSM order",
            ));
        }
        Ok(())
    }

    /// Follows the open instance chain from the root to the innermost group.
    fn open_group<'r>(
        schema: &Schema,
        root: &'r mut Record,
        open: &[(FieldId, usize)],
    ) -> Result<&'r mut Record> {
        let mut current = root;
        for &(group, index) in open {
            let name = schema.resolve(group)?.name();
            current = current
                .get_all_mut(name)
                .get_mut(index)
                .and_then(Value::as_record_mut)
                .ok_or_else(|| {
                    Error::invalid_format(name, format!("open group instance #{index} missing"))
                })?;
        }
        Ok(current)
    }
}

/// Lazily assembles consecutive records.
pub struct RecordIter<'a> {
    assembler: Assembler<'a>,
    readers: Vec<FieldReader<'a>>,
    remaining: usize,
}

impl<'a> RecordIter<'a> {
    pub fn new(assembler: Assembler<'a>, readers: Vec<FieldReader<'a>>, count: usize) -> Self {
        RecordIter {
            assembler,
            readers,
            remaining: count,
        }
    }
}

impl Iterator for RecordIter<'_> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        // The readers are left mid-record after a failure; stop there.
        let record = try_or_ret_some_err!(
            self.assembler
                .assemble_next(&mut self.readers)
                .inspect_err(|_| self.remaining = 0)
        );
        Some(Ok(record))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}
