//! Write path: writer tree, row sinks and the shredder.

pub mod field_writer;
pub mod row_sink;
pub mod shredder;

pub use field_writer::{WriterKind, WriterNode, WriterTree};
pub use row_sink::{RowSink, StagedRecord, StagedRow};
pub use shredder::Shredder;
