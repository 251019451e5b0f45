//! Read path: record FSM, field readers and record assembly.

pub mod assembler;
pub mod field_reader;
pub mod record_fsm;

pub use assembler::{Assembler, RecordIter};
pub use field_reader::FieldReader;
pub use record_fsm::RecordFsm;
