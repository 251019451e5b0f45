//! Columnar storage of nested records.
//!
//! Records are shredded into one column per leaf field, each row carrying a
//! repetition and a definition level, and reassembled from any subset of those
//! columns by a finite state machine over the projected fields.

pub mod column;
pub mod options;
pub mod read;
pub mod table;
pub mod write;

#[cfg(test)]
mod tests;

pub use column::{Column, ColumnRow, ColumnValues, Tid};
pub use options::TableOptions;
pub use table::DocumentTable;
