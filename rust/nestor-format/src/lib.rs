//! Schema model of nested, repeated records: the schema tree with its
//! repetition and definition levels, the schema builder, the in-memory record
//! representation and leaf projections.

pub mod projection;
pub mod schema;
pub mod schema_builder;
pub mod value;
#[cfg(test)]
mod tests;

pub use projection::Projection;
pub use schema::{Cardinality, FieldId, Level, ScalarType, Schema};
pub use schema_builder::{FieldBuilder, SchemaBuilder};
pub use value::{Record, Value};
