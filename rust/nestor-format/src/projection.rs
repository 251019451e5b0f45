//! Leaf projections: the subset of columns a reader reconstructs records from.
//!
//! A [`Projection`] is a non-empty set of leaf fields kept in schema
//! (depth-first) order, independent of the order they were requested in.
//! Reconstructing a record through a projection yields the original record
//! with every non-projected field erased; [`Projection::erase`] computes that
//! expected result directly from a full record.
//!
//! ```text
//! Schema:                 Projection [doc_id, name.language.country]:
//! root                    root
//! ├── doc_id              ├── doc_id
//! ├── links               └── name
//! │   ├── backward            └── language
//! │   └── forward                 └── country
//! └── name
//!     ├── language
//!     │   ├── code
//!     │   └── country
//!     └── url
//! ```

use std::sync::Arc;

use nestor_common::{Result, error::Error};

use crate::{
    schema::{FieldId, Schema},
    value::{Record, Value},
};

/// A validated set of projected leaf fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Projection {
    fields: Arc<[FieldId]>,
}

impl Projection {
    /// Creates a projection of the given leaf fields.
    ///
    /// # Errors
    ///
    /// Unknown ids, group fields and duplicates are schema mismatches; an empty
    /// list is an invalid argument.
    pub fn new(schema: &Schema, fields: impl IntoIterator<Item = FieldId>) -> Result<Projection> {
        let mut ordered = Vec::new();
        for id in fields {
            let node = schema.resolve(id)?;
            if !node.is_leaf() {
                return Err(Error::schema_mismatch(
                    node.path_name(),
                    "only leaf fields can be projected",
                ));
            }
            ordered.push(id);
        }
        if ordered.is_empty() {
            return Err(Error::invalid_arg("projection", "no fields selected"));
        }

        // Leaf ordinals follow the depth-first order of the schema.
        ordered.sort_by_key(|&id| schema.leaf_ordinal(id));
        if let Some(dup) = ordered.windows(2).find(|w| w[0] == w[1]) {
            return Err(Error::schema_mismatch(
                schema.resolve(dup[0])?.path_name(),
                "field is projected more than once",
            ));
        }

        Ok(Projection {
            fields: ordered.into(),
        })
    }

    /// Creates a projection from dot-separated field paths.
    pub fn from_paths<S: AsRef<str>>(
        schema: &Schema,
        paths: impl IntoIterator<Item = S>,
    ) -> Result<Projection> {
        let ids = paths
            .into_iter()
            .map(|path| {
                let path = path.as_ref();
                schema
                    .find_field(path)
                    .ok_or_else(|| Error::schema_mismatch(path, "no such field"))
            })
            .collect::<Result<Vec<_>>>()?;
        Projection::new(schema, ids)
    }

    /// Projection of every leaf of the schema.
    pub fn all(schema: &Schema) -> Projection {
        Projection {
            fields: schema.leaves().into(),
        }
    }

    /// Projected leaves in schema order.
    pub fn fields(&self) -> &[FieldId] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn contains(&self, id: FieldId) -> bool {
        self.fields.contains(&id)
    }

    /// Position of `id` within the projection.
    pub fn position(&self, id: FieldId) -> Option<usize> {
        self.fields.iter().position(|&f| f == id)
    }

    /// Returns `true` if `id` is projected or has a projected descendant.
    pub fn covers(&self, schema: &Schema, id: FieldId) -> bool {
        id.is_root()
            || self
                .fields
                .iter()
                .any(|&leaf| schema.ancestry(leaf).contains(&id))
    }

    /// Removes every field that neither is projected nor contains a projected
    /// field.
    ///
    /// Group instances on the path to a projected leaf are kept even when they
    /// end up empty, because the reader reconstructs them from the definition
    /// levels of the projected column.
    pub fn erase(&self, schema: &Schema, record: &Record) -> Record {
        self.erase_group(schema, FieldId::ROOT, record)
    }

    fn erase_group(&self, schema: &Schema, group: FieldId, record: &Record) -> Record {
        let mut erased = Record::new();
        let Some(node) = schema.field(group) else {
            return erased;
        };
        for &child in node.children() {
            let Some(child_node) = schema.field(child) else {
                continue;
            };
            if !self.covers(schema, child) {
                continue;
            }
            let values = record.get_all(child_node.name());
            if child_node.is_leaf() {
                erased = erased.with_all(child_node.name(), values.iter().cloned());
            } else {
                let nested = values.iter().map(|value| match value {
                    Value::Record(inner) => Value::Record(self.erase_group(schema, child, inner)),
                    other => other.clone(),
                });
                erased = erased.with_all(child_node.name(), nested);
            }
        }
        erased
    }
}
