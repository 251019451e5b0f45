//! Writer tree mirroring the schema, routing values and nulls to leaf columns.

use std::sync::Arc;

use nestor_common::{Result, error::Error};
use nestor_format::{FieldId, Level, Schema, Value};

use super::row_sink::RowSink;

/// Role of a writer node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriterKind {
    /// Writes into the column with the given leaf ordinal.
    Leaf { column: usize },
    /// Fans nulls out to its children.
    Inner { children: Vec<FieldId> },
}

/// One node of the writer tree.
#[derive(Debug, Clone)]
pub struct WriterNode {
    field: FieldId,
    definition_level: Level,
    repetition_level: Level,
    kind: WriterKind,
}

impl WriterNode {
    pub fn field(&self) -> FieldId {
        self.field
    }

    /// Definition level of a present value of this field.
    pub fn definition_level(&self) -> Level {
        self.definition_level
    }

    /// Repetition level of a repeated occurrence of this field.
    pub fn repetition_level(&self) -> Level {
        self.repetition_level
    }

    pub fn kind(&self) -> &WriterKind {
        &self.kind
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, WriterKind::Leaf { .. })
    }

    /// Level passed down when this field is absent from a present parent.
    pub fn null_definition_level(&self) -> Level {
        self.definition_level.saturating_sub(1)
    }
}

/// Arena of writer nodes, indexed by [`FieldId`], root included.
#[derive(Debug, Clone)]
pub struct WriterTree {
    schema: Arc<Schema>,
    nodes: Vec<WriterNode>,
}

impl WriterTree {
    pub fn new(schema: &Arc<Schema>) -> WriterTree {
        let mut nodes = Vec::with_capacity(schema.len());
        nodes.push(WriterNode {
            field: FieldId::ROOT,
            definition_level: 0,
            repetition_level: 0,
            kind: WriterKind::Inner {
                children: schema.root().children().to_vec(),
            },
        });
        for node in schema.fields() {
            let kind = match schema.leaf_ordinal(node.id()) {
                Some(column) => WriterKind::Leaf { column },
                None => WriterKind::Inner {
                    children: node.children().to_vec(),
                },
            };
            nodes.push(WriterNode {
                field: node.id(),
                definition_level: node.max_definition_level(),
                repetition_level: node.max_repetition_level(),
                kind,
            });
        }
        log::debug!(
            "writer tree for '{}': {} nodes, {} columns",
            schema.name(),
            nodes.len(),
            schema.leaves().len()
        );
        WriterTree {
            schema: schema.clone(),
            nodes,
        }
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn root(&self) -> &WriterNode {
        &self.nodes[0]
    }

    pub fn node(&self, field: FieldId) -> Result<&WriterNode> {
        self.nodes.get(field.as_usize()).ok_or_else(|| {
            Error::schema_mismatch(format!("field #{field}"), "no writer for this field")
        })
    }

    /// Writer of `child` among the immediate children of `parent`.
    pub fn find_child(&self, parent: FieldId, child: FieldId) -> Result<&WriterNode> {
        match &self.node(parent)?.kind {
            WriterKind::Inner { children } if children.contains(&child) => self.node(child),
            _ => Err(Error::schema_mismatch(
                self.path(child),
                format!("not a child of '{}'", self.path(parent)),
            )),
        }
    }

    /// Number of leaf columns the tree writes to.
    pub fn column_count(&self) -> usize {
        self.schema.leaves().len()
    }

    /// Writes a present scalar value into a leaf column, at the leaf's
    /// definition level.
    pub fn write_value<S: RowSink + ?Sized>(
        &self,
        field: FieldId,
        value: &Value,
        repetition_level: Level,
        sink: &mut S,
    ) -> Result<()> {
        let node = self.node(field)?;
        let WriterKind::Leaf { column } = node.kind else {
            return Err(Error::schema_mismatch(
                self.path(field),
                "a scalar cannot be written to a group",
            ));
        };
        let scalar_type = self.schema.resolve(field)?.scalar_type();
        if value.scalar_type() != scalar_type {
            return Err(Error::schema_mismatch(
                self.path(field),
                format!(
                    "expected {}, got {}",
                    scalar_type.map(|t| t.to_string()).unwrap_or_default(),
                    value.kind_name()
                ),
            ));
        }
        sink.insert(
            column,
            Some(value.clone()),
            repetition_level,
            node.definition_level,
        )
    }

    /// Writes a null at `definition_level` into every column below `field`.
    pub fn write_null<S: RowSink + ?Sized>(
        &self,
        field: FieldId,
        repetition_level: Level,
        definition_level: Level,
        sink: &mut S,
    ) -> Result<()> {
        match &self.node(field)?.kind {
            WriterKind::Leaf { column } => {
                sink.insert(*column, None, repetition_level, definition_level)
            }
            WriterKind::Inner { children } => {
                for &child in children {
                    self.write_null(child, repetition_level, definition_level, sink)?;
                }
                Ok(())
            }
        }
    }

    pub(crate) fn path(&self, field: FieldId) -> String {
        self.schema
            .field(field)
            .map(|node| node.path_name().to_string())
            .unwrap_or_else(|| format!("field #{field}"))
    }
}
