use ahash::AHashMap;
use nestor_common::Result;

use crate::schema::{Cardinality, FieldDef, FieldId, ScalarType, Schema};

/// A builder for creating a nested record schema.
///
/// Name clashes and empty groups are not rejected eagerly: they are reported
/// by [`SchemaBuilder::finish`] as configuration errors.
#[derive(Debug, Clone)]
pub struct SchemaBuilder {
    name: String,
    /// Top-level fields in declaration order.
    fields: Vec<FieldBuilder>,
    /// A map from field names to their indices in the `fields` vector.
    field_map: AHashMap<String, usize>,
}

impl SchemaBuilder {
    pub fn new(name: impl Into<String>, fields: Vec<FieldBuilder>) -> SchemaBuilder {
        let mut builder = SchemaBuilder {
            name: name.into(),
            fields: Default::default(),
            field_map: Default::default(),
        };
        for field in fields {
            builder.add_field(field);
        }
        builder
    }

    /// Adds a top-level field.
    pub fn add_field(&mut self, field: FieldBuilder) {
        self.field_map
            .entry(field.name().to_string())
            .or_insert(self.fields.len());
        self.fields.push(field);
    }

    pub fn with_field(mut self, field: FieldBuilder) -> SchemaBuilder {
        self.add_field(field);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[FieldBuilder] {
        &self.fields
    }

    pub fn find_field(&self, name: &str) -> Option<&FieldBuilder> {
        self.field_map.get(name).map(|&i| &self.fields[i])
    }

    pub fn find_field_mut(&mut self, name: &str) -> Option<&mut FieldBuilder> {
        self.field_map.get(name).map(|&i| &mut self.fields[i])
    }

    /// Flattens the builder tree into a parent-linked node list, assigning
    /// field ids in depth-first order (the root gets id `0`).
    pub fn to_nodes(&self) -> Result<Vec<FieldDef>> {
        let mut defs = vec![FieldDef::root(self.name.clone())];
        for field in &self.fields {
            field.append_nodes(FieldId::ROOT, &mut defs)?;
        }
        Ok(defs)
    }

    /// Validates the tree and freezes it into a [`Schema`].
    pub fn finish(self) -> Result<Schema> {
        Schema::from_nodes(self.to_nodes()?)
    }
}

/// A builder for a single field: either a scalar leaf or a group of child fields.
#[derive(Debug, Clone)]
pub struct FieldBuilder {
    name: String,
    cardinality: Cardinality,
    scalar_type: Option<ScalarType>,
    children: Vec<FieldBuilder>,
    child_map: AHashMap<String, usize>,
}

impl FieldBuilder {
    pub fn new(
        name: impl Into<String>,
        cardinality: Cardinality,
        scalar_type: impl Into<Option<ScalarType>>,
    ) -> FieldBuilder {
        FieldBuilder {
            name: name.into(),
            cardinality,
            scalar_type: scalar_type.into(),
            children: Vec::new(),
            child_map: Default::default(),
        }
    }

    pub fn required(name: impl Into<String>, scalar_type: ScalarType) -> FieldBuilder {
        FieldBuilder::new(name, Cardinality::Required, scalar_type)
    }

    pub fn optional(name: impl Into<String>, scalar_type: ScalarType) -> FieldBuilder {
        FieldBuilder::new(name, Cardinality::Optional, scalar_type)
    }

    pub fn repeated(name: impl Into<String>, scalar_type: ScalarType) -> FieldBuilder {
        FieldBuilder::new(name, Cardinality::Repeated, scalar_type)
    }

    pub fn required_group(name: impl Into<String>) -> FieldBuilder {
        FieldBuilder::new(name, Cardinality::Required, None)
    }

    pub fn optional_group(name: impl Into<String>) -> FieldBuilder {
        FieldBuilder::new(name, Cardinality::Optional, None)
    }

    pub fn repeated_group(name: impl Into<String>) -> FieldBuilder {
        FieldBuilder::new(name, Cardinality::Repeated, None)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cardinality(&self) -> Cardinality {
        self.cardinality
    }

    pub fn scalar_type(&self) -> Option<ScalarType> {
        self.scalar_type
    }

    pub fn children(&self) -> &[FieldBuilder] {
        &self.children
    }

    pub fn add_child(&mut self, child: FieldBuilder) {
        self.child_map
            .entry(child.name().to_string())
            .or_insert(self.children.len());
        self.children.push(child);
    }

    pub fn with_child(mut self, child: FieldBuilder) -> FieldBuilder {
        self.add_child(child);
        self
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = FieldBuilder>) -> FieldBuilder {
        for child in children {
            self.add_child(child);
        }
        self
    }

    pub fn find_child(&self, name: &str) -> Option<&FieldBuilder> {
        self.child_map.get(name).map(|&i| &self.children[i])
    }

    pub fn find_child_mut(&mut self, name: &str) -> Option<&mut FieldBuilder> {
        self.child_map.get(name).map(|&i| &mut self.children[i])
    }

    fn append_nodes(&self, parent: FieldId, defs: &mut Vec<FieldDef>) -> Result<()> {
        let id = FieldId::try_from(defs.len())?;
        defs.push(FieldDef {
            name: self.name.clone(),
            cardinality: self.cardinality,
            scalar_type: self.scalar_type,
            parent: Some(parent),
        });
        for child in &self.children {
            child.append_nodes(id, defs)?;
        }
        Ok(())
    }
}
