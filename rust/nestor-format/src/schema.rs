//! The static schema tree of a nested record type.
//!
//! A [`Schema`] is an immutable arena of [`FieldNode`]s indexed by [`FieldId`].
//! Node `0` is the implicit root record; it is not a field, it contributes to
//! no repetition or definition level, and it is never reported as a common
//! ancestor. Every other node is either a group (an inner node with ordered
//! children) or a leaf with a scalar type.
//!
//! The repetition and definition levels are computed once, when the schema is
//! constructed, and cached on every node:
//!
//! ```text
//! root
//! ├── doc_id          required int64      r=0 d=0
//! ├── links           optional group      r=0 d=1
//! │   ├── backward    repeated int64      r=1 d=2
//! │   └── forward     repeated int64      r=1 d=2
//! └── name            repeated group      r=1 d=1
//!     ├── language    repeated group      r=2 d=2
//!     │   ├── code    required string     r=2 d=2
//!     │   └── country optional string     r=2 d=3
//!     └── url         optional string     r=1 d=2
//! ```

use std::sync::Arc;

use ahash::AHashMap;
use nestor_common::{Result, error::Error};

/// Repetition or definition level.
pub type Level = u16;

/// Identifier of a node in the schema tree.
///
/// Ids are dense: a schema with `n` nodes uses ids `0..n`, with `0` being the root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldId(u32);

impl FieldId {
    /// The implicit root record node.
    pub const ROOT: FieldId = FieldId(0);

    pub const fn new(id: u32) -> FieldId {
        FieldId(id)
    }

    pub const fn is_root(&self) -> bool {
        self.0 == 0
    }

    pub const fn as_u32(&self) -> u32 {
        self.0
    }

    pub const fn as_usize(&self) -> usize {
        self.0 as usize
    }
}

impl From<u32> for FieldId {
    fn from(value: u32) -> Self {
        FieldId(value)
    }
}

impl TryFrom<usize> for FieldId {
    type Error = Error;

    fn try_from(value: usize) -> Result<Self> {
        u32::try_from(value)
            .map(FieldId)
            .map_err(|_| Error::invalid_arg("field_id", format!("{value} does not fit in u32")))
    }
}

impl From<FieldId> for usize {
    fn from(value: FieldId) -> Self {
        value.as_usize()
    }
}

impl std::fmt::Display for FieldId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// How many values a field may hold within one instance of its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cardinality {
    Required,
    Optional,
    Repeated,
}

impl Cardinality {
    #[inline]
    pub fn is_repeated(&self) -> bool {
        matches!(self, Cardinality::Repeated)
    }

    #[inline]
    pub fn is_required(&self) -> bool {
        matches!(self, Cardinality::Required)
    }

    /// Optional and repeated fields may be absent, and therefore add one
    /// definition level.
    #[inline]
    pub fn may_be_absent(&self) -> bool {
        !self.is_required()
    }
}

impl std::fmt::Display for Cardinality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Cardinality::Required => "required",
            Cardinality::Optional => "optional",
            Cardinality::Repeated => "repeated",
        };
        f.write_str(s)
    }
}

/// Type of the values stored in a leaf field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    Boolean,
    Int64,
    Float64,
    String,
}

impl std::fmt::Display for ScalarType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ScalarType::Boolean => "boolean",
            ScalarType::Int64 => "int64",
            ScalarType::Float64 => "float64",
            ScalarType::String => "string",
        };
        f.write_str(s)
    }
}

/// Raw, parent-linked description of a schema node.
///
/// This is the shape an external schema compiler hands over: a flat list where
/// the position in the list is the node's [`FieldId`] and each node points to
/// its parent. Entry `0` must be the root (no parent, no scalar type).
#[derive(Debug, Clone)]
pub struct FieldDef {
    pub name: String,
    pub cardinality: Cardinality,
    pub scalar_type: Option<ScalarType>,
    pub parent: Option<FieldId>,
}

impl FieldDef {
    pub fn root(name: impl Into<String>) -> FieldDef {
        FieldDef {
            name: name.into(),
            cardinality: Cardinality::Required,
            scalar_type: None,
            parent: None,
        }
    }

    pub fn leaf(
        parent: FieldId,
        name: impl Into<String>,
        cardinality: Cardinality,
        scalar_type: ScalarType,
    ) -> FieldDef {
        FieldDef {
            name: name.into(),
            cardinality,
            scalar_type: Some(scalar_type),
            parent: Some(parent),
        }
    }

    pub fn group(parent: FieldId, name: impl Into<String>, cardinality: Cardinality) -> FieldDef {
        FieldDef {
            name: name.into(),
            cardinality,
            scalar_type: None,
            parent: Some(parent),
        }
    }
}

/// A node of the schema tree together with its cached levels.
#[derive(Debug, Clone)]
pub struct FieldNode {
    id: FieldId,
    name: Arc<str>,
    path_name: Arc<str>,
    cardinality: Cardinality,
    scalar_type: Option<ScalarType>,
    parent: Option<FieldId>,
    children: Vec<FieldId>,
    child_lookup: AHashMap<Arc<str>, FieldId>,
    /// Nodes on the path from the root (exclusive) to this node (inclusive).
    ancestry: Arc<[FieldId]>,
    max_repetition_level: Level,
    max_definition_level: Level,
}

impl FieldNode {
    pub fn id(&self) -> FieldId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Dot-separated path from the root, e.g. `name.language.code`.
    /// Empty for the root node.
    pub fn path_name(&self) -> &str {
        &self.path_name
    }

    pub fn cardinality(&self) -> Cardinality {
        self.cardinality
    }

    pub fn is_repeated(&self) -> bool {
        self.cardinality.is_repeated()
    }

    pub fn scalar_type(&self) -> Option<ScalarType> {
        self.scalar_type
    }

    pub fn is_leaf(&self) -> bool {
        self.scalar_type.is_some()
    }

    pub fn is_root(&self) -> bool {
        self.id.is_root()
    }

    /// Parent node, `FieldId::ROOT` for top-level fields and `None` for the root.
    pub fn parent(&self) -> Option<FieldId> {
        self.parent
    }

    pub fn children(&self) -> &[FieldId] {
        &self.children
    }

    pub fn ancestry(&self) -> &[FieldId] {
        &self.ancestry
    }

    pub fn max_repetition_level(&self) -> Level {
        self.max_repetition_level
    }

    pub fn max_definition_level(&self) -> Level {
        self.max_definition_level
    }

    /// Number of nodes on the path from the root (exclusive) to this node
    /// (inclusive), required ones included.
    pub fn full_definition_level(&self) -> Level {
        self.ancestry.len() as Level
    }
}

/// Immutable schema tree of a nested record type.
#[derive(Debug, Clone)]
pub struct Schema {
    nodes: Vec<FieldNode>,
    leaves: Vec<FieldId>,
    leaf_ordinals: Vec<Option<usize>>,
    path_lookup: AHashMap<Arc<str>, FieldId>,
}

impl Schema {
    /// Builds a schema from a parent-linked node list.
    ///
    /// Children keep the relative order in which they appear in `defs`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for dangling parents, cycles, a missing or
    /// malformed root, empty or duplicate sibling names, leaves without a scalar
    /// type, groups without children and nesting too deep for [`Level`].
    pub fn from_nodes(defs: Vec<FieldDef>) -> Result<Schema> {
        let Some(root) = defs.first() else {
            return Err(Error::configuration("schema has no root node"));
        };
        if root.parent.is_some() || root.scalar_type.is_some() {
            return Err(Error::configuration(
                "node 0 must be the root: no parent and no scalar type",
            ));
        }
        if u32::try_from(defs.len()).is_err() {
            return Err(Error::configuration("too many schema nodes"));
        }

        let mut children = vec![Vec::<FieldId>::new(); defs.len()];
        for (i, def) in defs.iter().enumerate().skip(1) {
            let Some(parent) = def.parent else {
                return Err(Error::configuration(format!(
                    "node {i} ('{}') has no parent",
                    def.name
                )));
            };
            if parent.as_usize() >= defs.len() {
                return Err(Error::configuration(format!(
                    "node {i} ('{}') refers to dangling parent {parent}",
                    def.name
                )));
            }
            if parent.as_usize() == i {
                return Err(Error::configuration(format!(
                    "node {i} ('{}') is its own parent",
                    def.name
                )));
            }
            children[parent.as_usize()].push(FieldId::try_from(i)?);
        }

        let mut nodes: Vec<Option<FieldNode>> = vec![None; defs.len()];
        let mut leaves = Vec::new();

        // Depth-first traversal from the root; a node that is not reached sits on
        // (or hangs off) a parent cycle.
        let mut stack = vec![FieldId::ROOT];
        while let Some(id) = stack.pop() {
            let def = &defs[id.as_usize()];
            let node = Self::create_node(id, def, &defs, &nodes, &children[id.as_usize()])?;
            if node.is_leaf() {
                leaves.push(id);
            }
            nodes[id.as_usize()] = Some(node);
            stack.extend(children[id.as_usize()].iter().rev().copied());
        }

        let nodes = nodes
            .into_iter()
            .enumerate()
            .map(|(i, node)| {
                node.ok_or_else(|| {
                    Error::configuration(format!(
                        "node {i} ('{}') is not reachable from the root (parent cycle)",
                        defs[i].name
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let mut leaf_ordinals = vec![None; nodes.len()];
        for (ordinal, leaf) in leaves.iter().enumerate() {
            leaf_ordinals[leaf.as_usize()] = Some(ordinal);
        }

        let path_lookup = nodes
            .iter()
            .skip(1)
            .map(|node| (node.path_name.clone(), node.id))
            .collect();

        log::debug!(
            "schema '{}' built: {} nodes, {} leaves",
            defs[0].name,
            nodes.len(),
            leaves.len()
        );

        Ok(Schema {
            nodes,
            leaves,
            leaf_ordinals,
            path_lookup,
        })
    }

    fn create_node(
        id: FieldId,
        def: &FieldDef,
        defs: &[FieldDef],
        nodes: &[Option<FieldNode>],
        children: &[FieldId],
    ) -> Result<FieldNode> {
        let mut child_lookup = AHashMap::with_capacity(children.len());
        for &child in children {
            let child_name = defs[child.as_usize()].name.as_str();
            if child_name.is_empty() || child_name.contains('.') {
                return Err(Error::configuration(format!(
                    "invalid field name '{child_name}' under '{}'",
                    def.name
                )));
            }
            if child_lookup.insert(Arc::from(child_name), child).is_some() {
                return Err(Error::configuration(format!(
                    "duplicate field '{child_name}' under '{}'",
                    def.name
                )));
            }
        }

        match (def.scalar_type, children.is_empty()) {
            (Some(_), false) => {
                return Err(Error::configuration(format!(
                    "leaf field '{}' must not have children",
                    def.name
                )));
            }
            (None, true) => {
                return Err(Error::configuration(format!(
                    "group '{}' has no children",
                    def.name
                )));
            }
            _ => (),
        }

        if id.is_root() {
            return Ok(FieldNode {
                id,
                name: Arc::from(def.name.as_str()),
                path_name: Arc::from(""),
                cardinality: Cardinality::Required,
                scalar_type: None,
                parent: None,
                children: children.to_vec(),
                child_lookup,
                ancestry: Arc::from([]),
                max_repetition_level: 0,
                max_definition_level: 0,
            });
        }

        // Parents are always created before their children.
        let parent_id = def.parent.unwrap_or(FieldId::ROOT);
        let parent = nodes[parent_id.as_usize()]
            .as_ref()
            .ok_or_else(|| Error::configuration(format!("parent of '{}' missing", def.name)))?;

        let bump = |level: Level, inc: bool| -> Result<Level> {
            level
                .checked_add(inc as Level)
                .ok_or_else(|| Error::configuration(format!("'{}' is nested too deeply", def.name)))
        };
        let max_repetition_level = bump(
            parent.max_repetition_level,
            def.cardinality.is_repeated(),
        )?;
        let max_definition_level = bump(
            parent.max_definition_level,
            def.cardinality.may_be_absent(),
        )?;
        if parent.ancestry.len() >= Level::MAX as usize {
            return Err(Error::configuration(format!(
                "'{}' is nested too deeply",
                def.name
            )));
        }

        let mut ancestry = parent.ancestry.to_vec();
        ancestry.push(id);
        let path_name = if parent.is_root() {
            def.name.clone()
        } else {
            format!("{}.{}", parent.path_name, def.name)
        };

        Ok(FieldNode {
            id,
            name: Arc::from(def.name.as_str()),
            path_name: Arc::from(path_name),
            cardinality: def.cardinality,
            scalar_type: def.scalar_type,
            parent: Some(parent_id),
            children: children.to_vec(),
            child_lookup,
            ancestry: Arc::from(ancestry),
            max_repetition_level,
            max_definition_level,
        })
    }

    /// Name of the record type described by this schema.
    pub fn name(&self) -> &str {
        self.nodes[0].name()
    }

    /// Number of nodes, the root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// A valid schema always holds the root and at least one field.
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    pub fn root(&self) -> &FieldNode {
        &self.nodes[0]
    }

    pub fn contains(&self, id: FieldId) -> bool {
        id.as_usize() < self.nodes.len()
    }

    pub fn field(&self, id: FieldId) -> Option<&FieldNode> {
        self.nodes.get(id.as_usize())
    }

    /// Like [`Schema::field`], but reports unknown ids as a schema mismatch.
    pub fn resolve(&self, id: FieldId) -> Result<&FieldNode> {
        self.field(id).ok_or_else(|| {
            Error::schema_mismatch(
                format!("field #{id}"),
                format!("not part of schema '{}'", self.name()),
            )
        })
    }

    /// All nodes except the root, in id order.
    pub fn fields(&self) -> impl Iterator<Item = &FieldNode> {
        self.nodes.iter().skip(1)
    }

    /// Leaf fields in depth-first (record) order.
    pub fn leaves(&self) -> &[FieldId] {
        &self.leaves
    }

    /// Position of `id` within [`Schema::leaves`], `None` for groups.
    pub fn leaf_ordinal(&self, id: FieldId) -> Option<usize> {
        self.leaf_ordinals.get(id.as_usize()).copied().flatten()
    }

    /// Finds a field by its dot-separated path.
    pub fn find_field(&self, path: &str) -> Option<FieldId> {
        self.path_lookup.get(path).copied()
    }

    /// Finds an immediate child of `parent` by name.
    pub fn find_child(&self, parent: FieldId, name: &str) -> Option<FieldId> {
        self.field(parent)?.child_lookup.get(name).copied()
    }

    /// # Panics
    ///
    /// All level accessors panic if `id` does not belong to this schema.
    pub fn max_repetition_level(&self, id: FieldId) -> Level {
        self.node(id).max_repetition_level
    }

    pub fn max_definition_level(&self, id: FieldId) -> Level {
        self.node(id).max_definition_level
    }

    pub fn full_definition_level(&self, id: FieldId) -> Level {
        self.node(id).full_definition_level()
    }

    /// Nodes from the root (exclusive) down to `id` (inclusive).
    pub fn ancestry(&self, id: FieldId) -> &[FieldId] {
        &self.node(id).ancestry
    }

    /// Returns `true` if `ancestor` lies strictly above `id`.
    pub fn is_ancestor(&self, ancestor: FieldId, id: FieldId) -> bool {
        ancestor != id && (ancestor.is_root() || self.ancestry(id).contains(&ancestor))
    }

    /// Lowest common ancestor of two fields.
    ///
    /// For distinct fields this is the deepest node that lies strictly above
    /// both of them. A field compared with itself is its own common ancestor if
    /// it is repeated (two occurrences are siblings in the same list), and its
    /// parent otherwise. `None` stands for the root record.
    pub fn common_ancestor(&self, a: FieldId, b: FieldId) -> Option<FieldId> {
        if a.is_root() || b.is_root() {
            return None;
        }
        if a == b {
            let node = self.node(a);
            if node.is_repeated() {
                return Some(a);
            }
            return node.parent.filter(|p| !p.is_root());
        }

        let path_a = self.ancestry(a);
        let path_b = self.ancestry(b);
        let above_a = &path_a[..path_a.len() - 1];
        let above_b = &path_b[..path_b.len() - 1];
        let shared = Self::shared_prefix_len(above_a, above_b);
        (shared > 0).then(|| above_a[shared - 1])
    }

    /// Repetition level of the deepest node shared by the root paths of `a`
    /// and `b` (both fields included), `0` if they only share the root.
    ///
    /// For `a == b` this is the field's own maximum repetition level.
    pub fn common_repetition_level(&self, a: FieldId, b: FieldId) -> Level {
        let path_a = self.ancestry(a);
        let path_b = self.ancestry(b);
        let shared = Self::shared_prefix_len(path_a, path_b);
        if shared == 0 {
            0
        } else {
            self.max_repetition_level(path_a[shared - 1])
        }
    }

    /// The repeated node on the path to `id` that owns repetition level `level`.
    pub fn repeated_ancestor_at(&self, id: FieldId, level: Level) -> Option<FieldId> {
        if level == 0 {
            return None;
        }
        self.ancestry(id).iter().copied().find(|&node| {
            let node = self.node(node);
            node.is_repeated() && node.max_repetition_level == level
        })
    }

    fn shared_prefix_len(a: &[FieldId], b: &[FieldId]) -> usize {
        a.iter().zip(b).take_while(|(x, y)| x == y).count()
    }

    #[inline]
    fn node(&self, id: FieldId) -> &FieldNode {
        &self.nodes[id.as_usize()]
    }
}

impl std::fmt::Display for Schema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fn write_node(
            schema: &Schema,
            f: &mut std::fmt::Formatter<'_>,
            id: FieldId,
            indent: usize,
        ) -> std::fmt::Result {
            let node = schema.node(id);
            match node.scalar_type {
                Some(ty) => writeln!(
                    f,
                    "{:indent$}{} {} {};",
                    "",
                    node.cardinality,
                    ty,
                    node.name,
                    indent = indent
                )?,
                None => {
                    writeln!(
                        f,
                        "{:indent$}{} group {} {{",
                        "",
                        node.cardinality,
                        node.name,
                        indent = indent
                    )?;
                    for &child in &node.children {
                        write_node(schema, f, child, indent + 2)?;
                    }
                    writeln!(f, "{:indent$}}}", "", indent = indent)?;
                }
            }
            Ok(())
        }

        writeln!(f, "message {} {{", self.name())?;
        for &child in self.root().children() {
            write_node(self, f, child, 2)?;
        }
        writeln!(f, "}}")
    }
}
