//! Finite state machine that sequences column reads during record assembly.
//!
//! States are the projected leaf fields; after reading a row of field `F`, the
//! repetition level of `F`'s next row selects the next field to read, or the
//! end of the record.
//!
//! For the full `Document` projection this yields the machine of the Dremel
//! paper:
//!
//! ```text
//! DocId ─0─> Links.Backward ─0─> Links.Forward ─0─> Name.Language.Code
//!              ↺ 1                ↺ 1                 │ 0,1,2
//!                                                     v
//!      Name.Url <──0,1── Name.Language.Country ──2──> Name.Language.Code
//!         │ 1 ──> Name.Language.Code
//!         │ 0 ──> end
//! ```

use ahash::AHashMap;
use itertools::Itertools;
use nestor_common::{Result, error::Error};
use nestor_format::{FieldId, Level, Projection, Schema};

/// Transition table over the fields of a projection.
#[derive(Debug, Clone)]
pub struct RecordFsm {
    fields: Vec<FieldId>,
    names: Vec<String>,
    positions: AHashMap<FieldId, usize>,
    /// `transitions[i][level]` is the field read after `fields[i]` when the
    /// next repetition level is `level`; `None` ends the record.
    transitions: Vec<Vec<Option<FieldId>>>,
}

impl RecordFsm {
    /// Builds the machine for `projection`, whose fields are in schema order.
    pub fn new(schema: &Schema, projection: &Projection) -> Result<RecordFsm> {
        let fields = projection.fields().to_vec();
        if fields.is_empty() {
            return Err(Error::invalid_arg("projection", "no fields selected"));
        }
        let names = fields
            .iter()
            .map(|&f| schema.resolve(f).map(|node| node.path_name().to_string()))
            .collect::<Result<Vec<_>>>()?;

        let mut transitions = Vec::with_capacity(fields.len());
        for (i, &field) in fields.iter().enumerate() {
            let max_level = schema.max_repetition_level(field) as usize;
            let barrier = fields.get(i + 1).copied();
            let barrier_level = barrier
                .map(|b| schema.common_repetition_level(field, b) as usize)
                .unwrap_or(0);

            let mut row: Vec<Option<Option<FieldId>>> = vec![None; max_level + 1];

            // Backward edges. Walking from the nearest preceding field to the
            // first one leaves the earliest field at each level.
            for &pre in fields[..i].iter().rev() {
                if schema.max_repetition_level(pre) as usize > barrier_level {
                    let back_level = schema.common_repetition_level(pre, field) as usize;
                    row[back_level] = Some(Some(pre));
                }
            }

            // Levels above the barrier without a backward edge restart at the
            // target of the next deeper level, the field itself at the deepest.
            for level in (barrier_level + 1..=max_level).rev() {
                if row[level].is_none() {
                    row[level] = match row.get(level + 1) {
                        Some(&deeper) => deeper,
                        None => Some(Some(field)),
                    };
                }
            }

            for slot in row.iter_mut().take(barrier_level.min(max_level) + 1) {
                *slot = Some(barrier);
            }

            transitions.push(row.into_iter().map(|t| t.flatten()).collect::<Vec<_>>());
        }

        let positions = fields.iter().enumerate().map(|(i, &f)| (f, i)).collect();
        let fsm = RecordFsm {
            fields,
            names,
            positions,
            transitions,
        };
        log::debug!(
            "record FSM over {} fields: {} transitions",
            fsm.fields.len(),
            fsm.transition_count()
        );
        Ok(fsm)
    }

    /// The field read first in every record.
    pub fn start(&self) -> FieldId {
        self.fields[0]
    }

    /// States of the machine, in schema order.
    pub fn fields(&self) -> &[FieldId] {
        &self.fields
    }

    pub fn contains(&self, field: FieldId) -> bool {
        self.positions.contains_key(&field)
    }

    /// Position of `field` in the read order.
    pub fn position(&self, field: FieldId) -> Option<usize> {
        self.positions.get(&field).copied()
    }

    /// Next field after reading `field` when the next repetition level is
    /// `level`; `None` ends the record.
    ///
    /// Levels above the field's maximum repetition level behave like the
    /// maximum.
    pub fn next_field(&self, field: FieldId, level: Level) -> Option<FieldId> {
        let row = &self.transitions[self.position(field)?];
        let level = (level as usize).min(row.len() - 1);
        row[level]
    }

    /// Exact table lookup: `None` if `(field, level)` is not a state of the
    /// machine, `Some(None)` for a transition to the end.
    pub fn transition(&self, field: FieldId, level: Level) -> Option<Option<FieldId>> {
        let row = self.transitions.get(self.position(field)?)?;
        row.get(level as usize).copied()
    }

    /// All transitions as `(source, level, target)`, sources in read order.
    pub fn transitions(&self) -> impl Iterator<Item = (FieldId, Level, Option<FieldId>)> + '_ {
        self.fields
            .iter()
            .zip(&self.transitions)
            .flat_map(|(&field, row)| {
                row.iter()
                    .enumerate()
                    .map(move |(level, &target)| (field, level as Level, target))
            })
    }

    pub fn transition_count(&self) -> usize {
        self.transitions.iter().map(Vec::len).sum()
    }

    /// Renders the machine as a Graphviz digraph, one edge per
    /// source/target pair labelled with its sorted repetition levels.
    pub fn to_graphviz(&self) -> String {
        let mut out = String::new();
        out.push_str("digraph finite_state_machine {\n");
        out.push_str("    size=\"8,5\"\n");
        out.push_str("    node [shape = doublecircle]; \"end\" [label=\"\"];\n");
        out.push_str("    node [shape = rect, style = rounded];\n\n");
        for (i, row) in self.transitions.iter().enumerate() {
            let edges = row
                .iter()
                .enumerate()
                .map(|(level, &target)| (self.state_name(target), level))
                .into_group_map();
            let targets = edges.keys().sorted().collect::<Vec<_>>();
            for target in targets {
                let labels = edges[target].iter().sorted().join(", ");
                out.push_str(&format!(
                    "    \"{}\" -> \"{}\" [label=\"[{}]\"];\n",
                    self.names[i], target, labels
                ));
            }
        }
        out.push_str("}\n");
        out
    }

    fn state_name(&self, field: Option<FieldId>) -> &str {
        field
            .and_then(|f| self.position(f))
            .map(|p| self.names[p].as_str())
            .unwrap_or("end")
    }
}
