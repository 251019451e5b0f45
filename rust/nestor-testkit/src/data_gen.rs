//! Data generation utilities for testing.
//!
//! Generation is seeded, so a failing test can be reproduced from its seed.

use nestor_format::{Cardinality, FieldId, Record, ScalarType, Schema, Value};

const LANGUAGE_CODES: [&str; 3] = ["en-us", "en-gb", "de-de"];
const COUNTRIES: [&str; 3] = ["us", "gb", "de"];

/// Shape parameters for [`generate_documents`].
#[derive(Debug, Clone)]
pub struct DocumentParams {
    /// Upper bound (exclusive) of `Links.Backward` and `Links.Forward` lengths.
    pub max_links: usize,
    /// Upper bound (exclusive) of the number of `Name` entries.
    pub max_names: usize,
    /// Upper bound (exclusive) of the number of `Language` entries per name.
    pub max_languages: usize,
    /// Probability of each optional field being present.
    pub optional_likelihood: f64,
}

impl Default for DocumentParams {
    fn default() -> Self {
        DocumentParams {
            max_links: 6,
            max_names: 5,
            max_languages: 6,
            optional_likelihood: 0.5,
        }
    }
}

/// Generates `count` random `Document` records with ids `0..count`.
pub fn generate_documents(count: usize, seed: u64, params: &DocumentParams) -> Vec<Record> {
    let mut rng = fastrand::Rng::with_seed(seed);
    (0..count)
        .map(|id| generate_document(&mut rng, id as i64, params))
        .collect()
}

fn generate_document(rng: &mut fastrand::Rng, doc_id: i64, params: &DocumentParams) -> Record {
    let mut doc = Record::new().with("DocId", doc_id);

    if rng.f64() < params.optional_likelihood {
        let backward = (0..rng.usize(0..params.max_links)).map(|_| rng.i64(0..1000));
        let backward = backward.collect::<Vec<_>>();
        let forward = (0..rng.usize(0..params.max_links)).map(|_| rng.i64(0..1000));
        let forward = forward.collect::<Vec<_>>();
        let links = Record::new()
            .with_all("Backward", backward)
            .with_all("Forward", forward);
        doc.push("Links", links);
    }

    for _ in 0..rng.usize(0..params.max_names) {
        let mut name = Record::new();
        for _ in 0..rng.usize(0..params.max_languages) {
            let idx = rng.usize(0..LANGUAGE_CODES.len());
            let mut language = Record::new().with("Code", LANGUAGE_CODES[idx]);
            if rng.f64() < params.optional_likelihood {
                language.set("Country", COUNTRIES[idx]);
            }
            name.push("Language", language);
        }
        if rng.f64() < params.optional_likelihood {
            name.set("Url", format!("http://{}.{}", random_word(rng, 10), random_word(rng, 2)));
        }
        doc.push("Name", name);
    }
    doc
}

/// Shape parameters for [`generate_records`].
#[derive(Debug, Clone)]
pub struct RecordParams {
    /// Upper bound (inclusive) of the number of values of a repeated field.
    pub max_repeat: usize,
    /// Probability of each optional field being present.
    pub optional_likelihood: f64,
}

impl Default for RecordParams {
    fn default() -> Self {
        RecordParams {
            max_repeat: 3,
            optional_likelihood: 0.6,
        }
    }
}

/// Generates `count` random records that conform to an arbitrary schema.
pub fn generate_records(
    schema: &Schema,
    count: usize,
    seed: u64,
    params: &RecordParams,
) -> Vec<Record> {
    let mut rng = fastrand::Rng::with_seed(seed);
    (0..count)
        .map(|_| random_group(schema, FieldId::ROOT, &mut rng, params))
        .collect()
}

fn random_group(
    schema: &Schema,
    group: FieldId,
    rng: &mut fastrand::Rng,
    params: &RecordParams,
) -> Record {
    let mut record = Record::new();
    let Some(node) = schema.field(group) else {
        return record;
    };
    for &child in node.children() {
        let Some(child_node) = schema.field(child) else {
            continue;
        };
        let count = match child_node.cardinality() {
            Cardinality::Required => 1,
            Cardinality::Optional => (rng.f64() < params.optional_likelihood) as usize,
            Cardinality::Repeated => rng.usize(0..=params.max_repeat),
        };
        for _ in 0..count {
            let value = match child_node.scalar_type() {
                Some(ty) => random_scalar(rng, ty),
                None => Value::Record(random_group(schema, child, rng, params)),
            };
            record.push(child_node.name(), value);
        }
    }
    record
}

fn random_scalar(rng: &mut fastrand::Rng, ty: ScalarType) -> Value {
    match ty {
        ScalarType::Boolean => Value::Boolean(rng.bool()),
        ScalarType::Int64 => Value::Int64(rng.i64(-1000..1000)),
        ScalarType::Float64 => Value::Float64(rng.i32(-1000..1000) as f64 / 8.0),
        ScalarType::String => {
            let len = rng.usize(0..8);
            Value::String(random_word(rng, len))
        }
    }
}

fn random_word(rng: &mut fastrand::Rng, len: usize) -> String {
    (0..len).map(|_| rng.lowercase()).collect()
}
