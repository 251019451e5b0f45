//! Schema-guided conversion between JSON documents and [`Record`]s.
//!
//! Repeated fields are JSON arrays, groups are JSON objects and `null` stands
//! for an absent field. Keys that the schema does not know are rejected.

use anyhow::{Context, anyhow, bail};
use nestor_format::{FieldId, Record, ScalarType, Schema, Value};

/// Parses a JSON array of documents.
pub fn records_from_json(schema: &Schema, json: &str) -> anyhow::Result<Vec<Record>> {
    let parsed: serde_json::Value = serde_json::from_str(json)?;
    let serde_json::Value::Array(items) = parsed else {
        bail!("expected a JSON array of documents");
    };
    items
        .iter()
        .enumerate()
        .map(|(i, item)| json_to_record(schema, item).with_context(|| format!("document #{i}")))
        .collect()
}

/// Converts a single JSON object into a record of the schema's root type.
pub fn json_to_record(schema: &Schema, json: &serde_json::Value) -> anyhow::Result<Record> {
    decode_group(schema, FieldId::ROOT, json)
}

/// Converts a record back into JSON, the inverse of [`json_to_record`].
pub fn record_to_json(record: &Record) -> serde_json::Value {
    let mut object = serde_json::Map::new();
    for (name, values) in record.fields() {
        let encoded = values.iter().map(value_to_json).collect::<Vec<_>>();
        let encoded = if encoded.len() == 1 {
            encoded.into_iter().next().unwrap_or(serde_json::Value::Null)
        } else {
            serde_json::Value::Array(encoded)
        };
        object.insert(name.to_string(), encoded);
    }
    serde_json::Value::Object(object)
}

fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Boolean(v) => serde_json::Value::Bool(*v),
        Value::Int64(v) => serde_json::Value::from(*v),
        Value::Float64(v) => serde_json::Value::from(*v),
        Value::String(s) => serde_json::Value::String(s.clone()),
        Value::Record(r) => record_to_json(r),
    }
}

fn decode_group(schema: &Schema, group: FieldId, json: &serde_json::Value) -> anyhow::Result<Record> {
    let serde_json::Value::Object(object) = json else {
        bail!("expected a JSON object, got {json}");
    };
    let mut record = Record::new();
    for (key, item) in object {
        let field = schema
            .find_child(group, key)
            .ok_or_else(|| anyhow!("unknown field '{key}'"))?;
        let node = schema.resolve(field)?;
        let items = match item {
            serde_json::Value::Null => continue,
            serde_json::Value::Array(items) if node.is_repeated() => items.as_slice(),
            serde_json::Value::Array(_) => bail!("field '{key}' is not repeated"),
            single => std::slice::from_ref(single),
        };
        for item in items {
            let value = match node.scalar_type() {
                Some(ty) => decode_scalar(ty, item).with_context(|| format!("field '{key}'"))?,
                None => Value::Record(decode_group(schema, field, item)?),
            };
            record.push(key.as_str(), value);
        }
    }
    Ok(record)
}

fn decode_scalar(ty: ScalarType, json: &serde_json::Value) -> anyhow::Result<Value> {
    let value = match ty {
        ScalarType::Boolean => json.as_bool().map(Value::Boolean),
        ScalarType::Int64 => json.as_i64().map(Value::Int64),
        ScalarType::Float64 => json.as_f64().map(Value::Float64),
        ScalarType::String => json.as_str().map(Value::from),
    };
    value.ok_or_else(|| anyhow!("expected {ty}, got {json}"))
}
