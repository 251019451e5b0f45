//! In-memory representation of nested records.
//!
//! A [`Record`] maps field names to the list of values of that field. A field
//! that holds no value is absent from the map, so an empty repeated field and
//! a missing one describe the same record.

use std::collections::BTreeMap;

use crate::schema::ScalarType;

/// A single field value: a scalar or a nested record (group instance).
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Boolean(bool),
    Int64(i64),
    Float64(f64),
    String(String),
    Record(Record),
}

impl Value {
    /// Scalar type of the value, `None` for nested records.
    pub fn scalar_type(&self) -> Option<ScalarType> {
        match self {
            Value::Boolean(_) => Some(ScalarType::Boolean),
            Value::Int64(_) => Some(ScalarType::Int64),
            Value::Float64(_) => Some(ScalarType::Float64),
            Value::String(_) => Some(ScalarType::String),
            Value::Record(_) => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Record(record) => Some(record),
            _ => None,
        }
    }

    pub fn as_record_mut(&mut self) -> Option<&mut Record> {
        match self {
            Value::Record(record) => Some(record),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Short description of the value kind, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Boolean(_) => "boolean",
            Value::Int64(_) => "int64",
            Value::Float64(_) => "float64",
            Value::String(_) => "string",
            Value::Record(_) => "record",
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int64(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float64(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<Record> for Value {
    fn from(value: Record) -> Self {
        Value::Record(value)
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Boolean(v) => write!(f, "{v}"),
            Value::Int64(v) => write!(f, "{v}"),
            Value::Float64(v) => write!(f, "{v:?}"),
            Value::String(s) => write!(f, "{s:?}"),
            Value::Record(r) => write!(f, "{r}"),
        }
    }
}

/// A nested record: field name to the values of that field.
///
/// Fields are kept in name order, so two records with the same content compare
/// equal regardless of the order in which they were populated.
#[derive(Debug, Clone, Default)]
pub struct Record {
    fields: BTreeMap<String, Vec<Value>>,
}

impl Record {
    pub fn new() -> Record {
        Record::default()
    }

    /// Replaces the values of `name` with a single value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(name.into(), vec![value.into()]);
    }

    /// Appends a value to `name`.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.fields.entry(name.into()).or_default().push(value.into());
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Record {
        self.push(name, value);
        self
    }

    /// Appends all `values` to `name`. An empty iterator leaves the record unchanged.
    pub fn with_all<V: Into<Value>>(
        mut self,
        name: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Record {
        let values = values.into_iter().map(Into::into).collect::<Vec<_>>();
        if !values.is_empty() {
            self.fields.entry(name.into()).or_default().extend(values);
        }
        self
    }

    /// First value of `name`.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name).and_then(|values| values.first())
    }

    /// All values of `name`; empty if the field is absent.
    pub fn get_all(&self, name: &str) -> &[Value] {
        self.fields.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Mutable access to the value list of `name`, creating it if needed.
    ///
    /// Leaving the list empty is fine: [`Record`] treats empty lists as absent.
    pub fn get_all_mut(&mut self, name: &str) -> &mut Vec<Value> {
        self.fields.entry(name.to_string()).or_default()
    }

    pub fn remove(&mut self, name: &str) -> Option<Vec<Value>> {
        self.fields.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.get(name).is_some_and(|values| !values.is_empty())
    }

    /// Iterates over the fields holding at least one value.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &[Value])> {
        self.fields
            .iter()
            .filter(|(_, values)| !values.is_empty())
            .map(|(name, values)| (name.as_str(), values.as_slice()))
    }

    /// Number of fields holding at least one value.
    pub fn len(&self) -> usize {
        self.fields().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.fields().eq(other.fields())
    }
}

impl std::fmt::Display for Record {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("{")?;
        for (i, (name, values)) in self.fields().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name:?}: ")?;
            if values.len() == 1 {
                write!(f, "{}", values[0])?;
            } else {
                f.write_str("[")?;
                for (j, value) in values.iter().enumerate() {
                    if j > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{value}")?;
                }
                f.write_str("]")?;
            }
        }
        f.write_str("}")
    }
}
