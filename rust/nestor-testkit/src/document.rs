//! The `Document` schema and sample documents from the Dremel paper.
//!
//! ```text
//! message Document {
//!   required int64 DocId;
//!   optional group Links {
//!     repeated int64 Backward;
//!     repeated int64 Forward;
//!   }
//!   repeated group Name {
//!     repeated group Language {
//!       required string Code;
//!       optional string Country;
//!     }
//!     optional string Url;
//!   }
//! }
//! ```

use std::sync::Arc;

use nestor_format::{FieldBuilder, Record, ScalarType, Schema, SchemaBuilder};

/// The larger sample document (`r1` in the paper).
pub const PAPER_LARGE_DOCUMENT: &str = r#"
[
  {
    "DocId": 10,
    "Links": {
      "Forward": [20, 40, 60]
    },
    "Name": [
      {
        "Language": [
          { "Code": "en-us", "Country": "us" },
          { "Code": "en" }
        ],
        "Url": "http://A"
      },
      {
        "Url": "http://B"
      },
      {
        "Language": [
          { "Code": "en-gb", "Country": "gb" }
        ]
      }
    ]
  }
]
"#;

/// The smaller sample document (`r2` in the paper).
pub const PAPER_SMALL_DOCUMENT: &str = r#"
[
  {
    "DocId": 20,
    "Links": {
      "Backward": [10, 30],
      "Forward": [80]
    },
    "Name": [
      { "Url": "http://C" }
    ]
  }
]
"#;

/// A document with nothing but its required id.
pub const EMPTY_DOCUMENT: &str = r#"
[
  { "DocId": 30 }
]
"#;

pub fn document_schema_builder() -> SchemaBuilder {
    SchemaBuilder::new(
        "Document",
        vec![
            FieldBuilder::required("DocId", ScalarType::Int64),
            FieldBuilder::optional_group("Links")
                .with_child(FieldBuilder::repeated("Backward", ScalarType::Int64))
                .with_child(FieldBuilder::repeated("Forward", ScalarType::Int64)),
            FieldBuilder::repeated_group("Name")
                .with_child(
                    FieldBuilder::repeated_group("Language")
                        .with_child(FieldBuilder::required("Code", ScalarType::String))
                        .with_child(FieldBuilder::optional("Country", ScalarType::String)),
                )
                .with_child(FieldBuilder::optional("Url", ScalarType::String)),
        ],
    )
}

/// Returns the `Document` schema.
pub fn document_schema() -> Arc<Schema> {
    Arc::new(
        document_schema_builder()
            .finish()
            .expect("valid Document schema"),
    )
}

pub fn large_document() -> anyhow::Result<Record> {
    single_document(PAPER_LARGE_DOCUMENT)
}

pub fn small_document() -> anyhow::Result<Record> {
    single_document(PAPER_SMALL_DOCUMENT)
}

pub fn empty_document() -> anyhow::Result<Record> {
    single_document(EMPTY_DOCUMENT)
}

/// The three sample documents, in the order large, small, empty.
pub fn paper_documents() -> anyhow::Result<Vec<Record>> {
    Ok(vec![large_document()?, small_document()?, empty_document()?])
}

fn single_document(json: &str) -> anyhow::Result<Record> {
    let schema = document_schema();
    let mut records = crate::json::records_from_json(&schema, json)?;
    if records.len() != 1 {
        anyhow::bail!("expected a single document, got {}", records.len());
    }
    Ok(records.remove(0))
}

#[cfg(test)]
mod tests {
    use nestor_format::Value;

    #[test]
    fn test_large_document_shape() {
        let doc = super::large_document().unwrap();
        assert_eq!(doc.get("DocId"), Some(&Value::Int64(10)));
        assert_eq!(doc.get_all("Name").len(), 3);
        let links = doc.get("Links").and_then(Value::as_record).unwrap();
        assert!(!links.contains("Backward"));
        assert_eq!(links.get_all("Forward").len(), 3);
    }

    #[test]
    fn test_empty_document_shape() {
        let doc = super::empty_document().unwrap();
        assert_eq!(doc.len(), 1);
    }
}
