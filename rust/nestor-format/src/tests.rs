use crate::{
    projection::Projection,
    schema::{Cardinality, FieldDef, FieldId, ScalarType, Schema},
    schema_builder::{FieldBuilder, SchemaBuilder},
    value::{Record, Value},
};

fn document_schema() -> Schema {
    SchemaBuilder::new(
        "Document",
        vec![
            FieldBuilder::required("doc_id", ScalarType::Int64),
            FieldBuilder::optional_group("links")
                .with_child(FieldBuilder::repeated("backward", ScalarType::Int64))
                .with_child(FieldBuilder::repeated("forward", ScalarType::Int64)),
            FieldBuilder::repeated_group("name")
                .with_child(
                    FieldBuilder::repeated_group("language")
                        .with_child(FieldBuilder::required("code", ScalarType::String))
                        .with_child(FieldBuilder::optional("country", ScalarType::String)),
                )
                .with_child(FieldBuilder::optional("url", ScalarType::String)),
        ],
    )
    .finish()
    .unwrap()
}

fn id(schema: &Schema, path: &str) -> FieldId {
    schema.find_field(path).unwrap()
}

#[test]
fn test_document_levels() {
    let schema = document_schema();
    let expected = [
        ("doc_id", 0, 0, 1),
        ("links", 0, 1, 1),
        ("links.backward", 1, 2, 2),
        ("links.forward", 1, 2, 2),
        ("name", 1, 1, 1),
        ("name.language", 2, 2, 2),
        ("name.language.code", 2, 2, 3),
        ("name.language.country", 2, 3, 3),
        ("name.url", 1, 2, 2),
    ];
    for (path, rep, def, full) in expected {
        let field = id(&schema, path);
        assert_eq!(schema.max_repetition_level(field), rep, "{path}");
        assert_eq!(schema.max_definition_level(field), def, "{path}");
        assert_eq!(schema.full_definition_level(field), full, "{path}");
    }
    assert_eq!(schema.max_repetition_level(FieldId::ROOT), 0);
    assert_eq!(schema.max_definition_level(FieldId::ROOT), 0);
}

#[test]
fn test_leaves_in_record_order() {
    let schema = document_schema();
    let leaves = schema
        .leaves()
        .iter()
        .map(|&leaf| schema.field(leaf).unwrap().path_name().to_string())
        .collect::<Vec<_>>();
    assert_eq!(
        leaves,
        [
            "doc_id",
            "links.backward",
            "links.forward",
            "name.language.code",
            "name.language.country",
            "name.url"
        ]
    );
    assert_eq!(schema.leaf_ordinal(id(&schema, "name.url")), Some(5));
    assert_eq!(schema.leaf_ordinal(id(&schema, "name")), None);
}

#[test]
fn test_find_child() {
    let schema = document_schema();
    let name = id(&schema, "name");
    let language = schema.find_child(name, "language").unwrap();
    assert_eq!(language, id(&schema, "name.language"));
    assert!(schema.find_child(name, "code").is_none());
    assert_eq!(schema.find_child(FieldId::ROOT, "doc_id"), Some(id(&schema, "doc_id")));
    assert_eq!(
        schema.field(language).unwrap().parent(),
        Some(name),
    );
    assert!(schema.resolve(FieldId::new(100)).unwrap_err().is_schema_mismatch());
}

#[test]
fn test_common_ancestor() {
    let schema = document_schema();
    let code = id(&schema, "name.language.code");
    let country = id(&schema, "name.language.country");
    let url = id(&schema, "name.url");
    let backward = id(&schema, "links.backward");
    let forward = id(&schema, "links.forward");
    let doc_id = id(&schema, "doc_id");

    assert_eq!(
        schema.common_ancestor(code, country),
        Some(id(&schema, "name.language"))
    );
    assert_eq!(schema.common_ancestor(url, code), Some(id(&schema, "name")));
    assert_eq!(
        schema.common_ancestor(backward, forward),
        Some(id(&schema, "links"))
    );
    assert_eq!(schema.common_ancestor(doc_id, url), None);
    assert_eq!(schema.common_ancestor(forward, code), None);

    // A repeated field shares its own list with itself.
    assert_eq!(schema.common_ancestor(backward, backward), Some(backward));
    assert_eq!(
        schema.common_ancestor(country, country),
        Some(id(&schema, "name.language"))
    );
    assert_eq!(schema.common_ancestor(doc_id, doc_id), None);
}

#[test]
fn test_common_repetition_level() {
    let schema = document_schema();
    let code = id(&schema, "name.language.code");
    let country = id(&schema, "name.language.country");
    let url = id(&schema, "name.url");
    let backward = id(&schema, "links.backward");
    let forward = id(&schema, "links.forward");
    let doc_id = id(&schema, "doc_id");

    assert_eq!(schema.common_repetition_level(backward, forward), 0);
    assert_eq!(schema.common_repetition_level(backward, backward), 1);
    assert_eq!(schema.common_repetition_level(url, code), 1);
    assert_eq!(schema.common_repetition_level(country, code), 2);
    assert_eq!(schema.common_repetition_level(doc_id, country), 0);
    assert_eq!(schema.common_repetition_level(url, url), 1);
}

#[test]
fn test_repeated_ancestor_at() {
    let schema = document_schema();
    let code = id(&schema, "name.language.code");
    assert_eq!(schema.repeated_ancestor_at(code, 1), Some(id(&schema, "name")));
    assert_eq!(
        schema.repeated_ancestor_at(code, 2),
        Some(id(&schema, "name.language"))
    );
    assert_eq!(schema.repeated_ancestor_at(code, 0), None);
    assert_eq!(schema.repeated_ancestor_at(code, 3), None);
}

#[test]
fn test_schema_display() {
    let schema = document_schema();
    let text = schema.to_string();
    assert!(text.starts_with("message Document {"));
    assert!(text.contains("  repeated group name {"));
    assert!(text.contains("      optional string country;"));
}

#[test]
fn test_from_nodes_configuration_errors() {
    // Parent cycle between nodes 1 and 2.
    let cycle = vec![
        FieldDef::root("r"),
        FieldDef::group(FieldId::new(2), "a", Cardinality::Optional),
        FieldDef::group(FieldId::new(1), "b", Cardinality::Optional),
    ];
    assert!(Schema::from_nodes(cycle).unwrap_err().is_configuration());

    let dangling = vec![
        FieldDef::root("r"),
        FieldDef::leaf(FieldId::new(7), "a", Cardinality::Required, ScalarType::Int64),
    ];
    assert!(Schema::from_nodes(dangling).unwrap_err().is_configuration());

    let duplicate = vec![
        FieldDef::root("r"),
        FieldDef::leaf(FieldId::ROOT, "a", Cardinality::Required, ScalarType::Int64),
        FieldDef::leaf(FieldId::ROOT, "a", Cardinality::Optional, ScalarType::String),
    ];
    assert!(Schema::from_nodes(duplicate).unwrap_err().is_configuration());

    let empty_group = vec![
        FieldDef::root("r"),
        FieldDef::group(FieldId::ROOT, "g", Cardinality::Repeated),
    ];
    assert!(Schema::from_nodes(empty_group).unwrap_err().is_configuration());

    let leaf_with_children = vec![
        FieldDef::root("r"),
        FieldDef::leaf(FieldId::ROOT, "a", Cardinality::Required, ScalarType::Int64),
        FieldDef::leaf(FieldId::new(1), "b", Cardinality::Required, ScalarType::Int64),
    ];
    assert!(
        Schema::from_nodes(leaf_with_children)
            .unwrap_err()
            .is_configuration()
    );

    let dotted = vec![
        FieldDef::root("r"),
        FieldDef::leaf(FieldId::ROOT, "a.b", Cardinality::Required, ScalarType::Int64),
    ];
    assert!(Schema::from_nodes(dotted).unwrap_err().is_configuration());

    assert!(Schema::from_nodes(vec![]).unwrap_err().is_configuration());
    assert!(
        SchemaBuilder::new("empty", vec![])
            .finish()
            .unwrap_err()
            .is_configuration()
    );
}

#[test]
fn test_from_nodes_out_of_order_parents() {
    // Children may precede their parents in the node list.
    let defs = vec![
        FieldDef::root("r"),
        FieldDef::leaf(FieldId::new(2), "v", Cardinality::Repeated, ScalarType::Float64),
        FieldDef::group(FieldId::ROOT, "g", Cardinality::Optional),
    ];
    let schema = Schema::from_nodes(defs).unwrap();
    let v = schema.find_field("g.v").unwrap();
    assert_eq!(v, FieldId::new(1));
    assert_eq!(schema.max_repetition_level(v), 1);
    assert_eq!(schema.max_definition_level(v), 2);
    assert_eq!(schema.leaves(), &[v]);
}

#[test]
fn test_projection_canonical_order() {
    let schema = document_schema();
    let projection =
        Projection::from_paths(&schema, ["name.language.country", "doc_id"]).unwrap();
    assert_eq!(
        projection.fields(),
        &[id(&schema, "doc_id"), id(&schema, "name.language.country")]
    );
    assert!(projection.covers(&schema, id(&schema, "name")));
    assert!(!projection.covers(&schema, id(&schema, "links")));
    assert_eq!(Projection::all(&schema).len(), 6);
}

#[test]
fn test_projection_errors() {
    let schema = document_schema();
    assert!(
        Projection::from_paths(&schema, ["name"])
            .unwrap_err()
            .is_schema_mismatch()
    );
    assert!(
        Projection::from_paths(&schema, ["name.nope"])
            .unwrap_err()
            .is_schema_mismatch()
    );
    assert!(
        Projection::from_paths(&schema, ["doc_id", "doc_id"])
            .unwrap_err()
            .is_schema_mismatch()
    );
    assert!(Projection::from_paths(&schema, Vec::<&str>::new()).is_err());
}

#[test]
fn test_projection_erase() {
    let schema = document_schema();
    let record = Record::new()
        .with("doc_id", 10i64)
        .with(
            "links",
            Record::new().with_all("forward", [20i64, 40, 60]),
        )
        .with(
            "name",
            Record::new()
                .with(
                    "language",
                    Record::new().with("code", "en-us").with("country", "us"),
                )
                .with("language", Record::new().with("code", "en"))
                .with("url", "http://A"),
        )
        .with("name", Record::new().with("url", "http://B"));

    let projection =
        Projection::from_paths(&schema, ["doc_id", "name.language.country"]).unwrap();
    let erased = projection.erase(&schema, &record);

    let expected = Record::new()
        .with("doc_id", 10i64)
        .with(
            "name",
            Record::new()
                .with("language", Record::new().with("country", "us"))
                .with("language", Record::new()),
        )
        .with("name", Record::new());
    assert_eq!(erased, expected);
}

#[test]
fn test_record_equality_ignores_empty_lists() {
    let mut a = Record::new().with("x", 1i64);
    a.get_all_mut("y");
    let b = Record::new().with("x", 1i64).with_all("y", Vec::<Value>::new());
    assert_eq!(a, b);
    assert_eq!(a.len(), 1);
    assert!(!a.contains("y"));
    assert_eq!(a.to_string(), r#"{"x": 1}"#);
}

#[test]
fn test_field_id_from_usize() {
    assert_eq!(FieldId::try_from(7usize).unwrap(), FieldId::new(7));
    let too_large = u32::MAX as usize + 1;
    assert!(FieldId::try_from(too_large).is_err());
    assert_eq!(
        SchemaBuilder::new("r", vec![FieldBuilder::required("a", ScalarType::Int64)])
            .to_nodes()
            .unwrap()
            .len(),
        2
    );
}
