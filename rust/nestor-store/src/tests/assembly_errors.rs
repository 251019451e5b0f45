use nestor_common::error::ErrorKind;
use nestor_format::{Projection, Value};
use nestor_testkit::document::document_schema;

use crate::{
    column::Column,
    read::{Assembler, FieldReader, RecordFsm, RecordIter},
};

fn column(schema: &nestor_format::Schema, path: &str) -> Column {
    Column::new(schema, schema.find_field(path).unwrap(), 0).unwrap()
}

#[test]
fn test_column_underrun_is_reported() {
    let schema = document_schema();
    let projection = Projection::from_paths(&schema, ["DocId", "Links.Forward"]).unwrap();
    let fsm = RecordFsm::new(&schema, &projection).unwrap();

    let mut doc_id = column(&schema, "DocId");
    doc_id.insert(Some(Value::Int64(1)), 0, 0).unwrap();
    doc_id.insert(Some(Value::Int64(2)), 0, 0).unwrap();
    // The second record never made it into the forward links.
    let mut forward = column(&schema, "Links.Forward");
    forward.insert(Some(Value::Int64(7)), 0, 2).unwrap();

    let assembler = Assembler::new(&schema, &fsm);
    let mut readers = vec![FieldReader::new(&doc_id), FieldReader::new(&forward)];
    let first = assembler.assemble_next(&mut readers).unwrap();
    assert_eq!(first.get("DocId"), Some(&Value::Int64(1)));

    let err = assembler.assemble_next(&mut readers).unwrap_err();
    assert!(err.is_store_underrun());
}

fn code_url_fsm(schema: &nestor_format::Schema) -> RecordFsm {
    let projection = Projection::from_paths(schema, ["Name.Language.Code", "Name.Url"]).unwrap();
    RecordFsm::new(schema, &projection).unwrap()
}

#[test]
fn test_record_ending_inside_a_column() {
    let schema = document_schema();
    let fsm = code_url_fsm(&schema);

    // A second code for the first name entry without a matching url row.
    let mut code = column(&schema, "Name.Language.Code");
    code.insert(Some(Value::from("a")), 0, 2).unwrap();
    code.insert(Some(Value::from("b")), 1, 2).unwrap();
    let mut url = column(&schema, "Name.Url");
    url.insert(None, 0, 1).unwrap();

    let assembler = Assembler::new(&schema, &fsm);
    let mut readers = vec![FieldReader::new(&code), FieldReader::new(&url)];
    let err = assembler.assemble_next(&mut readers).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::InvalidFormat { .. }));
}

#[test]
fn test_record_must_start_at_level_zero() {
    let schema = document_schema();
    let fsm = code_url_fsm(&schema);

    let mut code = column(&schema, "Name.Language.Code");
    code.insert(Some(Value::from("a")), 0, 2).unwrap();
    code.insert(Some(Value::from("b")), 1, 2).unwrap();
    let mut url = column(&schema, "Name.Url");
    url.insert(None, 0, 1).unwrap();

    let assembler = Assembler::new(&schema, &fsm);
    let mut code_reader = FieldReader::new(&code);
    code_reader.seek(1);
    let mut readers = vec![code_reader, FieldReader::new(&url)];
    let err = assembler.assemble_next(&mut readers).unwrap_err();
    assert!(matches!(
        err.kind(),
        ErrorKind::InvalidFormat { element, .. } if element == "Name.Language.Code"
    ));
}

#[test]
fn test_record_iter_stops_after_error() {
    let schema = document_schema();
    let fsm = code_url_fsm(&schema);

    let mut code = column(&schema, "Name.Language.Code");
    code.insert(Some(Value::from("a")), 0, 2).unwrap();
    code.insert(Some(Value::from("b")), 1, 2).unwrap();
    code.insert(Some(Value::from("c")), 0, 2).unwrap();
    let mut url = column(&schema, "Name.Url");
    url.insert(None, 0, 1).unwrap();
    url.insert(None, 0, 1).unwrap();

    let readers = vec![FieldReader::new(&code), FieldReader::new(&url)];
    let mut iter = RecordIter::new(Assembler::new(&schema, &fsm), readers, 2);
    assert!(iter.next().unwrap().is_err());
    assert_eq!(iter.size_hint(), (0, Some(0)));
    assert!(iter.next().is_none());
}

#[test]
fn test_readers_must_match_fsm() {
    let schema = document_schema();
    let projection = Projection::from_paths(&schema, ["DocId", "Name.Url"]).unwrap();
    let fsm = RecordFsm::new(&schema, &projection).unwrap();
    let doc_id = column(&schema, "DocId");
    let url = column(&schema, "Name.Url");

    let assembler = Assembler::new(&schema, &fsm);
    let mut swapped = vec![FieldReader::new(&url), FieldReader::new(&doc_id)];
    let err = assembler.assemble_next(&mut swapped).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::InvalidArgument { .. }));
}
