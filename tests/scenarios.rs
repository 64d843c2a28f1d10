//! End-to-end scenarios covering: an empty document, a single scalar
//! property, an array property, a nested object, a null nested object, and a
//! `CUSTOM` string list.

use std::rc::Rc;

use serde_json::json;

use xfs_codec::{decode, encode, from_json, to_json, Data, Definition, Document, Field, FieldValue, Object, PropType, PropertyDef};

fn header_bytes(major_version: u16, def_count: i32, def_size: i32) -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&xfs_codec::HEADER_MAGIC.to_le_bytes());
    bytes.extend_from_slice(&major_version.to_le_bytes());
    bytes.extend_from_slice(&0u16.to_le_bytes());
    bytes.extend_from_slice(&0i64.to_le_bytes());
    bytes.extend_from_slice(&def_count.to_le_bytes());
    bytes.extend_from_slice(&def_size.to_le_bytes());
    bytes
}

#[test]
fn empty_document_v16() {
    let mut bytes = header_bytes(16, 0, 0);
    bytes.extend_from_slice(&0u32.to_le_bytes());

    let doc = decode(&bytes).unwrap();
    assert!(doc.root.is_none());
    assert!(doc.definitions.is_empty());

    let value = to_json(&doc);
    assert_eq!(
        value,
        json!({
            "root": null,
            "$defs": [],
            "$major_version": 16,
            "$minor_version": 0,
        })
    );

    assert_eq!(encode(&doc).unwrap(), bytes);
}

fn u32_property_doc() -> Document {
    let def = Definition {
        dti_hash: 0xDEAD_BEEF,
        init: false,
        raw_header: None,
        props: vec![PropertyDef { name: Rc::from("x"), prop_type: PropType::U32, attr: 0, bytes: 4, disable: false }],
    };
    let root = Object {
        def_id: 0,
        id: 0,
        fields: vec![Field { name: Rc::from("x"), prop_type: PropType::U32, value: FieldValue::Scalar(Data::U32(42)) }],
    };
    Document { major_version: 16, minor_version: 0, class_count: 1, definitions: vec![def], root: Some(root) }
}

#[test]
fn single_property_projects_to_spec_json_shape() {
    let doc = u32_property_doc();
    let value = to_json(&doc);
    assert_eq!(value["root"]["$id"], json!(0));
    assert_eq!(value["root"]["x"], json!(42));
}

#[test]
fn binary_round_trip_is_byte_exact() {
    let doc = u32_property_doc();
    let bytes = encode(&doc).unwrap();
    let decoded = decode(&bytes).unwrap();
    let re_encoded = encode(&decoded).unwrap();
    assert_eq!(bytes, re_encoded);
}

#[test]
fn array_of_four_s32_values() {
    let mut doc = u32_property_doc();
    doc.definitions[0].props[0].prop_type = PropType::S32;
    let root = doc.root.as_mut().unwrap();
    root.fields[0].prop_type = PropType::S32;
    root.fields[0].value = FieldValue::Array(vec![Data::S32(1), Data::S32(-2), Data::S32(3), Data::S32(-4)]);

    let bytes = encode(&doc).unwrap();
    let decoded = decode(&bytes).unwrap();
    let reprojected = to_json(&decoded);
    assert_eq!(reprojected["root"]["x"], json!([1, -2, 3, -4]));
}

#[test]
fn nested_object_with_vector3_body() {
    let json_doc = json!({
        "root": {
            "$id": 0,
            "body": {
                "$id": 1,
                "radius": 2.5,
                "center": { "x": 1.0, "y": 2.0, "z": 3.0 }
            }
        },
        "$defs": [
            { "dti": 10, "init": false, "props": [{ "name": "body", "type": 0x01, "attr": 0, "bytes": 4, "disable": false }] },
            { "dti": 11, "init": false, "props": [
                { "name": "radius", "type": 0x0C, "attr": 0, "bytes": 4, "disable": false },
                { "name": "center", "type": 0x14, "attr": 0, "bytes": 16, "disable": false }
            ] }
        ],
        "$major_version": 16,
        "$minor_version": 0
    });

    let doc = from_json(&json_doc).unwrap();
    let bytes = encode(&doc).unwrap();
    let decoded = decode(&bytes).unwrap();
    let reprojected = to_json(&decoded);

    assert_eq!(reprojected["root"]["body"]["$id"], json!(1));
    assert_eq!(reprojected["root"]["body"]["radius"], json!(2.5));
    assert_eq!(reprojected["root"]["body"]["center"]["x"], json!(1.0));
}

#[test]
fn null_nested_object_round_trips_as_sentinel() {
    let json_doc = json!({
        "root": { "$id": 0, "body": null },
        "$defs": [{ "dti": 10, "init": false, "props": [
            { "name": "body", "type": 0x01, "attr": 0, "bytes": 4, "disable": false }
        ] }],
        "$major_version": 16,
        "$minor_version": 0
    });

    let doc = from_json(&json_doc).unwrap();
    let bytes = encode(&doc).unwrap();
    let decoded = decode(&bytes).unwrap();
    let reprojected = to_json(&decoded);
    assert_eq!(reprojected["root"]["body"], json!(null));
}

#[test]
fn custom_value_preserves_string_list_order() {
    let json_doc = json!({
        "root": { "$id": 0, "tags": { "values": ["alpha", "beta", "gamma"] } },
        "$defs": [{ "dti": 20, "init": false, "props": [
            { "name": "tags", "type": 0x80, "attr": 0, "bytes": 0, "disable": false }
        ] }],
        "$major_version": 16,
        "$minor_version": 0
    });

    let doc = from_json(&json_doc).unwrap();
    let bytes = encode(&doc).unwrap();
    let decoded = decode(&bytes).unwrap();
    let reprojected = to_json(&decoded);
    assert_eq!(reprojected["root"]["tags"]["values"], json!(["alpha", "beta", "gamma"]));
}

#[test]
fn json_to_binary_to_json_is_stable() {
    let json_doc = json!({
        "root": { "$id": 0, "x": 7 },
        "$defs": [{ "dti": 1, "init": false, "props": [
            { "name": "x", "type": 0x06, "attr": 0, "bytes": 4, "disable": false }
        ] }],
        "$major_version": 16,
        "$minor_version": 0
    });

    let doc = from_json(&json_doc).unwrap();
    let bytes = encode(&doc).unwrap();
    let decoded = decode(&bytes).unwrap();
    let first_projection = to_json(&decoded);

    let doc2 = from_json(&first_projection).unwrap();
    let bytes2 = encode(&doc2).unwrap();
    let decoded2 = decode(&bytes2).unwrap();
    let second_projection = to_json(&decoded2);

    assert_eq!(first_projection, second_projection);
}
