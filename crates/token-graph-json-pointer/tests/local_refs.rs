use serde_json::json;
use token_graph_json_pointer::{as_local_ref, find_by_fragment, parse_fragment, JsonPointerError};

#[test]
fn ref_object_resolves_against_raw_document() {
    let doc = json!({
        "shadow": {
            "base": {"$type": "shadow", "$value": {"blur": {"value": 4, "unit": "px"}}},
            "raised": {"$value": {"blur": {"$ref": "#/shadow/base/$value/blur"}}}
        }
    });
    let field = &doc["shadow"]["raised"]["$value"]["blur"];
    let target = as_local_ref(field).unwrap();
    assert_eq!(
        find_by_fragment(&doc, target).unwrap(),
        &json!({"value": 4, "unit": "px"})
    );
}

#[test]
fn numeric_steps_index_arrays() {
    let doc = json!({"c": {"$value": {"components": [0.1, 0.2, 0.3]}}});
    assert_eq!(
        find_by_fragment(&doc, "#/c/$value/components/2").unwrap(),
        &json!(0.3)
    );
    assert_eq!(
        find_by_fragment(&doc, "#/c/$value/components/x"),
        Err(JsonPointerError::InvalidIndex("x".into()))
    );
}

#[test]
fn root_fragment_is_whole_document() {
    let doc = json!({"a": 1});
    assert_eq!(find_by_fragment(&doc, "#").unwrap(), &doc);
}

#[test]
fn relative_file_refs_are_external() {
    assert!(matches!(
        parse_fragment("./base.tokens.json"),
        Err(JsonPointerError::External(_))
    ));
    assert!(matches!(
        parse_fragment("base.tokens.json#/colors"),
        Err(JsonPointerError::External(_))
    ));
}
