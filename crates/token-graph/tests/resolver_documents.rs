mod common;

use serde_json::{json, Value};
use token_graph::codec::resolver::{parse_resolver, serialize_resolver};
use token_graph::codec::value::literal_to_json;
use token_graph::codec::{PathIds, SequentialIds};
use token_graph::{NodeStore, ResolveError, ValueResolver};

use common::snapshot;

fn number(n: i64) -> Value {
    json!({"$type": "number", "$value": n})
}

fn themed() -> Value {
    json!({
        "version": "2025.10",
        "name": "acme",
        "description": "Acme design tokens",
        "resolutionOrder": [
            {
                "type": "set",
                "name": "semantic",
                "sources": [{"surface": {"$value": "{palette.white}"}, "text": {"$value": "{palette.ink}"}}]
            },
            {
                "type": "set",
                "name": "palette",
                "description": "raw colors",
                "sources": [
                    {"palette": {"$type": "color",
                        "white": {"$value": {"colorSpace": "srgb", "components": [1, 1, 1]}},
                        "ink": {"$value": {"colorSpace": "srgb", "components": [0, 0, 0]}}}},
                    {"palette": {"ink": {"$value": {"colorSpace": "srgb", "components": [0.1, 0.1, 0.1]}}}}
                ]
            },
            {
                "type": "modifier",
                "name": "theme",
                "default": "light",
                "contexts": {
                    "light": [{"palette": {"$type": "color", "white": {"$value": {"colorSpace": "srgb", "components": [1, 1, 1]}}}}],
                    "dark": [{"palette": {"$type": "color", "white": {"$value": {"colorSpace": "srgb", "components": [0.05, 0.05, 0.05]}}}}]
                }
            }
        ]
    })
}

#[test]
fn forward_references_across_sets_resolve() {
    let out = parse_resolver(&themed(), &mut PathIds);
    assert!(out.errors.is_empty(), "{:?}", out.errors);
    assert_eq!(out.meta.name, "acme");

    let store = NodeStore::from_nodes(out.nodes);
    let resolver = ValueResolver::new(&store);
    let text = resolver.resolve_value("/semantic/text").unwrap();
    assert_eq!(literal_to_json(&text.value), json!({"colorSpace": "srgb", "components": [0.1, 0.1, 0.1]}));
}

#[test]
fn default_context_overrides_sets() {
    let store = NodeStore::from_nodes(parse_resolver(&themed(), &mut PathIds).nodes);
    let surface = ValueResolver::new(&store).resolve_value("/semantic/surface").unwrap();
    assert_eq!(literal_to_json(&surface.value), json!({"colorSpace": "srgb", "components": [1, 1, 1]}));
}

#[test]
fn cycle_spanning_two_sets_is_reported() {
    let doc = json!({
        "version": "2025.10",
        "resolutionOrder": [
            {"type": "set", "name": "one", "sources": [{"a": {"$value": "{b}"}, "ok": number(1)}]},
            {"type": "set", "name": "two", "sources": [{"b": {"$value": "{a}"}}]}
        ]
    });
    let out = parse_resolver(&doc, &mut PathIds);
    let paths: Vec<&str> = out.errors.iter().map(|e| e.path.as_str()).collect();
    assert_eq!(paths, vec!["/resolutionOrder/0/sources/a/$value", "/resolutionOrder/1/sources/b/$value"]);
    assert!(out.errors.iter().all(|e| e.message.starts_with("circular reference")));

    let store = NodeStore::from_nodes(out.nodes);
    let resolver = ValueResolver::new(&store);
    assert!(matches!(resolver.resolve_value("/one/a"), Err(ResolveError::CircularReference(_))));
    assert!(resolver.resolve_value("/one/ok").is_ok());
}

#[test]
fn unresolved_cross_set_reference_is_reported() {
    let doc = json!({
        "version": "2025.10",
        "resolutionOrder": [{"type": "set", "name": "one", "sources": [{"a": {"$value": "{missing.token}"}}]}]
    });
    let out = parse_resolver(&doc, &mut PathIds);
    assert_eq!(out.errors.len(), 1);
    assert_eq!(out.errors[0].message, "unresolved reference {missing.token}");
    assert_eq!(out.nodes.len(), 2);
}

#[test]
fn pointer_substitution_runs_per_source() {
    let doc = json!({
        "version": "2025.10",
        "resolutionOrder": [{
            "type": "set",
            "name": "sizes",
            "sources": [{
                "space": {"$type": "dimension",
                    "base": {"$value": {"value": 4, "unit": "px"}},
                    "wide": {"$value": {"value": 16, "unit": {"$ref": "#/space/base/$value/unit"}}}
                }
            }]
        }]
    });
    let out = parse_resolver(&doc, &mut PathIds);
    assert!(out.errors.is_empty(), "{:?}", out.errors);
    let store = NodeStore::from_nodes(out.nodes);
    let wide = ValueResolver::new(&store).resolve_value("/sizes/space/wide").unwrap();
    assert_eq!(literal_to_json(&wide.value), json!({"value": 16, "unit": "px"}));
}

#[test]
fn resolver_documents_round_trip() {
    let first = parse_resolver(&themed(), &mut SequentialIds::new("a"));
    assert!(first.errors.is_empty());
    let written = serialize_resolver(&NodeStore::from_nodes(first.nodes.clone()), Some(&first.meta)).unwrap();
    assert_eq!(written["version"], json!("2025.10"));
    assert_eq!(written["name"], json!("acme"));
    assert_eq!(written["resolutionOrder"][1]["sources"].as_array().map(Vec::len), Some(1));

    let second = parse_resolver(&written, &mut SequentialIds::new("b"));
    assert!(second.errors.is_empty(), "{:?}", second.errors);
    assert_eq!(second.meta, first.meta);
    assert_eq!(snapshot(first.nodes), snapshot(second.nodes));
}

#[test]
fn merged_sources_serialize_as_one() {
    let out = parse_resolver(&themed(), &mut PathIds);
    let written = serialize_resolver(&NodeStore::from_nodes(out.nodes), None).unwrap();
    assert!(written.get("name").is_none());
    assert_eq!(
        written["resolutionOrder"][1],
        json!({
            "type": "set",
            "name": "palette",
            "description": "raw colors",
            "sources": [{"palette": {"$type": "color",
                "white": {"$value": {"colorSpace": "srgb", "components": [1, 1, 1]}},
                "ink": {"$value": {"colorSpace": "srgb", "components": [0.1, 0.1, 0.1]}}}}]
        })
    );
    assert_eq!(written["resolutionOrder"][2]["default"], json!("light"));
}

#[test]
fn coincident_groups_merge_across_sources() {
    let coincident = json!({"accent": {"$type": "number", "$value": 1, "soft": {"$value": 2}}});
    let doc = json!({
        "version": "2025.10",
        "resolutionOrder": [
            {"type": "set", "name": "s", "sources": [coincident.clone(), {"accent": {"strong": {"$value": 3}}}]},
            {"type": "set", "name": "t", "sources": [coincident.clone(), {"accent": {"$value": 9}}]},
            {"type": "set", "name": "u", "sources": [{"accent": {"strong": {"$value": 3}}}, coincident.clone()]},
            {"type": "set", "name": "v", "sources": [{"accent": {"$type": "number", "$value": 5}}, coincident]}
        ]
    });
    let out = parse_resolver(&doc, &mut PathIds);
    assert!(out.errors.is_empty(), "{:?}", out.errors);

    let store = NodeStore::from_nodes(out.nodes);
    let resolver = ValueResolver::new(&store);
    let value = |id: &str| literal_to_json(&resolver.resolve_value(id).unwrap().value);

    assert_eq!(value("/s/accent/$root"), json!(1));
    assert_eq!(value("/s/accent/soft"), json!(2));
    assert_eq!(value("/s/accent/strong"), json!(3));

    assert_eq!(value("/t/accent/$root"), json!(9));
    assert_eq!(value("/t/accent/soft"), json!(2));

    assert_eq!(value("/u/accent/$root"), json!(1));
    assert_eq!(value("/u/accent/soft"), json!(2));
    assert_eq!(value("/u/accent/strong"), json!(3));

    assert_eq!(value("/v/accent/$root"), json!(1));
    assert_eq!(value("/v/accent/soft"), json!(2));
}

#[test]
fn plain_tokens_are_replaced_whole() {
    let doc = json!({
        "version": "2025.10",
        "resolutionOrder": [{
            "type": "set",
            "name": "s",
            "sources": [
                {"gap": {"$type": "number", "$value": 1, "$description": "old"}},
                {"gap": {"$type": "number", "$value": 2}}
            ]
        }]
    });
    let out = parse_resolver(&doc, &mut PathIds);
    assert!(out.errors.is_empty(), "{:?}", out.errors);
    let gap = out.nodes.iter().find(|n| n.id.as_str() == "/s/gap").unwrap();
    let token = gap.as_token().unwrap();
    assert_eq!(token.description, None);
    assert_eq!(literal_to_json(token.value.as_literal().unwrap()), json!(2));
}
