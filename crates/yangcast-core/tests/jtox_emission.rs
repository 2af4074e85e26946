//! End-to-end JSON driver emission tests.

use serde_json::{json, Value};
use yangcast_core::{emit_jtox, EmitOptions, JtoxFlavor, SchemaContext};

// ── Helpers ─────────────────────────────────────────────────────────────────

fn ctx(value: Value) -> SchemaContext {
    serde_json::from_value(value).expect("context fixture deserializes")
}

fn single_module(children: Value) -> SchemaContext {
    ctx(json!({
        "modules": [{
            "name": "m",
            "namespace": "urn:m",
            "prefix": "m",
            "children": children
        }]
    }))
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[test]
fn test_container_and_leaf_tree() {
    let context = single_module(json!([
        {
            "kind": "container",
            "name": "top",
            "children": [
                { "kind": "leaf", "name": "name", "type": { "name": "string" } }
            ]
        }
    ]));
    let doc = emit_jtox(&context, &EmitOptions::default()).unwrap();

    assert_eq!(doc["modules"], json!({ "m": ["m", "urn:m"] }));
    assert_eq!(
        doc["tree"],
        json!({ "top": ["container", { "name": ["leaf", "string"] }] })
    );
    assert!(doc.get("annotations").is_none());
}

#[test]
fn test_list_entry_carries_keys() {
    let context = single_module(json!([
        {
            "kind": "list",
            "name": "item",
            "key": ["id"],
            "children": [
                { "kind": "leaf", "name": "id", "type": { "name": "uint32" } },
                { "kind": "leaf", "name": "value", "type": { "name": "string" } }
            ]
        }
    ]));
    let doc = emit_jtox(&context, &EmitOptions::default()).unwrap();

    // Keys are (module, name) pairs for the downstream translator.
    assert_eq!(
        doc["tree"]["item"],
        json!([
            "list",
            { "id": ["leaf", "uint32"], "value": ["leaf", "string"] },
            [["m", "id"]]
        ])
    );
}

#[test]
fn test_list_key_pair_names_augmenting_module() {
    let context = ctx(json!({
        "modules": [
            { "name": "a", "namespace": "urn:a", "prefix": "a" },
            {
                "name": "b",
                "namespace": "urn:b",
                "prefix": "b",
                "children": [
                    {
                        "kind": "list",
                        "name": "item",
                        "key": ["tag"],
                        "children": [
                            {
                                "kind": "leaf",
                                "name": "tag",
                                "module": "a",
                                "type": { "name": "string" }
                            }
                        ]
                    }
                ]
            }
        ]
    }));
    let doc = emit_jtox(&context, &EmitOptions::default()).unwrap();

    assert_eq!(doc["tree"]["item"][2], json!([["a", "tag"]]));
}

#[test]
fn test_restricted_and_union_base_types() {
    let context = single_module(json!([
        {
            "kind": "leaf",
            "name": "port",
            "type": { "name": "uint16", "range": "1024..65535" }
        },
        {
            "kind": "leaf",
            "name": "mixed",
            "type": {
                "name": "union",
                "union-members": [
                    { "name": "int8" },
                    { "name": "string", "length": "1..8" }
                ]
            }
        }
    ]));
    let doc = emit_jtox(&context, &EmitOptions::default()).unwrap();

    assert_eq!(
        doc["tree"]["port"],
        json!(["leaf", ["uint16", { "range": "1024..65535" }]])
    );
    assert_eq!(
        doc["tree"]["mixed"],
        json!(["leaf", ["union", ["int8", ["string", { "length": "1..8" }]]]])
    );
}

#[test]
fn test_typedef_indirection_is_invisible() {
    let context = ctx(json!({
        "modules": [{
            "name": "m",
            "namespace": "urn:m",
            "prefix": "m",
            "typedefs": {
                "percent": { "name": "uint8", "range": "0..100" }
            },
            "children": [
                { "kind": "leaf", "name": "load", "type": { "name": "percent" } }
            ]
        }]
    }));
    let doc = emit_jtox(&context, &EmitOptions::default()).unwrap();

    assert_eq!(
        doc["tree"]["load"],
        json!(["leaf", ["uint8", { "range": "0..100" }]])
    );
}

#[test]
fn test_choice_and_case_are_transparent() {
    let context = single_module(json!([
        {
            "kind": "container",
            "name": "top",
            "children": [
                {
                    "kind": "choice",
                    "name": "transport",
                    "children": [
                        {
                            "kind": "case",
                            "name": "tcp",
                            "children": [
                                { "kind": "leaf", "name": "tcp-port", "type": { "name": "uint16" } }
                            ]
                        },
                        {
                            "kind": "case",
                            "name": "tls",
                            "children": [
                                { "kind": "leaf", "name": "tls-port", "type": { "name": "uint16" } }
                            ]
                        }
                    ]
                }
            ]
        }
    ]));
    let doc = emit_jtox(&context, &EmitOptions::default()).unwrap();

    // Case children nest directly under the container, as instance data does.
    assert_eq!(
        doc["tree"]["top"][1],
        json!({
            "tcp-port": ["leaf", "uint16"],
            "tls-port": ["leaf", "uint16"]
        })
    );
}

#[test]
fn test_rpc_subtree() {
    let context = single_module(json!([
        {
            "kind": "rpc",
            "name": "restart",
            "input": [
                { "kind": "leaf", "name": "delay", "type": { "name": "uint32" } }
            ]
        }
    ]));
    let doc = emit_jtox(&context, &EmitOptions::default()).unwrap();

    assert_eq!(
        doc["tree"]["restart"],
        json!(["rpc", { "input": { "delay": ["leaf", "uint32"] } }])
    );
}

#[test]
fn test_cross_module_child_key_is_qualified() {
    let context = ctx(json!({
        "modules": [
            { "name": "a", "namespace": "urn:a", "prefix": "a" },
            {
                "name": "b",
                "namespace": "urn:b",
                "prefix": "b",
                "children": [
                    {
                        "kind": "container",
                        "name": "top",
                        "children": [
                            {
                                "kind": "leaf",
                                "name": "extra",
                                "module": "a",
                                "type": { "name": "string" }
                            }
                        ]
                    }
                ]
            }
        ]
    }));
    let doc = emit_jtox(&context, &EmitOptions::default()).unwrap();

    assert_eq!(
        doc["tree"]["top"][1],
        json!({ "a:extra": ["leaf", "string"] })
    );
}

#[test]
fn test_annotated_flavor_qualifies_keys_and_adds_attrs() {
    let context = single_module(json!([
        {
            "kind": "container",
            "name": "top",
            "children": [
                {
                    "kind": "leaf",
                    "name": "name",
                    "description": "Interface name.",
                    "mandatory": true,
                    "type": { "name": "string" }
                }
            ]
        }
    ]));
    let opts = EmitOptions {
        jtox_flavor: JtoxFlavor::Annotated,
        ..EmitOptions::default()
    };
    let doc = emit_jtox(&context, &opts).unwrap();

    assert_eq!(
        doc["tree"]["m:top"][1]["m:name"],
        json!([
            "leaf",
            "string",
            { "description": "Interface name.", "mandatory": true }
        ])
    );
}

#[test]
fn test_annotations_map() {
    let context = ctx(json!({
        "modules": [{
            "name": "m",
            "namespace": "urn:m",
            "prefix": "m",
            "annotations": [
                { "name": "last-modified", "type": { "name": "string" } },
                { "name": "flagged", "type": { "name": "boolean" } }
            ],
            "children": [
                { "kind": "leaf", "name": "x", "type": { "name": "string" } }
            ]
        }]
    }));
    let doc = emit_jtox(&context, &EmitOptions::default()).unwrap();

    assert_eq!(
        doc["annotations"],
        json!({ "m:last-modified": "string", "m:flagged": "boolean" })
    );
}

#[test]
fn test_leafref_resolves_to_target_type() {
    let context = single_module(json!([
        {
            "kind": "list",
            "name": "item",
            "key": ["id"],
            "children": [
                { "kind": "leaf", "name": "id", "type": { "name": "uint32" } }
            ]
        },
        {
            "kind": "leaf",
            "name": "pick",
            "type": { "name": "leafref", "path": "/m:item/id" }
        }
    ]));
    let doc = emit_jtox(&context, &EmitOptions::default()).unwrap();

    assert_eq!(doc["tree"]["pick"], json!(["leaf", "uint32"]));
}

#[test]
fn test_prefix_collision_reflected_in_modules_map() {
    let context = ctx(json!({
        "modules": [
            { "name": "first", "namespace": "urn:first", "prefix": "p" },
            { "name": "second", "namespace": "urn:second", "prefix": "p" }
        ]
    }));
    let doc = emit_jtox(&context, &EmitOptions::default()).unwrap();

    assert_eq!(doc["modules"]["first"], json!(["p", "urn:first"]));
    assert_eq!(doc["modules"]["second"], json!(["p1", "urn:second"]));
}
