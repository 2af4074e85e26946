//! End-to-end SQL emission tests.

use serde_json::{json, Value};
use yangcast_core::{emit_sql, EmitOptions, SchemaContext};

// ── Helpers ─────────────────────────────────────────────────────────────────

fn ctx(value: Value) -> SchemaContext {
    serde_json::from_value(value).expect("context fixture deserializes")
}

fn single_module(children: Value) -> SchemaContext {
    ctx(json!({
        "modules": [{
            "name": "net",
            "namespace": "urn:net",
            "prefix": "net",
            "children": children
        }]
    }))
}

fn top_with_item() -> SchemaContext {
    single_module(json!([
        {
            "kind": "container",
            "name": "top",
            "children": [
                {
                    "kind": "list",
                    "name": "item",
                    "key": ["id"],
                    "children": [
                        { "kind": "leaf", "name": "id", "type": { "name": "int32" } },
                        { "kind": "leaf", "name": "name", "type": { "name": "string" } }
                    ]
                }
            ]
        }
    ]))
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[test]
fn test_container_table_is_revision_keyed() {
    let out = emit_sql(&top_with_item(), &EmitOptions::default()).unwrap();
    assert!(out.ddl.contains("CREATE TABLE top (\n    revision INTEGER NOT NULL PRIMARY KEY"));
}

#[test]
fn test_list_table_keyed_by_declared_keys() {
    let out = emit_sql(&top_with_item(), &EmitOptions::default()).unwrap();
    let ddl = &out.ddl;

    assert!(ddl.contains("CREATE TABLE top_item ("));
    assert!(ddl.contains("id_fk INTEGER NOT NULL"));
    assert!(ddl.contains("CONSTRAINT top_item_pk PRIMARY KEY(id_fk)"));
    assert!(ddl.contains("revision_fk INTEGER NOT NULL"));
    assert!(ddl.contains("FOREIGN KEY(revision_fk) REFERENCES top(revision)"));
    // The key leaf is the key column; no duplicate plain column.
    assert!(!ddl.contains("\n    id INTEGER"));
    assert!(ddl.contains("name TEXT"));
}

#[test]
fn test_composite_key_lists_all_columns_in_order() {
    let context = single_module(json!([
        {
            "kind": "list",
            "name": "route",
            "key": ["prefix", "metric"],
            "children": [
                { "kind": "leaf", "name": "prefix", "type": { "name": "string" } },
                { "kind": "leaf", "name": "metric", "type": { "name": "uint32" } }
            ]
        }
    ]));
    let out = emit_sql(&context, &EmitOptions::default()).unwrap();
    assert!(out
        .ddl
        .contains("CONSTRAINT route_pk PRIMARY KEY(prefix_fk, metric_fk)"));
    assert!(out.ddl.contains("prefix_fk TEXT NOT NULL"));
    assert!(out.ddl.contains("metric_fk INTEGER NOT NULL"));
}

#[test]
fn test_delete_trigger_cascades_to_child_tables() {
    let out = emit_sql(&top_with_item(), &EmitOptions::default()).unwrap();
    let ddl = &out.ddl;

    assert!(ddl.contains("CREATE TRIGGER top_dt AFTER DELETE ON top"));
    assert!(ddl.contains("DELETE FROM top_item WHERE revision_fk = OLD.revision;"));
    // Child table is created before its parent.
    let child_at = ddl.find("CREATE TABLE top_item").unwrap();
    let parent_at = ddl.find("CREATE TABLE top (").unwrap();
    assert!(child_at < parent_at);
}

#[test]
fn test_nested_list_repeats_parent_key_columns() {
    let context = single_module(json!([
        {
            "kind": "list",
            "name": "item",
            "key": ["id"],
            "children": [
                { "kind": "leaf", "name": "id", "type": { "name": "int32" } },
                {
                    "kind": "list",
                    "name": "sub",
                    "key": ["sid"],
                    "children": [
                        { "kind": "leaf", "name": "sid", "type": { "name": "int32" } }
                    ]
                }
            ]
        }
    ]));
    let out = emit_sql(&context, &EmitOptions::default()).unwrap();
    let ddl = &out.ddl;

    assert!(ddl.contains("CREATE TABLE item_sub ("));
    assert!(ddl.contains("sid_fk INTEGER NOT NULL"));
    assert!(ddl.contains("FOREIGN KEY(id_fk) REFERENCES item(id_fk)"));
    assert!(ddl.contains("CREATE TRIGGER item_dt AFTER DELETE ON item"));
    assert!(ddl.contains("DELETE FROM item_sub WHERE id_fk = OLD.id_fk;"));
}

#[test]
fn test_config_false_subtrees_are_excluded() {
    let context = single_module(json!([
        {
            "kind": "container",
            "name": "top",
            "children": [
                { "kind": "leaf", "name": "speed", "type": { "name": "uint32" } },
                {
                    "kind": "container",
                    "name": "statistics",
                    "config": false,
                    "children": [
                        { "kind": "leaf", "name": "in-octets", "type": { "name": "uint64" } }
                    ]
                },
                { "kind": "leaf", "name": "oper-status", "config": false, "type": { "name": "string" } }
            ]
        }
    ]));
    let out = emit_sql(&context, &EmitOptions::default()).unwrap();

    assert!(out.ddl.contains("speed INTEGER"));
    assert!(!out.ddl.contains("statistics"));
    assert!(!out.ddl.contains("oper_status"));
}

#[test]
fn test_reserved_words_and_hyphens_are_mangled() {
    let context = single_module(json!([
        {
            "kind": "container",
            "name": "group",
            "children": [
                { "kind": "leaf", "name": "max-rate", "type": { "name": "uint32" } }
            ]
        }
    ]));
    let out = emit_sql(&context, &EmitOptions::default()).unwrap();
    assert!(out.ddl.contains("CREATE TABLE group1 ("));
    assert!(out.ddl.contains("max_rate INTEGER"));
}

#[test]
fn test_leaf_list_gets_own_table() {
    let context = single_module(json!([
        {
            "kind": "container",
            "name": "top",
            "children": [
                { "kind": "leaf-list", "name": "search", "type": { "name": "string" } }
            ]
        }
    ]));
    let out = emit_sql(&context, &EmitOptions::default()).unwrap();
    let ddl = &out.ddl;

    assert!(ddl.contains("CREATE TABLE top_search ("));
    assert!(ddl.contains("search TEXT NOT NULL"));
    assert!(ddl.contains("CONSTRAINT top_search_pk PRIMARY KEY(search)"));
    assert!(ddl.contains("FOREIGN KEY(revision_fk) REFERENCES top(revision)"));
}

#[test]
fn test_presence_container_link_is_nullable() {
    let context = single_module(json!([
        {
            "kind": "container",
            "name": "top",
            "children": [
                {
                    "kind": "container",
                    "name": "tuning",
                    "presence": "enables tuning",
                    "children": [
                        { "kind": "leaf", "name": "depth", "type": { "name": "uint8" } }
                    ]
                }
            ]
        }
    ]));
    let out = emit_sql(&context, &EmitOptions::default()).unwrap();
    assert!(out.ddl.contains("tuning_fk INTEGER,"));
    assert!(!out.ddl.contains("tuning_fk INTEGER NOT NULL"));
}

#[test]
fn test_ancestor_cutoff_truncates_table_names() {
    let context = single_module(json!([
        {
            "kind": "container",
            "name": "a",
            "children": [
                {
                    "kind": "container",
                    "name": "b",
                    "children": [
                        {
                            "kind": "container",
                            "name": "c",
                            "children": [
                                { "kind": "leaf", "name": "x", "type": { "name": "string" } }
                            ]
                        }
                    ]
                }
            ]
        }
    ]));
    let opts = EmitOptions {
        sql_ancestor_cutoff: Some(2),
        ..EmitOptions::default()
    };
    let out = emit_sql(&context, &opts).unwrap();
    assert!(out.ddl.contains("CREATE TABLE b_c ("));
    assert!(!out.ddl.contains("CREATE TABLE a_b_c ("));
}

#[test]
fn test_sample_data_rows_and_defaults() {
    let context = single_module(json!([
        {
            "kind": "container",
            "name": "top",
            "children": [
                {
                    "kind": "list",
                    "name": "item",
                    "key": ["id"],
                    "children": [
                        { "kind": "leaf", "name": "id", "type": { "name": "int32" } },
                        { "kind": "leaf", "name": "enabled", "type": { "name": "boolean" }, "default": "true" }
                    ]
                }
            ]
        }
    ]));
    let opts = EmitOptions {
        sql_sample_data: true,
        ..EmitOptions::default()
    };
    let out = emit_sql(&context, &opts).unwrap();
    let ddl = &out.ddl;

    // Three rows per list, one per container.
    assert_eq!(ddl.matches("INSERT INTO top_item").count(), 3);
    assert_eq!(ddl.matches("INSERT INTO top ").count(), 1);
    // Row index fills the key and parent link; the declared default
    // fills `enabled` (booleans as 0/1).
    assert!(ddl.contains("(id_fk, revision_fk, enabled) VALUES (0, 0, 1);"));
    assert!(ddl.contains("(id_fk, revision_fk, enabled) VALUES (2, 2, 1);"));
}

#[test]
fn test_banner_records_emitter_and_options() {
    let opts = EmitOptions {
        sql_ancestor_cutoff: Some(2),
        sql_sample_data: true,
        ..EmitOptions::default()
    };
    let out = emit_sql(&top_with_item(), &opts).unwrap();

    assert!(out.ddl.starts_with("-- SQL DDL generated by yangcast\n"));
    assert!(out.ddl.contains(
        "-- options: ancestor-cutoff=2, sample-data=true, db-schema=false, headers=false"
    ));
}

#[test]
fn test_open_and_attach_directives_always_present() {
    let context = ctx(json!({
        "modules": [
            {
                "name": "one",
                "namespace": "urn:one",
                "prefix": "o",
                "children": [
                    { "kind": "container", "name": "a", "children": [
                        { "kind": "leaf", "name": "x", "type": { "name": "string" } }
                    ] }
                ]
            },
            {
                "name": "two",
                "namespace": "urn:two",
                "prefix": "t",
                "children": [
                    { "kind": "container", "name": "b", "children": [
                        { "kind": "leaf", "name": "y", "type": { "name": "string" } }
                    ] }
                ]
            }
        ]
    }));
    let out = emit_sql(&context, &EmitOptions::default()).unwrap();
    let ddl = &out.ddl;

    // `.open` per module section, ATTACH lines at the top, no option
    // required for either.
    assert!(ddl.contains(".open one.db"));
    assert!(ddl.contains(".open two.db"));
    assert!(ddl.contains("--ATTACH DATABASE 'one.db' AS o;"));
    assert!(ddl.contains("--ATTACH DATABASE 'two.db' AS t;"));
    let attach_at = ddl.find("--ATTACH DATABASE 'one.db'").unwrap();
    let open_at = ddl.find(".open one.db").unwrap();
    assert!(attach_at < open_at);
}

#[test]
fn test_db_schema_qualifies_table_references() {
    let opts = EmitOptions {
        sql_db_schema: true,
        ..EmitOptions::default()
    };
    let out = emit_sql(&top_with_item(), &opts).unwrap();
    let ddl = &out.ddl;

    assert!(ddl.contains("CREATE TABLE net.top ("));
    assert!(ddl.contains("CREATE TABLE net.top_item ("));
    assert!(ddl.contains("FOREIGN KEY(revision_fk) REFERENCES net.top(revision)"));
    assert!(ddl.contains("CREATE TRIGGER top_dt AFTER DELETE ON net.top"));
    assert!(ddl.contains("DELETE FROM net.top_item WHERE revision_fk = OLD.revision;"));
    // Constraint names stay unqualified.
    assert!(ddl.contains("CONSTRAINT top_item_pk PRIMARY KEY(id_fk)"));
}

#[test]
fn test_headers_cover_keyed_tables() {
    let opts = EmitOptions {
        sql_headers: true,
        sql_output_stem: Some("netdb".to_string()),
        ..EmitOptions::default()
    };
    let out = emit_sql(&top_with_item(), &opts).unwrap();
    let h = out.header_h.expect("header requested");
    let c = out.header_c.expect("source requested");

    assert!(h.contains("#ifndef NETDB_H"));
    assert!(h.contains("#define TOP_ITEM \"/top/item\""));
    assert!(h.contains("#define TOP_ITEM_KEYS \"id\""));
    assert!(h.contains("#define NET_DB \"net.db\""));
    assert!(c.contains("if (strcmp(keyPath, TOP_ITEM) == 0)"));
    assert!(c.contains("return TOP_ITEM_KEYS;"));
}

#[test]
fn test_headers_carry_enum_constants() {
    let context = single_module(json!([
        {
            "kind": "container",
            "name": "top",
            "children": [
                {
                    "kind": "list",
                    "name": "item",
                    "key": ["id"],
                    "children": [
                        { "kind": "leaf", "name": "id", "type": { "name": "int32" } },
                        {
                            "kind": "leaf",
                            "name": "oper-state",
                            "type": {
                                "name": "enumeration",
                                "enums": [
                                    { "name": "up" },
                                    { "name": "down", "value": 5 }
                                ]
                            }
                        }
                    ]
                }
            ]
        }
    ]));
    let opts = EmitOptions {
        sql_headers: true,
        sql_output_stem: Some("netdb".to_string()),
        ..EmitOptions::default()
    };
    let out = emit_sql(&context, &opts).unwrap();
    let h = out.header_h.expect("header requested");

    // Undeclared values take the member index; declared values win.
    assert!(h.contains("#define TOP_ITEM_OPER_STATE_UP 0"));
    assert!(h.contains("#define TOP_ITEM_OPER_STATE_UP_ENUM \"/top/item/oper_state#up\""));
    assert!(h.contains("#define TOP_ITEM_OPER_STATE_DOWN 5"));
    assert!(h.contains("#define TOP_ITEM_OPER_STATE_DOWN_ENUM \"/top/item/oper_state#down\""));
}

#[test]
fn test_headers_absent_by_default() {
    let out = emit_sql(&top_with_item(), &EmitOptions::default()).unwrap();
    assert!(out.header_h.is_none());
    assert!(out.header_c.is_none());
}

#[test]
fn test_module_banner_carries_revision() {
    let context = ctx(json!({
        "modules": [{
            "name": "net",
            "namespace": "urn:net",
            "prefix": "net",
            "latest-revision": "2025-06-01",
            "children": [
                { "kind": "container", "name": "top", "children": [
                    { "kind": "leaf", "name": "x", "type": { "name": "string" } }
                ] }
            ]
        }]
    }));
    let out = emit_sql(&context, &EmitOptions::default()).unwrap();
    assert!(out.ddl.contains("-- module net@2025-06-01"));
}
