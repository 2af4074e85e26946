//! C header generation for the SQL schema: key-path and key-field
//! defines plus a `getKey()` lookup so C consumers never hard-code
//! table metadata.

use std::fmt::Write;

/// Per-table facts the header generator needs, collected by the DDL
/// emitter in table creation order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableInfo {
    /// Mangled SQL table name.
    pub name: String,
    /// Slash-joined mangled key path from the module root, never
    /// truncated by the ancestor cutoff.
    pub path: String,
    /// Declared key leaf names, empty for container tables.
    pub keys: Vec<String>,
    /// Owning module name.
    pub module: String,
    /// Enumeration constants of this table's columns.
    pub enums: Vec<EnumConst>,
}

/// One enumeration member of an enumeration-typed column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumConst {
    /// `<ancestors>_<column>_<member>` stem, mangled; upper-cased for
    /// the defines.
    pub stem: String,
    pub value: i64,
    /// `/<ancestors>/<column>#<member>` locator string.
    pub locator: String,
}

fn upper_ident(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}

/// The `.h` text: include guard, a `_DB` define per module, per keyed
/// table the key-path define and its `_KEYS` field list, the
/// enumeration constant pairs and the `getKey` prototype.
pub fn header_h(stem: &str, tables: &[TableInfo]) -> String {
    let guard = format!("{}_H", upper_ident(stem));
    let mut out = String::new();
    let _ = writeln!(out, "#ifndef {}", guard);
    let _ = writeln!(out, "#define {}", guard);
    out.push('\n');

    let mut seen_modules: Vec<&str> = Vec::new();
    for table in tables {
        if !seen_modules.contains(&table.module.as_str()) {
            seen_modules.push(&table.module);
        }
    }
    for module in seen_modules {
        let _ = writeln!(
            out,
            "#define {}_DB \"{}.db\"",
            upper_ident(module),
            module
        );
    }
    out.push('\n');

    for table in tables {
        let upper = upper_ident(&table.name);
        if !table.keys.is_empty() {
            let _ = writeln!(out, "#define {} \"{}\"", upper, table.path);
            let fields: Vec<String> = table
                .keys
                .iter()
                .map(|k| k.replace('-', "_"))
                .collect();
            let _ = writeln!(out, "#define {}_KEYS \"{}\"", upper, fields.join(" "));
        }
        for en in &table.enums {
            let stem = upper_ident(&en.stem);
            let _ = writeln!(out, "#define {} {}", stem, en.value);
            let _ = writeln!(out, "#define {}_ENUM \"{}\"", stem, en.locator);
        }
    }
    out.push('\n');
    out.push_str("const char *getKey(const char *keyPath);\n");
    out.push('\n');
    let _ = writeln!(out, "#endif /* {} */", guard);
    out
}

/// The `.c` text: a strcmp chain from key path to the `_KEYS` define.
/// Paths without a keyed table return NULL through the fallthrough.
pub fn header_c(stem: &str, tables: &[TableInfo]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "#include <string.h>");
    let _ = writeln!(out, "#include <stddef.h>");
    let _ = writeln!(out, "#include \"{}.h\"", stem);
    out.push('\n');
    out.push_str("const char *getKey(const char *keyPath)\n{\n");
    for table in tables.iter().filter(|t| !t.keys.is_empty()) {
        let upper = upper_ident(&table.name);
        let _ = writeln!(
            out,
            "    if (strcmp(keyPath, {}) == 0)\n        return {}_KEYS;",
            upper, upper
        );
    }
    out.push_str("    return NULL;\n}\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn tables() -> Vec<TableInfo> {
        vec![
            TableInfo {
                name: "top".into(),
                path: "/top".into(),
                keys: vec![],
                module: "mod-a".into(),
                enums: vec![],
            },
            TableInfo {
                name: "top_item".into(),
                path: "/top/item".into(),
                keys: vec!["id".into(), "sub-id".into()],
                module: "mod-a".into(),
                enums: vec![EnumConst {
                    stem: "top_item_status_up".into(),
                    value: 0,
                    locator: "/top/item/status#up".into(),
                }],
            },
        ]
    }

    #[test]
    fn test_header_defines_key_paths_and_fields() {
        let h = header_h("netdb", &tables());
        assert!(h.starts_with("#ifndef NETDB_H\n#define NETDB_H\n"));
        assert!(h.contains("#define MOD_A_DB \"mod-a.db\"\n"));
        assert!(h.contains("#define TOP_ITEM \"/top/item\"\n"));
        assert!(h.contains("#define TOP_ITEM_KEYS \"id sub_id\"\n"));
        // Container tables have no key path.
        assert!(!h.contains("#define TOP \"/top\""));
        assert!(h.contains("const char *getKey(const char *keyPath);"));
        assert!(h.trim_end().ends_with("#endif /* NETDB_H */"));
    }

    #[test]
    fn test_header_emits_enum_constant_pairs() {
        let h = header_h("netdb", &tables());
        assert!(h.contains("#define TOP_ITEM_STATUS_UP 0\n"));
        assert!(h.contains("#define TOP_ITEM_STATUS_UP_ENUM \"/top/item/status#up\"\n"));
    }

    #[test]
    fn test_get_key_chain_matches_key_paths() {
        let c = header_c("netdb", &tables());
        assert!(c.contains("#include \"netdb.h\""));
        assert!(c.contains("strcmp(keyPath, TOP_ITEM)"));
        assert!(!c.contains("strcmp(keyPath, TOP)"));
        assert!(c.contains("return TOP_ITEM_KEYS;"));
        assert!(c.trim_end().ends_with("return NULL;\n}"));
    }

    #[test]
    fn test_db_define_dedupes_modules() {
        let mut ts = tables();
        ts.push(TableInfo {
            name: "other".into(),
            path: "/other".into(),
            keys: vec![],
            module: "mod-a".into(),
            enums: vec![],
        });
        let h = header_h("x", &ts);
        assert_eq!(h.matches("MOD_A_DB").count(), 1);
    }
}
