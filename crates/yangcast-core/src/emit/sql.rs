//! SQL DDL emitter: a relational rendering of the configuration tree.
//!
//! Containers become revision-keyed tables, lists become tables keyed by
//! their declared key leaves, leaf-lists get a table of their own and
//! plain leaves become columns on the enclosing table. Parent tables are
//! wired to their children with foreign keys, and every table with child
//! tables gets an AFTER DELETE trigger so removing a parent row cascades.
//!
//! `config false` subtrees carry operational state, not configuration,
//! and are excluded entirely.

use std::fmt::Write;

use tracing::{debug, warn};

use crate::config::EmitOptions;
use crate::context::{Module, SchemaContext, SchemaNode};
use crate::emit::headers::{header_c, header_h, EnumConst, TableInfo};
use crate::error::ResolveError;
use crate::prefix::PrefixRegistry;
use crate::resolver::resolve_leaf_types;
use crate::walker::{
    excise_rpc_subtrees, find_node, walk_forest, AncestorPath, Descend, SchemaVisitor,
};

/// The emitter's complete output: one DDL script covering every module,
/// plus the optional C header pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlOutput {
    pub ddl: String,
    pub header_h: Option<String>,
    pub header_c: Option<String>,
}

/// Identifiers that collide with SQL keywords after mangling.
const RESERVED: &[&str] = &[
    "create", "delete", "group", "if", "index", "insert", "order", "select", "table", "where",
];

/// SQL-safe identifier: hyphens and dots become underscores, reserved
/// words get a `1` suffix.
fn underscore(name: &str) -> String {
    let mangled: String = name
        .chars()
        .map(|c| if c == '-' || c == '.' { '_' } else { c })
        .collect();
    if RESERVED.contains(&mangled.to_ascii_lowercase().as_str()) {
        format!("{}1", mangled)
    } else {
        mangled
    }
}

/// The full mangled key path of a node, slash-joined from the module
/// root. Never truncated by the ancestor cutoff: C consumers address
/// tables by it.
fn key_path(path: &AncestorPath, name: &str) -> String {
    let mut parts: Vec<String> = path.names().iter().map(|s| underscore(s)).collect();
    parts.push(underscore(name));
    format!("/{}", parts.join("/"))
}

/// Table reference with the schema (attach alias) prefix when one is
/// active.
fn qualify(schema: &Option<String>, name: &str) -> String {
    match schema {
        Some(s) => format!("{}.{}", s, name),
        None => name.to_string(),
    }
}

fn sql_type(base: &str) -> &'static str {
    match base {
        "int8" | "int16" | "int32" | "int64" | "uint8" | "uint16" | "uint32" | "uint64"
        | "boolean" => "INTEGER",
        "decimal64" => "FLOAT",
        _ => "TEXT",
    }
}

/// Quote a declared default for use as a SQL literal.
fn sql_literal(value: &str) -> String {
    let numeric = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_digit() || c == '-' || c == '.');
    if numeric {
        value.to_string()
    } else if value == "true" {
        "1".to_string()
    } else if value == "false" {
        "0".to_string()
    } else {
        format!("'{}'", value.replace('\'', "''"))
    }
}

pub fn emit(ctx: &SchemaContext, opts: &EmitOptions) -> SqlOutput {
    let registry = PrefixRegistry::assign(ctx);
    let mut body = String::new();
    let mut all_tables: Vec<TableInfo> = Vec::new();
    // (file stem, attach alias) of every module with relational content,
    // for the ATTACH directives at the top of the stream.
    let mut attached: Vec<(String, String)> = Vec::new();

    for name in registry.modules() {
        let Some(module) = ctx.find_module(name) else {
            continue;
        };
        let alias = underscore(registry.prefix(name).unwrap_or(&module.prefix));
        let tree = excise_rpc_subtrees(module);
        if !tree.rpcs.is_empty() || !tree.notifications.is_empty() {
            debug!(module = %name, "rpcs and notifications have no relational form");
        }
        let mut visitor = SqlWalk {
            ctx,
            opts,
            module,
            schema: opts.sql_db_schema.then(|| alias.clone()),
            stack: Vec::new(),
            statements: Vec::new(),
            tables: Vec::new(),
            samples: Vec::new(),
            case_depth: 0,
        };
        if let Err(err) = walk_forest(&tree.data, &AncestorPath::root(), &mut visitor) {
            warn!(module = %name, %err, "translation aborted for module");
            continue;
        }
        if visitor.statements.is_empty() {
            debug!(module = %name, "no relational content");
            continue;
        }

        let _ = writeln!(body, "-- module {}", module.file_stem());
        let _ = writeln!(body, ".open {}.db", module.file_stem());
        for stmt in &visitor.statements {
            body.push_str(stmt);
            body.push('\n');
        }
        if opts.sql_sample_data {
            for insert in render_samples(&visitor.samples) {
                body.push_str(&insert);
                body.push('\n');
            }
        }
        body.push('\n');
        all_tables.extend(visitor.tables);
        attached.push((module.file_stem(), alias));
    }

    let mut ddl = String::from("-- SQL DDL generated by yangcast\n");
    let _ = writeln!(
        ddl,
        "-- options: ancestor-cutoff={}, sample-data={}, db-schema={}, headers={}",
        opts.sql_ancestor_cutoff
            .map_or_else(|| "unbounded".to_string(), |c| c.to_string()),
        opts.sql_sample_data,
        opts.sql_db_schema,
        opts.sql_headers
    );
    for (stem, alias) in &attached {
        let _ = writeln!(ddl, "--ATTACH DATABASE '{}.db' AS {};", stem, alias);
    }
    ddl.push('\n');
    ddl.push_str(&body);

    let (header_h, header_c) = if opts.sql_headers {
        let stem = opts.sql_output_stem.as_deref().unwrap_or("yangcast");
        (
            Some(header_h(stem, &all_tables)),
            Some(header_c(stem, &all_tables)),
        )
    } else {
        (None, None)
    };
    SqlOutput {
        ddl,
        header_h,
        header_c,
    }
}

// ---------------------------------------------------------------------------
// Table assembly
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct Column {
    name: String,
    sql_type: &'static str,
    not_null: bool,
    /// Inline PRIMARY KEY, used only by the container revision column.
    primary_key: bool,
    default: Option<String>,
}

impl Column {
    fn render(&self) -> String {
        let mut out = format!("    {} {}", self.name, self.sql_type);
        if self.not_null {
            out.push_str(" NOT NULL");
        }
        if self.primary_key {
            out.push_str(" PRIMARY KEY");
        }
        if let Some(default) = &self.default {
            let _ = write!(out, " DEFAULT {}", sql_literal(default));
        }
        out
    }
}

/// How a child table hangs off this one, for the delete trigger.
#[derive(Debug, Clone)]
enum ChildRel {
    /// Child container row referenced by our `<child>_fk` column.
    ContainerFk { table: String, fk_col: String },
    /// Child table carries `revision_fk` back to our revision.
    RevisionRef { table: String },
    /// Nested child table repeats our key columns.
    KeyRef { table: String, cols: Vec<String> },
}

#[derive(Debug, Clone)]
struct Table {
    name: String,
    /// Slash-joined mangled key path, never truncated by the ancestor
    /// cutoff. C consumers address tables by it.
    path: String,
    module: String,
    is_list: bool,
    /// Declared key leaf names (lists only).
    keys: Vec<String>,
    /// Mangled key column names with their SQL types, for nested
    /// children to repeat.
    key_cols: Vec<(String, &'static str)>,
    columns: Vec<Column>,
    constraints: Vec<String>,
    children: Vec<ChildRel>,
    /// Enumeration constants of this table's columns, for the headers.
    enums: Vec<EnumConst>,
}

impl Table {
    fn new(name: String, path: String, module: String, is_list: bool) -> Self {
        Self {
            name,
            path,
            module,
            is_list,
            keys: Vec::new(),
            key_cols: Vec::new(),
            columns: Vec::new(),
            constraints: Vec::new(),
            children: Vec::new(),
            enums: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
struct SampleSpec {
    table: String,
    columns: Vec<Column>,
    rows: usize,
}

/// Header constants for an enumeration-typed column: one value define
/// and one `/path/column#name` locator per member. Members without a
/// declared value fall back to their index, as YANG auto-assigns.
fn enum_constants(
    path: &AncestorPath,
    column: &str,
    enums: &[crate::context::EnumSpec],
) -> Vec<EnumConst> {
    enums
        .iter()
        .enumerate()
        .map(|(i, en)| {
            let mut stem: Vec<String> = path.names().iter().map(|s| underscore(s)).collect();
            stem.push(underscore(column));
            stem.push(underscore(&en.name));
            EnumConst {
                stem: stem.join("_"),
                value: en.value.unwrap_or(i as i64),
                locator: format!("{}#{}", key_path(path, column), underscore(&en.name)),
            }
        })
        .collect()
}

fn render_samples(samples: &[SampleSpec]) -> Vec<String> {
    let mut out = Vec::new();
    for spec in samples {
        let names: Vec<&str> = spec.columns.iter().map(|c| c.name.as_str()).collect();
        for row in 0..spec.rows {
            let values: Vec<String> = spec
                .columns
                .iter()
                .map(|c| match &c.default {
                    Some(d) => sql_literal(d),
                    None if c.sql_type == "TEXT" => format!("'{}_{}'", c.name, row),
                    None => row.to_string(),
                })
                .collect();
            out.push(format!(
                "INSERT INTO {} ({}) VALUES ({});",
                spec.table,
                names.join(", "),
                values.join(", ")
            ));
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Tree walk
// ---------------------------------------------------------------------------

struct SqlWalk<'a> {
    ctx: &'a SchemaContext,
    opts: &'a EmitOptions,
    module: &'a Module,
    /// Attach alias qualifying table references when db-schema output is
    /// requested.
    schema: Option<String>,
    stack: Vec<Table>,
    statements: Vec<String>,
    tables: Vec<TableInfo>,
    samples: Vec<SampleSpec>,
    /// Columns added inside a choice case are always nullable.
    case_depth: usize,
}

impl<'a> SqlWalk<'a> {
    /// Mangled table name from the ancestor path plus the node name,
    /// truncated to the configured ancestor count from the right.
    fn table_name(&self, path: &AncestorPath, name: &str) -> String {
        let full = path.child(name);
        let mangled = AncestorPath::seeded(full.names().iter().map(|s| underscore(s)));
        mangled.tail_joined("_", self.opts.sql_ancestor_cutoff)
    }


    /// Wire a new list or leaf-list table to its parent: containers hand
    /// down their revision, lists hand down their key columns.
    fn link_to_parent(&mut self, table: &mut Table) {
        let schema = self.schema.clone();
        let Some(parent) = self.stack.last_mut() else {
            return;
        };
        if parent.is_list {
            let own: Vec<&str> = table.key_cols.iter().map(|(c, _)| c.as_str()).collect();
            let inherited: Vec<(String, &'static str)> = parent
                .key_cols
                .iter()
                .filter(|(c, _)| !own.contains(&c.as_str()))
                .cloned()
                .collect();
            if inherited.is_empty() {
                debug!(table = %table.name, "parent key columns shadowed; no foreign key");
                return;
            }
            let col_names: Vec<String> = inherited.iter().map(|(c, _)| c.clone()).collect();
            for (col, ty) in inherited {
                table.columns.push(Column {
                    name: col,
                    sql_type: ty,
                    not_null: true,
                    primary_key: false,
                    default: None,
                });
            }
            table.constraints.push(format!(
                "FOREIGN KEY({}) REFERENCES {}({})",
                col_names.join(", "),
                qualify(&schema, &parent.name),
                col_names.join(", ")
            ));
            parent.children.push(ChildRel::KeyRef {
                table: table.name.clone(),
                cols: col_names,
            });
        } else {
            table.columns.push(Column {
                name: "revision_fk".to_string(),
                sql_type: "INTEGER",
                not_null: true,
                primary_key: false,
                default: None,
            });
            table.constraints.push(format!(
                "FOREIGN KEY(revision_fk) REFERENCES {}(revision)",
                qualify(&schema, &parent.name)
            ));
            parent.children.push(ChildRel::RevisionRef {
                table: table.name.clone(),
            });
        }
    }

    /// Render the finished table: CREATE TABLE, the cascade trigger when
    /// it has child tables, and the sample data spec.
    fn finish_table(&mut self, table: Table, sample_rows: usize) {
        let qualified = qualify(&self.schema, &table.name);
        let mut stmt = format!("CREATE TABLE {} (\n", qualified);
        let parts: Vec<String> = table
            .columns
            .iter()
            .map(Column::render)
            .chain(table.constraints.iter().map(|c| format!("    {}", c)))
            .collect();
        stmt.push_str(&parts.join(",\n"));
        stmt.push_str("\n);");
        self.statements.push(stmt);

        if !table.children.is_empty() {
            let mut trigger = format!(
                "CREATE TRIGGER {}_dt AFTER DELETE ON {}\nBEGIN\n",
                table.name, qualified
            );
            for child in &table.children {
                match child {
                    ChildRel::ContainerFk { table: t, fk_col } => {
                        let _ = writeln!(
                            trigger,
                            "    DELETE FROM {} WHERE revision = OLD.{};",
                            qualify(&self.schema, t),
                            fk_col
                        );
                    }
                    ChildRel::RevisionRef { table: t } => {
                        let _ = writeln!(
                            trigger,
                            "    DELETE FROM {} WHERE revision_fk = OLD.revision;",
                            qualify(&self.schema, t)
                        );
                    }
                    ChildRel::KeyRef { table: t, cols } => {
                        let clauses: Vec<String> =
                            cols.iter().map(|c| format!("{} = OLD.{}", c, c)).collect();
                        let _ = writeln!(
                            trigger,
                            "    DELETE FROM {} WHERE {};",
                            qualify(&self.schema, t),
                            clauses.join(" AND ")
                        );
                    }
                }
            }
            trigger.push_str("END;");
            self.statements.push(trigger);
        }

        self.tables.push(TableInfo {
            name: table.name.clone(),
            path: table.path.clone(),
            keys: table.keys.clone(),
            module: table.module.clone(),
            enums: table.enums.clone(),
        });
        if self.opts.sql_sample_data {
            self.samples.push(SampleSpec {
                table: qualified,
                columns: table.columns,
                rows: sample_rows,
            });
        }
    }
}

impl<'a> SchemaVisitor for SqlWalk<'a> {
    type Error = ResolveError;

    fn enter_container(
        &mut self,
        node: &SchemaNode,
        path: &AncestorPath,
    ) -> Result<Descend, Self::Error> {
        if node.is_config_false() {
            debug!(container = node.name(), "operational state; no table");
            return Ok(Descend::Skip);
        }
        let name = self.table_name(path, node.name());
        let qualified = qualify(&self.schema, &name);
        let mut table = Table::new(
            name.clone(),
            key_path(path, node.name()),
            self.module.name.clone(),
            false,
        );
        table.columns.push(Column {
            name: "revision".to_string(),
            sql_type: "INTEGER",
            not_null: true,
            primary_key: true,
            default: None,
        });

        if let Some(parent) = self.stack.last_mut() {
            let presence = matches!(
                node,
                SchemaNode::Container {
                    presence: Some(_),
                    ..
                }
            );
            let fk = format!("{}_fk", underscore(node.name()));
            parent.columns.push(Column {
                name: fk.clone(),
                sql_type: "INTEGER",
                not_null: !presence && self.case_depth == 0,
                primary_key: false,
                default: None,
            });
            parent.constraints.push(format!(
                "FOREIGN KEY({}) REFERENCES {}(revision)",
                fk, qualified
            ));
            parent.children.push(ChildRel::ContainerFk {
                table: name,
                fk_col: fk,
            });
        }
        self.stack.push(table);
        Ok(Descend::Into)
    }

    fn leave_container(&mut self, _: &SchemaNode, _: &AncestorPath) -> Result<(), Self::Error> {
        if let Some(table) = self.stack.pop() {
            self.finish_table(table, 1);
        }
        Ok(())
    }

    fn enter_list(&mut self, node: &SchemaNode, path: &AncestorPath) -> Result<Descend, Self::Error> {
        if node.is_config_false() {
            debug!(list = node.name(), "operational state; no table");
            return Ok(Descend::Skip);
        }
        let SchemaNode::List { key, children, .. } = node else {
            return Ok(Descend::Skip);
        };
        let name = self.table_name(path, node.name());
        let mut table = Table::new(
            name,
            key_path(path, node.name()),
            self.module.name.clone(),
            true,
        );
        table.keys = key.clone();

        let leaf_path = path.child(node.name());
        for k in key {
            let ty = match find_node(children, &[k]) {
                Some(leaf) => {
                    let resolved = resolve_leaf_types(self.ctx, self.module, leaf, &leaf_path)?;
                    resolved.first().map_or("TEXT", |r| sql_type(&r.base))
                }
                None => {
                    debug!(list = node.name(), key = %k, "declared key leaf not found");
                    "TEXT"
                }
            };
            let col = format!("{}_fk", underscore(k));
            table.columns.push(Column {
                name: col.clone(),
                sql_type: ty,
                not_null: true,
                primary_key: false,
                default: None,
            });
            table.key_cols.push((col, ty));
        }
        if !table.key_cols.is_empty() {
            let cols: Vec<&str> = table.key_cols.iter().map(|(c, _)| c.as_str()).collect();
            table.constraints.push(format!(
                "CONSTRAINT {}_pk PRIMARY KEY({})",
                table.name,
                cols.join(", ")
            ));
        }
        self.link_to_parent(&mut table);
        self.stack.push(table);
        Ok(Descend::Into)
    }

    fn leave_list(&mut self, _: &SchemaNode, _: &AncestorPath) -> Result<(), Self::Error> {
        if let Some(table) = self.stack.pop() {
            self.finish_table(table, 3);
        }
        Ok(())
    }

    fn enter_case(&mut self, _: &SchemaNode, _: &AncestorPath) -> Result<Descend, Self::Error> {
        self.case_depth += 1;
        Ok(Descend::Into)
    }

    fn leave_case(&mut self, _: &SchemaNode, _: &AncestorPath) -> Result<(), Self::Error> {
        self.case_depth -= 1;
        Ok(())
    }

    fn visit_leaf(&mut self, node: &SchemaNode, path: &AncestorPath) -> Result<(), Self::Error> {
        if node.is_config_false() {
            debug!(leaf = node.name(), "operational state; no column");
            return Ok(());
        }
        let is_key = self
            .stack
            .last()
            .is_some_and(|t| t.is_list && t.keys.iter().any(|k| k == node.name()));
        if is_key {
            // Already present as the key column.
            return Ok(());
        }
        if self.stack.is_empty() {
            debug!(leaf = node.name(), "module-level leaf has no enclosing table");
            return Ok(());
        }
        let resolved = resolve_leaf_types(self.ctx, self.module, node, path)?;
        let ty = resolved.first().map_or("TEXT", |r| sql_type(&r.base));
        let (mandatory, default) = match node {
            SchemaNode::Leaf {
                mandatory, default, ..
            } => (mandatory.unwrap_or(false), default.clone()),
            _ => (false, None),
        };
        let enums = if self.opts.sql_headers {
            resolved
                .first()
                .map(|rt| enum_constants(path, node.name(), &rt.enums))
                .unwrap_or_default()
        } else {
            Vec::new()
        };
        let case_depth = self.case_depth;
        if let Some(table) = self.stack.last_mut() {
            table.columns.push(Column {
                name: underscore(node.name()),
                sql_type: ty,
                not_null: mandatory && case_depth == 0,
                primary_key: false,
                default,
            });
            table.enums.extend(enums);
        }
        Ok(())
    }

    fn visit_leaf_list(&mut self, node: &SchemaNode, path: &AncestorPath) -> Result<(), Self::Error> {
        if node.is_config_false() {
            debug!(leaf_list = node.name(), "operational state; no table");
            return Ok(());
        }
        let resolved = resolve_leaf_types(self.ctx, self.module, node, path)?;
        let ty = resolved.first().map_or("TEXT", |r| sql_type(&r.base));
        let name = self.table_name(path, node.name());
        let col = underscore(node.name());
        let mut table = Table::new(
            name,
            key_path(path, node.name()),
            self.module.name.clone(),
            false,
        );
        table.columns.push(Column {
            name: col.clone(),
            sql_type: ty,
            not_null: true,
            primary_key: false,
            default: None,
        });
        table
            .constraints
            .push(format!("CONSTRAINT {}_pk PRIMARY KEY({})", table.name, col));
        self.link_to_parent(&mut table);
        self.finish_table(table, 1);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_underscore_mangles_and_suffixes_reserved_words() {
        assert_eq!(underscore("mgmt-interface"), "mgmt_interface");
        assert_eq!(underscore("a.b"), "a_b");
        assert_eq!(underscore("group"), "group1");
        assert_eq!(underscore("create"), "create1");
        assert_eq!(underscore("plain"), "plain");
    }

    #[test]
    fn test_sql_type_mapping() {
        assert_eq!(sql_type("uint32"), "INTEGER");
        assert_eq!(sql_type("boolean"), "INTEGER");
        assert_eq!(sql_type("decimal64"), "FLOAT");
        assert_eq!(sql_type("string"), "TEXT");
        assert_eq!(sql_type("identityref"), "TEXT");
    }

    #[test]
    fn test_sql_literal_quoting() {
        assert_eq!(sql_literal("42"), "42");
        assert_eq!(sql_literal("-3.5"), "-3.5");
        assert_eq!(sql_literal("true"), "1");
        assert_eq!(sql_literal("false"), "0");
        assert_eq!(sql_literal("eth0"), "'eth0'");
        assert_eq!(sql_literal("it's"), "'it''s'");
    }
}
