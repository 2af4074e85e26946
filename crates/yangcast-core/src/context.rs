//! The resolved schema context handed to the translation core.
//!
//! An external front end parses, validates and cross-links the YANG source
//! and produces this forest of modules. Everything here is read-only for
//! the duration of a run: the core derives its own indexes (prefix
//! registry, identity forest) but never writes back into the context.
//!
//! The model is serde-deserializable so a context prepared as JSON can be
//! loaded directly by the CLI.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Context & modules
// ---------------------------------------------------------------------------

/// A set of modules plus the diagnostics the front end recorded against
/// them. Any error-severity diagnostic gates emission.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct SchemaContext {
    pub modules: Vec<Module>,
    pub diagnostics: Vec<Diagnostic>,
}

impl SchemaContext {
    /// Count of error-severity diagnostics attached by the front end.
    pub fn error_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .count()
    }

    pub fn find_module(&self, name: &str) -> Option<&Module> {
        self.modules.iter().find(|m| m.name == name)
    }

    /// Look up a module by its *declared* prefix (the prefix written in the
    /// YANG source, before run-unique disambiguation).
    pub fn module_by_declared_prefix(&self, prefix: &str) -> Option<&Module> {
        self.modules.iter().find(|m| m.prefix == prefix)
    }
}

/// One YANG module with its data tree and reusable declarations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Module {
    pub name: String,
    pub namespace: String,
    /// Prefix declared in the module source. May collide across the run;
    /// the prefix registry disambiguates.
    pub prefix: String,
    /// Latest revision string, if the module declares any revision.
    pub latest_revision: Option<String>,
    pub typedefs: BTreeMap<String, TypeSpec>,
    pub identities: Vec<Identity>,
    /// ietf-yang-metadata annotations declared by the module.
    pub annotations: Vec<Annotation>,
    pub children: Vec<SchemaNode>,
}

impl Module {
    /// `<name>[@<revision>]` — the stem used for per-module output files
    /// and attached database names.
    pub fn file_stem(&self) -> String {
        match &self.latest_revision {
            Some(rev) => format!("{}@{}", self.name, rev),
            None => self.name.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Diagnostics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

/// A severity-tagged message recorded by the front end.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

// ---------------------------------------------------------------------------
// Schema nodes
// ---------------------------------------------------------------------------

/// Metadata shared by every node kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct NodeMeta {
    pub name: String,
    /// Owning module when it differs from the tree's module (children
    /// merged in from augmenting modules keep their origin here).
    pub module: Option<String>,
    pub description: Option<String>,
    pub reference: Option<String>,
    pub config: Option<bool>,
    pub units: Option<String>,
    pub must: Option<MustSpec>,
    pub when: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct MustSpec {
    pub expr: String,
    pub error_message: Option<String>,
    pub description: Option<String>,
}

/// One element of the data-model tree. Closed variant set: the walker
/// dispatches exhaustively, there is no "unexpected keyword" branch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum SchemaNode {
    Container {
        #[serde(flatten)]
        meta: NodeMeta,
        /// Presence string when the container is presence-optional.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        presence: Option<String>,
        #[serde(default)]
        children: Vec<SchemaNode>,
    },
    List {
        #[serde(flatten)]
        meta: NodeMeta,
        /// Declared key leaf names, in declaration order. Each must
        /// resolve to a direct child leaf.
        #[serde(default)]
        key: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min_elements: Option<u64>,
        /// `None` means unbounded.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_elements: Option<u64>,
        #[serde(default)]
        children: Vec<SchemaNode>,
    },
    Leaf {
        #[serde(flatten)]
        meta: NodeMeta,
        #[serde(rename = "type")]
        type_spec: TypeSpec,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        mandatory: Option<bool>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        default: Option<String>,
    },
    LeafList {
        #[serde(flatten)]
        meta: NodeMeta,
        #[serde(rename = "type")]
        type_spec: TypeSpec,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min_elements: Option<u64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_elements: Option<u64>,
    },
    Choice {
        #[serde(flatten)]
        meta: NodeMeta,
        /// Case nodes (a shorthand non-case child is not modeled; the
        /// front end wraps implicit cases before handing us the tree).
        #[serde(default)]
        children: Vec<SchemaNode>,
    },
    Case {
        #[serde(flatten)]
        meta: NodeMeta,
        #[serde(default)]
        children: Vec<SchemaNode>,
    },
    Anyxml {
        #[serde(flatten)]
        meta: NodeMeta,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        mandatory: Option<bool>,
    },
    Rpc {
        #[serde(flatten)]
        meta: NodeMeta,
        #[serde(default)]
        input: Vec<SchemaNode>,
        #[serde(default)]
        output: Vec<SchemaNode>,
    },
    Notification {
        #[serde(flatten)]
        meta: NodeMeta,
        #[serde(default)]
        children: Vec<SchemaNode>,
    },
}

impl SchemaNode {
    pub fn meta(&self) -> &NodeMeta {
        match self {
            SchemaNode::Container { meta, .. }
            | SchemaNode::List { meta, .. }
            | SchemaNode::Leaf { meta, .. }
            | SchemaNode::LeafList { meta, .. }
            | SchemaNode::Choice { meta, .. }
            | SchemaNode::Case { meta, .. }
            | SchemaNode::Anyxml { meta, .. }
            | SchemaNode::Rpc { meta, .. }
            | SchemaNode::Notification { meta, .. } => meta,
        }
    }

    pub fn name(&self) -> &str {
        &self.meta().name
    }

    /// Child sequence for the node kinds that carry one. Leaves, anyxml
    /// and rpc (whose input/output are addressed separately) yield `&[]`.
    pub fn children(&self) -> &[SchemaNode] {
        match self {
            SchemaNode::Container { children, .. }
            | SchemaNode::List { children, .. }
            | SchemaNode::Choice { children, .. }
            | SchemaNode::Case { children, .. }
            | SchemaNode::Notification { children, .. } => children,
            _ => &[],
        }
    }

    /// True when `config false` is declared on the node itself.
    pub fn is_config_false(&self) -> bool {
        self.meta().config == Some(false)
    }

    pub fn type_spec(&self) -> Option<&TypeSpec> {
        match self {
            SchemaNode::Leaf { type_spec, .. } | SchemaNode::LeafList { type_spec, .. } => {
                Some(type_spec)
            }
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Types, identities, annotations
// ---------------------------------------------------------------------------

/// One type declaration, as written at its point of use.
///
/// `name` is either a primitive (see [`is_primitive`]), `union`,
/// `leafref`, `identityref`, or a (possibly prefix-qualified) typedef
/// reference that the resolver must chase.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct TypeSpec {
    pub name: String,
    /// Numeric range restriction; sub-ranges joined by `|`.
    pub range: Option<String>,
    /// String/binary length restriction; sub-ranges joined by `|`.
    pub length: Option<String>,
    pub pattern: Option<String>,
    pub fraction_digits: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub enums: Vec<EnumSpec>,
    /// Member types when `name == "union"`, in declaration order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub union_members: Vec<TypeSpec>,
    /// Target path when `name == "leafref"`.
    pub path: Option<String>,
    /// Base identities when `name == "identityref"`; entries may be
    /// prefix-qualified.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub bases: Vec<String>,
}

impl TypeSpec {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct EnumSpec {
    pub name: String,
    pub value: Option<i64>,
}

/// A named identity with zero or more base references.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Identity {
    pub name: String,
    /// Base identities; entries may be prefix-qualified. Empty for roots.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub bases: Vec<String>,
}

/// An ietf-yang-metadata annotation declaration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Annotation {
    pub name: String,
    #[serde(rename = "type")]
    pub type_spec: Option<TypeSpec>,
}

/// The YANG built-in types that resolution bottoms out on.
pub const PRIMITIVES: &[&str] = &[
    "int8",
    "int16",
    "int32",
    "int64",
    "uint8",
    "uint16",
    "uint32",
    "uint64",
    "decimal64",
    "boolean",
    "binary",
    "string",
    "enumeration",
    "identityref",
    "instance-identifier",
    "bits",
    "empty",
];

pub fn is_primitive(name: &str) -> bool {
    PRIMITIVES.contains(&name)
}
