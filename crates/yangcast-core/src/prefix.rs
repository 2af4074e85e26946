//! Run-unique module prefixes and per-document import tracking.

use std::collections::{BTreeMap, BTreeSet};

use crate::context::{Module, SchemaContext};

/// What a prefix resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleInfo {
    pub module: String,
    pub namespace: String,
    pub latest_revision: Option<String>,
}

/// Assigns every module a run-unique prefix and answers lookups in both
/// directions.
///
/// Each module keeps its declared prefix when free; on collision the
/// first module in encounter order wins and each subsequent collider
/// gets the next unused numeric suffix.
#[derive(Debug, Clone, Default)]
pub struct PrefixRegistry {
    prefix_of: BTreeMap<String, String>,
    info_of: BTreeMap<String, ModuleInfo>,
    /// Module names in context encounter order, for deterministic
    /// per-module iteration by the emitters.
    order: Vec<String>,
}

impl PrefixRegistry {
    pub fn assign(ctx: &SchemaContext) -> Self {
        let mut reg = PrefixRegistry::default();
        for module in &ctx.modules {
            let mut candidate = module.prefix.clone();
            let mut suffix = 0usize;
            while reg.info_of.contains_key(&candidate) {
                suffix += 1;
                candidate = format!("{}{}", module.prefix, suffix);
            }
            reg.prefix_of
                .insert(module.name.clone(), candidate.clone());
            reg.info_of.insert(
                candidate,
                ModuleInfo {
                    module: module.name.clone(),
                    namespace: module.namespace.clone(),
                    latest_revision: module.latest_revision.clone(),
                },
            );
            reg.order.push(module.name.clone());
        }
        reg
    }

    pub fn prefix(&self, module_name: &str) -> Option<&str> {
        self.prefix_of.get(module_name).map(String::as_str)
    }

    pub fn lookup(&self, prefix: &str) -> Option<&ModuleInfo> {
        self.info_of.get(prefix)
    }

    /// Module names in encounter order.
    pub fn modules(&self) -> &[String] {
        &self.order
    }

    /// The run-unique prefix of the module that owns `node_module`,
    /// falling back to the tree module's prefix when the node carries no
    /// origin override.
    pub fn prefix_for_node<'a>(
        &'a self,
        tree_module: &'a Module,
        node_module: Option<&str>,
    ) -> &'a str {
        node_module
            .and_then(|m| self.prefix(m))
            .or_else(|| self.prefix(&tree_module.name))
            .unwrap_or(&tree_module.prefix)
    }
}

/// Cross-module import edges, one set per output document.
///
/// `note_import` is idempotent: only the first reference from a document
/// to a module reports true, so emitters inject each import/attach
/// declaration exactly once.
#[derive(Debug, Clone, Default)]
pub struct ImportTracker {
    edges: BTreeSet<(String, String)>,
}

impl ImportTracker {
    pub fn note_import(&mut self, document: &str, module: &str) -> bool {
        self.edges
            .insert((document.to_string(), module.to_string()))
    }

    pub fn imports_of<'a>(&'a self, document: &'a str) -> impl Iterator<Item = &'a str> {
        self.edges
            .iter()
            .filter(move |(d, _)| d == document)
            .map(|(_, m)| m.as_str())
    }
}
