//! Identity derivation hierarchy.
//!
//! Collects every identity declaration across the module set and builds a
//! multi-root forest of the base → derived relation, used to expand
//! `identityref` leaves into enumerated value sets.
//!
//! The forest is stored as a parent-set map plus a derived reverse
//! (base → children) index, so descendant queries walk the index instead
//! of re-traversing nested maps. An identity with several bases attaches
//! under each of them — deliberate fan-out for value-set lookup, the
//! structure is not strictly tree-shaped.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, warn};

use crate::context::SchemaContext;

/// The built forest. Keys are fully qualified `declared-prefix:name`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentityForest {
    /// identity → its base identities (empty set for roots).
    parents: BTreeMap<String, BTreeSet<String>>,
    /// base → identities that declare it directly.
    children: BTreeMap<String, BTreeSet<String>>,
    roots: BTreeSet<String>,
    /// Identities left unplaced when the iteration cap was hit: base-chain
    /// cycles, or bases living in modules outside the loaded set.
    unplaced: Vec<String>,
}

impl IdentityForest {
    /// Build the forest by iterative fixed point: each pass places every
    /// identity whose bases are all already present (or that has none).
    ///
    /// `iteration_cap` bounds the number of passes. It is a heuristic —
    /// it must exceed the deepest base-dependency chain across the loaded
    /// modules. Hitting the cap is tolerated (not fatal): unresolved
    /// identities stay unplaced and a warning is logged, because bases
    /// may legitimately live in modules outside the translation set.
    pub fn build(ctx: &SchemaContext, iteration_cap: usize) -> Self {
        let mut pending: Vec<(String, Vec<String>)> = Vec::new();
        for module in &ctx.modules {
            for iden in &module.identities {
                let fq = qualify(&iden.name, &module.prefix);
                let bases = iden
                    .bases
                    .iter()
                    .map(|b| qualify(b, &module.prefix))
                    .collect();
                pending.push((fq, bases));
            }
        }

        let mut forest = IdentityForest::default();
        let mut iterations = 0usize;
        while !pending.is_empty() && iterations < iteration_cap {
            iterations += 1;
            let mut placed_any = false;
            pending.retain(|(fq, bases)| {
                if bases.is_empty() {
                    forest.roots.insert(fq.clone());
                    forest.parents.entry(fq.clone()).or_default();
                    placed_any = true;
                    return false;
                }
                if bases.iter().all(|b| forest.parents.contains_key(b)) {
                    for base in bases {
                        forest
                            .children
                            .entry(base.clone())
                            .or_default()
                            .insert(fq.clone());
                        forest
                            .parents
                            .entry(fq.clone())
                            .or_default()
                            .insert(base.clone());
                    }
                    placed_any = true;
                    return false;
                }
                true
            });
            if !placed_any {
                break;
            }
        }

        if !pending.is_empty() {
            warn!(
                unplaced = pending.len(),
                iterations,
                cap = iteration_cap,
                "identity hierarchy fixed point did not converge; leaving identities unplaced"
            );
            forest.unplaced = pending.into_iter().map(|(fq, _)| fq).collect();
        } else {
            debug!(iterations, "identity hierarchy converged");
        }
        forest
    }

    /// Every identity anywhere beneath `base`, in deterministic (sorted)
    /// order. `base` itself is not included.
    pub fn descendants(&self, base: &str) -> Vec<String> {
        let mut out = BTreeSet::new();
        let mut queue: Vec<&str> = vec![base];
        while let Some(current) = queue.pop() {
            if let Some(kids) = self.children.get(current) {
                for kid in kids {
                    if out.insert(kid.clone()) {
                        queue.push(kid);
                    }
                }
            }
        }
        out.into_iter().collect()
    }

    pub fn roots(&self) -> impl Iterator<Item = &str> {
        self.roots.iter().map(String::as_str)
    }

    pub fn is_placed(&self, name: &str) -> bool {
        self.parents.contains_key(name)
    }

    pub fn unplaced(&self) -> &[String] {
        &self.unplaced
    }
}

fn qualify(name: &str, prefix: &str) -> String {
    if name.contains(':') {
        name.to_string()
    } else {
        format!("{}:{}", prefix, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{Identity, Module};
    use pretty_assertions::assert_eq;

    fn ctx_with(identities: Vec<Identity>) -> SchemaContext {
        SchemaContext {
            modules: vec![Module {
                name: "m".into(),
                namespace: "urn:m".into(),
                prefix: "m".into(),
                identities,
                ..Module::default()
            }],
            diagnostics: Vec::new(),
        }
    }

    fn iden(name: &str, bases: &[&str]) -> Identity {
        Identity {
            name: name.into(),
            bases: bases.iter().map(|b| b.to_string()).collect(),
        }
    }

    #[test]
    fn test_descendants_collects_transitively() {
        let ctx = ctx_with(vec![
            iden("root", &[]),
            iden("derived", &["root"]),
            iden("more-derived", &["derived"]),
            iden("other-root", &[]),
        ]);
        let forest = IdentityForest::build(&ctx, 20);

        assert_eq!(
            forest.descendants("m:root"),
            vec!["m:derived".to_string(), "m:more-derived".to_string()]
        );
        assert!(forest.descendants("m:other-root").is_empty());
        assert_eq!(forest.roots().count(), 2);
    }

    #[test]
    fn test_out_of_order_declaration_converges() {
        // Derived declared before its base; needs a second pass.
        let ctx = ctx_with(vec![iden("derived", &["root"]), iden("root", &[])]);
        let forest = IdentityForest::build(&ctx, 20);
        assert!(forest.is_placed("m:derived"));
        assert!(forest.unplaced().is_empty());
    }

    #[test]
    fn test_multi_base_fan_out() {
        let ctx = ctx_with(vec![
            iden("a", &[]),
            iden("b", &[]),
            iden("both", &["a", "b"]),
        ]);
        let forest = IdentityForest::build(&ctx, 20);
        assert_eq!(forest.descendants("m:a"), vec!["m:both".to_string()]);
        assert_eq!(forest.descendants("m:b"), vec!["m:both".to_string()]);
    }

    #[test]
    fn test_cycle_leaves_identities_unplaced_not_looping() {
        let ctx = ctx_with(vec![
            iden("x", &["y"]),
            iden("y", &["x"]),
            iden("ok", &[]),
        ]);
        let forest = IdentityForest::build(&ctx, 5);
        assert!(forest.is_placed("m:ok"));
        assert_eq!(forest.unplaced().len(), 2);
    }

    #[test]
    fn test_build_is_idempotent() {
        let ctx = ctx_with(vec![
            iden("root", &[]),
            iden("derived", &["root"]),
            iden("sibling", &["root"]),
        ]);
        let first = IdentityForest::build(&ctx, 20);
        let second = IdentityForest::build(&ctx, 20);
        assert_eq!(first, second);
    }
}
