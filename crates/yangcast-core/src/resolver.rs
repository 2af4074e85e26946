//! Type resolution: typedef chasing, union flattening, leafref following.
//!
//! Resolution is a pure function of the context — no caches, no side
//! effects. Typedef cycles are a hard error (reported once, the declaring
//! module's translation aborts); an unresolvable leafref or unknown
//! typedef degrades to the `string` fallback so one bad reference cannot
//! sink an otherwise-valid run.

use tracing::warn;

use crate::context::{is_primitive, Module, SchemaContext, SchemaNode, TypeSpec};
use crate::error::ResolveError;
use crate::walker::{find_node, AncestorPath};

// ---------------------------------------------------------------------------
// Resolved primitive descriptor
// ---------------------------------------------------------------------------

/// One primitive base type with the restrictions that survived the
/// typedef chain. A union-typed leaf resolves to several of these, in
/// declared member order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedType {
    /// Primitive name (`uint32`, `string`, `enumeration`, `identityref`, …).
    pub base: String,
    /// Range restriction; sub-ranges joined by `|`.
    pub range: Option<String>,
    /// Length restriction; sub-ranges joined by `|`.
    pub length: Option<String>,
    pub pattern: Option<String>,
    pub fraction_digits: Option<u32>,
    pub enums: Vec<crate::context::EnumSpec>,
    /// Base identities for `identityref`, prefix-qualified.
    pub bases: Vec<String>,
}

impl ResolvedType {
    /// The degraded stand-in for a leaf whose type could not be resolved.
    pub fn fallback() -> Self {
        Self {
            base: "string".to_string(),
            ..Self::default()
        }
    }

    pub fn has_restrictions(&self) -> bool {
        self.range.is_some()
            || self.length.is_some()
            || self.pattern.is_some()
            || self.fraction_digits.is_some()
    }
}

/// Restrictions carried outside-in along a typedef chain. At every
/// indirection the more specific (outer) declaration wins per field.
#[derive(Debug, Clone, Default)]
struct Restrictions {
    range: Option<String>,
    length: Option<String>,
    pattern: Option<String>,
    fraction_digits: Option<u32>,
    enums: Vec<crate::context::EnumSpec>,
    bases: Vec<String>,
}

impl Restrictions {
    fn from_spec(spec: &TypeSpec) -> Self {
        Self {
            range: spec.range.clone(),
            length: spec.length.clone(),
            pattern: spec.pattern.clone(),
            fraction_digits: spec.fraction_digits,
            enums: spec.enums.clone(),
            bases: spec.bases.clone(),
        }
    }

    /// `self` layered over `inner`: fields declared at the outer (more
    /// specific) scope win.
    fn over(&self, inner: &Restrictions) -> Self {
        Self {
            range: self.range.clone().or_else(|| inner.range.clone()),
            length: self.length.clone().or_else(|| inner.length.clone()),
            pattern: self.pattern.clone().or_else(|| inner.pattern.clone()),
            fraction_digits: self.fraction_digits.or(inner.fraction_digits),
            enums: if self.enums.is_empty() {
                inner.enums.clone()
            } else {
                self.enums.clone()
            },
            bases: if self.bases.is_empty() {
                inner.bases.clone()
            } else {
                self.bases.clone()
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Public entry points
// ---------------------------------------------------------------------------

/// Resolve a leaf/leaf-list's declared type down to its primitive
/// sequence, degrading to the `string` fallback on a non-fatal failure.
///
/// A typedef cycle is the one fatal case and is propagated: the caller
/// aborts translation of the declaring module.
pub fn resolve_leaf_types(
    ctx: &SchemaContext,
    module: &Module,
    node: &SchemaNode,
    parent_path: &AncestorPath,
) -> Result<Vec<ResolvedType>, ResolveError> {
    let spec = match node.type_spec() {
        Some(s) => s,
        None => return Ok(vec![ResolvedType::fallback()]),
    };
    match resolve_types(ctx, module, spec, parent_path) {
        Ok(types) => Ok(types),
        Err(err @ ResolveError::TypedefCycle { .. }) => Err(err),
        Err(err) => {
            warn!(leaf = node.name(), %err, "type resolution degraded to string fallback");
            Ok(vec![ResolvedType::fallback()])
        }
    }
}

/// Resolve a type declaration to an ordered, non-empty primitive
/// sequence. `parent_path` is the ancestor path of the declaring node's
/// parent, needed to anchor relative leafref paths.
pub fn resolve_types(
    ctx: &SchemaContext,
    module: &Module,
    spec: &TypeSpec,
    parent_path: &AncestorPath,
) -> Result<Vec<ResolvedType>, ResolveError> {
    let mut out = Vec::new();
    let mut seen = Vec::new();
    resolve_into(
        ctx,
        module,
        spec,
        &Restrictions::default(),
        parent_path,
        &mut seen,
        &mut out,
    )?;
    Ok(out)
}

fn resolve_into(
    ctx: &SchemaContext,
    module: &Module,
    spec: &TypeSpec,
    outer: &Restrictions,
    parent_path: &AncestorPath,
    seen: &mut Vec<String>,
    out: &mut Vec<ResolvedType>,
) -> Result<(), ResolveError> {
    match spec.name.as_str() {
        // Union: concatenation of each member's resolution, declaration
        // order preserved, nested unions flattened recursively.
        "union" => {
            for member in &spec.union_members {
                resolve_into(
                    ctx,
                    module,
                    member,
                    &Restrictions::from_spec(member),
                    parent_path,
                    seen,
                    out,
                )?;
            }
            Ok(())
        }

        // Leafref: never itself a primitive — follow the target path and
        // resolve the target node's own type from its own context.
        "leafref" => {
            let path = spec.path.as_deref().ok_or_else(|| ResolveError::UnresolvedLeafref {
                path: String::new(),
            })?;
            // A leafref chain that revisits the same path cannot terminate.
            let marker = format!("leafref@{}:{}", module.name, path);
            if seen.contains(&marker) {
                return Err(ResolveError::UnresolvedLeafref {
                    path: path.to_string(),
                });
            }
            seen.push(marker);
            let target = follow_leafref(ctx, module, parent_path, path)?;
            let target_spec =
                target
                    .node
                    .type_spec()
                    .ok_or_else(|| ResolveError::UnresolvedLeafref {
                        path: path.to_string(),
                    })?;
            let target_parent = AncestorPath::seeded(target.ancestors.clone());
            let result = resolve_into(
                ctx,
                target.module,
                target_spec,
                &Restrictions::from_spec(target_spec),
                &target_parent,
                seen,
                out,
            );
            seen.pop();
            result
        }

        name if is_primitive(name) => {
            let own = Restrictions::from_spec(spec);
            let merged = outer.over(&own);
            out.push(ResolvedType {
                base: name.to_string(),
                range: merged.range,
                length: merged.length,
                pattern: merged.pattern,
                fraction_digits: merged.fraction_digits,
                enums: merged.enums,
                bases: qualify_bases(&merged.bases, module),
            });
            Ok(())
        }

        // Typedef reference: substitute the typedef's own declaration and
        // keep walking, outer restrictions winning over inherited ones.
        _ => {
            let (owner, typedef) = lookup_typedef(ctx, module, &spec.name)?;
            let qualified = format!("{}:{}", owner.name, typedef_local(&spec.name));
            if seen.contains(&qualified) {
                return Err(ResolveError::TypedefCycle {
                    type_name: spec.name.clone(),
                });
            }
            seen.push(qualified);
            let own = Restrictions::from_spec(spec);
            let merged = outer.over(&own);
            let result = resolve_into(ctx, owner, typedef, &merged, parent_path, seen, out);
            seen.pop();
            result
        }
    }
}

fn typedef_local(name: &str) -> &str {
    name.rsplit(':').next().unwrap_or(name)
}

/// Locate a typedef by (possibly prefix-qualified) name: the named
/// module for qualified references, the declaring module first and then
/// the rest of the context for local ones.
fn lookup_typedef<'a>(
    ctx: &'a SchemaContext,
    module: &'a Module,
    name: &str,
) -> Result<(&'a Module, &'a TypeSpec), ResolveError> {
    let unknown = || ResolveError::UnknownTypedef {
        type_name: name.to_string(),
    };
    if let Some((prefix, local)) = name.split_once(':') {
        let owner = ctx
            .module_by_declared_prefix(prefix)
            .or_else(|| ctx.find_module(prefix))
            .ok_or_else(unknown)?;
        let td = owner.typedefs.get(local).ok_or_else(unknown)?;
        return Ok((owner, td));
    }
    if let Some(td) = module.typedefs.get(name) {
        return Ok((module, td));
    }
    for m in &ctx.modules {
        if let Some(td) = m.typedefs.get(name) {
            return Ok((m, td));
        }
    }
    Err(unknown())
}

/// Qualify bare identity-base names with the declaring module's prefix.
fn qualify_bases(bases: &[String], module: &Module) -> Vec<String> {
    bases
        .iter()
        .map(|b| {
            if b.contains(':') {
                b.clone()
            } else {
                format!("{}:{}", module.prefix, b)
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Leafref path following
// ---------------------------------------------------------------------------

/// The data node a leafref points at, with enough context to type it and
/// to derive keyref XPaths.
#[derive(Debug)]
pub struct LeafrefTarget<'a> {
    pub module: &'a Module,
    pub node: &'a SchemaNode,
    /// Names of the target's enclosing containers/lists, from the module
    /// root down, excluding the target itself.
    pub ancestors: Vec<String>,
}

/// Follow the restricted leafref path subset: absolute `/p:a/p:b/leaf`
/// or relative `../../a/leaf`, walked against the referring node's
/// ancestor stack. General XPath is out of scope.
pub fn follow_leafref<'a>(
    ctx: &'a SchemaContext,
    module: &'a Module,
    parent_path: &AncestorPath,
    path: &str,
) -> Result<LeafrefTarget<'a>, ResolveError> {
    let unresolved = || ResolveError::UnresolvedLeafref {
        path: path.to_string(),
    };

    let (target_module, names) = if let Some(stripped) = path.strip_prefix('/') {
        // Absolute: the first segment's prefix selects the module; the
        // remaining prefixes must agree (restricted subset).
        let segments: Vec<&str> = stripped.split('/').filter(|s| !s.is_empty()).collect();
        let first = segments.first().ok_or_else(unresolved)?;
        let target_module = match first.split_once(':') {
            Some((prefix, _)) => ctx
                .module_by_declared_prefix(prefix)
                .or_else(|| ctx.find_module(prefix))
                .ok_or_else(unresolved)?,
            None => module,
        };
        let names: Vec<String> = segments.iter().map(|s| strip_prefix(s)).collect();
        (target_module, names)
    } else if path.starts_with("../") {
        // Relative: each `../` climbs one level starting from the leaf
        // itself, so one `../` lands at the leaf's own parent.
        let mut ups = 0usize;
        let mut rest = path;
        while let Some(r) = rest.strip_prefix("../") {
            ups += 1;
            rest = r;
        }
        let keep = parent_path
            .len()
            .checked_sub(ups - 1)
            .ok_or_else(unresolved)?;
        let mut names: Vec<String> = parent_path.names()[..keep].to_vec();
        names.extend(rest.split('/').filter(|s| !s.is_empty()).map(strip_prefix));
        (module, names)
    } else {
        return Err(unresolved());
    };

    let name_refs: Vec<&str> = names.iter().map(String::as_str).collect();
    let node = find_node(&target_module.children, &name_refs).ok_or_else(unresolved)?;
    if !matches!(node, SchemaNode::Leaf { .. } | SchemaNode::LeafList { .. }) {
        return Err(unresolved());
    }
    Ok(LeafrefTarget {
        module: target_module,
        node,
        ancestors: names[..names.len() - 1].to_vec(),
    })
}

fn strip_prefix(segment: &str) -> String {
    match segment.split_once(':') {
        Some((_, local)) => local.to_string(),
        None => segment.to_string(),
    }
}
