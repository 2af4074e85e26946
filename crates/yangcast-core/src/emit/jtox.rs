//! JSON driver metadata emitter.
//!
//! Produces the single document an XML/JSON instance-data translator
//! loads at runtime: a `modules` map (name to prefix and namespace), a
//! `tree` mirroring the data model with resolved base types at the
//! leaves, and an `annotations` map when any module declares metadata
//! annotations.

use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use crate::config::{EmitOptions, JtoxFlavor};
use crate::context::{Module, SchemaContext, SchemaNode};
use crate::error::ResolveError;
use crate::prefix::PrefixRegistry;
use crate::resolver::{resolve_leaf_types, resolve_types, ResolvedType};
use crate::walker::{excise_rpc_subtrees, walk, walk_forest, AncestorPath, SchemaVisitor};

pub fn emit(ctx: &SchemaContext, opts: &EmitOptions) -> Value {
    let registry = PrefixRegistry::assign(ctx);
    let mut modules = Map::new();
    let mut tree = Map::new();
    let mut annotations = Map::new();

    for name in registry.modules() {
        let Some(module) = ctx.find_module(name) else {
            continue;
        };
        let prefix = registry.prefix(name).unwrap_or(&module.prefix);
        modules.insert(
            name.clone(),
            json!([prefix, module.namespace]),
        );

        for ann in &module.annotations {
            let rendered = match &ann.type_spec {
                Some(spec) => match resolve_types(ctx, module, spec, &AncestorPath::root()) {
                    Ok(resolved) => render_base(&resolved),
                    Err(err) => {
                        warn!(module = %name, annotation = %ann.name, %err, "annotation type dropped");
                        continue;
                    }
                },
                None => Value::String("string".to_string()),
            };
            annotations.insert(format!("{}:{}", name, ann.name), rendered);
        }

        let data = excise_rpc_subtrees(module);
        let mut visitor = JtoxWalk {
            ctx,
            module,
            flavor: opts.jtox_flavor,
            stack: vec![Map::new()],
        };
        if let Err(err) = walk_forest(&data.data, &AncestorPath::root(), &mut visitor) {
            warn!(module = %name, %err, "translation aborted for module");
            continue;
        }
        for &rpc in &data.rpcs {
            if let Err(err) = visitor.add_rpc(rpc) {
                warn!(module = %name, rpc = rpc.name(), %err, "rpc dropped");
            }
        }
        for &notification in &data.notifications {
            debug!(
                module = %name,
                notification = notification.name(),
                "notifications are not part of the driver tree"
            );
        }
        if let Some(top) = visitor.stack.pop() {
            for (key, value) in top {
                tree.insert(key, value);
            }
        }
    }

    let mut root = Map::new();
    root.insert("modules".to_string(), Value::Object(modules));
    root.insert("tree".to_string(), Value::Object(tree));
    if !annotations.is_empty() {
        root.insert("annotations".to_string(), Value::Object(annotations));
    }
    Value::Object(root)
}

/// Render the resolved primitive sequence of a leaf.
///
/// An unrestricted single type is a bare string; a restricted one is a
/// `[base, {restrictions}]` pair; a union is `["union", [members]]` in
/// declared order. The same record shape is used at every position.
fn render_base(resolved: &[ResolvedType]) -> Value {
    if resolved.len() > 1 {
        let members: Vec<Value> = resolved
            .iter()
            .map(|rt| render_one(rt))
            .collect();
        return json!(["union", members]);
    }
    match resolved.first() {
        Some(rt) => render_one(rt),
        None => Value::String("string".to_string()),
    }
}

fn render_one(rt: &ResolvedType) -> Value {
    let mut restrictions = Map::new();
    if let Some(range) = &rt.range {
        restrictions.insert("range".to_string(), json!(range));
    }
    if let Some(length) = &rt.length {
        restrictions.insert("length".to_string(), json!(length));
    }
    if let Some(pattern) = &rt.pattern {
        restrictions.insert("pattern".to_string(), json!(pattern));
    }
    if let Some(fd) = rt.fraction_digits {
        restrictions.insert("fraction-digits".to_string(), json!(fd));
    }
    if !rt.enums.is_empty() {
        let names: Vec<&str> = rt.enums.iter().map(|e| e.name.as_str()).collect();
        restrictions.insert("enums".to_string(), json!(names));
    }
    if !rt.bases.is_empty() {
        restrictions.insert("bases".to_string(), json!(rt.bases));
    }
    if restrictions.is_empty() {
        Value::String(rt.base.clone())
    } else {
        json!([rt.base, restrictions])
    }
}

struct JtoxWalk<'a> {
    ctx: &'a SchemaContext,
    module: &'a Module,
    flavor: JtoxFlavor,
    /// Accumulating child maps; the bottom entry is the module's
    /// top-level map.
    stack: Vec<Map<String, Value>>,
}

impl<'a> JtoxWalk<'a> {
    /// Tree key for a child node. The annotated flavor qualifies every
    /// key with its owning module; the compact flavor only qualifies
    /// children merged in from other modules.
    fn child_key(&self, node: &SchemaNode) -> String {
        let owner = node.meta().module.as_deref();
        match self.flavor {
            JtoxFlavor::Annotated => {
                format!("{}:{}", owner.unwrap_or(&self.module.name), node.name())
            }
            JtoxFlavor::Compact => match owner {
                Some(m) if m != self.module.name => format!("{}:{}", m, node.name()),
                _ => node.name().to_string(),
            },
        }
    }

    fn insert_entry(&mut self, node: &SchemaNode, value: Value) {
        let key = self.child_key(node);
        if let Some(top) = self.stack.last_mut() {
            top.insert(key, value);
        }
    }

    /// Node-attribute object for the annotated flavor.
    fn leaf_attrs(&self, node: &SchemaNode) -> Value {
        let meta = node.meta();
        let mut attrs = Map::new();
        if let Some(description) = &meta.description {
            attrs.insert("description".to_string(), json!(description));
        }
        if let Some(reference) = &meta.reference {
            attrs.insert("reference".to_string(), json!(reference));
        }
        if let Some(config) = meta.config {
            attrs.insert("config".to_string(), json!(config));
        }
        if let SchemaNode::Leaf {
            mandatory, default, ..
        } = node
        {
            if let Some(mandatory) = mandatory {
                attrs.insert("mandatory".to_string(), json!(mandatory));
            }
            if let Some(default) = default {
                attrs.insert("default".to_string(), json!(default));
            }
        }
        Value::Object(attrs)
    }

    fn leaf_entry(&mut self, node: &SchemaNode, path: &AncestorPath, kind: &str)
        -> Result<(), ResolveError>
    {
        let resolved = resolve_leaf_types(self.ctx, self.module, node, path)?;
        let base = render_base(&resolved);
        let entry = match self.flavor {
            JtoxFlavor::Compact => json!([kind, base]),
            JtoxFlavor::Annotated => json!([kind, base, self.leaf_attrs(node)]),
        };
        self.insert_entry(node, entry);
        Ok(())
    }

    /// Rpcs keep their input and output subtrees as nested child maps.
    fn add_rpc(&mut self, rpc: &SchemaNode) -> Result<(), ResolveError> {
        let SchemaNode::Rpc { input, output, .. } = rpc else {
            return Ok(());
        };
        let mut body = Map::new();
        for (direction, children) in [("input", input), ("output", output)] {
            if children.is_empty() {
                continue;
            }
            let mut sub = JtoxWalk {
                ctx: self.ctx,
                module: self.module,
                flavor: self.flavor,
                stack: vec![Map::new()],
            };
            walk(children, &AncestorPath::seeded([rpc.name()]), &mut sub)?;
            if let Some(map) = sub.stack.pop() {
                body.insert(direction.to_string(), Value::Object(map));
            }
        }
        self.insert_entry(rpc, json!(["rpc", body]));
        Ok(())
    }
}

impl<'a> SchemaVisitor for JtoxWalk<'a> {
    type Error = ResolveError;

    // Choice and case keep the walker defaults: their children land in
    // the enclosing map, matching how instance data nests.

    fn enter_container(
        &mut self,
        _: &SchemaNode,
        _: &AncestorPath,
    ) -> Result<crate::walker::Descend, Self::Error> {
        self.stack.push(Map::new());
        Ok(crate::walker::Descend::Into)
    }

    fn leave_container(&mut self, node: &SchemaNode, _: &AncestorPath) -> Result<(), Self::Error> {
        if let Some(children) = self.stack.pop() {
            self.insert_entry(node, json!(["container", children]));
        }
        Ok(())
    }

    fn enter_list(
        &mut self,
        _: &SchemaNode,
        _: &AncestorPath,
    ) -> Result<crate::walker::Descend, Self::Error> {
        self.stack.push(Map::new());
        Ok(crate::walker::Descend::Into)
    }

    fn leave_list(&mut self, node: &SchemaNode, _: &AncestorPath) -> Result<(), Self::Error> {
        let Some(children) = self.stack.pop() else {
            return Ok(());
        };
        // Keys are (module, name) pairs: the downstream translator needs
        // the key leaf's owning module to qualify instance data.
        let keys: Vec<Value> = match node {
            SchemaNode::List { key, children, .. } => key
                .iter()
                .map(|k| {
                    let owner = children
                        .iter()
                        .find(|c| c.name() == k)
                        .and_then(|c| c.meta().module.clone())
                        .unwrap_or_else(|| self.module.name.clone());
                    json!([owner, k])
                })
                .collect(),
            _ => Vec::new(),
        };
        self.insert_entry(node, json!(["list", children, keys]));
        Ok(())
    }

    fn visit_leaf(&mut self, node: &SchemaNode, path: &AncestorPath) -> Result<(), Self::Error> {
        self.leaf_entry(node, path, "leaf")
    }

    fn visit_leaf_list(&mut self, node: &SchemaNode, path: &AncestorPath) -> Result<(), Self::Error> {
        self.leaf_entry(node, path, "leaf-list")
    }

    fn visit_anyxml(&mut self, node: &SchemaNode, _: &AncestorPath) -> Result<(), Self::Error> {
        self.insert_entry(node, json!(["anyxml"]));
        Ok(())
    }
}
