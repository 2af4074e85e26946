//! XSD emitter: one XML Schema 1.0 document per module.
//!
//! Containers and lists become named complex types, leaves become named
//! (or inline) simple types, list keys become `xs:key` constraints and
//! leafref-typed leaves become `xs:keyref` constructs. Type and element
//! names are built from the ancestor path, so repeated structural shapes
//! deduplicate on their path fingerprint. Cross-module references inject
//! `xs:import` declarations, once per document.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use tracing::{debug, warn};

use crate::config::EmitOptions;
use crate::context::{Annotation, Module, SchemaContext, SchemaNode};
use crate::emit::xml::{ElemId, XmlTree};
use crate::emit::Fingerprint;
use crate::error::ResolveError;
use crate::identity::IdentityForest;
use crate::prefix::{ImportTracker, PrefixRegistry};
use crate::resolver::{follow_leafref, resolve_leaf_types, resolve_types, ResolvedType};
use crate::walker::{excise_rpc_subtrees, walk, walk_forest, AncestorPath, Descend, SchemaVisitor};

const XS_NS: &str = "http://www.w3.org/2001/XMLSchema";

/// One serialized per-module schema document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XsdDocument {
    /// `<module>[@<revision>].xsd`
    pub file_name: String,
    pub text: String,
}

/// Map a resolved primitive onto its XSD base type.
fn xsd_base(primitive: &str) -> &'static str {
    match primitive {
        "int8" => "byte",
        "uint8" => "unsignedByte",
        "int16" => "short",
        "uint16" => "unsignedShort",
        "int32" => "integer",
        "uint32" => "unsignedInt",
        "int64" => "long",
        "uint64" => "unsignedLong",
        "decimal64" => "decimal",
        "boolean" => "boolean",
        "binary" => "base64Binary",
        // string, enumeration, identityref, instance-identifier, bits,
        // empty and the unresolved fallback all restrict xs:string.
        _ => "string",
    }
}

/// Hierarchical type name: ancestor path joined by `_`, plus the local
/// name and the `_t` suffix.
fn type_name(path: &AncestorPath, name: &str) -> String {
    if path.is_empty() {
        format!("{}_t", name)
    } else {
        format!("{}_{}_t", path.joined("_"), name)
    }
}

pub fn emit(ctx: &SchemaContext, opts: &EmitOptions) -> Vec<XsdDocument> {
    let mut emitter = XsdEmitter {
        ctx,
        opts,
        registry: PrefixRegistry::assign(ctx),
        identities: IdentityForest::build(ctx, opts.identity_iteration_cap),
        docs: BTreeMap::new(),
        processed: BTreeSet::new(),
        skipped: BTreeSet::new(),
        emitted: HashSet::new(),
        imports: ImportTracker::default(),
    };

    let module_names: Vec<String> = emitter.registry.modules().to_vec();
    for name in &module_names {
        if let Err(err) = emitter.process_module(name) {
            warn!(module = %name, %err, "translation aborted for module");
            emitter.skipped.insert(name.clone());
        }
    }

    let mut out = Vec::new();
    for name in &module_names {
        if emitter.skipped.contains(name) {
            continue;
        }
        let module = match ctx.find_module(name) {
            Some(m) => m,
            None => continue,
        };
        let prefix = match emitter.registry.prefix(name) {
            Some(p) => p.to_string(),
            None => continue,
        };
        let Some(doc) = emitter.docs.get(&prefix) else {
            continue;
        };
        if doc.child_elems(doc.root()).next().is_none() {
            debug!(module = %name, "schema document is empty; not writing");
            continue;
        }
        out.push(XsdDocument {
            file_name: format!("{}.xsd", module.file_stem()),
            text: doc.to_pretty_string(),
        });
    }
    out
}

struct XsdEmitter<'a> {
    ctx: &'a SchemaContext,
    opts: &'a EmitOptions,
    registry: PrefixRegistry,
    identities: IdentityForest,
    /// Output documents, keyed by run-unique prefix.
    docs: BTreeMap<String, XmlTree>,
    processed: BTreeSet<String>,
    skipped: BTreeSet<String>,
    /// Dedup accumulator: (document prefix, structural fingerprint).
    emitted: HashSet<(String, Fingerprint)>,
    imports: ImportTracker,
}

impl<'a> XsdEmitter<'a> {
    fn process_module(&mut self, name: &str) -> Result<(), ResolveError> {
        let ctx = self.ctx;
        let Some(module) = ctx.find_module(name) else {
            return Ok(());
        };
        let prefix = self
            .registry
            .prefix(name)
            .unwrap_or(&module.prefix)
            .to_string();
        if !self.processed.insert(prefix.clone()) {
            debug!(module = %name, "module already processed");
            return Ok(());
        }
        debug!(module = %name, %prefix, ns = %module.namespace, "handling module");
        self.ensure_doc(&prefix);

        for ann in &module.annotations {
            self.process_annotation(module, &prefix, ann)?;
        }

        let tree = excise_rpc_subtrees(module);
        for &rpc in &tree.rpcs {
            self.process_rpc(module, &prefix, rpc)?;
        }
        for &notification in &tree.notifications {
            self.process_notification(module, &prefix, notification)?;
        }

        let mut visitor = ModuleWalk {
            em: self,
            module,
            doc_prefix: prefix,
            parents: Vec::new(),
            elem_decls: Vec::new(),
            keys: Vec::new(),
        };
        walk_forest(&tree.data, &AncestorPath::root(), &mut visitor)
    }

    /// Create the skeleton `xs:schema` document for a prefix if it does
    /// not exist yet. Cross-module references may need the target
    /// document before that module's own walk runs.
    fn ensure_doc(&mut self, prefix: &str) {
        if self.docs.contains_key(prefix) {
            return;
        }
        let Some(info) = self.registry.lookup(prefix) else {
            return;
        };
        let mut tree = XmlTree::new("xs:schema");
        let root = tree.root();
        tree.set_attr(root, "version", "1.0");
        tree.set_attr(root, "elementFormDefault", "qualified");
        tree.set_attr(root, "attributeFormDefault", "unqualified");
        tree.set_attr(root, "xmlns:xs", XS_NS);
        tree.set_attr(root, &format!("xmlns:{}", prefix), &info.namespace);
        tree.set_attr(root, "targetNamespace", &info.namespace);
        self.docs.insert(prefix.to_string(), tree);
    }

    /// Inject an `xs:import` of `imported_prefix`'s module into
    /// `into_prefix`'s document, once.
    fn add_import(&mut self, into_prefix: &str, imported_prefix: &str) {
        if into_prefix == imported_prefix {
            return;
        }
        let Some(imported) = self.registry.lookup(imported_prefix).cloned() else {
            return;
        };
        if !self.imports.note_import(into_prefix, &imported.module) {
            debug!(into = %into_prefix, module = %imported.module, "import already exists");
            return;
        }
        debug!(into = %into_prefix, module = %imported.module, "adding import");
        let mut location = imported.module.clone();
        if let Some(rev) = &imported.latest_revision {
            location.push('@');
            location.push_str(rev);
        }
        location.push_str(".xsd");
        self.ensure_doc(into_prefix);
        if let Some(doc) = self.docs.get_mut(into_prefix) {
            let imp = doc.insert(doc.root(), 0, "xs:import");
            doc.set_attr(imp, "namespace", &imported.namespace);
            doc.set_attr(imp, "schemaLocation", &location);
            let root = doc.root();
            doc.set_attr(root, &format!("xmlns:{}", imported_prefix), &imported.namespace);
        }
    }

    /// Each rpc becomes an `<name>_input_t` / `<name>_output_t` complex
    /// type pair, anchored on the rpc name.
    fn process_rpc(
        &mut self,
        module: &'a Module,
        prefix: &str,
        rpc: &'a SchemaNode,
    ) -> Result<(), ResolveError> {
        debug!(rpc = rpc.name(), "processing rpc");
        let SchemaNode::Rpc { input, output, .. } = rpc else {
            return Ok(());
        };
        for (direction, children) in [("input", input), ("output", output)] {
            if children.is_empty() {
                continue;
            }
            self.walk_bounded(
                module,
                prefix,
                &format!("{}_{}_t", rpc.name(), direction),
                rpc.name(),
                children,
            )?;
        }
        Ok(())
    }

    /// Each notification becomes a standalone complex type.
    fn process_notification(
        &mut self,
        module: &'a Module,
        prefix: &str,
        notification: &'a SchemaNode,
    ) -> Result<(), ResolveError> {
        debug!(notification = notification.name(), "processing notification");
        self.walk_bounded(
            module,
            prefix,
            notification.name(),
            notification.name(),
            notification.children(),
        )
    }

    fn walk_bounded(
        &mut self,
        module: &'a Module,
        prefix: &str,
        complex_type_name: &str,
        anchor: &str,
        children: &'a [SchemaNode],
    ) -> Result<(), ResolveError> {
        let seq = {
            let doc = self.docs.get_mut(prefix).expect("document exists");
            let ct = doc.add(doc.root(), "xs:complexType");
            doc.set_attr(ct, "name", complex_type_name);
            doc.add(ct, "xs:sequence")
        };
        let mut visitor = ModuleWalk {
            em: self,
            module,
            doc_prefix: prefix.to_string(),
            parents: vec![(prefix.to_string(), seq)],
            elem_decls: Vec::new(),
            keys: Vec::new(),
        };
        walk(children, &AncestorPath::seeded([anchor]), &mut visitor)
    }

    /// ietf-yang-metadata annotations become a `yang-annotations`
    /// attribute group with one typed attribute per annotation.
    fn process_annotation(
        &mut self,
        module: &'a Module,
        prefix: &str,
        ann: &Annotation,
    ) -> Result<(), ResolveError> {
        debug!(annotation = %ann.name, %prefix, "adding annotation");
        let resolved = match &ann.type_spec {
            Some(spec) => resolve_types(self.ctx, module, spec, &AncestorPath::root())?,
            None => vec![ResolvedType {
                base: "string".to_string(),
                ..ResolvedType::default()
            }],
        };
        let doc = self.docs.get_mut(prefix).expect("document exists");
        let group = doc
            .find_top_level("xs:attributeGroup", "name", "yang-annotations")
            .unwrap_or_else(|| {
                let g = doc.add(doc.root(), "xs:attributeGroup");
                doc.set_attr(g, "name", "yang-annotations");
                g
            });
        let attr = doc.add(group, "xs:attribute");
        doc.set_attr(attr, "name", &ann.name);
        let st = doc.add(attr, "xs:simpleType");
        fill_simple_type_content(doc, st, &resolved, &module.prefix, &self.identities);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Per-module walk
// ---------------------------------------------------------------------------

struct ModuleWalk<'e, 'a> {
    em: &'e mut XsdEmitter<'a>,
    module: &'a Module,
    doc_prefix: String,
    /// Structural attachment points: (document prefix, sequence/choice id).
    parents: Vec<(String, ElemId)>,
    /// Element declarations of entered containers/lists, for xs:key and
    /// keyref anchoring.
    elem_decls: Vec<(String, ElemId)>,
    /// Declared keys of the entered lists (empty for containers), for
    /// key-leaf mandatory detection.
    keys: Vec<Vec<String>>,
}

impl<'e, 'a> ModuleWalk<'e, 'a> {
    fn node_prefix(&self, node: &SchemaNode) -> String {
        self.em
            .registry
            .prefix_for_node(self.module, node.meta().module.as_deref())
            .to_string()
    }

    fn attach_point(&self) -> (String, ElemId) {
        match self.parents.last() {
            Some((doc, id)) => (doc.clone(), *id),
            None => {
                let doc = self.em.docs.get(&self.doc_prefix).expect("document exists");
                (self.doc_prefix.clone(), doc.root())
            }
        }
    }

    /// Add the element declaration for a node: a plain named element in
    /// the same-module case, an element ref plus a global declaration in
    /// the owning module's document otherwise. Returns the named decl.
    fn add_child_elem(
        &mut self,
        node: &SchemaNode,
        path: &AncestorPath,
        min_occurs: &str,
        max_occurs: &str,
        default: Option<&str>,
        inline: bool,
    ) -> (String, ElemId) {
        let pfx = self.node_prefix(node);
        let tname = type_name(path, node.name());
        let (attach_doc, attach_id) = self.attach_point();
        let is_top = self.parents.is_empty();

        if pfx == attach_doc {
            let doc = self.em.docs.get_mut(&attach_doc).expect("document exists");
            let elem = doc.add(attach_id, "xs:element");
            doc.set_attr(elem, "name", node.name());
            if !inline {
                doc.set_attr(elem, "type", &format!("{}:{}", pfx, tname));
            }
            if !is_top {
                doc.set_attr(elem, "minOccurs", min_occurs);
                doc.set_attr(elem, "maxOccurs", max_occurs);
            }
            if let Some(d) = default {
                doc.set_attr(elem, "default", d);
            }
            (attach_doc, elem)
        } else {
            // Cross-module child: reference the owning module's global
            // element and import its namespace.
            let qualified = format!("{}:{}", pfx, node.name());
            {
                let doc = self.em.docs.get_mut(&attach_doc).expect("document exists");
                let elem = doc.add(attach_id, "xs:element");
                doc.set_attr(elem, "ref", &qualified);
                if min_occurs != "1" {
                    doc.set_attr(elem, "minOccurs", min_occurs);
                }
                if max_occurs != "1" {
                    doc.set_attr(elem, "maxOccurs", max_occurs);
                }
            }
            self.em.ensure_doc(&pfx);
            self.em.add_import(&attach_doc, &pfx);
            let doc = self.em.docs.get_mut(&pfx).expect("document exists");
            let global = doc
                .find_top_level("xs:element", "name", node.name())
                .unwrap_or_else(|| {
                    let g = doc.add(doc.root(), "xs:element");
                    doc.set_attr(g, "name", node.name());
                    doc.set_attr(g, "type", &format!("{}:{}", pfx, tname));
                    g
                });
            (pfx, global)
        }
    }

    /// Open the node's complex type in its owning document, unless the
    /// fingerprint was already emitted.
    fn open_complex_type(&mut self, node: &SchemaNode, path: &AncestorPath) -> Descend {
        let pfx = self.node_prefix(node);
        let fingerprint = Fingerprint::of(path, node.name());
        if !self
            .em
            .emitted
            .insert((pfx.clone(), fingerprint))
        {
            debug!(name = %type_name(path, node.name()), "not repeating complexType");
            return Descend::Skip;
        }
        self.em.ensure_doc(&pfx);
        let suppress = self.em.opts.xsd_suppress_docs;
        let doc = self.em.docs.get_mut(&pfx).expect("document exists");
        let ct = doc.add(doc.root(), "xs:complexType");
        doc.set_attr(ct, "name", &type_name(path, node.name()));
        let seq = doc.add(ct, "xs:sequence");
        add_node_docs(doc, seq, node, suppress);
        self.parents.push((pfx, seq));
        Descend::Into
    }

    /// Attach an `xs:key` for a list's declared keys under the nearest
    /// enclosing element declaration.
    fn add_list_key(&mut self, node: &SchemaNode, path: &AncestorPath, keys: &[String]) {
        if keys.is_empty() {
            return;
        }
        let Some((decl_doc, decl_id)) = self.elem_decls.last().cloned() else {
            debug!(list = node.name(), "no enclosing element for list key");
            return;
        };
        let pfx = self.node_prefix(node);
        let key_name = format!("{}_{}_k", path.joined("_"), node.name());
        let doc = self.em.docs.get_mut(&decl_doc).expect("document exists");
        let key_elem = doc.add(decl_id, "xs:key");
        doc.set_attr(key_elem, "name", &key_name);
        let selector = doc.add(key_elem, "xs:selector");
        doc.set_attr(selector, "xpath", &format!("./{}:{}", pfx, node.name()));
        for k in keys {
            let field = doc.add(key_elem, "xs:field");
            doc.set_attr(field, "xpath", &format!("{}:{}", pfx, k));
        }
    }

    fn enter_inner(&mut self, node: &SchemaNode, path: &AncestorPath) -> Descend {
        let (min, max, keys) = match node {
            SchemaNode::Container { .. } => ("0".to_string(), "1".to_string(), Vec::new()),
            SchemaNode::List {
                key,
                min_elements,
                max_elements,
                ..
            } => (
                min_elements.map_or_else(|| "0".to_string(), |m| m.to_string()),
                max_elements.map_or_else(|| "unbounded".to_string(), |m| m.to_string()),
                key.clone(),
            ),
            _ => return Descend::Skip,
        };
        let decl = self.add_child_elem(node, path, &min, &max, None, false);
        let action = self.open_complex_type(node, path);
        if action == Descend::Into {
            if matches!(node, SchemaNode::List { .. }) {
                self.add_list_key(node, path, &keys);
            }
            self.elem_decls.push(decl);
            self.keys.push(keys);
        }
        action
    }

    fn leave_inner(&mut self) {
        self.parents.pop();
        self.elem_decls.pop();
        self.keys.pop();
    }

    fn leaf_impl(
        &mut self,
        node: &SchemaNode,
        path: &AncestorPath,
        is_leaf_list: bool,
    ) -> Result<(), ResolveError> {
        let resolved = resolve_leaf_types(self.em.ctx, self.module, node, path)?;

        let (mandatory, default, min_elements, max_elements) = match node {
            SchemaNode::Leaf {
                mandatory, default, ..
            } => (mandatory.unwrap_or(false), default.clone(), None, None),
            SchemaNode::LeafList {
                min_elements,
                max_elements,
                ..
            } => (false, None, *min_elements, *max_elements),
            _ => return Ok(()),
        };
        let is_key = self
            .keys
            .last()
            .is_some_and(|keys| keys.iter().any(|k| k == node.name()));
        let min = if mandatory || is_key {
            "1".to_string()
        } else {
            min_elements.map_or_else(|| "0".to_string(), |m| m.to_string())
        };
        let max = if is_leaf_list {
            max_elements.map_or_else(|| "unbounded".to_string(), |m| m.to_string())
        } else {
            "1".to_string()
        };

        let inline = self.em.opts.xsd_inline_simple_types;
        let (decl_doc, decl_id) =
            self.add_child_elem(node, path, &min, &max, default.as_deref(), inline);

        // keyref derivation for leafref-typed leaves, from the declared
        // (pre-resolution) type.
        if let Some(spec) = node.type_spec() {
            if spec.name == "leafref" {
                if let Some(ref_path) = spec.path.clone() {
                    self.add_keyref(node, path, &ref_path);
                }
            }
        }

        let pfx = self.node_prefix(node);
        if inline && decl_doc == pfx {
            let suppress = self.em.opts.xsd_suppress_docs;
            let identities = &self.em.identities;
            let module_prefix = self.module.prefix.clone();
            let doc = self.em.docs.get_mut(&decl_doc).expect("document exists");
            let st = doc.add(decl_id, "xs:simpleType");
            add_node_docs(doc, st, node, suppress);
            fill_simple_type_content(doc, st, &resolved, &module_prefix, identities);
            return Ok(());
        }

        self.add_named_simple_type(node, path, &resolved);
        Ok(())
    }

    /// Emit the leaf's named simple type in its owning document, unless
    /// already present. When the document carries a `yang-annotations`
    /// attribute group, the value type is wrapped in a simpleContent
    /// extension so instance elements can carry annotation attributes.
    fn add_named_simple_type(
        &mut self,
        node: &SchemaNode,
        path: &AncestorPath,
        resolved: &[ResolvedType],
    ) {
        let pfx = self.node_prefix(node);
        let fingerprint = Fingerprint::of(path, node.name());
        if !self.em.emitted.insert((pfx.clone(), fingerprint)) {
            debug!(name = %type_name(path, node.name()), "not repeating simpleType");
            return;
        }
        self.em.ensure_doc(&pfx);
        let suppress = self.em.opts.xsd_suppress_docs;
        let identities = &self.em.identities;
        let module_prefix = self.module.prefix.clone();
        let tname = type_name(path, node.name());
        let doc = self.em.docs.get_mut(&pfx).expect("document exists");

        let has_annotations = doc
            .find_top_level("xs:attributeGroup", "name", "yang-annotations")
            .is_some();
        let st_name = if has_annotations {
            let ct = doc.add(doc.root(), "xs:complexType");
            doc.set_attr(ct, "name", &tname);
            let sc = doc.add(ct, "xs:simpleContent");
            let ext = doc.add(sc, "xs:extension");
            doc.set_attr(ext, "base", &format!("{}:{}b", pfx, tname));
            let group = doc.add(ext, "xs:attributeGroup");
            doc.set_attr(group, "ref", &format!("{}:yang-annotations", pfx));
            format!("{}b", tname)
        } else {
            tname
        };

        let st = doc.add(doc.root(), "xs:simpleType");
        doc.set_attr(st, "name", &st_name);
        add_node_docs(doc, st, node, suppress);
        fill_simple_type_content(doc, st, resolved, &module_prefix, identities);
    }

    /// Derive an `xs:keyref` for a leafref-typed leaf: anchored at the
    /// referring module's top-level element, selecting down the ancestor
    /// stack to the leaf's parent and referring to the target list's key.
    fn add_keyref(&mut self, node: &SchemaNode, path: &AncestorPath, ref_path: &str) {
        let target = match follow_leafref(self.em.ctx, self.module, path, ref_path) {
            Ok(t) => t,
            Err(err) => {
                debug!(leaf = node.name(), %err, "keyref skipped");
                return;
            }
        };
        let Some(list_name) = target.ancestors.last() else {
            debug!(leaf = node.name(), "leafref target has no enclosing list");
            return;
        };
        let target_list = crate::walker::find_node(
            &target.module.children,
            &target
                .ancestors
                .iter()
                .map(String::as_str)
                .collect::<Vec<_>>(),
        );
        if !matches!(target_list, Some(SchemaNode::List { .. })) {
            debug!(leaf = node.name(), "leafref target parent is not a keyed list");
            return;
        }
        let Some(anchor) = path.names().first().cloned() else {
            warn!(leaf = node.name(), "top-level leafref cannot anchor a keyref");
            return;
        };

        let target_prefix = self
            .em
            .registry
            .prefix(&target.module.name)
            .unwrap_or(&target.module.prefix)
            .to_string();
        let key_name = {
            let list_ancestors = &target.ancestors[..target.ancestors.len() - 1];
            if list_ancestors.is_empty() {
                format!("{}_k", list_name)
            } else {
                format!("{}_{}_k", list_ancestors.join("_"), list_name)
            }
        };

        if target_prefix != self.doc_prefix {
            self.em.add_import(&self.doc_prefix, &target_prefix);
        }

        let pfx = self.doc_prefix.clone();
        let doc = self.em.docs.get_mut(&pfx).expect("document exists");
        let Some(anchor_elem) = doc.find_by_attr("xs:element", "name", &anchor) else {
            debug!(leaf = node.name(), %anchor, "keyref anchor element not found");
            return;
        };

        let mut selector = ".".to_string();
        for step in &path.names()[1..] {
            selector.push_str(&format!("/{}:{}", pfx, step));
        }
        let keyref = doc.add(anchor_elem, "xs:keyref");
        doc.set_attr(keyref, "name", &format!("{}_{}_kr", path.joined("_"), node.name()));
        doc.set_attr(keyref, "refer", &format!("{}:{}", target_prefix, key_name));
        let sel = doc.add(keyref, "xs:selector");
        doc.set_attr(sel, "xpath", &selector);
        let field = doc.add(keyref, "xs:field");
        doc.set_attr(field, "xpath", &format!("{}:{}", pfx, node.name()));
    }
}

impl<'e, 'a> SchemaVisitor for ModuleWalk<'e, 'a> {
    type Error = ResolveError;

    fn enter_container(
        &mut self,
        node: &SchemaNode,
        path: &AncestorPath,
    ) -> Result<Descend, Self::Error> {
        Ok(self.enter_inner(node, path))
    }

    fn leave_container(&mut self, _: &SchemaNode, _: &AncestorPath) -> Result<(), Self::Error> {
        self.leave_inner();
        Ok(())
    }

    fn enter_list(&mut self, node: &SchemaNode, path: &AncestorPath) -> Result<Descend, Self::Error> {
        Ok(self.enter_inner(node, path))
    }

    fn leave_list(&mut self, _: &SchemaNode, _: &AncestorPath) -> Result<(), Self::Error> {
        self.leave_inner();
        Ok(())
    }

    fn visit_leaf(&mut self, node: &SchemaNode, path: &AncestorPath) -> Result<(), Self::Error> {
        self.leaf_impl(node, path, false)
    }

    fn visit_leaf_list(&mut self, node: &SchemaNode, path: &AncestorPath) -> Result<(), Self::Error> {
        self.leaf_impl(node, path, true)
    }

    fn enter_choice(&mut self, _: &SchemaNode, _: &AncestorPath) -> Result<Descend, Self::Error> {
        let (attach_doc, attach_id) = self.attach_point();
        let doc = self.em.docs.get_mut(&attach_doc).expect("document exists");
        let choice = doc.add(attach_id, "xs:choice");
        self.parents.push((attach_doc, choice));
        Ok(Descend::Into)
    }

    fn leave_choice(&mut self, _: &SchemaNode, _: &AncestorPath) -> Result<(), Self::Error> {
        self.parents.pop();
        Ok(())
    }

    fn enter_case(&mut self, _: &SchemaNode, _: &AncestorPath) -> Result<Descend, Self::Error> {
        let (attach_doc, attach_id) = self.attach_point();
        let doc = self.em.docs.get_mut(&attach_doc).expect("document exists");
        let seq = doc.add(attach_id, "xs:sequence");
        self.parents.push((attach_doc, seq));
        Ok(Descend::Into)
    }

    fn leave_case(&mut self, _: &SchemaNode, _: &AncestorPath) -> Result<(), Self::Error> {
        self.parents.pop();
        Ok(())
    }

    fn visit_anyxml(&mut self, node: &SchemaNode, _: &AncestorPath) -> Result<(), Self::Error> {
        // XSD 1.0 cannot mix xs:any with sibling elements in one content
        // model, so describe the manual substitution instead.
        let (attach_doc, attach_id) = self.attach_point();
        let doc = self.em.docs.get_mut(&attach_doc).expect("document exists");
        doc.insert_comment(
            attach_id,
            1,
            "Note XSD 1.0 does not support <xs:any/> inside the same container \
             (sequence) as other elements. A solution is to comment out the other \
             elements and comment in the <xs:any/> leaving the whole container \
             (e.g. sequence) as type xs:any",
        );
        doc.insert_comment(
            attach_id,
            2,
            &format!(
                "<xs:any id=\"{}\" maxOccurs=\"unbounded\" processContents=\"lax\"/>",
                node.name()
            ),
        );
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Simple-type content
// ---------------------------------------------------------------------------

/// Fill a simpleType element from the resolved primitive sequence: a
/// single restriction, or an xs:union of per-member simple types.
fn fill_simple_type_content(
    doc: &mut XmlTree,
    st: ElemId,
    resolved: &[ResolvedType],
    module_prefix: &str,
    identities: &IdentityForest,
) {
    if resolved.len() > 1 {
        let union = doc.add(st, "xs:union");
        for rt in resolved {
            let member = doc.add(union, "xs:simpleType");
            fill_one_restriction(doc, member, rt, module_prefix, identities);
        }
    } else if let Some(rt) = resolved.first() {
        fill_one_restriction(doc, st, rt, module_prefix, identities);
    }
}

fn fill_one_restriction(
    doc: &mut XmlTree,
    parent: ElemId,
    rt: &ResolvedType,
    module_prefix: &str,
    identities: &IdentityForest,
) {
    let base = format!("xs:{}", xsd_base(&rt.base));
    let restrictions = if let Some(range) = &rt.range {
        multi_range(doc, parent, &base, range, false)
    } else if let Some(length) = &rt.length {
        multi_range(doc, parent, &base, length, true)
    } else {
        let r = doc.add(parent, "xs:restriction");
        doc.set_attr(r, "base", &base);
        vec![r]
    };

    for &r in &restrictions {
        if let Some(fd) = rt.fraction_digits {
            let e = doc.add(r, "xs:fractionDigits");
            doc.set_attr(e, "value", &fd.to_string());
        }
        for en in &rt.enums {
            let e = doc.add(r, "xs:enumeration");
            doc.set_attr(e, "value", &en.name);
        }
        if rt.base == "identityref" {
            for base_identity in &rt.bases {
                add_identity_enumerations(doc, r, base_identity, module_prefix, identities);
            }
        }
        if let Some(pattern) = &rt.pattern {
            let e = doc.add(r, "xs:pattern");
            doc.set_attr(e, "value", pattern);
        }
    }
}

/// Enumerate a base identity and everything derived from it. Values in
/// the leaf's own module drop the prefix.
fn add_identity_enumerations(
    doc: &mut XmlTree,
    restriction: ElemId,
    base: &str,
    module_prefix: &str,
    identities: &IdentityForest,
) {
    let own = format!("{}:", module_prefix);
    let mut values = vec![base.to_string()];
    values.extend(identities.descendants(base));
    for value in values {
        let display = value.strip_prefix(&own).unwrap_or(&value);
        let e = doc.add(restriction, "xs:enumeration");
        doc.set_attr(e, "value", display);
    }
}

/// `1..8|20..30` becomes an xs:union of restrictions; a single part is a
/// plain restriction. Returns every created restriction element.
fn multi_range(
    doc: &mut XmlTree,
    parent: ElemId,
    base: &str,
    spec: &str,
    is_length: bool,
) -> Vec<ElemId> {
    if spec.contains('|') {
        let union = doc.add(parent, "xs:union");
        spec.split('|')
            .map(|part| {
                let st = doc.add(union, "xs:simpleType");
                let r = doc.add(st, "xs:restriction");
                doc.set_attr(r, "base", base);
                add_range_facets(doc, r, part.trim(), is_length);
                r
            })
            .collect()
    } else {
        let r = doc.add(parent, "xs:restriction");
        doc.set_attr(r, "base", base);
        add_range_facets(doc, r, spec.trim(), is_length);
        vec![r]
    }
}

/// Emit min/max facets for one `lo..hi` (or single-value) range part.
/// `min`/`max` tokens mean "unbounded on that side" and emit nothing.
fn add_range_facets(doc: &mut XmlTree, restriction: ElemId, part: &str, is_length: bool) {
    let (min_facet, max_facet) = if is_length {
        ("xs:minLength", "xs:maxLength")
    } else {
        ("xs:minInclusive", "xs:maxInclusive")
    };
    match part.split_once("..") {
        None => {
            if !part.contains("min") {
                let e = doc.add(restriction, min_facet);
                doc.set_attr(e, "value", part);
            }
            if !part.contains("max") {
                let e = doc.add(restriction, max_facet);
                doc.set_attr(e, "value", part);
            }
        }
        Some((lo, hi)) => {
            let (lo, hi) = (lo.trim(), hi.trim());
            if !lo.contains("min") {
                let e = doc.add(restriction, min_facet);
                doc.set_attr(e, "value", lo);
            }
            if !hi.contains("max") {
                let e = doc.add(restriction, max_facet);
                doc.set_attr(e, "value", hi);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Documentation / appinfo
// ---------------------------------------------------------------------------

/// Attach the YANG documentation block: description text plus appinfo
/// entries for units, config, presence, must and when.
fn add_node_docs(doc: &mut XmlTree, parent: ElemId, node: &SchemaNode, suppress_docs: bool) {
    let meta = node.meta();
    let mut annotation = None;
    let mut appinfo = None;

    if !suppress_docs {
        if let Some(description) = &meta.description {
            let ann = *annotation.get_or_insert_with(|| doc.add(parent, "xs:annotation"));
            let d = doc.add(ann, "xs:documentation");
            doc.set_attr(d, "xml:lang", "en");
            doc.add_text(d, description);
        }
    }
    let ensure_appinfo = |doc: &mut XmlTree, annotation: &mut Option<ElemId>, appinfo: &mut Option<ElemId>| {
        let ann = *annotation.get_or_insert_with(|| doc.add(parent, "xs:annotation"));
        *appinfo.get_or_insert_with(|| doc.add(ann, "xs:appinfo"))
    };

    if let Some(units) = &meta.units {
        let info = ensure_appinfo(doc, &mut annotation, &mut appinfo);
        let e = doc.add(info, "units");
        doc.set_attr(e, "value", units);
    }
    if let Some(config) = meta.config {
        let info = ensure_appinfo(doc, &mut annotation, &mut appinfo);
        let e = doc.add(info, "config");
        doc.set_attr(e, "value", if config { "true" } else { "false" });
    }
    if let SchemaNode::Container {
        presence: Some(presence),
        ..
    } = node
    {
        let info = ensure_appinfo(doc, &mut annotation, &mut appinfo);
        let e = doc.add(info, "presence");
        if !suppress_docs {
            doc.set_attr(e, "value", presence);
        }
    }
    if let Some(must) = &meta.must {
        let info = ensure_appinfo(doc, &mut annotation, &mut appinfo);
        let m = doc.add(info, "must");
        doc.set_attr(m, "value", &must.expr);
        if let Some(msg) = &must.error_message {
            let e = doc.add(m, "error-message");
            doc.set_attr(e, "value", msg);
        }
        if let Some(desc) = &must.description {
            let e = doc.add(m, "description");
            doc.set_attr(e, "value", desc);
        }
    }
    if let Some(when) = &meta.when {
        let info = ensure_appinfo(doc, &mut annotation, &mut appinfo);
        let e = doc.add(info, "when");
        doc.set_attr(e, "value", when);
    }
}
