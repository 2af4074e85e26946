//! Recursive-descent driver over the data tree.
//!
//! Provides [`SchemaVisitor`] — a trait the emitters implement to receive
//! node events — and [`walk`] — the driver that visits children in
//! declaration order, threading an immutable [`AncestorPath`] through the
//! recursion. All node-kind dispatch lives here; emitters never match on
//! the node enum themselves.
//!
//! `choice`/`case` wrappers are transparent for naming (the path is not
//! extended through them) but are still delivered as explicit enter/leave
//! events so the XSD emitter can preserve the groups structurally.

use tracing::debug;

use crate::context::{Module, SchemaNode};

// ---------------------------------------------------------------------------
// Ancestor path
// ---------------------------------------------------------------------------

/// Ordered sequence of enclosing container/list names, excluding the
/// module and transparent choice/case wrappers.
///
/// The path is never mutated in place: [`AncestorPath::child`] constructs
/// the extended path that is passed down one level, so sibling subtrees
/// can never observe each other's push/pop.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct AncestorPath {
    segments: Vec<String>,
}

impl AncestorPath {
    pub fn root() -> Self {
        Self::default()
    }

    /// A path pre-seeded with segments, used when walking rpc input/output
    /// or notification subtrees where the rpc/notification name anchors
    /// the hierarchy.
    pub fn seeded<S: Into<String>>(segments: impl IntoIterator<Item = S>) -> Self {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    /// The path one level down, with `name` appended.
    pub fn child(&self, name: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(name.to_string());
        Self { segments }
    }

    pub fn names(&self) -> &[String] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn last(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Join all segments with `sep`.
    pub fn joined(&self, sep: &str) -> String {
        self.segments.join(sep)
    }

    /// Join the last `cutoff` segments with `sep`; `None` keeps them all.
    /// Used by the SQL emitter to bound identifier length.
    pub fn tail_joined(&self, sep: &str, cutoff: Option<usize>) -> String {
        let start = match cutoff {
            Some(n) => self.segments.len().saturating_sub(n),
            None => 0,
        };
        self.segments[start..].join(sep)
    }
}

// ---------------------------------------------------------------------------
// rpc/notification excision
// ---------------------------------------------------------------------------

/// A module's children partitioned into data nodes and the rpc and
/// notification subtrees. The data emitters only see `data`; the XSD
/// emitter routes `rpcs` and `notifications` to dedicated handlers.
///
/// The input tree itself is never mutated — this borrows.
pub struct DataTree<'a> {
    pub data: Vec<&'a SchemaNode>,
    pub rpcs: Vec<&'a SchemaNode>,
    pub notifications: Vec<&'a SchemaNode>,
}

pub fn excise_rpc_subtrees(module: &Module) -> DataTree<'_> {
    let mut tree = DataTree {
        data: Vec::new(),
        rpcs: Vec::new(),
        notifications: Vec::new(),
    };
    for ch in &module.children {
        match ch {
            SchemaNode::Rpc { .. } => tree.rpcs.push(ch),
            SchemaNode::Notification { .. } => tree.notifications.push(ch),
            _ => tree.data.push(ch),
        }
    }
    tree
}

// ---------------------------------------------------------------------------
// Visitor contract
// ---------------------------------------------------------------------------

/// Instruction returned by the enter hooks to control traversal.
///
/// `Skip` is how an emitter prunes a subtree on a deduplication hit or a
/// `config false` exclusion; the matching leave hook is not called.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Descend {
    Into,
    Skip,
}

/// Traversal callbacks, one per node kind. Every hook has a no-op
/// default so emitters only override what they consume.
pub trait SchemaVisitor {
    type Error;

    fn enter_container(
        &mut self,
        node: &SchemaNode,
        path: &AncestorPath,
    ) -> Result<Descend, Self::Error> {
        let _ = (node, path);
        Ok(Descend::Into)
    }

    fn leave_container(&mut self, node: &SchemaNode, path: &AncestorPath) -> Result<(), Self::Error> {
        let _ = (node, path);
        Ok(())
    }

    fn enter_list(&mut self, node: &SchemaNode, path: &AncestorPath) -> Result<Descend, Self::Error> {
        let _ = (node, path);
        Ok(Descend::Into)
    }

    fn leave_list(&mut self, node: &SchemaNode, path: &AncestorPath) -> Result<(), Self::Error> {
        let _ = (node, path);
        Ok(())
    }

    fn visit_leaf(&mut self, node: &SchemaNode, path: &AncestorPath) -> Result<(), Self::Error> {
        let _ = (node, path);
        Ok(())
    }

    fn visit_leaf_list(&mut self, node: &SchemaNode, path: &AncestorPath) -> Result<(), Self::Error> {
        let _ = (node, path);
        Ok(())
    }

    fn enter_choice(&mut self, node: &SchemaNode, path: &AncestorPath) -> Result<Descend, Self::Error> {
        let _ = (node, path);
        Ok(Descend::Into)
    }

    fn leave_choice(&mut self, node: &SchemaNode, path: &AncestorPath) -> Result<(), Self::Error> {
        let _ = (node, path);
        Ok(())
    }

    fn enter_case(&mut self, node: &SchemaNode, path: &AncestorPath) -> Result<Descend, Self::Error> {
        let _ = (node, path);
        Ok(Descend::Into)
    }

    fn leave_case(&mut self, node: &SchemaNode, path: &AncestorPath) -> Result<(), Self::Error> {
        let _ = (node, path);
        Ok(())
    }

    fn visit_anyxml(&mut self, node: &SchemaNode, path: &AncestorPath) -> Result<(), Self::Error> {
        let _ = (node, path);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Drivers
// ---------------------------------------------------------------------------

/// Walk a child sequence in declaration order.
pub fn walk<V: SchemaVisitor>(
    children: &[SchemaNode],
    path: &AncestorPath,
    visitor: &mut V,
) -> Result<(), V::Error> {
    for node in children {
        visit_node(node, path, visitor)?;
    }
    Ok(())
}

/// Walk an excised forest (borrowed top-level nodes) in declaration order.
pub fn walk_forest<V: SchemaVisitor>(
    nodes: &[&SchemaNode],
    path: &AncestorPath,
    visitor: &mut V,
) -> Result<(), V::Error> {
    for node in nodes {
        visit_node(node, path, visitor)?;
    }
    Ok(())
}

fn visit_node<V: SchemaVisitor>(
    node: &SchemaNode,
    path: &AncestorPath,
    visitor: &mut V,
) -> Result<(), V::Error> {
    match node {
        SchemaNode::Container { children, .. } => {
            if visitor.enter_container(node, path)? == Descend::Into {
                walk(children, &path.child(node.name()), visitor)?;
                visitor.leave_container(node, path)?;
            }
        }
        SchemaNode::List { children, .. } => {
            if visitor.enter_list(node, path)? == Descend::Into {
                walk(children, &path.child(node.name()), visitor)?;
                visitor.leave_list(node, path)?;
            }
        }
        SchemaNode::Leaf { .. } => visitor.visit_leaf(node, path)?,
        SchemaNode::LeafList { .. } => visitor.visit_leaf_list(node, path)?,
        SchemaNode::Choice { children, .. } => {
            // Transparent: the path is not extended through the choice.
            if visitor.enter_choice(node, path)? == Descend::Into {
                walk(children, path, visitor)?;
                visitor.leave_choice(node, path)?;
            }
        }
        SchemaNode::Case { children, .. } => {
            if visitor.enter_case(node, path)? == Descend::Into {
                walk(children, path, visitor)?;
                visitor.leave_case(node, path)?;
            }
        }
        SchemaNode::Anyxml { .. } => visitor.visit_anyxml(node, path)?,
        SchemaNode::Rpc { .. } | SchemaNode::Notification { .. } => {
            // Reachable only if an rpc/notification is nested below the
            // module root, which a valid front end never produces.
            debug!(name = node.name(), "skipping non-data node during descent");
        }
    }
    Ok(())
}

/// Find a data node by a sequence of names from `children` downward,
/// looking through transparent choice/case wrappers at every level.
pub fn find_node<'a>(children: &'a [SchemaNode], names: &[&str]) -> Option<&'a SchemaNode> {
    let (first, rest) = names.split_first()?;
    for ch in children {
        match ch {
            SchemaNode::Choice { children, .. } | SchemaNode::Case { children, .. } => {
                if let Some(found) = find_node(children, names) {
                    return Some(found);
                }
            }
            _ if ch.name() == *first => {
                return if rest.is_empty() {
                    Some(ch)
                } else {
                    find_node(ch.children(), rest)
                };
            }
            _ => {}
        }
    }
    None
}
