//! Minimal arena-backed XML document builder.
//!
//! The corpus only ever parses XML; nothing in the stack writes it, so
//! the XSD emitter carries this small builder instead of a full XML
//! crate: element creation by parent id, positional insertion (imports
//! go first in a schema), attribute/doc-order lookups, and a pretty
//! printer producing the final `.xsd` text.

use std::fmt::Write;

/// Index into the tree's element arena.
pub type ElemId = usize;

#[derive(Debug, Clone)]
pub enum XmlChild {
    Elem(ElemId),
    Text(String),
    Comment(String),
}

#[derive(Debug, Clone)]
pub struct XmlElem {
    pub name: String,
    /// Attributes in insertion order — order is part of the output.
    pub attrs: Vec<(String, String)>,
    pub children: Vec<XmlChild>,
}

/// One XML document; element 0 is the root.
#[derive(Debug, Clone)]
pub struct XmlTree {
    elems: Vec<XmlElem>,
}

impl XmlTree {
    pub fn new(root_name: &str) -> Self {
        Self {
            elems: vec![XmlElem {
                name: root_name.to_string(),
                attrs: Vec::new(),
                children: Vec::new(),
            }],
        }
    }

    pub fn root(&self) -> ElemId {
        0
    }

    pub fn elem(&self, id: ElemId) -> &XmlElem {
        &self.elems[id]
    }

    /// Append a child element and return its id.
    pub fn add(&mut self, parent: ElemId, name: &str) -> ElemId {
        let id = self.push_elem(name);
        self.elems[parent].children.push(XmlChild::Elem(id));
        id
    }

    /// Insert a child element at `index` (clamped) and return its id.
    pub fn insert(&mut self, parent: ElemId, index: usize, name: &str) -> ElemId {
        let id = self.push_elem(name);
        let children = &mut self.elems[parent].children;
        let index = index.min(children.len());
        children.insert(index, XmlChild::Elem(id));
        id
    }

    fn push_elem(&mut self, name: &str) -> ElemId {
        self.elems.push(XmlElem {
            name: name.to_string(),
            attrs: Vec::new(),
            children: Vec::new(),
        });
        self.elems.len() - 1
    }

    /// Set an attribute, replacing any existing value for the key.
    pub fn set_attr(&mut self, id: ElemId, key: &str, value: &str) {
        let attrs = &mut self.elems[id].attrs;
        if let Some(slot) = attrs.iter_mut().find(|(k, _)| k == key) {
            slot.1 = value.to_string();
        } else {
            attrs.push((key.to_string(), value.to_string()));
        }
    }

    pub fn attr<'a>(&'a self, id: ElemId, key: &str) -> Option<&'a str> {
        self.elems[id]
            .attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn add_text(&mut self, id: ElemId, text: &str) {
        self.elems[id].children.push(XmlChild::Text(text.to_string()));
    }

    pub fn insert_comment(&mut self, parent: ElemId, index: usize, text: &str) {
        let children = &mut self.elems[parent].children;
        let index = index.min(children.len());
        children.insert(index, XmlChild::Comment(text.to_string()));
    }

    /// Direct element children of `parent`.
    pub fn child_elems<'a>(&'a self, parent: ElemId) -> impl Iterator<Item = ElemId> + 'a {
        self.elems[parent].children.iter().filter_map(|c| match c {
            XmlChild::Elem(id) => Some(*id),
            _ => None,
        })
    }

    /// First element anywhere in doc order matching name + attribute.
    pub fn find_by_attr(&self, name: &str, key: &str, value: &str) -> Option<ElemId> {
        self.find_from(self.root(), &mut |tree, id| {
            tree.elem(id).name == name && tree.attr(id, key) == Some(value)
        })
    }

    /// First direct child of root matching name + attribute (top-level
    /// schema entities are always attached to the root).
    pub fn find_top_level(&self, name: &str, key: &str, value: &str) -> Option<ElemId> {
        self.child_elems(self.root())
            .find(|&id| self.elem(id).name == name && self.attr(id, key) == Some(value))
    }

    fn find_from(
        &self,
        id: ElemId,
        pred: &mut impl FnMut(&XmlTree, ElemId) -> bool,
    ) -> Option<ElemId> {
        if pred(self, id) {
            return Some(id);
        }
        let child_ids: Vec<ElemId> = self.child_elems(id).collect();
        for child in child_ids {
            if let Some(found) = self.find_from(child, pred) {
                return Some(found);
            }
        }
        None
    }

    /// Serialize with an XML declaration and two-space indentation.
    /// Elements whose only children are text render on one line.
    pub fn to_pretty_string(&self) -> String {
        let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        self.write_elem(self.root(), 0, &mut out);
        out
    }

    fn write_elem(&self, id: ElemId, depth: usize, out: &mut String) {
        let elem = &self.elems[id];
        let pad = "  ".repeat(depth);
        let _ = write!(out, "{}<{}", pad, elem.name);
        for (k, v) in &elem.attrs {
            let _ = write!(out, " {}=\"{}\"", k, escape_attr(v));
        }
        if elem.children.is_empty() {
            out.push_str("/>\n");
            return;
        }
        let text_only = elem
            .children
            .iter()
            .all(|c| matches!(c, XmlChild::Text(_)));
        if text_only {
            out.push('>');
            for child in &elem.children {
                if let XmlChild::Text(t) = child {
                    out.push_str(&escape_text(t));
                }
            }
            let _ = writeln!(out, "</{}>", elem.name);
            return;
        }
        out.push_str(">\n");
        for child in &elem.children {
            match child {
                XmlChild::Elem(cid) => self.write_elem(*cid, depth + 1, out),
                XmlChild::Text(t) => {
                    let _ = writeln!(out, "{}  {}", pad, escape_text(t));
                }
                XmlChild::Comment(t) => {
                    let _ = writeln!(out, "{}  <!-- {} -->", pad, t);
                }
            }
        }
        let _ = writeln!(out, "{}</{}>", pad, elem.name);
    }
}

fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn escape_attr(s: &str) -> String {
    escape_text(s).replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_pretty_print_shapes() {
        let mut tree = XmlTree::new("xs:schema");
        tree.set_attr(tree.root(), "version", "1.0");
        let st = tree.add(tree.root(), "xs:simpleType");
        tree.set_attr(st, "name", "t");
        let doc = tree.add(st, "xs:documentation");
        tree.add_text(doc, "a < b");
        tree.add(tree.root(), "xs:element");

        let text = tree.to_pretty_string();
        assert_eq!(
            text,
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
             <xs:schema version=\"1.0\">\n\
             \x20\x20<xs:simpleType name=\"t\">\n\
             \x20\x20\x20\x20<xs:documentation>a &lt; b</xs:documentation>\n\
             \x20\x20</xs:simpleType>\n\
             \x20\x20<xs:element/>\n\
             </xs:schema>\n"
        );
    }

    #[test]
    fn test_insert_places_imports_first() {
        let mut tree = XmlTree::new("xs:schema");
        tree.add(tree.root(), "xs:element");
        let imp = tree.insert(tree.root(), 0, "xs:import");
        tree.set_attr(imp, "namespace", "urn:x");

        let first = tree.child_elems(tree.root()).next().unwrap();
        assert_eq!(tree.elem(first).name, "xs:import");
    }

    #[test]
    fn test_find_by_attr_walks_doc_order() {
        let mut tree = XmlTree::new("xs:schema");
        let ct = tree.add(tree.root(), "xs:complexType");
        tree.set_attr(ct, "name", "top_t");
        let seq = tree.add(ct, "xs:sequence");
        let el = tree.add(seq, "xs:element");
        tree.set_attr(el, "name", "inner");

        assert_eq!(tree.find_by_attr("xs:element", "name", "inner"), Some(el));
        assert_eq!(tree.find_by_attr("xs:element", "name", "missing"), None);
        assert_eq!(tree.find_top_level("xs:complexType", "name", "top_t"), Some(ct));
        assert_eq!(tree.find_top_level("xs:element", "name", "inner"), None);
    }

    #[test]
    fn test_attr_replacement_keeps_order() {
        let mut tree = XmlTree::new("a");
        tree.set_attr(0, "x", "1");
        tree.set_attr(0, "y", "2");
        tree.set_attr(0, "x", "3");
        assert_eq!(tree.attr(0, "x"), Some("3"));
        assert_eq!(tree.elem(0).attrs.len(), 2);
    }
}
