//! Output emitters: XSD, SQL DDL, JSON driver metadata.
//!
//! Each emitter consumes the tree walker's callbacks and owns its output
//! accumulator; nothing here mutates the input context.

pub mod headers;
pub mod jtox;
pub mod sql;
pub mod xml;
pub mod xsd;

use crate::walker::AncestorPath;

/// Structural key for deduplicated definition emission: the ancestor
/// path of a node plus its own name. The same container/typedef shape
/// reached via several paths (inlined groupings, re-imported modules)
/// hashes identically and is emitted once per output document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    pub path: Vec<String>,
    pub name: String,
}

impl Fingerprint {
    pub fn of(path: &AncestorPath, name: &str) -> Self {
        Self {
            path: path.names().to_vec(),
            name: name.to_string(),
        }
    }
}
