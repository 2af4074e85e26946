//! Configuration for the schema emitters.

use serde::{Deserialize, Serialize};

/// Flavor of the JSON driver output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JtoxFlavor {
    /// Classic driver file: leaf entries are `[kind, basetype]`, child
    /// keys qualified only for cross-module children.
    Compact,
    /// Adds a node-attribute object (description, reference, config,
    /// default, mandatory) per leaf and qualifies every child key with
    /// its owning module.
    Annotated,
}

/// Options consumed by the emitters.
///
/// ## Serialization Format
///
/// Fields are serialized in `kebab-case` (e.g., `sql-ancestor-cutoff`).
/// This naming convention is part of the public API contract for config
/// files handed to the CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct EmitOptions {
    /// Number of ancestors to keep when building SQL table names.
    /// Older ancestors are dropped, not renamed, past the cutoff.
    /// `None` means unbounded (default).
    pub sql_ancestor_cutoff: Option<usize>,
    /// Emit sample `INSERT` rows (three per list) alongside the DDL.
    pub sql_sample_data: bool,
    /// Qualify table names with the module's attach alias
    /// (`CREATE TABLE <alias>.<table>`), so statements target the right
    /// attached database.
    pub sql_db_schema: bool,
    /// Generate the paired C header/source key-constant output.
    pub sql_headers: bool,
    /// Stem used for the `.h`/`.c` pair and its include guard.
    /// Defaults to `yangcast` when headers are requested without a stem.
    pub sql_output_stem: Option<String>,
    /// Inline XSD simple types under their element instead of emitting
    /// named top-level entities.
    pub xsd_inline_simple_types: bool,
    /// Suppress YANG documentation text in the XSD output.
    pub xsd_suppress_docs: bool,
    /// Flavor of the JSON driver output.
    pub jtox_flavor: JtoxFlavor,
    /// Iteration cap for the identity-hierarchy fixed point. A heuristic:
    /// must be at least the deepest base-dependency chain in the module
    /// set. Exceeding it leaves the remaining identities unplaced.
    pub identity_iteration_cap: usize,
}

impl Default for EmitOptions {
    fn default() -> Self {
        Self {
            sql_ancestor_cutoff: None,
            sql_sample_data: false,
            sql_db_schema: false,
            sql_headers: false,
            sql_output_stem: None,
            xsd_inline_simple_types: false,
            xsd_suppress_docs: false,
            jtox_flavor: JtoxFlavor::Compact,
            identity_iteration_cap: 20,
        }
    }
}
