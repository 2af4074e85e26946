//! Error types for schema translation.

use thiserror::Error;

/// Hard failures that abort an emission run.
#[derive(Debug, Error)]
pub enum TranslateError {
    #[error("input model carries {count} error-severity diagnostic(s); emission aborted")]
    InvalidModel { count: usize },

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("output write error: {0}")]
    Io(#[from] std::io::Error),
}

/// Local, non-fatal type-resolution failures.
///
/// A typedef cycle aborts translation of the declaring module; an
/// unresolvable leafref or unknown typedef degrades the leaf to the
/// `string` fallback primitive so the rest of the run can proceed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("typedef chain through `{type_name}` is cyclic")]
    TypedefCycle { type_name: String },

    #[error("leafref path `{path}` does not resolve to a data node")]
    UnresolvedLeafref { path: String },

    #[error("typedef `{type_name}` is not defined in any loaded module")]
    UnknownTypedef { type_name: String },
}
