//! Schema-translation core: turns a resolved YANG module context into
//! XSD documents, SQL DDL or JSON driver metadata.
//!
//! The input is a [`context::SchemaContext`] prepared by an external
//! front end (parsing and validation happen there; any error-severity
//! diagnostic it recorded gates emission here). The core walks each
//! module's data tree once per output format:
//!
//! * [`emit_xsd`] — one XML Schema document per module, with named
//!   complex/simple types, key/keyref constraints and cross-module
//!   imports.
//! * [`emit_sql`] — a relational DDL script with cascade triggers,
//!   optional sample rows and an optional C header pair.
//! * [`emit_jtox`] — the single JSON document an instance-data
//!   translator loads at runtime.
//!
//! Shared machinery lives in [`walker`] (the traversal driver),
//! [`resolver`] (typedef/union/leafref resolution), [`identity`] (the
//! identity derivation forest) and [`prefix`] (run-unique prefixes).

pub mod config;
pub mod context;
pub mod emit;
pub mod error;
pub mod identity;
pub mod prefix;
pub mod resolver;
pub mod walker;

use tracing::info;

pub use config::{EmitOptions, JtoxFlavor};
pub use context::{Module, SchemaContext, SchemaNode, TypeSpec};
pub use emit::headers::{EnumConst, TableInfo};
pub use emit::sql::SqlOutput;
pub use emit::xsd::XsdDocument;
pub use error::{ResolveError, TranslateError};

fn check_model(ctx: &SchemaContext) -> Result<(), TranslateError> {
    let count = ctx.error_count();
    if count > 0 {
        return Err(TranslateError::InvalidModel { count });
    }
    Ok(())
}

/// Emit one XSD document per module in the context.
///
/// Modules whose typedef graph is cyclic are skipped with a warning;
/// empty modules produce no document.
pub fn emit_xsd(ctx: &SchemaContext, opts: &EmitOptions) -> Result<Vec<XsdDocument>, TranslateError> {
    check_model(ctx)?;
    let docs = emit::xsd::emit(ctx, opts);
    info!(documents = docs.len(), "xsd emission finished");
    Ok(docs)
}

/// Emit the combined SQL DDL script (and C headers when requested).
pub fn emit_sql(ctx: &SchemaContext, opts: &EmitOptions) -> Result<SqlOutput, TranslateError> {
    check_model(ctx)?;
    let out = emit::sql::emit(ctx, opts);
    info!(
        headers = out.header_h.is_some(),
        "sql emission finished"
    );
    Ok(out)
}

/// Emit the JSON driver document.
pub fn emit_jtox(ctx: &SchemaContext, opts: &EmitOptions) -> Result<serde_json::Value, TranslateError> {
    check_model(ctx)?;
    let doc = emit::jtox::emit(ctx, opts);
    info!("jtox emission finished");
    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{Diagnostic, Severity};

    #[test]
    fn test_error_diagnostics_gate_emission() {
        let ctx = SchemaContext {
            modules: Vec::new(),
            diagnostics: vec![Diagnostic {
                severity: Severity::Error,
                message: "bad module".into(),
                location: None,
            }],
        };
        let err = emit_jtox(&ctx, &EmitOptions::default()).unwrap_err();
        assert!(matches!(err, TranslateError::InvalidModel { count: 1 }));
    }

    #[test]
    fn test_warnings_do_not_gate_emission() {
        let ctx = SchemaContext {
            modules: Vec::new(),
            diagnostics: vec![Diagnostic {
                severity: Severity::Warning,
                message: "deprecated statement".into(),
                location: None,
            }],
        };
        assert!(emit_xsd(&ctx, &EmitOptions::default()).is_ok());
    }
}
