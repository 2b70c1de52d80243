//! Core rendering logic
//!
//! Compiles the main source once, then exports the laid-out document to
//! PDF. Any error diagnostic aborts the render; warnings are logged.

use typst::diag::{Severity, SourceDiagnostic};
use typst::World;

use super::errors::{CompileError, EngineError};
use super::output::{page_texts, RenderedPdf};
use crate::world::{FontCache, VirtualWorld};

/// Compile a Typst document and export it to PDF in one pass
pub fn compile_pdf(
    source: String,
    inputs: serde_json::Map<String, serde_json::Value>,
    fonts: FontCache,
    time: chrono::DateTime<chrono::Utc>,
) -> Result<RenderedPdf, EngineError> {
    let world = VirtualWorld::new(source, inputs, fonts, time)?;

    let warned = typst::compile(&world);
    let (_, warnings) = categorize_diagnostics(&world, &warned.warnings);
    for warning in &warnings {
        tracing::warn!("Typst warning: {}", warning);
    }

    let document = match warned.output {
        Ok(document) => document,
        Err(diagnostics) => {
            let (errors, _) = categorize_diagnostics(&world, &diagnostics);
            return Err(EngineError::Compile(errors));
        }
    };

    let bytes = typst_pdf::pdf(&document, &typst_pdf::PdfOptions::default()).map_err(|diags| {
        let (errors, _) = categorize_diagnostics(&world, &diags);
        EngineError::Export(
            errors
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; "),
        )
    })?;

    let pages = page_texts(&document);
    tracing::debug!(pages = pages.len(), bytes = bytes.len(), "Exported PDF");

    Ok(RenderedPdf { bytes, pages })
}

/// Categorize diagnostics into errors and warnings
fn categorize_diagnostics(
    world: &VirtualWorld,
    diagnostics: &[SourceDiagnostic],
) -> (Vec<CompileError>, Vec<CompileError>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    for diag in diagnostics {
        let mut compile_error = CompileError::new(diag.message.to_string());

        if let Some((line, column)) = locate(world, diag) {
            compile_error = compile_error.with_location(line, column);
        }

        if !diag.hints.is_empty() {
            let hint = diag
                .hints
                .iter()
                .map(|h| h.to_string())
                .collect::<Vec<_>>()
                .join("; ");
            compile_error = compile_error.with_hint(hint);
        }

        match diag.severity {
            Severity::Error => errors.push(compile_error),
            Severity::Warning => warnings.push(compile_error.as_warning()),
        }
    }

    (errors, warnings)
}

/// 1-based line and column of a diagnostic in the main source
fn locate(world: &VirtualWorld, diag: &SourceDiagnostic) -> Option<(usize, usize)> {
    if diag.span.id()? != world.main() {
        return None;
    }
    let source = world.main_source();
    let start = source.range(diag.span)?.start;
    let line = source.byte_to_line(start)?;
    let column = source.byte_to_column(start)?;
    Some((line + 1, column + 1))
}
