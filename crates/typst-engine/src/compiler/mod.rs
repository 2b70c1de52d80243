//! Typst compilation wrapper with error handling

pub mod errors;
pub mod output;
pub mod render;

pub use errors::{CompileError, EngineError, ErrorSeverity};
pub use output::{PageText, RenderedPdf};
pub use render::compile_pdf;
