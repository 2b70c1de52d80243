//! Typst document rendering engine
//!
//! This crate compiles Typst source entirely in memory and exports it to PDF:
//! - `VirtualWorld`: a single-file `World` with structured `sys.inputs`
//! - `FontCache`: embedded fonts plus fonts loaded from disk
//! - `compile_pdf`: one-pass compile and export, with per-page text for inspection

pub mod compiler;
pub mod world;

pub use compiler::{compile_pdf, CompileError, EngineError, PageText, RenderedPdf};
pub use world::{FontCache, VirtualWorld};
