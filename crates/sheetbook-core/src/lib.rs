//! Spreadsheet to paginated PDF digest
//!
//! This crate turns a spreadsheet of records (creation time, title, link,
//! HTML content) into a single A4 PDF:
//! - `extract`: spreadsheet rows to [`Record`]s, markup stripped by `html`
//! - `document`: records to a table of contents plus one page per record
//! - `pipeline`: input discovery, output naming and the end-to-end run

pub mod document;
pub mod error;
pub mod extract;
pub mod html;
pub mod pipeline;

pub use document::{
    split_paragraphs, DigestDocument, LayoutOptions, Section, TocEntry, TocNumbering,
};
pub use error::{ErrorKind, Result, SheetbookError};
pub use extract::{read_records, ColumnMap, Record};
pub use html::strip_html;
pub use pipeline::{convert, find_input, output_file_name, ConversionReport, ConvertOptions};
