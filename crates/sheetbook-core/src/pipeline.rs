//! End-to-end conversion: locate the spreadsheet, extract, assemble, write.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime, Utc};
use typst_engine::FontCache;

use crate::document::{DigestDocument, LayoutOptions, TocNumbering};
use crate::error::{Result, SheetbookError};
use crate::extract::{read_records, ColumnMap};

/// Extension of spreadsheets picked up from the working directory
pub const INPUT_EXTENSION: &str = ".xlsx";

/// Extension of generated documents
pub const OUTPUT_EXTENSION: &str = "pdf";

/// Timestamp suffix format of generated file names
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Everything a conversion run needs to know
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// Directory scanned for input and receiving the output
    pub dir: PathBuf,
    /// Explicit input; skips directory discovery when set
    pub input: Option<PathBuf>,
    /// Font file used for all document text
    pub font: PathBuf,
    pub columns: ColumnMap,
    pub toc_title: String,
    pub numbering: TocNumbering,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        let layout = LayoutOptions::default();
        Self {
            dir: PathBuf::from("."),
            input: None,
            font: PathBuf::from("SimSun.ttf"),
            columns: ColumnMap::default(),
            toc_title: layout.toc_title,
            numbering: layout.numbering,
        }
    }
}

/// Summary of a successful run
#[derive(Debug, Clone)]
pub struct ConversionReport {
    pub input: PathBuf,
    pub output: PathBuf,
    pub records: usize,
    pub pages: usize,
}

/// Find the spreadsheet to convert in `dir`.
///
/// When several match, the first in directory-listing order wins. That
/// order is whatever the filesystem returns and is not sorted.
pub fn find_input(dir: &Path) -> Result<PathBuf> {
    let entries = std::fs::read_dir(dir).map_err(|e| SheetbookError::io(dir, e))?;

    let mut candidates = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| SheetbookError::io(dir, e))?.path();
        if is_spreadsheet(&path) && path.is_file() {
            candidates.push(path);
        }
    }
    tracing::debug!(candidates = candidates.len(), dir = %dir.display(), "Scanned for spreadsheets");

    candidates
        .into_iter()
        .next()
        .ok_or_else(|| SheetbookError::NotFound {
            dir: dir.to_path_buf(),
        })
}

fn is_spreadsheet(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    // "~$name.xlsx" is the lock file Excel keeps next to an open workbook
    name.ends_with(INPUT_EXTENSION) && !name.starts_with("~$")
}

/// `<input stem>_<YYYYMMDD_HHMMSS>.pdf`
pub fn output_file_name(input: &Path, timestamp: NaiveDateTime) -> String {
    format!(
        "{}_{}.{}",
        input_stem(input),
        timestamp.format(TIMESTAMP_FORMAT),
        OUTPUT_EXTENSION
    )
}

fn input_stem(input: &Path) -> String {
    input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Run one conversion.
///
/// Errors are returned as they occur; nothing is retried. The output file
/// only appears once the whole document has been rendered.
pub fn convert(options: &ConvertOptions) -> Result<ConversionReport> {
    let started = Local::now();

    let input = match &options.input {
        Some(input) => input.clone(),
        None => find_input(&options.dir)?,
    };
    tracing::info!("Converting {}", input.display());

    let (fonts, family) = FontCache::with_font_file(&options.font)?;
    let records = read_records(&input, &options.columns)?;

    let layout = LayoutOptions {
        title: input_stem(&input),
        toc_title: options.toc_title.clone(),
        numbering: options.numbering,
    };
    let document = DigestDocument::from_records(&records, &layout, &family);
    let rendered = document.render(fonts, started.with_timezone(&Utc))?;

    let output = options
        .dir
        .join(output_file_name(&input, started.naive_local()));
    write_atomically(&output, &rendered.bytes)?;
    tracing::info!("Wrote {} ({} pages)", output.display(), rendered.page_count());

    Ok(ConversionReport {
        input,
        output,
        records: records.len(),
        pages: rendered.page_count(),
    })
}

/// Write through a temp file in the target directory, then rename into place
fn write_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut file = tempfile::Builder::new()
        .prefix(".sheetbook-")
        .suffix(".part")
        .tempfile_in(dir)
        .map_err(|e| SheetbookError::io(dir, e))?;
    file.write_all(bytes)
        .and_then(|_| file.as_file().sync_all())
        .map_err(|e| SheetbookError::io(path, e))?;
    file.persist(path)
        .map_err(|e| SheetbookError::io(path, e.error))?;

    Ok(())
}
