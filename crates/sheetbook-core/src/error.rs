use std::path::PathBuf;

use thiserror::Error;
use typst_engine::EngineError;

/// Errors produced while converting a spreadsheet into a digest
#[derive(Error, Debug)]
pub enum SheetbookError {
    #[error("No .xlsx file found in {}", .dir.display())]
    NotFound { dir: PathBuf },

    #[error("{} is missing required column(s): {}", .path.display(), .missing.join(", "))]
    FileFormat { path: PathBuf, missing: Vec<String> },

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read workbook {}: {source}", .path.display())]
    Workbook {
        path: PathBuf,
        #[source]
        source: calamine::Error,
    },

    #[error("Font loading error for '{path}': {reason}")]
    FontLoad { path: String, reason: String },

    #[error("Render error: {0}")]
    Render(EngineError),
}

/// Coarse error category, one per failure mode of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    FileFormat,
    Io,
    FontLoad,
    Render,
}

impl SheetbookError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SheetbookError::NotFound { .. } => ErrorKind::NotFound,
            SheetbookError::FileFormat { .. } => ErrorKind::FileFormat,
            SheetbookError::Io { .. } | SheetbookError::Workbook { .. } => ErrorKind::Io,
            SheetbookError::FontLoad { .. } => ErrorKind::FontLoad,
            SheetbookError::Render(_) => ErrorKind::Render,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SheetbookError::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<EngineError> for SheetbookError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::FontLoad { path, reason } => SheetbookError::FontLoad { path, reason },
            other => SheetbookError::Render(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, SheetbookError>;
