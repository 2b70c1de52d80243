//! Record extraction from spreadsheets
//!
//! The first worksheet is read with `calamine`; its first row is the header.
//! Each following row becomes one [`Record`], in row order.

use std::path::Path;

use calamine::{open_workbook_auto, Data, DataType, Reader};

use crate::error::{Result, SheetbookError};
use crate::html::strip_html;

/// Separator between the creation time and the title in a record heading
pub const TITLE_SEPARATOR: &str = " - ";

/// One spreadsheet row, normalized
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// `"<created> - <title>"`
    pub title: String,
    /// Source link, verbatim
    pub link: String,
    /// Body with all markup removed
    pub body: String,
}

/// Accepted header names for each required column.
///
/// Matching ignores surrounding whitespace and ASCII case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMap {
    pub created: Vec<String>,
    pub title: Vec<String>,
    pub link: Vec<String>,
    pub content: Vec<String>,
}

impl Default for ColumnMap {
    fn default() -> Self {
        fn names(list: &[&str]) -> Vec<String> {
            list.iter().map(|s| s.to_string()).collect()
        }

        Self {
            created: names(&["创建时间", "creation time", "created time", "created"]),
            title: names(&["标题", "title"]),
            link: names(&["链接", "link", "url"]),
            content: names(&["内容", "content", "body"]),
        }
    }
}

/// Resolved positions of the required columns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ColumnIndices {
    created: usize,
    title: usize,
    link: usize,
    content: usize,
}

impl ColumnMap {
    /// Find every required column in a header row.
    ///
    /// On failure, returns the alias list of each missing column.
    fn resolve(&self, header: &[String]) -> std::result::Result<ColumnIndices, Vec<String>> {
        let created = position_of(header, &self.created);
        let title = position_of(header, &self.title);
        let link = position_of(header, &self.link);
        let content = position_of(header, &self.content);

        match (created, title, link, content) {
            (Some(created), Some(title), Some(link), Some(content)) => Ok(ColumnIndices {
                created,
                title,
                link,
                content,
            }),
            _ => Err([
                (created, &self.created),
                (title, &self.title),
                (link, &self.link),
                (content, &self.content),
            ]
            .into_iter()
            .filter(|(found, _)| found.is_none())
            .map(|(_, aliases)| aliases.join(" / "))
            .collect()),
        }
    }
}

fn position_of(header: &[String], aliases: &[String]) -> Option<usize> {
    header.iter().position(|cell| {
        let cell = cell.trim();
        aliases.iter().any(|alias| cell.eq_ignore_ascii_case(alias))
    })
}

/// Read all records from the first worksheet of a spreadsheet
pub fn read_records(path: &Path, columns: &ColumnMap) -> Result<Vec<Record>> {
    let workbook_error = |source| SheetbookError::Workbook {
        path: path.to_path_buf(),
        source,
    };

    let range = {
        let mut workbook = open_workbook_auto(path).map_err(workbook_error)?;
        workbook
            .worksheet_range_at(0)
            .ok_or(calamine::Error::Msg("workbook has no worksheets"))
            .map_err(workbook_error)?
            .map_err(workbook_error)?
    };

    let records = records_from_rows(path, range.rows(), columns)?;
    tracing::info!("Read {} records from {}", records.len(), path.display());
    Ok(records)
}

/// Build records from raw rows; the first row is the header
pub fn records_from_rows<'a, I>(path: &Path, rows: I, columns: &ColumnMap) -> Result<Vec<Record>>
where
    I: IntoIterator<Item = &'a [Data]>,
{
    let mut rows = rows.into_iter();

    let header: Vec<String> = rows
        .next()
        .map(|row| row.iter().map(cell_text).collect())
        .unwrap_or_default();
    tracing::debug!(columns = ?header, "Detected header columns");

    let indices = columns
        .resolve(&header)
        .map_err(|missing| SheetbookError::FileFormat {
            path: path.to_path_buf(),
            missing,
        })?;

    let mut records = Vec::new();
    for (offset, row) in rows.enumerate() {
        let cell = |idx: usize| row.get(idx).map(cell_text).unwrap_or_default();

        let created = cell(indices.created);
        let title = cell(indices.title);
        let link = cell(indices.link);
        let content = cell(indices.content);

        if [&created, &title, &link, &content].iter().all(|c| c.is_empty()) {
            // header is row 1, so the first data row is row 2
            tracing::debug!(row = offset + 2, "Skipping blank row");
            continue;
        }

        records.push(Record {
            title: format!("{}{}{}", created, TITLE_SEPARATOR, title),
            link,
            body: strip_html(&content),
        });
    }

    Ok(records)
}

/// Render a cell the way a reader of the sheet would see it
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::DateTime(_) => cell
            .as_datetime()
            .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| cell.to_string()),
        other => other.to_string(),
    }
}
