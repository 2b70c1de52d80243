//! Rendered output and per-page text inspection

use typst::layout::{Frame, FrameItem};
use typst::model::Document;

/// A compiled and exported PDF
#[derive(Debug, Clone)]
pub struct RenderedPdf {
    /// The PDF file contents
    pub bytes: Vec<u8>,
    /// Laid-out text of every page, in page order
    pub pages: Vec<PageText>,
}

impl RenderedPdf {
    /// Number of pages in the document
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// 1-based number of the first page whose text contains `needle`
    #[cfg(test)]
    pub fn find_page(&self, needle: &str) -> Option<usize> {
        self.pages
            .iter()
            .find(|page| page.text.contains(needle))
            .map(|page| page.number)
    }
}

/// Plain text laid out on one page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageText {
    /// 1-based physical page number
    pub number: usize,
    /// Text runs on the page, separated by single spaces
    pub text: String,
}

/// Collect the text runs of every page of a compiled document
pub(crate) fn page_texts(document: &Document) -> Vec<PageText> {
    document
        .pages
        .iter()
        .enumerate()
        .map(|(idx, page)| {
            let mut runs = Vec::new();
            collect_runs(&page.frame, &mut runs);
            PageText {
                number: idx + 1,
                text: runs.join(" "),
            }
        })
        .collect()
}

fn collect_runs(frame: &Frame, runs: &mut Vec<String>) {
    for (_, item) in frame.items() {
        match item {
            FrameItem::Group(group) => collect_runs(&group.frame, runs),
            FrameItem::Text(text) => runs.push(text.text.to_string()),
            _ => {}
        }
    }
}
