//! Document assembly
//!
//! Records become a [`DigestDocument`]: a table of contents followed by one
//! section per record. The model is handed to the digest Typst template as
//! `sys.inputs.document` and laid out in a single compile.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;
use typst_engine::{compile_pdf, EngineError, FontCache, RenderedPdf};

use crate::error::{Result, SheetbookError};
use crate::extract::Record;

/// Digest layout template - loaded from templates/digest.typ
const DIGEST_TEMPLATE: &str = include_str!("../templates/digest.typ");

/// Paper size of every generated document
pub const PAPER: &str = "a4";

/// How page numbers are printed in the table of contents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TocNumbering {
    /// The page each section actually lands on after layout
    #[default]
    Resolved,
    /// The 1-based position of the section, regardless of layout
    SectionIndex,
}

impl FromStr for TocNumbering {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "resolved" => Ok(TocNumbering::Resolved),
            "section-index" | "index" => Ok(TocNumbering::SectionIndex),
            other => Err(format!("Unknown TOC numbering: {}", other)),
        }
    }
}

/// Presentation settings that do not come from the records
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutOptions {
    /// PDF document title
    pub title: String,
    /// Text of the title block above the table of contents
    pub toc_title: String,
    pub numbering: TocNumbering,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            title: "Digest".to_string(),
            toc_title: "Table of Contents".to_string(),
            numbering: TocNumbering::default(),
        }
    }
}

/// One page-aligned section of the document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    /// 0-based position among sections
    pub index: usize,
    pub heading: String,
    pub link: String,
    /// Non-empty, trimmed body lines in order
    pub paragraphs: Vec<String>,
    /// Label the section is reachable under
    pub anchor: String,
}

/// A table of contents entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TocEntry {
    pub level: u8,
    pub text: String,
    /// 1-based position of the section among sections
    pub destination: usize,
    pub anchor: String,
}

/// The full document model
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DigestDocument {
    pub title: String,
    pub toc_title: String,
    /// Font family every styled text block uses
    pub font: String,
    pub paper: String,
    pub numbering: TocNumbering,
    pub toc: Vec<TocEntry>,
    pub sections: Vec<Section>,
}

/// Anchor label of the section at `index`
pub fn anchor_for(index: usize) -> String {
    format!("section-{}", index)
}

/// Split a body into paragraphs: one per line, blank lines dropped
pub fn split_paragraphs(body: &str) -> Vec<String> {
    body.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

impl DigestDocument {
    /// Assemble the document model from records, in record order
    pub fn from_records(records: &[Record], layout: &LayoutOptions, font: &str) -> Self {
        let mut toc = Vec::with_capacity(records.len());
        let mut sections = Vec::with_capacity(records.len());

        for (index, record) in records.iter().enumerate() {
            let anchor = anchor_for(index);

            sections.push(Section {
                index,
                heading: record.title.clone(),
                link: record.link.clone(),
                paragraphs: split_paragraphs(&record.body),
                anchor: anchor.clone(),
            });

            toc.push(TocEntry {
                level: 0,
                text: record.title.clone(),
                destination: index + 1,
                anchor,
            });
        }

        Self {
            title: layout.title.clone(),
            toc_title: layout.toc_title.clone(),
            font: font.to_string(),
            paper: PAPER.to_string(),
            numbering: layout.numbering,
            toc,
            sections,
        }
    }

    /// Lay out and export the document to PDF in one pass.
    ///
    /// `fonts` must contain the family named by `self.font`.
    pub fn render(&self, fonts: FontCache, time: DateTime<Utc>) -> Result<RenderedPdf> {
        if !fonts.has_family(&self.font) {
            return Err(SheetbookError::FontLoad {
                path: self.font.clone(),
                reason: "font family is not registered".to_string(),
            });
        }

        let document = serde_json::to_value(self)
            .map_err(|e| SheetbookError::Render(EngineError::InvalidInput(e.to_string())))?;
        let mut inputs = serde_json::Map::new();
        inputs.insert("document".to_string(), document);

        let rendered = compile_pdf(DIGEST_TEMPLATE.to_string(), inputs, fonts, time)?;
        tracing::info!(
            "Rendered {} sections onto {} pages",
            self.sections.len(),
            rendered.page_count()
        );
        Ok(rendered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    /// A family shipped with the embedded fonts
    fn embedded_family() -> String {
        FontCache::new()
            .list_font_families()
            .into_iter()
            .find(|family| family.contains("Libertinus"))
            .expect("typst-assets ships Libertinus")
    }

    fn record(title: &str, link: &str, body: &str) -> Record {
        Record {
            title: title.to_string(),
            link: link.to_string(),
            body: body.to_string(),
        }
    }

    #[test]
    fn test_split_paragraphs_drops_blank_lines() {
        assert_eq!(
            split_paragraphs("Line1\n\nLine2\n  \nLine3"),
            vec!["Line1", "Line2", "Line3"]
        );
    }

    #[test]
    fn test_split_paragraphs_handles_crlf_and_padding() {
        assert_eq!(
            split_paragraphs("  first \r\n\r\n\tsecond\r\n"),
            vec!["first", "second"]
        );
        assert!(split_paragraphs("").is_empty());
        assert!(split_paragraphs(" \n \n").is_empty());
    }

    #[test]
    fn test_toc_matches_sections() {
        let records = vec![
            record("2024-01-01 - A", "https://a", "alpha"),
            record("2024-01-02 - B", "ref-b", "beta\n\ngamma"),
        ];

        let doc = DigestDocument::from_records(&records, &LayoutOptions::default(), "Serif");

        assert_eq!(
            doc.toc,
            vec![
                TocEntry {
                    level: 0,
                    text: "2024-01-01 - A".to_string(),
                    destination: 1,
                    anchor: "section-0".to_string(),
                },
                TocEntry {
                    level: 0,
                    text: "2024-01-02 - B".to_string(),
                    destination: 2,
                    anchor: "section-1".to_string(),
                },
            ]
        );
        assert_eq!(doc.sections[1].paragraphs, vec!["beta", "gamma"]);
        assert_eq!(doc.sections[1].link, "ref-b");
        assert_eq!(doc.paper, "a4");
    }

    #[test]
    fn test_numbering_parse_and_serialize() {
        assert_eq!("resolved".parse::<TocNumbering>(), Ok(TocNumbering::Resolved));
        assert_eq!(
            "Section-Index".parse::<TocNumbering>(),
            Ok(TocNumbering::SectionIndex)
        );
        assert!("pages".parse::<TocNumbering>().is_err());
        assert_eq!(
            serde_json::to_value(TocNumbering::SectionIndex).unwrap(),
            serde_json::json!("section-index")
        );
    }

    #[test]
    fn test_render_unknown_family_is_font_error() {
        let doc = DigestDocument::from_records(
            &[record("t", "l", "b")],
            &LayoutOptions::default(),
            "No Such Family",
        );

        let err = doc.render(FontCache::new(), Utc::now()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FontLoad);
    }

    #[test]
    fn test_render_one_page_per_section() {
        let records = vec![
            record("Aardvark heading", "https://example.com/a", "<b>not markup</b>"),
            record("Bumblebee heading", "plain-reference", "Line1\n\nLine2\n  \nLine3"),
            record("Chameleon heading", "", ""),
        ];
        let doc =
            DigestDocument::from_records(&records, &LayoutOptions::default(), &embedded_family());

        let rendered = doc.render(FontCache::new(), Utc::now()).unwrap();

        assert!(rendered.bytes.starts_with(b"%PDF"));
        assert_eq!(rendered.page_count(), records.len() + 1);

        let toc = &rendered.pages[0].text;
        assert!(toc.contains("Contents"));
        for (i, word) in ["Aardvark", "Bumblebee", "Chameleon"].iter().enumerate() {
            assert!(toc.contains(word), "TOC should list {word}");
            assert_eq!(
                rendered.pages[i + 1].text.matches(word).count(),
                1,
                "section {i} should be alone on page {}",
                i + 2
            );
        }
        assert!(rendered.pages[2].text.contains("Line3"));
    }

    #[test]
    fn test_render_without_records_is_single_page() {
        let doc = DigestDocument::from_records(&[], &LayoutOptions::default(), &embedded_family());

        let rendered = doc.render(FontCache::new(), Utc::now()).unwrap();
        assert_eq!(rendered.page_count(), 1);
    }

    /// Page number printed after `title` in the table of contents
    fn toc_number(toc: &str, title: &str) -> Option<usize> {
        let words: Vec<&str> = toc.split_whitespace().collect();
        let at = words.iter().position(|word| *word == title)?;
        words[at + 1..].iter().find_map(|word| word.parse().ok())
    }

    /// First page after `skip` pages whose text contains `word`
    fn page_of(rendered: &RenderedPdf, skip: usize, word: &str) -> Option<usize> {
        rendered
            .pages
            .iter()
            .skip(skip)
            .find(|page| page.text.split_whitespace().any(|w| w == word))
            .map(|page| page.number)
    }

    fn long_and_short(numbering: TocNumbering) -> RenderedPdf {
        let long_body = vec!["filler paragraph text"; 80].join("\n");
        let records = vec![
            record("Alpha", "https://example.com/alpha", &long_body),
            record("Omega", "https://example.com/omega", "short"),
        ];
        let layout = LayoutOptions {
            numbering,
            ..LayoutOptions::default()
        };
        DigestDocument::from_records(&records, &layout, &embedded_family())
            .render(FontCache::new(), Utc::now())
            .unwrap()
    }

    #[test]
    fn test_resolved_numbering_prints_true_pages() {
        let rendered = long_and_short(TocNumbering::Resolved);

        let omega_page = page_of(&rendered, 1, "Omega").unwrap();
        assert!(omega_page > 3, "long section should spill over several pages");

        let toc = &rendered.pages[0].text;
        assert_eq!(toc_number(toc, "Alpha"), Some(2));
        assert_eq!(toc_number(toc, "Omega"), Some(omega_page));
    }

    #[test]
    fn test_section_index_numbering_prints_positions() {
        let rendered = long_and_short(TocNumbering::SectionIndex);

        assert!(page_of(&rendered, 1, "Omega").unwrap() > 3);

        let toc = &rendered.pages[0].text;
        assert_eq!(toc_number(toc, "Alpha"), Some(1));
        assert_eq!(toc_number(toc, "Omega"), Some(2));
    }

    #[test]
    fn test_multi_page_toc_offsets_sections() {
        let titles: Vec<String> = (0..70).map(|i| format!("Entry{:03}x", i)).collect();
        let records: Vec<Record> = titles.iter().map(|t| record(t, "l", "body")).collect();
        let doc =
            DigestDocument::from_records(&records, &LayoutOptions::default(), &embedded_family());

        let rendered = doc.render(FontCache::new(), Utc::now()).unwrap();

        let toc_pages = rendered.page_count() - records.len();
        assert!(toc_pages >= 2, "70 entries should not fit on one page");

        let toc = rendered.pages[..toc_pages]
            .iter()
            .map(|page| page.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        for (i, title) in titles.iter().enumerate() {
            let expected = toc_pages + 1 + i;
            assert_eq!(page_of(&rendered, toc_pages, title), Some(expected));
            assert_eq!(toc_number(&toc, title), Some(expected), "TOC entry for {title}");
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn split_paragraphs_are_trimmed_and_non_empty(body in "[a-z \t\n]{0,80}") {
            for paragraph in split_paragraphs(&body) {
                prop_assert!(!paragraph.is_empty());
                prop_assert_eq!(paragraph.trim(), paragraph.as_str());
                prop_assert!(!paragraph.contains('\n'));
            }
        }

        #[test]
        fn sections_follow_record_order(titles in proptest::collection::vec("[A-Za-z0-9 ]{1,20}", 0..20)) {
            let records: Vec<Record> = titles
                .iter()
                .map(|t| record(t, "link", "body"))
                .collect();

            let doc = DigestDocument::from_records(&records, &LayoutOptions::default(), "Serif");

            prop_assert_eq!(doc.sections.len(), records.len());
            prop_assert_eq!(doc.toc.len(), records.len());
            for (i, (section, entry)) in doc.sections.iter().zip(&doc.toc).enumerate() {
                prop_assert_eq!(&section.heading, &titles[i]);
                prop_assert_eq!(&entry.text, &titles[i]);
                prop_assert_eq!(entry.destination, i + 1);
                prop_assert_eq!(&section.anchor, &entry.anchor);
            }
        }
    }
}
