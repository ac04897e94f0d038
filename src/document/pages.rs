//! Page counting and page text
//!
//! Rasterisation belongs to an external renderer; this seam only answers how
//! many pages a document has and, for plain text, what is on each page.

use regex::bytes::Regex;
use std::sync::LazyLock;

use super::source::{DocumentKind, LoadedDocument};

pub const LINES_PER_TEXT_PAGE: usize = 60;

// Matches `/Type /Page` but not `/Type /Pages`
static PDF_PAGE_OBJECT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/Type\s*/Page(?:[^s]|$)").expect("page object pattern is valid")
});

pub trait PageSource {
    fn page_count(&self, doc: &LoadedDocument) -> usize;

    /// Text runs of `page` (1-based), or `None` when the page is not text.
    fn page_text(&self, doc: &LoadedDocument, page: usize) -> Option<Vec<String>>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct BuiltinPages;

impl BuiltinPages {
    fn text_pages(doc: &LoadedDocument) -> Vec<Vec<String>> {
        let text = String::from_utf8_lossy(&doc.bytes);
        if text.contains('\x0c') {
            return text
                .split('\x0c')
                .map(|page| page.lines().map(str::to_string).collect())
                .collect();
        }

        let lines: Vec<String> = text.lines().map(str::to_string).collect();
        if lines.is_empty() {
            return vec![Vec::new()];
        }
        lines
            .chunks(LINES_PER_TEXT_PAGE)
            .map(|chunk| chunk.to_vec())
            .collect()
    }
}

impl PageSource for BuiltinPages {
    fn page_count(&self, doc: &LoadedDocument) -> usize {
        match doc.kind {
            DocumentKind::Pdf => PDF_PAGE_OBJECT.find_iter(&doc.bytes).count().max(1),
            DocumentKind::Txt => Self::text_pages(doc).len(),
            DocumentKind::Docx | DocumentKind::Doc | DocumentKind::Jpg | DocumentKind::Png => 1,
        }
    }

    fn page_text(&self, doc: &LoadedDocument, page: usize) -> Option<Vec<String>> {
        if !doc.kind.is_text() || page == 0 {
            return None;
        }
        Self::text_pages(doc).into_iter().nth(page - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DocumentSource;

    fn load(name: &str, bytes: &[u8]) -> LoadedDocument {
        let mut source = DocumentSource::new();
        source.load_bytes(name, bytes.to_vec()).unwrap().clone()
    }

    #[test]
    fn pdf_pages_ignore_page_tree_nodes() {
        let pdf = b"%PDF-1.4\n1 0 obj << /Type /Pages /Count 3 >> endobj\n\
            2 0 obj << /Type /Page >> endobj\n3 0 obj << /Type/Page >> endobj\n\
            4 0 obj << /Type /Page /Parent 1 0 R >> endobj";
        let doc = load("three.pdf", pdf);
        assert_eq!(BuiltinPages.page_count(&doc), 3);
    }

    #[test]
    fn unparseable_pdf_has_one_page() {
        let doc = load("broken.pdf", b"garbage");
        assert_eq!(BuiltinPages.page_count(&doc), 1);
    }

    #[test]
    fn text_pages_split_on_form_feed() {
        let doc = load("notes.txt", b"first\nline\x0csecond\x0cthird");
        assert_eq!(BuiltinPages.page_count(&doc), 3);
        assert_eq!(
            BuiltinPages.page_text(&doc, 1).unwrap(),
            vec!["first".to_string(), "line".to_string()]
        );
        assert_eq!(BuiltinPages.page_text(&doc, 3).unwrap(), vec!["third"]);
        assert!(BuiltinPages.page_text(&doc, 4).is_none());
    }

    #[test]
    fn long_text_is_paginated_by_line_count() {
        let body = (0..(LINES_PER_TEXT_PAGE * 2 + 1))
            .map(|i| format!("line {i}"))
            .collect::<Vec<_>>()
            .join("\n");
        let doc = load("long.txt", body.as_bytes());
        assert_eq!(BuiltinPages.page_count(&doc), 3);
    }

    #[test]
    fn images_are_single_page_without_text() {
        let doc = load("photo.png", &[0x89, b'P', b'N', b'G']);
        assert_eq!(BuiltinPages.page_count(&doc), 1);
        assert!(BuiltinPages.page_text(&doc, 1).is_none());
    }
}
