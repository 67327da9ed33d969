use crate::error::IngestError;
use lopdf::Document;
use std::path::Path;

/// Returned in place of text when every requested page extracts to nothing.
/// Callers distinguish this (a readable document with no content) from an
/// `Err`, which means the document could not be read at all.
pub const NO_TEXT_EXTRACTED: &str = "No text extracted.";

/// Which pages to pull text from. Page numbers are 1-based, matching what a
/// reader sees; numbers outside the document are skipped, not errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageSelection {
    All,
    Pages(Vec<usize>),
}

impl PageSelection {
    /// Parses `"all"` or a comma-separated 1-based page list such as
    /// `"1,3,5"`.
    pub fn parse(selector: &str) -> Result<Self, IngestError> {
        let trimmed = selector.trim();
        if trimmed.eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }

        let mut pages = Vec::new();
        for part in trimmed.split(',') {
            let number = part.trim().parse::<usize>().map_err(|_| {
                IngestError::InvalidArgument(format!("invalid page selector: {selector}"))
            })?;
            pages.push(number);
        }

        Ok(Self::Pages(pages))
    }
}

pub fn page_count(path: &Path) -> Result<usize, IngestError> {
    if !path.exists() {
        return Err(IngestError::NotFound(path.display().to_string()));
    }

    let document = Document::load(path).map_err(|error| IngestError::PdfParse(error.to_string()))?;
    Ok(document.get_pages().len())
}

/// Extracts plain text from the selected pages. Every non-empty page is
/// prefixed with a `--- Page N ---` marker and followed by a blank line so
/// page-scoped answering stays possible downstream.
pub fn extract_text(path: &Path, selection: &PageSelection) -> Result<String, IngestError> {
    if !path.exists() {
        return Err(IngestError::NotFound(path.display().to_string()));
    }

    let document = Document::load(path).map_err(|error| IngestError::PdfParse(error.to_string()))?;
    let page_count = document.get_pages().len();

    let pages: Vec<u32> = match selection {
        PageSelection::All => (1..=page_count as u32).collect(),
        PageSelection::Pages(numbers) => numbers
            .iter()
            .filter(|number| (1..=page_count).contains(*number))
            .map(|number| *number as u32)
            .collect(),
    };

    let mut extracted = String::new();
    for page_no in pages {
        let page_text = document
            .extract_text(&[page_no])
            .map_err(|error| IngestError::PdfParse(error.to_string()))?;

        let page_text = page_text.trim();
        if !page_text.is_empty() {
            extracted.push_str(&format!("--- Page {page_no} ---\n"));
            extracted.push_str(page_text);
            extracted.push_str("\n\n");
        }
    }

    let extracted = extracted.trim();
    if extracted.is_empty() {
        Ok(NO_TEXT_EXTRACTED.to_string())
    } else {
        Ok(extracted.to_string())
    }
}
