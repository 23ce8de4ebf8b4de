//! Paginated document access and page-by-page text extraction.
use std::path::Path;

use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum DocumentError {
    /// The whole document could not be opened or parsed.
    #[error("failed to load document {path}: {reason}")]
    Load { path: String, reason: String },

    /// A single page could not be read.
    #[error("failed to extract text from page {page}: {reason}")]
    Extraction { page: usize, reason: String },
}

/// A document made of pages that can be read one at a time.
pub trait PagedDocument {
    fn page_count(&self) -> usize;

    /// Text of the page at 0-based `index`.
    fn page_text(&self, index: usize) -> Result<String, DocumentError>;
}

/// A PDF file parsed with `lopdf`.
pub struct PdfDocument {
    inner: lopdf::Document,
    /// 1-based page numbers in page order.
    page_numbers: Vec<u32>,
}

impl PdfDocument {
    pub fn open(path: &Path) -> Result<Self, DocumentError> {
        let inner = lopdf::Document::load(path).map_err(|e| DocumentError::Load {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        // BTreeMap keys come back sorted
        let page_numbers: Vec<u32> = inner.get_pages().keys().copied().collect();
        debug!("Opened {} ({} pages)", path.display(), page_numbers.len());

        Ok(Self {
            inner,
            page_numbers,
        })
    }
}

impl PagedDocument for PdfDocument {
    fn page_count(&self) -> usize {
        self.page_numbers.len()
    }

    fn page_text(&self, index: usize) -> Result<String, DocumentError> {
        let number = *self
            .page_numbers
            .get(index)
            .ok_or_else(|| DocumentError::Extraction {
                page: index,
                reason: "no such page".to_string(),
            })?;

        self.inner
            .extract_text(&[number])
            .map_err(|e| DocumentError::Extraction {
                page: index,
                reason: e.to_string(),
            })
    }
}

/// Concatenate the text of every page from `skip_pages` on.
///
/// Each non-empty page is followed by a newline. Unreadable pages are
/// logged and skipped.
pub fn extract_text<D: PagedDocument + ?Sized>(document: &D, skip_pages: usize) -> String {
    let mut text = String::new();

    for index in skip_pages..document.page_count() {
        match document.page_text(index) {
            Ok(page) if page.is_empty() => {}
            Ok(page) => {
                text.push_str(&page);
                text.push('\n');
            }
            Err(e) => warn!("Skipping page {index}: {e}"),
        }
    }

    text
}
