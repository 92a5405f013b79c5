//! PDF validation and text extraction
//!
//! Uses lopdf to parse documents, enforce structural bounds, and extract
//! text page by page. Page numbers are zero-based everywhere outside lopdf,
//! matching chunk ids.

use crate::error::{Error, Result};
use lopdf::{Document, Object};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Structural summary produced by upload validation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PdfSummary {
    /// Total number of pages
    pub page_count: usize,

    /// Document title from the Info dictionary, if present
    pub title: Option<String>,

    /// Document author from the Info dictionary, if present
    pub author: Option<String>,
}

/// Text of a single page, paired with its zero-based page number
#[derive(Debug, Clone)]
pub struct PageText {
    pub page_number: u32,
    pub text: String,
}

/// Validate a PDF before acceptance.
///
/// The file must parse, contain between 1 and `max_pages` pages, and its
/// first page must yield non-empty text. Anything else is a corrupted-input
/// failure the uploader can act on.
pub fn validate_pdf(bytes: &[u8], max_pages: usize) -> Result<PdfSummary> {
    let doc = Document::load_mem(bytes)
        .map_err(|e| Error::Corrupted(format!("Invalid or corrupted PDF file: {}", e)))?;

    let pages = doc.get_pages();
    let page_count = pages.len();

    if page_count == 0 {
        return Err(Error::Corrupted("PDF file contains no pages".to_string()));
    }
    if page_count > max_pages {
        return Err(Error::Corrupted(format!(
            "PDF file too large (max {} pages)",
            max_pages
        )));
    }

    let first_page = *pages.keys().next().expect("page map is non-empty");
    let first_text = doc
        .extract_text(&[first_page])
        .map_err(|e| Error::Corrupted(format!("Failed to read first page: {}", e)))?;
    if first_text.trim().is_empty() {
        return Err(Error::Corrupted(
            "First page contains no extractable text".to_string(),
        ));
    }

    Ok(PdfSummary {
        page_count,
        title: info_string(&doc, b"Title"),
        author: info_string(&doc, b"Author"),
    })
}

/// Extract text for every page of a PDF.
///
/// Pages that individually fail extraction are skipped with a warning rather
/// than failing the whole document; empty pages are dropped. An unparseable
/// file is an extraction fault (retryable), not a corruption fault, because
/// the document already passed upload validation.
pub fn extract_pages(bytes: &[u8]) -> Result<Vec<PageText>> {
    let doc = Document::load_mem(bytes)
        .map_err(|e| Error::Extraction(format!("Failed to read PDF file: {}", e)))?;

    let pages = doc.get_pages();
    let total = pages.len();
    debug!("Extracting text from {} pages", total);

    let mut out = Vec::with_capacity(total);
    for (i, page_no) in pages.keys().enumerate() {
        match doc.extract_text(&[*page_no]) {
            Ok(text) => {
                if !text.trim().is_empty() {
                    out.push(PageText {
                        page_number: i as u32,
                        text,
                    });
                }
            }
            Err(e) => {
                warn!("Error extracting page {}: {}", i, e);
            }
        }
    }

    Ok(out)
}

/// Read a string entry from the trailer Info dictionary, tolerantly.
fn info_string(doc: &Document, key: &[u8]) -> Option<String> {
    let info = doc.trailer.get(b"Info").ok()?;
    let dict = match info {
        Object::Reference(id) => doc.get_object(*id).ok()?.as_dict().ok()?,
        Object::Dictionary(d) => d,
        _ => return None,
    };
    let bytes = dict.get(key).ok()?.as_str().ok()?;
    let value = String::from_utf8_lossy(bytes).trim().to_string();
    (!value.is_empty()).then_some(value)
}

#[cfg(test)]
pub mod test_pdf {
    //! PDF fixture builder shared by unit and integration tests.

    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Document, Object, Stream};

    /// Build a small valid PDF with one page per entry in `pages`.
    /// Empty entries become pages with no text operators.
    pub fn sample_pdf(pages: &[&str]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids: Vec<Object> = Vec::new();
        for text in pages {
            let mut operations = vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![50.into(), 700.into()]),
            ];
            if !text.is_empty() {
                operations.push(Operation::new("Tj", vec![Object::string_literal(*text)]));
            }
            operations.push(Operation::new("ET", vec![]));

            let content = Content { operations };
            let content_id =
                doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();
        buf
    }
}
