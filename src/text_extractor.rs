//! Raw text extraction for text-native resume formats (PDF, DOCX).

use std::path::Path;

use tracing::{debug, warn};

use crate::error::ExtractionError;
use crate::extractor::DocumentKind;

/// Extract raw text from a PDF or DOCX file.
///
/// Image kinds have no text layer and are rejected with `UnsupportedType`.
pub fn extract_text(path: &Path, kind: DocumentKind) -> Result<String, ExtractionError> {
    match kind {
        DocumentKind::Pdf => extract_pdf_text(path),
        DocumentKind::Docx => extract_docx_text(path),
        DocumentKind::Image => Err(ExtractionError::UnsupportedType(kind.as_str().to_string())),
    }
}

/// Extract text from a PDF file using lopdf, one line block per page.
///
/// A page that fails to extract contributes an empty line.
fn extract_pdf_text(path: &Path) -> Result<String, ExtractionError> {
    use lopdf::Document;

    let doc = Document::load(path).map_err(|e| ExtractionError::document("pdf", e))?;

    let mut text = String::new();
    for (page_num, _) in doc.get_pages() {
        match doc.extract_text(&[page_num]) {
            Ok(content) => text.push_str(&content),
            Err(e) => warn!("PDF page {} of {:?} yielded no text: {}", page_num, path, e),
        }
        text.push('\n');
    }

    debug!("Extracted {} chars from PDF {:?}", text.len(), path);
    Ok(text)
}

/// Extract paragraph text from a DOCX file, newline separated in document order.
fn extract_docx_text(path: &Path) -> Result<String, ExtractionError> {
    use docx_rs::DocumentChild;

    let data = std::fs::read(path).map_err(|e| ExtractionError::document("docx", e))?;
    let docx = docx_rs::read_docx(&data).map_err(|e| ExtractionError::document("docx", e))?;

    let paragraphs: Vec<String> = docx
        .document
        .children
        .iter()
        .filter_map(|child| match child {
            DocumentChild::Paragraph(para) => {
                let mut line = String::new();
                push_paragraph_text(&para.children, &mut line);
                Some(line)
            }
            _ => None,
        })
        .collect();

    debug!("Extracted {} paragraphs from DOCX {:?}", paragraphs.len(), path);
    Ok(paragraphs.join("\n"))
}

/// Append run text, descending into hyperlinks.
fn push_paragraph_text(children: &[docx_rs::ParagraphChild], line: &mut String) {
    use docx_rs::{ParagraphChild, RunChild};

    for pc in children {
        match pc {
            ParagraphChild::Run(run) => {
                for rc in &run.children {
                    match rc {
                        RunChild::Text(t) => line.push_str(&t.text),
                        RunChild::Tab(_) => line.push('\t'),
                        RunChild::Break(_) => line.push('\n'),
                        _ => {}
                    }
                }
            }
            ParagraphChild::Hyperlink(link) => push_paragraph_text(&link.children, line),
            _ => {}
        }
    }
}
