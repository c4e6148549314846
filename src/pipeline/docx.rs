//! `.docx` text extraction.
//!
//! Two strategies, tried in order:
//!
//! 1. **Structured**: parse the package with docx-rs and emit one line per
//!    body paragraph, in document order.
//! 2. **Raw XML**: used only when docx-rs rejects the file. Open the zip
//!    container directly, read `word/document.xml`, and join every text node
//!    with single spaces. Paragraph boundaries are lost; the result is still
//!    good enough to feed a style analysis.

use crate::error::StyleCopyError;
use docx_rs::{DocumentChild, ParagraphChild, RunChild};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::{Cursor, Read};
use tracing::{debug, warn};

const MAIN_DOCUMENT_PART: &str = "word/document.xml";

/// Extract plain text from `.docx` bytes.
pub fn extract_docx(bytes: &[u8]) -> Result<String, StyleCopyError> {
    match extract_paragraphs(bytes) {
        Ok(text) => Ok(text),
        Err(primary) => {
            warn!("docx-rs could not read document ({primary}); falling back to raw XML");
            extract_raw_xml(bytes).map_err(|fallback| {
                StyleCopyError::DocxExtraction(format!("{fallback} (structured reader: {primary})"))
            })
        }
    }
}

/// Structured strategy: body paragraphs joined by `\n`.
pub fn extract_paragraphs(bytes: &[u8]) -> Result<String, String> {
    let docx = docx_rs::read_docx(bytes).map_err(|e| e.to_string())?;

    let paragraphs: Vec<String> = docx
        .document
        .children
        .iter()
        .filter_map(|child| match child {
            DocumentChild::Paragraph(para) => Some(paragraph_text(para)),
            _ => None,
        })
        .collect();

    debug!("docx-rs read {} paragraphs", paragraphs.len());
    Ok(paragraphs.join("\n"))
}

fn paragraph_text(para: &docx_rs::Paragraph) -> String {
    let mut out = String::new();
    for child in &para.children {
        match child {
            ParagraphChild::Run(run) => push_run(run, &mut out),
            ParagraphChild::Hyperlink(link) => {
                for inner in &link.children {
                    if let ParagraphChild::Run(run) = inner {
                        push_run(run, &mut out);
                    }
                }
            }
            _ => {}
        }
    }
    out
}

fn push_run(run: &docx_rs::Run, out: &mut String) {
    for child in &run.children {
        match child {
            RunChild::Text(t) => out.push_str(&t.text),
            RunChild::Tab(_) => out.push('\t'),
            RunChild::Break(_) => out.push('\n'),
            _ => {}
        }
    }
}

/// Fallback strategy: every non-blank text node of the main part, space-joined.
pub fn extract_raw_xml(bytes: &[u8]) -> Result<String, String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).map_err(|e| e.to_string())?;
    let mut xml = String::new();
    archive
        .by_name(MAIN_DOCUMENT_PART)
        .map_err(|e| format!("{MAIN_DOCUMENT_PART}: {e}"))?
        .read_to_string(&mut xml)
        .map_err(|e| e.to_string())?;

    let mut reader = Reader::from_str(&xml);
    let mut parts: Vec<String> = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Text(t)) => {
                let text = t.unescape().map_err(|e| e.to_string())?;
                if !text.trim().is_empty() {
                    parts.push(text.into_owned());
                }
            }
            Ok(Event::CData(c)) => {
                let text = String::from_utf8_lossy(&c.into_inner()).into_owned();
                if !text.trim().is_empty() {
                    parts.push(text);
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(format!(
                    "malformed XML at byte {}: {e}",
                    reader.buffer_position()
                ))
            }
        }
    }

    debug!("raw XML walk found {} text nodes", parts.len());
    Ok(parts.join(" "))
}
