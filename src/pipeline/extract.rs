//! Text extraction: dispatch on format, decode, and hand back one string.
//!
//! All document libraries here are synchronous and CPU-bound, so the work
//! runs on the blocking pool via `spawn_blocking` and the async runtime
//! keeps serving other requests meanwhile.
//!
//! An empty result is a valid outcome at this layer. Whether blank text is
//! acceptable is decided by the caller (the workflow rejects a blank draft,
//! for example).

use crate::config::{CopierConfig, DocumentFormat};
use crate::error::StyleCopyError;
use crate::pipeline::docx;
use crate::pipeline::input::{check_size, detect_format, StagedUpload, UploadedFile};
use serde::Serialize;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Plain text recovered from one input file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedText {
    pub filename: String,
    pub format: DocumentFormat,
    pub text: String,
}

impl ExtractedText {
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

/// Extract an in-memory upload.
///
/// Validation order: filename/extension, then size, then staging. Nothing
/// touches the disk or a parsing library until both checks have passed.
pub async fn extract_upload(
    upload: &UploadedFile,
    config: &CopierConfig,
) -> Result<ExtractedText, StyleCopyError> {
    let format = detect_format(&upload.filename, &config.supported_formats)?;
    check_size(upload.len(), config.max_upload_bytes)?;

    let staged = StagedUpload::stage(&upload.bytes, format).await?;
    let text = extract_path_as(staged.path(), format).await?;
    drop(staged);

    Ok(ExtractedText {
        filename: upload.filename.clone(),
        format,
        text,
    })
}

/// Extract a file that already lives on disk (CLI inputs).
pub async fn extract_file(
    path: &Path,
    config: &CopierConfig,
) -> Result<ExtractedText, StyleCopyError> {
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let format = detect_format(&filename, &config.supported_formats)?;

    let size = tokio::fs::metadata(path).await?.len();
    check_size(size, config.max_upload_bytes)?;

    let text = extract_path_as(path, format).await?;
    Ok(ExtractedText {
        filename,
        format,
        text,
    })
}

/// Run the blocking extractor for `format` against `path`.
async fn extract_path_as(path: &Path, format: DocumentFormat) -> Result<String, StyleCopyError> {
    let start = Instant::now();
    let path_buf = path.to_path_buf();

    let text = tokio::task::spawn_blocking(move || extract_blocking(&path_buf, format))
        .await
        .map_err(|e| StyleCopyError::Internal(format!("Extraction task failed: {}", e)))??;

    info!(
        "Extracted {} chars from {} file in {}ms",
        text.chars().count(),
        format,
        start.elapsed().as_millis()
    );
    Ok(text)
}

fn extract_blocking(path: &Path, format: DocumentFormat) -> Result<String, StyleCopyError> {
    let read_err = |e: std::io::Error| match format {
        DocumentFormat::Txt => StyleCopyError::DecodeFailed(e.to_string()),
        DocumentFormat::Docx => StyleCopyError::DocxExtraction(e.to_string()),
        DocumentFormat::Pdf => StyleCopyError::PdfExtraction(e.to_string()),
    };
    let bytes = std::fs::read(path).map_err(read_err)?;
    debug!("Read {} bytes from {}", bytes.len(), path.display());

    match format {
        DocumentFormat::Txt => Ok(decode_text(&bytes)),
        DocumentFormat::Docx => docx::extract_docx(&bytes),
        DocumentFormat::Pdf => extract_pdf(&bytes),
    }
}

/// Decode plain text: UTF-8 first, ISO-8859-1 otherwise.
///
/// Every byte sequence is valid ISO-8859-1, so the fallback cannot fail.
pub fn decode_text(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(e) => {
            warn!("Text is not valid UTF-8 ({e}); decoding as ISO-8859-1");
            bytes.iter().map(|&b| char::from(b)).collect()
        }
    }
}

/// Page texts in page order, joined by `\n`.
///
/// pdf-extract can panic on malformed fonts, so the call is isolated with
/// `catch_unwind` and a panic becomes an ordinary extraction error.
pub fn extract_pdf(bytes: &[u8]) -> Result<String, StyleCopyError> {
    let pages = std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem_by_pages(bytes))
        .map_err(|_| {
            StyleCopyError::PdfExtraction("parser panicked; the PDF is likely malformed".into())
        })?
        .map_err(|e| StyleCopyError::PdfExtraction(e.to_string()))?;

    let blank = pages.iter().filter(|p| p.trim().is_empty()).count();
    if blank > 0 {
        debug!("{} of {} PDF pages had no extractable text", blank, pages.len());
    }
    Ok(pages.join("\n"))
}
