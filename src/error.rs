//! Error types for the style-copier library.
//!
//! Every core operation fails fast with exactly one [`StyleCopyError`]. There
//! is no partial success: a bad reference file aborts the batch, and a failed
//! style analysis means the editing step never runs.
//!
//! Callers that need to react to *kinds* of failure rather than individual
//! variants use [`StyleCopyError::class`], which folds the variants into the
//! small [`ErrorClass`] taxonomy:
//!
//! * [`ErrorClass::ClientInput`]: the request or the uploaded file is at
//!   fault (missing references, unsupported extension, corrupt document).
//! * [`ErrorClass::ServiceUnavailable`]: the generation endpoint cannot be
//!   reached, or reports that it is still loading.
//! * [`ErrorClass::Timeout`]: the endpoint accepted the call but did not
//!   answer within the configured bound.
//! * [`ErrorClass::Upstream`]: the endpoint answered with a non-success
//!   status or an unusable body.
//! * [`ErrorClass::Processing`] / [`ErrorClass::Internal`]: anything else.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// All errors returned by the style-copier library.
#[derive(Debug, Error)]
pub enum StyleCopyError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The upload carried no filename, so the format cannot be inferred.
    #[error("Uploaded file has no filename; cannot infer its format")]
    MissingFilename,

    /// The extension is not in the configured supported set.
    #[error("Unsupported file format for '{filename}'. Supported: {supported}")]
    UnsupportedFormat { filename: String, supported: String },

    /// The upload exceeds the configured size ceiling.
    #[error("File too large ({size} bytes). Maximum size: {}MB", .limit / (1024 * 1024))]
    FileTooLarge { size: u64, limit: u64 },

    /// A `.txt` upload could not be decoded with either encoding.
    #[error("Failed to read text file: {0}")]
    DecodeFailed(String),

    /// Both `.docx` strategies failed.
    #[error("Failed to extract text from DOCX: {0}")]
    DocxExtraction(String),

    /// The PDF could not be parsed.
    #[error("Failed to extract text from PDF: {0}")]
    PdfExtraction(String),

    /// The reference set was empty.
    #[error("No reference articles provided")]
    NoReferences,

    /// The draft was empty or whitespace-only.
    #[error("No draft content provided")]
    EmptyDraft,

    /// The style guide handed to the editing step was empty.
    #[error("Missing style guide")]
    EmptyStyleGuide,

    // ── Generation endpoint errors ────────────────────────────────────────
    /// The endpoint refused the connection or could not be resolved.
    #[error("Could not connect to the AI service at {url}. Make sure Ollama is running ('ollama serve').")]
    ServiceUnavailable { url: String },

    /// The endpoint reported 503, which Ollama uses while a model is loading.
    #[error("AI service is starting up, try again shortly: {body}")]
    ServiceStarting { body: String },

    /// The call exceeded the configured wait bound.
    #[error("AI request timed out after {secs}s. Try reducing the size of the input.")]
    Timeout { secs: u64 },

    /// The endpoint answered with a non-success status.
    #[error("AI API error: {status} - {body}")]
    UpstreamStatus { status: u16, body: String },

    /// The endpoint answered 200 but the `response` field was missing or blank.
    #[error("AI service returned an empty response during {stage}")]
    EmptyResponse { stage: String },

    /// Any other transport failure, original message preserved.
    #[error("AI processing error: {0}")]
    Processing(String),

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Staging the upload or reading an input file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse classification of a [`StyleCopyError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    ClientInput,
    ServiceUnavailable,
    Timeout,
    Upstream,
    Processing,
    Internal,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorClass::ClientInput => "client_input",
            ErrorClass::ServiceUnavailable => "service_unavailable",
            ErrorClass::Timeout => "timeout",
            ErrorClass::Upstream => "upstream",
            ErrorClass::Processing => "processing",
            ErrorClass::Internal => "internal",
        };
        f.write_str(s)
    }
}

impl StyleCopyError {
    /// Fold this error into its [`ErrorClass`].
    pub fn class(&self) -> ErrorClass {
        match self {
            StyleCopyError::MissingFilename
            | StyleCopyError::UnsupportedFormat { .. }
            | StyleCopyError::FileTooLarge { .. }
            | StyleCopyError::DecodeFailed(_)
            | StyleCopyError::DocxExtraction(_)
            | StyleCopyError::PdfExtraction(_)
            | StyleCopyError::NoReferences
            | StyleCopyError::EmptyDraft
            | StyleCopyError::EmptyStyleGuide => ErrorClass::ClientInput,
            StyleCopyError::ServiceUnavailable { .. } | StyleCopyError::ServiceStarting { .. } => {
                ErrorClass::ServiceUnavailable
            }
            StyleCopyError::Timeout { .. } => ErrorClass::Timeout,
            StyleCopyError::UpstreamStatus { .. } | StyleCopyError::EmptyResponse { .. } => {
                ErrorClass::Upstream
            }
            StyleCopyError::Processing(_) => ErrorClass::Processing,
            StyleCopyError::InvalidConfig(_)
            | StyleCopyError::Io(_)
            | StyleCopyError::Internal(_) => ErrorClass::Internal,
        }
    }

    /// True when the caller, not the server or the endpoint, is at fault.
    pub fn is_client_error(&self) -> bool {
        self.class() == ErrorClass::ClientInput
    }
}
