//! Request and response bodies for the HTTP API.

use crate::config::DocumentFormat;
use crate::pipeline::extract::ExtractedText;
use crate::workflow::AiServiceHealth;
use serde::{Deserialize, Serialize};

/// Success envelope: `{"success": true, "data": {...}, "message": "..."}`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    pub message: String,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data,
            message: message.into(),
        }
    }
}

// ── Requests ─────────────────────────────────────────────────────────────
//
// Missing fields default to empty so the workflow, not serde, reports them.

#[derive(Debug, Deserialize)]
pub struct AnalyzeStyleRequest {
    #[serde(default)]
    pub reference_articles: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct EditContentRequest {
    #[serde(default)]
    pub draft_content: String,
    #[serde(default)]
    pub style_guide: String,
}

#[derive(Debug, Deserialize)]
pub struct GenerateEditRequest {
    #[serde(default)]
    pub reference_articles: Vec<String>,
    #[serde(default)]
    pub draft_content: String,
}

// ── Responses ────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct ExtractTextData {
    pub text: String,
    pub filename: String,
    pub format: DocumentFormat,
    pub char_count: usize,
}

impl From<ExtractedText> for ExtractTextData {
    fn from(e: ExtractedText) -> Self {
        let char_count = e.char_count();
        Self {
            text: e.text,
            filename: e.filename,
            format: e.format,
            char_count,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StyleGuideData {
    pub style_guide: String,
}

#[derive(Debug, Serialize)]
pub struct EditedContentData {
    pub edited_content: String,
}

#[derive(Debug, Serialize)]
pub struct GeneratedEditData {
    pub edited_article: String,
    pub style_guide: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub ai_service: AiServiceHealth,
    pub supported_formats: Vec<&'static str>,
}
