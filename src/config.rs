//! Configuration types for style analysis, editing and extraction.
//!
//! All behaviour is controlled through [`CopierConfig`], built once at
//! process start via [`CopierConfigBuilder`] and treated as read-only
//! afterwards. The server shares it behind an `Arc`; library callers pass it
//! by reference. Nothing in the crate reads ambient globals.

use crate::error::StyleCopyError;
use crate::progress::ProgressCallback;
use crate::prompts::PromptTemplates;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Default Ollama address.
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Default model identifier.
pub const DEFAULT_MODEL: &str = "llama3:8b";

/// Default upload ceiling: 10 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// Configuration for the extraction + generation workflow.
///
/// # Example
/// ```rust
/// use style_copier::CopierConfig;
///
/// let config = CopierConfig::builder()
///     .base_url("http://gpu-box:11434")
///     .model("mistral:7b")
///     .request_timeout_secs(300)
///     .build()
///     .unwrap();
/// assert_eq!(config.generate_url(), "http://gpu-box:11434/api/generate");
/// ```
#[derive(Clone)]
pub struct CopierConfig {
    /// Base address of the generation server, without a trailing slash.
    /// Default: `http://localhost:11434`.
    pub base_url: String,

    /// Model identifier sent with every request. Default: `llama3:8b`.
    pub model: String,

    /// Sampling parameters for the style-analysis call.
    pub analysis_params: GenerationParams,

    /// Sampling parameters for the editing call.
    ///
    /// Lower the temperature here for more conservative rewrites; the
    /// analysis call benefits from a little more variety.
    pub editing_params: GenerationParams,

    /// Upper bound on each generation call, in seconds. Default: 120.
    pub request_timeout_secs: u64,

    /// Upper bound on the health probe, in seconds. Default: 5.
    pub health_timeout_secs: u64,

    /// Largest accepted upload, in bytes. Default: 10 MiB.
    pub max_upload_bytes: u64,

    /// Extensions the extractor accepts. Default: txt, docx, pdf.
    pub supported_formats: SupportedFormats,

    /// Prompt templates for both stages.
    pub prompts: PromptTemplates,

    /// Unwrap a response that the model fenced in ``` despite instructions,
    /// and normalise its line endings to LF. When off, a response is only
    /// whitespace-trimmed. Default: true.
    pub strip_fences: bool,

    /// Stage-transition observer. Default: none.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for CopierConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            analysis_params: GenerationParams::default(),
            editing_params: GenerationParams::default(),
            request_timeout_secs: 120,
            health_timeout_secs: 5,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            supported_formats: SupportedFormats::default(),
            prompts: PromptTemplates::default(),
            strip_fences: true,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for CopierConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CopierConfig")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("analysis_params", &self.analysis_params)
            .field("editing_params", &self.editing_params)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("health_timeout_secs", &self.health_timeout_secs)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .field("supported_formats", &self.supported_formats)
            .field("strip_fences", &self.strip_fences)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn WorkflowProgressCallback>"),
            )
            .finish()
    }
}

impl CopierConfig {
    /// Create a new builder for `CopierConfig`.
    pub fn builder() -> CopierConfigBuilder {
        CopierConfigBuilder {
            config: Self::default(),
        }
    }

    /// Full URL of the non-streaming generation endpoint.
    pub fn generate_url(&self) -> String {
        format!("{}/api/generate", self.base_url)
    }

    /// URL probed by the health check.
    pub fn health_url(&self) -> String {
        format!("{}/", self.base_url)
    }
}

/// Builder for [`CopierConfig`].
#[derive(Debug)]
pub struct CopierConfigBuilder {
    config: CopierConfig,
}

impl CopierConfigBuilder {
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn analysis_params(mut self, params: GenerationParams) -> Self {
        self.config.analysis_params = params.clamped();
        self
    }

    pub fn editing_params(mut self, params: GenerationParams) -> Self {
        self.config.editing_params = params.clamped();
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs;
        self
    }

    pub fn health_timeout_secs(mut self, secs: u64) -> Self {
        self.config.health_timeout_secs = secs;
        self
    }

    pub fn max_upload_bytes(mut self, bytes: u64) -> Self {
        self.config.max_upload_bytes = bytes;
        self
    }

    pub fn supported_formats(mut self, formats: SupportedFormats) -> Self {
        self.config.supported_formats = formats;
        self
    }

    pub fn analysis_prompt(mut self, template: impl Into<String>) -> Self {
        self.config.prompts.style_analysis = template.into();
        self
    }

    pub fn editing_prompt(mut self, template: impl Into<String>) -> Self {
        self.config.prompts.editing = template.into();
        self
    }

    pub fn strip_fences(mut self, v: bool) -> Self {
        self.config.strip_fences = v;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<CopierConfig, StyleCopyError> {
        let c = &self.config;
        if !(c.base_url.starts_with("http://") || c.base_url.starts_with("https://")) {
            return Err(StyleCopyError::InvalidConfig(format!(
                "base URL must start with http:// or https://, got '{}'",
                c.base_url
            )));
        }
        if c.model.trim().is_empty() {
            return Err(StyleCopyError::InvalidConfig("model must not be empty".into()));
        }
        if c.request_timeout_secs == 0 || c.health_timeout_secs == 0 {
            return Err(StyleCopyError::InvalidConfig(
                "timeouts must be at least 1 second".into(),
            ));
        }
        if c.max_upload_bytes == 0 {
            return Err(StyleCopyError::InvalidConfig(
                "maximum upload size must be > 0".into(),
            ));
        }
        if c.supported_formats.is_empty() {
            return Err(StyleCopyError::InvalidConfig(
                "at least one file format must be supported".into(),
            ));
        }
        for params in [&c.analysis_params, &c.editing_params] {
            if params.num_predict == 0 {
                return Err(StyleCopyError::InvalidConfig(
                    "num_predict must be ≥ 1".into(),
                ));
            }
        }
        c.prompts.validate()?;
        Ok(self.config)
    }
}

// ── Generation parameters ────────────────────────────────────────────────

/// Sampling options forwarded verbatim as the request's `options` object.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    /// Sampling temperature, 0.0–2.0. Default: 0.7.
    pub temperature: f32,
    /// Nucleus-sampling threshold, 0.0–1.0. Default: 0.9.
    pub top_p: f32,
    /// Maximum number of tokens to generate. Default: 2000.
    pub num_predict: u32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_p: 0.9,
            num_predict: 2000,
        }
    }
}

impl GenerationParams {
    fn clamped(self) -> Self {
        Self {
            temperature: self.temperature.clamp(0.0, 2.0),
            top_p: self.top_p.clamp(0.0, 1.0),
            num_predict: self.num_predict,
        }
    }
}

// ── Document formats ─────────────────────────────────────────────────────

/// A file format the extractor knows how to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Txt,
    Docx,
    Pdf,
}

impl DocumentFormat {
    /// Extension including the leading dot, as reported to clients.
    pub fn extension(&self) -> &'static str {
        match self {
            DocumentFormat::Txt => ".txt",
            DocumentFormat::Docx => ".docx",
            DocumentFormat::Pdf => ".pdf",
        }
    }

    /// Map a lower-cased extension (with or without the dot) to a format.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.trim_start_matches('.') {
            "txt" => Some(DocumentFormat::Txt),
            "docx" => Some(DocumentFormat::Docx),
            "pdf" => Some(DocumentFormat::Pdf),
            _ => None,
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for DocumentFormat {
    type Err = StyleCopyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_extension(&s.trim().to_lowercase())
            .ok_or_else(|| StyleCopyError::InvalidConfig(format!("unknown file format '{s}'")))
    }
}

/// The set of formats accepted for extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportedFormats(BTreeSet<DocumentFormat>);

impl Default for SupportedFormats {
    fn default() -> Self {
        Self::all()
    }
}

impl SupportedFormats {
    /// Every format the crate can extract.
    pub fn all() -> Self {
        Self(
            [DocumentFormat::Txt, DocumentFormat::Docx, DocumentFormat::Pdf]
                .into_iter()
                .collect(),
        )
    }

    pub fn only(formats: impl IntoIterator<Item = DocumentFormat>) -> Self {
        Self(formats.into_iter().collect())
    }

    pub fn contains(&self, format: DocumentFormat) -> bool {
        self.0.contains(&format)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = DocumentFormat> + '_ {
        self.0.iter().copied()
    }

    /// Extensions with leading dots, e.g. `[".txt", ".docx", ".pdf"]`.
    pub fn extensions(&self) -> Vec<&'static str> {
        self.iter().map(|f| f.extension()).collect()
    }
}

impl fmt::Display for SupportedFormats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.extensions().join(", "))
    }
}

impl FromStr for SupportedFormats {
    type Err = StyleCopyError;

    /// Parse a comma-separated list such as `"txt,docx"` or `".pdf, .txt"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let formats = s
            .split(',')
            .filter(|part| !part.trim().is_empty())
            .map(DocumentFormat::from_str)
            .collect::<Result<BTreeSet<_>, _>>()?;
        Ok(Self(formats))
    }
}
