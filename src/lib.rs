//! # style-copier
//!
//! Rewrite a draft in the voice of a set of reference articles, using a
//! locally hosted LLM (Ollama).
//!
//! ## Pipeline Overview
//!
//! ```text
//! reference files ─┐
//!                  ├─ 1. Extract   .txt / .docx / .pdf → plain text
//! draft file ──────┘
//!                     2. Analyze   references → style guide   (1st LLM call)
//!                     3. Edit      style guide + draft → text (2nd LLM call)
//!                     4. Polish    strip stray fences, normalise newlines
//! ```
//!
//! The two LLM calls are strictly sequential and never retried; a failure
//! at any step ends the run with one classified [`StyleCopyError`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use style_copier::{CopierConfig, StyleCopier};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = CopierConfig::builder().model("llama3:8b").build()?;
//!     let copier = StyleCopier::new(config)?;
//!
//!     let references = ["Short punchy sentences. Bold claims."];
//!     let outcome = copier
//!         .generate_edit(&references, "We are pleased to announce our quarterly results.")
//!         .await?;
//!     println!("{}", outcome.edited_article);
//!     Ok(())
//! }
//! ```
//!
//! ## Serving HTTP
//!
//! [`server::router`] returns an axum `Router` exposing the same operations
//! under `/api/`; [`server::serve`] binds it and runs until Ctrl-C.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `style-copier` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! style-copier = { version = "2", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod server;
pub mod workflow;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    CopierConfig, CopierConfigBuilder, DocumentFormat, GenerationParams, SupportedFormats,
};
pub use error::{ErrorClass, StyleCopyError};
pub use pipeline::extract::ExtractedText;
pub use pipeline::input::UploadedFile;
pub use pipeline::llm::{GenerationBackend, OllamaBackend};
pub use progress::{NoopProgressCallback, ProgressCallback, Stage, WorkflowProgressCallback};
pub use prompts::PromptTemplates;
pub use workflow::{AiServiceHealth, EditOutcome, ModelInfo, StyleCopier};
