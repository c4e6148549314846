//! The two-stage editing workflow.
//!
//! [`StyleCopier`] owns the read-only configuration and a generation
//! backend, and exposes every core operation: extraction, style analysis,
//! editing, the combined run, and the health and model reports.
//!
//! A combined run is strictly sequential. Style analysis must succeed before
//! the editing prompt is built, and any failure ends the run with exactly
//! one [`StyleCopyError`]; there is no partial result.

use crate::config::{CopierConfig, GenerationParams};
use crate::error::StyleCopyError;
use crate::pipeline::extract::{self, ExtractedText};
use crate::pipeline::input::UploadedFile;
use crate::pipeline::llm::{GenerationBackend, OllamaBackend};
use crate::pipeline::postprocess;
use crate::prompts::HEALTH_PROBE_PROMPT;
use crate::progress::Stage;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Longest health-probe output echoed back before truncation.
const HEALTH_OUTPUT_PREVIEW_CHARS: usize = 100;

/// Result of a combined analyze-then-edit run.
#[derive(Debug, Clone, Serialize)]
pub struct EditOutcome {
    /// Intermediate artifact from the first call.
    pub style_guide: String,
    /// Final text from the second call.
    pub edited_article: String,
    pub analysis_ms: u64,
    pub editing_ms: u64,
}

/// Outcome of probing the generation service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AiServiceHealth {
    /// `"success"` or `"error"`.
    pub status: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_output: Option<String>,
}

impl AiServiceHealth {
    pub fn is_ok(&self) -> bool {
        self.status == "success"
    }

    fn error(message: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            status: "error".into(),
            message: message.into(),
            details: Some(details.into()),
            test_output: None,
        }
    }
}

/// Active model and sampling settings.
#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    pub current_model: String,
    pub base_url: String,
    pub analysis_params: GenerationParams,
    pub editing_params: GenerationParams,
    pub status: &'static str,
}

/// Entry point for all core operations.
#[derive(Clone)]
pub struct StyleCopier {
    config: Arc<CopierConfig>,
    backend: Arc<dyn GenerationBackend>,
}

impl std::fmt::Debug for StyleCopier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StyleCopier")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl StyleCopier {
    /// Build a copier talking to the Ollama server named in `config`.
    pub fn new(config: CopierConfig) -> Result<Self, StyleCopyError> {
        let backend = OllamaBackend::new(&config)?;
        Ok(Self::with_backend(config, Arc::new(backend)))
    }

    /// Build a copier around a caller-supplied backend.
    pub fn with_backend(config: CopierConfig, backend: Arc<dyn GenerationBackend>) -> Self {
        Self {
            config: Arc::new(config),
            backend,
        }
    }

    pub fn config(&self) -> &CopierConfig {
        &self.config
    }

    // ── Extraction ───────────────────────────────────────────────────────

    /// Extract plain text from an uploaded file.
    pub async fn extract_upload(&self, upload: &UploadedFile) -> Result<ExtractedText, StyleCopyError> {
        extract::extract_upload(upload, &self.config).await
    }

    /// Extract plain text from a file on disk.
    pub async fn extract_file(&self, path: &Path) -> Result<ExtractedText, StyleCopyError> {
        extract::extract_file(path, &self.config).await
    }

    // ── Generation ───────────────────────────────────────────────────────

    /// Stage one: derive a style guide from the reference texts, in order.
    ///
    /// An empty reference list fails before any network call.
    pub async fn analyze_style<S: AsRef<str>>(
        &self,
        references: &[S],
    ) -> Result<String, StyleCopyError> {
        if references.is_empty() {
            return Err(StyleCopyError::NoReferences);
        }
        let prompt = self.config.prompts.render_style_analysis(references);
        info!("Analyzing style of {} reference(s)", references.len());
        self.run_stage(Stage::StyleAnalysisPending, &prompt, &self.config.analysis_params)
            .await
    }

    /// Stage two: rewrite `draft` to follow `style_guide`.
    pub async fn edit_content(
        &self,
        draft: &str,
        style_guide: &str,
    ) -> Result<String, StyleCopyError> {
        validate_edit_inputs(draft, style_guide)?;
        let prompt = self.config.prompts.render_editing(draft, style_guide);
        info!("Editing draft of {} chars", draft.chars().count());
        self.run_stage(Stage::EditingPending, &prompt, &self.config.editing_params)
            .await
    }

    /// Both stages, strictly in sequence.
    ///
    /// Inputs are validated up front, so a blank draft is rejected before
    /// the analysis call is spent. Stage events go to the configured
    /// progress callback.
    pub async fn generate_edit<S: AsRef<str>>(
        &self,
        references: &[S],
        draft: &str,
    ) -> Result<EditOutcome, StyleCopyError> {
        if references.is_empty() {
            return Err(StyleCopyError::NoReferences);
        }
        if draft.trim().is_empty() {
            return Err(StyleCopyError::EmptyDraft);
        }

        self.notify(Stage::Init);

        let analysis_start = Instant::now();
        let style_guide = self
            .tracked(Stage::StyleAnalysisPending, self.analyze_style(references))
            .await?;
        let analysis_ms = analysis_start.elapsed().as_millis() as u64;
        self.notify(Stage::StyleAnalysisDone);

        let editing_start = Instant::now();
        let edited_article = self
            .tracked(
                Stage::EditingPending,
                self.edit_content(draft, &style_guide),
            )
            .await?;
        let editing_ms = editing_start.elapsed().as_millis() as u64;
        self.notify(Stage::Done);

        info!(
            "Workflow complete: analysis {}ms, editing {}ms",
            analysis_ms, editing_ms
        );
        Ok(EditOutcome {
            style_guide,
            edited_article,
            analysis_ms,
            editing_ms,
        })
    }

    // ── Reports ──────────────────────────────────────────────────────────

    /// Probe the service root, then run a one-sentence test generation.
    ///
    /// Never fails: problems are reported in the returned value.
    pub async fn health_check(&self) -> AiServiceHealth {
        match self.backend.probe().await {
            Ok(()) => {}
            Err(StyleCopyError::UpstreamStatus { status, .. }) => {
                return AiServiceHealth::error(
                    "Ollama server not responding",
                    format!("HTTP {status}"),
                )
            }
            Err(e) => {
                warn!("Health probe failed: {}", e);
                return AiServiceHealth::error(e.to_string(), "Failed to connect to AI service");
            }
        }

        match self
            .backend
            .generate(HEALTH_PROBE_PROMPT, &self.config.analysis_params)
            .await
        {
            Ok(raw) => AiServiceHealth {
                status: "success".into(),
                message: "AI engine is operational".into(),
                details: None,
                test_output: Some(preview(raw.trim(), HEALTH_OUTPUT_PREVIEW_CHARS)),
            },
            Err(e) => {
                warn!("Health test generation failed: {}", e);
                AiServiceHealth::error(e.to_string(), "Failed to connect to AI service")
            }
        }
    }

    pub fn model_info(&self) -> ModelInfo {
        ModelInfo {
            current_model: self.config.model.clone(),
            base_url: self.config.base_url.clone(),
            analysis_params: self.config.analysis_params,
            editing_params: self.config.editing_params,
            status: "operational",
        }
    }

    // ── Internals ────────────────────────────────────────────────────────

    /// One generation call plus cleanup; blank output is an error.
    async fn run_stage(
        &self,
        stage: Stage,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<String, StyleCopyError> {
        let raw = self.backend.generate(prompt, params).await?;
        let text = postprocess::clean_generation(&raw, self.config.strip_fences);
        if text.is_empty() {
            warn!("Empty response during {}", stage);
            return Err(StyleCopyError::EmptyResponse {
                stage: stage.to_string(),
            });
        }
        debug!("{} produced {} chars", stage, text.chars().count());
        Ok(text)
    }

    /// Announce `stage`, await `fut`, and report a failure against `stage`.
    async fn tracked<T>(
        &self,
        stage: Stage,
        fut: impl std::future::Future<Output = Result<T, StyleCopyError>>,
    ) -> Result<T, StyleCopyError> {
        self.notify(stage);
        let result = fut.await;
        if let Err(ref e) = result {
            warn!("Workflow failed during {}: {}", stage, e);
            if let Some(cb) = &self.config.progress_callback {
                cb.on_failure(stage, &e.to_string());
            }
        }
        result
    }

    fn notify(&self, stage: Stage) {
        if let Some(cb) = &self.config.progress_callback {
            cb.on_stage(stage);
        }
    }
}

fn validate_edit_inputs(draft: &str, style_guide: &str) -> Result<(), StyleCopyError> {
    if draft.trim().is_empty() {
        return Err(StyleCopyError::EmptyDraft);
    }
    if style_guide.trim().is_empty() {
        return Err(StyleCopyError::EmptyStyleGuide);
    }
    Ok(())
}

/// First `max` chars of `s`, with `...` appended when anything was cut.
fn preview(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::WorkflowProgressCallback;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays canned results and records every prompt it sees.
    #[derive(Default)]
    struct ScriptedBackend {
        replies: Mutex<VecDeque<Result<String, StyleCopyError>>>,
        prompts: Mutex<Vec<String>>,
        probe_status: Option<u16>,
    }

    impl ScriptedBackend {
        fn replying(replies: Vec<Result<String, StyleCopyError>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                ..Default::default()
            })
        }

        fn calls(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl GenerationBackend for ScriptedBackend {
        async fn generate(
            &self,
            prompt: &str,
            _params: &GenerationParams,
        ) -> Result<String, StyleCopyError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(StyleCopyError::Internal("script exhausted".into())))
        }

        async fn probe(&self) -> Result<(), StyleCopyError> {
            match self.probe_status {
                None | Some(200) => Ok(()),
                Some(status) => Err(StyleCopyError::UpstreamStatus {
                    status,
                    body: String::new(),
                }),
            }
        }
    }

    #[derive(Default)]
    struct Recorder {
        stages: Mutex<Vec<Stage>>,
        failures: Mutex<Vec<Stage>>,
    }

    impl WorkflowProgressCallback for Recorder {
        fn on_stage(&self, stage: Stage) {
            self.stages.lock().unwrap().push(stage);
        }
        fn on_failure(&self, stage: Stage, _error: &str) {
            self.failures.lock().unwrap().push(stage);
        }
    }

    fn copier(backend: Arc<ScriptedBackend>) -> StyleCopier {
        StyleCopier::with_backend(CopierConfig::default(), backend)
    }

    fn copier_with_recorder(backend: Arc<ScriptedBackend>) -> (StyleCopier, Arc<Recorder>) {
        let rec = Arc::new(Recorder::default());
        let config = CopierConfig::builder()
            .progress_callback(rec.clone())
            .build()
            .unwrap();
        (StyleCopier::with_backend(config, backend), rec)
    }

    #[tokio::test]
    async fn empty_references_make_no_call() {
        let backend = ScriptedBackend::replying(vec![]);
        let c = copier(backend.clone());
        let refs: [&str; 0] = [];
        assert!(matches!(
            c.analyze_style(&refs).await,
            Err(StyleCopyError::NoReferences)
        ));
        assert!(matches!(
            c.generate_edit(&refs, "draft").await,
            Err(StyleCopyError::NoReferences)
        ));
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn blank_draft_rejected_before_analysis() {
        let backend = ScriptedBackend::replying(vec![Ok("guide".into())]);
        let c = copier(backend.clone());
        let err = c.generate_edit(&["ref"], "  \n\t").await.unwrap_err();
        assert!(matches!(err, StyleCopyError::EmptyDraft));
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn edit_requires_style_guide() {
        let backend = ScriptedBackend::replying(vec![]);
        let c = copier(backend.clone());
        assert!(matches!(
            c.edit_content("draft", "   ").await,
            Err(StyleCopyError::EmptyStyleGuide)
        ));
        assert!(matches!(
            c.edit_content("", "guide").await,
            Err(StyleCopyError::EmptyDraft)
        ));
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn generate_edit_runs_both_stages_in_order() {
        let backend = ScriptedBackend::replying(vec![
            Ok("  Use short sentences.  ".into()),
            Ok("```\nWe beat the quarter.\n```".into()),
        ]);
        let (c, rec) = copier_with_recorder(backend.clone());

        let out = c
            .generate_edit(&["Short punchy sentences.", "Bold claims."], "Our results were good.")
            .await
            .unwrap();
        assert_eq!(out.style_guide, "Use short sentences.");
        assert_eq!(out.edited_article, "We beat the quarter.");

        let calls = backend.calls();
        assert_eq!(calls.len(), 2);
        assert!(calls[0].contains("Short punchy sentences."));
        assert!(calls[0].contains("Bold claims."));
        assert!(calls[1].contains("Use short sentences."));
        assert!(calls[1].contains("Our results were good."));

        assert_eq!(
            *rec.stages.lock().unwrap(),
            vec![
                Stage::Init,
                Stage::StyleAnalysisPending,
                Stage::StyleAnalysisDone,
                Stage::EditingPending,
                Stage::Done
            ]
        );
        assert!(rec.failures.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn analysis_failure_skips_editing() {
        let backend = ScriptedBackend::replying(vec![
            Err(StyleCopyError::Timeout { secs: 120 }),
            Ok("never used".into()),
        ]);
        let (c, rec) = copier_with_recorder(backend.clone());

        let err = c.generate_edit(&["ref"], "draft").await.unwrap_err();
        assert!(matches!(err, StyleCopyError::Timeout { secs: 120 }));
        assert_eq!(backend.calls().len(), 1);
        assert_eq!(*rec.failures.lock().unwrap(), vec![Stage::StyleAnalysisPending]);
        assert!(!rec.stages.lock().unwrap().contains(&Stage::EditingPending));
    }

    #[tokio::test]
    async fn blank_generation_is_empty_response() {
        let backend = ScriptedBackend::replying(vec![Ok("guide".into()), Ok(" \n ".into())]);
        let (c, rec) = copier_with_recorder(backend);

        let err = c.generate_edit(&["ref"], "draft").await.unwrap_err();
        match err {
            StyleCopyError::EmptyResponse { stage } => assert_eq!(stage, "editing"),
            other => panic!("unexpected: {other:?}"),
        }
        assert_eq!(*rec.failures.lock().unwrap(), vec![Stage::EditingPending]);
    }

    #[tokio::test]
    async fn health_reports_probe_status() {
        let backend = Arc::new(ScriptedBackend {
            probe_status: Some(500),
            ..Default::default()
        });
        let h = copier(backend.clone()).health_check().await;
        assert!(!h.is_ok());
        assert_eq!(h.message, "Ollama server not responding");
        assert_eq!(h.details.as_deref(), Some("HTTP 500"));
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn health_truncates_test_output() {
        let long = "x".repeat(150);
        let backend = ScriptedBackend::replying(vec![Ok(long)]);
        let h = copier(backend.clone()).health_check().await;
        assert!(h.is_ok());
        let out = h.test_output.unwrap();
        assert_eq!(out.len(), 103);
        assert!(out.ends_with("..."));
        assert_eq!(backend.calls(), vec![HEALTH_PROBE_PROMPT.to_string()]);
    }

    #[test]
    fn preview_respects_char_boundaries() {
        assert_eq!(preview("héllo", 2), "hé...");
        assert_eq!(preview("short", 100), "short");
    }

    #[test]
    fn model_info_reflects_config() {
        let c = copier(ScriptedBackend::replying(vec![]));
        let info = c.model_info();
        assert_eq!(info.current_model, "llama3:8b");
        assert_eq!(info.status, "operational");
        assert_eq!(info.editing_params.num_predict, 2000);
    }
}
