//! Generation backend: one prompt in, one completion out.
//!
//! The workflow only sees the [`GenerationBackend`] trait, so tests and
//! embedders can substitute their own backend. [`OllamaBackend`] is the
//! production implementation and speaks Ollama's non-streaming
//! `POST /api/generate`:
//!
//! ```text
//! request   {"model", "prompt", "stream": false,
//!            "options": {"temperature", "top_p", "num_predict"}}
//! response  {"response": "...", ...}
//! ```
//!
//! There is no retry loop. A single failed call fails the workflow, and the
//! error variant says why (see [`classify_transport_error`]).

use crate::config::{CopierConfig, GenerationParams};
use crate::error::StyleCopyError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// A text-generation service.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Generate a completion for `prompt`.
    ///
    /// Returns the raw `response` text, which may be empty. Blank output is
    /// judged by the caller, which knows which stage it was running.
    async fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<String, StyleCopyError>;

    /// Cheap reachability check against the service root.
    async fn probe(&self) -> Result<(), StyleCopyError>;
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
struct GenerateOptions {
    temperature: f32,
    top_p: f32,
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: Option<String>,
}

/// Ollama over HTTP.
#[derive(Debug, Clone)]
pub struct OllamaBackend {
    client: reqwest::Client,
    model: String,
    base_url: String,
    generate_url: String,
    health_url: String,
    request_timeout: Duration,
    health_timeout: Duration,
}

impl OllamaBackend {
    pub fn new(config: &CopierConfig) -> Result<Self, StyleCopyError> {
        let request_timeout = Duration::from_secs(config.request_timeout_secs);
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| StyleCopyError::Internal(format!("HTTP client setup failed: {e}")))?;

        Ok(Self {
            client,
            model: config.model.clone(),
            base_url: config.base_url.clone(),
            generate_url: config.generate_url(),
            health_url: config.health_url(),
            request_timeout,
            health_timeout: Duration::from_secs(config.health_timeout_secs),
        })
    }

    fn classify(&self, err: reqwest::Error, timeout: Duration) -> StyleCopyError {
        classify_transport_error(&err, &self.base_url, timeout.as_secs())
    }
}

#[async_trait]
impl GenerationBackend for OllamaBackend {
    async fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<String, StyleCopyError> {
        let start = Instant::now();
        let body = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: build_options(params),
        };
        debug!(
            "POST {} model={} prompt_chars={}",
            self.generate_url,
            self.model,
            prompt.chars().count()
        );

        let response = self
            .client
            .post(&self.generate_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.classify(e, self.request_timeout))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            warn!("Generation endpoint returned {}: {}", status, text);
            return Err(status_error(status.as_u16(), text));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| self.classify(e, self.request_timeout))?;
        let text = parsed.response.unwrap_or_default();

        debug!(
            "Generated {} chars in {}ms",
            text.chars().count(),
            start.elapsed().as_millis()
        );
        Ok(text)
    }

    async fn probe(&self) -> Result<(), StyleCopyError> {
        let response = self
            .client
            .get(&self.health_url)
            .timeout(self.health_timeout)
            .send()
            .await
            .map_err(|e| self.classify(e, self.health_timeout))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let text = response.text().await.unwrap_or_default();
            Err(status_error(status.as_u16(), text))
        }
    }
}

fn build_options(params: &GenerationParams) -> GenerateOptions {
    GenerateOptions {
        temperature: params.temperature,
        top_p: params.top_p,
        num_predict: params.num_predict,
    }
}

/// Map a non-success HTTP status. Ollama answers 503 while a model loads.
fn status_error(status: u16, body: String) -> StyleCopyError {
    if status == 503 {
        StyleCopyError::ServiceStarting { body }
    } else {
        StyleCopyError::UpstreamStatus { status, body }
    }
}

/// Map a transport failure onto the error taxonomy.
///
/// Timeouts are checked first: a connect timeout is both, and the caller
/// needs to hear that the bound was hit.
pub fn classify_transport_error(err: &reqwest::Error, url: &str, secs: u64) -> StyleCopyError {
    if err.is_timeout() {
        StyleCopyError::Timeout { secs }
    } else if err.is_connect() {
        StyleCopyError::ServiceUnavailable {
            url: url.to_string(),
        }
    } else {
        StyleCopyError::Processing(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_options_copies_params() {
        let opts = build_options(&GenerationParams {
            temperature: 0.2,
            top_p: 0.5,
            num_predict: 64,
        });
        assert_eq!(
            opts,
            GenerateOptions {
                temperature: 0.2,
                top_p: 0.5,
                num_predict: 64
            }
        );
    }

    #[test]
    fn request_body_matches_wire_format() {
        let body = GenerateRequest {
            model: "llama3:8b",
            prompt: "hi",
            stream: false,
            options: build_options(&GenerationParams::default()),
        };
        let v = serde_json::to_value(&body).unwrap();
        assert_eq!(v["model"], "llama3:8b");
        assert_eq!(v["prompt"], "hi");
        assert_eq!(v["stream"], false);
        assert_eq!(v["options"]["num_predict"], 2000);
        assert!((v["options"]["top_p"].as_f64().unwrap() - 0.9).abs() < 1e-6);
    }

    #[test]
    fn missing_response_field_parses_as_none() {
        let r: GenerateResponse = serde_json::from_str(r#"{"done":true}"#).unwrap();
        assert!(r.response.is_none());
        let r: GenerateResponse =
            serde_json::from_str(r#"{"response":"Hello.","done":true}"#).unwrap();
        assert_eq!(r.response.as_deref(), Some("Hello."));
    }

    #[test]
    fn status_503_means_starting() {
        assert!(matches!(
            status_error(503, "loading model".into()),
            StyleCopyError::ServiceStarting { .. }
        ));
        assert!(matches!(
            status_error(404, "model not found".into()),
            StyleCopyError::UpstreamStatus { status: 404, .. }
        ));
    }

    #[tokio::test]
    async fn closed_port_is_service_unavailable() {
        // Bind then drop to get a port nobody is listening on.
        let port = {
            let l = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            l.local_addr().unwrap().port()
        };
        let config = CopierConfig::builder()
            .base_url(format!("http://127.0.0.1:{port}"))
            .build()
            .unwrap();
        let backend = OllamaBackend::new(&config).unwrap();

        let err = backend
            .generate("hello", &GenerationParams::default())
            .await
            .unwrap_err();
        assert!(
            matches!(err, StyleCopyError::ServiceUnavailable { .. }),
            "got: {err:?}"
        );
        assert!(backend.probe().await.is_err());
    }
}
