//! CLI binary for style-copier.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `CopierConfig`, then either serves the HTTP API or runs one operation
//! and prints the result.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::io::{self, Write};
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use style_copier::{
    server, CopierConfig, GenerationParams, ProgressCallback, Stage, StyleCopier,
    SupportedFormats, WorkflowProgressCallback,
};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers ──────────────────────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Spinner that follows the workflow through its stages.
///
/// Stays hidden until [`Stage::Init`], so nothing is drawn while input
/// files are still being extracted.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::with_draw_target(None, ProgressDrawTarget::hidden());
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Preparing");
        Arc::new(Self { bar })
    }
}

impl WorkflowProgressCallback for CliProgressCallback {
    fn on_stage(&self, stage: Stage) {
        match stage {
            Stage::Init => {
                self.bar.set_draw_target(ProgressDrawTarget::stderr());
                self.bar.enable_steady_tick(Duration::from_millis(80));
                self.bar.set_message("starting");
            }
            Stage::StyleAnalysisPending => {
                self.bar.set_prefix("Analyzing");
                self.bar.set_message("reading the reference style…");
            }
            Stage::StyleAnalysisDone => {
                self.bar
                    .println(format!("  {} style guide ready", green("✓")));
            }
            Stage::EditingPending => {
                self.bar.set_prefix("Editing");
                self.bar.set_message("rewriting the draft…");
            }
            Stage::Done => {
                self.bar.finish_and_clear();
                eprintln!("{} draft rewritten", green("✔"));
            }
            Stage::Failed => {}
        }
    }

    fn on_failure(&self, stage: Stage, error: &str) {
        self.bar.finish_and_clear();
        eprintln!("{} {} failed: {}", red("✘"), stage, error);
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Run the HTTP API on the default port
  style-copier serve

  # Print the text extracted from a document
  style-copier extract report.docx

  # Derive a style guide from two reference articles
  style-copier analyze --reference a.pdf --reference b.txt

  # Rewrite a draft in that style
  style-copier edit -r a.pdf -r b.txt --draft draft.docx -o edited.txt

  # Check that Ollama is up and the model answers
  style-copier health

ENVIRONMENT VARIABLES:
  OLLAMA_BASE_URL              Ollama address (default http://localhost:11434)
  OLLAMA_MODEL                 Model name (default llama3:8b)
  STYLE_COPIER_TIMEOUT         Per-call generation timeout in seconds
  STYLE_COPIER_MAX_UPLOAD_MB   Largest accepted file in MiB
  STYLE_COPIER_FORMATS         Accepted formats, e.g. "txt,docx"
  RUST_LOG                     Overrides -v / -q log filtering

SETUP:
  1. Start Ollama:   ollama serve
  2. Pull a model:   ollama pull llama3:8b
  3. Run:            style-copier edit -r ref.txt --draft draft.txt
"#;

/// Rewrite drafts in the voice of reference articles using a local LLM.
#[derive(Parser, Debug)]
#[command(
    name = "style-copier",
    version,
    about = "Rewrite drafts in the voice of reference articles using a local LLM",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    global: GlobalOpts,
}

#[derive(Args, Debug)]
struct GlobalOpts {
    /// Ollama base URL.
    #[arg(long, global = true, env = "OLLAMA_BASE_URL", default_value = "http://localhost:11434")]
    base_url: String,

    /// Model identifier.
    #[arg(long, global = true, env = "OLLAMA_MODEL", default_value = "llama3:8b")]
    model: String,

    /// Style-analysis temperature (0.0–2.0).
    #[arg(long, global = true, env = "STYLE_COPIER_ANALYSIS_TEMPERATURE", default_value_t = 0.7)]
    analysis_temperature: f32,

    /// Style-analysis nucleus threshold (0.0–1.0).
    #[arg(long, global = true, env = "STYLE_COPIER_ANALYSIS_TOP_P", default_value_t = 0.9)]
    analysis_top_p: f32,

    /// Style-analysis max output tokens.
    #[arg(long, global = true, env = "STYLE_COPIER_ANALYSIS_NUM_PREDICT", default_value_t = 2000)]
    analysis_num_predict: u32,

    /// Editing temperature (0.0–2.0).
    #[arg(long, global = true, env = "STYLE_COPIER_EDITING_TEMPERATURE", default_value_t = 0.7)]
    editing_temperature: f32,

    /// Editing nucleus threshold (0.0–1.0).
    #[arg(long, global = true, env = "STYLE_COPIER_EDITING_TOP_P", default_value_t = 0.9)]
    editing_top_p: f32,

    /// Editing max output tokens.
    #[arg(long, global = true, env = "STYLE_COPIER_EDITING_NUM_PREDICT", default_value_t = 2000)]
    editing_num_predict: u32,

    /// Per-call generation timeout in seconds.
    #[arg(long, global = true, env = "STYLE_COPIER_TIMEOUT", default_value_t = 120)]
    timeout: u64,

    /// Largest accepted input file in MiB.
    #[arg(long, global = true, env = "STYLE_COPIER_MAX_UPLOAD_MB", default_value_t = 10)]
    max_upload_mb: u64,

    /// Accepted input formats, comma separated.
    #[arg(long, global = true, env = "STYLE_COPIER_FORMATS", default_value = "txt,docx,pdf")]
    formats: SupportedFormats,

    /// File holding a custom style-analysis prompt (must contain {references}).
    #[arg(long, global = true, env = "STYLE_COPIER_ANALYSIS_PROMPT")]
    analysis_prompt: Option<PathBuf>,

    /// File holding a custom editing prompt (must contain {style_guide} and {draft}).
    #[arg(long, global = true, env = "STYLE_COPIER_EDITING_PROMPT")]
    editing_prompt: Option<PathBuf>,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "STYLE_COPIER_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "STYLE_COPIER_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the HTTP API.
    Serve {
        #[arg(long, env = "STYLE_COPIER_HOST", default_value = "127.0.0.1")]
        host: IpAddr,
        #[arg(long, env = "STYLE_COPIER_PORT", default_value_t = 8000)]
        port: u16,
    },
    /// Print the plain text extracted from a document.
    Extract {
        file: PathBuf,
        /// Print JSON with format and character count.
        #[arg(long)]
        json: bool,
    },
    /// Print a style guide derived from reference documents.
    Analyze {
        #[arg(short, long = "reference", required = true)]
        references: Vec<PathBuf>,
    },
    /// Rewrite a draft in the style of the reference documents.
    Edit {
        #[arg(short, long = "reference", required = true)]
        references: Vec<PathBuf>,
        #[arg(short, long)]
        draft: PathBuf,
        /// Write the edited text to this file instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Also print the intermediate style guide to stderr.
        #[arg(long)]
        show_style_guide: bool,
        /// Print the full outcome as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Probe the AI service and print its status.
    Health {
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli);

    let show_progress = !cli.global.quiet
        && matches!(&cli.command, Command::Edit { json: false, .. });
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn WorkflowProgressCallback>)
    } else {
        None
    };

    let config = build_config(&cli.global, progress_cb).await?;
    let copier = StyleCopier::new(config).context("Failed to initialise the AI client")?;

    match cli.command {
        Command::Serve { host, port } => {
            let addr = SocketAddr::new(host, port);
            if !cli.global.quiet {
                eprintln!("{} serving on {}", green("◆"), bold(&format!("http://{addr}/api")));
            }
            server::serve(addr, Arc::new(copier))
                .await
                .context("Server failed")?;
        }
        Command::Extract { file, json } => {
            let extracted = copier
                .extract_file(&file)
                .await
                .with_context(|| format!("Failed to extract {}", file.display()))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&extracted)?);
            } else {
                write_stdout(&extracted.text)?;
                if !cli.global.quiet {
                    eprintln!(
                        "{}",
                        dim(&format!("{} chars from {}", extracted.char_count(), extracted.format))
                    );
                }
            }
        }
        Command::Analyze { references } => {
            let texts = extract_all(&copier, &references).await?;
            let guide = copier
                .analyze_style(&texts)
                .await
                .context("Style analysis failed")?;
            write_stdout(&guide)?;
        }
        Command::Edit {
            references,
            draft,
            output,
            show_style_guide,
            json,
        } => {
            let texts = extract_all(&copier, &references).await?;
            let draft_text = copier
                .extract_file(&draft)
                .await
                .with_context(|| format!("Failed to extract {}", draft.display()))?
                .text;

            let outcome = copier
                .generate_edit(&texts, &draft_text)
                .await
                .context("Editing workflow failed")?;

            if show_style_guide && !json {
                eprintln!("{}\n{}\n", bold("Style guide:"), outcome.style_guide);
            }

            if json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else if let Some(path) = output {
                write_file(&path, &outcome.edited_article).await?;
                if !cli.global.quiet {
                    eprintln!(
                        "{}  analysis {}ms  editing {}ms  →  {}",
                        green("✔"),
                        outcome.analysis_ms,
                        outcome.editing_ms,
                        bold(&path.display().to_string())
                    );
                }
            } else {
                write_stdout(&outcome.edited_article)?;
            }
        }
        Command::Health { json } => {
            let health = copier.health_check().await;
            if json {
                println!("{}", serde_json::to_string_pretty(&health)?);
            } else {
                let mark = if health.is_ok() { green("✔") } else { red("✘") };
                println!("{} {}", mark, health.message);
                if let Some(details) = &health.details {
                    println!("  {}", dim(details));
                }
                if let Some(out) = &health.test_output {
                    println!("  {}", dim(out));
                }
            }
            if !health.is_ok() {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

fn init_logging(cli: &Cli) {
    let filter = if cli.global.verbose {
        "debug"
    } else if cli.global.quiet {
        "error"
    } else if matches!(cli.command, Command::Serve { .. }) {
        "info"
    } else {
        // The spinner carries the feedback for one-shot commands.
        "warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(io::stderr)
        .init();
}

/// Map CLI args to `CopierConfig`.
async fn build_config(opts: &GlobalOpts, progress: Option<ProgressCallback>) -> Result<CopierConfig> {
    let mut builder = CopierConfig::builder()
        .base_url(&opts.base_url)
        .model(&opts.model)
        .analysis_params(GenerationParams {
            temperature: opts.analysis_temperature,
            top_p: opts.analysis_top_p,
            num_predict: opts.analysis_num_predict,
        })
        .editing_params(GenerationParams {
            temperature: opts.editing_temperature,
            top_p: opts.editing_top_p,
            num_predict: opts.editing_num_predict,
        })
        .request_timeout_secs(opts.timeout)
        .max_upload_bytes(opts.max_upload_mb.saturating_mul(1024 * 1024))
        .supported_formats(opts.formats.clone());

    if let Some(path) = &opts.analysis_prompt {
        builder = builder.analysis_prompt(read_prompt(path).await?);
    }
    if let Some(path) = &opts.editing_prompt {
        builder = builder.editing_prompt(read_prompt(path).await?);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

async fn read_prompt(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read prompt template from {:?}", path))
}

/// Extract every reference in order; the first failure aborts the batch.
async fn extract_all(copier: &StyleCopier, paths: &[PathBuf]) -> Result<Vec<String>> {
    let mut texts = Vec::with_capacity(paths.len());
    for path in paths {
        let extracted = copier
            .extract_file(path)
            .await
            .with_context(|| format!("Failed to extract {}", path.display()))?;
        texts.push(extracted.text);
    }
    Ok(texts)
}

fn write_stdout(text: &str) -> Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    handle
        .write_all(text.as_bytes())
        .context("Failed to write to stdout")?;
    if !text.ends_with('\n') {
        handle.write_all(b"\n").ok();
    }
    Ok(())
}

/// Atomic write: temp file in the target directory, then rename.
async fn write_file(path: &Path, text: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let tmp = path.with_extension("tmp");
    tokio::fs::write(&tmp, text)
        .await
        .with_context(|| format!("Failed to write {}", tmp.display()))?;
    tokio::fs::rename(&tmp, path)
        .await
        .with_context(|| format!("Failed to move output into {}", path.display()))?;
    Ok(())
}
