//! Stage-transition callbacks for the two-step editing workflow.
//!
//! Inject an [`Arc<dyn WorkflowProgressCallback>`] via
//! [`crate::config::CopierConfigBuilder::progress_callback`] to observe each
//! request as it moves through the [`Stage`] machine:
//!
//! ```text
//! Init ─▶ StyleAnalysisPending ─▶ StyleAnalysisDone ─▶ EditingPending ─▶ Done
//!                 │                                           │
//!                 └──────────────────▶ Failed ◀───────────────┘
//! ```
//!
//! # Example
//!
//! ```rust
//! use style_copier::{CopierConfig, Stage, WorkflowProgressCallback};
//! use std::sync::Arc;
//!
//! struct Printer;
//!
//! impl WorkflowProgressCallback for Printer {
//!     fn on_stage(&self, stage: Stage) {
//!         eprintln!("now in {stage}");
//!     }
//! }
//!
//! let config = CopierConfig::builder()
//!     .progress_callback(Arc::new(Printer))
//!     .build()
//!     .unwrap();
//! ```

use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Position of a single request in the editing workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Init,
    StyleAnalysisPending,
    StyleAnalysisDone,
    EditingPending,
    Done,
    /// Absorbing failure state, reachable only from a pending stage.
    Failed,
}

impl Stage {
    /// Whether `self → next` is an edge of the workflow machine.
    pub fn can_transition_to(self, next: Stage) -> bool {
        use Stage::*;
        matches!(
            (self, next),
            (Init, StyleAnalysisPending)
                | (StyleAnalysisPending, StyleAnalysisDone)
                | (StyleAnalysisDone, EditingPending)
                | (EditingPending, Done)
                | (StyleAnalysisPending, Failed)
                | (EditingPending, Failed)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Stage::Done | Stage::Failed)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Init => "init",
            Stage::StyleAnalysisPending => "style analysis",
            Stage::StyleAnalysisDone => "style analysis done",
            Stage::EditingPending => "editing",
            Stage::Done => "done",
            Stage::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Called by the workflow as a request changes [`Stage`].
///
/// Implementations must be `Send + Sync`: the server shares one config
/// across every in-flight request. Both methods default to no-ops.
pub trait WorkflowProgressCallback: Send + Sync {
    /// Called on entry to every stage except [`Stage::Failed`].
    fn on_stage(&self, stage: Stage) {
        let _ = stage;
    }

    /// Called once when a pending stage fails.
    ///
    /// # Arguments
    /// * `stage`: the pending stage that failed
    /// * `error`: human-readable error description
    fn on_failure(&self, stage: Stage, error: &str) {
        let _ = (stage, error);
    }
}

/// A no-op implementation for callers that don't need stage events.
pub struct NoopProgressCallback;

impl WorkflowProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::CopierConfig`].
pub type ProgressCallback = Arc<dyn WorkflowProgressCallback>;
