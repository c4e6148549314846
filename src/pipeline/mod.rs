//! Pipeline stages for reference-style editing.
//!
//! Each submodule implements exactly one step and is testable on its own.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ (docx) ──▶ llm ──▶ postprocess
//! (upload)  (txt/pdf)   (docx)     (Ollama) (cleanup)
//! ```
//!
//! 1. [`input`]  : infer the format, enforce the size limit, stage the
//!    bytes in a temporary directory
//! 2. [`extract`]: dispatch on format; parsing runs in `spawn_blocking`
//! 3. [`docx`]   : `.docx` reader with a raw-XML fallback
//! 4. [`llm`]    : the only stage with network I/O
//! 5. [`postprocess`]: deterministic text cleanup (fences, line endings)

pub mod docx;
pub mod extract;
pub mod input;
pub mod llm;
pub mod postprocess;
