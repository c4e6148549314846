//! Post-processing: deterministic cleanup of generated text.
//!
//! Models sometimes wrap their whole answer in a ``` fence despite being
//! asked for plain prose, and some servers return `\r\n` line endings. The
//! rules here fix exactly those artefacts and never touch the wording.
//!
//! ## Rule Order
//!
//! Line endings are normalised first so the fence pattern only has to match
//! `\n`. Trimming comes last so the result has no leading or trailing blank
//! lines whichever rules fired.

use once_cell::sync::Lazy;
use regex::Regex;

/// Apply all post-processing rules to one generation result.
///
/// Rules (applied in order):
/// 1. Normalise line endings (CRLF / lone CR → LF), when `strip_fences`
/// 2. Unwrap a single fence around the entire output, when `strip_fences`
/// 3. Trim surrounding whitespace
///
/// With `strip_fences` off the raw response is only trimmed.
pub fn clean_generation(input: &str, strip_fences: bool) -> String {
    if !strip_fences {
        return input.trim().to_string();
    }
    let s = normalise_line_endings(input);
    strip_outer_fence(&s).trim().to_string()
}

// ── Rule 1: Normalise line endings ───────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 2: Strip outer fence ────────────────────────────────────────────────

// Opening fence may carry an info string (```markdown, ```text, ...).
static RE_OUTER_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```[A-Za-z0-9_-]*[ \t]*\n(.*?)\n?```$").unwrap());

fn strip_outer_fence(input: &str) -> String {
    let trimmed = input.trim();
    match RE_OUTER_FENCE.captures(trimmed) {
        // An inner fence means the block is not a single wrapper.
        Some(caps) if !caps[1].contains("```") => caps[1].to_string(),
        _ => input.to_string(),
    }
}
