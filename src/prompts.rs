//! Prompt templates for the two generation stages.
//!
//! Templates are plain data: a string with named placeholders that
//! [`PromptTemplates::render_style_analysis`] and
//! [`PromptTemplates::render_editing`] fill in. Callers can swap either
//! template through [`crate::config::CopierConfigBuilder`] without touching
//! the workflow code.
//!
//! | Template | Placeholders |
//! |----------|--------------|
//! | style analysis | `{references}` |
//! | editing | `{style_guide}`, `{draft}` |

use crate::error::StyleCopyError;
use serde::{Deserialize, Serialize};

/// Marker placed between reference documents in the analysis prompt.
pub const ARTICLE_SEPARATOR: &str = "\n\n---ARTICLE SEPARATOR---\n\n";

pub const REFERENCES_PLACEHOLDER: &str = "{references}";
pub const STYLE_GUIDE_PLACEHOLDER: &str = "{style_guide}";
pub const DRAFT_PLACEHOLDER: &str = "{draft}";

/// Prompt sent once per health check to confirm the model can generate.
pub const HEALTH_PROBE_PROMPT: &str = "Say hello in one sentence.";

/// Default style-analysis template.
pub const DEFAULT_STYLE_ANALYSIS_PROMPT: &str = r#"You are an expert writing style analyst. Analyze the following articles and create a comprehensive style guide.

REFERENCE ARTICLES:
{references}

Please provide a detailed analysis covering:

1. TONE & VOICE CHARACTERISTICS:
   - Overall tone (professional, casual, authoritative, etc.)
   - Voice personality traits
   - Emotional undertones

2. STRUCTURAL PATTERNS:
   - Typical opening strategies
   - Paragraph organization and flow
   - Conclusion styles
   - Use of headings and subheadings

3. LANGUAGE PREFERENCES:
   - Vocabulary sophistication level
   - Industry jargon vs. accessible language
   - Sentence length and complexity
   - Active vs. passive voice usage

4. CONTENT APPROACH:
   - How examples and evidence are presented
   - Use of statistics, quotes, or case studies
   - Storytelling elements
   - Call-to-action styles

5. DISTINCTIVE ELEMENTS:
   - Unique phrases or expressions
   - Formatting preferences
   - Brand voice indicators

Create a concise but comprehensive style guide that can be used to edit future content to match this writing style."#;

/// Default editing template.
pub const DEFAULT_EDITING_PROMPT: &str = r#"You are an expert content editor. Your task is to edit the following draft to match the provided style guide exactly.

STYLE GUIDE TO FOLLOW:
{style_guide}

DRAFT TO EDIT:
{draft}

EDITING INSTRUCTIONS:
1. Maintain the core message and key information from the original draft
2. Adjust tone, voice, and style to match the style guide
3. Improve sentence structure and flow according to the patterns identified
4. Enhance vocabulary and word choice to align with the reference style
5. Reorganize content structure if needed to match the typical patterns
6. Add or modify examples to fit the content approach described in the style guide
7. Ensure the final piece feels authentic to the original brand voice

Please provide only the edited version of the article. Do not include explanations or commentary about the changes made."#;

/// The pair of templates driving a workflow run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptTemplates {
    pub style_analysis: String,
    pub editing: String,
}

impl Default for PromptTemplates {
    fn default() -> Self {
        Self {
            style_analysis: DEFAULT_STYLE_ANALYSIS_PROMPT.to_string(),
            editing: DEFAULT_EDITING_PROMPT.to_string(),
        }
    }
}

impl PromptTemplates {
    /// Reject templates that would silently drop their inputs.
    pub fn validate(&self) -> Result<(), StyleCopyError> {
        if !self.style_analysis.contains(REFERENCES_PLACEHOLDER) {
            return Err(StyleCopyError::InvalidConfig(format!(
                "style-analysis prompt must contain {REFERENCES_PLACEHOLDER}"
            )));
        }
        for placeholder in [STYLE_GUIDE_PLACEHOLDER, DRAFT_PLACEHOLDER] {
            if !self.editing.contains(placeholder) {
                return Err(StyleCopyError::InvalidConfig(format!(
                    "editing prompt must contain {placeholder}"
                )));
            }
        }
        Ok(())
    }

    /// Build the stage-one prompt from the reference set, in order.
    pub fn render_style_analysis<S: AsRef<str>>(&self, references: &[S]) -> String {
        let joined = references
            .iter()
            .map(AsRef::as_ref)
            .collect::<Vec<_>>()
            .join(ARTICLE_SEPARATOR);
        fill(&self.style_analysis, &[(REFERENCES_PLACEHOLDER, &joined)])
    }

    /// Build the stage-two prompt.
    pub fn render_editing(&self, draft: &str, style_guide: &str) -> String {
        fill(
            &self.editing,
            &[(STYLE_GUIDE_PLACEHOLDER, style_guide), (DRAFT_PLACEHOLDER, draft)],
        )
    }
}

/// Substitute the first occurrence of each placeholder in `template`.
///
/// Only the template is scanned, never the substituted values, so a draft or
/// style guide that contains placeholder text is inserted verbatim.
fn fill(template: &str, slots: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(
        template.len() + slots.iter().map(|(_, v)| v.len()).sum::<usize>(),
    );
    let mut used = vec![false; slots.len()];
    let mut rest = template;

    loop {
        let next = slots
            .iter()
            .enumerate()
            .filter(|(i, _)| !used[*i])
            .filter_map(|(i, (placeholder, _))| rest.find(placeholder).map(|pos| (pos, i)))
            .min();

        match next {
            Some((pos, i)) => {
                let (placeholder, value) = slots[i];
                out.push_str(&rest[..pos]);
                out.push_str(value);
                rest = &rest[pos + placeholder.len()..];
                used[i] = true;
            }
            None => {
                out.push_str(rest);
                return out;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        PromptTemplates::default().validate().unwrap();
    }

    #[test]
    fn analysis_prompt_separates_every_reference() {
        let t = PromptTemplates::default();
        let p = t.render_style_analysis(&["First piece.", "Second piece.", "Third piece."]);
        assert_eq!(p.matches("---ARTICLE SEPARATOR---").count(), 2);
        let first = p.find("First piece.").unwrap();
        let second = p.find("Second piece.").unwrap();
        let third = p.find("Third piece.").unwrap();
        assert!(first < second && second < third);
        assert!(p.contains("TONE & VOICE"));
        assert!(p.contains("DISTINCTIVE ELEMENTS"));
        assert!(!p.contains(REFERENCES_PLACEHOLDER));
    }

    #[test]
    fn single_reference_has_no_separator() {
        let p = PromptTemplates::default().render_style_analysis(&["Only one."]);
        assert!(!p.contains("ARTICLE SEPARATOR"));
    }

    #[test]
    fn editing_prompt_embeds_guide_and_draft_verbatim() {
        let p = PromptTemplates::default().render_editing("My draft.", "Be bold.");
        let guide = p.find("Be bold.").unwrap();
        let draft = p.find("My draft.").unwrap();
        assert!(guide < draft);
        assert!(p.contains("Do not include explanations or commentary"));
    }

    #[test]
    fn draft_containing_placeholder_text_is_not_rewritten() {
        let p = PromptTemplates::default().render_editing("literal {style_guide} here", "guide-token-7f3");
        assert!(p.contains("literal {style_guide} here"));
        assert_eq!(p.matches("guide-token-7f3").count(), 1);
    }

    #[test]
    fn style_guide_containing_placeholder_text_is_not_rewritten() {
        let p = PromptTemplates::default().render_editing("draft-token-c91", "use {draft} sparingly");
        assert!(p.contains("use {draft} sparingly"));
        assert_eq!(p.matches("draft-token-c91").count(), 1);
    }

    #[test]
    fn validate_flags_missing_placeholders() {
        let t = PromptTemplates {
            style_analysis: "no placeholder".into(),
            editing: DEFAULT_EDITING_PROMPT.into(),
        };
        assert!(t.validate().is_err());

        let t = PromptTemplates {
            style_analysis: DEFAULT_STYLE_ANALYSIS_PROMPT.into(),
            editing: "{style_guide} only".into(),
        };
        assert!(t.validate().is_err());
    }
}
