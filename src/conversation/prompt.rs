//! System instruction builder for the chat stage.
//!
//! The instruction is synthesized on every completion call and never stored
//! in the history.  Two fixed templates exist per language:
//!
//! * **Fallback** — used when the lecture context is empty.
//! * **Grounded** — embeds the full lecture context verbatim after a
//!   `[講義資料]` / `[Lecture material]` header.
//!
//! Japanese (`"ja"`) and English (`"en"`) have dedicated wording; any other
//! language code falls back to the English templates.

// ---------------------------------------------------------------------------
// Templates
// ---------------------------------------------------------------------------

const FALLBACK_JA: &str = "あなたは親切な講義アシスタントです。";

const GROUNDED_JA: &str = "あなたは講義のアシスタントAIです。以下の講義資料（コンテキスト）に基づいて、生徒の質問に答えてください。\n\n[講義資料]\n";

const FALLBACK_EN: &str = "You are a helpful lecture assistant.";

const GROUNDED_EN: &str = "You are a lecture assistant AI. Answer the student's questions based on the lecture material (context) below.\n\n[Lecture material]\n";

// ---------------------------------------------------------------------------
// PromptBuilder
// ---------------------------------------------------------------------------

/// Builds the system instruction that prefixes every chat request.
///
/// # Example
/// ```rust
/// use lecture_voice::conversation::PromptBuilder;
///
/// let builder = PromptBuilder::new("en");
/// assert_eq!(builder.system_instruction(""), "You are a helpful lecture assistant.");
/// assert!(builder.system_instruction("Newton's laws...").contains("Newton's laws..."));
/// ```
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    language: String,
}

impl PromptBuilder {
    /// Create a builder for the given ISO-639-1 language code.
    pub fn new(language: &str) -> Self {
        Self {
            language: language.to_string(),
        }
    }

    /// Instruction for the given lecture context.
    ///
    /// An empty context yields the fallback phrase; anything else (including
    /// whitespace) is embedded verbatim.
    pub fn system_instruction(&self, context: &str) -> String {
        if context.is_empty() {
            return self.fallback().to_string();
        }
        let mut instruction = String::with_capacity(self.grounded_header().len() + context.len());
        instruction.push_str(self.grounded_header());
        instruction.push_str(context);
        instruction
    }

    fn fallback(&self) -> &'static str {
        match self.language.as_str() {
            "ja" => FALLBACK_JA,
            _ => FALLBACK_EN,
        }
    }

    fn grounded_header(&self) -> &'static str {
        match self.language.as_str() {
            "ja" => GROUNDED_JA,
            _ => GROUNDED_EN,
        }
    }
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new("ja")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_context_uses_fallback() {
        let ja = PromptBuilder::new("ja");
        assert_eq!(ja.system_instruction(""), FALLBACK_JA);
        assert!(!ja.system_instruction("").contains("[講義資料]"));
    }

    #[test]
    fn context_is_embedded_verbatim() {
        let ctx = "Newton's laws...\n  1. inertia";
        let instruction = PromptBuilder::new("ja").system_instruction(ctx);
        assert!(instruction.starts_with("あなたは講義のアシスタントAIです。"));
        assert!(instruction.ends_with(ctx));
    }

    #[test]
    fn unknown_language_falls_back_to_english() {
        let builder = PromptBuilder::new("fr");
        assert_eq!(builder.system_instruction(""), FALLBACK_EN);
        assert!(builder.system_instruction("x").starts_with("You are a lecture assistant AI."));
    }

    #[test]
    fn default_is_japanese() {
        assert_eq!(PromptBuilder::default().system_instruction(""), FALLBACK_JA);
    }
}
