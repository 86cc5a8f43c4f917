//! Prompt composition for generation and repair requests.
//!
//! Pure string building: identical inputs always produce identical prompts.

use crate::diagnostics::ErrorContext;
use crate::retrieval::RetrievalExample;

/// System instructions for initial project generation.
const GENERATION_SYSTEM_PROMPT: &str = r#"You are an expert Rust developer. Create a complete, working Rust project.
Always include at minimum these files: Cargo.toml, src/main.rs, and README.md.
For Cargo.toml, include proper dependencies and metadata.
Format your response with clear file headers like:

[filename: Cargo.toml]
<file content>

[filename: src/main.rs]
<file content>

Make sure the project follows Rust best practices, has appropriate error
handling, and can be built successfully with 'cargo build'."#;

/// System instructions for compile-error repair.
const FIX_SYSTEM_PROMPT: &str = r#"You are an expert Rust developer fixing compilation errors.
Return the COMPLETE corrected content of every affected file, not snippets.
Format each file with a header like:

[filename: src/main.rs]
<file content>

Fix the actual error; do not add workarounds. Keep existing functionality intact."#;

/// Builds generation and fix prompts.
pub struct PromptBuilder;

impl PromptBuilder {
    pub fn generation_system_prompt() -> &'static str {
        GENERATION_SYSTEM_PROMPT
    }

    pub fn fix_system_prompt() -> &'static str {
        FIX_SYSTEM_PROMPT
    }

    /// Compose the initial generation prompt from the project description,
    /// optional extra requirements, and an optional similar-project
    /// reference.
    pub fn generation_prompt(
        description: &str,
        requirements: Option<&str>,
        reference: Option<&RetrievalExample>,
    ) -> String {
        let mut prompt = format!(
            "Create a Rust project based on this description:\n{}\n",
            description
        );

        if let Some(requirements) = requirements {
            prompt.push_str(&format!("\n{}\n", requirements));
        }

        if let Some(reference) = reference {
            prompt.push_str(&format!(
                "\nHere's a similar project you can use as reference:\n{}\n",
                reference.solution_text
            ));
        }

        prompt.push_str(
            "\nGenerate all required files for a complete, compilable Rust project.\n\
             Use proper Rust best practices and error handling.\n\
             Format each file in code blocks with the filename as the header.\n",
        );
        prompt
    }

    /// Compose a repair prompt from the failing project's description, the
    /// extracted diagnostic, retrieved fix examples, and an optional similar
    /// project reference.
    pub fn fix_prompt(
        description: &str,
        context: &ErrorContext,
        examples: &[RetrievalExample],
        reference: Option<&RetrievalExample>,
    ) -> String {
        let mut fix_examples = String::new();
        if !examples.is_empty() {
            fix_examples.push_str("Here are some examples of similar errors and their fixes:\n\n");
            for (i, example) in examples.iter().enumerate() {
                fix_examples.push_str(&format!(
                    "Example {}:\n{}\nFix: {}\n\n",
                    i + 1,
                    example.trigger_text,
                    example.solution_text
                ));
            }
        }

        let reference_text = reference
            .map(|r| {
                format!(
                    "\nHere's a similar project for reference:\n{}\n",
                    r.solution_text
                )
            })
            .unwrap_or_default();

        format!(
            "Here is a Rust project that failed to compile. Help me fix the compilation errors.\n\n\
             Project description: {}\n{}\n\
             Compilation error:\n{}\n\n\
             {}\n\
             Please provide the fixed code for all affected files.\n",
            description, reference_text, context.full_diagnostic, fix_examples
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::ErrorContextExtractor;

    fn example(trigger: &str, solution: &str) -> RetrievalExample {
        RetrievalExample {
            trigger_text: trigger.to_string(),
            solution_text: solution.to_string(),
        }
    }

    #[test]
    fn test_generation_prompt_is_deterministic() {
        let reference = example("chess engine", "[filename: Cargo.toml]\n...");
        let a = PromptBuilder::generation_prompt("a chess game", Some("use bitboards"), Some(&reference));
        let b = PromptBuilder::generation_prompt("a chess game", Some("use bitboards"), Some(&reference));

        assert_eq!(a, b);
        assert!(a.contains("a chess game"));
        assert!(a.contains("use bitboards"));
        assert!(a.contains("similar project"));
    }

    #[test]
    fn test_generation_prompt_without_optionals() {
        let prompt = PromptBuilder::generation_prompt("a todo cli", None, None);

        assert!(prompt.contains("a todo cli"));
        assert!(!prompt.contains("similar project"));
    }

    #[test]
    fn test_fix_prompt_includes_full_diagnostic() {
        let context = ErrorContextExtractor::extract(
            "error[E0308]: mismatched types\n --> src/main.rs:3:5",
        );
        let prompt = PromptBuilder::fix_prompt("a todo cli", &context, &[], None);

        assert!(prompt.contains("error[E0308]: mismatched types"));
        assert!(prompt.contains(" --> src/main.rs:3:5"));
        assert!(prompt.contains("a todo cli"));
    }

    #[test]
    fn test_fix_prompt_enumerates_examples() {
        let context = ErrorContextExtractor::extract("error[E0308]: mismatched types");
        let examples = vec![
            example("error[E0308]: mismatched types", "use .to_string()"),
            example("error[E0425]: cannot find value", "declare the variable"),
        ];
        let prompt = PromptBuilder::fix_prompt("demo", &context, &examples, None);

        assert!(prompt.contains("Example 1:"));
        assert!(prompt.contains("Fix: use .to_string()"));
        assert!(prompt.contains("Example 2:"));
        assert!(prompt.contains("Fix: declare the variable"));
    }

    #[test]
    fn test_system_prompts_mention_wire_format() {
        assert!(PromptBuilder::generation_system_prompt().contains("[filename: Cargo.toml]"));
        assert!(PromptBuilder::fix_system_prompt().contains("[filename: src/main.rs]"));
    }
}
