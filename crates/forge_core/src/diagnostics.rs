//! Diagnostic reduction: pulling a primary message and location hint out of
//! a raw compiler diagnostic blob.

use serde::{Deserialize, Serialize};

/// Structured summary of a compile diagnostic.
///
/// `primary_message` and `location_hint` may be empty when the diagnostic
/// did not match the expected shape; `full_diagnostic` is always preserved
/// verbatim.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorContext {
    /// The complete diagnostic output, untouched.
    #[serde(rename = "fullDiagnostic")]
    pub full_diagnostic: String,
    /// The first `error[...]` line, if any.
    #[serde(rename = "primaryMessage")]
    pub primary_message: String,
    /// The `-->` location line following the primary message, if any.
    #[serde(rename = "locationHint")]
    pub location_hint: String,
}

/// Extracts an [`ErrorContext`] from raw diagnostic output.
pub struct ErrorContextExtractor;

impl ErrorContextExtractor {
    /// Reduce a diagnostic blob. Never fails: unmatched input yields empty
    /// message and hint with the full text preserved.
    ///
    /// Only the first error marker is used; multi-error diagnostics are not
    /// aggregated.
    pub fn extract(diagnostic: &str) -> ErrorContext {
        let mut context = ErrorContext {
            full_diagnostic: diagnostic.to_string(),
            ..Default::default()
        };

        let lines: Vec<&str> = diagnostic.lines().collect();
        for (i, line) in lines.iter().enumerate() {
            if line.contains("error[") {
                context.primary_message = line.to_string();
                if let Some(next) = lines.get(i + 1) {
                    if next.contains("-->") {
                        context.location_hint = next.to_string();
                    }
                }
                break;
            }
        }

        context
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_message_and_location() {
        let context =
            ErrorContextExtractor::extract("error[E0001]: mismatched types\n --> src/main.rs:3:5");

        assert_eq!(context.primary_message, "error[E0001]: mismatched types");
        assert_eq!(context.location_hint, " --> src/main.rs:3:5");
        assert_eq!(
            context.full_diagnostic,
            "error[E0001]: mismatched types\n --> src/main.rs:3:5"
        );
    }

    #[test]
    fn test_extract_empty_input() {
        let context = ErrorContextExtractor::extract("");

        assert!(context.primary_message.is_empty());
        assert!(context.location_hint.is_empty());
        assert!(context.full_diagnostic.is_empty());
    }

    #[test]
    fn test_extract_without_error_marker() {
        let context = ErrorContextExtractor::extract("warning: unused variable `x`");

        assert!(context.primary_message.is_empty());
        assert!(context.location_hint.is_empty());
        assert_eq!(context.full_diagnostic, "warning: unused variable `x`");
    }

    #[test]
    fn test_extract_uses_first_error_only() {
        let diagnostic = "error[E0425]: cannot find value `foo`\n --> src/main.rs:2:5\nerror[E0308]: mismatched types\n --> src/main.rs:9:1";
        let context = ErrorContextExtractor::extract(diagnostic);

        assert_eq!(context.primary_message, "error[E0425]: cannot find value `foo`");
        assert_eq!(context.location_hint, " --> src/main.rs:2:5");
    }

    #[test]
    fn test_extract_message_without_location_line() {
        let context = ErrorContextExtractor::extract(
            "error[E0599]: no method named `push` found\nsome unrelated line",
        );

        assert_eq!(context.primary_message, "error[E0599]: no method named `push` found");
        assert!(context.location_hint.is_empty());
    }
}
