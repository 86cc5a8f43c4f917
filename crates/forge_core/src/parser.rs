//! Resilient response parsing: turning loosely structured model output into
//! a well-formed file set.
//!
//! Models are asked to emit `[filename: <path>]` marker blocks, but they
//! frequently answer with bare fenced code blocks or prose instead. The
//! parser runs an ordered chain of extraction strategies and takes the first
//! non-empty result, so the fallback precedence is explicit and each strategy
//! can be tested on its own.

use regex::Regex;
use tracing::debug;

use crate::files::{
    FileSet, DEFAULT_ENTRY_POINT, DEFAULT_MANIFEST, ENTRY_POINT_PATH, MANIFEST_PATH, README_PATH,
};

/// Language tags that models sometimes leave where a filename belongs.
const LANGUAGE_TAGS: [&str; 4] = ["toml", "rust", "markdown", "bash"];

/// Entries under a language tag shorter than this are parser false positives.
const LANGUAGE_TAG_CONTENT_LIMIT: usize = 100;

/// One extraction strategy in the fallback chain.
pub trait ExtractionStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Attempt extraction. An empty result means "no opinion" and the chain
    /// moves on to the next strategy.
    fn extract(&self, text: &str) -> FileSet;
}

/// Parses model responses into file sets.
pub struct ResponseParser {
    strategies: Vec<Box<dyn ExtractionStrategy>>,
}

impl Default for ResponseParser {
    fn default() -> Self {
        Self {
            strategies: vec![
                Box::new(MarkerExtraction),
                Box::new(FencedBlockClassification),
                Box::new(SectionSlicing),
            ],
        }
    }
}

impl ResponseParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a response into a file set. Never fails and never returns an
    /// empty set: when no strategy extracts anything, a minimal default
    /// manifest and entry point are synthesized.
    pub fn parse(&self, text: &str) -> FileSet {
        let mut files = FileSet::new();

        for strategy in &self.strategies {
            let extracted = strategy.extract(text);
            if !extracted.is_empty() {
                debug!(
                    strategy = strategy.name(),
                    files = extracted.len(),
                    "extracted files from response"
                );
                files = extracted;
                break;
            }
        }

        discard_language_tag_entries(&mut files);

        if files.is_empty() {
            debug!("no files extracted, synthesizing default project");
            files.insert(MANIFEST_PATH, DEFAULT_MANIFEST);
            files.insert(ENTRY_POINT_PATH, DEFAULT_ENTRY_POINT);
        }

        files
    }
}

/// Strategy 1: explicit `[filename: <path>]` marker blocks, each running to
/// the next marker or end of text.
pub struct MarkerExtraction;

impl ExtractionStrategy for MarkerExtraction {
    fn name(&self) -> &'static str {
        "marker-extraction"
    }

    fn extract(&self, text: &str) -> FileSet {
        let mut files = FileSet::new();
        let Ok(marker) = Regex::new(r"\[filename:\s*([^\]]*)\]") else {
            return files;
        };

        let matches: Vec<_> = marker.captures_iter(text).collect();
        for (i, captures) in matches.iter().enumerate() {
            let Some(whole) = captures.get(0) else { continue };
            let Some(name) = captures.get(1) else { continue };

            let end = matches
                .get(i + 1)
                .and_then(|next| next.get(0))
                .map(|m| m.start())
                .unwrap_or(text.len());

            let filename = name.as_str().trim();
            let content = clean_code_block(&text[whole.end()..end]);
            if !filename.is_empty() && !content.is_empty() {
                files.insert(filename, content);
            }
        }
        files
    }
}

/// Strategy 2: bare fenced code blocks, classified by content signature and
/// assigned canonical filenames.
pub struct FencedBlockClassification;

impl ExtractionStrategy for FencedBlockClassification {
    fn name(&self) -> &'static str {
        "fenced-block-classification"
    }

    fn extract(&self, text: &str) -> FileSet {
        let mut files = FileSet::new();
        let Ok(fence) = Regex::new(r"(?s)```(?:\w+)?\s*(.*?)```") else {
            return files;
        };

        for captures in fence.captures_iter(text) {
            let Some(block) = captures.get(1) else { continue };
            let block = block.as_str().trim();
            if block.is_empty() {
                continue;
            }

            if block.contains("[package]") && block.contains("name =") && block.contains("version =")
            {
                files.insert(MANIFEST_PATH, block);
            } else if block.contains("fn main()") {
                files.insert(ENTRY_POINT_PATH, block);
            } else if looks_like_documentation(block) {
                files.insert(README_PATH, block);
            }
        }
        files
    }
}

/// Strategy 3: last resort — slice the raw text after known filename
/// substrings, up to the next marker or fence.
pub struct SectionSlicing;

impl ExtractionStrategy for SectionSlicing {
    fn name(&self) -> &'static str {
        "section-slicing"
    }

    fn extract(&self, text: &str) -> FileSet {
        let mut files = FileSet::new();
        let known: [(&str, &str); 3] = [
            ("Cargo.toml", MANIFEST_PATH),
            ("main.rs", ENTRY_POINT_PATH),
            ("README", README_PATH),
        ];

        for (identifier, path) in known {
            if text.contains(identifier) {
                let section = extract_section(text, identifier);
                if !section.is_empty() {
                    files.insert(path, section);
                }
            }
        }
        files
    }
}

/// Strip fence syntax around a captured block: a leading ```` ``` ```` line
/// with an optional language tag and a trailing ```` ``` ````.
fn clean_code_block(text: &str) -> String {
    let mut text = text.trim();

    if let Ok(open) = Regex::new(r"^```\w*[ \t]*\r?\n?") {
        if let Some(m) = open.find(text) {
            text = &text[m.end()..];
        }
    }
    if let Some(stripped) = text.trim_end().strip_suffix("```") {
        return stripped.trim().to_string();
    }
    text.trim().to_string()
}

/// Slice the text that follows `identifier`, stopping at the next filename
/// marker or code fence.
fn extract_section(text: &str, identifier: &str) -> String {
    let Some(position) = text.find(identifier) else {
        return String::new();
    };
    let mut section = &text[position + identifier.len()..];

    let stop = [section.find("[filename:"), section.find("```")]
        .into_iter()
        .flatten()
        .min();
    if let Some(stop) = stop {
        section = &section[..stop];
    }

    // Drop marker punctuation before the content proper; keep characters
    // that legitimately start file content such as `[package]` or headings.
    section
        .trim_start_matches(|c: char| {
            !(c.is_alphanumeric() || c == '_' || c == '[' || c == '#')
        })
        .trim()
        .to_string()
}

fn looks_like_documentation(block: &str) -> bool {
    let head: String = block.chars().take(20).collect();
    block.starts_with("# ") || head.contains("# ")
}

/// Discard entries whose "filename" is actually a language tag with
/// trivially small content. These come from loose fencing like
/// `[filename: toml]`.
fn discard_language_tag_entries(files: &mut FileSet) {
    for tag in LANGUAGE_TAGS {
        let small = files
            .get(tag)
            .map(|content| content.len() < LANGUAGE_TAG_CONTENT_LIMIT)
            .unwrap_or(false);
        if small {
            debug!(tag, "discarding language-tag entry");
            files.remove(tag);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_blocks_parse_to_exact_entries() {
        let parser = ResponseParser::new();
        let files = parser.parse("[filename: a.txt]\nhello\n[filename: b.txt]\nworld");

        assert_eq!(files.len(), 2);
        assert_eq!(files.get("a.txt"), Some("hello"));
        assert_eq!(files.get("b.txt"), Some("world"));
    }

    #[test]
    fn test_marker_blocks_strip_fence_syntax() {
        let parser = ResponseParser::new();
        let response = "[filename: Cargo.toml]\n```toml\n[package]\nname = \"demo\"\nversion = \"0.1.0\"\n```\n[filename: src/main.rs]\n```rust\nfn main() {}\n```";
        let files = parser.parse(response);

        assert_eq!(files.len(), 2);
        assert_eq!(
            files.get("Cargo.toml"),
            Some("[package]\nname = \"demo\"\nversion = \"0.1.0\"")
        );
        assert_eq!(files.get("src/main.rs"), Some("fn main() {}"));
    }

    #[test]
    fn test_unparseable_input_synthesizes_defaults() {
        let parser = ResponseParser::new();
        let files = parser.parse("I could not generate a project, sorry.");

        assert_eq!(files.len(), 2);
        assert_eq!(files.get(MANIFEST_PATH), Some(DEFAULT_MANIFEST));
        assert_eq!(files.get(ENTRY_POINT_PATH), Some(DEFAULT_ENTRY_POINT));
    }

    #[test]
    fn test_empty_input_synthesizes_defaults() {
        let parser = ResponseParser::new();
        let files = parser.parse("");

        assert_eq!(files.len(), 2);
        assert!(files.contains(MANIFEST_PATH));
        assert!(files.contains(ENTRY_POINT_PATH));
    }

    #[test]
    fn test_fenced_blocks_classified_by_signature() {
        let parser = ResponseParser::new();
        let response = "Here is the manifest:\n```toml\n[package]\nname = \"snake\"\nversion = \"0.1.0\"\n```\nAnd the code:\n```rust\nfn main() {\n    println!(\"snake\");\n}\n```\nDocs:\n```\n# Snake Game\nA terminal snake game.\n```";
        let files = parser.parse(response);

        assert!(files.get(MANIFEST_PATH).unwrap().contains("name = \"snake\""));
        assert!(files.get(ENTRY_POINT_PATH).unwrap().contains("println!(\"snake\")"));
        assert!(files.get(README_PATH).unwrap().starts_with("# Snake Game"));
    }

    #[test]
    fn test_section_slicing_as_last_resort() {
        let parser = ResponseParser::new();
        let response = "Your Cargo.toml\n[package]\nname = \"demo\"\nversion = \"0.1.0\"\n";
        let files = parser.parse(response);

        let manifest = files.get(MANIFEST_PATH).unwrap();
        assert!(manifest.contains("[package]"));
        assert!(manifest.contains("name = \"demo\""));
    }

    #[test]
    fn test_language_tag_entries_discarded() {
        let parser = ResponseParser::new();
        let files = parser.parse("[filename: toml]\nshort\n[filename: src/main.rs]\nfn main() {}");

        assert!(!files.contains("toml"));
        assert_eq!(files.get("src/main.rs"), Some("fn main() {}"));
    }

    #[test]
    fn test_language_tag_with_large_content_kept() {
        let parser = ResponseParser::new();
        let body = "x".repeat(200);
        let files = parser.parse(&format!("[filename: toml]\n{body}\n[filename: a.rs]\nfn a() {{}}"));

        assert!(files.contains("toml"));
    }

    #[test]
    fn test_marker_strategy_wins_over_fences() {
        let parser = ResponseParser::new();
        let response = "[filename: src/lib.rs]\npub fn lib() {}\n\n```rust\nfn main() {}\n```";
        let files = parser.parse(response);

        // The fenced main is part of the marker block's content tail, not a
        // separately classified file.
        assert!(files.contains("src/lib.rs"));
        assert!(!files.contains(MANIFEST_PATH));
    }

    #[test]
    fn test_marker_with_blank_content_skipped() {
        let parser = ResponseParser::new();
        let files = parser.parse("[filename: empty.rs]\n\n[filename: src/main.rs]\nfn main() {}");

        assert!(!files.contains("empty.rs"));
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn test_wire_format_round_trips_through_parse() {
        let mut files = FileSet::new();
        files.insert(MANIFEST_PATH, "[package]\nname = \"demo\"\nversion = \"0.1.0\"");
        files.insert(ENTRY_POINT_PATH, "fn main() {\n    println!(\"demo\");\n}");
        files.insert(README_PATH, "# Demo\nA demo project.");

        let parser = ResponseParser::new();
        let back = parser.parse(&files.to_wire());

        // Parsing trims block content, so trimmed equality is the contract.
        assert_eq!(back.len(), files.len());
        for (path, content) in files.iter() {
            assert_eq!(back.get(path), Some(content.trim()));
        }
    }

    #[test]
    fn test_nested_paths_accepted() {
        let parser = ResponseParser::new();
        let files = parser.parse("[filename: src/config.rs]\npub struct Config;\n");

        assert_eq!(files.get("src/config.rs"), Some("pub struct Config;"));
    }
}
