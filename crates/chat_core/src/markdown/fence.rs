use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Language reported for fences without a tag.
pub const DEFAULT_LANGUAGE: &str = "plaintext";

// ``` + tag up to end of line + newline + body (lazy, spans lines) + ```
static FENCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"```([^\n]*)\n((?s:.*?))```").expect("fence regex is valid"));

/// A fenced code block found in a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeBlock {
    pub language: String,
    pub code: String,
    /// Byte offset of the opening fence.
    pub start: usize,
    /// Byte offset just past the closing fence.
    pub end: usize,
}

/// Result of splitting a message into prose and code.
///
/// `text_segments[i]` is the prose right before `blocks[i]` (possibly empty).
/// A trailing segment after the last block is present only when non-empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    pub blocks: Vec<CodeBlock>,
    pub text_segments: Vec<String>,
}

/// Borrowed view of an [`Extraction`] in reading order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    Text(&'a str),
    Code(&'a CodeBlock),
}

impl Extraction {
    /// Interleave prose and code in the order they appear; empty prose is skipped.
    pub fn segments(&self) -> Vec<Segment<'_>> {
        let mut out = Vec::with_capacity(self.blocks.len() + self.text_segments.len());
        for (index, text) in self.text_segments.iter().enumerate() {
            if !text.is_empty() {
                out.push(Segment::Text(text.as_str()));
            }
            if let Some(block) = self.blocks.get(index) {
                out.push(Segment::Code(block));
            }
        }
        out
    }
}

/// Split `content` into code blocks and the prose around them.
///
/// An unterminated fence never matches and is left in the prose untouched.
pub fn extract(content: &str) -> Extraction {
    let mut blocks = Vec::new();
    let mut text_segments = Vec::new();
    let mut last_index = 0;

    for captures in FENCE_RE.captures_iter(content) {
        let Some(whole) = captures.get(0) else {
            continue;
        };
        let language = captures
            .get(1)
            .map(|m| m.as_str().trim().to_lowercase())
            .filter(|lang| !lang.is_empty())
            .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());
        let code = captures
            .get(2)
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or_default();

        text_segments.push(content[last_index..whole.start()].to_string());
        blocks.push(CodeBlock {
            language,
            code,
            start: whole.start(),
            end: whole.end(),
        });
        last_index = whole.end();
    }

    if blocks.is_empty() {
        return Extraction {
            blocks,
            text_segments: vec![content.to_string()],
        };
    }

    if last_index < content.len() {
        text_segments.push(content[last_index..].to_string());
    }

    Extraction {
        blocks,
        text_segments,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_fences_is_identity() {
        let extraction = extract("no fences here");
        assert!(extraction.blocks.is_empty());
        assert_eq!(extraction.text_segments, vec!["no fences here"]);
    }

    #[test]
    fn test_single_block_between_prose() {
        let extraction = extract("a ```js\ncode();\n``` b");
        assert_eq!(extraction.blocks.len(), 1);
        assert_eq!(extraction.blocks[0].language, "js");
        assert_eq!(extraction.blocks[0].code, "code();");
        assert_eq!(extraction.text_segments, vec!["a ", " b"]);
    }

    #[test]
    fn test_span_covers_the_fence() {
        let content = "a ```js\ncode();\n``` b";
        let block = &extract(content).blocks[0];
        assert_eq!(&content[block.start..block.end], "```js\ncode();\n```");
    }

    #[test]
    fn test_language_is_normalised() {
        let extraction = extract("```  Rust \nfn main() {}\n```");
        assert_eq!(extraction.blocks[0].language, "rust");

        let extraction = extract("```\n  plain  \n```");
        assert_eq!(extraction.blocks[0].language, DEFAULT_LANGUAGE);
        assert_eq!(extraction.blocks[0].code, "plain");
    }

    #[test]
    fn test_multiple_blocks_keep_alignment() {
        let content = "```py\nprint(1)\n```\n```sh\nls\n```\ndone";
        let extraction = extract(content);
        assert_eq!(extraction.blocks.len(), 2);
        assert_eq!(extraction.blocks[0].code, "print(1)");
        assert_eq!(extraction.blocks[1].language, "sh");
        assert_eq!(extraction.text_segments, vec!["", "\n", "\ndone"]);
    }

    #[test]
    fn test_multiline_body_is_non_greedy() {
        let content = "x\n```rust\nlet a = 1;\n\nlet b = 2;\n```\ny\n```\nz\n```";
        let extraction = extract(content);
        assert_eq!(extraction.blocks.len(), 2);
        assert_eq!(extraction.blocks[0].code, "let a = 1;\n\nlet b = 2;");
        assert_eq!(extraction.blocks[1].code, "z");
    }

    #[test]
    fn test_unterminated_fence_stays_prose() {
        let content = "before ```js\nlet a = 1;";
        let extraction = extract(content);
        assert!(extraction.blocks.is_empty());
        assert_eq!(extraction.text_segments, vec![content]);
    }

    #[test]
    fn test_odd_fence_count_leaves_trailing_marker() {
        let content = "```js\na\n``` mid ```py\nb";
        let extraction = extract(content);
        assert_eq!(extraction.blocks.len(), 1);
        assert_eq!(extraction.text_segments, vec!["", " mid ```py\nb"]);
    }

    #[test]
    fn test_extract_is_idempotent_on_prose() {
        let first = extract("plain text\nwith lines");
        let second = extract(&first.text_segments[0]);
        assert_eq!(first, second);
    }

    #[test]
    fn test_segments_interleave() {
        let extraction = extract("intro\n```go\nx := 1\n```");
        let segments = extraction.segments();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0], Segment::Text("intro\n"));
        assert!(matches!(segments[1], Segment::Code(block) if block.language == "go"));
    }
}
