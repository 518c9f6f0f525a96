use std::sync::LazyLock;

use regex::Regex;

use crate::models::{FrontMatter, ParsedPost};

// Opening delimiter at offset 0, shortest block up to the first `\n---`.
static FRONT_MATTER_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\A---\n(.+?)\n---").expect("front matter pattern is valid"));

/// Split a post into its `key: value` attributes and the remaining Markdown body.
///
/// Text that does not open with a `---` block comes back untouched as the body.
/// Lines without a colon, and lines whose key is blank, are skipped. The body is
/// everything after the closing delimiter, with no trimming.
pub fn parse(text: &str) -> ParsedPost {
    let Some(captures) = FRONT_MATTER_BLOCK.captures(text) else {
        return ParsedPost {
            attributes: FrontMatter::new(),
            body: text.to_string(),
        };
    };

    let block_end = captures.get_match().end();

    let mut attributes = FrontMatter::new();
    for line in captures[1].split('\n') {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        attributes.insert(key.to_string(), value.trim().to_string());
    }

    ParsedPost {
        attributes,
        body: text[block_end..].to_string(),
    }
}
