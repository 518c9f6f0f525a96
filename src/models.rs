use std::collections::HashMap;

use serde::Deserialize;

/// Attributes from a post's front-matter block. Values are never coerced.
pub type FrontMatter = HashMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedPost {
    pub attributes: FrontMatter,
    pub body: String,
}

impl ParsedPost {
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .get(key)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }
}

/// One entry of `blog/blogs.json`.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PostSummary {
    pub file: String,
    pub title: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub description: String,
}
