use std::borrow::Cow;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::escape::escape_html;

const HOT_RELOAD_SCRIPT: &str = r#"
<script>
    const socket = new WebSocket("ws://" + window.location.host + "/ws");
    socket.onmessage = (event) => {
        if (event.data === "reload") {
            window.location.reload();
        }
    };
</script>
"#;

/// Where a page component writes the document title and meta description.
///
/// Values handed to the sink are already HTML-safe.
pub trait PageMetadata {
    fn set_title(&mut self, title: &str);
    fn set_description(&mut self, description: &str);
}

/// The `<head>` metadata of one rendered page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageHead {
    pub title: Option<String>,
    pub description: Option<String>,
}

impl PageHead {
    pub fn titled(title: &str) -> Self {
        Self {
            title: Some(escape_html(title)),
            description: None,
        }
    }

    fn meta_tags(&self) -> String {
        match &self.description {
            Some(description) => format!("<meta name=\"description\" content=\"{description}\">"),
            None => String::new(),
        }
    }
}

impl PageMetadata for PageHead {
    fn set_title(&mut self, title: &str) {
        self.title = Some(title.to_string());
    }

    fn set_description(&mut self, description: &str) {
        self.description = Some(description.to_string());
    }
}

/// Containers a page fills in before it is laid out.
pub struct PageParts<'a> {
    pub head: &'a PageHead,
    pub header: &'a str,
    pub sidebar: &'a str,
    pub content: &'a str,
}

// `{{ name }}` slots of the site layout.
static LAYOUT_SLOT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{ (\w+) \}\}").expect("layout slot pattern is valid"));

/// Fill the `{{ … }}` containers of the site layout.
///
/// Slots are found in the layout alone, in one pass; text placed into a slot
/// is never scanned for further slots. Unknown slots are left as they are.
pub fn render_with_layout(layout: &str, parts: PageParts<'_>, is_development: bool) -> String {
    let layout = if is_development {
        Cow::Owned(layout.replace("</body>", &format!("{}</body>", HOT_RELOAD_SCRIPT)))
    } else {
        Cow::Borrowed(layout)
    };

    let meta = parts.head.meta_tags();
    LAYOUT_SLOT
        .replace_all(&layout, |caps: &Captures<'_>| match &caps[1] {
            "title" => parts.head.title.as_deref().unwrap_or_default().to_string(),
            "meta" => meta.clone(),
            "header" => parts.header.to_string(),
            "sidebar" => parts.sidebar.to_string(),
            "content" => parts.content.to_string(),
            _ => caps[0].to_string(),
        })
        .into_owned()
}
