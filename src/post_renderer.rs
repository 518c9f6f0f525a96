//! Renders a single post selected by the `file` query parameter.
//!
//! One pass per request: `Idle → Loading → {Rendered | NotSpecified | LoadError}`.
//! Nothing is retried, and whatever state is reached is what the page shows.

use tracing::{info, warn};

use crate::error::LoadError;
use crate::escape::escape_html;
use crate::front_matter;
use crate::markdown::render_markdown_to_html;
use crate::page::PageMetadata;
use crate::source::{validate_path, Fetch};

/// Post identifiers are resolved inside this directory of the content root.
pub const POSTS_DIR: &str = "blog";

const UNTITLED: &str = "Untitled";
const NOT_SPECIFIED_TITLE: &str = "Post not found";
const LOAD_ERROR_TITLE: &str = "Error loading post";

/// Terminal state of a post render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostView {
    NotSpecified,
    Rendered {
        meta_html: String,
        content_html: String,
    },
    LoadError {
        message: String,
    },
}

impl PostView {
    pub fn is_rendered(&self) -> bool {
        matches!(self, PostView::Rendered { .. })
    }

    /// Contents of the `post-meta` container; empty unless the post rendered.
    pub fn meta_html(&self) -> &str {
        match self {
            PostView::Rendered { meta_html, .. } => meta_html,
            _ => "",
        }
    }

    /// Contents of the `post-content` container.
    pub fn content_html(&self) -> String {
        match self {
            PostView::NotSpecified => "<p><em>No post specified.</em></p>".to_string(),
            PostView::Rendered { content_html, .. } => content_html.clone(),
            PostView::LoadError { message } => {
                format!("<p><em>Error loading post:</em> {}</p>", escape_html(message))
            }
        }
    }

    pub fn to_html(&self) -> String {
        format!(
            "<div id=\"post-meta\">{}</div>\n<div id=\"post-content\">{}</div>",
            self.meta_html(),
            self.content_html()
        )
    }
}

fn metadata_block(title: &str, date: &str, description: &str) -> String {
    format!("\n<h1>{title}</h1>\n<p><em>{date}</em></p>\n<p>{description}</p>\n<hr>\n")
}

/// Fetch, parse and render the post named by `file`, writing the page title
/// and description into `head`.
pub async fn render_post<S, M>(source: &S, file: Option<&str>, owner: &str, head: &mut M) -> PostView
where
    S: Fetch,
    M: PageMetadata,
{
    let Some(file) = file.filter(|file| !file.is_empty()) else {
        head.set_title(NOT_SPECIFIED_TITLE);
        return PostView::NotSpecified;
    };

    match load_post(source, file).await {
        Ok(text) => {
            let view = render_loaded(&text, owner, head);
            info!(%file, "rendered post");
            view
        }
        Err(e) => {
            warn!(%file, "Failed to load post: {}", e);
            head.set_title(LOAD_ERROR_TITLE);
            PostView::LoadError {
                message: e.to_string(),
            }
        }
    }
}

async fn load_post<S: Fetch>(source: &S, file: &str) -> Result<String, LoadError> {
    let file = validate_path(file)?;
    source.fetch_text(&format!("{POSTS_DIR}/{file}")).await
}

fn render_loaded<M: PageMetadata>(text: &str, owner: &str, head: &mut M) -> PostView {
    let parsed = front_matter::parse(text);

    let safe_title = parsed.attribute("title").map_or_else(|| UNTITLED.to_string(), escape_html);
    let safe_date = parsed.attribute("date").map(escape_html).unwrap_or_default();
    let safe_description = parsed
        .attribute("description")
        .map(escape_html)
        .unwrap_or_default();

    head.set_title(&format!("{} – {}", safe_title, escape_html(owner)));
    if !safe_description.is_empty() {
        head.set_description(&safe_description);
    }

    PostView::Rendered {
        meta_html: metadata_block(&safe_title, &safe_date, &safe_description),
        content_html: render_markdown_to_html(&parsed.body),
    }
}

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;
    use scraper::{Html, Selector};

    use super::*;
    use crate::page::{render_with_layout, PageHead, PageParts};
    use crate::test_support::StubSource;

    const OWNER: &str = "Jane Doe";

    fn select_text(html: &str, selector: &str) -> Vec<String> {
        let fragment = Html::parse_fragment(html);
        let selector = Selector::parse(selector).unwrap();
        fragment
            .select(&selector)
            .map(|element| element.text().collect::<String>())
            .collect()
    }

    #[tokio::test]
    async fn renders_title_date_and_body() {
        let source = StubSource::new().with(
            "blog/posts/hello.md",
            "---\ntitle: Hello\ndate: 2024-01-01\n---\n# Section\n\nBody text.",
        );
        let mut head = PageHead::default();
        let view = render_post(&source, Some("posts/hello.md"), OWNER, &mut head).await;

        assert!(view.is_rendered());
        assert_eq!(head.title.as_deref(), Some("Hello – Jane Doe"));
        assert_eq!(head.description, None);
        assert_eq!(select_text(view.meta_html(), "h1"), ["Hello"]);
        assert_eq!(select_text(view.meta_html(), "p em"), ["2024-01-01"]);
        assert_eq!(select_text(view.meta_html(), "hr").len(), 1);
        assert_eq!(select_text(&view.content_html(), "h1"), ["Section"]);
    }

    #[tokio::test]
    async fn escapes_metadata_and_sets_description() {
        let source = StubSource::new().with(
            "blog/posts/x.md",
            "---\ntitle: <b>Bold</b>\ndate: 2024 & later\ndescription: \"Quoted\" 'text'\n---\nbody",
        );
        let mut head = PageHead::default();
        let view = render_post(&source, Some("posts/x.md"), OWNER, &mut head).await;

        let meta = view.meta_html();
        assert!(meta.contains("<h1>&lt;b&gt;Bold&lt;/b&gt;</h1>"));
        assert!(meta.contains("<p><em>2024 &amp; later</em></p>"));
        assert!(meta.contains("<p>&quot;Quoted&quot; &#039;text&#039;</p>"));
        assert_eq!(
            head.description.as_deref(),
            Some("&quot;Quoted&quot; &#039;text&#039;")
        );
        assert_eq!(head.title.as_deref(), Some("&lt;b&gt;Bold&lt;/b&gt; – Jane Doe"));
    }

    #[tokio::test]
    async fn missing_attributes_use_placeholders() {
        let source = StubSource::new().with("blog/plain.md", "No front matter here.");
        let mut head = PageHead::default();
        let view = render_post(&source, Some("plain.md"), OWNER, &mut head).await;

        assert_eq!(head.title.as_deref(), Some("Untitled – Jane Doe"));
        assert!(view.meta_html().contains("<h1>Untitled</h1>"));
        assert!(view.meta_html().contains("<p><em></em></p>"));
        assert!(view.content_html().contains("No front matter here."));
    }

    #[tokio::test]
    async fn empty_attribute_values_count_as_missing() {
        let source = StubSource::new().with(
            "blog/empty.md",
            "---\ntitle:\ndate:   \ndescription:\n---\nBody",
        );
        let mut head = PageHead::default();
        let view = render_post(&source, Some("empty.md"), OWNER, &mut head).await;

        assert_eq!(head.title.as_deref(), Some("Untitled – Jane Doe"));
        assert_eq!(head.description, None);
        assert!(view.meta_html().contains("<h1>Untitled</h1>"));
        assert!(view.meta_html().contains("<p><em></em></p>"));
    }

    #[tokio::test]
    async fn brace_metadata_stays_in_its_own_slot() {
        let source = StubSource::new().with(
            "blog/braces.md",
            "---\ntitle: {{ content }}\ndescription: {{ sidebar }}\n---\nSecret body",
        );
        let mut head = PageHead::default();
        let view = render_post(&source, Some("braces.md"), OWNER, &mut head).await;
        let page = render_with_layout(
            "<head><title>{{ title }}</title>{{ meta }}</head><body>{{ sidebar }}{{ content }}</body>",
            PageParts {
                head: &head,
                header: "",
                sidebar: "<aside class=\"side\"></aside>",
                content: &view.to_html(),
            },
            false,
        );

        assert!(page.contains("<title>{{ content }} – Jane Doe</title>"));
        assert!(page.contains("<meta name=\"description\" content=\"{{ sidebar }}\">"));
        assert_eq!(page.matches("Secret body").count(), 1);
        assert_eq!(page.matches("class=\"side\"").count(), 1);
    }

    #[tokio::test]
    async fn no_identifier_shows_placeholder_without_fetching() {
        let source = StubSource::new();
        for file in [None, Some("")] {
            let mut head = PageHead::default();
            let view = render_post(&source, file, OWNER, &mut head).await;
            assert_eq!(view, PostView::NotSpecified);
            assert_eq!(view.content_html(), "<p><em>No post specified.</em></p>");
            assert_eq!(view.meta_html(), "");
            assert_eq!(head.title.as_deref(), Some("Post not found"));
        }
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn failure_status_shows_error_without_metadata() {
        let source = StubSource::new().with_status("blog/posts/gone.md", StatusCode::NOT_FOUND);
        let mut head = PageHead::default();
        let view = render_post(&source, Some("posts/gone.md"), OWNER, &mut head).await;

        assert!(matches!(view, PostView::LoadError { .. }));
        assert_eq!(view.meta_html(), "");
        let content = view.content_html();
        assert!(content.starts_with("<p><em>Error loading post:</em> "));
        assert!(content.contains("404"));
        assert_eq!(head.title.as_deref(), Some("Error loading post"));
        assert_eq!(head.description, None);
    }

    #[tokio::test]
    async fn error_message_is_escaped() {
        let source = StubSource::new().failing_with("blog/a.md", "<script>alert(1)</script>");
        let mut head = PageHead::default();
        let view = render_post(&source, Some("a.md"), OWNER, &mut head).await;
        let content = view.content_html();
        assert!(content.contains("&lt;script&gt;"));
        assert!(!content.contains("<script>"));
    }

    #[tokio::test]
    async fn traversal_identifier_is_rejected() {
        let source = StubSource::new().with("header.html", "<nav></nav>");
        let mut head = PageHead::default();
        let view = render_post(&source, Some("../header.html"), OWNER, &mut head).await;

        assert!(matches!(view, PostView::LoadError { .. }));
        assert!(view.content_html().contains("Invalid content path"));
        assert_eq!(source.calls(), 0);
    }

    #[test]
    fn containers_wrap_both_parts() {
        let view = PostView::Rendered {
            meta_html: "<h1>T</h1>".to_string(),
            content_html: "<p>B</p>".to_string(),
        };
        assert_eq!(
            view.to_html(),
            "<div id=\"post-meta\"><h1>T</h1></div>\n<div id=\"post-content\"><p>B</p></div>"
        );
    }
}
