use tracing::error;

use crate::escape::escape_html;
use crate::post_index::recent_posts_list;
use crate::source::Fetch;

pub const HEADER: &str = "header.html";
pub const SIDEBAR: &str = "sidebar.html";

/// Where the sidebar fragment receives its recent-posts entries.
const RECENT_POSTS_SLOT: &str = "{{ recent_posts }}";

/// Fetch a shared HTML fragment. Fragments are trusted and injected verbatim;
/// a failure leaves an escaped message in the container instead.
pub async fn load_fragment<S: Fetch>(source: &S, name: &str) -> String {
    match source.fetch_text(name).await {
        Ok(html) => html,
        Err(e) => {
            error!("Failed to load {}: {}", name, e);
            format!(
                "<p class=\"fragment-error\">{}</p>",
                escape_html(&e.to_string())
            )
        }
    }
}

/// The sidebar, with the most recent posts filled in once it has loaded.
pub async fn load_sidebar<S: Fetch>(source: &S, recent_limit: usize) -> String {
    let sidebar = match source.fetch_text(SIDEBAR).await {
        Ok(html) => html,
        Err(e) => {
            error!("Error loading sidebar: {}", e);
            return format!(
                "<p class=\"fragment-error\">{}</p>",
                escape_html(&e.to_string())
            );
        }
    };

    if !sidebar.contains(RECENT_POSTS_SLOT) {
        return sidebar;
    }
    let recent = recent_posts_list(source, recent_limit).await;
    sidebar.replace(RECENT_POSTS_SLOT, &recent)
}
