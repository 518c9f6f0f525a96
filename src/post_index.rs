use std::cmp::Reverse;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use tracing::{error, info};

use crate::error::LoadError;
use crate::escape::escape_html;
use crate::models::PostSummary;
use crate::source::Fetch;

pub const INDEX_PATH: &str = "blog/blogs.json";

/// Number of entries in the sidebar's "recent posts" list.
pub const RECENT_POSTS: usize = 3;

// What JavaScript's encodeURIComponent leaves alone.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

fn parse_date(date: &str) -> Option<NaiveDateTime> {
    let date = date.trim();
    if let Ok(day) = NaiveDate::parse_from_str(date, "%Y-%m-%d") {
        return day.and_hms_opt(0, 0, 0);
    }
    DateTime::parse_from_rfc3339(date)
        .map(|moment| moment.naive_utc())
        .ok()
}

/// Newest first. Posts whose date cannot be read go last, in file order.
pub fn sort_by_date_desc(posts: &mut [PostSummary]) {
    posts.sort_by_key(|post| Reverse(parse_date(&post.date)));
}

/// Fetch `blog/blogs.json` and return its posts newest first.
pub async fn load_index<S: Fetch>(source: &S) -> Result<Vec<PostSummary>, LoadError> {
    let raw = source.fetch_text(INDEX_PATH).await?;
    let mut posts: Vec<PostSummary> = serde_json::from_str(&raw).map_err(|e| LoadError::Decode {
        path: INDEX_PATH.to_string(),
        reason: e.to_string(),
    })?;
    sort_by_date_desc(&mut posts);
    info!(count = posts.len(), "loaded post index");
    Ok(posts)
}

pub fn post_url(file: &str) -> String {
    format!(
        "/blog/post.html?file={}",
        utf8_percent_encode(file, URI_COMPONENT)
    )
}

fn display_date(date: &str) -> String {
    match parse_date(date) {
        Some(moment) => moment.format("%-m/%-d/%Y").to_string(),
        None => date.to_string(),
    }
}

/// `<li>` entries for the full post list.
pub fn render_all_posts(posts: &[PostSummary]) -> String {
    let mut list_items = String::new();
    for post in posts {
        list_items.push_str(&format!(
            "<li>\n  <a href=\"{}\">{}</a>\n  <div class=\"post-date\">{}</div>\n  <div class=\"post-description\">{}</div>\n</li>\n",
            escape_html(&post_url(&post.file)),
            escape_html(&post.title),
            escape_html(&display_date(&post.date)),
            escape_html(&post.description),
        ));
    }
    list_items
}

/// `<li>` links for the first `limit` posts.
pub fn render_recent_posts(posts: &[PostSummary], limit: usize) -> String {
    posts
        .iter()
        .take(limit)
        .map(|post| {
            format!(
                "<li><a href=\"{}\">{}</a></li>\n",
                escape_html(&post_url(&post.file)),
                escape_html(&post.title)
            )
        })
        .collect()
}

/// The list shown in place of the posts when the index cannot be loaded.
pub fn render_index_error(err: &LoadError) -> String {
    format!("<li>Error loading posts: {}</li>", escape_html(&err.to_string()))
}

/// Load the index and render every post, or an inline error entry.
pub async fn all_posts_list<S: Fetch>(source: &S) -> String {
    match load_index(source).await {
        Ok(posts) => render_all_posts(&posts),
        Err(e) => {
            error!("Failed to load post index: {}", e);
            render_index_error(&e)
        }
    }
}

/// Load the index and render the `limit` most recent posts, or an inline error entry.
pub async fn recent_posts_list<S: Fetch>(source: &S, limit: usize) -> String {
    match load_index(source).await {
        Ok(posts) => render_recent_posts(&posts, limit),
        Err(e) => {
            error!("Failed to load post index: {}", e);
            render_index_error(&e)
        }
    }
}
