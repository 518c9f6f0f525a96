use std::future::Future;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{StatusCode, Uri},
    response::{Html, IntoResponse},
    routing::{get, get_service},
    Router,
};
use tower_http::services::{ServeDir, ServeFile};
use tracing::error;

use crate::escape::escape_html;
use crate::fragment::{load_fragment, load_sidebar, HEADER};
use crate::hot_reload::ws_handler;
use crate::markdown::render_markdown_to_html;
use crate::page::{render_with_layout, PageHead, PageParts};
use crate::post_index::all_posts_list;
use crate::post_renderer::render_post;
use crate::source::Fetch;
use crate::state::{AppState, RouterState};

const LAYOUT: &str = "layout.html";
const HOME: &str = "home.md";
const NOT_FOUND: &str = "not_found.html";

// Used when layout.html itself cannot be loaded.
const FALLBACK_LAYOUT: &str = "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>{{ title }}</title>{{ meta }}</head>\n<body>{{ header }}{{ sidebar }}<main>{{ content }}</main></body></html>\n";

/// First `file` value of the query string, the way `URLSearchParams::get` reads it.
fn first_file(params: &[(String, String)]) -> Option<&str> {
    params
        .iter()
        .find(|(key, _)| key == "file")
        .map(|(_, value)| value.as_str())
}

async fn load_layout(state: &AppState) -> String {
    match state.source.fetch_text(LAYOUT).await {
        Ok(layout) => layout,
        Err(e) => {
            error!("Failed to load layout, using fallback: {}", e);
            FALLBACK_LAYOUT.to_string()
        }
    }
}

/// Load the shared layout, header and sidebar alongside the page's own content.
async fn assemble<T, F>(state: &AppState, content: F) -> (String, T)
where
    F: Future<Output = (PageHead, String, T)>,
{
    let (layout, header, sidebar, (head, content, extra)) = futures::join!(
        load_layout(state),
        load_fragment(&state.source, HEADER),
        load_sidebar(&state.source, state.config.recent_posts),
        content,
    );

    let page = render_with_layout(
        &layout,
        PageParts {
            head: &head,
            header: &header,
            sidebar: &sidebar,
            content: &content,
        },
        state.config.is_development,
    );
    (page, extra)
}

async fn homepage(State(state): State<Arc<AppState>>) -> Html<String> {
    let content = async {
        let html = match state.source.fetch_text(HOME).await {
            Ok(markdown) => render_markdown_to_html(&markdown),
            Err(e) => {
                error!("Failed to load home page: {}", e);
                format!("<p><em>Error loading page:</em> {}</p>", escape_html(&e.to_string()))
            }
        };
        (PageHead::titled(&state.config.owner), html, ())
    };
    let (page, ()) = assemble(&state, content).await;
    Html(page)
}

async fn all_posts(State(state): State<Arc<AppState>>) -> Html<String> {
    let content = async {
        let items = all_posts_list(&state.source).await;
        let head = PageHead::titled(&format!("All posts – {}", state.config.owner));
        let html = format!("<h1>All posts</h1>\n<ul id=\"all-posts-list\">\n{items}</ul>");
        (head, html, ())
    };
    let (page, ()) = assemble(&state, content).await;
    Html(page)
}

async fn post_page(
    Query(params): Query<Vec<(String, String)>>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let content = async {
        let mut head = PageHead::default();
        let view = render_post(
            &state.source,
            first_file(&params),
            &state.config.owner,
            &mut head,
        )
        .await;
        let status = if view.is_rendered() {
            StatusCode::OK
        } else {
            StatusCode::NOT_FOUND
        };
        (head, view.to_html(), status)
    };
    let (page, status) = assemble(&state, content).await;
    (status, Html(page))
}

async fn not_found(uri: Uri, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let content = async {
        let path = escape_html(uri.path());
        let html = match state.source.fetch_text(NOT_FOUND).await {
            Ok(template) => template.replace("{{ path }}", &path),
            Err(_) => format!("<p>No page at <code>{path}</code>.</p>"),
        };
        (PageHead::titled("Page not found"), html, ())
    };
    let (page, ()) = assemble(&state, content).await;
    (StatusCode::NOT_FOUND, Html(page))
}

pub fn router(router_state: RouterState) -> Router {
    let static_root = router_state.app_state.config.content_dir.join("static");
    let static_dir = get_service(ServeDir::new(&static_root));
    let favicon = get_service(ServeFile::new(static_root.join("favicon.ico")));

    Router::new()
        .route("/", get(homepage))
        .route("/index.html", get(homepage))
        .route("/all-posts.html", get(all_posts))
        .route("/blog/post.html", get(post_page))
        .nest_service("/static", static_dir)
        .route_service("/favicon.ico", favicon)
        .route("/ws", get(ws_handler))
        .fallback(not_found)
        .with_state(router_state)
}
