mod config;
mod error;
mod escape;
mod fragment;
mod front_matter;
mod hot_reload;
mod markdown;
mod models;
mod page;
mod post_index;
mod post_renderer;
mod routes;
mod source;
mod state;
#[cfg(test)]
mod test_support;

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use tokio::{net::TcpListener, sync::broadcast};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::SiteConfig;
use crate::hot_reload::start_content_watcher;
use crate::state::{AppState, RouterState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = SiteConfig::load()?;
    info!(
        owner = %config.owner,
        content_dir = %config.content_dir.display(),
        content_url = ?config.content_url,
        "RUST_ENV is set to development: {}",
        config.is_development
    );

    let (tx, _rx) = broadcast::channel(1);
    if config.is_development {
        if config.content_url.is_some() {
            info!("Hot reload is only available for local content; skipping watcher.");
        } else {
            info!("Hot reload enabled. Check logs for file change events.");
            start_content_watcher(tx.clone(), config.content_dir.clone());
        }
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let router_state = RouterState {
        app_state: Arc::new(AppState::new(config)),
        broadcaster: tx,
    };
    let app = routes::router(router_state);

    info!(%addr, "listening");
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
