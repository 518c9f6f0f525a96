use std::sync::Arc;
use tokio::sync::broadcast;

use crate::config::SiteConfig;
use crate::source::ContentSource;

pub type RefreshBroadcaster = broadcast::Sender<()>;

/// Everything is fetched fresh per request, so the state only holds settings.
pub struct AppState {
    pub config: SiteConfig,
    pub source: ContentSource,
}

impl AppState {
    pub fn new(config: SiteConfig) -> Self {
        let source = config.content_source();
        Self { config, source }
    }
}

#[derive(Clone)]
pub struct RouterState {
    pub app_state: Arc<AppState>,
    pub broadcaster: RefreshBroadcaster,
}

impl axum::extract::FromRef<RouterState> for Arc<AppState> {
    fn from_ref(state: &RouterState) -> Self {
        state.app_state.clone()
    }
}

impl axum::extract::FromRef<RouterState> for RefreshBroadcaster {
    fn from_ref(state: &RouterState) -> Self {
        state.broadcaster.clone()
    }
}
