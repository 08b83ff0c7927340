use std::sync::Arc;

use axum::{
    routing::{any, get},
    Router,
};

pub mod env_utils;
pub mod github;
pub mod route_handlers;
pub mod spot_updater;
pub mod spots;
pub mod utils;

use env_utils::AppConfig;
use github::ContentClient;

/// Built once at startup and cloned into every request.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub content_client: ContentClient,
}

impl AppState {
    pub fn new(config: AppConfig) -> anyhow::Result<AppState> {
        let content_client = ContentClient::new(&config.content_api)?;
        Ok(AppState {
            config: Arc::new(config),
            content_client,
        })
    }
}

/**
 * main router for the app, the spot webhook route plus a healthcheck
 **/
pub fn get_main_router(state: AppState) -> Router {
    tracing::debug!("initializing router ...");

    let wh_path = state.config.webhook_path.clone();
    tracing::info!("Webhook event route: {}", wh_path);

    Router::new()
        .route(&wh_path, any(route_handlers::webhooks::handler))
        .route("/healthcheck", get(|| async { "Ok" }))
        .with_state(state)
}
