use anyhow::Context;
use dotenv::dotenv;

use axum::{
    http::{Request, Uri},
    middleware::Next,
    response::Response,
};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{
    filter::LevelFilter, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

use spot_relay::{env_utils, get_main_router, utils, AppState};

struct RequestUri(Uri);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::debug!("initializing app state ...");

    let config = env_utils::AppConfig::from_env().context("invalid configuration")?;
    tracing::info!(
        repo = %config.content_api.repo,
        path = %config.content_api.path,
        branch = %config.content_api.branch,
        max_spots = config.updater.max_spots,
        "Spot list target"
    );
    let state = AppState::new(config)?;

    let port = env_utils::get_port();
    let addr = format!("[::]:{port}")
        .parse::<std::net::SocketAddr>()
        .context("unable to parse address")?;
    let host_uri = env_utils::get_host_uri();

    tracing::info!("Starting server at host: {}", host_uri);

    axum::Server::bind(&addr)
        .serve(
            get_main_router(state)
                .layer(axum::middleware::from_fn(
                    |request: Request<_>, next: Next<_>| async move {
                        let uri = request.uri().clone();

                        let mut response = next.run(request).await;

                        response.extensions_mut().insert(RequestUri(uri));

                        response
                    },
                ))
                .layer(TraceLayer::new_for_http().on_response(
                    |response: &Response, latency: std::time::Duration, _span: &tracing::Span| {
                        let url = match response.extensions().get::<RequestUri>().map(|r| &r.0) {
                            Some(uri) => uri.to_string(),
                            None => "unknown".to_string(),
                        };
                        let status = response.status();
                        let latency = utils::duration_to_ms_string(latency);

                        if url == "/healthcheck" {
                            tracing::trace!("{} {} {}", url, status, latency);
                            return;
                        }

                        tracing::debug!("{} {} {}", url, status, latency);
                    },
                ))
                .into_make_service(),
        )
        .await
        .context("error while starting API server")?;

    Ok(())
}
