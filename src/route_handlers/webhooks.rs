use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method, StatusCode},
};
use chrono::Utc;

use crate::{spot_updater, spots::Spot, AppState};

/**
 * receives a spot notification as a url-encoded form post and records it in the
 * remote spot list. mounted for every method so anything but POST gets a 405 here
 **/
pub async fn handler(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, String) {
    let received_at = Utc::now();
    tracing::info!(
        method = %method,
        headers = ?headers,
        timestamp = %received_at.to_rfc3339(),
        "Received spot webhook"
    );

    if method != Method::POST {
        return (
            StatusCode::METHOD_NOT_ALLOWED,
            "Method not allowed".to_string(),
        );
    }

    let spot = Spot::from_form(&body, received_at);
    tracing::info!(spot = ?spot, "Spot data received");

    match spot_updater::update_spots(&state.content_client, &state.config.updater, spot).await {
        Ok(_) => (StatusCode::OK, "OK".to_string()),
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "Error processing webhook");
            (StatusCode::INTERNAL_SERVER_ERROR, format!("Error: {e:#}"))
        }
    }
}
