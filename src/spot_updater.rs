use reqwest::StatusCode;

use crate::env_utils::UpdaterSettings;
use crate::github::{ContentClient, RemoteSpots};
use crate::spots::Spot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    Committed { spots_count: usize },
    /// The content api refused the write. This is logged, not raised.
    Rejected { status: StatusCode },
}

/**
 * read-modify-write of the remote spot list: fetch it, put the new spot on top,
 * trim to the configured size and commit it back against the sha it was read at
 **/
pub async fn update_spots(
    client: &ContentClient,
    settings: &UpdaterSettings,
    new_spot: Spot,
) -> anyhow::Result<UpdateOutcome> {
    match try_update_spots(client, settings, new_spot).await {
        Ok(outcome) => Ok(outcome),
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "Error updating spot file");
            Err(e)
        }
    }
}

async fn try_update_spots(
    client: &ContentClient,
    settings: &UpdaterSettings,
    new_spot: Spot,
) -> anyhow::Result<UpdateOutcome> {
    let message = new_spot.commit_message();
    let mut attempt: u32 = 0;

    loop {
        let RemoteSpots { mut spots, sha } = client.fetch_spots().await?;
        spots.push_front_bounded(new_spot.clone(), settings.max_spots);

        let outcome = client
            .commit_spots(&spots, &message, sha.as_deref())
            .await?;

        if outcome.is_success() {
            tracing::info!(spots_count = spots.len(), "Successfully updated spot file");
            return Ok(UpdateOutcome::Committed {
                spots_count: spots.len(),
            });
        }

        if outcome.is_conflict() && attempt < settings.conflict_retries {
            attempt += 1;
            tracing::warn!(
                attempt,
                max_attempts = settings.conflict_retries,
                "Spot file changed underneath us, refetching"
            );
            continue;
        }

        tracing::error!(
            status_code = outcome.status.as_u16(),
            response = %outcome.body,
            "Failed to update spot file"
        );
        return Ok(UpdateOutcome::Rejected {
            status: outcome.status,
        });
    }
}
