use std::sync::Arc;

use anyhow::Context;
use reqwest::{header, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};

use crate::env_utils::ContentApiConfig;
use crate::spots::SpotList;

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

#[derive(Deserialize, Debug)]
struct ContentEnvelope {
    content: String,
    sha: String,
    #[serde(default)]
    encoding: Option<String>,
}

impl ContentEnvelope {
    /// Files over 1MB come back with `"encoding": "none"` and no content.
    fn into_remote_spots(self) -> anyhow::Result<RemoteSpots> {
        match self.encoding.as_deref() {
            None | Some("base64") => {}
            Some(other) => {
                return Err(anyhow::anyhow!(
                    "Unsupported content encoding '{other}' for spot file"
                ))
            }
        }

        Ok(RemoteSpots {
            spots: SpotList::decode_base64(&self.content)?,
            sha: Some(self.sha),
        })
    }
}

#[derive(Serialize, Debug)]
struct CommitRequest<'a> {
    message: &'a str,
    content: String,
    branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

/// The stored list and the sha it was read at. No sha means the file doesn't exist yet.
#[derive(Debug, Default)]
pub struct RemoteSpots {
    pub spots: SpotList,
    pub sha: Option<String>,
}

#[derive(Debug)]
pub struct CommitOutcome {
    pub status: StatusCode,
    pub body: String,
}

impl CommitOutcome {
    pub fn is_success(&self) -> bool {
        self.status == StatusCode::OK || self.status == StatusCode::CREATED
    }

    pub fn is_conflict(&self) -> bool {
        self.status == StatusCode::CONFLICT
    }
}

/// Reads and writes the spot file through the repository contents api.
#[derive(Clone)]
pub struct ContentClient {
    http: reqwest::Client,
    config: Arc<ContentApiConfig>,
}

impl ContentClient {
    pub fn new(config: &ContentApiConfig) -> anyhow::Result<ContentClient> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(ContentClient {
            http,
            config: Arc::new(config.clone()),
        })
    }

    pub fn file_url(&self) -> String {
        format!(
            "{}/repos/{}/contents/{}",
            self.config.api_url, self.config.repo, self.config.path
        )
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header(header::AUTHORIZATION, format!("token {}", self.config.token))
            .header(header::ACCEPT, "application/vnd.github.v3+json")
    }

    pub async fn fetch_spots(&self) -> anyhow::Result<RemoteSpots> {
        let resp = self
            .authorized(self.http.get(self.file_url()))
            .query(&[("ref", self.config.branch.as_str())])
            .send()
            .await
            .context("Failed to send request for spot file")?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            tracing::debug!("{} not found, starting a new list", self.config.path);
            return Ok(RemoteSpots::default());
        }

        if !status.is_success() {
            return Err(anyhow::anyhow!(
                "Received a non-success status code {} fetching {}: {}",
                status,
                self.config.path,
                resp.text().await.unwrap_or("Unknown error".to_string())
            ));
        }

        let text = resp.text().await.context("Failed to read spot file response")?;
        let envelope: ContentEnvelope =
            serde_json::from_str(&text).context("Failed to deserialize content envelope")?;

        let remote = envelope.into_remote_spots()?;
        tracing::trace!(sha = ?remote.sha, count = remote.spots.len(), "Fetched spot file");

        Ok(remote)
    }

    /// A rejected write comes back as `Ok` with its status; only transport failures are `Err`.
    pub async fn commit_spots(
        &self,
        spots: &SpotList,
        message: &str,
        sha: Option<&str>,
    ) -> anyhow::Result<CommitOutcome> {
        let body = CommitRequest {
            message,
            content: spots.encode_base64()?,
            branch: &self.config.branch,
            sha,
        };

        let resp = self
            .authorized(self.http.put(self.file_url()))
            .json(&body)
            .send()
            .await
            .context("Failed to send spot file update")?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .context("Failed to read spot file update response")?;

        Ok(CommitOutcome { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ContentApiConfig {
        ContentApiConfig {
            api_url: "https://api.github.com".to_string(),
            token: "t0ken".to_string(),
            repo: "k1abc/spots".to_string(),
            path: "data/spots.json".to_string(),
            branch: "main".to_string(),
        }
    }

    #[test]
    fn file_url_points_at_contents() {
        let client = ContentClient::new(&config()).unwrap();
        assert_eq!(
            client.file_url(),
            "https://api.github.com/repos/k1abc/spots/contents/data/spots.json"
        );
    }

    #[test]
    fn commit_request_omits_missing_sha() {
        let create = CommitRequest {
            message: "m",
            content: "W10=".to_string(),
            branch: "main",
            sha: None,
        };
        let value = serde_json::to_value(&create).unwrap();
        assert!(value.get("sha").is_none());
        assert_eq!(value["branch"], "main");

        let update = CommitRequest {
            sha: Some("abc123"),
            ..create
        };
        let value = serde_json::to_value(&update).unwrap();
        assert_eq!(value["sha"], "abc123");
    }

    #[test]
    fn envelope_must_be_base64() {
        let envelope: ContentEnvelope = serde_json::from_str(
            r#"{"content": "", "sha": "big", "encoding": "none"}"#,
        )
        .unwrap();
        let err = envelope.into_remote_spots().unwrap_err();
        assert!(err.to_string().contains("'none'"), "{err}");

        let envelope: ContentEnvelope = serde_json::from_str(
            r#"{"content": "W10=\n", "sha": "abc", "encoding": "base64"}"#,
        )
        .unwrap();
        let remote = envelope.into_remote_spots().unwrap();
        assert!(remote.spots.is_empty());
        assert_eq!(remote.sha.as_deref(), Some("abc"));
    }

    #[test]
    fn only_200_and_201_are_success() {
        let outcome = |status| CommitOutcome {
            status,
            body: String::new(),
        };
        assert!(outcome(StatusCode::OK).is_success());
        assert!(outcome(StatusCode::CREATED).is_success());
        assert!(!outcome(StatusCode::ACCEPTED).is_success());
        assert!(!outcome(StatusCode::CONFLICT).is_success());
        assert!(outcome(StatusCode::CONFLICT).is_conflict());
    }
}
