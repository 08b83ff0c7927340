use std::env;

use anyhow::Context;
use tracing::{error, warn};

use crate::utils::hash_string;

const DEFAULT_API_URL: &str = "https://api.github.com";
const DEFAULT_SPOTS_PATH: &str = "spots.json";
const DEFAULT_BRANCH: &str = "main";
const DEFAULT_MAX_SPOTS: usize = 50;

/// Where and how the spot list is stored.
#[derive(Debug, Clone)]
pub struct ContentApiConfig {
    pub api_url: String,
    pub token: String,
    /// `owner/name`
    pub repo: String,
    pub path: String,
    pub branch: String,
}

#[derive(Debug, Clone)]
pub struct UpdaterSettings {
    pub max_spots: usize,
    /// Extra attempts after a 409 from the content api. 0 means a rejected write is only logged.
    pub conflict_retries: u32,
}

impl Default for UpdaterSettings {
    fn default() -> Self {
        Self {
            max_spots: DEFAULT_MAX_SPOTS,
            conflict_retries: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub content_api: ContentApiConfig,
    pub updater: UpdaterSettings,
    pub webhook_path: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<AppConfig> {
        let content_api = ContentApiConfig {
            api_url: env::var("GITHUB_API_URL")
                .unwrap_or_else(|_| DEFAULT_API_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            token: env::var("GITHUB_TOKEN").context("GITHUB_TOKEN env var required")?,
            repo: get_github_repo()?,
            path: env::var("SPOTS_PATH").unwrap_or_else(|_| DEFAULT_SPOTS_PATH.to_string()),
            branch: env::var("GITHUB_BRANCH").unwrap_or_else(|_| DEFAULT_BRANCH.to_string()),
        };

        let updater = UpdaterSettings {
            max_spots: parse_or_default("MAX_SPOTS", DEFAULT_MAX_SPOTS),
            conflict_retries: parse_or_default("SPOT_WRITE_RETRIES", 0),
        };

        Ok(AppConfig {
            content_api,
            updater,
            webhook_path: get_webhook_path(),
        })
    }
}

fn get_github_repo() -> anyhow::Result<String> {
    let repo = env::var("GITHUB_REPO").context("GITHUB_REPO env var required")?;
    match repo.split_once('/') {
        Some((owner, name)) if !owner.is_empty() && !name.is_empty() => Ok(repo),
        _ => Err(anyhow::anyhow!(
            "GITHUB_REPO must be in the form owner/name, got '{repo}'"
        )),
    }
}

fn parse_or_default<T: std::str::FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(value) => match value.parse::<T>() {
            Ok(value) => value,
            _ => {
                warn!("Failed to parse {} env var, using default", key);
                default
            }
        },
        _ => default,
    }
}

pub fn get_host_uri() -> String {
    match env::var("HOST") {
        Ok(host) => format!("https://{host}"),
        _ => match env::var("FLY_APP_NAME") {
            Ok(host) => format!("https://{host}.fly.dev"),
            _ => {
                format!("http://localhost:{}", get_port())
            }
        },
    }
}

pub fn get_port() -> u16 {
    let default_port: u16 = 8080;

    let port = match env::var("PORT") {
        Ok(port) => port,
        _ => default_port.to_string(),
    };
    let port: u16 = match port.parse::<_>() {
        Ok(port) => port,
        _ => {
            error!("Failed to parse PORT env var, using default");
            default_port
        }
    };

    port
}

/**
 * the webhook is served at / unless WH_SEED is set, in which case the path
 * carries a secret derived from it
 **/
pub fn get_webhook_path() -> String {
    match env::var("WH_SEED") {
        Ok(wh_seed) if !wh_seed.is_empty() => webhook_path_for_seed(&wh_seed),
        _ => "/".to_string(),
    }
}

pub fn webhook_path_for_seed(wh_seed: &str) -> String {
    format!("/wh/spot/{}", &hash_string(wh_seed)[0..32])
}
