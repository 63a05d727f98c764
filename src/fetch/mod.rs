//! Game API access.
//!
//! [`CocApi`] is the seam the league builder fetches through. [`ApiClient`]
//! talks to the live API; [`FixtureApi`] serves saved responses for offline
//! runs and tests.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::Client;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

use crate::models::{ClanPayload, ClanTag, LeagueGroupPayload, WarPayload, WarTag};

/// Errors that can occur during fetching.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Rate limited by {host}, retry after {retry_after_secs}s")]
    RateLimited { host: String, retry_after_secs: u64 },

    #[error("HTTP {status}: {message}")]
    HttpStatus { status: u16, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Not found: {0}")]
    NotFound(String),
}

/// Read access to the game API.
#[async_trait]
pub trait CocApi: Send + Sync {
    /// Current league group of a clan.
    async fn league_group(&self, clan_tag: &ClanTag) -> Result<LeagueGroupPayload, FetchError>;

    /// A single league war.
    async fn war(&self, war_tag: &WarTag) -> Result<WarPayload, FetchError>;

    /// Clan profile (name, war league, badge).
    async fn clan(&self, clan_tag: &ClanTag) -> Result<ClanPayload, FetchError>;
}

/// Configuration for the API client.
#[derive(Debug, Clone)]
pub struct ApiClientConfig {
    /// Base URL, e.g. `https://api.clashofclans.com/v1/`
    pub base_url: Url,

    /// Bearer token
    pub token: String,

    /// Request timeout
    pub timeout: Duration,

    /// User agent string
    pub user_agent: String,
}

/// HTTP client for the live API.
pub struct ApiClient {
    client: Client,
    config: ApiClientConfig,
}

impl ApiClient {
    /// Create a new client with the given configuration.
    pub fn new(config: ApiClientConfig) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .unwrap_or_else(|_| HeaderValue::from_static("cwl-analyzer/0.1.0")),
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self { client, config })
    }

    /// Build an endpoint URL. Segments are percent-encoded, so `#` in tags
    /// becomes `%23`.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, FetchError> {
        let mut url = self.config.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| FetchError::InvalidUrl(self.config.base_url.to_string()))?;
            path.pop_if_empty();
            path.extend(segments);
        }
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, FetchError> {
        info!("Calling game API {}", url);

        let response = self
            .client
            .get(url.as_str())
            .bearer_auth(&self.config.token)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(60);

            return Err(FetchError::RateLimited {
                host: url.host_str().unwrap_or("unknown").to_string(),
                retry_after_secs: retry_after,
            });
        }

        let body = response.text().await?;
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                status: status.as_u16(),
                message: body,
            });
        }

        debug!(bytes = body.len(), "Received response from {}", url);
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl CocApi for ApiClient {
    async fn league_group(&self, clan_tag: &ClanTag) -> Result<LeagueGroupPayload, FetchError> {
        let url = self.endpoint(&["clans", clan_tag.as_str(), "currentwar", "leaguegroup"])?;
        self.get_json(url).await
    }

    async fn war(&self, war_tag: &WarTag) -> Result<WarPayload, FetchError> {
        let url = self.endpoint(&["clanwarleagues", "wars", war_tag.as_str()])?;
        self.get_json(url).await
    }

    async fn clan(&self, clan_tag: &ClanTag) -> Result<ClanPayload, FetchError> {
        let url = self.endpoint(&["clans", clan_tag.as_str()])?;
        self.get_json(url).await
    }
}

/// Saved API responses served from memory.
///
/// On disk a fixture directory holds `league_group.json`, `clan.json` and one
/// `wars/<tag without #>.json` per war.
#[derive(Debug, Clone)]
pub struct FixtureApi {
    group: LeagueGroupPayload,
    clan: Option<ClanPayload>,
    wars: HashMap<WarTag, WarPayload>,
}

impl FixtureApi {
    pub fn new(group: LeagueGroupPayload, clan: Option<ClanPayload>) -> Self {
        Self {
            group,
            clan,
            wars: HashMap::new(),
        }
    }

    /// Builder method to add a war.
    pub fn with_war(mut self, war_tag: &str, war: WarPayload) -> Self {
        self.wars.insert(WarTag::new(war_tag), war);
        self
    }

    /// Load a fixture directory.
    pub fn from_dir(dir: &Path) -> Result<Self, FetchError> {
        let group = read_json(&dir.join("league_group.json"))?;
        let clan_path = dir.join("clan.json");
        let clan = if clan_path.exists() {
            Some(read_json(&clan_path)?)
        } else {
            None
        };

        let mut fixtures = Self::new(group, clan);
        let wars_dir = dir.join("wars");
        if wars_dir.is_dir() {
            for entry in std::fs::read_dir(&wars_dir)? {
                let path = entry?.path();
                if path.extension().and_then(|e| e.to_str()) != Some("json") {
                    continue;
                }
                let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                    continue;
                };
                let war: WarPayload = read_json(&path)?;
                fixtures.wars.insert(WarTag::new(stem), war);
            }
        }

        info!(
            "Loaded fixtures from {:?}: {} wars",
            dir,
            fixtures.wars.len()
        );
        Ok(fixtures)
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, FetchError> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

#[async_trait]
impl CocApi for FixtureApi {
    async fn league_group(&self, _clan_tag: &ClanTag) -> Result<LeagueGroupPayload, FetchError> {
        Ok(self.group.clone())
    }

    async fn war(&self, war_tag: &WarTag) -> Result<WarPayload, FetchError> {
        self.wars
            .get(war_tag)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(format!("war {}", war_tag)))
    }

    async fn clan(&self, clan_tag: &ClanTag) -> Result<ClanPayload, FetchError> {
        match &self.clan {
            Some(clan) => Ok(clan.clone()),
            None => Ok(ClanPayload {
                tag: clan_tag.clone(),
                name: clan_tag.to_string(),
                war_league: None,
                badge_urls: None,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_config() -> ApiClientConfig {
        ApiClientConfig {
            base_url: Url::parse("https://api.example.com/v1/").unwrap(),
            token: "secret".to_string(),
            timeout: Duration::from_secs(5),
            user_agent: "test-agent".to_string(),
        }
    }

    #[test]
    fn test_endpoint_encodes_tags() {
        let client = ApiClient::new(test_config()).unwrap();

        let url = client
            .endpoint(&["clans", "#PJ2UVURC", "currentwar", "leaguegroup"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.example.com/v1/clans/%23PJ2UVURC/currentwar/leaguegroup"
        );
    }

    #[test]
    fn test_endpoint_without_trailing_slash() {
        let mut config = test_config();
        config.base_url = Url::parse("https://api.example.com/v1").unwrap();
        let client = ApiClient::new(config).unwrap();

        let url = client.endpoint(&["clanwarleagues", "wars", "#8QU8J9LP"]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.example.com/v1/clanwarleagues/wars/%238QU8J9LP"
        );
    }

    #[tokio::test]
    async fn test_fixture_dir_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(
            temp_dir.path().join("league_group.json"),
            r##"{"rounds":[{"warTags":["#W1"]}]}"##,
        )
        .unwrap();
        std::fs::create_dir(temp_dir.path().join("wars")).unwrap();
        std::fs::write(
            temp_dir.path().join("wars").join("W1.json"),
            r##"{"state":"warEnded",
                "clan":{"tag":"#A","name":"a","members":[]},
                "opponent":{"tag":"#B","name":"b","members":[]}}"##,
        )
        .unwrap();
        std::fs::write(temp_dir.path().join("wars").join("notes.txt"), "ignored").unwrap();

        let api = FixtureApi::from_dir(temp_dir.path()).unwrap();

        let group = api.league_group(&"#A".into()).await.unwrap();
        assert_eq!(group.rounds.len(), 1);

        let war = api.war(&"#w1".into()).await.unwrap();
        assert_eq!(war.clan.name, "a");

        assert!(matches!(
            api.war(&"#W2".into()).await,
            Err(FetchError::NotFound(_))
        ));

        // No clan.json: a bare profile is synthesized
        let clan = api.clan(&"#A".into()).await.unwrap();
        assert!(clan.war_league.is_none());
    }

    #[test]
    fn test_fixture_dir_missing_group() {
        let temp_dir = TempDir::new().unwrap();
        assert!(matches!(
            FixtureApi::from_dir(temp_dir.path()),
            Err(FetchError::Io(_))
        ));
    }
}
