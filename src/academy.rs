use std::time::Duration;

use anyhow::{bail, Result};
use reqwest::blocking::Client as HttpClient;
use reqwest::header::USER_AGENT;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Failures of a single API call. `Status` and `Malformed` both count as
/// response errors; `Validation` never reaches the network.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("academy: request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("academy: api error {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("academy: malformed response: {0}")]
    Malformed(#[source] serde_json::Error),
    #[error("academy: {0}")]
    Validation(String),
}

impl Error {
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport(_))
    }

    pub fn is_response(&self) -> bool {
        matches!(self, Error::Status { .. } | Error::Malformed(_))
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }
}

#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    pub user_agent: String,
    pub base_url: Option<String>,
    pub http_client: Option<HttpClient>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl Level {
    pub fn display_name(&self) -> &'static str {
        match self {
            Level::Beginner => "débutant",
            Level::Intermediate => "intermédiaire",
            Level::Advanced => "avancé",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Hash, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Plan {
    #[default]
    Basic,
    Premium,
    Vip,
}

impl Plan {
    pub fn display_name(&self) -> &'static str {
        match self {
            Plan::Basic => "Basique",
            Plan::Premium => "Premium",
            Plan::Vip => "VIP",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Video {
    // Some deployments expose the storage key as `_id`.
    #[serde(alias = "_id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub duration_sec: Option<i64>,
    #[serde(default)]
    pub level: Level,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub requires_plan: Plan,
}

impl Video {
    pub fn duration_minutes(&self) -> Option<i64> {
        self.duration_sec.map(|sec| (sec as f64 / 60.0).round() as i64)
    }
}

/// Creation payload for `POST /api/videos`; the server assigns the id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoSpec {
    pub title: String,
    pub description: String,
    pub url: String,
    pub duration_sec: Option<i64>,
    pub level: Level,
    pub topics: Vec<String>,
    pub requires_plan: Plan,
}

/// One watch-progress row. The same shape is submitted on
/// `POST /api/progress`; the server upserts by (user, video).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub user_id: String,
    pub video_id: String,
    #[serde(default)]
    pub percent: i64,
    #[serde(default)]
    pub last_position_sec: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForumPost {
    #[serde(alias = "_id")]
    pub id: String,
    pub user_id: String,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub topics: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostSpec {
    pub user_id: String,
    pub title: String,
    pub content: String,
    pub topics: Vec<String>,
}

pub struct Client {
    http: HttpClient,
    user_agent: String,
    base_url: Url,
}

impl Client {
    pub fn new(config: ClientConfig) -> Result<Self> {
        if config.user_agent.trim().is_empty() {
            bail!("academy client user agent required");
        }
        let base = config
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let base_url = Url::parse(&base)?;
        let http = match config.http_client {
            Some(client) => client,
            None => HttpClient::builder()
                .timeout(Duration::from_secs(20))
                .build()?,
        };

        Ok(Client {
            http,
            user_agent: config.user_agent,
            base_url,
        })
    }

    pub fn videos(&self) -> Result<Vec<Video>, Error> {
        self.get("/api/videos")
    }

    pub fn create_video(&self, spec: &VideoSpec) -> Result<Video, Error> {
        self.post("/api/videos", spec)
    }

    pub fn progress(&self, user_id: &str) -> Result<Vec<ProgressRecord>, Error> {
        if user_id.trim().is_empty() {
            return Err(Error::Validation("user id required".into()));
        }
        self.get(&format!("/api/progress/{}", user_id))
    }

    /// Submits a progress row. The ack body is not interpreted; the
    /// reload that follows a successful submission is the source of truth.
    pub fn record_progress(&self, entry: &ProgressRecord) -> Result<(), Error> {
        let url = self.endpoint("/api/progress")?;
        let resp = self
            .http
            .post(url)
            .header(USER_AGENT, &self.user_agent)
            .json(entry)
            .send()
            .map_err(Error::Transport)?;
        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = resp.text().unwrap_or_default();
            Err(Error::Status { status, body })
        }
    }

    pub fn posts(&self) -> Result<Vec<ForumPost>, Error> {
        self.get("/api/forum/posts")
    }

    pub fn create_post(&self, spec: &PostSpec) -> Result<ForumPost, Error> {
        self.post("/api/forum/posts", spec)
    }

    fn get<T>(&self, path: &str) -> Result<T, Error>
    where
        T: DeserializeOwned,
    {
        let url = self.endpoint(path)?;
        let resp = self
            .http
            .get(url)
            .header(USER_AGENT, &self.user_agent)
            .send()
            .map_err(Error::Transport)?;
        decode(resp)
    }

    fn post<B, T>(&self, path: &str, body: &B) -> Result<T, Error>
    where
        B: Serialize,
        T: DeserializeOwned,
    {
        let url = self.endpoint(path)?;
        let resp = self
            .http
            .post(url)
            .header(USER_AGENT, &self.user_agent)
            .json(body)
            .send()
            .map_err(Error::Transport)?;
        decode(resp)
    }

    fn endpoint(&self, path: &str) -> Result<Url, Error> {
        self.base_url
            .join(path)
            .map_err(|err| Error::Validation(format!("invalid endpoint {}: {}", path, err)))
    }
}

fn decode<T>(resp: reqwest::blocking::Response) -> Result<T, Error>
where
    T: DeserializeOwned,
{
    let status = resp.status();
    let body = resp.text().map_err(Error::Transport)?;
    if !status.is_success() {
        return Err(Error::Status { status, body });
    }
    serde_json::from_str(&body).map_err(Error::Malformed)
}
