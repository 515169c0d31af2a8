//! WakaTime API integration for the monthly report.
//!
//! Provides:
//! - User resolution (`current` or a username/id)
//! - Per-day branch summaries, fetched concurrently for a whole month
//!
//! Both WakaTime and self-hosted Wakapi servers are supported; Wakapi serves
//! the same payloads under its `/compat/wakatime` prefix.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::NaiveDate;
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use wm_core::ResultSet;

/// Default request timeout for API calls.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
/// Upper bound on summary requests in flight at once.
const MAX_CONCURRENT_REQUESTS: usize = 4;

/// API client errors.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The provided API key was invalid.
    #[error("invalid API key: {reason}")]
    InvalidApiKey { reason: &'static str },
    /// Failed to build HTTP client.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
    /// HTTP request failed.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// The server rejected the API key.
    #[error("unauthorized: check the API key and API URL")]
    Unauthorized,
    /// API returned an error response.
    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },
    /// Failed to parse response.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    /// A fetch task panicked or was cancelled.
    #[error("fetch task failed: {0}")]
    Task(String),
}

/// Which server flavour the API URL points at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Wakatime,
    Wakapi,
}

impl Backend {
    const fn prefix(self) -> &'static str {
        match self {
            Self::Wakatime => "/v1",
            Self::Wakapi => "/compat/wakatime/v1",
        }
    }
}

/// A resolved user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub username: Option<String>,
}

impl User {
    /// Username when the server reports one, otherwise the id.
    pub fn name(&self) -> &str {
        self.username
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.id)
    }
}

/// WakaTime-compatible API client.
///
/// # Thread Safety
///
/// The client is cheap to clone; clones share the underlying HTTP connection
/// pool.
#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    api_url: String,
    authorization: String,
    backend: Backend,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("api_url", &self.api_url)
            .field("backend", &self.backend)
            .field("api_key", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Creates a new client for `api_url` (e.g. `https://api.wakatime.com/api`).
    ///
    /// # Errors
    ///
    /// Returns an error if the API key is empty or whitespace-only, or if
    /// the HTTP client fails to build.
    pub fn new(
        api_url: impl Into<String>,
        api_key: &str,
        backend: Backend,
    ) -> Result<Self, ApiError> {
        if api_key.is_empty() {
            return Err(ApiError::InvalidApiKey {
                reason: "API key cannot be empty",
            });
        }
        if api_key.trim().is_empty() {
            return Err(ApiError::InvalidApiKey {
                reason: "API key cannot be whitespace-only",
            });
        }

        let http = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(ApiError::ClientBuild)?;

        Ok(Self {
            http,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            authorization: format!("Basic {}", BASE64.encode(api_key.trim())),
            backend,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}{path}", self.api_url, self.backend.prefix())
    }

    async fn get(&self, url: &str, query: &[(&str, &str)]) -> Result<String, ApiError> {
        tracing::debug!(url, ?query, "GET");
        let response = self
            .http
            .get(url)
            .header(AUTHORIZATION, &self.authorization)
            .header(ACCEPT, "application/json, text/*")
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(ApiError::Unauthorized);
        }
        let body = response.text().await?;
        if !status.is_success() {
            return Err(parse_api_error(status, &body));
        }
        Ok(body)
    }

    /// Looks up a user by id or username; `current` is the key's owner.
    pub async fn resolve_user(&self, identifier: &str) -> Result<User, ApiError> {
        let url = self.endpoint(&format!("/users/{identifier}"));
        let body = self.get(&url, &[]).await?;
        parse_user(&body)
    }

    /// Fetches the branch summaries of a single day.
    pub async fn fetch_day(
        &self,
        user_id: &str,
        project: Option<&str>,
        date: NaiveDate,
    ) -> Result<Vec<ResultSet>, ApiError> {
        let url = self.endpoint(&format!("/users/{user_id}/summaries"));
        let day = date.format("%Y-%m-%d").to_string();
        let mut query = vec![("start", day.as_str()), ("end", day.as_str())];
        if let Some(project) = project.filter(|p| !p.is_empty()) {
            query.push(("project", project));
        }
        let body = self.get(&url, &query).await?;
        parse_summaries(&body)
    }
}

/// Fetches every given day concurrently, keyed by date.
///
/// Completion order does not matter. The first failure aborts the remaining
/// requests and is returned; no partial month is produced.
pub async fn fetch_month(
    client: &Client,
    user_id: &str,
    project: Option<&str>,
    days: &[NaiveDate],
) -> Result<BTreeMap<NaiveDate, Vec<ResultSet>>, ApiError> {
    let permits = Arc::new(Semaphore::new(MAX_CONCURRENT_REQUESTS));
    let mut tasks = JoinSet::new();

    for &date in days {
        let client = client.clone();
        let permits = Arc::clone(&permits);
        let user_id = user_id.to_string();
        let project = project.map(str::to_string);
        tasks.spawn(async move {
            let _permit = permits
                .acquire_owned()
                .await
                .map_err(|err| ApiError::Task(err.to_string()))?;
            let sets = client
                .fetch_day(&user_id, project.as_deref(), date)
                .await?;
            Ok::<_, ApiError>((date, sets))
        });
    }

    let mut results = BTreeMap::new();
    while let Some(joined) = tasks.join_next().await {
        let (date, sets) = joined.map_err(|err| ApiError::Task(err.to_string()))??;
        tracing::debug!(%date, result_sets = sets.len(), "fetched day");
        results.insert(date, sets);
    }
    Ok(results)
}

fn parse_user(body: &str) -> Result<User, ApiError> {
    #[derive(Deserialize)]
    struct Payload {
        data: User,
    }

    serde_json::from_str::<Payload>(body)
        .map(|payload| payload.data)
        .map_err(|err| ApiError::InvalidResponse(err.to_string()))
}

fn parse_summaries(body: &str) -> Result<Vec<ResultSet>, ApiError> {
    #[derive(Deserialize)]
    struct Payload {
        #[serde(default)]
        data: Vec<ResultSet>,
    }

    serde_json::from_str::<Payload>(body)
        .map(|payload| payload.data)
        .map_err(|err| ApiError::InvalidResponse(err.to_string()))
}

fn parse_api_error(status: StatusCode, body: &str) -> ApiError {
    #[derive(Deserialize)]
    struct ErrorPayload {
        error: String,
    }

    let message = serde_json::from_str::<ErrorPayload>(body)
        .map_or_else(|_| body.trim().to_string(), |payload| payload.error);
    ApiError::Api {
        status: status.as_u16(),
        message,
    }
}
