// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use pollview_app::{
    ApiOutcome, ApiRequest, OptionId, PollDetail, PollId, PollSummary, VoteOutcome,
};
use reqwest::StatusCode;
use reqwest::blocking::Client as HttpClient;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

pub const DEFAULT_BASE_URL: &str = "http://localhost:3001";

const POLLS_PATH: &str = "/api/polls";
const POLL_PATH: &str = "/api/poll";
const VOTE_PATH: &str = "/api/poll/vote";

/// Anything that can answer the three poll endpoints.
pub trait PollBackend {
    fn list_polls(&self) -> Result<Vec<PollSummary>>;
    fn poll(&self, poll_id: PollId) -> Result<PollDetail>;
    fn vote(&self, option_id: OptionId) -> Result<()>;

    /// Runs one request to completion. A vote is posted first and the
    /// displayed poll refetched only after the post succeeds; neither step
    /// is retried.
    fn execute(&self, request: ApiRequest) -> ApiOutcome {
        match request {
            ApiRequest::ListPolls => ApiOutcome::Polls(self.list_polls().map_err(flatten)),
            ApiRequest::Poll { poll_id } => ApiOutcome::Poll(self.poll(poll_id).map_err(flatten)),
            ApiRequest::Vote { option_id, poll_id } => {
                if let Err(error) = self.vote(option_id) {
                    return ApiOutcome::Vote(VoteOutcome::Rejected(flatten(error)));
                }
                let refreshed = self.poll(poll_id).map_err(flatten);
                if refreshed.is_err() {
                    warn!(%option_id, %poll_id, "vote recorded but refresh failed");
                }
                ApiOutcome::Vote(VoteOutcome::Recorded { refreshed })
            }
        }
    }
}

fn flatten(error: anyhow::Error) -> String {
    format!("{error:#}")
}

#[derive(Debug, Clone)]
pub struct Client {
    base_url: String,
    timeout: Option<Duration>,
    http: HttpClient,
}

impl Client {
    /// `timeout` of `None` leaves requests unbounded.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self> {
        let base_url = validate_base_url(base_url)?;
        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .context("build HTTP client")?;

        Ok(Self {
            base_url,
            timeout,
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

impl PollBackend for Client {
    fn list_polls(&self) -> Result<Vec<PollSummary>> {
        let url = self.endpoint(POLLS_PATH);
        debug!(%url, "GET poll list");
        let response = self
            .http
            .get(&url)
            .send()
            .map_err(|error| connection_error(&self.base_url, error))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(clean_error_response(status, &body));
        }

        response.json().context("decode poll list")
    }

    fn poll(&self, poll_id: PollId) -> Result<PollDetail> {
        let url = self.endpoint(&format!("{POLL_PATH}/{poll_id}"));
        debug!(%url, "GET poll detail");
        let response = self
            .http
            .get(&url)
            .send()
            .map_err(|error| connection_error(&self.base_url, error))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(clean_error_response(status, &body))
                .with_context(|| format!("fetch poll {poll_id}"));
        }

        response
            .json()
            .with_context(|| format!("decode poll {poll_id}"))
    }

    fn vote(&self, option_id: OptionId) -> Result<()> {
        let url = self.endpoint(VOTE_PATH);
        debug!(%url, %option_id, "POST vote");
        let response = self
            .http
            .post(&url)
            .json(&VoteRequest { option_id })
            .send()
            .map_err(|error| connection_error(&self.base_url, error))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(clean_error_response(status, &body))
                .with_context(|| format!("vote for option {option_id}"));
        }
        Ok(())
    }
}

/// Normalizes a configured base URL: trailing slashes are dropped and only
/// absolute `http`/`https` URLs without query or fragment are accepted.
pub fn validate_base_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        bail!("api.base_url must not be empty");
    }

    let parsed = Url::parse(trimmed)
        .with_context(|| format!("api.base_url {raw:?} is not a valid URL"))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        bail!(
            "api.base_url {raw:?} uses scheme {:?}; use http:// or https://",
            parsed.scheme()
        );
    }
    if parsed.host_str().is_none() {
        bail!("api.base_url {raw:?} has no host");
    }
    if parsed.query().is_some() || parsed.fragment().is_some() {
        bail!("api.base_url {raw:?} must not carry a query or fragment");
    }

    Ok(trimmed.to_owned())
}

fn connection_error(base_url: &str, error: reqwest::Error) -> anyhow::Error {
    anyhow!(
        "cannot reach {} -- is the poll backend running? ({})",
        base_url,
        error
    )
}

fn clean_error_response(status: StatusCode, body: &str) -> anyhow::Error {
    if let Ok(parsed) = serde_json::from_str::<ErrorEnvelope>(body)
        && let Some(message) = parsed.error.or(parsed.message)
        && !message.is_empty()
    {
        return anyhow!("server error ({}): {}", status.as_u16(), message);
    }

    let body = body.trim();
    if !body.is_empty() && body.len() < 100 && !body.contains('{') && !body.contains('<') {
        return anyhow!("server error ({}): {}", status.as_u16(), body);
    }

    anyhow!("server returned {}", status.as_u16())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VoteRequest {
    option_id: OptionId,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: Option<String>,
    message: Option<String>,
}
