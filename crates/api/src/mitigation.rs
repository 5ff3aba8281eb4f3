//! Client for the detection engine's mitigation REST API.

use reqwest::Client;
use serde_json::Value;

use fnm_common::error::AppError;

/// Error-text fragment the API returns when the blackhole is already
/// gone. Treated the same as a successful delete for the purpose of
/// retracting the chat control.
const MISSING_UUID_MARKER: &str = "no mitigation with this uuid";

/// Outcome of a blackhole removal attempt, classified at the API level.
/// Transport failures surface separately as `Err` so the caller can
/// decide between log-only and rejection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoveOutcome {
    /// The blackhole entry was deleted.
    Removed,
    /// No entry with this UUID exists any more.
    AlreadyGone,
    /// Any other API-level rejection.
    Rejected { status: u16, body: String },
}

#[derive(Debug, Clone)]
pub struct MitigationClient {
    http: Client,
    base_url: String,
    username: String,
    password: String,
}

impl MitigationClient {
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http: Client::new(),
            base_url,
            username: username.into(),
            password: password.into(),
        }
    }

    async fn get_json(&self, path: &str) -> Result<Value, AppError> {
        let response = self
            .http
            .get(format!("{}{}", self.base_url, path))
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await
            .map_err(|e| AppError::Mitigation(e.to_string()))?;
        response
            .error_for_status()
            .map_err(|e| AppError::Mitigation(e.to_string()))?
            .json()
            .await
            .map_err(|e| AppError::Mitigation(e.to_string()))
    }

    /// `GET /blackhole/` — currently active RTBH entries.
    pub async fn list_blackholes(&self) -> Result<Value, AppError> {
        self.get_json("/blackhole/").await
    }

    /// `GET /flowspec/` — currently active flowspec rules.
    pub async fn list_flowspecs(&self) -> Result<Value, AppError> {
        self.get_json("/flowspec/").await
    }

    /// `DELETE /blackhole/{uuid}` — remove a blackhole entry.
    ///
    /// `Err` means the API was unreachable; the response-level outcome
    /// is always classified into a `RemoveOutcome`.
    pub async fn remove_blackhole(&self, uuid: &str) -> Result<RemoveOutcome, reqwest::Error> {
        let response = self
            .http
            .delete(format!("{}/blackhole/{uuid}", self.base_url))
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(RemoveOutcome::Removed);
        }
        let body = response.text().await.unwrap_or_default();
        Ok(classify_failure(status.as_u16(), body))
    }
}

fn classify_failure(status: u16, body: String) -> RemoveOutcome {
    if body.to_lowercase().contains(MISSING_UUID_MARKER) {
        RemoveOutcome::AlreadyGone
    } else {
        RemoveOutcome::Rejected { status, body }
    }
}
