use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

const SLACK_API_BASE: &str = "https://slack.com/api";

/// Error from a Slack Web API call.
#[derive(Debug, Error)]
pub enum SlackError {
    /// Slack answered `ok: false`; `code` is Slack's error identifier
    /// and `detail` any extra messages it attached.
    #[error("Slack API error: {code}{detail}")]
    Api { code: String, detail: String },

    #[error("Slack transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// `chat.postMessage` succeeded but returned no message timestamp;
    /// the thread handle cannot be resolved.
    #[error("Slack response missing message timestamp")]
    MissingTimestamp,
}

/// Wire shape of Slack's Web API response envelope.
#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    ts: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    response_metadata: Option<ResponseMetadata>,
}

#[derive(Debug, Deserialize)]
struct ResponseMetadata {
    #[serde(default)]
    messages: Vec<String>,
}

impl ApiResponse {
    fn into_result(self) -> Result<Option<String>, SlackError> {
        if self.ok {
            return Ok(self.ts);
        }
        let detail = match self.response_metadata {
            Some(meta) if !meta.messages.is_empty() => {
                format!(" ({})", meta.messages.join("; "))
            }
            _ => String::new(),
        };
        Err(SlackError::Api {
            code: self.error.unwrap_or_else(|| "unknown_error".to_string()),
            detail,
        })
    }
}

/// Thin client over the Slack Web API.
#[derive(Debug, Clone)]
pub struct SlackClient {
    http: Client,
    token: String,
    base_url: String,
}

impl SlackClient {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            token: token.into(),
            base_url: SLACK_API_BASE.to_string(),
        }
    }

    /// `chat.postMessage` — returns the server-assigned message
    /// timestamp, which doubles as the thread handle for replies.
    pub async fn post_message(&self, body: &Value) -> Result<String, SlackError> {
        let response: ApiResponse = self
            .http
            .post(format!("{}/chat.postMessage", self.base_url))
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await?
            .json()
            .await?;

        response.into_result()?.ok_or(SlackError::MissingTimestamp)
    }

    /// `chat.update` — edits a previously posted message in place.
    pub async fn update_message(&self, body: &Value) -> Result<(), SlackError> {
        let response: ApiResponse = self
            .http
            .post(format!("{}/chat.update", self.base_url))
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await?
            .json()
            .await?;

        response.into_result()?;
        Ok(())
    }
}
