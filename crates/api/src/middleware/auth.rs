//! Ingress authentication: HTTP Basic for the detection engine and
//! Slack v0 request-signature verification for interactive callbacks.

use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::request::Parts;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

use fnm_common::error::AppError;

use crate::state::AppState;

type HmacSha256 = Hmac<Sha256>;

/// Maximum accepted skew between a request's signature timestamp and
/// the relay's clock. Anything older is a possible replay.
const REPLAY_WINDOW_SECS: i64 = 300;

/// Marker extractor: the request carried valid notify-API Basic
/// credentials. Apply to routes the detection engine calls:
///
/// ```ignore
/// async fn handler(_auth: NotifyAuth) -> impl IntoResponse {
///     // only reached with valid shared credentials
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct NotifyAuth;

impl FromRequestParts<AppState> for NotifyAuth {
    type Rejection = AppError;

    fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let user = state.config.notify_api_user.clone();
        let password = state.config.notify_api_password.clone();

        async move {
            let header =
                header.ok_or_else(|| AppError::Auth("Missing Authorization header".to_string()))?;
            check_basic_credentials(&header, &user, &password)?;
            Ok(NotifyAuth)
        }
    }
}

/// Validate an `Authorization: Basic ...` header against the shared
/// notify credential pair.
pub fn check_basic_credentials(header: &str, user: &str, password: &str) -> Result<(), AppError> {
    let encoded = header
        .strip_prefix("Basic ")
        .ok_or_else(|| AppError::Auth("Basic authentication required".to_string()))?;
    let decoded = BASE64
        .decode(encoded.trim())
        .map_err(|_| AppError::Auth("Malformed Basic credentials".to_string()))?;
    let decoded = String::from_utf8(decoded)
        .map_err(|_| AppError::Auth("Malformed Basic credentials".to_string()))?;
    let (got_user, got_password) = decoded
        .split_once(':')
        .ok_or_else(|| AppError::Auth("Malformed Basic credentials".to_string()))?;

    // Evaluate both comparisons before branching.
    let user_ok = constant_time_eq(got_user.as_bytes(), user.as_bytes());
    let password_ok = constant_time_eq(got_password.as_bytes(), password.as_bytes());
    if user_ok && password_ok {
        Ok(())
    } else {
        Err(AppError::Auth("Invalid credentials".to_string()))
    }
}

/// Verify a Slack interactive request against the signing secret using
/// the headers Slack sends.
pub fn verify_slack_request(secret: &str, headers: &HeaderMap, body: &[u8]) -> bool {
    let timestamp = headers
        .get("x-slack-request-timestamp")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    let signature = headers
        .get("x-slack-signature")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    if timestamp.is_empty() || signature.is_empty() {
        return false;
    }
    verify_slack_signature_at(secret, timestamp, signature, body, Utc::now().timestamp())
}

/// Slack v0 signing check: HMAC-SHA256 over `v0:{timestamp}:{body}`,
/// compared constant-time against the presented signature. `now` is the
/// relay's clock for the replay-window check.
fn verify_slack_signature_at(
    secret: &str,
    timestamp: &str,
    signature: &str,
    body: &[u8],
    now: i64,
) -> bool {
    let Ok(ts) = timestamp.parse::<i64>() else {
        return false;
    };
    if (now - ts).abs() > REPLAY_WINDOW_SECS {
        return false;
    }

    let base_string = format!("v0:{timestamp}:{}", String::from_utf8_lossy(body));
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(base_string.as_bytes());
    let expected = format!("v0={}", hex_encode(&mac.finalize().into_bytes()));
    constant_time_eq(expected.as_bytes(), signature.as_bytes())
}

/// Compare via digests so neither length nor the position of the first
/// mismatch shows up in timing.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    Sha256::digest(a) == Sha256::digest(b)
}

fn hex_encode(bytes: &[u8]) -> String {
    use std::fmt::Write;
    bytes.iter().fold(
        String::with_capacity(bytes.len() * 2),
        |mut out, byte| {
            let _ = write!(out, "{byte:02x}");
            out
        },
    )
}
