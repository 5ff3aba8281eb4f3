//! Minimal Slack Web API client used by the relay.
//!
//! Covers exactly the two calls the relay makes: `chat.postMessage` and
//! `chat.update`. Errors surface as the structured code Slack returns
//! (`invalid_auth`, `channel_not_found`, `ratelimited`, ...).

pub mod client;

pub use client::{SlackClient, SlackError};
