//! Shared application state for the Axum ingress.

use redis::aio::ConnectionManager;

use fnm_common::config::AppConfig;

use crate::mitigation::MitigationClient;

/// Application state shared across all route handlers via Axum `State`.
///
/// Every collaborator the handlers touch is injected here explicitly —
/// no ambient singletons. All members are cheap clones safe for
/// concurrent use.
#[derive(Clone)]
pub struct AppState {
    pub redis: ConnectionManager,
    pub mitigation: MitigationClient,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(redis: ConnectionManager, mitigation: MitigationClient, config: AppConfig) -> Self {
        Self {
            redis,
            mitigation,
            config,
        }
    }
}
