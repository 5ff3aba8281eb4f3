use serde::Deserialize;

/// Global application configuration loaded from environment variables.
///
/// One shape shared by both binaries: the ingress never posts to Slack
/// and the worker never serves HTTP, but each still loads the full
/// variable set so a single env file configures the whole deployment.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Redis connection string (queues + thread-correlation store)
    pub redis_url: String,

    /// Slack bot token used for chat.postMessage / chat.update
    pub slack_bot_token: String,

    /// Slack channel ID or name notifications are posted to
    pub slack_bot_channel: String,

    /// Display name notifications are posted under (default: FastNetMon)
    pub slack_bot_name: String,

    /// Slack signing secret for interactive-request verification.
    /// When unset, the interactive endpoint answers 501 instead of
    /// accepting unsigned input.
    pub slack_signing_secret: Option<String>,

    /// Shared credential the detection engine authenticates with
    pub notify_api_user: String,
    pub notify_api_password: String,

    /// Base URL of the mitigation REST API
    pub fnm_api_url: String,

    /// Mitigation REST API credentials
    pub fnm_api_username: String,
    pub fnm_api_password: String,

    /// IANA timezone name used when rendering unban timestamps
    pub display_timezone: String,

    /// Minimum spacing between outbound Slack calls in milliseconds
    /// (default: 1000, Slack enforces roughly one message per second
    /// per channel)
    pub notify_min_interval_ms: u64,

    /// TTL for partial-block thread-correlation records in seconds
    /// (default: 1800, the bounded flowspec mitigation window)
    pub flowspec_thread_ttl_secs: u64,

    /// TTL for ban thread-correlation records in seconds (default:
    /// 2592000 = 30 days; bans are lifted long before this, the TTL
    /// just keeps the store self-cleaning)
    pub ban_thread_ttl_secs: u64,

    /// Ingress listen address (default: 0.0.0.0:8090)
    pub listen_addr: String,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            redis_url: std::env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            slack_bot_token: std::env::var("SLACK_BOT_TOKEN")
                .map_err(|_| anyhow::anyhow!("SLACK_BOT_TOKEN environment variable is required"))?,
            slack_bot_channel: std::env::var("SLACK_BOT_CHANNEL").map_err(|_| {
                anyhow::anyhow!("SLACK_BOT_CHANNEL environment variable is required")
            })?,
            slack_bot_name: std::env::var("SLACK_BOT_NAME")
                .unwrap_or_else(|_| "FastNetMon".to_string()),
            slack_signing_secret: std::env::var("SLACK_SIGNING_SECRET").ok(),
            notify_api_user: std::env::var("NOTIFY_API_USER")
                .map_err(|_| anyhow::anyhow!("NOTIFY_API_USER environment variable is required"))?,
            notify_api_password: std::env::var("NOTIFY_API_PASSWORD").map_err(|_| {
                anyhow::anyhow!("NOTIFY_API_PASSWORD environment variable is required")
            })?,
            fnm_api_url: std::env::var("FNM_API_URL")
                .map_err(|_| anyhow::anyhow!("FNM_API_URL environment variable is required"))?,
            fnm_api_username: std::env::var("FNM_API_USERNAME")
                .map_err(|_| anyhow::anyhow!("FNM_API_USERNAME environment variable is required"))?,
            fnm_api_password: std::env::var("FNM_API_PASSWORD")
                .map_err(|_| anyhow::anyhow!("FNM_API_PASSWORD environment variable is required"))?,
            display_timezone: std::env::var("TIMEZONE")
                .unwrap_or_else(|_| "Australia/Sydney".to_string()),
            notify_min_interval_ms: std::env::var("NOTIFY_MIN_INTERVAL_MS")
                .unwrap_or_else(|_| "1000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("NOTIFY_MIN_INTERVAL_MS must be a valid u64"))?,
            flowspec_thread_ttl_secs: std::env::var("FLOWSPEC_THREAD_TTL_SECS")
                .unwrap_or_else(|_| "1800".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("FLOWSPEC_THREAD_TTL_SECS must be a valid u64"))?,
            ban_thread_ttl_secs: std::env::var("BAN_THREAD_TTL_SECS")
                .unwrap_or_else(|_| "2592000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("BAN_THREAD_TTL_SECS must be a valid u64"))?,
            listen_addr: std::env::var("LISTEN_ADDR")
                .unwrap_or_else(|_| "0.0.0.0:8090".to_string()),
        })
    }
}
