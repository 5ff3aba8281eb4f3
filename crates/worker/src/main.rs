use std::time::Duration;

use chrono_tz::Tz;

use fnm_common::config::AppConfig;
use fnm_common::redis_pool::create_redis_pool;
use fnm_slack::SlackClient;
use fnm_worker::composer::MessageComposer;
use fnm_worker::consumer::Consumer;
use fnm_worker::correlation::ThreadStore;
use fnm_worker::gate::OutboundGate;
use fnm_worker::notifier::Notifier;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fnm_worker=info,fnm_slack=info".into()),
        )
        .json()
        .init();

    tracing::info!("FnmRelay worker starting...");

    // Load configuration
    let config = AppConfig::from_env()?;

    let timezone: Tz = config
        .display_timezone
        .parse()
        .map_err(|_| anyhow::anyhow!("TIMEZONE is not a valid IANA timezone name"))?;

    // Connect to Redis (queues + thread-correlation store)
    let redis = create_redis_pool(&config.redis_url).await?;

    let composer = MessageComposer::new(
        config.slack_bot_channel.clone(),
        config.slack_bot_name.clone(),
        timezone,
    );
    let gate = OutboundGate::new(Duration::from_millis(config.notify_min_interval_ms));
    let notifier = Notifier::new(SlackClient::new(config.slack_bot_token.clone()), gate);
    let store = ThreadStore::new(redis.clone(), config.ban_thread_ttl_secs);

    let mut consumer = Consumer::new(
        redis,
        composer,
        notifier,
        store,
        config.flowspec_thread_ttl_secs,
    );

    // Run with graceful shutdown on Ctrl+C
    tokio::select! {
        result = consumer.run() => {
            if let Err(e) = result {
                tracing::error!(error = %e, "Queue consumer exited with error");
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received shutdown signal, stopping...");
        }
    }

    tracing::info!("FnmRelay worker stopped.");
    Ok(())
}
