//! # Publish Demo
//!
//! Publishes `counter=N` on a fixed interval through a [`PublishCallback`]
//! backed by the loopback primitive, logging every completion. Configured
//! through `config/publish_callback*.toml` and `PUBLISH_CALLBACK_*`
//! environment variables.

use std::time::Duration;

use anyhow::Context;
use tokio::sync::mpsc;
use tracing::{info, warn};

use publish_callback::config::{ConfigManager, PublishSettings};
use publish_callback::events::{LoopbackPublisher, LoopbackSettings};
use publish_callback::logging::{init_structured_logging, log_publish_operation};
use publish_callback::completion::drain_completions;
use publish_callback::{Completion, PublishCallback};

/// Extra wait on shutdown beyond the primitive's own ack timeout
const DRAIN_GRACE: Duration = Duration::from_millis(500);

fn report_completion(event_name: &str, completion: &Completion) {
    log_publish_operation(
        "completion",
        event_name,
        Some(completion.code),
        completion.payload_str(),
    );
    info!("callback called! err={}", completion.code.raw());
}

fn drain_deadline(settings: &PublishSettings) -> tokio::time::Instant {
    tokio::time::Instant::now() + settings.ack_timeout() + settings.ack_delay() + DRAIN_GRACE
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let manager = ConfigManager::load().context("loading configuration")?;
    let config = manager.config();
    init_structured_logging(&config.logging);

    let flags = config.driver.publish_flags()?;
    let publisher = LoopbackPublisher::new(LoopbackSettings::from(&config.publish))?;

    // Stands in for the remote side acknowledging events.
    let mut subscriber = publisher.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = subscriber.recv().await {
            info!(
                event_name = %event.name,
                data = %String::from_utf8_lossy(event.data.as_deref().unwrap_or_default()),
                published_at = %event.published_at,
                "Subscriber received event"
            );
        }
    });

    let (completion_tx, mut completion_rx) = mpsc::unbounded_channel();
    let callback = PublishCallback::new(publisher.clone())
        .with_handler(Completion::forwarding_handler(completion_tx));

    let event_name = config.driver.event_name.clone();
    let ttl = config.publish.default_ttl_seconds;
    let mut interval = tokio::time::interval(config.driver.interval());
    let mut counter: u64 = 0;
    let mut ticks: u64 = 0;
    let mut completions: u64 = 0;
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    info!(
        environment = manager.environment(),
        event_name = %event_name,
        interval_ms = config.driver.interval_ms,
        flags = flags.bits(),
        "Publish demo started"
    );

    loop {
        tokio::select! {
            _ = interval.tick() => {
                if config.driver.iterations.is_some_and(|limit| ticks >= limit) {
                    break;
                }
                ticks += 1;

                if !publisher.is_connected() {
                    warn!("Not connected, skipping publish");
                    continue;
                }
                if callback.is_outstanding() {
                    warn!("Previous publish still outstanding, skipping");
                    continue;
                }

                counter += 1;
                let data = format!("counter={counter}");
                log_publish_operation("publish", &event_name, None, Some(&data));
                callback.publish_event(&event_name, Some(data.as_bytes()), ttl, flags);
            }
            Some(completion) = completion_rx.recv() => {
                completions += 1;
                report_completion(&event_name, &completion);
            }
            _ = &mut ctrl_c => {
                info!("Interrupted");
                break;
            }
        }
    }

    // Every publish ends in exactly one completion, so wait for the rest.
    let pending = callback.invocations() - completions;
    let drained = drain_completions(
        &mut completion_rx,
        pending,
        drain_deadline(&config.publish),
        |completion| report_completion(&event_name, completion),
    )
    .await;
    if drained < pending {
        warn!(
            pending = pending - drained,
            "Shutting down with publishes still outstanding"
        );
    }

    let stats = publisher.stats();
    info!(
        accepted = stats.accepted,
        rejected = stats.rejected,
        acknowledged = stats.acknowledged,
        timed_out = stats.timed_out,
        "Publish demo finished"
    );
    Ok(())
}
