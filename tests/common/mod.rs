#![allow(dead_code)]

pub mod strategies;

pub use strategies::*;

use std::time::Duration;

use publish_callback::events::LoopbackSettings;

/// Loopback settings with timings short enough for tests
pub fn fast_loopback_settings() -> LoopbackSettings {
    LoopbackSettings {
        ack_timeout: Duration::from_millis(100),
        ack_delay: Duration::from_millis(5),
        ..LoopbackSettings::default()
    }
}

/// Poll `condition` until it holds or `timeout` elapses
pub async fn wait_until<F: Fn() -> bool>(condition: F, timeout: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}
