//! # Loopback Publisher
//!
//! In-process [`PublishPrimitive`] backed by a tokio broadcast channel.
//! Accepted events fan out to local subscribers and the acknowledgment
//! outcome is delivered from a spawned task, so handlers run on a different
//! execution context than the publish call, the same as with a networked
//! primitive.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use super::{ErrorCode, PublishFlags, PublishRequest};
use crate::completion::{CompletionToken, PublishPrimitive};
use crate::config::PublishSettings;
use crate::error::{PublishCallbackError, Result};

/// Event that has been published
#[derive(Debug, Clone)]
pub struct PublishedEvent {
    pub name: String,
    pub data: Option<Vec<u8>>,
    pub ttl: u32,
    pub flags: PublishFlags,
    pub published_at: chrono::DateTime<chrono::Utc>,
}

/// Counters kept by a [`LoopbackPublisher`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventPublisherStats {
    pub accepted: u64,
    pub rejected: u64,
    pub acknowledged: u64,
    pub timed_out: u64,
}

#[derive(Debug, Default)]
struct StatCounters {
    accepted: AtomicU64,
    rejected: AtomicU64,
    acknowledged: AtomicU64,
    timed_out: AtomicU64,
}

/// Why a publish was refused before acceptance
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RejectReason {
    #[error("Publisher is disconnected")]
    Disconnected,
    #[error("Event name is empty")]
    EmptyName,
    #[error("Event name is {length} bytes, limit is {limit}")]
    NameTooLong { length: usize, limit: usize },
    #[error("Event data is {length} bytes, limit is {limit}")]
    DataTooLong { length: usize, limit: usize },
}

/// Limits and timings for a [`LoopbackPublisher`]
#[derive(Debug, Clone)]
pub struct LoopbackSettings {
    pub max_event_name_length: usize,
    pub max_event_data_length: usize,
    /// How long to wait for a subscriber before completing with `TIMEOUT`
    pub ack_timeout: Duration,
    /// Simulated round trip before a successful ack is delivered
    pub ack_delay: Duration,
    pub channel_capacity: usize,
}

impl From<&PublishSettings> for LoopbackSettings {
    fn from(settings: &PublishSettings) -> Self {
        Self {
            max_event_name_length: settings.max_event_name_length,
            max_event_data_length: settings.max_event_data_length,
            ack_timeout: settings.ack_timeout(),
            ack_delay: settings.ack_delay(),
            channel_capacity: settings.channel_capacity,
        }
    }
}

impl Default for LoopbackSettings {
    fn default() -> Self {
        Self::from(&PublishSettings::default())
    }
}

/// Publish primitive that delivers to in-process subscribers
#[derive(Debug, Clone)]
pub struct LoopbackPublisher {
    sender: broadcast::Sender<PublishedEvent>,
    runtime: Handle,
    connected: Arc<AtomicBool>,
    settings: Arc<LoopbackSettings>,
    stats: Arc<StatCounters>,
}

impl LoopbackPublisher {
    /// Create a publisher on the current tokio runtime
    pub fn new(settings: LoopbackSettings) -> Result<Self> {
        let runtime = Handle::try_current()
            .map_err(|e| PublishCallbackError::RuntimeUnavailable(e.to_string()))?;
        Ok(Self::with_runtime(settings, runtime))
    }

    /// Create a publisher whose completions run on `runtime`
    pub fn with_runtime(settings: LoopbackSettings, runtime: Handle) -> Self {
        let (sender, _) = broadcast::channel(settings.channel_capacity.max(1));
        Self {
            sender,
            runtime,
            connected: Arc::new(AtomicBool::new(true)),
            settings: Arc::new(settings),
            stats: Arc::new(StatCounters::default()),
        }
    }

    /// Subscribe to events
    pub fn subscribe(&self) -> broadcast::Receiver<PublishedEvent> {
        self.sender.subscribe()
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    pub fn settings(&self) -> &LoopbackSettings {
        &self.settings
    }

    pub fn stats(&self) -> EventPublisherStats {
        EventPublisherStats {
            accepted: self.stats.accepted.load(Ordering::Relaxed),
            rejected: self.stats.rejected.load(Ordering::Relaxed),
            acknowledged: self.stats.acknowledged.load(Ordering::Relaxed),
            timed_out: self.stats.timed_out.load(Ordering::Relaxed),
        }
    }

    /// Check a request against the connection state and size limits
    pub fn validate(&self, request: &PublishRequest<'_>) -> std::result::Result<(), RejectReason> {
        if !self.is_connected() {
            return Err(RejectReason::Disconnected);
        }
        if request.name.is_empty() {
            return Err(RejectReason::EmptyName);
        }
        if request.name.len() > self.settings.max_event_name_length {
            return Err(RejectReason::NameTooLong {
                length: request.name.len(),
                limit: self.settings.max_event_name_length,
            });
        }
        if request.data_len() > self.settings.max_event_data_length {
            return Err(RejectReason::DataTooLong {
                length: request.data_len(),
                limit: self.settings.max_event_data_length,
            });
        }
        Ok(())
    }

    fn spawn_completion(&self, token: CompletionToken, delay: Duration, code: ErrorCode) {
        let stats = Arc::clone(&self.stats);
        self.runtime.spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            if code.is_timeout() {
                stats.timed_out.fetch_add(1, Ordering::Relaxed);
            } else {
                stats.acknowledged.fetch_add(1, Ordering::Relaxed);
            }
            token.complete(code, None);
        });
    }
}

impl PublishPrimitive for LoopbackPublisher {
    fn submit(&self, request: &PublishRequest<'_>, token: CompletionToken) -> bool {
        if let Err(reason) = self.validate(request) {
            self.stats.rejected.fetch_add(1, Ordering::Relaxed);
            warn!(event_name = request.name, %reason, "Loopback publish rejected");
            return false;
        }

        let event = PublishedEvent {
            name: request.name.to_string(),
            data: request.data.map(<[u8]>::to_vec),
            ttl: request.ttl,
            flags: request.flags,
            published_at: chrono::Utc::now(),
        };
        self.stats.accepted.fetch_add(1, Ordering::Relaxed);

        // For broadcast channels, send() returns an error if there are no subscribers.
        // That is only a failure when the caller asked for an acknowledgment.
        let delivered = self.sender.send(event).unwrap_or(0);
        debug!(
            event_name = request.name,
            subscribers = delivered,
            requires_ack = request.flags.requires_ack(),
            "Loopback publish accepted"
        );

        if !request.flags.requires_ack() {
            self.spawn_completion(token, Duration::ZERO, ErrorCode::NONE);
        } else if delivered > 0 {
            self.spawn_completion(token, self.settings.ack_delay, ErrorCode::NONE);
        } else {
            self.spawn_completion(token, self.settings.ack_timeout, ErrorCode::TIMEOUT);
        }
        true
    }
}
