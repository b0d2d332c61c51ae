//! # Configuration System
//!
//! Layered configuration for the loopback primitive, the demo driver, and
//! logging. Every field has a default, so an empty environment yields a
//! working configuration.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use publish_callback::config::ConfigManager;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load()?;
//! let ack_timeout = manager.config().publish.ack_timeout();
//! let flags = manager.config().driver.publish_flags()?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod loader;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub use error::{ConfigResult, ConfigurationError};
pub use loader::ConfigManager;

use crate::constants::{driver, limits, DEFAULT_TTL_SECONDS};
use crate::events::PublishFlags;

/// Root configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishCallbackConfig {
    pub publish: PublishSettings,
    pub driver: DriverSettings,
    pub logging: LoggingSettings,
}

impl PublishCallbackConfig {
    /// Reject values that would make the primitive or driver unusable
    pub fn validate(&self) -> ConfigResult<()> {
        if self.publish.max_event_name_length == 0 {
            return Err(ConfigurationError::invalid_value(
                "publish.max_event_name_length",
                "0",
                "must allow at least one character",
            ));
        }
        if self.publish.channel_capacity == 0 {
            return Err(ConfigurationError::invalid_value(
                "publish.channel_capacity",
                "0",
                "broadcast channel needs a positive capacity",
            ));
        }
        if self.driver.interval_ms == 0 {
            return Err(ConfigurationError::invalid_value(
                "driver.interval_ms",
                "0",
                "publish interval must be positive",
            ));
        }
        if self.driver.event_name.is_empty() {
            return Err(ConfigurationError::invalid_value(
                "driver.event_name",
                "",
                "event name must not be empty",
            ));
        }
        self.driver.publish_flags()?;
        Ok(())
    }
}

/// Primitive limits and acknowledgment timing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishSettings {
    pub default_ttl_seconds: u32,
    pub ack_timeout_ms: u64,
    pub ack_delay_ms: u64,
    pub max_event_name_length: usize,
    pub max_event_data_length: usize,
    pub channel_capacity: usize,
}

impl PublishSettings {
    pub fn ack_timeout(&self) -> Duration {
        Duration::from_millis(self.ack_timeout_ms)
    }

    pub fn ack_delay(&self) -> Duration {
        Duration::from_millis(self.ack_delay_ms)
    }
}

impl Default for PublishSettings {
    fn default() -> Self {
        Self {
            default_ttl_seconds: DEFAULT_TTL_SECONDS,
            ack_timeout_ms: limits::DEFAULT_ACK_TIMEOUT_MS,
            ack_delay_ms: 0,
            max_event_name_length: limits::MAX_EVENT_NAME_LENGTH,
            max_event_data_length: limits::MAX_EVENT_DATA_LENGTH,
            channel_capacity: limits::DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

/// Demo driver behavior
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverSettings {
    pub event_name: String,
    pub interval_ms: u64,
    /// Comma separated flag names, e.g. `"private,with_ack"`
    pub flags: String,
    /// Stop after this many ticks; run until interrupted when absent
    pub iterations: Option<u64>,
}

impl DriverSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn publish_flags(&self) -> ConfigResult<PublishFlags> {
        PublishFlags::parse_list(&self.flags).map_err(|e| {
            ConfigurationError::invalid_value("driver.flags", self.flags.clone(), e.to_string())
        })
    }
}

impl Default for DriverSettings {
    fn default() -> Self {
        Self {
            event_name: driver::DEFAULT_EVENT_NAME.to_string(),
            interval_ms: driver::DEFAULT_PUBLISH_INTERVAL_MS,
            flags: driver::DEFAULT_FLAGS.to_string(),
            iterations: None,
        }
    }
}

/// Logging output
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Filter directive; overrides the per-environment default
    pub level: Option<String>,
    /// Emit JSON on the console instead of the human readable format
    pub json: bool,
    /// Also write JSON logs into this directory
    pub directory: Option<PathBuf>,
}
