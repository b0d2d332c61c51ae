//! # System Constants
//!
//! Operational boundaries shared by the completion adapter, the loopback
//! primitive, and the configuration defaults.

/// Default time-to-live hint, in seconds, used by the publish overloads that
/// do not take one. Primitives are free to ignore it.
pub const DEFAULT_TTL_SECONDS: u32 = 60;

/// Raw completion codes delivered to handlers
pub mod codes {
    pub const NONE: i32 = 0;
    pub const UNKNOWN: i32 = -100;
    pub const TIMEOUT: i32 = -160;
}

/// Limits enforced by the loopback primitive before it accepts an event
pub mod limits {
    pub const MAX_EVENT_NAME_LENGTH: usize = 64;
    pub const MAX_EVENT_DATA_LENGTH: usize = 622;
    pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;
    pub const DEFAULT_ACK_TIMEOUT_MS: u64 = 20_000;
}

/// Demo driver defaults
pub mod driver {
    pub const DEFAULT_EVENT_NAME: &str = "testEvent";
    pub const DEFAULT_PUBLISH_INTERVAL_MS: u64 = 60_000;
    pub const DEFAULT_FLAGS: &str = "private,with_ack";
}

/// Environment variables consulted during configuration and logging setup
pub mod env {
    pub const ENVIRONMENT: &str = "PUBLISH_CALLBACK_ENV";
    pub const FALLBACK_ENVIRONMENT: &str = "APP_ENV";
    pub const CONFIG_PREFIX: &str = "PUBLISH_CALLBACK";
    pub const CONFIG_DIRECTORY: &str = "PUBLISH_CALLBACK_CONFIG_DIR";
}
