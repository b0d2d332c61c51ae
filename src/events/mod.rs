pub mod error_code;
pub mod flags;
pub mod publisher;
pub mod request;

// Re-export key types for convenience
pub use error_code::ErrorCode;
pub use flags::{FlagParseError, PublishFlags};
pub use publisher::{
    EventPublisherStats, LoopbackPublisher, LoopbackSettings, PublishedEvent, RejectReason,
};
pub use request::PublishRequest;
