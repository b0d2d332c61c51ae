use bitflags::bitflags;

bitflags! {
    /// Options for a single publish, composed with `|`.
    ///
    /// `PRIVATE | WITH_ACK` is what most callers want. The raw value handed to
    /// a primitive is [`PublishFlags::bits`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PublishFlags: u32 {
        /// Only deliver to the owner's subscribers.
        const PRIVATE = 0x01;

        /// Fire and forget; the primitive completes without waiting for an ack.
        const NO_ACK = 0x02;

        /// Ask the primitive to wait for an acknowledgment.
        const WITH_ACK = 0x08;
    }
}

impl PublishFlags {
    /// Publicly visible event. The absence of `PRIVATE`.
    pub const PUBLIC: PublishFlags = PublishFlags::empty();

    pub fn is_private(self) -> bool {
        self.contains(PublishFlags::PRIVATE)
    }

    /// Acknowledgment is the default unless `NO_ACK` was requested.
    pub fn requires_ack(self) -> bool {
        !self.contains(PublishFlags::NO_ACK)
    }

    /// Parse a comma separated list such as `"private,with_ack"`.
    ///
    /// Names are case-insensitive; `public` contributes no bits.
    pub fn parse_list(list: &str) -> Result<Self, FlagParseError> {
        list.split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .try_fold(PublishFlags::PUBLIC, |flags, name| {
                let flag = match name.to_ascii_lowercase().as_str() {
                    "public" => PublishFlags::PUBLIC,
                    "private" => PublishFlags::PRIVATE,
                    "no_ack" => PublishFlags::NO_ACK,
                    "with_ack" => PublishFlags::WITH_ACK,
                    _ => return Err(FlagParseError::UnknownFlag(name.to_string())),
                };
                Ok(flags | flag)
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FlagParseError {
    #[error("Unknown publish flag: {0}")]
    UnknownFlag(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_values_match_wire_layout() {
        assert_eq!(PublishFlags::PUBLIC.bits(), 0x00);
        assert_eq!(PublishFlags::PRIVATE.bits(), 0x01);
        assert_eq!(PublishFlags::NO_ACK.bits(), 0x02);
        assert_eq!(PublishFlags::WITH_ACK.bits(), 0x08);
        assert_eq!((PublishFlags::PRIVATE | PublishFlags::WITH_ACK).bits(), 0x09);
    }

    #[test]
    fn test_visibility_and_ack_mode() {
        assert!(!PublishFlags::PUBLIC.is_private());
        assert!(PublishFlags::PUBLIC.requires_ack());
        assert!(!(PublishFlags::PRIVATE | PublishFlags::NO_ACK).requires_ack());
        assert!((PublishFlags::PRIVATE | PublishFlags::WITH_ACK).is_private());
    }

    #[test]
    fn test_parse_list() {
        assert_eq!(
            PublishFlags::parse_list("private, WITH_ACK").unwrap(),
            PublishFlags::PRIVATE | PublishFlags::WITH_ACK
        );
        assert_eq!(PublishFlags::parse_list("public").unwrap(), PublishFlags::PUBLIC);
        assert_eq!(PublishFlags::parse_list("").unwrap(), PublishFlags::PUBLIC);
        assert_eq!(
            PublishFlags::parse_list("private,loud"),
            Err(FlagParseError::UnknownFlag("loud".to_string()))
        );
    }
}
