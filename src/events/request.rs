use crate::constants::DEFAULT_TTL_SECONDS;

use super::PublishFlags;

/// A single publish as seen by a [`PublishPrimitive`](crate::completion::PublishPrimitive).
///
/// Borrowed for the duration of `submit`; primitives that need the name or
/// data after returning must copy them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublishRequest<'a> {
    pub name: &'a str,
    pub data: Option<&'a [u8]>,
    /// Time-to-live hint in seconds
    pub ttl: u32,
    pub flags: PublishFlags,
}

impl<'a> PublishRequest<'a> {
    pub fn new(name: &'a str) -> Self {
        Self {
            name,
            data: None,
            ttl: DEFAULT_TTL_SECONDS,
            flags: PublishFlags::default(),
        }
    }

    pub fn with_data(mut self, data: &'a [u8]) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_ttl(mut self, ttl: u32) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_flags(mut self, flags: PublishFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn data_len(&self) -> usize {
        self.data.map_or(0, <[u8]>::len)
    }
}
