//! Tracking of the absolute timestamp behind compressed time offsets.

use thiserror::Error;

/// A compressed time offset arrived before any absolute timestamp.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("Compressed timestamp without a preceding absolute timestamp.")]
pub struct NoBaseTimestamp;

const OFFSET_MASK: u32 = 0x1F;
const ROLLOVER: u32 = 0x20;

/// The most recent absolute timestamp, in seconds since the FIT epoch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Clock {
    current: Option<u32>,
}

impl Clock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<u32> {
        self.current
    }

    /// Record an absolute timestamp.
    pub fn observe(&mut self, timestamp: u32) {
        self.current = Some(timestamp);
    }

    /// Resolve a five-bit time offset against the current timestamp.
    ///
    /// An offset lower than the current low five bits means the 32-second
    /// counter wrapped since the last timestamp.
    pub fn expand(&mut self, offset: u8) -> Result<u32, NoBaseTimestamp> {
        let current = self.current.ok_or(NoBaseTimestamp)?;
        let offset = offset as u32 & OFFSET_MASK;

        let mut timestamp = (current & !OFFSET_MASK).wrapping_add(offset);
        if offset < current & OFFSET_MASK {
            timestamp = timestamp.wrapping_add(ROLLOVER);
        }

        self.current = Some(timestamp);
        Ok(timestamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requires_a_base() {
        assert_eq!(Clock::new().expand(3), Err(NoBaseTimestamp));
    }

    #[test]
    fn offsets_replace_low_bits() {
        let mut clock = Clock::new();
        clock.observe(1000);
        assert_eq!(clock.expand(10), Ok(1002));
        assert_eq!(clock.expand(10), Ok(1002));
        assert_eq!(clock.current(), Some(1002));
    }

    #[test]
    fn offsets_wrap_forward() {
        let mut clock = Clock::new();
        let t = 0x1000 | 0x1E;
        clock.observe(t);
        assert_eq!(clock.expand(0x02), Ok(t - 0x1E + 0x20 + 0x02));
    }
}
