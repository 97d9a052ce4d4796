//! Realtime gateway tuning

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use crate::adapters::websocket::DEFAULT_OUTBOUND_CAPACITY;

const MAX_OUTBOUND_BUFFER: usize = 65_536;

/// Per-connection buffering and client join behavior
#[derive(Debug, Clone, Deserialize)]
pub struct RealtimeConfig {
    /// Events buffered per connection before the oldest are dropped
    #[serde(default = "default_outbound_buffer")]
    pub outbound_buffer: usize,

    /// How long a client waits for a join acknowledgement
    #[serde(default = "default_join_timeout_ms")]
    pub join_timeout_ms: u64,
}

impl RealtimeConfig {
    /// Get join timeout as Duration
    pub fn join_timeout(&self) -> Duration {
        Duration::from_millis(self.join_timeout_ms)
    }

    /// Validate realtime configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.outbound_buffer == 0 || self.outbound_buffer > MAX_OUTBOUND_BUFFER {
            return Err(ValidationError::InvalidOutboundBuffer);
        }
        if !(100..=60_000).contains(&self.join_timeout_ms) {
            return Err(ValidationError::InvalidJoinTimeout);
        }
        Ok(())
    }
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            outbound_buffer: default_outbound_buffer(),
            join_timeout_ms: default_join_timeout_ms(),
        }
    }
}

fn default_outbound_buffer() -> usize {
    DEFAULT_OUTBOUND_CAPACITY
}

fn default_join_timeout_ms() -> u64 {
    5_000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_realtime_defaults() {
        let config = RealtimeConfig::default();
        assert_eq!(config.outbound_buffer, 128);
        assert_eq!(config.join_timeout(), Duration::from_secs(5));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_buffer_rejected() {
        let config = RealtimeConfig {
            outbound_buffer: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidOutboundBuffer));
    }

    #[test]
    fn test_join_timeout_bounds() {
        let too_short = RealtimeConfig {
            join_timeout_ms: 10,
            ..Default::default()
        };
        let too_long = RealtimeConfig {
            join_timeout_ms: 120_000,
            ..Default::default()
        };
        assert_eq!(too_short.validate(), Err(ValidationError::InvalidJoinTimeout));
        assert_eq!(too_long.validate(), Err(ValidationError::InvalidJoinTimeout));
    }
}
