//! Poller configuration.

use std::time::Duration;

use crate::error::{Result, RuntimeError};

/// Environment variable overriding the poll interval, in milliseconds.
pub const POLL_INTERVAL_ENV: &str = "BOTDESK_POLL_INTERVAL_MS";

/// Configuration for [`crate::KnowledgePoller`].
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Time between status queries. The first query happens one interval
    /// after the watch is armed.
    pub poll_interval: Duration,
    /// Capacity of the poll event channel.
    pub event_capacity: usize,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(3),
            event_capacity: 64,
        }
    }
}

impl PollerConfig {
    /// Creates a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Default config with `BOTDESK_POLL_INTERVAL_MS` applied.
    pub fn from_env() -> Result<Self> {
        let config = Self::default();
        match std::env::var(POLL_INTERVAL_ENV) {
            Ok(ms) => {
                let ms: u64 = ms.trim().parse().map_err(|_| {
                    RuntimeError::Configuration(format!(
                        "{} must be a number of milliseconds, got {:?}",
                        POLL_INTERVAL_ENV, ms
                    ))
                })?;
                if ms == 0 {
                    return Err(RuntimeError::Configuration(format!(
                        "{} must be greater than zero",
                        POLL_INTERVAL_ENV
                    )));
                }
                Ok(config.with_poll_interval(Duration::from_millis(ms)))
            }
            Err(_) => Ok(config),
        }
    }

    /// Sets the poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Sets the event channel capacity.
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    /// Checks that the poll interval is non-zero.
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval.is_zero() {
            return Err(RuntimeError::Configuration(
                "poll interval must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
