//! Batch run configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{ConfigError, ConfigResult};

/// Configuration for one batch run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Maximum number of items processed at once.
    ///
    /// Default: 5.
    pub concurrency: usize,

    /// Time limit for one item's extract + generate chain, in seconds.
    ///
    /// Default: 120.
    pub item_timeout_secs: u64,

    /// Write a report file after the batch.
    ///
    /// Default: true.
    pub report_enabled: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            concurrency: 5,
            item_timeout_secs: 120,
            report_enabled: true,
        }
    }
}

impl BatchConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_item_timeout_secs(mut self, secs: u64) -> Self {
        self.item_timeout_secs = secs;
        self
    }

    pub fn with_report(mut self, enabled: bool) -> Self {
        self.report_enabled = enabled;
        self
    }

    pub fn item_timeout(&self) -> Duration {
        Duration::from_secs(self.item_timeout_secs)
    }

    /// Reject values that would stall a batch.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.concurrency == 0 {
            return Err(ConfigError::Invalid {
                key: "concurrency".into(),
                reason: "must be at least 1".into(),
            });
        }
        if self.item_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "item_timeout_secs".into(),
                reason: "must be at least 1".into(),
            });
        }
        Ok(())
    }
}
