// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Governance configuration
//!
//! ```toml
//! [lock]
//! ack_check_attempts = 5
//! ack_check_interval = "1s"
//! lock_timeout = "5s"
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Errors from loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level governance configuration
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernanceConfig {
    #[serde(default)]
    pub lock: LockConfig,
}

impl GovernanceConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}

/// Tunables for the lock ack barrier
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockConfig {
    /// Polling attempts before a barrier gives up
    #[serde(default = "default_ack_check_attempts")]
    pub ack_check_attempts: u32,
    /// Pause between polling attempts
    #[serde(default = "default_ack_check_interval", with = "humantime_serde")]
    pub ack_check_interval: Duration,
    /// Acquisition timeout used when the caller does not pass one
    #[serde(default = "default_lock_timeout", with = "humantime_serde")]
    pub lock_timeout: Duration,
}

fn default_ack_check_attempts() -> u32 {
    5
}

fn default_ack_check_interval() -> Duration {
    Duration::from_secs(1)
}

fn default_lock_timeout() -> Duration {
    Duration::from_secs(5)
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            ack_check_attempts: default_ack_check_attempts(),
            ack_check_interval: default_ack_check_interval(),
            lock_timeout: default_lock_timeout(),
        }
    }
}

impl LockConfig {
    pub fn with_ack_check_attempts(mut self, attempts: u32) -> Self {
        self.ack_check_attempts = attempts;
        self
    }

    pub fn with_ack_check_interval(mut self, interval: Duration) -> Self {
        self.ack_check_interval = interval;
        self
    }

    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
