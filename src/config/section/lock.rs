//! `[lock]` section configuration.
//!
//! ```toml
//! [lock]
//! ttl = 60    # Seconds an edit lock lives without renewal
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::lock::DEFAULT_TTL;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LockConfig {
    /// Lock lifetime in seconds.
    pub ttl: u64,
}

impl LockConfig {
    pub const fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl)
    }
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_TTL.as_secs(),
        }
    }
}
