//! Per-pack configuration interface for **packup**.

use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// How many mods are resolved and downloaded at once.
    pub workers: usize,

    /// The minimum delay between two requests to the hosting service, in
    /// milliseconds. Modrinth asks clients to stay under 300 requests a minute.
    pub request_interval_ms: u64,

    /// How long a single HTTP request may take, in seconds.
    pub http_timeout_secs: u64,

    pub backup_mode: BackupMode,
}

impl Settings {
    pub const DEFAULT_WORKERS: usize = 4;

    /// The worker count, never zero.
    #[must_use]
    pub fn workers(&self) -> usize {
        self.workers.max(1)
    }

    #[must_use]
    pub const fn request_interval(&self) -> Duration {
        Duration::from_millis(self.request_interval_ms)
    }

    #[must_use]
    pub const fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            workers: Self::DEFAULT_WORKERS,
            request_interval_ms: 250,
            http_timeout_secs: 30,
            backup_mode: BackupMode::default(),
        }
    }
}

/// What happens to a mod file once its replacement is in place.
#[derive(Serialize, Deserialize, Default, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BackupMode {
    /// Delete the replaced file.
    #[default]
    Discard,

    /// Move the replaced file into `old_mods/`, next to the new one, with a
    /// timestamp in its name.
    Keep,
}

impl BackupMode {
    pub const BACKUP_DIRECTORY: &'static str = "old_mods";
}
