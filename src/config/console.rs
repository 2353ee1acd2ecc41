//! Console host settings: modal timeout, page owner, message identity

use crate::host::{MessageRef, UserId};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleConfig {
    /// How long an open modal waits for `submit` before timing out
    pub modal_timeout_secs: u64,
    /// Restrict the demo pages to this user
    pub owner_id: Option<u64>,
    /// Identity of the simulated message
    pub channel_id: u64,
    pub message_id: u64,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            modal_timeout_secs: 60,
            owner_id: None,
            channel_id: 1,
            message_id: 1,
        }
    }
}

/// Console settings as loaded from config file
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct FileConsole {
    pub modal_timeout_secs: Option<u64>,
    pub owner_id: Option<u64>,
    pub channel_id: Option<u64>,
    pub message_id: Option<u64>,
}

impl ConsoleConfig {
    pub fn from_file(file: Option<FileConsole>) -> Self {
        let file = file.unwrap_or_default();
        let defaults = Self::default();

        Self {
            modal_timeout_secs: file.modal_timeout_secs.unwrap_or(defaults.modal_timeout_secs),
            owner_id: file.owner_id.or(defaults.owner_id),
            channel_id: file.channel_id.unwrap_or(defaults.channel_id),
            message_id: file.message_id.unwrap_or(defaults.message_id),
        }
    }

    pub fn modal_timeout(&self) -> Duration {
        Duration::from_secs(self.modal_timeout_secs)
    }

    pub fn owner(&self) -> Option<UserId> {
        self.owner_id.map(UserId)
    }

    pub fn message(&self) -> MessageRef {
        MessageRef {
            channel_id: self.channel_id,
            message_id: self.message_id,
        }
    }
}
