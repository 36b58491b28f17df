use std::fmt;

/// Replay error — one variant per failure category. Every error is
/// handled at the boundary of the playback loop; nothing below the
/// driver swallows one, and nothing retries.
#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    #[error("config error: {0}")]
    Config(String),

    #[error("cannot open {target}: {reason}")]
    Open { target: String, reason: String },

    #[error("channel pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("corrupt log entry at byte {offset}: {reason}")]
    CorruptRecord { offset: u64, reason: String },

    #[error("publish on '{channel}': {reason}")]
    Publish { channel: String, reason: String },
}

impl ReplayError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn open(target: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::Open {
            target: target.into(),
            reason: reason.to_string(),
        }
    }

    pub fn corrupt(offset: u64, reason: impl Into<String>) -> Self {
        Self::CorruptRecord {
            offset,
            reason: reason.into(),
        }
    }

    pub fn publish(channel: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::Publish {
            channel: channel.into(),
            reason: reason.to_string(),
        }
    }
}
