use regex::Regex;

use crate::error::ReplayError;

/// Pattern that makes every channel eligible.
pub const MATCH_ALL: &str = ".*";

/// Replay eligibility of channel names against one configured pattern.
///
/// The pattern must match the entire channel name, so `POSE` plays only
/// the `POSE` channel and `POSE.*` plays its whole family. Compiled once
/// at session start; a malformed pattern fails before any record is read.
pub struct ChannelFilter {
    pattern: Regex,
}

impl ChannelFilter {
    pub fn new(pattern: &str) -> Result<Self, ReplayError> {
        let anchored = format!("^(?:{pattern})$");
        Ok(Self {
            pattern: Regex::new(&anchored)?,
        })
    }

    pub fn matches(&self, channel: &str) -> bool {
        self.pattern.is_match(channel)
    }
}
