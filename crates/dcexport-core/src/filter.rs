//! Channel filter policies
//!
//! One policy per scope. The selector only talks to [`ChannelFilter`], so
//! guild-specific rules (categories, voice) stay out of the selection loop.

use crate::types::{Channel, Snowflake};
use std::collections::HashSet;

/// Pre-classification of a channel before the main ignore rules run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Triage {
    /// Structural entry: not counted as selected or ignored
    Skip,
    /// Ignored without consulting `should_ignore`
    Ignore,
    /// Hand to `should_ignore`
    Evaluate,
}

/// Decides whether a channel from the feed takes part in the export.
///
/// Both methods are pure: the same channel always yields the same answer.
pub trait ChannelFilter: Send + Sync {
    fn triage(&self, _channel: &Channel) -> Triage {
        Triage::Evaluate
    }

    fn should_ignore(&self, channel: &Channel) -> bool;
}

/// Filter options for exporting a whole server
#[derive(Debug, Clone)]
pub struct GuildFilter {
    pub ignored_channel_ids: HashSet<Snowflake>,
    pub ignored_category_ids: HashSet<Snowflake>,
    pub only_channel_ids: HashSet<Snowflake>,
    pub only_category_ids: HashSet<Snowflake>,
    pub include_voice: bool,
}

impl Default for GuildFilter {
    fn default() -> Self {
        Self {
            ignored_channel_ids: HashSet::new(),
            ignored_category_ids: HashSet::new(),
            only_channel_ids: HashSet::new(),
            only_category_ids: HashSet::new(),
            include_voice: true,
        }
    }
}

impl ChannelFilter for GuildFilter {
    fn triage(&self, channel: &Channel) -> Triage {
        if channel.kind.is_category() {
            Triage::Skip
        } else if channel.kind.is_voice() && !self.include_voice {
            Triage::Ignore
        } else {
            Triage::Evaluate
        }
    }

    fn should_ignore(&self, channel: &Channel) -> bool {
        // "only" lists are exclusive and override every ignore option
        if !self.only_channel_ids.is_empty() {
            return !self.only_channel_ids.contains(&channel.id);
        }

        if !self.only_category_ids.is_empty() {
            return channel
                .parent_id
                .is_none_or(|parent| !self.only_category_ids.contains(&parent));
        }

        if self.ignored_channel_ids.contains(&channel.id) {
            return true;
        }

        if channel
            .parent_id
            .is_some_and(|parent| self.ignored_category_ids.contains(&parent))
        {
            return true;
        }

        channel.kind.is_voice() && !self.include_voice
    }
}

/// Filter options for exporting direct message channels
#[derive(Debug, Clone)]
pub struct DirectMessageFilter {
    pub ignored_channel_ids: HashSet<Snowflake>,
    pub only_channel_ids: HashSet<Snowflake>,
    pub include_group_dms: bool,
}

impl Default for DirectMessageFilter {
    fn default() -> Self {
        Self {
            ignored_channel_ids: HashSet::new(),
            only_channel_ids: HashSet::new(),
            include_group_dms: true,
        }
    }
}

impl ChannelFilter for DirectMessageFilter {
    fn should_ignore(&self, channel: &Channel) -> bool {
        if !self.only_channel_ids.is_empty() {
            return !self.only_channel_ids.contains(&channel.id);
        }

        if self.ignored_channel_ids.contains(&channel.id) {
            return true;
        }

        channel.kind.is_group_direct() && !self.include_group_dms
    }
}
