//! Category name lookup for building hierarchical channel names

use crate::types::{Channel, Snowflake};
use std::collections::HashMap;

/// Maps category ids to their names as they arrive from the feed.
///
/// Children only hold the id of their parent, so resolving `"Category / channel"`
/// is a lookup here rather than a pointer walk. Categories may arrive after
/// their children, in which case the plain channel name is used.
#[derive(Debug, Clone, Default)]
pub struct ChannelDirectory {
    categories: HashMap<Snowflake, String>,
}

impl ChannelDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember a category. Non-category channels are ignored.
    pub fn record(&mut self, channel: &Channel) {
        if channel.kind.is_category() {
            self.categories.insert(channel.id, channel.name.clone());
        }
    }

    pub fn category_name(&self, id: Snowflake) -> Option<&str> {
        self.categories.get(&id).map(String::as_str)
    }

    pub fn hierarchical_name(&self, channel: &Channel) -> String {
        match channel.parent_id.and_then(|id| self.category_name(id)) {
            Some(parent) => format!("{} / {}", parent, channel.name),
            None => channel.name.clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChannelKind;

    #[test]
    fn test_hierarchical_name_with_known_parent() {
        let mut directory = ChannelDirectory::new();
        directory.record(&Channel::new(1u64, ChannelKind::GuildCategory, "Text Channels"));

        let child = Channel::new(2u64, ChannelKind::GuildText, "general").with_parent(1u64);
        assert_eq!(directory.hierarchical_name(&child), "Text Channels / general");
    }

    #[test]
    fn test_hierarchical_name_unknown_parent() {
        let directory = ChannelDirectory::new();
        let child = Channel::new(2u64, ChannelKind::GuildText, "general").with_parent(1u64);
        assert_eq!(directory.hierarchical_name(&child), "general");
    }

    #[test]
    fn test_record_ignores_non_categories() {
        let mut directory = ChannelDirectory::new();
        directory.record(&Channel::new(2u64, ChannelKind::GuildText, "general"));
        assert!(directory.is_empty());
        assert_eq!(directory.category_name(Snowflake::new(2)), None);
    }
}
