//! Discord REST payloads

use dcexport_core::{Channel, ChannelKind, Snowflake};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct RawUser {
    pub username: String,
    #[serde(default)]
    pub global_name: Option<String>,
}

impl RawUser {
    fn display_name(&self) -> &str {
        self.global_name.as_deref().unwrap_or(&self.username)
    }
}

/// Channel object as returned by `/guilds/{id}/channels` and `/users/@me/channels`
#[derive(Debug, Clone, Deserialize)]
pub struct RawChannel {
    pub id: Snowflake,
    #[serde(rename = "type")]
    pub kind: ChannelKind,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub parent_id: Option<Snowflake>,
    #[serde(default)]
    pub position: Option<i32>,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub recipients: Vec<RawUser>,
}

impl RawChannel {
    /// DMs have no name of their own; fall back to the recipients
    fn resolved_name(&self) -> String {
        if let Some(name) = self.name.as_deref().filter(|n| !n.is_empty()) {
            return name.to_string();
        }
        if self.recipients.is_empty() {
            return format!("Unknown channel ({})", self.id);
        }
        self.recipients
            .iter()
            .map(RawUser::display_name)
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn into_channel(self) -> Channel {
        let name = self.resolved_name();
        Channel {
            id: self.id,
            kind: self.kind,
            name,
            parent_id: self.parent_id,
            position: self.position,
            topic: self.topic.filter(|t| !t.is_empty()),
        }
    }
}

/// Error body Discord sends with non-2xx responses
#[derive(Debug, Clone, Deserialize)]
pub struct ApiError {
    pub message: String,
    #[serde(default)]
    pub code: i64,
}

/// Sidebar order: categories first so child names resolve, then by position and id
pub fn order_guild_channels(channels: &mut [Channel]) {
    channels.sort_by_key(|c| (!c.kind.is_category(), c.position.unwrap_or(i32::MAX), c.id));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_guild_channel() {
        let json = r#"{
            "id": "41771983423143937",
            "type": 0,
            "guild_id": "41771983423143937",
            "name": "general",
            "position": 6,
            "parent_id": "399942396007890945",
            "topic": "",
            "nsfw": false
        }"#;
        let raw: RawChannel = serde_json::from_str(json).unwrap();
        let channel = raw.into_channel();
        assert_eq!(channel.kind, ChannelKind::GuildText);
        assert_eq!(channel.name, "general");
        assert_eq!(channel.parent_id, Some(Snowflake::new(399942396007890945)));
        assert_eq!(channel.position, Some(6));
        assert_eq!(channel.topic, None);
    }

    #[test]
    fn test_parse_category_with_null_parent() {
        let json = r#"{"id": "1", "type": 4, "name": "Voice", "position": 1, "parent_id": null}"#;
        let channel = serde_json::from_str::<RawChannel>(json).unwrap().into_channel();
        assert!(channel.kind.is_category());
        assert_eq!(channel.parent_id, None);
    }

    #[test]
    fn test_dm_name_from_recipients() {
        let json = r#"{
            "id": "319674150115610528",
            "type": 3,
            "name": null,
            "recipients": [
                {"id": "1", "username": "alice", "global_name": "Alice"},
                {"id": "2", "username": "bob"}
            ]
        }"#;
        let channel = serde_json::from_str::<RawChannel>(json).unwrap().into_channel();
        assert_eq!(channel.kind, ChannelKind::GroupDirectMessage);
        assert_eq!(channel.name, "Alice, bob");
    }

    #[test]
    fn test_named_group_dm_keeps_name() {
        let json = r#"{"id": "5", "type": 3, "name": "Weekend plans", "recipients": [{"username": "bob"}]}"#;
        let channel = serde_json::from_str::<RawChannel>(json).unwrap().into_channel();
        assert_eq!(channel.name, "Weekend plans");
    }

    #[test]
    fn test_unknown_kind_is_preserved() {
        let json = r#"{"id": "5", "type": 42, "name": "future"}"#;
        let channel = serde_json::from_str::<RawChannel>(json).unwrap().into_channel();
        assert_eq!(channel.kind, ChannelKind::Unknown(42));
    }

    #[test]
    fn test_order_guild_channels() {
        let mut channels = vec![
            Channel::new(10u64, ChannelKind::GuildText, "b").with_position(1),
            Channel::new(11u64, ChannelKind::GuildText, "a").with_position(0),
            Channel::new(20u64, ChannelKind::GuildCategory, "cat2").with_position(1),
            Channel::new(21u64, ChannelKind::GuildCategory, "cat1").with_position(0),
            Channel::new(12u64, ChannelKind::GuildVoice, "vc"),
        ];
        order_guild_channels(&mut channels);
        let names: Vec<&str> = channels.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["cat1", "cat2", "a", "b", "vc"]);
    }

    #[test]
    fn test_parse_api_error() {
        let err: ApiError = serde_json::from_str(r#"{"message": "Missing Access", "code": 50001}"#).unwrap();
        assert_eq!(err.code, 50001);
        assert_eq!(err.message, "Missing Access");
    }
}
