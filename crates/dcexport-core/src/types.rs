//! Shared types for dcexport-core

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Milliseconds between the Unix epoch and the first second of 2015 (Discord epoch)
const DISCORD_EPOCH_MS: u64 = 1_420_070_400_000;

/// 64-bit Discord identifier with an embedded creation timestamp
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Snowflake(u64);

impl Snowflake {
    /// Id of the synthetic guild that holds direct message channels
    pub const DIRECT_MESSAGES: Snowflake = Snowflake(0);

    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    /// Creation time encoded in the upper 42 bits
    pub fn created_at(&self) -> DateTime<Utc> {
        let millis = (self.0 >> 22) + DISCORD_EPOCH_MS;
        Utc.timestamp_millis_opt(millis as i64)
            .single()
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid snowflake '{input}': expected a non-negative 64-bit integer")]
pub struct ParseSnowflakeError {
    input: String,
}

impl FromStr for Snowflake {
    type Err = ParseSnowflakeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(Snowflake)
            .map_err(|_| ParseSnowflakeError {
                input: s.to_string(),
            })
    }
}

impl TryFrom<String> for Snowflake {
    type Error = ParseSnowflakeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Snowflake> for String {
    fn from(value: Snowflake) -> Self {
        value.to_string()
    }
}

impl From<u64> for Snowflake {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for Snowflake {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Channel kind, mirroring the numeric codes used on the Discord wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum ChannelKind {
    GuildText,
    DirectMessage,
    GuildVoice,
    GroupDirectMessage,
    GuildCategory,
    GuildAnnouncement,
    AnnouncementThread,
    PublicThread,
    PrivateThread,
    GuildStageVoice,
    GuildDirectory,
    GuildForum,
    Unknown(u8),
}

impl ChannelKind {
    /// Voice and stage channels
    pub fn is_voice(&self) -> bool {
        matches!(self, Self::GuildVoice | Self::GuildStageVoice)
    }

    pub fn is_category(&self) -> bool {
        matches!(self, Self::GuildCategory)
    }

    pub fn is_direct(&self) -> bool {
        matches!(self, Self::DirectMessage | Self::GroupDirectMessage)
    }

    pub fn is_group_direct(&self) -> bool {
        matches!(self, Self::GroupDirectMessage)
    }
}

impl From<u8> for ChannelKind {
    fn from(code: u8) -> Self {
        match code {
            0 => Self::GuildText,
            1 => Self::DirectMessage,
            2 => Self::GuildVoice,
            3 => Self::GroupDirectMessage,
            4 => Self::GuildCategory,
            5 => Self::GuildAnnouncement,
            10 => Self::AnnouncementThread,
            11 => Self::PublicThread,
            12 => Self::PrivateThread,
            13 => Self::GuildStageVoice,
            14 => Self::GuildDirectory,
            15 => Self::GuildForum,
            other => Self::Unknown(other),
        }
    }
}

impl From<ChannelKind> for u8 {
    fn from(kind: ChannelKind) -> Self {
        match kind {
            ChannelKind::GuildText => 0,
            ChannelKind::DirectMessage => 1,
            ChannelKind::GuildVoice => 2,
            ChannelKind::GroupDirectMessage => 3,
            ChannelKind::GuildCategory => 4,
            ChannelKind::GuildAnnouncement => 5,
            ChannelKind::AnnouncementThread => 10,
            ChannelKind::PublicThread => 11,
            ChannelKind::PrivateThread => 12,
            ChannelKind::GuildStageVoice => 13,
            ChannelKind::GuildDirectory => 14,
            ChannelKind::GuildForum => 15,
            ChannelKind::Unknown(code) => code,
        }
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GuildText => write!(f, "text"),
            Self::DirectMessage => write!(f, "dm"),
            Self::GuildVoice => write!(f, "voice"),
            Self::GroupDirectMessage => write!(f, "group-dm"),
            Self::GuildCategory => write!(f, "category"),
            Self::GuildAnnouncement => write!(f, "announcement"),
            Self::AnnouncementThread => write!(f, "announcement-thread"),
            Self::PublicThread => write!(f, "public-thread"),
            Self::PrivateThread => write!(f, "private-thread"),
            Self::GuildStageVoice => write!(f, "stage"),
            Self::GuildDirectory => write!(f, "directory"),
            Self::GuildForum => write!(f, "forum"),
            Self::Unknown(code) => write!(f, "unknown({})", code),
        }
    }
}

/// A channel as delivered by the channel source.
///
/// `parent_id` is a plain id reference to the owning category; the category
/// itself is looked up through a [`crate::ChannelDirectory`] when needed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub id: Snowflake,
    pub kind: ChannelKind,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<Snowflake>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
}

impl Channel {
    pub fn new(id: impl Into<Snowflake>, kind: ChannelKind, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            name: name.into(),
            parent_id: None,
            position: None,
            topic: None,
        }
    }

    pub fn with_parent(mut self, parent_id: impl Into<Snowflake>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn with_position(mut self, position: i32) -> Self {
        self.position = Some(position);
        self
    }
}

/// What an export runs against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "id")]
pub enum Scope {
    Guild(Snowflake),
    DirectMessages,
}

impl Scope {
    /// Guild id used when querying the channel source
    pub fn id(&self) -> Snowflake {
        match self {
            Self::Guild(id) => *id,
            Self::DirectMessages => Snowflake::DIRECT_MESSAGES,
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Guild(id) => write!(f, "guild-{}", id),
            Self::DirectMessages => write!(f, "direct-messages"),
        }
    }
}
