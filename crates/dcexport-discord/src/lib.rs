//! Discord adapter for dcexport
//!
//! Provides the REST-backed channel source used by the CLI.

pub mod source;
pub mod wire;

pub use source::{DEFAULT_BASE_URL, DiscordChannelSource};
