//! dcexport-core - channel selection for Discord exports
//!
//! This crate provides:
//! - Channel, snowflake and scope types
//! - Filter policies for guild and direct message scopes
//! - The selector that consumes a channel feed, filters it and hands the
//!   result to an exporter
//! - Progress reporters and the built-in manifest / dry-run exporters

pub mod directory;
pub mod export;
pub mod filter;
pub mod progress;
pub mod selection;
pub mod source;
pub mod types;

// Re-export main types for convenience
pub use directory::ChannelDirectory;
pub use export::{DryRunExporter, ExportInvoker, ManifestExporter, SelectionManifest};
pub use filter::{ChannelFilter, DirectMessageFilter, GuildFilter, Triage};
pub use progress::{ChannelReporter, NoopReporter, ProgressEvent, ProgressReporter, TracingReporter};
pub use selection::{ChannelSelector, RunOutcome, Selection, SelectionOutcome, SelectionTally};
pub use source::{ChannelFeed, ChannelSource};
pub use types::{Channel, ChannelKind, ParseSnowflakeError, Scope, Snowflake};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crate_exports() {
        // Just verify that all main types are exported
        let _ = std::mem::size_of::<ChannelSelector>();
        let _ = std::mem::size_of::<Channel>();
        let _ = std::mem::size_of::<GuildFilter>();
        let _ = std::mem::size_of::<DirectMessageFilter>();
        let _ = std::mem::size_of::<ManifestExporter>();
    }
}
