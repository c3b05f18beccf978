//! Channel source seam

use crate::types::{Channel, Scope};
use anyhow::Result;
use futures_util::stream::BoxStream;
use tokio_util::sync::CancellationToken;

/// Lazy, finite, single-use sequence of channels for one scope.
/// An `Err` item is fatal to the consumer.
pub type ChannelFeed<'a> = BoxStream<'a, Result<Channel>>;

/// Anything that can list the channels of a scope
pub trait ChannelSource: Send + Sync {
    /// Start a new feed. Nothing should be fetched until the feed is polled,
    /// and the feed should end early once `cancel` fires.
    fn channels<'a>(&'a self, scope: Scope, cancel: &'a CancellationToken) -> ChannelFeed<'a>;
}
