//! Channel selection — consume a channel feed, filter it, hand the result to export
//!
//! A run has two sequential phases:
//! 1. Discover and filter: pull channels from the feed one at a time, classify
//!    each with the scope's [`ChannelFilter`] and emit one progress event per
//!    classified channel.
//! 2. Export: once the feed is exhausted, pass the selected channels to the
//!    [`ExportInvoker`] as a single batch.
//!
//! Cancellation is checked before every feed poll and raced against the poll
//! itself. A cancelled run stops pulling, skips the export phase and returns
//! the counts gathered so far.

use crate::directory::ChannelDirectory;
use crate::export::ExportInvoker;
use crate::filter::{ChannelFilter, Triage};
use crate::progress::{ProgressEvent, ProgressReporter};
use crate::source::{ChannelFeed, ChannelSource};
use crate::types::{Channel, Scope};
use anyhow::Result;
use futures_util::StreamExt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Running totals for one selection pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectionTally {
    pub selected: usize,
    pub ignored: usize,
    /// Structural entries (categories) that were never classified
    pub skipped: usize,
}

impl SelectionTally {
    /// Number of feed items pulled so far
    pub fn consumed(&self) -> usize {
        self.selected + self.ignored + self.skipped
    }

    /// Human-readable summary lines for the given scope
    pub fn summary(&self, scope: Scope) -> Vec<String> {
        let mut lines = Vec::with_capacity(2);
        match scope {
            Scope::Guild(_) => {
                lines.push(format!("Fetched {} channel(s).", self.selected));
                if self.ignored > 0 {
                    lines.push(format!(
                        "Ignored {} channel(s) based on filters.",
                        self.ignored
                    ));
                }
            }
            Scope::DirectMessages => {
                lines.push(format!(
                    "Selected {} DM channel(s) for export.",
                    self.selected
                ));
                if self.ignored > 0 {
                    lines.push(format!(
                        "Ignored {} DM channel(s) based on filters.",
                        self.ignored
                    ));
                }
            }
        }
        lines
    }
}

/// Channels approved for export, in feed order
#[derive(Debug, Clone)]
pub struct Selection {
    pub scope: Scope,
    pub channels: Vec<Channel>,
    pub ignored: Vec<Channel>,
    /// Category names seen in the feed, for display
    pub directory: ChannelDirectory,
    pub tally: SelectionTally,
}

/// Result of the discover-and-filter phase
#[derive(Debug, Clone)]
pub enum SelectionOutcome {
    Completed(Selection),
    Cancelled(SelectionTally),
}

/// Result of a full selection + export run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Exported(SelectionTally),
    Cancelled(SelectionTally),
}

impl RunOutcome {
    pub fn tally(&self) -> SelectionTally {
        match self {
            Self::Exported(tally) | Self::Cancelled(tally) => *tally,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }
}

/// Drives a channel feed through a filter policy
pub struct ChannelSelector {
    filter: Box<dyn ChannelFilter>,
    progress: Arc<dyn ProgressReporter>,
}

impl ChannelSelector {
    pub fn new(filter: Box<dyn ChannelFilter>, progress: Arc<dyn ProgressReporter>) -> Self {
        Self { filter, progress }
    }

    /// Run the whole pipeline: pull the scope's feed from `source`, select,
    /// then export the selection unless the run was cancelled.
    pub async fn run(
        &self,
        source: &dyn ChannelSource,
        scope: Scope,
        exporter: &dyn ExportInvoker,
        cancel: &CancellationToken,
    ) -> Result<RunOutcome> {
        info!("Fetching channels for {}", scope);
        let feed = source.channels(scope, cancel);

        let selection = match self.select(scope, feed, cancel).await? {
            SelectionOutcome::Completed(selection) => selection,
            SelectionOutcome::Cancelled(tally) => return Ok(RunOutcome::Cancelled(tally)),
        };

        let tally = selection.tally;
        if cancel.is_cancelled() {
            return Ok(RunOutcome::Cancelled(tally));
        }
        info!(
            "Handing {} channel(s) from {} to export",
            selection.channels.len(),
            scope
        );
        exporter.export(selection, cancel).await?;
        Ok(RunOutcome::Exported(tally))
    }

    /// Consume `feed` to the end (or until cancelled) and partition it.
    ///
    /// Feed errors are returned as-is and abort the pass.
    pub async fn select(
        &self,
        scope: Scope,
        mut feed: ChannelFeed<'_>,
        cancel: &CancellationToken,
    ) -> Result<SelectionOutcome> {
        let mut channels = Vec::new();
        let mut ignored = Vec::new();
        let mut directory = ChannelDirectory::new();
        let mut tally = SelectionTally::default();

        loop {
            if cancel.is_cancelled() {
                return Ok(Self::cancelled(scope, tally));
            }

            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Ok(Self::cancelled(scope, tally)),
                next = feed.next() => next,
            };

            let Some(item) = next else {
                break;
            };
            let channel = item?;
            directory.record(&channel);

            let triage = self.filter.triage(&channel);
            let ignore = match triage {
                Triage::Skip => {
                    debug!("Skipping structural channel {} ({})", channel.name, channel.id);
                    tally.skipped += 1;
                    continue;
                }
                Triage::Ignore => true,
                Triage::Evaluate => self.filter.should_ignore(&channel),
            };

            let name = directory.hierarchical_name(&channel);
            if ignore {
                tally.ignored += 1;
                self.progress.report(ProgressEvent::Ignored { name });
                ignored.push(channel);
            } else {
                tally.selected += 1;
                self.progress.report(ProgressEvent::Selected { name });
                channels.push(channel);
            }
        }

        debug!(
            "Selection for {} finished: {} selected, {} ignored, {} skipped",
            scope, tally.selected, tally.ignored, tally.skipped
        );

        Ok(SelectionOutcome::Completed(Selection {
            scope,
            channels,
            ignored,
            directory,
            tally,
        }))
    }

    fn cancelled(scope: Scope, tally: SelectionTally) -> SelectionOutcome {
        warn!(
            "Channel selection for {} cancelled after {} item(s): {} selected, {} ignored",
            scope,
            tally.consumed(),
            tally.selected,
            tally.ignored
        );
        SelectionOutcome::Cancelled(tally)
    }
}
