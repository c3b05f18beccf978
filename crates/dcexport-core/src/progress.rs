//! Progress reporting for channel selection
//!
//! Reporters receive one event per classified channel. They are purely
//! cosmetic: a reporter must return immediately and can never change which
//! channels get selected.

use std::fmt;
use tokio::sync::mpsc;
use tracing::debug;

/// Status update emitted while the feed is being classified
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    Ignored { name: String },
    Selected { name: String },
}

impl fmt::Display for ProgressEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ignored { name } => write!(f, "Ignored '{}'.", name),
            Self::Selected { name } => write!(f, "Added '{}' for export.", name),
        }
    }
}

/// Observer for selection progress
pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: ProgressEvent);
}

/// Discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn report(&self, _event: ProgressEvent) {}
}

/// Writes events to the debug log
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl ProgressReporter for TracingReporter {
    fn report(&self, event: ProgressEvent) {
        debug!("{}", event);
    }
}

/// Forwards events to a bounded channel, dropping them when the receiver lags
pub struct ChannelReporter {
    tx: mpsc::Sender<ProgressEvent>,
}

impl ChannelReporter {
    /// Create a reporter and the receiving end for a status display
    pub fn new(buffer: usize) -> (Self, mpsc::Receiver<ProgressEvent>) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        (Self { tx }, rx)
    }
}

impl ProgressReporter for ChannelReporter {
    fn report(&self, event: ProgressEvent) {
        // Full or closed: the status display is behind, drop the update
        if let Err(e) = self.tx.try_send(event) {
            debug!("Dropped progress event: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_text() {
        let ignored = ProgressEvent::Ignored {
            name: "Voice / lounge".to_string(),
        };
        let selected = ProgressEvent::Selected {
            name: "general".to_string(),
        };
        assert_eq!(ignored.to_string(), "Ignored 'Voice / lounge'.");
        assert_eq!(selected.to_string(), "Added 'general' for export.");
    }

    #[tokio::test]
    async fn test_channel_reporter_delivers_in_order() {
        let (reporter, mut rx) = ChannelReporter::new(8);
        reporter.report(ProgressEvent::Selected { name: "a".into() });
        reporter.report(ProgressEvent::Ignored { name: "b".into() });

        assert_eq!(rx.recv().await, Some(ProgressEvent::Selected { name: "a".into() }));
        assert_eq!(rx.recv().await, Some(ProgressEvent::Ignored { name: "b".into() }));
    }

    #[test]
    fn test_channel_reporter_never_blocks_when_full() {
        let (reporter, mut rx) = ChannelReporter::new(1);
        for i in 0..10 {
            reporter.report(ProgressEvent::Selected {
                name: i.to_string(),
            });
        }
        assert_eq!(
            rx.try_recv().unwrap(),
            ProgressEvent::Selected { name: "0".into() }
        );
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_channel_reporter_closed_receiver() {
        let (reporter, rx) = ChannelReporter::new(4);
        drop(rx);
        reporter.report(ProgressEvent::Ignored { name: "x".into() });
    }
}
