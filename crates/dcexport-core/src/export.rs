//! Export seam and the built-in exporters
//!
//! Message retrieval and rendering live behind [`ExportInvoker`]. The
//! exporters here only record what was selected.

use crate::selection::Selection;
use crate::types::{ChannelKind, Scope, Snowflake};
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Receives the final selection once the feed has been fully consumed
#[async_trait]
pub trait ExportInvoker: Send + Sync {
    async fn export(&self, selection: Selection, cancel: &CancellationToken) -> Result<()>;
}

/// One selected channel as written to the manifest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub id: Snowflake,
    pub kind: ChannelKind,
    pub name: String,
    pub hierarchical_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<Snowflake>,
    pub created_at: DateTime<Utc>,
}

/// JSON document describing a selection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionManifest {
    pub scope: Scope,
    pub generated_at: DateTime<Utc>,
    pub ignored_count: usize,
    pub channels: Vec<ManifestEntry>,
}

impl SelectionManifest {
    pub fn from_selection(selection: &Selection) -> Self {
        let channels = selection
            .channels
            .iter()
            .map(|channel| ManifestEntry {
                id: channel.id,
                kind: channel.kind,
                name: channel.name.clone(),
                hierarchical_name: selection.directory.hierarchical_name(channel),
                parent_id: channel.parent_id,
                created_at: channel.id.created_at(),
            })
            .collect();

        Self {
            scope: selection.scope,
            generated_at: Utc::now(),
            ignored_count: selection.tally.ignored,
            channels,
        }
    }
}

/// Writes `<output_dir>/<scope>-selection.json`
pub struct ManifestExporter {
    output_dir: PathBuf,
}

impl ManifestExporter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn manifest_path(&self, scope: Scope) -> PathBuf {
        self.output_dir.join(format!("{}-selection.json", scope))
    }
}

#[async_trait]
impl ExportInvoker for ManifestExporter {
    async fn export(&self, selection: Selection, cancel: &CancellationToken) -> Result<()> {
        if cancel.is_cancelled() {
            return Err(anyhow!("Export cancelled before writing manifest"));
        }

        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .with_context(|| {
                format!(
                    "Failed to create output dir: {}",
                    self.output_dir.display()
                )
            })?;

        let manifest = SelectionManifest::from_selection(&selection);
        let json = serde_json::to_string_pretty(&manifest)?;
        let path = self.manifest_path(selection.scope);
        tokio::fs::write(&path, json)
            .await
            .with_context(|| format!("Failed to write manifest: {}", path.display()))?;

        info!(
            "Wrote {} channel(s) to {}",
            manifest.channels.len(),
            path.display()
        );
        Ok(())
    }
}

/// Logs the selection without touching the filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunExporter;

#[async_trait]
impl ExportInvoker for DryRunExporter {
    async fn export(&self, selection: Selection, _cancel: &CancellationToken) -> Result<()> {
        for channel in &selection.channels {
            info!(
                "[dry-run] would export {} ({}, {})",
                selection.directory.hierarchical_name(channel),
                channel.kind,
                channel.id
            );
        }
        info!(
            "[dry-run] {} channel(s) selected for {}",
            selection.channels.len(),
            selection.scope
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::ChannelDirectory;
    use crate::selection::SelectionTally;
    use crate::types::Channel;

    fn sample_selection() -> Selection {
        let category = Channel::new(1u64, ChannelKind::GuildCategory, "Text");
        let mut directory = ChannelDirectory::new();
        directory.record(&category);

        Selection {
            scope: Scope::Guild(Snowflake::new(99)),
            channels: vec![
                Channel::new(2u64, ChannelKind::GuildText, "general").with_parent(1u64),
                Channel::new(3u64, ChannelKind::GuildAnnouncement, "news"),
            ],
            ignored: vec![],
            directory,
            tally: SelectionTally {
                selected: 2,
                ignored: 4,
                skipped: 1,
            },
        }
    }

    #[test]
    fn test_manifest_from_selection() {
        let manifest = SelectionManifest::from_selection(&sample_selection());
        assert_eq!(manifest.channels.len(), 2);
        assert_eq!(manifest.channels[0].hierarchical_name, "Text / general");
        assert_eq!(manifest.channels[1].hierarchical_name, "news");
        assert_eq!(manifest.ignored_count, 4);
    }

    #[tokio::test]
    async fn test_manifest_exporter_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = ManifestExporter::new(dir.path().join("out"));
        let cancel = CancellationToken::new();

        exporter.export(sample_selection(), &cancel).await.unwrap();

        let path = exporter.manifest_path(Scope::Guild(Snowflake::new(99)));
        assert!(path.ends_with("guild-99-selection.json"));
        let content = std::fs::read_to_string(&path).unwrap();
        let manifest: SelectionManifest = serde_json::from_str(&content).unwrap();
        assert_eq!(manifest.scope, Scope::Guild(Snowflake::new(99)));
        assert_eq!(manifest.channels[0].id, Snowflake::new(2));
        assert_eq!(manifest.channels[0].kind, ChannelKind::GuildText);
    }

    #[tokio::test]
    async fn test_manifest_exporter_respects_cancel() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = ManifestExporter::new(dir.path());
        let cancel = CancellationToken::new();
        cancel.cancel();

        assert!(exporter.export(sample_selection(), &cancel).await.is_err());
        assert!(!exporter.manifest_path(Scope::Guild(Snowflake::new(99))).exists());
    }

    #[tokio::test]
    async fn test_dry_run_exporter() {
        let cancel = CancellationToken::new();
        assert!(DryRunExporter.export(sample_selection(), &cancel).await.is_ok());
    }
}
