//! Processed-set ledger — the durable record of ticket ids already
//! routed, keyed on the mailbox-assigned identifier.
//!
//! The snapshot is a sorted JSON array so repeated saves of the same
//! set are byte-identical and diffs stay readable. Saves go through a
//! temp sibling plus rename so a crash mid-write never leaves a
//! truncated snapshot behind.

use std::collections::BTreeSet;
use std::path::PathBuf;

use tokio::fs;
use tracing::{debug, warn};

/// Durable set of processed ticket ids, owned by the orchestrator for
/// the duration of a run.
#[derive(Debug)]
pub struct Ledger {
    path: PathBuf,
    ids: BTreeSet<String>,
}

impl Ledger {
    /// Load the snapshot at `path`. A missing, unreadable, or
    /// structurally invalid snapshot yields an empty set: re-processing
    /// a few tickets beats refusing to run.
    pub async fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let ids = match fs::read_to_string(&path).await {
            Ok(content) => match serde_json::from_str::<Vec<String>>(&content) {
                Ok(list) => {
                    debug!(path = %path.display(), count = list.len(), "Loaded ledger snapshot");
                    list.into_iter().collect()
                }
                Err(e) => {
                    warn!(
                        path = %path.display(),
                        error = %e,
                        "Ledger snapshot invalid, starting from an empty set"
                    );
                    BTreeSet::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeSet::new(),
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "Ledger snapshot unreadable, starting from an empty set"
                );
                BTreeSet::new()
            }
        };
        Self { path, ids }
    }

    /// Exact string match on the ticket id.
    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Record an id as routed. Returns `true` if newly inserted.
    ///
    /// Call only after the row store accepted the ticket's row.
    pub fn insert(&mut self, id: impl Into<String>) -> bool {
        self.ids.insert(id.into())
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Write-replace the full snapshot: serialize the sorted set to a
    /// temp sibling, then rename over the previous file.
    pub async fn save(&self) -> Result<(), std::io::Error> {
        let list: Vec<&String> = self.ids.iter().collect();
        let json = serde_json::to_string_pretty(&list).map_err(std::io::Error::other)?;

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).await?;
        }

        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, json).await?;
        fs::rename(&tmp, &self.path).await?;
        debug!(path = %self.path.display(), count = self.ids.len(), "Ledger snapshot saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn ledger_path(dir: &TempDir) -> PathBuf {
        dir.path().join("processed.json")
    }

    #[tokio::test]
    async fn missing_snapshot_loads_empty() {
        let dir = TempDir::new().unwrap();
        let ledger = Ledger::load(ledger_path(&dir)).await;
        assert!(ledger.is_empty());
    }

    #[tokio::test]
    async fn corrupt_snapshot_loads_empty() {
        let dir = TempDir::new().unwrap();
        let path = ledger_path(&dir);
        std::fs::write(&path, "{ not json [").unwrap();

        let ledger = Ledger::load(&path).await;
        assert!(ledger.is_empty());
    }

    #[tokio::test]
    async fn wrong_shape_snapshot_loads_empty() {
        let dir = TempDir::new().unwrap();
        let path = ledger_path(&dir);
        std::fs::write(&path, r#"{"ids": ["a"]}"#).unwrap();

        let ledger = Ledger::load(&path).await;
        assert!(ledger.is_empty());
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let dir = TempDir::new().unwrap();
        let path = ledger_path(&dir);

        let mut ledger = Ledger::load(&path).await;
        assert!(ledger.insert("msg-b"));
        assert!(ledger.insert("msg-a"));
        assert!(!ledger.insert("msg-a"));
        ledger.save().await.unwrap();

        let reloaded = Ledger::load(&path).await;
        assert_eq!(reloaded.len(), 2);
        assert!(reloaded.contains("msg-a"));
        assert!(reloaded.contains("msg-b"));
        assert!(!reloaded.contains("msg-c"));
    }

    #[tokio::test]
    async fn snapshot_is_sorted_and_deterministic() {
        let dir = TempDir::new().unwrap();
        let path = ledger_path(&dir);

        let mut ledger = Ledger::load(&path).await;
        ledger.insert("zzz");
        ledger.insert("aaa");
        ledger.insert("mmm");
        ledger.save().await.unwrap();
        let first = std::fs::read_to_string(&path).unwrap();

        let pos_a = first.find("aaa").unwrap();
        let pos_m = first.find("mmm").unwrap();
        let pos_z = first.find("zzz").unwrap();
        assert!(pos_a < pos_m && pos_m < pos_z);

        ledger.save().await.unwrap();
        let second = std::fs::read_to_string(&path).unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn save_leaves_no_temp_file_behind() {
        let dir = TempDir::new().unwrap();
        let path = ledger_path(&dir);

        let mut ledger = Ledger::load(&path).await;
        ledger.insert("msg-1");
        ledger.save().await.unwrap();

        assert!(path.exists());
        assert!(!path.with_extension("tmp").exists());
    }

    #[tokio::test]
    async fn save_replaces_previous_snapshot() {
        let dir = TempDir::new().unwrap();
        let path = ledger_path(&dir);

        let mut ledger = Ledger::load(&path).await;
        ledger.insert("one");
        ledger.save().await.unwrap();
        ledger.insert("two");
        ledger.save().await.unwrap();

        let reloaded = Ledger::load(&path).await;
        assert_eq!(reloaded.len(), 2);
    }

    #[tokio::test]
    async fn save_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/dir/processed.json");

        let mut ledger = Ledger::load(&path).await;
        ledger.insert("msg-1");
        ledger.save().await.unwrap();
        assert!(path.exists());
    }
}
