//! SQLite Version Store
//!
//! File-based persistent store of analysis-version records.
//! Records are immutable: re-recording an existing (repo, commit) is a no-op.

use async_trait::async_trait;
use parking_lot::Mutex;
use rusqlite::{params, params_from_iter, Connection};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use crate::domain::{AnalysisVersion, CommitId, VersionStore};
use crate::error::PortResult;

/// Bound parameters per batch statement (SQLite's historical limit is 999)
const MAX_BATCH_PARAMS: usize = 500;

/// SQLite-based VersionStore implementation
#[derive(Clone)]
pub struct SqliteVersionStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteVersionStore {
    /// Open (or create) a store at the given path
    pub fn new(db_path: impl AsRef<Path>) -> PortResult<Self> {
        let conn = Connection::open(db_path)?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory SQLite store (for testing)
    pub fn in_memory() -> PortResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> PortResult<()> {
        let conn = self.conn.lock();

        conn.execute(
            "CREATE TABLE IF NOT EXISTS analysis_versions (
                repo TEXT NOT NULL,
                commit_id TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                PRIMARY KEY (repo, commit_id)
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_versions_repo_created
             ON analysis_versions(repo, created_at)",
            [],
        )?;

        Ok(())
    }

    /// Store a record; returns `false` if it already existed
    pub fn record_version(&self, version: &AnalysisVersion) -> PortResult<bool> {
        let conn = self.conn.lock();
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO analysis_versions (repo, commit_id, created_at)
             VALUES (?1, ?2, ?3)",
            params![
                &version.repo,
                &version.commit_id,
                version.created_at.timestamp()
            ],
        )?;
        Ok(inserted == 1)
    }

    /// Records for a repository, newest first
    pub fn list_versions(&self, repo: &str, limit: Option<usize>) -> PortResult<Vec<AnalysisVersion>> {
        let conn = self.conn.lock();
        let limit = limit.map_or(-1, |l| i64::try_from(l).unwrap_or(i64::MAX));
        let mut stmt = conn.prepare(
            "SELECT repo, commit_id, created_at FROM analysis_versions
             WHERE repo = ?1
             ORDER BY created_at DESC, commit_id ASC
             LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![repo, limit], |row| {
            Ok(AnalysisVersion {
                repo: row.get(0)?,
                commit_id: row.get(1)?,
                created_at: chrono::DateTime::from_timestamp(row.get(2)?, 0).unwrap_or_default(),
            })
        })?;

        let mut versions = Vec::new();
        for row in rows {
            versions.push(row?);
        }
        Ok(versions)
    }
}

#[async_trait]
impl VersionStore for SqliteVersionStore {
    async fn has_version(&self, repo: &str, commit_id: &str) -> PortResult<bool> {
        let conn = self.conn.lock();
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM analysis_versions WHERE repo = ?1 AND commit_id = ?2)",
            params![repo, commit_id],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    async fn has_versions(
        &self,
        repo: &str,
        commit_ids: &[CommitId],
    ) -> PortResult<HashSet<CommitId>> {
        let unique: Vec<&str> = {
            let mut seen = HashSet::new();
            commit_ids
                .iter()
                .map(String::as_str)
                .filter(|id| seen.insert(*id))
                .collect()
        };

        let conn = self.conn.lock();
        let mut found = HashSet::new();

        for chunk in unique.chunks(MAX_BATCH_PARAMS) {
            let placeholders = (0..chunk.len())
                .map(|i| format!("?{}", i + 2))
                .collect::<Vec<_>>()
                .join(", ");
            let sql = format!(
                "SELECT commit_id FROM analysis_versions WHERE repo = ?1 AND commit_id IN ({})",
                placeholders
            );

            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(
                params_from_iter(std::iter::once(repo).chain(chunk.iter().copied())),
                |row| row.get::<_, String>(0),
            )?;
            for row in rows {
                found.insert(row?);
            }
        }

        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_record_and_lookup() {
        let store = SqliteVersionStore::in_memory().unwrap();
        assert!(store
            .record_version(&AnalysisVersion::new("repo", "abc"))
            .unwrap());
        // Immutable: second write is ignored
        assert!(!store
            .record_version(&AnalysisVersion::new("repo", "abc"))
            .unwrap());

        assert!(store.has_version("repo", "abc").await.unwrap());
        assert!(!store.has_version("repo", "def").await.unwrap());
        assert!(!store.has_version("other", "abc").await.unwrap());
    }

    #[tokio::test]
    async fn test_batch_lookup_spans_chunks() {
        let store = SqliteVersionStore::in_memory().unwrap();
        let ids: Vec<String> = (0..1200).map(|i| format!("commit{:04}", i)).collect();
        for id in ids.iter().filter(|id| id.ends_with('7')) {
            store
                .record_version(&AnalysisVersion::new("repo", id.as_str()))
                .unwrap();
        }
        store
            .record_version(&AnalysisVersion::new("other", "commit0001"))
            .unwrap();

        let found = store.has_versions("repo", &ids).await.unwrap();
        assert_eq!(found.len(), 120);
        assert!(found.contains("commit1197"));
        assert!(!found.contains("commit0001"));
    }

    #[tokio::test]
    async fn test_batch_lookup_empty_and_duplicates() {
        let store = SqliteVersionStore::in_memory().unwrap();
        store
            .record_version(&AnalysisVersion::new("repo", "a"))
            .unwrap();

        assert!(store.has_versions("repo", &[]).await.unwrap().is_empty());
        let found = store
            .has_versions("repo", &["a".into(), "a".into(), "b".into()])
            .await
            .unwrap();
        assert_eq!(found, HashSet::from(["a".to_string()]));
    }

    #[test]
    fn test_list_versions_newest_first() {
        let store = SqliteVersionStore::in_memory().unwrap();
        let mut old = AnalysisVersion::new("repo", "old");
        old.created_at = chrono::DateTime::from_timestamp(1_000, 0).unwrap();
        let mut new = AnalysisVersion::new("repo", "new");
        new.created_at = chrono::DateTime::from_timestamp(2_000, 0).unwrap();
        store.record_version(&old).unwrap();
        store.record_version(&new).unwrap();

        let listed = store.list_versions("repo", None).unwrap();
        let ids: Vec<&str> = listed.iter().map(|v| v.commit_id.as_str()).collect();
        assert_eq!(ids, vec!["new", "old"]);
        assert_eq!(listed[1].created_at.timestamp(), 1_000);

        assert_eq!(store.list_versions("repo", Some(1)).unwrap().len(), 1);
    }

    #[test]
    fn test_file_backed_store_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("versions.db");
        {
            let store = SqliteVersionStore::new(&path).unwrap();
            store
                .record_version(&AnalysisVersion::new("repo", "abc"))
                .unwrap();
        }
        let reopened = SqliteVersionStore::new(&path).unwrap();
        assert_eq!(reopened.list_versions("repo", None).unwrap().len(), 1);
    }
}
