use crate::error::{NewcomersError, Result};
use crate::model::{AnalysisInput, ContributionEvent, LabelAdoption, RepositoryInfo, SampleRepository};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use tracing::debug;

const CACHE_SCHEMA_VERSION: i64 = 2;

/// Raw data fetched per repository, so analyses can be redone offline.
pub struct Cache {
    conn: Connection,
}

impl Cache {
    pub fn new<CP: AsRef<Path>, OP: AsRef<Path>>(cache_path: Option<CP>, output_dir: OP) -> Result<Self> {
        let db_path = match cache_path {
            Some(path) => path.as_ref().to_path_buf(),
            None => output_dir.as_ref().join(".newcomers").join("cache.db"),
        };
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        debug!(path = %db_path.display(), "opening cache");
        Self::with_connection(Connection::open(&db_path)?)
    }

    pub fn in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        let mut cache = Self { conn };
        cache.initialize()?;
        Ok(cache)
    }

    fn initialize(&mut self) -> Result<()> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS repositories (
                full_name TEXT PRIMARY KEY,
                sample TEXT NOT NULL,
                info TEXT NOT NULL,
                labels TEXT NOT NULL,
                fetched_at TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS contributions (
                repository TEXT NOT NULL,
                position INTEGER NOT NULL,
                login TEXT NOT NULL,
                created_at TEXT NOT NULL,
                issue_number INTEGER,
                PRIMARY KEY (repository, login),
                FOREIGN KEY (repository) REFERENCES repositories(full_name)
            );
            CREATE TABLE IF NOT EXISTS label_adoptions (
                repository TEXT NOT NULL,
                name TEXT NOT NULL,
                created_at TEXT NOT NULL,
                PRIMARY KEY (repository, name),
                FOREIGN KEY (repository) REFERENCES repositories(full_name)
            );
            CREATE INDEX IF NOT EXISTS idx_contributions_repository ON contributions(repository, position);
            ",
        )?;
        self.check_schema_version()?;
        Ok(())
    }

    fn check_schema_version(&mut self) -> Result<()> {
        let user_version: i64 = self
            .conn
            .query_row("PRAGMA user_version;", [], |row| row.get(0))?;

        if user_version == 0 {
            let set_stmt = format!("PRAGMA user_version = {CACHE_SCHEMA_VERSION};");
            self.conn.execute_batch(&set_stmt)?;
        } else if user_version != CACHE_SCHEMA_VERSION {
            return Err(NewcomersError::Cache(format!(
                "Schema version mismatch: expected {}, found {}",
                CACHE_SCHEMA_VERSION, user_version
            )));
        }

        Ok(())
    }

    /// Replace whatever is cached for the input's repository.
    pub fn store_snapshot(&mut self, input: &AnalysisInput, fetched_at: DateTime<Utc>) -> Result<()> {
        let full_name = input.sample.full_name();
        let tx = self.conn.transaction()?;

        tx.execute("DELETE FROM contributions WHERE repository = ?", params![full_name])?;
        tx.execute("DELETE FROM label_adoptions WHERE repository = ?", params![full_name])?;
        tx.execute(
            "INSERT OR REPLACE INTO repositories (full_name, sample, info, labels, fetched_at)
             VALUES (?, ?, ?, ?, ?)",
            params![
                full_name,
                serde_json::to_string(&input.sample)?,
                serde_json::to_string(&input.info)?,
                serde_json::to_string(&input.labels)?,
                fetched_at
            ],
        )?;

        {
            let mut insert_contribution = tx.prepare(
                "INSERT INTO contributions (repository, position, login, created_at, issue_number)
                 VALUES (?, ?, ?, ?, ?)",
            )?;
            for (position, c) in input.contributions.iter().enumerate() {
                insert_contribution.execute(params![
                    full_name,
                    position as i64,
                    c.login,
                    c.created_at,
                    c.issue_number.map(|n| n as i64)
                ])?;
            }

            let mut insert_adoption = tx.prepare(
                "INSERT OR REPLACE INTO label_adoptions (repository, name, created_at) VALUES (?, ?, ?)",
            )?;
            for adoption in &input.newcomer_labels {
                insert_adoption.execute(params![full_name, adoption.name, adoption.created_at])?;
            }
        }

        tx.commit()?;
        debug!(repository = %full_name, contributions = input.contributions.len(), "snapshot cached");
        Ok(())
    }

    pub fn get_snapshot(&self, full_name: &str) -> Result<Option<AnalysisInput>> {
        let row = self
            .conn
            .query_row(
                "SELECT sample, info, labels FROM repositories WHERE full_name = ?",
                params![full_name],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?, row.get::<_, String>(2)?)),
            )
            .optional()?;
        let Some((sample, info, labels)) = row else {
            return Ok(None);
        };
        let sample: SampleRepository = serde_json::from_str(&sample)?;
        let info: RepositoryInfo = serde_json::from_str(&info)?;
        let labels: Vec<String> = serde_json::from_str(&labels)?;

        let mut stmt = self.conn.prepare(
            "SELECT login, created_at, issue_number FROM contributions
             WHERE repository = ? ORDER BY position",
        )?;
        let contributions = stmt
            .query_map(params![full_name], |row| {
                let issue_number: Option<i64> = row.get(2)?;
                Ok(ContributionEvent {
                    login: row.get(0)?,
                    created_at: row.get(1)?,
                    issue_number: issue_number.map(|n| n as u64),
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut stmt = self.conn.prepare(
            "SELECT name, created_at FROM label_adoptions WHERE repository = ? ORDER BY created_at, name",
        )?;
        let newcomer_labels = stmt
            .query_map(params![full_name], |row| {
                Ok(LabelAdoption {
                    name: row.get(0)?,
                    created_at: row.get(1)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(Some(AnalysisInput {
            sample,
            info,
            contributions,
            labels,
            newcomer_labels,
        }))
    }

    pub fn fetched_at(&self, full_name: &str) -> Result<Option<DateTime<Utc>>> {
        Ok(self
            .conn
            .query_row(
                "SELECT fetched_at FROM repositories WHERE full_name = ?",
                params![full_name],
                |row| row.get(0),
            )
            .optional()?)
    }
}
