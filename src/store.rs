use crate::error::Result;
use crate::model::{RepositoryRecord, SampleRepository};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Per-language directory of repository records:
/// `<root>/<language>/<owner>-<name>.json`.
pub struct Store {
    root: PathBuf,
}

impl Store {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn record_path(&self, language: &str, owner: &str, name: &str) -> PathBuf {
        let stem = format!("{owner}-{name}").replace('/', "");
        self.root.join(language).join(format!("{stem}.json"))
    }

    pub fn contains(&self, language: &str, owner: &str, name: &str) -> bool {
        self.record_path(language, owner, name).is_file()
    }

    pub fn save(&self, language: &str, record: &RepositoryRecord) -> Result<PathBuf> {
        let path = self.record_path(language, &record.owner, &record.name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut writer = BufWriter::new(File::create(&path)?);
        serde_json::to_writer(&mut writer, record)?;
        writer.flush()?;
        debug!(path = %path.display(), "record saved");
        Ok(path)
    }

    pub fn load(path: &Path) -> Result<RepositoryRecord> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }

    /// Every record stored for `language`, ordered by file name. Files that do
    /// not parse are skipped with a warning.
    pub fn load_language(&self, language: &str) -> Result<Vec<(PathBuf, RepositoryRecord)>> {
        let dir = self.root.join(language);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut paths: Vec<PathBuf> = fs::read_dir(&dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("json"))
            .collect();
        paths.sort();

        let mut records = Vec::with_capacity(paths.len());
        for path in paths {
            match Self::load(&path) {
                Ok(record) => records.push((path, record)),
                Err(e) => warn!(path = %path.display(), error = %e, "unreadable record skipped"),
            }
        }
        Ok(records)
    }
}

/// Read a language sample file (JSON array of repositories).
pub fn load_samples(path: &Path) -> Result<Vec<SampleRepository>> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}
