//! JSON-file result log: the dedup source for the next run.

use std::{
    fs,
    path::{Path, PathBuf},
};

use tracing::info;

use crate::{dedup::DedupIndex, domain::ResultRecord, ports::ResultStore, Result};

/// Stores every delivered record in a single JSON array file.
#[derive(Clone, Debug)]
pub struct JsonResultStore {
    path: PathBuf,
}

impl JsonResultStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn read_records(&self) -> Result<Vec<ResultRecord>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&raw)?)
    }
}

impl ResultStore for JsonResultStore {
    fn load(&self) -> Result<DedupIndex> {
        Ok(self
            .read_records()?
            .into_iter()
            .map(|r| r.original_text)
            .collect())
    }

    fn append(&self, records: &[ResultRecord]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let mut all = self.read_records()?;
        all.extend_from_slice(records);

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        // Write-then-rename so a crash never leaves a truncated log.
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(&all)?)?;
        fs::rename(&tmp, &self.path)?;

        info!(
            appended = records.len(),
            total = all.len(),
            path = %self.path.display(),
            "saved results"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Error;

    fn tmp_file(prefix: &str) -> PathBuf {
        let ts = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        PathBuf::from(format!("/tmp/{prefix}-{}-{ts}.json", std::process::id()))
    }

    fn record(text: &str, id: i64) -> ResultRecord {
        ResultRecord {
            channel_label: "https://t.me/alpha".to_string(),
            channel_category: Some("Alpha".to_string()),
            original_text: text.to_string(),
            translated_text: format!("{text} (translated)"),
            date: "2026-10-16T08:00:00+00:00".to_string(),
            message_id: id,
            recorded_at: None,
        }
    }

    #[test]
    fn missing_file_loads_empty_index() {
        let store = JsonResultStore::new(tmp_file("relay-store-missing"));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn appended_records_are_visible_to_the_next_load() {
        let path = tmp_file("relay-store-append");
        let store = JsonResultStore::new(&path);

        store.append(&[record("first", 1)]).unwrap();
        store
            .append(&[record("second", 2), record("third", 3)])
            .unwrap();

        let index = store.load().unwrap();
        assert_eq!(index.len(), 3);
        assert!(index.contains("first"));
        assert!(index.contains("third"));
        assert_eq!(store.read_records().unwrap()[1], record("second", 2));
        assert!(!path.with_extension("json.tmp").exists());

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let path = tmp_file("relay-store-corrupt");
        fs::write(&path, "{not json").unwrap();
        let err = JsonResultStore::new(&path).load().unwrap_err();
        assert!(matches!(err, Error::Json(_)));
        let _ = fs::remove_file(&path);
    }
}
