//! Trend store backed by a JSON file

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use super::{rank_by_count, TrendError, TrendStore};
use crate::models::TrendingEntry;

#[derive(Debug, Default, Serialize, Deserialize)]
struct TrendFile {
    #[serde(default)]
    next_id: u64,
    #[serde(default)]
    documents: Vec<TrendingEntry>,
}

/// Every operation reads (and if needed rewrites) the whole file under one lock.
pub struct LocalTrendStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl LocalTrendStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<TrendFile, TrendError> {
        if !self.path.exists() {
            return Ok(TrendFile::default());
        }
        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(TrendFile::default());
        }
        Ok(serde_json::from_str(&content)?)
    }

    fn write(&self, file: &TrendFile) -> Result<(), TrendError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(file)?;
        fs::write(&self.path, content)?;
        Ok(())
    }

    fn with_file<T>(&self, f: impl FnOnce(&mut TrendFile) -> Result<(T, bool), TrendError>) -> Result<T, TrendError> {
        let _guard = self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut file = self.read()?;
        let (value, dirty) = f(&mut file)?;
        if dirty {
            self.write(&file)?;
        }
        Ok(value)
    }
}

impl TrendStore for LocalTrendStore {
    fn find_by_term(&self, term: &str) -> Result<Option<TrendingEntry>, TrendError> {
        self.with_file(|file| {
            let found = file.documents.iter().find(|d| d.search_term == term).cloned();
            Ok((found, false))
        })
    }

    fn create(&self, entry: &TrendingEntry) -> Result<TrendingEntry, TrendError> {
        self.with_file(|file| {
            file.next_id += 1;
            let mut created = entry.clone();
            created.id = file.next_id.to_string();
            file.documents.push(created.clone());
            Ok((created, true))
        })
    }

    fn update(&self, entry: &TrendingEntry) -> Result<TrendingEntry, TrendError> {
        self.with_file(|file| {
            let existing = file
                .documents
                .iter_mut()
                .find(|d| d.id == entry.id)
                .ok_or_else(|| TrendError::NotFound { id: entry.id.clone() })?;
            *existing = entry.clone();
            Ok((entry.clone(), true))
        })
    }

    fn top_by_count(&self, limit: usize) -> Result<Vec<TrendingEntry>, TrendError> {
        self.with_file(|file| {
            let mut documents = file.documents.clone();
            rank_by_count(&mut documents, limit);
            Ok((documents, false))
        })
    }
}
