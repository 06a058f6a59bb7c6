// Download record store
//
// The in-memory id -> record table, the single source of truth for
// download state. Mutated only under the manager's lock; the shell reads
// it through snapshots and events.
use std::collections::HashMap;

use crate::models::{Download, DownloadProgress, DownloadStatus};

#[derive(Default)]
pub struct DownloadStore {
    records: HashMap<String, Download>,
}

impl DownloadStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, download: Download) {
        self.records.insert(download.id.clone(), download);
    }

    pub fn get(&self, id: &str) -> Option<&Download> {
        self.records.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.records.contains_key(id)
    }

    pub fn remove(&mut self, id: &str) -> Option<Download> {
        self.records.remove(id)
    }

    pub fn snapshot(&self) -> Vec<Download> {
        let mut all: Vec<Download> = self.records.values().cloned().collect();
        all.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        all
    }

    pub fn set_running(&mut self, id: &str) {
        if let Some(record) = self.records.get_mut(id) {
            record.status = DownloadStatus::Running;
        }
    }

    pub fn set_title(&mut self, id: &str, title: String) {
        if let Some(record) = self.records.get_mut(id) {
            record.title = Some(title);
        }
    }

    pub fn set_progress(&mut self, id: &str, progress: DownloadProgress) {
        if let Some(record) = self.records.get_mut(id) {
            record.progress = Some(progress);
        }
    }

    /// Mark a record failed. Returns false when the record is missing or
    /// already failed: the first classified error wins and the transition
    /// to `failed` is a one-way gate.
    pub fn fail(&mut self, id: &str, error: String) -> bool {
        match self.records.get_mut(id) {
            Some(record) if record.status != DownloadStatus::Failed => {
                record.status = DownloadStatus::Failed;
                record.error = Some(error);
                true
            }
            _ => false,
        }
    }

    /// Mark a record completed. Returns false when the record is missing
    /// or already failed; a classified failure is not overwritten by a
    /// later clean exit.
    pub fn complete(&mut self, id: &str, file_path: String) -> bool {
        match self.records.get_mut(id) {
            Some(record) if record.status != DownloadStatus::Failed => {
                record.status = DownloadStatus::Completed;
                record.file_path = Some(file_path);
                true
            }
            _ => false,
        }
    }
}
