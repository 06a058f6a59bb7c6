// Lifecycle events delivered to the shell.
//
// One variant per event kind with a typed payload; the shell receives
// these over the channel returned by `DownloadManager::new`. Events for a
// given id arrive in the order generated; there is no ordering guarantee
// across ids.
use serde::Serialize;

use crate::models::{Download, DownloadProgress};

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DownloadEvent {
    /// A new record was inserted in `pending` state.
    Created { download: Download },
    /// The external process was spawned and the record is now `running`.
    Started { id: String },
    Progress {
        id: String,
        progress: DownloadProgress,
    },
    /// The destination filename was detected on the output stream.
    Title { id: String, title: String },
    Completed { id: String, file_path: String },
    Failed { id: String, error: String },
    /// The record was cancelled and evicted; no further events follow.
    Cancelled { id: String },
}
