// Download data models
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DownloadStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

/// Progress fields extracted from the downloader's output.
/// Fields are sticky: a parse cycle that does not see a field keeps
/// the previous value instead of clearing it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DownloadProgress {
    pub percentage: f32, // 0.0-100.0
    pub speed: String,
    pub eta: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Download {
    pub id: String,
    pub url: String,
    pub title: Option<String>,
    pub status: DownloadStatus,
    pub progress: Option<DownloadProgress>,
    pub error: Option<String>,
    pub file_path: Option<String>,
    pub timestamp: String,
}

impl Download {
    pub fn new(id: String, url: String) -> Self {
        Self {
            id,
            url,
            title: None,
            status: DownloadStatus::Pending,
            progress: None,
            error: None,
            file_path: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self.status,
            DownloadStatus::Completed | DownloadStatus::Failed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_download_is_pending() {
        let d = Download::new("abc".to_string(), "https://example.com/v".to_string());
        assert_eq!(d.status, DownloadStatus::Pending);
        assert!(d.title.is_none());
        assert!(d.progress.is_none());
        assert!(d.error.is_none());
        assert!(d.file_path.is_none());
        assert!(!d.is_terminal());
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&DownloadStatus::Running).unwrap();
        assert_eq!(json, "\"running\"");
        let status: DownloadStatus = serde_json::from_str("\"failed\"").unwrap();
        assert_eq!(status, DownloadStatus::Failed);
    }
}
