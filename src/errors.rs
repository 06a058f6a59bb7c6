// Error taxonomy for a single download.
//
// Every error here is local to one download id; a failure never aborts
// other running or queued downloads, and nothing is returned to the
// submit caller (submission is asynchronous).
use thiserror::Error;

/// Upper bound on stored tool error messages, so noisy stderr output
/// cannot grow records without limit.
pub const MAX_ERROR_LEN: usize = 100;

#[derive(Debug, Error)]
pub enum DownloadError {
    /// The target requires a login session; user-actionable.
    #[error("Login required - enable browser cookies in settings")]
    AuthRequired,

    /// A failure message reported by the downloader on stderr.
    #[error("{0}")]
    Tool(String),

    /// The process ran but exited non-zero without a classified stderr error.
    #[error("Download failed with exit code {0}")]
    ExitCode(i32),

    /// The downloader binary could not be started at all.
    #[error("Failed to start downloader: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Truncate a message to `MAX_ERROR_LEN` characters, respecting char
/// boundaries.
pub fn truncate_message(message: &str) -> String {
    if message.chars().count() <= MAX_ERROR_LEN {
        message.to_string()
    } else {
        message.chars().take(MAX_ERROR_LEN).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_message_untouched() {
        assert_eq!(truncate_message("Video unavailable"), "Video unavailable");
    }

    #[test]
    fn test_long_message_truncated_to_bound() {
        let long = "x".repeat(250);
        let truncated = truncate_message(&long);
        assert_eq!(truncated.chars().count(), MAX_ERROR_LEN);
    }

    #[test]
    fn test_truncation_respects_char_boundaries() {
        let long: String = "é".repeat(150);
        let truncated = truncate_message(&long);
        assert_eq!(truncated.chars().count(), MAX_ERROR_LEN);
        assert!(truncated.chars().all(|c| c == 'é'));
    }

    #[test]
    fn test_exit_code_message() {
        let err = DownloadError::ExitCode(2);
        assert_eq!(err.to_string(), "Download failed with exit code 2");
    }
}
