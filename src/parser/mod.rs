// yt-dlp output parsing
//
// Pure functions over complete output lines. Callers read the process
// streams line-buffered (see the supervisor in `downloader`), so a logical
// line is never split across parse calls and the patterns below always see
// whole matches.
use lazy_static::lazy_static;
use regex::Regex;
use std::path::Path;

use crate::errors::{truncate_message, DownloadError};
use crate::models::DownloadProgress;

lazy_static! {
    static ref PERCENT_RE: Regex = Regex::new(r"(\d+\.?\d*)%").unwrap();
    static ref SPEED_RE: Regex = Regex::new(r"(\d+\.?\d*\s?[KMG]iB/s)").unwrap();
    static ref ETA_RE: Regex = Regex::new(r"ETA\s+(\d+:\d+:\d+|\d+:\d+)").unwrap();
    static ref DESTINATION_RE: Regex = Regex::new(r"Destination:\s*(.+)").unwrap();
    static ref ERROR_RE: Regex = Regex::new(r"ERROR:\s*(.+)").unwrap();
}

const DESTINATION_MARKER: &str = "[download] Destination:";

/// Extract progress fields from a stdout line. Returns `None` when the
/// line carries no progress information at all; otherwise unmatched fields
/// inherit their values from `previous`.
pub fn parse_progress(
    line: &str,
    previous: Option<&DownloadProgress>,
) -> Option<DownloadProgress> {
    let percent = PERCENT_RE
        .captures(line)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<f32>().ok());
    let speed = SPEED_RE
        .captures(line)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string());
    let eta = ETA_RE
        .captures(line)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string());

    if percent.is_none() && speed.is_none() && eta.is_none() {
        return None;
    }

    Some(DownloadProgress {
        percentage: percent
            .unwrap_or_else(|| previous.map(|p| p.percentage).unwrap_or(0.0)),
        speed: speed
            .unwrap_or_else(|| previous.map(|p| p.speed.clone()).unwrap_or_default()),
        eta: eta.unwrap_or_else(|| previous.map(|p| p.eta.clone()).unwrap_or_default()),
    })
}

/// Extract the destination filename from a stdout line, stripped of its
/// directory component.
pub fn parse_destination(line: &str) -> Option<String> {
    if !line.contains(DESTINATION_MARKER) {
        return None;
    }
    let raw = DESTINATION_RE.captures(line)?.get(1)?.as_str().trim();
    Path::new(raw)
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
}

/// Classify a stderr line. Auth-required markers take precedence over the
/// generic ERROR: marker; anything else is diagnostic noise and yields
/// `None`.
pub fn classify_error(line: &str) -> Option<DownloadError> {
    if line.contains("requiring login") || line.contains("cookies") {
        return Some(DownloadError::AuthRequired);
    }
    if let Some(captures) = ERROR_RE.captures(line) {
        let message = captures.get(1)?.as_str().trim();
        return Some(DownloadError::Tool(truncate_message(message)));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::MAX_ERROR_LEN;

    #[test]
    fn test_parse_full_progress_line() {
        let p = parse_progress("  45.3% of 10MiB at  1.20MiB/s ETA 00:12", None).unwrap();
        assert_eq!(p.percentage, 45.3);
        assert_eq!(p.speed, "1.20MiB/s");
        assert_eq!(p.eta, "00:12");
    }

    #[test]
    fn test_progress_fields_are_sticky() {
        let first = parse_progress("  45.3% of 10MiB at  1.20MiB/s ETA 00:12", None).unwrap();
        let second = parse_progress("67.0%", Some(&first)).unwrap();
        assert_eq!(second.percentage, 67.0);
        assert_eq!(second.speed, "1.20MiB/s");
        assert_eq!(second.eta, "00:12");
    }

    #[test]
    fn test_progress_without_prior_state_defaults() {
        let p = parse_progress("12.5%", None).unwrap();
        assert_eq!(p.percentage, 12.5);
        assert_eq!(p.speed, "");
        assert_eq!(p.eta, "");
    }

    #[test]
    fn test_hours_eta_form() {
        let p = parse_progress("3.0% at 900.00KiB/s ETA 1:02:33", None).unwrap();
        assert_eq!(p.eta, "1:02:33");
        assert_eq!(p.speed, "900.00KiB/s");
    }

    #[test]
    fn test_no_progress_on_unrelated_line() {
        assert!(parse_progress("[youtube] abc: Downloading webpage", None).is_none());
    }

    #[test]
    fn test_destination_strips_directory() {
        let title =
            parse_destination("[download] Destination: /home/u/Downloads/My Video.mp4").unwrap();
        assert_eq!(title, "My Video.mp4");
    }

    #[test]
    fn test_destination_without_marker_ignored() {
        assert!(parse_destination("Destination: /home/u/clip.mp4").is_none());
        assert!(parse_destination("[download]  12.0% of 3MiB").is_none());
    }

    #[test]
    fn test_classify_tool_error() {
        let err = classify_error("ERROR: Video unavailable").unwrap();
        assert_eq!(err.to_string(), "Video unavailable");
    }

    #[test]
    fn test_classify_auth_error_over_generic() {
        // A cookies hint wins even when an ERROR: marker is also present.
        let err = classify_error(
            "ERROR: This video is only available for users; try passing cookies",
        )
        .unwrap();
        assert!(matches!(err, DownloadError::AuthRequired));
    }

    #[test]
    fn test_classify_requiring_login() {
        let err = classify_error("WARNING: content requiring login detected").unwrap();
        assert!(matches!(err, DownloadError::AuthRequired));
    }

    #[test]
    fn test_noise_is_not_an_error() {
        assert!(classify_error("[debug] Loading archive").is_none());
        assert!(classify_error("WARNING: unable to extract thumbnail").is_none());
    }

    #[test]
    fn test_tool_error_is_truncated() {
        let line = format!("ERROR: {}", "a".repeat(300));
        let err = classify_error(&line).unwrap();
        assert_eq!(err.to_string().chars().count(), MAX_ERROR_LEN);
    }
}
