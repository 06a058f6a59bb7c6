// Settings data models
//
// The settings snapshot is owned and persisted by the shell; the core only
// reads it when building downloader arguments. Swapping the snapshot affects
// downloads started afterwards.
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Quality {
    #[serde(rename = "best")]
    Best,
    #[serde(rename = "1080p")]
    P1080,
    #[serde(rename = "720p")]
    P720,
    #[serde(rename = "audio")]
    Audio,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Mp4,
    Webm,
    Mp3,
}

impl Format {
    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Mp4 => "mp4",
            Format::Webm => "webm",
            Format::Mp3 => "mp3",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Browser {
    Chrome,
    Firefox,
    Safari,
    Edge,
}

impl Browser {
    pub fn as_str(&self) -> &'static str {
        match self {
            Browser::Chrome => "chrome",
            Browser::Firefox => "firefox",
            Browser::Safari => "safari",
            Browser::Edge => "edge",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Destination directory. Empty means the user's Downloads folder.
    pub download_path: String,
    pub quality: Quality,
    pub format: Format,
    pub use_cookies: bool,
    pub cookies_browser: Option<Browser>,
    pub notifications: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            download_path: String::new(),
            quality: Quality::Best,
            format: Format::Mp4,
            use_cookies: false,
            cookies_browser: Some(Browser::Chrome),
            notifications: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let s = Settings::default();
        assert_eq!(s.quality, Quality::Best);
        assert_eq!(s.format, Format::Mp4);
        assert!(!s.use_cookies);
        assert!(s.notifications);
    }

    #[test]
    fn test_quality_wire_names() {
        assert_eq!(serde_json::to_string(&Quality::P1080).unwrap(), "\"1080p\"");
        assert_eq!(serde_json::to_string(&Quality::Audio).unwrap(), "\"audio\"");
        let q: Quality = serde_json::from_str("\"720p\"").unwrap();
        assert_eq!(q, Quality::P720);
    }

    #[test]
    fn test_browser_round_trip() {
        let b: Browser = serde_json::from_str("\"firefox\"").unwrap();
        assert_eq!(b, Browser::Firefox);
        assert_eq!(b.as_str(), "firefox");
    }
}
