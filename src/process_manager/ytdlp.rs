// yt-dlp process management
// Handles binary discovery, argument construction and spawning
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::{Child, Command};

use crate::models::{Format, Quality, Settings};
use crate::utils::resolve_download_directory;

#[cfg(windows)]
use std::os::windows::process::CommandExt;

#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x08000000;

/// Launches yt-dlp processes with piped output streams.
///
/// Binary resolution is best effort and happens once, at construction;
/// tests inject a fake binary through `with_binary`.
pub struct YtDlpLauncher {
    binary: PathBuf,
}

impl YtDlpLauncher {
    /// Locate the yt-dlp binary: well-known install paths first, then a
    /// PATH lookup, then the bare command name as a last resort.
    pub fn discover() -> Self {
        Self {
            binary: resolve_binary(),
        }
    }

    pub fn with_binary(binary: PathBuf) -> Self {
        Self { binary }
    }

    pub fn binary(&self) -> &PathBuf {
        &self.binary
    }

    /// Spawn yt-dlp with the given arguments. stdout and stderr are piped
    /// for the supervisor to read; a spawn error here means the binary is
    /// missing or not executable, which is distinct from a non-zero exit.
    pub fn spawn(&self, args: &[String]) -> std::io::Result<Child> {
        let mut cmd = Command::new(&self.binary);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        #[cfg(windows)]
        cmd.creation_flags(CREATE_NO_WINDOW);

        cmd.spawn()
    }
}

fn resolve_binary() -> PathBuf {
    #[cfg(target_os = "windows")]
    let known_paths = [
        "C:\\Program Files\\yt-dlp\\yt-dlp.exe",
        "C:\\ProgramData\\chocolatey\\bin\\yt-dlp.exe",
    ];

    #[cfg(not(target_os = "windows"))]
    let known_paths = [
        "/usr/local/bin/yt-dlp",
        "/usr/bin/yt-dlp",
        "/opt/homebrew/bin/yt-dlp",
    ];

    for path in known_paths {
        let candidate = PathBuf::from(path);
        if candidate.exists() {
            log::info!("Found yt-dlp at {:?}", candidate);
            return candidate;
        }
    }

    #[cfg(target_os = "windows")]
    let lookup = "where";
    #[cfg(not(target_os = "windows"))]
    let lookup = "which";

    if let Ok(output) = std::process::Command::new(lookup).arg("yt-dlp").output() {
        if output.status.success() {
            if let Some(first) = String::from_utf8_lossy(&output.stdout).lines().next() {
                let found = first.trim();
                if !found.is_empty() {
                    log::info!("Resolved yt-dlp via {}: {}", lookup, found);
                    return PathBuf::from(found);
                }
            }
        }
    }

    // Last resort: rely on the execution environment's search path.
    log::warn!("yt-dlp not found in known locations, falling back to PATH lookup");
    PathBuf::from("yt-dlp")
}

/// Build the yt-dlp argument vector for a download. Deterministic over
/// (url, settings); the URL always comes last.
pub fn build_args(url: &str, settings: &Settings) -> Vec<String> {
    let mut args: Vec<String> = Vec::new();

    // Output template
    let output_dir = resolve_download_directory(&settings.download_path);
    args.push("-o".to_string());
    args.push(
        output_dir
            .join("%(title)s.%(ext)s")
            .to_string_lossy()
            .to_string(),
    );

    // Session cookies for sites requiring login
    if settings.use_cookies {
        if let Some(browser) = settings.cookies_browser {
            args.push("--cookies-from-browser".to_string());
            args.push(browser.as_str().to_string());
        }
    }

    if settings.quality == Quality::Audio {
        args.push("-x".to_string());
        args.push("--audio-format".to_string());
        args.push("mp3".to_string());
    } else {
        match settings.quality {
            Quality::P1080 => {
                args.push("-f".to_string());
                args.push("bestvideo[height<=1080]+bestaudio/best[height<=1080]".to_string());
            }
            Quality::P720 => {
                args.push("-f".to_string());
                args.push("bestvideo[height<=720]+bestaudio/best[height<=720]".to_string());
            }
            _ => {}
        }

        // Merge to the preferred container when it differs from the default
        if settings.format != Format::Mp4 {
            args.push("--merge-output-format".to_string());
            args.push(settings.format.as_str().to_string());
        }
    }

    // Machine-parseable, line-buffered progress output
    args.push("--progress".to_string());
    args.push("--newline".to_string());

    args.push(url.to_string());

    args
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Browser;

    fn settings_with(quality: Quality, format: Format) -> Settings {
        Settings {
            download_path: std::env::temp_dir()
                .join("mediafetch-args-test")
                .to_string_lossy()
                .to_string(),
            quality,
            format,
            use_cookies: false,
            cookies_browser: None,
            notifications: false,
        }
    }

    #[test]
    fn test_url_is_last_argument() {
        let args = build_args(
            "https://example.com/v",
            &settings_with(Quality::Best, Format::Mp4),
        );
        assert_eq!(args.last().unwrap(), "https://example.com/v");
    }

    #[test]
    fn test_output_template_embeds_directory() {
        let args = build_args(
            "https://example.com/v",
            &settings_with(Quality::Best, Format::Mp4),
        );
        let o_pos = args.iter().position(|a| a == "-o").unwrap();
        assert!(args[o_pos + 1].contains("mediafetch-args-test"));
        assert!(args[o_pos + 1].ends_with("%(title)s.%(ext)s"));
    }

    #[test]
    fn test_best_quality_mp4_adds_no_format_selection() {
        let args = build_args(
            "https://example.com/v",
            &settings_with(Quality::Best, Format::Mp4),
        );
        assert!(!args.contains(&"-f".to_string()));
        assert!(!args.contains(&"--merge-output-format".to_string()));
    }

    #[test]
    fn test_1080p_bounds_resolution() {
        let args = build_args(
            "https://example.com/v",
            &settings_with(Quality::P1080, Format::Mp4),
        );
        let f_pos = args.iter().position(|a| a == "-f").unwrap();
        assert!(args[f_pos + 1].contains("height<=1080"));
    }

    #[test]
    fn test_webm_requests_merge_format() {
        let args = build_args(
            "https://example.com/v",
            &settings_with(Quality::P720, Format::Webm),
        );
        let m_pos = args
            .iter()
            .position(|a| a == "--merge-output-format")
            .unwrap();
        assert_eq!(args[m_pos + 1], "webm");
    }

    #[test]
    fn test_audio_quality_extracts_mp3() {
        let args = build_args(
            "https://example.com/v",
            &settings_with(Quality::Audio, Format::Mp3),
        );
        assert!(args.contains(&"-x".to_string()));
        let a_pos = args.iter().position(|a| a == "--audio-format").unwrap();
        assert_eq!(args[a_pos + 1], "mp3");
        // Audio extraction replaces the video format selection entirely
        assert!(!args.contains(&"-f".to_string()));
        assert!(!args.contains(&"--merge-output-format".to_string()));
    }

    #[test]
    fn test_cookies_flag_requires_browser() {
        let mut settings = settings_with(Quality::Best, Format::Mp4);
        settings.use_cookies = true;
        let args = build_args("https://example.com/v", &settings);
        assert!(!args.contains(&"--cookies-from-browser".to_string()));

        settings.cookies_browser = Some(Browser::Firefox);
        let args = build_args("https://example.com/v", &settings);
        let c_pos = args
            .iter()
            .position(|a| a == "--cookies-from-browser")
            .unwrap();
        assert_eq!(args[c_pos + 1], "firefox");
    }

    #[test]
    fn test_progress_flags_present() {
        let args = build_args(
            "https://example.com/v",
            &settings_with(Quality::Best, Format::Mp4),
        );
        assert!(args.contains(&"--progress".to_string()));
        assert!(args.contains(&"--newline".to_string()));
    }

    #[test]
    fn test_injected_binary_is_used() {
        let launcher = YtDlpLauncher::with_binary(PathBuf::from("/tmp/fake-yt-dlp"));
        assert_eq!(launcher.binary(), &PathBuf::from("/tmp/fake-yt-dlp"));
    }
}
