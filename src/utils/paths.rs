// Download directory resolution
use std::fs;
use std::path::PathBuf;

/// Resolve well-known folder names to actual paths
fn resolve_special_folder(name: &str) -> Option<PathBuf> {
    match name.to_lowercase().as_str() {
        "downloads" | "download" => dirs::download_dir(),
        "desktop" => dirs::desktop_dir(),
        "documents" | "document" => dirs::document_dir(),
        "videos" | "video" => dirs::video_dir(),
        "music" => dirs::audio_dir(),
        "pictures" | "picture" => dirs::picture_dir(),
        _ => None,
    }
}

fn default_download_dir() -> PathBuf {
    dirs::download_dir().unwrap_or_else(std::env::temp_dir)
}

/// Resolve the configured download path to a usable directory.
///
/// Empty input means the user's Downloads folder; well-known folder names
/// resolve through the platform directories; absolute paths are used as
/// given; relative paths are anchored under Downloads. The directory is
/// created best effort.
pub fn resolve_download_directory(configured: &str) -> PathBuf {
    let configured = configured.trim();

    if configured.is_empty() {
        return default_download_dir();
    }

    if let Some(special) = resolve_special_folder(configured) {
        if !special.exists() {
            let _ = fs::create_dir_all(&special);
        }
        return special;
    }

    let path = PathBuf::from(configured);
    if path.is_absolute() {
        if !path.exists() {
            let _ = fs::create_dir_all(&path);
        }
        return path;
    }

    let anchored = default_download_dir().join(configured);
    if !anchored.exists() {
        let _ = fs::create_dir_all(&anchored);
    }
    anchored
}
