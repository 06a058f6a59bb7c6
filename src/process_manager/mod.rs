// External downloader process management
pub mod ytdlp;

pub use ytdlp::YtDlpLauncher;
