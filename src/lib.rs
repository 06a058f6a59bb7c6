//! Download orchestrator core for a desktop media downloader.
//!
//! Accepts URLs, bounds how many downloads run at once, supervises one
//! yt-dlp process per download, parses its text output into structured
//! progress events and feeds a FIFO backlog as capacity frees up. The
//! surrounding shell (tray, settings UI, notifications) consumes the
//! typed event stream and supplies the settings snapshot.

pub mod downloader;
pub mod errors;
pub mod events;
pub mod models;
pub mod notify;
pub mod parser;
pub mod process_manager;
pub mod utils;

pub use downloader::{DownloadManager, MAX_CONCURRENT};
pub use errors::DownloadError;
pub use events::DownloadEvent;
pub use models::{
    Browser, Download, DownloadProgress, DownloadStatus, Format, Quality, Settings,
};
pub use notify::{Notifier, NullNotifier};
pub use process_manager::YtDlpLauncher;
