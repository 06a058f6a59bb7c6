// Download orchestration
//
// One supervised OS process per active download, a bounded admission
// queue in front, and a single lock over all bookkeeping. Submit and
// cancel return immediately; process lifecycle is reported through the
// event channel.
pub mod queue;
pub mod store;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader, Lines};
use tokio::process::Child;
use tokio::sync::{mpsc, oneshot};
use tokio::time;

use crate::errors::DownloadError;
use crate::events::DownloadEvent;
use crate::models::{Download, DownloadStatus, Settings};
use crate::notify::{Notifier, NullNotifier};
use crate::parser;
use crate::process_manager::{ytdlp, YtDlpLauncher};
use crate::utils::resolve_download_directory;

use queue::{Admission, AdmissionQueue};
use store::DownloadStore;

pub use queue::MAX_CONCURRENT;

/// How long the supervisor keeps reading already-buffered output after
/// the process has exited.
const DRAIN_WINDOW: Duration = Duration::from_millis(200);

/// All mutable bookkeeping lives behind one lock: the record store, the
/// admission queue and the kill handles of running processes. Concurrently
/// exiting process supervisors all funnel through it, which is what keeps
/// the admission invariants enforceable.
struct ManagerState {
    store: DownloadStore,
    queue: AdmissionQueue,
    handles: HashMap<String, oneshot::Sender<()>>,
}

/// Public entry point of the download core. Cheap to clone; all clones
/// share the same state.
#[derive(Clone)]
pub struct DownloadManager {
    state: Arc<Mutex<ManagerState>>,
    settings: Arc<Mutex<Settings>>,
    launcher: Arc<YtDlpLauncher>,
    notifier: Arc<dyn Notifier>,
    events: mpsc::UnboundedSender<DownloadEvent>,
}

impl DownloadManager {
    pub fn new(settings: Settings) -> (Self, mpsc::UnboundedReceiver<DownloadEvent>) {
        Self::with_parts(settings, YtDlpLauncher::discover(), Arc::new(NullNotifier))
    }

    pub fn with_parts(
        settings: Settings,
        launcher: YtDlpLauncher,
        notifier: Arc<dyn Notifier>,
    ) -> (Self, mpsc::UnboundedReceiver<DownloadEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let manager = Self {
            state: Arc::new(Mutex::new(ManagerState {
                store: DownloadStore::new(),
                queue: AdmissionQueue::new(),
                handles: HashMap::new(),
            })),
            settings: Arc::new(Mutex::new(settings)),
            launcher: Arc::new(launcher),
            notifier,
            events: tx,
        };
        (manager, rx)
    }

    /// Accept a URL for download. Returns the fresh id immediately; the
    /// download starts now if a slot is free, otherwise it joins the FIFO
    /// backlog.
    pub fn submit(&self, url: impl Into<String>) -> String {
        let url = url.into();
        let id = uuid::Uuid::new_v4().to_string();
        let download = Download::new(id.clone(), url);

        let admission = {
            let mut st = self.state.lock();
            st.store.insert(download.clone());
            st.queue.submit(&id)
        };
        log::info!("Submitted download {} ({:?})", id, admission);
        self.emit(DownloadEvent::Created { download });

        if admission == Admission::Start {
            self.launch(id.clone());
        }
        id
    }

    /// Cancel a download. Idempotent: an id with no running process and
    /// no queue entry is a no-op, and a record that already settled is
    /// left untouched. Otherwise the record is evicted entirely; a
    /// running process is signalled and its slot is freed once its exit
    /// notification arrives.
    pub fn cancel(&self, id: &str) {
        let mut cancelled = false;
        let mut promoted = Vec::new();
        {
            let mut st = self.state.lock();
            if let Some(kill) = st.handles.remove(id) {
                let _ = kill.send(());
                st.store.remove(id);
                cancelled = true;
            } else if st.store.get(id).map_or(false, |record| record.is_terminal()) {
                // already settled; the record stays in the table as history
            } else if st.queue.remove_waiting(id) {
                st.store.remove(id);
                cancelled = true;
            } else if st.queue.is_running(id) && st.store.contains(id) {
                // admitted, but the launch has not registered a handle yet
                st.store.remove(id);
                promoted = st.queue.finish(id);
                cancelled = true;
            }
        }
        if cancelled {
            log::info!("Cancelled download {}", id);
            self.emit(DownloadEvent::Cancelled { id: id.to_string() });
        }
        for next in promoted {
            self.launch(next);
        }
    }

    /// Swap the settings snapshot. Takes effect for downloads started
    /// afterwards; running processes keep the arguments they were
    /// launched with.
    pub fn update_settings(&self, settings: Settings) {
        *self.settings.lock() = settings;
        log::info!("Settings updated");
    }

    pub fn current_settings(&self) -> Settings {
        self.settings.lock().clone()
    }

    pub fn get(&self, id: &str) -> Option<Download> {
        self.state.lock().store.get(id).cloned()
    }

    /// All tracked records, ordered by creation time.
    pub fn snapshot(&self) -> Vec<Download> {
        self.state.lock().store.snapshot()
    }

    pub fn running_count(&self) -> usize {
        self.state.lock().queue.running_count()
    }

    pub fn waiting_count(&self) -> usize {
        self.state.lock().queue.waiting_count()
    }

    fn emit(&self, event: DownloadEvent) {
        let _ = self.events.send(event);
    }

    /// Spawn the external process for an admitted id and hand it to a
    /// supervisor task. Spawn failure is terminal for this id only and
    /// frees its slot.
    fn launch(&self, id: String) {
        let settings = self.current_settings();
        let mut spawned: Option<(Child, oneshot::Receiver<()>)> = None;
        let mut spawn_error: Option<String> = None;
        let mut promoted = Vec::new();
        {
            let mut st = self.state.lock();
            match st.store.get(&id).map(|record| record.url.clone()) {
                None => {
                    // cancelled between admission and launch
                    promoted = st.queue.finish(&id);
                }
                Some(url) => {
                    let args = ytdlp::build_args(&url, &settings);
                    match self.launcher.spawn(&args) {
                        Ok(child) => {
                            let (kill_tx, kill_rx) = oneshot::channel();
                            st.handles.insert(id.clone(), kill_tx);
                            st.store.set_running(&id);
                            spawned = Some((child, kill_rx));
                        }
                        Err(err) => {
                            let message = DownloadError::Spawn(err).to_string();
                            st.store.fail(&id, message.clone());
                            promoted = st.queue.finish(&id);
                            spawn_error = Some(message);
                        }
                    }
                }
            }
        }

        if let Some((child, kill_rx)) = spawned {
            log::info!("Started download {}", id);
            self.emit(DownloadEvent::Started { id: id.clone() });
            self.spawn_supervisor(id, child, kill_rx);
        } else if let Some(error) = spawn_error {
            log::error!("Could not start download {}: {}", id, error);
            self.emit(DownloadEvent::Failed {
                id: id.clone(),
                error: error.clone(),
            });
            if settings.notifications {
                self.notifier.notify("Download failed", &error);
            }
        }

        for next in promoted {
            self.launch(next);
        }
    }

    fn spawn_supervisor(&self, id: String, mut child: Child, kill_rx: oneshot::Receiver<()>) {
        let manager = self.clone();
        tokio::spawn(async move {
            let mut out_lines = child.stdout.take().map(|s| BufReader::new(s).lines());
            let mut err_lines = child.stderr.take().map(|s| BufReader::new(s).lines());
            let mut out_done = out_lines.is_none();
            let mut err_done = err_lines.is_none();
            let mut kill_rx = kill_rx;
            let mut killed = false;

            // Exit of the direct child settles the slot. Never gate on
            // the pipes reaching EOF: a helper process it spawned can
            // inherit the write ends and hold them open long after the
            // child itself is gone.
            let code = loop {
                tokio::select! {
                    status = child.wait() => {
                        break match status {
                            Ok(status) => status.code(),
                            Err(err) => {
                                log::warn!("Could not collect exit status for {}: {}", id, err);
                                None
                            }
                        };
                    }
                    line = next_line(&mut out_lines), if !out_done => match line {
                        Some(line) => manager.handle_stdout_line(&id, &line),
                        None => out_done = true,
                    },
                    line = next_line(&mut err_lines), if !err_done => match line {
                        Some(line) => manager.handle_stderr_line(&id, &line),
                        None => err_done = true,
                    },
                    _ = &mut kill_rx, if !killed => {
                        killed = true;
                        // Signals the direct child only; helpers it spawned
                        // are left to wind down on their own.
                        let _ = child.start_kill();
                    }
                }
            };

            // Pick up output that was already buffered when the process
            // exited, so a classified stderr error still lands before the
            // exit code is interpreted.
            while !err_done {
                match time::timeout(DRAIN_WINDOW, next_line(&mut err_lines)).await {
                    Ok(Some(line)) => manager.handle_stderr_line(&id, &line),
                    _ => err_done = true,
                }
            }
            while !out_done {
                match time::timeout(DRAIN_WINDOW, next_line(&mut out_lines)).await {
                    Ok(Some(line)) => manager.handle_stdout_line(&id, &line),
                    _ => out_done = true,
                }
            }
            manager.handle_exit(&id, code);
        });
    }

    fn handle_stdout_line(&self, id: &str, line: &str) {
        let mut events = Vec::new();
        {
            let mut st = self.state.lock();
            if !st.store.contains(id) {
                return;
            }
            if let Some(title) = parser::parse_destination(line) {
                st.store.set_title(id, title.clone());
                events.push(DownloadEvent::Title {
                    id: id.to_string(),
                    title,
                });
            }
            let previous = st.store.get(id).and_then(|r| r.progress.clone());
            if let Some(progress) = parser::parse_progress(line, previous.as_ref()) {
                st.store.set_progress(id, progress.clone());
                events.push(DownloadEvent::Progress {
                    id: id.to_string(),
                    progress,
                });
            }
        }
        for event in events {
            self.emit(event);
        }
    }

    fn handle_stderr_line(&self, id: &str, line: &str) {
        log::debug!("yt-dlp stderr ({}): {}", id, line);
        if let Some(error) = parser::classify_error(line) {
            let message = error.to_string();
            // fail() refuses once the record is already failed, so the
            // first classified error stays authoritative
            let newly_failed = self.state.lock().store.fail(id, message.clone());
            if newly_failed {
                log::warn!("Download {} failed: {}", id, message);
                self.emit(DownloadEvent::Failed {
                    id: id.to_string(),
                    error: message,
                });
            }
        }
    }

    /// Process exit: settle the record, notify the collaborator, free the
    /// slot and promote the backlog. The handle leaves the table before
    /// promotion so a stale handle can never be reused.
    fn handle_exit(&self, id: &str, code: Option<i32>) {
        let settings = self.current_settings();
        let mut event = None;
        let mut notification: Option<(&'static str, String)> = None;
        let promoted;
        {
            let mut st = self.state.lock();
            st.handles.remove(id);

            if let Some(record) = st.store.get(id) {
                if record.status == DownloadStatus::Failed {
                    // stderr classification already settled this record
                    if settings.notifications {
                        let body = record
                            .error
                            .clone()
                            .unwrap_or_else(|| "Could not download the file".to_string());
                        notification = Some(("Download failed", body));
                    }
                } else if code == Some(0) {
                    let title = record.title.clone();
                    let file_path = resolve_download_directory(&settings.download_path)
                        .join(title.as_deref().unwrap_or("download"))
                        .to_string_lossy()
                        .to_string();
                    st.store.complete(id, file_path.clone());
                    event = Some(DownloadEvent::Completed {
                        id: id.to_string(),
                        file_path,
                    });
                    if settings.notifications {
                        let body = title.unwrap_or_else(|| "Download finished".to_string());
                        notification = Some(("Download complete", body));
                    }
                } else {
                    let message = DownloadError::ExitCode(code.unwrap_or(-1)).to_string();
                    st.store.fail(id, message.clone());
                    event = Some(DownloadEvent::Failed {
                        id: id.to_string(),
                        error: message.clone(),
                    });
                    if settings.notifications {
                        notification = Some(("Download failed", message));
                    }
                }
            }

            promoted = st.queue.finish(id);
        }

        log::info!("Download {} exited with code {:?}", id, code);
        if let Some(event) = event {
            self.emit(event);
        }
        if let Some((summary, body)) = notification {
            self.notifier.notify(summary, &body);
        }
        for next in promoted {
            self.launch(next);
        }
    }
}

async fn next_line<R>(lines: &mut Option<Lines<BufReader<R>>>) -> Option<String>
where
    R: AsyncRead + Unpin,
{
    match lines.as_mut() {
        Some(lines) => lines.next_line().await.unwrap_or(None),
        None => None,
    }
}
