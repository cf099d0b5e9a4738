use std::{collections::VecDeque, fmt, sync::Arc, time::Duration};

use parking_lot::Mutex;
use tokio::{runtime::Handle, sync::Notify, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::{
    DIAG_TARGET, DevLogConfig, DevLogError,
    entry::{LogEntry, LogLevel},
    file::LogFile,
};

/// Tag of the marker entry written by [`DevLog::clear`].
pub const CLEAR_TAG: &str = "DevLog";

/// Message of the marker entry written by [`DevLog::clear`].
pub const CLEAR_MESSAGE: &str = "logs cleared";

struct Inner {
    file: LogFile,
    origin: String,
    max_logs: usize,
    debounce: Duration,
    /// Entries appended by this process and not yet written.
    queue: Mutex<VecDeque<LogEntry>>,
    /// Read cache; `None` until the first read warms it.
    cache: Mutex<Option<VecDeque<LogEntry>>>,
    /// Serializes flush, trim, clear and cold reads.
    gate: Mutex<()>,
    wake: Notify,
    cancel: CancellationToken,
}

impl Inner {
    /// Write the queued batch. Runs on a blocking thread.
    ///
    /// Lock order: `gate`, then `queue`, then `cache`.
    fn flush_now(&self) -> usize {
        let _gate = self.gate.lock();
        let batch: Vec<LogEntry> = self.queue.lock().drain(..).collect();
        if batch.is_empty() {
            return 0;
        }

        let on_disk = match self.file.append(&batch) {
            Ok(lines) => lines,
            Err(e) => {
                warn!(
                    target: DIAG_TARGET,
                    error = %e,
                    entries = batch.len(),
                    "dev log flush failed; batch kept for the next flush"
                );
                let mut queue = self.queue.lock();
                for entry in batch.into_iter().rev() {
                    queue.push_front(entry);
                }
                while queue.len() > self.max_logs {
                    queue.pop_front();
                }
                return 0;
            }
        };

        // Line count covers every producer's writes.
        if on_disk > self.max_logs {
            self.trim_locked();
        }

        trace!(target: DIAG_TARGET, entries = batch.len(), "dev log flushed");
        batch.len()
    }

    /// Trim the file; the caller holds `gate`.
    fn trim_locked(&self) {
        if let Err(e) = self.file.trim(self.max_logs) {
            warn!(target: DIAG_TARGET, error = %e, "dev log trim failed");
        }
    }
}

/// Cancels the flusher once the last [`DevLog`] clone is dropped.
struct FlusherGuard {
    cancel: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for FlusherGuard {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Cloneable handle to the shared dev log of this process.
///
/// ```no_run
/// use hl_devlog::{DevLog, DevLogConfig};
///
/// # async fn demo() -> Result<(), hl_devlog::DevLogError> {
/// let log = DevLog::open(DevLogConfig::at("state/dev.log"))?;
/// log.info("WebViewPool", "slot_allocated_free: slotIndex=0");
/// log.flush().await;
/// assert!(!log.read().is_empty());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct DevLog {
    inner: Arc<Inner>,
    guard: Arc<FlusherGuard>,
}

impl DevLog {
    /// Open the log described by `cfg` and start its flusher on the current tokio runtime.
    pub fn open(cfg: DevLogConfig) -> Result<Self, DevLogError> {
        cfg.validate()?;
        let runtime = Handle::try_current().map_err(|_| DevLogError::NoRuntime)?;

        let origin = cfg.origin.clone().unwrap_or_else(detect_origin);
        let cancel = CancellationToken::new();
        let inner = Arc::new(Inner {
            file: LogFile::new(&cfg.path)?,
            origin,
            max_logs: cfg.max_logs,
            debounce: cfg.flush_debounce(),
            queue: Mutex::new(VecDeque::new()),
            cache: Mutex::new(None),
            gate: Mutex::new(()),
            wake: Notify::new(),
            cancel: cancel.clone(),
        });

        let task = runtime.spawn(run_flusher(Arc::clone(&inner)));
        debug!(
            target: DIAG_TARGET,
            path = %cfg.path.display(),
            origin = %inner.origin,
            max_logs = cfg.max_logs,
            "dev log opened"
        );

        Ok(Self {
            inner,
            guard: Arc::new(FlusherGuard {
                cancel,
                task: Mutex::new(Some(task)),
            }),
        })
    }

    /// Producer identifier stamped on this process' entries.
    pub fn origin(&self) -> &str {
        &self.inner.origin
    }

    /// Capacity of the log.
    pub fn max_logs(&self) -> usize {
        self.inner.max_logs
    }

    /// Queue an entry. Never blocks on storage and never fails.
    pub fn append(&self, level: LogLevel, tag: &str, message: &str) {
        let entry = LogEntry::now(level, tag, message, &self.inner.origin);
        {
            let mut queue = self.inner.queue.lock();
            if let Some(cache) = self.inner.cache.lock().as_mut() {
                cache.push_back(entry.clone());
                while cache.len() > self.inner.max_logs {
                    cache.pop_front();
                }
            }
            queue.push_back(entry);
        }
        self.inner.wake.notify_one();
    }

    pub fn debug(&self, tag: &str, message: &str) {
        self.append(LogLevel::Debug, tag, message);
    }

    pub fn info(&self, tag: &str, message: &str) {
        self.append(LogLevel::Info, tag, message);
    }

    pub fn warn(&self, tag: &str, message: &str) {
        self.append(LogLevel::Warn, tag, message);
    }

    pub fn error(&self, tag: &str, message: &str) {
        self.append(LogLevel::Error, tag, message);
    }

    /// Entries in append order, oldest first.
    ///
    /// Served from memory once warm; the first call loads the shared file and the
    /// entries still queued by this process.
    pub fn read(&self) -> Vec<LogEntry> {
        if let Some(cache) = self.inner.cache.lock().as_ref() {
            return cache.iter().cloned().collect();
        }

        let _gate = self.inner.gate.lock();
        let loaded = self.inner.file.read_all();

        let queue = self.inner.queue.lock();
        let mut cache = self.inner.cache.lock();
        if let Some(warm) = cache.as_ref() {
            return warm.iter().cloned().collect();
        }

        let loaded = match loaded {
            Ok(loaded) => loaded,
            Err(e) => {
                warn!(target: DIAG_TARGET, error = %e, "dev log read failed; serving queued entries");
                return queue.iter().cloned().collect();
            }
        };

        let mut warm: VecDeque<LogEntry> = loaded.into_iter().chain(queue.iter().cloned()).collect();
        while warm.len() > self.inner.max_logs {
            warm.pop_front();
        }
        let out = warm.iter().cloned().collect();
        *cache = Some(warm);
        out
    }

    /// Drop the read cache and reload, picking up entries flushed by other processes.
    pub fn refresh(&self) -> Vec<LogEntry> {
        *self.inner.cache.lock() = None;
        self.read()
    }

    /// Entries rendered for sharing, one per line.
    pub fn as_text(&self) -> String {
        self.read()
            .iter()
            .map(LogEntry::to_text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Write queued entries now instead of waiting for the debounce window.
    pub async fn flush(&self) {
        flush_off_thread(&self.inner).await;
    }

    /// Cap the shared file at the configured capacity.
    pub fn trim(&self) {
        let _gate = self.inner.gate.lock();
        self.inner.trim_locked();
    }

    /// Drop every entry in memory and on disk, then record the clear itself.
    pub fn clear(&self) {
        {
            let _gate = self.inner.gate.lock();
            self.inner.queue.lock().clear();
            if let Err(e) = self.inner.file.truncate() {
                warn!(target: DIAG_TARGET, error = %e, "dev log truncate failed");
            }
            *self.inner.cache.lock() = Some(VecDeque::new());
        }
        self.info(CLEAR_TAG, CLEAR_MESSAGE);
    }

    /// Stop the flusher after a final flush.
    pub async fn shutdown(&self) {
        self.guard.cancel.cancel();
        let task = self.guard.task.lock().take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                warn!(target: DIAG_TARGET, error = %e, "dev log flusher ended abnormally");
            }
        }
    }
}

impl fmt::Debug for DevLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DevLog")
            .field("origin", &self.inner.origin)
            .field("max_logs", &self.inner.max_logs)
            .field("queued", &self.inner.queue.lock().len())
            .finish()
    }
}

/// Debounced flush loop; one per [`DevLog::open`].
async fn run_flusher(inner: Arc<Inner>) {
    loop {
        tokio::select! {
            _ = inner.cancel.cancelled() => break,
            _ = inner.wake.notified() => {}
        }
        tokio::select! {
            _ = inner.cancel.cancelled() => {}
            _ = tokio::time::sleep(inner.debounce) => {}
        }
        flush_off_thread(&inner).await;
        if inner.cancel.is_cancelled() {
            break;
        }
    }
    flush_off_thread(&inner).await;
    trace!(target: DIAG_TARGET, "dev log flusher stopped");
}

async fn flush_off_thread(inner: &Arc<Inner>) {
    let inner = Arc::clone(inner);
    if let Err(e) = tokio::task::spawn_blocking(move || inner.flush_now()).await {
        warn!(target: DIAG_TARGET, error = %e, "dev log flush task failed");
    }
}

/// Executable name plus pid, e.g. `hl-launchd-4242`.
fn detect_origin() -> String {
    let stem = std::env::current_exe()
        .ok()
        .and_then(|p| p.file_stem().map(|s| s.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "main".to_string());
    format!("{stem}-{}", std::process::id())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    fn config(dir: &TempDir, max_logs: usize) -> DevLogConfig {
        DevLogConfig {
            path: dir.path().join("dev.log"),
            max_logs,
            flush_debounce_ms: 10,
            origin: Some("test".into()),
        }
    }

    fn messages(entries: &[LogEntry]) -> Vec<String> {
        entries.iter().map(|e| e.message.clone()).collect()
    }

    #[test]
    fn open_requires_a_runtime() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            DevLog::open(config(&dir, 10)),
            Err(DevLogError::NoRuntime)
        ));
    }

    #[tokio::test]
    async fn entries_read_back_in_append_order() {
        let dir = TempDir::new().unwrap();
        let log = DevLog::open(config(&dir, 100)).unwrap();

        log.debug("t", "one");
        log.info("t", "two");
        log.error("t", "three");

        let read = log.read();
        assert_eq!(messages(&read), vec!["one", "two", "three"]);
        assert_eq!(read[2].level, LogLevel::Error);
        assert!(read.iter().all(|e| e.origin == "test"));
    }

    #[tokio::test]
    async fn flush_persists_for_a_fresh_reader() {
        let dir = TempDir::new().unwrap();
        let writer = DevLog::open(config(&dir, 100)).unwrap();
        writer.info("t", "persisted");
        writer.flush().await;

        let reader = DevLog::open(config(&dir, 100)).unwrap();
        assert_eq!(messages(&reader.read()), vec!["persisted"]);
    }

    #[tokio::test]
    async fn flusher_writes_after_debounce() {
        let dir = TempDir::new().unwrap();
        let log = DevLog::open(config(&dir, 100)).unwrap();
        log.info("t", "background");

        let path = dir.path().join("dev.log");
        let mut written = String::new();
        for _ in 0..100 {
            tokio::time::sleep(Duration::from_millis(20)).await;
            written = fs::read_to_string(&path).unwrap_or_default();
            if !written.is_empty() {
                break;
            }
        }
        assert_eq!(written.lines().count(), 1);
        assert!(written.ends_with("|background\n"));
    }

    #[tokio::test]
    async fn overflow_keeps_the_newest_entries() {
        let dir = TempDir::new().unwrap();
        let log = DevLog::open(config(&dir, 500)).unwrap();

        for i in 0..501 {
            log.info("t", &format!("entry {i}"));
        }
        log.flush().await;

        let fresh = DevLog::open(config(&dir, 500)).unwrap();
        let read = fresh.read();
        assert_eq!(read.len(), 500);
        assert_eq!(read.first().unwrap().message, "entry 1");
        assert_eq!(read.last().unwrap().message, "entry 500");

        let on_disk = fs::read_to_string(dir.path().join("dev.log")).unwrap();
        assert_eq!(on_disk.lines().count(), 500);
    }

    #[tokio::test]
    async fn warm_cache_is_bounded_too() {
        let dir = TempDir::new().unwrap();
        let log = DevLog::open(config(&dir, 3)).unwrap();
        assert!(log.read().is_empty());

        for i in 0..5 {
            log.info("t", &format!("entry {i}"));
        }
        assert_eq!(messages(&log.read()), vec!["entry 2", "entry 3", "entry 4"]);
    }

    #[tokio::test]
    async fn clear_leaves_only_the_marker() {
        let dir = TempDir::new().unwrap();
        let log = DevLog::open(config(&dir, 100)).unwrap();
        log.info("t", "flushed");
        log.flush().await;
        log.info("t", "queued");

        log.clear();

        let read = log.read();
        assert_eq!(read.len(), 1);
        assert_eq!(read[0].tag, CLEAR_TAG);
        assert_eq!(read[0].message, CLEAR_MESSAGE);

        log.flush().await;
        let reloaded = log.refresh();
        assert_eq!(messages(&reloaded), vec![CLEAR_MESSAGE]);
    }

    #[tokio::test]
    async fn two_producers_share_one_file() {
        let dir = TempDir::new().unwrap();
        let mut cfg_a = config(&dir, 100);
        cfg_a.origin = Some("webapp1".into());
        let mut cfg_b = config(&dir, 100);
        cfg_b.origin = Some("webapp2".into());

        let a = DevLog::open(cfg_a).unwrap();
        let b = DevLog::open(cfg_b).unwrap();
        for i in 0..3 {
            a.info("t", &format!("a{i}"));
            b.info("t", &format!("b{i}"));
        }
        a.flush().await;
        b.flush().await;

        let all = DevLog::open(config(&dir, 100)).unwrap().read();
        let from = |origin: &str| -> Vec<String> {
            all.iter()
                .filter(|e| e.origin == origin)
                .map(|e| e.message.clone())
                .collect()
        };
        assert_eq!(from("webapp1"), vec!["a0", "a1", "a2"]);
        assert_eq!(from("webapp2"), vec!["b0", "b1", "b2"]);
    }

    #[tokio::test]
    async fn producers_together_stay_within_capacity() {
        let dir = TempDir::new().unwrap();
        let mut cfg_a = config(&dir, 5);
        cfg_a.origin = Some("webapp1".into());
        let mut cfg_b = config(&dir, 5);
        cfg_b.origin = Some("webapp2".into());
        let a = DevLog::open(cfg_a).unwrap();
        let b = DevLog::open(cfg_b).unwrap();

        for i in 0..4 {
            a.info("t", &format!("a{i}"));
        }
        a.flush().await;
        for i in 0..4 {
            b.info("t", &format!("b{i}"));
        }
        b.flush().await;

        let on_disk = fs::read_to_string(dir.path().join("dev.log")).unwrap();
        assert_eq!(on_disk.lines().count(), 5);
        let all = DevLog::open(config(&dir, 5)).unwrap().read();
        assert_eq!(messages(&all), vec!["a3", "b0", "b1", "b2", "b3"]);
    }

    #[tokio::test]
    async fn torn_line_in_shared_file_keeps_log_readable_and_bounded() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dev.log");
        let log = DevLog::open(config(&dir, 3)).unwrap();
        log.info("t", "first");
        log.flush().await;

        let mut raw = fs::read(&path).unwrap();
        raw.extend_from_slice(b"2024-01-01T00:00:00Z|t|I|other|caf\xC3\n");
        fs::write(&path, raw).unwrap();

        for i in 0..10 {
            log.info("t", &format!("entry {i}"));
        }
        log.flush().await;

        let fresh = DevLog::open(config(&dir, 3)).unwrap();
        assert_eq!(messages(&fresh.read()), vec!["entry 7", "entry 8", "entry 9"]);
        assert_eq!(fs::read(&path).unwrap().split(|b| *b == b'\n').count(), 4);
    }

    #[tokio::test]
    async fn storage_failure_is_swallowed() {
        let dir = TempDir::new().unwrap();
        // A directory cannot be opened for appending.
        let blocked = dir.path().join("blocked");
        fs::create_dir(&blocked).unwrap();
        let cfg = DevLogConfig {
            path: blocked,
            max_logs: 10,
            flush_debounce_ms: 1,
            origin: Some("test".into()),
        };
        let log = DevLog::open(cfg).unwrap();

        log.warn("t", "kept in memory");
        log.flush().await;

        assert_eq!(messages(&log.read()), vec!["kept in memory"]);
    }

    #[tokio::test]
    async fn shutdown_flushes_pending_entries() {
        let dir = TempDir::new().unwrap();
        let mut cfg = config(&dir, 100);
        cfg.flush_debounce_ms = 60_000;
        let log = DevLog::open(cfg).unwrap();

        log.info("t", "last words");
        log.shutdown().await;

        let on_disk = fs::read_to_string(dir.path().join("dev.log")).unwrap();
        assert!(on_disk.contains("|last words"));
    }

    #[tokio::test]
    async fn text_export_has_one_line_per_entry() {
        let dir = TempDir::new().unwrap();
        let log = DevLog::open(config(&dir, 100)).unwrap();
        log.info("Pool", "a");
        log.warn("Pool", "b");

        let text = log.as_text();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].ends_with("[test][W/Pool] b"));
    }
}
