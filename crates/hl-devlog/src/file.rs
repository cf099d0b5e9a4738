use std::{
    fs::{self, File, OpenOptions},
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

use fs2::FileExt;
use tracing::debug;

use crate::entry::LogEntry;

/// Shared log file guarded by an advisory lock on `<path>.lock`.
///
/// The lock lives in a separate file so that trimming can replace the data file
/// by rename without invalidating other processes' locks.
#[derive(Debug, Clone)]
pub(crate) struct LogFile {
    path: PathBuf,
    lock_path: PathBuf,
}

/// Held advisory lock; released on drop.
struct Held(File);

impl Drop for Held {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.0);
    }
}

impl LogFile {
    pub(crate) fn new(path: &Path) -> io::Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let mut lock_name = path.as_os_str().to_owned();
        lock_name.push(".lock");
        Ok(Self {
            path: path.to_path_buf(),
            lock_path: PathBuf::from(lock_name),
        })
    }

    fn lock(&self, exclusive: bool) -> io::Result<Held> {
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&self.lock_path)?;
        if exclusive {
            FileExt::lock_exclusive(&file)?;
        } else {
            FileExt::lock_shared(&file)?;
        }
        Ok(Held(file))
    }

    /// Append `entries` in order, one line each.
    ///
    /// Returns the number of lines in the file after the write, counting lines written
    /// by every process.
    pub(crate) fn append(&self, entries: &[LogEntry]) -> io::Result<usize> {
        let _held = self.lock(true)?;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut out = BufWriter::new(file);
        for entry in entries {
            out.write_all(entry.to_line().as_bytes())?;
            out.write_all(b"\n")?;
        }
        out.flush()?;
        drop(out);

        let raw = self.read_raw()?;
        Ok(raw_lines(&raw).count())
    }

    /// Read every well-formed entry in file order. A missing file reads as empty.
    ///
    /// Lines that are not valid UTF-8 or do not parse are skipped.
    pub(crate) fn read_all(&self) -> io::Result<Vec<LogEntry>> {
        let _held = self.lock(false)?;
        let raw = self.read_raw()?;

        let mut skipped = 0usize;
        let entries: Vec<LogEntry> = raw_lines(&raw)
            .filter_map(|line| {
                match std::str::from_utf8(line).ok().map(LogEntry::parse_line) {
                    Some(Ok(entry)) => Some(entry),
                    _ => {
                        skipped += 1;
                        None
                    }
                }
            })
            .collect();
        if skipped > 0 {
            debug!(target: crate::DIAG_TARGET, skipped, "skipped malformed dev log lines");
        }
        Ok(entries)
    }

    /// Keep only the newest `max` lines, valid or not. Returns the number of lines retained.
    pub(crate) fn trim(&self, max: usize) -> io::Result<usize> {
        let _held = self.lock(true)?;
        let raw = self.read_raw()?;

        let lines: Vec<&[u8]> = raw_lines(&raw).collect();
        if lines.len() <= max {
            return Ok(lines.len());
        }

        let keep = &lines[lines.len() - max..];
        let mut tmp_name = self.path.as_os_str().to_owned();
        tmp_name.push(format!(".{}.trim", std::process::id()));
        let tmp = PathBuf::from(tmp_name);

        let rewrite = || -> io::Result<()> {
            let mut out = BufWriter::new(File::create(&tmp)?);
            for line in keep {
                out.write_all(line)?;
                out.write_all(b"\n")?;
            }
            out.into_inner().map_err(|e| e.into_error())?.sync_all()?;
            fs::rename(&tmp, &self.path)
        };
        if let Err(e) = rewrite() {
            let _ = fs::remove_file(&tmp);
            return Err(e);
        }

        debug!(target: crate::DIAG_TARGET, dropped = lines.len() - max, kept = max, "dev log trimmed");
        Ok(max)
    }

    /// Raw file contents; the caller holds the lock. A missing file is empty.
    fn read_raw(&self) -> io::Result<Vec<u8>> {
        match fs::read(&self.path) {
            Ok(raw) => Ok(raw),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }

    /// Drop every stored entry.
    pub(crate) fn truncate(&self) -> io::Result<()> {
        let _held = self.lock(true)?;
        match OpenOptions::new().write(true).open(&self.path) {
            Ok(file) => file.set_len(0),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}

/// Non-blank lines of `raw`, without their terminators.
fn raw_lines(raw: &[u8]) -> impl Iterator<Item = &[u8]> {
    raw.split(|b| *b == b'\n')
        .map(|line| line.strip_suffix(b"\r").unwrap_or(line))
        .filter(|line| !line.iter().all(u8::is_ascii_whitespace))
}
