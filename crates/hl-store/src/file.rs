use std::{
    fs::{self, File, OpenOptions},
    io::{self, Write},
    path::{Path, PathBuf},
    sync::atomic::{AtomicU64, Ordering},
};

use fs2::FileExt;
use tracing::{trace, warn};

use crate::{KvStore, StoreError, StoreLock, StoreResult, check_key};

/// Per-process sequence used to name temporary files.
static TMP_SEQ: AtomicU64 = AtomicU64::new(1);

/// Directory-backed store: one file per key, one lock file per lock name.
///
/// Values are written to a temporary file and renamed over the target, so readers in
/// other processes observe either the old or the new value, never a torn one.
/// Locks are `flock`-style advisory locks on `<root>/<name>.lock` and therefore
/// exclude other processes as well as other handles inside this process.
#[derive(Debug, Clone)]
pub struct FileKvStore {
    root: PathBuf,
}

impl FileKvStore {
    /// Open (and create if needed) a store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Root directory of the store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn value_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.kv"))
    }

    fn lock_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}.lock"))
    }
}

/// Open lock file; the advisory lock is released when this is dropped.
struct FileLockHolder {
    file: File,
}

impl Drop for FileLockHolder {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            warn!(error = %e, "failed to release store lock");
        }
    }
}

impl KvStore for FileKvStore {
    fn name(&self) -> &'static str {
        "file"
    }

    fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        check_key(key)?;
        match fs::read(self.value_path(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    fn set(&self, key: &str, value: &[u8]) -> StoreResult<()> {
        check_key(key)?;
        let target = self.value_path(key);
        let tmp = self.root.join(format!(
            ".{key}.{pid}.{seq}.tmp",
            pid = std::process::id(),
            seq = TMP_SEQ.fetch_add(1, Ordering::Relaxed)
        ));

        let write = || -> io::Result<()> {
            let mut file = File::create(&tmp)?;
            file.write_all(value)?;
            file.sync_all()?;
            fs::rename(&tmp, &target)
        };
        if let Err(e) = write() {
            let _ = fs::remove_file(&tmp);
            return Err(StoreError::Io(e));
        }

        trace!(key, len = value.len(), "store value written");
        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        check_key(key)?;
        match fs::remove_file(self.value_path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    fn lock(&self, name: &str) -> StoreResult<StoreLock> {
        check_key(name)?;
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(self.lock_path(name))?;
        FileExt::lock_exclusive(&file)?;

        trace!(lock = name, "store lock acquired");
        Ok(StoreLock::new(name, FileLockHolder { file }))
    }
}
