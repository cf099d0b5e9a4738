use std::{
    fs,
    io,
    path::{Path, PathBuf},
    time::UNIX_EPOCH,
};

use hl_core::CoreError;
use hl_model::{Content, ContentId, ContentSummary};
use tracing::{debug, info};

/// Documents written into a fresh content directory.
const SEED: &[(&str, &str)] = &[
    (
        "clock.html",
        "<html><head><title>Clock</title></head><body><p id=\"t\"></p></body></html>",
    ),
    (
        "notes.html",
        "<html><head><title>Notes</title></head><body><textarea></textarea></body></html>",
    ),
    (
        "counter.html",
        "<html><head><title>Counter</title></head><body><button>+1</button></body></html>",
    ),
];

/// Content repository over a directory of `.html` files.
///
/// Files are ordered by name; the first file gets id 1. Ids stay stable while the
/// directory does not change.
#[derive(Debug, Clone)]
pub struct HtmlDirRepository {
    dir: PathBuf,
}

impl HtmlDirRepository {
    /// Open `dir`, creating it with a few seed documents when it does not exist.
    pub fn open(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        if !dir.exists() {
            fs::create_dir_all(&dir)?;
            for (name, body) in SEED {
                fs::write(dir.join(name), body)?;
            }
            info!(dir = %dir.display(), files = SEED.len(), "content directory seeded");
        }
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn scan(&self) -> io::Result<Vec<(ContentId, PathBuf)>> {
        let mut files = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == "html") {
                files.push(path);
            }
        }
        files.sort();
        Ok(files
            .into_iter()
            .enumerate()
            .map(|(i, path)| (ContentId::new(i as u64 + 1), path))
            .collect())
    }

    fn summary_of(id: ContentId, path: &Path) -> io::Result<ContentSummary> {
        let updated_at_ms = fs::metadata(path)?
            .modified()?
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(ContentSummary {
            id,
            name,
            updated_at_ms,
        })
    }
}

fn repo_err(err: io::Error) -> CoreError {
    CoreError::Repository(err.to_string())
}

impl hl_core::ContentRepository for HtmlDirRepository {
    fn get_content(&self, id: ContentId) -> Result<Option<Content>, CoreError> {
        let files = self.scan().map_err(repo_err)?;
        let Some((_, path)) = files.into_iter().find(|(candidate, _)| *candidate == id) else {
            debug!(content_id = %id, "content not in directory");
            return Ok(None);
        };

        let summary = Self::summary_of(id, &path).map_err(repo_err)?;
        let payload = fs::read_to_string(&path).map_err(repo_err)?;
        Ok(Some(Content {
            id,
            name: summary.name,
            payload,
            updated_at_ms: summary.updated_at_ms,
        }))
    }

    fn list_content(&self) -> Result<Vec<ContentSummary>, CoreError> {
        self.scan()
            .map_err(repo_err)?
            .iter()
            .map(|(id, path)| Self::summary_of(*id, path).map_err(repo_err))
            .collect()
    }
}
