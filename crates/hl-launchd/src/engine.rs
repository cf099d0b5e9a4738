use std::sync::atomic::{AtomicUsize, Ordering};

use hl_core::{Engine, EngineError};
use hl_model::{LoadSpec, ViewId};
use tracing::{debug, trace};

/// Parsed document held by [`HeadlessEngine`].
#[derive(Debug)]
pub struct HeadlessPage {
    pub origin: String,
    /// Contents of the `<title>` element, when the document has one.
    pub title: Option<String>,
    pub bytes: usize,
    view: Option<ViewId>,
}

impl HeadlessPage {
    pub fn view(&self) -> Option<ViewId> {
        self.view
    }
}

/// Engine that loads documents without rendering them.
///
/// Stands in for a browser engine: it validates the document, extracts its title and
/// tracks which view shows it.
#[derive(Debug, Default)]
pub struct HeadlessEngine {
    live: AtomicUsize,
}

impl HeadlessEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pages materialized and not yet destroyed.
    pub fn live(&self) -> usize {
        self.live.load(Ordering::Relaxed)
    }
}

impl Engine for HeadlessEngine {
    type Handle = HeadlessPage;

    fn name(&self) -> &'static str {
        "headless"
    }

    fn materialize(&self, spec: &LoadSpec) -> Result<HeadlessPage, EngineError> {
        if spec.payload.trim().is_empty() {
            return Err(EngineError::Load(format!("{} is empty", spec.display_name)));
        }
        let page = HeadlessPage {
            origin: spec.origin.clone(),
            title: extract_title(&spec.payload),
            bytes: spec.payload.len(),
            view: None,
        };
        self.live.fetch_add(1, Ordering::Relaxed);
        debug!(origin = %page.origin, bytes = page.bytes, "page loaded");
        Ok(page)
    }

    fn attach(&self, handle: &mut HeadlessPage, view: ViewId) -> Result<(), EngineError> {
        trace!(origin = %handle.origin, %view, "page attached");
        handle.view = Some(view);
        Ok(())
    }

    fn detach(&self, handle: &mut HeadlessPage, view: ViewId) {
        trace!(origin = %handle.origin, %view, "page detached");
        handle.view = None;
    }

    fn destroy(&self, handle: HeadlessPage) {
        self.live.fetch_sub(1, Ordering::Relaxed);
        trace!(origin = %handle.origin, "page destroyed");
    }
}

/// Text of the first `<title>` element, trimmed. Tag matching ignores ASCII case.
fn extract_title(document: &str) -> Option<String> {
    let lower = document.to_ascii_lowercase();
    let open = lower.find("<title")?;
    let start = open + lower[open..].find('>')? + 1;
    let end = start + lower[start..].find("</title")?;
    let title = document[start..end].trim();
    (!title.is_empty()).then(|| title.to_string())
}

#[cfg(test)]
mod tests {
    use hl_model::ContentId;

    use super::*;

    fn spec(payload: &str) -> LoadSpec {
        LoadSpec::for_content(ContentId::new(1), "page.html", payload)
    }

    #[test]
    fn title_is_extracted() {
        assert_eq!(
            extract_title("<HTML><Title lang=en>  Clock </TITLE></HTML>").as_deref(),
            Some("Clock")
        );
        assert_eq!(extract_title("<title></title>"), None);
        assert_eq!(extract_title("<p>no title</p>"), None);
        assert_eq!(extract_title("<title>unterminated"), None);
    }

    #[test]
    fn empty_document_fails_to_load() {
        let engine = HeadlessEngine::new();
        let err = engine.materialize(&spec("  \n")).unwrap_err();
        assert!(matches!(err, EngineError::Load(_)));
        assert_eq!(engine.live(), 0);
    }

    #[test]
    fn lifecycle_tracks_view_and_live_count() {
        let engine = HeadlessEngine::new();
        let mut page = engine.materialize(&spec("<title>Notes</title>")).unwrap();
        assert_eq!(page.title.as_deref(), Some("Notes"));
        assert_eq!(page.origin, "https://app-1.hlaunch.local/");
        assert_eq!(engine.live(), 1);

        engine.attach(&mut page, ViewId::new(2)).unwrap();
        assert_eq!(page.view(), Some(ViewId::new(2)));
        engine.detach(&mut page, ViewId::new(2));
        assert_eq!(page.view(), None);

        engine.destroy(page);
        assert_eq!(engine.live(), 0);
    }
}
