use std::{
    collections::HashSet,
    sync::atomic::{AtomicU64, AtomicUsize, Ordering},
};

use hl_model::{LoadSpec, ViewId};
use parking_lot::Mutex;

use crate::pool::{Engine, EngineError};

/// Instance produced by [`CountingEngine`].
#[derive(Debug)]
pub(crate) struct FakeHandle {
    pub(crate) serial: u64,
    pub(crate) payload: String,
    pub(crate) view: Option<ViewId>,
}

/// Engine fake recording every call it receives.
#[derive(Default)]
pub(crate) struct CountingEngine {
    serial: AtomicU64,
    materialized: AtomicUsize,
    pub(crate) destroyed: Mutex<Vec<u64>>,
    pub(crate) attaches: Mutex<Vec<(u64, ViewId)>>,
    pub(crate) detaches: Mutex<Vec<(u64, ViewId)>>,
    /// Payloads that fail to materialize.
    pub(crate) broken: Mutex<HashSet<String>>,
    /// Views that refuse attachments.
    pub(crate) refusing: Mutex<HashSet<ViewId>>,
}

impl CountingEngine {
    pub(crate) fn materialized(&self) -> usize {
        self.materialized.load(Ordering::SeqCst)
    }

    pub(crate) fn destroyed(&self) -> Vec<u64> {
        self.destroyed.lock().clone()
    }

    pub(crate) fn break_payload(&self, payload: &str) {
        self.broken.lock().insert(payload.to_string());
    }
}

impl Engine for CountingEngine {
    type Handle = FakeHandle;

    fn name(&self) -> &'static str {
        "counting"
    }

    fn materialize(&self, spec: &LoadSpec) -> Result<FakeHandle, EngineError> {
        if self.broken.lock().contains(&spec.payload) {
            return Err(EngineError::Load(format!("cannot load {}", spec.display_name)));
        }
        self.materialized.fetch_add(1, Ordering::SeqCst);
        Ok(FakeHandle {
            serial: self.serial.fetch_add(1, Ordering::SeqCst) + 1,
            payload: spec.payload.clone(),
            view: None,
        })
    }

    fn attach(&self, handle: &mut FakeHandle, view: ViewId) -> Result<(), EngineError> {
        assert!(handle.view.is_none(), "attach on an attached handle");
        if self.refusing.lock().contains(&view) {
            return Err(EngineError::Attach(format!("{view} refused")));
        }
        handle.view = Some(view);
        self.attaches.lock().push((handle.serial, view));
        Ok(())
    }

    fn detach(&self, handle: &mut FakeHandle, view: ViewId) {
        assert_eq!(handle.view, Some(view), "detach from the wrong view");
        handle.view = None;
        self.detaches.lock().push((handle.serial, view));
    }

    fn destroy(&self, handle: FakeHandle) {
        assert!(handle.view.is_none(), "destroy of an attached handle");
        self.destroyed.lock().push(handle.serial);
    }
}
