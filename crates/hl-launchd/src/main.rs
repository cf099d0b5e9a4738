use std::sync::Arc;

use hl_core::{ContentRepository, LauncherApi, metrics::MetricsHandle};
use hl_devlog::DevLog;
use hl_model::ViewId;
use hl_observe::{init_local_offset, init_logger_with_devlog};
use hl_prometheus::{Encoder, PrometheusMetrics, TextEncoder};
use tracing::{info, warn};

mod config;
mod engine;
mod host;
mod repository;

use config::AppConfig;
use engine::HeadlessEngine;
use host::LoggingHost;
use repository::HtmlDirRepository;

fn main() -> anyhow::Result<()> {
    // 1) local offset, while the process is still single-threaded
    init_local_offset();

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(run())
}

async fn run() -> anyhow::Result<()> {
    // 2) config
    let cfg = AppConfig::load()?;

    // 3) dev log + logger
    let devlog = DevLog::open(cfg.launcher.devlog.clone())?;
    init_logger_with_devlog(&cfg.logger, devlog.clone())?;
    info!(origin = devlog.origin(), "logger initialized");

    // 4) metrics
    let metrics = Arc::new(PrometheusMetrics::new()?);
    let handle: MetricsHandle = metrics.clone();

    // 5) launcher
    let repository = Arc::new(HtmlDirRepository::open(cfg.content_dir())?);
    info!(dir = %repository.dir().display(), "content directory");
    let host = Arc::new(LoggingHost::new(cfg.launcher.slots));
    let api = LauncherApi::open(
        &cfg.launcher,
        HeadlessEngine::new(),
        devlog.clone(),
        repository.clone(),
        host.clone(),
        handle,
    )?;

    // 6) demo: launch every content and attach its page to the slot's view
    for summary in repository.list_content()? {
        let id = summary.id;
        let allocation = match api.launch(id) {
            Ok(allocation) => allocation,
            Err(e) => {
                warn!(content_id = %id, error = %e, "launch failed");
                continue;
            }
        };

        let page = api.acquire_content(id)?;
        let title = api.pool().with_handle(page, |p| p.title.clone())?;
        if let Some(title) = title {
            api.pool().set_page_title(id, title);
        }
        let view = ViewId::new(allocation.slot.get() as u64);
        api.attach_resource(id, view, true)?;
        let attached = api.pool().with_handle(page, |p| p.view())?;
        info!(
            content_id = %id,
            slot = %allocation.slot,
            shown = ?host.shown(allocation.slot),
            ?attached,
            "content ready"
        );
    }

    let table = api.slots().snapshot()?;
    info!(table = %serde_json::to_string(&table)?, "slot table");
    for resource in api.pool().snapshot() {
        info!(
            content_id = %resource.content_id,
            label = resource.label(),
            origin = %resource.origin,
            attached = ?resource.attached_to,
            "pooled resource"
        );
    }

    let mut buffer = Vec::new();
    TextEncoder::new().encode(&metrics.gather(), &mut buffer)?;
    info!(metrics = %String::from_utf8_lossy(&buffer), "metrics");

    // 7) shutdown
    let closed = api.close_all_resources();
    info!(closed, live = api.pool().engine().live(), "resources closed");
    devlog.shutdown().await;
    Ok(())
}
