//! `paneward hook <event>`: called by the monitored program's hook config.
//!
//! Never fails the caller. A missing `TMUX_PANE`, an unknown event or a bad
//! payload is a silent no-op; a store error is reported on stderr only.

use std::io::Read;
use std::path::Path;

use chrono::{TimeDelta, Utc};
use paneward_source_hooks::{
    EventStore, EventStoreConfig, HookOutcome, HookPayload, StoreError, record_hook_event,
};

use crate::cli::HookOpts;
use crate::poll_loop::events_dir;

pub fn cmd_hook(opts: &HookOpts, state_dir: &Path) {
    let mut raw = Vec::new();
    if std::io::stdin().read_to_end(&mut raw).is_err() {
        raw.clear();
    }
    let pane_id = std::env::var("TMUX_PANE").ok();
    let store = hook_store(opts, state_dir);

    if let Err(e) = handle(&store, pane_id.as_deref(), &opts.event, &raw) {
        eprintln!("paneward hook: {e}");
    }
}

/// The idle-after-paused race is settled at write time, so the window is
/// the writer's setting.
fn hook_store(opts: &HookOpts, state_dir: &Path) -> EventStore {
    EventStore::new(
        EventStoreConfig::new(events_dir(state_dir))
            .with_suppress_idle_window(TimeDelta::seconds(opts.suppress_idle_secs)),
    )
}

fn handle(
    store: &EventStore,
    pane_id: Option<&str>,
    event: &str,
    raw: &[u8],
) -> Result<HookOutcome, StoreError> {
    let payload = HookPayload::parse(raw);
    record_hook_event(store, pane_id, event, &payload, Utc::now())
}
