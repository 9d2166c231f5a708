//! Poll loop: wires tmux → process scan → status source → refinement.
//! Runs as a tokio task, polling tmux at configurable intervals.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use tokio::sync::Mutex;
use tokio::time::{Duration, interval};

use paneward_core::refine::{DEFAULT_DONE_ACTIVITY_SECS, DEFAULT_DONE_SECS};
use paneward_core::{
    DetectionKind, DoneDecay, PaneSession, RefinePolicy, Refiner, SeenMarkers, StatusSource,
    apply_vcs, carry_forward, has_changed, resolve_panes,
};
use paneward_source_hooks::{EventStore, EventStoreConfig, EventStoreSource};
use paneward_source_poller::{ClassifierMarkers, PaneTextSource};
use paneward_tmux::{
    PaneTextCapture, ProcessLister, PsProcessLister, TmuxCommandRunner, TmuxExecutor, list_panes,
};

use crate::cli::{DaemonOpts, DecayArg, DetectionArg};
use crate::git_stats::VcsCache;
use crate::operator_state;
use crate::server;

// ─── Configuration ────────────────────────────────────────────────

/// Everything a poll cycle needs to know that is not live state.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Command name searched for under each pane's root process.
    pub program: String,
    pub detection: DetectionKind,
    pub policy: RefinePolicy,
    /// Run event-store cleanup on every Nth tick. `0` disables cleanup.
    pub cleanup_every: u64,
    /// Event records older than this are removed by cleanup.
    pub stale_after: TimeDelta,
    pub poll_interval: Duration,
    pub vcs_ttl: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            program: "claude".to_string(),
            detection: DetectionKind::Events,
            policy: DetectionKind::Events.default_policy(),
            cleanup_every: 10,
            stale_after: TimeDelta::seconds(300),
            poll_interval: Duration::from_millis(500),
            vcs_ttl: Duration::from_millis(3000),
        }
    }
}

impl EngineConfig {
    pub fn from_opts(opts: &DaemonOpts) -> Self {
        let detection = match opts.detection {
            DetectionArg::Events => DetectionKind::Events,
            DetectionArg::PaneText => DetectionKind::PaneText,
        };
        let decay = match opts.done_decay {
            DecayArg::Timer => DoneDecay::Timer(TimeDelta::seconds(
                opts.done_secs.unwrap_or(DEFAULT_DONE_SECS),
            )),
            DecayArg::Activity => DoneDecay::Activity(TimeDelta::seconds(
                opts.done_secs.unwrap_or(DEFAULT_DONE_ACTIVITY_SECS),
            )),
        };
        // Lifecycle events are trusted immediately; only text is debounced.
        let idle_debounce = match detection {
            DetectionKind::Events => 0,
            DetectionKind::PaneText => opts.idle_debounce,
        };
        Self {
            program: opts.program.clone(),
            detection,
            policy: detection
                .default_policy()
                .with_idle_debounce(idle_debounce)
                .with_decay(decay),
            cleanup_every: opts.cleanup_every,
            stale_after: TimeDelta::seconds(opts.stale_after_secs),
            poll_interval: Duration::from_millis(opts.poll_interval_ms()),
            vcs_ttl: Duration::from_millis(opts.vcs_ttl_ms),
        }
    }
}

pub fn events_dir(state_dir: &Path) -> PathBuf {
    state_dir.join("events")
}

// ─── State ────────────────────────────────────────────────────────

/// Shared daemon state protected by a mutex.
pub struct DaemonState {
    /// Occupied panes from the last complete cycle, sorted by working dir.
    pub sessions: Vec<PaneSession>,
    pub refiner: Refiner,
    pub seen: SeenMarkers,
    /// Bumped whenever `sessions` changed content.
    pub revision: u64,
    /// Bumped once per cycle that raised an attention signal.
    pub attention_seq: u64,
    /// Banner text for the last failed cycle; cleared on success.
    pub error: Option<String>,
    pub tick: u64,
    state_path: Option<PathBuf>,
}

impl DaemonState {
    pub fn new(policy: RefinePolicy, seen: SeenMarkers, state_path: Option<PathBuf>) -> Self {
        Self {
            sessions: Vec::new(),
            refiner: Refiner::new(policy),
            seen,
            revision: 0,
            attention_seq: 0,
            error: None,
            tick: 0,
            state_path,
        }
    }

    /// Record that the operator jumped to `target` and flush.
    pub fn mark_seen(&mut self, target: &str, now: DateTime<Utc>) {
        self.seen.mark_seen(target, now);
        self.flush_seen();
    }

    /// Save operator state if markers changed since the last save.
    pub fn flush_seen(&mut self) {
        if !self.seen.is_dirty() {
            return;
        }
        self.save_seen();
    }

    /// Save operator state unconditionally.
    pub fn save_seen(&mut self) {
        let Some(path) = self.state_path.as_deref() else {
            self.seen.take_dirty();
            return;
        };
        match operator_state::save(path, &self.seen) {
            Ok(()) => {
                self.seen.take_dirty();
            }
            Err(e) => tracing::warn!(error = %e, "failed to save operator state"),
        }
    }
}

// ─── Engine ───────────────────────────────────────────────────────

/// Collaborators for one daemon, fixed at construction.
pub struct Engine<R, P> {
    pub runner: Arc<R>,
    pub lister: Arc<P>,
    pub source: Arc<dyn StatusSource>,
    /// Present in events mode; target of periodic cleanup.
    pub store: Option<EventStore>,
    pub vcs: Option<Arc<VcsCache>>,
    pub config: EngineConfig,
}

pub(crate) fn build_executor(tmux_socket: Option<&str>) -> TmuxExecutor {
    let executor = TmuxExecutor::default();

    // Socket targeting: --tmux-socket > PANEWARD_TMUX_SOCKET_PATH > PANEWARD_TMUX_SOCKET_NAME
    if let Some(socket) = tmux_socket {
        executor.with_socket_path(socket)
    } else if let Ok(path) = std::env::var("PANEWARD_TMUX_SOCKET_PATH") {
        executor.with_socket_path(path)
    } else if let Ok(name) = std::env::var("PANEWARD_TMUX_SOCKET_NAME") {
        executor.with_socket_name(name)
    } else {
        executor
    }
}

pub async fn run_daemon(opts: DaemonOpts, socket_path: &str, state_dir: &Path) -> anyhow::Result<()> {
    let config = EngineConfig::from_opts(&opts);
    let executor = Arc::new(build_executor(opts.tmux_socket.as_deref()));

    let state_path = operator_state::state_path(state_dir);
    let seen = operator_state::load(&state_path);
    let state = Arc::new(Mutex::new(DaemonState::new(
        config.policy,
        seen,
        Some(state_path),
    )));

    let (source, store): (Arc<dyn StatusSource>, Option<EventStore>) = match config.detection {
        DetectionKind::Events => {
            let store = EventStore::new(EventStoreConfig::new(events_dir(state_dir)));
            (Arc::new(EventStoreSource::new(store.clone())), Some(store))
        }
        DetectionKind::PaneText => (
            Arc::new(PaneTextSource::new(
                PaneTextCapture(Arc::clone(&executor)),
                ClassifierMarkers::default(),
            )),
            None,
        ),
    };

    tracing::info!(
        detection = source.kind().as_str(),
        program = %config.program,
        poll_ms = config.poll_interval.as_millis() as u64,
        "engine configured"
    );

    let engine = Arc::new(Engine {
        runner: executor,
        lister: Arc::new(PsProcessLister::default()),
        source,
        store,
        vcs: Some(Arc::new(VcsCache::new(config.vcs_ttl))),
        config,
    });

    // Start UDS server
    let server_state = Arc::clone(&state);
    let server_socket = socket_path.to_string();
    let server_handle = tokio::spawn(async move {
        if let Err(e) = server::run_server(&server_socket, server_state).await {
            tracing::error!("UDS server error: {e}");
        }
    });

    // Start poll loop
    let poll_state = Arc::clone(&state);
    let poll_handle = tokio::spawn(async move {
        run_poll_loop(engine, poll_state).await;
    });

    // Wait for shutdown signal (ctrl-c or SIGTERM)
    #[cfg(unix)]
    let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;
    let shutdown = async {
        #[cfg(unix)]
        {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => tracing::info!("received ctrl-c, shutting down"),
                _ = sigterm.recv() => tracing::info!("received SIGTERM, shutting down"),
            }
        }

        #[cfg(not(unix))]
        {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("received ctrl-c, shutting down");
        }
    };

    tokio::select! {
        () = shutdown => {}
        _ = poll_handle => {
            tracing::warn!("poll loop exited unexpectedly");
        }
        _ = server_handle => {
            tracing::warn!("server exited unexpectedly");
        }
    }

    state.lock().await.save_seen();
    let _ = std::fs::remove_file(socket_path);
    tracing::info!("daemon stopped");
    Ok(())
}

async fn run_poll_loop<R, P>(engine: Arc<Engine<R, P>>, state: Arc<Mutex<DaemonState>>)
where
    R: TmuxCommandRunner + 'static,
    P: ProcessLister + 'static,
{
    let mut ticker = interval(engine.config.poll_interval);

    loop {
        ticker.tick().await;

        if let Err(e) = poll_tick(&engine, &state).await {
            tracing::warn!("poll tick failed: {e}");
        }
    }
}

/// One poll cycle.
///
/// Only a failed pane listing is an error; the previous sessions stay on
/// display with the error as a banner. A failed process scan skips the
/// cycle the same way but is not reported as a tick failure.
pub(crate) async fn poll_tick<R, P>(
    engine: &Engine<R, P>,
    state: &Arc<Mutex<DaemonState>>,
) -> anyhow::Result<()>
where
    R: TmuxCommandRunner + 'static,
    P: ProcessLister + 'static,
{
    let now = Utc::now();
    let tick = {
        let mut st = state.lock().await;
        st.tick += 1;
        st.tick
    };

    // 1. Periodic event-store cleanup
    if let Some(store) = engine.store.clone()
        && engine.config.cleanup_every > 0
        && tick % engine.config.cleanup_every == 0
    {
        let max_age = engine.config.stale_after;
        let report = tokio::task::spawn_blocking(move || store.cleanup(max_age, now)).await?;
        if report.removed_stale + report.removed_corrupt + report.removed_temp > 0 {
            tracing::debug!(
                stale = report.removed_stale,
                corrupt = report.removed_corrupt,
                temp = report.removed_temp,
                kept = report.kept,
                "event store cleanup"
            );
        }
    }

    // 2. List panes (blocking subprocess)
    let runner = Arc::clone(&engine.runner);
    let panes = match tokio::task::spawn_blocking(move || list_panes(&*runner)).await? {
        Ok(panes) => panes,
        Err(e) => {
            state.lock().await.error = Some(format!("tmux: {e}"));
            return Err(e.into());
        }
    };
    tracing::debug!("listed {} panes", panes.len());

    // 3. One process snapshot for every pane this cycle
    let lister = Arc::clone(&engine.lister);
    let table = match tokio::task::spawn_blocking(move || lister.snapshot()).await? {
        Ok(table) => table,
        Err(e) => {
            tracing::warn!(error = %e, "process scan failed, keeping previous sessions");
            state.lock().await.error = Some(format!("process scan: {e}"));
            return Ok(());
        }
    };

    // 4. Raw status per pane (source may read files or capture panes)
    let source = Arc::clone(&engine.source);
    let program = engine.config.program.clone();
    let mut sessions =
        tokio::task::spawn_blocking(move || resolve_panes(panes, &table, &program, &*source))
            .await?;
    sessions.retain(|s| s.is_occupied);

    // 5. Refine, merge, publish
    let mut guard = state.lock().await;
    let st = &mut *guard;
    let outcome = st.refiner.refine(&mut sessions, &mut st.seen, now);
    let sessions = carry_forward(&st.sessions, sessions);
    if has_changed(&st.sessions, &sessions) {
        st.revision += 1;
    }
    if outcome.has_attention() {
        st.attention_seq += 1;
        tracing::info!(panes = ?outcome.attention, "attention raised");
    }
    st.sessions = sessions;
    st.error = None;
    if outcome.seen_changed {
        st.flush_seen();
    }
    let vcs_targets: Vec<(String, String)> = st
        .sessions
        .iter()
        .map(|s| (s.pane_id().to_string(), s.pane.working_dir.clone()))
        .collect();
    drop(guard);

    // 6. VCS summaries arrive on their own schedule
    if let Some(vcs) = &engine.vcs {
        spawn_vcs_refresh(vcs, state, vcs_targets);
    }

    Ok(())
}

fn spawn_vcs_refresh(
    vcs: &Arc<VcsCache>,
    state: &Arc<Mutex<DaemonState>>,
    targets: Vec<(String, String)>,
) {
    for (pane_id, dir) in targets {
        let vcs = Arc::clone(vcs);
        let state = Arc::clone(state);
        tokio::spawn(async move {
            let summary = match tokio::task::spawn_blocking(move || vcs.get(&dir)).await {
                Ok(Some(summary)) => summary,
                Ok(None) => return,
                Err(e) => {
                    tracing::debug!("vcs task failed for {pane_id}: {e}");
                    return;
                }
            };
            let mut st = state.lock().await;
            // Gone panes and unchanged summaries are no-ops.
            if apply_vcs(&mut st.sessions, &pane_id, summary) {
                st.revision += 1;
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paneward_core::{ProcessTable, Status, VcsSummary};
    use paneward_source_hooks::EventRecord;
    use paneward_tmux::TmuxError;
    use std::collections::HashMap;

    /// Fake tmux backend with canned list-panes and capture-pane output.
    struct FakeTmuxBackend {
        list_panes_output: String,
        captures: HashMap<String, String>,
        list_panes_error: Option<String>,
    }

    impl FakeTmuxBackend {
        fn new() -> Self {
            Self {
                list_panes_output: String::new(),
                captures: HashMap::new(),
                list_panes_error: None,
            }
        }

        /// Pane `%N` in window `main:N`, root pid `N * 100`.
        fn with_pane(mut self, n: u32, cwd: &str, focused: bool) -> Self {
            let line = format!(
                "main\t{n}\t@{n}\tdev\t%{n}\t{}\t{cwd}\t1772355600\t{}\n",
                n * 100,
                u8::from(focused)
            );
            self.list_panes_output.push_str(&line);
            self
        }

        fn with_capture(mut self, pane_id: &str, text: &str) -> Self {
            self.captures.insert(pane_id.to_string(), text.to_string());
            self
        }

        fn with_list_panes_error(mut self, msg: &str) -> Self {
            self.list_panes_error = Some(msg.to_string());
            self
        }
    }

    impl TmuxCommandRunner for FakeTmuxBackend {
        fn run(&self, args: &[&str]) -> Result<String, TmuxError> {
            match args.first().copied() {
                Some("list-panes") => match &self.list_panes_error {
                    Some(err) => Err(TmuxError::CommandFailed(err.clone())),
                    None => Ok(self.list_panes_output.clone()),
                },
                Some("capture-pane") => {
                    let pane_id = args.last().copied().unwrap_or_default();
                    Ok(self.captures.get(pane_id).cloned().unwrap_or_default())
                }
                _ => Ok(String::new()),
            }
        }
    }

    /// Fixed process table, or a scan failure.
    struct FakeProcessLister(Option<String>);

    impl FakeProcessLister {
        /// Pane `%N`'s shell is pid `N * 100`; `claude` runs as `N * 100 + 1`
        /// under the shells listed in `occupied`.
        fn occupied(occupied: &[u32], shells: &[u32]) -> Self {
            let mut out = String::from("1 0 launchd\n");
            for n in shells {
                out.push_str(&format!("{} 1 zsh\n", n * 100));
            }
            for n in occupied {
                out.push_str(&format!("{} {} claude\n", n * 100 + 1, n * 100));
            }
            Self(Some(out))
        }

        fn failing() -> Self {
            Self(None)
        }
    }

    impl ProcessLister for FakeProcessLister {
        fn snapshot(&self) -> Result<ProcessTable, TmuxError> {
            match &self.0 {
                Some(out) => Ok(ProcessTable::parse(out)),
                None => Err(TmuxError::ProcessScan("ps exited with 1".to_string())),
            }
        }
    }

    struct Harness {
        _dir: tempfile::TempDir,
        store: EventStore,
        state_path: PathBuf,
        state: Arc<Mutex<DaemonState>>,
    }

    impl Harness {
        fn new() -> Self {
            let dir = tempfile::tempdir().expect("tempdir");
            let store = EventStore::new(EventStoreConfig::new(events_dir(dir.path())));
            let state_path = operator_state::state_path(dir.path());
            let state = Arc::new(Mutex::new(DaemonState::new(
                RefinePolicy::default(),
                SeenMarkers::new(),
                Some(state_path.clone()),
            )));
            Self {
                _dir: dir,
                store,
                state_path,
                state,
            }
        }

        fn events_engine(
            &self,
            backend: FakeTmuxBackend,
            lister: FakeProcessLister,
        ) -> Engine<FakeTmuxBackend, FakeProcessLister> {
            Engine {
                runner: Arc::new(backend),
                lister: Arc::new(lister),
                source: Arc::new(EventStoreSource::new(self.store.clone())),
                store: Some(self.store.clone()),
                vcs: None,
                config: EngineConfig::default(),
            }
        }

        fn event(&self, pane_id: &str, status: &str) {
            self.store
                .write(&EventRecord::new(pane_id, status, Utc::now()))
                .expect("write event");
        }
    }

    #[tokio::test]
    async fn poll_tick_keeps_only_occupied_panes() {
        let h = Harness::new();
        let engine = h.events_engine(
            FakeTmuxBackend::new()
                .with_pane(1, "/src/api", false)
                .with_pane(2, "/src/web", false),
            FakeProcessLister::occupied(&[1], &[1, 2]),
        );

        poll_tick(&engine, &h.state).await.expect("tick should succeed");

        let st = h.state.lock().await;
        assert_eq!(st.sessions.len(), 1);
        assert_eq!(st.sessions[0].pane_id(), "%1");
        assert_eq!(st.sessions[0].occupant_pid, Some(101));
        assert_eq!(st.sessions[0].status, Status::Idle, "no record yet reads as idle");
        assert_eq!(st.revision, 1);
        assert!(st.error.is_none());
    }

    #[tokio::test]
    async fn poll_tick_sorts_by_working_dir() {
        let h = Harness::new();
        let engine = h.events_engine(
            FakeTmuxBackend::new()
                .with_pane(1, "/src/web", false)
                .with_pane(2, "/src/api", false),
            FakeProcessLister::occupied(&[1, 2], &[1, 2]),
        );

        poll_tick(&engine, &h.state).await.expect("tick should succeed");

        let st = h.state.lock().await;
        let ids: Vec<_> = st.sessions.iter().map(|s| s.pane_id()).collect();
        assert_eq!(ids, vec!["%2", "%1"]);
    }

    #[tokio::test]
    async fn unchanged_cycle_keeps_revision() {
        let h = Harness::new();
        let engine = h.events_engine(
            FakeTmuxBackend::new().with_pane(1, "/src/api", false),
            FakeProcessLister::occupied(&[1], &[1]),
        );

        poll_tick(&engine, &h.state).await.expect("tick 1");
        poll_tick(&engine, &h.state).await.expect("tick 2");

        let st = h.state.lock().await;
        assert_eq!(st.revision, 1);
        assert_eq!(st.tick, 2);
    }

    #[tokio::test]
    async fn list_panes_failure_keeps_previous_sessions() {
        let h = Harness::new();
        let ok = h.events_engine(
            FakeTmuxBackend::new().with_pane(1, "/src/api", false),
            FakeProcessLister::occupied(&[1], &[1]),
        );
        poll_tick(&ok, &h.state).await.expect("tick should succeed");

        let down = h.events_engine(
            FakeTmuxBackend::new().with_list_panes_error("no server running"),
            FakeProcessLister::occupied(&[1], &[1]),
        );
        let result = poll_tick(&down, &h.state).await;
        assert!(result.is_err(), "should propagate list-panes failure");

        let st = h.state.lock().await;
        assert_eq!(st.sessions.len(), 1, "previous sessions stay on display");
        let banner = st.error.as_deref().expect("banner set");
        assert!(banner.contains("no server running"));
    }

    #[tokio::test]
    async fn process_scan_failure_skips_cycle() {
        let h = Harness::new();
        let ok = h.events_engine(
            FakeTmuxBackend::new().with_pane(1, "/src/api", false),
            FakeProcessLister::occupied(&[1], &[1]),
        );
        poll_tick(&ok, &h.state).await.expect("tick should succeed");

        let blind = h.events_engine(
            FakeTmuxBackend::new().with_pane(1, "/src/api", false),
            FakeProcessLister::failing(),
        );
        poll_tick(&blind, &h.state).await.expect("scan failure is not a tick failure");
        {
            let st = h.state.lock().await;
            assert_eq!(st.sessions.len(), 1);
            assert!(st.error.as_deref().is_some_and(|e| e.contains("process scan")));
        }

        poll_tick(&ok, &h.state).await.expect("tick should succeed");
        assert!(h.state.lock().await.error.is_none(), "banner clears on success");
    }

    #[tokio::test]
    async fn exited_occupant_drops_session_even_with_record() {
        let h = Harness::new();
        h.event("%1", "working");
        let engine = h.events_engine(
            FakeTmuxBackend::new().with_pane(1, "/src/api", false),
            FakeProcessLister::occupied(&[], &[1]),
        );

        poll_tick(&engine, &h.state).await.expect("tick should succeed");

        assert!(h.state.lock().await.sessions.is_empty());
    }

    #[tokio::test]
    async fn finished_work_raises_attention_once() {
        let h = Harness::new();
        let engine = h.events_engine(
            FakeTmuxBackend::new().with_pane(1, "/src/api", false),
            FakeProcessLister::occupied(&[1], &[1]),
        );

        h.event("%1", "working");
        poll_tick(&engine, &h.state).await.expect("tick 1");
        assert_eq!(h.state.lock().await.sessions[0].status, Status::Working);

        h.event("%1", "idle");
        poll_tick(&engine, &h.state).await.expect("tick 2");
        {
            let st = h.state.lock().await;
            assert_eq!(st.sessions[0].status, Status::Unread);
            assert_eq!(st.attention_seq, 1);
        }

        poll_tick(&engine, &h.state).await.expect("tick 3");
        let st = h.state.lock().await;
        assert_eq!(st.sessions[0].status, Status::Unread);
        assert_eq!(st.attention_seq, 1, "no second signal while still unread");
    }

    #[tokio::test]
    async fn focusing_unread_pane_persists_seen_marker() {
        let h = Harness::new();
        let unfocused = h.events_engine(
            FakeTmuxBackend::new().with_pane(1, "/src/api", false),
            FakeProcessLister::occupied(&[1], &[1]),
        );
        h.event("%1", "working");
        poll_tick(&unfocused, &h.state).await.expect("tick 1");
        h.event("%1", "idle");
        poll_tick(&unfocused, &h.state).await.expect("tick 2");
        assert!(!h.state_path.exists(), "nothing to persist yet");

        let focused = h.events_engine(
            FakeTmuxBackend::new().with_pane(1, "/src/api", true),
            FakeProcessLister::occupied(&[1], &[1]),
        );
        poll_tick(&focused, &h.state).await.expect("tick 3");

        let st = h.state.lock().await;
        assert_eq!(st.sessions[0].status, Status::Done);
        assert!(!st.seen.is_dirty());
        assert!(operator_state::load(&h.state_path).is_seen("main:1"));
    }

    #[tokio::test]
    async fn focused_done_pane_flushes_refreshed_marker() {
        let h = Harness::new();
        let engine = h.events_engine(
            FakeTmuxBackend::new().with_pane(1, "/src/api", true),
            FakeProcessLister::occupied(&[1], &[1]),
        );
        h.event("%1", "working");
        poll_tick(&engine, &h.state).await.expect("tick 1");
        h.event("%1", "idle");
        poll_tick(&engine, &h.state).await.expect("tick 2");
        poll_tick(&engine, &h.state).await.expect("tick 3");
        assert_eq!(h.state.lock().await.sessions[0].status, Status::Done);
        let before = operator_state::load(&h.state_path).last_seen["main:1"];

        tokio::time::sleep(Duration::from_millis(5)).await;
        poll_tick(&engine, &h.state).await.expect("tick 4");

        let after = operator_state::load(&h.state_path).last_seen["main:1"];
        assert!(after > before, "refresh reached disk: {before} -> {after}");
        assert!(!h.state.lock().await.seen.is_dirty());
    }

    #[tokio::test]
    async fn operator_mark_seen_turns_unread_into_done() {
        let h = Harness::new();
        let engine = h.events_engine(
            FakeTmuxBackend::new().with_pane(1, "/src/api", false),
            FakeProcessLister::occupied(&[1], &[1]),
        );
        h.event("%1", "working");
        poll_tick(&engine, &h.state).await.expect("tick 1");
        h.event("%1", "idle");
        poll_tick(&engine, &h.state).await.expect("tick 2");

        h.state.lock().await.mark_seen("main:1", Utc::now());
        assert!(operator_state::load(&h.state_path).is_seen("main:1"));

        poll_tick(&engine, &h.state).await.expect("tick 3");
        assert_eq!(h.state.lock().await.sessions[0].status, Status::Done);
    }

    #[tokio::test]
    async fn cleanup_runs_on_every_nth_tick() {
        let h = Harness::new();
        let mut engine = h.events_engine(FakeTmuxBackend::new(), FakeProcessLister::occupied(&[], &[]));
        engine.config.cleanup_every = 2;
        let old = EventRecord::new("%9", "working", Utc::now() - TimeDelta::hours(1));
        h.store.write(&old).expect("write");
        let path = h.store.record_path("%9");

        poll_tick(&engine, &h.state).await.expect("tick 1");
        assert!(path.exists(), "cleanup not due yet");

        poll_tick(&engine, &h.state).await.expect("tick 2");
        assert!(!path.exists(), "stale record removed");
    }

    #[tokio::test]
    async fn pane_text_detection_classifies_capture() {
        let h = Harness::new();
        let backend = Arc::new(
            FakeTmuxBackend::new()
                .with_pane(1, "/src/api", false)
                .with_pane(2, "/src/web", false)
                .with_capture("%1", "output\n\u{2733} Thinking (running) \u{00b7} esc to interrupt\n")
                .with_capture("%2", "done\n\u{276f} \n"),
        );
        let engine = Engine {
            runner: Arc::clone(&backend),
            lister: Arc::new(FakeProcessLister::occupied(&[1, 2], &[1, 2])),
            source: Arc::new(PaneTextSource::new(
                PaneTextCapture(Arc::clone(&backend)),
                ClassifierMarkers::default(),
            )),
            store: None,
            vcs: None,
            config: EngineConfig {
                detection: DetectionKind::PaneText,
                ..EngineConfig::default()
            },
        };

        poll_tick(&engine, &h.state).await.expect("tick should succeed");

        let st = h.state.lock().await;
        let by_id: HashMap<_, _> = st.sessions.iter().map(|s| (s.pane_id(), s.status)).collect();
        assert_eq!(by_id["%1"], Status::Working);
        assert_eq!(by_id["%2"], Status::Idle);
    }

    #[tokio::test]
    async fn vcs_summary_merges_after_tick() {
        let h = Harness::new();
        let mut engine = h.events_engine(
            FakeTmuxBackend::new().with_pane(1, "/src/api", false),
            FakeProcessLister::occupied(&[1], &[1]),
        );
        engine.vcs = Some(Arc::new(VcsCache::with_fetch(Duration::from_secs(60), |_| {
            Some(VcsSummary {
                branch: "main".to_string(),
                added: 3,
                removed: 1,
                dirty: true,
            })
        })));

        poll_tick(&engine, &h.state).await.expect("tick should succeed");

        let mut merged = None;
        for _ in 0..100 {
            {
                let st = h.state.lock().await;
                if let Some(vcs) = st.sessions[0].vcs.clone() {
                    merged = Some((vcs, st.revision));
                    break;
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        let (vcs, revision) = merged.expect("vcs summary should arrive");
        assert_eq!(vcs.branch, "main");
        assert_eq!(revision, 2, "vcs arrival is a visible change");

        // Carried forward across the next cycle without another change.
        poll_tick(&engine, &h.state).await.expect("tick 2");
        let st = h.state.lock().await;
        assert!(st.sessions[0].vcs.is_some());
        assert_eq!(st.revision, 2);
    }

    #[test]
    fn engine_config_from_opts() {
        use clap::Parser;
        let cli = crate::cli::Cli::try_parse_from([
            "paneward",
            "daemon",
            "--detection",
            "pane-text",
            "--done-decay",
            "activity",
            "--idle-debounce",
            "4",
        ])
        .expect("parse");
        let Some(crate::cli::Command::Daemon(opts)) = cli.command else {
            panic!("expected daemon");
        };
        let config = EngineConfig::from_opts(&opts);
        assert_eq!(config.detection, DetectionKind::PaneText);
        assert_eq!(config.policy.idle_debounce, 4);
        assert_eq!(
            config.policy.decay,
            DoneDecay::Activity(TimeDelta::seconds(DEFAULT_DONE_ACTIVITY_SECS))
        );
    }

    #[test]
    fn events_mode_ignores_debounce() {
        use clap::Parser;
        let cli = crate::cli::Cli::try_parse_from(["paneward", "daemon", "--idle-debounce", "5"])
            .expect("parse");
        let Some(crate::cli::Command::Daemon(opts)) = cli.command else {
            panic!("expected daemon");
        };
        let config = EngineConfig::from_opts(&opts);
        assert_eq!(config.policy.idle_debounce, 0);
        assert_eq!(
            config.policy.decay,
            DoneDecay::Timer(TimeDelta::seconds(DEFAULT_DONE_SECS))
        );
    }
}
