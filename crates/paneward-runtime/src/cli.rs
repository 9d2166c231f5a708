//! CLI definition using clap derive.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(
    name = "paneward",
    version,
    about = "Status dashboard for assistant sessions running in tmux"
)]
pub struct Cli {
    /// UDS socket path (default: $XDG_RUNTIME_DIR/paneward/panewardd.sock or /tmp/paneward-$USER/panewardd.sock)
    #[arg(long, short = 's', global = true, env = "PANEWARD_SOCKET")]
    pub socket_path: Option<String>,

    /// Directory for operator state and event records (default: ~/.config/paneward)
    #[arg(long, global = true, env = "PANEWARD_STATE_DIR")]
    pub state_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the poll loop and UDS server
    Daemon(DaemonOpts),
    /// Live session dashboard (default)
    Watch(WatchOpts),
    /// List sessions once
    Ls(LsOpts),
    /// Focus the first session that needs attention
    Jump(JumpOpts),
    /// Open a new tmux window running the monitored program
    New(NewOpts),
    /// Record a lifecycle event (called from the program's hook config)
    Hook(HookOpts),
    /// Install hook entries into the program's settings.json
    SetupHooks(SetupHooksOpts),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DetectionArg {
    /// Lifecycle events written by `paneward hook`
    Events,
    /// Classify the visible pane text
    PaneText,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DecayArg {
    /// Done lasts a fixed time after it is reached
    Timer,
    /// Done lasts while the pane saw recent activity
    Activity,
}

#[derive(clap::Args, Debug, Clone)]
pub struct DaemonOpts {
    /// Poll interval in milliseconds (clamped to 250..=1500)
    #[arg(long, default_value_t = 500)]
    pub poll_interval_ms: u64,

    /// tmux socket path (also PANEWARD_TMUX_SOCKET_PATH / PANEWARD_TMUX_SOCKET_NAME)
    #[arg(long)]
    pub tmux_socket: Option<String>,

    /// Status detection strategy
    #[arg(long, value_enum, default_value_t = DetectionArg::Events)]
    pub detection: DetectionArg,

    /// Command name of the monitored program
    #[arg(long, default_value = "claude")]
    pub program: String,

    /// Run event-store cleanup every N polls
    #[arg(long, default_value_t = 10)]
    pub cleanup_every: u64,

    /// Event records older than this are removed by cleanup
    #[arg(long, default_value_t = 300)]
    pub stale_after_secs: i64,

    /// How Done decays back to Idle
    #[arg(long, value_enum, default_value_t = DecayArg::Timer)]
    pub done_decay: DecayArg,

    /// Done window in seconds (default: 15 for timer, 300 for activity)
    #[arg(long)]
    pub done_secs: Option<i64>,

    /// Consecutive idle samples required after Working (pane-text detection only)
    #[arg(long, default_value_t = 3)]
    pub idle_debounce: u32,

    /// Git stats cache TTL in milliseconds
    #[arg(long, default_value_t = 3000)]
    pub vcs_ttl_ms: u64,
}

impl DaemonOpts {
    pub fn poll_interval_ms(&self) -> u64 {
        self.poll_interval_ms.clamp(250, 1500)
    }
}

#[derive(clap::Args, Debug, Clone)]
pub struct WatchOpts {
    /// How often to ask the daemon for changes, in milliseconds
    #[arg(long, default_value_t = 250)]
    pub interval_ms: u64,

    /// Color output: auto, always, never
    #[arg(long, default_value = "auto")]
    pub color: String,

    /// Do not ring the terminal bell on attention
    #[arg(long)]
    pub no_bell: bool,
}

impl Default for WatchOpts {
    fn default() -> Self {
        Self {
            interval_ms: 250,
            color: "auto".to_string(),
            no_bell: false,
        }
    }
}

#[derive(clap::Args, Debug, Clone)]
pub struct LsOpts {
    /// Color output: auto, always, never
    #[arg(long, default_value = "auto")]
    pub color: String,
}

#[derive(clap::Args, Debug, Clone)]
pub struct JumpOpts {
    /// Print the target instead of switching to it
    #[arg(long)]
    pub dry_run: bool,

    /// tmux socket path
    #[arg(long)]
    pub tmux_socket: Option<String>,
}

#[derive(clap::Args, Debug, Clone)]
pub struct NewOpts {
    /// Window name
    #[arg(long, short = 'n')]
    pub name: Option<String>,

    /// Working directory for the new window
    #[arg(long, short = 'd')]
    pub dir: Option<String>,

    /// Program to start in the window
    #[arg(long, default_value = "claude")]
    pub program: String,

    /// tmux socket path
    #[arg(long)]
    pub tmux_socket: Option<String>,
}

#[derive(clap::Args, Debug, Clone)]
pub struct HookOpts {
    /// Event token: prompt-submit, stop, notification, permission-request, post-tool-use, session-end
    pub event: String,

    /// An idle event this soon after a paused event is ignored
    #[arg(long, default_value_t = 10, env = "PANEWARD_SUPPRESS_IDLE_SECS")]
    pub suppress_idle_secs: i64,
}

#[derive(clap::Args, Debug, Clone)]
pub struct SetupHooksOpts {
    /// Settings scope: "user" (~/.claude/settings.json) or "project" (.claude/settings.json)
    #[arg(long, default_value = "user")]
    pub scope: String,

    /// Only report whether hooks are installed
    #[arg(long)]
    pub check: bool,
}

/// Default socket path using $USER for per-user isolation.
pub fn default_socket_path() -> String {
    if let Ok(dir) = std::env::var("XDG_RUNTIME_DIR") {
        return format!("{dir}/paneward/panewardd.sock");
    }
    let user = std::env::var("USER").unwrap_or_else(|_| "unknown".to_string());
    format!("/tmp/paneward-{user}/panewardd.sock")
}

pub fn default_state_dir() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".config").join("paneward")
}
