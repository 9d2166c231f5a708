use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ─── Status ───────────────────────────────────────────────────────

/// User-facing status of a monitored session.
///
/// Detection only ever produces `Working`, `Paused`, `Idle`, `Error`,
/// `Exited` and `Unknown`. `Unread` and `Done` are manufactured by the
/// refinement state machine.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    #[default]
    Unknown,
    /// Actively processing.
    Working,
    /// Waiting on the operator (permission prompt, question).
    Paused,
    /// At the prompt, nothing new to look at.
    Idle,
    /// Finished since the operator last looked.
    Unread,
    /// Finished and seen; decays back to `Idle`.
    Done,
    Error,
    Exited,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "Unknown",
            Self::Working => "Working",
            Self::Paused => "Paused",
            Self::Idle => "Idle",
            Self::Unread => "Unread",
            Self::Done => "Done",
            Self::Error => "Error",
            Self::Exited => "Exited",
        }
    }

    /// Short label for the dashboard.
    pub fn label(self) -> &'static str {
        match self {
            Self::Working => "Working\u{2026}",
            Self::Unknown => "?",
            other => other.as_str(),
        }
    }

    /// Whether the operator should look at this session.
    pub fn needs_attention(self) -> bool {
        matches!(self, Self::Paused | Self::Unread | Self::Done)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Pane listing ─────────────────────────────────────────────────

/// One pane as reported by the multiplexer, before any detection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaneInfo {
    /// Owning group (tmux session name).
    pub group: String,
    /// Window index within the group.
    pub group_index: u32,
    pub window_id: String,
    pub window_name: String,
    /// Stable for the pane's lifetime (tmux `%N`).
    pub pane_id: String,
    /// PID of the pane's root process (usually a shell).
    pub root_pid: Option<u32>,
    pub working_dir: String,
    pub last_activity: DateTime<Utc>,
    /// Whether this pane's window is the active one in its group.
    pub is_focused: bool,
}

impl PaneInfo {
    /// Multiplexer target string, `group:index`.
    pub fn target(&self) -> String {
        format!("{}:{}", self.group, self.group_index)
    }
}

// ─── Sessions ─────────────────────────────────────────────────────

/// Version-control summary for a session's working directory.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VcsSummary {
    pub branch: String,
    pub added: u32,
    pub removed: u32,
    pub dirty: bool,
}

/// A pane believed to host the monitored program.
///
/// Re-derived on every poll. Only VCS data (slower cadence) and the
/// refined status are carried across polls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaneSession {
    #[serde(flatten)]
    pub pane: PaneInfo,
    pub occupant_pid: Option<u32>,
    pub is_occupied: bool,
    pub status: Status,
    pub vcs: Option<VcsSummary>,
}

impl PaneSession {
    pub fn new(pane: PaneInfo) -> Self {
        Self {
            pane,
            occupant_pid: None,
            is_occupied: false,
            status: Status::Unknown,
            vcs: None,
        }
    }

    pub fn pane_id(&self) -> &str {
        &self.pane.pane_id
    }

    pub fn target(&self) -> String {
        self.pane.target()
    }

    /// Last segment of the working directory, else the window name.
    pub fn title(&self) -> &str {
        self.pane
            .working_dir
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .filter(|s| !s.is_empty())
            .unwrap_or(&self.pane.window_name)
    }

    /// Comparable content key used to suppress no-op redraws.
    pub fn fingerprint(&self) -> String {
        let (branch, added, removed) = self
            .vcs
            .as_ref()
            .map_or(("", 0, 0), |v| (v.branch.as_str(), v.added, v.removed));
        format!(
            "{}:{}:{}:{}:{}:{}:{}:{}",
            self.pane.pane_id,
            self.pane.group,
            self.pane.group_index,
            self.status,
            self.pane.last_activity.timestamp(),
            branch,
            added,
            removed
        )
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use chrono::TimeZone;

    pub fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0)
            .single()
            .expect("valid datetime")
    }

    pub fn pane(pane_id: &str, root_pid: u32) -> PaneInfo {
        PaneInfo {
            group: "main".to_string(),
            group_index: 1,
            window_id: "@1".to_string(),
            window_name: "dev".to_string(),
            pane_id: pane_id.to_string(),
            root_pid: Some(root_pid),
            working_dir: "/home/me/src/paneward".to_string(),
            last_activity: t0(),
            is_focused: false,
        }
    }

    pub fn session(pane_id: &str, status: Status) -> PaneSession {
        let mut s = PaneSession::new(pane(pane_id, 100));
        s.is_occupied = true;
        s.occupant_pid = Some(101);
        s.status = status;
        s
    }
}
