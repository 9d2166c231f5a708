//! Merging a fresh poll result into the previous session list.

use std::collections::HashMap;

use crate::types::{PaneSession, VcsSummary};

/// Carry VCS data forward by pane id, then sort by working directory.
///
/// VCS summaries are refreshed on their own schedule, so a fresh poll
/// result starts without them.
pub fn carry_forward(previous: &[PaneSession], mut next: Vec<PaneSession>) -> Vec<PaneSession> {
    let vcs: HashMap<&str, &VcsSummary> = previous
        .iter()
        .filter_map(|s| s.vcs.as_ref().map(|v| (s.pane_id(), v)))
        .collect();
    for session in &mut next {
        if session.vcs.is_none() {
            session.vcs = vcs.get(session.pane_id()).map(|v| (*v).clone());
        }
    }
    // Stable: panes sharing a directory keep listing order.
    next.sort_by(|a, b| a.pane.working_dir.cmp(&b.pane.working_dir));
    next
}

/// Whether the visible list differs, by content rather than identity.
pub fn has_changed(previous: &[PaneSession], next: &[PaneSession]) -> bool {
    previous.len() != next.len()
        || previous
            .iter()
            .zip(next)
            .any(|(a, b)| a.fingerprint() != b.fingerprint())
}

/// Apply an out-of-band VCS result. Returns `false` (dropping the result)
/// when the pane is no longer listed or the summary is unchanged.
pub fn apply_vcs(sessions: &mut [PaneSession], pane_id: &str, summary: VcsSummary) -> bool {
    match sessions.iter_mut().find(|s| s.pane_id() == pane_id) {
        Some(session) if session.vcs.as_ref() != Some(&summary) => {
            session.vcs = Some(summary);
            true
        }
        _ => false,
    }
}
