//! Per-poll raw status resolution.
//!
//! Liveness comes from the process table; everything past liveness is
//! delegated to a single [`StatusSource`].

use std::collections::HashMap;

use crate::process::ProcessTable;
use crate::source::StatusSource;
use crate::types::{PaneInfo, PaneSession, Status};

/// Resolve the raw status of every pane against one process table snapshot.
///
/// Panes whose occupant cannot be found come back with `is_occupied ==
/// false` and `Exited`; the caller decides whether to keep them. The source
/// is consulted once, with only the panes that have a live occupant.
pub fn resolve_panes(
    panes: Vec<PaneInfo>,
    table: &ProcessTable,
    program: &str,
    source: &dyn StatusSource,
) -> Vec<PaneSession> {
    let mut sessions: Vec<PaneSession> = panes
        .into_iter()
        .map(|pane| {
            let occupant = pane
                .root_pid
                .and_then(|root| table.find_monitored_descendant(root, program));
            let mut session = PaneSession::new(pane);
            session.occupant_pid = occupant;
            session.is_occupied = occupant.is_some();
            session.status = Status::Exited;
            session
        })
        .collect();

    let live: Vec<&str> = sessions
        .iter()
        .filter(|s| s.occupant_pid.is_some_and(|pid| table.is_alive(pid)))
        .map(PaneSession::pane_id)
        .collect();
    if live.is_empty() {
        return sessions;
    }

    let observed: HashMap<String, Status> = source.observe(&live);
    for session in &mut sessions {
        if !session.occupant_pid.is_some_and(|pid| table.is_alive(pid)) {
            continue;
        }
        session.status = observed
            .get(session.pane_id())
            .copied()
            .unwrap_or(Status::Unknown);
    }
    sessions
}


#[cfg(test)]
mod tests {
    use super::fakes::FixedSource;
    use super::*;
    use crate::process::table;
    use crate::types::fixtures::pane;
    use proptest::prelude::*;

    #[test]
    fn unoccupied_pane_is_exited_and_not_asked() {
        let t = table(&[(100, 1, "zsh")]);
        let source = FixedSource::with(&[("%1", Status::Working)]);
        let out = resolve_panes(vec![pane("%1", 100)], &t, "claude", &source);
        assert_eq!(out.len(), 1);
        assert!(!out[0].is_occupied);
        assert_eq!(out[0].status, Status::Exited);
        assert!(source.asked.lock().expect("lock").is_empty());
    }

    #[test]
    fn occupied_pane_takes_source_status() {
        let t = table(&[(100, 1, "zsh"), (101, 100, "claude")]);
        let source = FixedSource::with(&[("%1", Status::Paused)]);
        let out = resolve_panes(vec![pane("%1", 100)], &t, "claude", &source);
        assert!(out[0].is_occupied);
        assert_eq!(out[0].occupant_pid, Some(101));
        assert_eq!(out[0].status, Status::Paused);
    }

    #[test]
    fn missing_observation_is_unknown() {
        let t = table(&[(100, 1, "zsh"), (101, 100, "claude")]);
        let source = FixedSource::default();
        let out = resolve_panes(vec![pane("%1", 100)], &t, "claude", &source);
        assert_eq!(out[0].status, Status::Unknown);
    }

    #[test]
    fn pane_without_root_pid_is_exited() {
        let t = table(&[(101, 1, "claude")]);
        let mut p = pane("%1", 0);
        p.root_pid = None;
        let out = resolve_panes(vec![p], &t, "claude", &FixedSource::default());
        assert_eq!(out[0].status, Status::Exited);
        assert!(!out[0].is_occupied);
    }

    #[test]
    fn source_is_called_once_per_poll() {
        let t = table(&[
            (100, 1, "zsh"),
            (101, 100, "claude"),
            (200, 1, "zsh"),
            (201, 200, "claude"),
            (300, 1, "zsh"),
        ]);
        let source = FixedSource::with(&[("%1", Status::Working), ("%2", Status::Idle)]);
        let out = resolve_panes(
            vec![pane("%1", 100), pane("%2", 200), pane("%3", 300)],
            &t,
            "claude",
            &source,
        );
        let asked = source.asked.lock().expect("lock");
        assert_eq!(asked.len(), 1);
        assert_eq!(asked[0], vec!["%1".to_string(), "%2".to_string()]);
        assert_eq!(out[2].status, Status::Exited);
    }

    proptest! {
        #[test]
        fn absent_occupant_is_always_exited(
            raw in prop::sample::select(vec![
                Status::Working, Status::Paused, Status::Idle,
                Status::Error, Status::Unknown,
            ]),
            root in 1u32..500,
            has_shell in any::<bool>(),
        ) {
            let entries: Vec<(u32, u32, &str)> =
                if has_shell { vec![(root, 1, "zsh")] } else { vec![] };
            let t = table(&entries);
            let source = FixedSource::with(&[("%9", raw)]);
            let out = resolve_panes(vec![pane("%9", root)], &t, "claude", &source);
            prop_assert_eq!(out[0].status, Status::Exited);
        }
    }
}
