//! Pane capture, focus and window spawning.

use paneward_source_poller::PaneTextReader;

use crate::error::TmuxError;
use crate::executor::TmuxCommandRunner;

/// Title the dashboard gives its own pane so focusing skips it.
pub const DASHBOARD_PANE_TITLE: &str = "paneward-dashboard";

/// Visible text of a pane, trailing blank lines removed.
pub fn capture_visible(runner: &impl TmuxCommandRunner, pane_id: &str) -> Result<String, TmuxError> {
    let out = runner.run(&["capture-pane", "-p", "-t", pane_id])?;
    Ok(out.trim_end_matches(['\n', ' ']).to_string())
}

/// Switch to `group:index`, then focus the first pane in it that is not the
/// dashboard. Pane focus is best-effort once the window switch succeeded.
pub fn focus_window(
    runner: &impl TmuxCommandRunner,
    group: &str,
    group_index: u32,
) -> Result<(), TmuxError> {
    let target = format!("{group}:{group_index}");
    runner.run(&["select-window", "-t", &target])?;

    let listing = match runner.run(&["list-panes", "-t", &target, "-F", "#{pane_id}\t#{pane_title}"]) {
        Ok(out) => out,
        Err(e) => {
            tracing::debug!(window = %target, error = %e, "pane listing for focus failed");
            return Ok(());
        }
    };
    let pane = listing
        .lines()
        .filter_map(|l| l.split_once('\t'))
        .find(|(_, title)| *title != DASHBOARD_PANE_TITLE)
        .map(|(id, _)| id);
    if let Some(pane_id) = pane
        && let Err(e) = runner.run(&["select-pane", "-t", pane_id])
    {
        tracing::debug!(pane_id, error = %e, "select-pane failed");
    }
    Ok(())
}

/// Open a new window running `program`. Empty name/dir use tmux defaults.
pub fn spawn_window(
    runner: &impl TmuxCommandRunner,
    name: Option<&str>,
    dir: Option<&str>,
    program: &str,
) -> Result<(), TmuxError> {
    let mut args = vec!["new-window"];
    if let Some(name) = name.filter(|n| !n.is_empty()) {
        args.extend(["-n", name]);
    }
    if let Some(dir) = dir.filter(|d| !d.is_empty()) {
        args.extend(["-c", dir]);
    }
    args.push(program);
    runner.run(&args).map(|_| ())
}

pub fn set_pane_title(
    runner: &impl TmuxCommandRunner,
    pane_id: &str,
    title: &str,
) -> Result<(), TmuxError> {
    runner.run(&["select-pane", "-t", pane_id, "-T", title]).map(|_| ())
}

/// Adapts a command runner to the pane-text detection source.
pub struct PaneTextCapture<R>(pub R);

impl<R: TmuxCommandRunner> PaneTextReader for PaneTextCapture<R> {
    type Error = TmuxError;

    fn capture_visible(&self, pane_id: &str) -> Result<String, TmuxError> {
        capture_visible(&self.0, pane_id)
    }
}
