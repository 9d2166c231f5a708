//! list-panes format string and parser.

use chrono::{DateTime, Utc};
use paneward_core::PaneInfo;

use crate::error::TmuxError;
use crate::executor::TmuxCommandRunner;

/// Tab-delimited format string for `tmux list-panes -a -F`.
pub const LIST_PANES_FORMAT: &str = "#{session_name}\t#{window_index}\t#{window_id}\t#{window_name}\t#{pane_id}\t#{pane_pid}\t#{pane_current_path}\t#{window_activity}\t#{window_active}";

const FIELD_COUNT: usize = 9;

/// List every pane on the server.
///
/// Only a failed `tmux` invocation is an error. Individual lines that do
/// not parse are logged and skipped.
pub fn list_panes(runner: &impl TmuxCommandRunner) -> Result<Vec<PaneInfo>, TmuxError> {
    let output = runner.run(&["list-panes", "-a", "-F", LIST_PANES_FORMAT])?;
    Ok(parse_list_panes_output(&output))
}

pub fn parse_list_panes_output(output: &str) -> Vec<PaneInfo> {
    output
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .filter_map(|(idx, line)| match parse_line(line, idx + 1) {
            Ok(pane) => Some(pane),
            Err(e) => {
                tracing::warn!(error = %e, "skipping list-panes line");
                None
            }
        })
        .collect()
}

fn parse_line(line: &str, line_num: usize) -> Result<PaneInfo, TmuxError> {
    let parts: Vec<&str> = line.split('\t').collect();
    if parts.len() < FIELD_COUNT {
        return Err(TmuxError::ParseError {
            line_num,
            detail: format!(
                "expected {FIELD_COUNT} tab-separated fields, got {}",
                parts.len()
            ),
        });
    }

    let group_index = parts[1].trim().parse::<u32>().map_err(|e| TmuxError::ParseError {
        line_num,
        detail: format!("window_index {:?}: {e}", parts[1]),
    })?;
    let root_pid = parts[5].trim().parse::<u32>().ok().filter(|&p| p > 0);
    let last_activity = parts[7]
        .trim()
        .parse::<i64>()
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);

    Ok(PaneInfo {
        group: parts[0].to_string(),
        group_index,
        window_id: parts[2].to_string(),
        window_name: parts[3].to_string(),
        pane_id: parts[4].to_string(),
        root_pid,
        working_dir: parts[6].to_string(),
        last_activity,
        is_focused: parts[8].trim() == "1",
    })
}
