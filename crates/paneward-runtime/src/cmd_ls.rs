//! `paneward ls`: one-shot session listing, grouped by working directory.

use chrono::{DateTime, Utc};
use paneward_core::PaneSession;

use crate::client;
use crate::context::{dim, paint_status, relative_time, short_path};
use crate::server::SessionList;

/// Entry point for `paneward ls`.
pub async fn cmd_ls(socket_path: &str, use_color: bool) -> anyhow::Result<()> {
    let list = client::list_sessions(socket_path).await?;
    println!("{}", format_sessions(&list, use_color, Utc::now()));
    Ok(())
}

/// Render the session list. Sessions arrive sorted by working directory, so
/// grouping only has to watch for the directory changing.
pub(crate) fn format_sessions(list: &SessionList, use_color: bool, now: DateTime<Utc>) -> String {
    let mut lines = Vec::new();

    if let Some(err) = &list.error {
        let banner = format!("! {err}");
        lines.push(if use_color {
            format!("\x1b[1;31m{banner}\x1b[0m")
        } else {
            banner
        });
    }

    if list.sessions.is_empty() {
        lines.push(dim("(no sessions)", use_color));
        return lines.join("\n");
    }

    let target_width = list
        .sessions
        .iter()
        .map(|s| s.target().len())
        .max()
        .unwrap_or(0);

    let mut current_dir: Option<&str> = None;
    for session in &list.sessions {
        let dir = session.pane.working_dir.as_str();
        if current_dir != Some(dir) {
            if current_dir.is_some() {
                lines.push(String::new());
            }
            lines.push(group_header(session));
            current_dir = Some(dir);
        }
        lines.push(session_line(session, target_width, use_color, now));
    }

    lines.join("\n")
}

fn group_header(session: &PaneSession) -> String {
    let path = short_path(&session.pane.working_dir);
    match &session.vcs {
        Some(vcs) if vcs.dirty => format!(
            "{path}  ({} +{} -{})",
            vcs.branch, vcs.added, vcs.removed
        ),
        Some(vcs) => format!("{path}  ({})", vcs.branch),
        None => path,
    }
}

fn session_line(
    session: &PaneSession,
    target_width: usize,
    use_color: bool,
    now: DateTime<Utc>,
) -> String {
    let marker = if session.status.needs_attention() {
        "*"
    } else {
        " "
    };
    let age = relative_time((now - session.pane.last_activity).num_seconds());
    format!(
        "{marker} {:<target_width$}  {:<12} {}  {}",
        session.target(),
        session.pane.window_name,
        paint_status(session.status, use_color),
        dim(&age, use_color),
    )
}
