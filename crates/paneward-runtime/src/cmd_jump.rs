//! `paneward jump`: focus the first session that needs attention.

use paneward_core::PaneSession;
use paneward_tmux::focus_window;

use crate::cli::JumpOpts;
use crate::client;
use crate::poll_loop::build_executor;

/// First session in list order that is Paused, Unread or Done.
pub(crate) fn pick_attention(sessions: &[PaneSession]) -> Option<&PaneSession> {
    sessions.iter().find(|s| s.status.needs_attention())
}

/// Entry point for `paneward jump`.
pub async fn cmd_jump(socket_path: &str, opts: &JumpOpts) -> anyhow::Result<()> {
    let list = client::list_sessions(socket_path).await?;
    let Some(session) = pick_attention(&list.sessions) else {
        println!("nothing needs attention");
        return Ok(());
    };
    let target = session.target();

    if opts.dry_run {
        println!("{target}");
        return Ok(());
    }

    let executor = build_executor(opts.tmux_socket.as_deref());
    let group = session.pane.group.clone();
    let index = session.pane.group_index;
    tokio::task::spawn_blocking(move || focus_window(&executor, &group, index)).await??;

    client::mark_seen(socket_path, &target).await?;
    Ok(())
}
