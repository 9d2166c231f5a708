//! `paneward new`: open a window running the monitored program.

use paneward_tmux::spawn_window;

use crate::cli::NewOpts;
use crate::poll_loop::build_executor;

pub async fn cmd_new(opts: NewOpts) -> anyhow::Result<()> {
    let executor = build_executor(opts.tmux_socket.as_deref());
    tokio::task::spawn_blocking(move || {
        spawn_window(
            &executor,
            opts.name.as_deref(),
            opts.dir.as_deref(),
            &opts.program,
        )
    })
    .await??;
    Ok(())
}
