//! paneward: status dashboard for assistant sessions running in tmux.
//! One binary: the polling daemon, its clients and the hook entry point.

use clap::Parser;

mod cli;
mod client;
mod cmd_hook;
mod cmd_jump;
mod cmd_ls;
mod cmd_new;
mod cmd_watch;
mod context;
mod git_stats;
mod operator_state;
mod poll_loop;
mod server;
mod setup_hooks;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();

    let socket_path = args.socket_path.unwrap_or_else(cli::default_socket_path);
    let state_dir = args.state_dir.unwrap_or_else(cli::default_state_dir);
    let command = args
        .command
        .unwrap_or_else(|| cli::Command::Watch(cli::WatchOpts::default()));

    match command {
        cli::Command::Daemon(opts) => {
            let filter = std::env::var("PANEWARD_LOG")
                .or_else(|_| std::env::var("RUST_LOG"))
                .unwrap_or_else(|_| "info".to_string());
            tracing_subscriber::fmt()
                .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
                .with_writer(std::io::stderr)
                .init();

            tracing::info!("paneward daemon starting");

            poll_loop::run_daemon(opts, &socket_path, &state_dir).await?;
        }
        cli::Command::Watch(opts) => {
            cmd_watch::cmd_watch(&socket_path, &opts).await?;
        }
        cli::Command::Ls(opts) => {
            let use_color = context::resolve_color(&opts.color);
            cmd_ls::cmd_ls(&socket_path, use_color).await?;
        }
        cli::Command::Jump(opts) => {
            cmd_jump::cmd_jump(&socket_path, &opts).await?;
        }
        cli::Command::New(opts) => {
            cmd_new::cmd_new(opts).await?;
        }
        cli::Command::Hook(opts) => {
            cmd_hook::cmd_hook(&opts, &state_dir);
        }
        cli::Command::SetupHooks(opts) => {
            let (path, installed) = setup_hooks::run(&opts)?;
            match (opts.check, installed) {
                (false, _) => println!("hooks written to {}", path.display()),
                (true, true) => println!("hooks installed in {}", path.display()),
                (true, false) => {
                    println!("hooks missing from {}", path.display());
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}
