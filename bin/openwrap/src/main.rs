mod cmd;
mod config;
mod session;

use clap::{Parser, Subcommand};
use std::future::Future;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[clap(author, version, about = "race header bidding wins against simulated ad servers", long_about = None)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    #[cfg(feature = "dfp")]
    Dfp(cmd::dfp::Command),
    #[cfg(feature = "custom")]
    Custom(cmd::custom::Command),
    Config(cmd::config::Command),
}

fn setup_logging() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn run_task_until_signal(task: impl Future<Output = eyre::Result<()>>) -> eyre::Result<()> {
    setup_logging();

    // impl #[tokio::main]
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("can make runtime")
        .block_on(async move {
            tokio::select! {
                task = task => task,
                _ = signal::ctrl_c() => {
                    tracing::info!("shutting down...");
                    Ok(())
                }
            }
        })
}

fn main() -> eyre::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        #[cfg(feature = "dfp")]
        Commands::Dfp(cmd) => run_task_until_signal(cmd.execute()),
        #[cfg(feature = "custom")]
        Commands::Custom(cmd) => run_task_until_signal(cmd.execute()),
        Commands::Config(cmd) => run_task_until_signal(cmd.execute()),
    }
}
