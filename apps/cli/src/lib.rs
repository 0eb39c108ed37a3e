pub mod cli;
pub mod collection;
pub mod commands;
pub mod config;
pub mod error;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::CliArgs;
use crate::config::Settings;

pub fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let args = CliArgs::parse();

    let filter = if args.global.verbose {
        "debug".to_string()
    } else {
        std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into())
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(filter))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let settings = Settings::resolve(&args.global).context("failed to load settings")?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    commands::dispatch(args.command, &settings, &mut out)?;
    Ok(())
}
