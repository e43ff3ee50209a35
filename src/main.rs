mod catalog;
mod cli;
mod commands;
mod db;
mod discovery;
mod model;
mod pdf_text;
mod reconcile;
mod segment;
mod similarity;
mod util;

use anyhow::Result;
use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};

fn main() {
    init_tracing();

    if let Err(err) = run() {
        error!(error = %err, "command failed");
        for cause in err.chain().skip(1) {
            error!(cause = %cause, "caused by");
        }
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Extract(args) => commands::extract::run(args),
        Commands::Analyze(args) => commands::analyze::run(args),
        Commands::Generate(args) => commands::generate::run(args),
        Commands::Verify(args) => commands::verify::run(args),
        Commands::Repair(args) => commands::repair::run(args),
        Commands::SyncDb(args) => commands::sync_db::run(args),
        Commands::AuditDb(args) => commands::audit_db::run(args),
        Commands::Status(args) => commands::status::run(args),
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
