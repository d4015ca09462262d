use anyhow::{anyhow, Context, Result};
use clap::Parser;
use marketplace_index::command::CommandShell;
use marketplace_index::{Marketplace, MarketplaceConfig, FIRST_LISTING_ID};
use std::io::{self, BufRead, IsTerminal, Write};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Interactive marketplace shell. Reads one command per line from stdin.
#[derive(Debug, Parser)]
#[command(name = "marketplace", version, about)]
struct Args {
    /// Id assigned to the first listing created in this session
    #[arg(long, default_value_t = FIRST_LISTING_ID)]
    first_listing_id: u64,

    /// Enable debug logging (unless RUST_LOG is set)
    #[arg(long)]
    debug: bool,
}

/// Logs go to stderr so stdout only carries command responses.
fn init_tracing(debug: bool) -> Result<()> {
    let default_level = if debug { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(debug)
        .with_writer(io::stderr)
        .compact()
        .try_init()
        .map_err(|err| anyhow!(err))
}

/// The `# ` prompt is only shown to a human at a terminal.
fn prompt(out: &mut impl Write, interactive: bool) -> io::Result<()> {
    if interactive {
        write!(out, "# ")?;
        out.flush()?;
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.debug)?;

    let config = MarketplaceConfig {
        first_listing_id: args.first_listing_id,
    };
    let shell = CommandShell::new(Arc::new(Marketplace::with_config(&config)));
    info!(first_listing_id = config.first_listing_id, "marketplace ready");

    let interactive = io::stdin().is_terminal();
    let mut stdout = io::stdout().lock();

    prompt(&mut stdout, interactive)?;
    for line in io::stdin().lock().lines() {
        let line = line.context("failed to read command from stdin")?;
        if let Some(response) = shell.execute_line(&line) {
            writeln!(stdout, "{response}")?;
        }
        prompt(&mut stdout, interactive)?;
    }

    Ok(())
}
