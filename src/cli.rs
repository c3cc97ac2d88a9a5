//! Command-line interface for tictac_promo.

use clap::{Parser, Subcommand};

/// Tic-tac-toe promo server
#[derive(Parser, Debug)]
#[command(name = "tictac_promo")]
#[command(about = "Tic-tac-toe game server with Telegram promo code redemption", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Optional TOML config file; environment variables override it
    #[arg(short, long, global = true)]
    pub config: Option<std::path::PathBuf>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP server and the Telegram polling loop
    Serve {
        /// Port to bind to (overrides PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Add promo codes to the pool, one per line
    Seed {
        /// File with codes; blank lines are skipped
        #[arg(short, long)]
        file: std::path::PathBuf,
    },

    /// Show pool usage
    Stats,
}
