use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "seriesctl")]
#[command(about = "Track new releases in your Audible series and rank your wishlist")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase output verbosity
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show unowned releases in series from your library
    New {
        /// Marketplace code (uses config default if not specified)
        #[arg(long)]
        marketplace: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Rank your wishlist by rating weighted with review count
    Rank {
        /// Marketplace code (uses config default if not specified)
        #[arg(long)]
        marketplace: Option<String>,

        /// Show only the top N entries
        #[arg(long)]
        limit: Option<usize>,
    },

    /// List supported marketplaces
    Markets,

    /// Create a config file interactively
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },

    /// Store an access token for the configured marketplace
    Login {
        /// Marketplace code (uses config default if not specified)
        #[arg(long)]
        marketplace: Option<String>,
    },

    /// Remove the stored session
    Logout,

    /// Start an interactive shell
    Repl,
}
