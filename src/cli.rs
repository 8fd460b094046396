//! Command-line interface for strictly_matches.

use clap::{Parser, Subcommand};

/// Strictly Matches - Tic-tac-toe match server with realtime updates
#[derive(Parser, Debug)]
#[command(name = "strictly_matches")]
#[command(about = "Tic-tac-toe match server with an automated opponent", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP and websocket match server
    Serve {
        /// Path to a TOML config file
        #[arg(short, long)]
        config: Option<std::path::PathBuf>,

        /// Host to bind to (overrides config and HOST)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (overrides config and PORT)
        #[arg(short, long)]
        port: Option<u16>,

        /// SQLite database file (created if it doesn't exist)
        #[arg(long)]
        db_path: Option<String>,

        /// Delay before the automated opponent answers, in milliseconds
        #[arg(long)]
        ai_delay_ms: Option<u64>,
    },

    /// Create a match
    Create {
        /// Match server URL
        #[arg(long, default_value = "http://127.0.0.1:5000")]
        server_url: String,

        /// Your player label
        #[arg(long)]
        player: String,

        /// Play against the automated opponent
        #[arg(long)]
        vs_ai: bool,
    },

    /// Join a match as the second participant
    Join {
        /// Match server URL
        #[arg(long, default_value = "http://127.0.0.1:5000")]
        server_url: String,

        /// Match to join
        #[arg(long)]
        match_id: String,

        /// Your player label
        #[arg(long)]
        player: String,
    },

    /// List matches waiting for an opponent
    Open {
        /// Match server URL
        #[arg(long, default_value = "http://127.0.0.1:5000")]
        server_url: String,
    },

    /// Print the current state of a match
    State {
        /// Match server URL
        #[arg(long, default_value = "http://127.0.0.1:5000")]
        server_url: String,

        /// Match to show
        #[arg(long)]
        match_id: String,
    },

    /// Place your mark on a square (0 top-left to 8 bottom-right)
    Move {
        /// Match server URL
        #[arg(long, default_value = "http://127.0.0.1:5000")]
        server_url: String,

        /// Match to play in
        #[arg(long)]
        match_id: String,

        /// Your player label
        #[arg(long)]
        player: String,

        /// Square index
        #[arg(long, allow_negative_numbers = true)]
        cell: i64,
    },

    /// Follow a match until it concludes
    Watch {
        /// Match server URL
        #[arg(long, default_value = "http://127.0.0.1:5000")]
        server_url: String,

        /// Match to follow
        #[arg(long)]
        match_id: String,

        /// Polling interval in milliseconds
        #[arg(long, default_value = "500")]
        interval_ms: u64,
    },
}
