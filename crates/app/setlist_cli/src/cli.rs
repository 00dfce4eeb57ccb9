use clap::{Parser, Subcommand};
use setlist_core::metadata::bandcamp::BandcampMode;
use setlist_core::tokens::TokenPurpose;

#[derive(Parser, Debug)]
#[command(name = "setlist", version, about = "Setlist operator tool", long_about = None)]
pub struct Cli {
    /// Log at debug level (RUST_LOG still wins)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print version
    Version,

    /// Print which metadata provider a URL belongs to
    Detect { url: String },

    /// Fetch track metadata for a streaming URL and print it as JSON
    Fetch {
        url: String,

        /// track, mix or sample (YouTube links only)
        #[arg(long, default_value = "track")]
        track_type: String,

        /// Override BANDCAMP_MODE: json-ld, browser or auto
        #[arg(long)]
        bandcamp_mode: Option<BandcampMode>,
    },

    /// Apply database migrations
    Migrate,

    /// Manage one-time tokens
    Token {
        #[command(subcommand)]
        command: TokenCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum TokenCommands {
    /// Create a token for a user
    Issue {
        user_id: String,

        /// auth, reset_password or collab_playlist
        #[arg(long)]
        purpose: TokenPurpose,

        /// Deactivate the user's outstanding tokens for the purpose first
        #[arg(long)]
        reissue: bool,
    },

    /// Show the active token for a user and purpose
    Find {
        user_id: String,

        #[arg(long)]
        purpose: TokenPurpose,
    },

    /// Spend a token
    Redeem {
        user_id: String,
        token: String,

        #[arg(long)]
        purpose: TokenPurpose,
    },
}
