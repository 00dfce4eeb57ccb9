// Import and re-export the `error` module
pub use self::error::{Error, Result};
mod error;

use std::sync::Arc;

use clap::Parser;
use cli::{Cli, Commands, TokenCommands};
use setlist_core::audit::PgAuditSink;
use setlist_core::config::SetlistConfig;
use setlist_core::db;
use setlist_core::metadata::orchestrator::MetadataOrchestrator;
use setlist_core::metadata::platform;
use setlist_core::tokens::{PgTokenStore, TokenManager};
use setlist_core::users::pg::PgUserDirectory;

mod cli;
mod logging;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Cli::parse();
    logging::init(args.verbose)?;

    match args.command {
        Commands::Version => {
            println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
        }
        Commands::Detect { url } => match platform::detect(&url) {
            Some(platform) => println!("{platform}"),
            None => return Err(Error::Custom(format!("unsupported platform: {url}"))),
        },
        Commands::Fetch {
            url,
            track_type,
            bandcamp_mode,
        } => {
            let mut config = SetlistConfig::from_env()?;
            if let Some(mode) = bandcamp_mode {
                config.bandcamp_mode = mode;
            }
            let orchestrator = MetadataOrchestrator::from_config(&config)?;
            let record = orchestrator.fetch(&url, &track_type).await?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        Commands::Migrate => {
            let config = SetlistConfig::from_env()?;
            let pool = db::connect(&config.database_url).await?;
            db::migrate(&pool).await?;
        }
        Commands::Token { command } => {
            let config = SetlistConfig::from_env()?;
            let manager = token_manager(&config).await?;
            run_token(&manager, command).await?;
        }
    }

    Ok(())
}

async fn token_manager(config: &SetlistConfig) -> Result<TokenManager> {
    let pool = db::connect(&config.database_url).await?;
    Ok(TokenManager::new(
        Arc::new(PgTokenStore::new(pool.clone())),
        Arc::new(PgUserDirectory::new(pool.clone())),
        Arc::new(PgAuditSink::new(pool)),
    ))
}

async fn run_token(manager: &TokenManager, command: TokenCommands) -> Result<()> {
    match command {
        TokenCommands::Issue {
            user_id,
            purpose,
            reissue,
        } => {
            let token = if reissue {
                manager.reissue(&user_id, purpose).await?
            } else {
                manager.issue(&user_id, purpose).await?
            };
            println!("{}", serde_json::to_string_pretty(&token)?);
        }
        TokenCommands::Find { user_id, purpose } => {
            let token = manager.find_active(&user_id, purpose).await?;
            println!("{}", serde_json::to_string_pretty(&token)?);
        }
        TokenCommands::Redeem {
            user_id,
            token,
            purpose,
        } => {
            let value = uuid::Uuid::parse_str(token.trim())
                .map_err(|e| Error::Custom(format!("invalid token {token:?}: {e}")))?;
            let spent = manager.redeem(value, &user_id, purpose).await?;
            println!("{}", serde_json::to_string_pretty(&spent)?);
        }
    }
    Ok(())
}
