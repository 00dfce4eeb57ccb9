use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{}", .0)]
    Custom(String),

    #[error("FlexiLogger::{:?}: {}", .0, .0)]
    FlexiLogger(#[from] flexi_logger::FlexiLoggerError),

    #[error("Config: {}", .0)]
    Config(#[from] setlist_core::config::ConfigError),

    #[error("Metadata: {}", .0)]
    Metadata(#[from] setlist_core::metadata::MetadataError),

    #[error("Token: {}", .0)]
    Token(#[from] setlist_core::tokens::TokenError),

    #[error("Db: {}", .0)]
    Db(#[from] setlist_core::db::DbError),

    #[error("Json: {}", .0)]
    Json(#[from] serde_json::Error),
}
