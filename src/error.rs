//! Error types for ipa re-signing.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ResignError>;

#[derive(Debug, Error)]
pub enum ResignError {
    #[error(
        "Could not find resign.sh file at {0}. Please try re-installing the package."
    )]
    MissingTool(PathBuf),

    #[error("ipa file could not be found or is not an ipa file ({0})")]
    InvalidArchive(PathBuf),

    #[error(
        "Provisioning profile file could not be found or is not a .mobileprovision file ({0})"
    )]
    InvalidProfile(PathBuf),

    #[error("Couldn't find signing identity '{candidate}' after {attempts} attempt(s)")]
    IdentityNotFound { candidate: String, attempts: u32 },

    #[error("Cancelled: {0}")]
    Cancelled(String),

    #[error("Command execution failed: {0}")]
    CommandExecution(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
}
