use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CheckError {
    #[error("File '{}' not found", .0.display())]
    NotFound(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("no header row found")]
    MissingHeader,

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl CheckError {
    /// Message printed to the console when an operation gives up on a file.
    pub fn user_message(&self) -> String {
        match self {
            CheckError::NotFound(_) => self.to_string(),
            other => format!("Error reading file: {}", other),
        }
    }
}

pub type Result<T> = std::result::Result<T, CheckError>;
