use thiserror::Error;

#[derive(Error, Debug)]
pub enum SabotageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Parse error at line {line}, column {column}: {message}")]
    Parse {
        line: usize,
        column: usize,
        message: String,
    },

    #[error("Printer failed: {0}")]
    Print(String),

    #[error("Grammar error: {0}")]
    Language(#[from] tree_sitter::LanguageError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("An edit is already being applied")]
    Reentrant,

    #[error("Sampling error: {0}")]
    Sampling(#[from] rand::distributions::WeightedError),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    #[error("Walkdir error: {0}")]
    Walkdir(#[from] walkdir::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, SabotageError>;
