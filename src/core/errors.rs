use thiserror::Error;

#[derive(Error, Debug)]
pub enum TankyuError {
    #[error("I/O error: {0}")]
    Io(Box<std::io::Error>),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Reqwest error: {0}")]
    Reqwest(Box<reqwest::Error>),

    #[error("Fragment search failed: {0}")]
    Search(String),

    #[error("No fragments found for '{query}'")]
    NoFragments { query: String },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Stored word {id} is corrupt: {reason}")]
    CorruptRecord { id: u64, reason: String },

    #[error("Quiz engine is busy with another request")]
    Busy,

    #[error("TankyuError: {0}")]
    Custom(String),
}

impl From<std::io::Error> for TankyuError {
    fn from(error: std::io::Error) -> Self {
        TankyuError::Io(Box::new(error))
    }
}

impl From<reqwest::Error> for TankyuError {
    fn from(error: reqwest::Error) -> Self {
        TankyuError::Reqwest(Box::new(error))
    }
}
