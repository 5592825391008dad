use thiserror::Error;

pub type Result<T> = std::result::Result<T, NewcomersError>;

#[derive(Error, Debug)]
pub enum NewcomersError {
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),
    #[error("Invalid week key: {0}")]
    InvalidWeekKey(String),
    #[error("Invalid weekly bucket: {0}")]
    InvalidBucket(String),
    #[error("HTTP error: {0}")]
    Http(#[from] Box<ureq::Error>),
    #[error("Rate limit exhausted, resets at {reset}")]
    RateLimited { reset: String },
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("Cache error: {0}")]
    Cache(String),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Configuration error: {0}")]
    Config(String),
}

// ureq::Error is large, keep the enum small by boxing it
impl From<ureq::Error> for NewcomersError {
    fn from(err: ureq::Error) -> Self {
        NewcomersError::Http(Box::new(err))
    }
}
