#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unknown device: {0}")]
    UnknownDevice(String),
    #[error("invalid pattern {pattern:?}: {message}")]
    InvalidPattern { pattern: String, message: String },
    #[error(transparent)]
    Regex(#[from] fancy_regex::Error),
    #[error(transparent)]
    IO(#[from] std::io::Error),
    #[error(transparent)]
    YAML(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
