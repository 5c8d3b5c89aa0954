use thiserror::Error;

/// Unified error type for the cryptotrack application.
#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {0}")]
    Api(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error came from talking to the pricing API.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Api(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
