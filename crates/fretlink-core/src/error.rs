use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Connection to {address}:{port} failed: {message}")]
    ConnectFailed {
        address: String,
        port: u16,
        message: String,
    },

    #[error("Timed out after {0}ms")]
    Timeout(u64),

    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Channel not connected")]
    NotConnected,

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Unknown state name: {0}")]
    UnknownState(String),

    #[error("Discovery error: {0}")]
    Discovery(String),

    #[error("Config parse error: {0}")]
    ConfigParseError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::ConfigParseError(e.to_string())
    }
}
