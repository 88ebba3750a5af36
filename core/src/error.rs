//! Error types for imapcopy

/// Result type alias for imapcopy operations
pub type CopyResult<T> = Result<T, CopyError>;

/// Main error type for imapcopy
#[derive(Debug, thiserror::Error)]
pub enum CopyError {
    /// Configuration errors (bad or incomplete endpoint URI)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Authentication errors (login rejected by the server)
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// IMAP protocol errors
    #[error("IMAP error: {0}")]
    Imap(#[from] async_imap::error::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// URL parsing errors
    #[error("URL parsing error: {0}")]
    Url(#[from] url::ParseError),

    /// TLS errors
    #[error("TLS error: {0}")]
    Tls(String),
}

impl CopyError {
    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new authentication error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    /// Create a new TLS error
    pub fn tls(msg: impl Into<String>) -> Self {
        Self::Tls(msg.into())
    }
}
