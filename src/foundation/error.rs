/// Result type used across cirrus.
pub type CirrusResult<T> = Result<T, CirrusError>;

/// Errors surfaced by sessions, feeds and the server.
#[derive(thiserror::Error, Debug)]
pub enum CirrusError {
    /// A value outside its allowed range, such as zero fps.
    #[error("validation error: {0}")]
    Validation(String),

    /// A config file that could not be read or parsed.
    #[error("config error: {0}")]
    Config(String),

    /// The decoder could not be launched or driven.
    #[error("feed error: {0}")]
    Feed(String),

    /// Binding or serving the network listener failed.
    #[error("transport error: {0}")]
    Transport(String),

    /// Output channel or filesystem I/O.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Wrapped lower-level error.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CirrusError {
    /// Build a [`CirrusError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`CirrusError::Config`] value.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Build a [`CirrusError::Feed`] value.
    pub fn feed(msg: impl Into<String>) -> Self {
        Self::Feed(msg.into())
    }

    /// Build a [`CirrusError::Transport`] value.
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }
}
