use thiserror::Error as ThisError;

pub(crate) type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(ThisError, Debug)]
pub(crate) enum Error {
    /// Used when errors need to propagate but are too unique to be typed
    #[error("{0}")]
    Unique(String),

    #[error("I/O Error: {0}")]
    IO(#[from] std::io::Error),

    #[error("Property list error: {0}")]
    Plist(#[from] plist::Error),

    #[error("Parse Error: {0}")]
    Parse(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Unique(s.to_string())
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Unique(s)
    }
}

/// Build an `Err(Error::Unique(..))` from a format string.
#[macro_export]
macro_rules! custom_error {
    ($($arg:tt)*) => {
        Err($crate::error::Error::Unique(format!($($arg)*)))
    };
}
