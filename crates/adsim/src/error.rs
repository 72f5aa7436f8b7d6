//! Error types for adsim.

use std::fmt;
use std::path::PathBuf;

use adsim_compiler::ParseError;
use adsim_core::PslError;
use thiserror::Error;

/// Error type for simulator operations.
#[derive(Error, Debug)]
pub enum Error {
    /// A rule source or URL file could not be read
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Filter list content was rejected
    #[error("filter list rejected at {0}")]
    Parse(#[from] ParseError),

    /// Input that is neither readable content nor usable literal text
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Public suffix list could not be loaded
    #[error(transparent)]
    Psl(#[from] PslError),
}

/// Broad failure classes, independent of the concrete cause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    Io,
    Parse,
    InvalidInput,
    /// Public suffix data could not be loaded
    Configuration,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Io => "io",
            Self::Parse => "parse",
            Self::InvalidInput => "invalid input",
            Self::Configuration => "configuration",
        })
    }
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Io { .. } => FailureKind::Io,
            Self::Parse(_) => FailureKind::Parse,
            Self::InvalidInput(_) => FailureKind::InvalidInput,
            Self::Psl(_) => FailureKind::Configuration,
        }
    }
}

/// Result type alias for simulator operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_variants() {
        let io = Error::io("/missing", std::io::Error::from(std::io::ErrorKind::NotFound));
        assert_eq!(io.kind(), FailureKind::Io);
        assert!(io.to_string().starts_with("cannot read /missing"));

        let parse = Error::from(ParseError::new(3, "bad regex"));
        assert_eq!(parse.kind(), FailureKind::Parse);
        assert_eq!(parse.to_string(), "filter list rejected at line 3: bad regex");

        assert_eq!(Error::InvalidInput("empty".into()).kind(), FailureKind::InvalidInput);
    }
}
