//! Rule and URL sources.
//!
//! Every user-supplied token is either a path to an existing file or literal
//! text. Files are read as UTF-8.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Where rule text comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleSource {
    Inline(String),
    File(PathBuf),
}

impl RuleSource {
    /// Decide whether `item` names a file or is rule text itself.
    ///
    /// A path that exists but is not a regular file is rejected.
    pub fn classify(item: &str) -> Result<Self> {
        let path = Path::new(item);
        if path.is_file() {
            return Ok(Self::File(path.to_path_buf()));
        }
        if path.exists() {
            return Err(Error::InvalidInput(format!("{item} exists but is not a regular file")));
        }
        Ok(Self::Inline(item.to_string()))
    }

    /// Raw rule text of this source.
    pub fn load(&self) -> Result<String> {
        match self {
            Self::Inline(text) => Ok(text.clone()),
            Self::File(path) => read_text(path),
        }
    }
}

pub(crate) fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| Error::io(path, e))
}

/// Resolve the source token: the trimmed contents of a file, or the token
/// itself.
pub fn resolve_source(token: &str) -> Result<String> {
    let path = Path::new(token);
    let source = if path.is_file() {
        read_text(path)?.trim().to_string()
    } else {
        token.to_string()
    };

    if source.trim().is_empty() {
        return Err(Error::InvalidInput("source URL is empty".to_string()));
    }
    Ok(source)
}

/// Expand destination tokens. Files contribute one destination per non-empty
/// line; anything else is a destination as given.
pub fn expand_destinations<S: AsRef<str>>(tokens: &[S]) -> Result<Vec<String>> {
    let mut destinations = Vec::new();

    for token in tokens {
        let token = token.as_ref();
        let path = Path::new(token);
        if path.is_file() {
            let text = read_text(path)?;
            destinations.extend(
                text.lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty())
                    .map(str::to_string),
            );
        } else {
            destinations.push(token.to_string());
        }
    }

    Ok(destinations)
}
