use std::fmt;
use std::path::{Path, PathBuf};

/// Identifies where a diagnosable artifact came from: the source file,
/// the tool stage that produced it, and an optional sub-location
/// (rendered as one-based `line,column` on import errors).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentIdentity {
    pub source_path: PathBuf,
    pub tool: String,
    pub location: Option<String>,
}

impl ContentIdentity {
    #[must_use]
    pub fn new(source_path: impl Into<PathBuf>, tool: impl Into<String>) -> Self {
        Self {
            source_path: source_path.into(),
            tool: tool.into(),
            location: None,
        }
    }

    /// Same identity with a sub-location suffix attached.
    #[must_use]
    pub fn at(&self, location: impl Into<String>) -> Self {
        Self {
            source_path: self.source_path.clone(),
            tool: self.tool.clone(),
            location: Some(location.into()),
        }
    }

    #[must_use]
    pub fn source_path(&self) -> &Path {
        &self.source_path
    }
}

impl fmt::Display for ContentIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source_path.display())?;
        if let Some(location) = &self.location {
            write!(f, "({location})")?;
        }
        Ok(())
    }
}
