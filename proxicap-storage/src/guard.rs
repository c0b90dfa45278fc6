//! Critical-section policy for shared state.

use std::fmt;
use std::str::FromStr;

/// How shared state is protected across overlapping ingests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum GuardMode {
    /// Read-evaluate-write runs as one critical section.
    #[default]
    Guarded,
    /// Read and write are separate critical sections; concurrent ingests
    /// may both act on the same stale read.
    Racy,
}

impl GuardMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            GuardMode::Guarded => "guarded",
            GuardMode::Racy => "racy",
        }
    }

    pub fn is_guarded(&self) -> bool {
        matches!(self, GuardMode::Guarded)
    }
}

impl fmt::Display for GuardMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for GuardMode {
    type Err = GuardModeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "guarded" | "locked" => Ok(GuardMode::Guarded),
            "racy" | "unguarded" => Ok(GuardMode::Racy),
            _ => Err(GuardModeParseError(s.to_string())),
        }
    }
}

/// Error when parsing an invalid guard mode string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardModeParseError(pub String);

impl fmt::Display for GuardModeParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid guard mode: {} (expected guarded or racy)", self.0)
    }
}

impl std::error::Error for GuardModeParseError {}
