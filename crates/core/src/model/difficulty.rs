use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DifficultyError {
    #[error("unknown difficulty level: {0}")]
    Unknown(String),
}

//
// ─── DIFFICULTY LEVEL ─────────────────────────────────────────────────────────
//

/// Which lesson/quiz variant a student receives.
///
/// Levels are ordered `Easy < Medium < Advanced`. New students start at `Easy`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum DifficultyLevel {
    #[default]
    Easy,
    Medium,
    Advanced,
}

impl DifficultyLevel {
    pub const ALL: [DifficultyLevel; 3] = [Self::Easy, Self::Medium, Self::Advanced];

    /// One level up, capped at `Advanced`.
    #[must_use]
    pub fn promoted(self) -> Self {
        match self {
            Self::Easy => Self::Medium,
            Self::Medium | Self::Advanced => Self::Advanced,
        }
    }

    /// One level down, floored at `Easy`.
    #[must_use]
    pub fn demoted(self) -> Self {
        match self {
            Self::Easy | Self::Medium => Self::Easy,
            Self::Advanced => Self::Medium,
        }
    }

    /// Storage / wire representation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Advanced => "advanced",
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Easy => "Easy",
            Self::Medium => "Medium",
            Self::Advanced => "Advanced",
        }
    }
}

impl fmt::Display for DifficultyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for DifficultyLevel {
    type Err = DifficultyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Self::Easy),
            "medium" => Ok(Self::Medium),
            "advanced" => Ok(Self::Advanced),
            _ => Err(DifficultyError::Unknown(s.to_owned())),
        }
    }
}
