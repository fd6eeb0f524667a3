use std::fmt::{self, Display};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// The standing of a user, or the standing a course requires.
///
/// Levels are totally ordered, `Beginner < Intermediate < Professional`.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Level {
    #[default]
    Beginner,
    Intermediate,
    Professional,
}

/// Every level, in ascending order.
pub const LEVELS: [Level; 3] = [Level::Beginner, Level::Intermediate, Level::Professional];

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown level {0:?}")]
pub struct UnknownLevel(pub String);

impl Level {
    /// The position of this level in [LEVELS].
    pub fn index(self) -> usize {
        match self {
            Level::Beginner => 0,
            Level::Intermediate => 1,
            Level::Professional => 2,
        }
    }

    /// The level after this one, or [None] if this is the last.
    pub fn next(self) -> Option<Level> {
        LEVELS.get(self.index() + 1).copied()
    }

    pub fn is_terminal(self) -> bool {
        self.next().is_none()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Level::Beginner => "Beginner",
            Level::Intermediate => "Intermediate",
            Level::Professional => "Professional",
        }
    }
}

impl Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = UnknownLevel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LEVELS
            .into_iter()
            .find(|l| l.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownLevel(s.to_string()))
    }
}

/// The level a course requires, as it was stored.
///
/// Course data is admin-editable, so a stored level may not be one we know.
/// Unknown values are kept verbatim so they survive a load/save cycle.
/// Stored values are read the same way as [From<&str>], ignoring case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum CourseLevel {
    Known(Level),
    Unknown(String),
}

impl CourseLevel {
    pub fn known(&self) -> Option<Level> {
        match self {
            CourseLevel::Known(level) => Some(*level),
            CourseLevel::Unknown(_) => None,
        }
    }

    /// Returns true if a user at `level` has not reached this course level.
    /// Unknown course levels are always out of reach.
    pub fn exceeds(&self, level: Level) -> bool {
        self.known().map_or(true, |required| required > level)
    }
}

impl From<Level> for CourseLevel {
    fn from(level: Level) -> Self {
        CourseLevel::Known(level)
    }
}

impl From<&str> for CourseLevel {
    fn from(value: &str) -> Self {
        value
            .parse()
            .map(CourseLevel::Known)
            .unwrap_or_else(|_| CourseLevel::Unknown(value.to_string()))
    }
}

impl<'de> Deserialize<'de> for CourseLevel {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(CourseLevel::from(raw.as_str()))
    }
}

impl Display for CourseLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CourseLevel::Known(level) => Display::fmt(level, f),
            CourseLevel::Unknown(raw) => f.write_str(raw),
        }
    }
}
