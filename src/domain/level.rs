use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// The importance of a single requirement value.
///
/// Levels form a total order from strongest to weakest:
/// [`Mandatory`](Self::Mandatory) ≻ [`Optional`](Self::Optional) ≻
/// [`Informative`](Self::Informative).
///
/// The derived [`Ord`] follows declaration order, so a *smaller* level is a
/// *stronger* one and [`Ord::min`] picks the stronger of two levels.
///
/// ```
/// use analysis_requirements::PriorityLevel;
///
/// assert!(PriorityLevel::Mandatory < PriorityLevel::Optional);
/// assert_eq!(
///     PriorityLevel::Optional.stronger(PriorityLevel::Mandatory),
///     PriorityLevel::Mandatory
/// );
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriorityLevel {
    /// The value must be present for the analysis to run.
    Mandatory,
    /// The analysis still works without the value, with reduced output.
    Optional,
    /// The value only adds context; its absence is worth reporting at most.
    Informative,
}

impl PriorityLevel {
    /// All levels, strongest first.
    pub const ALL: [Self; 3] = [Self::Mandatory, Self::Optional, Self::Informative];

    /// The rank of this level. Lower ranks are stronger.
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::Mandatory => 0,
            Self::Optional => 1,
            Self::Informative => 2,
        }
    }

    /// Returns `true` if `self` is strictly stronger than `other`.
    #[must_use]
    pub const fn is_stronger_than(self, other: Self) -> bool {
        self.rank() < other.rank()
    }

    /// Returns the stronger of the two levels.
    #[must_use]
    pub fn stronger(self, other: Self) -> Self {
        self.min(other)
    }

    /// Weakens `self` down to `cap` if it is stronger than `cap`.
    ///
    /// Levels already at or below the cap are returned unchanged.
    #[must_use]
    pub fn capped_at(self, cap: Self) -> Self {
        self.max(cap)
    }

    /// The lowercase name of the level.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mandatory => "mandatory",
            Self::Optional => "optional",
            Self::Informative => "informative",
        }
    }
}

impl fmt::Display for PriorityLevel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string does not name a [`PriorityLevel`].
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("Invalid priority level '{0}': expected one of 'mandatory', 'optional', 'informative'")]
pub struct ParseLevelError(String);

impl FromStr for PriorityLevel {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseLevelError(s.to_string()))
    }
}

impl TryFrom<&str> for PriorityLevel {
    type Error = ParseLevelError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::from_str(value)
    }
}
