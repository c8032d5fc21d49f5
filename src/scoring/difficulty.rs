//! Difficulty presets and their XP multipliers.

use serde::{Deserialize, Serialize};

/// Run difficulty preset. Scales XP, never the scoring formulas.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
    Expert,
}

impl Difficulty {
    /// XP multiplier applied to the total score.
    #[must_use]
    pub const fn multiplier(self) -> f64 {
        match self {
            Self::Easy => 0.5,
            Self::Medium => 1.0,
            Self::Hard => 1.5,
            Self::Expert => 2.0,
        }
    }

    /// Lowercase name as stored in scorecards.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
            Self::Expert => "expert",
        }
    }

    /// Parses a preset name; anything unrecognized falls back to
    /// `Medium` (multiplier 1.0) rather than failing the run.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "easy" => Self::Easy,
            "hard" => Self::Hard,
            "expert" => Self::Expert,
            _ => Self::Medium,
        }
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
