//! Multi-dimension scoring: difficulty presets, the run-scoped
//! accumulator, the pure scorecard calculator, and scorecard storage.

pub mod accumulator;
pub mod card;
pub mod difficulty;
pub mod store;

pub use accumulator::{ActionRecord, RunSnapshot, ScoringAccumulator};
pub use card::{DimensionScore, ScoreCard, tier_for_xp};
pub use difficulty::Difficulty;
pub use store::{JsonFileStore, MemoryStore, ScoreStore};
