//! Level calculator: Fibonacci levels, classification and swing detection.

pub mod indicators;
pub mod levels;

pub use indicators::{find_swing_points, SwingPoints};
pub use levels::{classify, compute_levels, Level, LevelClassification, LevelKind, LevelMap, RatioSet};
