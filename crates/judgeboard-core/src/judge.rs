//! Judge positions around the platform.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Number of judge votes required to finalize a verdict.
pub const QUORUM: usize = 3;

/// Seat of a judge around the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JudgePosition {
    /// Head (centre) referee.
    Head,
    /// Side referee on the lifter's left.
    Left,
    /// Side referee on the lifter's right.
    Right,
}

impl JudgePosition {
    /// All positions, in seat order.
    pub const ALL: [JudgePosition; QUORUM] =
        [JudgePosition::Head, JudgePosition::Left, JudgePosition::Right];

    /// Slot index of this position in a `QUORUM`-sized array.
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            JudgePosition::Head => 0,
            JudgePosition::Left => 1,
            JudgePosition::Right => 2,
        }
    }
}

impl fmt::Display for JudgePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JudgePosition::Head => "HEAD",
            JudgePosition::Left => "LEFT",
            JudgePosition::Right => "RIGHT",
        };
        f.write_str(name)
    }
}
