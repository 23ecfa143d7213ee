use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LevelTableError {
    #[error("level table must contain at least one level")]
    Empty,

    #[error("level at position {position} has index {found}; indices must be contiguous from 0")]
    NonContiguousIndex { position: usize, found: usize },

    #[error("level {index} requires {required} points, fewer than the {previous} required by the level before it")]
    DecreasingRequirement {
        index: usize,
        required: u32,
        previous: u32,
    },

    #[error("only the last level may have an unbounded requirement (found at index {index})")]
    UnboundedBeforeEnd { index: usize },

    #[error("the last level must have an unbounded requirement")]
    MissingTerminal,

    #[error("failed to parse level table: {0}")]
    Parse(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransitionRejected {
    #[error("{points} points in level {level_index}, {required} required to level up")]
    NotEligible {
        level_index: usize,
        points: u32,
        required: u32,
    },

    #[error("level {level_index} is the top of the ladder")]
    AtTerminalLevel { level_index: usize },

    #[error("cannot demote below the first level")]
    AtFloor,
}
