use thiserror::Error;

/// Contract violations. Expected gameplay failures (not enough gold, digging
/// out of reach) are reported through `ActionReply`, never through this enum.
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("coordinates outside the grid")]
    OutOfBounds,
    #[error("question corpus is empty")]
    EmptyCorpus,
    #[error("malformed question record")]
    InvalidQuestion,
}

pub type Result<T> = core::result::Result<T, GameError>;
